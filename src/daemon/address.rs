//! Transport address derivation.
//!
//! The daemon for a project listens at an address computed from the project
//! path alone, so any process can find it without a registry:
//!
//! - Unix: `/tmp/tldr-<hash8>.sock`
//! - Windows: `127.0.0.1:<49152 + hash8 mod 10000>`
//!
//! `hash8` is the first 8 hex digits of the MD5 of the project path.

use std::fmt;
use std::path::{Path, PathBuf};

/// First port of the IANA dynamic range.
const PORT_BASE: u16 = 49152;
const PORT_SPAN: u32 = 10000;
const LOOPBACK: &str = "127.0.0.1";

/// The project whose daemon a call talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    root: PathBuf,
}

impl ProjectContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root for hook callers: `CLAUDE_PROJECT_DIR`, else the
    /// working directory.
    pub fn from_env() -> std::io::Result<Self> {
        match std::env::var_os("CLAUDE_PROJECT_DIR") {
            Some(dir) if !dir.is_empty() => Ok(Self::new(dir)),
            _ => Ok(Self::new(std::env::current_dir()?)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AsRef<Path> for ProjectContext {
    fn as_ref(&self) -> &Path {
        &self.root
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// Where the daemon for a project listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConnectionInfo {
    Unix { path: PathBuf },
    Tcp { host: String, port: u16 },
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionInfo::Unix { path } => write!(f, "unix:{}", path.display()),
            ConnectionInfo::Tcp { host, port } => write!(f, "tcp:{}:{}", host, port),
        }
    }
}

/// First 8 hex characters of the MD5 digest of the project path.
pub fn project_hash(project: &Path) -> String {
    let digest = md5::compute(project.to_string_lossy().as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(8);
    hex
}

/// Address of the daemon for `project` on the running platform.
pub fn resolve(project: &Path) -> ConnectionInfo {
    resolve_for(project, Platform::current())
}

pub fn resolve_for(project: &Path, platform: Platform) -> ConnectionInfo {
    let hash = project_hash(project);
    match platform {
        Platform::Unix => ConnectionInfo::Unix {
            path: PathBuf::from(format!("/tmp/tldr-{}.sock", hash)),
        },
        Platform::Windows => {
            // 8 hex digits always fit in a u32.
            let value = u32::from_str_radix(&hash, 16).unwrap_or(0);
            ConnectionInfo::Tcp {
                host: LOOPBACK.to_string(),
                port: PORT_BASE + (value % PORT_SPAN) as u16,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_md5_prefix() {
        let full = format!("{:x}", md5::compute(b"/home/u/app"));
        let hash = project_hash(Path::new("/home/u/app"));
        assert_eq!(hash.len(), 8);
        assert_eq!(hash, full[..8]);
    }

    #[test]
    fn test_unix_socket_path() {
        let project = Path::new("/home/u/app");
        let hash = project_hash(project);
        assert_eq!(
            resolve_for(project, Platform::Unix),
            ConnectionInfo::Unix {
                path: PathBuf::from(format!("/tmp/tldr-{}.sock", hash))
            }
        );
    }

    #[test]
    fn test_tcp_port_in_range() {
        let project = Path::new("/home/u/app");
        let hash = project_hash(project);
        let expected = 49152 + (u32::from_str_radix(&hash, 16).unwrap() % 10000) as u16;
        match resolve_for(project, Platform::Windows) {
            ConnectionInfo::Tcp { host, port } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, expected);
                assert!((49152..59152).contains(&port));
            }
            other => panic!("expected tcp, got {}", other),
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let project = Path::new("/srv/projects/billing");
        for platform in [Platform::Unix, Platform::Windows] {
            assert_eq!(resolve_for(project, platform), resolve_for(project, platform));
        }
        assert_eq!(resolve(project), resolve(project));
    }

    #[test]
    fn test_distinct_projects_get_distinct_addresses() {
        let a = resolve_for(Path::new("/srv/projects/billing"), Platform::Unix);
        let b = resolve_for(Path::new("/srv/projects/shipping"), Platform::Unix);
        assert_ne!(a, b);
    }

    #[test]
    fn test_current_platform_variant() {
        let info = resolve(Path::new("/home/u/app"));
        if cfg!(windows) {
            assert!(matches!(info, ConnectionInfo::Tcp { .. }));
        } else {
            assert!(matches!(info, ConnectionInfo::Unix { .. }));
        }
    }
}
