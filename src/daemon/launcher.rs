//! Daemon launcher — start the daemon on demand and wait for it.
//!
//! Start commands are fire-and-forget: whether the daemon came up is decided
//! only by polling reachability afterwards. The preferred invocation runs the
//! daemon through the package runner; if it exits non-zero, the direct
//! `tldr` invocation is tried.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::address::{resolve, ConnectionInfo};
use super::probe::is_reachable;
use crate::config::LaunchConfig;

/// Upper bound for the backoff between polls.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartOutcome {
    /// Exited with status 0.
    Exited,
    /// Still running when the startup timeout passed; left alone.
    Detached,
    /// Could not spawn, or exited non-zero.
    Failed,
}

#[derive(Debug, Clone)]
pub struct DaemonLauncher {
    config: LaunchConfig,
    probe_timeout: Duration,
}

impl DaemonLauncher {
    pub fn new(config: LaunchConfig, probe_timeout: Duration) -> Self {
        Self {
            config,
            probe_timeout,
        }
    }

    /// Make sure the daemon for `project` is reachable, starting it if not.
    pub async fn ensure_running(&self, project: &Path) -> bool {
        let conn = resolve(project);
        if is_reachable(&conn, self.probe_timeout).await {
            return true;
        }
        self.launch_and_wait(project, &conn).await
    }

    /// Issue the start command(s), then poll `conn` until the window closes.
    pub async fn launch_and_wait(&self, project: &Path, conn: &ConnectionInfo) -> bool {
        info!(project = %project.display(), "daemon not running, starting");
        self.start(project).await;
        self.wait_until_reachable(conn).await
    }

    async fn start(&self, project: &Path) {
        let preferred = self.preferred_command(project);
        match self.run_bounded(preferred, "preferred").await {
            StartOutcome::Exited | StartOutcome::Detached => {}
            StartOutcome::Failed => {
                let fallback = self.fallback_command(project);
                self.run_bounded(fallback, "fallback").await;
            }
        }
    }

    /// `<runner> run tldr daemon start --project <project>` from the project's
    /// tool subdirectory, or from the project root if that does not exist.
    fn preferred_command(&self, project: &Path) -> Command {
        let mut cmd = Command::new(&self.config.runner);
        cmd.args(["run", "tldr", "daemon", "start", "--project"])
            .arg(project)
            .current_dir(self.preferred_dir(project));
        cmd
    }

    fn preferred_dir(&self, project: &Path) -> PathBuf {
        let dir = project.join(&self.config.subdir);
        if dir.is_dir() {
            dir
        } else {
            project.to_path_buf()
        }
    }

    /// `tldr daemon start --project <project>` from the current directory.
    fn fallback_command(&self, project: &Path) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(["daemon", "start", "--project"]).arg(project);
        cmd
    }

    async fn run_bounded(&self, mut cmd: Command, label: &str) -> StartOutcome {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(attempt = label, error = %e, "failed to spawn daemon start command");
                return StartOutcome::Failed;
            }
        };

        match tokio::time::timeout(self.config.startup_timeout(), child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                debug!(attempt = label, "daemon start command exited");
                StartOutcome::Exited
            }
            Ok(Ok(status)) => {
                warn!(attempt = label, %status, "daemon start command failed");
                StartOutcome::Failed
            }
            Ok(Err(e)) => {
                warn!(attempt = label, error = %e, "could not wait on daemon start command");
                StartOutcome::Failed
            }
            Err(_) => {
                debug!(attempt = label, "daemon start command still running, detaching");
                StartOutcome::Detached
            }
        }
    }

    /// Poll with exponential backoff until reachable or the window closes.
    async fn wait_until_reachable(&self, conn: &ConnectionInfo) -> bool {
        let started = Instant::now();
        let deadline = started + self.config.poll_window();
        let mut delay = self.config.poll_interval();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if is_reachable(conn, self.probe_timeout).await {
                info!(
                    attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "daemon ready"
                );
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(delay.min(deadline - now)).await;
            delay = (delay * 2).min(MAX_POLL_INTERVAL);
        }

        warn!(attempts, conn = %conn, "daemon did not become reachable");
        false
    }
}
