//! Reachability — cheap liveness check, distinct from a full query.
//!
//! Unix sockets get a protocol-level ping because dead socket files linger
//! on disk; a failed connect removes the file so the next launch can bind.
//! TCP gets a bare connect, since a port nobody listens on refuses at once.

use std::path::Path;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};

use super::address::ConnectionInfo;
use super::protocol::{encode_line, Query};
use super::transport::{connect_unix, exchange_on};

/// True if a daemon is listening at `conn` and answers within `timeout`.
pub async fn is_reachable(conn: &ConnectionInfo, timeout: Duration) -> bool {
    match conn {
        ConnectionInfo::Unix { path } => probe_unix(path, timeout).await,
        ConnectionInfo::Tcp { host, port } => {
            matches!(
                tokio::time::timeout(timeout, TcpStream::connect((host.as_str(), *port))).await,
                Ok(Ok(_))
            )
        }
    }
}

async fn probe_unix(path: &Path, timeout: Duration) -> bool {
    if !path.exists() {
        return false;
    }

    // One deadline covers connect and ping together.
    match tokio::time::timeout(timeout, ping_unix(path)).await {
        Ok(reachable) => reachable,
        Err(_) => {
            debug!(socket = %path.display(), "probe timed out");
            false
        }
    }
}

async fn ping_unix(path: &Path) -> bool {
    let stream = match connect_unix(path).await {
        Ok(stream) => stream,
        Err(e) => {
            debug!(socket = %path.display(), error = %e, "socket connect failed");
            remove_stale_socket(path);
            return false;
        }
    };

    let line = match encode_line(&Query::Ping) {
        Ok(line) => line,
        Err(_) => return false,
    };
    match exchange_on(stream, &line).await {
        Ok(_) => true,
        Err(e) => {
            debug!(socket = %path.display(), error = %e, "ping failed");
            false
        }
    }
}

/// Best-effort removal of a socket file nobody is listening on.
fn remove_stale_socket(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!(socket = %path.display(), "removed stale socket"),
        Err(e) => debug!(socket = %path.display(), error = %e, "could not remove stale socket"),
    }
}
