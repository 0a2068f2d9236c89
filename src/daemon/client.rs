//! Query client — one request, one response, never an `Err`.
//!
//! Flow per call:
//! 1. status marker says `indexing` → `indexing`, transport untouched
//! 2. resolve the address; if unreachable, one launch-and-wait attempt,
//!    `unavailable` if that fails
//! 3. one exchange over the transport under the query timeout
//!
//! Every failure along the way comes back as a [`Response`] variant.

use std::path::Path;
use tracing::{debug, warn};

use super::address::resolve;
use super::launcher::DaemonLauncher;
use super::probe::is_reachable;
use super::protocol::{Query, Response};
use super::status::is_indexing;
use super::transport::{HelperTransport, QueryTransport, SocketTransport};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result, NOT_RUNNING};

/// Client for the project-scoped daemon.
///
/// Holds configuration only; every call recomputes the address and status
/// and opens its own connection.
#[derive(Debug, Clone)]
pub struct DaemonClient<T = SocketTransport> {
    config: ClientConfig,
    launcher: DaemonLauncher,
    transport: T,
}

impl Default for DaemonClient<SocketTransport> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl DaemonClient<SocketTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, SocketTransport)
    }

    /// Client configured from `<project>/.tldr/client.toml`.
    pub fn for_project(project: &Path) -> Self {
        Self::new(ClientConfig::load(project))
    }
}

impl<T: QueryTransport> DaemonClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let launcher = DaemonLauncher::new(config.launch.clone(), config.probe_timeout());
        Self {
            config,
            launcher,
            transport,
        }
    }

    /// Send one query to the daemon for `project`.
    pub async fn query(&self, query: &Query, project: &Path) -> Response {
        self.query_with(&self.transport, query, project).await
    }

    /// Blocking form: the exchange runs in a `tldr-send` helper process that
    /// is killed when the query timeout passes.
    ///
    /// Called from inside an async runtime, the flow moves to its own thread
    /// and the calling worker blocks until it finishes.
    pub fn query_sync(&self, query: &Query, project: &Path) -> Response {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.block_on_helper(query, project);
        }
        debug!(cmd = query.name(), "blocking query inside a runtime, using a thread");
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.block_on_helper(query, project))
                .join()
                .unwrap_or_else(|_| {
                    ClientError::Transport("blocking query thread panicked".to_string()).into()
                })
        })
    }

    fn block_on_helper(&self, query: &Query, project: &Path) -> Response {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => return ClientError::Transport(e.to_string()).into(),
        };
        let helper = HelperTransport::new(self.config.helper_path());
        runtime.block_on(self.query_with(&helper, query, project))
    }

    /// Run the shared flow with an explicit transport.
    pub async fn query_with<X>(&self, transport: &X, query: &Query, project: &Path) -> Response
    where
        X: QueryTransport + ?Sized,
    {
        match self.run(transport, query, project).await {
            Ok(response) => response,
            Err(e) => {
                debug!(cmd = query.name(), error = %e, "query degraded");
                e.into()
            }
        }
    }

    async fn run<X>(&self, transport: &X, query: &Query, project: &Path) -> Result<Response>
    where
        X: QueryTransport + ?Sized,
    {
        if is_indexing(project) {
            debug!(project = %project.display(), "daemon indexing, skipping query");
            return Err(ClientError::Indexing);
        }

        let conn = resolve(project);
        if !is_reachable(&conn, self.config.probe_timeout()).await
            && !self.launcher.launch_and_wait(project, &conn).await
        {
            warn!(conn = %conn, "daemon unavailable");
            return Err(ClientError::Unavailable(NOT_RUNNING.to_string()));
        }

        transport
            .exchange(&conn, query, self.config.query_timeout())
            .await
    }
}
