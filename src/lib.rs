//! # tldr-client
//!
//! Client for the project-scoped tldr code analysis daemon.
//!
//! Short-lived caller processes (editor and agent hooks) use this crate to
//! find, lazily start, and query the long-lived daemon for their project.
//!
//! ## Key Features
//!
//! - **No discovery service**: the socket path / port is derived from the project path
//! - **Warm-up aware**: a sidecar status file short-circuits queries while indexing
//! - **Lazy start**: one launch-and-wait attempt when nobody is listening
//! - **Never throws**: every failure is a [`Response`] with a `status`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tldr_client::DaemonClient;
//! use std::path::Path;
//!
//! # async fn demo() {
//! let project = Path::new("/home/u/app");
//! let client = DaemonClient::for_project(project);
//!
//! // Search results, or an empty list if the daemon is cold or absent
//! let hits = client.search("login", 10, project).await;
//! # }
//! ```

pub mod config;
pub mod daemon;
pub mod error;
pub mod query;

// Re-exports for convenience
pub use config::{ClientConfig, LaunchConfig};
pub use error::{ClientError, Result};

pub use daemon::{
    resolve, ConnectionInfo, DaemonClient, DaemonStatus, Platform, ProjectContext, Query,
    QueryTransport, Response, SemanticAction, SliceDirection,
};
pub use query::Consumed;
