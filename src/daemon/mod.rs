//! Daemon module — locate, start, and query the project's analysis daemon.
//!
//! The daemon is a long-lived process per project. Callers are short-lived
//! hook processes, so the client finds the daemon from the project path
//! alone and degrades to a status value when it cannot get an answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           caller (hook / CLI)           │
//! └─────────────────────────────────────────┘
//!           │ Query            ▲ Response
//!           ▼                  │
//! ┌─────────────────────────────────────────┐
//! │  DaemonClient                           │
//! │  - .tldr/status  → indexing?            │
//! │  - resolve()     → socket path / port   │
//! │  - is_reachable  → else launch + poll   │
//! │  - QueryTransport: socket | tldr-send   │
//! └─────────────────────────────────────────┘
//!           │ /tmp/tldr-<hash8>.sock  or  127.0.0.1:<port>
//!           ▼
//! ┌─────────────────────────────────────────┐
//! │           tldr daemon                   │
//! └─────────────────────────────────────────┘
//! ```

pub mod address;
pub mod client;
pub mod launcher;
pub mod probe;
pub mod protocol;
pub mod status;
pub mod transport;

pub use address::{resolve, resolve_for, ConnectionInfo, Platform, ProjectContext};
pub use client::DaemonClient;
pub use launcher::DaemonLauncher;
pub use probe::is_reachable;
pub use protocol::{Query, Response, SemanticAction, SliceDirection};
pub use status::{is_indexing, read_status, DaemonStatus};
pub use transport::{HelperTransport, QueryTransport, SocketTransport};
