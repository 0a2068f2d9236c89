//! Query module — typed entry points for every daemon command.
//!
//! The main interface for hooks that need daemon results.
//!
//! ## Core API
//!
//! ```ignore
//! let client = DaemonClient::for_project(project);
//! let hits = client.search("login", 10, project).await;      // results, or []
//! let callers = client.impact("authenticate", project).await; // callers, or []
//! let cfg = client.cfg("app.py", "main", "python", project).await;
//! ```
//!
//! None of these fail: an absent, cold or broken daemon yields an empty list
//! or the pass-through status object.

pub mod commands;

pub use commands::Consumed;
