//! Error taxonomy for daemon queries.
//!
//! Every variant maps onto one `status` value of [`Response`], which is how
//! errors leave the crate: public query functions never return `Err`.

use thiserror::Error;

use crate::daemon::protocol::Response;

/// Message used when the daemon is absent and a launch did not bring it up.
pub const NOT_RUNNING: &str = "Daemon not running and could not start";

/// Message returned while the daemon is building its index.
pub const INDEXING: &str = "Daemon is indexing, results not yet available";

pub const INVALID_JSON: &str = "Invalid JSON response from daemon";
pub const INCOMPLETE: &str = "Incomplete response";
pub const CLOSED_EMPTY: &str = "Connection closed without response";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The sidecar status file says the daemon is warming up.
    #[error("{}", INDEXING)]
    Indexing,

    /// Daemon not running, refused the connection, or the endpoint is gone.
    #[error("{0}")]
    Unavailable(String),

    /// No complete response before the deadline.
    #[error("timeout")]
    Timeout,

    /// Bytes arrived but did not form a usable response.
    #[error("{0}")]
    Protocol(String),

    /// Any other transport failure, message kept verbatim.
    #[error("{0}")]
    Transport(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Classify an I/O error raised while connecting or exchanging data.
    ///
    /// Refused connections and missing endpoints mean "nobody is listening";
    /// everything else is reported as-is.
    pub fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound => {
                ClientError::Unavailable(err.to_string())
            }
            _ => ClientError::Transport(err.to_string()),
        }
    }
}

impl From<ClientError> for Response {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Indexing => Response::Indexing {
                message: INDEXING.to_string(),
            },
            ClientError::Unavailable(error) => Response::Unavailable { error },
            other => Response::Error {
                error: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_refused_and_missing_are_unavailable() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert!(matches!(ClientError::from_io(refused), ClientError::Unavailable(_)));

        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert!(matches!(ClientError::from_io(missing), ClientError::Unavailable(_)));
    }

    #[test]
    fn test_other_io_errors_keep_message() {
        let err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe went away");
        match ClientError::from_io(err) {
            ClientError::Transport(msg) => assert_eq!(msg, "pipe went away"),
            other => panic!("expected Transport, got {:?}", other),
        }
    }

    #[test]
    fn test_timeout_converts_to_error_status() {
        let response: Response = ClientError::Timeout.into();
        assert_eq!(response.status(), "error");
        assert_eq!(response.error_message(), Some("timeout"));
    }

    #[test]
    fn test_indexing_converts_to_indexing_status() {
        let response: Response = ClientError::Indexing.into();
        assert_eq!(response.status(), "indexing");
    }
}
