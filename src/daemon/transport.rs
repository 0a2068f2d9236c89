//! Transports that carry one request/response exchange.
//!
//! Both calling conventions share address resolution, probing and launch,
//! and differ only here: [`SocketTransport`] talks to the daemon directly,
//! [`HelperTransport`] delegates the exchange to a short-lived `tldr-send`
//! process and reads its single output line.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::debug;

use super::address::ConnectionInfo;
use super::protocol::{decode_reply, encode_line, Query, Response};
use crate::error::{ClientError, Result};

/// Carries one query to the daemon at `conn` and returns its reply.
///
/// Implementations must give up after `timeout` with [`ClientError::Timeout`]
/// and release whatever they opened.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn exchange(
        &self,
        conn: &ConnectionInfo,
        query: &Query,
        timeout: Duration,
    ) -> Result<Response>;
}

/// Direct socket exchange: Unix domain socket or TCP loopback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketTransport;

#[async_trait]
impl QueryTransport for SocketTransport {
    async fn exchange(
        &self,
        conn: &ConnectionInfo,
        query: &Query,
        timeout: Duration,
    ) -> Result<Response> {
        let line = encode_line(query)?;
        let work = async {
            match conn {
                ConnectionInfo::Unix { path } => {
                    let stream = connect_unix(path).await.map_err(ClientError::from_io)?;
                    exchange_on(stream, &line).await
                }
                ConnectionInfo::Tcp { host, port } => {
                    let stream = TcpStream::connect((host.as_str(), *port))
                        .await
                        .map_err(ClientError::from_io)?;
                    exchange_on(stream, &line).await
                }
            }
        };

        // Dropping `work` on expiry closes the connection.
        match tokio::time::timeout(timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                debug!(conn = %conn, cmd = query.name(), "query timed out");
                Err(ClientError::Timeout)
            }
        }
    }
}

#[cfg(unix)]
pub(crate) async fn connect_unix(path: &Path) -> std::io::Result<tokio::net::UnixStream> {
    tokio::net::UnixStream::connect(path).await
}

#[cfg(not(unix))]
pub(crate) async fn connect_unix(_path: &Path) -> std::io::Result<TcpStream> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "unix sockets are not supported on this platform",
    ))
}

/// Write one request line and read up to the first newline or EOF.
pub(crate) async fn exchange_on<S>(stream: S, line: &[u8]) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    writer.write_all(line).await.map_err(ClientError::from_io)?;
    writer.flush().await.map_err(ClientError::from_io)?;

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    reader
        .read_until(b'\n', &mut buf)
        .await
        .map_err(ClientError::from_io)?;
    decode_reply(&buf)
}

/// Blocking-form exchange through the `tldr-send` helper.
///
/// The address goes in as separate arguments and the request on stdin, so
/// no shell ever sees the serialized JSON. The helper is killed when the
/// deadline passes.
#[derive(Debug, Clone)]
pub struct HelperTransport {
    program: PathBuf,
}

impl HelperTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, conn: &ConnectionInfo, timeout: Duration) -> Command {
        let mut cmd = Command::new(&self.program);
        match conn {
            ConnectionInfo::Unix { path } => {
                cmd.arg("--unix").arg(path);
            }
            ConnectionInfo::Tcp { host, port } => {
                cmd.arg("--tcp").arg(host).arg(port.to_string());
            }
        }
        cmd.arg("--timeout-ms")
            .arg(timeout.as_millis().to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl QueryTransport for HelperTransport {
    async fn exchange(
        &self,
        conn: &ConnectionInfo,
        query: &Query,
        timeout: Duration,
    ) -> Result<Response> {
        let payload = encode_line(query)?;
        let mut child = self.command(conn, timeout).spawn().map_err(|e| {
            ClientError::Transport(format!(
                "failed to spawn {}: {}",
                self.program.display(),
                e
            ))
        })?;

        let stdin = child.stdin.take();
        let work = async move {
            if let Some(mut stdin) = stdin {
                stdin
                    .write_all(&payload)
                    .await
                    .map_err(ClientError::from_io)?;
                // Dropping stdin signals end of request.
            }
            let output = child.wait_with_output().await.map_err(ClientError::from_io)?;
            debug!(status = ?output.status, bytes = output.stdout.len(), "helper finished");
            decode_reply(&output.stdout)
        };

        match tokio::time::timeout(timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                debug!(helper = %self.program.display(), "helper killed after timeout");
                Err(ClientError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();
            assert_eq!(line, "{\"cmd\":\"ping\"}\n");
            writer
                .write_all(b"{\"status\":\"ok\",\"message\":\"pong\"}\n")
                .await
                .unwrap();
        });

        let conn = ConnectionInfo::Tcp {
            host: "127.0.0.1".into(),
            port,
        };
        let response = SocketTransport
            .exchange(&conn, &Query::Ping, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(response.is_ok());
        assert_eq!(response.field("message").unwrap(), "pong");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_tcp_refused_is_unavailable() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let conn = ConnectionInfo::Tcp {
            host: "127.0.0.1".into(),
            port,
        };
        let err = SocketTransport
            .exchange(&conn, &Query::Ping, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unavailable(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // Hold the connection open without answering until the client hangs up.
            let mut sink = Vec::new();
            let _ = stream.read_to_end(&mut sink).await;
        });

        let conn = ConnectionInfo::Tcp {
            host: "127.0.0.1".into(),
            port,
        };
        let started = std::time::Instant::now();
        let err = SocketTransport
            .exchange(&conn, &Query::Ping, Duration::from_millis(150))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
        assert!(started.elapsed() < Duration::from_secs(2));

        // The server sees EOF once the client side is dropped.
        tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .expect("connection was not closed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_helper_is_transport_error() {
        let helper = HelperTransport::new("/nonexistent/tldr-send");
        let conn = ConnectionInfo::Tcp {
            host: "127.0.0.1".into(),
            port: 1,
        };
        let err = helper
            .exchange(&conn, &Query::Ping, Duration::from_secs(1))
            .await
            .unwrap_err();
        match err {
            ClientError::Transport(msg) => assert!(msg.contains("failed to spawn")),
            other => panic!("expected Transport, got {:?}", other),
        }
    }
}
