//! tldr-send — one-shot exchange helper for blocking queries.
//!
//! Usage:
//!   tldr-send --unix /tmp/tldr-1a2b3c4d.sock < request.json
//!   tldr-send --tcp 127.0.0.1 53021 --timeout-ms 3000 < request.json
//!
//! Reads one query from stdin, performs the exchange, and prints exactly one
//! response line to stdout. Failures are printed as responses too.

use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use tldr_client::daemon::transport::{QueryTransport, SocketTransport};
use tldr_client::{ClientError, ConnectionInfo, Query, Response};

#[derive(Parser)]
#[command(name = "tldr-send")]
#[command(about = "Send one query to a tldr daemon and print the reply", long_about = None)]
struct Cli {
    /// Unix socket path of the daemon
    #[arg(long, value_name = "PATH", required_unless_present = "tcp", conflicts_with = "tcp")]
    unix: Option<PathBuf>,

    /// TCP host and port of the daemon
    #[arg(long, num_args = 2, value_names = ["HOST", "PORT"])]
    tcp: Option<Vec<String>>,

    /// Give up after this many milliseconds
    #[arg(long, default_value = "3000")]
    timeout_ms: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TLDR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let response = match run(cli) {
        Ok(response) => response,
        Err(e) => e.into(),
    };

    let mut stdout = std::io::stdout().lock();
    // Nothing useful to do if the parent stopped reading.
    let _ = writeln!(stdout, "{}", response);
    let _ = stdout.flush();
}

fn run(cli: Cli) -> Result<Response, ClientError> {
    let conn = connection(&cli)?;

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let query: Query = serde_json::from_str(input.trim())
        .map_err(|e| ClientError::Protocol(format!("invalid request: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(SocketTransport.exchange(
        &conn,
        &query,
        Duration::from_millis(cli.timeout_ms),
    ))
}

fn connection(cli: &Cli) -> Result<ConnectionInfo, ClientError> {
    if let Some(path) = &cli.unix {
        return Ok(ConnectionInfo::Unix { path: path.clone() });
    }
    match cli.tcp.as_deref() {
        Some([host, port]) => {
            let port = port
                .parse::<u16>()
                .map_err(|e| ClientError::Transport(format!("invalid port '{}': {}", port, e)))?;
            Ok(ConnectionInfo::Tcp {
                host: host.clone(),
                port,
            })
        }
        _ => Err(ClientError::Transport("no daemon address given".to_string())),
    }
}
