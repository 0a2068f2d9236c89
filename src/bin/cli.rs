//! tldr-query - query the project's tldr daemon from hooks and scripts.
//!
//! Usage:
//!   tldr-query ping                       # Daemon liveness
//!   tldr-query search <pattern>           # Pattern search
//!   tldr-query impact <func>              # Callers of a function
//!   tldr-query cfg <file> <function>      # Control-flow graph
//!   tldr-query --sync status              # Blocking form via tldr-send
//!
//! Prints one JSON document on stdout. A cold or missing daemon is reported
//! in that document, not through the exit code.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tldr_client::{
    ClientConfig, Consumed, DaemonClient, ProjectContext, Query, SemanticAction, SliceDirection,
};

const DEFAULT_LANGUAGE: &str = "python";

#[derive(Parser)]
#[command(name = "tldr-query")]
#[command(about = "tldr-query - ask the project's code analysis daemon", long_about = None)]
struct Cli {
    /// Project root (default: $CLAUDE_PROJECT_DIR, then current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Use the blocking, helper-process form
    #[arg(long, global = true)]
    sync: bool,

    /// Override the query timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the daemon answers
    Ping,

    /// Search the project for a pattern
    Search {
        pattern: String,

        #[arg(short, long, default_value = "10")]
        max_results: usize,
    },

    /// List callers of a function
    Impact { func: String },

    /// Extract the structure of one file
    Extract { file: String },

    /// Daemon status report
    Status,

    /// Find unreachable code
    Dead {
        /// Entry point names (repeatable)
        #[arg(long = "entry-point")]
        entry_points: Vec<String>,

        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// Architecture layers
    Arch {
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// Control-flow graph of a function
    Cfg {
        file: String,
        function: String,

        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// Data-flow graph of a function
    Dfg {
        file: String,
        function: String,

        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// Program slice from a line
    Slice {
        file: String,
        function: String,
        line: u32,

        /// backward or forward
        #[arg(short, long, default_value = "backward")]
        direction: SliceDirection,

        #[arg(long)]
        variable: Option<String>,
    },

    /// Project call graph
    Calls {
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// Pre-build the call graph cache
    Warm {
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// Semantic search over the index
    SemanticSearch {
        query: String,

        #[arg(short, default_value = "10")]
        k: usize,
    },

    /// Build the semantic index
    SemanticIndex {
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// File tree
    Tree {
        /// File extensions to include (repeatable)
        #[arg(long = "ext")]
        extensions: Vec<String>,

        #[arg(long)]
        include_hidden: bool,
    },

    /// Functions and classes per file
    Structure {
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,

        #[arg(short, long, default_value = "50")]
        max_results: usize,
    },

    /// Call context around an entry point
    Context {
        entry: String,

        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,

        #[arg(short, long, default_value = "2")]
        depth: usize,
    },

    /// Imports declared by a file
    Imports {
        file: String,

        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// Files importing a module
    Importers {
        module: String,

        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },
}

impl Commands {
    fn into_query(self) -> Query {
        match self {
            Commands::Ping => Query::Ping,
            Commands::Search {
                pattern,
                max_results,
            } => Query::Search {
                pattern,
                max_results,
            },
            Commands::Impact { func } => Query::Impact { func },
            Commands::Extract { file } => Query::Extract { file },
            Commands::Status => Query::Status,
            Commands::Dead {
                entry_points,
                language,
            } => Query::Dead {
                entry_points,
                language,
            },
            Commands::Arch { language } => Query::Arch { language },
            Commands::Cfg {
                file,
                function,
                language,
            } => Query::Cfg {
                file,
                function,
                language,
            },
            Commands::Dfg {
                file,
                function,
                language,
            } => Query::Dfg {
                file,
                function,
                language,
            },
            Commands::Slice {
                file,
                function,
                line,
                direction,
                variable,
            } => Query::Slice {
                file,
                function,
                line,
                direction,
                variable,
            },
            Commands::Calls { language } => Query::Calls { language },
            Commands::Warm { language } => Query::Warm { language },
            Commands::SemanticSearch { query, k } => {
                Query::Semantic(SemanticAction::Search { query, k })
            }
            Commands::SemanticIndex { language } => {
                Query::Semantic(SemanticAction::Index { language })
            }
            Commands::Tree {
                extensions,
                include_hidden,
            } => Query::Tree {
                extensions,
                exclude_hidden: !include_hidden,
            },
            Commands::Structure {
                language,
                max_results,
            } => Query::Structure {
                language,
                max_results,
            },
            Commands::Context {
                entry,
                language,
                depth,
            } => Query::Context {
                entry,
                language,
                depth,
            },
            Commands::Imports { file, language } => Query::Imports { file, language },
            Commands::Importers { module, language } => Query::Importers { module, language },
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TLDR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let project = match cli.project {
        Some(root) => ProjectContext::new(root.canonicalize().unwrap_or(root)),
        None => ProjectContext::from_env()?,
    };

    let mut config = ClientConfig::load(project.root());
    if let Some(ms) = cli.timeout_ms {
        config.query_timeout_ms = ms;
    }
    let client = DaemonClient::new(config);

    let query = cli.command.into_query();
    let consumed = Consumed::of(&query);

    let response = if cli.sync {
        client.query_sync(&query, project.root())
    } else {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(client.query(&query, project.root()))
    };

    print_json(&consumed.apply(&response))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
