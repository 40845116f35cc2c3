mod commands;
mod diagnostics;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stepref::config::CONFIG_FILE;
use stepref::error::Error;
use tracing_subscriber::EnvFilter;

use crate::commands::CliPosition;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "STEPREF_LOG";

#[derive(Parser)]
#[command(name = "stepref", version, about = "Resolve references and IFC type documentation in STEP files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Config file (defaults to .stepref.toml in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the line defining the #reference at a position
    Definition {
        /// STEP file
        file: PathBuf,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
    },
    /// Look up documentation for an IFC type name
    Doc {
        /// Type name, e.g. IFCWALL
        type_name: String,
        /// Schema identifier (defaults to the newest known)
        #[arg(long)]
        schema: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Open the documentation page in a browser
        #[arg(long)]
        open: bool,
    },
    /// Resolve whatever is under a position: reference or type name
    Hover {
        /// STEP file
        file: PathBuf,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the schema declared in each file's header
    Schema {
        /// Files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the schema whenever the file changes
    Watch {
        /// STEP file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config_path = cli.config.unwrap_or_else(|| return PathBuf::from(CONFIG_FILE));

    let result: Result<ExitCode, Error> = match cli.command {
        Commands::Definition { file, line, column } => {
            commands::definition(&config_path, &file, &CliPosition { column, line })
        },
        Commands::Doc { type_name, schema, json, open } => {
            commands::doc(&config_path, &type_name, schema.as_deref(), json, open).await
        },
        Commands::Hover { file, line, column, json } => {
            commands::hover(&config_path, &file, &CliPosition { column, line }, json).await
        },
        Commands::Schema { paths } => commands::schema(&paths),
        Commands::Watch { file } => watch::run(&file),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2)
        },
    };
}

/// Install a stderr subscriber. `STEPREF_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| return EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
