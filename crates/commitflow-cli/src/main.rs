mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use commitflow_core::FlowError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "commitflow",
    about = "Commit automation: run project gates, report git state, commit",
    version,
    propagate_version = true
)]
struct Cli {
    /// Invocation root (default: current directory)
    #[arg(long, global = true, env = "COMMITFLOW_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run format, typecheck, lint and test scripts from package.json
    Gate {
        /// Never run the test script
        #[arg(long)]
        skip_tests: bool,
    },

    /// Print changed files, diff and commitlint config for message generation
    Context {
        /// Only consider changes already in the index
        #[arg(long)]
        staged_only: bool,
    },

    /// Commit the staged changes with the given message
    Commit {
        /// Commit message, used verbatim (may start with '-')
        #[arg(allow_hyphen_values = true)]
        message: Option<String>,
    },
}

fn main() {
    // Usage errors exit 1; 2 belongs to "no changes" / "nothing staged".
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Gate { skip_tests } => cmd::gate::run(&root, skip_tests, cli.json),
        Commands::Context { staged_only } => cmd::context::run(&root, staged_only, cli.json),
        Commands::Commit { message } => cmd::commit::run(&root, message.as_deref(), cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        let code = e
            .downcast_ref::<FlowError>()
            .map(FlowError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
