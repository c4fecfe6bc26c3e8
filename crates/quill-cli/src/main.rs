use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quill",
    about = "Quill — buffered, scriptable HTTP responses",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the built-in demo pages.
    ///
    /// Settings are read from quill.toml. When --config is not given and
    /// ./quill.toml does not exist, defaults are used.
    Serve {
        /// Path to quill.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override [server].bind
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Write a quill.toml scaffold
    Init {
        /// Directory to write quill.toml into
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
        /// Overwrite an existing quill.toml
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,quill=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => {
            commands::serve::serve(config.as_deref(), bind.as_deref()).await
        }
        Commands::Init { path, force } => commands::init::init(&path, force),
    }
}
