use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "connect-bot")]
#[command(about = "Menu-driven contact-center text bot: webhook server and menu checker.")]
pub(crate) struct Cli {
    /// Override config directory (reads `<dir>/connect-bot/settings.yaml`).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Serve the platform webhook. Defaults come from settings.yaml.
    Serve {
        /// Listen address (e.g. 0.0.0.0:8080)
        #[arg(long)]
        bind: Option<String>,

        /// Menu YAML file
        #[arg(long)]
        menu: Option<PathBuf>,

        /// Directory holding menu attachments
        #[arg(long)]
        files_dir: Option<PathBuf>,

        /// Debug logging for the bot (ignored when RUST_LOG is set)
        #[arg(long, short = 'v')]
        verbose: bool,
    },
    /// Load a menu file, report problems and print a summary.
    CheckMenu {
        /// Menu YAML file
        path: PathBuf,
    },
}
