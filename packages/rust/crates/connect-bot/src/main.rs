//! connect-bot CLI: webhook server or menu check.
//!
//! Logging: set `RUST_LOG=connect_bot=debug` (or `info`, `warn`) to see bot logs on stderr.

mod cli;
mod nodes;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use connect_bot::{load_runtime_settings, set_config_home_override};

use crate::cli::{Cli, Command};
use crate::nodes::{run_check_menu, run_serve_mode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(conf_dir) = cli.conf.clone() {
        set_config_home_override(conf_dir);
    }
    let runtime_settings = load_runtime_settings();

    // RUST_LOG overrides; --verbose on serve => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let verbose = matches!(&cli.command, Command::Serve { verbose: true, .. });
        EnvFilter::new(if verbose {
            "connect_bot=debug,connect_menu=debug"
        } else {
            "connect_bot=info,connect_menu=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match cli.command {
        Command::Serve {
            bind,
            menu,
            files_dir,
            verbose: _,
        } => run_serve_mode(bind, menu, files_dir, &runtime_settings).await,
        Command::CheckMenu { path } => run_check_menu(&path),
    }
}
