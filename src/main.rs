//! Wrist Query CLI entry point

use std::process::ExitCode;

use clap::Parser;

use wrist_query::cli::{
    app::{init_tracing, load_merged_config, run_interactive, run_oneshot, RunOptions},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    EXIT_ERROR, EXIT_USAGE_ERROR,
};
use wrist_query::domain::config::AppConfig;
use wrist_query::domain::time::parse_timeout;
use wrist_query::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Handle subcommands
    if let Some(Commands::Config { action }) = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Reject a bad --timeout before anything starts
    if let Some(timeout) = cli.timeout.as_deref() {
        if let Err(e) = parse_timeout(timeout) {
            presenter.error(&format!("Invalid timeout: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }

    if let Some(question) = cli.ask.as_deref() {
        if question.trim().is_empty() {
            presenter.error("Question must not be empty");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }

    let cli_config = AppConfig {
        host_socket: cli.socket.clone(),
        timeout: cli.timeout.clone(),
        log_level: None,
        icons: if cli.no_icons { Some(false) } else { None },
    };

    let config = load_merged_config(cli_config).await;
    init_tracing(&config);

    let options = RunOptions::from_config(&config);
    match cli.ask {
        Some(question) => run_oneshot(question, options).await,
        None => run_interactive(options).await,
    }
}
