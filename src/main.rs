mod ai;
mod cli;
mod commands;
mod config;
mod editor;
mod git;
mod logging;
mod prompts;
mod refine;

use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};

use cli::butler::butler_error;
use commands::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // .env ファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    let mut cli = Cli::parse();

    // ログシステムの初期化（_guard は main 終了まで保持する必要がある）
    let _guard = logging::init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "commit-butler started");

    let result = match cli.command.take() {
        Some(Command::Config(args)) => commands::config::run(args.into()),
        None => commands::generate::run(cli.generate_options()).await,
    };

    match result {
        Ok(()) => {
            info!("commit-butler finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "commit-butler failed");
            butler_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
