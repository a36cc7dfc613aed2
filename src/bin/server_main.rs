//! gemini-relay server
//!
//! Serves an OpenAI-compatible chat endpoint backed by Gemini.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use gemini_relay_lib::{config, logger};

#[derive(Parser)]
#[command(
    name = "gemini-relay-server",
    about = "OpenAI-compatible chat endpoint backed by the Gemini API",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Settings file (TOML). Defaults to <data_dir>/gemini-relay/settings.toml
    #[arg(short, long, env = "GEMINI_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides the settings file
    #[arg(short, long)]
    listen: Option<String>,

    /// Gemini model identifier, overrides the settings file
    #[arg(short, long)]
    model: Option<String>,

    /// Log level used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logger::init(logger::LogLevel::from_str(&cli.log_level).unwrap_or(logger::LogLevel::Info));

    let path = cli.config.unwrap_or_else(config::settings_path);
    let mut settings = match config::load_from(&path) {
        Ok(settings) => settings.with_env_overrides(),
        Err(e) => {
            logger::error("app", &e.to_string());
            return ExitCode::FAILURE;
        }
    };
    if let Some(listen) = cli.listen {
        settings.listen_addr = listen;
    }
    if let Some(model) = cli.model.filter(|m| !m.trim().is_empty()) {
        settings.model = model;
    }

    match gemini_relay_lib::run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::error("app", &e.to_string());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn every_flag_has_help() {
        let cmd = Cli::command();
        cmd.clone().debug_assert();
        for arg in cmd.get_arguments() {
            let id = arg.get_id().as_str();
            if id == "help" || id == "version" {
                continue;
            }
            assert!(arg.get_help().is_some(), "--{} has no help text", id);
        }
    }
}
