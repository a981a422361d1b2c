//! minicron: run a command at a fixed interval until interrupted

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use minicron::command_task::CommandTask;
use minicron::config::Settings;
use minicron::logging::{init_logging, set_level};
use minicron::{PeriodicRunner, RunnerOptions};

fn cli() -> Command {
    Command::new("minicron")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run a command periodically on a background thread")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Settings file path (created with defaults if missing)")
                .num_args(1),
        )
        .arg(
            Arg::new("period-ms")
                .short('p')
                .long("period-ms")
                .value_name("MS")
                .help("Milliseconds between runs, 0 starts paused")
                .value_parser(clap::value_parser!(u32))
                .num_args(1),
        )
        .arg(
            Arg::new("name")
                .short('n')
                .long("name")
                .value_name("NAME")
                .help("Runner thread name")
                .num_args(1),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Default log level when RUST_LOG is unset")
                .num_args(1),
        )
        .arg(
            Arg::new("command")
                .value_name("COMMAND")
                .help("Command and arguments to run")
                .action(ArgAction::Append)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .num_args(1..),
        )
}

fn apply_overrides(mut settings: Settings, matches: &ArgMatches) -> Settings {
    if let Some(period_ms) = matches.get_one::<u32>("period-ms") {
        settings.period_ms = *period_ms;
    }
    if let Some(name) = matches.get_one::<String>("name") {
        settings.name = name.clone();
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        settings.log_level = level.clone();
    }
    if let Some(command) = matches.get_many::<String>("command") {
        settings.command = command.cloned().collect();
    }
    settings
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    // Settings problems must be visible, so the logger comes up before they load.
    init_logging(
        matches
            .get_one::<String>("log-level")
            .map(String::as_str)
            .unwrap_or("info"),
    );

    let config_path = match matches.get_one::<String>("config") {
        Some(path) => PathBuf::from(path),
        None => Settings::default_path()?,
    };
    let settings = Settings::load_or_create(&config_path)
        .with_context(|| format!("Failed to load settings from {}", config_path.display()))?;
    let settings = apply_overrides(settings, &matches);

    set_level(&settings.log_level);
    info!("Config file: {}", config_path.display());

    settings.validate()?;
    let task = CommandTask::from_argv(&settings.command)?;

    let runner = PeriodicRunner::start_with_options(
        RunnerOptions::named(settings.name.clone()),
        settings.period_ms,
        move || task.run(),
    )
    .context("Failed to start runner")?;

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .context("Error setting Ctrl-C handler")?;

    info!("Running. Press Ctrl+C to stop.");
    loop {
        match stop_rx.recv_timeout(Duration::from_secs(1)) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                info!("Received interrupt signal, shutting down...");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if runner.has_stopped() {
                    warn!("Runner stopped on its own");
                    break;
                }
            }
        }
    }

    info!("Final status: {}", runner.status());
    if let Err(e) = runner.shutdown() {
        error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let matches = cli()
            .try_get_matches_from([
                "minicron", "-p", "1500", "-n", "flusher", "--", "sync", "-f",
            ])
            .unwrap();
        let settings = apply_overrides(Settings::default(), &matches);
        assert_eq!(settings.period_ms, 1500);
        assert_eq!(settings.name, "flusher");
        assert_eq!(settings.command, vec!["sync", "-f"]);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_cli_without_overrides_keeps_settings() {
        let matches = cli().try_get_matches_from(["minicron"]).unwrap();
        let settings = apply_overrides(Settings::default(), &matches);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_cli_rejects_bad_period() {
        assert!(cli().try_get_matches_from(["minicron", "-p", "soon"]).is_err());
    }
}
