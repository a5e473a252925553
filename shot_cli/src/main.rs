mod cli;
mod error_fmt;
mod input;
mod output;
mod run;

use clap::Parser;
use cli::{Cli, Commands, DEFAULT_CONFIG_PATH, FILE_GUARD, JSON_MODE, json_mode};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use eyre::WrapErr;
use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(err) = real_main(cli) {
        tracing::debug!(error = ?err, "command failed");
        if json_mode() {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.cmd {
        Commands::Analyze {
            shot,
            profile,
            delays,
            auto_delay,
            no_auto_delay,
            format,
        } => run::run_analyze(
            &mut out,
            &cfg,
            &shot,
            &profile,
            &delays,
            auto_delay,
            no_auto_delay,
            format,
        ),
        Commands::Summary { shot, format } => run::run_summary(&mut out, &cfg, &shot, format),
        Commands::Calibrate {
            shot,
            profile,
            sensor_delay_ms,
            format,
        } => run::run_calibrate(&mut out, &cfg, &shot, &profile, sensor_delay_ms, format),
    }
}

/// Explicit path, else the default file when it exists, else built-in defaults.
fn load_config(path: Option<&Path>) -> eyre::Result<shot_config::Config> {
    match path {
        Some(p) => shot_config::load_file(p),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.is_file() {
                shot_config::load_file(default)
            } else {
                Ok(shot_config::Config::default())
            }
        }
    }
}

fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    logging: &shot_config::Logging,
) -> eyre::Result<()> {
    // RUST_LOG wins, then --log-level, then [logging].level
    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info")
        .to_ascii_lowercase();
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let console = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match &logging.file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file must name a file"))?;
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = match logging.rotation.as_deref().map(str::to_ascii_lowercase).as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console.with_filter(filter()))
        .with(file)
        .try_init()
        .wrap_err("failed to install log subscriber")?;
    Ok(())
}
