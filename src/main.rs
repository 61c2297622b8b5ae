//! set_audio_device - Entry Point
//!
//! Reads the config, sets up logging, picks a device service and hands the
//! raw device arguments to `app::run`.

use clap::Parser;
use set_audio_device::app::{self, Outcome};
use set_audio_device::core::config::AppConfig;
use set_audio_device::core::error::Result;
use set_audio_device::device::InMemoryDevices;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Set the default audio device
#[derive(Parser, Debug)]
#[command(name = "set_audio_device")]
#[command(about = "Set the default playback/recording device for each audio role")]
#[command(disable_help_flag = true)]
struct Args {
    /// TOML config file
    #[arg(long, env = "SET_AUDIO_DEVICE_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log_filter: Option<String>,

    /// Device arguments: -in/-out, -cons/-comm, -list and device names
    #[arg(num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match AppConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filter = args.log_filter.as_deref().unwrap_or(&config.log_filter);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    tracing::debug!(tokens = ?args.tokens, "Starting");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = execute(&args.tokens, &config, &mut out);
    let _ = out.flush();

    match result {
        Ok(outcome) => {
            tracing::debug!(?outcome, "Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let code = app::report_error(&e, &config, &mut out, &mut io::stderr());
            let _ = out.flush();
            exit_code(code)
        }
    }
}

fn execute<W: Write>(tokens: &[String], config: &AppConfig, out: &mut W) -> Result<Outcome> {
    if let Some(devices) = &config.simulate {
        tracing::info!("Using {} simulated devices", devices.len());
        let service = InMemoryDevices::from_simulated(devices);
        return app::run(tokens, &service, config, out);
    }

    platform_run(tokens, config, out)
}

#[cfg(windows)]
fn platform_run<W: Write>(tokens: &[String], config: &AppConfig, out: &mut W) -> Result<Outcome> {
    // Nothing to enumerate for a bare usage request
    if tokens.is_empty() {
        return app::run(tokens, &InMemoryDevices::new(), config, out);
    }
    let service = set_audio_device::device::WasapiDevices::new()?;
    app::run(tokens, &service, config, out)
}

#[cfg(not(windows))]
const NO_BACKEND: &str =
    "no audio backend on this platform; add a [[simulate]] device list to the config";

#[cfg(not(windows))]
fn platform_run<W: Write>(tokens: &[String], config: &AppConfig, out: &mut W) -> Result<Outcome> {
    use set_audio_device::core::error::AppError;

    if tokens.is_empty() {
        return app::run(tokens, &InMemoryDevices::new(), config, out);
    }
    Err(AppError::Config(NO_BACKEND.into()))
}

/// Codes are validated to 0..=255 when the config loads
fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
