//! Invocation runner
//!
//! Everything the binary does between reading its arguments and choosing an
//! exit code, written against `impl Write` and any [`DeviceService`] so it
//! can be driven from tests.

use crate::command::compiler::{parse_invocation, CompiledCommands, Invocation};
use crate::command::dispatcher::Dispatcher;
use crate::core::config::AppConfig;
use crate::core::error::{AppError, Result};
use crate::core::types::Direction;
use crate::device::{list_names, DeviceService};
use std::io::Write;

pub const USAGE: &str = "\
Set the default audio device.

\tset_audio_device [-in/-out] (-cons/-comm) [\"Device Name\"] ...

Must specify audio direction:
\tinput (-in) or output (-out)
Optionally specify the audio role:
\tconsole/general purpose (-cons) or communications (-comm)
\tIf omitted, both are set
Lastly specify the device name:
\tCase sensitive.
\tUse quotes if spaces are necessary.
\tCan be a substring of the device name.
\tIf it matches multiple devices, each is set in turn and the last one wins.

Example usage:
\tset_audio_device -in \"Microphone\" -out -comm \"Headset\" -out -cons \"Speakers\"

List available device names:
\tset_audio_device (-in/-out) -list

Options (before any device arguments):
\t--config <path>       TOML config file (also SET_AUDIO_DEVICE_CONFIG)
\t--log-filter <filter> tracing filter, overridden by RUST_LOG
";

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do; usage was printed
    Usage,
    /// Device names printed
    Listed(usize),
    /// Commands dispatched; number of confirmations printed
    Applied(usize),
}

/// Run one command line against `service`
///
/// Confirmations are written to `out` as each direction finishes, so the
/// ones made before a fatal error are still reported.
pub fn run<I, S, D, W>(tokens: I, service: &D, config: &AppConfig, out: &mut W) -> Result<Outcome>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    D: DeviceService,
    W: Write,
{
    let tokens: Vec<S> = tokens.into_iter().collect();
    if tokens.is_empty() {
        write_usage(out)?;
        return Ok(Outcome::Usage);
    }

    match parse_invocation(&tokens, config.compile_options())? {
        Invocation::List { direction } => list(service, direction, out),
        Invocation::Apply(compiled) if compiled.is_empty() => {
            write_usage(out)?;
            Ok(Outcome::Usage)
        }
        Invocation::Apply(compiled) => apply(service, &compiled, config, out),
    }
}

pub fn write_usage<W: Write>(out: &mut W) -> std::io::Result<()> {
    out.write_all(USAGE.as_bytes())
}

/// Report a failed run and pick the exit code
///
/// Syntax errors go to `out` followed by the usage text and exit with
/// `[exit] syntax_error`. Every other error goes to `err` alone and exits
/// with `[exit] platform_error`.
pub fn report_error<O: Write, E: Write>(
    error: &AppError,
    config: &AppConfig,
    out: &mut O,
    err: &mut E,
) -> i32 {
    if error.is_syntax() {
        let _ = writeln!(out, "Error: {}\n", error);
        let _ = write_usage(out);
        config.exit.syntax_error
    } else {
        let _ = writeln!(err, "Error: {}", error);
        config.exit.platform_error
    }
}

fn list<D: DeviceService, W: Write>(
    service: &D,
    direction: Option<Direction>,
    out: &mut W,
) -> Result<Outcome> {
    let names = list_names(service, direction)?;
    for name in &names {
        writeln!(out, "{}", name)?;
    }
    Ok(Outcome::Listed(names.len()))
}

fn apply<D: DeviceService, W: Write>(
    service: &D,
    compiled: &CompiledCommands,
    config: &AppConfig,
    out: &mut W,
) -> Result<Outcome> {
    let policy = config.dispatch.failure_policy;
    let dispatcher = Dispatcher::new(service).with_policy(policy);
    let mut confirmed = 0;

    for direction in Direction::ALL {
        let commands = compiled.for_direction(direction);
        let result = dispatcher.dispatch(direction, commands);

        for applied in &result.applied {
            writeln!(out, "{}", applied)?;
        }
        for skipped in &result.skipped {
            writeln!(out, "warning: {}", skipped)?;
        }
        confirmed += result.applied.len();

        if let Some(error) = result.error {
            return Err(error.into());
        }
    }

    Ok(Outcome::Applied(confirmed))
}
