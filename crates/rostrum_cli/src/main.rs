//! `rostrum-host` entry point.
//!
//! # Responsibility
//! - Parse the command line into a `HostConfig`.
//! - Run one script with the module registry wired into its interpreter.
//! - Report failures through the host loggers and map them to the exit code.
//!
//! # Invariants
//! - Logging is initialized before any other host component runs.
//! - A panic escaping the run is logged to both loggers, then the process
//!   aborts.

use clap::Parser;
use log::{error, info};
use rostrum_core::config::default_modules_dir;
use rostrum_core::logging::{CRITICAL_TARGET, HOST_FATAL_TARGET};
use rostrum_core::{
    debug_break, guard, init_logging, initialize_interpreter_state, load_fingerprinted,
    new_state, shutdown_logging, HostConfig, HostResult, LogLevel, LoggingConfig,
    Manager,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Rostrum script host command line.
#[derive(Parser, Debug)]
#[command(name = "rostrum-host")]
#[command(about = "Runs a Lua script with Rostrum extension modules available")]
#[command(version)]
struct Cli {
    /// Directory scanned for `.rmod` extension modules
    #[arg(long, value_name = "DIR", env = "ROSTRUM_MODULES_DIR")]
    modules_dir: Option<PathBuf>,

    /// Initial level of the primary logger
    #[arg(
        long,
        value_name = "LEVEL",
        env = "ROSTRUM_LOG_LEVEL",
        default_value = "trace",
        value_parser = parse_log_level
    )]
    log_level: LogLevel,

    /// Do not echo primary log records to stdout
    #[arg(long)]
    quiet: bool,

    /// Script to run
    script: PathBuf,

    /// Arguments passed to the script as one sequence table
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Cli {
    fn host_config(&self) -> HostConfig {
        HostConfig {
            modules_dir: self
                .modules_dir
                .clone()
                .unwrap_or_else(default_modules_dir),
            logging: LoggingConfig {
                level: self.log_level,
                console: !self.quiet,
                ..LoggingConfig::default()
            },
        }
    }
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::parse(value).map_err(|err| err.to_string())
}

fn main() -> ExitCode {
    rostrum_core::system::mark_process_start();
    let cli = Cli::parse();
    let config = cli.host_config();

    if let Err(err) = init_logging(&config.logging) {
        eprintln!("rostrum-host: {err}");
        return ExitCode::FAILURE;
    }

    let outcome = guard(|| run(&config, &cli.script, &cli.args));
    let status = match outcome {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(err)) if err.is_script_error() => {
            error!(
                target: CRITICAL_TARGET,
                "event=script_run module=cli status=error severity=critical error={err}"
            );
            ExitCode::FAILURE
        }
        Ok(Err(err)) => {
            error!(
                target: HOST_FATAL_TARGET,
                "event=host_run module=cli status=error severity=critical error={err}"
            );
            ExitCode::FAILURE
        }
        Err(fault) => {
            error!(
                target: HOST_FATAL_TARGET,
                "event=host_fault module=cli status=error severity=critical code={:#x} name={} message={}",
                fault.code,
                fault.name,
                fault.message
            );
            shutdown_logging();
            debug_break();
        }
    };

    shutdown_logging();
    status
}

fn run(config: &HostConfig, script: &Path, args: &[String]) -> HostResult<()> {
    let lua = new_state();
    let manager = Manager::new(config.modules_dir.clone()).into_shared();
    initialize_interpreter_state(&lua, &manager)?;
    manager.borrow_mut().rescan()?;

    let script = load_fingerprinted(&lua, script)?;
    info!(
        "event=script_run module=cli status=start fingerprint={:#010x} args={}",
        script.fingerprint,
        args.len()
    );
    let script_args = lua.create_sequence_from(args.iter().cloned())?;
    script.function.call::<()>(script_args)?;
    info!("event=script_run module=cli status=ok");
    Ok(())
}
