//! # see - Main Entry Point
//!
//! Parses arguments, validates the preload library, then runs the traced
//! program to completion and exits with the program's own exit code.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;

use see::cli::Args;
use see::domain::LaunchError;
use see::export::JsonReportExporter;
use see::preflight::run_preflight_checks;
use see::session::run_session;

// Exit codes for failures of see itself
const EXIT_ERROR: i32 = 1;
const EXIT_NOT_FOUND: i32 = 127;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    std::process::exit(match run() {
        Ok(code) => code,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LaunchError>() {
        Some(LaunchError::ProgramNotFound(_)) => EXIT_NOT_FOUND,
        _ => EXIT_ERROR,
    }
}

#[tokio::main]
async fn run() -> Result<i32> {
    let args = Args::parse();

    let library = if args.skip_preflight {
        args.library.clone()
    } else {
        run_preflight_checks(&args.library)?
    };
    let config = args.session_config(library)?;
    info!("tracing {} with {}", config.program_name.to_string_lossy(), config.library.display());

    // The blocking session owns stdout; this task only watches for Ctrl+C
    let session = tokio::task::spawn_blocking(move || run_session(&config, std::io::stdout()));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(session, ctrl_c);

    let mut interrupted = false;
    let report = loop {
        tokio::select! {
            joined = &mut session => {
                break joined.context("Session task failed")??;
            }
            _ = &mut ctrl_c, if !interrupted => {
                // The terminal delivered SIGINT to the program too; keep relaying
                warn!("interrupted, waiting for the traced program to exit");
                interrupted = true;
            }
        }
    };

    if let Some(ref export_path) = args.export {
        let exporter = JsonReportExporter::new(report.summary.reports);
        let file = File::create(export_path).context("Failed to create report output file")?;
        exporter.export(BufWriter::new(file)).context("Failed to export reports")?;
        info!("saved {} reports to {}", exporter.len(), export_path.display());
    }

    Ok(report.status.exit_code())
}
