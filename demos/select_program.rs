//! Example: Selecting the main program
//!
//! Run with: cargo run --example select_program [host] [path]
//!
//! With a host, only selects `path` and verifies it. Without a host the
//! example runs against the in-memory simulator and also shows MDI and cycle
//! start, which would move axes on a real machine.
//!
//! This example demonstrates:
//! - Selecting a main program and verifying the path before and after
//! - Reporting the detailed error behind an ambiguous rejection
//! - Switching to MDI, sending a block and starting the cycle (simulator only)

use focas_client::{
    DetailCause, FocasError, OperationMode, Session, SessionConfig, SimulatedController,
    Transport,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_PATH: &str = "//CNC_MEM/USER/PATH1/O2000";

fn main() -> focas_client::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next();
    let path = args.next().unwrap_or_else(|| DEFAULT_PATH.to_string());

    match host {
        Some(host) => select_and_verify(&Session::connect(SessionConfig::new(host))?, &path),
        None => {
            let sim = SimulatedController::new();
            sim.add_program(DEFAULT_PATH);
            let session = Session::with_transport(sim, SessionConfig::new("simulator"))?;
            select_and_verify(&session, &path)?;
            simulated_mdi(&session)
        }
    }
}

pub(crate) fn select_and_verify<T: Transport>(
    session: &Session<T>,
    path: &str,
) -> focas_client::Result<()> {
    // =========================================================================
    // Select and Verify
    // =========================================================================

    println!("=== Selecting {path} ===\n");

    let before = session.read_main_program_path()?;
    println!("Before: {before}");

    match session.select_main_program(path) {
        Ok(()) => {
            let after = session.read_main_program_path()?;
            println!("After:  {after}");
            if after == path {
                println!("Selection verified");
            } else {
                println!("Controller reports a different program");
            }
        }
        Err(e) => report_rejection(&e),
    }

    Ok(())
}

fn simulated_mdi<T: Transport>(session: &Session<T>) -> focas_client::Result<()> {
    // A malformed path shows the detail fetch.
    if let Err(e) = session.select_main_program("CNC_MEM O2000") {
        report_rejection(&e);
    }

    // =========================================================================
    // MDI
    // =========================================================================

    println!("\n=== MDI ===\n");

    session.set_mode(OperationMode::Mdi)?;
    println!("Mode: {}", session.read_status()?.mode());
    session.write_mdi_program("G91 G01 X10. F500;")?;
    session.cycle_start()?;
    println!("Cycle started");
    session.set_mode(OperationMode::Auto)?;

    Ok(())
}

fn report_rejection(error: &FocasError) {
    println!("Rejected: {error}");
    if let Some(code) = error.native_code() {
        println!("  native code: {code}");
    }
    match error.detail().map(|detail| (detail.detail_error_code, detail.cause())) {
        Some((code, DetailCause::FileNotFound)) => println!("  program not found (detail {code})"),
        Some((code, DetailCause::FormatError)) => println!("  malformed path (detail {code})"),
        Some((code, DetailCause::Unknown(_))) => println!("  unrecognized detail {code}"),
        None => {}
    }
    if let FocasError::DetailFetchFailed { source, .. } = error {
        println!("  detail fetch failed: {source}");
    }
}
