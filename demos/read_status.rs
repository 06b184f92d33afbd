//! Example: Reading machine state
//!
//! Run with: cargo run --example read_status [host]
//!
//! Without a host the example runs against the in-memory simulator.
//!
//! This example demonstrates:
//! - Reading the controller ID
//! - Reading status flags and the derived operation mode
//! - Reading axis positions, feed and spindle speed
//! - Reading program numbers and the main program path

use focas_client::{
    MachineStatus, PositionSet, Session, SessionConfig, SimulatedController, SpindleInfo,
    Transport,
};
use tracing_subscriber::EnvFilter;

fn main() -> focas_client::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match std::env::args().nth(1) {
        Some(host) => run(&Session::connect(SessionConfig::new(host))?),
        None => {
            let sim = SimulatedController::new();
            sim.set_status(MachineStatus {
                aut: 1,
                run: 3,
                ..Default::default()
            });
            sim.set_positions(PositionSet {
                absolute: vec![125_000, -40_500, 10_000],
                machine: vec![325_000, 159_500, -90_000],
                relative: vec![25_000, 0, 0],
                distance: vec![5_000, 0, -2_000],
            });
            sim.set_spindle(SpindleInfo {
                feed: 1_500,
                spindle: 8_000,
            });
            run(&Session::with_transport(sim, SessionConfig::new("simulator"))?)
        }
    }
}

fn run<T: Transport>(session: &Session<T>) -> focas_client::Result<()> {
    println!("CNC ID: {}\n", session.read_id()?);

    // =========================================================================
    // Status
    // =========================================================================

    let status = session.read_status()?;
    println!("=== Status ===\n");
    println!("Mode:      {}", status.mode());
    println!("Run:       {}", status.run);
    println!("Motion:    {}", status.motion);
    println!("Emergency: {}", status.emergency);
    println!("Alarm:     {}", status.alarm);

    // =========================================================================
    // Axes
    // =========================================================================

    let positions = session.read_position()?;
    println!("\n=== Axes ({}) ===\n", positions.axis_count());
    println!("{:>4} {:>12} {:>12} {:>12} {:>12}", "axis", "absolute", "machine", "relative", "to go");
    for axis in 0..positions.axis_count() {
        println!(
            "{:>4} {:>12} {:>12} {:>12} {:>12}",
            axis + 1,
            positions.absolute[axis],
            positions.machine[axis],
            positions.relative[axis],
            positions.distance[axis],
        );
    }

    let speed = session.read_spindle()?;
    println!("\nFeed rate: {}", speed.feed);
    println!("Spindle:   {}", speed.spindle);

    // =========================================================================
    // Programs
    // =========================================================================

    let programs = session.read_program_number()?;
    println!("\n=== Programs ===\n");
    println!("Running: O{}", programs.running);
    println!("Main:    O{}", programs.main);
    println!("Path:    {}", session.read_main_program_path()?);

    Ok(())
}
