//! Example: Reading PMC bytes and bits
//!
//! Run with: cargo run --example read_pmc [host]
//!
//! Without a host the example runs against the in-memory simulator.
//!
//! This example demonstrates:
//! - Reading byte ranges from read-only areas (X, F)
//! - Reading individual bits by address and by `X7.6` notation
//! - Reading wider data types (WORD, LONG, DOUBLE)
//! - Using utility functions for bit analysis

use focas_client::utils::{format_binary, format_bits, format_hex, get_on_bits};
use focas_client::{
    AddressRange, BitAddress, DataType, PmcArea, PmcValue, Session, SessionConfig,
    SimulatedController, Transport,
};
use tracing_subscriber::EnvFilter;

fn main() -> focas_client::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // =========================================================================
    // Connect to CNC
    // =========================================================================

    match std::env::args().nth(1) {
        Some(host) => run(&Session::connect(SessionConfig::new(host))?),
        None => {
            let sim = SimulatedController::new();
            sim.set_bytes(PmcArea::X, 0, &[0x01, 0x00, 0x24, 0x00, 0x00, 0x00, 0x00, 0xC0]);
            sim.set_bytes(PmcArea::D, 0, &1234i32.to_le_bytes());
            let session = Session::with_transport(sim, SessionConfig::new("simulator"))?;
            run(&session)
        }
    }
}

fn run<T: Transport>(session: &Session<T>) -> focas_client::Result<()> {
    println!("CNC ID: {}", session.read_id()?);

    // =========================================================================
    // Reading Bytes
    // =========================================================================

    println!("\n=== Reading Bytes ===\n");

    let range = AddressRange::new(PmcArea::X, DataType::Byte, 0, 7)?;
    let values = session.read_range(range)?;
    for (offset, value) in values.iter().enumerate() {
        if let Some(byte) = value.as_byte() {
            println!("X{offset} = {byte:3} ({}) {}", format_hex(byte), format_binary(byte));
        }
    }

    let f0 = session.read_range(AddressRange::single(PmcArea::F, DataType::Byte, 0))?;
    println!("F0 = {f0:?}");

    // =========================================================================
    // Reading Bits
    // =========================================================================

    println!("\n=== Reading Bits ===\n");

    let bit = session.read_bit(BitAddress::new(PmcArea::X, 7, 7)?)?;
    println!("X7.7 = {bit}");

    let address: BitAddress = "X2.5".parse()?;
    println!("{address} = {}", session.read_bit(address)?);

    if let Some(PmcValue::Byte(x2)) = session.read_range(address.byte_range())?.first().copied() {
        println!("\nBits ON in X2: {:?}", get_on_bits(x2));
    }

    let x7 = session.read_range(AddressRange::single(PmcArea::X, DataType::Byte, 7))?;
    if let Some(byte) = x7.first().and_then(PmcValue::as_byte) {
        println!("\nAll bits of X7:");
        println!("{}", format_bits("X7", byte));
    }

    // =========================================================================
    // Wider Types
    // =========================================================================

    println!("\n=== Wider Types ===\n");

    let words = session.read_range(AddressRange::new(PmcArea::R, DataType::Word, 0, 3)?)?;
    println!("R0-R3 (WORD): {words:?}");

    let long = session.read_range(AddressRange::single(PmcArea::D, DataType::Long, 0))?;
    println!("D0 (LONG): {long:?}");

    let doubles = session.read_range(AddressRange::new(PmcArea::D, DataType::Double, 10, 11)?)?;
    println!("D10-D11 (DOUBLE): {doubles:?}");

    session.close();
    println!("\nDone.");
    Ok(())
}
