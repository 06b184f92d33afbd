//! Example: Writing PMC memory
//!
//! Run with: cargo run --example write_pmc [host] [address] [value]
//!
//! With a host, writes `value` (default 0) to the single byte `address`
//! (default `Y10`) and reads it back. Nothing else is written to a real
//! controller. Without a host the example runs against the in-memory
//! simulator and also walks through the other write patterns.
//!
//! This example demonstrates:
//! - Writing a byte and verifying it by reading back
//! - Changing one bit with read-modify-write
//! - Writing wider data types
//! - Handling a write to a read-only area

use focas_client::utils::{format_binary, set_bit};
use focas_client::{
    AddressRange, BitAddress, DataType, ErrorKind, FocasError, PmcArea, PmcValue, Session,
    SessionConfig, SimulatedController, Transport,
};
use tracing_subscriber::EnvFilter;

fn main() -> focas_client::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next();
    let target = parse_byte_address(args.next().as_deref().unwrap_or("Y10"))?;
    let value = match args.next() {
        Some(text) => text
            .parse::<u8>()
            .map_err(|_| FocasError::invalid_parameter("value", format!("'{text}' is not 0-255")))?,
        None => 0,
    };

    // =========================================================================
    // Connect to CNC
    // =========================================================================

    match host {
        Some(host) => {
            let session = Session::connect(SessionConfig::new(host))?;
            write_and_verify(&session, target, value)
        }
        None => {
            let session =
                Session::with_transport(SimulatedController::new(), SessionConfig::new("simulator"))?;
            write_and_verify(&session, target, value)?;
            simulated_tour(&session)
        }
    }
}

/// Parses `<area><byte>`, e.g. `Y10`, as a one-byte range.
pub(crate) fn parse_byte_address(text: &str) -> focas_client::Result<AddressRange> {
    let invalid = || FocasError::invalid_address(format!("'{text}' is not of the form Y10"));
    let split = text.char_indices().nth(1).map(|(i, _)| i).ok_or_else(invalid)?;
    let (area, byte) = text.split_at(split);
    let area: PmcArea = area.parse()?;
    let byte: u16 = byte.parse().map_err(|_| invalid())?;
    Ok(AddressRange::single(area, DataType::Byte, byte))
}

pub(crate) fn write_and_verify<T: Transport>(
    session: &Session<T>,
    target: AddressRange,
    value: u8,
) -> focas_client::Result<()> {
    // =========================================================================
    // Write and Verify
    // =========================================================================

    println!("=== Write and Verify ===\n");
    println!("CNC ID: {}", session.read_id()?);

    println!("{target} before: {:?}", session.read_range(target)?);
    session.write_range(target, &[PmcValue::Byte(value)])?;
    let after = session.read_range(target)?;
    println!("{target} after:  {after:?}");
    if after == [PmcValue::Byte(value)] {
        println!("Verified");
    } else {
        println!("Mismatch: the controller changed {target} in between");
    }
    Ok(())
}

fn simulated_tour<T: Transport>(session: &Session<T>) -> focas_client::Result<()> {
    // =========================================================================
    // Read-Modify-Write of One Bit
    // =========================================================================

    println!("\n=== Setting Y1.4 ===\n");

    // Not atomic: the controller may change other bits of Y1 meanwhile.
    let address = BitAddress::new(PmcArea::Y, 1, 4)?;
    let current = session
        .read_range(address.byte_range())?
        .first()
        .and_then(PmcValue::as_byte)
        .unwrap_or_default();
    let updated = set_bit(current, address.bit(), true);
    session.write_range(address.byte_range(), &[PmcValue::Byte(updated)])?;
    println!("Y1: {} -> {}", format_binary(current), format_binary(updated));
    println!("{address} = {}", session.read_bit(address)?);

    // =========================================================================
    // Wider Types
    // =========================================================================

    println!("\n=== Wider Types ===\n");

    let words = AddressRange::new(PmcArea::R, DataType::Word, 100, 102)?;
    session.write_range(
        words,
        &[PmcValue::Word(100), PmcValue::Word(-200), PmcValue::Word(300)],
    )?;
    println!("R100-R102 = {:?}", session.read_range(words)?);

    let float = AddressRange::single(PmcArea::D, DataType::Float, 20);
    session.write_range(float, &[PmcValue::Float(3.25)])?;
    println!("D20 (FLOAT) = {:?}", session.read_range(float)?);

    // =========================================================================
    // Read-Only Areas
    // =========================================================================

    println!("\n=== Read-Only Areas ===\n");

    let x0 = AddressRange::single(PmcArea::X, DataType::Byte, 0);
    match session.write_range(x0, &[PmcValue::Byte(1)]) {
        Ok(()) => println!("X0 written"),
        Err(e) if e.kind() == ErrorKind::InvalidAddress => println!("Refused locally: {e}"),
        Err(e) => return Err(e),
    }

    session.close();
    println!("\nDone.");
    Ok(())
}
