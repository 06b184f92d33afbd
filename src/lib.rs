//! # FOCAS CNC Client Library
//!
//! A Rust client for CNC controllers speaking a FOCAS-style protocol: read
//! machine, axis and spindle state, read and write PMC memory, and select the
//! main NC program.
//!
//! This is a **protocol-only** library. It does no polling, scheduling or
//! report formatting. Each call produces one native request per fragment and
//! nothing is retried, cached or reconnected.
//!
//! ## Features
//!
//! - **Typed addressing** - 14 PMC areas and five data types as enums,
//!   validated before any network interaction
//! - **Transparent fragmentation** - wide ranges are split by the transfer
//!   cap and reassembled in address order
//! - **Structured errors** - native codes travel as typed fields; ambiguous
//!   program-selection failures are enriched with the controller's detailed
//!   error
//! - **Scoped sessions** - the link closes when the [`Session`] is dropped
//! - **Testable** - [`SimulatedController`] runs every operation in memory
//!
//! ## Quick Start
//!
//! ```no_run
//! use focas_client::{AddressRange, BitAddress, DataType, PmcArea, Session, SessionConfig};
//!
//! fn main() -> focas_client::Result<()> {
//!     let session = Session::connect(SessionConfig::new("172.18.0.4"))?;
//!     println!("CNC ID: {}", session.read_id()?);
//!
//!     // X0-X10 as bytes
//!     let range = AddressRange::new(PmcArea::X, DataType::Byte, 0, 10)?;
//!     println!("{:?}", session.read_range(range)?);
//!
//!     // One bit
//!     let on = session.read_bit(BitAddress::new(PmcArea::X, 7, 6)?)?;
//!     println!("X7.6 = {on}");
//!
//!     let status = session.read_status()?;
//!     println!("mode = {}", status.mode());
//!     Ok(())
//! }
//! ```
//!
//! ## PMC Areas
//!
//! | Area | Description | Client Write |
//! |------|-------------|:------------:|
//! | [`PmcArea::G`] | Signals from PMC to CNC | ✓ |
//! | [`PmcArea::F`] | Signals from CNC to PMC | ✗ |
//! | [`PmcArea::Y`] | Signals from PMC to machine | ✓ |
//! | [`PmcArea::X`] | Signals from machine to PMC | ✗ |
//! | [`PmcArea::R`], [`PmcArea::D`], ... | Relays, timers, counters, data table | ✓ |
//!
//! ## Bit Writes
//!
//! There is no single-bit write. Read the byte, compute the new value with
//! [`utils::set_bit`] and write the whole byte with [`Session::write_range`].
//! That sequence is not atomic against changes made by the controller.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`](Result). The library never panics in
//! public code and never prints; diagnostics are emitted as `tracing` events.
//!
//! ```
//! use focas_client::{ErrorKind, Session, SessionConfig, SimulatedController};
//!
//! let session = Session::with_transport(SimulatedController::new(), SessionConfig::new("sim"))?;
//! match session.select_main_program("//CNC_MEM/USER/PATH1/O9999") {
//!     Ok(()) => println!("selected"),
//!     Err(e) if e.kind() == ErrorKind::Runtime => {
//!         println!("rejected with code {:?}: {e}", e.native_code());
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok::<(), focas_client::FocasError>(())
//! ```
//!
//! ## Configuration
//!
//! ```
//! use focas_client::SessionConfig;
//! use std::time::Duration;
//!
//! let config = SessionConfig::new("172.18.0.4")
//!     .with_port(8193)                        // default: 8193
//!     .with_timeout(Duration::from_secs(5))   // default: 10s
//!     .with_max_transfer_bytes(128);          // default: 256
//! assert!(config.validate().is_ok());
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod address;
mod area;
mod data_type;
mod detail;
mod error;
mod frame;
mod records;
mod reply;
mod request;
mod session;
mod sim;
mod transport;
pub mod utils;

// Public re-exports
pub use address::{AddressRange, BitAddress};
pub use area::PmcArea;
pub use data_type::{DataType, PmcValue};
pub use detail::{
    classify_code, is_link_code, Classification, ClassifierState, DetailCause, DetailedError,
    ErrorClassifier,
};
pub use error::{codes, native_code_description, ErrorKind, FocasError, Result};
pub use frame::{
    encode_reply, encode_request, FrameHeader, FRAME_HEADER_SIZE, FRAME_MAGIC, FRAME_VERSION,
    MAX_FRAME_PAYLOAD,
};
pub use records::{MachineStatus, OperationMode, PositionSet, ProgramInfo, SpindleInfo};
pub use reply::{PayloadReader, Reply};
pub use request::{Function, Request, MAX_PATH_LEN};
pub use session::{
    Session, SessionConfig, DEFAULT_MAX_TRANSFER_BYTES, DEFAULT_PORT, DEFAULT_TIMEOUT,
    MAX_TRANSFER_BYTES,
};
pub use sim::SimulatedController;
pub use transport::{TcpTransport, Transport};
