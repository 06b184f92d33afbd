//! Native functions and request construction.
//!
//! Every operation the client can perform is one [`Function`]. A [`Request`]
//! pairs a function with its little-endian argument block; constructors
//! validate their arguments so that nothing invalid reaches a transport.
//!
//! # Functions
//!
//! ## Identification and state
//! - [`Function::ReadId`] - controller ID
//! - [`Function::StatInfo`] - machine status flags
//! - [`Function::ReadPosition`] - per-axis positions
//! - [`Function::ReadSpeed`] - feed and spindle speed
//! - [`Function::ReadProgramNumber`] - running and main program numbers
//! - [`Function::ReadMainProgram`] - main program path
//!
//! ## PMC
//! - [`Function::ReadPmcRange`] - read a range of PMC elements
//! - [`Function::WritePmcRange`] - write a range of PMC elements
//!
//! ## Commands
//! - [`Function::SelectMainProgram`], [`Function::WriteMdiProgram`],
//!   [`Function::WriteJogMdi`], [`Function::WriteOperationMode`],
//!   [`Function::CycleStart`]
//!
//! ## Diagnostics
//! - [`Function::GetDetailError`] - detail of the most recent failure
//!
//! # Example
//!
//! ```
//! use focas_client::{AddressRange, DataType, Function, PmcArea, Request};
//!
//! let range = AddressRange::new(PmcArea::X, DataType::Byte, 7, 7).unwrap();
//! let request = Request::read_pmc_range(range);
//! assert_eq!(request.function(), Function::ReadPmcRange);
//! assert_eq!(request.payload(), &[3, 0, 0, 0, 7, 0, 7, 0]);
//! ```

use crate::address::AddressRange;
use crate::data_type::{encode_values, PmcValue};
use crate::error::{FocasError, Result};
use crate::frame::MAX_FRAME_PAYLOAD;
use crate::records::OperationMode;

/// Maximum length of a program path in bytes.
pub const MAX_PATH_LEN: usize = 242;

/// Size of the PMC range argument block: area, type, start, end.
pub(crate) const PMC_RANGE_ARGS_SIZE: usize = 8;

/// Native functions understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// Read the controller ID.
    ReadId,
    /// Read machine status flags.
    StatInfo,
    /// Read per-axis positions.
    ReadPosition,
    /// Read feed rate and spindle speed.
    ReadSpeed,
    /// Read running and main program numbers.
    ReadProgramNumber,
    /// Read the main program path.
    ReadMainProgram,
    /// Select the main program by path.
    SelectMainProgram,
    /// Read a PMC range.
    ReadPmcRange,
    /// Write a PMC range.
    WritePmcRange,
    /// Fetch the detailed error of the most recent failure.
    GetDetailError,
    /// Send an MDI program block.
    WriteMdiProgram,
    /// Send a JOG-MDI command line.
    WriteJogMdi,
    /// Switch the operation mode.
    WriteOperationMode,
    /// Issue cycle start.
    CycleStart,
}

impl Function {
    /// Every function.
    pub const ALL: [Function; 14] = [
        Function::ReadId,
        Function::StatInfo,
        Function::ReadPosition,
        Function::ReadSpeed,
        Function::ReadProgramNumber,
        Function::ReadMainProgram,
        Function::SelectMainProgram,
        Function::ReadPmcRange,
        Function::WritePmcRange,
        Function::GetDetailError,
        Function::WriteMdiProgram,
        Function::WriteJogMdi,
        Function::WriteOperationMode,
        Function::CycleStart,
    ];

    /// Returns the wire code of this function.
    pub fn code(self) -> u16 {
        match self {
            Function::ReadId => 0x0001,
            Function::StatInfo => 0x0002,
            Function::ReadPosition => 0x0003,
            Function::ReadSpeed => 0x0004,
            Function::ReadProgramNumber => 0x0005,
            Function::ReadMainProgram => 0x0006,
            Function::SelectMainProgram => 0x0007,
            Function::ReadPmcRange => 0x0010,
            Function::WritePmcRange => 0x0011,
            Function::GetDetailError => 0x0020,
            Function::WriteMdiProgram => 0x0030,
            Function::WriteJogMdi => 0x0031,
            Function::WriteOperationMode => 0x0032,
            Function::CycleStart => 0x0033,
        }
    }

    /// Looks up a function by wire code.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` for unknown codes.
    pub fn from_code(code: u16) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|function| function.code() == code)
            .ok_or_else(|| FocasError::invalid_response(format!("unknown function code 0x{code:04X}")))
    }

    /// Returns whether this function changes controller state.
    ///
    /// A refused command surfaces as `FocasError::CommandRejected` rather than
    /// `FocasError::Protocol`.
    pub fn is_command(self) -> bool {
        matches!(
            self,
            Function::SelectMainProgram
                | Function::WriteMdiProgram
                | Function::WriteJogMdi
                | Function::WriteOperationMode
                | Function::CycleStart
        )
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Function::ReadId => "read CNC ID",
            Function::StatInfo => "read status",
            Function::ReadPosition => "read position",
            Function::ReadSpeed => "read spindle speed",
            Function::ReadProgramNumber => "read program number",
            Function::ReadMainProgram => "read main program path",
            Function::SelectMainProgram => "select main program",
            Function::ReadPmcRange => "read PMC range",
            Function::WritePmcRange => "write PMC range",
            Function::GetDetailError => "get detailed error",
            Function::WriteMdiProgram => "write MDI program",
            Function::WriteJogMdi => "write JOG MDI command",
            Function::WriteOperationMode => "set operation mode",
            Function::CycleStart => "cycle start",
        };
        f.write_str(name)
    }
}

/// A native call: function plus encoded arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    function: Function,
    payload: Vec<u8>,
}

impl Request {
    fn new(function: Function, payload: Vec<u8>) -> Self {
        Self { function, payload }
    }

    fn bare(function: Function) -> Self {
        Self::new(function, Vec::new())
    }

    /// Returns the function.
    pub fn function(&self) -> Function {
        self.function
    }

    /// Returns the encoded argument block.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Reads the controller ID.
    pub fn read_id() -> Self {
        Self::bare(Function::ReadId)
    }

    /// Reads machine status flags.
    pub fn stat_info() -> Self {
        Self::bare(Function::StatInfo)
    }

    /// Reads positions of all axes.
    pub fn read_position() -> Self {
        Self::bare(Function::ReadPosition)
    }

    /// Reads feed rate and spindle speed.
    pub fn read_speed() -> Self {
        Self::bare(Function::ReadSpeed)
    }

    /// Reads running and main program numbers.
    pub fn read_program_number() -> Self {
        Self::bare(Function::ReadProgramNumber)
    }

    /// Reads the main program path.
    pub fn read_main_program() -> Self {
        Self::bare(Function::ReadMainProgram)
    }

    /// Fetches the detailed error of the most recent failure.
    pub fn get_detail_error() -> Self {
        Self::bare(Function::GetDetailError)
    }

    /// Issues cycle start.
    pub fn cycle_start() -> Self {
        Self::bare(Function::CycleStart)
    }

    /// Selects the main program.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidParameter` if the path is empty, not ASCII,
    /// or longer than [`MAX_PATH_LEN`].
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::Request;
    ///
    /// let request = Request::select_main_program("//CNC_MEM/USER/PATH1/O1234").unwrap();
    /// assert_eq!(&request.payload()[..2], &[26, 0]);
    /// assert!(Request::select_main_program("").is_err());
    /// ```
    pub fn select_main_program(path: &str) -> Result<Self> {
        let payload = encode_text("path", path, MAX_PATH_LEN)?;
        Ok(Self::new(Function::SelectMainProgram, payload))
    }

    /// Sends an MDI program block.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidParameter` if the program is empty, not
    /// ASCII, or does not fit in one frame.
    pub fn write_mdi_program(program: &str) -> Result<Self> {
        let payload = encode_text("program", program, MAX_FRAME_PAYLOAD - 2)?;
        Ok(Self::new(Function::WriteMdiProgram, payload))
    }

    /// Sends a JOG-MDI command line.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidParameter` if the command is empty, not
    /// ASCII, or does not fit in one frame.
    pub fn write_jog_mdi(command: &str) -> Result<Self> {
        let payload = encode_text("command", command, MAX_FRAME_PAYLOAD - 2)?;
        Ok(Self::new(Function::WriteJogMdi, payload))
    }

    /// Switches the operation mode through the operator-panel signal call.
    pub fn write_operation_mode(mode: OperationMode) -> Self {
        let mut payload = Vec::with_capacity(6);
        payload.extend_from_slice(&0i16.to_le_bytes()); // datano
        payload.extend_from_slice(&0i16.to_le_bytes()); // type
        payload.extend_from_slice(&mode.code().to_le_bytes());
        Self::new(Function::WriteOperationMode, payload)
    }

    /// Reads a PMC range in one call.
    ///
    /// The range must already fit the transfer cap; see
    /// [`AddressRange::fragments`].
    pub fn read_pmc_range(range: AddressRange) -> Self {
        Self::new(Function::ReadPmcRange, encode_range(&range, 0))
    }

    /// Writes a PMC range in one call.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidAddress` if the values do not match the
    /// range (see [`AddressRange::check_write`]).
    pub fn write_pmc_range(range: AddressRange, values: &[PmcValue]) -> Result<Self> {
        range.check_write(values)?;
        let data = encode_values(values);
        let mut payload = encode_range(&range, data.len());
        payload.extend_from_slice(&data);
        Ok(Self::new(Function::WritePmcRange, payload))
    }
}

fn encode_range(range: &AddressRange, extra: usize) -> Vec<u8> {
    let mut payload = Vec::with_capacity(PMC_RANGE_ARGS_SIZE + extra);
    payload.extend_from_slice(&range.area().code().to_le_bytes());
    payload.extend_from_slice(&range.data_type().code().to_le_bytes());
    payload.extend_from_slice(&range.start().to_le_bytes());
    payload.extend_from_slice(&range.end().to_le_bytes());
    payload
}

fn encode_text(parameter: &str, text: &str, max_len: usize) -> Result<Vec<u8>> {
    if text.is_empty() {
        return Err(FocasError::invalid_parameter(parameter, "cannot be empty"));
    }
    if !text.is_ascii() {
        return Err(FocasError::invalid_parameter(parameter, "must be ASCII"));
    }
    if text.len() > max_len {
        return Err(FocasError::invalid_parameter(
            parameter,
            format!("{} bytes exceeds maximum of {}", text.len(), max_len),
        ));
    }
    // max_len never exceeds the frame payload, so the length fits in u16.
    let mut payload = Vec::with_capacity(2 + text.len());
    payload.extend_from_slice(&(text.len() as u16).to_le_bytes());
    payload.extend_from_slice(text.as_bytes());
    Ok(payload)
}
