//! In-memory controller for tests and demos.
//!
//! [`SimulatedController`] implements [`Transport`] against shared in-memory
//! state. Clones share that state, so a test can hand one clone to a
//! [`Session`](crate::Session) and keep another to arrange memory, script
//! failures and count calls.
//!
//! The simulator behaves like a controller with no independent state change:
//! PMC memory only changes through writes, and status only changes through
//! commands.
//!
//! # Example
//!
//! ```
//! use focas_client::{BitAddress, PmcArea, Session, SessionConfig, SimulatedController};
//!
//! let sim = SimulatedController::new();
//! sim.set_bytes(PmcArea::X, 7, &[0b1100_0000]);
//!
//! let session = Session::with_transport(sim.clone(), SessionConfig::new("sim"))?;
//! assert!(session.read_bit(BitAddress::new(PmcArea::X, 7, 7)?)?);
//! assert!(!session.read_bit(BitAddress::new(PmcArea::X, 7, 5)?)?);
//! # Ok::<(), focas_client::FocasError>(())
//! ```

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::area::PmcArea;
use crate::data_type::DataType;
use crate::detail::DetailedError;
use crate::error::{codes, FocasError, Result};
use crate::records::{MachineStatus, OperationMode, PositionSet, ProgramInfo, SpindleInfo};
use crate::reply::{PayloadReader, Reply};
use crate::request::{Function, Request};
use crate::session::SessionConfig;
use crate::transport::Transport;

/// Detail code for a malformed program path.
const DETAIL_FORMAT_ERROR: i16 = 1;
/// Detail code for a missing program.
const DETAIL_FILE_NOT_FOUND: i16 = 2;

/// Scripted misbehaviour for the next call of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Status(i16),
    Timeout,
}

#[derive(Debug)]
struct SimState {
    cnc_id: [u32; 4],
    memory: HashMap<PmcArea, Vec<u8>>,
    status: MachineStatus,
    positions: PositionSet,
    spindle: SpindleInfo,
    program: ProgramInfo,
    main_program: String,
    programs: BTreeSet<String>,
    mdi_program: Option<String>,
    jog_commands: Vec<String>,
    cycle_starts: usize,
    detail: DetailedError,
    faults: HashMap<Function, VecDeque<Fault>>,
    max_transfer_bytes: Option<usize>,
    refuse_connections: bool,
    closed: bool,
    calls: Vec<Function>,
}

impl Default for SimState {
    fn default() -> Self {
        let main_program = "//CNC_MEM/USER/PATH1/O1000".to_string();
        let mut programs = BTreeSet::new();
        programs.insert(main_program.clone());
        Self {
            cnc_id: [0x1234_5678, 0x9ABC_DEF0, 0x0F0E_0D0C, 0x0000_0001],
            memory: HashMap::new(),
            status: MachineStatus {
                aut: 1,
                ..Default::default()
            },
            positions: PositionSet {
                absolute: vec![0; 3],
                machine: vec![0; 3],
                relative: vec![0; 3],
                distance: vec![0; 3],
            },
            spindle: SpindleInfo::default(),
            program: ProgramInfo {
                running: 1000,
                main: 1000,
            },
            main_program,
            programs,
            mdi_program: None,
            jog_commands: Vec::new(),
            cycle_starts: 0,
            detail: DetailedError::default(),
            faults: HashMap::new(),
            max_transfer_bytes: None,
            refuse_connections: false,
            closed: false,
            calls: Vec::new(),
        }
    }
}

/// Simulated controller implementing [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct SimulatedController {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedController {
    /// Creates a controller in AUTO mode with three axes at zero and
    /// `//CNC_MEM/USER/PATH1/O1000` selected.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // A panicking test thread must not hide the state from the others.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Opens a link to this controller, as [`Session::open_with`] expects.
    ///
    /// The returned clone shares state with `self`.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::Connect` after [`refuse_connections`](Self::refuse_connections).
    ///
    /// [`Session::open_with`]: crate::Session::open_with
    pub fn connect(&self, config: &SessionConfig) -> Result<SimulatedController> {
        let mut state = self.lock();
        if state.refuse_connections {
            return Err(FocasError::connect(
                config.host.as_str(),
                config.port,
                "connection refused",
            ));
        }
        state.closed = false;
        Ok(self.clone())
    }

    /// Makes every later [`connect`](Self::connect) fail.
    pub fn refuse_connections(&self) {
        self.lock().refuse_connections = true;
    }

    /// Replies `EW_LENGTH` to PMC calls moving more than `bytes` bytes.
    pub fn set_max_transfer_bytes(&self, bytes: usize) {
        self.lock().max_transfer_bytes = Some(bytes);
    }

    /// Stores raw bytes in `area` starting at byte offset `offset`.
    ///
    /// Element `i` of a type `width` bytes wide lives at offset `i * width`.
    pub fn set_bytes(&self, area: PmcArea, offset: usize, bytes: &[u8]) {
        let mut state = self.lock();
        let memory = state.memory.entry(area).or_default();
        store(memory, offset, bytes);
    }

    /// Returns raw bytes of `area` starting at byte offset `offset`.
    pub fn bytes(&self, area: PmcArea, offset: usize, len: usize) -> Vec<u8> {
        let state = self.lock();
        load(state.memory.get(&area), offset, len)
    }

    /// Makes the next call of `function` reply with native `code`.
    ///
    /// Calls queue up: scripting the same function twice fails its next two
    /// calls.
    pub fn fail_next(&self, function: Function, code: i16) {
        self.push_fault(function, Fault::Status(code));
    }

    /// Makes the next call of `function` time out.
    pub fn time_out_next(&self, function: Function) {
        self.push_fault(function, Fault::Timeout);
    }

    fn push_fault(&self, function: Function, fault: Fault) {
        self.lock()
            .faults
            .entry(function)
            .or_default()
            .push_back(fault);
    }

    /// Sets the detailed error reported by the next detail fetch.
    pub fn set_detail(&self, detail: DetailedError) {
        self.lock().detail = detail;
    }

    /// Sets the controller ID.
    pub fn set_cnc_id(&self, id: [u32; 4]) {
        self.lock().cnc_id = id;
    }

    /// Sets the machine status flags.
    pub fn set_status(&self, status: MachineStatus) {
        self.lock().status = status;
    }

    /// Returns the machine status flags.
    pub fn status(&self) -> MachineStatus {
        self.lock().status
    }

    /// Sets per-axis positions.
    pub fn set_positions(&self, positions: PositionSet) {
        self.lock().positions = positions;
    }

    /// Sets feed rate and spindle speed.
    pub fn set_spindle(&self, spindle: SpindleInfo) {
        self.lock().spindle = spindle;
    }

    /// Sets running and main program numbers.
    pub fn set_program_info(&self, program: ProgramInfo) {
        self.lock().program = program;
    }

    /// Makes `path` selectable as main program.
    pub fn add_program(&self, path: impl Into<String>) {
        self.lock().programs.insert(path.into());
    }

    /// Returns the selected main program path.
    pub fn main_program(&self) -> String {
        self.lock().main_program.clone()
    }

    /// Returns the last MDI program received.
    pub fn mdi_program(&self) -> Option<String> {
        self.lock().mdi_program.clone()
    }

    /// Returns every JOG-MDI command received, oldest first.
    pub fn jog_commands(&self) -> Vec<String> {
        self.lock().jog_commands.clone()
    }

    /// Returns how many cycle starts were accepted.
    pub fn cycle_starts(&self) -> usize {
        self.lock().cycle_starts
    }

    /// Returns every function called so far, in order.
    pub fn calls(&self) -> Vec<Function> {
        self.lock().calls.clone()
    }

    /// Returns how many times `function` was called.
    pub fn call_count(&self, function: Function) -> usize {
        self.lock().calls.iter().filter(|f| **f == function).count()
    }

    /// Returns whether the link has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl Transport for SimulatedController {
    fn call(&mut self, request: &Request) -> Result<Reply> {
        let function = request.function();
        let mut state = self.lock();
        state.calls.push(function);
        trace!(%function, len = request.payload().len(), "simulated call");

        if state.closed {
            return Ok(Reply::failure(codes::EW_HANDLE));
        }
        let fault = state
            .faults
            .get_mut(&function)
            .and_then(VecDeque::pop_front);
        match fault {
            Some(Fault::Status(code)) => return Ok(Reply::failure(code)),
            Some(Fault::Timeout) => return Err(FocasError::Timeout),
            None => {}
        }

        match state.dispatch(request) {
            Ok(reply) => Ok(reply),
            // Malformed arguments never reach a real controller either.
            Err(_) => Ok(Reply::failure(codes::EW_LENGTH)),
        }
    }

    fn close(&mut self) {
        self.lock().closed = true;
    }
}

impl SimState {
    fn dispatch(&mut self, request: &Request) -> Result<Reply> {
        let mut args = PayloadReader::new(request.payload());
        let reply = match request.function() {
            Function::ReadId => Reply::ok(self.cnc_id.iter().flat_map(|v| v.to_le_bytes()).collect()),
            Function::StatInfo => Reply::ok(encode_status(&self.status)),
            Function::ReadPosition => Reply::ok(encode_positions(&self.positions)),
            Function::ReadSpeed => Reply::ok(encode_i32s(&[self.spindle.feed, self.spindle.spindle])),
            Function::ReadProgramNumber => {
                Reply::ok(encode_i32s(&[self.program.running, self.program.main]))
            }
            Function::ReadMainProgram => Reply::ok(encode_string(&self.main_program)),
            Function::SelectMainProgram => {
                let path = args.string()?;
                self.select(path)
            }
            Function::ReadPmcRange => self.read_pmc(&mut args)?,
            Function::WritePmcRange => self.write_pmc(&mut args)?,
            Function::GetDetailError => Reply::ok(encode_detail(&self.detail)),
            Function::WriteMdiProgram => {
                let program = args.string()?;
                if self.status.mode() == OperationMode::Mdi {
                    self.mdi_program = Some(program);
                    Reply::ok(Vec::new())
                } else {
                    Reply::failure(codes::EW_MODE)
                }
            }
            Function::WriteJogMdi => {
                let command = args.string()?;
                if self.status.mode() == OperationMode::Jog {
                    self.jog_commands.push(command);
                    Reply::ok(Vec::new())
                } else {
                    Reply::failure(codes::EW_MODE)
                }
            }
            Function::WriteOperationMode => {
                let _datano = args.i16()?;
                let _kind = args.i16()?;
                match OperationMode::from_code(args.i16()?) {
                    Some(mode) => {
                        self.apply_mode(mode);
                        Reply::ok(Vec::new())
                    }
                    None => Reply::failure(codes::EW_DATA),
                }
            }
            Function::CycleStart => {
                if self.status.mode() == OperationMode::Jog {
                    Reply::failure(codes::EW_MODE)
                } else {
                    self.cycle_starts += 1;
                    self.status.run = 3;
                    Reply::ok(Vec::new())
                }
            }
        };
        args.finish()?;
        Ok(reply)
    }

    fn select(&mut self, path: String) -> Reply {
        let detail = if !path.starts_with("//") || path.contains(' ') {
            DETAIL_FORMAT_ERROR
        } else if !self.programs.contains(&path) {
            DETAIL_FILE_NOT_FOUND
        } else {
            self.main_program = path;
            return Reply::ok(Vec::new());
        };
        self.detail = DetailedError::new(detail);
        Reply::failure(codes::EW_DATA)
    }

    fn apply_mode(&mut self, mode: OperationMode) {
        let (aut, tmmode) = match mode {
            OperationMode::Mdi => (0, 1),
            OperationMode::Auto => (1, 0),
            OperationMode::Jog => (4, 0),
        };
        self.status.aut = aut;
        self.status.tmmode = tmmode;
    }

    /// Parses PMC range arguments into `(area, byte offset, byte length)`,
    /// or the native code to reply with.
    fn pmc_window(
        &self,
        args: &mut PayloadReader<'_>,
    ) -> Result<std::result::Result<(PmcArea, usize, usize), i16>> {
        let area = args.u16()?;
        let data_type = args.u16()?;
        let start = usize::from(args.u16()?);
        let end = usize::from(args.u16()?);
        let (Ok(area), Ok(data_type)) = (PmcArea::from_code(area), DataType::from_code(data_type))
        else {
            return Ok(Err(codes::EW_ATTRIB));
        };
        if start > end {
            return Ok(Err(codes::EW_NUMBER));
        }
        let width = data_type.width();
        let len = (end - start + 1) * width;
        if self.max_transfer_bytes.is_some_and(|max| len > max) {
            return Ok(Err(codes::EW_LENGTH));
        }
        Ok(Ok((area, start * width, len)))
    }

    fn read_pmc(&mut self, args: &mut PayloadReader<'_>) -> Result<Reply> {
        Ok(match self.pmc_window(args)? {
            Ok((area, offset, len)) => Reply::ok(load(self.memory.get(&area), offset, len)),
            Err(code) => Reply::failure(code),
        })
    }

    fn write_pmc(&mut self, args: &mut PayloadReader<'_>) -> Result<Reply> {
        let (area, offset, len) = match self.pmc_window(args)? {
            Ok(window) => window,
            Err(code) => {
                args.bytes(args.remaining())?;
                return Ok(Reply::failure(code));
            }
        };
        let data = args.bytes(len)?;
        if !area.supports_write() {
            return Ok(Reply::failure(codes::EW_PROT));
        }
        store(self.memory.entry(area).or_default(), offset, data);
        Ok(Reply::ok(Vec::new()))
    }
}

fn store(memory: &mut Vec<u8>, offset: usize, bytes: &[u8]) {
    let end = offset + bytes.len();
    if memory.len() < end {
        memory.resize(end, 0);
    }
    memory[offset..end].copy_from_slice(bytes);
}

fn load(memory: Option<&Vec<u8>>, offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if let Some(memory) = memory {
        if offset < memory.len() {
            let available = (memory.len() - offset).min(len);
            out[..available].copy_from_slice(&memory[offset..offset + available]);
        }
    }
    out
}

fn encode_i32s(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn encode_status(status: &MachineStatus) -> Vec<u8> {
    [
        status.aut,
        status.run,
        status.motion,
        status.mstb,
        status.emergency,
        status.alarm,
        status.edit,
        status.tmmode,
        status.hdck,
    ]
    .iter()
    .flat_map(|v| v.to_le_bytes())
    .collect()
}

fn encode_positions(positions: &PositionSet) -> Vec<u8> {
    let axes = positions.axis_count().min(usize::from(u16::MAX));
    let mut out = Vec::with_capacity(2 + axes * 16);
    out.extend_from_slice(&(axes as u16).to_le_bytes());
    for axis in 0..axes {
        for series in [
            &positions.absolute,
            &positions.machine,
            &positions.relative,
            &positions.distance,
        ] {
            let value = series.get(axis).copied().unwrap_or_default();
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    out
}

fn encode_string(text: &str) -> Vec<u8> {
    let bytes = &text.as_bytes()[..text.len().min(usize::from(u16::MAX))];
    let mut out = Vec::with_capacity(2 + bytes.len());
    out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    out.extend_from_slice(bytes);
    out
}

fn encode_detail(detail: &DetailedError) -> Vec<u8> {
    let mut out = detail.detail_error_code.to_le_bytes().to_vec();
    for (name, value) in &detail.raw_fields {
        let name = &name.as_bytes()[..name.len().min(usize::from(u8::MAX))];
        out.push(name.len() as u8);
        out.extend_from_slice(name);
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressRange;
    use crate::data_type::PmcValue;

    fn call(sim: &mut SimulatedController, request: Request) -> Reply {
        sim.call(&request).unwrap()
    }

    #[test]
    fn test_pmc_write_then_read() {
        let mut sim = SimulatedController::new();
        let range = AddressRange::new(PmcArea::D, DataType::Long, 10, 11).unwrap();
        let values = [PmcValue::Long(-5), PmcValue::Long(70_000)];
        let reply = call(&mut sim, Request::write_pmc_range(range, &values).unwrap());
        assert!(reply.is_success());

        let reply = call(&mut sim, Request::read_pmc_range(range));
        assert_eq!(reply.to_values(&range).unwrap(), values.to_vec());
        assert_eq!(sim.bytes(PmcArea::D, 40, 4), (-5i32).to_le_bytes().to_vec());
    }

    #[test]
    fn test_unwritten_memory_reads_zero() {
        let mut sim = SimulatedController::new();
        let range = AddressRange::new(PmcArea::R, DataType::Word, 0, 3).unwrap();
        let reply = call(&mut sim, Request::read_pmc_range(range));
        assert_eq!(reply.payload, vec![0; 8]);
    }

    #[test]
    fn test_transfer_cap() {
        let mut sim = SimulatedController::new();
        sim.set_max_transfer_bytes(4);
        let small = AddressRange::new(PmcArea::R, DataType::Byte, 0, 3).unwrap();
        let large = AddressRange::new(PmcArea::R, DataType::Byte, 0, 4).unwrap();
        assert!(call(&mut sim, Request::read_pmc_range(small)).is_success());
        assert_eq!(
            call(&mut sim, Request::read_pmc_range(large)).status,
            codes::EW_LENGTH
        );
    }

    #[test]
    fn test_select_sets_detail_register() {
        let mut sim = SimulatedController::new();
        let reply = call(
            &mut sim,
            Request::select_main_program("//CNC_MEM/USER/PATH1/O9999").unwrap(),
        );
        assert_eq!(reply.status, codes::EW_DATA);
        let detail = call(&mut sim, Request::get_detail_error())
            .to_detailed_error()
            .unwrap();
        assert_eq!(detail.detail_error_code, DETAIL_FILE_NOT_FOUND);

        let reply = call(&mut sim, Request::select_main_program("O1234").unwrap());
        assert_eq!(reply.status, codes::EW_DATA);
        let detail = call(&mut sim, Request::get_detail_error())
            .to_detailed_error()
            .unwrap();
        assert_eq!(detail.detail_error_code, DETAIL_FORMAT_ERROR);
    }

    #[test]
    fn test_scripted_faults_are_consumed_in_order() {
        let mut sim = SimulatedController::new();
        sim.fail_next(Function::ReadId, codes::EW_BUSY);
        sim.time_out_next(Function::ReadId);
        assert_eq!(call(&mut sim, Request::read_id()).status, codes::EW_BUSY);
        assert!(sim.call(&Request::read_id()).unwrap_err().is_timeout());
        assert!(call(&mut sim, Request::read_id()).is_success());
        assert_eq!(sim.call_count(Function::ReadId), 3);
    }

    #[test]
    fn test_modes_gate_commands() {
        let mut sim = SimulatedController::new();
        assert_eq!(
            call(&mut sim, Request::write_mdi_program("G00 X0;").unwrap()).status,
            codes::EW_MODE
        );
        call(&mut sim, Request::write_operation_mode(OperationMode::Mdi));
        assert!(sim.status().is_mdi());
        assert!(call(&mut sim, Request::write_mdi_program("G00 X0;").unwrap()).is_success());
        assert_eq!(sim.mdi_program().as_deref(), Some("G00 X0;"));

        call(&mut sim, Request::write_operation_mode(OperationMode::Jog));
        assert_eq!(call(&mut sim, Request::cycle_start()).status, codes::EW_MODE);
        assert!(call(&mut sim, Request::write_jog_mdi("X10.").unwrap()).is_success());
        assert_eq!(sim.jog_commands(), vec!["X10.".to_string()]);
    }

    #[test]
    fn test_closed_link_reports_handle_error() {
        let mut sim = SimulatedController::new();
        sim.close();
        assert!(sim.is_closed());
        assert_eq!(call(&mut sim, Request::read_id()).status, codes::EW_HANDLE);
    }

    #[test]
    fn test_refused_connection() {
        let sim = SimulatedController::new();
        let config = SessionConfig::new("sim");
        assert!(sim.connect(&config).is_ok());
        sim.refuse_connections();
        assert!(matches!(
            sim.connect(&config),
            Err(FocasError::Connect { .. })
        ));
    }
}
