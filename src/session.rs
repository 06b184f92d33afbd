//! Connection-scoped session with every client operation.
//!
//! A [`Session`] owns exactly one [`Transport`] and serializes all calls on it
//! through a mutex, so it can be shared between threads while the controller
//! only ever sees one request at a time. Dropping the session closes the link.
//!
//! # Overview
//!
//! - PMC access: [`read_range`](Session::read_range),
//!   [`write_range`](Session::write_range), [`read_bit`](Session::read_bit)
//! - Readers: [`read_id`](Session::read_id), [`read_status`](Session::read_status),
//!   [`read_position`](Session::read_position), [`read_spindle`](Session::read_spindle),
//!   [`read_program_number`](Session::read_program_number),
//!   [`read_main_program_path`](Session::read_main_program_path)
//! - Commands: [`select_main_program`](Session::select_main_program),
//!   [`write_mdi_program`](Session::write_mdi_program),
//!   [`write_jog_mdi`](Session::write_jog_mdi), [`set_mode`](Session::set_mode),
//!   [`cycle_start`](Session::cycle_start)
//!
//! Ranges wider than [`SessionConfig::max_transfer_bytes`] are split into
//! several native calls and reassembled in address order. Nothing is retried
//! and nothing is cached.
//!
//! # Example
//!
//! ```no_run
//! use focas_client::{AddressRange, DataType, PmcArea, Session, SessionConfig};
//!
//! let session = Session::connect(SessionConfig::new("172.18.0.4"))?;
//! println!("CNC ID: {}", session.read_id()?);
//!
//! let range = AddressRange::new(PmcArea::X, DataType::Byte, 0, 10)?;
//! for (offset, value) in session.read_range(range)?.iter().enumerate() {
//!     println!("X{}: {}", range.start() as usize + offset, value);
//! }
//! # Ok::<(), focas_client::FocasError>(())
//! ```
//!
//! # Timeouts
//!
//! The configured timeout bounds every round-trip. A timed-out session stays
//! open but its link may be in an undefined state; reconnecting is the
//! recommended recovery.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, trace};

use crate::address::{AddressRange, BitAddress};
use crate::data_type::{DataType, PmcValue};
use crate::detail::{classify_code, Classification, DetailedError, ErrorClassifier};
use crate::error::{FocasError, Result};
use crate::frame::MAX_FRAME_PAYLOAD;
use crate::records::{MachineStatus, OperationMode, PositionSet, ProgramInfo, SpindleInfo};
use crate::reply::Reply;
use crate::request::{Function, Request, PMC_RANGE_ARGS_SIZE};
use crate::transport::{TcpTransport, Transport};
use crate::utils::get_bit;

/// Default controller port.
pub const DEFAULT_PORT: u16 = 8193;

/// Default round-trip timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cap on the payload of one PMC call.
pub const DEFAULT_MAX_TRANSFER_BYTES: usize = 256;

/// Largest PMC payload that still fits one frame next to the range arguments.
pub const MAX_TRANSFER_BYTES: usize = MAX_FRAME_PAYLOAD - PMC_RANGE_ARGS_SIZE;

/// Configuration for opening a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Controller host name or IP address.
    pub host: String,
    /// Controller port.
    pub port: u16,
    /// Round-trip timeout.
    pub timeout: Duration,
    /// Largest PMC payload moved by one native call.
    pub max_transfer_bytes: usize,
}

impl SessionConfig {
    /// Creates a configuration with default port, timeout and transfer cap.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::SessionConfig;
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::new("172.18.0.4");
    /// assert_eq!(config.port, 8193);
    /// assert_eq!(config.timeout, Duration::from_secs(10));
    /// ```
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            max_transfer_bytes: DEFAULT_MAX_TRANSFER_BYTES,
        }
    }

    /// Sets a custom port (default is 8193).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets a custom timeout (default is 10 seconds).
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::SessionConfig;
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::new("172.18.0.4").with_timeout(Duration::from_secs(3));
    /// assert_eq!(config.timeout, Duration::from_secs(3));
    /// ```
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the PMC transfer cap (default is 256 bytes).
    pub fn with_max_transfer_bytes(mut self, bytes: usize) -> Self {
        self.max_transfer_bytes = bytes;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidParameter` for an empty host, port 0, a
    /// zero timeout, or a transfer cap smaller than the widest data type or
    /// larger than [`MAX_TRANSFER_BYTES`].
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(FocasError::invalid_parameter("host", "cannot be empty"));
        }
        if self.port == 0 {
            return Err(FocasError::invalid_parameter("port", "cannot be 0"));
        }
        if self.timeout.is_zero() {
            return Err(FocasError::invalid_parameter("timeout", "cannot be zero"));
        }
        if self.max_transfer_bytes < DataType::MAX_WIDTH {
            return Err(FocasError::invalid_parameter(
                "max_transfer_bytes",
                format!(
                    "{} is smaller than the widest element ({} bytes)",
                    self.max_transfer_bytes,
                    DataType::MAX_WIDTH
                ),
            ));
        }
        if self.max_transfer_bytes > MAX_TRANSFER_BYTES {
            return Err(FocasError::invalid_parameter(
                "max_transfer_bytes",
                format!(
                    "{} does not fit one frame (at most {MAX_TRANSFER_BYTES} bytes)",
                    self.max_transfer_bytes
                ),
            ));
        }
        Ok(())
    }
}

/// Open link plus the classifier tracking its most recent failure.
struct Link<T> {
    transport: T,
    classifier: ErrorClassifier,
}

impl<T: Transport> Link<T> {
    /// Performs one native call and turns a non-zero status into an error.
    fn execute(&mut self, request: &Request) -> Result<Reply> {
        let function = request.function();
        let reply = self.transport.call(request)?;
        if reply.is_success() {
            return Ok(reply);
        }

        let code = reply.status;
        match self.classifier.classify(function, code) {
            Classification::Report(error) => Err(error),
            Classification::FetchDetail => {
                // The detail register only reflects the latest failure, so the
                // fetch must be the very next call on this link.
                let fetched = self.fetch_detail();
                Err(self.classifier.complete(function, code, fetched))
            }
        }
    }

    fn fetch_detail(&mut self) -> Result<DetailedError> {
        let reply = self.transport.call(&Request::get_detail_error())?;
        if !reply.is_success() {
            return Err(classify_code(Function::GetDetailError, reply.status));
        }
        reply.to_detailed_error()
    }
}

/// Session with a CNC.
///
/// Generic over the [`Transport`] so that tests and demos can run against a
/// [`SimulatedController`](crate::SimulatedController); the default is
/// [`TcpTransport`].
///
/// Every operation fails with `FocasError::NotConnected` once the session has
/// been closed.
pub struct Session<T: Transport = TcpTransport> {
    config: SessionConfig,
    link: Mutex<Option<Link<T>>>,
}

impl Session<TcpTransport> {
    /// Connects to the controller over TCP.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidParameter` for an invalid configuration and
    /// `FocasError::Connect` if the controller cannot be reached.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use focas_client::{Session, SessionConfig};
    ///
    /// let session = Session::connect(SessionConfig::new("172.18.0.4").with_port(8193))?;
    /// # Ok::<(), focas_client::FocasError>(())
    /// ```
    pub fn connect(config: SessionConfig) -> Result<Self> {
        Self::open_with(config, |config| {
            TcpTransport::connect(&config.host, config.port, config.timeout)
        })
    }
}

impl<T: Transport> Session<T> {
    /// Opens a session with a transport produced by `open`.
    ///
    /// The configuration is validated before `open` runs.
    ///
    /// # Arguments
    ///
    /// * `config` - Session configuration, validated first
    /// * `open` - Produces a connected transport from the configuration
    ///
    /// # Errors
    ///
    /// Returns the validation error or whatever `open` fails with.
    pub fn open_with<F>(config: SessionConfig, open: F) -> Result<Self>
    where
        F: FnOnce(&SessionConfig) -> Result<T>,
    {
        config.validate()?;
        let transport = open(&config)?;
        debug!(host = %config.host, port = config.port, "session opened");
        Ok(Self {
            config,
            link: Mutex::new(Some(Link {
                transport,
                classifier: ErrorClassifier::new(),
            })),
        })
    }

    /// Opens a session over an already connected transport.
    ///
    /// # Arguments
    ///
    /// * `transport` - A connected transport, owned by the session from now on
    /// * `config` - Session configuration
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidParameter` for an invalid configuration.
    pub fn with_transport(transport: T, config: SessionConfig) -> Result<Self> {
        Self::open_with(config, |_| Ok(transport))
    }

    /// Returns the configuration the session was opened with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns whether the session is still open.
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Closes the session. Closing an already closed session does nothing.
    pub fn close(&self) {
        if let Some(mut link) = self.lock().take() {
            link.transport.close();
            debug!(host = %self.config.host, port = self.config.port, "session closed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Link<T>>> {
        // A panic mid-call leaves nothing half-updated that later calls rely on.
        self.link
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` on the open link while holding the session lock.
    fn with_link<R>(&self, f: impl FnOnce(&mut Link<T>) -> Result<R>) -> Result<R> {
        let mut guard = self.lock();
        let link = guard.as_mut().ok_or(FocasError::NotConnected)?;
        f(link)
    }

    fn execute(&self, request: &Request) -> Result<Reply> {
        self.with_link(|link| link.execute(request))
    }

    /// Reads the controller ID, e.g. `"12345678-9abcdef0-0f0e0d0c-00000001"`.
    ///
    /// Conventionally called right after connecting to prove the link works.
    ///
    /// # Returns
    ///
    /// Four 32-bit words as lowercase hex joined by `-`.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the controller refuses.
    pub fn read_id(&self) -> Result<String> {
        let id = self.execute(&Request::read_id())?.to_cnc_id()?;
        debug!(%id, "read CNC ID");
        Ok(id)
    }

    /// Reads a PMC range.
    ///
    /// Returns one value per address in `start..=end`, in ascending order.
    /// Ranges above the transfer cap are fetched in several calls under one
    /// lock, so no other call interleaves.
    ///
    /// # Arguments
    ///
    /// * `range` - Area, data type and inclusive element bounds to read
    ///
    /// # Returns
    ///
    /// One value per element of `range`, in address order.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the controller refuses any
    /// fragment. Values of earlier fragments are discarded.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::{AddressRange, DataType, PmcArea, PmcValue, Session, SessionConfig, SimulatedController};
    ///
    /// let sim = SimulatedController::new();
    /// sim.set_bytes(PmcArea::X, 7, &[192]);
    /// let session = Session::with_transport(sim, SessionConfig::new("sim"))?;
    ///
    /// let range = AddressRange::new(PmcArea::X, DataType::Byte, 7, 7)?;
    /// assert_eq!(session.read_range(range)?, vec![PmcValue::Byte(192)]);
    /// # Ok::<(), focas_client::FocasError>(())
    /// ```
    pub fn read_range(&self, range: AddressRange) -> Result<Vec<PmcValue>> {
        let fragments = range.fragments(self.config.max_transfer_bytes);
        self.with_link(|link| {
            let mut values = Vec::with_capacity(range.len());
            for fragment in &fragments {
                trace!(%fragment, "reading PMC fragment");
                let reply = link.execute(&Request::read_pmc_range(*fragment))?;
                values.extend(reply.to_values(fragment)?);
            }
            Ok(values)
        })
    }

    /// Writes a PMC range.
    ///
    /// `values` must hold one value of the range's data type per address.
    /// The write is not read back; callers that need confirmation read the
    /// range again. If a fragment is refused, earlier fragments stay written.
    ///
    /// There is no single-bit write. To change one bit, read the byte,
    /// compute the new value with [`utils::set_bit`](crate::utils::set_bit)
    /// and write the whole byte; that is not atomic against the controller.
    ///
    /// # Arguments
    ///
    /// * `range` - Area, data type and inclusive element bounds to write
    /// * `values` - One value of the range's data type per element
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidAddress` before any network call if the
    /// area is read-only or the values do not match the range, otherwise an
    /// error if communication fails or the controller refuses.
    pub fn write_range(&self, range: AddressRange, values: &[PmcValue]) -> Result<()> {
        range.check_write(values)?;
        let fragments = range.fragments(self.config.max_transfer_bytes);
        self.with_link(|link| {
            for fragment in &fragments {
                let offset = usize::from(fragment.start() - range.start());
                let chunk = &values[offset..offset + fragment.len()];
                trace!(%fragment, "writing PMC fragment");
                link.execute(&Request::write_pmc_range(*fragment, chunk)?)?;
            }
            Ok(())
        })
    }

    /// Reads one bit: the containing byte is read and bit `bit` extracted as
    /// `(byte >> bit) & 1`.
    ///
    /// # Arguments
    ///
    /// * `address` - Area, byte and bit (0-7) to read
    ///
    /// # Returns
    ///
    /// `true` if the bit is ON.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the controller refuses.
    pub fn read_bit(&self, address: BitAddress) -> Result<bool> {
        let values = self.read_range(address.byte_range())?;
        let byte = values
            .first()
            .and_then(PmcValue::as_byte)
            .ok_or_else(|| FocasError::invalid_response(format!("no byte for {address}")))?;
        Ok(get_bit(byte, address.bit()))
    }

    /// Reads machine status flags.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the controller refuses.
    pub fn read_status(&self) -> Result<MachineStatus> {
        self.execute(&Request::stat_info())?.to_status()
    }

    /// Reads absolute, machine, relative and distance-to-go positions.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the controller refuses.
    pub fn read_position(&self) -> Result<PositionSet> {
        self.execute(&Request::read_position())?.to_positions()
    }

    /// Reads actual feed rate and spindle speed.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the controller refuses.
    pub fn read_spindle(&self) -> Result<SpindleInfo> {
        self.execute(&Request::read_speed())?.to_spindle()
    }

    /// Reads running and main program numbers.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the controller refuses.
    pub fn read_program_number(&self) -> Result<ProgramInfo> {
        self.execute(&Request::read_program_number())?.to_program_info()
    }

    /// Reads the main program path, e.g. `//CNC_MEM/USER/PATH1/O1000`.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the controller refuses.
    pub fn read_main_program_path(&self) -> Result<String> {
        self.execute(&Request::read_main_program())?.to_path()
    }

    /// Selects the main program.
    ///
    /// Success means the controller accepted the command, not that it
    /// switched. To verify, compare [`read_main_program_path`](Self::read_main_program_path)
    /// before and after.
    ///
    /// # Arguments
    ///
    /// * `path` - Full program path, e.g. `//CNC_MEM/USER/PATH1/O1000`
    ///   (ASCII, at most [`MAX_PATH_LEN`](crate::MAX_PATH_LEN) bytes)
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidParameter` for an unusable path and
    /// `FocasError::CommandRejected` if the controller refuses. A refusal
    /// with `EW_DATA` carries the [`DetailedError`] fetched right after it;
    /// if that fetch fails, `FocasError::DetailFetchFailed` reports both.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::{DetailCause, Session, SessionConfig, SimulatedController};
    ///
    /// let session = Session::with_transport(SimulatedController::new(), SessionConfig::new("sim"))?;
    /// let err = session.select_main_program("//CNC_MEM/USER/PATH1/O9999").unwrap_err();
    /// assert_eq!(err.native_code(), Some(5));
    /// assert_eq!(err.detail().map(|d| d.cause()), Some(DetailCause::FileNotFound));
    /// # Ok::<(), focas_client::FocasError>(())
    /// ```
    pub fn select_main_program(&self, path: &str) -> Result<()> {
        let request = Request::select_main_program(path)?;
        self.execute(&request)?;
        debug!(path, "main program selected");
        Ok(())
    }

    /// Fetches the detailed error of the most recent failure on this link.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the controller refuses.
    pub fn get_detailed_error(&self) -> Result<DetailedError> {
        self.with_link(|link| link.fetch_detail())
    }

    /// Sends an MDI program block, e.g. `"G00 X10.;"`.
    ///
    /// # Arguments
    ///
    /// * `program` - Non-empty ASCII program text
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidParameter` for unusable text and
    /// `FocasError::CommandRejected` if the controller refuses.
    pub fn write_mdi_program(&self, program: &str) -> Result<()> {
        self.execute(&Request::write_mdi_program(program)?)?;
        Ok(())
    }

    /// Sends a JOG-MDI command line.
    ///
    /// # Arguments
    ///
    /// * `command` - Non-empty ASCII command text
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidParameter` for unusable text and
    /// `FocasError::CommandRejected` if the controller refuses.
    pub fn write_jog_mdi(&self, command: &str) -> Result<()> {
        self.execute(&Request::write_jog_mdi(command)?)?;
        Ok(())
    }

    /// Switches the operation mode.
    ///
    /// # Arguments
    ///
    /// * `mode` - Target mode (MDI, AUTO or JOG)
    ///
    /// # Errors
    ///
    /// Returns `FocasError::CommandRejected` if the controller refuses.
    pub fn set_mode(&self, mode: OperationMode) -> Result<()> {
        self.execute(&Request::write_operation_mode(mode))?;
        debug!(%mode, "operation mode set");
        Ok(())
    }

    /// Issues cycle start.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::CommandRejected` if the controller refuses.
    pub fn cycle_start(&self) -> Result<()> {
        self.execute(&Request::cycle_start())?;
        Ok(())
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("open", &self.is_open())
            .finish()
    }
}
