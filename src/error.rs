//! Error types for the FOCAS client.
//!
//! Every failure is a [`FocasError`]. Callers that only care about the broad
//! class of a failure use [`FocasError::kind`], which projects each variant
//! onto one of four [`ErrorKind`]s:
//!
//! | Kind | Raised when |
//! |------|-------------|
//! | [`ErrorKind::Connection`] | the link cannot be opened, is closed, times out or drops |
//! | [`ErrorKind::InvalidAddress`] | caller input fails local validation (no network call made) |
//! | [`ErrorKind::Protocol`] | the controller refused or could not service a well-formed request |
//! | [`ErrorKind::Runtime`] | a state-changing command was rejected |
//!
//! Native status codes travel as typed `i16` fields, never inside message text.

use std::io;
use thiserror::Error;

use crate::detail::DetailedError;
use crate::request::Function;

/// Result type alias for FOCAS operations.
pub type Result<T> = std::result::Result<T, FocasError>;

/// Native status codes returned by the controller library.
///
/// Zero is success. Negative codes are raised by the link layer, positive
/// codes by the controller itself.
pub mod codes {
    /// Protocol error on the link.
    pub const EW_PROTOCOL: i16 = -17;
    /// Socket error.
    pub const EW_SOCKET: i16 = -16;
    /// Invalid or stale connection handle.
    pub const EW_HANDLE: i16 = -8;
    /// Controller reset or stop occurred during the call.
    pub const EW_RESET: i16 = -2;
    /// Controller busy.
    pub const EW_BUSY: i16 = -1;
    /// Success.
    pub const EW_OK: i16 = 0;
    /// Function not executed or not available.
    pub const EW_FUNC: i16 = 1;
    /// Data block length error.
    pub const EW_LENGTH: i16 = 2;
    /// Data number error.
    pub const EW_NUMBER: i16 = 3;
    /// Data attribute error.
    pub const EW_ATTRIB: i16 = 4;
    /// Data error. Ambiguous for program selection.
    pub const EW_DATA: i16 = 5;
    /// No option.
    pub const EW_NOOPT: i16 = 6;
    /// Write protection.
    pub const EW_PROT: i16 = 7;
    /// Memory overflow.
    pub const EW_OVRFLOW: i16 = 8;
    /// Parameter error.
    pub const EW_PARAM: i16 = 9;
    /// Buffer empty or full.
    pub const EW_BUFFER: i16 = 10;
    /// Path error.
    pub const EW_PATH: i16 = 11;
    /// Controller mode error.
    pub const EW_MODE: i16 = 12;
    /// Execution rejected.
    pub const EW_REJECT: i16 = 13;
    /// Controller in alarm state.
    pub const EW_ALARM: i16 = 15;
    /// Controller in stop or emergency state.
    pub const EW_STOP: i16 = 16;
    /// Data protected by password.
    pub const EW_PASSWD: i16 = 17;
}

/// Returns a short description of a native status code.
///
/// # Example
///
/// ```
/// use focas_client::native_code_description;
///
/// assert_eq!(native_code_description(5), "EW_DATA: data error");
/// assert_eq!(native_code_description(99), "unknown native code");
/// ```
pub fn native_code_description(code: i16) -> &'static str {
    match code {
        codes::EW_PROTOCOL => "EW_PROTOCOL: protocol error",
        codes::EW_SOCKET => "EW_SOCKET: socket error",
        codes::EW_HANDLE => "EW_HANDLE: invalid connection handle",
        codes::EW_RESET => "EW_RESET: reset or stop occurred",
        codes::EW_BUSY => "EW_BUSY: controller busy",
        codes::EW_OK => "EW_OK: success",
        codes::EW_FUNC => "EW_FUNC: function not available",
        codes::EW_LENGTH => "EW_LENGTH: data block length error",
        codes::EW_NUMBER => "EW_NUMBER: data number error",
        codes::EW_ATTRIB => "EW_ATTRIB: data attribute error",
        codes::EW_DATA => "EW_DATA: data error",
        codes::EW_NOOPT => "EW_NOOPT: no option",
        codes::EW_PROT => "EW_PROT: write protected",
        codes::EW_OVRFLOW => "EW_OVRFLOW: memory overflow",
        codes::EW_PARAM => "EW_PARAM: parameter error",
        codes::EW_BUFFER => "EW_BUFFER: buffer empty or full",
        codes::EW_PATH => "EW_PATH: path error",
        codes::EW_MODE => "EW_MODE: controller mode error",
        codes::EW_REJECT => "EW_REJECT: execution rejected",
        codes::EW_ALARM => "EW_ALARM: controller in alarm",
        codes::EW_STOP => "EW_STOP: controller stopped",
        codes::EW_PASSWD => "EW_PASSWD: password protected",
        _ => "unknown native code",
    }
}

/// Broad failure class of a [`FocasError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The link could not be established, maintained or used (includes timeout).
    Connection,
    /// Caller input failed local validation before any network interaction.
    InvalidAddress,
    /// The controller rejected or could not service a well-formed request.
    Protocol,
    /// A state-changing command was refused.
    Runtime,
}

/// Errors that can occur during FOCAS communication.
#[derive(Debug, Error)]
pub enum FocasError {
    /// The session could not be opened.
    #[error("Failed to connect to CNC at {host}:{port}: {reason}")]
    Connect {
        /// Controller host.
        host: String,
        /// Controller port.
        port: u16,
        /// What went wrong.
        reason: String,
    },

    /// The session has been closed, or never opened.
    #[error("Session is not connected")]
    NotConnected,

    /// No reply within the configured timeout.
    #[error("Communication timeout")]
    Timeout,

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The link layer reported a failure through a native status code.
    #[error("Link failure during {function}: native code {code} ({})", native_code_description(*.code))]
    Link {
        /// Function that was being executed.
        function: Function,
        /// Native status code.
        code: i16,
    },

    /// Invalid PMC addressing.
    #[error("Invalid address: {reason}")]
    InvalidAddress {
        /// Description of the addressing error.
        reason: String,
    },

    /// Invalid parameter provided.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// The controller replied with a payload that could not be decoded.
    #[error("Invalid response: {reason}")]
    InvalidResponse {
        /// Description of the response error.
        reason: String,
    },

    /// The controller refused a request.
    #[error("{function} failed with native code {code} ({})", native_code_description(*.code))]
    Protocol {
        /// Function that was refused.
        function: Function,
        /// Native status code.
        code: i16,
    },

    /// A state-changing command was rejected.
    ///
    /// `detail` is present only when the code was ambiguous for this function
    /// and the detailed error was fetched successfully.
    #[error(
        "{function} rejected with native code {code} ({}){}",
        native_code_description(*.code),
        detail_suffix(.detail)
    )]
    CommandRejected {
        /// Function that was rejected.
        function: Function,
        /// Native status code.
        code: i16,
        /// Detailed error fetched after the rejection.
        detail: Option<DetailedError>,
    },

    /// A command was rejected and the follow-up detail fetch failed too.
    #[error("{function} rejected with native code {code}; detail fetch failed: {source}")]
    DetailFetchFailed {
        /// Function that was rejected.
        function: Function,
        /// Native status code of the original rejection.
        code: i16,
        /// Failure of the detail fetch itself.
        #[source]
        source: Box<FocasError>,
    },
}

fn detail_suffix(detail: &Option<DetailedError>) -> String {
    match detail {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}

impl FocasError {
    /// Creates a new `InvalidAddress` error.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::{ErrorKind, FocasError};
    ///
    /// let err = FocasError::invalid_address("start 10 is after end 5");
    /// assert_eq!(err.kind(), ErrorKind::InvalidAddress);
    /// ```
    pub fn invalid_address(reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidParameter` error.
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Creates a new `Connect` error.
    pub fn connect(host: impl Into<String>, port: u16, reason: impl Into<String>) -> Self {
        Self::Connect {
            host: host.into(),
            port,
            reason: reason.into(),
        }
    }

    /// Returns the broad failure class of this error.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::{ErrorKind, FocasError};
    ///
    /// assert_eq!(FocasError::Timeout.kind(), ErrorKind::Connection);
    /// assert_eq!(FocasError::NotConnected.kind(), ErrorKind::Connection);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect { .. }
            | Self::NotConnected
            | Self::Timeout
            | Self::Io(_)
            | Self::Link { .. } => ErrorKind::Connection,
            Self::InvalidAddress { .. } | Self::InvalidParameter { .. } => {
                ErrorKind::InvalidAddress
            }
            Self::InvalidResponse { .. } | Self::Protocol { .. } => ErrorKind::Protocol,
            Self::CommandRejected { .. } | Self::DetailFetchFailed { .. } => ErrorKind::Runtime,
        }
    }

    /// Returns the native status code carried by this error, if any.
    ///
    /// For [`FocasError::DetailFetchFailed`] this is the code of the original
    /// rejection, not of the failed detail fetch.
    pub fn native_code(&self) -> Option<i16> {
        match self {
            Self::Link { code, .. }
            | Self::Protocol { code, .. }
            | Self::CommandRejected { code, .. }
            | Self::DetailFetchFailed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns the detailed error attached to a rejected command, if any.
    pub fn detail(&self) -> Option<&DetailedError> {
        match self {
            Self::CommandRejected { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    /// Returns whether this error is a communication timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}
