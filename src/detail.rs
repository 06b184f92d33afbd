//! Error classification and detailed-error follow-up.
//!
//! Every non-zero native status passes through an [`ErrorClassifier`]. Most
//! codes map straight onto a [`FocasError`]. A few are ambiguous for the
//! function that produced them (program selection answering `EW_DATA` may mean
//! a malformed path or a missing file); for those the classifier moves to
//! [`ClassifierState::AwaitingDetail`] and the session issues one
//! [`Function::GetDetailError`] call on the same link before reporting.
//!
//! ```text
//!            ambiguous code                 detail fetched / fetch failed
//!   Normal ─────────────────▶ AwaitingDetail ─────────────────────────────▶ Normal
//!     │                                                                      ▲
//!     └──────────────── any other code: report immediately ──────────────────┘
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{codes, FocasError, Result};
use crate::request::Function;

/// Finer-grained cause of a failure, fetched after an ambiguous native code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetailedError {
    /// Detail code reported by the controller.
    pub detail_error_code: i16,
    /// Any additional named fields carried by the reply.
    pub raw_fields: BTreeMap<String, i32>,
}

impl DetailedError {
    /// Creates a detailed error with no extra fields.
    pub fn new(detail_error_code: i16) -> Self {
        Self {
            detail_error_code,
            raw_fields: BTreeMap::new(),
        }
    }

    /// Adds a named raw field.
    pub fn with_field(mut self, name: impl Into<String>, value: i32) -> Self {
        self.raw_fields.insert(name.into(), value);
        self
    }

    /// Maps the detail code onto a cause.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::{DetailCause, DetailedError};
    ///
    /// assert_eq!(DetailedError::new(1).cause(), DetailCause::FormatError);
    /// assert_eq!(DetailedError::new(2).cause(), DetailCause::FileNotFound);
    /// assert_eq!(DetailedError::new(9).cause(), DetailCause::Unknown(9));
    /// ```
    pub fn cause(&self) -> DetailCause {
        DetailCause::from_code(self.detail_error_code)
    }
}

impl std::fmt::Display for DetailedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (detail code {})", self.cause(), self.detail_error_code)
    }
}

/// Human cause behind a detail code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailCause {
    /// The path or file name is malformed.
    FormatError,
    /// The file does not exist.
    FileNotFound,
    /// Any other detail code.
    Unknown(i16),
}

impl DetailCause {
    /// Maps a detail code onto a cause.
    pub fn from_code(code: i16) -> Self {
        match code {
            1 => DetailCause::FormatError,
            2 => DetailCause::FileNotFound,
            other => DetailCause::Unknown(other),
        }
    }
}

impl std::fmt::Display for DetailCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetailCause::FormatError => write!(f, "format error in path or file name"),
            DetailCause::FileNotFound => write!(f, "file not found"),
            DetailCause::Unknown(_) => write!(f, "unknown cause"),
        }
    }
}

/// Returns whether a native code is raised by the link layer rather than the
/// controller.
pub fn is_link_code(code: i16) -> bool {
    matches!(
        code,
        codes::EW_SOCKET | codes::EW_HANDLE | codes::EW_PROTOCOL
    )
}

/// Maps a native failure onto a [`FocasError`] without any follow-up.
///
/// # Example
///
/// ```
/// use focas_client::{classify_code, ErrorKind, Function};
///
/// assert_eq!(classify_code(Function::ReadId, -16).kind(), ErrorKind::Connection);
/// assert_eq!(classify_code(Function::ReadPmcRange, 3).kind(), ErrorKind::Protocol);
/// assert_eq!(classify_code(Function::CycleStart, 12).kind(), ErrorKind::Runtime);
/// ```
pub fn classify_code(function: Function, code: i16) -> FocasError {
    if is_link_code(code) {
        FocasError::Link { function, code }
    } else if function.is_command() {
        FocasError::CommandRejected {
            function,
            code,
            detail: None,
        }
    } else {
        FocasError::Protocol { function, code }
    }
}

/// State of an [`ErrorClassifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierState {
    /// No failure pending.
    #[default]
    Normal,
    /// An ambiguous failure was seen; the detailed error must be fetched next.
    AwaitingDetail,
}

/// Outcome of classifying a native failure.
#[derive(Debug)]
pub enum Classification {
    /// Report this error as-is.
    Report(FocasError),
    /// Fetch the detailed error, then call [`ErrorClassifier::complete`].
    FetchDetail,
}

/// Two-state classifier owned by each session link.
#[derive(Debug, Default)]
pub struct ErrorClassifier {
    state: ClassifierState,
}

impl ErrorClassifier {
    /// Creates a classifier in the `Normal` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn state(&self) -> ClassifierState {
        self.state
    }

    /// Returns whether `code` is ambiguous for `function`.
    pub fn needs_detail(function: Function, code: i16) -> bool {
        function == Function::SelectMainProgram && code == codes::EW_DATA
    }

    /// Classifies a native failure.
    ///
    /// Moves to `AwaitingDetail` and returns [`Classification::FetchDetail`]
    /// for ambiguous codes; otherwise stays `Normal` and returns the error.
    pub fn classify(&mut self, function: Function, code: i16) -> Classification {
        if Self::needs_detail(function, code) {
            debug!(%function, code, "ambiguous native code, fetching detailed error");
            self.state = ClassifierState::AwaitingDetail;
            Classification::FetchDetail
        } else {
            let error = classify_code(function, code);
            debug!(%function, code, kind = ?error.kind(), "classified native failure");
            Classification::Report(error)
        }
    }

    /// Finishes an ambiguous failure with the outcome of the detail fetch and
    /// returns to `Normal`.
    ///
    /// A failed fetch is reported together with the original code.
    pub fn complete(
        &mut self,
        function: Function,
        code: i16,
        fetched: Result<DetailedError>,
    ) -> FocasError {
        self.state = ClassifierState::Normal;
        match fetched {
            Ok(detail) => {
                debug!(%function, code, detail = detail.detail_error_code, "detailed error fetched");
                FocasError::CommandRejected {
                    function,
                    code,
                    detail: Some(detail),
                }
            }
            Err(source) => {
                debug!(%function, code, error = %source, "detailed error fetch failed");
                FocasError::DetailFetchFailed {
                    function,
                    code,
                    source: Box::new(source),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_detail_causes() {
        assert_eq!(DetailCause::from_code(1), DetailCause::FormatError);
        assert_eq!(DetailCause::from_code(2), DetailCause::FileNotFound);
        assert_eq!(DetailCause::from_code(0), DetailCause::Unknown(0));
        assert_eq!(
            DetailedError::new(2).to_string(),
            "file not found (detail code 2)"
        );
        assert_eq!(
            DetailedError::new(7).to_string(),
            "unknown cause (detail code 7)"
        );
    }

    #[test]
    fn test_raw_fields() {
        let detail = DetailedError::new(1).with_field("err_no", 5).with_field("err_dtno", 0);
        assert_eq!(detail.raw_fields.len(), 2);
        assert_eq!(detail.raw_fields.get("err_no"), Some(&5));
    }

    #[test]
    fn test_only_select_code_five_is_ambiguous() {
        assert!(ErrorClassifier::needs_detail(Function::SelectMainProgram, 5));
        assert!(!ErrorClassifier::needs_detail(Function::SelectMainProgram, 3));
        assert!(!ErrorClassifier::needs_detail(Function::ReadPmcRange, 5));
        assert!(!ErrorClassifier::needs_detail(Function::CycleStart, 5));
    }

    #[test]
    fn test_plain_code_stays_normal() {
        let mut classifier = ErrorClassifier::new();
        match classifier.classify(Function::ReadPmcRange, codes::EW_NUMBER) {
            Classification::Report(err) => {
                assert_eq!(err.kind(), ErrorKind::Protocol);
                assert_eq!(err.native_code(), Some(3));
            }
            Classification::FetchDetail => panic!("expected Report"),
        }
        assert_eq!(classifier.state(), ClassifierState::Normal);
    }

    #[test]
    fn test_ambiguous_code_round_trip() {
        let mut classifier = ErrorClassifier::new();
        assert!(matches!(
            classifier.classify(Function::SelectMainProgram, codes::EW_DATA),
            Classification::FetchDetail
        ));
        assert_eq!(classifier.state(), ClassifierState::AwaitingDetail);

        let err = classifier.complete(
            Function::SelectMainProgram,
            codes::EW_DATA,
            Ok(DetailedError::new(2)),
        );
        assert_eq!(classifier.state(), ClassifierState::Normal);
        assert_eq!(err.native_code(), Some(5));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_failed_fetch_keeps_both() {
        let mut classifier = ErrorClassifier::new();
        let _ = classifier.classify(Function::SelectMainProgram, codes::EW_DATA);
        let err = classifier.complete(
            Function::SelectMainProgram,
            codes::EW_DATA,
            Err(FocasError::Timeout),
        );
        assert_eq!(classifier.state(), ClassifierState::Normal);
        assert!(matches!(err, FocasError::DetailFetchFailed { code: 5, .. }));
        assert!(err.to_string().contains("Communication timeout"));
    }

    #[test]
    fn test_link_codes_are_connection_class() {
        for code in [codes::EW_SOCKET, codes::EW_HANDLE, codes::EW_PROTOCOL] {
            assert_eq!(
                classify_code(Function::SelectMainProgram, code).kind(),
                ErrorKind::Connection
            );
        }
        assert!(!is_link_code(codes::EW_BUSY));
    }
}
