//! Aggregate machine-state records.
//!
//! Records are detached copies of live controller state. They are produced by
//! [`Session`](crate::Session) readers and never refer back to the session.

/// Machine status flags as reported by the controller.
///
/// Field values are controller-defined codes; only the derived views
/// [`is_mdi`](Self::is_mdi), [`is_auto`](Self::is_auto) and
/// [`is_jog`](Self::is_jog) attach meaning to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineStatus {
    /// Automatic/manual mode selection.
    pub aut: i16,
    /// Automatic operation state.
    pub run: i16,
    /// Axis movement and dwell state.
    pub motion: i16,
    /// M, S, T, B function state.
    pub mstb: i16,
    /// Emergency stop state.
    pub emergency: i16,
    /// Alarm state.
    pub alarm: i16,
    /// Program editing state.
    pub edit: i16,
    /// T/M mode selection.
    pub tmmode: i16,
    /// Manual handle retrace state.
    pub hdck: i16,
}

impl MachineStatus {
    /// Returns whether the controller is in MDI mode.
    pub fn is_mdi(&self) -> bool {
        self.tmmode == 1
    }

    /// Returns whether the controller is in AUTO mode.
    pub fn is_auto(&self) -> bool {
        !self.is_mdi() && self.aut == 1
    }

    /// Returns whether the controller is in JOG mode, i.e. neither MDI nor AUTO.
    pub fn is_jog(&self) -> bool {
        !self.is_mdi() && !self.is_auto()
    }

    /// Returns the operation mode implied by the flags.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::{MachineStatus, OperationMode};
    ///
    /// let status = MachineStatus { aut: 1, ..Default::default() };
    /// assert_eq!(status.mode(), OperationMode::Auto);
    /// assert_eq!(MachineStatus::default().mode(), OperationMode::Jog);
    /// ```
    pub fn mode(&self) -> OperationMode {
        if self.is_mdi() {
            OperationMode::Mdi
        } else if self.is_auto() {
            OperationMode::Auto
        } else {
            OperationMode::Jog
        }
    }
}

/// Per-axis positions.
///
/// Every sequence has one entry per axis, in axis-index order, and all four
/// sequences have the same length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionSet {
    /// Absolute (workpiece) coordinates.
    pub absolute: Vec<i32>,
    /// Machine coordinates.
    pub machine: Vec<i32>,
    /// Relative coordinates.
    pub relative: Vec<i32>,
    /// Distance to go.
    pub distance: Vec<i32>,
}

impl PositionSet {
    /// Returns the number of axes.
    pub fn axis_count(&self) -> usize {
        self.absolute.len()
    }
}

/// Actual feed rate and spindle speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpindleInfo {
    /// Actual feed rate.
    pub feed: i32,
    /// Actual spindle speed.
    pub spindle: i32,
}

/// Running and main program numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgramInfo {
    /// Number of the program currently executing.
    pub running: i32,
    /// Number of the selected main program.
    pub main: i32,
}

/// Operation modes selectable through the operator panel signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationMode {
    /// Manual data input.
    Mdi,
    /// Automatic (memory) operation.
    Auto,
    /// Jog feed.
    Jog,
}

impl OperationMode {
    /// Returns the panel signal code of this mode.
    pub fn code(self) -> i16 {
        match self {
            OperationMode::Mdi => 1,
            OperationMode::Auto => 2,
            OperationMode::Jog => 3,
        }
    }

    /// Looks up a mode by panel signal code.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(OperationMode::Mdi),
            2 => Some(OperationMode::Auto),
            3 => Some(OperationMode::Jog),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationMode::Mdi => write!(f, "MDI"),
            OperationMode::Auto => write!(f, "AUTO"),
            OperationMode::Jog => write!(f, "JOG"),
        }
    }
}
