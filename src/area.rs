//! PMC area definitions.
//!
//! This module defines the [`PmcArea`] enum, one variant per PMC register
//! bank. Each bank has its own wire code and its own write permission.
//!
//! # Areas Overview
//!
//! | Area | Code | Description | Client Write |
//! |------|:----:|-------------|:------------:|
//! | G | 0 | Signals from PMC to CNC | ✓ |
//! | F | 1 | Signals from CNC to PMC | ✗ |
//! | Y | 2 | Signals from PMC to machine | ✓ |
//! | X | 3 | Signals from machine to PMC | ✗ |
//! | A | 4 | Message display requests | ✓ |
//! | R | 5 | Internal relays | ✓ |
//! | T | 6 | Variable timers | ✓ |
//! | K | 7 | Keep relays | ✓ |
//! | C | 8 | Counters | ✓ |
//! | D | 9 | Data table | ✓ |
//! | M | 10 | Signals from another PMC path | ✓ |
//! | N | 11 | Signals to another PMC path | ✓ |
//! | E | 12 | Extended relays | ✓ |
//! | Z | 13 | System relays | ✓ |
//!
//! F and X are driven by the CNC and the machine respectively, so the client
//! only reads them.
//!
//! # Example
//!
//! ```
//! use focas_client::PmcArea;
//!
//! assert!(PmcArea::Y.supports_write());
//! assert!(!PmcArea::X.supports_write());
//! assert_eq!(PmcArea::X.to_string(), "X");
//! assert_eq!("d".parse::<PmcArea>().unwrap(), PmcArea::D);
//! ```

use std::str::FromStr;

use crate::error::{FocasError, Result};

/// PMC register banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PmcArea {
    /// Output signals from PMC to CNC.
    G,
    /// Input signals to PMC from CNC.
    F,
    /// Output signals from PMC to machine.
    Y,
    /// Input signals to PMC from machine.
    X,
    /// Message display requests.
    A,
    /// Internal relays.
    R,
    /// Variable timers.
    T,
    /// Keep relays.
    K,
    /// Counters.
    C,
    /// Data table.
    D,
    /// Input signals from another PMC path.
    M,
    /// Output signals to another PMC path.
    N,
    /// Extended relays.
    E,
    /// System relays.
    Z,
}

impl PmcArea {
    /// Every area, in wire-code order.
    pub const ALL: [PmcArea; 14] = [
        PmcArea::G,
        PmcArea::F,
        PmcArea::Y,
        PmcArea::X,
        PmcArea::A,
        PmcArea::R,
        PmcArea::T,
        PmcArea::K,
        PmcArea::C,
        PmcArea::D,
        PmcArea::M,
        PmcArea::N,
        PmcArea::E,
        PmcArea::Z,
    ];

    /// Returns the wire code of this area.
    pub fn code(self) -> u16 {
        match self {
            PmcArea::G => 0,
            PmcArea::F => 1,
            PmcArea::Y => 2,
            PmcArea::X => 3,
            PmcArea::A => 4,
            PmcArea::R => 5,
            PmcArea::T => 6,
            PmcArea::K => 7,
            PmcArea::C => 8,
            PmcArea::D => 9,
            PmcArea::M => 10,
            PmcArea::N => 11,
            PmcArea::E => 12,
            PmcArea::Z => 13,
        }
    }

    /// Looks up an area by wire code.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidAddress` for codes outside 0-13.
    pub fn from_code(code: u16) -> Result<Self> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or_else(|| FocasError::invalid_address(format!("unknown PMC area code {code}")))
    }

    /// Returns whether the client may write this area.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::PmcArea;
    ///
    /// assert!(PmcArea::G.supports_write());
    /// assert!(!PmcArea::F.supports_write());
    /// ```
    pub fn supports_write(self) -> bool {
        !matches!(self, PmcArea::F | PmcArea::X)
    }

    /// Returns a short description of the area.
    pub fn description(self) -> &'static str {
        match self {
            PmcArea::G => "signals from PMC to CNC",
            PmcArea::F => "signals from CNC to PMC",
            PmcArea::Y => "signals from PMC to machine",
            PmcArea::X => "signals from machine to PMC",
            PmcArea::A => "message display requests",
            PmcArea::R => "internal relays",
            PmcArea::T => "variable timers",
            PmcArea::K => "keep relays",
            PmcArea::C => "counters",
            PmcArea::D => "data table",
            PmcArea::M => "signals from another PMC path",
            PmcArea::N => "signals to another PMC path",
            PmcArea::E => "extended relays",
            PmcArea::Z => "system relays",
        }
    }

    fn letter(self) -> char {
        match self {
            PmcArea::G => 'G',
            PmcArea::F => 'F',
            PmcArea::Y => 'Y',
            PmcArea::X => 'X',
            PmcArea::A => 'A',
            PmcArea::R => 'R',
            PmcArea::T => 'T',
            PmcArea::K => 'K',
            PmcArea::C => 'C',
            PmcArea::D => 'D',
            PmcArea::M => 'M',
            PmcArea::N => 'N',
            PmcArea::E => 'E',
            PmcArea::Z => 'Z',
        }
    }
}

impl std::fmt::Display for PmcArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for PmcArea {
    type Err = FocasError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::ALL
                .iter()
                .copied()
                .find(|area| area.letter() == c.to_ascii_uppercase())
                .ok_or_else(|| FocasError::invalid_address(format!("unknown PMC area '{s}'"))),
            _ => Err(FocasError::invalid_address(format!(
                "unknown PMC area '{s}'"
            ))),
        }
    }
}
