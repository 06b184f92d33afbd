//! PMC address ranges and bit addresses.
//!
//! An [`AddressRange`] names a contiguous run of elements of one
//! [`DataType`] inside one [`PmcArea`]. A [`BitAddress`] names a single bit of
//! a BYTE element; it is always resolved to a one-byte range read plus bit
//! extraction and never travels on its own.
//!
//! Validation happens at construction, before any network interaction.
//!
//! # Example
//!
//! ```
//! use focas_client::{AddressRange, BitAddress, DataType, PmcArea};
//!
//! let range = AddressRange::new(PmcArea::D, DataType::Word, 100, 109).unwrap();
//! assert_eq!(range.len(), 10);
//! assert_eq!(range.byte_len(), 20);
//!
//! let bit: BitAddress = "X7.6".parse().unwrap();
//! assert_eq!(bit, BitAddress::new(PmcArea::X, 7, 6).unwrap());
//!
//! assert!(AddressRange::new(PmcArea::D, DataType::Word, 10, 5).is_err());
//! assert!(BitAddress::new(PmcArea::X, 7, 8).is_err());
//! ```

use std::str::FromStr;

use crate::area::PmcArea;
use crate::data_type::{DataType, PmcValue};
use crate::error::{FocasError, Result};

/// Contiguous range of PMC elements, `start..=end` in element units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddressRange {
    area: PmcArea,
    data_type: DataType,
    start: u16,
    end: u16,
}

impl AddressRange {
    /// Creates a validated address range.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidAddress` if `start > end`.
    pub fn new(area: PmcArea, data_type: DataType, start: u16, end: u16) -> Result<Self> {
        if start > end {
            return Err(FocasError::invalid_address(format!(
                "{area}{start}-{area}{end}: start is after end"
            )));
        }
        Ok(Self {
            area,
            data_type,
            start,
            end,
        })
    }

    /// Creates a range covering a single element.
    pub fn single(area: PmcArea, data_type: DataType, index: u16) -> Self {
        Self {
            area,
            data_type,
            start: index,
            end: index,
        }
    }

    /// Returns the area.
    pub fn area(&self) -> PmcArea {
        self.area
    }

    /// Returns the data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the first element index.
    pub fn start(&self) -> u16 {
        self.start
    }

    /// Returns the last element index (inclusive).
    pub fn end(&self) -> u16 {
        self.end
    }

    /// Returns the number of elements, `end - start + 1`.
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    /// Always false: a valid range holds at least one element.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the payload size of the range in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * self.data_type.width()
    }

    /// Splits the range into consecutive sub-ranges of at most
    /// `max_transfer_bytes` each, in ascending address order.
    ///
    /// A range that already fits is returned unchanged as the only element.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::{AddressRange, DataType, PmcArea};
    ///
    /// let range = AddressRange::new(PmcArea::R, DataType::Long, 0, 9).unwrap();
    /// let parts = range.fragments(16);
    /// let bounds: Vec<(u16, u16)> = parts.iter().map(|r| (r.start(), r.end())).collect();
    /// assert_eq!(bounds, vec![(0, 3), (4, 7), (8, 9)]);
    /// ```
    pub fn fragments(&self, max_transfer_bytes: usize) -> Vec<AddressRange> {
        let per_call = (max_transfer_bytes / self.data_type.width()).max(1);
        let mut parts = Vec::with_capacity(self.len().div_ceil(per_call));
        let mut first = usize::from(self.start);
        let last = usize::from(self.end);
        while first <= last {
            let stop = first + (per_call - 1).min(last - first);
            // Both bounds lie within start..=end, so they fit in u16.
            parts.push(Self {
                area: self.area,
                data_type: self.data_type,
                start: first as u16,
                end: stop as u16,
            });
            first = stop + 1;
        }
        parts
    }

    /// Checks that `values` can be written to this range.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidAddress` if the area is read-only, if the
    /// number of values differs from [`len`](Self::len), or if any value has a
    /// different data type than the range.
    pub fn check_write(&self, values: &[PmcValue]) -> Result<()> {
        if !self.area.supports_write() {
            return Err(FocasError::invalid_address(format!(
                "area {} ({}) is read-only",
                self.area,
                self.area.description()
            )));
        }
        if values.len() != self.len() {
            return Err(FocasError::invalid_address(format!(
                "{self} holds {} elements but {} values were supplied",
                self.len(),
                values.len()
            )));
        }
        if let Some((offset, value)) = values
            .iter()
            .enumerate()
            .find(|(_, value)| value.data_type() != self.data_type)
        {
            return Err(FocasError::invalid_address(format!(
                "value {offset} is {} but {self} is {}",
                value.data_type(),
                self.data_type
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}{} ({})", self.area, self.start, self.data_type)
        } else {
            write!(
                f,
                "{}{}-{}{} ({})",
                self.area, self.start, self.area, self.end, self.data_type
            )
        }
    }
}

/// Single bit within a BYTE element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitAddress {
    area: PmcArea,
    byte: u16,
    bit: u8,
}

impl BitAddress {
    /// Creates a validated bit address.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidAddress` if `bit > 7`.
    pub fn new(area: PmcArea, byte: u16, bit: u8) -> Result<Self> {
        if bit > 7 {
            return Err(FocasError::invalid_address(format!(
                "{area}{byte}.{bit}: bit must be 0-7"
            )));
        }
        Ok(Self { area, byte, bit })
    }

    /// Returns the area.
    pub fn area(&self) -> PmcArea {
        self.area
    }

    /// Returns the byte index.
    pub fn byte(&self) -> u16 {
        self.byte
    }

    /// Returns the bit position (0-7).
    pub fn bit(&self) -> u8 {
        self.bit
    }

    /// Returns the one-byte range containing this bit.
    pub fn byte_range(&self) -> AddressRange {
        AddressRange::single(self.area, DataType::Byte, self.byte)
    }
}

impl std::fmt::Display for BitAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}.{}", self.area, self.byte, self.bit)
    }
}

impl FromStr for BitAddress {
    type Err = FocasError;

    /// Parses the conventional `<area><byte>.<bit>` notation, e.g. `X7.6`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || FocasError::invalid_address(format!("'{s}' is not of the form X7.6"));
        let split = s.char_indices().nth(1).map(|(i, _)| i).ok_or_else(invalid)?;
        let (area, rest) = s.split_at(split);
        let (byte, bit) = rest.split_once('.').ok_or_else(invalid)?;
        let area: PmcArea = area.parse()?;
        let byte: u16 = byte.parse().map_err(|_| invalid())?;
        let bit: u8 = bit.parse().map_err(|_| invalid())?;
        Self::new(area, byte, bit)
    }
}
