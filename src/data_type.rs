//! PMC data types and value codec.
//!
//! A [`DataType`] selects an entry in a small dispatch table of
//! `(width, decode)` pairs. Raw payload bytes are split into fixed-width
//! little-endian chunks and decoded into [`PmcValue`]s in ascending address
//! order.
//!
//! | Type | Code | Width | Interpretation |
//! |------|:----:|:-----:|----------------|
//! | BYTE | 0 | 1 | unsigned 8-bit (0-255) |
//! | WORD | 1 | 2 | signed 16-bit |
//! | LONG | 2 | 4 | signed 32-bit |
//! | FLOAT | 4 | 4 | IEEE 754 single |
//! | DOUBLE | 5 | 8 | IEEE 754 double |
//!
//! # Example
//!
//! ```
//! use focas_client::{DataType, PmcValue};
//!
//! let values = DataType::Word.decode(&[0x34, 0x12, 0xFF, 0xFF]).unwrap();
//! assert_eq!(values, vec![PmcValue::Word(0x1234), PmcValue::Word(-1)]);
//! ```

use crate::error::{FocasError, Result};

/// PMC data type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// 8-bit, unsigned.
    Byte,
    /// 16-bit signed integer.
    Word,
    /// 32-bit signed integer.
    Long,
    /// 32-bit IEEE 754 float.
    Float,
    /// 64-bit IEEE 754 float.
    Double,
}

struct Codec {
    width: usize,
    decode: fn(&[u8]) -> PmcValue,
}

// Chunks handed to the decoders always have exactly `width` bytes.
fn decode_byte(b: &[u8]) -> PmcValue {
    PmcValue::Byte(b[0])
}

fn decode_word(b: &[u8]) -> PmcValue {
    PmcValue::Word(i16::from_le_bytes([b[0], b[1]]))
}

fn decode_long(b: &[u8]) -> PmcValue {
    PmcValue::Long(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn decode_float(b: &[u8]) -> PmcValue {
    PmcValue::Float(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn decode_double(b: &[u8]) -> PmcValue {
    PmcValue::Double(f64::from_le_bytes([
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
    ]))
}

const BYTE_CODEC: Codec = Codec {
    width: 1,
    decode: decode_byte,
};
const WORD_CODEC: Codec = Codec {
    width: 2,
    decode: decode_word,
};
const LONG_CODEC: Codec = Codec {
    width: 4,
    decode: decode_long,
};
const FLOAT_CODEC: Codec = Codec {
    width: 4,
    decode: decode_float,
};
const DOUBLE_CODEC: Codec = Codec {
    width: 8,
    decode: decode_double,
};

impl DataType {
    /// Every data type, in wire-code order.
    pub const ALL: [DataType; 5] = [
        DataType::Byte,
        DataType::Word,
        DataType::Long,
        DataType::Float,
        DataType::Double,
    ];

    /// Widest element size in bytes.
    pub const MAX_WIDTH: usize = 8;

    fn codec(self) -> &'static Codec {
        match self {
            DataType::Byte => &BYTE_CODEC,
            DataType::Word => &WORD_CODEC,
            DataType::Long => &LONG_CODEC,
            DataType::Float => &FLOAT_CODEC,
            DataType::Double => &DOUBLE_CODEC,
        }
    }

    /// Returns the wire code of this data type.
    pub fn code(self) -> u16 {
        match self {
            DataType::Byte => 0,
            DataType::Word => 1,
            DataType::Long => 2,
            DataType::Float => 4,
            DataType::Double => 5,
        }
    }

    /// Looks up a data type by wire code.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidAddress` for undefined codes (including 3).
    pub fn from_code(code: u16) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|data_type| data_type.code() == code)
            .ok_or_else(|| FocasError::invalid_address(format!("unknown PMC data type code {code}")))
    }

    /// Returns the element width in bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::DataType;
    ///
    /// assert_eq!(DataType::Byte.width(), 1);
    /// assert_eq!(DataType::Double.width(), 8);
    /// ```
    pub fn width(self) -> usize {
        self.codec().width
    }

    /// Decodes a payload into values of this type.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` if the payload length is not a
    /// multiple of the element width.
    pub fn decode(self, bytes: &[u8]) -> Result<Vec<PmcValue>> {
        let codec = self.codec();
        if bytes.len() % codec.width != 0 {
            return Err(FocasError::invalid_response(format!(
                "{} bytes is not a whole number of {} elements",
                bytes.len(),
                self
            )));
        }
        Ok(bytes.chunks_exact(codec.width).map(codec.decode).collect())
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Byte => write!(f, "BYTE"),
            DataType::Word => write!(f, "WORD"),
            DataType::Long => write!(f, "LONG"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Double => write!(f, "DOUBLE"),
        }
    }
}

/// A single decoded PMC value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PmcValue {
    /// BYTE value.
    Byte(u8),
    /// WORD value.
    Word(i16),
    /// LONG value.
    Long(i32),
    /// FLOAT value.
    Float(f32),
    /// DOUBLE value.
    Double(f64),
}

impl PmcValue {
    /// Returns the data type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            PmcValue::Byte(_) => DataType::Byte,
            PmcValue::Word(_) => DataType::Word,
            PmcValue::Long(_) => DataType::Long,
            PmcValue::Float(_) => DataType::Float,
            PmcValue::Double(_) => DataType::Double,
        }
    }

    /// Returns the value as an integer, or `None` for FLOAT/DOUBLE.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::PmcValue;
    ///
    /// assert_eq!(PmcValue::Byte(192).as_i64(), Some(192));
    /// assert_eq!(PmcValue::Word(-2).as_i64(), Some(-2));
    /// assert_eq!(PmcValue::Float(1.5).as_i64(), None);
    /// ```
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            PmcValue::Byte(v) => Some(i64::from(v)),
            PmcValue::Word(v) => Some(i64::from(v)),
            PmcValue::Long(v) => Some(i64::from(v)),
            PmcValue::Float(_) | PmcValue::Double(_) => None,
        }
    }

    /// Returns the value widened to `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            PmcValue::Byte(v) => f64::from(v),
            PmcValue::Word(v) => f64::from(v),
            PmcValue::Long(v) => f64::from(v),
            PmcValue::Float(v) => f64::from(v),
            PmcValue::Double(v) => v,
        }
    }

    /// Returns the raw byte of a BYTE value.
    pub fn as_byte(&self) -> Option<u8> {
        match *self {
            PmcValue::Byte(v) => Some(v),
            _ => None,
        }
    }

    /// Appends the little-endian encoding of this value.
    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        match *self {
            PmcValue::Byte(v) => out.push(v),
            PmcValue::Word(v) => out.extend_from_slice(&v.to_le_bytes()),
            PmcValue::Long(v) => out.extend_from_slice(&v.to_le_bytes()),
            PmcValue::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
            PmcValue::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

impl std::fmt::Display for PmcValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PmcValue::Byte(v) => write!(f, "{v}"),
            PmcValue::Word(v) => write!(f, "{v}"),
            PmcValue::Long(v) => write!(f, "{v}"),
            PmcValue::Float(v) => write!(f, "{v}"),
            PmcValue::Double(v) => write!(f, "{v}"),
        }
    }
}

impl From<u8> for PmcValue {
    fn from(value: u8) -> Self {
        PmcValue::Byte(value)
    }
}

impl From<i16> for PmcValue {
    fn from(value: i16) -> Self {
        PmcValue::Word(value)
    }
}

impl From<i32> for PmcValue {
    fn from(value: i32) -> Self {
        PmcValue::Long(value)
    }
}

impl From<f32> for PmcValue {
    fn from(value: f32) -> Self {
        PmcValue::Float(value)
    }
}

impl From<f64> for PmcValue {
    fn from(value: f64) -> Self {
        PmcValue::Double(value)
    }
}

/// Encodes values into a little-endian payload.
pub(crate) fn encode_values(values: &[PmcValue]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.iter().map(|v| v.data_type().width()).sum());
    for value in values {
        value.encode_into(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_widths() {
        let table: Vec<(u16, usize)> = DataType::ALL.iter().map(|t| (t.code(), t.width())).collect();
        assert_eq!(table, vec![(0, 1), (1, 2), (2, 4), (4, 4), (5, 8)]);
    }

    #[test]
    fn test_from_code() {
        for data_type in DataType::ALL {
            assert_eq!(DataType::from_code(data_type.code()).unwrap(), data_type);
        }
        assert!(DataType::from_code(3).is_err());
        assert!(DataType::from_code(6).is_err());
    }

    #[test]
    fn test_byte_decodes_unsigned() {
        let values = DataType::Byte.decode(&[0b1100_0000, 0xFF, 0x00]).unwrap();
        assert_eq!(
            values,
            vec![PmcValue::Byte(192), PmcValue::Byte(255), PmcValue::Byte(0)]
        );
    }

    #[test]
    fn test_word_and_long_decode_signed() {
        assert_eq!(
            DataType::Word.decode(&[0x00, 0x80]).unwrap(),
            vec![PmcValue::Word(i16::MIN)]
        );
        assert_eq!(
            DataType::Long.decode(&[0xFE, 0xFF, 0xFF, 0xFF]).unwrap(),
            vec![PmcValue::Long(-2)]
        );
    }

    #[test]
    fn test_float_and_double_decode_ieee754() {
        assert_eq!(
            DataType::Float.decode(&1.5f32.to_le_bytes()).unwrap(),
            vec![PmcValue::Float(1.5)]
        );
        assert_eq!(
            DataType::Double.decode(&(-0.25f64).to_le_bytes()).unwrap(),
            vec![PmcValue::Double(-0.25)]
        );
    }

    #[test]
    fn test_decode_rejects_partial_element() {
        assert!(DataType::Word.decode(&[0x01]).is_err());
        assert!(DataType::Double.decode(&[0u8; 12]).is_err());
        assert!(DataType::Long.decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_encode_matches_decode_layout() {
        let values = [
            PmcValue::Long(-123_456),
            PmcValue::Long(7),
            PmcValue::Long(i32::MAX),
        ];
        let bytes = encode_values(&values);
        assert_eq!(bytes.len(), 12);
        assert_eq!(DataType::Long.decode(&bytes).unwrap(), values.to_vec());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(PmcValue::from(7u8).as_byte(), Some(7));
        assert_eq!(PmcValue::from(7i16).as_byte(), None);
        assert_eq!(PmcValue::from(2.5f32).as_f64(), 2.5);
        assert_eq!(PmcValue::from(-9i32).data_type(), DataType::Long);
        assert_eq!(PmcValue::Double(0.5).to_string(), "0.5");
    }
}
