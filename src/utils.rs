//! Bit helpers for PMC bytes.
//!
//! Bit `0` is the least significant bit. Indices above 7 lie outside the
//! byte: they read as OFF and are never written. Use
//! [`BitAddress`](crate::BitAddress) to reject them up front.
//!
//! There is no single-bit write on the wire. To change one bit, read the
//! byte, compute the new byte with [`set_bit`] and write it back with
//! [`Session::write_range`](crate::Session::write_range). The controller may
//! change other bits of that byte in between.
//!
//! # Example
//!
//! ```
//! use focas_client::utils::{byte_to_bits, format_binary, get_bit, set_bit};
//!
//! let value: u8 = 0b1100_0000;
//! assert!(get_bit(value, 7));
//! assert!(!get_bit(value, 5));
//! assert_eq!(set_bit(value, 0, true), 0b1100_0001);
//! assert_eq!(byte_to_bits(value)[6], true);
//! assert_eq!(format_binary(value), "0b1100_0000");
//! ```

/// Returns the single-bit mask for `bit`, or 0 outside the byte.
fn mask(bit: u8) -> u8 {
    1u8.checked_shl(u32::from(bit)).unwrap_or(0)
}

/// Gets a single bit from a PMC byte.
///
/// # Arguments
///
/// * `value` - The byte to extract from
/// * `bit` - Bit position (0-7, where 0 is LSB)
///
/// # Returns
///
/// `true` if the bit is set, i.e. `(value >> bit) & 1 == 1`. Positions above
/// 7 return `false`.
///
/// # Example
///
/// ```
/// use focas_client::utils::get_bit;
///
/// assert!(get_bit(192, 7));
/// assert!(get_bit(192, 6));
/// assert!(!get_bit(192, 5));
/// assert!(!get_bit(0xFF, 8));
/// ```
#[inline]
pub fn get_bit(value: u8, bit: u8) -> bool {
    value & mask(bit) != 0
}

/// Sets or clears a single bit in a PMC byte.
///
/// # Arguments
///
/// * `value` - The original byte
/// * `bit` - Bit position (0-7, where 0 is LSB)
/// * `state` - Value to set (true = ON, false = OFF)
///
/// # Returns
///
/// The modified byte. Positions above 7 leave `value` unchanged.
///
/// # Example
///
/// ```
/// use focas_client::utils::set_bit;
///
/// assert_eq!(set_bit(0, 5, true), 0b0010_0000);
/// assert_eq!(set_bit(0xFF, 0, false), 0xFE);
/// ```
#[inline]
pub fn set_bit(value: u8, bit: u8, state: bool) -> u8 {
    if state {
        value | mask(bit)
    } else {
        value & !mask(bit)
    }
}

/// Toggles a single bit in a PMC byte.
///
/// # Arguments
///
/// * `value` - The original byte
/// * `bit` - Bit position (0-7, where 0 is LSB)
///
/// # Returns
///
/// The modified byte with the bit flipped. Positions above 7 leave `value`
/// unchanged.
#[inline]
pub fn toggle_bit(value: u8, bit: u8) -> u8 {
    value ^ mask(bit)
}

/// Converts a byte to an array of eight booleans.
///
/// # Arguments
///
/// * `value` - The byte to convert
///
/// # Returns
///
/// Array where index 0 is the LSB.
pub fn byte_to_bits(value: u8) -> [bool; 8] {
    std::array::from_fn(|i| get_bit(value, i as u8))
}

/// Converts an array of eight booleans to a byte.
///
/// # Arguments
///
/// * `bits` - Array where index 0 is the LSB
///
/// # Returns
///
/// The packed byte.
///
/// # Example
///
/// ```
/// use focas_client::utils::{bits_to_byte, byte_to_bits};
///
/// assert_eq!(bits_to_byte(&byte_to_bits(0xA5)), 0xA5);
/// ```
pub fn bits_to_byte(bits: &[bool; 8]) -> u8 {
    bits.iter()
        .enumerate()
        .filter(|&(_, &on)| on)
        .fold(0, |acc, (i, _)| acc | (1 << i))
}

/// Lists the bits that are ON.
///
/// # Arguments
///
/// * `value` - The byte to inspect
///
/// # Returns
///
/// Bit positions that are set, ascending.
///
/// # Example
///
/// ```
/// use focas_client::utils::get_on_bits;
///
/// assert_eq!(get_on_bits(0b1000_0101), vec![0, 2, 7]);
/// ```
pub fn get_on_bits(value: u8) -> Vec<u8> {
    (0..8).filter(|&i| get_bit(value, i)).collect()
}

/// Formats one line per bit, MSB first, e.g. `"X7.7: ON"`.
///
/// # Arguments
///
/// * `label` - Prefix of each line, typically the byte address
/// * `value` - The byte to format
pub fn format_bits(label: &str, value: u8) -> String {
    (0..8)
        .rev()
        .map(|i| {
            let state = if get_bit(value, i) { "ON" } else { "OFF" };
            format!("{label}.{i}: {state}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats a byte as `0b0000_0000`.
pub fn format_binary(value: u8) -> String {
    let binary = format!("{value:08b}");
    format!("0b{}_{}", &binary[0..4], &binary[4..8])
}

/// Formats a byte as `0x00`.
pub fn format_hex(value: u8) -> String {
    format!("0x{value:02X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_bit_matches_shift_and_mask() {
        for value in 0..=u8::MAX {
            for bit in 0..8 {
                assert_eq!(get_bit(value, bit), (value >> bit) & 1 == 1);
            }
        }
    }

    #[test]
    fn test_bits_outside_the_byte() {
        for bit in [8, 9, 15, 200, u8::MAX] {
            assert!(!get_bit(0xFF, bit));
            assert_eq!(set_bit(0x5A, bit, true), 0x5A);
            assert_eq!(set_bit(0x5A, bit, false), 0x5A);
            assert_eq!(toggle_bit(0x5A, bit), 0x5A);
        }
    }

    #[test]
    fn test_set_and_toggle_bit() {
        assert_eq!(set_bit(0b1100_0000, 6, false), 0b1000_0000);
        assert_eq!(set_bit(0b1100_0000, 6, true), 0b1100_0000);
        assert_eq!(toggle_bit(0b0000_0001, 0), 0);
        assert_eq!(toggle_bit(0, 7), 0x80);
    }

    #[test]
    fn test_bits_round_trip() {
        let bits = byte_to_bits(0b1100_0000);
        assert_eq!(bits, [false, false, false, false, false, false, true, true]);
        assert_eq!(bits_to_byte(&bits), 192);
    }

    #[test]
    fn test_get_on_bits() {
        assert_eq!(get_on_bits(192), vec![6, 7]);
        assert!(get_on_bits(0).is_empty());
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_binary(0x12), "0b0001_0010");
        assert_eq!(format_hex(0xC0), "0xC0");
        let text = format_bits("X7", 0b1000_0000);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "X7.7: ON");
        assert_eq!(lines[7], "X7.0: OFF");
    }
}
