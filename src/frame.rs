//! Frame header used by [`TcpTransport`](crate::TcpTransport).
//!
//! Every request and reply on the TCP link is a 10-byte header followed by a
//! payload of `length` bytes. Header fields are big-endian; payload contents
//! are little-endian (see [`Request`](crate::Request) and [`Reply`](crate::Reply)).
//!
//! | Byte | Field | Description |
//! |------|-------|-------------|
//! | 0-1 | MAGIC | Always `0xA0A0` |
//! | 2 | VER | Frame version (1) |
//! | 3 | DIR | `0x01` request, `0x02` reply |
//! | 4-5 | FUNC | Function code |
//! | 6-7 | STATUS | Native status code (0 in requests) |
//! | 8-9 | LEN | Payload length |
//!
//! # Example
//!
//! ```
//! use focas_client::FrameHeader;
//!
//! let header = FrameHeader::request(0x0010, 8);
//! let bytes = header.to_bytes();
//! assert_eq!(bytes.len(), 10);
//! assert_eq!(FrameHeader::from_bytes(&bytes).unwrap(), header);
//! ```

use crate::error::{FocasError, Result};

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 10;

/// Frame magic.
pub const FRAME_MAGIC: u16 = 0xA0A0;

/// Frame version understood by this crate.
pub const FRAME_VERSION: u8 = 1;

/// Largest payload a single frame can carry.
pub const MAX_FRAME_PAYLOAD: usize = u16::MAX as usize;

const DIR_REQUEST: u8 = 0x01;
const DIR_REPLY: u8 = 0x02;

/// Request/reply frame header (10 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Direction byte (`0x01` request, `0x02` reply).
    pub direction: u8,
    /// Function code.
    pub function: u16,
    /// Native status code. Zero in requests.
    pub status: i16,
    /// Payload length in bytes.
    pub length: u16,
}

impl FrameHeader {
    /// Creates a request header.
    pub fn request(function: u16, length: u16) -> Self {
        Self {
            direction: DIR_REQUEST,
            function,
            status: 0,
            length,
        }
    }

    /// Creates a reply header.
    pub fn reply(function: u16, status: i16, length: u16) -> Self {
        Self {
            direction: DIR_REPLY,
            function,
            status,
            length,
        }
    }

    /// Returns whether this is a reply header.
    pub fn is_reply(self) -> bool {
        self.direction == DIR_REPLY
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(self) -> [u8; FRAME_HEADER_SIZE] {
        let magic = FRAME_MAGIC.to_be_bytes();
        let function = self.function.to_be_bytes();
        let status = self.status.to_be_bytes();
        let length = self.length.to_be_bytes();
        [
            magic[0],
            magic[1],
            FRAME_VERSION,
            self.direction,
            function[0],
            function[1],
            status[0],
            status[1],
            length[0],
            length[1],
        ]
    }

    /// Parses a header from bytes.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` if the slice is too short, or the
    /// magic, version or direction byte is wrong.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::FrameHeader;
    ///
    /// let bytes = [0xA0, 0xA0, 0x01, 0x02, 0x00, 0x10, 0x00, 0x05, 0x00, 0x00];
    /// let header = FrameHeader::from_bytes(&bytes).unwrap();
    /// assert!(header.is_reply());
    /// assert_eq!(header.status, 5);
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < FRAME_HEADER_SIZE {
            return Err(FocasError::invalid_response(format!(
                "header too short: expected {} bytes, got {}",
                FRAME_HEADER_SIZE,
                data.len()
            )));
        }

        let magic = u16::from_be_bytes([data[0], data[1]]);
        if magic != FRAME_MAGIC {
            return Err(FocasError::invalid_response(format!(
                "bad frame magic 0x{magic:04X}"
            )));
        }
        if data[2] != FRAME_VERSION {
            return Err(FocasError::invalid_response(format!(
                "unsupported frame version {}",
                data[2]
            )));
        }
        if data[3] != DIR_REQUEST && data[3] != DIR_REPLY {
            return Err(FocasError::invalid_response(format!(
                "bad direction byte 0x{:02X}",
                data[3]
            )));
        }

        Ok(Self {
            direction: data[3],
            function: u16::from_be_bytes([data[4], data[5]]),
            status: i16::from_be_bytes([data[6], data[7]]),
            length: u16::from_be_bytes([data[8], data[9]]),
        })
    }
}

/// Builds a complete request frame: header plus payload.
///
/// # Errors
///
/// Returns `FocasError::InvalidParameter` if the payload exceeds
/// [`MAX_FRAME_PAYLOAD`].
pub fn encode_request(function: u16, payload: &[u8]) -> Result<Vec<u8>> {
    let header = FrameHeader::request(function, payload_length(payload)?);
    Ok(assemble(header, payload))
}

/// Builds a complete reply frame: header plus payload.
///
/// # Errors
///
/// Returns `FocasError::InvalidParameter` if the payload exceeds
/// [`MAX_FRAME_PAYLOAD`].
pub fn encode_reply(function: u16, status: i16, payload: &[u8]) -> Result<Vec<u8>> {
    let header = FrameHeader::reply(function, status, payload_length(payload)?);
    Ok(assemble(header, payload))
}

fn payload_length(payload: &[u8]) -> Result<u16> {
    u16::try_from(payload.len()).map_err(|_| {
        FocasError::invalid_parameter(
            "payload",
            format!("{} bytes exceeds {}", payload.len(), MAX_FRAME_PAYLOAD),
        )
    })
}

fn assemble(header: FrameHeader, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_header_to_bytes() {
        let header = FrameHeader::request(0x0102, 8);
        assert_eq!(
            header.to_bytes(),
            [0xA0, 0xA0, 0x01, 0x01, 0x01, 0x02, 0x00, 0x00, 0x00, 0x08]
        );
        assert!(!header.is_reply());
    }

    #[test]
    fn test_reply_header_negative_status() {
        let header = FrameHeader::reply(0x0001, -16, 0);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[6..8], &[0xFF, 0xF0]);
        let parsed = FrameHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.status, -16);
        assert!(parsed.is_reply());
    }

    #[test]
    fn test_header_from_bytes_too_short() {
        assert!(FrameHeader::from_bytes(&[0xA0, 0xA0, 0x01]).is_err());
    }

    #[test]
    fn test_header_rejects_bad_magic_version_direction() {
        let good = FrameHeader::reply(1, 0, 0).to_bytes();

        let mut bad_magic = good;
        bad_magic[0] = 0x80;
        assert!(FrameHeader::from_bytes(&bad_magic).is_err());

        let mut bad_version = good;
        bad_version[2] = 9;
        assert!(FrameHeader::from_bytes(&bad_version).is_err());

        let mut bad_direction = good;
        bad_direction[3] = 0x07;
        assert!(FrameHeader::from_bytes(&bad_direction).is_err());
    }

    #[test]
    fn test_encode_frames() {
        let frame = encode_request(0x0010, &[1, 2, 3]).unwrap();
        assert_eq!(
            frame,
            hex::decode("a0a00101001000000003010203").unwrap()
        );

        let reply = encode_reply(0x0030, 5, &[]).unwrap();
        assert_eq!(reply, hex::decode("a0a00102003000050000").unwrap());
    }

    #[test]
    fn test_encode_frame_rejects_oversized_payload() {
        let payload = vec![0u8; MAX_FRAME_PAYLOAD + 1];
        assert!(encode_request(1, &payload).is_err());
        assert!(encode_reply(1, 0, &payload).is_err());
    }
}
