//! Reply parsing and record decoding.
//!
//! A [`Reply`] is the `(status, payload)` pair every native call returns.
//! Status zero is success; any other value is a native code that the session
//! hands to the [`ErrorClassifier`](crate::ErrorClassifier). Payloads are
//! little-endian and decoded with a [`PayloadReader`].
//!
//! # Example
//!
//! ```
//! use focas_client::Reply;
//!
//! let mut payload = Vec::new();
//! for part in [0x0102_0304u32, 0x0506_0708, 0x090A_0B0C, 0x0D0E_0F10] {
//!     payload.extend_from_slice(&part.to_le_bytes());
//! }
//! let reply = Reply::ok(payload);
//! assert!(reply.is_success());
//! assert_eq!(reply.to_cnc_id().unwrap(), "01020304-05060708-090a0b0c-0d0e0f10");
//! ```

use crate::address::AddressRange;
use crate::data_type::PmcValue;
use crate::detail::DetailedError;
use crate::error::{FocasError, Result};
use crate::records::{MachineStatus, PositionSet, ProgramInfo, SpindleInfo};

/// Status code and payload of one native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Native status code (0 = success).
    pub status: i16,
    /// Reply payload.
    pub payload: Vec<u8>,
}

impl Reply {
    /// Creates a reply.
    pub fn new(status: i16, payload: Vec<u8>) -> Self {
        Self { status, payload }
    }

    /// Creates a successful reply.
    pub fn ok(payload: Vec<u8>) -> Self {
        Self::new(0, payload)
    }

    /// Creates a failed reply with no payload.
    pub fn failure(status: i16) -> Self {
        Self::new(status, Vec::new())
    }

    /// Returns whether the status is zero.
    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    fn reader(&self) -> PayloadReader<'_> {
        PayloadReader::new(&self.payload)
    }

    /// Decodes a controller ID as four hex groups.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` if the payload is not 16 bytes.
    pub fn to_cnc_id(&self) -> Result<String> {
        let mut r = self.reader();
        let id = [r.u32()?, r.u32()?, r.u32()?, r.u32()?];
        r.finish()?;
        Ok(format!(
            "{:08x}-{:08x}-{:08x}-{:08x}",
            id[0], id[1], id[2], id[3]
        ))
    }

    /// Decodes machine status flags.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` if the payload is not nine `i16`.
    pub fn to_status(&self) -> Result<MachineStatus> {
        let mut r = self.reader();
        let status = MachineStatus {
            aut: r.i16()?,
            run: r.i16()?,
            motion: r.i16()?,
            mstb: r.i16()?,
            emergency: r.i16()?,
            alarm: r.i16()?,
            edit: r.i16()?,
            tmmode: r.i16()?,
            hdck: r.i16()?,
        };
        r.finish()?;
        Ok(status)
    }

    /// Decodes per-axis positions.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` if the payload does not hold
    /// exactly the announced number of axes.
    pub fn to_positions(&self) -> Result<PositionSet> {
        let mut r = self.reader();
        let axes = usize::from(r.u16()?);
        let mut positions = PositionSet {
            absolute: Vec::with_capacity(axes),
            machine: Vec::with_capacity(axes),
            relative: Vec::with_capacity(axes),
            distance: Vec::with_capacity(axes),
        };
        for _ in 0..axes {
            positions.absolute.push(r.i32()?);
            positions.machine.push(r.i32()?);
            positions.relative.push(r.i32()?);
            positions.distance.push(r.i32()?);
        }
        r.finish()?;
        Ok(positions)
    }

    /// Decodes feed rate and spindle speed.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` if the payload is not two `i32`.
    pub fn to_spindle(&self) -> Result<SpindleInfo> {
        let mut r = self.reader();
        let info = SpindleInfo {
            feed: r.i32()?,
            spindle: r.i32()?,
        };
        r.finish()?;
        Ok(info)
    }

    /// Decodes running and main program numbers.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` if the payload is not two `i32`.
    pub fn to_program_info(&self) -> Result<ProgramInfo> {
        let mut r = self.reader();
        let info = ProgramInfo {
            running: r.i32()?,
            main: r.i32()?,
        };
        r.finish()?;
        Ok(info)
    }

    /// Decodes a length-prefixed path.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` if the payload is truncated or
    /// not UTF-8.
    pub fn to_path(&self) -> Result<String> {
        let mut r = self.reader();
        let path = r.string()?;
        r.finish()?;
        Ok(path)
    }

    /// Decodes a detailed error: code followed by named raw fields.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` if the payload is truncated.
    pub fn to_detailed_error(&self) -> Result<DetailedError> {
        let mut r = self.reader();
        let mut detail = DetailedError::new(r.i16()?);
        while !r.is_empty() {
            let len = usize::from(r.u8()?);
            let name = r.utf8(len)?;
            let value = r.i32()?;
            detail.raw_fields.insert(name, value);
        }
        Ok(detail)
    }

    /// Decodes PMC values for `range`.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::InvalidResponse` if the payload does not hold
    /// exactly one element per address in the range.
    ///
    /// # Example
    ///
    /// ```
    /// use focas_client::{AddressRange, DataType, PmcArea, PmcValue, Reply};
    ///
    /// let range = AddressRange::single(PmcArea::X, DataType::Byte, 7);
    /// let values = Reply::ok(vec![0b1100_0000]).to_values(&range).unwrap();
    /// assert_eq!(values, vec![PmcValue::Byte(192)]);
    /// ```
    pub fn to_values(&self, range: &AddressRange) -> Result<Vec<PmcValue>> {
        if self.payload.len() != range.byte_len() {
            return Err(FocasError::invalid_response(format!(
                "{range} needs {} bytes, got {}",
                range.byte_len(),
                self.payload.len()
            )));
        }
        range.data_type().decode(&self.payload)
    }
}

/// Cursor over a little-endian payload.
///
/// Every read fails with `FocasError::InvalidResponse` when the payload is
/// too short.
#[derive(Debug, Clone)]
pub struct PayloadReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    /// Creates a reader at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns whether every byte has been read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads `n` raw bytes.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(FocasError::invalid_response(format!(
                "payload truncated at offset {}: need {} more bytes, have {}",
                self.pos,
                n,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    /// Reads a `u8`.
    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    /// Reads a `u16`.
    pub fn u16(&mut self) -> Result<u16> {
        self.array().map(u16::from_le_bytes)
    }

    /// Reads an `i16`.
    pub fn i16(&mut self) -> Result<i16> {
        self.array().map(i16::from_le_bytes)
    }

    /// Reads a `u32`.
    pub fn u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_le_bytes)
    }

    /// Reads an `i32`.
    pub fn i32(&mut self) -> Result<i32> {
        self.array().map(i32::from_le_bytes)
    }

    /// Reads `len` bytes as UTF-8.
    pub fn utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| FocasError::invalid_response("text is not valid UTF-8"))
    }

    /// Reads a `u16` length followed by that many UTF-8 bytes.
    pub fn string(&mut self) -> Result<String> {
        let len = usize::from(self.u16()?);
        self.utf8(len)
    }

    /// Fails if any bytes are left unread.
    pub fn finish(&self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(FocasError::invalid_response(format!(
                "{} unexpected trailing bytes",
                self.remaining()
            )))
        }
    }
}
