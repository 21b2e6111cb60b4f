//! Ordered binary snapshot records.
//!
//! A snapshot is a flat concatenation of fixed-layout records, written and
//! read back in the same order. Multi-byte integers are little-endian; byte
//! blocks carry a `u32` length prefix that is checked against the size of
//! the region being restored.

use thiserror::Error;

pub const SNAPSHOT_MAGIC: &[u8; 4] = b"CABS";
pub const SNAPSHOT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("not a snapshot (bad magic)")]
    BadMagic,
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u16),
    #[error("snapshot truncated at byte {offset}: needed {needed} more bytes")]
    Truncated { offset: usize, needed: usize },
    #[error("record length mismatch: expected {expected} bytes, found {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("{0} trailing bytes after the last record")]
    TrailingBytes(usize),
    #[error("invalid value {value:#04x} for {field}")]
    InvalidValue { field: &'static str, value: u8 },
}

/// Implemented by every component whose state must survive a save/resume.
pub trait Snapshot {
    fn save(&self, out: &mut SnapshotWriter);
    fn restore(&mut self, input: &mut SnapshotReader<'_>) -> Result<(), SnapshotError>;
}

impl<T: Snapshot + ?Sized> Snapshot for Box<T> {
    fn save(&self, out: &mut SnapshotWriter) {
        (**self).save(out)
    }

    fn restore(&mut self, input: &mut SnapshotReader<'_>) -> Result<(), SnapshotError> {
        (**self).restore(input)
    }
}

#[derive(Default)]
pub struct SnapshotWriter {
    buf: Vec<u8>,
}

impl SnapshotWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a snapshot with the magic and version header.
    pub fn with_header() -> Self {
        let mut out = Self::new();
        out.buf.extend_from_slice(SNAPSHOT_MAGIC);
        out.put_u16(SNAPSHOT_VERSION);
        out
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Length-prefixed byte block.
    pub fn put_block(&mut self, bytes: &[u8]) {
        self.put_u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

pub struct SnapshotReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SnapshotReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Open a snapshot and validate its magic and version header.
    pub fn with_header(data: &'a [u8]) -> Result<Self, SnapshotError> {
        let mut input = Self::new(data);
        if input.take(SNAPSHOT_MAGIC.len()).ok() != Some(&SNAPSHOT_MAGIC[..]) {
            return Err(SnapshotError::BadMagic);
        }
        let version = input.get_u16()?;
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }
        Ok(input)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], SnapshotError> {
        let remaining = self.data.len() - self.pos;
        if remaining < count {
            return Err(SnapshotError::Truncated {
                offset: self.pos,
                needed: count - remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    pub fn get_u8(&mut self) -> Result<u8, SnapshotError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_bool(&mut self) -> Result<bool, SnapshotError> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(SnapshotError::InvalidValue { field: "bool", value }),
        }
    }

    pub fn get_u16(&mut self) -> Result<u16, SnapshotError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn get_u32(&mut self) -> Result<u32, SnapshotError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a length-prefixed block whose length must equal `dest.len()`.
    pub fn get_block_into(&mut self, dest: &mut [u8]) -> Result<(), SnapshotError> {
        let len = self.get_u32()? as usize;
        if len != dest.len() {
            return Err(SnapshotError::LengthMismatch {
                expected: dest.len(),
                actual: len,
            });
        }
        dest.copy_from_slice(self.take(len)?);
        Ok(())
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(self) -> Result<(), SnapshotError> {
        match self.data.len() - self.pos {
            0 => Ok(()),
            extra => Err(SnapshotError::TrailingBytes(extra)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_checked() {
        let bytes = SnapshotWriter::with_header().into_bytes();
        assert!(SnapshotReader::with_header(&bytes).is_ok());

        assert_eq!(
            SnapshotReader::with_header(b"NOPE\x01\x00").err(),
            Some(SnapshotError::BadMagic)
        );
        assert_eq!(
            SnapshotReader::with_header(b"CABS\x09\x00").err(),
            Some(SnapshotError::UnsupportedVersion(9))
        );
    }

    #[test]
    fn records_read_back_in_order() {
        let mut out = SnapshotWriter::new();
        out.put_u8(0x12);
        out.put_u16(0xBEEF);
        out.put_bool(true);
        out.put_block(&[1, 2, 3]);
        let bytes = out.into_bytes();

        let mut input = SnapshotReader::new(&bytes);
        assert_eq!(input.get_u8().unwrap(), 0x12);
        assert_eq!(input.get_u16().unwrap(), 0xBEEF);
        assert!(input.get_bool().unwrap());
        let mut block = [0u8; 3];
        input.get_block_into(&mut block).unwrap();
        assert_eq!(block, [1, 2, 3]);
        input.finish().unwrap();
    }

    #[test]
    fn block_length_must_match_destination() {
        let mut out = SnapshotWriter::new();
        out.put_block(&[0; 4]);
        let bytes = out.into_bytes();
        let mut input = SnapshotReader::new(&bytes);
        let mut dest = [0u8; 8];
        assert_eq!(
            input.get_block_into(&mut dest),
            Err(SnapshotError::LengthMismatch { expected: 8, actual: 4 })
        );
    }

    #[test]
    fn truncation_and_trailing_bytes() {
        let mut input = SnapshotReader::new(&[0x01]);
        assert!(matches!(input.get_u16(), Err(SnapshotError::Truncated { .. })));

        let input = SnapshotReader::new(&[0x01, 0x02]);
        assert_eq!(input.finish(), Err(SnapshotError::TrailingBytes(2)));
    }
}
