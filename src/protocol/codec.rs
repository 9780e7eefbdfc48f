//! Canonical big-endian encoding helpers.
//!
//! - Integers are big-endian, 1, 2, 3 or 4 bytes wide.
//! - Vectors carry a length prefix of 1, 2 or 3 bytes.
//! - Trailing bytes are rejected by [`Reader::finish`].
use crate::error::{DecodeError, EncodeError};

#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::malformed("truncated input"));
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u24(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Splits off a sub-reader over a `u8` length-prefixed vector.
    pub fn sub_u8(&mut self) -> Result<Reader<'a>, DecodeError> {
        let len = self.read_u8()? as usize;
        self.sub(len)
    }

    /// Splits off a sub-reader over a `u16` length-prefixed vector.
    pub fn sub_u16(&mut self) -> Result<Reader<'a>, DecodeError> {
        let len = self.read_u16()? as usize;
        self.sub(len)
    }

    /// Splits off a sub-reader over a `u24` length-prefixed vector.
    pub fn sub_u24(&mut self) -> Result<Reader<'a>, DecodeError> {
        let len = self.read_u24()? as usize;
        self.sub(len)
    }

    fn sub(&mut self, len: usize) -> Result<Reader<'a>, DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::malformed("length exceeds remaining bytes"));
        }
        Ok(Reader::new(self.take(len)?))
    }

    pub fn rest(&mut self) -> &'a [u8] {
        let s = &self.buf[self.pos..];
        self.pos = self.buf.len();
        s
    }

    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::malformed("trailing bytes not permitted"))
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    /// Writes whatever `body` produces behind a `u8` length prefix.
    pub fn with_u8_prefix<F>(&mut self, what: &'static str, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Writer) -> Result<(), EncodeError>,
    {
        self.with_prefix(1, what, body)
    }

    /// Writes whatever `body` produces behind a `u16` length prefix.
    pub fn with_u16_prefix<F>(&mut self, what: &'static str, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Writer) -> Result<(), EncodeError>,
    {
        self.with_prefix(2, what, body)
    }

    /// Writes whatever `body` produces behind a `u24` length prefix.
    pub fn with_u24_prefix<F>(&mut self, what: &'static str, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Writer) -> Result<(), EncodeError>,
    {
        self.with_prefix(3, what, body)
    }

    fn with_prefix<F>(
        &mut self,
        width: usize,
        what: &'static str,
        body: F,
    ) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Writer) -> Result<(), EncodeError>,
    {
        let start = self.buf.len();
        self.buf.resize(start + width, 0);
        body(self)?;

        let len = self.buf.len() - start - width;
        let max = (1usize << (8 * width)) - 1;
        if len > max {
            return Err(EncodeError::TooLong { what, len, max });
        }
        let be = (len as u32).to_be_bytes();
        self.buf[start..start + width].copy_from_slice(&be[4 - width..]);
        Ok(())
    }
}
