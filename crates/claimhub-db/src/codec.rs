//! Byte-level helpers shared by every row codec.
//!
//! All integers are big-endian with fixed widths; lengths of variable fields
//! are either implied by the row length (trailing fields) or carried as a
//! big-endian `u16` when further fields follow. The cursor returns the
//! schema-level reason for a failure; row codecs wrap it with the prefix and
//! the raw bytes.

use crate::error::Error;
use crate::prefix::Prefix;

/// Effective amounts are stored negated so that ascending byte order yields
/// descending amounts.
pub const fn negate_amount(amount: u64) -> u64 {
    u64::MAX - amount
}

/// Forward-only cursor over a packed row.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Consumes and checks the one-byte prefix.
    pub(crate) fn expect_prefix(&mut self, prefix: Prefix) -> Result<(), &'static str> {
        let byte = self.u8()?;
        if byte != prefix.byte() {
            return Err("wrong prefix byte");
        }
        Ok(())
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], &'static str> {
        if self.buf.len() - self.pos < n {
            return Err("row is shorter than its schema");
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N], &'static str> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, &'static str> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, &'static str> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, &'static str> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub(crate) fn i32(&mut self) -> Result<i32, &'static str> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, &'static str> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    pub(crate) fn bool(&mut self) -> Result<bool, &'static str> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err("boolean byte is not 0 or 1"),
        }
    }

    /// A `u16`-length-prefixed string; used for variable fields that are
    /// followed by further fields.
    pub(crate) fn short_string(&mut self) -> Result<String, &'static str> {
        let len = self.u16()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| "string field is not valid UTF-8")
    }

    /// The remainder of the row as a string; used for trailing name fields.
    pub(crate) fn trailing_string(&mut self) -> Result<String, &'static str> {
        let raw = self.rest();
        String::from_utf8(raw.to_vec()).map_err(|_| "string field is not valid UTF-8")
    }

    /// Everything up to, but not including, the last `suffix` bytes; used for
    /// variable fields delimited by a fixed-width tail.
    pub(crate) fn until_suffix(&mut self, suffix: usize) -> Result<&'a [u8], &'static str> {
        let remaining = self.buf.len() - self.pos;
        if remaining < suffix {
            return Err("row is shorter than its schema");
        }
        self.take(remaining - suffix)
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }

    /// Fails unless the whole row was consumed.
    pub(crate) fn finish(&self) -> Result<(), &'static str> {
        if self.pos != self.buf.len() {
            return Err("row has trailing bytes");
        }
        Ok(())
    }
}

/// Appends a `u16`-length-prefixed string field.
pub(crate) fn put_short_string(buf: &mut Vec<u8>, value: &str) {
    buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
    buf.extend_from_slice(value.as_bytes());
}

pub(crate) fn key_error(prefix: Prefix, raw: &[u8], reason: &'static str) -> Error {
    Error::MalformedKey {
        prefix: prefix.byte(),
        raw: raw.to_vec(),
        reason,
    }
}

pub(crate) fn value_error(prefix: Prefix, raw: &[u8], reason: &'static str) -> Error {
    Error::MalformedValue {
        prefix: prefix.byte(),
        raw: raw.to_vec(),
        reason,
    }
}
