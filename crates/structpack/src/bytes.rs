//! Byte-level access: fixed-width reads and writes with a selectable byte
//! order, plus the [`Cursor`] that tracks the read offset of one unpack
//! traversal.

use crate::errors::Error;

/// Returns `data[offset..offset + n]`, or a [`Error::BufferUnderflow`].
pub fn slice_at(data: &[u8], offset: usize, n: usize) -> Result<&[u8], Error> {
    let available = data.len().saturating_sub(offset);
    if n > available {
        return Err(Error::BufferUnderflow {
            offset,
            needed: n,
            available,
        });
    }

    Ok(&data[offset..offset + n])
}

/// Reads `N` bytes at `offset` and puts them in big-endian order, so callers
/// can always decode with `from_be_bytes`.
pub fn read_array_at<const N: usize>(
    data: &[u8],
    offset: usize,
    little_endian: bool,
) -> Result<[u8; N], Error> {
    let mut out = [0u8; N];
    out.copy_from_slice(slice_at(data, offset, N)?);
    if little_endian {
        out.reverse();
    }

    Ok(out)
}

/// Appends big-endian `bytes` to `out` in the requested byte order.
pub fn write_array<const N: usize>(out: &mut Vec<u8>, mut bytes: [u8; N], little_endian: bool) {
    if little_endian {
        bytes.reverse();
    }
    out.extend_from_slice(&bytes);
}

/// Copies `bytes` into `out` at `offset`, growing `out` with zeros if needed.
pub fn patch_at(out: &mut Vec<u8>, offset: usize, bytes: &[u8]) {
    let end = offset + bytes.len();
    if out.len() < end {
        out.resize(end, 0);
    }
    out[offset..end].copy_from_slice(bytes);
}

/// Read position over an immutable input buffer.
///
/// One cursor is created per top-level `unpack` and handed by reference to
/// every nested schema; each schema advances it by exactly the bytes it
/// consumed.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor to an absolute offset. Seeking to the end is allowed.
    pub fn seek(&mut self, pos: usize) -> Result<(), Error> {
        if pos > self.data.len() {
            return Err(Error::BufferUnderflow {
                offset: self.pos,
                needed: pos - self.pos,
                available: self.remaining(),
            });
        }
        self.pos = pos;

        Ok(())
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unconsumed bytes, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    /// Consumes and returns the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let bytes = slice_at(self.data, self.pos, n)?;
        self.pos += n;

        Ok(bytes)
    }

    /// Consumes `N` bytes and returns them in big-endian order.
    pub fn read_array<const N: usize>(&mut self, little_endian: bool) -> Result<[u8; N], Error> {
        let bytes = read_array_at::<N>(self.data, self.pos, little_endian)?;
        self.pos += N;

        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.take(n).map(|_| ())
    }
}
