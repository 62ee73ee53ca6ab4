//! Little-endian byte cursors
//!
//! `ByteReader` walks a borrowed slice and fails with
//! [`C2mError::UnexpectedEof`] instead of reading past the end; `ByteWriter`
//! appends to a growable buffer. Both support the 1/2/4-byte variable-width
//! integers used by tile modifiers and extra arguments.

use crate::{C2mError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Write};

/// Reads little-endian integers from a byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    fn data(&self) -> &'a [u8] {
        *self.cursor.get_ref()
    }

    /// Current offset into the buffer
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.data().len().saturating_sub(self.position())
    }

    /// Whether every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    // A failed read leaves the cursor where it was
    fn read_with<T>(
        &mut self,
        needed: usize,
        read: impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>,
    ) -> Result<T> {
        let offset = self.position();
        read(&mut self.cursor).map_err(|err| {
            self.cursor.set_position(offset as u64);
            match err.kind() {
                io::ErrorKind::UnexpectedEof => C2mError::UnexpectedEof { offset, needed },
                _ => C2mError::Io(err),
            }
        })
    }

    /// Borrow the next `n` bytes and advance past them
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let offset = self.position();
        if n > self.remaining() {
            return Err(C2mError::UnexpectedEof { offset, needed: n });
        }
        self.cursor.set_position((offset + n) as u64);
        Ok(&self.data()[offset..offset + n])
    }

    /// Read a fixed-size array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_with(1, |c| c.read_u8())
    }

    /// Read a little-endian u16
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_with(2, |c| c.read_u16::<LittleEndian>())
    }

    /// Read a little-endian u32
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_with(4, |c| c.read_u32::<LittleEndian>())
    }

    /// Read an unsigned integer of 1, 2 or 4 bytes
    pub fn read_uint(&mut self, width: usize) -> Result<u32> {
        match width {
            1 | 2 | 4 => self
                .read_with(width, |c| c.read_uint::<LittleEndian>(width))
                .map(|value| value as u32),
            _ => Err(C2mError::UnsupportedWidth(width)),
        }
    }
}

/// Appends little-endian integers to a byte buffer
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with preallocated space
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.write_all(bytes)?;
        Ok(())
    }

    /// Append one byte
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.buf.write_u8(value)?;
        Ok(())
    }

    /// Append a little-endian u16
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.buf.write_u16::<LittleEndian>(value)?;
        Ok(())
    }

    /// Append a little-endian u32
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.buf.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Append an unsigned integer of 1, 2 or 4 bytes, truncating `value` to fit
    pub fn write_uint(&mut self, width: usize, value: u32) -> Result<()> {
        match width {
            1 | 2 | 4 => {
                let mask = u64::MAX >> (64 - 8 * width);
                self.buf
                    .write_uint::<LittleEndian>(u64::from(value) & mask, width)?;
                Ok(())
            }
            _ => Err(C2mError::UnsupportedWidth(width)),
        }
    }

    /// Written bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return the buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
