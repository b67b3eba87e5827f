/*
This code is part of the shapeio vector I/O library.
License: MIT
*/
use crate::error::{Result, ShapeIoError};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::prelude::*;
use std::io::SeekFrom;

/// The byte order of a multi-byte field on disk.
///
/// Both file formats handled by this crate fix the byte order per field,
/// independent of the host; readers switch the active order as they move
/// between fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endianness {
    LittleEndian,
    BigEndian,
}

impl Default for Endianness {
    fn default() -> Endianness {
        Endianness::LittleEndian
    }
}

/// A positioned reader that decodes multi-byte values in a caller-selected
/// byte order.
pub struct ByteOrderReader<R: Read + Seek> {
    is_le: bool,
    reader: R,
    pos: usize,
    len: usize,
}

impl<R: Read + Seek> ByteOrderReader<R> {
    pub fn new(reader: R, byte_order: Endianness) -> Result<ByteOrderReader<R>> {
        let mut bor = ByteOrderReader {
            reader,
            is_le: byte_order == Endianness::LittleEndian,
            pos: 0usize,
            len: 0, // don't know the length yet
        };
        let len = bor
            .reader
            .seek(SeekFrom::End(0))
            .map_err(ShapeIoError::IoRead)? as usize;
        bor.len = len;
        bor.seek(0)?; // return the cursor to the start
        Ok(bor)
    }

    pub fn set_byte_order(&mut self, byte_order: Endianness) {
        self.is_le = byte_order == Endianness::LittleEndian;
    }

    pub fn seek(&mut self, position: usize) -> Result<()> {
        self.pos = position;
        self.reader
            .seek(SeekFrom::Start(self.pos as u64))
            .map_err(ShapeIoError::IoRead)?;
        Ok(())
    }

    pub fn inc_pos(&mut self, skip: usize) -> Result<()> {
        self.seek(self.pos + skip)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Reads `length` bytes as text, substituting anything non-UTF-8.
    pub fn read_utf8(&mut self, length: usize) -> Result<String> {
        let mut bytes = vec![0u8; length];
        self.reader
            .read_exact(&mut bytes)
            .map_err(ShapeIoError::from_read)?;
        self.pos += length;
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.pos += 1;
        self.reader.read_u8().map_err(ShapeIoError::from_read)
    }

    pub fn peek_u8(&mut self) -> Result<u8> {
        let val = self.reader.read_u8().map_err(ShapeIoError::from_read)?;
        self.seek(self.pos)?;
        Ok(val)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.pos += 2;
        let res = if self.is_le {
            self.reader.read_u16::<LittleEndian>()
        } else {
            self.reader.read_u16::<BigEndian>()
        };
        res.map_err(ShapeIoError::from_read)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.pos += 4;
        let res = if self.is_le {
            self.reader.read_u32::<LittleEndian>()
        } else {
            self.reader.read_u32::<BigEndian>()
        };
        res.map_err(ShapeIoError::from_read)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.pos += 4;
        let res = if self.is_le {
            self.reader.read_i32::<LittleEndian>()
        } else {
            self.reader.read_i32::<BigEndian>()
        };
        res.map_err(ShapeIoError::from_read)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.pos += 8;
        let res = if self.is_le {
            self.reader.read_f64::<LittleEndian>()
        } else {
            self.reader.read_f64::<BigEndian>()
        };
        res.map_err(ShapeIoError::from_read)
    }
}
