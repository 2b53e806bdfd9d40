/*
    mzdasm
    Copyright 2024-2025 mzdasm contributors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.
*/
use std::io::{self, BufRead};

/// The [ByteReader] trait extends [BufRead] with methods for reading
/// fixed-length little-endian values. Every read advances the cursor, so a
/// decoded instruction's byte count equals exactly the bytes consumed.
pub trait ByteReader: BufRead {
    /// Reads a single u8 from the stream.
    fn read_u8(&mut self) -> io::Result<u8> {
        let buf = self.fill_buf()?;
        if buf.is_empty() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "read_u8(): EOF"));
        }
        let b = buf[0];
        self.consume(1);
        Ok(b)
    }

    /// Reads a single i8 from the stream.
    fn read_i8(&mut self) -> io::Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a little-endian u16 from the stream.
    fn read_u16(&mut self) -> io::Result<u16> {
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Reads a little-endian i16 from the stream.
    fn read_i16(&mut self) -> io::Result<i16> {
        Ok(i16::from_le_bytes(self.read_u16()?.to_le_bytes()))
    }

    /// Reads an x86 far pointer stored as \[offset:u16\]\[segment:u16\]
    /// (both little-endian). Returns (segment, offset).
    fn read_farptr16(&mut self) -> io::Result<(u16, u16)> {
        let offset = self.read_u16()?;
        let segment = self.read_u16()?;
        Ok((segment, offset))
    }
}

// Allow any BufRead to be used as a ByteReader
impl<T: BufRead + ?Sized> ByteReader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_are_little_endian() {
        let mut cur = Cursor::new(&[0x9F, 0xF8, 0x34, 0x12][..]);
        assert_eq!(cur.read_i16().unwrap(), -1889);
        assert_eq!(cur.read_u16().unwrap(), 0x1234);
    }

    #[test]
    fn farptr_is_offset_then_segment() {
        let mut cur = Cursor::new(&[0x00, 0x00, 0xBB, 0x15][..]);
        assert_eq!(cur.read_farptr16().unwrap(), (0x15BB, 0x0000));
    }

    #[test]
    fn eof_is_reported() {
        let mut cur = Cursor::new(&[0x01][..]);
        assert_eq!(cur.read_u8().unwrap(), 1);
        assert!(cur.read_u8().is_err());
    }
}
