//! Sequential read cursor over an in-memory Marshal stream.

use crate::error::{MarshalError, Result};

/// Read cursor over a byte slice. Fixed-width reads are little-endian.
#[derive(Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    /// Offset of `data[0]` within the outermost stream.
    base: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Current byte position within the outermost stream.
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    /// Remaining bytes from current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Whether every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read a slice of `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Split off the next `n` bytes as a bounded cursor and advance past them.
    pub fn sub_cursor(&mut self, n: usize) -> Result<Cursor<'a>> {
        let base = self.position();
        let data = self.read_bytes(n)?;
        Ok(Cursor { data, pos: 0, base })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.read_bytes(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.read_bytes(8)?;
        Ok(f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn ensure(&self, n: usize) -> Result<()> {
        let have = self.remaining();
        if n > have {
            return Err(MarshalError::UnexpectedEndOfInput {
                offset: self.position(),
                need: n,
                have,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_widths() {
        let data = [0x01, 0x02, 0xFE, 0xFF, 0x78, 0x56, 0x34, 0x12];
        let mut c = Cursor::new(&data);
        assert_eq!(c.read_u8().unwrap(), 0x01);
        assert_eq!(c.read_i8().unwrap(), 0x02);
        assert_eq!(c.read_i16().unwrap(), -2);
        assert_eq!(c.read_i32().unwrap(), 0x1234_5678);
        assert!(c.is_empty());
    }

    #[test]
    fn reads_f64() {
        let data = 0.25f64.to_le_bytes();
        let mut c = Cursor::new(&data);
        assert_eq!(c.read_f64().unwrap(), 0.25);
    }

    #[test]
    fn short_read_reports_offset_and_sizes() {
        let data = [0u8; 3];
        let mut c = Cursor::new(&data);
        c.skip(1).unwrap();
        match c.read_i32() {
            Err(MarshalError::UnexpectedEndOfInput { offset, need, have }) => {
                assert_eq!((offset, need, have), (1, 4, 2));
            }
            other => panic!("expected UnexpectedEndOfInput, got {other:?}"),
        }
        // A failed read does not move the cursor.
        assert_eq!(c.position(), 1);
    }

    #[test]
    fn sub_cursor_is_bounded() {
        let data = [1, 2, 3, 4, 5];
        let mut c = Cursor::new(&data);
        c.skip(1).unwrap();
        let mut sub = c.sub_cursor(2).unwrap();
        assert_eq!(c.position(), 3);
        assert_eq!(sub.position(), 1);
        assert_eq!(sub.read_bytes(2).unwrap(), &[2, 3]);
        match sub.read_u8() {
            Err(MarshalError::UnexpectedEndOfInput { offset, .. }) => assert_eq!(offset, 3),
            other => panic!("expected UnexpectedEndOfInput, got {other:?}"),
        }
        assert_eq!(c.remaining(), 2);
    }
}
