use byteorder::{ByteOrder, BigEndian, LittleEndian};
use crate::util::BinaryRead;
use crate::Error;

/// Sequential reader over a module image. Positions are relative to `start`, the
/// offset of the module inside its container.
pub struct Reader<'a> {
    b    : &'a [u8],
    start: usize,
    pos  : usize,
}

impl<'a> Reader<'a> {
    pub fn new(b: &'a [u8], start: usize) -> Self {
        Reader {
            b,
            start,
            pos: start,
        }
    }

    /// Size of the module data, from `start` to the end of the buffer.
    pub fn len(&self) -> usize {
        self.b.len().saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn left(&self) -> usize {
        self.b.len().saturating_sub(self.pos)
    }

    pub fn tell(&self) -> usize {
        self.pos - self.start
    }

    pub fn seek(&mut self, ofs: usize) -> Result<(), Error> {
        match self.start.checked_add(ofs) {
            Some(pos) if pos <= self.b.len() => {
                self.pos = pos;
                Ok(())
            }
            _ => Err(Error::TruncatedInput(format!("seek to 0x{:x} past end of data (0x{:x})", ofs, self.len()))),
        }
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        let ofs = self.tell().saturating_add(n);
        self.seek(ofs)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let end = match self.pos.checked_add(n) {
            Some(end) if end <= self.b.len() => end,
            _ => return Err(Error::TruncatedInput(format!("short read ({} bytes at 0x{:x})", n, self.tell()))),
        };
        let s = &self.b[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    pub fn read_string(&mut self, n: usize) -> Result<String, Error> {
        let s = self.b.read_string(self.pos, n)?;
        self.pos += n;
        Ok(s)
    }

    pub fn read8(&mut self) -> Result<u8, Error> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read8i(&mut self) -> Result<i8, Error> {
        Ok(self.read8()? as i8)
    }

    pub fn read16l(&mut self) -> Result<u16, Error> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read16b(&mut self) -> Result<u16, Error> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read24l(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u24(self.read_bytes(3)?))
    }

    pub fn read24b(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u24(self.read_bytes(3)?))
    }

    pub fn read32l(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read32b(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }
}
