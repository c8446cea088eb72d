use byteorder::{ByteOrder, BigEndian, LittleEndian};
use crate::Error;

pub const NOTES: &[&str] = &[
    "C ", "C#", "D ", "D#", "E ", "F ", "F#", "G ", "G#", "A ", "A#", "B "
];

pub const C4_NTSC_RATE: f64 = 8363.0;


#[macro_export]
macro_rules! magic4 {
    ( $a:expr, $b:expr, $c:expr, $d:expr ) => {
        (($a as u32) << 24) | (($b as u32) << 16) | (($c as u32) << 8) | ($d as u32)
    }
}

pub trait BinaryRead {
    fn read_string(&self, ofs: usize, size: usize) -> Result<String, Error>;
    fn read32b(&self, ofs: usize) -> Result<u32, Error>;
    fn read32l(&self, ofs: usize) -> Result<u32, Error>;
    fn read24b(&self, ofs: usize) -> Result<u32, Error>;
    fn read24l(&self, ofs: usize) -> Result<u32, Error>;
    fn read16b(&self, ofs: usize) -> Result<u16, Error>;
    fn read16l(&self, ofs: usize) -> Result<u16, Error>;
    fn read8(&self, ofs: usize) -> Result<u8, Error>;
    fn read8i(&self, ofs: usize) -> Result<i8, Error>;
    fn slice(&self, start: usize, size: usize) -> Result<&[u8], Error>;
}

impl<'a> BinaryRead for &'a [u8] {
    fn read_string(&self, ofs: usize, size: usize) -> Result<String, Error> {
        let b = self.slice(ofs, size)?;
        Ok(to_name(b))
    }

    fn read32b(&self, ofs: usize) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.slice(ofs, 4)?))
    }

    fn read32l(&self, ofs: usize) -> Result<u32, Error> {
        Ok(LittleEndian::read_u32(self.slice(ofs, 4)?))
    }

    fn read24b(&self, ofs: usize) -> Result<u32, Error> {
        Ok(BigEndian::read_u24(self.slice(ofs, 3)?))
    }

    fn read24l(&self, ofs: usize) -> Result<u32, Error> {
        Ok(LittleEndian::read_u24(self.slice(ofs, 3)?))
    }

    fn read16b(&self, ofs: usize) -> Result<u16, Error> {
        Ok(BigEndian::read_u16(self.slice(ofs, 2)?))
    }

    fn read16l(&self, ofs: usize) -> Result<u16, Error> {
        Ok(LittleEndian::read_u16(self.slice(ofs, 2)?))
    }

    fn read8(&self, ofs: usize) -> Result<u8, Error> {
        Ok(self.slice(ofs, 1)?[0])
    }

    fn read8i(&self, ofs: usize) -> Result<i8, Error> {
        Ok(self.slice(ofs, 1)?[0] as i8)
    }

    fn slice(&self, start: usize, size: usize) -> Result<&[u8], Error> {
        check_buffer_size(self, start, size)?;
        Ok(&self[start..start + size])
    }
}

fn check_buffer_size(b: &[u8], start: usize, size: usize) -> Result<(), Error> {
    match start.checked_add(size) {
        Some(end) if end <= b.len() => Ok(()),
        _ => Err(Error::TruncatedInput(format!("short read ({} bytes at 0x{:x}, size 0x{:x})", size, start, b.len()))),
    }
}

// Names are NUL-terminated or space-padded, and some trackers leave garbage after the NUL.
fn to_name(b: &[u8]) -> String {
    let end = b.iter().position(|&x| x == 0).unwrap_or(b.len());
    let s: String = String::from_utf8_lossy(&b[..end])
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    s.trim_end().to_owned()
}


/// A bitfield inside a packed little-endian event word.
#[derive(Debug, Clone, Copy)]
pub struct BitField {
    pub shift: u32,
    pub width: u32,
}

impl BitField {
    pub const fn new(shift: u32, width: u32) -> Self {
        BitField { shift, width }
    }

    pub fn get(&self, x: u32) -> u32 {
        (x >> self.shift) & ((1_u32 << self.width) - 1)
    }
}

#[inline]
pub fn msn(x: u8) -> u8 {
    x >> 4
}

#[inline]
pub fn lsn(x: u8) -> u8 {
    x & 0x0f
}

/// Convert a C4 sampling rate to a (transpose, finetune) pair, finetune in 1/128 semitones.
pub fn c2spd_to_note(c2spd: u32) -> (isize, isize) {
    if c2spd == 0 {
        return (0, 0)
    }

    let c = (1536.0_f64 * (c2spd as f64 / C4_NTSC_RATE).log2()) as isize;
    (c / 128, c % 128)
}


#[cfg(test)]
pub mod fixture {
    use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
    use crate::module::{Sample, SampleLoader};
    use crate::reader::Reader;
    use crate::Error;

    /// Sample loader that leaves the reader where it found it.
    pub struct SkipSamples;

    impl SampleLoader for SkipSamples {
        fn load_sample(&mut self, smp: &mut Sample, _r: &mut Reader, flags: u32) -> Result<(), Error> {
            smp.encoding = flags;
            Ok(())
        }
    }

    /// Sample loader that consumes everything up to the end of the data.
    pub struct GreedySamples;

    impl SampleLoader for GreedySamples {
        fn load_sample(&mut self, smp: &mut Sample, r: &mut Reader, flags: u32) -> Result<(), Error> {
            let n = r.left();
            smp.data = r.read_bytes(n)?.to_vec();
            smp.encoding = flags;
            Ok(())
        }
    }

    /// Byte vector builder for hand-made module images.
    #[derive(Default)]
    pub struct Fixture {
        pub data: Vec<u8>,
    }

    impl Fixture {
        pub fn new() -> Self {
            Default::default()
        }

        pub fn len(&self) -> usize {
            self.data.len()
        }

        pub fn w8(&mut self, v: u8) -> &mut Self {
            self.data.push(v);
            self
        }

        pub fn w16l(&mut self, v: u16) -> &mut Self {
            self.data.write_u16::<LittleEndian>(v).unwrap();
            self
        }

        pub fn w24l(&mut self, v: u32) -> &mut Self {
            self.data.write_u24::<LittleEndian>(v).unwrap();
            self
        }

        pub fn w32l(&mut self, v: u32) -> &mut Self {
            self.data.write_u32::<LittleEndian>(v).unwrap();
            self
        }

        pub fn w32b(&mut self, v: u32) -> &mut Self {
            self.data.write_u32::<BigEndian>(v).unwrap();
            self
        }

        pub fn bytes(&mut self, b: &[u8]) -> &mut Self {
            self.data.extend_from_slice(b);
            self
        }

        pub fn zeros(&mut self, n: usize) -> &mut Self {
            self.data.resize(self.data.len() + n, 0);
            self
        }

        /// Write `s` into a zero-padded field of `size` bytes.
        pub fn name(&mut self, s: &str, size: usize) -> &mut Self {
            let b = s.as_bytes();
            assert!(b.len() <= size);
            self.bytes(b).zeros(size - b.len())
        }

        pub fn patch16l(&mut self, ofs: usize, v: u16) -> &mut Self {
            self.data[ofs] = v as u8;
            self.data[ofs + 1] = (v >> 8) as u8;
            self
        }

        pub fn patch32l(&mut self, ofs: usize, v: u32) -> &mut Self {
            let mut w = Vec::new();
            w.write_u32::<LittleEndian>(v).unwrap();
            self.data[ofs..ofs + 4].copy_from_slice(&w);
            self
        }
    }
}
