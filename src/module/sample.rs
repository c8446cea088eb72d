use crate::reader::Reader;
use crate::Error;

// Sample encoding flags passed to the sample loader
pub const SAMPLE_16BIT: u32 = 0x01;  // 16-bit little-endian frames
pub const SAMPLE_DIFF : u32 = 0x02;  // delta-encoded
pub const SAMPLE_VIDC : u32 = 0x04;  // Acorn VIDC logarithmic 8-bit


#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleType {
    Empty,
    Sample8,
    Sample16,
}

impl Default for SampleType {
    fn default() -> Self {
        SampleType::Empty
    }
}

/// Sample metadata and payload. Lengths and loop points are in frames.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub name       : String,
    pub sample_type: SampleType,
    pub size       : usize,
    pub loop_start : usize,
    pub loop_end   : usize,
    pub has_loop   : bool,
    pub loop_bidir : bool,
    pub encoding   : u32,
    pub data       : Vec<u8>,
}

impl Sample {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn bytes_per_frame(&self) -> usize {
        match self.sample_type {
            SampleType::Sample16 => 2,
            _                    => 1,
        }
    }

    /// Size of the sample payload in bytes.
    pub fn byte_size(&self) -> usize {
        self.size * self.bytes_per_frame()
    }

    pub fn store(&mut self, b: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(b);
    }

    /// Clamp loop points into the sample and drop empty loops.
    pub fn sanity_check(&mut self) {
        if self.size == 0 {
            self.sample_type = SampleType::Empty;
        } else if self.sample_type == SampleType::Empty {
            self.sample_type = SampleType::Sample8;
        }
        if self.loop_end > self.size {
            self.loop_end = self.size;
        }
        if self.loop_start > self.loop_end {
            self.loop_start = self.loop_end;
        }
        if self.loop_start == self.loop_end {
            self.has_loop = false;
        }
        if !self.has_loop {
            self.loop_bidir = false;
        }
    }

    pub fn is_sane(&self) -> bool {
        self.loop_start <= self.loop_end && self.loop_end <= self.size && (!self.has_loop || self.loop_start < self.loop_end)
    }
}


/// Service that reads a sample payload from the module data. The reader is positioned
/// at the start of the payload; `flags` describe how it is encoded.
pub trait SampleLoader {
    fn load_sample(&mut self, smp: &mut Sample, r: &mut Reader, flags: u32) -> Result<(), Error>;
}

/// Keep sample payloads as stored in the file.
#[derive(Debug, Default)]
pub struct RawSamples;

impl SampleLoader for RawSamples {
    fn load_sample(&mut self, smp: &mut Sample, r: &mut Reader, flags: u32) -> Result<(), Error> {
        let b = r.read_bytes(smp.byte_size())?;
        smp.store(b);
        smp.encoding = flags;
        Ok(())
    }
}
