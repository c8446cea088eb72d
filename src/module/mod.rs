pub mod effect;
pub mod event;
pub mod instrument;
pub mod pattern;
pub mod sample;

pub use self::effect::Fx;
pub use self::event::{Event, KEY_OFF};
pub use self::instrument::{Envelope, Instrument, Keymap, SubInstrument};
pub use self::pattern::{Pattern, Track};
pub use self::sample::{RawSamples, Sample, SampleLoader, SampleType};

use crate::{Error, MAX_CHANNELS};

// Module flags
pub const MODULE_LINEAR: u32 = 0x01;  // linear frequency table
pub const MODULE_FILTER: u32 = 0x02;  // resonant filter effects
pub const QUIRK_FINEFX : u32 = 0x04;  // fine slides encoded in the parameter
pub const QUIRK_ST3    : u32 = 0x08;  // S3M style effect memory

// Channel flags
pub const CHANNEL_FX   : u32 = 0x01;
pub const CHANNEL_MUTE : u32 = 0x02;

/// Order list entry to be skipped during playback.
pub const ORDER_SKIP: u16 = 0xfffe;


#[derive(Debug, Clone, Default)]
pub struct Channel {
    pub pan   : u8,
    pub volume: u8,
    pub chorus: u8,
    pub reverb: u8,
    pub flags : u32,
}

impl Channel {
    pub fn new() -> Self {
        Channel {
            pan   : 0x80,
            volume: 0x40,
            ..Default::default()
        }
    }
}


/// A decoded song in canonical form.
#[derive(Debug, Default)]
pub struct Module {
    pub format_id    : &'static str,
    pub description  : String,
    pub creator      : String,
    pub title        : String,
    pub author       : String,
    pub comment      : String,
    pub channels     : usize,
    pub restart      : usize,
    pub speed        : usize,
    pub tempo        : usize,
    pub global_volume: usize,
    pub flags        : u32,
    pub orders       : Vec<u16>,
    pub channel      : Vec<Channel>,
    pub pattern      : Vec<Pattern>,
    pub track        : Vec<Track>,
    pub instrument   : Vec<Instrument>,
    pub sample       : Vec<Sample>,
}

impl Module {
    pub fn new() -> Self {
        Module {
            speed        : 6,
            tempo        : 125,
            global_volume: 0x40,
            ..Default::default()
        }
    }

    /// Song length in order list positions.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn patterns(&self) -> usize {
        self.pattern.len()
    }

    pub fn tracks(&self) -> usize {
        self.track.len()
    }

    pub fn instruments(&self) -> usize {
        self.instrument.len()
    }

    pub fn samples(&self) -> usize {
        self.sample.len()
    }

    pub fn rows(&self, pat: usize) -> usize {
        match self.pattern.get(pat) {
            Some(p) => p.rows,
            None    => 0,
        }
    }

    /// The pattern played at a position, if the position isn't a skip marker.
    pub fn pattern_in_position(&self, pos: usize) -> Option<usize> {
        match self.orders.get(pos) {
            Some(&ORDER_SKIP) | None => None,
            Some(&p) => Some(p as usize),
        }
    }

    pub fn event(&self, pat: usize, row: usize, chn: usize) -> Option<&Event> {
        let p = self.pattern.get(pat)?;
        if row >= p.rows {
            return None
        }
        let trk = *p.index.get(chn)?;
        self.track.get(trk)?.event.get(row)
    }

    /// Verify the model invariants every loader must leave behind.
    pub fn check(&self) -> Result<(), Error> {
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(Error::MalformedHeader(format!("invalid number of channels {}", self.channels)));
        }
        if self.channel.len() != self.channels {
            return Err(Error::MalformedHeader(format!("{} channel records for {} channels", self.channel.len(), self.channels)));
        }
        if !self.orders.is_empty() && self.restart >= self.orders.len() {
            return Err(Error::MalformedHeader(format!("restart position {} out of range", self.restart)));
        }

        for (pos, &o) in self.orders.iter().enumerate() {
            if o != ORDER_SKIP && o as usize >= self.pattern.len() {
                return Err(Error::MalformedHeader(format!("position {}: invalid pattern {}", pos, o)));
            }
        }

        for (i, p) in self.pattern.iter().enumerate() {
            if p.index.len() != self.channels {
                return Err(Error::MalformedHeader(format!("pattern {}: {} tracks for {} channels", i, p.index.len(), self.channels)));
            }
            for &t in &p.index {
                match self.track.get(t) {
                    Some(trk) if trk.rows() >= p.rows => (),
                    _ => return Err(Error::MalformedHeader(format!("pattern {}: invalid track {}", i, t))),
                }
            }
        }

        for (i, ins) in self.instrument.iter().enumerate() {
            for sub in &ins.subins {
                if sub.sid >= self.sample.len() {
                    return Err(Error::MalformedHeader(format!("instrument {}: invalid sample {}", i, sub.sid)));
                }
            }
            if !(ins.vol_env.is_valid() && ins.pan_env.is_valid() && ins.pitch_env.is_valid()) {
                return Err(Error::MalformedHeader(format!("instrument {}: invalid envelope", i)));
            }
            for &k in ins.keymap.iter() {
                if k != Keymap::NONE && k as usize >= ins.subins.len() {
                    return Err(Error::MalformedHeader(format!("instrument {}: invalid keymap entry {}", i, k)));
                }
            }
        }

        for (i, smp) in self.sample.iter().enumerate() {
            if !smp.is_sane() {
                return Err(Error::MalformedHeader(format!("sample {}: invalid loop {}-{} (size {})", i, smp.loop_start, smp.loop_end, smp.size)));
            }
        }

        Ok(())
    }
}
