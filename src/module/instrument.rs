use std::fmt;
use std::slice;
use crate::{MAX_KEYS, MAX_ENV_POINTS};

// Envelope flags
pub const ENV_ON     : u8 = 0x01;
pub const ENV_SUSTAIN: u8 = 0x02;
pub const ENV_LOOP   : u8 = 0x04;


#[derive(Debug, Clone, Default)]
pub struct Instrument {
    pub name     : String,
    pub fadeout  : usize,
    pub keymap   : Keymap,
    pub vol_env  : Envelope,
    pub pan_env  : Envelope,
    pub pitch_env: Envelope,
    pub subins   : Vec<SubInstrument>,
}

impl Instrument {
    pub fn new() -> Self {
        Default::default()
    }

    /// Subinstrument played for a note, following the keymap.
    pub fn subins_for_note(&self, note: usize) -> Option<&SubInstrument> {
        let key = note.checked_sub(1)?;
        self.subins.get(self.keymap.get(key)?)
    }
}


/// Key to subinstrument map. Key 0 is note 1.
#[derive(Clone)]
pub struct Keymap {
    map: [u8; MAX_KEYS],
}

impl Keymap {
    pub const NONE: u8 = 0xff;

    /// Map every note to the same subinstrument.
    pub fn single(sub: u8) -> Self {
        Keymap {
            map: [sub; MAX_KEYS],
        }
    }

    pub fn get(&self, note: usize) -> Option<usize> {
        match self.map.get(note) {
            Some(&Keymap::NONE) | None => None,
            Some(&n) => Some(n as usize),
        }
    }

    pub fn set(&mut self, note: usize, sub: u8) {
        if note < MAX_KEYS {
            self.map[note] = sub;
        }
    }

    pub fn iter(&self) -> slice::Iter<u8> {
        self.map.iter()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Keymap::single(Keymap::NONE)
    }
}

impl fmt::Debug for Keymap {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        self.map[..].fmt(formatter)
    }
}


#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub flags     : u8,
    pub points    : Vec<(u16, u16)>,  // (tick, value)
    pub sustain   : usize,
    pub loop_start: usize,
    pub loop_end  : usize,
}

impl Envelope {
    pub fn is_on(&self) -> bool {
        self.flags & ENV_ON != 0
    }

    pub fn is_valid(&self) -> bool {
        let n = self.points.len();
        n <= MAX_ENV_POINTS && (n == 0 || (self.sustain < n && self.loop_start <= self.loop_end && self.loop_end < n))
    }
}


#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubInstrument {
    pub vol      : usize,
    pub pan      : usize,
    pub transpose: isize,
    pub finetune : isize,
    pub sid      : usize,
}

impl SubInstrument {
    pub fn new() -> Self {
        SubInstrument {
            vol: 0x40,
            pan: 0x80,
            ..Default::default()
        }
    }
}
