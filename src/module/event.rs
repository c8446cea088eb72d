use std::fmt;
use crate::module::Fx;
use crate::util::NOTES;

/// Note value meaning "release the current note".
pub const KEY_OFF: u8 = 0x81;

/// Highest regular note value in the canonical encoding.
pub const MAX_NOTE: u8 = 120;

/// One row of one channel: note, instrument and up to two effects.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Event {
    pub note: u8,
    pub ins : u8,
    pub vol : u8,
    pub fxt : Fx,
    pub fxp : u8,
    pub f2t : Fx,
    pub f2p : u8,
}

impl Event {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Event::new()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let note = if self.note == 0 {
            "---".to_owned()
        } else if self.note == KEY_OFF {
            "===".to_owned()
        } else {
            let n = self.note as usize - 1;
            format!("{}{}", NOTES[n % 12], n / 12)
        };

        let ins = if self.ins == 0 {
            "--".to_owned()
        } else {
            format!("{:02x}", self.ins)
        };

        write!(f, "{} {} {}{:02X} {}{:02X}", note, ins, self.fxt, self.fxp, self.f2t, self.f2p)
    }
}
