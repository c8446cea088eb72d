//! Canonical effect vocabulary. Every loader translates its raw effect codes into these
//! types; `Fx::None` means no effect.
//!
//! `Fx::Extended` carries a sub-effect in the high nibble of its parameter (one of the
//! `EX_*` values below) and the sub-effect value in the low nibble, as in Protracker.

use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fx {
    None = 0,
    Arpeggio,
    PortaUp,
    PortaDown,
    TonePorta,
    Vibrato,
    TonePortaVolSlide,
    VibratoVolSlide,
    Tremolo,
    SetPan,
    Offset,
    VolSlide,
    Jump,
    SetVolume,
    Break,
    Extended,
    /// Protracker style Fxx: speed below 0x20, tempo from 0x20 up
    SpeedTempo,
    SetSpeed,
    SetTempo,
    FineVibrato,
    PanSlide,
    VolSlideUp,
    VolSlideDown,
    FineVolSlide,
    Finetune,
    NoteSlideUp,
    NoteSlideDown,
    FilterCutoff,
    FilterResonance,
    KeyOff,
    MultiRetrig,
    Tremor,
    GlobalVolume,
    GlobalVolSlide,
    Chorus,
    Reverb,
}

impl Default for Fx {
    fn default() -> Self {
        Fx::None
    }
}

impl fmt::Display for Fx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02X}", *self as u8)
    }
}

// Extended effects
pub const EX_FILTER      : u8 = 0x0;
pub const EX_F_PORTA_UP  : u8 = 0x1;
pub const EX_F_PORTA_DN  : u8 = 0x2;
pub const EX_GLISS       : u8 = 0x3;
pub const EX_VIBRATO_WF  : u8 = 0x4;
pub const EX_FINETUNE    : u8 = 0x5;
pub const EX_PATTERN_LOOP: u8 = 0x6;
pub const EX_TREMOLO_WF  : u8 = 0x7;
pub const EX_SETPAN      : u8 = 0x8;
pub const EX_RETRIG      : u8 = 0x9;
pub const EX_F_VSLIDE_UP : u8 = 0xa;
pub const EX_F_VSLIDE_DN : u8 = 0xb;
pub const EX_CUT         : u8 = 0xc;
pub const EX_DELAY       : u8 = 0xd;
pub const EX_PATT_DELAY  : u8 = 0xe;
pub const EX_INVLOOP     : u8 = 0xf;

/// Build the parameter of an extended effect.
#[inline]
pub fn ex(sub: u8, val: u8) -> u8 {
    (sub << 4) | (val & 0x0f)
}
