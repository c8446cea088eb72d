pub mod load;

pub use self::load::*;

use std::cmp;
use crate::module::Fx;
use crate::module::effect::*;
use crate::util::BitField;

// Digital Symphony (BASSTRAK), Acorn Archimedes.
//
// Header: 8 byte magic, version, channels, song length (one pattern per
// position), number of tracks and info text length. It is followed by 63
// sample slots (name length with bit 7 set for slots without sample data,
// then the sample length in words), the song title and a 64-bit mask of
// allowed effects. Sequence, tracks and sample data may be LZW packed.

pub const MAGIC1: u32 = 0x02011313;
pub const MAGIC2: u32 = 0x1412010b;

pub const MAX_VERSION : u8 = 1;
pub const MAX_CHANNELS: usize = 8;
pub const MAX_LENGTH  : usize = 4096;
pub const MAX_TRACKS  : usize = 4096;
pub const NUM_SAMPLES : usize = 63;
pub const ROWS        : usize = 64;

/// Sequence entry for the shared empty track.
pub const EMPTY_TRACK : u16 = 0x1000;

pub const LZW_MAX_BITS: u32 = 13;

pub const EV_NOTE: BitField = BitField::new(0, 6);
pub const EV_INS : BitField = BitField::new(6, 7);
pub const EV_FXT : BitField = BitField::new(14, 6);
pub const EV_PARM: BitField = BitField::new(20, 12);

pub const NOTE_OFFSET: u8 = 36;

pub type FxPair = (Fx, u8);

const NO_FX: FxPair = (Fx::None, 0);

fn extended(sub: u8, parm: u16) -> FxPair {
    (Fx::Extended, ex(sub, parm as u8))
}

/// Translate a raw effect code and its 12-bit parameter into up to two canonical effects.
pub fn fix_effect(fxt: u8, parm: u16) -> (FxPair, FxPair) {
    let lo = (parm & 0xff) as u8;
    let hi = (parm >> 8) as u8;

    match fxt {
        // pitch effect with volume slide in the high nibble
        0x00 | 0x01 | 0x02 | 0x20 | 0x21 | 0x22 => {
            let t = match fxt {
                0x00 | 0x20 => Fx::Arpeggio,
                0x01 | 0x21 => Fx::PortaUp,
                _           => Fx::PortaDown,
            };
            let fx1 = if t == Fx::Arpeggio && lo == 0 { NO_FX } else { (t, lo) };
            let fx2 = match hi {
                0 => NO_FX,
                _ if fxt < 0x20 => (Fx::VolSlideUp, hi),
                _ => (Fx::VolSlideDown, hi),
            };
            (fx1, fx2)
        }
        0x03 => ((Fx::TonePorta, parm as u8), NO_FX),
        0x04 => ((Fx::Vibrato, parm as u8), NO_FX),
        0x07 => ((Fx::Tremolo, parm as u8), NO_FX),
        0x05 => ((if parm == 0 { Fx::TonePorta } else { Fx::TonePortaVolSlide }, parm as u8), NO_FX),
        0x06 => ((if parm == 0 { Fx::Vibrato } else { Fx::VibratoVolSlide }, parm as u8), NO_FX),
        0x09 => ((Fx::Offset, (parm >> 1) as u8), NO_FX),
        0x0a => {
            let fx1 = if lo != 0 { (Fx::VolSlide, lo) } else { NO_FX };
            let fx2 = if hi & 0x0f != 0 { extended(EX_F_PORTA_UP, hi as u16) } else { NO_FX };
            (fx1, fx2)
        }
        0x0b => ((Fx::Jump, parm as u8), NO_FX),
        0x0c => ((Fx::SetVolume, parm as u8), NO_FX),
        0x0d => ((Fx::Break, parm as u8), NO_FX),
        0x0f => ((Fx::SpeedTempo, parm as u8), NO_FX),
        0x13 => (extended(EX_GLISS, parm), NO_FX),
        0x14 => (extended(EX_VIBRATO_WF, parm), NO_FX),
        0x15 => (extended(EX_FINETUNE, parm), NO_FX),
        0x16 => (extended(EX_PATTERN_LOOP, parm), NO_FX),
        0x17 => (extended(EX_TREMOLO_WF, parm), NO_FX),
        0x19 => {
            if parm < 0x10 {
                (extended(EX_RETRIG, parm), NO_FX)
            } else {
                (NO_FX, NO_FX)
            }
        }
        // fine pitch slide with fine volume slide in the high nibble
        0x11 | 0x12 | 0x1a | 0x1b => {
            let pitch = if fxt == 0x11 || fxt == 0x1a { EX_F_PORTA_UP } else { EX_F_PORTA_DN };
            let vol = if fxt == 0x11 || fxt == 0x12 { EX_F_VSLIDE_UP } else { EX_F_VSLIDE_DN };
            let fx1 = if lo != 0 && lo < 0x10 { extended(pitch, parm) } else { NO_FX };
            let fx2 = if hi != 0 { extended(vol, hi as u16) } else { NO_FX };
            (fx1, fx2)
        }
        0x1c => (extended(EX_CUT, parm), NO_FX),
        0x1d => (extended(EX_DELAY, parm), NO_FX),
        0x1e => (extended(EX_PATT_DELAY, parm), NO_FX),
        0x2f => {
            if parm >= 0x100 && parm <= 0x800 {
                ((Fx::SetTempo, cmp::min((parm + 4) >> 3, 255) as u8), NO_FX)
            } else {
                (NO_FX, NO_FX)
            }
        }
        // 1F invert loop, 2A volume slide + fine slide down, 2B line jump,
        // 30 set stereo, 31 song upcall, 32 unset sample repeat
        _ => (NO_FX, NO_FX),
    }
}

/// Check the module's allowed effects mask before translating.
pub fn xlat_fx(allowed: &[u8; 8], fxt: u8, parm: u16) -> (FxPair, FxPair) {
    let fxt = fxt & 0x3f;
    if allowed[(fxt >> 3) as usize] & (1 << (fxt & 7)) != 0 {
        fix_effect(fxt, parm)
    } else {
        (NO_FX, NO_FX)
    }
}
