pub mod load;

pub use self::load::*;

use crate::format::fx::FxMemory;
use crate::module::Fx;
use crate::module::effect::*;
use crate::util::{msn, lsn};

// Imago Orpheus, based on the format description written by Lutz Roeder.
//
//                            IMF module header
//          0   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
//        ,---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---.
//  0000: | Song name, 32 chars                                           |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  0010: |                                                               |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  0020: |OrdNum |PatNum |InsNum | Flags | x | x | x | x | x | x | x | x |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  0030: |Tpo|Bpm|Vol|Amp| x | x | x | x | x | x | x | x |'I'|'M'|'1'|'0'|
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  0040: | 32 channel records: name (12), status, pan, chorus, reverb    |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  0240: | Orders, 256 bytes (0xff = skip)                               |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  0340: | Patterns, instruments and samples                             |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+

pub const MAX_LENGTH     : usize = 256;
pub const MAX_PATTERNS   : usize = 256;
pub const MAX_INSTRUMENTS: usize = 255;
pub const MAX_SUBINS     : usize = 16;
pub const MAX_ENV_POINTS : usize = 16;

pub const ORDERS_OFS  : usize = 0x240;
pub const PATTERNS_OFS: usize = 0x340;

// Channel status
pub const CHN_ENABLED : u8 = 0;
pub const CHN_MUTED   : u8 = 1;

// Pattern stream
pub const IMF_EOR       : u8 = 0x00;
pub const IMF_CH_MASK   : u8 = 0x1f;
pub const IMF_NI_FOLLOW : u8 = 0x20;
pub const IMF_FX_FOLLOWS: u8 = 0x40;
pub const IMF_F2_FOLLOWS: u8 = 0x80;

// Sample flags
pub const IMF_SMP_LOOP : u8 = 0x01;
pub const IMF_SMP_BIDIR: u8 = 0x02;
pub const IMF_SMP_16BIT: u8 = 0x04;

const FX_IMF_FPORTA_UP: u8 = 0x14;
const FX_IMF_FPORTA_DN: u8 = 0x15;

lazy_static! {
    static ref FX_TABLE: Box<[Fx; 36]> = Box::new([
        Fx::None,               // 00
        Fx::SetSpeed,           // 01
        Fx::SetTempo,           // 02
        Fx::TonePorta,          // 03
        Fx::TonePortaVolSlide,  // 04
        Fx::Vibrato,            // 05
        Fx::VibratoVolSlide,    // 06
        Fx::FineVibrato,        // 07
        Fx::Tremolo,            // 08
        Fx::Arpeggio,           // 09
        Fx::SetPan,             // 0A
        Fx::PanSlide,           // 0B
        Fx::SetVolume,          // 0C
        Fx::VolSlide,           // 0D
        Fx::FineVolSlide,       // 0E
        Fx::Finetune,           // 0F
        Fx::NoteSlideUp,        // 10
        Fx::NoteSlideDown,      // 11
        Fx::PortaUp,            // 12
        Fx::PortaDown,          // 13
        Fx::PortaUp,            // 14 fine porta up
        Fx::PortaDown,          // 15 fine porta down
        Fx::FilterCutoff,       // 16
        Fx::FilterResonance,    // 17
        Fx::Offset,             // 18
        Fx::None,               // 19 fine offset
        Fx::KeyOff,             // 1A
        Fx::MultiRetrig,        // 1B
        Fx::Tremor,             // 1C
        Fx::Jump,               // 1D
        Fx::Break,              // 1E
        Fx::GlobalVolume,       // 1F
        Fx::GlobalVolSlide,     // 20
        Fx::Extended,           // 21
        Fx::Chorus,             // 22
        Fx::Reverb,             // 23
    ]);
}

fn fine_porta(fxp: u8) -> u8 {
    if fxp < 0x30 {
        0xe0 | lsn(fxp >> 2)
    } else {
        0xf0 | lsn(fxp >> 4)
    }
}

/// Translate a raw effect on channel `chn` into a canonical effect.
pub fn xlat_fx(mem: &mut FxMemory, chn: usize, fxt: u8, fxp: u8) -> (Fx, u8) {
    let t = match FX_TABLE.get(fxt as usize) {
        Some(&t) => t,
        None     => return (Fx::None, 0),
    };

    let (h, l) = (msn(fxp), lsn(fxp));

    match t {
        Fx::None     => (Fx::None, 0),
        Fx::Arpeggio => (t, mem.arpeggio(chn, fxp)),
        _ if fxt == FX_IMF_FPORTA_UP || fxt == FX_IMF_FPORTA_DN => (t, fine_porta(fxp)),
        Fx::Extended => match h {
            0x1 | 0x2 | 0x4 | 0x6 | 0x7 | 0x9 | 0xe | 0xf => (Fx::None, 0),
            0x3 => (t, ex(EX_GLISS, l)),
            0x5 => (t, ex(EX_VIBRATO_WF, l)),
            0x8 => (t, ex(EX_TREMOLO_WF, l)),
            0xa => (t, ex(EX_PATTERN_LOOP, l)),
            0xb => (t, ex(EX_PATT_DELAY, l)),
            0xc if l == 0 => (Fx::None, 0),
            _   => (t, fxp),
        },
        _ => (t, fxp),
    }
}
