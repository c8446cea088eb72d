pub mod load;

pub use self::load::*;

use crate::module::Fx;
use crate::util::BitField;

//                          Desktop Tracker module header
//          0   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
//        ,---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---.
//  0000: |'D'|'s'|'k'|'T'| x | x | x | x | Song name, 64 chars           |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  0048: | Author, 64 chars                                              |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  0088: | Flags         | Channels      | Length        | x | x | x | x |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  0098: | x | x | x | x | Speed         | Restart       | Patterns      |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  00a8: | Instruments   | Orders, (Length + 3) & ~3 bytes               |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  xxx1: | Pattern offsets, Patterns * 4 bytes                           |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  xxx2: | Pattern rows, (Patterns + 3) & ~3 bytes                       |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//  xxx3: | Instruments, 64 bytes each                                    |
//        +---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+---+

pub const MAX_CHANNELS   : usize = 32;
pub const MAX_PATTERNS   : usize = 256;
pub const MAX_LENGTH     : usize = 256;
pub const MAX_INSTRUMENTS: usize = 63;

// Packed event word. When the second effect is set, a parameter word follows
// with the first parameter in the low byte and the second parameter above it.
pub const EV_INS : BitField = BitField::new(0, 6);
pub const EV_NOTE: BitField = BitField::new(6, 6);
pub const EV_FX1 : BitField = BitField::new(12, 5);
pub const EV_FX2 : BitField = BitField::new(17, 5);
pub const EV_PARM: BitField = BitField::new(26, 6);

pub const NOTE_OFFSET: u8 = 48;

lazy_static! {
    static ref FX_TABLE: Box<[Fx; 16]> = Box::new([
        Fx::Arpeggio,           // 0
        Fx::PortaUp,            // 1
        Fx::PortaDown,          // 2
        Fx::TonePorta,          // 3
        Fx::Vibrato,            // 4
        Fx::TonePortaVolSlide,  // 5
        Fx::VibratoVolSlide,    // 6
        Fx::Tremolo,            // 7
        Fx::SetPan,             // 8
        Fx::Offset,             // 9
        Fx::VolSlide,           // A
        Fx::Jump,               // B
        Fx::SetVolume,          // C
        Fx::Break,              // D
        Fx::Extended,           // E
        Fx::SpeedTempo,         // F
    ]);
}

/// Translate a raw 5-bit effect code. Codes above 0xf have no canonical meaning.
pub fn xlat_fx(fxt: u8, fxp: u8) -> (Fx, u8) {
    let t = match FX_TABLE.get(fxt as usize) {
        Some(&t) => t,
        None     => return (Fx::None, 0),
    };

    if t == Fx::Arpeggio && fxp == 0 {
        (Fx::None, 0)
    } else {
        (t, fxp)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xlat_fx() {
        assert_eq!(xlat_fx(0x0, 0x00), (Fx::None, 0));
        assert_eq!(xlat_fx(0x0, 0x47), (Fx::Arpeggio, 0x47));
        assert_eq!(xlat_fx(0x3, 0x10), (Fx::TonePorta, 0x10));
        assert_eq!(xlat_fx(0xc, 0x40), (Fx::SetVolume, 0x40));
        assert_eq!(xlat_fx(0xf, 0x7d), (Fx::SpeedTempo, 0x7d));
        assert_eq!(xlat_fx(0x10, 0x12), (Fx::None, 0));
        assert_eq!(xlat_fx(0x1f, 0xff), (Fx::None, 0));
    }

    #[test]
    fn test_event_fields() {
        let x = 0x8015_c4c5_u32;
        assert_eq!(EV_INS.get(x), 0x05);
        assert_eq!(EV_NOTE.get(x), 0x13);
        assert_eq!(EV_FX1.get(x), 0x1c);
        assert_eq!(EV_FX2.get(x), 0x0a);
        assert_eq!(EV_PARM.get(x), 0x20);
    }
}
