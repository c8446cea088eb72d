/// Per-channel effect memory used while translating one module's patterns.
/// A loader creates a fresh one for every load.
#[derive(Debug)]
pub struct FxMemory {
    arpeggio: [u8; 32],
}

impl FxMemory {
    pub fn new() -> Self {
        FxMemory {
            arpeggio: [0; 32],
        }
    }

    /// Arpeggio with parameter 0 repeats the last arpeggio seen on the channel.
    pub fn arpeggio(&mut self, chn: usize, fxp: u8) -> u8 {
        let chn = chn & 0x1f;
        if fxp != 0 {
            self.arpeggio[chn] = fxp;
        }
        self.arpeggio[chn]
    }
}

impl Default for FxMemory {
    fn default() -> Self {
        FxMemory::new()
    }
}
