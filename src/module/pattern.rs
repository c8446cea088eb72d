use crate::module::Event;

/// A row-by-channel grid, stored as one track index per channel.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    pub rows : usize,
    pub index: Vec<usize>,
}

impl Pattern {
    pub fn new(rows: usize, chn: usize) -> Self {
        Pattern {
            rows,
            index: vec![0; chn],
        }
    }
}


/// One channel column. Tracks live in the module's track pool and may be shared.
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub event: Vec<Event>,
}

impl Track {
    pub fn new(rows: usize) -> Self {
        Track {
            event: vec![Event::new(); rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.event.len()
    }
}
