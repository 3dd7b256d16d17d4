use std::fmt;
use crate::period::{Finetune, Semitone};
use crate::{DEFAULT_C2SPD, MAX_VOLUME};
use super::Sample;

pub const MAX_KEYS: usize = 120;

/// What happens to a sounding voice when a new note arrives on its channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NewNoteAction {
    Cut,
    Continue,
    Release,
    Fadeout,
}

impl Default for NewNoteAction {
    fn default() -> Self {
        NewNoteAction::Cut
    }
}

#[derive(Debug, Clone)]
pub struct Instrument {
    pub num          : usize,
    pub name         : String,
    pub volume       : u8,
    pub global_volume: u8,
    pub c2spd        : u32,
    pub finetune     : Finetune,
    pub pan          : Option<u8>,
    pub nna          : NewNoteAction,
    pub fadeout      : u16,
    pub keymap       : Keymap<SampleMap>,
    pub sample       : Sample,
}

#[derive(Clone)]
pub struct Keymap<T> {
    map: [T; MAX_KEYS]
}

impl<T: fmt::Debug> fmt::Debug for Keymap<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        self.map[..].fmt(formatter)
    }
}

impl Keymap<SampleMap> {
    pub fn set(&mut self, key: Semitone, transpose: i16) {
        if let Some(m) = self.map.get_mut(key.0 as usize) {
            m.transpose = transpose;
        }
    }

    /// Semitone to play for `key`, or `Semitone::UNCHANGED` if the key
    /// is not remapped.
    pub fn get(&self, key: Semitone) -> Semitone {
        match self.map.get(key.0 as usize) {
            Some(m) if m.transpose != 0 => key.transpose(m.transpose),
            _                           => Semitone::UNCHANGED,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SampleMap {
    pub transpose: i16,
}

impl SampleMap {
    pub fn new() -> Self {
        SampleMap {
            transpose: 0,
        }
    }
}

impl Instrument {
    pub fn new() -> Instrument {
        Instrument {
            num          : 0,
            name         : "".to_owned(),
            volume       : MAX_VOLUME,
            global_volume: MAX_VOLUME,
            c2spd        : DEFAULT_C2SPD,
            finetune     : 0,
            pan          : None,
            nna          : NewNoteAction::Cut,
            fadeout      : 0,
            keymap       : Keymap{map: [SampleMap::new(); MAX_KEYS]},
            sample       : Sample::new(),
        }
    }

    pub fn map_semitone(&self, key: Semitone) -> Semitone {
        if key == Semitone::UNCHANGED {
            return key
        }
        self.keymap.get(key)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap() {
        let mut ins = Instrument::new();
        assert_eq!(ins.map_semitone(Semitone(60)), Semitone::UNCHANGED);
        ins.keymap.set(Semitone(60), -12);
        assert_eq!(ins.map_semitone(Semitone(60)), Semitone(48));
        assert_eq!(ins.map_semitone(Semitone::UNCHANGED), Semitone::UNCHANGED);
    }
}
