pub mod event;
pub mod instrument;
pub mod sample;

pub use self::event::{ChannelCommand, InstrumentId, Note, Pattern, Row};
pub use self::instrument::{Instrument, NewNoteAction};
pub use self::sample::Sample;

use std::fmt;
use crate::period::Semitone;
use crate::{MAX_VOLUME, PAN_CENTER};

const ORDER_SKIP: u8 = 254;
const ORDER_END : u8 = 255;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderEntry {
    Pattern(usize),
    Skip,
    End,
}

impl From<u8> for OrderEntry {
    fn from(b: u8) -> Self {
        match b {
            ORDER_SKIP => OrderEntry::Skip,
            ORDER_END  => OrderEntry::End,
            n          => OrderEntry::Pattern(n as usize),
        }
    }
}

impl fmt::Display for OrderEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OrderEntry::Pattern(n) => write!(f, "{}", n),
            OrderEntry::Skip       => write!(f, "+++"),
            OrderEntry::End        => write!(f, "---"),
        }
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSetting {
    pub enabled : bool,
    pub volume  : u8,
    pub pan     : u8,
    pub surround: bool,
    pub output  : usize,
}

impl ChannelSetting {
    pub fn new() -> Self {
        ChannelSetting {
            enabled : true,
            volume  : MAX_VOLUME,
            pan     : PAN_CENTER,
            surround: false,
            output  : 0,
        }
    }
}

impl Default for ChannelSetting {
    fn default() -> Self {
        Self::new()
    }
}


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SongFlags {
    pub linear_periods    : bool,
    pub shared_memory     : bool,
    pub fast_volume_slides: bool,
}


/// Read-only view of a decoded song. Format loaders implement this; the
/// player borrows it for the whole playback.
pub trait SongData {
    fn title(&self) -> &str;
    fn orders(&self) -> &[OrderEntry];
    fn pattern(&self, num: usize) -> Option<&Pattern>;
    fn channels(&self) -> &[ChannelSetting];

    /// Look up an instrument. The returned semitone is the keymap remap for
    /// `id.semitone`, or `Semitone::UNCHANGED`.
    fn instrument(&self, id: &InstrumentId) -> Option<(&Instrument, Semitone)>;

    fn flags(&self) -> SongFlags;
    fn initial_speed(&self) -> u8;
    fn initial_tempo(&self) -> u8;
    fn initial_global_volume(&self) -> u8;
    fn restart_order(&self) -> usize;

    fn order(&self, num: usize) -> OrderEntry {
        self.orders().get(num).copied().unwrap_or(OrderEntry::End)
    }

    fn num_channels(&self) -> usize {
        self.channels().len()
    }
}


/// In-memory song.
#[derive(Debug, Clone)]
pub struct Module {
    pub title        : String,
    pub orders       : Vec<OrderEntry>,
    pub patterns     : Vec<Pattern>,
    pub channels     : Vec<ChannelSetting>,
    pub instruments  : Vec<Instrument>,
    pub flags        : SongFlags,
    pub speed        : u8,
    pub tempo        : u8,
    pub global_volume: u8,
    pub restart      : usize,
}

impl Module {
    pub fn new(channels: usize) -> Self {
        Module {
            title        : "".to_owned(),
            orders       : Vec::new(),
            patterns     : Vec::new(),
            channels     : vec![ChannelSetting::new(); channels],
            instruments  : Vec::new(),
            flags        : SongFlags::default(),
            speed        : 6,
            tempo        : 125,
            global_volume: MAX_VOLUME,
            restart      : 0,
        }
    }

    /// Append an instrument, returning its 1-based number.
    pub fn add_instrument(&mut self, mut ins: Instrument) -> u16 {
        ins.num = self.instruments.len() + 1;
        self.instruments.push(ins);
        self.instruments.len() as u16
    }
}

impl SongData for Module {
    fn title(&self) -> &str {
        &self.title
    }

    fn orders(&self) -> &[OrderEntry] {
        &self.orders
    }

    fn pattern(&self, num: usize) -> Option<&Pattern> {
        self.patterns.get(num)
    }

    fn channels(&self) -> &[ChannelSetting] {
        &self.channels
    }

    fn instrument(&self, id: &InstrumentId) -> Option<(&Instrument, Semitone)> {
        if id.is_empty() {
            return None
        }
        let ins = self.instruments.get(id.num as usize - 1)?;
        Some((ins, ins.map_semitone(id.semitone)))
    }

    fn flags(&self) -> SongFlags {
        self.flags
    }

    fn initial_speed(&self) -> u8 {
        self.speed
    }

    fn initial_tempo(&self) -> u8 {
        self.tempo
    }

    fn initial_global_volume(&self) -> u8 {
        self.global_volume
    }

    fn restart_order(&self) -> usize {
        self.restart
    }
}
