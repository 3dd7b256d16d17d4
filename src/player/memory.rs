use fastrand::Rng;
use super::effect::tables::{VIBRAMP, VIBSIN, VIBSQU};

/// Effect families sharing one last-parameter slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    VolumeSlide,
    Porta,
    TonePorta,
    Vibrato,
    Tremor,
    Arpeggio,
    ChannelVolumeSlide,
    SampleOffset,
    PanSlide,
    Retrigger,
    Tremolo,
    Extended,
    TempoSlide,
    GlobalVolumeSlide,
    Panbrello,
}

const NUM_FAMILIES: usize = 15;
const RANDOM_SEED : u64 = 0x5eed_0000;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    RampDown,
    Square,
    Random,
}

impl Waveform {
    pub fn from_nibble(val: u8) -> Self {
        match val & 3 {
            0 => Waveform::Sine,
            1 => Waveform::RampDown,
            2 => Waveform::Square,
            _ => Waveform::Random,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Oscillator {
    pub pos     : u8,
    pub waveform: Waveform,
    pub retrig  : bool,
}

impl Oscillator {
    pub fn new() -> Self {
        Oscillator {
            pos     : 0,
            waveform: Waveform::Sine,
            retrig  : true,
        }
    }

    /// S3x/S4x/S5x: bit 2 set keeps the phase across notes.
    pub fn set_waveform(&mut self, val: u8) {
        self.waveform = Waveform::from_nibble(val);
        self.retrig = val & 4 == 0;
    }

    pub fn note_on(&mut self) {
        if self.retrig {
            self.pos = 0;
        }
    }

    /// Current wave value, -255..255.
    pub fn value(&self, rng: &mut Rng) -> i32 {
        let i = (self.pos & 63) as usize;
        match self.waveform {
            Waveform::Sine     => VIBSIN[i] as i32,
            Waveform::RampDown => VIBRAMP[i] as i32,
            Waveform::Square   => VIBSQU[i] as i32,
            Waveform::Random   => rng.i32(-255..=255),
        }
    }

    pub fn advance(&mut self, speed: u8) {
        self.pos = self.pos.wrapping_add(speed) & 63;
    }
}


/// Per-channel state that survives across rows for the whole song.
#[derive(Clone, Debug)]
pub struct Memory {
    last           : [u8; NUM_FAMILIES],
    shared         : bool,
    chn            : usize,
    pub rng        : Rng,
    pub vibrato    : Oscillator,
    pub tremolo    : Oscillator,
    pub panbrello  : Oscillator,
    pub loop_row   : usize,
    pub loop_count : u8,
    pub tremor     : u8,
    pub tremor_on  : bool,
    pub glissando  : bool,
    pub high_offset: u8,
}

impl Memory {
    pub fn new(chn: usize, shared: bool) -> Self {
        Memory {
            last       : [0; NUM_FAMILIES],
            shared,
            chn,
            rng        : Rng::with_seed(RANDOM_SEED + chn as u64),
            vibrato    : Oscillator::new(),
            tremolo    : Oscillator::new(),
            panbrello  : Oscillator::new(),
            loop_row   : 0,
            loop_count : 0,
            tremor     : 0,
            tremor_on  : false,
            glissando  : false,
            high_offset: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Memory::new(self.chn, self.shared);
    }

    fn slot(&self, family: Family) -> usize {
        if self.shared { 0 } else { family as usize }
    }

    /// Zero means "reuse the last nonzero parameter of this family".
    pub fn memorize(&mut self, family: Family, param: u8) -> u8 {
        let i = self.slot(family);
        if param != 0 {
            self.last[i] = param;
        }
        self.last[i]
    }

    /// Nibble-wise variant for effects whose speed and depth are kept
    /// separately.
    pub fn memorize_nibbles(&mut self, family: Family, param: u8) -> u8 {
        let i = self.slot(family);
        let last = self.last[i];
        let hi = if param & 0xf0 != 0 { param & 0xf0 } else { last & 0xf0 };
        let lo = if param & 0x0f != 0 { param & 0x0f } else { last & 0x0f };
        self.last[i] = hi | lo;
        self.last[i]
    }

    pub fn last(&self, family: Family) -> u8 {
        self.last[self.slot(family)]
    }

    pub fn in_pattern_loop(&self) -> bool {
        self.loop_count > 0
    }
}
