//! Pitch representation and period/frequency conversion.
//!
//! Two period models are supported. Amiga periods are inversely proportional
//! to frequency and derive from a 12-entry semitone table shifted by octave.
//! Linear periods count 1/64 semitone steps (768 per octave) on top of the
//! sample C2-speed.

mod amiga;
mod linear;

pub use self::amiga::AmigaPeriod;
pub use self::linear::LinearPeriod;

use std::cmp::Ordering;
use std::fmt;
use crate::util::NOTES;
use crate::{AMIGA_CLOCK, DEFAULT_C2SPD};

/// Fractional semitone offset in 1/64 semitone units.
pub type Finetune = i16;

pub type Frequency = f64;

pub const FINETUNES_PER_SEMITONE: i32 = 64;
pub const FINETUNES_PER_OCTAVE  : i32 = 12 * FINETUNES_PER_SEMITONE;

/// C-0 to B-0 periods for the default C2-speed, scaled by 16.
pub static SEMITONE_PERIOD_TABLE: [f64; 12] = [
    1712.0 * 16.0, 1616.0 * 16.0, 1524.0 * 16.0,
    1440.0 * 16.0, 1356.0 * 16.0, 1280.0 * 16.0,
    1208.0 * 16.0, 1140.0 * 16.0, 1076.0 * 16.0,
    1016.0 * 16.0,  960.0 * 16.0,  907.0 * 16.0
];

lazy_static! {
    // 2^(i/768) for one octave of finetune steps
    static ref OCTAVE_FRACTION: Box<[f64; FINETUNES_PER_OCTAVE as usize]> = {
        let mut table = Box::new([0.0; FINETUNES_PER_OCTAVE as usize]);
        for (i, val) in table.iter_mut().enumerate() {
            *val = 2.0_f64.powf(i as f64 / FINETUNES_PER_OCTAVE as f64);
        }
        table
    };
}

/// Compute `2^(finetune/768)`.
pub fn finetune_factor(finetune: i32) -> f64 {
    let octave = finetune.div_euclid(FINETUNES_PER_OCTAVE);
    let frac = finetune.rem_euclid(FINETUNES_PER_OCTAVE) as usize;
    OCTAVE_FRACTION[frac] * 2.0_f64.powi(octave)
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Semitone(pub u8);

impl Semitone {
    /// Sentinel meaning "keep the current semitone".
    pub const UNCHANGED: Semitone = Semitone(0xff);
    pub const MAX      : u8 = 119;

    pub fn new(octave: u8, key: u8) -> Self {
        Semitone(octave * 12 + key)
    }

    pub fn key(self) -> u8 {
        self.0 % 12
    }

    pub fn octave(self) -> u8 {
        self.0 / 12
    }

    pub fn transpose(self, amount: i16) -> Self {
        if self == Semitone::UNCHANGED {
            return self
        }
        let val = (self.0 as i16 + amount).max(0).min(Self::MAX as i16);
        Semitone(val as u8)
    }
}

impl fmt::Display for Semitone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if *self == Semitone::UNCHANGED {
            return write!(f, "...")
        }
        write!(f, "{}{}", NOTES[self.key() as usize], self.octave())
    }
}


/// Three-way comparison of two periods by the frequency they produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    LeftHigherFreq,
    Equal,
    RightHigherFreq,
}

impl Comparison {
    pub fn reverse(self) -> Self {
        match self {
            Comparison::LeftHigherFreq  => Comparison::RightHigherFreq,
            Comparison::Equal           => Comparison::Equal,
            Comparison::RightHigherFreq => Comparison::LeftHigherFreq,
        }
    }
}


#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Period {
    Amiga(AmigaPeriod),
    Linear(LinearPeriod),
}

impl Period {
    /// A period that produces no sound, in the requested model.
    pub fn zero(linear: bool) -> Period {
        if linear {
            Period::Linear(LinearPeriod { finetune: 0, c2spd: DEFAULT_C2SPD })
        } else {
            Period::Amiga(AmigaPeriod(0.0))
        }
    }

    pub fn compare(&self, rhs: &Period) -> Comparison {
        match self.frequency().partial_cmp(&rhs.frequency()) {
            Some(Ordering::Greater) => Comparison::LeftHigherFreq,
            Some(Ordering::Less)    => Comparison::RightHigherFreq,
            _                       => Comparison::Equal,
        }
    }

    /// Interpolate toward `rhs` in this period's native unit. A period of the
    /// other variant is converted first.
    pub fn lerp(&self, t: f64, rhs: &Period) -> Period {
        match *self {
            Period::Amiga(p)  => Period::Amiga(p.lerp(t, &rhs.to_amiga())),
            Period::Linear(p) => Period::Linear(p.lerp(t, &rhs.to_linear(p.c2spd))),
        }
    }

    /// Apply a signed adjustment in native units. Positive deltas raise the
    /// period value, which lowers an Amiga period's frequency.
    pub fn add_delta(&self, delta: i32) -> Period {
        match *self {
            Period::Amiga(p)  => Period::Amiga(p.add_delta(delta)),
            Period::Linear(p) => Period::Linear(p.add_delta(delta)),
        }
    }

    /// Raise the pitch by `amount` native units.
    pub fn porta_up(&self, amount: i32) -> Period {
        match *self {
            Period::Amiga(_)  => self.add_delta(-amount),
            Period::Linear(_) => self.add_delta(amount),
        }
    }

    /// Lower the pitch by `amount` native units.
    pub fn porta_down(&self, amount: i32) -> Period {
        self.porta_up(-amount)
    }

    pub fn add_semitones(&self, num: i32) -> Period {
        match *self {
            Period::Amiga(p)  => {
                if p.0 <= 0.0 {
                    return *self
                }
                let factor = finetune_factor(num * FINETUNES_PER_SEMITONE);
                Period::Amiga(AmigaPeriod((p.0 / factor).trunc()))
            }
            Period::Linear(p) => Period::Linear(p.add_delta(num * FINETUNES_PER_SEMITONE)),
        }
    }

    /// Snap to the nearest semitone (glissando).
    pub fn round_to_semitone(&self) -> Period {
        match *self {
            Period::Amiga(p)  => {
                if p.0 <= 0.0 {
                    return *self
                }
                let lin = to_linear_period(p, DEFAULT_C2SPD).round_to_semitone();
                Period::Amiga(AmigaPeriod(to_amiga_period(lin.finetune, lin.c2spd).0.trunc()))
            }
            Period::Linear(p) => Period::Linear(p.round_to_semitone()),
        }
    }

    pub fn frequency(&self) -> Frequency {
        match *self {
            Period::Amiga(p)  => p.frequency(),
            Period::Linear(p) => p.frequency(),
        }
    }

    /// Sample positions advanced per output sample at `rate`.
    pub fn sampler_add(&self, rate: u32) -> f64 {
        if rate == 0 {
            return 0.0
        }
        self.frequency() / rate as f64
    }

    pub fn is_playing(&self) -> bool {
        self.frequency() > 0.0
    }

    pub fn to_amiga(&self) -> AmigaPeriod {
        match *self {
            Period::Amiga(p)  => p,
            Period::Linear(p) => to_amiga_period(p.finetune, p.c2spd),
        }
    }

    pub fn to_linear(&self, c2spd: u32) -> LinearPeriod {
        match *self {
            Period::Amiga(p)  => to_linear_period(p, c2spd),
            Period::Linear(p) => p,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Period::Amiga(p)  => write!(f, "A{:.0}", p.0),
            Period::Linear(p) => write!(f, "L{}", p.finetune),
        }
    }
}


/// Period of a semitone offset relative to C-0 using the unshifted table.
fn table_period(semi: i32) -> f64 {
    let octave = semi.div_euclid(12);
    let key = semi.rem_euclid(12) as usize;
    SEMITONE_PERIOD_TABLE[key] / 2.0_f64.powi(octave)
}

pub fn calc_semitone_period(semitone: Semitone, finetune: Finetune, c2spd: u32, linear: bool) -> Option<Period> {
    assert!(semitone != Semitone::UNCHANGED, "period requested for unchanged semitone");

    let key = semitone.key() as usize;
    let base = *SEMITONE_PERIOD_TABLE.get(key)?;
    let c2spd = if c2spd == 0 { DEFAULT_C2SPD } else { c2spd };

    if linear {
        return Some(Period::Linear(LinearPeriod {
            finetune: semitone.0 as i32 * FINETUNES_PER_SEMITONE + finetune as i32,
            c2spd,
        }))
    }

    let c2spd = calc_finetune_c2spd(c2spd, finetune);
    let octave = semitone.octave() as u32;
    let period = DEFAULT_C2SPD as f64 * base / ((c2spd as u64) << octave) as f64;

    Some(Period::Amiga(AmigaPeriod(period).add_integer(0)))
}

/// Fold a finetune into a synthetic C2-speed. The finetuned period is
/// interpolated between adjacent table keys; the octave cancels out in the
/// ratio so the table's base octave is used as reference.
pub fn calc_finetune_c2spd(c2spd: u32, finetune: Finetune) -> u32 {
    if finetune == 0 {
        return c2spd
    }

    let ft = finetune as i32;
    let semi = ft.div_euclid(FINETUNES_PER_SEMITONE);
    let frac = ft.rem_euclid(FINETUNES_PER_SEMITONE) as f64 / FINETUNES_PER_SEMITONE as f64;

    let reference = table_period(0);
    let lo = AmigaPeriod(table_period(semi));
    let hi = AmigaPeriod(table_period(semi + 1));
    let tuned = lo.lerp(frac, &hi);

    (c2spd as f64 * reference / tuned.0).round() as u32
}

pub fn to_amiga_period(finetune: i32, c2spd: u32) -> AmigaPeriod {
    let c2spd = if c2spd == 0 { DEFAULT_C2SPD } else { c2spd };
    let freq = c2spd as f64 * finetune_factor(finetune) / DEFAULT_C2SPD as f64;
    AmigaPeriod(SEMITONE_PERIOD_TABLE[0] / freq)
}

pub fn to_linear_period(period: AmigaPeriod, c2spd: u32) -> LinearPeriod {
    let c2spd = if c2spd == 0 { DEFAULT_C2SPD } else { c2spd };
    if period.0 <= 0.0 {
        return LinearPeriod { finetune: 0, c2spd }
    }
    let ratio = SEMITONE_PERIOD_TABLE[0] * DEFAULT_C2SPD as f64 / (period.0 * c2spd as f64);
    let finetune = (FINETUNES_PER_OCTAVE as f64 * ratio.log2()).round() as i32;
    LinearPeriod { finetune, c2spd }
}

pub(crate) fn amiga_frequency(period: f64) -> Frequency {
    if period <= 0.0 {
        0.0
    } else {
        AMIGA_CLOCK / period
    }
}
