use super::{to_amiga_period, Frequency, FINETUNES_PER_SEMITONE};

/// A logarithmic period: `finetune` counts 1/64 semitones from C-0 at the
/// sample's C2-speed. A finetune of zero means no note is playing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinearPeriod {
    pub finetune: i32,
    pub c2spd   : u32,
}

impl LinearPeriod {
    pub fn add_delta(self, delta: i32) -> Self {
        if self.finetune == 0 {
            return self
        }
        LinearPeriod {
            finetune: (self.finetune + delta).max(1),
            c2spd   : self.c2spd,
        }
    }

    pub fn lerp(self, t: f64, rhs: &LinearPeriod) -> Self {
        let delta = (rhs.finetune - self.finetune) as f64;
        LinearPeriod {
            finetune: self.finetune + (t * delta).round() as i32,
            c2spd   : self.c2spd,
        }
    }

    pub fn round_to_semitone(self) -> Self {
        if self.finetune == 0 {
            return self
        }
        let half = FINETUNES_PER_SEMITONE / 2;
        LinearPeriod {
            finetune: ((self.finetune + half).div_euclid(FINETUNES_PER_SEMITONE) * FINETUNES_PER_SEMITONE).max(1),
            c2spd   : self.c2spd,
        }
    }

    pub fn frequency(self) -> Frequency {
        if self.finetune == 0 {
            return 0.0
        }
        to_amiga_period(self.finetune, self.c2spd).frequency()
    }
}
