use super::{amiga_frequency, Frequency};

/// An Amiga-style period, inversely proportional to frequency. A value of
/// zero means no note is playing.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct AmigaPeriod(pub f64);

impl AmigaPeriod {
    /// Add an integer amount and truncate, matching the legacy rounding of
    /// period arithmetic.
    pub fn add_integer(self, val: i32) -> Self {
        AmigaPeriod((self.0 + val as f64).trunc())
    }

    pub fn add_delta(self, delta: i32) -> Self {
        if self.0 <= 0.0 {
            return self
        }
        let p = self.add_integer(delta);
        if p.0 < 1.0 {
            AmigaPeriod(1.0)
        } else {
            p
        }
    }

    pub fn lerp(self, t: f64, rhs: &AmigaPeriod) -> Self {
        AmigaPeriod(self.0 + t * (rhs.0 - self.0))
    }

    pub fn frequency(self) -> Frequency {
        amiga_frequency(self.0)
    }
}
