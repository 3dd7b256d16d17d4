use super::{Filter, MixBuffer};

const ENV_MAX: u8 = 127;

/// One-pole low-pass. The envelope value sets the cutoff: 127 leaves the
/// signal untouched, lower values darken it.
#[derive(Clone, Debug)]
pub struct OnePole {
    coef : f32,
    state: [f32; 2],
}

impl OnePole {
    pub fn new() -> Self {
        OnePole {
            coef : 1.0,
            state: [0.0; 2],
        }
    }
}

impl Default for OnePole {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for OnePole {
    fn filter(&mut self, dry: &MixBuffer) -> MixBuffer {
        let mut wet = dry.clone();
        if self.coef >= 1.0 {
            if let Some(last) = dry.frames.last() {
                self.state = *last;
            }
            return wet
        }

        for frame in wet.frames.iter_mut() {
            for (i, s) in frame.iter_mut().enumerate() {
                self.state[i] += self.coef * (*s - self.state[i]);
                *s = self.state[i];
            }
        }
        wet
    }

    fn update_env(&mut self, value: u8) {
        let v = value.min(ENV_MAX) as f32 / ENV_MAX as f32;
        // squared response keeps low settings usable
        self.coef = (v * v).max(0.001);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_filter_passes_through() {
        let mut f = OnePole::new();
        f.update_env(127);
        let mut dry = MixBuffer::new(3);
        dry.frames[1] = [1.0, -1.0];
        assert_eq!(f.filter(&dry), dry);
    }

    #[test]
    fn test_closed_filter_smooths() {
        let mut f = OnePole::new();
        f.update_env(32);
        let mut dry = MixBuffer::new(4);
        for fr in dry.frames.iter_mut() {
            *fr = [1.0, 1.0];
        }
        let wet = f.filter(&dry);
        assert!(wet.frames[0][0] < 1.0);
        assert!(wet.frames[3][0] > wet.frames[0][0]);
    }

    #[test]
    fn test_state_carries_across_calls() {
        let mut f = OnePole::new();
        f.update_env(64);
        let mut dry = MixBuffer::new(1);
        dry.frames[0] = [1.0, 1.0];
        let a = f.filter(&dry).frames[0][0];
        let b = f.filter(&dry).frames[0][0];
        assert!(b > a);
    }
}
