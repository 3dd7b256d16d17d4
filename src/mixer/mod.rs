//! Render contract between the player and whatever turns voices into PCM.
//!
//! The player emits one `RenderRequest` per sounding voice per tick. A
//! `Mixer` accumulates requests into per-channel `MixBuffer`s, then each
//! channel's `Filter` runs over its buffer.

use crate::module::sample::{Cursor, Sample};
use crate::{MAX_PAN, PAN_CENTER};

mod filter;

pub use self::filter::OnePole;


/// Per-output gains for one voice.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VolumeMatrix {
    pub left : f32,
    pub right: f32,
}

impl VolumeMatrix {
    /// Linear pan law. `volume` is 0.0..1.0, `pan` is 0 (left) to 64 (right).
    pub fn new(volume: f32, pan: u8, surround: bool) -> Self {
        if surround {
            // phase-inverted right channel, centered
            let v = volume * 0.5;
            return VolumeMatrix { left: v, right: -v }
        }
        let pan = pan.min(MAX_PAN) as f32 / MAX_PAN as f32;
        VolumeMatrix {
            left : volume * (1.0 - pan),
            right: volume * pan,
        }
    }

    pub fn centered(volume: f32) -> Self {
        Self::new(volume, PAN_CENTER, false)
    }

    pub fn is_silent(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}


/// One voice to render for the current tick.
#[derive(Clone, Debug)]
pub struct RenderRequest<'a> {
    pub channel    : usize,
    pub past       : bool,
    pub sample     : &'a Sample,
    pub cursor     : Cursor,
    pub released   : bool,
    pub sampler_add: f64,
    pub samples    : usize,
    pub volume     : VolumeMatrix,
    pub output     : usize,
}

impl<'a> RenderRequest<'a> {
    pub fn position(&self) -> f64 {
        self.cursor.pos
    }
}


/// Interleaved stereo frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MixBuffer {
    pub frames: Vec<[f32; 2]>,
}

impl MixBuffer {
    pub fn new(size: usize) -> Self {
        MixBuffer {
            frames: vec![[0.0; 2]; size],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn peak(&self) -> f32 {
        self.frames.iter().fold(0.0_f32, |m, f| m.max(f[0].abs()).max(f[1].abs()))
    }
}


pub trait Mixer {
    /// Add the voice described by `req` into `out`.
    fn mix(&mut self, req: &RenderRequest, out: &mut MixBuffer);
}

pub trait Filter {
    fn filter(&mut self, dry: &MixBuffer) -> MixBuffer;
    fn update_env(&mut self, value: u8);
}


/// Mixer that renders nothing. Useful to drive the player for timing only.
pub struct Silence;

impl Mixer for Silence {
    fn mix(&mut self, _req: &RenderRequest, _out: &mut MixBuffer) {
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolator {
    Nearest,
    Linear,
}

/// Straightforward resampling mixer.
pub struct Resampler {
    pub interp: Interpolator,
}

impl Resampler {
    pub fn new(interp: Interpolator) -> Self {
        Resampler { interp }
    }

    fn get_sample(&self, sample: &Sample, cursor: &Cursor) -> f32 {
        match self.interp {
            Interpolator::Nearest => sample.get(cursor.pos),
            Interpolator::Linear  => {
                let l1 = sample.get(cursor.pos.floor());
                let l2 = sample.get(cursor.pos.floor() + 1.0);
                let frac = cursor.pos.fract() as f32;
                l1 + frac * (l2 - l1)
            }
        }
    }
}

impl Mixer for Resampler {
    fn mix(&mut self, req: &RenderRequest, out: &mut MixBuffer) {
        if req.volume.is_silent() || req.sampler_add <= 0.0 {
            return
        }

        let mut cursor = req.cursor;
        for frame in out.frames.iter_mut().take(req.samples) {
            if cursor.ended {
                break
            }
            let smp = self.get_sample(req.sample, &cursor);
            frame[0] += smp * req.volume.left;
            frame[1] += smp * req.volume.right;
            req.sample.advance(&mut cursor, req.sampler_add, req.released);
        }
    }
}
