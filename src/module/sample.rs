
#[derive(Clone, Debug)]
pub enum SampleData {
    Empty,
    Sample8(Vec<i8>),
    Sample16(Vec<i16>),
}

/// Playback position inside a sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cursor {
    pub pos    : f64,
    pub reverse: bool,
    pub ended  : bool,
}

impl Cursor {
    pub fn new(pos: f64) -> Self {
        Cursor { pos, reverse: false, ended: false }
    }
}

#[derive(Clone, Debug)]
pub struct Sample {
    pub name       : String,
    pub loop_start : usize,
    pub loop_end   : usize,
    pub sloop_start: usize,
    pub sloop_end  : usize,
    pub has_loop   : bool,
    pub has_sloop  : bool,
    pub loop_bidir : bool,
    pub sloop_bidir: bool,
    data           : SampleData,
}

impl Sample {
    pub fn new() -> Sample {
        Sample {
            name       : "".to_owned(),
            loop_start : 0,
            loop_end   : 0,
            sloop_start: 0,
            sloop_end  : 0,
            has_loop   : false,
            has_sloop  : false,
            loop_bidir : false,
            sloop_bidir: false,
            data       : SampleData::Empty,
        }
    }

    pub fn from_i8(data: Vec<i8>) -> Sample {
        let mut smp = Sample::new();
        smp.data = SampleData::Sample8(data);
        smp
    }

    pub fn from_i16(data: Vec<i16>) -> Sample {
        let mut smp = Sample::new();
        smp.data = SampleData::Sample16(data);
        smp
    }

    pub fn with_loop(mut self, start: usize, end: usize, bidir: bool) -> Self {
        self.has_loop = true;
        self.loop_start = start;
        self.loop_end = end;
        self.loop_bidir = bidir;
        self
    }

    pub fn with_sustain_loop(mut self, start: usize, end: usize, bidir: bool) -> Self {
        self.has_sloop = true;
        self.sloop_start = start;
        self.sloop_end = end;
        self.sloop_bidir = bidir;
        self
    }

    pub fn data(&self) -> &SampleData {
        &self.data
    }

    pub fn len(&self) -> usize {
        match &self.data {
            SampleData::Empty       => 0,
            SampleData::Sample8(d)  => d.len(),
            SampleData::Sample16(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample value at `pos`, normalized to -1.0..1.0. Positions past the
    /// end read as silence.
    pub fn get(&self, pos: f64) -> f32 {
        if pos < 0.0 {
            return 0.0
        }
        let i = pos as usize;
        match &self.data {
            SampleData::Empty       => 0.0,
            SampleData::Sample8(d)  => d.get(i).map_or(0.0, |&v| v as f32 / 128.0),
            SampleData::Sample16(d) => d.get(i).map_or(0.0, |&v| v as f32 / 32768.0),
        }
    }

    // (start, end, bidir) of the loop in effect, clipped to the data
    fn active_loop(&self, released: bool) -> Option<(f64, f64, bool)> {
        let (start, end, bidir) = if self.has_sloop && !released {
            (self.sloop_start, self.sloop_end, self.sloop_bidir)
        } else if self.has_loop {
            (self.loop_start, self.loop_end, self.loop_bidir)
        } else {
            return None
        };
        let end = end.min(self.len());
        if start >= end {
            return None
        }
        Some((start as f64, end as f64, bidir))
    }

    /// Move the cursor by `delta` sample frames. The sustain loop holds until
    /// the note is released, then the regular loop applies.
    pub fn advance(&self, cursor: &mut Cursor, delta: f64, released: bool) {
        if cursor.ended {
            return
        }

        if cursor.reverse {
            cursor.pos -= delta;
        } else {
            cursor.pos += delta;
        }

        let (start, end, bidir) = match self.active_loop(released) {
            Some(l) => l,
            None    => {
                cursor.reverse = false;
                if cursor.pos >= self.len() as f64 {
                    cursor.pos = self.len() as f64;
                    cursor.ended = true;
                }
                return
            }
        };

        let outside = if cursor.reverse { cursor.pos < start } else { cursor.pos >= end };
        if !outside {
            return
        }

        let size = end - start;
        if !bidir {
            cursor.reverse = false;
            cursor.pos = start + (cursor.pos - start).rem_euclid(size);
            return
        }

        // unfold the ping-pong path to [0, 2*size)
        let u = if cursor.reverse {
            size + (end - cursor.pos)
        } else {
            cursor.pos - start
        };
        let u = u.rem_euclid(2.0 * size);
        if u < size {
            cursor.pos = start + u;
            cursor.reverse = false;
        } else {
            cursor.pos = end - (u - size);
            cursor.reverse = true;
        }
    }
}
