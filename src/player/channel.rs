use std::mem;
use tracing::trace;
use crate::mixer::{RenderRequest, VolumeMatrix};
use crate::module::event::VOLUME_USE_INSTRUMENT;
use crate::module::sample::Cursor;
use crate::module::{ChannelCommand, ChannelSetting, Instrument, NewNoteAction, Note, SongData};
use crate::period::{self, Period, Semitone};
use crate::{DEFAULT_C2SPD, MAX_PAN, MAX_VOLUME};
use super::ops::{NoteOp, Operation, VolumeOp};
use super::virt::Virtual;

pub const FADE_MAX: u32 = 1024;


/// A sample being played.
#[derive(Clone, Debug)]
pub struct Voice<'a> {
    pub instrument: &'a Instrument,
    pub cursor    : Cursor,
    pub period    : Period,
    pub volume    : f32,
    pub pan       : u8,
    pub surround  : bool,
    pub released  : bool,
    pub fading    : bool,
    pub fade      : u32,
}

impl<'a> Voice<'a> {
    pub fn new(instrument: &'a Instrument, pos: usize, period: Period) -> Self {
        let mut cursor = Cursor::new(pos as f64);
        if pos >= instrument.sample.len() {
            cursor.ended = true;
        }
        Voice {
            instrument,
            cursor,
            period,
            volume  : 0.0,
            pan     : 0,
            surround: false,
            released: false,
            fading  : false,
            fade    : FADE_MAX,
        }
    }

    /// Key off. Leaves the sustain loop and starts the fadeout if the
    /// instrument has one.
    pub fn release(&mut self) {
        self.released = true;
        if self.instrument.fadeout > 0 {
            self.fading = true;
        }
    }

    pub fn fade_out(&mut self) {
        self.fading = true;
    }

    pub fn update_fade(&mut self) {
        if self.fading {
            self.fade = self.fade.saturating_sub(self.instrument.fadeout as u32);
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cursor.ended && self.fade > 0 && self.period.is_playing()
    }

    pub fn gain(&self) -> f32 {
        self.volume * self.fade as f32 / FADE_MAX as f32
    }

    /// Build the render request for this tick and move the cursor past it.
    pub fn request(&mut self, channel: usize, past: bool, rate: u32, samples: usize, output: usize) -> RenderRequest<'a> {
        let sampler_add = self.period.sampler_add(rate);
        let ins: &'a Instrument = self.instrument;
        let sample = &ins.sample;
        let req = RenderRequest {
            channel,
            past,
            sample,
            cursor  : self.cursor,
            released: self.released,
            sampler_add,
            samples,
            volume  : VolumeMatrix::new(self.gain(), self.pan, self.surround),
            output,
        };
        sample.advance(&mut self.cursor, sampler_add * samples as f64, self.released);
        req
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteAction {
    Retrigger,
    Release,
    Cut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StagedVolume {
    Set(u8),
    Instrument,
}

/// Row intake results waiting for the trigger tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Staged {
    pub pending : bool,
    pub semitone: Option<Semitone>,
    pub volume  : Option<StagedVolume>,
    pub action  : Option<NoteAction>,
}


/// Live playback state of one channel.
#[derive(Debug)]
pub struct ChannelState<'a> {
    pub num              : usize,
    pub enabled          : bool,
    pub linear           : bool,
    pub output           : usize,
    pub active_period    : Period,
    pub target_period    : Period,
    pub active_instrument: Option<&'a Instrument>,
    pub target_instrument: Option<&'a Instrument>,
    pub active_volume    : u8,
    pub global_volume    : u8,
    pub channel_volume   : u8,
    pub pan              : u8,
    pub surround         : bool,
    pub sample_position  : usize,
    pub stored_semitone  : Semitone,
    pub retrigger_count  : u8,
    pub new_note_action  : NewNoteAction,
    pub nna_override     : Option<NewNoteAction>,
    pub use_target_period: bool,
    pub note_play_tick   : usize,
    pub c2spd_override   : Option<u32>,
    pub frozen           : bool,
    pub glissando        : bool,
    pub filter_env       : u8,

    // per-tick modulation
    pub period_delta     : i32,
    pub arpeggio         : i32,
    pub volume_delta     : i32,
    pub pan_delta        : i32,

    pub staged           : Staged,
    pub voice            : Option<Voice<'a>>,
    ops                  : Vec<Operation>,
}

impl<'a> ChannelState<'a> {
    pub fn new(num: usize, setting: &ChannelSetting, linear: bool) -> Self {
        ChannelState {
            num,
            enabled          : setting.enabled,
            linear,
            output           : setting.output,
            active_period    : Period::zero(linear),
            target_period    : Period::zero(linear),
            active_instrument: None,
            target_instrument: None,
            active_volume    : 0,
            global_volume    : MAX_VOLUME,
            channel_volume   : setting.volume.min(MAX_VOLUME),
            pan              : setting.pan.min(MAX_PAN),
            surround         : setting.surround,
            sample_position  : 0,
            stored_semitone  : Semitone::UNCHANGED,
            retrigger_count  : 0,
            new_note_action  : NewNoteAction::Cut,
            nna_override     : None,
            use_target_period: true,
            note_play_tick   : 0,
            c2spd_override   : None,
            frozen           : false,
            glissando        : false,
            filter_env       : 127,
            period_delta     : 0,
            arpeggio         : 0,
            volume_delta     : 0,
            pan_delta        : 0,
            staged           : Staged::default(),
            voice            : None,
            ops              : Vec::new(),
        }
    }

    /// Read a freshly entered row's note, instrument and volume fields.
    /// Nothing is applied until the trigger tick.
    pub fn intake(&mut self, cmd: &ChannelCommand, song: &'a dyn SongData) {
        if !cmd.has_note() && !cmd.has_instrument() && !cmd.has_volume() {
            return
        }

        let mut staged = Staged { pending: true, ..Default::default() };
        let mut note = cmd.note();
        let mut new_instrument = false;

        if cmd.has_instrument() || cmd.has_note() {
            self.sample_position = 0;
        }

        if cmd.has_instrument() {
            let id = cmd.instrument_id(self.stored_semitone);
            if !id.is_empty() {
                match song.instrument(&id) {
                    Some((ins, semitone)) => {
                        self.target_instrument = Some(ins);
                        note = note.coalesce(semitone);
                        new_instrument = true;
                    }
                    None => {
                        trace!("channel {}: unknown instrument {}", self.num, id.num);
                        self.target_instrument = None;
                    }
                }
            }
        }

        if let Note::Normal(s) = note {
            if s.0 > Semitone::MAX {
                trace!("channel {}: note {} out of range", self.num, s.0);
                note = Note::Invalid;
            }
        }

        match note {
            Note::Invalid       => {
                self.target_period = Period::zero(self.linear);
                staged.action = Some(NoteAction::Cut);
            }
            Note::Release       => staged.action = Some(NoteAction::Release),
            Note::Stop          => staged.action = Some(NoteAction::Cut),
            Note::StopOrRelease => {
                let fades = self.target_instrument.map_or(false, |ins| ins.fadeout > 0);
                staged.action = Some(if fades { NoteAction::Release } else { NoteAction::Cut });
            }
            Note::Empty         => {
                if new_instrument {
                    staged.volume = Some(StagedVolume::Instrument);
                }
            }
            Note::Normal(s)     => {
                self.stored_semitone = s;
                staged.semitone = Some(s);
                staged.action = Some(NoteAction::Retrigger);
                if new_instrument {
                    staged.volume = Some(StagedVolume::Instrument);
                }
            }
        }

        if cmd.has_volume() {
            match cmd.volume() {
                VOLUME_USE_INSTRUMENT => staged.volume = Some(StagedVolume::Instrument),
                v if v <= MAX_VOLUME  => staged.volume = Some(StagedVolume::Set(v)),
                v                     => trace!("channel {}: ignoring volume {}", self.num, v),
            }
        }

        self.staged = staged;
    }

    /// Per-row reset run before the effects' start.
    pub fn begin_row(&mut self) {
        self.note_play_tick = 0;
        self.retrigger_count = 0;
        self.frozen = false;
        self.use_target_period = true;
        self.glissando = false;
    }

    pub fn reset_modulation(&mut self) {
        self.period_delta = 0;
        self.arpeggio = 0;
        self.volume_delta = 0;
        self.pan_delta = 0;
    }

    pub fn queue<T: Into<Operation>>(&mut self, op: T) {
        self.ops.push(op.into());
    }

    pub fn pending_ops(&self) -> usize {
        self.ops.len()
    }

    /// Apply staged intake results. Returns true if a new voice started.
    pub fn trigger(&mut self, past: &mut Virtual<'a>) -> bool {
        let staged = mem::take(&mut self.staged);
        if !staged.pending {
            return false
        }

        match staged.volume {
            Some(StagedVolume::Set(v))    => self.queue(VolumeOp::Set(v)),
            Some(StagedVolume::Instrument) => self.queue(VolumeOp::InstrumentDefault),
            None                          => (),
        }

        if let Some(s) = staged.semitone {
            self.queue(NoteOp::CalcPeriod(s));
        }

        match staged.action {
            Some(NoteAction::Retrigger) => self.queue(NoteOp::Attack),
            Some(NoteAction::Release)   => self.queue(NoteOp::Release),
            Some(NoteAction::Cut)       => self.queue(NoteOp::Cut),
            None                        => (),
        }

        self.drain(past)
    }

    /// Run queued operations in order. Returns true if a new voice started.
    pub fn drain(&mut self, past: &mut Virtual<'a>) -> bool {
        let mut attacked = false;
        let ops = mem::take(&mut self.ops);
        for op in ops {
            match op {
                Operation::Note(op)   => attacked |= self.apply_note(op, past),
                Operation::Volume(op) => self.apply_volume(op),
            }
        }
        attacked
    }

    fn apply_note(&mut self, op: NoteOp, past: &mut Virtual<'a>) -> bool {
        match op {
            NoteOp::CalcPeriod(s) => {
                let (c2spd, finetune) = match self.target_instrument {
                    Some(ins) => (ins.c2spd, ins.finetune),
                    None      => (DEFAULT_C2SPD, 0),
                };
                let c2spd = self.c2spd_override.unwrap_or(c2spd);
                self.target_period = period::calc_semitone_period(s, finetune, c2spd, self.linear)
                    .unwrap_or_else(|| Period::zero(self.linear));
            }
            NoteOp::Attack        => return self.attack(past),
            NoteOp::Release       => {
                if let Some(v) = self.voice.as_mut() {
                    v.release();
                }
            }
            NoteOp::Cut           => self.voice = None,
            NoteOp::SetOffset(ofs) => self.sample_position = ofs,
            NoteOp::Retrigger     => {
                let pos = self.sample_position;
                if let Some(v) = self.voice.as_mut() {
                    *v = Voice::new(v.instrument, pos, v.period);
                }
            }
        }
        false
    }

    fn apply_volume(&mut self, op: VolumeOp) {
        match op {
            VolumeOp::Set(v)            => self.active_volume = v.min(MAX_VOLUME),
            VolumeOp::InstrumentDefault => {
                if let Some(ins) = self.target_instrument {
                    self.active_volume = ins.volume.min(MAX_VOLUME);
                }
            }
            VolumeOp::Retrig(r)         => self.active_volume = r.apply(self.active_volume),
            VolumeOp::NoteCut           => {
                self.active_volume = 0;
                self.frozen = true;
            }
        }
    }

    // New-Note-Action arbitration, then a fresh voice.
    fn attack(&mut self, past: &mut Virtual<'a>) -> bool {
        if let Some(mut old) = self.voice.take() {
            if old.is_active() {
                match self.new_note_action {
                    NewNoteAction::Cut      => (),
                    NewNoteAction::Continue => past.push(self.num, old),
                    NewNoteAction::Release  => {
                        old.release();
                        past.push(self.num, old);
                    }
                    NewNoteAction::Fadeout  => {
                        old.fade_out();
                        past.push(self.num, old);
                    }
                }
            }
        }

        let ins = match self.target_instrument {
            Some(ins) => ins,
            None      => {
                self.active_instrument = None;
                return false
            }
        };

        self.active_instrument = Some(ins);
        self.global_volume = ins.global_volume.min(MAX_VOLUME);
        if let Some(pan) = ins.pan {
            self.pan = pan.min(MAX_PAN);
        }
        self.new_note_action = self.nna_override.take().unwrap_or(ins.nna);

        if self.use_target_period {
            self.active_period = self.target_period;
        }
        if !self.active_period.is_playing() {
            return false
        }

        self.voice = Some(Voice::new(ins, self.sample_position, self.active_period));
        true
    }

    /// Period sent to the mixer: arpeggio, glissando and vibrato on top of
    /// the active period.
    pub fn output_period(&self) -> Period {
        let mut p = self.active_period;
        if self.glissando {
            p = p.round_to_semitone();
        }
        if self.arpeggio != 0 {
            p = p.add_semitones(self.arpeggio);
        }
        if self.period_delta != 0 {
            p = p.porta_down(self.period_delta);
        }
        p
    }

    pub fn output_volume(&self, song_volume: u8) -> f32 {
        let max = MAX_VOLUME as f32;
        let vol = (self.active_volume as i32 + self.volume_delta).max(0).min(MAX_VOLUME as i32) as f32;
        vol / max
            * self.channel_volume as f32 / max
            * self.global_volume as f32 / max
            * song_volume.min(MAX_VOLUME) as f32 / max
    }

    pub fn output_pan(&self) -> u8 {
        (self.pan as i32 + self.pan_delta).max(0).min(MAX_PAN as i32) as u8
    }

    /// Render request for the channel's own voice, if it is sounding.
    pub fn render(&mut self, song_volume: u8, rate: u32, samples: usize) -> Option<RenderRequest<'a>> {
        if self.frozen {
            return None
        }

        let period = self.output_period();
        let volume = self.output_volume(song_volume);
        let pan = self.output_pan();
        let surround = self.surround;

        let active = {
            let v = self.voice.as_mut()?;
            v.period = period;
            v.volume = volume;
            v.pan = pan;
            v.surround = surround;
            v.update_fade();
            v.is_active()
        };

        if !active {
            self.voice = None;
            return None
        }

        let (num, output) = (self.num, self.output);
        self.voice.as_mut().map(|v| v.request(num, false, rate, samples, output))
    }
}
