use tracing::trace;
use crate::module::{ChannelCommand, NewNoteAction, SongFlags};
use super::channel::ChannelState;
use super::memory::{Family, Memory};
use super::transaction::Transaction;
use super::virt::Virtual;

pub mod tables;
mod pitch;
mod special;
mod volume;

use self::tables::{classify_slide, Slide};

// Effect letters as stored in the command byte, A = 1.
pub const FX_SPEED         : u8 = 0x01;  // A
pub const FX_JUMP          : u8 = 0x02;  // B
pub const FX_BREAK         : u8 = 0x03;  // C
pub const FX_VOLSLIDE      : u8 = 0x04;  // D
pub const FX_PORTA_DN      : u8 = 0x05;  // E
pub const FX_PORTA_UP      : u8 = 0x06;  // F
pub const FX_TONEPORTA     : u8 = 0x07;  // G
pub const FX_VIBRATO       : u8 = 0x08;  // H
pub const FX_TREMOR        : u8 = 0x09;  // I
pub const FX_ARPEGGIO      : u8 = 0x0a;  // J
pub const FX_VIBRA_VSLIDE  : u8 = 0x0b;  // K
pub const FX_TONE_VSLIDE   : u8 = 0x0c;  // L
pub const FX_CHANVOL       : u8 = 0x0d;  // M
pub const FX_CHANVOL_SLIDE : u8 = 0x0e;  // N
pub const FX_OFFSET        : u8 = 0x0f;  // O
pub const FX_PANSLIDE      : u8 = 0x10;  // P
pub const FX_RETRIG        : u8 = 0x11;  // Q
pub const FX_TREMOLO       : u8 = 0x12;  // R
pub const FX_SPECIAL       : u8 = 0x13;  // S
pub const FX_TEMPO         : u8 = 0x14;  // T
pub const FX_FINE_VIBRATO  : u8 = 0x15;  // U
pub const FX_GLOBALVOL     : u8 = 0x16;  // V
pub const FX_GVOL_SLIDE    : u8 = 0x17;  // W
pub const FX_SETPAN        : u8 = 0x18;  // X
pub const FX_PANBRELLO     : u8 = 0x19;  // Y
pub const FX_FILTER        : u8 = 0x1a;  // Z

const VIBRATO_SHIFT     : u8 = 5;
const FINE_VIBRATO_SHIFT: u8 = 7;


/// Portamento amount as encoded in Exx/Fxx.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Porta {
    Normal(u8),
    Fine(u8),
    ExtraFine(u8),
}

impl Porta {
    fn from_param(p: u8) -> Self {
        match p >> 4 {
            0x0f => Porta::Fine(p & 0x0f),
            0x0e => Porta::ExtraFine(p & 0x0f),
            _    => Porta::Normal(p),
        }
    }
}

/// Sxy subcommands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extended {
    Glissando(bool),
    Finetune(u8),
    VibratoWaveform(u8),
    TremoloWaveform(u8),
    PanbrelloWaveform(u8),
    FinePatternDelay(u8),
    PastCut,
    PastRelease,
    PastFade,
    NoteAction(NewNoteAction),
    Pan(u8),
    Surround(bool),
    HighOffset(u8),
    PatternLoop(u8),
    NoteCut(u8),
    NoteDelay(u8),
    PatternDelay(u8),
    Ignored,
}

impl Extended {
    fn from_param(p: u8) -> Self {
        let x = p & 0x0f;
        match p >> 4 {
            0x1 => Extended::Glissando(x != 0),
            0x2 => Extended::Finetune(x),
            0x3 => Extended::VibratoWaveform(x),
            0x4 => Extended::TremoloWaveform(x),
            0x5 => Extended::PanbrelloWaveform(x),
            0x6 => Extended::FinePatternDelay(x),
            0x7 => match x {
                0 => Extended::PastCut,
                1 => Extended::PastRelease,
                2 => Extended::PastFade,
                3 => Extended::NoteAction(NewNoteAction::Cut),
                4 => Extended::NoteAction(NewNoteAction::Continue),
                5 => Extended::NoteAction(NewNoteAction::Release),
                6 => Extended::NoteAction(NewNoteAction::Fadeout),
                _ => Extended::Ignored,  // envelope switches
            },
            0x8 => Extended::Pan(x),
            0x9 => Extended::Surround(x == 1),
            0xa => Extended::HighOffset(x),
            0xb => Extended::PatternLoop(x),
            0xc => Extended::NoteCut(x),
            0xd => Extended::NoteDelay(x),
            0xe => Extended::PatternDelay(x),
            _   => Extended::Ignored,
        }
    }
}


/// A row's effect on one channel. Parameters are resolved against the
/// channel memory when the effect is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    SetSpeed(u8),
    OrderJump(u8),
    PatternBreak(u8),
    VolumeSlide(Slide),
    PortaDown(Porta),
    PortaUp(Porta),
    TonePorta(u8),
    Vibrato { speed: u8, depth: u8, shift: u8 },
    Tremor(u8, u8),
    Arpeggio(u8, u8),
    VibratoVolumeSlide { speed: u8, depth: u8, slide: Slide },
    TonePortaVolumeSlide(u8, Slide),
    ChannelVolume(u8),
    ChannelVolumeSlide(Slide),
    SampleOffset(usize),
    PanSlide(Slide),
    Retrigger(u8, u8),
    Tremolo(u8, u8),
    Special(Extended),
    Tempo(u8),
    TempoSlide(i32),
    GlobalVolume(u8),
    GlobalVolumeSlide(Slide),
    SetPan(u8),
    Panbrello(u8, u8),
    Filter(u8),
}

/// Everything an effect may touch while it runs.
pub struct EffectContext<'c, 'a> {
    pub channel      : &'c mut ChannelState<'a>,
    pub memory       : &'c mut Memory,
    pub txn          : &'c mut Transaction,
    pub past         : &'c mut Virtual<'a>,
    pub global_volume: &'c mut u8,
    pub flags        : SongFlags,
    pub row          : usize,
    pub tick         : usize,
    pub ticks        : usize,
    pub delay_repeat : bool,
}

impl Effect {
    /// Decode the effect column of `cmd`. A zero parameter reuses the
    /// channel's last nonzero one for the same effect family.
    pub fn new(memory: &mut Memory, cmd: Option<&ChannelCommand>) -> Self {
        let cmd = try_option!(cmd.filter(|c| c.has_command()), Effect::None);
        let (fx, param) = cmd.command();

        match fx {
            FX_SPEED         => Effect::SetSpeed(param),
            FX_JUMP          => Effect::OrderJump(param),
            FX_BREAK         => Effect::PatternBreak((param >> 4) * 10 + (param & 0x0f)),
            FX_VOLSLIDE      => Effect::VolumeSlide(classify_slide(memory.memorize(Family::VolumeSlide, param))),
            FX_PORTA_DN      => Effect::PortaDown(Porta::from_param(memory.memorize(Family::Porta, param))),
            FX_PORTA_UP      => Effect::PortaUp(Porta::from_param(memory.memorize(Family::Porta, param))),
            FX_TONEPORTA     => Effect::TonePorta(memory.memorize(Family::TonePorta, param)),
            FX_VIBRATO       => {
                let p = memory.memorize_nibbles(Family::Vibrato, param);
                Effect::Vibrato { speed: p >> 4, depth: p & 0x0f, shift: VIBRATO_SHIFT }
            }
            FX_FINE_VIBRATO  => {
                let p = memory.memorize_nibbles(Family::Vibrato, param);
                Effect::Vibrato { speed: p >> 4, depth: p & 0x0f, shift: FINE_VIBRATO_SHIFT }
            }
            FX_TREMOR        => {
                let p = memory.memorize(Family::Tremor, param);
                Effect::Tremor(p >> 4, p & 0x0f)
            }
            FX_ARPEGGIO      => {
                let p = memory.memorize(Family::Arpeggio, param);
                Effect::Arpeggio(p >> 4, p & 0x0f)
            }
            FX_VIBRA_VSLIDE  => {
                let v = memory.last(Family::Vibrato);
                let slide = classify_slide(memory.memorize(Family::VolumeSlide, param));
                Effect::VibratoVolumeSlide { speed: v >> 4, depth: v & 0x0f, slide }
            }
            FX_TONE_VSLIDE   => {
                let speed = memory.last(Family::TonePorta);
                Effect::TonePortaVolumeSlide(speed, classify_slide(memory.memorize(Family::VolumeSlide, param)))
            }
            FX_CHANVOL       => Effect::ChannelVolume(param),
            FX_CHANVOL_SLIDE => Effect::ChannelVolumeSlide(classify_slide(memory.memorize(Family::ChannelVolumeSlide, param))),
            FX_OFFSET        => {
                let p = memory.memorize(Family::SampleOffset, param) as usize;
                Effect::SampleOffset((memory.high_offset as usize) << 16 | p << 8)
            }
            FX_PANSLIDE      => Effect::PanSlide(classify_slide(memory.memorize(Family::PanSlide, param))),
            FX_RETRIG        => {
                let p = memory.memorize(Family::Retrigger, param);
                Effect::Retrigger(p >> 4, p & 0x0f)
            }
            FX_TREMOLO       => {
                let p = memory.memorize_nibbles(Family::Tremolo, param);
                Effect::Tremolo(p >> 4, p & 0x0f)
            }
            FX_SPECIAL       => Effect::Special(Extended::from_param(memory.memorize(Family::Extended, param))),
            FX_TEMPO         => {
                if param >= 0x20 {
                    return Effect::Tempo(param)
                }
                let p = memory.memorize(Family::TempoSlide, param);
                match p >> 4 {
                    0 => Effect::TempoSlide(-((p & 0x0f) as i32)),
                    1 => Effect::TempoSlide((p & 0x0f) as i32),
                    _ => Effect::None,
                }
            }
            FX_GLOBALVOL     => Effect::GlobalVolume(param),
            FX_GVOL_SLIDE    => Effect::GlobalVolumeSlide(classify_slide(memory.memorize(Family::GlobalVolumeSlide, param))),
            FX_SETPAN        => Effect::SetPan(param),
            FX_PANBRELLO     => {
                let p = memory.memorize_nibbles(Family::Panbrello, param);
                Effect::Panbrello(p >> 4, p & 0x0f)
            }
            FX_FILTER        => if param < 0x80 { Effect::Filter(param) } else { Effect::None },
            _                => {
                trace!("ignoring effect {:02x} {:02x}", fx, param);
                Effect::None
            }
        }
    }

    /// Row-level changes that must be in place before the row is read:
    /// speed, tempo, global volume and fine pattern delay.
    pub fn pre_start(&self, ctx: &mut EffectContext) {
        match *self {
            Effect::SetSpeed(v) if v > 0    => ctx.txn.set_ticks(v),
            Effect::Tempo(t)                => ctx.txn.set_tempo(t),
            Effect::GlobalVolume(v) if v <= crate::MAX_VOLUME => ctx.txn.set_global_volume(v),
            Effect::GlobalVolume(v)         => trace!("channel {}: ignoring global volume {}", ctx.channel.num, v),
            Effect::Special(Extended::FinePatternDelay(x)) => ctx.txn.add_fine_delay(x),
            _ => (),
        }
    }

    /// First tick of the row, before the staged note is triggered.
    pub fn start(&self, ctx: &mut EffectContext) {
        ctx.channel.begin_row();

        match *self {
            Effect::OrderJump(o)                => ctx.txn.set_next_order(o as usize),
            Effect::PatternBreak(r)             => ctx.txn.set_next_row(r as usize),
            Effect::TonePorta(_) |
            Effect::TonePortaVolumeSlide(..)    => pitch::tone_porta_start(ctx),
            Effect::ChannelVolume(v)            => volume::set_channel_volume(ctx, v),
            Effect::SampleOffset(ofs)           => ctx.channel.queue(super::ops::NoteOp::SetOffset(ofs)),
            Effect::SetPan(x)                   => volume::set_pan(ctx, x),
            Effect::Special(e)                  => special::start(ctx, e),
            Effect::Filter(v)                   => ctx.channel.filter_env = v,
            _ => (),
        }
    }

    /// Every tick of the row, tick 0 included.
    pub fn tick(&self, ctx: &mut EffectContext) {
        match *self {
            Effect::VolumeSlide(s)              => volume::volume_slide(ctx, s),
            Effect::PortaDown(p)                => pitch::porta(ctx, p, false),
            Effect::PortaUp(p)                  => pitch::porta(ctx, p, true),
            Effect::TonePorta(speed)            => pitch::tone_porta(ctx, speed),
            Effect::Vibrato { speed, depth, shift } => pitch::vibrato(ctx, speed, depth, shift),
            Effect::Tremor(on, off)             => volume::tremor(ctx, on, off),
            Effect::Arpeggio(x, y)              => pitch::arpeggio(ctx, x, y),
            Effect::VibratoVolumeSlide { speed, depth, slide } => {
                pitch::vibrato(ctx, speed, depth, VIBRATO_SHIFT);
                volume::volume_slide(ctx, slide);
            }
            Effect::TonePortaVolumeSlide(speed, slide) => {
                pitch::tone_porta(ctx, speed);
                volume::volume_slide(ctx, slide);
            }
            Effect::ChannelVolumeSlide(s)       => volume::channel_volume_slide(ctx, s),
            Effect::PanSlide(s)                 => volume::pan_slide(ctx, s),
            Effect::Retrigger(v, interval)      => volume::retrigger(ctx, v, interval),
            Effect::Tremolo(speed, depth)       => volume::tremolo(ctx, speed, depth),
            Effect::Special(e)                  => special::tick(ctx, e),
            Effect::TempoSlide(d)               => if ctx.tick > 0 { ctx.txn.add_tempo_delta(d) },
            Effect::GlobalVolumeSlide(s)        => volume::global_volume_slide(ctx, s),
            Effect::Panbrello(speed, depth)     => volume::panbrello(ctx, speed, depth),
            _ => (),
        }
    }

    /// Last tick of the row, after `tick`.
    pub fn stop(&self, ctx: &mut EffectContext) {
        if let Effect::Special(e) = *self {
            special::stop(ctx, e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ChannelSetting, Instrument, Module, Note, Sample};
    use crate::period::{Comparison, Semitone};
    use crate::player::transaction::Phase;

    pub(super) struct Harness<'a> {
        pub channel: ChannelState<'a>,
        pub memory : Memory,
        pub txn    : Transaction,
        pub past   : Virtual<'a>,
        pub gvol   : u8,
        pub flags  : SongFlags,
        pub row    : usize,
        pub ticks  : usize,
    }

    impl<'a> Harness<'a> {
        pub fn new() -> Self {
            Harness {
                channel: ChannelState::new(0, &ChannelSetting::new(), false),
                memory : Memory::new(0, false),
                txn    : Transaction::new(Phase::Row),
                past   : Virtual::new(1, 4),
                gvol   : 64,
                flags  : SongFlags::default(),
                row    : 0,
                ticks  : 6,
            }
        }

        pub fn run<F: FnOnce(&mut EffectContext<'_, 'a>)>(&mut self, tick: usize, f: F) {
            let mut ctx = EffectContext {
                channel      : &mut self.channel,
                memory       : &mut self.memory,
                txn          : &mut self.txn,
                past         : &mut self.past,
                global_volume: &mut self.gvol,
                flags        : self.flags,
                row          : self.row,
                tick,
                ticks        : self.ticks,
                delay_repeat : false,
            };
            f(&mut ctx);
        }

        /// Play a whole row of `fx` the way the player does.
        pub fn play_row(&mut self, fx: Effect, ticks: usize) {
            self.ticks = ticks;
            self.run(0, |ctx| { fx.pre_start(ctx); fx.start(ctx); });
            for t in 0..ticks {
                self.run(t, |ctx| {
                    ctx.channel.reset_modulation();
                    if t == ctx.channel.note_play_tick {
                        ctx.channel.trigger(ctx.past);
                    }
                    fx.tick(ctx);
                    ctx.channel.drain(ctx.past);
                    if t == ticks - 1 {
                        fx.stop(ctx);
                    }
                });
            }
        }
    }

    fn cmd(fx: u8, param: u8) -> ChannelCommand {
        ChannelCommand::new().with_command(fx, param)
    }

    fn song() -> Module {
        let mut m = Module::new(1);
        let mut ins = Instrument::new();
        ins.sample = Sample::from_i8(vec![20; 4000]).with_loop(0, 4000, false);
        m.add_instrument(ins);
        m
    }

    fn note(s: u8) -> ChannelCommand {
        ChannelCommand::new().with_note(Note::Normal(Semitone(s))).with_instrument(1)
    }

    #[test]
    fn test_empty_command() {
        let mut mem = Memory::new(0, false);
        assert_eq!(Effect::new(&mut mem, None), Effect::None);
        assert_eq!(Effect::new(&mut mem, Some(&ChannelCommand::new())), Effect::None);
        assert_eq!(Effect::new(&mut mem, Some(&cmd(0x1b, 0x10))), Effect::None);
    }

    #[test]
    fn test_memory_reuse() {
        let mut mem = Memory::new(0, false);
        // fresh channel: nothing to reuse
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_VOLSLIDE, 0))), Effect::VolumeSlide(Slide::None));
        Effect::new(&mut mem, Some(&cmd(FX_VOLSLIDE, 0x20)));
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_VOLSLIDE, 0))), Effect::VolumeSlide(Slide::Up(2)));
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_PORTA_UP, 0))), Effect::PortaUp(Porta::Normal(0)));
    }

    #[test]
    fn test_porta_shares_memory() {
        let mut mem = Memory::new(0, false);
        Effect::new(&mut mem, Some(&cmd(FX_PORTA_DN, 0xf3)));
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_PORTA_UP, 0))), Effect::PortaUp(Porta::Fine(3)));
    }

    #[test]
    fn test_decode() {
        let mut mem = Memory::new(0, false);
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_BREAK, 0x12))), Effect::PatternBreak(12));
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_TEMPO, 0x80))), Effect::Tempo(0x80));
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_TEMPO, 0x13))), Effect::TempoSlide(3));
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_TEMPO, 0x04))), Effect::TempoSlide(-4));
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_SPECIAL, 0xd2))), Effect::Special(Extended::NoteDelay(2)));
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_SPECIAL, 0x75))),
                   Effect::Special(Extended::NoteAction(NewNoteAction::Release)));
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_FILTER, 0x90))), Effect::None);
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_FINE_VIBRATO, 0x42))),
                   Effect::Vibrato { speed: 4, depth: 2, shift: FINE_VIBRATO_SHIFT });
    }

    #[test]
    fn test_sample_offset_uses_high_offset() {
        let mut mem = Memory::new(0, false);
        mem.high_offset = 1;
        assert_eq!(Effect::new(&mut mem, Some(&cmd(FX_OFFSET, 0x02))), Effect::SampleOffset(0x10200));
    }

    #[test]
    fn test_pre_start() {
        let mut h = Harness::new();
        h.txn = Transaction::new(Phase::PreRow);
        h.run(0, |ctx| {
            Effect::SetSpeed(3).pre_start(ctx);
            Effect::Tempo(150).pre_start(ctx);
            Effect::GlobalVolume(80).pre_start(ctx);
            Effect::Special(Extended::FinePatternDelay(2)).pre_start(ctx);
        });
        assert_eq!(h.txn.ticks(), Some(3));
        assert_eq!(h.txn.tempo(), Some(150));
        assert_eq!(h.txn.global_volume(), None);
        assert_eq!(h.txn.fine_delay(), 2);
    }

    #[test]
    fn test_speed_zero_ignored() {
        let mut h = Harness::new();
        h.run(0, |ctx| Effect::SetSpeed(0).pre_start(ctx));
        assert_eq!(h.txn.ticks(), None);
    }

    #[test]
    fn test_global_volume_range() {
        let mut h = Harness::new();
        h.txn = Transaction::new(Phase::PreRow);
        h.run(0, |ctx| Effect::GlobalVolume(65).pre_start(ctx));
        assert_eq!(h.txn.global_volume(), None);
        h.run(0, |ctx| Effect::GlobalVolume(64).pre_start(ctx));
        assert_eq!(h.txn.global_volume(), Some(64));
    }

    #[test]
    fn test_volume_slide() {
        let mut h = Harness::new();
        h.channel.active_volume = 10;
        h.play_row(Effect::VolumeSlide(Slide::Up(2)), 6);
        assert_eq!(h.channel.active_volume, 20);
        h.play_row(Effect::VolumeSlide(Slide::FineDown(3)), 6);
        assert_eq!(h.channel.active_volume, 17);
        h.play_row(Effect::VolumeSlide(Slide::Down(15)), 6);
        assert_eq!(h.channel.active_volume, 0);
    }

    #[test]
    fn test_fast_volume_slides() {
        let mut h = Harness::new();
        h.flags.fast_volume_slides = true;
        h.channel.active_volume = 10;
        h.play_row(Effect::VolumeSlide(Slide::Up(2)), 6);
        assert_eq!(h.channel.active_volume, 22);
    }

    #[test]
    fn test_porta() {
        let m = song();
        let mut h = Harness::new();
        h.channel.intake(&note(60), &m);
        h.play_row(Effect::None, 1);
        let base = h.channel.active_period;

        h.play_row(Effect::PortaUp(Porta::Normal(2)), 3);
        assert_eq!(h.channel.active_period, base.porta_up(16));
        h.play_row(Effect::PortaDown(Porta::Fine(2)), 3);
        assert_eq!(h.channel.active_period, base.porta_up(8));
        h.play_row(Effect::PortaDown(Porta::ExtraFine(2)), 3);
        assert_eq!(h.channel.active_period, base.porta_up(6));
    }

    #[test]
    fn test_tone_porta_reaches_target() {
        let m = song();
        let mut h = Harness::new();
        h.channel.intake(&note(60), &m);
        h.play_row(Effect::None, 1);
        let start = h.channel.active_period;

        h.channel.intake(&note(62), &m);
        h.play_row(Effect::TonePorta(1), 2);
        // no retrigger, pitch moved toward the target
        assert_eq!(h.channel.active_period.compare(&start), Comparison::LeftHigherFreq);
        assert_ne!(h.channel.active_period, h.channel.target_period);

        for _ in 0..20 {
            h.play_row(Effect::TonePorta(0xff), 6);
        }
        assert_eq!(h.channel.active_period, h.channel.target_period);
    }

    #[test]
    fn test_vibrato_leaves_base_period() {
        let m = song();
        let mut h = Harness::new();
        h.channel.intake(&note(60), &m);
        h.play_row(Effect::None, 1);
        let base = h.channel.active_period;
        h.run(1, |ctx| Effect::Vibrato { speed: 16, depth: 8, shift: VIBRATO_SHIFT }.tick(ctx));
        assert_eq!(h.memory.vibrato.pos, 16);
        h.run(2, |ctx| Effect::Vibrato { speed: 16, depth: 8, shift: VIBRATO_SHIFT }.tick(ctx));
        assert_eq!(h.channel.period_delta, 255 * 8 >> 5);
        assert_eq!(h.channel.active_period, base);
        assert_ne!(h.channel.output_period(), base);
    }

    #[test]
    fn test_arpeggio() {
        let mut h = Harness::new();
        let fx = Effect::Arpeggio(4, 7);
        let values: Vec<i32> = (0..6).map(|t| {
            h.run(t, |ctx| { ctx.channel.reset_modulation(); fx.tick(ctx) });
            h.channel.arpeggio
        }).collect();
        assert_eq!(values, vec![0, 4, 7, 0, 4, 7]);
    }

    #[test]
    fn test_tremor() {
        let mut h = Harness::new();
        let fx = Effect::Tremor(1, 0);
        let on: Vec<bool> = (0..6).map(|t| {
            h.run(t, |ctx| { ctx.channel.reset_modulation(); fx.tick(ctx) });
            h.channel.volume_delta == 0
        }).collect();
        assert_eq!(on, vec![true, true, false, true, true, false]);
    }

    #[test]
    fn test_retrigger() {
        let m = song();
        let mut h = Harness::new();
        h.channel.intake(&note(60).with_volume(32), &m);
        h.play_row(Effect::None, 1);
        if let Some(v) = h.channel.voice.as_mut() {
            v.cursor.pos = 100.0;
        }
        h.play_row(Effect::Retrigger(0x0a, 2), 6);
        assert_eq!(h.channel.active_volume, 36);
        assert_eq!(h.channel.voice.as_ref().map(|v| v.cursor.pos), Some(0.0));
    }

    #[test]
    fn test_pattern_loop() {
        let mut h = Harness::new();
        h.row = 4;
        h.run(0, |ctx| Effect::Special(Extended::PatternLoop(0)).start(ctx));
        assert_eq!(h.memory.loop_row, 4);

        h.row = 8;
        for pass in 0..3 {
            h.txn = Transaction::new(Phase::Row);
            h.run(0, |ctx| Effect::Special(Extended::PatternLoop(2)).start(ctx));
            if pass < 2 {
                assert_eq!(h.txn.loop_jump(), Some(4));
                assert!(h.memory.in_pattern_loop());
            } else {
                assert_eq!(h.txn.loop_jump(), None);
                assert!(!h.memory.in_pattern_loop());
            }
        }
    }

    #[test]
    fn test_pattern_loop_skipped_on_delay_repeat() {
        let mut h = Harness::new();
        h.run(0, |ctx| {
            ctx.delay_repeat = true;
            Effect::Special(Extended::PatternLoop(2)).start(ctx);
        });
        assert_eq!(h.txn.loop_jump(), None);
        assert_eq!(h.memory.loop_count, 0);
    }

    #[test]
    fn test_note_delay() {
        let m = song();
        let mut h = Harness::new();
        h.channel.intake(&note(60), &m);
        let fx = Effect::Special(Extended::NoteDelay(3));
        h.run(0, |ctx| fx.start(ctx));
        assert_eq!(h.channel.note_play_tick, 3);
        h.play_row(fx, 3);
        assert!(h.channel.voice.is_none());

        // a delay past the row length drops the note
        h.channel.intake(&note(60), &m);
        h.play_row(Effect::Special(Extended::NoteDelay(9)), 6);
        assert!(h.channel.voice.is_none());
        assert!(!h.channel.staged.pending);

        h.channel.intake(&note(60), &m);
        h.play_row(fx, 6);
        assert!(h.channel.voice.is_some());
    }

    #[test]
    fn test_note_cut() {
        let m = song();
        let mut h = Harness::new();
        h.channel.intake(&note(60), &m);
        h.play_row(Effect::Special(Extended::NoteCut(2)), 6);
        assert_eq!(h.channel.active_volume, 0);
        assert!(h.channel.frozen);
    }

    #[test]
    fn test_jumps_and_delay() {
        let mut h = Harness::new();
        h.run(0, |ctx| {
            Effect::PatternBreak(10).start(ctx);
            Effect::OrderJump(3).start(ctx);
            Effect::Special(Extended::PatternDelay(2)).start(ctx);
        });
        assert_eq!(h.txn.next_row(), Some(10));
        assert_eq!(h.txn.next_order(), Some(3));
        assert_eq!(h.txn.pattern_delay(), Some(2));
    }

    #[test]
    fn test_global_volume_slide() {
        let mut h = Harness::new();
        h.gvol = 60;
        h.play_row(Effect::GlobalVolumeSlide(Slide::Up(2)), 6);
        assert_eq!(h.gvol, 64);
    }

    #[test]
    fn test_tempo_slide() {
        let mut h = Harness::new();
        h.play_row(Effect::TempoSlide(-2), 4);
        assert_eq!(h.txn.tempo_delta(), -6);
    }

    #[test]
    fn test_pan() {
        let mut h = Harness::new();
        h.run(0, |ctx| Effect::SetPan(0xff).start(ctx));
        assert_eq!(h.channel.pan, 64);
        h.run(0, |ctx| Effect::Special(Extended::Pan(0)).start(ctx));
        assert_eq!(h.channel.pan, 0);
        h.run(0, |ctx| Effect::Special(Extended::Surround(true)).start(ctx));
        assert!(h.channel.surround);
        h.play_row(Effect::PanSlide(Slide::Down(4)), 3);
        assert_eq!(h.channel.pan, 8);
    }

    #[test]
    fn test_channel_volume() {
        let mut h = Harness::new();
        h.run(0, |ctx| Effect::ChannelVolume(20).start(ctx));
        assert_eq!(h.channel.channel_volume, 20);
        h.run(0, |ctx| Effect::ChannelVolume(99).start(ctx));
        assert_eq!(h.channel.channel_volume, 20);
        h.play_row(Effect::ChannelVolumeSlide(Slide::FineUp(5)), 6);
        assert_eq!(h.channel.channel_volume, 25);
    }

    #[test]
    fn test_past_voice_control() {
        let m = song();
        let mut h = Harness::new();
        h.channel.nna_override = Some(NewNoteAction::Continue);
        h.channel.intake(&note(60), &m);
        h.play_row(Effect::None, 1);
        h.channel.intake(&note(62), &m);
        h.play_row(Effect::None, 1);
        assert_eq!(h.past.count(0), 1);
        h.run(0, |ctx| Effect::Special(Extended::PastFade).start(ctx));
        assert!(h.past.voices(0)[0].fading);
        h.run(0, |ctx| Effect::Special(Extended::PastCut).start(ctx));
        assert_eq!(h.past.count(0), 0);
    }
}
