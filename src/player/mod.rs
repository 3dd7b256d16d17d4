//! Tick driver.
//!
//! `Player` owns the scheduler, one `ChannelState` and `Memory` per channel
//! and the past voices. Each call to `play_tick` plays one tick and leaves
//! the tick's render requests in `requests()`.

pub mod channel;
pub mod effect;
pub mod memory;
pub mod ops;
pub mod scan;
pub mod scheduler;
pub mod transaction;
pub mod virt;

pub use self::channel::{ChannelState, Voice};
pub use self::effect::Effect;
pub use self::scheduler::PlayerData;
pub use self::virt::Virtual;

use tracing::{debug, info, trace, warn};
use crate::mixer::{Filter, MixBuffer, Mixer, OnePole, RenderRequest};
use crate::module::{SongData, SongFlags};
use crate::{Error, MAX_CHANNELS, MAX_RATE, MIN_RATE};
use self::effect::EffectContext;
use self::memory::Memory;
use self::scan::ScanData;
use self::scheduler::Scheduler;
use self::transaction::{Phase, Transaction};


/// Playback configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub rate           : u32,          // output sampling rate
    pub song_loop      : bool,         // restart instead of ending
    pub max_past_voices: usize,        // per channel
    pub linear         : Option<bool>, // override the song's period model
}

impl Default for Options {
    fn default() -> Self {
        Options {
            rate           : 44100,
            song_loop      : false,
            max_past_voices: 8,
            linear         : None,
        }
    }
}


/// Position and timing of the tick just played.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameInfo {
    pub pos          : usize,
    pub row          : usize,
    pub frame        : usize,
    pub speed        : u8,
    pub tempo        : u8,
    pub global_volume: u8,
    pub loop_count   : usize,
    pub samples      : usize,   // output samples in this tick
}

impl FrameInfo {
    pub fn new() -> Self {
        Default::default()
    }
}


#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Tick(FrameInfo),
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowState {
    NeedNewRow,
    ProcessingTicks,
}


/// Output samples in one tick at `rate` and `tempo` (BPM).
pub fn samples_per_tick(rate: u32, tempo: u8) -> usize {
    if tempo == 0 {
        return 0
    }
    (rate as usize * 5) / (2 * tempo as usize)
}


pub struct Player<'a> {
    song     : &'a dyn SongData,
    options  : Options,
    flags    : SongFlags,
    scheduler: Scheduler,
    channels : Vec<ChannelState<'a>>,
    memory   : Vec<Memory>,
    effects  : Vec<Effect>,
    virt     : Virtual<'a>,
    filters  : Vec<Box<dyn Filter>>,
    scan     : ScanData,
    row_txn  : Option<Transaction>,
    state    : RowState,
    tick     : usize,
    requests : Vec<RenderRequest<'a>>,
    info     : FrameInfo,
}

impl<'a> Player<'a> {
    pub fn new(song: &'a dyn SongData, mut options: Options) -> Result<Self, Error> {
        options.rate = options.rate.max(MIN_RATE).min(MAX_RATE);

        let flags = song.flags();
        let linear = options.linear.unwrap_or(flags.linear_periods);
        let scheduler = Scheduler::new(song, options.song_loop)?;

        let settings = song.channels();
        if settings.len() > MAX_CHANNELS {
            warn!("song has {} channels, using {}", settings.len(), MAX_CHANNELS);
        }
        let num = settings.len().min(MAX_CHANNELS);

        let channels = settings.iter().take(num).enumerate()
            .map(|(i, s)| ChannelState::new(i, s, linear))
            .collect();
        let filters = (0..num)
            .map(|_| Box::new(OnePole::new()) as Box<dyn Filter>)
            .collect();

        debug!("\"{}\": {} channels, speed {}, tempo {}, {} periods",
               song.title(), num, scheduler.data.speed, scheduler.data.tempo,
               if linear { "linear" } else { "amiga" });

        Ok(Player {
            song,
            flags,
            channels,
            memory   : (0..num).map(|i| Memory::new(i, flags.shared_memory)).collect(),
            effects  : vec![Effect::None; num],
            virt     : Virtual::new(num, options.max_past_voices),
            filters,
            scan     : ScanData::new(song.orders().len()),
            row_txn  : None,
            state    : RowState::NeedNewRow,
            tick     : 0,
            requests : Vec::new(),
            info     : FrameInfo::new(),
            scheduler,
            options,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn data(&self) -> &PlayerData {
        &self.scheduler.data
    }

    pub fn info(&self) -> &FrameInfo {
        &self.info
    }

    pub fn end(&self) -> bool {
        self.scheduler.end()
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, chn: usize) -> Option<&ChannelState<'a>> {
        self.channels.get(chn)
    }

    pub fn past_voices(&self, chn: usize) -> &[Voice<'a>] {
        self.virt.voices(chn)
    }

    /// Render requests produced by the last tick.
    pub fn requests(&self) -> &[RenderRequest<'a>] {
        &self.requests
    }

    /// Replace a channel's filter.
    pub fn set_filter(&mut self, chn: usize, filter: Box<dyn Filter>) {
        if let Some(f) = self.filters.get_mut(chn) {
            *f = filter;
        }
    }

    /// Play one tick.
    pub fn play_tick(&mut self) -> Result<Step, Error> {
        if self.scheduler.end() {
            return Ok(Step::End)
        }

        if self.state == RowState::NeedNewRow {
            self.start_row()?;
            if self.scheduler.end() {
                self.requests.clear();
                return Ok(Step::End)
            }
        }

        let ticks = self.scheduler.ticks_per_row();
        let tick = self.tick;
        self.scheduler.data.frame = tick;
        let samples = samples_per_tick(self.options.rate, self.scheduler.data.tempo);

        self.process_tick(tick, ticks, samples);

        self.info = FrameInfo {
            pos          : self.scheduler.data.pos,
            row          : self.scheduler.data.row,
            frame        : tick,
            speed        : self.scheduler.data.speed,
            tempo        : self.scheduler.data.tempo,
            global_volume: self.scheduler.data.global_volume,
            loop_count   : self.scan.loop_count,
            samples,
        };
        self.tick += 1;

        if self.tick >= ticks {
            let mut txn = self.row_txn.take().unwrap_or_else(|| self.scheduler.start_transaction(Phase::Row));
            self.scheduler.commit(&mut txn, self.song)?;
            self.state = RowState::NeedNewRow;
        }

        Ok(Step::Tick(self.info.clone()))
    }

    /// Mix the last tick's requests into one buffer per channel, then run
    /// each channel's filter over it.
    pub fn render_tick(&mut self, mixer: &mut dyn Mixer) -> Vec<MixBuffer> {
        let size = self.info.samples;
        let mut buffers: Vec<MixBuffer> = (0..self.channels.len()).map(|_| MixBuffer::new(size)).collect();

        for req in &self.requests {
            match buffers.get_mut(req.channel) {
                Some(buf) => mixer.mix(req, buf),
                None      => trace!("request for unknown channel {}", req.channel),
            }
        }

        buffers.iter()
            .zip(self.filters.iter_mut())
            .zip(self.channels.iter())
            .map(|((buf, filter), ch)| {
                filter.update_env(ch.filter_env);
                filter.filter(buf)
            })
            .collect()
    }

    fn start_row(&mut self) -> Result<(), Error> {
        let song = self.song;
        let pos = self.scheduler.data.pos;
        let row_num = self.scheduler.data.row;

        let row = match self.scheduler.pattern(song).and_then(|p| song.pattern(p)).and_then(|p| p.row(row_num)) {
            Some(r) => r,
            None    => {
                warn!("order {}: row {} not found", pos, row_num);
                self.scheduler.stop();
                return Ok(())
            }
        };

        // effect memory and past voices start over with the song
        if self.scheduler.take_restart() {
            debug!("song restarts at order {}", pos);
            self.memory.iter_mut().for_each(|m| m.reset());
            self.virt.reset();
        }

        let delay_repeat = self.scheduler.is_delay_repeat();
        if !delay_repeat && !self.memory.iter().any(|m| m.in_pattern_loop()) {
            if self.scan.visit(pos, row_num) {
                if !self.options.song_loop {
                    info!("song loops at order {} row {}, stopping", pos, row_num);
                    self.scheduler.stop();
                    return Ok(())
                }
                debug!("song loop {} at order {} row {}", self.scan.loop_count, pos, row_num);
            }
        }

        trace!("{:02x}/{:02x} {}", pos, row_num, row);

        for chn in self.channels.len()..row.channels.len() {
            if row.command(chn).is_some() {
                trace!("skipping channel {} beyond configured count", chn);
            }
        }

        for (chn, (effect, memory)) in self.effects.iter_mut().zip(self.memory.iter_mut()).enumerate() {
            *effect = Effect::new(memory, row.command(chn));
        }

        // speed, tempo and global volume take effect before the row plays
        let mut pre = self.scheduler.start_transaction(Phase::PreRow);
        self.run_effects(&mut pre, |fx, ctx| fx.pre_start(ctx));
        self.scheduler.commit(&mut pre, song)?;

        if !delay_repeat {
            for (chn, channel) in self.channels.iter_mut().enumerate() {
                if let Some(cmd) = row.command(chn) {
                    if channel.enabled {
                        channel.intake(cmd, song);
                    }
                }
            }
        }

        let mut txn = self.scheduler.start_transaction(Phase::Row);
        self.run_effects(&mut txn, |fx, ctx| fx.start(ctx));
        self.row_txn = Some(txn);

        self.state = RowState::ProcessingTicks;
        self.tick = 0;
        Ok(())
    }

    // Row-level effect phases, every enabled channel in order.
    fn run_effects<F>(&mut self, txn: &mut Transaction, f: F)
        where F: Fn(&Effect, &mut EffectContext)
    {
        let row = self.scheduler.data.row;
        let ticks = self.scheduler.ticks_per_row();
        let delay_repeat = self.scheduler.is_delay_repeat();
        let flags = self.flags;
        let gvol = &mut self.scheduler.data.global_volume;

        for (chn, channel) in self.channels.iter_mut().enumerate() {
            if !channel.enabled {
                continue
            }
            let mut ctx = EffectContext {
                channel,
                memory       : &mut self.memory[chn],
                txn          : &mut *txn,
                past         : &mut self.virt,
                global_volume: &mut *gvol,
                flags,
                row,
                tick         : 0,
                ticks,
                delay_repeat,
            };
            f(&self.effects[chn], &mut ctx);
        }
    }

    fn process_tick(&mut self, tick: usize, ticks: usize, samples: usize) {
        let rate = self.options.rate;
        let row = self.scheduler.data.row;
        let delay_repeat = self.scheduler.is_delay_repeat();
        let flags = self.flags;
        let last = tick + 1 >= ticks;

        let mut txn = self.row_txn.take().unwrap_or_else(|| Transaction::new(Phase::Row));
        self.requests.clear();

        for (chn, channel) in self.channels.iter_mut().enumerate() {
            if !channel.enabled {
                continue
            }

            let memory = &mut self.memory[chn];
            channel.reset_modulation();
            channel.drain(&mut self.virt);

            if tick == channel.note_play_tick && channel.trigger(&mut self.virt) {
                memory.vibrato.note_on();
                memory.tremolo.note_on();
                memory.panbrello.note_on();
            }

            {
                let mut ctx = EffectContext {
                    channel      : &mut *channel,
                    memory,
                    txn          : &mut txn,
                    past         : &mut self.virt,
                    global_volume: &mut self.scheduler.data.global_volume,
                    flags,
                    row,
                    tick,
                    ticks,
                    delay_repeat,
                };
                let fx = &self.effects[chn];
                fx.tick(&mut ctx);
                ctx.channel.drain(ctx.past);
                if last {
                    fx.stop(&mut ctx);
                }
            }

            let song_volume = self.scheduler.data.global_volume;
            if let Some(req) = channel.render(song_volume, rate, samples) {
                self.requests.push(req);
            }
            self.virt.render(chn, rate, samples, channel.output, &mut self.requests);
        }

        self.row_txn = Some(txn);
    }
}
