use std::env;
use std::io;
use anyhow::{bail, Context, Result};
use getopts::{Matches, Options};
use oxplay::mixer::{Interpolator, Resampler};
use oxplay::module::{ChannelCommand, Instrument, Module, NewNoteAction, Note, OrderEntry, Pattern, Sample};
use oxplay::period::Semitone;
use oxplay::player::effect::{FX_ARPEGGIO, FX_BREAK, FX_GVOL_SLIDE, FX_PORTA_DN, FX_RETRIG, FX_SPECIAL,
                              FX_SPEED, FX_TEMPO, FX_TONEPORTA, FX_TREMOLO, FX_VIBRATO, FX_VOLSLIDE};
use oxplay::{player, Player, Step};
use tracing_subscriber::EnvFilter;

const DEFAULT_TICKS: usize = 10000;

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::new();

    opts.optopt("t", "ticks", "stop after N ticks", "N");
    opts.optopt("r", "rate", "sampling rate in Hz", "HZ");
    opts.optflag("l", "loop", "loop the song (needs --ticks to stop)");
    opts.optflag("", "linear", "use linear periods");
    opts.optflag("d", "digest", "print only the md5 digest of the trace");
    opts.optflag("h", "help", "display usage information and exit");

    let matches = match opts.parse(&args[1..]) {
        Ok(m)  => m,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    if matches.opt_present("h") {
        let brief = format!("Usage: {} [options]", args[0]);
        print!("{}", opts.usage(&brief));
        return;
    }

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(&matches) {
        eprintln!("Error: {:#}", e);
    }
}

fn run(matches: &Matches) -> Result<()> {
    let mut options = player::Options::default();
    if let Some(r) = matches.opt_str("r") {
        options.rate = r.parse().with_context(|| format!("invalid rate {:?}", r))?;
    }
    options.song_loop = matches.opt_present("l");
    if matches.opt_present("linear") {
        options.linear = Some(true);
    }

    let max_ticks = match matches.opt_str("t") {
        Some(t) => t.parse().with_context(|| format!("invalid tick count {:?}", t))?,
        None    => DEFAULT_TICKS,
    };
    if options.song_loop && !matches.opt_present("t") {
        bail!("--loop needs --ticks");
    }

    let digest_only = matches.opt_present("d");
    let module = demo_song();
    let mut player = Player::new(&module, options)?;
    let mut mixer = Resampler::new(Interpolator::Linear);
    let mut digest = md5::Context::new();

    if !digest_only {
        println!("Title: {}", module.title);
        show_pattern(&module, 0);
    }

    for _ in 0..max_ticks {
        let info = match player.play_tick()? {
            Step::Tick(info) => info,
            Step::End        => break,
        };

        let buffers = player.render_tick(&mut mixer);
        let peaks: Vec<String> = buffers.iter().map(|b| format!("{:.3}", b.peak())).collect();
        let line = format!("{:02x}/{:02x}/{:02} spd:{} bpm:{} gv:{:2} voices:{} peak:{}",
                           info.pos, info.row, info.frame, info.speed, info.tempo,
                           info.global_volume, player.requests().len(), peaks.join(","));
        digest.consume(line.as_bytes());
        digest.consume(b"\n");

        if !digest_only {
            println!("{}", line);
        }
    }

    println!("{:x}", digest.compute());
    Ok(())
}

fn show_pattern(module: &Module, num: usize) {
    let pat = match module.patterns.get(num) {
        Some(p) => p,
        None    => return,
    };
    println!("Pattern {}:", num);
    for (r, row) in pat.rows.iter().enumerate() {
        println!("{:3}: {}", r, row);
    }
}

fn note(key: u8) -> ChannelCommand {
    ChannelCommand::new().with_note(Note::Normal(Semitone(key)))
}

// Two short patterns exercising the common effects.
fn demo_song() -> Module {
    let mut m = Module::new(4);
    m.title = "oxplay demo".to_owned();
    m.channels[0].pan = 16;
    m.channels[1].pan = 48;

    let saw: Vec<i8> = (0..64).map(|i| (i * 4 - 128) as i8).collect();
    let mut lead = Instrument::new();
    lead.name = "saw".to_owned();
    lead.sample = Sample::from_i8(saw).with_loop(0, 64, false);
    m.add_instrument(lead);

    let square: Vec<i8> = (0..32).map(|i| if i < 16 { 96 } else { -96 }).collect();
    let mut pad = Instrument::new();
    pad.name = "square".to_owned();
    pad.volume = 48;
    pad.nna = NewNoteAction::Fadeout;
    pad.fadeout = 128;
    pad.sample = Sample::from_i8(square).with_loop(0, 32, false);
    m.add_instrument(pad);

    let mut p0 = Pattern::new(16, 4);
    p0.set(0, 0, note(60).with_instrument(1).with_command(FX_SPEED, 0x06));
    p0.set(0, 1, note(48).with_instrument(2).with_command(FX_TEMPO, 0x7d));
    p0.set(2, 0, ChannelCommand::new().with_command(FX_VIBRATO, 0x44));
    p0.set(4, 0, note(64).with_instrument(1).with_command(FX_ARPEGGIO, 0x37));
    p0.set(4, 1, note(52).with_instrument(2));
    p0.set(6, 0, ChannelCommand::new().with_command(FX_VOLSLIDE, 0x04));
    p0.set(8, 0, note(67).with_command(FX_TONEPORTA, 0x10));
    p0.set(8, 2, note(36).with_instrument(1).with_volume(40).with_command(FX_RETRIG, 0x82));
    p0.set(10, 3, ChannelCommand::new().with_command(FX_SPECIAL, 0xe1));
    p0.set(12, 0, note(60).with_instrument(1).with_command(FX_SPECIAL, 0xd3));
    p0.set(12, 1, ChannelCommand::new().with_note(Note::Release));
    p0.set(14, 3, ChannelCommand::new().with_command(FX_BREAK, 0x00));

    let mut p1 = Pattern::new(8, 4);
    p1.set(0, 0, note(72).with_instrument(1).with_command(FX_PORTA_DN, 0x08));
    p1.set(0, 1, note(55).with_instrument(2).with_command(FX_TREMOLO, 0x48));
    p1.set(2, 3, ChannelCommand::new().with_command(FX_TEMPO, 0x96));
    p1.set(4, 0, ChannelCommand::new().with_note(Note::Stop));
    p1.set(6, 1, ChannelCommand::new().with_command(FX_GVOL_SLIDE, 0x08));

    m.patterns = vec![p0, p1];
    m.orders = vec![OrderEntry::Pattern(0), OrderEntry::Pattern(1), OrderEntry::End];
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_song_plays_to_end() {
        let m = demo_song();
        let mut p = Player::new(&m, player::Options::default()).unwrap();
        let mut ticks = 0;
        while let Step::Tick(_) = p.play_tick().unwrap() {
            ticks += 1;
            assert!(ticks < DEFAULT_TICKS);
        }
        assert!(ticks > 0);
    }
}
