use crate::period::Comparison;
use crate::player::channel::NoteAction;
use super::{EffectContext, Porta};


// Exx/Fxx. Normal slides run on ticks after the first, fine and extra fine
// ones once on tick 0.
pub(super) fn porta(ctx: &mut EffectContext, p: Porta, up: bool) {
    let amount = match p {
        Porta::Normal(v)    if ctx.tick > 0  => v as i32 * 4,
        Porta::Fine(v)      if ctx.tick == 0 => v as i32 * 4,
        Porta::ExtraFine(v) if ctx.tick == 0 => v as i32,
        _ => return,
    };

    let ch = &mut *ctx.channel;
    ch.active_period = if up {
        ch.active_period.porta_up(amount)
    } else {
        ch.active_period.porta_down(amount)
    };
}

// A note on a tone portamento row becomes the slide target instead of
// restarting the voice.
pub(super) fn tone_porta_start(ctx: &mut EffectContext) {
    let ch = &mut *ctx.channel;
    if ch.staged.action != Some(NoteAction::Retrigger) {
        return
    }
    if ch.voice.as_ref().map_or(false, |v| v.is_active()) {
        ch.staged.action = None;
        ch.use_target_period = false;
    }
}

pub(super) fn tone_porta(ctx: &mut EffectContext, speed: u8) {
    if ctx.memory.glissando {
        ctx.channel.glissando = true;
    }
    if ctx.tick == 0 {
        return
    }

    let ch = &mut *ctx.channel;
    let target = ch.target_period;
    let active = ch.active_period;
    if !target.is_playing() || !active.is_playing() {
        return
    }

    let amount = speed as i32 * 4;
    ch.active_period = match active.compare(&target) {
        Comparison::LeftHigherFreq  => {
            let p = active.porta_down(amount);
            if p.compare(&target) == Comparison::RightHigherFreq { target } else { p }
        }
        Comparison::RightHigherFreq => {
            let p = active.porta_up(amount);
            if p.compare(&target) == Comparison::LeftHigherFreq { target } else { p }
        }
        Comparison::Equal           => target,
    };
}

// Hxy/Uxy, also the vibrato half of Kxy.
pub(super) fn vibrato(ctx: &mut EffectContext, speed: u8, depth: u8, shift: u8) {
    let mem = &mut *ctx.memory;
    let wave = mem.vibrato.value(&mut mem.rng);
    ctx.channel.period_delta = (wave * depth as i32) >> shift;
    if ctx.tick > 0 {
        mem.vibrato.advance(speed);
    }
}

pub(super) fn arpeggio(ctx: &mut EffectContext, x: u8, y: u8) {
    ctx.channel.arpeggio = match ctx.tick % 3 {
        0 => 0,
        1 => x as i32,
        _ => y as i32,
    };
}


#[cfg(test)]
mod tests {
    use super::super::tests::Harness;
    use super::super::Effect;
    use crate::period::{AmigaPeriod, Period};

    #[test]
    fn test_porta_ignores_silent_channel() {
        let mut h = Harness::new();
        h.play_row(Effect::PortaUp(super::Porta::Normal(4)), 4);
        assert!(!h.channel.active_period.is_playing());
    }

    #[test]
    fn test_porta_up_floor() {
        let mut h = Harness::new();
        h.channel.active_period = Period::Amiga(AmigaPeriod(20.0));
        h.play_row(Effect::PortaUp(super::Porta::Normal(0xdf)), 3);
        assert_eq!(h.channel.active_period, Period::Amiga(AmigaPeriod(1.0)));
    }

    #[test]
    fn test_tone_porta_without_voice_starts_note() {
        let mut h = Harness::new();
        let mut m = crate::module::Module::new(1);
        let mut ins = crate::module::Instrument::new();
        ins.sample = crate::module::Sample::from_i8(vec![1; 64]).with_loop(0, 64, false);
        m.add_instrument(ins);
        let cmd = crate::module::ChannelCommand::new()
            .with_note(crate::module::Note::Normal(crate::period::Semitone(60)))
            .with_instrument(1);
        h.channel.intake(&cmd, &m);
        h.play_row(Effect::TonePorta(4), 1);
        assert!(h.channel.voice.is_some());
        assert_eq!(h.channel.active_period, h.channel.target_period);
    }

    #[test]
    fn test_glissando_flag() {
        let mut h = Harness::new();
        h.memory.glissando = true;
        h.play_row(Effect::TonePorta(1), 2);
        assert!(h.channel.glissando);
        h.play_row(Effect::None, 1);
        assert!(!h.channel.glissando);
    }
}
