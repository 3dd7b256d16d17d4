use crate::{MAX_PAN, MAX_VOLUME};
use crate::player::ops::{NoteOp, VolumeOp};
use super::EffectContext;
use super::tables::{Slide, RETRIG_VOLUME};


fn clamp_add(val: u8, delta: i32, max: u8) -> u8 {
    (val as i32 + delta).max(0).min(max as i32) as u8
}

pub(super) fn volume_slide(ctx: &mut EffectContext, s: Slide) {
    let d = s.amount(ctx.tick, ctx.flags.fast_volume_slides);
    if d != 0 {
        ctx.channel.active_volume = clamp_add(ctx.channel.active_volume, d, MAX_VOLUME);
    }
}

pub(super) fn channel_volume_slide(ctx: &mut EffectContext, s: Slide) {
    let d = s.amount(ctx.tick, false);
    if d != 0 {
        ctx.channel.channel_volume = clamp_add(ctx.channel.channel_volume, d, MAX_VOLUME);
    }
}

pub(super) fn global_volume_slide(ctx: &mut EffectContext, s: Slide) {
    let d = s.amount(ctx.tick, false);
    if d != 0 {
        *ctx.global_volume = clamp_add(*ctx.global_volume, d, MAX_VOLUME);
    }
}

// Px0 slides left, P0x right.
pub(super) fn pan_slide(ctx: &mut EffectContext, s: Slide) {
    let d = s.amount(ctx.tick, false);
    if d != 0 {
        ctx.channel.pan = clamp_add(ctx.channel.pan, -d, MAX_PAN);
    }
}

pub(super) fn set_channel_volume(ctx: &mut EffectContext, v: u8) {
    if v <= MAX_VOLUME {
        ctx.channel.channel_volume = v;
    }
}

// Xxx, full 8-bit range.
pub(super) fn set_pan(ctx: &mut EffectContext, x: u8) {
    ctx.channel.pan = ((x as u32 * MAX_PAN as u32 + 127) / 255) as u8;
    ctx.channel.surround = false;
}

pub(super) fn tremor(ctx: &mut EffectContext, on: u8, off: u8) {
    let mem = &mut *ctx.memory;
    if mem.tremor == 0 {
        mem.tremor_on = !mem.tremor_on;
        mem.tremor = if mem.tremor_on { on + 1 } else { off + 1 };
    }
    mem.tremor -= 1;
    if !mem.tremor_on {
        ctx.channel.volume_delta = -(MAX_VOLUME as i32);
    }
}

pub(super) fn tremolo(ctx: &mut EffectContext, speed: u8, depth: u8) {
    let mem = &mut *ctx.memory;
    let wave = mem.tremolo.value(&mut mem.rng);
    ctx.channel.volume_delta = (wave * depth as i32) >> 6;
    if ctx.tick > 0 {
        mem.tremolo.advance(speed);
    }
}

pub(super) fn panbrello(ctx: &mut EffectContext, speed: u8, depth: u8) {
    let mem = &mut *ctx.memory;
    let wave = mem.panbrello.value(&mut mem.rng);
    ctx.channel.pan_delta = (wave * depth as i32) >> 7;
    mem.panbrello.advance(speed);
}

// Qxy: restart the voice every y ticks, changing the volume by x.
pub(super) fn retrigger(ctx: &mut EffectContext, vol: u8, interval: u8) {
    if interval == 0 || ctx.tick == 0 {
        return
    }
    let ch = &mut *ctx.channel;
    ch.retrigger_count += 1;
    if ch.retrigger_count >= interval {
        ch.retrigger_count = 0;
        ch.queue(NoteOp::Retrigger);
        ch.queue(VolumeOp::Retrig(RETRIG_VOLUME[vol as usize & 0x0f]));
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::super::tests::Harness;
    use super::super::Effect;

    #[test]
    fn test_clamp_add() {
        assert_eq!(clamp_add(60, 10, 64), 64);
        assert_eq!(clamp_add(3, -10, 64), 0);
        assert_eq!(clamp_add(30, 2, 64), 32);
    }

    #[test]
    fn test_tremolo_is_modulation_only() {
        let mut h = Harness::new();
        h.channel.active_volume = 40;
        h.memory.tremolo.pos = 16;
        h.run(1, |ctx| Effect::Tremolo(4, 8).tick(ctx));
        assert_eq!(h.channel.volume_delta, 255 * 8 >> 6);
        assert_eq!(h.channel.active_volume, 40);
        assert_eq!(h.memory.tremolo.pos, 20);
    }

    #[test]
    fn test_panbrello() {
        let mut h = Harness::new();
        h.memory.panbrello.pos = 16;
        h.run(0, |ctx| Effect::Panbrello(2, 15).tick(ctx));
        assert_eq!(h.channel.pan_delta, 255 * 15 >> 7);
        assert_eq!(h.channel.pan, 32);
        assert_eq!(h.channel.output_pan(), 61);
    }

    #[test]
    fn test_retrigger_without_interval() {
        let mut h = Harness::new();
        h.play_row(Effect::Retrigger(1, 0), 6);
        assert_eq!(h.channel.retrigger_count, 0);
        assert_eq!(h.channel.pending_ops(), 0);
    }
}
