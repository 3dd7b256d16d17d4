use tracing::trace;
use crate::MAX_PAN;
use crate::player::ops::VolumeOp;
use super::{EffectContext, Extended};
use super::tables::XFINETUNE_AMIGA;


pub(super) fn start(ctx: &mut EffectContext, e: Extended) {
    match e {
        Extended::Glissando(on)        => ctx.memory.glissando = on,
        Extended::Finetune(x)          => ctx.channel.c2spd_override = Some(XFINETUNE_AMIGA[x as usize & 0x0f]),
        Extended::VibratoWaveform(x)   => ctx.memory.vibrato.set_waveform(x),
        Extended::TremoloWaveform(x)   => ctx.memory.tremolo.set_waveform(x),
        Extended::PanbrelloWaveform(x) => ctx.memory.panbrello.set_waveform(x),
        Extended::PastCut              => ctx.past.cut(ctx.channel.num),
        Extended::PastRelease          => ctx.past.release(ctx.channel.num),
        Extended::PastFade             => ctx.past.fade(ctx.channel.num),
        Extended::NoteAction(a)        => {
            ctx.channel.nna_override = Some(a);
            ctx.channel.new_note_action = a;
        }
        Extended::Pan(x)               => {
            ctx.channel.pan = (x as u32 * MAX_PAN as u32 / 15) as u8;
            ctx.channel.surround = false;
        }
        Extended::Surround(on)         => ctx.channel.surround = on,
        Extended::HighOffset(x)        => ctx.memory.high_offset = x,
        Extended::PatternLoop(x)       => pattern_loop(ctx, x),
        Extended::NoteDelay(x)         => ctx.channel.note_play_tick = x as usize,
        Extended::PatternDelay(x)      => ctx.txn.set_pattern_delay(x),
        Extended::FinePatternDelay(_) |
        Extended::NoteCut(_)           |
        Extended::Ignored              => (),
    }
}

pub(super) fn tick(ctx: &mut EffectContext, e: Extended) {
    if let Extended::NoteCut(x) = e {
        if ctx.tick == x as usize {
            ctx.channel.queue(VolumeOp::NoteCut);
        }
    }
}

pub(super) fn stop(ctx: &mut EffectContext, e: Extended) {
    // a delay longer than the row never plays
    if let Extended::NoteDelay(x) = e {
        if x as usize >= ctx.ticks && ctx.channel.staged.pending {
            trace!("channel {}: note delay {} past row end", ctx.channel.num, x);
            ctx.channel.staged = Default::default();
        }
    }
}

// SB0 marks the loop start; SBx jumps back x times.
fn pattern_loop(ctx: &mut EffectContext, x: u8) {
    if ctx.delay_repeat {
        return
    }

    let mem = &mut *ctx.memory;
    if x == 0 {
        mem.loop_row = ctx.row;
        return
    }

    if mem.loop_count == 0 {
        mem.loop_count = x;
    } else {
        mem.loop_count -= 1;
    }

    if mem.loop_count > 0 {
        ctx.txn.set_loop_jump(mem.loop_row);
    } else {
        mem.loop_row = ctx.row + 1;
    }
}
