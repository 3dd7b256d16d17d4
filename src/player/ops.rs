use crate::period::Semitone;
use super::effect::tables::RetrigVolume;

/// Deferred pitch and voice changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoteOp {
    CalcPeriod(Semitone),
    Attack,
    Release,
    Cut,
    SetOffset(usize),
    Retrigger,
}

/// Deferred volume changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VolumeOp {
    Set(u8),
    InstrumentDefault,
    Retrig(RetrigVolume),
    NoteCut,
}

/// Work queued against a channel and drained in order around the effect
/// tick. The queue is always empty between ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operation {
    Note(NoteOp),
    Volume(VolumeOp),
}

impl From<NoteOp> for Operation {
    fn from(op: NoteOp) -> Self {
        Operation::Note(op)
    }
}

impl From<VolumeOp> for Operation {
    fn from(op: VolumeOp) -> Self {
        Operation::Volume(op)
    }
}
