use std::fmt;
use std::mem;
use crate::period::Semitone;
use crate::util::{self, BinaryRead};
use crate::Error;

pub const HAS_NOTE: u8 = 0x01;
pub const HAS_INS : u8 = 0x02;
pub const HAS_VOL : u8 = 0x04;
pub const HAS_CMD : u8 = 0x08;

/// Size of one command in the canonical packed layout.
pub const PACKED_SIZE: usize = 7;

/// Volume column value asking for the instrument's default volume.
pub const VOLUME_USE_INSTRUMENT: u8 = 0xff;

const NOTE_INVALID       : u8 = 252;
const NOTE_STOP_OR_RELEASE: u8 = 253;
const NOTE_STOP           : u8 = 254;
const NOTE_RELEASE        : u8 = 255;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Note {
    Empty,
    Normal(Semitone),
    Release,
    Stop,
    StopOrRelease,
    Invalid,
}

impl Default for Note {
    fn default() -> Self {
        Note::Empty
    }
}

impl Note {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0                    => Note::Empty,
            1..=120              => Note::Normal(Semitone(b - 1)),
            NOTE_STOP_OR_RELEASE => Note::StopOrRelease,
            NOTE_STOP            => Note::Stop,
            NOTE_RELEASE         => Note::Release,
            _                    => Note::Invalid,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Note::Empty         => 0,
            Note::Normal(s)     => if s.0 <= Semitone::MAX { s.0 + 1 } else { NOTE_INVALID },
            Note::StopOrRelease => NOTE_STOP_OR_RELEASE,
            Note::Stop          => NOTE_STOP,
            Note::Release       => NOTE_RELEASE,
            Note::Invalid       => NOTE_INVALID,
        }
    }

    /// Notes compare by variant only.
    pub fn same_kind(&self, other: &Note) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    pub fn is_special(&self) -> bool {
        match self {
            Note::Release | Note::Stop | Note::StopOrRelease | Note::Invalid => true,
            _ => false,
        }
    }

    /// Merge with the semitone produced by an instrument lookup. A special
    /// note always wins, otherwise a mapped semitone overrides.
    pub fn coalesce(self, semitone: Semitone) -> Note {
        match self {
            Note::Normal(_) if semitone != Semitone::UNCHANGED => Note::Normal(semitone),
            _ => self,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Note::Empty         => write!(f, "..."),
            Note::Normal(s)     => write!(f, "{}", s),
            Note::Release       => write!(f, "==="),
            Note::Stop          => write!(f, "^^^"),
            Note::StopOrRelease => write!(f, "^=="),
            Note::Invalid       => write!(f, "???"),
        }
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstrumentId {
    pub num     : u16,
    pub semitone: Semitone,
}

impl InstrumentId {
    pub fn is_empty(&self) -> bool {
        self.num == 0
    }
}


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelCommand {
    pub flags: u8,
    pub note : Note,
    pub ins  : u16,
    pub vol  : u8,
    pub cmd  : u8,
    pub param: u8,
}

impl ChannelCommand {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.flags |= HAS_NOTE;
        self.note = note;
        self
    }

    pub fn with_instrument(mut self, ins: u16) -> Self {
        self.flags |= HAS_INS;
        self.ins = ins;
        self
    }

    pub fn with_volume(mut self, vol: u8) -> Self {
        self.flags |= HAS_VOL;
        self.vol = vol;
        self
    }

    pub fn with_command(mut self, cmd: u8, param: u8) -> Self {
        self.flags |= HAS_CMD;
        self.cmd = cmd;
        self.param = param;
        self
    }

    pub fn has_note(&self) -> bool {
        self.flags & HAS_NOTE != 0
    }

    pub fn note(&self) -> Note {
        if self.has_note() { self.note } else { Note::Empty }
    }

    pub fn has_instrument(&self) -> bool {
        self.flags & HAS_INS != 0
    }

    /// Instrument reference for this row. The semitone is the row note when
    /// there is one, else the channel's current semitone.
    pub fn instrument_id(&self, current: Semitone) -> InstrumentId {
        let semitone = match self.note() {
            Note::Normal(s) => s,
            _               => current,
        };
        InstrumentId { num: self.ins, semitone }
    }

    pub fn has_volume(&self) -> bool {
        self.flags & HAS_VOL != 0
    }

    pub fn volume(&self) -> u8 {
        self.vol
    }

    pub fn has_command(&self) -> bool {
        self.flags & HAS_CMD != 0
    }

    pub fn command(&self) -> (u8, u8) {
        if self.has_command() { (self.cmd, self.param) } else { (0, 0) }
    }

    pub fn pack(&self, buf: &mut Vec<u8>) {
        buf.push(self.flags);
        buf.push(self.note.to_byte());
        util::write16l(buf, self.ins);
        buf.push(self.vol);
        buf.push(self.cmd);
        buf.push(self.param);
    }

    pub fn unpack(b: &[u8], ofs: usize) -> Result<Self, Error> {
        let flags = b.read8(ofs)?;
        if flags & 0xf0 != 0 {
            return Err(Error::Format(format!("invalid command flags {:02x} at offset {}", flags, ofs)))
        }
        Ok(ChannelCommand {
            flags,
            note : Note::from_byte(b.read8(ofs + 1)?),
            ins  : b.read16l(ofs + 2)?,
            vol  : b.read8(ofs + 4)?,
            cmd  : b.read8(ofs + 5)?,
            param: b.read8(ofs + 6)?,
        })
    }
}

impl fmt::Display for ChannelCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ins = if self.has_instrument() {
            format!("{:02}", self.ins)
        } else {
            "..".to_owned()
        };

        let vol = if self.has_volume() {
            format!("{:02}", self.vol)
        } else {
            "..".to_owned()
        };

        let cmd = if self.has_command() && self.cmd > 0 && self.cmd <= 26 {
            format!("{}{:02X}", (b'@' + self.cmd) as char, self.param)
        } else {
            "...".to_owned()
        };

        write!(f, "{} {} {} {}", self.note(), ins, vol, cmd)
    }
}


#[derive(Clone, Debug, Default)]
pub struct Row {
    pub channels: Vec<Option<ChannelCommand>>,
}

impl Row {
    pub fn command(&self, chn: usize) -> Option<&ChannelCommand> {
        self.channels.get(chn).and_then(|c| c.as_ref())
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, c) in self.channels.iter().enumerate() {
            if i > 0 {
                write!(f, "|")?;
            }
            match c {
                Some(cmd) => write!(f, "{}", cmd)?,
                None      => write!(f, "... .. .. ...")?,
            }
        }
        Ok(())
    }
}


#[derive(Clone, Debug, Default)]
pub struct Pattern {
    pub rows: Vec<Row>,
}

impl Pattern {
    pub fn new(rows: usize, channels: usize) -> Self {
        Pattern {
            rows: vec![Row{ channels: vec![None; channels] }; rows],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, num: usize) -> Option<&Row> {
        self.rows.get(num)
    }

    pub fn set(&mut self, row: usize, chn: usize, cmd: ChannelCommand) {
        if let Some(r) = self.rows.get_mut(row) {
            if chn >= r.channels.len() {
                r.channels.resize(chn + 1, None);
            }
            r.channels[chn] = Some(cmd);
        }
    }

    /// Decode a row-major buffer of packed commands. A zero flag byte is an
    /// empty cell.
    pub fn from_packed(rows: usize, channels: usize, b: &[u8]) -> Result<Self, Error> {
        let mut pat = Pattern::new(rows, channels);
        let mut ofs = 0;
        for r in 0..rows {
            for c in 0..channels {
                let cmd = ChannelCommand::unpack(b, ofs)?;
                if cmd.flags != 0 {
                    pat.rows[r].channels[c] = Some(cmd);
                }
                ofs += PACKED_SIZE;
            }
        }
        Ok(pat)
    }

    pub fn to_packed(&self, channels: usize) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.rows.len() * channels * PACKED_SIZE);
        for r in &self.rows {
            for c in 0..channels {
                match r.command(c) {
                    Some(cmd) => cmd.pack(&mut buf),
                    None      => ChannelCommand::new().pack(&mut buf),
                }
            }
        }
        buf
    }
}
