use std::mem;
use tracing::{debug, info, warn};
use crate::module::{OrderEntry, SongData};
use crate::{Error, MAX_TEMPO, MAX_VOLUME, MIN_TEMPO};
use super::transaction::{Jump, Phase, Transaction};


/// Current playback position and timing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerData {
    pub pos          : usize,
    pub row          : usize,
    pub frame        : usize,
    pub speed        : u8,
    pub tempo        : u8,
    pub global_volume: u8,
}

/// Owns order, row and tempo. All changes go through a transaction.
#[derive(Debug)]
pub struct Scheduler {
    pub data     : PlayerData,
    pub song_loop: bool,
    restart      : usize,
    pattern_delay: u8,      // rows still to repeat
    delay_repeat : bool,    // current row is a repeat
    extra_ticks  : u8,      // fine pattern delay for the current row
    restarted    : bool,    // wrapped to the restart order
    end          : bool,
}

impl Scheduler {
    pub fn new(song: &dyn SongData, song_loop: bool) -> Result<Self, Error> {
        let restart = if song.restart_order() < song.orders().len() { song.restart_order() } else { 0 };
        let mut sched = Scheduler {
            data: PlayerData {
                pos          : 0,
                row          : 0,
                frame        : 0,
                speed        : song.initial_speed().max(1),
                tempo        : song.initial_tempo().max(MIN_TEMPO),
                global_volume: song.initial_global_volume().min(MAX_VOLUME),
            },
            song_loop,
            restart,
            pattern_delay: 0,
            delay_repeat : false,
            extra_ticks  : 0,
            restarted    : false,
            end          : false,
        };

        sched.data.pos = match sched.resolve_order(song, 0)? {
            Some(pos) => pos,
            None      => return Err(Error::NoPlayablePattern),
        };
        sched.restarted = false;

        Ok(sched)
    }

    pub fn start_transaction(&self, phase: Phase) -> Transaction {
        Transaction::new(phase)
    }

    pub fn end(&self) -> bool {
        self.end
    }

    /// True once after the order list wrapped to the restart order.
    pub fn take_restart(&mut self) -> bool {
        mem::replace(&mut self.restarted, false)
    }

    pub fn is_delay_repeat(&self) -> bool {
        self.delay_repeat
    }

    pub fn ticks_per_row(&self) -> usize {
        self.data.speed as usize + self.extra_ticks as usize
    }

    /// Pattern number at the current order.
    pub fn pattern(&self, song: &dyn SongData) -> Option<usize> {
        match song.order(self.data.pos) {
            OrderEntry::Pattern(p) => Some(p),
            _                      => None,
        }
    }

    /// Apply a transaction. Committing twice, or committing a cancelled
    /// transaction, does nothing.
    pub fn commit(&mut self, txn: &mut Transaction, song: &dyn SongData) -> Result<(), Error> {
        if !txn.mark_committed() {
            return Ok(())
        }

        if let Some(v) = txn.global_volume() {
            self.data.global_volume = v.min(MAX_VOLUME);
        }

        // pattern delay: first in wins, never while a delay is running
        if let Some(rows) = txn.pattern_delay() {
            if self.pattern_delay == 0 && !self.delay_repeat {
                self.pattern_delay = rows;
            }
        }

        if let Some(t) = txn.tempo() {
            self.data.tempo = t;
        }
        if txn.tempo_delta() != 0 {
            let t = self.data.tempo as i32 + txn.tempo_delta();
            self.data.tempo = t.max(MIN_TEMPO as i32).min(MAX_TEMPO as i32) as u8;
        }
        self.data.tempo = self.data.tempo.max(MIN_TEMPO);

        if let Some(s) = txn.ticks() {
            if s > 0 {
                self.data.speed = s;
            }
        }

        match txn.phase {
            Phase::PreRow => {
                self.extra_ticks = txn.fine_delay();
                Ok(())
            }
            Phase::Row    => self.advance(txn, song),
        }
    }

    fn advance(&mut self, txn: &Transaction, song: &dyn SongData) -> Result<(), Error> {
        self.data.frame = 0;

        if self.pattern_delay > 0 {
            self.pattern_delay -= 1;
            self.delay_repeat = true;
            return Ok(())
        }
        self.delay_repeat = false;

        let (pos, row, explicit) = match (txn.next_order(), txn.next_row(), txn.who_jumped_first()) {
            (Some(o), Some(r), Some(Jump::Row)) => (o, r, true),
            (Some(o), _, _)                     => (o, 0, true),
            (None, Some(r), _)                  => (self.data.pos + 1, r, true),
            (None, None, _)                     => match txn.loop_jump() {
                Some(r) => (self.data.pos, r, true),
                None    => (self.data.pos, self.data.row + 1, false),
            },
        };

        let mut pos = match self.resolve_order(song, pos)? {
            Some(p) => p,
            None    => return self.end_of_song(),
        };
        let mut row = row;

        if row >= self.pattern_len(song, pos) {
            if explicit {
                row = 0;
            } else {
                pos = match self.resolve_order(song, pos + 1)? {
                    Some(p) => p,
                    None    => return self.end_of_song(),
                };
                row = 0;
            }
        }

        if pos != self.data.pos {
            debug!("order {} -> {} (row {})", self.data.pos, pos, row);
        }

        self.data.pos = pos;
        self.data.row = row;
        Ok(())
    }

    fn pattern_len(&self, song: &dyn SongData, pos: usize) -> usize {
        match song.order(pos) {
            OrderEntry::Pattern(p) => song.pattern(p).map_or(0, |pat| pat.len()),
            _                      => 0,
        }
    }

    fn end_of_song(&mut self) -> Result<(), Error> {
        info!("end of song at order {}", self.data.pos);
        self.end = true;
        Ok(())
    }

    pub(super) fn stop(&mut self) {
        self.end = true;
    }

    /// First playable order at or after `start`. `Ok(None)` is the end of
    /// the song.
    fn resolve_order(&mut self, song: &dyn SongData, start: usize) -> Result<Option<usize>, Error> {
        let limit = 2 * song.orders().len() + 2;
        let mut pos = start;

        for _ in 0..limit {
            match song.order(pos) {
                OrderEntry::Pattern(p) => {
                    match song.pattern(p) {
                        Some(pat) if !pat.is_empty() => return Ok(Some(pos)),
                        Some(_) => warn!("order {}: pattern {} is empty", pos, p),
                        None    => warn!("order {}: pattern {} out of range", pos, p),
                    }
                    pos += 1;
                }
                OrderEntry::Skip => pos += 1,
                OrderEntry::End  => {
                    if !self.song_loop {
                        return Ok(None)
                    }
                    pos = self.restart;
                    self.restarted = true;
                }
            }
        }

        Err(Error::NoPlayablePattern)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Module, Pattern};

    fn song(orders: &[OrderEntry], rows: &[usize]) -> Module {
        let mut m = Module::new(1);
        m.orders = orders.to_vec();
        m.patterns = rows.iter().map(|&r| Pattern::new(r, 1)).collect();
        m
    }

    fn commit_row(s: &mut Scheduler, m: &Module, f: impl Fn(&mut Transaction)) {
        let mut t = s.start_transaction(Phase::Row);
        f(&mut t);
        s.commit(&mut t, m).unwrap();
    }

    #[test]
    fn test_row_advance_and_order_wrap() {
        let m = song(&[OrderEntry::Pattern(0), OrderEntry::Pattern(1)], &[2, 2]);
        let mut s = Scheduler::new(&m, false).unwrap();
        commit_row(&mut s, &m, |_| ());
        assert_eq!((s.data.pos, s.data.row), (0, 1));
        commit_row(&mut s, &m, |_| ());
        assert_eq!((s.data.pos, s.data.row), (1, 0));
        commit_row(&mut s, &m, |_| ());
        commit_row(&mut s, &m, |_| ());
        assert!(s.end());
    }

    #[test]
    fn test_song_loop_restarts() {
        let mut m = song(&[OrderEntry::Pattern(0), OrderEntry::Pattern(1)], &[1, 1]);
        m.restart = 1;
        let mut s = Scheduler::new(&m, true).unwrap();
        assert!(!s.take_restart());
        commit_row(&mut s, &m, |_| ());
        assert!(!s.take_restart());
        commit_row(&mut s, &m, |_| ());
        assert!(!s.end());
        assert_eq!((s.data.pos, s.data.row), (1, 0));
        assert!(s.take_restart());
        assert!(!s.take_restart());
    }

    #[test]
    fn test_commit_is_idempotent() {
        let m = song(&[OrderEntry::Pattern(0)], &[4]);
        let mut s = Scheduler::new(&m, false).unwrap();
        let mut t = s.start_transaction(Phase::Row);
        t.set_tempo(150);
        s.commit(&mut t, &m).unwrap();
        let once = s.data.clone();
        s.commit(&mut t, &m).unwrap();
        assert_eq!(s.data, once);
        assert_eq!(s.data.row, 1);
    }

    #[test]
    fn test_cancel_leaves_state() {
        let m = song(&[OrderEntry::Pattern(0)], &[4]);
        let mut s = Scheduler::new(&m, false).unwrap();
        let before = s.data.clone();
        let mut t = s.start_transaction(Phase::Row);
        t.set_tempo(200);
        t.set_next_row(3);
        t.cancel();
        s.commit(&mut t, &m).unwrap();
        assert_eq!(s.data, before);

        // dropped without commit
        let mut t = s.start_transaction(Phase::Row);
        t.set_next_order(0);
        drop(t);
        assert_eq!(s.data, before);
    }

    #[test]
    fn test_row_jump_first_keeps_row() {
        let m = song(&[OrderEntry::Pattern(0), OrderEntry::Pattern(0), OrderEntry::Pattern(0)], &[8]);
        let mut s = Scheduler::new(&m, false).unwrap();
        commit_row(&mut s, &m, |t| {
            t.set_next_row(5);
            t.set_next_order(2);
        });
        assert_eq!((s.data.pos, s.data.row), (2, 5));
    }

    #[test]
    fn test_order_jump_first_clamps_row() {
        let m = song(&[OrderEntry::Pattern(0), OrderEntry::Pattern(0), OrderEntry::Pattern(0)], &[8]);
        let mut s = Scheduler::new(&m, false).unwrap();
        commit_row(&mut s, &m, |t| {
            t.set_next_order(2);
            t.set_next_row(5);
        });
        assert_eq!((s.data.pos, s.data.row), (2, 0));
    }

    #[test]
    fn test_pattern_break_goes_to_next_order() {
        let m = song(&[OrderEntry::Pattern(0), OrderEntry::Pattern(1)], &[4, 4]);
        let mut s = Scheduler::new(&m, false).unwrap();
        commit_row(&mut s, &m, |t| t.set_next_row(9));
        // beyond the pattern length
        assert_eq!((s.data.pos, s.data.row), (1, 0));
    }

    #[test]
    fn test_pattern_delay_first_wins() {
        let m = song(&[OrderEntry::Pattern(0)], &[4]);
        let mut s = Scheduler::new(&m, false).unwrap();
        commit_row(&mut s, &m, |t| {
            t.set_pattern_delay(2);
            t.set_pattern_delay(5);
        });
        assert!(s.is_delay_repeat());
        assert_eq!(s.data.row, 0);
        // a delay request during the repeat is ignored
        commit_row(&mut s, &m, |t| t.set_pattern_delay(2));
        assert_eq!(s.data.row, 0);
        commit_row(&mut s, &m, |t| t.set_pattern_delay(2));
        assert!(!s.is_delay_repeat());
        assert_eq!(s.data.row, 1);
    }

    #[test]
    fn test_tempo_and_speed() {
        let m = song(&[OrderEntry::Pattern(0)], &[4]);
        let mut s = Scheduler::new(&m, false).unwrap();
        let mut t = s.start_transaction(Phase::PreRow);
        t.set_tempo(150);
        t.set_ticks(3);
        t.add_fine_delay(2);
        s.commit(&mut t, &m).unwrap();
        assert_eq!(s.data.tempo, 150);
        assert_eq!(s.ticks_per_row(), 5);
        assert_eq!(s.data.row, 0);

        commit_row(&mut s, &m, |t| t.add_tempo_delta(-200));
        assert_eq!(s.data.tempo, MIN_TEMPO);
        commit_row(&mut s, &m, |t| t.add_tempo_delta(500));
        assert_eq!(s.data.tempo, MAX_TEMPO);
    }

    #[test]
    fn test_skip_and_bad_orders() {
        let m = song(&[OrderEntry::Skip, OrderEntry::Pattern(9), OrderEntry::Pattern(0)], &[1]);
        let s = Scheduler::new(&m, false).unwrap();
        assert_eq!(s.data.pos, 2);
    }

    #[test]
    fn test_no_playable_pattern() {
        let m = song(&[OrderEntry::Pattern(3)], &[1]);
        assert!(matches!(Scheduler::new(&m, false), Err(Error::NoPlayablePattern)));
        assert!(matches!(Scheduler::new(&m, true), Err(Error::NoPlayablePattern)));
        let m = song(&[], &[1]);
        assert!(matches!(Scheduler::new(&m, false), Err(Error::NoPlayablePattern)));
    }

    #[test]
    fn test_loop_jump() {
        let m = song(&[OrderEntry::Pattern(0)], &[4]);
        let mut s = Scheduler::new(&m, false).unwrap();
        commit_row(&mut s, &m, |_| ());
        commit_row(&mut s, &m, |_| ());
        commit_row(&mut s, &m, |t| t.set_loop_jump(1));
        assert_eq!(s.data.row, 1);
        // explicit jumps take precedence
        commit_row(&mut s, &m, |t| {
            t.set_loop_jump(0);
            t.set_next_row(3);
            t.set_next_order(0);
        });
        assert_eq!((s.data.pos, s.data.row), (0, 3));
    }
}
