/// Which part of the row a transaction collects changes for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Effects' `pre_start`. Committed before note intake.
    PreRow,
    /// `start`, `tick` and `stop`. Committed after the row's last tick.
    Row,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Jump {
    Order,
    Row,
}

/// Proposed scheduler changes for one row. Arbitration fields are write
/// once; the first request wins.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub phase    : Phase,
    next_order   : Option<usize>,
    next_row     : Option<usize>,
    first_jump   : Option<Jump>,
    loop_jump    : Option<usize>,
    pattern_delay: Option<u8>,
    fine_delay   : u8,
    tempo        : Option<u8>,
    tempo_delta  : i32,
    ticks        : Option<u8>,
    global_volume: Option<u8>,
    committed    : bool,
    cancelled    : bool,
}

impl Transaction {
    pub fn new(phase: Phase) -> Self {
        Transaction {
            phase,
            next_order   : None,
            next_row     : None,
            first_jump   : None,
            loop_jump    : None,
            pattern_delay: None,
            fine_delay   : 0,
            tempo        : None,
            tempo_delta  : 0,
            ticks        : None,
            global_volume: None,
            committed    : false,
            cancelled    : false,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.committed && !self.cancelled
    }

    /// Drop every proposed change. Later calls on this transaction are
    /// no-ops.
    pub fn cancel(&mut self) {
        if !self.committed {
            self.cancelled = true;
        }
    }

    pub(super) fn mark_committed(&mut self) -> bool {
        if !self.is_open() {
            return false
        }
        self.committed = true;
        true
    }

    pub fn set_next_order(&mut self, order: usize) {
        if self.is_open() && self.next_order.is_none() {
            self.next_order = Some(order);
            self.first_jump.get_or_insert(Jump::Order);
        }
    }

    pub fn set_next_row(&mut self, row: usize) {
        if self.is_open() && self.next_row.is_none() {
            self.next_row = Some(row);
            self.first_jump.get_or_insert(Jump::Row);
        }
    }

    pub fn set_loop_jump(&mut self, row: usize) {
        if self.is_open() && self.loop_jump.is_none() {
            self.loop_jump = Some(row);
        }
    }

    pub fn set_pattern_delay(&mut self, rows: u8) {
        if self.is_open() && self.pattern_delay.is_none() {
            self.pattern_delay = Some(rows);
        }
    }

    pub fn add_fine_delay(&mut self, ticks: u8) {
        if self.is_open() {
            self.fine_delay = self.fine_delay.saturating_add(ticks);
        }
    }

    pub fn set_tempo(&mut self, tempo: u8) {
        if self.is_open() {
            self.tempo = Some(tempo);
        }
    }

    pub fn add_tempo_delta(&mut self, delta: i32) {
        if self.is_open() {
            self.tempo_delta += delta;
        }
    }

    pub fn set_ticks(&mut self, ticks: u8) {
        if self.is_open() {
            self.ticks = Some(ticks);
        }
    }

    pub fn set_global_volume(&mut self, vol: u8) {
        if self.is_open() {
            self.global_volume = Some(vol);
        }
    }

    pub fn who_jumped_first(&self) -> Option<Jump> {
        self.first_jump
    }

    pub fn next_order(&self) -> Option<usize> {
        self.next_order
    }

    pub fn next_row(&self) -> Option<usize> {
        self.next_row
    }

    pub fn loop_jump(&self) -> Option<usize> {
        self.loop_jump
    }

    pub fn pattern_delay(&self) -> Option<u8> {
        self.pattern_delay
    }

    pub fn fine_delay(&self) -> u8 {
        self.fine_delay
    }

    pub fn tempo(&self) -> Option<u8> {
        self.tempo
    }

    pub fn tempo_delta(&self) -> i32 {
        self.tempo_delta
    }

    pub fn ticks(&self) -> Option<u8> {
        self.ticks
    }

    pub fn global_volume(&self) -> Option<u8> {
        self.global_volume
    }
}
