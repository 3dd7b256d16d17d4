#[derive(Clone, Debug, Default)]
pub struct ScanPos {
    row: Vec<bool>,     // visited flag per row
}

/// Visited (order, row) positions, used to detect when the song loops.
#[derive(Clone, Debug, Default)]
pub struct ScanData {
    pos           : Vec<ScanPos>,
    pub loop_count: usize,
}

impl ScanData {
    pub fn new(size: usize) -> Self {
        ScanData {
            pos       : vec![ScanPos::default(); size],
            loop_count: 0,
        }
    }

    /// Record a freshly entered row. Returns true if the position was seen
    /// before, which counts as a song loop; the table then starts over so
    /// the next pass is counted too.
    pub fn visit(&mut self, pos: usize, row: usize) -> bool {
        if pos >= self.pos.len() {
            self.pos.resize(pos + 1, ScanPos::default());
        }
        if row >= self.pos[pos].row.len() {
            self.pos[pos].row.resize(row + 1, false);
        }

        if self.pos[pos].row[row] {
            self.loop_count += 1;
            self.clear();
            self.visit(pos, row);
            return true
        }

        self.pos[pos].row[row] = true;
        false
    }

    fn clear(&mut self) {
        for p in self.pos.iter_mut() {
            p.row.clear();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_detects_loop() {
        let mut scan = ScanData::new(2);
        assert!(!scan.visit(0, 0));
        assert!(!scan.visit(0, 1));
        assert!(!scan.visit(1, 0));
        assert!(scan.visit(0, 0));
        assert_eq!(scan.loop_count, 1);

        // second pass counts again
        assert!(!scan.visit(0, 1));
        assert!(scan.visit(0, 0));
        assert_eq!(scan.loop_count, 2);
    }

    #[test]
    fn test_visit_grows_table() {
        let mut scan = ScanData::new(0);
        assert!(!scan.visit(3, 7));
        assert!(!scan.visit(3, 6));
        assert!(scan.visit(3, 7));
        assert_eq!(scan.loop_count, 1);
    }
}
