use std::collections::VecDeque;

use crate::RenderError;

/// The open rows of every screen column. Row `umost[x]` is the first open
/// row, `dmost[x]` is one past the last. A column with `umost >= dmost` is
/// closed for the rest of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcclusionBuffer {
    umost: Vec<i32>,
    dmost: Vec<i32>,
    height: i32,
    open: usize,
}

impl OcclusionBuffer {
    pub fn new(screen_width: usize, screen_height: usize) -> Self {
        Self {
            umost: vec![0; screen_width],
            dmost: vec![screen_height as i32; screen_width],
            height: screen_height as i32,
            open: screen_width,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.umost.iter_mut().for_each(|u| *u = 0);
        let h = self.height;
        self.dmost.iter_mut().for_each(|d| *d = h);
        self.open = self.umost.len();
    }

    #[inline]
    pub fn umost(&self) -> &[i32] {
        &self.umost
    }

    #[inline]
    pub fn dmost(&self) -> &[i32] {
        &self.dmost
    }

    /// Columns with any open row left
    #[inline]
    pub fn open_columns(&self) -> usize {
        self.open
    }

    #[inline]
    pub fn is_open(&self, x: usize) -> bool {
        self.umost[x] < self.dmost[x]
    }

    pub fn any_open(&self, x1: i32, x2: i32) -> bool {
        let x1 = x1.max(0) as usize;
        let x2 = (x2.max(0) as usize).min(self.umost.len());
        (x1..x2).any(|x| self.is_open(x))
    }

    /// Cover everything above row `y`
    #[inline]
    pub fn raise_top(&mut self, x: usize, y: i32) {
        if !self.is_open(x) || y <= self.umost[x] {
            return;
        }
        if y >= self.dmost[x] {
            self.close(x);
        } else {
            self.umost[x] = y;
        }
    }

    /// Cover everything from row `y` down
    #[inline]
    pub fn lower_bottom(&mut self, x: usize, y: i32) {
        if !self.is_open(x) || y >= self.dmost[x] {
            return;
        }
        if y <= self.umost[x] {
            self.close(x);
        } else {
            self.dmost[x] = y;
        }
    }

    #[inline]
    pub fn close(&mut self, x: usize) {
        if self.is_open(x) {
            self.open -= 1;
            self.umost[x] = self.dmost[x];
        }
    }
}

/// Sectors waiting to be scanned, first in first out. A sector goes in at
/// most once a frame.
#[derive(Debug, Clone)]
pub struct SectorQueue {
    queue: VecDeque<usize>,
    visited: Vec<u64>,
    capacity: usize,
}

impl SectorQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            visited: vec![0; capacity.div_ceil(64)],
            capacity,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
        self.visited.iter_mut().for_each(|v| *v = 0);
    }

    #[inline]
    pub fn is_visited(&self, sector: usize) -> bool {
        sector < self.capacity && self.visited[sector >> 6] & (1 << (sector & 63)) != 0
    }

    /// Queue `sector` unless it has been queued before this frame
    pub fn push(&mut self, sector: usize) -> Result<bool, RenderError> {
        if sector >= self.capacity {
            return Err(RenderError::Capacity {
                what: "sectors in the traversal queue",
                max: self.capacity,
            });
        }
        if self.is_visited(sector) {
            return Ok(false);
        }
        self.visited[sector >> 6] |= 1 << (sector & 63);
        self.queue.push_back(sector);
        Ok(true)
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{OcclusionBuffer, SectorQueue};
    use crate::RenderError;

    #[test]
    fn counter_tracks_closures() {
        let mut occ = OcclusionBuffer::new(4, 100);
        assert_eq!(occ.open_columns(), 4);
        occ.raise_top(0, 40);
        occ.lower_bottom(0, 60);
        assert_eq!((occ.umost()[0], occ.dmost()[0]), (40, 60));
        assert_eq!(occ.open_columns(), 4);

        occ.raise_top(0, 60);
        assert!(!occ.is_open(0));
        assert_eq!(occ.open_columns(), 3);
        // Closing twice doesn't count twice
        occ.close(0);
        occ.lower_bottom(0, 10);
        assert_eq!(occ.open_columns(), 3);

        occ.lower_bottom(1, 0);
        occ.close(2);
        assert_eq!(occ.open_columns(), 1);
        assert!(occ.any_open(0, 4));
        assert!(!occ.any_open(0, 3));

        occ.clear();
        assert_eq!(occ.open_columns(), 4);
        assert_eq!((occ.umost()[2], occ.dmost()[2]), (0, 100));
    }

    #[test]
    fn bounds_only_tighten() {
        let mut occ = OcclusionBuffer::new(1, 100);
        occ.raise_top(0, 30);
        occ.raise_top(0, 20);
        occ.lower_bottom(0, 80);
        occ.lower_bottom(0, 90);
        assert_eq!((occ.umost()[0], occ.dmost()[0]), (30, 80));
    }

    #[test]
    fn queue_visits_once_in_order() {
        let mut q = SectorQueue::new(100);
        assert_eq!(q.push(5), Ok(true));
        assert_eq!(q.push(70), Ok(true));
        assert_eq!(q.push(5), Ok(false));
        assert!(q.is_visited(70));
        assert!(!q.is_visited(6));
        assert_eq!(q.pop(), Some(5));
        assert_eq!(q.pop(), Some(70));
        assert!(q.is_empty());
        // Still visited after leaving the queue
        assert_eq!(q.push(5), Ok(false));
        assert!(matches!(q.push(100), Err(RenderError::Capacity { .. })));

        q.clear();
        assert_eq!(q.push(5), Ok(true));
    }
}
