//! Bounded FIFO frontier

use crate::error::{DkstrError, Result};
use dkstr_maps::Coord;
use std::collections::VecDeque;

/// FIFO of coordinates with a hard capacity.
#[derive(Debug)]
pub(crate) struct FrontierQueue {
    items: VecDeque<Coord>,
    capacity: usize,
}

impl FrontierQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `c`; fails once `capacity` entries are queued.
    pub(crate) fn push(&mut self, c: Coord) -> Result<()> {
        if self.items.len() == self.capacity {
            return Err(DkstrError::QueueOverflow {
                capacity: self.capacity,
            });
        }
        self.items.push_back(c);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<Coord> {
        self.items.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut q = FrontierQueue::with_capacity(3);
        q.push(Coord::new(1, 0)).unwrap();
        q.push(Coord::new(2, 0)).unwrap();
        assert_eq!(q.pop(), Some(Coord::new(1, 0)));
        q.push(Coord::new(3, 0)).unwrap();
        assert_eq!(q.pop(), Some(Coord::new(2, 0)));
        assert_eq!(q.pop(), Some(Coord::new(3, 0)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut q = FrontierQueue::with_capacity(1);
        q.push(Coord::new(0, 0)).unwrap();
        let err = q.push(Coord::new(1, 0)).unwrap_err();
        assert!(matches!(err, DkstrError::QueueOverflow { capacity: 1 }));
    }
}
