use serde::{Deserialize, Serialize};

use crate::fixed_math::{Aabb, FixedNum, FixedVec2, Transform2D};

/// Pose of a body as committed at the end of one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub position: FixedVec2,
    pub angle: FixedNum,
    pub facing: FixedVec2,
    pub aabb: Aabb,
}

impl HistoryRecord {
    pub fn pose(&self) -> Transform2D {
        Transform2D::from_pose(self.position, self.facing)
    }
}

/// Fixed-capacity ring of [`HistoryRecord`]s, newest first when read.
///
/// `get(0)` is the most recent commit, `get(n)` the commit `n` ticks before it.
/// Reads past the stored length return `None`; callers decide whether that is an
/// error (out of the configured window) or an exclusion (body too young).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryBuffer {
    records: Vec<HistoryRecord>,
    head: usize,
    len: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: vec![HistoryRecord::default(); capacity],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append, evicting the oldest record once full.
    pub fn push(&mut self, record: HistoryRecord) {
        self.head = (self.head + 1) % self.records.len();
        self.records[self.head] = record;
        self.len = (self.len + 1).min(self.records.len());
    }

    pub fn get(&self, ticks_behind: usize) -> Option<&HistoryRecord> {
        if ticks_behind >= self.len {
            return None;
        }
        let cap = self.records.len();
        Some(&self.records[(self.head + cap - ticks_behind) % cap])
    }

    pub fn latest(&self) -> Option<&HistoryRecord> {
        self.get(0)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Records oldest first.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &HistoryRecord> + '_ {
        (0..self.len).rev().filter_map(move |k| self.get(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: i32) -> HistoryRecord {
        HistoryRecord {
            position: FixedVec2::new(FixedNum::from_num(x), FixedNum::ZERO),
            ..Default::default()
        }
    }

    #[test]
    fn test_get_is_newest_first() {
        let mut history = HistoryBuffer::new(4);
        for x in 0..3 {
            history.push(record(x));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.get(0), Some(&record(2)));
        assert_eq!(history.get(2), Some(&record(0)));
        assert_eq!(history.get(3), None);
    }

    #[test]
    fn test_full_ring_evicts_oldest() {
        let mut history = HistoryBuffer::new(3);
        for x in 0..10 {
            history.push(record(x));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.get(0), Some(&record(9)));
        assert_eq!(history.get(2), Some(&record(7)));
        assert!(history.get(3).is_none());

        let order: Vec<_> = history.iter_oldest_first().map(|r| r.position.x).collect();
        assert_eq!(order, vec![FixedNum::from_num(7), FixedNum::from_num(8), FixedNum::from_num(9)]);
    }

    #[test]
    fn test_clear_forgets_records() {
        let mut history = HistoryBuffer::new(2);
        history.push(record(1));
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}
