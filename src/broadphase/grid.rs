use tracing::debug;

use super::{CellRange, Entry, SpatialHash, MAX_CELLS_PER_ENTRY};
use crate::fixed_math::{Aabb, FixedNum};

impl SpatialHash {
    pub(crate) fn cell_coord(&self, value: FixedNum) -> i32 {
        (value / self.cell_size).floor().saturating_to_num::<i32>()
    }

    /// Every cell `aabb` overlaps (boundaries inclusive).
    pub(crate) fn cell_range(&self, aabb: &Aabb) -> CellRange {
        CellRange {
            min: (self.cell_coord(aabb.left), self.cell_coord(aabb.bottom)),
            max: (self.cell_coord(aabb.right), self.cell_coord(aabb.top)),
        }
    }

    /// Insert `id` with its tight `aabb`; the stored box is inflated by the margin.
    /// Re-inserting an existing id moves it.
    pub fn insert(&mut self, id: u32, aabb: Aabb) {
        if self.contains(id) {
            self.remove(id);
        }

        let fat = aabb.expand(self.margin);
        let range = self.cell_range(&fat);
        let oversize = range.cell_count() > MAX_CELLS_PER_ENTRY;

        if oversize {
            debug!(
                "[BROADPHASE] Entry {} spans {} cells, storing as oversize",
                id,
                range.cell_count()
            );
            self.oversize.push(id);
        } else {
            for row in range.min.1..=range.max.1 {
                for col in range.min.0..=range.max.0 {
                    self.cells.entry((col, row)).or_default().push(id);
                }
            }
        }

        let idx = id as usize;
        if idx >= self.entries.len() {
            self.entries.resize(idx + 1, None);
        }
        self.entries[idx] = Some(Entry { fat, range, oversize });
        self.len += 1;
    }

    /// Remove `id` from every cell it occupies. Returns false if it was not indexed.
    pub fn remove(&mut self, id: u32) -> bool {
        let Some(entry) = self.entries.get_mut(id as usize).and_then(Option::take) else {
            return false;
        };

        if entry.oversize {
            self.oversize.retain(|&other| other != id);
        } else {
            let range = entry.range;
            for row in range.min.1..=range.max.1 {
                for col in range.min.0..=range.max.0 {
                    if let Some(cell) = self.cells.get_mut(&(col, row)) {
                        cell.retain(|other| *other != id);
                        if cell.is_empty() {
                            self.cells.remove(&(col, row));
                        }
                    }
                }
            }
        }
        self.len -= 1;
        true
    }

    /// Refit `id` to its new tight `aabb`. Nothing happens while the tight box is
    /// still inside the stored fat box. Returns true when the entry was reinserted.
    pub fn update(&mut self, id: u32, aabb: Aabb) -> bool {
        match self.entry(id) {
            Some(entry) if entry.fat.contains(&aabb) => false,
            _ => {
                self.insert(id, aabb);
                true
            }
        }
    }
}
