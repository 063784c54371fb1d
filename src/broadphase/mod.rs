use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::body::BodyType;
use crate::fixed_math::{Aabb, FixedNum, FixedVec2, RayCast};

mod grid;
mod query;

/// Entries whose fat AABB spans more cells than this go to the oversize list,
/// which every query returns.
pub const MAX_CELLS_PER_ENTRY: i64 = 64;

/// Sparse uniform-grid spatial index over body AABBs.
///
/// The grid divides the plane into square cells keyed by integer coordinates, so
/// there is no map size to configure and nothing falls outside the index. An
/// entry is stored in **every** cell its fat AABB overlaps, which is what keeps
/// queries free of false negatives for large bodies.
///
/// # Use Cases
///
/// - **Pair generation:** dynamic bodies against both indices every tick
/// - **Queries:** point, circle, ray and sweep candidates
/// - **Explosions:** every body inside the blast radius
///
/// # Example
///
/// ```rust
/// use kestrel::broadphase::SpatialHash;
/// use kestrel::fixed_math::{Aabb, FixedNum, FixedVec2};
///
/// let mut hash = SpatialHash::new(FixedNum::from_num(4), FixedNum::ZERO);
/// hash.insert(7, Aabb::from_circle(FixedVec2::ZERO, FixedNum::ONE));
///
/// let mut found = Vec::new();
/// hash.query_aabb(&Aabb::from_circle(FixedVec2::ZERO, FixedNum::from_num(2)), &mut found);
/// assert_eq!(found, vec![7]);
/// ```
///
/// # Performance
///
/// - **Insert/Remove:** O(cells covered)
/// - **Update:** O(1) while the tight AABB stays inside the fat one
/// - **Query:** O(k) over entries in the covered cells, plus a sort of the result
///
/// # Implementation Notes
///
/// - Dynamic entries are inflated by `margin` and only reinserted when they escape
/// - Results are deduplicated with a bitset and sorted by id, so iteration order
///   never depends on hash map layout
#[derive(Clone, Debug)]
pub struct SpatialHash {
    cell_size: FixedNum,
    margin: FixedNum,
    cells: FxHashMap<(i32, i32), SmallVec<[u32; 8]>>,
    entries: Vec<Option<Entry>>,
    oversize: Vec<u32>,
    len: usize,
}

/// Cell range an entry was inserted under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CellRange {
    pub min: (i32, i32),
    pub max: (i32, i32),
}

impl CellRange {
    pub fn cell_count(&self) -> i64 {
        let cols = (self.max.0 as i64 - self.min.0 as i64) + 1;
        let rows = (self.max.1 as i64 - self.min.1 as i64) + 1;
        cols * rows
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Entry {
    pub fat: Aabb,
    pub range: CellRange,
    pub oversize: bool,
}

impl SpatialHash {
    pub fn new(cell_size: FixedNum, margin: FixedNum) -> Self {
        Self {
            cell_size,
            margin: margin.max(FixedNum::ZERO),
            cells: FxHashMap::default(),
            entries: Vec::new(),
            oversize: Vec::new(),
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
        self.oversize.clear();
        self.len = 0;
    }

    /// Number of indexed ids.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Count the total number of id entries across all cells.
    /// Useful for debugging and diagnostics.
    pub fn total_entries(&self) -> usize {
        self.cells.values().map(|cell| cell.len()).sum()
    }

    /// Count the number of non-empty cells.
    pub fn non_empty_cells(&self) -> usize {
        self.cells.values().filter(|cell| !cell.is_empty()).count()
    }

    pub fn oversize_count(&self) -> usize {
        self.oversize.len()
    }

    pub fn cell_size(&self) -> FixedNum {
        self.cell_size
    }

    pub fn margin(&self) -> FixedNum {
        self.margin
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entry(id).is_some()
    }

    /// Fat AABB stored for `id`.
    pub fn fat_aabb(&self, id: u32) -> Option<Aabb> {
        self.entry(id).map(|e| e.fat)
    }

    pub(crate) fn entry(&self, id: u32) -> Option<&Entry> {
        self.entries.get(id as usize).and_then(Option::as_ref)
    }
}

/// The two independent indices: static bodies (tight AABBs, built once) and
/// everything that moves (fat AABBs, refit every tick).
#[derive(Clone, Debug)]
pub struct Broadphase {
    pub static_index: SpatialHash,
    pub dynamic_index: SpatialHash,
}

impl Broadphase {
    pub fn new(cell_size: FixedNum, dynamic_margin: FixedNum) -> Self {
        Self {
            static_index: SpatialHash::new(cell_size, FixedNum::ZERO),
            dynamic_index: SpatialHash::new(cell_size, dynamic_margin),
        }
    }

    pub fn index_for(&self, body_type: BodyType) -> &SpatialHash {
        match body_type {
            BodyType::Static => &self.static_index,
            _ => &self.dynamic_index,
        }
    }

    pub fn index_for_mut(&mut self, body_type: BodyType) -> &mut SpatialHash {
        match body_type {
            BodyType::Static => &mut self.static_index,
            _ => &mut self.dynamic_index,
        }
    }

    /// Query both indices and merge into one sorted, deduplicated list.
    pub fn query_aabb(&self, aabb: &Aabb, out: &mut Vec<u32>) {
        let mut dynamic = Vec::new();
        self.static_index.query_aabb(aabb, out);
        self.dynamic_index.query_aabb(aabb, &mut dynamic);
        merge_sorted(out, &dynamic);
    }

    pub fn query_circle(&self, center: FixedVec2, radius: FixedNum, out: &mut Vec<u32>) {
        let mut dynamic = Vec::new();
        self.static_index.query_circle(center, radius, out);
        self.dynamic_index.query_circle(center, radius, &mut dynamic);
        merge_sorted(out, &dynamic);
    }

    pub fn query_ray(&self, ray: &RayCast, radius: FixedNum, out: &mut Vec<u32>) {
        let mut dynamic = Vec::new();
        self.static_index.query_ray(ray, radius, out);
        self.dynamic_index.query_ray(ray, radius, &mut dynamic);
        merge_sorted(out, &dynamic);
    }
}

/// Merge `extra` into the sorted `out`, keeping it sorted and unique.
fn merge_sorted(out: &mut Vec<u32>, extra: &[u32]) {
    if extra.is_empty() {
        return;
    }
    out.extend_from_slice(extra);
    out.sort_unstable();
    out.dedup();
}
