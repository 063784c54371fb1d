use fixedbitset::FixedBitSet;

use super::SpatialHash;
use crate::fixed_math::{Aabb, FixedNum, FixedVec2, RayCast};

impl SpatialHash {
    /// Every id whose fat AABB overlaps `aabb`.
    ///
    /// Clears `out` before populating it. The result is a superset of the exact
    /// overlaps (callers re-verify against shapes) and is sorted by id.
    pub fn query_aabb(&self, aabb: &Aabb, out: &mut Vec<u32>) {
        self.collect(aabb, out, |fat| fat.overlaps(aabb));
    }

    /// Every id whose fat AABB touches the circle's bounding box.
    pub fn query_circle(&self, center: FixedVec2, radius: FixedNum, out: &mut Vec<u32>) {
        let bounds = Aabb::from_circle(center, radius);
        self.collect(&bounds, out, |fat| fat.query_circle_approx(center, radius));
    }

    /// Every id whose fat AABB the ray (or a circle of `radius` swept along it)
    /// passes through. Pass a zero radius for a plain ray.
    pub fn query_ray(&self, ray: &RayCast, radius: FixedNum, out: &mut Vec<u32>) {
        let bounds = Aabb::from_points(&[ray.origin, ray.end()]).expand(radius);
        self.collect(&bounds, out, |fat| fat.circle_cast(ray, radius));
    }

    fn collect(&self, bounds: &Aabb, out: &mut Vec<u32>, accept: impl Fn(&Aabb) -> bool) {
        out.clear();
        if self.len == 0 {
            return;
        }

        let mut seen = FixedBitSet::with_capacity(self.entries.len());
        let mut consider = |id: u32, out: &mut Vec<u32>| {
            let idx = id as usize;
            if seen.contains(idx) {
                return;
            }
            seen.insert(idx);
            if self.entry(id).is_some_and(|e| accept(&e.fat)) {
                out.push(id);
            }
        };

        let range = self.cell_range(bounds);
        if range.cell_count() > self.cells.len() as i64 {
            // Walking the occupied cells is cheaper than walking the query range
            for cell in self.cells.values() {
                for &id in cell {
                    consider(id, out);
                }
            }
        } else {
            for row in range.min.1..=range.max.1 {
                for col in range.min.0..=range.max.0 {
                    if let Some(cell) = self.cells.get(&(col, row)) {
                        for &id in cell {
                            consider(id, out);
                        }
                    }
                }
            }
        }

        for &id in &self.oversize {
            consider(id, out);
        }

        out.sort_unstable();
    }
}
