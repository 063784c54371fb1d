use serde::{Deserialize, Serialize};

use super::{FixedNum, FixedVec2, RayCast};

/// Axis-aligned bounding box, y up.
///
/// Invariant: `top >= bottom` and `right >= left`. Every constructor in this module
/// keeps it; building one by hand with swapped bounds makes every predicate false.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aabb {
    pub top: FixedNum,
    pub bottom: FixedNum,
    pub left: FixedNum,
    pub right: FixedNum,
}

impl Aabb {
    pub fn new(top: FixedNum, bottom: FixedNum, left: FixedNum, right: FixedNum) -> Self {
        Self { top, bottom, left, right }
    }

    pub fn from_min_max(min: FixedVec2, max: FixedVec2) -> Self {
        Self {
            top: max.y,
            bottom: min.y,
            left: min.x,
            right: max.x,
        }
    }

    /// Tight box around `points`. An empty slice yields a zero box at the origin.
    pub fn from_points(points: &[FixedVec2]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (min, max) = points
            .iter()
            .skip(1)
            .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
        Self::from_min_max(min, max)
    }

    pub fn from_circle(center: FixedVec2, radius: FixedNum) -> Self {
        Self::from_center_extents(center, FixedVec2::new(radius, radius))
    }

    pub fn from_center_extents(center: FixedVec2, extents: FixedVec2) -> Self {
        Self::from_min_max(center - extents, center + extents)
    }

    pub fn min(&self) -> FixedVec2 {
        FixedVec2::new(self.left, self.bottom)
    }

    pub fn max(&self) -> FixedVec2 {
        FixedVec2::new(self.right, self.top)
    }

    pub fn center(&self) -> FixedVec2 {
        let two = FixedNum::from_num(2);
        FixedVec2::new((self.left + self.right) / two, (self.bottom + self.top) / two)
    }

    /// Half-size along each axis.
    pub fn extent(&self) -> FixedVec2 {
        let two = FixedNum::from_num(2);
        FixedVec2::new(self.width() / two, self.height() / two)
    }

    pub fn width(&self) -> FixedNum {
        self.right - self.left
    }

    pub fn height(&self) -> FixedNum {
        self.top - self.bottom
    }

    /// Smallest box containing both.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            top: self.top.max(other.top),
            bottom: self.bottom.min(other.bottom),
            left: self.left.min(other.left),
            right: self.right.max(other.right),
        }
    }

    /// Grow every side by `amount`. Negative amounts are treated as zero.
    pub fn expand(&self, amount: FixedNum) -> Self {
        let amount = amount.max(FixedNum::ZERO);
        Self {
            top: self.top + amount,
            bottom: self.bottom - amount,
            left: self.left - amount,
            right: self.right + amount,
        }
    }

    /// Stretch the box toward `motion` so it covers the whole swept volume.
    pub fn sweep_extension(&self, motion: FixedVec2) -> Self {
        let mut swept = *self;
        if motion.x > FixedNum::ZERO {
            swept.right += motion.x;
        } else {
            swept.left += motion.x;
        }
        if motion.y > FixedNum::ZERO {
            swept.top += motion.y;
        } else {
            swept.bottom += motion.y;
        }
        swept
    }

    /// True when `other` lies entirely inside this box (boundaries inclusive).
    pub fn contains(&self, other: &Self) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.bottom >= self.bottom
            && other.top <= self.top
    }

    pub fn contains_point(&self, point: FixedVec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.bottom && point.y <= self.top
    }

    /// Touching boxes count as overlapping.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.left <= other.right
            && self.right >= other.left
            && self.bottom <= other.top
            && self.top >= other.bottom
    }

    /// Conservative circle test: compares against the circle's bounding box.
    pub fn query_circle_approx(&self, center: FixedVec2, radius: FixedNum) -> bool {
        self.overlaps(&Self::from_circle(center, radius))
    }

    /// Slab test against the finite ray. Returns true if any part of the segment
    /// touches the box, including a ray that starts inside.
    pub fn ray_cast(&self, ray: &RayCast) -> bool {
        let mut t_min = FixedNum::ZERO;
        let mut t_max = ray.distance;

        let axes = [
            (ray.origin.x, ray.direction.x, self.left, self.right),
            (ray.origin.y, ray.direction.y, self.bottom, self.top),
        ];
        for (origin, dir, lo, hi) in axes {
            if dir == FixedNum::ZERO {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let mut t0 = (lo - origin) / dir;
            let mut t1 = (hi - origin) / dir;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }

    /// Sweep of a circle of `radius` along the ray: a ray test against the box
    /// grown by the radius.
    pub fn circle_cast(&self, ray: &RayCast, radius: FixedNum) -> bool {
        self.expand(radius).ray_cast(ray)
    }
}
