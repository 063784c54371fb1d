use serde::{Deserialize, Serialize};

use super::{atan2, sin_cos, FixedNum};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedVec2 {
    pub x: FixedNum,
    pub y: FixedNum,
}

/// Components below this magnitude lose most of their precision when squared.
const SMALL_COMPONENT: FixedNum = FixedNum::ONE;
/// Exact power-of-two rescale applied to small vectors before measuring them.
const SMALL_RESCALE: i32 = 256;

impl FixedVec2 {
    pub const ZERO: Self = Self { x: FixedNum::ZERO, y: FixedNum::ZERO };
    pub const UNIT_X: Self = Self { x: FixedNum::ONE, y: FixedNum::ZERO };
    pub const UNIT_Y: Self = Self { x: FixedNum::ZERO, y: FixedNum::ONE };

    pub fn new(x: FixedNum, y: FixedNum) -> Self {
        Self { x, y }
    }

    pub fn from_f32(x: f32, y: f32) -> Self {
        Self {
            x: FixedNum::from_num(x),
            y: FixedNum::from_num(y),
        }
    }

    /// Lossy conversion for logging and host rendering.
    pub fn to_f32(self) -> (f32, f32) {
        (self.x.to_num(), self.y.to_num())
    }

    /// Unit vector pointing at `angle` radians (the body "facing" vector).
    pub fn from_angle(angle: FixedNum) -> Self {
        let (sin, cos) = sin_cos(angle);
        Self { x: cos, y: sin }
    }

    pub fn angle(self) -> FixedNum {
        atan2(self.y, self.x)
    }

    pub fn is_zero(self) -> bool {
        self.x == FixedNum::ZERO && self.y == FixedNum::ZERO
    }

    pub fn length(self) -> FixedNum {
        let largest = self.x.abs().max(self.y.abs());
        if largest == FixedNum::ZERO {
            return FixedNum::ZERO;
        }
        if largest < SMALL_COMPONENT {
            let scale = FixedNum::from_num(SMALL_RESCALE);
            return (self * scale).length_squared().sqrt() / scale;
        }
        self.length_squared().sqrt()
    }

    pub fn length_squared(self) -> FixedNum {
        self.x * self.x + self.y * self.y
    }

    /// Unit vector in the same direction, or [`FixedVec2::ZERO`] for a zero vector.
    /// Callers that need a direction must guard against the zero result.
    pub fn normalize(self) -> Self {
        let largest = self.x.abs().max(self.y.abs());
        if largest == FixedNum::ZERO {
            return Self::ZERO;
        }
        let scaled = if largest < SMALL_COMPONENT {
            self * FixedNum::from_num(SMALL_RESCALE)
        } else {
            self
        };
        let len = scaled.length_squared().sqrt();
        if len == FixedNum::ZERO {
            Self::ZERO
        } else {
            Self {
                x: scaled.x / len,
                y: scaled.y / len,
            }
        }
    }

    pub fn dot(self, other: Self) -> FixedNum {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(self, other: Self) -> FixedNum {
        self.x * other.y - self.y * other.x
    }

    /// Cross product of a scalar (z axis) with this vector: `s × v`.
    pub fn cross_scalar(s: FixedNum, v: Self) -> Self {
        Self { x: -s * v.y, y: s * v.x }
    }

    /// Counter-clockwise perpendicular.
    pub fn left(self) -> Self {
        Self { x: -self.y, y: self.x }
    }

    /// Clockwise perpendicular.
    pub fn right(self) -> Self {
        Self { x: self.y, y: -self.x }
    }

    /// Rotate by a unit facing vector `(cos, sin)`.
    pub fn rotate(self, facing: Self) -> Self {
        Self {
            x: self.x * facing.x - self.y * facing.y,
            y: self.x * facing.y + self.y * facing.x,
        }
    }

    /// Undo [`FixedVec2::rotate`] for the same facing.
    pub fn inv_rotate(self, facing: Self) -> Self {
        Self {
            x: self.x * facing.x + self.y * facing.y,
            y: -self.x * facing.y + self.y * facing.x,
        }
    }

    /// Remove the component along `normal` (unit length).
    pub fn slide(self, normal: Self) -> Self {
        self - normal * self.dot(normal)
    }

    pub fn distance(self, other: Self) -> FixedNum {
        (self - other).length()
    }

    pub fn distance_squared(self, other: Self) -> FixedNum {
        (self - other).length_squared()
    }

    pub fn min(self, other: Self) -> Self {
        Self { x: self.x.min(other.x), y: self.y.min(other.y) }
    }

    pub fn max(self, other: Self) -> Self {
        Self { x: self.x.max(other.x), y: self.y.max(other.y) }
    }
}

impl std::ops::Add for FixedVec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::AddAssign for FixedVec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for FixedVec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::SubAssign for FixedVec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl std::ops::Mul<FixedNum> for FixedVec2 {
    type Output = Self;
    fn mul(self, rhs: FixedNum) -> Self::Output {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

impl std::ops::Div<FixedNum> for FixedVec2 {
    type Output = Self;
    fn div(self, rhs: FixedNum) -> Self::Output {
        Self { x: self.x / rhs, y: self.y / rhs }
    }
}

impl std::ops::Neg for FixedVec2 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self { x: -self.x, y: -self.y }
    }
}
