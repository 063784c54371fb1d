use serde::{Deserialize, Serialize};

use super::{atan2, FixedNum, FixedVec2, Matrix};
use crate::error::MatrixError;

/// 2D affine transform stored as two basis columns and an origin.
///
/// Maps a local point `p` to `x * p.x + y * p.y + origin`. The basis is not kept
/// orthonormal automatically; call [`Transform2D::orthonormalized`] when scale or
/// skew must be discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transform2D {
    pub x: FixedVec2,
    pub y: FixedVec2,
    pub origin: FixedVec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        x: FixedVec2::UNIT_X,
        y: FixedVec2::UNIT_Y,
        origin: FixedVec2::ZERO,
    };

    pub fn new(x: FixedVec2, y: FixedVec2, origin: FixedVec2) -> Self {
        Self { x, y, origin }
    }

    /// Rigid transform from a position and a unit facing vector `(cos, sin)`.
    pub fn from_pose(position: FixedVec2, facing: FixedVec2) -> Self {
        Self {
            x: facing,
            y: facing.left(),
            origin: position,
        }
    }

    pub fn from_rotation(angle: FixedNum) -> Self {
        Self::from_pose(FixedVec2::ZERO, FixedVec2::from_angle(angle))
    }

    /// Rotation, then per-axis scale, then translation.
    pub fn from_rotation_scale_origin(angle: FixedNum, scale: FixedVec2, origin: FixedVec2) -> Self {
        let facing = FixedVec2::from_angle(angle);
        Self {
            x: facing * scale.x,
            y: facing.left() * scale.y,
            origin,
        }
    }

    pub fn determinant(&self) -> FixedNum {
        self.x.cross(self.y)
    }

    pub fn basis_xform(&self, v: FixedVec2) -> FixedVec2 {
        self.x * v.x + self.y * v.y
    }

    /// Inverse basis application assuming an orthonormal basis.
    pub fn basis_xform_inv(&self, v: FixedVec2) -> FixedVec2 {
        FixedVec2::new(self.x.dot(v), self.y.dot(v))
    }

    pub fn xform(&self, v: FixedVec2) -> FixedVec2 {
        self.basis_xform(v) + self.origin
    }

    /// Inverse point transform assuming an orthonormal basis.
    pub fn xform_inv(&self, v: FixedVec2) -> FixedVec2 {
        self.basis_xform_inv(v - self.origin)
    }

    /// Inverse of a rotation + translation transform (transposes the basis).
    ///
    /// Only valid when the basis is orthonormal; use [`Transform2D::affine_inverse`]
    /// when scale is present.
    pub fn inverse(&self) -> Self {
        let x = FixedVec2::new(self.x.x, self.y.x);
        let y = FixedVec2::new(self.x.y, self.y.y);
        let basis_only = Self { x, y, origin: FixedVec2::ZERO };
        Self {
            x,
            y,
            origin: -basis_only.basis_xform(self.origin),
        }
    }

    /// General inverse; handles non-uniform scale and skew.
    pub fn affine_inverse(&self) -> Result<Self, MatrixError> {
        let det = self.determinant();
        if det == FixedNum::ZERO {
            return Err(MatrixError::Singular);
        }
        let inv_det = FixedNum::ONE / det;
        let x = FixedVec2::new(self.y.y, -self.x.y) * inv_det;
        let y = FixedVec2::new(-self.y.x, self.x.x) * inv_det;
        let basis_only = Self { x, y, origin: FixedVec2::ZERO };
        Ok(Self {
            x,
            y,
            origin: -basis_only.basis_xform(self.origin),
        })
    }

    pub fn rotation(&self) -> FixedNum {
        atan2(self.x.y, self.x.x)
    }

    pub fn scale(&self) -> FixedVec2 {
        let sign = if self.determinant() < FixedNum::ZERO {
            -FixedNum::ONE
        } else {
            FixedNum::ONE
        };
        FixedVec2::new(self.x.length(), self.y.length() * sign)
    }

    /// Gram-Schmidt on the basis columns, keeping `x`'s direction.
    pub fn orthonormalized(&self) -> Self {
        let x = self.x.normalize();
        let y = (self.y - x * x.dot(self.y)).normalize();
        Self { x, y, origin: self.origin }
    }

    /// Homogeneous 3x3 matrix form (columns: x, y, origin).
    pub fn to_matrix(&self) -> Matrix {
        let zero = FixedNum::ZERO;
        let one = FixedNum::ONE;
        Matrix::from_3x3([
            [self.x.x, self.y.x, self.origin.x],
            [self.x.y, self.y.y, self.origin.y],
            [zero, zero, one],
        ])
    }

    pub fn approx_eq(&self, other: &Self, tolerance: FixedNum) -> bool {
        let close = |a: FixedVec2, b: FixedVec2| {
            (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance
        };
        close(self.x, other.x) && close(self.y, other.y) && close(self.origin, other.origin)
    }
}

impl std::ops::Mul for Transform2D {
    type Output = Self;

    /// `self * rhs` applies `rhs` first, then `self`.
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            x: self.basis_xform(rhs.x),
            y: self.basis_xform(rhs.y),
            origin: self.xform(rhs.origin),
        }
    }
}
