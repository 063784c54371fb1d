use super::{FixedNum, FixedVec2, Transform2D, EPSILON};
use crate::error::MatrixError;

/// Dense row-major fixed-point matrix.
///
/// Every fallible operation returns a [`MatrixError`] instead of panicking: bad
/// dimensions and mismatched operands are usage bugs, while [`MatrixError::Singular`]
/// reports a genuinely non-invertible configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<FixedNum>,
}

impl Matrix {
    /// Zero-filled `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        if rows == 0 || cols == 0 {
            return Err(MatrixError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            data: vec![FixedNum::ZERO; rows * cols],
        })
    }

    /// `n x n` identity.
    pub fn identity(n: usize) -> Result<Self, MatrixError> {
        let mut matrix = Self::new(n, n)?;
        for i in 0..n {
            matrix.data[i * n + i] = FixedNum::ONE;
        }
        Ok(matrix)
    }

    pub fn from_rows(rows: &[&[FixedNum]]) -> Result<Self, MatrixError> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, |r| r.len());
        let mut matrix = Self::new(row_count, col_count)?;
        for (r, row) in rows.iter().enumerate() {
            if row.len() != col_count {
                return Err(MatrixError::InvalidDimensions { rows: row_count, cols: row.len() });
            }
            matrix.data[r * col_count..(r + 1) * col_count].copy_from_slice(row);
        }
        Ok(matrix)
    }

    pub fn from_3x3(rows: [[FixedNum; 3]; 3]) -> Self {
        Self {
            rows: 3,
            cols: 3,
            data: rows.iter().flatten().copied().collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Element at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<FixedNum> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Set element at `(row, col)`. Returns `false` when out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: FixedNum) -> bool {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] = value;
            true
        } else {
            false
        }
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> FixedNum {
        self.data[row * self.cols + col]
    }

    pub fn add(&self, other: &Self) -> Result<Self, MatrixError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(self.mismatch("add", other));
        }
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| *a + *b).collect(),
        })
    }

    pub fn mul(&self, other: &Self) -> Result<Self, MatrixError> {
        if self.cols != other.rows {
            return Err(self.mismatch("multiply", other));
        }
        let mut out = Self::new(self.rows, other.cols)?;
        for r in 0..self.rows {
            for c in 0..other.cols {
                let mut sum = FixedNum::ZERO;
                for k in 0..self.cols {
                    sum += self.at(r, k) * other.at(k, c);
                }
                out.data[r * other.cols + c] = sum;
            }
        }
        Ok(out)
    }

    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self.at(r, c));
            }
        }
        Self { rows: self.cols, cols: self.rows, data }
    }

    /// Gauss-Jordan inversion with partial pivoting.
    pub fn inverse(&self) -> Result<Self, MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare { rows: self.rows, cols: self.cols });
        }
        let n = self.rows;
        let mut work = self.clone();
        let mut inv = Self::identity(n)?;

        for col in 0..n {
            // Largest magnitude pivot keeps the fixed-point error bounded
            let mut pivot_row = col;
            for row in (col + 1)..n {
                if work.at(row, col).abs() > work.at(pivot_row, col).abs() {
                    pivot_row = row;
                }
            }
            let pivot = work.at(pivot_row, col);
            if pivot.abs() <= EPSILON {
                return Err(MatrixError::Singular);
            }
            if pivot_row != col {
                work.swap_rows(pivot_row, col);
                inv.swap_rows(pivot_row, col);
            }

            for c in 0..n {
                let idx = col * n + c;
                work.data[idx] /= pivot;
                inv.data[idx] /= pivot;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = work.at(row, col);
                if factor == FixedNum::ZERO {
                    continue;
                }
                for c in 0..n {
                    let w = work.at(col, c);
                    let i = inv.at(col, c);
                    work.data[row * n + c] -= factor * w;
                    inv.data[row * n + c] -= factor * i;
                }
            }
        }

        Ok(inv)
    }

    /// Interpret a homogeneous 3x3 matrix as a [`Transform2D`].
    pub fn to_transform(&self) -> Result<Transform2D, MatrixError> {
        if self.rows != 3 || self.cols != 3 {
            return Err(MatrixError::DimensionMismatch {
                op: "convert",
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: 3,
                rhs_cols: 3,
            });
        }
        Ok(Transform2D::new(
            FixedVec2::new(self.at(0, 0), self.at(1, 0)),
            FixedVec2::new(self.at(0, 1), self.at(1, 1)),
            FixedVec2::new(self.at(0, 2), self.at(1, 2)),
        ))
    }

    pub fn approx_eq(&self, other: &Self, tolerance: FixedNum) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (*a - *b).abs() <= tolerance)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    fn mismatch(&self, op: &'static str, other: &Self) -> MatrixError {
        MatrixError::DimensionMismatch {
            op,
            lhs_rows: self.rows,
            lhs_cols: self.cols,
            rhs_rows: other.rows,
            rhs_cols: other.cols,
        }
    }
}
