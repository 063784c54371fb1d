//! CORDIC trigonometry over integer bit patterns.
//!
//! Works on a Q2.30 internal representation so results keep the full 16 fractional
//! bits of [`FixedNum`] after rounding. Only shifts, adds and table lookups are used,
//! which keeps every peer bit-identical.

use super::{wrap_angle, FixedNum, HALF_PI, PI};

/// atan(2^-i) in Q2.30.
const ATAN_TABLE: [i64; 31] = [
    843_314_857, 497_837_829, 263_043_837, 133_525_159, 67_021_687, 33_543_516, 16_775_851,
    8_388_437, 4_194_283, 2_097_149, 1_048_576, 524_288, 262_144, 131_072, 65_536, 32_768,
    16_384, 8_192, 4_096, 2_048, 1_024, 512, 256, 128, 64, 32, 16, 8, 4, 2, 1,
];

/// Product of cos(atan(2^-i)) in Q2.30.
const CORDIC_GAIN: i64 = 652_032_874;

/// π in Q2.30 (vectoring mode offset).
const PI_Q30: i64 = 3_373_259_426;

/// Shift between Q48.16 and Q2.30.
const Q_SHIFT: u32 = 14;

#[inline]
fn from_q30(value: i64) -> FixedNum {
    // Round to nearest before dropping the extra precision
    FixedNum::from_bits((value + (1 << (Q_SHIFT - 1))) >> Q_SHIFT)
}

/// Sine and cosine of `angle` (radians), returned as `(sin, cos)`.
///
/// Any input angle is accepted; it is wrapped into (-π, π] first.
pub fn sin_cos(angle: FixedNum) -> (FixedNum, FixedNum) {
    let mut theta = wrap_angle(angle);

    // CORDIC converges on roughly ±1.74 rad, so fold the outer quadrants in
    let mut flip = false;
    if theta > HALF_PI {
        theta -= PI;
        flip = true;
    } else if theta < -HALF_PI {
        theta += PI;
        flip = true;
    }

    let mut x = CORDIC_GAIN;
    let mut y = 0i64;
    let mut z = theta.to_bits() << Q_SHIFT;

    for (i, &step) in ATAN_TABLE.iter().enumerate() {
        let dx = y >> i;
        let dy = x >> i;
        if z >= 0 {
            x -= dx;
            y += dy;
            z -= step;
        } else {
            x += dx;
            y -= dy;
            z += step;
        }
    }

    let (sin, cos) = (from_q30(y), from_q30(x));
    if flip {
        (-sin, -cos)
    } else {
        (sin, cos)
    }
}

/// Four-quadrant arctangent of `y / x` in (-π, π]. Returns zero for the origin.
pub fn atan2(y: FixedNum, x: FixedNum) -> FixedNum {
    let (mut xb, mut yb) = (x.to_bits(), y.to_bits());
    if xb == 0 && yb == 0 {
        return FixedNum::ZERO;
    }

    // The angle is scale invariant: normalise magnitude into [2^28, 2^29) so the
    // vectoring iterations cannot overflow.
    let magnitude = xb.unsigned_abs().max(yb.unsigned_abs());
    let leading = 63 - magnitude.leading_zeros() as i32;
    let shift = 28 - leading;
    if shift > 0 {
        xb <<= shift;
        yb <<= shift;
    } else if shift < 0 {
        xb >>= -shift;
        yb >>= -shift;
    }

    let mut z = 0i64;
    if xb < 0 {
        z = if yb >= 0 { PI_Q30 } else { -PI_Q30 };
        xb = -xb;
        yb = -yb;
    }

    for (i, &step) in ATAN_TABLE.iter().enumerate() {
        let dx = yb >> i;
        let dy = xb >> i;
        if yb > 0 {
            xb += dx;
            yb -= dy;
            z += step;
        } else {
            xb -= dx;
            yb += dy;
            z -= step;
        }
    }

    wrap_angle(from_q30(z))
}
