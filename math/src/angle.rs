use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use lazy_static::lazy_static;

use crate::{mul_scale, scale};

/// Units in a full circle
pub const ANGLE_COUNT: i32 = 2048;
pub const ANGLE_MASK: i32 = ANGLE_COUNT - 1;
pub const ANGLE_90: i32 = ANGLE_COUNT / 4;
pub const ANGLE_180: i32 = ANGLE_COUNT / 2;
pub const ANGLE_270: i32 = ANGLE_90 * 3;

/// Sine table values are scaled by this many bits
pub const SINE_BITS: u32 = 14;

const ATAN_STEPS: i32 = 1024;

lazy_static! {
    /// `sin(i * 2PI / 2048) * 16384`, rounded
    pub static ref SINE_TABLE: [i32; ANGLE_COUNT as usize] = {
        let mut table = [0i32; ANGLE_COUNT as usize];
        for (i, slot) in table.iter_mut().enumerate() {
            let a = i as f64 * 2.0 * PI / ANGLE_COUNT as f64;
            *slot = (a.sin() * (1 << SINE_BITS) as f64).round() as i32;
        }
        table
    };

    /// `atan(i / 1024)` in angle units with 6 extra fraction bits
    static ref ATAN_TABLE: [i32; ATAN_STEPS as usize + 1] = {
        let mut table = [0i32; ATAN_STEPS as usize + 1];
        for (i, slot) in table.iter_mut().enumerate() {
            let a = (i as f64 / ATAN_STEPS as f64).atan();
            *slot = (a * (ANGLE_COUNT << 6) as f64 / (2.0 * PI)).round() as i32;
        }
        table
    };
}

#[inline]
pub fn sin(ang: i32) -> i32 {
    SINE_TABLE[(ang & ANGLE_MASK) as usize]
}

#[inline]
pub fn cos(ang: i32) -> i32 {
    SINE_TABLE[((ang + ANGLE_90) & ANGLE_MASK) as usize]
}

#[inline]
fn signed_atan(k: i32) -> i32 {
    if k < 0 {
        -ATAN_TABLE[(-k) as usize]
    } else {
        ATAN_TABLE[k as usize]
    }
}

/// The angle of the vector `(dx, dy)` on the 2048 unit circle. A zero vector
/// is angle 0.
pub fn get_angle(dx: i32, dy: i32) -> i32 {
    if dx == 0 && dy == 0 {
        return 0;
    }
    if dx == 0 {
        return if dy > 0 { ANGLE_90 } else { ANGLE_270 };
    }
    if dy == 0 {
        return if dx > 0 { 0 } else { ANGLE_180 };
    }
    if (dx as i64).abs() > (dy as i64).abs() {
        let k = scale(ATAN_STEPS, dy, dx);
        let half = if dx < 0 { ANGLE_180 } else { 0 };
        ((signed_atan(k) >> 6) + half) & ANGLE_MASK
    } else {
        let k = scale(ATAN_STEPS, dx, dy);
        let half = if dy < 0 { ANGLE_180 } else { 0 };
        (ANGLE_90 - (signed_atan(k) >> 6) + half) & ANGLE_MASK
    }
}

/// Rotate `(x, y)` about `(px, py)` by `ang`
pub fn rotate_point(px: i32, py: i32, x: i32, y: i32, ang: i32) -> (i32, i32) {
    let dx = x - px;
    let dy = y - py;
    let c = cos(ang);
    let s = sin(ang);
    (
        px + mul_scale(dx, c, SINE_BITS) - mul_scale(dy, s, SINE_BITS),
        py + mul_scale(dy, c, SINE_BITS) + mul_scale(dx, s, SINE_BITS),
    )
}

/// An angle on the 2048 unit circle. Always kept wrapped to `[0, 2048)`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildAngle(i32);

impl BuildAngle {
    #[inline]
    pub const fn new(units: i32) -> Self {
        Self(units & ANGLE_MASK)
    }

    #[inline]
    pub fn from_vector(dx: i32, dy: i32) -> Self {
        Self(get_angle(dx, dy))
    }

    #[inline]
    pub const fn units(&self) -> i32 {
        self.0
    }

    #[inline]
    pub fn sin(&self) -> i32 {
        sin(self.0)
    }

    #[inline]
    pub fn cos(&self) -> i32 {
        cos(self.0)
    }

    /// Shortest signed distance to `other`, in `[-1024, 1024)`
    #[inline]
    pub const fn delta(&self, other: BuildAngle) -> i32 {
        ((other.0 - self.0 + ANGLE_180) & ANGLE_MASK) - ANGLE_180
    }
}

impl From<i32> for BuildAngle {
    fn from(units: i32) -> Self {
        BuildAngle::new(units)
    }
}

impl From<BuildAngle> for i32 {
    fn from(a: BuildAngle) -> Self {
        a.0
    }
}

impl Add for BuildAngle {
    type Output = BuildAngle;

    fn add(self, rhs: BuildAngle) -> BuildAngle {
        BuildAngle::new(self.0 + rhs.0)
    }
}

impl Add<i32> for BuildAngle {
    type Output = BuildAngle;

    fn add(self, rhs: i32) -> BuildAngle {
        BuildAngle::new(self.0 + rhs)
    }
}

impl AddAssign<i32> for BuildAngle {
    fn add_assign(&mut self, rhs: i32) {
        *self = *self + rhs;
    }
}

impl Sub for BuildAngle {
    type Output = BuildAngle;

    fn sub(self, rhs: BuildAngle) -> BuildAngle {
        BuildAngle::new(self.0 - rhs.0)
    }
}

impl Sub<i32> for BuildAngle {
    type Output = BuildAngle;

    fn sub(self, rhs: i32) -> BuildAngle {
        BuildAngle::new(self.0 - rhs)
    }
}

impl SubAssign<i32> for BuildAngle {
    fn sub_assign(&mut self, rhs: i32) {
        *self = *self - rhs;
    }
}

impl Neg for BuildAngle {
    type Output = BuildAngle;

    fn neg(self) -> BuildAngle {
        BuildAngle::new(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_table_quadrants() {
        assert_eq!(sin(0), 0);
        assert_eq!(sin(ANGLE_90), 16384);
        assert_eq!(sin(ANGLE_180), 0);
        assert_eq!(sin(ANGLE_270), -16384);
        assert_eq!(cos(0), 16384);
        assert_eq!(cos(ANGLE_180), -16384);
        assert_eq!(sin(ANGLE_COUNT + 5), sin(5));
        assert_eq!(sin(-5), sin(ANGLE_COUNT - 5));
    }

    #[test]
    fn get_angle_axes_and_diagonals() {
        assert_eq!(get_angle(0, 0), 0);
        assert_eq!(get_angle(10, 0), 0);
        assert_eq!(get_angle(0, 10), ANGLE_90);
        assert_eq!(get_angle(-10, 0), ANGLE_180);
        assert_eq!(get_angle(0, -10), ANGLE_270);
        assert_eq!(get_angle(100, 100), 256);
        assert_eq!(get_angle(-100, 100), 768);
        assert_eq!(get_angle(-100, -100), 1280);
        assert_eq!(get_angle(100, -100), 1792);
    }

    #[test]
    fn get_angle_round_trips_the_table() {
        for a in (0..ANGLE_COUNT).step_by(7) {
            let got = get_angle(cos(a), sin(a));
            let diff = BuildAngle::new(a).delta(BuildAngle::new(got));
            assert!(diff.abs() <= 1, "angle {a} came back as {got}");
        }
    }

    #[test]
    fn rotate_quarter_turn() {
        assert_eq!(rotate_point(0, 0, 100, 0, ANGLE_90), (0, 100));
        assert_eq!(rotate_point(10, 10, 110, 10, ANGLE_180), (-90, 10));
    }

    #[test]
    fn angle_wraps() {
        let a = BuildAngle::new(2000) + 100;
        assert_eq!(a.units(), 52);
        assert_eq!((-BuildAngle::new(1)).units(), 2047);
        assert_eq!(BuildAngle::new(2040).delta(BuildAngle::new(8)), 16);
        assert_eq!(BuildAngle::new(8).delta(BuildAngle::new(2040)), -16);
    }
}
