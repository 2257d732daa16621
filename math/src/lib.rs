//! Fixed-point primitives shared by the renderer and the collision code.
//!
//! Everything here is integer math with explicit shift amounts. The renderer
//! and the movement clipper must agree bit-for-bit on where a surface is, so
//! nothing on a geometric path is allowed to go through floating point.
//!
//! Intermediate products are done in 64 bits. The final narrowing back to
//! `i32` truncates, so the documented range of each function is the caller's
//! responsibility.

mod angle;
mod intercept;

pub use angle::*;
pub use intercept::*;

use lazy_static::lazy_static;

/// World z units are this many bits finer than x/y units
pub const Z_SHIFT: u32 = 4;

const RECIP_BITS: u32 = 11;
const RECIP_SIZE: usize = 1 << RECIP_BITS;

lazy_static! {
    /// `2^43 / m` for every 12 bit mantissa `m` in `[2048, 4096)`
    static ref RECIP_TABLE: [u64; RECIP_SIZE] = {
        let mut table = [0u64; RECIP_SIZE];
        for (i, slot) in table.iter_mut().enumerate() {
            let m = (RECIP_SIZE + i) as u64;
            *slot = (1u64 << 43) / m;
        }
        table
    };

    /// `isqrt(i) + 1`, an over-estimate that Newton iteration walks down from
    static ref SQRT_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut root = 0u32;
        for (i, slot) in table.iter_mut().enumerate() {
            while (root + 1) * (root + 1) <= i as u32 {
                root += 1;
            }
            *slot = root + 1;
        }
        table
    };
}

/// `(a * b) >> k`. The result must fit in 32 bits.
#[inline]
pub const fn mul_scale(a: i32, b: i32, k: u32) -> i32 {
    ((a as i64 * b as i64) >> k) as i32
}

/// `(a * b + c * d) >> k`, summed at full width before the shift.
#[inline]
pub const fn dmul_scale(a: i32, b: i32, c: i32, d: i32, k: u32) -> i32 {
    ((a as i64 * b as i64 + c as i64 * d as i64) >> k) as i32
}

/// `(a << k) / b`. Saturates instead of wrapping when the quotient is out of
/// range. A zero divisor saturates by the sign of `a`; callers are expected to
/// guard against it before getting here.
#[inline]
pub const fn div_scale(a: i32, b: i32, k: u32) -> i32 {
    if b == 0 {
        return if a < 0 { i32::MIN } else { i32::MAX };
    }
    let q = ((a as i64) << k) / b as i64;
    saturate(q)
}

/// `a * b / c` without losing the high bits of the product.
#[inline]
pub const fn scale(a: i32, b: i32, c: i32) -> i32 {
    if c == 0 {
        return if (a < 0) != (b < 0) { i32::MIN } else { i32::MAX };
    }
    saturate(a as i64 * b as i64 / c as i64)
}

/// Clamp a wide intermediate back into `i32`
#[inline]
pub const fn saturate(v: i64) -> i32 {
    if v > i32::MAX as i64 {
        i32::MAX
    } else if v < i32::MIN as i64 {
        i32::MIN
    } else {
        v as i32
    }
}

/// Approximately `2^32 / x`, saturated to `i32`.
///
/// A table lookup on the top 12 bits followed by one Newton step. Returns 0
/// for 0 so a degenerate distance never poisons what follows.
pub fn recip(x: i32) -> i32 {
    if x == 0 {
        return 0;
    }
    let a = (x as i64).unsigned_abs();
    let bits = 64 - a.leading_zeros();
    let m = if bits > RECIP_BITS + 1 {
        a >> (bits - RECIP_BITS - 1)
    } else {
        a << (RECIP_BITS + 1 - bits)
    };
    let mut r = RECIP_TABLE[(m as usize) - RECIP_SIZE] >> (bits - 1);
    // r' = r * (2 - a * r / 2^32)
    let err = (1i128 << 32) - (a as i128 * r as i128);
    r = (r as i128 + ((r as i128 * err) >> 32)) as u64;

    let r = r.min(i32::MAX as u64) as i32;
    if x < 0 { -r } else { r }
}

/// Integer square root, exact floor, of a non-negative value. Negative input
/// returns 0.
pub fn ksqrt(n: i64) -> i32 {
    if n <= 0 {
        return 0;
    }
    let n = n as u64;
    let bits = 64 - n.leading_zeros();
    let shift = (bits.saturating_sub(8) + 1) & !1;
    let top = (n >> shift) as usize;
    let mut x = (SQRT_TABLE[top] as u64) << (shift / 2);
    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            break;
        }
        x = y;
    }
    x as i32
}

/// Height of a sloped plane at `(px, py)`.
///
/// `dx`/`dy` is the reference wall vector (first wall of the sector) and
/// `rel_x`/`rel_y` the point relative to that wall's start. A `heinum` of
/// 4096 rises one xy unit per xy unit, in z units.
#[inline]
pub fn slope_z(base_z: i32, heinum: i32, dx: i32, dy: i32, rel_x: i32, rel_y: i32) -> i32 {
    let len = (ksqrt(dx as i64 * dx as i64 + dy as i64 * dy as i64) as i64) << 5;
    if len == 0 {
        return base_z;
    }
    let cross = (dx as i64 * rel_y as i64 - dy as i64 * rel_x as i64) >> 3;
    saturate(base_z as i64 + heinum as i64 * cross / len)
}

/// The `heinum` that makes a plane through the reference wall at `base_z`
/// pass through height `z` at the given relative point. Returns `None` when
/// the point sits on the wall's line, where every slope fits.
pub fn heinum_through(base_z: i32, z: i32, dx: i32, dy: i32, rel_x: i32, rel_y: i32) -> Option<i32> {
    let len = (ksqrt(dx as i64 * dx as i64 + dy as i64 * dy as i64) as i64) << 5;
    let cross = (dx as i64 * rel_y as i64 - dy as i64 * rel_x as i64) >> 3;
    if cross == 0 || len == 0 {
        return None;
    }
    Some(saturate((z as i64 - base_z as i64) * len / cross))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_ops_use_wide_intermediates() {
        assert_eq!(mul_scale(1 << 20, 1 << 20, 16), 1 << 24);
        assert_eq!(mul_scale(-3, 1 << 16, 16), -3);
        assert_eq!(dmul_scale(1 << 30, 4, -(1 << 30), 2, 16), 1 << 15);
        assert_eq!(scale(1 << 30, 8, 16), 1 << 29);
        assert_eq!(scale(-100, 3, 7), -42);
    }

    #[test]
    fn div_scale_saturates() {
        assert_eq!(div_scale(1, 2, 16), 1 << 15);
        assert_eq!(div_scale(1 << 20, 1, 16), i32::MAX);
        assert_eq!(div_scale(-(1 << 20), 1, 16), i32::MIN);
        assert_eq!(div_scale(5, 0, 8), i32::MAX);
        assert_eq!(div_scale(-5, 0, 8), i32::MIN);
    }

    #[test]
    fn ksqrt_is_exact_floor() {
        for n in 0..5000i64 {
            let r = ksqrt(n) as i64;
            assert!(r * r <= n && (r + 1) * (r + 1) > n, "n = {n}, r = {r}");
        }
        for &n in &[1i64 << 34, (1 << 34) + 12345, i32::MAX as i64, 999_999_999_999] {
            let r = ksqrt(n) as i64;
            assert!(r * r <= n && (r + 1) * (r + 1) > n, "n = {n}, r = {r}");
        }
        assert_eq!(ksqrt(-4), 0);
    }

    #[test]
    fn recip_close_to_exact() {
        for &x in &[3i32, 7, 100, 256, 1000, 4095, 65537, 1 << 20, 123_456_789] {
            let exact = (1i64 << 32) / x as i64;
            let got = recip(x) as i64;
            let err = (got - exact).abs();
            assert!(err <= 2 + exact / (1 << 18), "x = {x}: {got} vs {exact}");
            assert_eq!(recip(-x) as i64, -got);
        }
        assert_eq!(recip(1), i32::MAX);
        assert_eq!(recip(0), 0);
    }

    #[test]
    fn slope_rises_across_reference_wall() {
        // Wall along +x; points at +y are "in front" for the slope
        assert_eq!(slope_z(0, 0, 1024, 0, 10, 500), 0);
        assert_eq!(slope_z(100, 4096, 1024, 0, 0, 0), 100);
        // 45 degrees: 16 z units per xy unit
        assert_eq!(slope_z(0, 4096, 1024, 0, 0, 64), 64 << Z_SHIFT);
        assert_eq!(slope_z(0, -4096, 1024, 0, 300, 64), -(64 << Z_SHIFT));
        // Zero length reference wall is flat
        assert_eq!(slope_z(-7, 4096, 0, 0, 5, 5), -7);
    }

    #[test]
    fn heinum_through_inverts_slope() {
        let h = heinum_through(0, 64 << Z_SHIFT, 1024, 0, 0, 64).unwrap();
        assert_eq!(h, 4096);
        assert!(heinum_through(0, 10, 1024, 0, 5, 0).is_none());
    }
}
