//! Ray and segment intersection against wall-like segments.
//!
//! Both tests reject parallel lines and report the intersection point with a
//! z interpolated along the same parameter.

/// Which side of the directed line `(x1, y1) -> (x2, y2)` the point is on.
/// Positive for the right hand side in screen-down coordinates, which is the
/// inside of a sector's wall loop.
#[inline]
pub fn point_on_side(x1: i32, y1: i32, x2: i32, y2: i32, px: i32, py: i32) -> i64 {
    let dx = (x2 - x1) as i64;
    let dy = (y2 - y1) as i64;
    dx * (py - y1) as i64 - (px - x1) as i64 * dy
}

/// A ray from `(x, y, z)` along `(vx, vy, vz)` against the segment
/// `(x3, y3) -> (x4, y4)`. The ray is unbounded forward; the segment end
/// point is excluded.
#[allow(clippy::too_many_arguments)]
pub fn ray_intersect(
    x: i32,
    y: i32,
    z: i32,
    vx: i32,
    vy: i32,
    vz: i32,
    x3: i32,
    y3: i32,
    x4: i32,
    y4: i32,
) -> Option<(i32, i32, i32)> {
    let (vx, vy) = (vx as i64, vy as i64);
    let x34 = (x3 - x4) as i64;
    let y34 = (y3 - y4) as i64;
    let bot = vx * y34 - vy * x34;
    if bot == 0 {
        return None;
    }
    let x31 = (x3 - x) as i64;
    let y31 = (y3 - y) as i64;
    let topt = x31 * y34 - y31 * x34;
    let topu = vx * y31 - vy * x31;
    if bot > 0 {
        if topt < 0 || topu < 0 || topu >= bot {
            return None;
        }
    } else if topt > 0 || topu > 0 || topu <= bot {
        return None;
    }

    let t = (topt << 16) / bot;
    Some((
        x + ((vx * t) >> 16) as i32,
        y + ((vy * t) >> 16) as i32,
        z + ((vz as i64 * t) >> 16) as i32,
    ))
}

/// The segment `(x1, y1, z1) -> (x2, y2, z2)` against the segment
/// `(x3, y3) -> (x4, y4)`. Neither end point of either segment counts.
#[allow(clippy::too_many_arguments)]
pub fn segment_intersect(
    x1: i32,
    y1: i32,
    z1: i32,
    x2: i32,
    y2: i32,
    z2: i32,
    x3: i32,
    y3: i32,
    x4: i32,
    y4: i32,
) -> Option<(i32, i32, i32)> {
    let x21 = (x2 - x1) as i64;
    let y21 = (y2 - y1) as i64;
    let x34 = (x3 - x4) as i64;
    let y34 = (y3 - y4) as i64;
    let bot = x21 * y34 - y21 * x34;
    if bot == 0 {
        return None;
    }
    let x31 = (x3 - x1) as i64;
    let y31 = (y3 - y1) as i64;
    let topt = x31 * y34 - y31 * x34;
    let topu = x21 * y31 - y21 * x31;
    if bot > 0 {
        if topt < 0 || topt >= bot || topu < 0 || topu >= bot {
            return None;
        }
    } else if topt > 0 || topt <= bot || topu > 0 || topu <= bot {
        return None;
    }

    let t = (topt << 24) / bot;
    Some((
        x1 + ((x21 * t) >> 24) as i32,
        y1 + ((y21 * t) >> 24) as i32,
        z1 + (((z2 - z1) as i64 * t) >> 24) as i32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_of_line() {
        // Line along +x; +y is the right hand side with y pointing down
        assert!(point_on_side(0, 0, 100, 0, 50, 10) > 0);
        assert!(point_on_side(0, 0, 100, 0, 50, -10) < 0);
        assert_eq!(point_on_side(0, 0, 100, 0, 200, 0), 0);
    }

    #[test]
    fn ray_hits_vertical_segment() {
        // The 16.16 parameter truncates, so the hit lands on or just short of the wall
        let (x, y, z) = ray_intersect(0, 0, 0, 1000, 0, 500, 100, -50, 100, 50).unwrap();
        assert!((99..=100).contains(&x));
        assert_eq!(y, 0);
        assert!((49..=50).contains(&z));
        // Behind the ray origin
        assert_eq!(ray_intersect(0, 0, 0, -1000, 0, 0, 100, -50, 100, 50), None);
        // Parallel
        assert_eq!(ray_intersect(0, 0, 0, 0, 10, 0, 100, -50, 100, 50), None);
    }

    #[test]
    fn segment_must_reach() {
        assert_eq!(
            segment_intersect(0, 0, 0, 200, 0, 200, 100, -50, 100, 50),
            Some((100, 0, 100))
        );
        assert_eq!(segment_intersect(0, 0, 0, 50, 0, 0, 100, -50, 100, 50), None);
    }
}
