use math::{cos, sin, SINE_BITS};
use render_trait::NUM_SHADES;

use crate::defs::{Camera, WallScan, NEAR_PLANE};

/// Depth is kept with 8 bits of fraction over world units
pub const DEPTH_BITS: u32 = 8;
/// World position in planes is kept with this many fraction bits
pub const PLANE_BITS: u32 = SINE_BITS + DEPTH_BITS;
/// Default distance fade
pub const DEFAULT_VISIBILITY: i64 = 512;

const SCREEN_LIMIT: i64 = 1 << 24;

/// The camera made ready for one frame
#[derive(Debug, Clone, Copy)]
pub(crate) struct View {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub ang: i32,
    pub cos: i64,
    pub sin: i64,
    pub width: i32,
    pub height: i32,
    pub half_width: i64,
    pub horizon: i32,
    pub visibility: i64,
}

impl View {
    pub fn new(camera: &Camera, width: i32, height: i32, visibility: i64) -> Self {
        Self {
            x: camera.x,
            y: camera.y,
            z: camera.z,
            ang: camera.ang,
            cos: cos(camera.ang) as i64,
            sin: sin(camera.ang) as i64,
            width,
            height,
            half_width: (width / 2).max(1) as i64,
            horizon: height / 2 + (camera.horiz - 100) * height / 200,
            visibility,
        }
    }

    /// Lateral (right is positive) and depth of a world point
    #[inline]
    pub fn to_camera(&self, x: i32, y: i32) -> (i64, i64) {
        let dx = (x - self.x) as i64;
        let dy = (y - self.y) as i64;
        let s = SINE_BITS - DEPTH_BITS;
        ((dy * self.cos - dx * self.sin) >> s, (dx * self.cos + dy * self.sin) >> s)
    }

    /// Screen column of a camera point in front of the near plane
    #[inline]
    pub fn screen_x(&self, rx: i64, ry: i64) -> i64 {
        let ry = ry.max(1);
        (self.half_width + (rx * self.half_width).div_euclid(ry)).clamp(-SCREEN_LIMIT, SCREEN_LIMIT)
    }

    /// Screen row of a height `dz` above or below the eye at `depth`
    #[inline]
    pub fn screen_y(&self, dz: i64, depth: i64) -> i32 {
        let depth = depth.max(1);
        let y = self.horizon as i64 + (dz * 16 * self.half_width).div_euclid(depth);
        y.clamp(-SCREEN_LIMIT, SCREEN_LIMIT) as i32
    }

    /// Twice the lateral offset of a column's centre, over `2 * half_width`
    #[inline]
    pub fn column_lateral(&self, x: i32) -> i64 {
        2 * x as i64 + 1 - 2 * self.half_width
    }

    /// Where the ray through column `x` meets the scan's wall: the fraction
    /// along the wall in 16.16 and the depth there
    #[inline]
    pub fn column_hit(&self, scan: &WallScan, x: i32) -> (i64, i64) {
        let q = self.column_lateral(x);
        let w = 2 * self.half_width;
        let num = q * scan.ry1 - scan.rx1 * w;
        let den = (scan.rx2 - scan.rx1) * w - q * (scan.ry2 - scan.ry1);
        let t = if den == 0 {
            0
        } else {
            ((num << 16) / den).clamp(0, 1 << 16)
        };
        let depth = scan.ry1 + (((scan.ry2 - scan.ry1) * t) >> 16);
        (t, depth.max(NEAR_PLANE))
    }

    /// World position, in world << `PLANE_BITS`, `depth` ahead along the
    /// ray through a column of lateral `q`
    #[inline]
    pub fn plane_point(&self, depth: i64, q: i64) -> (i64, i64) {
        let w = 2 * self.half_width as i128;
        let (d, q) = (depth as i128, q as i128);
        let (cos, sin) = (self.cos as i128, self.sin as i128);
        (
            ((self.x as i64) << PLANE_BITS) + (d * (cos * w - sin * q) / w) as i64,
            ((self.y as i64) << PLANE_BITS) + (d * (sin * w + cos * q) / w) as i64,
        )
    }

    /// Depth of a flat plane `dz` from the eye, seen through row `y`
    #[inline]
    pub fn row_depth(&self, dz: i64, y: i32) -> Option<i64> {
        let den = 2 * (y - self.horizon) as i64 + 1;
        if den == 0 || (dz < 0) != (den < 0) || dz == 0 {
            return None;
        }
        Some((dz * 32 * self.half_width / den).max(NEAR_PLANE))
    }

    /// Palette shade for a surface `shade` seen at `depth`
    #[inline]
    pub fn shade(&self, shade: i32, depth: i64, sector_vis: u8) -> usize {
        let fog = ((depth >> DEPTH_BITS) * self.visibility * (sector_vis as i64 + 16)) >> 21;
        (shade as i64 + fog).clamp(0, NUM_SHADES as i64 - 1) as usize
    }
}

/// Cut a camera space segment at the near plane. `None` when all of it is
/// behind.
pub(crate) fn clip_near(
    mut rx1: i64,
    mut ry1: i64,
    mut rx2: i64,
    mut ry2: i64,
) -> Option<(i64, i64, i64, i64)> {
    if ry1 < NEAR_PLANE && ry2 < NEAR_PLANE {
        return None;
    }
    if ry1 < NEAR_PLANE {
        rx1 += (rx2 - rx1) * (NEAR_PLANE - ry1) / (ry2 - ry1);
        ry1 = NEAR_PLANE;
    } else if ry2 < NEAR_PLANE {
        rx2 += (rx1 - rx2) * (NEAR_PLANE - ry2) / (ry1 - ry2);
        ry2 = NEAR_PLANE;
    }
    Some((rx1, ry1, rx2, ry2))
}

/// Blend through a translucency table, `reverse` swaps which side is the
/// source
#[inline]
pub(crate) fn blend(table: Option<&[u8]>, src: u8, dst: u8, reverse: bool) -> u8 {
    match table {
        Some(t) if reverse => t[((dst as usize) << 8) | src as usize],
        Some(t) => t[((src as usize) << 8) | dst as usize],
        None => src,
    }
}

/// Write a pixel straight into a buffer of `pitch` byte rows
#[inline]
pub(crate) fn put(buf: &mut [u8], pitch: usize, x: usize, y: usize, index: u8) {
    #[cfg(feature = "safety_check")]
    assert!(
        y * pitch + x < buf.len(),
        "pixel write out of bounds at {},{}",
        x,
        y
    );
    buf[y * pitch + x] = index;
}

#[cfg(test)]
mod tests {
    use super::{clip_near, View, DEFAULT_VISIBILITY, PLANE_BITS};
    use crate::defs::{Camera, WallScan, NEAR_PLANE};

    fn view() -> View {
        // Facing +y
        View::new(&Camera::new(0, 0, 0, 512, 0), 320, 200, DEFAULT_VISIBILITY)
    }

    #[test]
    fn camera_space_axes() {
        let v = view();
        assert_eq!(v.to_camera(0, 100), (0, 100 << 8));
        // Facing +y, right hand is -x
        assert_eq!(v.to_camera(-50, 100), (50 << 8, 100 << 8));
        assert_eq!(v.screen_x(0, 100 << 8), 160);
        assert_eq!(v.screen_x(100 << 8, 100 << 8), 320);
        assert_eq!(v.horizon, 100);
        assert_eq!(v.screen_y(0, 256), 100);
        // 16 z units a world unit
        assert_eq!(v.screen_y(100 * 16, 100 << 8), 260);
    }

    #[test]
    fn near_clip_keeps_front_half() {
        assert_eq!(clip_near(0, 0, 0, 100), None);
        let (rx1, ry1, rx2, ry2) = clip_near(-1000, -256, 1000, 768).unwrap();
        assert_eq!((ry1, rx2, ry2), (NEAR_PLANE, 1000, 768));
        assert_eq!(rx1, 0);
        assert_eq!(clip_near(1, 300, 2, 400), Some((1, 300, 2, 400)));
    }

    #[test]
    fn column_hit_finds_fraction() {
        let v = view();
        // A wall square across the view at depth 100, from x = -100 to 100
        let scan = WallScan {
            rx1: -100 << 8,
            ry1: 100 << 8,
            rx2: 100 << 8,
            ry2: 100 << 8,
            ..WallScan::default()
        };
        let (t, depth) = v.column_hit(&scan, 159);
        assert_eq!(depth, 100 << 8);
        assert!((t - (1 << 15)).abs() < 256, "t was {t}");
        let (t, _) = v.column_hit(&scan, 0);
        assert!(t < 256);
    }

    #[test]
    fn plane_point_runs_along_the_view() {
        let v = view();
        assert_eq!(v.plane_point(100 << 8, 0), (0, 100 << PLANE_BITS));
        // Right of centre is -x when facing +y
        let (x, _) = v.plane_point(100 << 8, 160);
        assert!(x < 0);
    }

    #[test]
    fn shade_is_clamped() {
        let v = view();
        assert_eq!(v.shade(-10, 0, 0), 0);
        assert_eq!(v.shade(100, 0, 0), 31);
        assert!(v.shade(0, 1 << 30, 0) == 31);
        assert_eq!(v.row_depth(0, 150), None);
        assert_eq!(v.row_depth(-100, 150), None);
        assert!(v.row_depth(100, 150).is_some());
    }
}
