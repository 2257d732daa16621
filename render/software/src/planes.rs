#[cfg(feature = "hprof")]
use coarse_prof::profile;
use math::{get_angle, ksqrt};
use render_trait::{Tile, TileProvider};
use world::{Plane, SectorStat, World};

use crate::bsp::SoftwareRenderer;
use crate::defs::NEAR_PLANE;
use crate::segs::shade_row;
use crate::utilities::{put, View, DEPTH_BITS, PLANE_BITS};
use crate::RenderData;

/// World units per shade bucket of a sloped plane, as a shift
const SLOPE_BUCKET_BITS: u32 = 4;

/// How world positions on a plane land on its texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlaneMapping {
    /// Alignment wall start, in world << `PLANE_BITS`
    origin: (i64, i64),
    /// Unit vector of the alignment wall scaled by 2^14, `None` for the
    /// world grid
    axes: Option<(i64, i64)>,
    shift: u32,
    swap: bool,
    xflip: bool,
    yflip: bool,
    /// Panning in 16.16 texels
    pan: (i64, i64),
}

impl PlaneMapping {
    pub fn new(world: &World, sector: usize, plane: &Plane) -> Self {
        let mut origin = (0, 0);
        let mut axes = None;
        if plane.has(SectorStat::RelativeAlign) {
            if let Some(w) = world.sectors.get(sector).and_then(|s| world.walls.get(s.wallptr)) {
                let w2 = &world.walls[w.point2];
                let dx = (w2.x - w.x) as i64;
                let dy = (w2.y - w.y) as i64;
                let len = ksqrt(dx * dx + dy * dy) as i64;
                if len > 0 {
                    origin = ((w.x as i64) << PLANE_BITS, (w.y as i64) << PLANE_BITS);
                    axes = Some(((dx << 14) / len, (dy << 14) / len));
                }
            }
        }
        // 16 world units a texel, 8 when doubled
        let texel_bits = if plane.has(SectorStat::DoubleSmooth) { 3 } else { 4 };
        Self {
            origin,
            axes,
            shift: PLANE_BITS + texel_bits - 16,
            swap: plane.has(SectorStat::SwapXY),
            xflip: plane.has(SectorStat::XFlip),
            yflip: plane.has(SectorStat::YFlip),
            pan: ((plane.xpanning as i64) << 16, (plane.ypanning as i64) << 16),
        }
    }

    /// Texel coordinates in 16.16 of a world position in world << `PLANE_BITS`
    #[inline]
    pub fn map(&self, gx: i64, gy: i64) -> (i64, i64) {
        let (mut u, mut v) = match self.axes {
            None => (gx, gy),
            Some((ux, uy)) => {
                let rx = gx - self.origin.0;
                let ry = gy - self.origin.1;
                ((rx * ux + ry * uy) >> 14, (ry * ux - rx * uy) >> 14)
            }
        };
        if self.swap {
            std::mem::swap(&mut u, &mut v);
        }
        u >>= self.shift;
        v >>= self.shift;
        if self.xflip {
            u = -u;
        }
        if self.yflip {
            v = -v;
        }
        (u + self.pan.0, v + self.pan.1)
    }
}

/// A row of a flat plane, stepped across in world space
pub(crate) struct DrawSpan<'a> {
    tile: Tile<'a>,
    shades: &'a [u8],
    mapping: &'a PlaneMapping,
    gx: i64,
    gy: i64,
    xstep: i64,
    ystep: i64,
    y: i32,
    x1: i32,
    x2: i32,
}

impl<'a> DrawSpan<'a> {
    pub(crate) fn new(
        tile: Tile<'a>,
        shades: &'a [u8],
        mapping: &'a PlaneMapping,
        (gx, gy): (i64, i64),
        (xstep, ystep): (i64, i64),
        y: i32,
        x1: i32,
        x2: i32,
    ) -> Self {
        Self {
            tile,
            shades,
            mapping,
            gx,
            gy,
            xstep,
            ystep,
            y,
            x1,
            x2,
        }
    }

    fn draw(&mut self, buf: &mut [u8], pitch: usize) {
        for x in self.x1..self.x2 {
            let (u, v) = self.mapping.map(self.gx, self.gy);
            let texel = self.tile.texel((u >> 16) as i32, (v >> 16) as i32);
            put(buf, pitch, x as usize, self.y as usize, self.shades[texel as usize]);
            self.gx += self.xstep;
            self.gy += self.ystep;
        }
    }
}

/// Set up one row of a flat plane `depth` away and draw it
fn map_plane(
    view: &View,
    mapping: &PlaneMapping,
    tile: Tile,
    shades: &[u8],
    depth: i64,
    (y, x1, x2): (i32, i32, i32),
    buf: &mut [u8],
    pitch: usize,
) {
    let w = 2 * view.half_width as i128;
    let d = depth as i128;
    let (cos, sin) = (view.cos as i128, view.sin as i128);
    let (gx, gy) = view.plane_point(depth, view.column_lateral(x1));
    let xstep = (-2 * d * sin / w) as i64;
    let ystep = (2 * d * cos / w) as i64;
    DrawSpan::new(tile, shades, mapping, (gx, gy), (xstep, ystep), y, x1, x2).draw(buf, pitch);
}

/// Depth along a row of a sloped plane. The inverse of the depth is linear
/// in the column, so each pixel costs one divide.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlopePlane {
    num: i128,
    /// Row term, multiplied by twice the row's offset from the horizon
    row: i128,
    /// Constant and per column terms of the slope
    base: i128,
    col: i128,
}

impl SlopePlane {
    /// `dz` is the plane's height over the eye right at the camera
    pub fn new(view: &View, plane: &Plane, dz: i64, (dx, dy): (i64, i64)) -> Option<Self> {
        let len = ksqrt(dx * dx + dy * dy) as i128;
        if len == 0 {
            return None;
        }
        let hw = view.half_width as i128;
        let w = 2 * hw;
        let a = (dx * view.sin - dy * view.cos) as i128;
        let b = (dx * view.cos + dy * view.sin) as i128;
        let row = (len * w) << 30;
        let m = 32 * hw * plane.heinum as i128;
        Some(Self {
            num: dz as i128 * 32 * hw * row,
            row,
            base: m * a * w,
            col: m * b,
        })
    }

    #[inline]
    pub fn depth(&self, p: i64, q: i64) -> Option<i64> {
        let den = p as i128 * self.row - self.base - self.col * q as i128;
        if den == 0 {
            return None;
        }
        let d = self.num / den;
        if d <= 0 {
            return None;
        }
        Some((d.min(i64::MAX as i128) as i64).max(NEAR_PLANE))
    }
}

impl RenderData {
    /// Turn the per column plane bounds of `x1..x2` into row spans
    pub(crate) fn make_spans(&mut self, x1: i32, x2: i32) {
        self.spans.clear();
        let (mut pt, mut pb) = (0, 0);
        for x in x1..=x2 {
            let (t, b) = if x < x2 {
                let xi = x as usize;
                (self.plane_top[xi], self.plane_bot[xi].max(self.plane_top[xi]))
            } else {
                (0, 0)
            };
            for y in (pt..pb.min(t)).chain(pt.max(b)..pb) {
                self.spans.push((y, self.span_start[y as usize], x));
            }
            for y in (t..b.min(pt)).chain(t.max(pb)..b) {
                self.span_start[y as usize] = x;
            }
            pt = t;
            pb = b;
        }
    }
}

impl SoftwareRenderer {
    /// Fill the ceiling or floor of `sector` between `plane_top` and
    /// `plane_bot` over columns `x1..x2`
    pub(crate) fn draw_plane<T: TileProvider + ?Sized>(
        &mut self,
        world: &World,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
        sector: usize,
        ceiling: bool,
        x1: i32,
        x2: i32,
    ) {
        #[cfg(feature = "hprof")]
        profile!("draw_plane");
        let sec = &world.sectors[sector];
        let plane = if ceiling { &sec.ceiling } else { &sec.floor };
        if plane.is_parallax() {
            self.draw_sky(tiles, buf, pitch, plane, x1, x2);
            return;
        }
        let Some(tile) = tiles.tile(plane.picnum) else {
            return;
        };
        if tile.width <= 0 || tile.height <= 0 {
            return;
        }
        self.r_data.make_spans(x1, x2);
        let view = self.view;
        let mapping = PlaneMapping::new(world, sector, plane);

        if plane.is_sloped() {
            let at_camera = if ceiling {
                world.ceiling_z_at(sector, view.x, view.y)
            } else {
                world.floor_z_at(sector, view.x, view.y)
            };
            let Some(w) = world.walls.get(sec.wallptr) else {
                return;
            };
            let w2 = &world.walls[w.point2];
            let dz = at_camera.unwrap_or(plane.z) as i64 - view.z as i64;
            let reference = ((w2.x - w.x) as i64, (w2.y - w.y) as i64);
            let Some(slope) = SlopePlane::new(&view, plane, dz, reference) else {
                return;
            };
            for (i, s) in self.r_data.slope_shade.iter_mut().enumerate() {
                let depth = (i as i64) << (DEPTH_BITS + SLOPE_BUCKET_BITS);
                *s = view.shade(plane.shade as i32, depth, sec.visibility) as u8;
            }
            let table = tiles.shade_table(plane.pal);
            for &(y, sx1, sx2) in self.r_data.spans.iter() {
                draw_sloped_span(
                    &view,
                    &mapping,
                    &slope,
                    tile,
                    table,
                    &self.r_data.slope_shade,
                    (y, sx1, sx2),
                    buf,
                    pitch,
                );
            }
            return;
        }

        let dz = plane.z as i64 - view.z as i64;
        for &(y, sx1, sx2) in self.r_data.spans.iter() {
            let Some(depth) = view.row_depth(dz, y) else {
                continue;
            };
            let shade = view.shade(plane.shade as i32, depth, sec.visibility);
            let Some(shades) = shade_row(tiles, plane.pal, shade) else {
                return;
            };
            map_plane(&view, &mapping, tile, shades, depth, (y, sx1, sx2), buf, pitch);
        }
    }

    /// Sky columns, picked by view angle alone
    fn draw_sky<T: TileProvider + ?Sized>(
        &self,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
        plane: &Plane,
        x1: i32,
        x2: i32,
    ) {
        let view = &self.view;
        let sky = tiles.parallax();
        let Some(shades) = shade_row(tiles, plane.pal, view.shade(plane.shade as i32, 0, 0)) else {
            return;
        };
        let w = 2 * view.half_width as i32;
        for x in x1..x2 {
            let xi = x as usize;
            let (yl, yh) = (self.r_data.plane_top[xi], self.r_data.plane_bot[xi]);
            if yl >= yh {
                continue;
            }
            let ang = view.ang + get_angle(w, view.column_lateral(x) as i32);
            let (off, within) = sky.bucket(ang);
            let Some(tile) = tiles.tile(plane.picnum.saturating_add(off)) else {
                continue;
            };
            if tile.width <= 0 || tile.height <= 0 {
                continue;
            }
            let u = within * tile.width / sky.bucket_span() + plane.xpanning as i32;
            let column = tile.column(u);
            let th = tile.height;
            for y in yl..yh {
                let v = ((y - view.horizon) * th / view.height.max(1) + th / 2 + plane.ypanning as i32)
                    .clamp(0, th - 1);
                put(buf, pitch, xi, y as usize, shades[column[v as usize] as usize]);
            }
        }
    }
}

fn draw_sloped_span(
    view: &View,
    mapping: &PlaneMapping,
    slope: &SlopePlane,
    tile: Tile,
    table: &[u8],
    shade_lut: &[u8],
    (y, x1, x2): (i32, i32, i32),
    buf: &mut [u8],
    pitch: usize,
) {
    let p = 2 * (y - view.horizon) as i64 + 1;
    let last = shade_lut.len().saturating_sub(1);
    for x in x1..x2 {
        let q = view.column_lateral(x);
        let Some(depth) = slope.depth(p, q) else {
            continue;
        };
        let (gx, gy) = view.plane_point(depth, q);
        let (u, v) = mapping.map(gx, gy);
        let texel = tile.texel((u >> 16) as i32, (v >> 16) as i32);
        let bucket = ((depth >> (DEPTH_BITS + SLOPE_BUCKET_BITS)) as usize).min(last);
        let shade = shade_lut.get(bucket).copied().unwrap_or(0) as usize;
        if let Some(&px) = table.get(shade * 256 + texel as usize) {
            put(buf, pitch, x as usize, y as usize, px);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PlaneMapping, SlopePlane};
    use crate::defs::Camera;
    use crate::utilities::{View, DEFAULT_VISIBILITY, PLANE_BITS};
    use crate::RenderData;
    use world::{Plane, SectorStat, WorldBuilder};

    #[test]
    fn spans_from_columns() {
        let mut rd = RenderData::new(4, 8);
        // Rows 2..5 open in columns 0 and 1, rows 3..6 in column 2
        rd.plane_top[..3].copy_from_slice(&[2, 2, 3]);
        rd.plane_bot[..3].copy_from_slice(&[5, 5, 6]);
        rd.make_spans(0, 3);
        let mut spans = rd.spans.clone();
        spans.sort();
        assert_eq!(spans, vec![(2, 0, 2), (3, 0, 3), (4, 0, 3), (5, 2, 3)]);

        // A closed column splits the rows
        rd.plane_top[..3].copy_from_slice(&[0, 4, 0]);
        rd.plane_bot[..3].copy_from_slice(&[1, 4, 1]);
        rd.make_spans(0, 3);
        let mut spans = rd.spans.clone();
        spans.sort();
        assert_eq!(spans, vec![(0, 0, 1), (0, 2, 3)]);
    }

    #[test]
    fn flat_mapping_follows_world_grid() {
        let mut b = WorldBuilder::new();
        let s = b.sector(&[(0, 0), (64, 0), (64, 64), (0, 64)], -1024, 0);
        let world = b.build().unwrap();

        let plane = Plane::default();
        let m = PlaneMapping::new(&world, s, &plane);
        // 16 world units a texel
        assert_eq!(m.map(32 << PLANE_BITS, 48 << PLANE_BITS), (2 << 16, 3 << 16));

        let plane = Plane {
            stat: SectorStat::DoubleSmooth as u16 | SectorStat::SwapXY as u16,
            xpanning: 1,
            ..Plane::default()
        };
        let m = PlaneMapping::new(&world, s, &plane);
        assert_eq!(m.map(32 << PLANE_BITS, 48 << PLANE_BITS), (7 << 16, 4 << 16));
    }

    #[test]
    fn level_slope_matches_flat_depth() {
        let view = View::new(&Camera::new(0, 0, -512, 512, 0), 320, 200, DEFAULT_VISIBILITY);
        let plane = Plane {
            stat: SectorStat::Sloped as u16,
            heinum: 0,
            ..Plane::default()
        };
        let slope = SlopePlane::new(&view, &plane, 512, (1024, 0)).unwrap();
        for y in [101, 120, 199] {
            let p = 2 * (y - view.horizon) as i64 + 1;
            assert_eq!(slope.depth(p, 7), view.row_depth(512, y));
        }
        // Above the horizon a floor below the eye is never seen
        assert_eq!(slope.depth(-41, 7), None);
    }
}
