use std::cmp;

#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::trace;
use math::{cos, point_on_side, sin};
use render_trait::{TileProvider, VoxelModel, TRANSPARENT_INDEX};
use world::{Sprite, SpriteOrientation, SpriteStat, World};

use crate::bsp::{wall_line, SoftwareRenderer};
use crate::defs::{SmostKind, VisSprite, WallScan, NEAR_PLANE};
use crate::segs::{shade_row, DrawColumn};
use crate::utilities::{blend, clip_near, put, DEPTH_BITS, PLANE_BITS};

const LOG_TAG: &str = "Sprites";

/// Far to near. Equal depths go by status then index so the order is the
/// same every frame.
impl PartialOrd for VisSprite {
    fn partial_cmp(&self, other: &VisSprite) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VisSprite {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        other
            .depth
            .cmp(&self.depth)
            .then(self.status.cmp(&other.status))
            .then(self.sprite.cmp(&other.sprite))
    }
}

fn translucency<'a, T: TileProvider + ?Sized>(tiles: &'a T, spr: &Sprite) -> (Option<&'a [u8]>, bool) {
    if spr.has(SpriteStat::Translucent) {
        (tiles.translucency(), spr.has(SpriteStat::TranslucentReverse))
    } else {
        (None, false)
    }
}

/// A point in camera or screen space
pub(crate) type Clipped = (i64, i64);

/// Buffers reused by the floor sprite and voxel drawers from frame to frame
#[derive(Default)]
pub(crate) struct SpriteScratch {
    pub(crate) poly: Vec<Clipped>,
    pub(crate) poly_tmp: Vec<Clipped>,
    /// `(depth, x, y)` of the voxel columns in view
    pub(crate) cells: Vec<(i64, i32, i32)>,
}

impl SpriteScratch {
    pub(crate) fn with_capacity(polygon: usize, cells: usize) -> Self {
        Self {
            poly: Vec::with_capacity(polygon),
            poly_tmp: Vec::with_capacity(polygon),
            cells: Vec::with_capacity(cells),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.poly.clear();
        self.poly_tmp.clear();
        self.cells.clear();
    }
}

/// One Sutherland–Hodgman pass of a convex polygon against the edge where
/// `dist` is zero, written to `out`
fn clip_polygon(poly: &[Clipped], out: &mut Vec<Clipped>, dist: impl Fn(Clipped) -> i64) {
    out.clear();
    for (i, &p) in poly.iter().enumerate() {
        let q = poly[(i + 1) % poly.len()];
        let (dp, dq) = (dist(p), dist(q));
        if dp >= 0 {
            out.push(p);
        }
        if (dp >= 0) != (dq >= 0) {
            let t = (dp as i128, (dp - dq) as i128);
            out.push((
                p.0 + ((q.0 - p.0) as i128 * t.0 / t.1) as i64,
                p.1 + ((q.1 - p.1) as i128 * t.0 / t.1) as i64,
            ));
        }
    }
}

/// Clip `poly` against one edge, using `tmp` as the other buffer
fn clip_in_place(poly: &mut Vec<Clipped>, tmp: &mut Vec<Clipped>, dist: impl Fn(Clipped) -> i64) {
    clip_polygon(poly, tmp, dist);
    std::mem::swap(poly, tmp);
}

/// Top and bottom in 16.16 of a convex screen polygon at column centre `xc`
fn polygon_rows(poly: &[Clipped], xc: i64) -> Option<(i64, i64)> {
    let mut span: Option<(i64, i64)> = None;
    for (i, &p) in poly.iter().enumerate() {
        let q = poly[(i + 1) % poly.len()];
        let (lo, hi) = if p.0 <= q.0 { (p, q) } else { (q, p) };
        if xc < lo.0 || xc > hi.0 {
            continue;
        }
        let (y1, y2) = if hi.0 == lo.0 {
            (lo.1, hi.1)
        } else {
            let y = lo.1 + ((hi.1 - lo.1) as i128 * (xc - lo.0) as i128 / (hi.0 - lo.0) as i128) as i64;
            (y, y)
        };
        let (t, b) = span.unwrap_or((y1.min(y2), y1.max(y2)));
        span = Some((t.min(y1).min(y2), b.max(y1).max(y2)));
    }
    span
}

/// First pixel row whose centre is at or below `y` in 16.16
#[inline]
fn row_at(y: i64) -> i32 {
    ((y - 0x8000 + 0xffff) >> 16).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl SoftwareRenderer {
    /// Screen columns a sprite could cover, half open
    pub(crate) fn sprite_columns<T: TileProvider + ?Sized>(
        &self,
        tiles: &T,
        spr: &Sprite,
        rx: i64,
        ry: i64,
    ) -> (i32, i32) {
        let view = &self.view;
        let width = view.width as i64;
        let project = |points: &[(i32, i32)]| -> (i32, i32) {
            let mut range = (width, 0);
            for &(x, y) in points {
                let (px, py) = view.to_camera(x, y);
                if py < NEAR_PLANE {
                    return (0, view.width);
                }
                let sx = view.screen_x(px, py);
                range = (range.0.min(sx), range.1.max(sx + 1));
            }
            (range.0.clamp(0, width) as i32, range.1.clamp(0, width) as i32)
        };
        match spr.orientation() {
            SpriteOrientation::Face => {
                let (w, _) = tiles.tile_size(spr.picnum);
                let (toff, _) = tiles.tile_offset(spr.picnum);
                let reach = (w as i64 + 2 * (toff as i64 + spr.xoffset as i64).abs()) * spr.xrepeat as i64;
                let half = (reach << 5) + (1 << DEPTH_BITS);
                let x1 = view.screen_x(rx - half, ry).clamp(0, width);
                let x2 = view.screen_x(rx + half, ry).clamp(0, width);
                (x1 as i32, x2 as i32)
            }
            SpriteOrientation::Wall => {
                let (a, b) = spr.wall_ends(tiles);
                project(&[a, b])
            }
            SpriteOrientation::Floor => project(&spr.floor_corners(tiles)),
            SpriteOrientation::Voxel => {
                let r = match tiles.voxel(spr.picnum) {
                    Some(m) => ((m.xsize.max(m.ysize) * spr.xrepeat as i32) >> 4) + 1,
                    None => ((tiles.tile_size(spr.picnum).0 * spr.xrepeat as i32) >> 3) + 1,
                };
                project(&[
                    (spr.x - r, spr.y - r),
                    (spr.x + r, spr.y - r),
                    (spr.x + r, spr.y + r),
                    (spr.x - r, spr.y + r),
                ])
            }
        }
    }

    /// Draw sprites and masked walls, far to near. A sprite behind a masked
    /// wall goes down before the wall does.
    pub(crate) fn draw_masks<T: TileProvider + ?Sized>(
        &mut self,
        world: &World,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
    ) {
        #[cfg(feature = "hprof")]
        profile!("draw_masks");
        let n = self.r_data.sprites.len();
        self.r_data.sprites.sort_unstable();
        self.r_data.sprite_done[..n].iter_mut().for_each(|d| *d = false);

        for m in (0..self.r_data.masked.len()).rev() {
            let masked = self.r_data.masked[m];
            let (ax, ay, bx, by) = wall_line(world, self.r_data.scans[masked.scan].wall);
            for i in 0..n {
                let vs = self.r_data.sprites[i];
                if self.r_data.sprite_done[i] || vs.x2 <= masked.x1 || vs.x1 >= masked.x2 {
                    continue;
                }
                let Some(spr) = world.sprite(vs.sprite) else {
                    continue;
                };
                if point_on_side(ax, ay, bx, by, spr.x, spr.y) < 0 {
                    self.draw_sprite(world, tiles, buf, pitch, i);
                    self.r_data.sprite_done[i] = true;
                }
            }
            self.draw_masked_wall(world, tiles, buf, pitch, &masked);
        }
        for i in 0..n {
            if !self.r_data.sprite_done[i] {
                self.draw_sprite(world, tiles, buf, pitch, i);
                self.r_data.sprite_done[i] = true;
            }
        }
    }

    fn draw_sprite<T: TileProvider + ?Sized>(
        &mut self,
        world: &World,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
        i: usize,
    ) {
        let vs = self.r_data.sprites[i];
        let Some(spr) = world.sprite(vs.sprite) else {
            return;
        };
        if vs.x1 >= vs.x2 {
            return;
        }
        self.sprite_clip(world, spr, vs.x1, vs.x2);
        let sector_vis = world.sectors.get(spr.sector()).map_or(0, |s| s.visibility);
        let mut scratch = std::mem::take(&mut self.r_data.sprite_scratch);
        let drawn = match spr.orientation() {
            SpriteOrientation::Face => self.draw_face_sprite(tiles, buf, pitch, spr, &vs, sector_vis),
            SpriteOrientation::Wall => self.draw_wall_sprite(tiles, buf, pitch, spr, &vs, sector_vis),
            SpriteOrientation::Floor => {
                self.draw_floor_sprite(tiles, buf, pitch, spr, &vs, sector_vis, &mut scratch)
            }
            SpriteOrientation::Voxel => match tiles.voxel(spr.picnum) {
                Some(model) => {
                    self.draw_voxel(tiles, buf, pitch, spr, model, &vs, sector_vis, &mut scratch.cells)
                }
                None => self.draw_face_sprite(tiles, buf, pitch, spr, &vs, sector_vis),
            },
        };
        self.r_data.sprite_scratch = scratch;
        if drawn {
            self.stats.sprites_drawn += 1;
        } else {
            trace!(target: LOG_TAG, "sprite {} not drawn", vs.sprite);
        }
    }

    /// Work out which rows of `x1..x2` are not hidden by walls in front of
    /// the sprite
    fn sprite_clip(&mut self, world: &World, spr: &Sprite, x1: i32, x2: i32) {
        let height = self.view.height;
        let rd = &mut self.r_data;
        for x in x1..x2 {
            rd.clip_top[x as usize] = 0;
            rd.clip_bot[x as usize] = height;
        }
        for rec in rd.smost.iter() {
            let (ox1, ox2) = (rec.x1.max(x1), rec.x2.min(x2));
            if ox1 >= ox2 {
                continue;
            }
            let (ax, ay, bx, by) = wall_line(world, rd.scans[rec.scan].wall);
            if point_on_side(ax, ay, bx, by, spr.x, spr.y) >= 0 {
                continue;
            }
            for x in ox1..ox2 {
                let xi = x as usize;
                let saved = rd
                    .smost_pool
                    .get(rec.start + (x - rec.x1) as usize)
                    .copied()
                    .unwrap_or(0);
                match rec.kind {
                    SmostKind::Solid => rd.clip_top[xi] = rd.clip_bot[xi],
                    SmostKind::Upper => rd.clip_top[xi] = rd.clip_top[xi].max(saved),
                    SmostKind::Lower => rd.clip_bot[xi] = rd.clip_bot[xi].min(saved),
                }
            }
        }
    }

    fn draw_face_sprite<T: TileProvider + ?Sized>(
        &self,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
        spr: &Sprite,
        vs: &VisSprite,
        sector_vis: u8,
    ) -> bool {
        let view = &self.view;
        let Some(tile) = tiles.tile(spr.picnum) else {
            return false;
        };
        if tile.width <= 0 || tile.height <= 0 {
            return false;
        }
        let (rx, ry) = view.to_camera(spr.x, spr.y);
        if ry < NEAR_PLANE {
            return false;
        }

        let (toff, _) = tiles.tile_offset(spr.picnum);
        let xoff = (toff + spr.xoffset as i32) as i64;
        let xrep = spr.xrepeat as i64;
        let left = rx - (((tile.width as i64 + 2 * xoff) * xrep) << 5);
        let right = left + ((tile.width as i64 * xrep) << 6);
        let sx1 = view.screen_x(left, ry);
        let sx2 = view.screen_x(right, ry);
        if sx1 >= sx2 {
            return false;
        }

        let (ztop, zbot) = spr.z_extent(tiles);
        let yshift = (spr.yoffset as i32 * spr.yrepeat as i32) << 2;
        let yt = view.screen_y((ztop - yshift) as i64 - view.z as i64, ry);
        let yb = view.screen_y((zbot - yshift) as i64 - view.z as i64, ry);
        if yt >= yb {
            return false;
        }

        let Some(shades) = shade_row(tiles, spr.pal, view.shade(spr.shade as i32, ry, sector_vis)) else {
            return false;
        };
        let (table, reverse) = translucency(tiles, spr);
        let ustep = ((tile.width as i64) << 16) / (sx2 - sx1);
        let mut vstep = ((tile.height as i64) << 16) / (yb - yt) as i64;
        let mut vstart = vstep / 2;
        if spr.has(SpriteStat::YFlip) {
            vstart = ((tile.height as i64) << 16) - 1 - vstart;
            vstep = -vstep;
        }

        let xa = sx1.max(vs.x1 as i64) as i32;
        let xb = sx2.min(vs.x2 as i64) as i32;
        for x in xa..xb {
            let xi = x as usize;
            let top = yt.max(self.r_data.clip_top[xi]);
            let bot = yb.min(self.r_data.clip_bot[xi]);
            if top >= bot {
                continue;
            }
            let mut u = (((x as i64 - sx1) * ustep + ustep / 2) >> 16) as i32;
            if spr.has(SpriteStat::XFlip) {
                u = tile.width - 1 - u;
            }
            let frac = vstart + (top - yt) as i64 * vstep;
            DrawColumn::new(tile.column(u), shades, frac, vstep, x, top, bot)
                .draw_masked(buf, pitch, table, reverse);
        }
        true
    }

    fn draw_wall_sprite<T: TileProvider + ?Sized>(
        &self,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
        spr: &Sprite,
        vs: &VisSprite,
        sector_vis: u8,
    ) -> bool {
        let view = &self.view;
        let Some(tile) = tiles.tile(spr.picnum) else {
            return false;
        };
        if tile.width <= 0 || tile.height <= 0 {
            return false;
        }
        let (mut a, mut b) = spr.wall_ends(tiles);
        let mut flip = spr.has(SpriteStat::XFlip);
        if point_on_side(a.0, a.1, b.0, b.1, view.x, view.y) <= 0 {
            if spr.has(SpriteStat::OneSided) {
                return false;
            }
            std::mem::swap(&mut a, &mut b);
            flip = !flip;
        }

        let (rx1, ry1) = view.to_camera(a.0, a.1);
        let (rx2, ry2) = view.to_camera(b.0, b.1);
        let Some((cx1, cy1, cx2, cy2)) = clip_near(rx1, ry1, rx2, ry2) else {
            return false;
        };
        let width = view.width as i64;
        let sx1 = view.screen_x(cx1, cy1).clamp(0, width) as i32;
        let sx2 = view.screen_x(cx2, cy2).clamp(0, width) as i32;
        let scan = WallScan {
            rx1,
            ry1,
            rx2,
            ry2,
            x1: sx1,
            x2: sx2,
            ..WallScan::default()
        };

        let (ztop, zbot) = spr.z_extent(tiles);
        let (table, reverse) = translucency(tiles, spr);
        for x in sx1.max(vs.x1)..sx2.min(vs.x2) {
            let xi = x as usize;
            let (t, depth) = view.column_hit(&scan, x);
            let yt = view.screen_y(ztop as i64 - view.z as i64, depth);
            let yb = view.screen_y(zbot as i64 - view.z as i64, depth);
            let top = yt.max(self.r_data.clip_top[xi]);
            let bot = yb.min(self.r_data.clip_bot[xi]);
            if top >= bot || yt >= yb {
                continue;
            }
            let mut u = ((t * tile.width as i64) >> 16) as i32;
            if flip {
                u = tile.width - 1 - u;
            }
            let vstep = ((tile.height as i64) << 16) / (yb - yt) as i64;
            let (frac, step) = if spr.has(SpriteStat::YFlip) {
                (((tile.height as i64) << 16) - 1 - vstep / 2 - (top - yt) as i64 * vstep, -vstep)
            } else {
                (vstep / 2 + (top - yt) as i64 * vstep, vstep)
            };
            let Some(shades) = shade_row(tiles, spr.pal, view.shade(spr.shade as i32, depth, sector_vis)) else {
                return false;
            };
            DrawColumn::new(tile.column(u), shades, frac, step, x, top, bot)
                .draw_masked(buf, pitch, table, reverse);
        }
        true
    }

    fn draw_floor_sprite<T: TileProvider + ?Sized>(
        &self,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
        spr: &Sprite,
        vs: &VisSprite,
        sector_vis: u8,
        scratch: &mut SpriteScratch,
    ) -> bool {
        let view = &self.view;
        let Some(tile) = tiles.tile(spr.picnum) else {
            return false;
        };
        if tile.width <= 0 || tile.height <= 0 {
            return false;
        }
        let dz = spr.z as i64 - view.z as i64;
        if dz == 0 {
            return false;
        }
        let corners = spr.floor_corners(tiles);
        if spr.has(SpriteStat::OneSided) {
            // The front faces down the z axis towards the camera
            let [c0, c1, c2, _] = corners;
            let side = point_on_side(c0.0, c0.1, c1.0, c1.1, c2.0, c2.1);
            if (side > 0) == (dz > 0) {
                return false;
            }
        }

        let SpriteScratch { poly, poly_tmp, .. } = scratch;
        poly.clear();
        poly.extend(corners.iter().map(|&(x, y)| view.to_camera(x, y)));
        clip_in_place(poly, poly_tmp, |(_, ry)| ry - NEAR_PLANE);
        if poly.len() < 3 {
            return false;
        }
        let hw = view.half_width;
        for p in poly.iter_mut() {
            let (rx, ry) = *p;
            let sx = (hw << 16) + ((rx as i128 * hw as i128) << 16).div_euclid(ry as i128) as i64;
            let sy = ((view.horizon as i64) << 16)
                + ((dz as i128 * 16 * hw as i128) << 16).div_euclid(ry as i128) as i64;
            *p = (sx, sy);
        }
        let (w16, h16) = ((view.width as i64) << 16, (view.height as i64) << 16);
        clip_in_place(poly, poly_tmp, |(x, _)| x);
        clip_in_place(poly, poly_tmp, |(x, _)| w16 - x);
        clip_in_place(poly, poly_tmp, |(_, y)| y);
        clip_in_place(poly, poly_tmp, |(_, y)| h16 - y);
        if poly.len() < 3 {
            return false;
        }
        let screen: &[Clipped] = poly;

        let origin = corners[0];
        let e1 = ((corners[1].0 - origin.0) as i128, (corners[1].1 - origin.1) as i128);
        let e3 = ((corners[3].0 - origin.0) as i128, (corners[3].1 - origin.1) as i128);
        let (len1, len3) = (e1.0 * e1.0 + e1.1 * e1.1, e3.0 * e3.0 + e3.1 * e3.1);
        if len1 == 0 || len3 == 0 {
            return false;
        }
        let ox = (origin.0 as i128) << PLANE_BITS;
        let oy = (origin.1 as i128) << PLANE_BITS;
        let scale1 = len1 << PLANE_BITS;
        let scale3 = len3 << PLANE_BITS;

        let (table, reverse) = translucency(tiles, spr);
        let xmin = screen.iter().map(|p| p.0).min().unwrap_or(0);
        let xmax = screen.iter().map(|p| p.0).max().unwrap_or(0);
        let xa = row_at(xmin).max(vs.x1);
        let xb = row_at(xmax).min(vs.x2);
        for x in xa..xb {
            let xi = x as usize;
            let Some((ymin, ymax)) = polygon_rows(screen, ((x as i64) << 16) + 0x8000) else {
                continue;
            };
            let top = row_at(ymin).max(self.r_data.clip_top[xi]);
            let bot = row_at(ymax).min(self.r_data.clip_bot[xi]);
            let q = view.column_lateral(x);
            for y in top..bot {
                let Some(depth) = view.row_depth(dz, y) else {
                    continue;
                };
                let (gx, gy) = view.plane_point(depth, q);
                let (rx, ry) = (gx as i128 - ox, gy as i128 - oy);
                let mut u = ((rx * e1.0 + ry * e1.1) * tile.width as i128 / scale1) as i32;
                let v = ((rx * e3.0 + ry * e3.1) * tile.height as i128 / scale3) as i32;
                if u < 0 || v < 0 || u >= tile.width || v >= tile.height {
                    continue;
                }
                if spr.has(SpriteStat::XFlip) {
                    u = tile.width - 1 - u;
                }
                let texel = tile.texel(u, v);
                if texel == TRANSPARENT_INDEX {
                    continue;
                }
                let Some(shades) = shade_row(tiles, spr.pal, view.shade(spr.shade as i32, depth, sector_vis)) else {
                    return false;
                };
                let mut px = shades[texel as usize];
                if table.is_some() {
                    px = blend(table, px, buf[y as usize * pitch + xi], reverse);
                }
                put(buf, pitch, xi, y as usize, px);
            }
        }
        true
    }

    fn draw_voxel<T: TileProvider + ?Sized>(
        &self,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
        spr: &Sprite,
        model: &VoxelModel,
        vs: &VisSprite,
        sector_vis: u8,
        cells: &mut Vec<(i64, i32, i32)>,
    ) -> bool {
        let view = &self.view;
        // Voxel edge in camera units, height in z units
        let edge = (spr.xrepeat as i64) << 4;
        let zstep = spr.yrepeat as i64;
        if edge == 0 || zstep == 0 {
            return false;
        }
        let (sa, ca) = (sin(spr.ang as i32) as i64, cos(spr.ang as i32) as i64);
        let (px, py, pz) = (model.pivot.0 as i64, model.pivot.1 as i64, model.pivot.2 as i64);

        // Camera space of a point given in voxels with 8 bits of fraction
        let corner = |vx: i64, vy: i64| -> (i64, i64) {
            let lx = ((vx - px) * edge) >> 8;
            let ly = ((vy - py) * edge) >> 8;
            let wx = ((spr.x as i64) << DEPTH_BITS) + ((lx * ca - ly * sa) >> 14);
            let wy = ((spr.y as i64) << DEPTH_BITS) + ((lx * sa + ly * ca) >> 14);
            let dx = wx - ((view.x as i64) << DEPTH_BITS);
            let dy = wy - ((view.y as i64) << DEPTH_BITS);
            ((dy * view.cos - dx * view.sin) >> 14, (dx * view.cos + dy * view.sin) >> 14)
        };

        cells.clear();
        for x in 0..model.xsize {
            for y in 0..model.ysize {
                if model.column(x, y).is_empty() {
                    continue;
                }
                let (_, ry) = corner(((x as i64) << 8) + 128, ((y as i64) << 8) + 128);
                if ry >= NEAR_PLANE {
                    cells.push((ry, x, y));
                }
            }
        }
        if cells.is_empty() {
            return false;
        }
        // Back to front
        cells.sort_unstable_by(|a, b| b.cmp(a));

        let (table, reverse) = translucency(tiles, spr);
        let width = view.width as i64;
        for &(depth, x, y) in cells.iter() {
            let (x8, y8) = ((x as i64) << 8, (y as i64) << 8);
            let mut left = (i64::MAX, 0i64);
            let mut right = (i64::MIN, 0i64);
            for (cx, cy) in [(x8, y8), (x8 + 256, y8), (x8 + 256, y8 + 256), (x8, y8 + 256)] {
                let (rx, ry) = corner(cx, cy);
                let ry = ry.max(NEAR_PLANE);
                let sx = view.screen_x(rx, ry);
                if sx < left.0 {
                    left = (sx, ry);
                }
                if sx > right.0 {
                    right = (sx, ry);
                }
            }
            if right.0 <= left.0 {
                right.0 = left.0 + 1;
            }
            let Some(shades) = shade_row(tiles, spr.pal, view.shade(spr.shade as i32, depth, sector_vis)) else {
                return false;
            };
            for slab in model.column(x, y) {
                if slab.is_empty() {
                    continue;
                }
                let zt = spr.z as i64 + (((slab.ztop as i64) << 8) - pz) * zstep / 256 - view.z as i64;
                let zb = zt + slab.len() as i64 * zstep;
                let edges = (
                    (left.0, view.screen_y(zt, left.1), view.screen_y(zb, left.1)),
                    (right.0, view.screen_y(zt, right.1), view.screen_y(zb, right.1)),
                );
                self.draw_slab(
                    buf,
                    pitch,
                    edges,
                    (vs.x1.max(0) as i64, (vs.x2 as i64).min(width)),
                    &slab.colours,
                    shades,
                    (table, reverse),
                );
            }
        }
        true
    }

    /// Fill a trapezoid with vertical left and right edges, colouring rows
    /// from the top of the slab down
    fn draw_slab(
        &self,
        buf: &mut [u8],
        pitch: usize,
        ((lx, lt, lb), (rx, rt, rb)): ((i64, i32, i32), (i64, i32, i32)),
        (xmin, xmax): (i64, i64),
        colours: &[u8],
        shades: &[u8],
        (table, reverse): (Option<&[u8]>, bool),
    ) {
        let span = (rx - lx).max(1);
        for x in lx.max(xmin)..rx.min(xmax) {
            let xi = x as usize;
            let f = x - lx;
            let yt = lt + ((rt - lt) as i64 * f / span) as i32;
            let yb = lb + ((rb - lb) as i64 * f / span) as i32;
            if yt >= yb {
                continue;
            }
            let top = yt.max(self.r_data.clip_top[xi]);
            let bot = yb.min(self.r_data.clip_bot[xi]);
            for y in top..bot {
                let c = ((y - yt) as i64 * colours.len() as i64 / (yb - yt) as i64) as usize;
                let texel = colours[c.min(colours.len() - 1)];
                if texel == TRANSPARENT_INDEX {
                    continue;
                }
                let mut px = shades[texel as usize];
                if table.is_some() {
                    px = blend(table, px, buf[y as usize * pitch + xi], reverse);
                }
                put(buf, pitch, xi, y as usize, px);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{clip_polygon, polygon_rows, row_at};
    use crate::defs::VisSprite;

    #[test]
    fn sprites_sort_far_first_then_status() {
        let mut v = vec![
            VisSprite { sprite: 0, depth: 100, status: 1, ..VisSprite::default() },
            VisSprite { sprite: 1, depth: 500, status: 0, ..VisSprite::default() },
            VisSprite { sprite: 2, depth: 100, status: 0, ..VisSprite::default() },
            VisSprite { sprite: 3, depth: 100, status: 0, ..VisSprite::default() },
        ];
        v.sort_unstable();
        let order: Vec<usize> = v.iter().map(|s| s.sprite).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn polygon_clip_cuts_corner() {
        let square = [(0, 0), (10, 0), (10, 10), (0, 10)];
        // Keep x <= 5
        let mut out = vec![(99, 99)];
        clip_polygon(&square, &mut out, |(x, _)| 5 - x);
        assert_eq!(out, vec![(0, 0), (5, 0), (5, 10), (0, 10)]);
        clip_polygon(&square, &mut out, |(x, _)| -1 - x);
        assert!(out.is_empty());
    }

    #[test]
    fn polygon_rows_at_column() {
        let tri = [(0, 0), (10 << 16, 0), (0, 10 << 16)];
        let (t, b) = polygon_rows(&tri, 5 << 16).unwrap();
        assert_eq!((t, b), (0, 5 << 16));
        assert_eq!(polygon_rows(&tri, 11 << 16), None);
        assert_eq!(row_at(0), 0);
        assert_eq!(row_at(0x8000), 0);
        assert_eq!(row_at(0x8001), 1);
    }
}
