#[cfg(feature = "hprof")]
use coarse_prof::profile;
use render_trait::{wrap, TileProvider, NUM_SHADES, TRANSPARENT_INDEX};
use world::{Wall, WallStat, World};

use crate::bsp::SoftwareRenderer;
use crate::defs::{MaskedWall, SmostKind, SmostRecord, VisibleWall};
use crate::utilities::{blend, put, View};
use crate::RenderError;

/// A run of rows in one screen column, textured from one tile column
pub(crate) struct DrawColumn<'a> {
    column: &'a [u8],
    /// One 256 entry row of the shade table
    shades: &'a [u8],
    /// Texel row of `yl` in 16.16
    frac: i64,
    step: i64,
    x: i32,
    yl: i32,
    /// One past the last row
    yh: i32,
}

impl<'a> DrawColumn<'a> {
    pub fn new(
        column: &'a [u8],
        shades: &'a [u8],
        frac: i64,
        step: i64,
        x: i32,
        yl: i32,
        yh: i32,
    ) -> Self {
        Self {
            column,
            shades,
            frac,
            step,
            x,
            yl,
            yh,
        }
    }

    #[inline]
    fn texel(&self, frac: i64) -> u8 {
        self.column[wrap((frac >> 16) as i32, self.column.len() as i32) as usize]
    }

    pub fn draw_column(&self, buf: &mut [u8], pitch: usize) {
        let mut frac = self.frac;
        for y in self.yl..self.yh {
            let texel = self.texel(frac);
            put(buf, pitch, self.x as usize, y as usize, self.shades[texel as usize]);
            frac += self.step;
        }
    }

    /// Like `draw_column` but leaves transparent texels alone and optionally
    /// blends with what is already there
    pub fn draw_masked(&self, buf: &mut [u8], pitch: usize, translucency: Option<&[u8]>, reverse: bool) {
        let mut frac = self.frac;
        for y in self.yl..self.yh {
            let texel = self.texel(frac);
            frac += self.step;
            if texel == TRANSPARENT_INDEX {
                continue;
            }
            let mut px = self.shades[texel as usize];
            if translucency.is_some() {
                let dst = buf[y as usize * pitch + self.x as usize];
                px = blend(translucency, px, dst, reverse);
            }
            put(buf, pitch, self.x as usize, y as usize, px);
        }
    }
}

/// The 256 colour row for a shade
pub(crate) fn shade_row<T: TileProvider + ?Sized>(tiles: &T, pal: u8, shade: usize) -> Option<&[u8]> {
    let shade = shade.min(NUM_SHADES - 1);
    tiles.shade_table(pal).get(shade * 256..shade * 256 + 256)
}

/// Set up the texture column of `wall` hit at fraction `t` for rows
/// `yl..yh`. `zref` is the height the texture is anchored to.
pub(crate) fn wall_column<'a, T: TileProvider + ?Sized>(
    view: &View,
    tiles: &'a T,
    wall: &Wall,
    picnum: i16,
    zref: i32,
    sector_vis: u8,
    (t, depth): (i64, i64),
    x: i32,
    (yl, yh): (i32, i32),
) -> Option<DrawColumn<'a>> {
    let tile = tiles.tile(picnum)?;
    if tile.width <= 0 || tile.height <= 0 {
        return None;
    }
    let mut u = ((t * wall.xrepeat as i64 * 8) >> 16) as i32 + wall.xpanning as i32;
    if wall.has(WallStat::XFlip) {
        u = !u;
    }

    let yrepeat = wall.yrepeat as i64;
    let hw = view.half_width;
    let p = 2 * (yl - view.horizon) as i64 + 1;
    let mut step = ((depth * yrepeat) << 16) / (2048 * hw);
    let mut frac = (((view.z as i64 - zref as i64) * yrepeat) << 9)
        + ((p * depth * yrepeat) << 9) / (32 * hw)
        + ((wall.ypanning as i64) << 16);
    if wall.has(WallStat::YFlip) {
        frac = -frac;
        step = -step;
    }

    let shades = shade_row(tiles, wall.pal, view.shade(wall.shade as i32, depth, sector_vis))?;
    Some(DrawColumn::new(tile.column(u), shades, frac, step, x, yl, yh))
}

impl SoftwareRenderer {
    /// Draw one projected wall with the ceiling and floor in front of it,
    /// then tighten the occlusion of its columns
    pub(crate) fn draw_scan<T: TileProvider + ?Sized>(
        &mut self,
        world: &World,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
        idx: usize,
    ) -> Result<(), RenderError> {
        #[cfg(feature = "hprof")]
        profile!("draw_scan");
        let scan = self.r_data.scans[idx];
        let view = self.view;
        let sec = &world.sectors[scan.sector];
        let wall = &world.walls[scan.wall];
        let p2 = &world.walls[wall.point2];
        let next = wall.nextsector.filter(|&n| n < world.sectors.len());
        let (x1, x2) = (scan.x1, scan.x2);

        let rd = &mut self.r_data;
        for x in x1..x2 {
            let xi = x as usize;
            let (t, depth) = view.column_hit(&scan, x);
            let wx = wall.x + (((p2.x - wall.x) as i64 * t) >> 16) as i32;
            let wy = wall.y + (((p2.y - wall.y) as i64 * t) >> 16) as i32;
            rd.col_t[xi] = t;
            rd.col_depth[xi] = depth;
            let (c, f) = world
                .zs_at(scan.sector, wx, wy)
                .unwrap_or((sec.ceiling.z, sec.floor.z));
            rd.ceil_y[xi] = view.screen_y(c as i64 - view.z as i64, depth);
            rd.floor_y[xi] = view.screen_y(f as i64 - view.z as i64, depth);
            if let Some(n) = next {
                let (nc, nf) = world.zs_at(n, wx, wy).unwrap_or((c, f));
                rd.next_ceil_y[xi] = view.screen_y(nc as i64 - view.z as i64, depth);
                rd.next_floor_y[xi] = view.screen_y(nf as i64 - view.z as i64, depth);
            }
        }

        // Both sides open to the sky: no wall between them
        let sky_above = next.is_some_and(|n| {
            sec.ceiling.is_parallax() && world.sectors[n].ceiling.is_parallax()
        });
        let sky_below =
            next.is_some_and(|n| sec.floor.is_parallax() && world.sectors[n].floor.is_parallax());

        for x in x1..x2 {
            let xi = x as usize;
            let (top, bot) = (rd.occlusion.umost()[xi], rd.occlusion.dmost()[xi]);
            let mut cy = rd.ceil_y[xi];
            if sky_above {
                cy = cy.max(rd.next_ceil_y[xi]);
            }
            rd.plane_top[xi] = top;
            rd.plane_bot[xi] = cy.clamp(top, bot);
        }
        self.draw_plane(world, tiles, buf, pitch, scan.sector, true, x1, x2);

        let rd = &mut self.r_data;
        for x in x1..x2 {
            let xi = x as usize;
            let (top, bot) = (rd.occlusion.umost()[xi], rd.occlusion.dmost()[xi]);
            let mut fy = rd.floor_y[xi];
            if sky_below {
                fy = fy.min(rd.next_floor_y[xi]);
            }
            rd.plane_top[xi] = fy.clamp(top, bot);
            rd.plane_bot[xi] = bot;
        }
        self.draw_plane(world, tiles, buf, pitch, scan.sector, false, x1, x2);

        let align_bottom = wall.has(WallStat::AlignBottom);
        let rd = &mut self.r_data;
        match next {
            None => {
                let zref = if align_bottom { sec.floor.z } else { sec.ceiling.z };
                for x in x1..x2 {
                    let xi = x as usize;
                    let (top, bot) = (rd.occlusion.umost()[xi], rd.occlusion.dmost()[xi]);
                    if top >= bot {
                        continue;
                    }
                    let rows = (rd.ceil_y[xi].max(top), rd.floor_y[xi].min(bot));
                    if rows.0 < rows.1 {
                        let hit = (rd.col_t[xi], rd.col_depth[xi]);
                        if let Some(dc) = wall_column(
                            &view,
                            tiles,
                            wall,
                            wall.picnum,
                            zref,
                            sec.visibility,
                            hit,
                            x,
                            rows,
                        ) {
                            dc.draw_column(buf, pitch);
                        }
                    }
                    rd.occlusion.close(xi);
                }
                rd.push_smost(SmostRecord {
                    scan: idx,
                    kind: SmostKind::Solid,
                    x1,
                    x2,
                    start: 0,
                })?;
            }
            Some(n) => {
                let nsec = &world.sectors[n];
                let upper_zref = if align_bottom { sec.ceiling.z } else { nsec.ceiling.z };
                let lower_zref = if align_bottom { sec.ceiling.z } else { nsec.floor.z };
                let lower = if wall.has(WallStat::BottomSwap) {
                    wall.nextwall.and_then(|w| world.walls.get(w)).unwrap_or(wall)
                } else {
                    wall
                };

                for x in x1..x2 {
                    let xi = x as usize;
                    let (top, bot) = (rd.occlusion.umost()[xi], rd.occlusion.dmost()[xi]);
                    if top >= bot {
                        continue;
                    }
                    let (cy, fy) = (rd.ceil_y[xi], rd.floor_y[xi]);
                    let (ncy, nfy) = (rd.next_ceil_y[xi], rd.next_floor_y[xi]);
                    let hit = (rd.col_t[xi], rd.col_depth[xi]);

                    let rows = (cy.max(top), ncy.min(bot));
                    if !sky_above && rows.0 < rows.1 {
                        if let Some(dc) = wall_column(
                            &view,
                            tiles,
                            wall,
                            wall.picnum,
                            upper_zref,
                            sec.visibility,
                            hit,
                            x,
                            rows,
                        ) {
                            dc.draw_column(buf, pitch);
                        }
                    }
                    let rows = (nfy.max(top), fy.min(bot));
                    if !sky_below && rows.0 < rows.1 {
                        if let Some(dc) = wall_column(
                            &view,
                            tiles,
                            lower,
                            lower.picnum,
                            lower_zref,
                            sec.visibility,
                            hit,
                            x,
                            rows,
                        ) {
                            dc.draw_column(buf, pitch);
                        }
                    }

                    rd.occlusion.raise_top(xi, cy.max(ncy));
                    rd.occlusion.lower_bottom(xi, fy.min(nfy));
                }

                let start = rd.save_occlusion(x1, x2, true)?;
                rd.push_smost(SmostRecord {
                    scan: idx,
                    kind: SmostKind::Upper,
                    x1,
                    x2,
                    start,
                })?;
                let start = rd.save_occlusion(x1, x2, false)?;
                rd.push_smost(SmostRecord {
                    scan: idx,
                    kind: SmostKind::Lower,
                    x1,
                    x2,
                    start,
                })?;

                if wall.has(WallStat::Masked) && wall.overpicnum >= 0 {
                    let start = rd.save_occlusion(x1, x2, true)?;
                    rd.save_occlusion(x1, x2, false)?;
                    rd.push_masked(MaskedWall {
                        scan: idx,
                        x1,
                        x2,
                        start,
                    })?;
                }

                if rd.occlusion.any_open(x1, x2) {
                    self.queue.push(n)?;
                }
            }
        }

        self.r_data.visible.push(VisibleWall {
            sector: scan.sector,
            wall: scan.wall,
            x1,
            x2: x2 - 1,
        });
        self.stats.walls_drawn += 1;
        Ok(())
    }

    /// Draw a masked portal wall put aside during traversal, clipped to the
    /// opening it had then
    pub(crate) fn draw_masked_wall<T: TileProvider + ?Sized>(
        &self,
        world: &World,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
        masked: &MaskedWall,
    ) {
        let scan = self.r_data.scans[masked.scan];
        let view = self.view;
        let wall = &world.walls[scan.wall];
        let sec = &world.sectors[scan.sector];
        let Some(nsec) = wall.nextsector.and_then(|n| world.sectors.get(n)) else {
            return;
        };
        let zref = if wall.has(WallStat::AlignBottom) {
            sec.floor.z.min(nsec.floor.z)
        } else {
            sec.ceiling.z.max(nsec.ceiling.z)
        };
        let translucency = if wall.has(WallStat::Translucent) {
            tiles.translucency()
        } else {
            None
        };
        let reverse = wall.has(WallStat::TranslucentReverse);
        let len = (masked.x2 - masked.x1) as usize;
        let tops = &self.r_data.smost_pool[masked.start..masked.start + len];
        let bots = &self.r_data.smost_pool[masked.start + len..masked.start + 2 * len];

        for x in masked.x1..masked.x2 {
            let i = (x - masked.x1) as usize;
            if tops[i] >= bots[i] {
                continue;
            }
            let hit = view.column_hit(&scan, x);
            if let Some(dc) = wall_column(
                &view,
                tiles,
                wall,
                wall.overpicnum,
                zref,
                sec.visibility,
                hit,
                x,
                (tops[i], bots[i]),
            ) {
                dc.draw_masked(buf, pitch, translucency, reverse);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DrawColumn;
    use render_trait::TRANSPARENT_INDEX;

    #[test]
    fn column_steps_and_wraps() {
        let column = [1u8, 2, 3, 4];
        let shades: Vec<u8> = (0..=255u8).collect();
        let mut buf = vec![0u8; 8];
        // Half a texel a row, starting at texel 3
        DrawColumn::new(&column, &shades, 3 << 16, 1 << 15, 0, 0, 6).draw_column(&mut buf, 1);
        assert_eq!(&buf[..6], &[4, 4, 1, 1, 2, 2]);
        assert_eq!(buf[6], 0);
    }

    #[test]
    fn masked_column_skips_transparent() {
        let column = [7u8, TRANSPARENT_INDEX];
        let shades: Vec<u8> = (0..=255u8).collect();
        let mut buf = vec![9u8; 4];
        DrawColumn::new(&column, &shades, 0, 1 << 16, 0, 0, 4).draw_masked(&mut buf, 1, None, false);
        assert_eq!(buf, vec![7, 9, 7, 9]);
    }
}
