//! Swept movement with sliding, and pushing a mover back out of walls.

#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::{debug, trace};
use math::{get_angle, ksqrt, saturate, sin, ANGLE_180, ANGLE_90};

use super::{BoxSide, ClipContext, ClipHit, ClipMask, Clearance, Position, PushResult};
use super::{CLIP_RETRIES, MAX_CLIP_DIST, PUSH_RETRIES};
use crate::level::flags::SpriteStat;
use crate::level::map_defs::SpriteOrientation;
use crate::{TileMetrics, World};

/// Steps taken along a wall normal for one push
const PUSH_STEPS: i32 = 16;
/// Trace attempts when backing an intersection off a line
const TRACE_BACKOFF: i32 = 256;
/// A floor or ceiling step smaller than this is ignored
const STEP_SLACK: i32 = 1 << 8;

#[derive(Debug, Clone, Copy)]
struct BBox {
    xmin: i32,
    ymin: i32,
    xmax: i32,
    ymax: i32,
}

impl BBox {
    fn around(cx: i32, cy: i32, rad: i32) -> Self {
        Self {
            xmin: cx.saturating_sub(rad),
            ymin: cy.saturating_sub(rad),
            xmax: cx.saturating_add(rad),
            ymax: cy.saturating_add(rad),
        }
    }

    #[inline]
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    /// Both ends of the segment are off the same side of the box
    #[inline]
    fn rejects(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        (x1 < self.xmin && x2 < self.xmin)
            || (x1 > self.xmax && x2 > self.xmax)
            || (y1 < self.ymin && y2 < self.ymin)
            || (y1 > self.ymax && y2 > self.ymax)
    }

    /// The wall's line misses the box entirely on its back side
    #[inline]
    fn behind(&self, x1: i32, y1: i32, dx: i64, dy: i64) -> bool {
        let dax = if dx > 0 {
            dx * (self.ymin - y1) as i64
        } else {
            dx * (self.ymax - y1) as i64
        };
        let day = if dy > 0 {
            dy * (self.xmax - x1) as i64
        } else {
            dy * (self.xmin - x1) as i64
        };
        dax >= day
    }
}

/// Does a clearance box of half-size `walldist` at `(x, y)` touch the
/// segment, and from which side
pub fn clip_inside_box_line(x: i32, y: i32, x1: i32, y1: i32, x2: i32, y2: i32, walldist: i32) -> BoxSide {
    let wd = walldist as i64;
    let r = wd << 1;
    let x1 = x1 as i64 + wd - x as i64;
    let y1 = y1 as i64 + wd - y as i64;
    let x2 = x2 as i64 + wd - x as i64;
    let y2 = y2 as i64 + wd - y as i64;

    if (x1 < 0 && x2 < 0) || (y1 < 0 && y2 < 0) || (x1 >= r && x2 >= r) || (y1 >= r && y2 >= r) {
        return BoxSide::Outside;
    }

    let dx = x2 - x1;
    let dy = y2 - y1;
    if dx * (wd - y1) >= dy * (wd - x1) {
        let a = if dx > 0 { dx * -y1 } else { dx * (r - y1) };
        let b = if dy > 0 { dy * (r - x1) } else { dy * -x1 };
        return if a < b { BoxSide::Front } else { BoxSide::Outside };
    }
    let a = if dx > 0 { dx * (r - y1) } else { dx * -y1 };
    let b = if dy > 0 { dy * -x1 } else { dy * (r - x1) };
    if a >= b { BoxSide::Back } else { BoxSide::Outside }
}

/// `clip_inside_box_line` against a wall of the world
pub fn clip_inside_box(world: &World, x: i32, y: i32, wall: usize, walldist: i32) -> BoxSide {
    let Some(w) = world.walls.get(wall) else {
        return BoxSide::Outside;
    };
    let w2 = &world.walls[w.point2];
    clip_inside_box_line(x, y, w.x, w.y, w2.x, w2.y, walldist)
}

/// Would stepping from `sector` into `next` at the wall point nearest the
/// move be too big a step up or down for the mover
fn step_blocks(world: &World, sector: usize, next: usize, x: i32, y: i32, z: i32, clear: Clearance) -> bool {
    let (Some((cz, fz)), Some((ncz, nfz))) = (world.zs_at(sector, x, y), world.zs_at(next, x, y)) else {
        return true;
    };
    let nsec = &world.sectors[next];
    if nfz < fz - STEP_SLACK && !nsec.floor.is_parallax() && z >= nfz - (clear.floor - 1) {
        return true;
    }
    ncz > cz + STEP_SLACK && !nsec.ceiling.is_parallax() && z <= ncz + (clear.ceiling - 1)
}

impl ClipContext {
    /// Move `pos` by `(xvect, yvect)` (18.14 fixed), sliding along whatever
    /// gets in the way. The vectors are left holding the unused part of the
    /// move. Returns the first thing hit.
    pub fn clip_move<T: TileMetrics + ?Sized>(
        &mut self,
        world: &World,
        tiles: &T,
        pos: &mut Position,
        xvect: &mut i32,
        yvect: &mut i32,
        clear: Clearance,
        mask: ClipMask,
    ) -> ClipHit {
        #[cfg(feature = "hprof")]
        profile!("clip_move");
        let Some(start) = pos.sector.filter(|&s| s < world.sectors.len()) else {
            return ClipHit::None;
        };
        if *xvect == 0 && *yvect == 0 {
            return ClipHit::None;
        }

        let (oxvect, oyvect) = (*xvect as i64, *yvect as i64);
        let mut goalx = pos.x.saturating_add(*xvect >> 14);
        let mut goaly = pos.y.saturating_add(*yvect >> 14);
        let gx = goalx - pos.x;
        let gy = goaly - pos.y;
        let cx = ((pos.x as i64 + goalx as i64) >> 1) as i32;
        let cy = ((pos.y as i64 + goaly as i64) >> 1) as i32;
        let rad = ksqrt(gx as i64 * gx as i64 + gy as i64 * gy as i64) + MAX_CLIP_DIST + clear.wall + 8;
        let bbox = BBox::around(cx, cy, rad);

        self.reset(start);
        let mut idx = 0;
        while idx < self.sectors.len() {
            let sector = self.sectors[idx];
            idx += 1;
            self.gather_walls(world, sector, pos, gx, gy, &bbox, clear, mask);
            self.gather_sprites(world, tiles, sector, pos, gx, gy, &bbox, cx, cy, rad, clear, mask);
        }
        trace!("clip_move gathered {} lines over {} sectors", self.lines.len(), self.sectors.len());

        let mut hit = ClipHit::None;
        let mut cnt = CLIP_RETRIES;
        let (mut x, mut y) = (pos.x, pos.y);
        loop {
            let mut intx = goalx;
            let mut inty = goaly;
            let line_hit = self.raytrace(x, y, &mut intx, &mut inty);
            if let Some(h) = line_hit {
                let line = self.lines[h];
                let lx = (line.x2 - line.x1) as i64;
                let ly = (line.y2 - line.y1) as i64;
                let len2 = lx * lx + ly * ly;
                if len2 > 0 {
                    let along = (goalx - intx) as i64 * lx + (goaly - inty) as i64 * ly;
                    let t = if (along.abs() >> 11) < len2 { (along << 20) / len2 } else { 0 };
                    goalx = saturate(((lx * t) >> 20) + intx as i64);
                    goaly = saturate(((ly * t) >> 20) + inty as i64);
                }

                // Sliding back the way an earlier hit pushed us means we are
                // wedged in a corner
                let dir = (lx * oxvect + ly * oyvect) >> 6;
                for k in (cnt + 1)..=CLIP_RETRIES {
                    let prev = self.lines[self.hits[k]];
                    let pdir = ((prev.x2 - prev.x1) as i64 * oxvect + (prev.y2 - prev.y1) as i64 * oyvect) >> 6;
                    if (dir ^ pdir) < 0 {
                        pos.x = x;
                        pos.y = y;
                        pos.sector = world.update_sector(x, y, pos.sector);
                        return hit;
                    }
                }

                self.keep_away(&mut goalx, &mut goaly, h);
                *xvect = saturate(((goalx - intx) as i64) << 14);
                *yvect = saturate(((goaly - inty) as i64) << 14);

                if cnt == CLIP_RETRIES {
                    hit = line.hit;
                }
                self.hits[cnt] = h;
            }
            cnt -= 1;
            x = intx;
            y = inty;
            if (*xvect == 0 && *yvect == 0) || line_hit.is_none() || cnt == 0 {
                break;
            }
        }

        pos.x = x;
        pos.y = y;
        for &s in &self.sectors {
            if world.inside(x, y, s) == Some(true) {
                pos.sector = Some(s);
                return hit;
            }
        }

        // Left every sector we know of, take the nearest in z of the ones
        // holding the point
        let mut best = None;
        let mut best_gap = i32::MAX;
        for s in (0..world.sectors.len()).rev() {
            if world.inside(x, y, s) != Some(true) {
                continue;
            }
            let gap = world.z_gap(s, x, y, pos.z);
            if gap < 0 {
                pos.sector = Some(s);
                return hit;
            }
            if gap < best_gap {
                best = Some(s);
                best_gap = gap;
            }
        }
        if best.is_none() {
            debug!("clip_move ended outside every sector at {},{}", x, y);
        }
        pos.sector = best;
        hit
    }

    fn gather_walls(
        &mut self,
        world: &World,
        sector: usize,
        pos: &Position,
        gx: i32,
        gy: i32,
        bbox: &BBox,
        clear: Clearance,
        mask: ClipMask,
    ) {
        let walldist = clear.wall;
        for j in world.sectors[sector].walls() {
            let wal = &world.walls[j];
            let wal2 = &world.walls[wal.point2];
            let (x1, y1, x2, y2) = (wal.x, wal.y, wal2.x, wal2.y);
            if bbox.rejects(x1, y1, x2, y2) {
                continue;
            }
            let dx = (x2 - x1) as i64;
            let dy = (y2 - y1) as i64;
            // Facing away from the mover
            if (dx * (pos.y - y1) as i64) < (pos.x - x1) as i64 * dy {
                continue;
            }
            if bbox.behind(x1, y1, dx, dy) {
                continue;
            }

            let blocks = match wal.nextsector {
                None => true,
                Some(_) if wal.cstat & mask.walls != 0 => true,
                Some(next) => {
                    let (ix, iy) = math::ray_intersect(pos.x, pos.y, 0, gx, gy, 0, x1, y1, x2, y2)
                        .map_or((pos.x, pos.y), |(x, y, _)| (x, y));
                    step_blocks(world, sector, next, ix, iy, pos.z, clear)
                }
            };

            if !blocks {
                if let Some(next) = wal.nextsector {
                    self.add_sector(next);
                }
                continue;
            }

            let hit = ClipHit::Wall(j);
            // End caps so corners stop the mover as a box would
            let bsz = if gx < 0 { -walldist } else { walldist };
            self.add_line(x1 - bsz, y1 - bsz, x1 - bsz, y1 + bsz, hit);
            self.add_line(x2 - bsz, y2 - bsz, x2 - bsz, y2 + bsz, hit);
            let bsz = if gy < 0 { -walldist } else { walldist };
            self.add_line(x1 + bsz, y1 - bsz, x1 - bsz, y1 - bsz, hit);
            self.add_line(x2 + bsz, y2 - bsz, x2 - bsz, y2 - bsz, hit);

            let dax = if dy > 0 { -walldist } else { walldist };
            let day = if dx < 0 { -walldist } else { walldist };
            self.add_line(x1 + dax, y1 + day, x2 + dax, y2 + day, hit);
        }
    }

    fn gather_sprites<T: TileMetrics + ?Sized>(
        &mut self,
        world: &World,
        tiles: &T,
        sector: usize,
        pos: &Position,
        gx: i32,
        gy: i32,
        bbox: &BBox,
        cx: i32,
        cy: i32,
        rad: i32,
        clear: Clearance,
        mask: ClipMask,
    ) {
        let walldist = clear.wall;
        for j in world.sprites_in_sector(sector) {
            let Some(spr) = world.sprite(j) else {
                continue;
            };
            if spr.cstat & mask.sprites == 0 {
                continue;
            }
            let hit = ClipHit::Sprite(j);
            let (sx, sy) = (spr.x, spr.y);
            match spr.orientation() {
                SpriteOrientation::Face | SpriteOrientation::Voxel => {
                    if !bbox.contains(sx, sy) {
                        continue;
                    }
                    let (top, bottom) = spr.z_extent(tiles);
                    if pos.z < bottom + clear.ceiling && pos.z > top - clear.floor {
                        let size = ((spr.clipdist as i32) << 2) + walldist;
                        let bsz = if gx < 0 { -size } else { size };
                        self.add_line(sx - bsz, sy - bsz, sx - bsz, sy + bsz, hit);
                        let bsz = if gy < 0 { -size } else { size };
                        self.add_line(sx + bsz, sy - bsz, sx - bsz, sy - bsz, hit);
                    }
                }
                SpriteOrientation::Wall => {
                    let (top, bottom) = spr.z_extent(tiles);
                    if !(pos.z < bottom + clear.ceiling && pos.z > top - clear.floor) {
                        continue;
                    }
                    let ((x1, y1), (x2, y2)) = spr.wall_ends(tiles);
                    if clip_inside_box_line(cx, cy, x1, y1, x2, y2, rad) == BoxSide::Outside {
                        continue;
                    }
                    let ang = spr.ang as i32;
                    let dax = (sin(ang + 256 + ANGLE_90) as i64 * walldist as i64 >> 14) as i32;
                    let day = (sin(ang + 256) as i64 * walldist as i64 >> 14) as i32;

                    let front = (x1 - pos.x) as i64 * (y2 - pos.y) as i64
                        >= (x2 - pos.x) as i64 * (y1 - pos.y) as i64;
                    if front {
                        self.add_line(x1 + dax, y1 + day, x2 + day, y2 - dax, hit);
                    } else {
                        if spr.has(SpriteStat::OneSided) {
                            continue;
                        }
                        self.add_line(x2 - dax, y2 - day, x1 - day, y1 + dax, hit);
                    }

                    // Side blockers for movers coming past the ends
                    if ((x2 - x1) as i64 * (pos.x - x1) as i64 + (y2 - y1) as i64 * (pos.y - y1) as i64) < 0 {
                        self.add_line(x1 - day, y1 + dax, x1 + dax, y1 + day, hit);
                    } else if ((x1 - x2) as i64 * (pos.x - x2) as i64 + (y1 - y2) as i64 * (pos.y - y2) as i64) < 0 {
                        self.add_line(x2 + day, y2 - dax, x2 - dax, y2 - day, hit);
                    }
                }
                SpriteOrientation::Floor => {
                    if !(pos.z < spr.z + clear.ceiling && pos.z > spr.z - clear.floor) {
                        continue;
                    }
                    if spr.has(SpriteStat::OneSided) && (pos.z > spr.z) == !spr.has(SpriteStat::YFlip) {
                        continue;
                    }
                    let r = spr.floor_corners(tiles);
                    let ang = spr.ang as i32;
                    let dax = (sin(ang - 256 + ANGLE_90) as i64 * walldist as i64 >> 14) as i32;
                    let day = (sin(ang - 256) as i64 * walldist as i64 >> 14) as i32;
                    let faces = |a: (i32, i32), b: (i32, i32)| {
                        ((a.0 - pos.x) as i64) * ((b.1 - pos.y) as i64) < ((b.0 - pos.x) as i64) * ((a.1 - pos.y) as i64)
                    };
                    let near = |a: (i32, i32), b: (i32, i32)| {
                        clip_inside_box_line(cx, cy, a.0, a.1, b.0, b.1, rad) != BoxSide::Outside
                    };

                    if faces(r[0], r[1]) {
                        if near(r[1], r[0]) {
                            self.add_line(r[1].0 - day, r[1].1 + dax, r[0].0 + dax, r[0].1 + day, hit);
                        }
                    } else if faces(r[2], r[3]) && near(r[3], r[2]) {
                        self.add_line(r[3].0 + day, r[3].1 - dax, r[2].0 - dax, r[2].1 - day, hit);
                    }

                    if faces(r[1], r[2]) {
                        if near(r[2], r[1]) {
                            self.add_line(r[2].0 - dax, r[2].1 - day, r[1].0 - day, r[1].1 + dax, hit);
                        }
                    } else if faces(r[3], r[0]) && near(r[0], r[3]) {
                        self.add_line(r[0].0 + dax, r[0].1 + day, r[3].0 + day, r[3].1 - dax, hit);
                    }
                }
            }
        }
    }

    /// Trace `(x3, y3) -> (x4, y4)` against the gathered lines. On a hit the
    /// end point is pulled back to just in front of the nearest line.
    fn raytrace(&self, x3: i32, y3: i32, x4: &mut i32, y4: &mut i32) -> Option<usize> {
        let mut hit = None;
        for (z, line) in self.lines.iter().enumerate().rev() {
            let (x1, y1, x2, y2) = (line.x1 as i64, line.y1 as i64, line.x2 as i64, line.y2 as i64);
            let (x3l, y3l) = (x3 as i64, y3 as i64);
            let x21 = x2 - x1;
            let y21 = y2 - y1;

            let mut topu = x21 * (y3l - y1) - (x3l - x1) * y21;
            if topu <= 0 {
                continue;
            }
            if x21 * (*y4 as i64 - y1) > (*x4 as i64 - x1) * y21 {
                continue;
            }
            let x43 = *x4 as i64 - x3l;
            let y43 = *y4 as i64 - y3l;
            if x43 * (y1 - y3l) > (x1 - x3l) * y43 {
                continue;
            }
            if x43 * (y2 - y3l) <= (x2 - x3l) * y43 {
                continue;
            }
            let bot = x43 * y21 - x21 * y43;
            if bot == 0 {
                continue;
            }

            let mut tries = TRACE_BACKOFF;
            let (mut nx, mut ny);
            loop {
                tries -= 1;
                if tries < 0 {
                    *x4 = x3;
                    *y4 = y3;
                    return Some(z);
                }
                nx = x3l + (x43 as i128 * topu as i128 / bot as i128) as i64;
                ny = y3l + (y43 as i128 * topu as i128 / bot as i128) as i64;
                topu -= 1;
                if x21 * (ny - y1) > (nx - x1) * y21 {
                    break;
                }
            }

            if (x3l - nx).abs() + (y3l - ny).abs() < (x3l - *x4 as i64).abs() + (y3l - *y4 as i64).abs() {
                *x4 = nx as i32;
                *y4 = ny as i32;
                hit = Some(z);
            }
        }
        hit
    }

    /// Step the point one unit at a time until it is strictly in front of
    /// line `w`
    fn keep_away(&self, x: &mut i32, y: &mut i32, w: usize) {
        let line = self.lines[w];
        let (x1, y1) = (line.x1 as i64, line.y1 as i64);
        let dx = (line.x2 - line.x1) as i64;
        let dy = (line.y2 - line.y1) as i64;
        if dx == 0 && dy == 0 {
            return;
        }
        let ox = (-dy).signum() as i32;
        let oy = dx.signum() as i32;
        let mut first = dx.abs() <= dy.abs();
        loop {
            if dx * (*y as i64 - y1) > (*x as i64 - x1) * dy {
                return;
            }
            if first {
                *y += oy;
            } else {
                *x += ox;
            }
            first = !first;
        }
    }

    /// Push `pos` out of any wall whose clearance box it sits in, one wall
    /// at a time, alternating the sweep direction between passes.
    pub fn push_move(&mut self, world: &World, pos: &mut Position, clear: Clearance, mask: ClipMask) -> PushResult {
        let mut budget = PUSH_RETRIES;
        let mut forward = true;
        let mut pushed = false;
        let box_size = clear.wall - 4;

        loop {
            let Some(start) = pos.sector.filter(|&s| s < world.sectors.len()) else {
                return PushResult::NoSector;
            };
            let mut bad = false;
            self.reset(start);
            let mut idx = 0;
            while idx < self.sectors.len() {
                let sector = self.sectors[idx];
                idx += 1;
                let range = world.sectors[sector].walls();
                for k in 0..range.len() {
                    let i = if forward { range.start + k } else { range.end - 1 - k };
                    if clip_inside_box(world, pos.x, pos.y, i, box_size) != BoxSide::Front {
                        continue;
                    }
                    let wal = &world.walls[i];
                    let wal2 = &world.walls[wal.point2];
                    let blocks = match wal.nextsector {
                        None => true,
                        Some(_) if wal.cstat & mask.walls != 0 => true,
                        Some(next) => {
                            let (nx, ny) = closest_on_wall(wal.x, wal.y, wal2.x, wal2.y, pos.x, pos.y);
                            step_blocks(world, sector, next, nx, ny, pos.z, clear)
                        }
                    };
                    if !blocks {
                        if let Some(next) = wal.nextsector {
                            self.add_sector(next);
                        }
                        continue;
                    }

                    let ang = get_angle(wal2.x - wal.x, wal2.y - wal.y);
                    let dx = sin(ang + ANGLE_180) >> 11;
                    let dy = sin(ang + ANGLE_90) >> 11;
                    for _ in 0..PUSH_STEPS {
                        pos.x += dx;
                        pos.y += dy;
                        if clip_inside_box(world, pos.x, pos.y, i, box_size) == BoxSide::Outside {
                            break;
                        }
                    }
                    bad = true;
                    pushed = true;
                    budget -= 1;
                    if budget <= 0 {
                        debug!("push_move gave up at {},{}", pos.x, pos.y);
                        return PushResult::Stuck;
                    }
                    pos.sector = world.update_sector(pos.x, pos.y, pos.sector);
                    if pos.sector.is_none() {
                        return PushResult::NoSector;
                    }
                }
            }
            forward = !forward;
            if !bad {
                break;
            }
        }
        if pushed { PushResult::Pushed } else { PushResult::Free }
    }
}

/// Nearest point to `(px, py)` on the segment
fn closest_on_wall(x1: i32, y1: i32, x2: i32, y2: i32, px: i32, py: i32) -> (i32, i32) {
    let dx = (x2 - x1) as i64;
    let dy = (y2 - y1) as i64;
    let along = dx * (px - x1) as i64 + dy * (py - y1) as i64;
    let t = if along <= 0 {
        0
    } else {
        let len2 = dx * dx + dy * dy;
        if along >= len2 { 1 << 30 } else { (along << 30) / len2 }
    };
    (x1 + ((dx * t) >> 30) as i32, y1 + ((dy * t) >> 30) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_against_line_sides() {
        // Wall along +x at y = 0, interior (front) is +y
        assert_eq!(clip_inside_box_line(50, 10, 0, 0, 100, 0, 32), BoxSide::Front);
        assert_eq!(clip_inside_box_line(50, -10, 0, 0, 100, 0, 32), BoxSide::Back);
        assert_eq!(clip_inside_box_line(50, 100, 0, 0, 100, 0, 32), BoxSide::Outside);
        assert_eq!(clip_inside_box_line(500, 10, 0, 0, 100, 0, 32), BoxSide::Outside);
    }

    #[test]
    fn closest_point_clamps_to_ends() {
        assert_eq!(closest_on_wall(0, 0, 100, 0, 50, 30), (50, 0));
        assert_eq!(closest_on_wall(0, 0, 100, 0, -50, 30), (0, 0));
        assert_eq!(closest_on_wall(0, 0, 100, 0, 150, 30), (100, 0));
    }
}
