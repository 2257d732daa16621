#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::trace;
use math::{ksqrt, point_on_side, ray_intersect};

use super::zrange::{grown_floor_quad, origin_in_quad};
use super::{ClipContext, ClipMask, HitInfo};
use crate::level::flags::{SectorStat, SpriteStat};
use crate::level::map_defs::{Plane, SpriteOrientation};
use crate::{TileMetrics, World};

/// Where a scan that hits nothing ends up
const HITSCAN_GOAL: i32 = (1 << 29) - 1;

#[derive(Clone, Copy)]
struct Ray {
    xs: i32,
    ys: i32,
    zs: i32,
    vx: i32,
    vy: i32,
    vz: i32,
}

impl Ray {
    #[inline]
    fn dist(&self, x: i32, y: i32) -> i64 {
        (x as i64 - self.xs as i64).abs() + (y as i64 - self.ys as i64).abs()
    }

    /// The point `num / den` of the way along the direction vector
    fn at(&self, num: i128, den: i128) -> (i32, i32, i32) {
        let step = |v: i32, s: i32| (s as i128 + v as i128 * num / den).clamp(i32::MIN as i128, i32::MAX as i128) as i32;
        (step(self.vx, self.xs), step(self.vy, self.ys), step(self.vz, self.zs))
    }

    /// Where the ray meets a sector plane, sloped or flat
    fn plane(&self, world: &World, sector: usize, plane: &Plane, ceiling: bool) -> Option<(i32, i32, i32)> {
        if plane.has(SectorStat::Sloped) {
            let sec = &world.sectors[sector];
            let w = &world.walls[sec.wallptr];
            let w2 = &world.walls[w.point2];
            let dx = (w2.x - w.x) as i128;
            let dy = (w2.y - w.y) as i128;
            let len = ksqrt((dx * dx + dy * dy) as i64) as i128;
            if len == 0 {
                return None;
            }
            // z = base + heinum * (dx * ry - dy * rx) / (256 * len)
            let k = len << 8;
            let h = plane.heinum as i128;
            let den = k * self.vz as i128 - h * (dx * self.vy as i128 - dy * self.vx as i128);
            if den == 0 {
                return None;
            }
            let rx = (self.xs - w.x) as i128;
            let ry = (self.ys - w.y) as i128;
            let num = k * (plane.z as i128 - self.zs as i128) + h * (dx * ry - dy * rx);
            if (num ^ den) < 0 {
                return None;
            }
            return Some(self.at(num, den));
        }

        let towards = if ceiling {
            self.vz < 0 && self.zs >= plane.z
        } else {
            self.vz > 0 && self.zs <= plane.z
        };
        if !towards {
            return None;
        }
        let (x, y, _) = self.at((plane.z - self.zs) as i128, self.vz as i128);
        Some((x, y, plane.z))
    }
}

impl ClipContext {
    /// Trace a ray from `(xs, ys, zs)` along `(vx, vy, vz)` and report the
    /// nearest sector plane, wall or sprite it stops at
    pub fn hitscan<T: TileMetrics + ?Sized>(
        &mut self,
        world: &World,
        tiles: &T,
        xs: i32,
        ys: i32,
        zs: i32,
        sector: Option<usize>,
        vx: i32,
        vy: i32,
        vz: i32,
        mask: ClipMask,
    ) -> HitInfo {
        #[cfg(feature = "hprof")]
        profile!("hitscan");
        let Some(start) = sector.filter(|&s| s < world.sectors.len()) else {
            return HitInfo {
                x: xs,
                y: ys,
                z: zs,
                ..HitInfo::default()
            };
        };
        let ray = Ray { xs, ys, zs, vx, vy, vz };
        let mut hit = HitInfo {
            x: HITSCAN_GOAL,
            y: HITSCAN_GOAL,
            z: zs,
            ..HitInfo::default()
        };
        let mut best = ray.dist(hit.x, hit.y);

        self.reset(start);
        let mut idx = 0;
        while idx < self.sectors.len() {
            let s = self.sectors[idx];
            idx += 1;
            let sec = &world.sectors[s];

            for (plane, ceiling) in [(&sec.ceiling, true), (&sec.floor, false)] {
                if let Some((x, y, z)) = ray.plane(world, s, plane, ceiling) {
                    let d = ray.dist(x, y);
                    if d < best && world.inside(x, y, s) == Some(true) {
                        best = d;
                        hit = HitInfo {
                            sector: Some(s),
                            wall: None,
                            sprite: None,
                            x,
                            y,
                            z,
                        };
                    }
                }
            }

            for w in sec.walls() {
                let wal = &world.walls[w];
                let wal2 = &world.walls[wal.point2];
                if point_on_side(wal.x, wal.y, wal2.x, wal2.y, xs, ys) < 0 {
                    continue;
                }
                let Some((ix, iy, iz)) = ray_intersect(xs, ys, zs, vx, vy, vz, wal.x, wal.y, wal2.x, wal2.y) else {
                    continue;
                };
                let d = ray.dist(ix, iy);
                if d >= best {
                    continue;
                }
                let open = match wal.nextsector {
                    Some(next) if wal.cstat & mask.walls == 0 => world
                        .zs_at(next, ix, iy)
                        .is_some_and(|(cz, fz)| iz > cz && iz < fz)
                        .then_some(next),
                    _ => None,
                };
                match open {
                    Some(next) => self.add_sector(next),
                    None => {
                        best = d;
                        hit = HitInfo {
                            sector: Some(s),
                            wall: Some(w),
                            sprite: None,
                            x: ix,
                            y: iy,
                            z: iz,
                        };
                    }
                }
            }

            for j in world.sprites_in_sector(s) {
                let Some(spr) = world.sprite(j) else {
                    continue;
                };
                if spr.cstat & mask.sprites == 0 {
                    continue;
                }
                let found = match spr.orientation() {
                    SpriteOrientation::Face | SpriteOrientation::Voxel => {
                        let topt = vx as i64 * (spr.x - xs) as i64 + vy as i64 * (spr.y - ys) as i64;
                        let bot = vx as i64 * vx as i64 + vy as i64 * vy as i64;
                        if topt <= 0 || bot == 0 {
                            continue;
                        }
                        let (ix, iy, iz) = ray.at(topt as i128, bot as i128);
                        let (top, bottom) = spr.z_extent(tiles);
                        if iz > bottom || iz < top {
                            continue;
                        }
                        // Squared offset of the sprite off the ray against its drawn width
                        let topu = vx as i128 * (spr.y - ys) as i128 - vy as i128 * (spr.x - xs) as i128;
                        let width = tiles.tile_size(spr.picnum).0 as i128 * spr.xrepeat as i128;
                        if topu * topu / bot as i128 > (width * width) >> 7 {
                            continue;
                        }
                        Some((ix, iy, iz))
                    }
                    SpriteOrientation::Wall => {
                        let ((x1, y1), (x2, y2)) = spr.wall_ends(tiles);
                        if spr.has(SpriteStat::OneSided) && point_on_side(x1, y1, x2, y2, xs, ys) < 0 {
                            continue;
                        }
                        let Some((ix, iy, iz)) = ray_intersect(xs, ys, zs, vx, vy, vz, x1, y1, x2, y2) else {
                            continue;
                        };
                        let (top, bottom) = spr.z_extent(tiles);
                        (iz < bottom && iz > top).then_some((ix, iy, iz))
                    }
                    SpriteOrientation::Floor => {
                        if vz == 0 || ((spr.z - zs) ^ vz) < 0 {
                            continue;
                        }
                        if spr.has(SpriteStat::OneSided) && (zs > spr.z) == !spr.has(SpriteStat::YFlip) {
                            continue;
                        }
                        let (ix, iy, _) = ray.at((spr.z - zs) as i128, vz as i128);
                        let quad = grown_floor_quad(spr.floor_corners(tiles), spr.ang as i32, 0, ix, iy);
                        origin_in_quad(&quad).then_some((ix, iy, spr.z))
                    }
                };
                if let Some((x, y, z)) = found {
                    let d = ray.dist(x, y);
                    if d > best {
                        continue;
                    }
                    best = d;
                    hit = HitInfo {
                        sector: Some(s),
                        wall: None,
                        sprite: Some(j),
                        x,
                        y,
                        z,
                    };
                }
            }
        }

        trace!("hitscan from {},{} visited {} sectors", xs, ys, self.sectors.len());
        hit
    }
}
