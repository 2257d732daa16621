#[cfg(feature = "hprof")]
use coarse_prof::profile;
use math::{sin, ANGLE_90};

use super::movement::clip_inside_box_line;
use super::{BoxSide, ClipContext, ClipHit, ClipMask, ZRange, MAX_CLIP_DIST};
use crate::level::flags::SpriteStat;
use crate::level::map_defs::SpriteOrientation;
use crate::{TileMetrics, World};

/// A portal is only looked through when the point is this far clear of the
/// neighbour's planes
const PORTAL_Z_SLACK: i32 = 3 << 8;

/// Even-odd crossing test of the origin against a quad given relative to
/// the point being tested
pub(crate) fn origin_in_quad(q: &[(i64, i64); 4]) -> bool {
    let mut inside = false;
    for i in 0..4 {
        let (x1, y1) = q[i];
        let (x2, y2) = q[(i + 1) & 3];
        if (y1 ^ y2) < 0 {
            if (x1 ^ x2) < 0 {
                inside ^= (x1 * y2 < x2 * y1) ^ (y1 < y2);
            } else if x1 >= 0 {
                inside = !inside;
            }
        }
    }
    inside
}

/// Floor sprite corners grown by `dist` and made relative to `(x, y)`
pub(crate) fn grown_floor_quad(corners: [(i32, i32); 4], ang: i32, dist: i32, x: i32, y: i32) -> [(i64, i64); 4] {
    let dax = (sin(ang - 256 + ANGLE_90) as i64 * dist as i64) >> 14;
    let day = (sin(ang - 256) as i64 * dist as i64) >> 14;
    let rel = |p: (i32, i32)| ((p.0 - x) as i64, (p.1 - y) as i64);
    let [c0, c1, c2, c3] = corners.map(rel);
    [
        (c0.0 + dax, c0.1 + day),
        (c1.0 - day, c1.1 + dax),
        (c2.0 - dax, c2.1 - day),
        (c3.0 + day, c3.1 - dax),
    ]
}

impl ClipContext {
    /// The lowest ceiling and highest floor a mover of radius `walldist`
    /// standing at `(x, y, z)` can reach, from neighbouring sectors it
    /// overlaps and sprites it would stand on or under
    pub fn get_zrange<T: TileMetrics + ?Sized>(
        &mut self,
        world: &World,
        tiles: &T,
        x: i32,
        y: i32,
        z: i32,
        sector: Option<usize>,
        walldist: i32,
        mask: ClipMask,
    ) -> ZRange {
        #[cfg(feature = "hprof")]
        profile!("get_zrange");
        let Some(start) = sector.filter(|&s| s < world.sectors.len()) else {
            return ZRange::NONE;
        };
        let Some((cz, fz)) = world.zs_at(start, x, y) else {
            return ZRange::NONE;
        };
        let mut range = ZRange {
            ceil_z: cz,
            ceil_hit: ClipHit::Sector(start),
            floor_z: fz,
            floor_hit: ClipHit::Sector(start),
        };

        let i = walldist + MAX_CLIP_DIST + 1;
        let (xmin, ymin, xmax, ymax) = (x - i, y - i, x + i, y + i);

        self.reset(start);
        let mut idx = 0;
        while idx < self.sectors.len() {
            let sec = &world.sectors[self.sectors[idx]];
            idx += 1;
            for w in sec.walls() {
                let wal = &world.walls[w];
                let Some(next) = wal.nextsector else {
                    continue;
                };
                let wal2 = &world.walls[wal.point2];
                let (x1, y1, x2, y2) = (wal.x, wal.y, wal2.x, wal2.y);
                if (x1 < xmin && x2 < xmin)
                    || (x1 > xmax && x2 > xmax)
                    || (y1 < ymin && y2 < ymin)
                    || (y1 > ymax && y2 > ymax)
                {
                    continue;
                }
                let dx = (x2 - x1) as i64;
                let dy = (y2 - y1) as i64;
                if (dx * (y - y1) as i64) < (x - x1) as i64 * dy {
                    continue;
                }
                let mut dax = if dx > 0 {
                    dx * (ymin - y1) as i64
                } else {
                    dx * (ymax - y1) as i64
                };
                let mut day = if dy > 0 {
                    dy * (xmax - x1) as i64
                } else {
                    dy * (xmin - x1) as i64
                };
                if dax >= day {
                    continue;
                }
                if wal.cstat & mask.walls != 0 {
                    continue;
                }
                let nsec = &world.sectors[next];
                if !nsec.ceiling.is_parallax() && z <= nsec.ceiling.z + PORTAL_Z_SLACK {
                    continue;
                }
                if !nsec.floor.is_parallax() && z >= nsec.floor.z - PORTAL_Z_SLACK {
                    continue;
                }
                self.add_sector(next);

                // The neighbour only bounds us if the wall comes within the
                // mover's own radius, not just the sprite slack
                let m = MAX_CLIP_DIST;
                if (x1 < xmin + m && x2 < xmin + m)
                    || (x1 > xmax - m && x2 > xmax - m)
                    || (y1 < ymin + m && y2 < ymin + m)
                    || (y1 > ymax - m && y2 > ymax - m)
                {
                    continue;
                }
                let m = m as i64;
                if dx > 0 {
                    dax += dx * m;
                } else {
                    dax -= dx * m;
                }
                if dy > 0 {
                    day -= dy * m;
                } else {
                    day += dy * m;
                }
                if dax >= day {
                    continue;
                }

                if let Some((ncz, nfz)) = world.zs_at(next, x, y) {
                    if ncz > range.ceil_z {
                        range.ceil_z = ncz;
                        range.ceil_hit = ClipHit::Sector(next);
                    }
                    if nfz < range.floor_z {
                        range.floor_z = nfz;
                        range.floor_hit = ClipHit::Sector(next);
                    }
                }
            }
        }

        for &s in &self.sectors {
            for j in world.sprites_in_sector(s) {
                let Some(spr) = world.sprite(j) else {
                    continue;
                };
                if spr.cstat & mask.sprites == 0 {
                    continue;
                }
                let span = match spr.orientation() {
                    SpriteOrientation::Face | SpriteOrientation::Voxel => {
                        let k = walldist + ((spr.clipdist as i32) << 2) + 1;
                        if (spr.x - x).abs() <= k && (spr.y - y).abs() <= k {
                            Some(spr.z_extent(tiles))
                        } else {
                            None
                        }
                    }
                    SpriteOrientation::Wall => {
                        let ((x1, y1), (x2, y2)) = spr.wall_ends(tiles);
                        if clip_inside_box_line(x, y, x1, y1, x2, y2, walldist + 1) != BoxSide::Outside {
                            Some(spr.z_extent(tiles))
                        } else {
                            None
                        }
                    }
                    SpriteOrientation::Floor => {
                        if spr.has(SpriteStat::OneSided) && (z > spr.z) == !spr.has(SpriteStat::YFlip) {
                            continue;
                        }
                        let quad = grown_floor_quad(spr.floor_corners(tiles), spr.ang as i32, walldist + 4, x, y);
                        if origin_in_quad(&quad) { Some((spr.z, spr.z)) } else { None }
                    }
                };
                // Under the sprite its bottom is a ceiling, over it the top
                // is a floor
                if let Some((top, bottom)) = span {
                    if z > bottom && bottom > range.ceil_z {
                        range.ceil_z = bottom;
                        range.ceil_hit = ClipHit::Sprite(j);
                    }
                    if z < top && top < range.floor_z {
                        range.floor_z = top;
                        range.floor_hit = ClipHit::Sprite(j);
                    }
                }
            }
        }
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_in_square() {
        let q = [(-10, -10), (10, -10), (10, 10), (-10, 10)];
        assert!(origin_in_quad(&q));
        let q = [(5, 5), (15, 5), (15, 15), (5, 15)];
        assert!(!origin_in_quad(&q));
    }
}
