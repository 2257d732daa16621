use super::ClipContext;
use crate::level::flags::WallStat;
use crate::World;

impl ClipContext {
    /// Whether the segment between two points stays inside open space.
    /// Solid and one-way walls block, as does crossing a portal above or
    /// below the open z range on either side of it.
    pub fn can_see(
        &mut self,
        world: &World,
        x1: i32,
        y1: i32,
        z1: i32,
        s1: Option<usize>,
        x2: i32,
        y2: i32,
        z2: i32,
        s2: Option<usize>,
    ) -> bool {
        let n = world.sectors.len();
        let (Some(s1), Some(s2)) = (s1.filter(|&s| s < n), s2.filter(|&s| s < n)) else {
            return false;
        };
        if x1 == x2 && y1 == y2 {
            return s1 == s2;
        }

        let x21 = (x2 - x1) as i64;
        let y21 = (y2 - y1) as i64;
        let z21 = (z2 - z1) as i64;

        self.reset(s1);
        let mut idx = 0;
        while idx < self.sectors.len() {
            let s = self.sectors[idx];
            idx += 1;
            for w in world.sectors[s].walls() {
                let wal = &world.walls[w];
                let wal2 = &world.walls[wal.point2];
                let x31 = (wal.x - x1) as i64;
                let y31 = (wal.y - y1) as i64;
                let x34 = (wal.x - wal2.x) as i64;
                let y34 = (wal.y - wal2.y) as i64;

                // Only walls crossed from their front side count
                let bot = y21 * x34 - x21 * y34;
                if bot <= 0 {
                    continue;
                }
                let t = y21 * x31 - x21 * y31;
                if t < 0 || t >= bot {
                    continue;
                }
                let t = y31 * x34 - x31 * y34;
                if t < 0 || t >= bot {
                    continue;
                }

                let Some(next) = wal.nextsector else {
                    return false;
                };
                if wal.has(WallStat::OneWay) {
                    return false;
                }

                let x = x1 + (x21 * t / bot) as i32;
                let y = y1 + (y21 * t / bot) as i32;
                let z = z1 + (z21 * t / bot) as i32;
                for side in [s, next] {
                    match world.zs_at(side, x, y) {
                        Some((cz, fz)) if z > cz && z < fz => {}
                        _ => return false,
                    }
                }
                self.add_sector(next);
            }
        }
        self.sectors.contains(&s2)
    }
}
