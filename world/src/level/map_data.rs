use log::{debug, info, warn};
use mapfile::{MapFile, MapVersion, StartPos};
use math::{heinum_through, saturate, slope_z};

use super::flags::SectorStat;
use super::map_defs::{Plane, Sector, Sprite, Wall};
use super::sprites::{ChainIter, SpriteList};
use crate::WorldError;

const LOG_TAG: &str = "World";

/// Table limits a world is created with. They never grow afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub sectors: usize,
    pub walls: usize,
    pub sprites: usize,
}

impl From<MapVersion> for Limits {
    fn from(v: MapVersion) -> Self {
        Self {
            sectors: v.max_sectors(),
            walls: v.max_walls(),
            sprites: v.max_sprites(),
        }
    }
}

/// All geometry of a loaded map
pub struct World {
    pub sectors: Vec<Sector>,
    pub walls: Vec<Wall>,
    sprites: SpriteList,
    pub start: StartPos,
    version: MapVersion,
    limits: Limits,
}

impl World {
    /// Convert a parsed map, sizing the tables by the map's version
    pub fn from_map(map: &MapFile) -> Result<Self, WorldError> {
        let limits = Limits::from(map.version);
        check_capacity("sectors", map.sectors.len(), limits.sectors)?;
        check_capacity("walls", map.walls.len(), limits.walls)?;
        check_capacity("sprites", map.sprites.len(), limits.sprites)?;

        let mut sectors = Vec::with_capacity(limits.sectors);
        sectors.extend(map.sectors.iter().map(Sector::from_map));
        let mut walls = Vec::with_capacity(limits.walls);
        walls.extend(map.walls.iter().map(Wall::from_map));

        let mut world = Self {
            sprites: SpriteList::new(limits.sprites, sectors.len()),
            sectors,
            walls,
            start: map.start,
            version: map.version,
            limits,
        };
        world.check_ranges()?;

        for (index, m) in map.sprites.iter().enumerate() {
            if m.sectnum < 0 || m.sectnum as usize >= world.sectors.len() {
                return Err(WorldError::SpriteLinks {
                    sprite: index,
                    reason: "sector out of range",
                });
            }
            if m.statnum < 0 {
                return Err(WorldError::SpriteLinks {
                    sprite: index,
                    reason: "negative status",
                });
            }
            let mut sprite = Sprite::from_map(m);
            let i = world.sprites.insert(sprite.sector, sprite.status)?;
            if let Some(slot) = world.sprites.get_mut(i) {
                sprite.sector = slot.sector;
                sprite.status = slot.status;
                *slot = sprite;
            }
        }

        info!(
            target: LOG_TAG,
            "{} sectors, {} walls, {} sprites",
            world.sectors.len(),
            world.walls.len(),
            world.sprites.len()
        );
        Ok(world)
    }

    /// Convert back to file records, live sprites in slot order
    pub fn to_map(&self) -> MapFile {
        let mut map = MapFile::new(self.start);
        map.version = self.version;
        map.sectors = self.sectors.iter().map(Sector::to_map).collect();
        map.walls = self.walls.iter().map(Wall::to_map).collect();
        map.sprites = self.sprites.iter().map(|(_, s)| s.to_map()).collect();
        map
    }

    #[inline]
    pub fn limits(&self) -> Limits {
        self.limits
    }

    #[inline]
    pub fn version(&self) -> MapVersion {
        self.version
    }

    /// Indices must point inside the tables before anything walks them
    fn check_ranges(&self) -> Result<(), WorldError> {
        for (s, sec) in self.sectors.iter().enumerate() {
            if sec.wallnum < 3 || sec.wallptr + sec.wallnum > self.walls.len() {
                return Err(WorldError::Corrupt {
                    wall: sec.wallptr,
                    reason: "sector wall run is out of range",
                });
            }
            if s > 0 && sec.wallptr < self.sectors[s - 1].wallptr {
                return Err(WorldError::Corrupt {
                    wall: sec.wallptr,
                    reason: "sector wall runs are out of order",
                });
            }
        }
        for (i, w) in self.walls.iter().enumerate() {
            if w.point2 >= self.walls.len()
                || w.nextwall.is_some_and(|n| n >= self.walls.len())
                || w.nextsector.is_some_and(|n| n >= self.sectors.len())
            {
                return Err(WorldError::Corrupt {
                    wall: i,
                    reason: "wall index out of range",
                });
            }
        }
        Ok(())
    }

    /// Check loop closure, portal symmetry and the sprite chains
    pub fn validate(&self) -> Result<(), WorldError> {
        self.check_ranges()?;
        for sec in &self.sectors {
            let start = sec.wallptr;
            let mut w = start;
            for _ in 0..sec.wallnum {
                if !sec.walls().contains(&w) {
                    return Err(WorldError::Corrupt {
                        wall: w,
                        reason: "wall loop leaves its sector",
                    });
                }
                w = self.walls[w].point2;
            }
            if w != start {
                return Err(WorldError::Corrupt {
                    wall: start,
                    reason: "wall loop does not close",
                });
            }
        }

        for (i, wall) in self.walls.iter().enumerate() {
            match (wall.nextwall, wall.nextsector) {
                (None, None) => {}
                (Some(n), Some(ns)) => {
                    let partner = &self.walls[n];
                    if partner.nextwall != Some(i) {
                        return Err(WorldError::Corrupt {
                            wall: i,
                            reason: "portal partner does not point back",
                        });
                    }
                    if !self.sectors[ns].walls().contains(&n) {
                        return Err(WorldError::Corrupt {
                            wall: i,
                            reason: "portal partner is not in the next sector",
                        });
                    }
                    if partner.nextsector != self.sector_of_wall(i) {
                        return Err(WorldError::Corrupt {
                            wall: i,
                            reason: "portal partner names the wrong sector",
                        });
                    }
                }
                _ => {
                    return Err(WorldError::Corrupt {
                        wall: i,
                        reason: "half a portal link",
                    });
                }
            }
        }

        self.sprites.validate()
    }

    /// The wall whose `point2` is `w`
    pub fn last_wall(&self, w: usize) -> Option<usize> {
        if w > 0 && self.walls.get(w - 1).is_some_and(|p| p.point2 == w) {
            return Some(w - 1);
        }
        let sector = self.sector_of_wall(w)?;
        self.sectors[sector]
            .walls()
            .find(|&i| self.walls[i].point2 == w)
    }

    /// Binary search of the sector wall runs
    pub fn sector_of_wall(&self, w: usize) -> Option<usize> {
        if w >= self.walls.len() {
            return None;
        }
        let idx = self.sectors.partition_point(|s| s.wallptr <= w);
        let s = idx.checked_sub(1)?;
        if self.sectors[s].walls().contains(&w) {
            Some(s)
        } else {
            None
        }
    }

    /// The first wall of a sector as a slope reference `(x, y, dx, dy)`
    fn slope_ref(&self, sector: &Sector) -> (i32, i32, i32, i32) {
        let w = &self.walls[sector.wallptr];
        let w2 = &self.walls[w.point2];
        (w.x, w.y, w2.x - w.x, w2.y - w.y)
    }

    fn plane_z(&self, sector: &Sector, plane: &Plane, x: i32, y: i32) -> i32 {
        if !plane.has(SectorStat::Sloped) {
            return plane.z;
        }
        let (wx, wy, dx, dy) = self.slope_ref(sector);
        slope_z(plane.z, plane.heinum as i32, dx, dy, x - wx, y - wy)
    }

    pub fn ceiling_z_at(&self, sector: usize, x: i32, y: i32) -> Option<i32> {
        let sec = self.sectors.get(sector)?;
        Some(self.plane_z(sec, &sec.ceiling, x, y))
    }

    pub fn floor_z_at(&self, sector: usize, x: i32, y: i32) -> Option<i32> {
        let sec = self.sectors.get(sector)?;
        Some(self.plane_z(sec, &sec.floor, x, y))
    }

    /// Ceiling and floor z at a point
    pub fn zs_at(&self, sector: usize, x: i32, y: i32) -> Option<(i32, i32)> {
        let sec = self.sectors.get(sector)?;
        Some((
            self.plane_z(sec, &sec.ceiling, x, y),
            self.plane_z(sec, &sec.floor, x, y),
        ))
    }

    fn align_slope(&mut self, sector: usize, ceiling: bool, x: i32, y: i32, z: i32) -> bool {
        let Some(sec) = self.sectors.get(sector) else {
            return false;
        };
        let (wx, wy, dx, dy) = self.slope_ref(sec);
        let base = if ceiling { sec.ceiling.z } else { sec.floor.z };
        let Some(heinum) = heinum_through(base, z, dx, dy, x - wx, y - wy) else {
            return false;
        };
        let heinum = heinum.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        let sec = &mut self.sectors[sector];
        let plane = if ceiling {
            &mut sec.ceiling
        } else {
            &mut sec.floor
        };
        plane.heinum = heinum;
        if heinum == 0 {
            plane.stat &= !(SectorStat::Sloped as u16);
        } else {
            plane.stat |= SectorStat::Sloped as u16;
        }
        debug!(target: LOG_TAG, "sector {} slope set to {}", sector, heinum);
        true
    }

    /// Tilt the ceiling about the first wall so it passes through `(x, y, z)`.
    /// False when the point is on the first wall's line.
    pub fn align_ceiling_slope(&mut self, sector: usize, x: i32, y: i32, z: i32) -> bool {
        self.align_slope(sector, true, x, y, z)
    }

    pub fn align_floor_slope(&mut self, sector: usize, x: i32, y: i32, z: i32) -> bool {
        self.align_slope(sector, false, x, y, z)
    }

    /// Even-odd test of `(x, y)` against the sector's wall loop. Edges are
    /// half open: a point on a wall counts for the sector at lower x, or
    /// lower y for a horizontal wall.
    pub fn inside(&self, x: i32, y: i32, sector: usize) -> Option<bool> {
        let sec = self.sectors.get(sector)?;
        let mut cnt: i64 = 0;
        for w in sec.walls() {
            let wall = &self.walls[w];
            let next = &self.walls[wall.point2];
            let y1 = (wall.y - y) as i64;
            let y2 = (next.y - y) as i64;
            if (y1 ^ y2) < 0 {
                let x1 = (wall.x - x) as i64;
                let x2 = (next.x - x) as i64;
                if (x1 ^ x2) >= 0 {
                    cnt ^= x1;
                } else {
                    cnt ^= (x1 * y2 - x2 * y1) ^ y2;
                }
            }
        }
        Some(cnt < 0)
    }

    /// Find the sector holding `(x, y)`: the hint, its neighbours, then
    /// everything
    pub fn update_sector(&self, x: i32, y: i32, hint: Option<usize>) -> Option<usize> {
        if let Some(h) = hint.filter(|&h| h < self.sectors.len()) {
            if self.inside(x, y, h) == Some(true) {
                return Some(h);
            }
            for w in self.sectors[h].walls() {
                if let Some(n) = self.walls[w].nextsector {
                    if self.inside(x, y, n) == Some(true) {
                        return Some(n);
                    }
                }
            }
        }
        (0..self.sectors.len())
            .rev()
            .find(|&s| self.inside(x, y, s) == Some(true))
    }

    // Sprite arena passthroughs

    pub fn sprite(&self, i: usize) -> Option<&Sprite> {
        self.sprites.get(i)
    }

    pub fn sprite_mut(&mut self, i: usize) -> Option<&mut Sprite> {
        self.sprites.get_mut(i)
    }

    pub fn sprites(&self) -> &SpriteList {
        &self.sprites
    }

    pub fn insert_sprite(&mut self, sector: usize, status: usize) -> Result<usize, WorldError> {
        self.sprites.insert(sector, status)
    }

    pub fn delete_sprite(&mut self, i: usize) -> Result<(), WorldError> {
        self.sprites.delete(i)
    }

    pub fn change_sprite_sector(&mut self, i: usize, sector: usize) -> Result<(), WorldError> {
        self.sprites.change_sector(i, sector)
    }

    pub fn change_sprite_status(&mut self, i: usize, status: usize) -> Result<(), WorldError> {
        self.sprites.change_status(i, status)
    }

    pub fn sprites_in_sector(&self, sector: usize) -> ChainIter<'_> {
        self.sprites.in_sector(sector)
    }

    pub fn sprites_in_status(&self, status: usize) -> ChainIter<'_> {
        self.sprites.in_status(status)
    }

    /// Move a sprite and refile it under whatever sector it now stands in.
    /// The sprite stays where it was filed if the point is outside the map.
    pub fn set_sprite_pos(&mut self, i: usize, x: i32, y: i32, z: i32) -> Result<(), WorldError> {
        let hint = self.sprites.get(i).map(|s| s.sector).ok_or(WorldError::InvalidIndex {
            what: "sprite",
            index: i,
        })?;
        let found = self.update_sector(x, y, Some(hint));
        if let Some(s) = self.sprites.get_mut(i) {
            s.x = x;
            s.y = y;
            s.z = z;
        }
        match found {
            Some(sector) => self.sprites.change_sector(i, sector),
            None => {
                warn!(target: LOG_TAG, "sprite {} moved outside every sector", i);
                Ok(())
            }
        }
    }

    /// Distance in z from a point to a sector's nearest surface, used to
    /// pick between overlapping sectors. Negative when between the planes.
    pub(crate) fn z_gap(&self, sector: usize, x: i32, y: i32, z: i32) -> i32 {
        match self.zs_at(sector, x, y) {
            Some((cz, fz)) => {
                if z < cz {
                    saturate(cz as i64 - z as i64)
                } else if z > fz {
                    saturate(z as i64 - fz as i64)
                } else {
                    -1
                }
            }
            None => i32::MAX,
        }
    }
}

fn check_capacity(what: &'static str, count: usize, max: usize) -> Result<(), WorldError> {
    if count > max {
        return Err(WorldError::Capacity { what, count, max });
    }
    Ok(())
}
