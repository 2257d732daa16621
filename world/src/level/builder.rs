//! Build small maps in code: rooms from point lists, portals joined by
//! matching wall endpoints, sprites dropped in by position.

use log::debug;
use mapfile::{MapFile, MapSector, MapSprite, MapWall, StartPos};

use super::map_data::World;
use crate::WorldError;

const DEFAULT_REPEAT: u8 = 8;

pub struct WorldBuilder {
    map: MapFile,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            map: MapFile::new(StartPos::default()),
        }
    }

    pub fn set_start(&mut self, start: StartPos) {
        self.map.start = start;
    }

    /// Add a sector whose loop runs through `points` with the interior on the
    /// right (clockwise with y pointing down). Returns the sector index.
    pub fn sector(&mut self, points: &[(i32, i32)], ceiling_z: i32, floor_z: i32) -> usize {
        let first = self.map.walls.len();
        for (i, &(x, y)) in points.iter().enumerate() {
            let next = first + (i + 1) % points.len();
            self.map.walls.push(MapWall {
                x,
                y,
                point2: next as i16,
                nextwall: -1,
                nextsector: -1,
                xrepeat: DEFAULT_REPEAT,
                yrepeat: DEFAULT_REPEAT,
                ..MapWall::default()
            });
        }
        self.map.sectors.push(MapSector {
            wallptr: first as i16,
            wallnum: points.len() as i16,
            ceiling_z,
            floor_z,
            ..MapSector::default()
        });
        self.map.sectors.len() - 1
    }

    pub fn sector_mut(&mut self, s: usize) -> &mut MapSector {
        &mut self.map.sectors[s]
    }

    pub fn wall_mut(&mut self, w: usize) -> &mut MapWall {
        &mut self.map.walls[w]
    }

    /// First wall index of sector `s`
    pub fn first_wall(&self, s: usize) -> usize {
        self.map.sectors[s].wallptr as usize
    }

    pub fn sprite(&mut self, x: i32, y: i32, z: i32, sector: usize) -> usize {
        self.map.sprites.push(MapSprite {
            x,
            y,
            z,
            sectnum: sector as i16,
            clipdist: 32,
            xrepeat: 64,
            yrepeat: 64,
            ..MapSprite::default()
        });
        self.map.sprites.len() - 1
    }

    pub fn sprite_mut(&mut self, i: usize) -> &mut MapSprite {
        &mut self.map.sprites[i]
    }

    /// Join every pair of walls that run between the same two points in
    /// opposite directions
    pub fn link_portals(&mut self) {
        let sector_of = |walls: usize, sectors: &[MapSector]| {
            sectors
                .iter()
                .position(|s| {
                    let start = s.wallptr as usize;
                    (start..start + s.wallnum as usize).contains(&walls)
                })
                .map_or(-1, |s| s as i16)
        };
        let n = self.map.walls.len();
        let mut links = 0;
        for a in 0..n {
            let wa = self.map.walls[a];
            let a2 = self.map.walls[wa.point2 as usize];
            for b in (a + 1)..n {
                let wb = self.map.walls[b];
                let b2 = self.map.walls[wb.point2 as usize];
                if wa.x == b2.x && wa.y == b2.y && a2.x == wb.x && a2.y == wb.y {
                    self.map.walls[a].nextwall = b as i16;
                    self.map.walls[a].nextsector = sector_of(b, &self.map.sectors);
                    self.map.walls[b].nextwall = a as i16;
                    self.map.walls[b].nextsector = sector_of(a, &self.map.sectors);
                    links += 1;
                }
            }
        }
        debug!("linked {} portals", links);
    }

    pub fn into_map(self) -> MapFile {
        self.map
    }

    pub fn build(self) -> Result<World, WorldError> {
        let world = World::from_map(&self.map)?;
        world.validate()?;
        Ok(world)
    }
}
