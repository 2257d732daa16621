//! Reading and writing of versioned binary map files.
//!
//! A map is a small header followed by three counted tables:
//!
//! ```text,ignore
//!                  <───── 32 bits ──────>
//!                  ┌────────────────────┐
//!       ┌──── 0x00 |      Version       | 0x03
//!       |          | ────────────────── |
//!       |     0x04 |  Start X, Y, Z     | 0x0F
//! Header┤          | ────────────────── |
//!       |     0x10 | Angle  | Sector    | 0x13
//!       └───────── | ────────────────── |
//!       ┌───────── |  u16 sector count  |
//!       |          | ┌────────────────┐ |
//!       |          | | Sector records | |
//!       |          | └────────────────┘ |
//!  Body ┤          |  u16 wall count    |
//!       |          | ┌────────────────┐ |
//!       |          | |  Wall records  | |
//!       |          | └────────────────┘ |
//!       |          |  u16 sprite count  |
//!       |          | ┌────────────────┐ |
//!       |          | | Sprite records | |
//!       |          | └────────────────┘ |
//!       └───────── └────────────────────┘
//! ```
//!
//! Versions 5 and 6 are widened to the version 7 record layout on load, and
//! narrowed again when saving back to them. Version 8 shares the version 7
//! records and only raises the table limits.

mod bytes;
mod error;
pub mod records;

pub use error::MapError;
pub use records::*;

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::bytes::{ByteReader, ByteWriter};

const HEADER_SIZE: usize = 20;

/// The on-disk map versions that can be read and written
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapVersion {
    V5,
    V6,
    V7,
    V8,
}

impl MapVersion {
    pub fn from_i32(v: i32) -> Result<Self, MapError> {
        match v {
            5 => Ok(Self::V5),
            6 => Ok(Self::V6),
            7 => Ok(Self::V7),
            8 => Ok(Self::V8),
            _ => Err(MapError::UnsupportedVersion(v)),
        }
    }

    pub const fn number(self) -> i32 {
        match self {
            Self::V5 => 5,
            Self::V6 => 6,
            Self::V7 => 7,
            Self::V8 => 8,
        }
    }

    pub const fn max_sectors(self) -> usize {
        match self {
            Self::V8 => 4096,
            _ => 1024,
        }
    }

    pub const fn max_walls(self) -> usize {
        match self {
            Self::V8 => 16384,
            _ => 8192,
        }
    }

    pub const fn max_sprites(self) -> usize {
        match self {
            Self::V8 => 16384,
            _ => 4096,
        }
    }

    pub const fn sector_size(self) -> usize {
        match self {
            Self::V5 => 30,
            Self::V6 => 35,
            Self::V7 | Self::V8 => 40,
        }
    }

    pub const fn wall_size(self) -> usize {
        match self {
            Self::V5 => 30,
            _ => 32,
        }
    }

    pub const fn sprite_size(self) -> usize {
        match self {
            Self::V5 => 39,
            Self::V6 => 43,
            Self::V7 | Self::V8 => 44,
        }
    }
}

/// Where the player starts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StartPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub ang: i16,
    pub sector: i16,
}

/// A fully parsed map. Records are always held in the version 7 layout.
#[derive(Debug, Clone)]
pub struct MapFile {
    /// The version the map was read as
    pub version: MapVersion,
    pub start: StartPos,
    pub sectors: Vec<MapSector>,
    pub walls: Vec<MapWall>,
    pub sprites: Vec<MapSprite>,
    hash: u32,
}

impl MapFile {
    /// An empty version 7 map
    pub fn new(start: StartPos) -> Self {
        Self {
            version: MapVersion::V7,
            start,
            sectors: Vec::new(),
            walls: Vec::new(),
            sprites: Vec::new(),
            hash: 0,
        }
    }

    /// Parse a map from bytes. Nothing partial is returned on failure.
    pub fn parse(data: &[u8]) -> Result<Self, MapError> {
        let mut r = ByteReader::new(data);
        let version = MapVersion::from_i32(r.i32()?)?;
        let start = StartPos {
            x: r.i32()?,
            y: r.i32()?,
            z: r.i32()?,
            ang: r.i16()?,
            sector: r.i16()?,
        };

        r.reading("sector count");
        let num = r.u16()? as usize;
        check_count("sectors", num, version.max_sectors())?;
        r.reading("sectors");
        let mut sectors = Vec::with_capacity(num);
        for _ in 0..num {
            sectors.push(MapSector::read(&mut r, version)?);
        }

        r.reading("wall count");
        let num = r.u16()? as usize;
        check_count("walls", num, version.max_walls())?;
        r.reading("walls");
        let mut walls = Vec::with_capacity(num);
        for _ in 0..num {
            walls.push(MapWall::read(&mut r, version)?);
        }

        r.reading("sprite count");
        let num = r.u16()? as usize;
        check_count("sprites", num, version.max_sprites())?;
        r.reading("sprites");
        let mut sprites = Vec::with_capacity(num);
        for _ in 0..num {
            sprites.push(MapSprite::read(&mut r, version)?);
        }

        if r.offset() != data.len() {
            debug!("{} trailing bytes after sprite table", data.len() - r.offset());
        }

        Ok(Self {
            version,
            start,
            sectors,
            walls,
            sprites,
            hash: crc32fast::hash(data),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let data = fs::read(path.as_ref())?;
        let map = Self::parse(&data)?;
        info!(
            "Loaded v{} map {:?}: {} sectors, {} walls, {} sprites",
            map.version.number(),
            path.as_ref(),
            map.sectors.len(),
            map.walls.len(),
            map.sprites.len()
        );
        Ok(map)
    }

    /// Serialise as `version`, refusing anything that version can't hold
    pub fn to_bytes(&self, version: MapVersion) -> Result<Vec<u8>, MapError> {
        check_count("sectors", self.sectors.len(), version.max_sectors())?;
        check_count("walls", self.walls.len(), version.max_walls())?;
        check_count("sprites", self.sprites.len(), version.max_sprites())?;
        for (i, s) in self.sectors.iter().enumerate() {
            s.check_fits(i, version)?;
        }

        let mut w = ByteWriter::with_capacity(
            HEADER_SIZE
                + 6
                + self.sectors.len() * version.sector_size()
                + self.walls.len() * version.wall_size()
                + self.sprites.len() * version.sprite_size(),
        );
        w.i32(version.number());
        w.i32(self.start.x);
        w.i32(self.start.y);
        w.i32(self.start.z);
        w.i16(self.start.ang);
        w.i16(self.start.sector);

        w.u16(self.sectors.len() as u16);
        for s in &self.sectors {
            s.write(&mut w, version);
        }
        w.u16(self.walls.len() as u16);
        for wall in &self.walls {
            wall.write(&mut w, version);
        }
        w.u16(self.sprites.len() as u16);
        for s in &self.sprites {
            s.write(&mut w, version);
        }
        Ok(w.buf)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, version: MapVersion) -> Result<(), MapError> {
        let data = self.to_bytes(version)?;
        fs::write(path.as_ref(), &data)?;
        info!("Saved v{} map to {:?}", version.number(), path.as_ref());
        Ok(())
    }

    /// crc32 of the bytes this map was parsed from, 0 for maps built in code
    pub fn hash(&self) -> u32 {
        self.hash
    }
}

fn check_count(what: &'static str, count: usize, max: usize) -> Result<(), MapError> {
    if count > max {
        return Err(MapError::TooMany { what, count, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One square room, walls wound clockwise in screen coordinates, with a
    /// sloped floor and a single sprite in the middle.
    fn square_room() -> MapFile {
        let mut map = MapFile::new(StartPos {
            x: 512,
            y: 512,
            z: -256,
            ang: 512,
            sector: 0,
        });
        map.sectors.push(MapSector {
            wallptr: 0,
            wallnum: 4,
            ceiling_z: -1024 << 4,
            floor_z: 0,
            floor_stat: 2,
            floor_heinum: 256,
            ceiling_pal: 3,
            visibility: 8,
            ..MapSector::default()
        });
        let pts = [(0, 0), (1024, 0), (1024, 1024), (0, 1024)];
        for (i, (x, y)) in pts.iter().enumerate() {
            map.walls.push(MapWall {
                x: *x,
                y: *y,
                point2: ((i + 1) % 4) as i16,
                nextwall: -1,
                nextsector: -1,
                cstat: 1,
                xrepeat: 8,
                yrepeat: 8,
                pal: 1,
                ..MapWall::default()
            });
        }
        map.sprites.push(MapSprite {
            x: 512,
            y: 512,
            z: -512,
            cstat: 1 | 128,
            picnum: 7,
            clipdist: 40,
            xrepeat: 64,
            yrepeat: 64,
            xoffset: 3,
            yoffset: -2,
            sectnum: 0,
            statnum: 0,
            ..MapSprite::default()
        });
        map
    }

    #[test]
    fn record_sizes_match_version() {
        let map = square_room();
        for version in [MapVersion::V6, MapVersion::V7, MapVersion::V8] {
            let bytes = map.to_bytes(version).unwrap();
            assert_eq!(
                bytes.len(),
                HEADER_SIZE + 6 + version.sector_size() + 4 * version.wall_size() + version.sprite_size()
            );
        }
    }

    #[test]
    fn same_version_round_trip_is_byte_identical() {
        let map = square_room();
        for version in [MapVersion::V6, MapVersion::V7, MapVersion::V8] {
            let bytes = map.to_bytes(version).unwrap();
            let reread = MapFile::parse(&bytes).unwrap();
            assert_eq!(reread.version, version);
            assert_eq!(reread.to_bytes(version).unwrap(), bytes);
            assert_eq!(reread.hash(), crc32fast::hash(&bytes));
        }
    }

    #[test]
    fn v6_upgrade_keeps_slopes_and_offsets() {
        let map = square_room();
        let bytes = map.to_bytes(MapVersion::V6).unwrap();
        let up = MapFile::parse(&bytes).unwrap();
        assert_eq!(up.sectors[0].floor_heinum, 256);
        assert_eq!(up.sectors[0].ceiling_pal, 3);
        assert_eq!(up.sprites[0].xoffset, 3);
        assert_eq!(up.sprites[0].clipdist, 40);
        assert_eq!(up.walls, map.walls);
    }

    #[test]
    fn v5_drops_narrow_fields_and_defaults_clipdist() {
        let mut map = square_room();
        map.sectors[0].floor_stat = 0;
        map.sectors[0].floor_heinum = 0;
        let bytes = map.to_bytes(MapVersion::V5).unwrap();
        assert_eq!(
            bytes.len(),
            HEADER_SIZE + 6 + 30 + 4 * 30 + 39
        );
        let up = MapFile::parse(&bytes).unwrap();
        assert_eq!(up.version, MapVersion::V5);
        assert_eq!(up.sprites[0].clipdist, DEFAULT_CLIPDIST);
        assert_eq!(up.sprites[0].xoffset, 0);
        assert_eq!(up.sprites[0].pal, 0);
        assert_eq!(up.walls[0].pal, 0);
        assert_eq!(up.walls[0].cstat, 1);
        assert_eq!(up.sectors[0].ceiling_pal, 0);
        assert_eq!(up.sectors[0].ceiling_z, map.sectors[0].ceiling_z);
        assert_eq!(up.to_bytes(MapVersion::V5).unwrap(), bytes);
    }

    #[test]
    fn v5_save_rejects_slopes() {
        let map = square_room();
        match map.to_bytes(MapVersion::V5) {
            Err(MapError::SlopeOutOfRange { sector, heinum }) => {
                assert_eq!(sector, 0);
                assert_eq!(heinum, 256);
            }
            other => panic!("expected slope rejection, got {:?}", other),
        }
    }

    #[test]
    fn v6_save_rejects_steep_slopes() {
        let mut map = square_room();
        map.sectors[0].ceiling_heinum = 128 << 5;
        assert!(matches!(
            map.to_bytes(MapVersion::V6),
            Err(MapError::SlopeOutOfRange { .. })
        ));
        map.sectors[0].ceiling_heinum = 127 << 5;
        assert!(map.to_bytes(MapVersion::V6).is_ok());
    }

    #[test]
    fn save_rejects_counts_over_limit() {
        let mut map = square_room();
        let sprite = map.sprites[0];
        map.sprites.resize(MapVersion::V7.max_sprites() + 1, sprite);
        assert!(matches!(
            map.to_bytes(MapVersion::V7),
            Err(MapError::TooMany { what: "sprites", .. })
        ));
        assert!(map.to_bytes(MapVersion::V8).is_ok());
    }

    #[test]
    fn bad_version_and_truncation() {
        let map = square_room();
        let mut bytes = map.to_bytes(MapVersion::V7).unwrap();
        bytes[0] = 9;
        assert!(matches!(
            MapFile::parse(&bytes),
            Err(MapError::UnsupportedVersion(9))
        ));

        let bytes = map.to_bytes(MapVersion::V7).unwrap();
        let cut = &bytes[..bytes.len() - 10];
        match MapFile::parse(cut) {
            Err(MapError::Truncated { what, .. }) => assert_eq!(what, "sprites"),
            other => panic!("expected truncation, got {:?}", other),
        }
    }
}
