//! The world geometry store and the spatial queries run against it.
//!
//! A `World` is a flat table of sectors, each owning a contiguous run of
//! walls, plus a fixed-size sprite arena. Everything that moves or looks
//! around in the world (the renderer, movement, hit-scans) reads the same
//! tables through the same `math` functions.

#![allow(clippy::too_many_arguments)]

pub mod clip;
mod level;
#[cfg(test)]
mod tests;

use std::error::Error;
use std::fmt;

pub use clip::{
    BoxSide, ClipContext, ClipHit, ClipMask, Clearance, HitInfo, Position, PushResult, ZRange,
    MAX_CLIP_DIST,
};
pub use level::builder::WorldBuilder;
pub use level::flags::{SectorStat, SpriteStat, WallStat};
pub use level::map_data::{Limits, World};
pub use level::map_defs::{Plane, Sector, Sprite, SpriteOrientation, Wall};
pub use level::sprites::{MAX_STATUS, SpriteList};
pub use log;
pub use mapfile::{MapError, MapFile, MapVersion, StartPos};

#[derive(Debug)]
pub enum WorldError {
    /// A table is larger than the world was sized for
    Capacity {
        what: &'static str,
        count: usize,
        max: usize,
    },
    /// Wall loop or portal links are broken at `wall`
    Corrupt { wall: usize, reason: &'static str },
    /// The sprite chains disagree with a sprite's own sector or status
    SpriteLinks { sprite: usize, reason: &'static str },
    /// An index out of range was passed to a mutation
    InvalidIndex { what: &'static str, index: usize },
    Map(MapError),
}

impl Error for WorldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorldError::Map(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::Capacity { what, count, max } => {
                write!(f, "world capacity exceeded: {} {} (max {})", count, what, max)
            }
            WorldError::Corrupt { wall, reason } => write!(f, "wall {}: {}", wall, reason),
            WorldError::SpriteLinks { sprite, reason } => write!(f, "sprite {}: {}", sprite, reason),
            WorldError::InvalidIndex { what, index } => write!(f, "invalid {} index {}", what, index),
            WorldError::Map(e) => write!(f, "{}", e),
        }
    }
}

impl From<MapError> for WorldError {
    fn from(e: MapError) -> Self {
        WorldError::Map(e)
    }
}

/// Sizes of the pictures used by sprites, needed to work out how much space a
/// sprite takes up.
pub trait TileMetrics {
    /// Width and height in texels, `(0, 0)` when the tile doesn't exist
    fn tile_size(&self, picnum: i16) -> (i32, i32);

    /// Animation offsets of the picture, added to a sprite's own offsets
    fn tile_offset(&self, _picnum: i16) -> (i32, i32) {
        (0, 0)
    }
}

/// A plain table of tile sizes for when no pixel data is needed
#[derive(Debug, Default, Clone)]
pub struct TileTable {
    sizes: Vec<(i32, i32)>,
    offsets: Vec<(i32, i32)>,
}

impl TileTable {
    pub fn set_size(&mut self, picnum: i16, width: i32, height: i32) {
        let idx = picnum.max(0) as usize;
        if self.sizes.len() <= idx {
            self.sizes.resize(idx + 1, (0, 0));
            self.offsets.resize(idx + 1, (0, 0));
        }
        self.sizes[idx] = (width, height);
    }

    pub fn set_offset(&mut self, picnum: i16, x: i32, y: i32) {
        let idx = picnum.max(0) as usize;
        if self.offsets.len() <= idx {
            self.sizes.resize(idx + 1, (0, 0));
            self.offsets.resize(idx + 1, (0, 0));
        }
        self.offsets[idx] = (x, y);
    }
}

impl TileMetrics for TileTable {
    fn tile_size(&self, picnum: i16) -> (i32, i32) {
        if picnum < 0 {
            return (0, 0);
        }
        self.sizes.get(picnum as usize).copied().unwrap_or((0, 0))
    }

    fn tile_offset(&self, picnum: i16) -> (i32, i32) {
        if picnum < 0 {
            return (0, 0);
        }
        self.offsets.get(picnum as usize).copied().unwrap_or((0, 0))
    }
}
