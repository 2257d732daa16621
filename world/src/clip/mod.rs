//! Movement clipping and spatial queries against the world.
//!
//! Every query walks sectors breadth first out from a start sector, the same
//! way the renderer walks portals. The work lists and the obstacle list live
//! in a `ClipContext` that is sized once and reused call to call.

mod hitscan;
mod movement;
mod sight;
mod zrange;

use log::trace;

use crate::level::flags::{SpriteStat, WallStat};

pub use movement::{clip_inside_box, clip_inside_box_line};

/// Slack added around a move so sprites standing on sector lines are found
pub const MAX_CLIP_DIST: i32 = 1024;
/// Obstacle lines gathered for one move
pub const MAX_CLIP_LINES: usize = 1024;
/// Sectors visited by one query
pub const MAX_CLIP_SECTORS: usize = 512;
/// Slides tried by `clip_move` before giving up on the rest of the move
pub const CLIP_RETRIES: usize = 3;
/// Pushes tried by `push_move` before declaring the mover stuck
pub const PUSH_RETRIES: i32 = 32;

/// What a query ran into
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ClipHit {
    #[default]
    None,
    Sector(usize),
    Wall(usize),
    Sprite(usize),
}

/// Which flag bits make walls and sprites solid for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipMask {
    pub walls: u16,
    pub sprites: u16,
}

impl ClipMask {
    /// What blocks movement
    pub const MOVE: ClipMask = ClipMask {
        walls: WallStat::Blocking as u16,
        sprites: SpriteStat::Blocking as u16,
    };
    /// What stops a hit-scan
    pub const HITSCAN: ClipMask = ClipMask {
        walls: WallStat::Hitscan as u16,
        sprites: SpriteStat::Hitscan as u16,
    };
}

impl Default for ClipMask {
    fn default() -> Self {
        Self::MOVE
    }
}

/// A point in the world with the sector it is filed under
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub sector: Option<usize>,
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32, sector: usize) -> Self {
        Self {
            x,
            y,
            z,
            sector: Some(sector),
        }
    }
}

/// How much room a mover needs around it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clearance {
    /// Horizontal radius
    pub wall: i32,
    /// Room needed above the position
    pub ceiling: i32,
    /// Room needed below the position
    pub floor: i32,
}

impl Default for Clearance {
    fn default() -> Self {
        Self {
            wall: 128,
            ceiling: 4 << 8,
            floor: 4 << 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushResult {
    /// Nothing was overlapping
    Free,
    /// Moved out of one or more walls
    Pushed,
    /// Ran out of pushes while still inside something
    Stuck,
    /// The start sector is not valid
    NoSector,
}

/// Which side of a wall a clearance box overlaps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxSide {
    Outside,
    Front,
    Back,
}

/// The closest thing a hit-scan ran into
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HitInfo {
    pub sector: Option<usize>,
    pub wall: Option<usize>,
    pub sprite: Option<usize>,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// The room between the lowest ceiling and highest floor around a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZRange {
    pub ceil_z: i32,
    pub ceil_hit: ClipHit,
    pub floor_z: i32,
    pub floor_hit: ClipHit,
}

impl ZRange {
    /// The range reported for an invalid sector
    pub const NONE: ZRange = ZRange {
        ceil_z: i32::MIN,
        ceil_hit: ClipHit::None,
        floor_z: i32::MAX,
        floor_hit: ClipHit::None,
    };
}

/// An obstacle edge. Movers coming from the right of `(x1, y1) -> (x2, y2)`
/// are stopped by it.
#[derive(Debug, Clone, Copy)]
struct ClipLine {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    hit: ClipHit,
}

/// Scratch for the clip queries
pub struct ClipContext {
    lines: Vec<ClipLine>,
    sectors: Vec<usize>,
    hits: [usize; CLIP_RETRIES + 1],
}

impl Default for ClipContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipContext {
    pub fn new() -> Self {
        Self {
            lines: Vec::with_capacity(MAX_CLIP_LINES),
            sectors: Vec::with_capacity(MAX_CLIP_SECTORS),
            hits: [0; CLIP_RETRIES + 1],
        }
    }

    fn reset(&mut self, start: usize) {
        self.lines.clear();
        self.sectors.clear();
        self.sectors.push(start);
    }

    /// Queue a sector for the walk unless it is already on the list
    fn add_sector(&mut self, s: usize) {
        if self.sectors.contains(&s) {
            return;
        }
        if self.sectors.len() >= MAX_CLIP_SECTORS {
            trace!("clip sector list full, dropping {}", s);
            return;
        }
        self.sectors.push(s);
    }

    fn add_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, hit: ClipHit) {
        if self.lines.len() >= MAX_CLIP_LINES {
            trace!("clip line list full, dropping {:?}", hit);
            return;
        }
        self.lines.push(ClipLine {
            x1,
            y1,
            x2,
            y2,
            hit,
        });
    }
}
