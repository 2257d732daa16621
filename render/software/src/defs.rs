/// Nearest camera depth a wall may reach, in camera units (world << 8)
pub const NEAR_PLANE: i64 = 256;

pub const MAX_SCANS: usize = 4096;
pub const MAX_BUNCHES: usize = 1024;
pub const MAX_SMOST_RECORDS: usize = 4096;
/// Saved column bounds per screen column, across all smost records
pub const SMOST_COLUMNS_PER_X: usize = 64;
pub const MAX_MASKED_WALLS: usize = 512;
pub const MAX_SPRITES_ON_SCREEN: usize = 1024;
/// Traversal queue size, the most sectors any map version holds
pub const MAX_SECTORS: usize = 4096;

/// One wall that survived projection
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WallScan {
    pub sector: usize,
    pub wall: usize,
    /// Camera space ends of the whole wall, before near clipping
    pub rx1: i64,
    pub ry1: i64,
    pub rx2: i64,
    pub ry2: i64,
    /// Screen columns covered, half open
    pub x1: i32,
    pub x2: i32,
    /// The next scan of the same bunch, to the right
    pub next: Option<usize>,
}

/// A run of screen-adjacent scans from one sector's wall loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Bunch {
    pub first: usize,
    pub last: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmostKind {
    /// The whole column is covered
    Solid,
    /// Covered above the saved bound
    Upper,
    /// Covered from the saved bound down
    Lower,
}

/// A silhouette left behind by a drawn wall. Sprites behind the wall are
/// clipped by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmostRecord {
    pub scan: usize,
    pub kind: SmostKind,
    pub x1: i32,
    pub x2: i32,
    /// Index of `x1`'s saved bound in the smost pool
    pub start: usize,
}

/// A masked portal wall put aside to be drawn with the sprites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskedWall {
    pub scan: usize,
    pub x1: i32,
    pub x2: i32,
    /// Saved top bounds start here in the smost pool, the bottoms follow
    pub start: usize,
}

/// A sprite picked up during traversal
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VisSprite {
    pub sprite: usize,
    /// Camera depth of the sprite's position
    pub depth: i64,
    pub status: usize,
    /// Screen columns it may cover, half open
    pub x1: i32,
    pub x2: i32,
}

/// A wall span as it went to the screen, columns inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleWall {
    pub sector: usize,
    pub wall: usize,
    pub x1: i32,
    pub x2: i32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub sectors_visited: usize,
    pub bunches_drawn: usize,
    pub walls_drawn: usize,
    pub sprites_drawn: usize,
}

/// Where the view is from. `horiz` 100 looks level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub ang: i32,
    pub horiz: i32,
    pub sector: Option<usize>,
}

impl Camera {
    pub fn new(x: i32, y: i32, z: i32, ang: i32, sector: usize) -> Self {
        Self {
            x,
            y,
            z,
            ang,
            horiz: 100,
            sector: Some(sector),
        }
    }
}
