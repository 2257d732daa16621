/// Bits of a sector's ceiling or floor `stat`
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SectorStat {
    /// Draw the plane as a sky mapped by view angle only
    Parallax = 1,
    /// Use `heinum` to slope the plane against the sector's first wall
    Sloped = 1 << 1,
    /// Swap texture u and v
    SwapXY = 1 << 2,
    /// Double the texture density
    DoubleSmooth = 1 << 3,
    XFlip = 1 << 4,
    YFlip = 1 << 5,
    /// Align the texture to the first wall rather than the world grid
    RelativeAlign = 1 << 6,
    Masked = 1 << 7,
    Translucent = 1 << 8,
}

/// Bits of a wall's `cstat`
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WallStat {
    /// Blocks movement, even if the wall is a portal
    Blocking = 1,
    /// The lower part of a portal uses the partner wall's picture
    BottomSwap = 1 << 1,
    /// Anchor the texture to the bottom of the wall
    AlignBottom = 1 << 2,
    XFlip = 1 << 3,
    /// Draw `overpicnum` over the portal opening
    Masked = 1 << 4,
    /// The masked layer is solid from one side only and blocks sight
    OneWay = 1 << 5,
    /// Stops hit-scans
    Hitscan = 1 << 6,
    Translucent = 1 << 7,
    YFlip = 1 << 8,
    TranslucentReverse = 1 << 9,
}

/// Bits of a sprite's `cstat`
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpriteStat {
    Blocking = 1,
    Translucent = 1 << 1,
    XFlip = 1 << 2,
    YFlip = 1 << 3,
    WallAligned = 1 << 4,
    FloorAligned = 1 << 5,
    /// Only drawn and solid from the front
    OneSided = 1 << 6,
    /// The sprite's z is its centre rather than its bottom
    Centered = 1 << 7,
    Hitscan = 1 << 8,
    TranslucentReverse = 1 << 9,
    Invisible = 1 << 15,
}

/// The two orientation bits of a sprite `cstat`
pub const SPRITE_ORIENTATION_MASK: u16 = 48;
