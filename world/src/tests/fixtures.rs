use crate::{SpriteStat, TileTable, World, WorldBuilder};

pub const CEILING: i32 = -16384;

/// 1024 square room with one blocking sprite in the middle
pub fn square_room() -> World {
    let mut b = WorldBuilder::new();
    b.sector(&[(0, 0), (1024, 0), (1024, 1024), (0, 1024)], -1024, 0);
    let s = b.sprite(512, 512, -512, 0);
    b.sprite_mut(s).cstat = SpriteStat::Blocking as u16;
    b.build().unwrap()
}

/// A tall room whose right hand wall is at x = 100
pub fn clip_room() -> World {
    let mut b = WorldBuilder::new();
    b.sector(
        &[(-1024, -1024), (100, -1024), (100, 1024), (-1024, 1024)],
        -8192,
        8192,
    );
    b.build().unwrap()
}

/// Two rooms side by side. The right one has its floor `step` higher.
pub fn two_rooms(step: i32, linked: bool) -> WorldBuilder {
    let mut b = WorldBuilder::new();
    b.sector(&[(0, 0), (1024, 0), (1024, 1024), (0, 1024)], CEILING, 0);
    b.sector(&[(1024, 0), (2048, 0), (2048, 1024), (1024, 1024)], CEILING, -step);
    if linked {
        b.link_portals();
    }
    b
}

/// Tile 0 is 32x32
pub fn tiles() -> TileTable {
    let mut t = TileTable::default();
    t.set_size(0, 32, 32);
    t
}
