//! A small built-in level and tile set for when no map is given.

use render_trait::{ParallaxSky, TileSet};
use world::{SectorStat, SpriteStat, StartPos, WallStat, World, WorldBuilder, WorldError};

/// Tiles 0..DEMO_TILES get a generated picture
pub const DEMO_TILES: i16 = 16;

const SKY_TILE: i16 = 8;

/// Three rooms in a row: a hall, a sloped courtyard open to the sky and a
/// raised alcove behind a grate
pub fn demo_world() -> Result<World, WorldError> {
    let mut b = WorldBuilder::new();
    b.set_start(StartPos {
        x: 512,
        y: 512,
        z: -4096,
        ang: 0,
        sector: 0,
    });

    let hall = b.sector(&[(0, 0), (2048, 0), (2048, 1024), (0, 1024)], -8192, 0);
    // The yard's east wall is split where the alcove meets it
    let yard = b.sector(
        &[(2048, 0), (4096, 0), (4096, 256), (4096, 768), (4096, 1024), (2048, 1024)],
        -16384,
        0,
    );
    let alcove = b.sector(&[(4096, 256), (5120, 256), (5120, 768), (4096, 768)], -6144, -1024);
    b.link_portals();

    for w in b.first_wall(hall)..b.first_wall(yard) {
        b.wall_mut(w).picnum = 1;
    }
    let sec = b.sector_mut(hall);
    sec.floor_picnum = 2;
    sec.ceiling_picnum = 3;
    sec.ceiling_shade = 4;

    let sec = b.sector_mut(yard);
    sec.ceiling_stat = SectorStat::Parallax as u16;
    sec.ceiling_picnum = SKY_TILE;
    sec.floor_stat = SectorStat::Sloped as u16;
    // Rises 2 z units per unit of y
    sec.floor_heinum = -512;
    sec.floor_picnum = 4;

    let sec = b.sector_mut(alcove);
    sec.floor_picnum = 5;
    sec.ceiling_picnum = 5;
    let grate = b.first_wall(alcove) + 3;
    b.wall_mut(grate).cstat = WallStat::Masked as u16 | WallStat::Blocking as u16;
    b.wall_mut(grate).overpicnum = 6;

    for (x, y) in [(1024, 512), (3072, 256), (3072, 768)] {
        let (z, sector) = if x < 2048 { (0, hall) } else { (-2 * y, yard) };
        let s = b.sprite(x, y, z, sector);
        let spr = b.sprite_mut(s);
        spr.picnum = 7;
        spr.cstat = SpriteStat::Blocking as u16 | SpriteStat::Hitscan as u16;
    }
    b.build()
}

/// Stripes and checks in a different colour range per tile
pub fn demo_tiles() -> TileSet {
    let mut t = TileSet::new();
    for picnum in 0..DEMO_TILES {
        let base = (picnum as u8).wrapping_mul(16);
        let mut pixels = Vec::with_capacity(64 * 64);
        for u in 0..64u8 {
            for v in 0..64u8 {
                let check = ((u >> 3) ^ (v >> 3)) & 1;
                pixels.push(base + 1 + check * 8 + (v & 7) / 2);
            }
        }
        t.insert(picnum, 64, 64, pixels);
    }
    // See-through grate bars
    let mut grate = vec![255u8; 64 * 64];
    for u in (0..64).step_by(8) {
        grate[u * 64..u * 64 + 64].fill(100);
    }
    t.insert(6, 64, 64, grate);
    t.set_shade_table(0, TileSet::ramp_shades());
    t.set_parallax(ParallaxSky {
        bits: 2,
        offsets: vec![SKY_TILE, SKY_TILE + 1, SKY_TILE, SKY_TILE + 1],
    });
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use render_trait::TileProvider;

    #[test]
    fn demo_world_is_linked() {
        let world = demo_world().unwrap();
        assert_eq!(world.sectors.len(), 3);
        assert_eq!(world.update_sector(512, 512, None), Some(0));
        assert_eq!(world.update_sector(3000, 500, None), Some(1));
        assert_eq!(world.update_sector(4500, 500, None), Some(2));
        // The hall and yard share a portal
        assert!(world.walls.iter().any(|w| w.nextsector == Some(1)));
    }

    #[test]
    fn demo_tiles_load() {
        let mut tiles = demo_tiles();
        for picnum in 0..DEMO_TILES {
            assert!(tiles.load(picnum));
        }
        assert!(!tiles.load(DEMO_TILES));
    }
}
