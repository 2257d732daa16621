#[cfg(test)]
mod query_tests {
    use crate::tests::fixtures::{square_room, tiles, two_rooms};
    use crate::{ClipContext, ClipHit, ClipMask, SpriteStat, WallStat, ZRange};

    #[test]
    fn inside_square_room() {
        let world = square_room();
        assert_eq!(world.inside(512, 512, 0), Some(true));
        assert_eq!(world.inside(-10, -10, 0), Some(false));
        assert_eq!(world.inside(2000, 512, 0), Some(false));
        assert_eq!(world.inside(512, 512, 7), None);
    }

    #[test]
    fn update_sector_walks_neighbours() {
        let world = two_rooms(0, true).build().unwrap();
        assert_eq!(world.update_sector(1500, 500, Some(0)), Some(1));
        assert_eq!(world.update_sector(500, 500, Some(1)), Some(0));
        assert_eq!(world.update_sector(500, 500, None), Some(0));
        assert_eq!(world.update_sector(-500, 500, Some(0)), None);
        // Edges are half open, the shared wall goes to the sector at lower x
        assert_eq!(world.update_sector(1024, 500, None), Some(0));
    }

    #[test]
    fn hitscan_hits_far_wall() {
        let world = square_room();
        let mut ctx = ClipContext::new();
        let hit = ctx.hitscan(&world, &tiles(), 200, 100, -512, Some(0), 0, 16384, 0, ClipMask::HITSCAN);
        assert_eq!(hit.sector, Some(0));
        assert_eq!(hit.wall, Some(2));
        assert_eq!(hit.sprite, None);
        assert_eq!((hit.x, hit.y), (200, 1024));
    }

    #[test]
    fn hitscan_takes_nearest_sprite() {
        let mut world = square_room();
        if let Some(s) = world.sprite_mut(0) {
            s.cstat |= SpriteStat::Hitscan as u16;
        }
        let mut ctx = ClipContext::new();
        let hit = ctx.hitscan(&world, &tiles(), 512, 100, -600, Some(0), 0, 16384, 0, ClipMask::HITSCAN);
        assert_eq!(hit.sprite, Some(0));
        assert_eq!(hit.wall, None);
        assert_eq!((hit.x, hit.y, hit.z), (512, 512, -600));

        // Off to one side by more than its drawn half width allows
        let hit = ctx.hitscan(&world, &tiles(), 700, 100, -600, Some(0), 0, 16384, 0, ClipMask::HITSCAN);
        assert_eq!(hit.sprite, None);
        assert_eq!(hit.wall, Some(2));
    }

    /// Hit the sprite at `x` or the far wall behind it, never the wall when
    /// the sprite is in the way
    fn sweep_ray_past_sprite(world: &crate::World, sprite_covers: impl Fn(i32) -> bool) {
        let mut ctx = ClipContext::new();
        for d in (-384..=384).step_by(48) {
            let x = 512 + d;
            let hit = ctx.hitscan(world, &tiles(), x, 100, -600, Some(0), 0, 16384, 0, ClipMask::HITSCAN);
            if sprite_covers(d) {
                assert_eq!(hit.sprite, Some(0), "ray at x = {}", x);
                assert_eq!((hit.x, hit.y), (x, 512));
            } else {
                assert_eq!(hit.wall, Some(2), "ray at x = {}", x);
                assert_eq!((hit.x, hit.y), (x, 1024));
            }
        }
    }

    #[test]
    fn hitscan_sprite_edge_within_drawn_width() {
        let mut world = square_room();
        if let Some(s) = world.sprite_mut(0) {
            s.cstat |= SpriteStat::Hitscan as u16;
        }
        let mut ctx = ClipContext::new();
        // 148 off centre, outside the clip distance but inside the picture
        let hit = ctx.hitscan(&world, &tiles(), 660, 100, -600, Some(0), 0, 16384, 0, ClipMask::HITSCAN);
        assert_eq!(hit.sprite, Some(0));
        assert_eq!(hit.wall, None);
        assert_eq!((hit.x, hit.y, hit.z), (660, 512, -600));
    }

    #[test]
    fn hitscan_sweep_face_sprite() {
        let mut world = square_room();
        if let Some(s) = world.sprite_mut(0) {
            s.cstat |= SpriteStat::Hitscan as u16;
        }
        // Tile 32 wide at xrepeat 64
        let width = 32 * 64;
        sweep_ray_past_sprite(&world, |d| d * d <= (width * width) >> 7);
    }

    #[test]
    fn hitscan_sweep_wall_sprite() {
        let mut world = square_room();
        if let Some(s) = world.sprite_mut(0) {
            s.cstat = SpriteStat::WallAligned as u16 | SpriteStat::Hitscan as u16;
            // Runs along x from 256 to 768
            s.ang = 512;
        }
        sweep_ray_past_sprite(&world, |d| d.abs() < 256);
    }

    #[test]
    fn hitscan_down_hits_floor() {
        let world = square_room();
        let mut ctx = ClipContext::new();
        let hit = ctx.hitscan(&world, &tiles(), 300, 300, -512, Some(0), 0, 0, 16384, ClipMask::HITSCAN);
        assert_eq!(hit.sector, Some(0));
        assert_eq!((hit.wall, hit.sprite), (None, None));
        assert_eq!((hit.x, hit.y, hit.z), (300, 300, 0));

        let hit = ctx.hitscan(&world, &tiles(), 300, 300, -512, Some(0), 0, 0, -16384, ClipMask::HITSCAN);
        assert_eq!(hit.z, -1024);
    }

    #[test]
    fn hitscan_passes_portals() {
        let world = two_rooms(0, true).build().unwrap();
        let mut ctx = ClipContext::new();
        let hit = ctx.hitscan(&world, &tiles(), 500, 500, -4096, Some(0), 16384, 0, 0, ClipMask::HITSCAN);
        assert_eq!(hit.sector, Some(1));
        assert_eq!(hit.wall, Some(5));
        assert_eq!((hit.x, hit.y), (2048, 500));

        let hit = ctx.hitscan(&world, &tiles(), 500, 500, -4096, None, 16384, 0, 0, ClipMask::HITSCAN);
        assert_eq!(hit.sector, None);
    }

    #[test]
    fn zrange_picks_higher_neighbour_floor() {
        let world = two_rooms(512, true).build().unwrap();
        let mut ctx = ClipContext::new();
        let near = ctx.get_zrange(&world, &tiles(), 1000, 512, -4096, Some(0), 128, ClipMask::MOVE);
        assert_eq!(near.floor_z, -512);
        assert_eq!(near.floor_hit, ClipHit::Sector(1));
        assert_eq!(near.ceil_hit, ClipHit::Sector(0));

        let far = ctx.get_zrange(&world, &tiles(), 200, 512, -4096, Some(0), 128, ClipMask::MOVE);
        assert_eq!(far.floor_z, 0);
        assert_eq!(far.floor_hit, ClipHit::Sector(0));

        assert_eq!(
            ctx.get_zrange(&world, &tiles(), 200, 512, -4096, None, 128, ClipMask::MOVE),
            ZRange::NONE
        );
    }

    #[test]
    fn zrange_stands_on_sprite() {
        let world = square_room();
        let mut ctx = ClipContext::new();
        // The sprite is 8192 tall standing at -512
        let r = ctx.get_zrange(&world, &tiles(), 520, 500, -9000, Some(0), 64, ClipMask::MOVE);
        assert_eq!(r.floor_z, -512 - 8192);
        assert_eq!(r.floor_hit, ClipHit::Sprite(0));

        let r = ctx.get_zrange(&world, &tiles(), 100, 100, -9000, Some(0), 64, ClipMask::MOVE);
        assert_eq!(r.floor_hit, ClipHit::Sector(0));
    }

    #[test]
    fn sight_through_portal() {
        let world = two_rooms(0, true).build().unwrap();
        let mut ctx = ClipContext::new();
        assert!(ctx.can_see(&world, 512, 512, -4096, Some(0), 1536, 512, -4096, Some(1)));
        // Passing below the floor at the portal
        assert!(!ctx.can_see(&world, 512, 512, -100, Some(0), 1536, 512, 1000, Some(1)));
        assert!(ctx.can_see(&world, 100, 100, -4096, Some(0), 900, 900, -4096, Some(0)));
        assert!(!ctx.can_see(&world, 512, 512, -4096, None, 1536, 512, -4096, Some(1)));
    }

    #[test]
    fn sight_blocked_by_walls() {
        let world = two_rooms(0, false).build().unwrap();
        let mut ctx = ClipContext::new();
        assert!(!ctx.can_see(&world, 512, 512, -4096, Some(0), 1536, 512, -4096, Some(1)));

        let mut b = two_rooms(0, true);
        let w = b.first_wall(0) + 1;
        b.wall_mut(w).cstat |= WallStat::OneWay as u16;
        let world = b.build().unwrap();
        assert!(!ctx.can_see(&world, 512, 512, -4096, Some(0), 1536, 512, -4096, Some(1)));
    }
}
