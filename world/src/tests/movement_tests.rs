#[cfg(test)]
mod movement_tests {
    use crate::tests::fixtures::{clip_room, square_room, tiles, two_rooms};
    use crate::{ClipContext, ClipHit, ClipMask, Clearance, Position, PushResult, WallStat, WorldBuilder};

    fn clearance(wall: i32) -> Clearance {
        Clearance {
            wall,
            ..Clearance::default()
        }
    }

    #[test]
    fn zero_vector_changes_nothing() {
        let world = clip_room();
        let mut ctx = ClipContext::new();
        let mut pos = Position::new(-300, 40, 0, 0);
        let before = pos;
        let (mut xv, mut yv) = (0, 0);
        let hit = ctx.clip_move(&world, &tiles(), &mut pos, &mut xv, &mut yv, clearance(32), ClipMask::MOVE);
        assert_eq!(hit, ClipHit::None);
        assert_eq!(pos, before);
    }

    #[test]
    fn stops_short_of_solid_wall() {
        let world = clip_room();
        let mut ctx = ClipContext::new();
        let mut pos = Position::new(0, 0, 0, 0);
        let (mut xv, mut yv) = (200 << 14, 0);
        let hit = ctx.clip_move(&world, &tiles(), &mut pos, &mut xv, &mut yv, clearance(32), ClipMask::MOVE);
        assert_eq!(hit, ClipHit::Wall(1));
        assert!(pos.x <= 68, "ended at {}", pos.x);
        assert!(100 - pos.x >= 32);
        assert_eq!(pos.y, 0);
        assert_eq!(pos.sector, Some(0));
    }

    #[test]
    fn slides_along_wall() {
        let world = clip_room();
        let mut ctx = ClipContext::new();
        let mut pos = Position::new(0, 0, 0, 0);
        let (mut xv, mut yv) = (200 << 14, 200 << 14);
        let hit = ctx.clip_move(&world, &tiles(), &mut pos, &mut xv, &mut yv, clearance(32), ClipMask::MOVE);
        assert_eq!(hit, ClipHit::Wall(1));
        assert!(pos.x <= 68);
        assert!(pos.y > 100, "slide lost, ended at {}", pos.y);
        assert_eq!(pos.sector, Some(0));
    }

    #[test]
    fn free_move_lands_on_goal() {
        let world = clip_room();
        let mut ctx = ClipContext::new();
        let mut pos = Position::new(-500, -500, 0, 0);
        let (mut xv, mut yv) = (100 << 14, 50 << 14);
        let hit = ctx.clip_move(&world, &tiles(), &mut pos, &mut xv, &mut yv, clearance(32), ClipMask::MOVE);
        assert_eq!(hit, ClipHit::None);
        assert_eq!((pos.x, pos.y), (-400, -450));
    }

    #[test]
    fn crosses_open_portal_and_changes_sector() {
        let world = two_rooms(0, true).build().unwrap();
        let mut ctx = ClipContext::new();
        let mut pos = Position::new(900, 512, -4096, 0);
        let (mut xv, mut yv) = (400 << 14, 0);
        let hit = ctx.clip_move(&world, &tiles(), &mut pos, &mut xv, &mut yv, clearance(32), ClipMask::MOVE);
        assert_eq!(hit, ClipHit::None);
        assert_eq!(pos.x, 1300);
        assert_eq!(pos.sector, Some(1));
    }

    #[test]
    fn blocking_flag_closes_portal() {
        let mut b = two_rooms(0, true);
        let w = b.first_wall(0) + 1;
        b.wall_mut(w).cstat |= WallStat::Blocking as u16;
        let world = b.build().unwrap();
        let mut ctx = ClipContext::new();
        let mut pos = Position::new(900, 512, -4096, 0);
        let (mut xv, mut yv) = (400 << 14, 0);
        let hit = ctx.clip_move(&world, &tiles(), &mut pos, &mut xv, &mut yv, clearance(32), ClipMask::MOVE);
        assert_eq!(hit, ClipHit::Wall(w));
        assert!(pos.x <= 1024 - 32);
        assert_eq!(pos.sector, Some(0));
    }

    #[test]
    fn tall_step_blocks() {
        // A step far higher than the mover's floor clearance
        let world = two_rooms(8192, true).build().unwrap();
        let mut ctx = ClipContext::new();
        let mut pos = Position::new(900, 512, -1024, 0);
        let (mut xv, mut yv) = (400 << 14, 0);
        let hit = ctx.clip_move(&world, &tiles(), &mut pos, &mut xv, &mut yv, clearance(32), ClipMask::MOVE);
        assert_eq!(hit, ClipHit::Wall(1));
        assert_eq!(pos.sector, Some(0));
    }

    #[test]
    fn blocked_by_sprite() {
        let world = square_room();
        let mut ctx = ClipContext::new();
        // Clearance box of the sprite is 128 + 32 either side of x = 512
        let mut pos = Position::new(100, 512, -600, 0);
        let (mut xv, mut yv) = (600 << 14, 0);
        let hit = ctx.clip_move(&world, &tiles(), &mut pos, &mut xv, &mut yv, clearance(32), ClipMask::MOVE);
        assert_eq!(hit, ClipHit::Sprite(0));
        assert!(pos.x <= 512 - 160);
    }

    #[test]
    fn invalid_sector_is_a_no_op() {
        let world = clip_room();
        let mut ctx = ClipContext::new();
        let mut pos = Position {
            x: 0,
            y: 0,
            z: 0,
            sector: None,
        };
        let (mut xv, mut yv) = (200 << 14, 0);
        let hit = ctx.clip_move(&world, &tiles(), &mut pos, &mut xv, &mut yv, clearance(32), ClipMask::MOVE);
        assert_eq!(hit, ClipHit::None);
        assert_eq!(pos.x, 0);
    }

    #[test]
    fn push_out_of_wall() {
        let world = square_room();
        let mut ctx = ClipContext::new();
        let mut pos = Position::new(1000, 300, -600, 0);
        let res = ctx.push_move(&world, &mut pos, clearance(128), ClipMask::MOVE);
        assert_eq!(res, PushResult::Pushed);
        assert!(pos.x <= 1024 - 124, "still inside at {}", pos.x);
        assert_eq!(pos.y, 300);
        assert_eq!(pos.sector, Some(0));
    }

    #[test]
    fn push_leaves_clear_point_alone() {
        let world = square_room();
        let mut ctx = ClipContext::new();
        let mut pos = Position::new(300, 300, -600, 0);
        let before = pos;
        assert_eq!(ctx.push_move(&world, &mut pos, clearance(128), ClipMask::MOVE), PushResult::Free);
        assert_eq!(pos, before);

        pos.sector = None;
        assert_eq!(ctx.push_move(&world, &mut pos, clearance(128), ClipMask::MOVE), PushResult::NoSector);
    }

    #[test]
    fn push_stops_once_out_of_every_sector() {
        // Narrower than the clearance box, so the first push goes through
        // the far wall
        let mut b = WorldBuilder::new();
        b.sector(&[(0, 0), (1024, 0), (1024, 100), (0, 100)], -1024, 0);
        let world = b.build().unwrap();
        let mut ctx = ClipContext::new();
        let mut pos = Position::new(500, 50, -600, 0);
        let res = ctx.push_move(&world, &mut pos, clearance(128), ClipMask::MOVE);
        assert_eq!(res, PushResult::NoSector);
        assert_eq!(pos.sector, None);
        assert_eq!((pos.x, pos.y), (500, 130));
    }
}
