#[cfg(test)]
mod world_tests {
    use crate::tests::fixtures::{square_room, two_rooms, CEILING};
    use crate::{MapFile, MapVersion, SectorStat, World, WorldBuilder, WorldError};

    #[test]
    fn wall_loops_close() {
        let world = two_rooms(0, true).build().unwrap();
        for sec in &world.sectors {
            let mut w = sec.wallptr;
            for _ in 0..sec.wallnum {
                w = world.walls[w].point2;
            }
            assert_eq!(w, sec.wallptr);
        }
    }

    #[test]
    fn portals_are_symmetric() {
        let world = two_rooms(0, true).build().unwrap();
        assert_eq!(world.walls[1].nextwall, Some(7));
        assert_eq!(world.walls[1].nextsector, Some(1));
        assert_eq!(world.walls[7].nextwall, Some(1));
        assert_eq!(world.walls[7].nextsector, Some(0));
        for (i, w) in world.walls.iter().enumerate() {
            if let (Some(n), Some(ns)) = (w.nextwall, w.nextsector) {
                assert_eq!(world.walls[n].nextwall, Some(i));
                assert!(world.sectors[ns].walls().contains(&n));
            }
        }
        assert_eq!(world.sector_of_wall(7), Some(1));
        assert_eq!(world.last_wall(4), Some(7));
    }

    #[test]
    fn broken_portal_is_rejected() {
        let mut map = two_rooms(0, true).into_map();
        map.walls[7].nextwall = 2;
        let world = World::from_map(&map).unwrap();
        assert!(matches!(world.validate(), Err(WorldError::Corrupt { .. })));

        let mut map = two_rooms(0, true).into_map();
        map.walls[1].nextsector = -1;
        let world = World::from_map(&map).unwrap();
        assert!(world.validate().is_err());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut map = two_rooms(0, false).into_map();
        map.walls[3].point2 = 999;
        assert!(matches!(World::from_map(&map), Err(WorldError::Corrupt { wall: 3, .. })));
    }

    #[test]
    fn sprite_outside_every_sector_is_rejected() {
        let map_with_sprites = || {
            let mut b = two_rooms(0, true);
            b.sprite(300, 400, -100, 0);
            b.sprite(1500, 400, -100, 1);
            b.into_map()
        };
        for sectnum in [-1, 2] {
            let mut map = map_with_sprites();
            map.sprites[1].sectnum = sectnum;
            match World::from_map(&map) {
                Err(WorldError::SpriteLinks { sprite, .. }) => assert_eq!(sprite, 1),
                other => panic!("sector {} accepted: {:?}", sectnum, other.map(|_| ())),
            }
        }
        let mut map = map_with_sprites();
        map.sprites[0].statnum = -1;
        assert!(matches!(
            World::from_map(&map),
            Err(WorldError::SpriteLinks { sprite: 0, .. })
        ));
    }

    #[test]
    fn too_many_sectors_is_fatal() {
        let mut b = WorldBuilder::new();
        for i in 0..1025 {
            let x = i * 16;
            b.sector(&[(x, 0), (x + 16, 0), (x + 16, 16), (x, 16)], -1024, 0);
        }
        match b.build() {
            Err(WorldError::Capacity { what, count, max }) => {
                assert_eq!((what, count, max), ("sectors", 1025, 1024));
            }
            other => panic!("expected capacity error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn aligned_slope_passes_through_point() {
        let mut world = square_room();
        assert!(world.align_floor_slope(0, 0, 1024, -1024));
        let floor = world.sectors[0].floor;
        assert!(floor.has(SectorStat::Sloped));
        assert_eq!(floor.heinum, -256);
        assert_eq!(world.floor_z_at(0, 0, 1024), Some(-1024));
        assert_eq!(world.floor_z_at(0, 512, 512), Some(-512));
        // Along the first wall the plane keeps its base height
        assert_eq!(world.floor_z_at(0, 700, 0), Some(0));
        assert_eq!(world.ceiling_z_at(0, 512, 512), Some(-1024));

        // A point on the reference wall can't define a slope
        assert!(!world.align_ceiling_slope(0, 300, 0, -2000));
        assert!(!world.align_floor_slope(9, 0, 0, 0));

        assert!(world.align_floor_slope(0, 0, 1024, 0));
        assert!(!world.sectors[0].floor.has(SectorStat::Sloped));
    }

    #[test]
    fn map_round_trip_through_world() {
        let mut b = two_rooms(256, true);
        let s = b.sprite(300, 400, -100, 0);
        b.sprite_mut(s).ang = 512;
        b.sprite(1500, 400, -100, 1);
        let bytes = b.into_map().to_bytes(MapVersion::V7).unwrap();

        let world = World::from_map(&MapFile::parse(&bytes).unwrap()).unwrap();
        world.validate().unwrap();
        assert_eq!(world.sprites().len(), 2);
        assert_eq!(world.sprites_in_sector(1).collect::<Vec<_>>(), vec![1]);
        let again = world.to_map().to_bytes(MapVersion::V7).unwrap();
        assert_eq!(bytes, again);
    }

    #[test]
    fn sprites_follow_position() {
        let mut b = two_rooms(0, true);
        b.sprite(300, 400, -100, 0);
        let mut world = b.build().unwrap();

        world.set_sprite_pos(0, 1500, 400, -100).unwrap();
        assert_eq!(world.sprite(0).map(|s| s.sector()), Some(1));
        assert!(world.sprites_in_sector(0).next().is_none());

        // Outside the map the sprite keeps its sector
        world.set_sprite_pos(0, 5000, 400, -100).unwrap();
        assert_eq!(world.sprite(0).map(|s| (s.x, s.sector())), Some((5000, 1)));

        assert!(world.set_sprite_pos(3, 0, 0, 0).is_err());

        let i = world.insert_sprite(0, 2).unwrap();
        assert_eq!(world.sprites_in_status(2).collect::<Vec<_>>(), vec![i]);
        world.change_sprite_status(i, 5).unwrap();
        world.change_sprite_sector(i, 1).unwrap();
        assert_eq!(world.sprites_in_sector(1).collect::<Vec<_>>(), vec![i, 0]);
        world.delete_sprite(0).unwrap();
        assert_eq!(world.sprites_in_sector(1).collect::<Vec<_>>(), vec![i]);
        world.validate().unwrap();
    }

    #[test]
    fn z_gap_prefers_containing_sector() {
        let world = two_rooms(0, true).build().unwrap();
        assert_eq!(world.z_gap(0, 500, 500, -100), -1);
        assert_eq!(world.z_gap(0, 500, 500, 100), 100);
        assert_eq!(world.z_gap(0, 500, 500, CEILING - 50), 50);
    }
}
