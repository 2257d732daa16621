#[cfg(test)]
mod render_tests {
    use render_trait::{IndexedBuffer, ParallaxSky, PixelBuffer};
    use world::{SpriteStat, WallStat, WorldBuilder};

    use crate::tests::fixtures::*;
    use crate::utilities::{View, DEFAULT_VISIBILITY};
    use crate::{Camera, RenderError, RenderStats, SoftwareRenderer};

    fn outside_camera() -> Camera {
        // South of the room looking north (+y)
        Camera::new(512, -2048, -512, 512, 0)
    }

    #[test]
    fn far_wall_covers_the_centre() {
        let world = square_room();
        let mut tiles = tiles();
        let mut pixels = screen();
        let mut r = SoftwareRenderer::new(WIDTH, HEIGHT);
        let stats = r
            .render_view(&world, &outside_camera(), &mut tiles, &mut pixels)
            .unwrap();

        assert!(stats.sectors_visited >= 1);
        assert_eq!(stats.walls_drawn, 3);
        assert_eq!(stats.sprites_drawn, 1);
        let far = r
            .visible_walls()
            .iter()
            .find(|w| w.wall == 2)
            .expect("far wall drawn");
        assert_eq!(far.sector, 0);
        assert!(far.x1 <= 160 && 160 <= far.x2, "{:?}", far);

        // The room only fills the middle of the screen
        assert!(r.occlusion().is_open(0));
        assert!(!r.occlusion().is_open(160));
        assert_eq!(pixels.read_pixel(0, 100), 0);
        assert_eq!(pixels.read_pixel(160, 100), WALL);
        assert_eq!(pixels.read_pixel(160, 150), WALL);
        // The sprite stands in front of the far wall
        assert_eq!(pixels.read_pixel(160, 90), SPRITE);
    }

    #[test]
    fn same_pose_renders_the_same() {
        let world = square_room();
        let mut tiles = tiles();
        let mut r = SoftwareRenderer::new(WIDTH, HEIGHT);

        let mut first = screen();
        r.render_view(&world, &outside_camera(), &mut tiles, &mut first)
            .unwrap();
        let umost = r.occlusion().umost().to_vec();
        let dmost = r.occlusion().dmost().to_vec();
        let walls = r.visible_walls().to_vec();

        let mut second = screen();
        r.render_view(&world, &outside_camera(), &mut tiles, &mut second)
            .unwrap();
        assert_eq!(r.occlusion().umost(), &umost[..]);
        assert_eq!(r.occlusion().dmost(), &dmost[..]);
        assert_eq!(r.visible_walls(), &walls[..]);
        assert_eq!(first.buf(), second.buf());
    }

    #[test]
    fn inside_a_room_every_column_closes() {
        let world = square_room();
        let mut tiles = tiles();
        let mut pixels = screen();
        let mut r = SoftwareRenderer::new(WIDTH, HEIGHT);
        let camera = Camera::new(512, 100, -512, 512, 0);
        let stats = r.render_view(&world, &camera, &mut tiles, &mut pixels).unwrap();
        assert_eq!(r.occlusion().open_columns(), 0);
        assert_eq!(stats.bunches_drawn, 1);
        assert!(pixels.buf().iter().all(|&p| p != 0));
    }

    #[test]
    fn unknown_sector_draws_nothing() {
        let world = square_room();
        let mut tiles = tiles();
        let mut pixels = screen();
        let mut r = SoftwareRenderer::new(WIDTH, HEIGHT);

        let mut camera = outside_camera();
        camera.sector = None;
        let stats = r.render_view(&world, &camera, &mut tiles, &mut pixels).unwrap();
        assert_eq!(stats, RenderStats::default());

        camera.sector = Some(99);
        let stats = r.render_view(&world, &camera, &mut tiles, &mut pixels).unwrap();
        assert_eq!(stats, RenderStats::default());
        assert!(pixels.buf().iter().all(|&p| p == 0));
    }

    #[test]
    fn wrong_buffer_size_is_an_error() {
        let world = square_room();
        let mut tiles = tiles();
        let mut pixels = IndexedBuffer::new(100, 100);
        let mut r = SoftwareRenderer::new(WIDTH, HEIGHT);
        assert_eq!(
            r.render_view(&world, &outside_camera(), &mut tiles, &mut pixels),
            Err(RenderError::BufferSize {
                width: WIDTH as i32,
                height: HEIGHT as i32
            })
        );
    }

    #[test]
    fn portal_leads_to_the_next_room() {
        let world = two_rooms().build().unwrap();
        let mut tiles = tiles();
        let mut pixels = screen();
        let mut r = SoftwareRenderer::new(WIDTH, HEIGHT);
        let camera = Camera::new(200, 512, -4096, 0, 0);
        let stats = r.render_view(&world, &camera, &mut tiles, &mut pixels).unwrap();

        assert_eq!(stats.sectors_visited, 2);
        assert!(r.queue.is_visited(1));
        assert_eq!(r.occlusion().open_columns(), 0);
        // The far wall of the second room shows through the opening
        assert!(r
            .visible_walls()
            .iter()
            .any(|w| w.sector == 1 && w.wall == 5 && w.x1 <= 160 && 160 <= w.x2));
    }

    #[test]
    fn nearer_wall_is_in_front() {
        let world = two_rooms().build().unwrap();
        let mut r = SoftwareRenderer::new(WIDTH, HEIGHT);
        r.view = View::new(&Camera::new(200, 512, -4096, 0, 0), 320, 200, DEFAULT_VISIBILITY);
        assert_eq!(r.wall_front(&world, 1, 5), Some(true));
        assert_eq!(r.wall_front(&world, 5, 1), Some(false));
        // Walls on one line can't be ordered
        assert_eq!(r.wall_front(&world, 0, 0), None);
    }

    #[test]
    fn sky_follows_view_angle() {
        let world = sky_room();
        let mut tiles = tiles();
        tiles.set_parallax(ParallaxSky {
            bits: 1,
            offsets: vec![0, 1],
        });
        let mut pixels = screen();
        let mut r = SoftwareRenderer::new(WIDTH, HEIGHT);
        let camera = Camera::new(512, 512, -512, 0, 0);
        r.render_view(&world, &camera, &mut tiles, &mut pixels).unwrap();

        assert_eq!(pixels.read_pixel(160, 10), SKY_EAST);
        assert_eq!(pixels.read_pixel(0, 10), SKY_WEST);
        // Both sky tiles were asked for
        assert!(tiles.loads() >= 4);
        // The sloped floor is drawn right down to the bottom row
        assert_eq!(pixels.read_pixel(160, HEIGHT - 1), SLOPE);
    }

    #[test]
    fn masked_wall_covers_sprites_behind_it() {
        let mut b = two_rooms();
        let w = b.first_wall(0) + 1;
        b.wall_mut(w).cstat = WallStat::Masked as u16;
        b.wall_mut(w).overpicnum = 5;
        let s = b.sprite(1536, 512, 0, 1);
        b.sprite_mut(s).picnum = 1;
        let world = b.build().unwrap();

        let camera = Camera::new(200, 512, -4096, 0, 0);
        let mut r = SoftwareRenderer::new(WIDTH, HEIGHT);
        let mut tiles = tiles();
        let mut pixels = screen();
        let stats = r.render_view(&world, &camera, &mut tiles, &mut pixels).unwrap();
        assert_eq!(stats.sprites_drawn, 1);
        assert_eq!(pixels.read_pixel(160, 100), MASK);

        // See-through mask: the sprite shows
        tiles.insert(5, 64, 64, vec![255; 64 * 64]);
        let mut pixels = screen();
        r.render_view(&world, &camera, &mut tiles, &mut pixels).unwrap();
        assert_eq!(pixels.read_pixel(160, 100), SPRITE);
    }

    #[test]
    fn floor_sprite_reuses_scratch_between_frames() {
        let mut b = WorldBuilder::new();
        b.sector(&[(0, 0), (1024, 0), (1024, 1024), (0, 1024)], -1024, 0);
        let s = b.sprite(512, 512, -16, 0);
        let spr = b.sprite_mut(s);
        spr.picnum = 1;
        spr.cstat = SpriteStat::FloorAligned as u16;
        let world = b.build().unwrap();

        let mut r = SoftwareRenderer::new(WIDTH, HEIGHT);
        let mut tiles = tiles();
        let scratch_ptrs = |r: &SoftwareRenderer| {
            let sc = &r.r_data.sprite_scratch;
            let mut p = [sc.poly.as_ptr(), sc.poly_tmp.as_ptr()];
            p.sort();
            p
        };
        let polys = scratch_ptrs(&r);
        let cells = r.r_data.sprite_scratch.cells.as_ptr();
        for _ in 0..3 {
            let mut pixels = screen();
            r.render_view(&world, &outside_camera(), &mut tiles, &mut pixels)
                .unwrap();
        }
        // Same buffers, swapped and cleared rather than grown or dropped
        assert_eq!(scratch_ptrs(&r), polys);
        assert_eq!(r.r_data.sprite_scratch.cells.as_ptr(), cells);
        assert!(r.r_data.sprite_scratch.cells.capacity() >= 64 * 64);
        r.r_data.clear_data();
        assert!(r.r_data.sprite_scratch.poly.is_empty());
    }
}
