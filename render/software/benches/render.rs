use criterion::*;

use render_soft::{Camera, SoftwareRenderer};
use render_trait::{IndexedBuffer, ParallaxSky, TileSet};
use world::{SectorStat, World, WorldBuilder};

const CELL: i32 = 1024;
const GRID: i32 = 8;

/// A grid of joined rooms, floors stepping down per column, every other room
/// open to the sky
fn grid() -> World {
    let mut b = WorldBuilder::new();
    for row in 0..GRID {
        for col in 0..GRID {
            let (x, y) = (col * CELL, row * CELL);
            let s = b.sector(
                &[(x, y), (x + CELL, y), (x + CELL, y + CELL), (x, y + CELL)],
                -16384,
                col * 256,
            );
            let sec = b.sector_mut(s);
            sec.floor_picnum = 1;
            sec.ceiling_picnum = 2;
            if (row + col) % 2 == 0 {
                sec.ceiling_stat = SectorStat::Parallax as u16;
            }
            let spr = b.sprite(x + CELL / 2, y + CELL / 2, col * 256, s);
            b.sprite_mut(spr).picnum = 3;
        }
    }
    b.link_portals();
    b.build().unwrap()
}

fn tiles() -> TileSet {
    let mut t = TileSet::new();
    for picnum in 0..4 {
        let pixels = (0..64 * 64).map(|i| (i % 251) as u8 + picnum as u8).collect();
        t.insert(picnum, 64, 64, pixels);
    }
    t.set_parallax(ParallaxSky {
        bits: 2,
        offsets: vec![2, 2, 2, 2],
    });
    t
}

fn render(b: &mut Bencher, width: usize, height: usize) {
    let world = grid();
    let mut tiles = tiles();
    let mut pixels = IndexedBuffer::new(width, height);
    let mut renderer = SoftwareRenderer::new(width, height);
    let camera = Camera::new(512, 512, -4096, 300, 0);
    b.iter(|| black_box(renderer.render_view(&world, &camera, &mut tiles, &mut pixels)));
}

fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("Full frame");
    group.bench_function("320x200 across a grid of rooms", |b| render(b, 320, 200));
    group.bench_function("640x400 across a grid of rooms", |b| render(b, 640, 400));
}

criterion_group!(benches, bench,);
criterion_main!(benches);
