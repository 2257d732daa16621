//! `sectorview` loads a sector map (or builds a demo one), renders frames
//! from a camera with the software renderer and can run the world queries
//! from the same spot.

mod cli;
mod config;
mod demo;

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::exit;
use std::time::Instant;

use log::{debug, error, info, warn};
use mimalloc::MiMalloc;
use simplelog::TermLogger;

use mapfile::{MapFile, MapVersion};
use render_soft::{Camera, RenderError, SoftwareRenderer};
use render_trait::{IndexedBuffer, PixelBuffer, TileSet};
use world::{ClipContext, ClipMask, Clearance, Position, World, WorldError};

use crate::cli::CLIOptions;
use crate::config::UserConfig;

const BASE_DIR: &str = "sectorview/";

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<(), Box<dyn Error>> {
    let mut options: CLIOptions = argh::from_env();

    let mut user_config = UserConfig::load()?;
    user_config.sync_cli(&mut options);
    user_config.write();

    TermLogger::init(
        options.verbose.unwrap_or(log::LevelFilter::Info),
        simplelog::ConfigBuilder::default()
            .set_time_level(log::LevelFilter::Trace)
            .build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let world = match load_world(&options) {
        Ok(world) => world,
        Err(e @ WorldError::Capacity { .. }) => {
            error!("{}", e);
            exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(v) = options.save_version {
        let version = MapVersion::from_i32(v)?;
        let path = save_path(&options.map, version);
        world.to_map().save(&path, version)?;
    }

    let mut tiles = demo::demo_tiles();
    let camera = start_camera(&world, &options);
    info!(
        "Camera at ({}, {}, {}) angle {} in sector {:?}",
        camera.x, camera.y, camera.z, camera.ang, camera.sector
    );

    if options.query {
        run_queries(&world, &tiles, &camera);
    }

    let (width, height) = (options.width as usize, options.height as usize);
    let mut renderer = SoftwareRenderer::new(width, height);
    renderer.set_visibility(user_config.visibility);
    let mut pixels = IndexedBuffer::new(width, height);

    let started = Instant::now();
    for frame in 0..options.frames {
        pixels.clear();
        match renderer.render_view(&world, &camera, &mut tiles, &mut pixels) {
            Ok(stats) => debug!("Frame {}: {:?}", frame, stats),
            Err(e @ RenderError::Capacity { .. }) => {
                error!("{}", e);
                exit(1);
            }
            Err(e) => return Err(e.into()),
        }
    }
    let elapsed = started.elapsed();
    info!(
        "Rendered {} frames of {}x{} in {:?}, {:?}",
        options.frames,
        width,
        height,
        elapsed,
        renderer.stats()
    );
    info!(
        "{} columns left open, {} wall spans",
        renderer.occlusion().open_columns(),
        renderer.visible_walls().len()
    );

    if let Some(out) = &options.out {
        fs::write(out, pixels.buf())?;
        info!("Wrote {}x{} indexed frame to {}", width, height, out);
    }

    #[cfg(feature = "hprof")]
    coarse_prof::write(&mut std::io::stdout())?;
    Ok(())
}

fn load_world(options: &CLIOptions) -> Result<World, WorldError> {
    if options.map.is_empty() {
        info!("No map given, using the demo level");
        return demo::demo_world();
    }
    let map = MapFile::load(&options.map)?;
    info!("Map hash {:08x}", map.hash());
    World::from_map(&map)
}

/// `level.map` saved as v5 goes to `level.v5.map`
fn save_path(map: &str, version: MapVersion) -> PathBuf {
    let mut path = if map.is_empty() {
        PathBuf::from("demo.map")
    } else {
        PathBuf::from(map)
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "map".to_string());
    path.set_file_name(format!("{}.v{}.map", stem, version.number()));
    path
}

/// Place the camera from the CLI, falling back to the map's start
fn start_camera(world: &World, options: &CLIOptions) -> Camera {
    let start = world.start;
    let (x, y, z) = options
        .pos
        .map(|p| (p.x, p.y, p.z))
        .unwrap_or((start.x, start.y, start.z));
    let ang = options.angle.unwrap_or(start.ang as i32) & 2047;

    let hint = (start.sector >= 0).then_some(start.sector as usize);
    let sector = world.update_sector(x, y, hint);
    if sector.is_none() {
        warn!("({}, {}) is not inside any sector", x, y);
    }
    Camera {
        x,
        y,
        z,
        ang,
        horiz: options.horiz.unwrap_or(100),
        sector,
    }
}

/// Walk forward, fire a ray and measure the floor and ceiling, all from the
/// camera
fn run_queries(world: &World, tiles: &TileSet, camera: &Camera) {
    let mut ctx = ClipContext::new();
    let clear = Clearance::default();
    let (dx, dy) = (math::cos(camera.ang), math::sin(camera.ang));

    let mut pos = Position {
        x: camera.x,
        y: camera.y,
        z: camera.z,
        sector: camera.sector,
    };
    // 1024 units along the view, in 18.14
    let (mut xv, mut yv) = (dx << 10, dy << 10);
    let hit = ctx.clip_move(world, tiles, &mut pos, &mut xv, &mut yv, clear, ClipMask::MOVE);
    info!(
        "clip_move ended at ({}, {}) in sector {:?}, hit {:?}",
        pos.x, pos.y, pos.sector, hit
    );

    let hit = ctx.hitscan(
        world,
        tiles,
        camera.x,
        camera.y,
        camera.z,
        camera.sector,
        dx,
        dy,
        0,
        ClipMask::HITSCAN,
    );
    info!("hitscan {:?}", hit);

    let range = ctx.get_zrange(
        world,
        tiles,
        camera.x,
        camera.y,
        camera.z,
        camera.sector,
        clear.wall,
        ClipMask::MOVE,
    );
    info!("get_zrange {:?}", range);
}
