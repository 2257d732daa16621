#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::{debug, trace};
use math::point_on_side;
use render_trait::{PixelBuffer, TileProvider};
use world::{SpriteOrientation, SpriteStat, World};

use crate::defs::{
    Bunch, Camera, RenderStats, VisSprite, VisibleWall, WallScan, MAX_BUNCHES, MAX_SCANS,
    MAX_SECTORS, MAX_SPRITES_ON_SCREEN, NEAR_PLANE,
};
use crate::portals::{OcclusionBuffer, SectorQueue};
use crate::utilities::{clip_near, View, DEFAULT_VISIBILITY, DEPTH_BITS};
use crate::{RenderData, RenderError};

const LOG_TAG: &str = "Traversal";

/// Walks the sectors visible from a camera and draws them front to back
pub struct SoftwareRenderer {
    pub(crate) r_data: RenderData,
    pub(crate) queue: SectorQueue,
    pub(crate) view: View,
    pub(crate) stats: RenderStats,
    width: i32,
    height: i32,
    visibility: i64,
}

impl SoftwareRenderer {
    pub fn new(screen_width: usize, screen_height: usize) -> Self {
        Self {
            r_data: RenderData::new(screen_width, screen_height),
            queue: SectorQueue::new(MAX_SECTORS),
            view: View::new(
                &Camera::default(),
                screen_width as i32,
                screen_height as i32,
                DEFAULT_VISIBILITY,
            ),
            stats: RenderStats::default(),
            width: screen_width as i32,
            height: screen_height as i32,
            visibility: DEFAULT_VISIBILITY,
        }
    }

    /// Distance fade, higher darkens sooner
    pub fn set_visibility(&mut self, visibility: i32) {
        self.visibility = visibility.max(0) as i64;
    }

    /// Occlusion as it was left by the last frame
    pub fn occlusion(&self) -> &OcclusionBuffer {
        &self.r_data.occlusion
    }

    /// Every wall span drawn last frame, in draw order
    pub fn visible_walls(&self) -> &[VisibleWall] {
        &self.r_data.visible
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Draw the view from `camera` into `pixels`
    pub fn render_view<T, P>(
        &mut self,
        world: &World,
        camera: &Camera,
        tiles: &mut T,
        pixels: &mut P,
    ) -> Result<RenderStats, RenderError>
    where
        T: TileProvider + ?Sized,
        P: PixelBuffer,
    {
        #[cfg(feature = "hprof")]
        profile!("render_view");
        if pixels.size().width() != self.width || pixels.size().height() != self.height {
            return Err(RenderError::BufferSize {
                width: self.width,
                height: self.height,
            });
        }
        self.r_data.clear_data();
        self.queue.clear();
        self.stats = RenderStats::default();

        let Some(mut sector) = camera.sector.filter(|&s| s < world.sectors.len()) else {
            debug!(target: LOG_TAG, "camera sector {:?} is not in the map", camera.sector);
            return Ok(self.stats);
        };
        if world.inside(camera.x, camera.y, sector) != Some(true) {
            if let Some(found) = world.update_sector(camera.x, camera.y, Some(sector)) {
                sector = found;
            }
        }
        self.view = View::new(camera, self.width, self.height, self.visibility);

        let pitch = pixels.pitch();
        let buf = pixels.buf_mut();

        self.queue.push(sector)?;
        self.drain_queue(world, tiles)?;
        while self.r_data.occlusion.open_columns() > 0 {
            let Some(closest) = self.closest_bunch(world) else {
                break;
            };
            let bunch = self.r_data.bunches.swap_remove(closest);
            self.draw_bunch(world, &*tiles, buf, pitch, bunch)?;
            self.stats.bunches_drawn += 1;
            self.drain_queue(world, tiles)?;
        }
        self.draw_masks(world, &*tiles, buf, pitch);

        debug!(
            target: LOG_TAG,
            "{} sectors, {} bunches, {} walls, {} sprites, {} columns open",
            self.stats.sectors_visited,
            self.stats.bunches_drawn,
            self.stats.walls_drawn,
            self.stats.sprites_drawn,
            self.r_data.occlusion.open_columns()
        );
        Ok(self.stats)
    }

    fn drain_queue<T: TileProvider + ?Sized>(
        &mut self,
        world: &World,
        tiles: &mut T,
    ) -> Result<(), RenderError> {
        while let Some(sector) = self.queue.pop() {
            self.scan_sector(world, tiles, sector)?;
        }
        Ok(())
    }

    /// Project the walls of a sector facing the camera, chain them into
    /// bunches and pick up its sprites
    fn scan_sector<T: TileProvider + ?Sized>(
        &mut self,
        world: &World,
        tiles: &mut T,
        sector: usize,
    ) -> Result<(), RenderError> {
        #[cfg(feature = "hprof")]
        profile!("scan_sector");
        self.stats.sectors_visited += 1;
        let view = self.view;
        let sec = &world.sectors[sector];
        load_plane(tiles, &sec.ceiling);
        load_plane(tiles, &sec.floor);
        self.collect_sprites(world, tiles, sector);

        let first_bunch = self.r_data.bunches.len();
        let mut prev: Option<usize> = None;
        for w in sec.walls() {
            let wall = &world.walls[w];
            let p2 = &world.walls[wall.point2];
            tiles.load(wall.picnum);
            if wall.overpicnum >= 0 {
                tiles.load(wall.overpicnum);
            }
            if let Some(nw) = wall.nextwall {
                if let Some(partner) = world.walls.get(nw) {
                    tiles.load(partner.picnum);
                }
            }

            let side = point_on_side(wall.x, wall.y, p2.x, p2.y, view.x, view.y);
            if let Some(next) = wall.nextsector {
                if near_portal(wall.x, wall.y, p2.x, p2.y, view.x, view.y, side) {
                    self.queue.push(next)?;
                }
            }
            if side <= 0 {
                prev = None;
                continue;
            }

            let (rx1, ry1) = view.to_camera(wall.x, wall.y);
            let (rx2, ry2) = view.to_camera(p2.x, p2.y);
            let Some((cx1, cy1, cx2, cy2)) = clip_near(rx1, ry1, rx2, ry2) else {
                prev = None;
                continue;
            };
            let x1 = view.screen_x(cx1, cy1).clamp(0, self.width as i64) as i32;
            let x2 = view.screen_x(cx2, cy2).clamp(0, self.width as i64) as i32;
            if x1 >= x2 || !self.r_data.occlusion.any_open(x1, x2) {
                prev = None;
                continue;
            }

            if self.r_data.scans.len() >= MAX_SCANS {
                return Err(RenderError::Capacity {
                    what: "wall scans",
                    max: MAX_SCANS,
                });
            }
            let idx = self.r_data.scans.len();
            self.r_data.scans.push(WallScan {
                sector,
                wall: w,
                rx1,
                ry1,
                rx2,
                ry2,
                x1,
                x2,
                next: None,
            });

            let joined = prev.filter(|&p| {
                let ps = &self.r_data.scans[p];
                ps.x2 == x1 && world.walls[ps.wall].point2 == w
            });
            match joined {
                Some(p) => {
                    self.r_data.scans[p].next = Some(idx);
                    if let Some(b) = self.r_data.bunches.last_mut() {
                        b.last = idx;
                    }
                }
                None => self.push_bunch(Bunch {
                    first: idx,
                    last: idx,
                })?,
            }
            prev = Some(idx);
        }

        // The loop wraps: the last bunch may carry on into the first
        let bunches = &mut self.r_data.bunches;
        if bunches.len() >= first_bunch + 2 {
            let head = bunches[first_bunch];
            let tail = bunches[bunches.len() - 1];
            let scans = &mut self.r_data.scans;
            if scans[tail.last].x2 == scans[head.first].x1
                && world.walls[scans[tail.last].wall].point2 == scans[head.first].wall
            {
                scans[tail.last].next = Some(head.first);
                bunches[first_bunch] = Bunch {
                    first: tail.first,
                    last: head.last,
                };
                bunches.pop();
            }
        }
        Ok(())
    }

    fn push_bunch(&mut self, bunch: Bunch) -> Result<(), RenderError> {
        if self.r_data.bunches.len() >= MAX_BUNCHES {
            return Err(RenderError::Capacity {
                what: "bunches",
                max: MAX_BUNCHES,
            });
        }
        self.r_data.bunches.push(bunch);
        Ok(())
    }

    fn collect_sprites<T: TileProvider + ?Sized>(&mut self, world: &World, tiles: &mut T, sector: usize) {
        let view = self.view;
        for i in world.sprites_in_sector(sector) {
            let Some(spr) = world.sprite(i) else {
                continue;
            };
            if spr.has(SpriteStat::Invisible) || spr.xrepeat == 0 || spr.yrepeat == 0 {
                continue;
            }
            let (rx, ry) = view.to_camera(spr.x, spr.y);
            let orientation = spr.orientation();
            match orientation {
                SpriteOrientation::Face | SpriteOrientation::Voxel => {
                    if ry < NEAR_PLANE {
                        continue;
                    }
                }
                SpriteOrientation::Wall | SpriteOrientation::Floor => {
                    let (w, h) = tiles.tile_size(spr.picnum);
                    let reach = ((w.max(h) * spr.xrepeat.max(spr.yrepeat) as i32) >> 2) as i64;
                    if ry + (reach << DEPTH_BITS) < NEAR_PLANE {
                        continue;
                    }
                }
            }
            if self.r_data.sprites.len() >= MAX_SPRITES_ON_SCREEN {
                trace!(target: LOG_TAG, "sprite {} dropped, too many on screen", i);
                continue;
            }
            tiles.load(spr.picnum);
            let (x1, x2) = self.sprite_columns(tiles, spr, rx, ry);
            self.r_data.sprites.push(VisSprite {
                sprite: i,
                depth: ry,
                status: spr.status(),
                x1,
                x2,
            });
        }
    }

    /// Pick the bunch nothing else is in front of. Pairs that can't be
    /// ordered are skipped in the first pass and retried against the pick.
    fn closest_bunch(&mut self, world: &World) -> Option<usize> {
        let n = self.r_data.bunches.len();
        if n == 0 {
            return None;
        }
        self.r_data.bunch_tested[..n].iter_mut().for_each(|t| *t = false);
        let mut closest = 0;
        self.r_data.bunch_tested[0] = true;
        for i in 1..n {
            let Some(front) = self.bunch_front(world, i, closest) else {
                continue;
            };
            self.r_data.bunch_tested[i] = true;
            if front {
                self.r_data.bunch_tested[closest] = true;
                closest = i;
            }
        }
        let mut i = 0;
        while i < n {
            if !self.r_data.bunch_tested[i] {
                if let Some(front) = self.bunch_front(world, i, closest) {
                    self.r_data.bunch_tested[i] = true;
                    if front {
                        self.r_data.bunch_tested[closest] = true;
                        closest = i;
                        i = 0;
                        continue;
                    }
                }
            }
            i += 1;
        }
        Some(closest)
    }

    /// Whether bunch `b1` is in front of `b2` where they overlap on screen.
    /// `None` when they don't overlap or can't be told apart.
    pub(crate) fn bunch_front(&self, world: &World, b1: usize, b2: usize) -> Option<bool> {
        let scans = &self.r_data.scans;
        let (one, two) = (self.r_data.bunches[b1], self.r_data.bunches[b2]);
        let x1b1 = scans[one.first].x1;
        let x2b1 = scans[one.last].x2;
        let x1b2 = scans[two.first].x1;
        let x2b2 = scans[two.last].x2;
        if x1b1 >= x2b2 || x1b2 >= x2b1 {
            return None;
        }
        let reference = self.wall_front(world, scans[one.first].wall, scans[two.first].wall);
        if x1b1 >= x1b2 {
            let i = self.scan_at(two.first, x1b1);
            self.wall_front(world, scans[one.first].wall, scans[i].wall).or(reference)
        } else {
            let i = self.scan_at(one.first, x1b2);
            self.wall_front(world, scans[i].wall, scans[two.first].wall).or(reference)
        }
    }

    /// The scan of a bunch covering column `x`, or its last
    fn scan_at(&self, first: usize, x: i32) -> usize {
        let mut i = first;
        while self.r_data.scans[i].x2 <= x {
            match self.r_data.scans[i].next {
                Some(n) => i = n,
                None => break,
            }
        }
        i
    }

    /// Whether wall `a` is nearer the camera than wall `b`. `None` when the
    /// walls cross or are on one line.
    pub(crate) fn wall_front(&self, world: &World, a: usize, b: usize) -> Option<bool> {
        let (ax1, ay1, ax2, ay2) = wall_line(world, a);
        let (bx1, by1, bx2, by2) = wall_line(world, b);
        let (cx, cy) = (self.view.x, self.view.y);

        let (t1, t2) = same_side(
            point_on_side(ax1, ay1, ax2, ay2, bx1, by1),
            point_on_side(ax1, ay1, ax2, ay2, bx2, by2),
        )?;
        if (t1 ^ t2) >= 0 {
            let cam = point_on_side(ax1, ay1, ax2, ay2, cx, cy);
            // `b` is on the camera's side of `a`
            return Some((cam ^ t1) < 0);
        }
        let (t1, t2) = same_side(
            point_on_side(bx1, by1, bx2, by2, ax1, ay1),
            point_on_side(bx1, by1, bx2, by2, ax2, ay2),
        )?;
        if (t1 ^ t2) >= 0 {
            let cam = point_on_side(bx1, by1, bx2, by2, cx, cy);
            return Some((cam ^ t1) >= 0);
        }
        None
    }

    fn draw_bunch<T: TileProvider + ?Sized>(
        &mut self,
        world: &World,
        tiles: &T,
        buf: &mut [u8],
        pitch: usize,
        bunch: Bunch,
    ) -> Result<(), RenderError> {
        #[cfg(feature = "hprof")]
        profile!("draw_bunch");
        let mut i = bunch.first;
        loop {
            self.draw_scan(world, tiles, buf, pitch, i)?;
            if i == bunch.last {
                break;
            }
            match self.r_data.scans[i].next {
                Some(n) => i = n,
                None => break,
            }
        }
        Ok(())
    }
}

fn load_plane<T: TileProvider + ?Sized>(tiles: &mut T, plane: &world::Plane) {
    if plane.is_parallax() {
        for i in 0..tiles.parallax().offsets.len() {
            let off = tiles.parallax().offsets[i];
            tiles.load(plane.picnum.saturating_add(off));
        }
    } else {
        tiles.load(plane.picnum);
    }
}

pub(crate) fn wall_line(world: &World, w: usize) -> (i32, i32, i32, i32) {
    let wall = &world.walls[w];
    let p2 = &world.walls[wall.point2];
    (wall.x, wall.y, p2.x, p2.y)
}

/// Sides of two points against a line with a point on the line taking the
/// other's side. `None` when both are on it.
fn same_side(t1: i64, t2: i64) -> Option<(i64, i64)> {
    match (t1, t2) {
        (0, 0) => None,
        (0, t) | (t, 0) => Some((t, t)),
        (a, b) => Some((a, b)),
    }
}

/// The camera is within one unit of the portal line and alongside it
fn near_portal(x1: i32, y1: i32, x2: i32, y2: i32, cx: i32, cy: i32, side: i64) -> bool {
    let dx = (x2 - x1) as i64;
    let dy = (y2 - y1) as i64;
    let len2 = dx * dx + dy * dy;
    if len2 == 0 || (side as i128) * (side as i128) > len2 as i128 {
        return false;
    }
    let along = (cx - x1) as i64 * dx + (cy - y1) as i64 * dy;
    (0..=len2).contains(&along)
}
