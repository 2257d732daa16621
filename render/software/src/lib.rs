//! A column based software renderer for sector/portal worlds.
//!
//! Sectors are walked out from the camera's sector through portal walls.
//! Walls that face the camera are projected to screen spans and chained into
//! bunches, and the bunches are drawn nearest first against a per column
//! occlusion buffer. Sprites and masked walls go last, clipped by the wall
//! silhouettes left behind.

#![allow(clippy::too_many_arguments)]

mod bsp;
mod defs;
mod planes;
mod portals;
mod segs;
#[cfg(test)]
mod tests;
mod things;
mod utilities;

use std::error::Error;
use std::fmt;

pub use bsp::SoftwareRenderer;
pub use defs::{Camera, RenderStats, VisibleWall, MAX_SPRITES_ON_SCREEN, NEAR_PLANE};
pub use portals::{OcclusionBuffer, SectorQueue};
pub use utilities::DEFAULT_VISIBILITY;

use defs::{
    Bunch, MaskedWall, SmostRecord, VisSprite, WallScan, MAX_BUNCHES, MAX_MASKED_WALLS,
    MAX_SCANS, MAX_SMOST_RECORDS, SMOST_COLUMNS_PER_X,
};
use things::SpriteScratch;

/// Room for horizon crossing in the sloped plane depth table
const SLOPE_SLACK: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Per frame scratch ran out
    Capacity { what: &'static str, max: usize },
    /// The pixel buffer isn't the size the renderer was made for
    BufferSize { width: i32, height: i32 },
}

impl Error for RenderError {}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Capacity { what, max } => {
                write!(f, "render capacity exceeded: more than {} {}", max, what)
            }
            RenderError::BufferSize { width, height } => {
                write!(f, "renderer expects a {}x{} buffer", width, height)
            }
        }
    }
}

/// Scratch for one frame. Sized once, cleared between frames.
pub struct RenderData {
    pub(crate) occlusion: OcclusionBuffer,
    pub(crate) scans: Vec<WallScan>,
    pub(crate) bunches: Vec<Bunch>,
    pub(crate) bunch_tested: Vec<bool>,
    pub(crate) smost: Vec<SmostRecord>,
    /// Saved column bounds of smost records and masked walls
    pub(crate) smost_pool: Vec<i32>,
    smost_limit: usize,
    pub(crate) masked: Vec<MaskedWall>,
    pub(crate) sprites: Vec<VisSprite>,
    pub(crate) sprite_done: Vec<bool>,
    pub(crate) visible: Vec<VisibleWall>,
    // Per column, for the scan being drawn
    pub(crate) col_t: Vec<i64>,
    pub(crate) col_depth: Vec<i64>,
    pub(crate) ceil_y: Vec<i32>,
    pub(crate) floor_y: Vec<i32>,
    pub(crate) next_ceil_y: Vec<i32>,
    pub(crate) next_floor_y: Vec<i32>,
    pub(crate) plane_top: Vec<i32>,
    pub(crate) plane_bot: Vec<i32>,
    /// Row spans `(y, x1, x2)` out of the span converter
    pub(crate) spans: Vec<(i32, i32, i32)>,
    pub(crate) span_start: Vec<i32>,
    /// Shade by depth bucket for sloped planes
    pub(crate) slope_shade: Vec<u8>,
    // Per column clip of the sprite being drawn
    pub(crate) clip_top: Vec<i32>,
    pub(crate) clip_bot: Vec<i32>,
    pub(crate) sprite_scratch: SpriteScratch,
}

impl RenderData {
    pub fn new(screen_width: usize, screen_height: usize) -> Self {
        Self {
            occlusion: OcclusionBuffer::new(screen_width, screen_height),
            scans: Vec::with_capacity(MAX_SCANS),
            bunches: Vec::with_capacity(MAX_BUNCHES),
            bunch_tested: vec![false; MAX_BUNCHES],
            smost: Vec::with_capacity(MAX_SMOST_RECORDS),
            smost_pool: Vec::with_capacity(screen_width * SMOST_COLUMNS_PER_X),
            smost_limit: screen_width * SMOST_COLUMNS_PER_X,
            masked: Vec::with_capacity(MAX_MASKED_WALLS),
            sprites: Vec::with_capacity(MAX_SPRITES_ON_SCREEN),
            sprite_done: vec![false; MAX_SPRITES_ON_SCREEN],
            visible: Vec::with_capacity(MAX_SCANS),
            col_t: vec![0; screen_width],
            col_depth: vec![0; screen_width],
            ceil_y: vec![0; screen_width],
            floor_y: vec![0; screen_width],
            next_ceil_y: vec![0; screen_width],
            next_floor_y: vec![0; screen_width],
            plane_top: vec![0; screen_width],
            plane_bot: vec![0; screen_width],
            spans: Vec::with_capacity(screen_height * 4),
            span_start: vec![0; screen_height],
            slope_shade: vec![0; screen_height + SLOPE_SLACK],
            clip_top: vec![0; screen_width],
            clip_bot: vec![0; screen_width],
            // A quad clipped by five edges gains at most five corners
            sprite_scratch: SpriteScratch::with_capacity(16, 64 * 64),
        }
    }

    pub fn clear_data(&mut self) {
        self.occlusion.clear();
        self.scans.clear();
        self.bunches.clear();
        self.smost.clear();
        self.smost_pool.clear();
        self.masked.clear();
        self.sprites.clear();
        self.visible.clear();
        self.sprite_scratch.clear();
    }

    /// Copy the current top (`upper`) or bottom bounds of columns
    /// `x1..x2` into the smost pool, returning where they start
    pub(crate) fn save_occlusion(
        &mut self,
        x1: i32,
        x2: i32,
        upper: bool,
    ) -> Result<usize, RenderError> {
        let (x1, x2) = (x1.max(0) as usize, x2.max(0) as usize);
        let start = self.smost_pool.len();
        if x1 >= x2 {
            return Ok(start);
        }
        if start + (x2 - x1) > self.smost_limit {
            return Err(RenderError::Capacity {
                what: "saved wall columns",
                max: self.smost_limit,
            });
        }
        let bounds = if upper {
            self.occlusion.umost()
        } else {
            self.occlusion.dmost()
        };
        self.smost_pool.extend_from_slice(&bounds[x1..x2]);
        Ok(start)
    }

    pub(crate) fn push_smost(&mut self, record: SmostRecord) -> Result<(), RenderError> {
        if self.smost.len() >= MAX_SMOST_RECORDS {
            return Err(RenderError::Capacity {
                what: "wall silhouettes",
                max: MAX_SMOST_RECORDS,
            });
        }
        self.smost.push(record);
        Ok(())
    }

    pub(crate) fn push_masked(&mut self, wall: MaskedWall) -> Result<(), RenderError> {
        if self.masked.len() >= MAX_MASKED_WALLS {
            return Err(RenderError::Capacity {
                what: "masked walls",
                max: MAX_MASKED_WALLS,
            });
        }
        self.masked.push(wall);
        Ok(())
    }
}
