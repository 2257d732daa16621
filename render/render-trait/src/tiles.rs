use std::collections::HashMap;

use log::{debug, warn};
use world::TileMetrics;

use crate::NUM_SHADES;

/// A resident picture. Pixels are column-major: column `u` starts at
/// `u * height`.
#[derive(Debug, Clone, Copy)]
pub struct Tile<'a> {
    pub width: i32,
    pub height: i32,
    pub pixels: &'a [u8],
}

/// Wrap a texture coordinate into `[0, size)`. Power of two sizes mask,
/// anything else takes the euclidean remainder.
#[inline]
pub fn wrap(v: i32, size: i32) -> i32 {
    if size <= 0 {
        return 0;
    }
    if size & (size - 1) == 0 {
        v & (size - 1)
    } else {
        v.rem_euclid(size)
    }
}

impl<'a> Tile<'a> {
    /// A full column, `u` wraps
    #[inline]
    pub fn column(&self, u: i32) -> &'a [u8] {
        let h = self.height as usize;
        let start = wrap(u, self.width) as usize * h;
        &self.pixels[start..start + h]
    }

    #[inline]
    pub fn texel(&self, u: i32, v: i32) -> u8 {
        self.column(u)[wrap(v, self.height) as usize]
    }
}

/// One run of solid voxels in a column, top down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slab {
    pub ztop: i32,
    pub colours: Vec<u8>,
}

impl Slab {
    pub fn len(&self) -> i32 {
        self.colours.len() as i32
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }
}

/// A voxel model stored as runs of solid voxels per `(x, y)` column
#[derive(Debug, Clone)]
pub struct VoxelModel {
    pub xsize: i32,
    pub ysize: i32,
    pub zsize: i32,
    /// Rotation and placement centre, in voxels with 8 bits of fraction
    pub pivot: (i32, i32, i32),
    columns: Vec<Vec<Slab>>,
}

impl VoxelModel {
    pub fn new(xsize: i32, ysize: i32, zsize: i32) -> Self {
        let xsize = xsize.max(0);
        let ysize = ysize.max(0);
        Self {
            xsize,
            ysize,
            zsize: zsize.max(0),
            pivot: (xsize << 7, ysize << 7, zsize.max(0) << 8),
            columns: vec![Vec::new(); (xsize * ysize) as usize],
        }
    }

    /// A solid block of one colour, pivoted at its bottom centre
    pub fn solid(xsize: i32, ysize: i32, zsize: i32, colour: u8) -> Self {
        let mut model = Self::new(xsize, ysize, zsize);
        for x in 0..model.xsize {
            for y in 0..model.ysize {
                model.push_slab(
                    x,
                    y,
                    Slab {
                        ztop: 0,
                        colours: vec![colour; model.zsize as usize],
                    },
                );
            }
        }
        model
    }

    pub fn push_slab(&mut self, x: i32, y: i32, slab: Slab) {
        if x < 0 || y < 0 || x >= self.xsize || y >= self.ysize {
            warn!("voxel slab at {},{} is outside the model", x, y);
            return;
        }
        self.columns[(x * self.ysize + y) as usize].push(slab);
    }

    pub fn column(&self, x: i32, y: i32) -> &[Slab] {
        if x < 0 || y < 0 || x >= self.xsize || y >= self.ysize {
            return &[];
        }
        &self.columns[(x * self.ysize + y) as usize]
    }
}

/// How the sky is split over several tiles around the horizon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallaxSky {
    /// The circle is cut into `1 << bits` buckets
    pub bits: u32,
    /// Picnum offset per bucket, added to the plane's own picnum
    pub offsets: Vec<i16>,
}

impl Default for ParallaxSky {
    fn default() -> Self {
        Self {
            bits: 0,
            offsets: vec![0],
        }
    }
}

impl ParallaxSky {
    /// Bucket offset and the angle inside the bucket for a view angle
    pub fn bucket(&self, ang: i32) -> (i16, i32) {
        let bits = self.bits.min(11);
        let ang = ang & 2047;
        let idx = (ang >> (11 - bits)) as usize;
        let off = self.offsets.get(idx).copied().unwrap_or(0);
        (off, ang & ((2048 >> bits) - 1))
    }

    /// Angle units covered by one bucket
    pub fn bucket_span(&self) -> i32 {
        2048 >> self.bits.min(11)
    }
}

/// The picture source the renderer pulls from. The renderer asks for a tile
/// to be loaded before it reads it and never asks for one to go away.
pub trait TileProvider: TileMetrics {
    /// Make `picnum` resident. False when there is no such tile.
    fn load(&mut self, picnum: i16) -> bool;

    fn is_resident(&self, picnum: i16) -> bool;

    /// `None` until the tile is loaded
    fn tile(&self, picnum: i16) -> Option<Tile<'_>>;

    /// `NUM_SHADES` rows of 256 palette indices
    fn shade_table(&self, pal: u8) -> &[u8];

    /// 256 x 256 blend table indexed `(src << 8) | dst`
    fn translucency(&self) -> Option<&[u8]>;

    fn voxel(&self, picnum: i16) -> Option<&VoxelModel>;

    fn parallax(&self) -> &ParallaxSky;
}

#[derive(Debug, Clone)]
struct Picture {
    width: i32,
    height: i32,
    offset: (i32, i32),
    pixels: Vec<u8>,
}

/// Every tile held in memory, made resident on first `load`
#[derive(Debug, Clone)]
pub struct TileSet {
    pictures: Vec<Option<Picture>>,
    resident: Vec<bool>,
    shades: Vec<Vec<u8>>,
    translucency: Option<Vec<u8>>,
    voxels: HashMap<i16, VoxelModel>,
    sky: ParallaxSky,
    loads: usize,
}

impl Default for TileSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Every shade maps a colour to itself
fn flat_shades() -> Vec<u8> {
    let mut table = Vec::with_capacity(NUM_SHADES * 256);
    for _ in 0..NUM_SHADES {
        table.extend(0..=255u8);
    }
    table
}

impl TileSet {
    pub fn new() -> Self {
        Self {
            pictures: Vec::new(),
            resident: Vec::new(),
            shades: vec![flat_shades()],
            translucency: None,
            voxels: HashMap::new(),
            sky: ParallaxSky::default(),
            loads: 0,
        }
    }

    /// A shade table for a palette laid out as a single dark to light ramp
    pub fn ramp_shades() -> Vec<u8> {
        let mut table = Vec::with_capacity(NUM_SHADES * 256);
        for shade in 0..NUM_SHADES as u32 {
            let keep = NUM_SHADES as u32 - shade;
            table.extend((0..256u32).map(|c| (c * keep / NUM_SHADES as u32) as u8));
        }
        table
    }

    /// Add or replace a picture. `pixels` is column-major and is padded or
    /// cut to `width * height`.
    pub fn insert(&mut self, picnum: i16, width: i32, height: i32, mut pixels: Vec<u8>) {
        if picnum < 0 || width <= 0 || height <= 0 {
            warn!("ignoring tile {} of size {}x{}", picnum, width, height);
            return;
        }
        let len = (width * height) as usize;
        if pixels.len() != len {
            warn!("tile {} has {} pixels, expected {}", picnum, pixels.len(), len);
            pixels.resize(len, 0);
        }
        let idx = picnum as usize;
        if self.pictures.len() <= idx {
            self.pictures.resize(idx + 1, None);
            self.resident.resize(idx + 1, false);
        }
        self.pictures[idx] = Some(Picture {
            width,
            height,
            offset: (0, 0),
            pixels,
        });
        self.resident[idx] = false;
    }

    /// A picture of one colour
    pub fn solid(&mut self, picnum: i16, width: i32, height: i32, colour: u8) {
        self.insert(picnum, width, height, vec![colour; (width.max(0) * height.max(0)) as usize]);
    }

    pub fn set_offset(&mut self, picnum: i16, x: i32, y: i32) {
        if let Some(Some(p)) = self.picture_slot(picnum) {
            p.offset = (x, y);
        }
    }

    /// Replace the shade table of `pal`. Other palettes fall back to palette
    /// 0's table.
    pub fn set_shade_table(&mut self, pal: u8, table: Vec<u8>) {
        if table.len() != NUM_SHADES * 256 {
            warn!("shade table for palette {} has the wrong size {}", pal, table.len());
            return;
        }
        let idx = pal as usize;
        if self.shades.len() <= idx {
            self.shades.resize(idx + 1, Vec::new());
        }
        self.shades[idx] = table;
    }

    pub fn set_translucency(&mut self, table: Vec<u8>) {
        if table.len() != 256 * 256 {
            warn!("translucency table has the wrong size {}", table.len());
            return;
        }
        self.translucency = Some(table);
    }

    pub fn set_voxel(&mut self, picnum: i16, model: VoxelModel) {
        self.voxels.insert(picnum, model);
    }

    pub fn set_parallax(&mut self, sky: ParallaxSky) {
        self.sky = sky;
    }

    /// How many tiles have been made resident
    pub fn loads(&self) -> usize {
        self.loads
    }

    fn picture_slot(&mut self, picnum: i16) -> Option<&mut Option<Picture>> {
        if picnum < 0 {
            return None;
        }
        self.pictures.get_mut(picnum as usize)
    }

    fn picture(&self, picnum: i16) -> Option<&Picture> {
        if picnum < 0 {
            return None;
        }
        self.pictures.get(picnum as usize)?.as_ref()
    }
}

impl TileMetrics for TileSet {
    fn tile_size(&self, picnum: i16) -> (i32, i32) {
        self.picture(picnum).map_or((0, 0), |p| (p.width, p.height))
    }

    fn tile_offset(&self, picnum: i16) -> (i32, i32) {
        self.picture(picnum).map_or((0, 0), |p| p.offset)
    }
}

impl TileProvider for TileSet {
    fn load(&mut self, picnum: i16) -> bool {
        if self.picture(picnum).is_none() {
            return false;
        }
        let idx = picnum as usize;
        if !self.resident[idx] {
            self.resident[idx] = true;
            self.loads += 1;
            debug!("tile {} resident", picnum);
        }
        true
    }

    fn is_resident(&self, picnum: i16) -> bool {
        picnum >= 0 && self.resident.get(picnum as usize).copied().unwrap_or(false)
    }

    fn tile(&self, picnum: i16) -> Option<Tile<'_>> {
        if !self.is_resident(picnum) {
            return None;
        }
        self.picture(picnum).map(|p| Tile {
            width: p.width,
            height: p.height,
            pixels: &p.pixels,
        })
    }

    fn shade_table(&self, pal: u8) -> &[u8] {
        match self.shades.get(pal as usize) {
            Some(t) if !t.is_empty() => t,
            _ => &self.shades[0],
        }
    }

    fn translucency(&self) -> Option<&[u8]> {
        self.translucency.as_deref()
    }

    fn voxel(&self, picnum: i16) -> Option<&VoxelModel> {
        self.voxels.get(&picnum)
    }

    fn parallax(&self) -> &ParallaxSky {
        &self.sky
    }
}

#[cfg(test)]
mod tests {
    use super::{wrap, ParallaxSky, Slab, TileProvider, TileSet, VoxelModel};
    use crate::NUM_SHADES;
    use world::TileMetrics;

    #[test]
    fn wrap_masks_or_wraps() {
        assert_eq!(wrap(70, 64), 6);
        assert_eq!(wrap(-1, 64), 63);
        assert_eq!(wrap(70, 48), 22);
        assert_eq!(wrap(-1, 48), 47);
        assert_eq!(wrap(5, 0), 0);
    }

    #[test]
    fn tiles_need_loading() {
        let mut set = TileSet::new();
        // Two columns of two pixels
        set.insert(3, 2, 2, vec![1, 2, 3, 4]);
        assert_eq!(set.tile_size(3), (2, 2));
        assert!(set.tile(3).is_none());
        assert!(!set.load(4));
        assert!(set.load(3));
        assert!(set.load(3));
        assert_eq!(set.loads(), 1);
        let tile = set.tile(3).unwrap();
        assert_eq!(tile.column(1), &[3, 4]);
        assert_eq!(tile.texel(2, 3), 2);
    }

    #[test]
    fn shade_tables() {
        let mut set = TileSet::new();
        assert_eq!(set.shade_table(0)[5 * 256 + 77], 77);
        set.set_shade_table(2, TileSet::ramp_shades());
        assert_eq!(set.shade_table(2)[200], 200);
        assert_eq!(set.shade_table(2)[(NUM_SHADES / 2) * 256 + 200], 100);
        // Unknown palettes use the first table
        assert_eq!(set.shade_table(9)[256 + 9], 9);
        set.set_shade_table(3, vec![0; 10]);
        assert_eq!(set.shade_table(3)[256 + 9], 9);
    }

    #[test]
    fn sky_buckets() {
        let sky = ParallaxSky {
            bits: 2,
            offsets: vec![0, 1, 2, 3],
        };
        assert_eq!(sky.bucket(0), (0, 0));
        assert_eq!(sky.bucket(600), (1, 88));
        assert_eq!(sky.bucket(2047), (3, 511));
        assert_eq!(sky.bucket_span(), 512);
    }

    #[test]
    fn voxel_columns() {
        let mut model = VoxelModel::solid(2, 3, 4, 9);
        assert_eq!(model.column(1, 2).len(), 1);
        assert_eq!(model.column(1, 2)[0].len(), 4);
        assert!(model.column(2, 0).is_empty());
        model.push_slab(
            0,
            0,
            Slab {
                ztop: 6,
                colours: vec![1],
            },
        );
        assert_eq!(model.column(0, 0).len(), 2);
        assert_eq!(model.pivot, (256, 384, 1024));
    }
}
