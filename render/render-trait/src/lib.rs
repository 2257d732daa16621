//! What the renderer draws into and what it draws with.
//!
//! `PixelBuffer` is the sink: palette indices in rows of `pitch` bytes.
//! `TileProvider` is the source of pictures, shade tables, voxels and the sky
//! layout. Both come with a plain in-memory implementation.

mod tiles;

pub use tiles::{wrap, ParallaxSky, Slab, Tile, TileProvider, TileSet, VoxelModel};

/// Number of shade rows in each shade table
pub const NUM_SHADES: usize = 32;
/// Palette index that is never drawn by masked pictures
pub const TRANSPARENT_INDEX: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSize {
    width_usize: usize,
    height_usize: usize,
    width: i32,
    height: i32,
}

impl BufferSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            width_usize: width,
            height_usize: height,
            width: width as i32,
            height: height as i32,
        }
    }

    pub const fn width(&self) -> i32 {
        self.width
    }

    pub const fn height(&self) -> i32 {
        self.height
    }

    pub const fn half_width(&self) -> i32 {
        self.width / 2
    }

    pub const fn half_height(&self) -> i32 {
        self.height / 2
    }

    pub const fn width_usize(&self) -> usize {
        self.width_usize
    }

    pub const fn height_usize(&self) -> usize {
        self.height_usize
    }
}

pub trait PixelBuffer {
    fn size(&self) -> &BufferSize;
    fn clear(&mut self);
    fn clear_with_index(&mut self, index: u8);
    fn set_pixel(&mut self, x: usize, y: usize, index: u8);
    fn read_pixel(&self, x: usize, y: usize) -> u8;
    fn buf(&self) -> &[u8];
    fn buf_mut(&mut self) -> &mut [u8];
    /// The pitch that should be added/subtracted to go up or down the Y while
    /// keeping X position
    fn pitch(&self) -> usize;
    /// Get an index point for this coord
    fn get_buf_index(&self, x: usize, y: usize) -> usize;
}

/// A palette indexed frame held in memory
#[derive(Debug, Clone)]
pub struct IndexedBuffer {
    size: BufferSize,
    pitch: usize,
    buffer: Vec<u8>,
}

impl IndexedBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            size: BufferSize::new(width, height),
            pitch: width,
            buffer: vec![0; width * height],
        }
    }

    /// Rows are `pitch` bytes apart, `pitch` is at least the width
    pub fn with_pitch(width: usize, height: usize, pitch: usize) -> Self {
        let pitch = pitch.max(width);
        Self {
            size: BufferSize::new(width, height),
            pitch,
            buffer: vec![0; pitch * height],
        }
    }
}

impl PixelBuffer for IndexedBuffer {
    #[inline]
    fn size(&self) -> &BufferSize {
        &self.size
    }

    #[inline]
    fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|n| *n = 0);
    }

    #[inline]
    fn clear_with_index(&mut self, index: u8) {
        self.buffer.iter_mut().for_each(|n| *n = index);
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, index: u8) {
        if x >= self.size.width_usize || y >= self.size.height_usize {
            return;
        }
        let pos = self.get_buf_index(x, y);
        self.buffer[pos] = index;
    }

    #[inline]
    fn read_pixel(&self, x: usize, y: usize) -> u8 {
        self.buffer[self.get_buf_index(x, y)]
    }

    #[inline]
    fn buf(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    fn buf_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    #[inline]
    fn pitch(&self) -> usize {
        self.pitch
    }

    #[inline]
    fn get_buf_index(&self, x: usize, y: usize) -> usize {
        #[cfg(feature = "safety_check")]
        assert!(x < self.size.width_usize && y < self.size.height_usize);
        y * self.pitch + x
    }
}

#[cfg(test)]
mod tests {
    use crate::{IndexedBuffer, PixelBuffer};

    #[test]
    fn pixels_land_at_pitch() {
        let mut buf = IndexedBuffer::with_pitch(4, 3, 8);
        buf.set_pixel(3, 2, 9);
        assert_eq!(buf.buf()[2 * 8 + 3], 9);
        assert_eq!(buf.read_pixel(3, 2), 9);
        // Writes off the edge are dropped
        buf.set_pixel(4, 0, 1);
        assert_eq!(buf.buf().iter().filter(|&&p| p != 0).count(), 1);
        buf.clear_with_index(7);
        assert!(buf.buf().iter().all(|&p| p == 7));
    }

    #[test]
    fn size_accessors() {
        let buf = IndexedBuffer::new(320, 200);
        assert_eq!(buf.size().half_width(), 160);
        assert_eq!(buf.size().height_usize(), 200);
        assert_eq!(buf.pitch(), 320);
    }
}
