use mapfile::{MapSector, MapSprite, MapWall};
use math::{mul_scale, dmul_scale, sin, cos, ANGLE_90};

use super::flags::{SectorStat, SpriteStat, WallStat, SPRITE_ORIENTATION_MASK};
use crate::TileMetrics;

/// One of the two horizontal surfaces of a sector
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Plane {
    pub z: i32,
    pub stat: u16,
    pub picnum: i16,
    /// Slope against the sector's first wall, 4096 is 45 degrees
    pub heinum: i16,
    pub shade: i8,
    pub pal: u8,
    pub xpanning: u8,
    pub ypanning: u8,
}

impl Plane {
    #[inline]
    pub fn has(&self, flag: SectorStat) -> bool {
        self.stat & flag as u16 != 0
    }

    #[inline]
    pub fn is_parallax(&self) -> bool {
        self.has(SectorStat::Parallax)
    }

    #[inline]
    pub fn is_sloped(&self) -> bool {
        self.has(SectorStat::Sloped) && self.heinum != 0
    }
}

/// The SECTOR record, at runtime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    /// First wall of the loop
    pub wallptr: usize,
    pub wallnum: usize,
    pub ceiling: Plane,
    pub floor: Plane,
    /// Scales the distance fade, 0 is the default falloff
    pub visibility: u8,
    pub filler: u8,
    pub lotag: i16,
    pub hitag: i16,
    pub extra: i16,
}

impl Sector {
    #[inline]
    pub fn walls(&self) -> std::ops::Range<usize> {
        self.wallptr..self.wallptr + self.wallnum
    }

    pub(crate) fn from_map(s: &MapSector) -> Self {
        Self {
            wallptr: s.wallptr.max(0) as usize,
            wallnum: s.wallnum.max(0) as usize,
            ceiling: Plane {
                z: s.ceiling_z,
                stat: s.ceiling_stat,
                picnum: s.ceiling_picnum,
                heinum: s.ceiling_heinum,
                shade: s.ceiling_shade,
                pal: s.ceiling_pal,
                xpanning: s.ceiling_xpanning,
                ypanning: s.ceiling_ypanning,
            },
            floor: Plane {
                z: s.floor_z,
                stat: s.floor_stat,
                picnum: s.floor_picnum,
                heinum: s.floor_heinum,
                shade: s.floor_shade,
                pal: s.floor_pal,
                xpanning: s.floor_xpanning,
                ypanning: s.floor_ypanning,
            },
            visibility: s.visibility,
            filler: s.filler,
            lotag: s.lotag,
            hitag: s.hitag,
            extra: s.extra,
        }
    }

    pub(crate) fn to_map(&self) -> MapSector {
        MapSector {
            wallptr: self.wallptr as i16,
            wallnum: self.wallnum as i16,
            ceiling_z: self.ceiling.z,
            floor_z: self.floor.z,
            ceiling_stat: self.ceiling.stat,
            floor_stat: self.floor.stat,
            ceiling_picnum: self.ceiling.picnum,
            ceiling_heinum: self.ceiling.heinum,
            ceiling_shade: self.ceiling.shade,
            ceiling_pal: self.ceiling.pal,
            ceiling_xpanning: self.ceiling.xpanning,
            ceiling_ypanning: self.ceiling.ypanning,
            floor_picnum: self.floor.picnum,
            floor_heinum: self.floor.heinum,
            floor_shade: self.floor.shade,
            floor_pal: self.floor.pal,
            floor_xpanning: self.floor.xpanning,
            floor_ypanning: self.floor.ypanning,
            visibility: self.visibility,
            filler: self.filler,
            lotag: self.lotag,
            hitag: self.hitag,
            extra: self.extra,
        }
    }
}

/// The WALL record, at runtime. A wall runs from its own `(x, y)` to the
/// `(x, y)` of `point2`, with the sector interior on the right.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Wall {
    pub x: i32,
    pub y: i32,
    pub point2: usize,
    /// The partner wall when this wall is a portal
    pub nextwall: Option<usize>,
    pub nextsector: Option<usize>,
    pub cstat: u16,
    pub picnum: i16,
    /// Picture drawn over the opening of a masked portal
    pub overpicnum: i16,
    pub shade: i8,
    pub pal: u8,
    pub xrepeat: u8,
    pub yrepeat: u8,
    pub xpanning: u8,
    pub ypanning: u8,
    pub lotag: i16,
    pub hitag: i16,
    pub extra: i16,
}

fn opt_index(v: i16) -> Option<usize> {
    if v < 0 { None } else { Some(v as usize) }
}

fn from_index(v: Option<usize>) -> i16 {
    v.map_or(-1, |v| v as i16)
}

impl Wall {
    #[inline]
    pub fn has(&self, flag: WallStat) -> bool {
        self.cstat & flag as u16 != 0
    }

    /// Blocks whatever the `mask` bits say block, or is solid
    #[inline]
    pub fn blocks(&self, mask: u16) -> bool {
        self.nextsector.is_none() || self.cstat & mask != 0
    }

    pub(crate) fn from_map(w: &MapWall) -> Self {
        Self {
            x: w.x,
            y: w.y,
            point2: w.point2.max(0) as usize,
            nextwall: opt_index(w.nextwall),
            nextsector: opt_index(w.nextsector),
            cstat: w.cstat,
            picnum: w.picnum,
            overpicnum: w.overpicnum,
            shade: w.shade,
            pal: w.pal,
            xrepeat: w.xrepeat,
            yrepeat: w.yrepeat,
            xpanning: w.xpanning,
            ypanning: w.ypanning,
            lotag: w.lotag,
            hitag: w.hitag,
            extra: w.extra,
        }
    }

    pub(crate) fn to_map(&self) -> MapWall {
        MapWall {
            x: self.x,
            y: self.y,
            point2: self.point2 as i16,
            nextwall: from_index(self.nextwall),
            nextsector: from_index(self.nextsector),
            cstat: self.cstat,
            picnum: self.picnum,
            overpicnum: self.overpicnum,
            shade: self.shade,
            pal: self.pal,
            xrepeat: self.xrepeat,
            yrepeat: self.yrepeat,
            xpanning: self.xpanning,
            ypanning: self.ypanning,
            lotag: self.lotag,
            hitag: self.hitag,
            extra: self.extra,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpriteOrientation {
    /// Billboard, always faces the camera
    Face,
    /// A flat picture standing upright along its angle
    Wall,
    /// A flat picture lying in the horizontal plane
    Floor,
    Voxel,
}

/// The SPRITE record, at runtime. `sector` and `status` are owned by the
/// sprite arena and only change through it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub cstat: u16,
    pub picnum: i16,
    pub shade: i8,
    pub pal: u8,
    /// Collision radius in units of 4
    pub clipdist: u8,
    pub filler: u8,
    pub xrepeat: u8,
    pub yrepeat: u8,
    pub xoffset: i8,
    pub yoffset: i8,
    pub ang: i16,
    pub owner: i16,
    pub xvel: i16,
    pub yvel: i16,
    pub zvel: i16,
    pub lotag: i16,
    pub hitag: i16,
    pub extra: i16,
    pub(crate) sector: usize,
    pub(crate) status: usize,
}

impl Sprite {
    #[inline]
    pub fn sector(&self) -> usize {
        self.sector
    }

    #[inline]
    pub fn status(&self) -> usize {
        self.status
    }

    #[inline]
    pub fn has(&self, flag: SpriteStat) -> bool {
        self.cstat & flag as u16 != 0
    }

    pub fn orientation(&self) -> SpriteOrientation {
        match self.cstat & SPRITE_ORIENTATION_MASK {
            0 => SpriteOrientation::Face,
            16 => SpriteOrientation::Wall,
            32 => SpriteOrientation::Floor,
            _ => SpriteOrientation::Voxel,
        }
    }

    /// Top and bottom z of an upright sprite
    pub fn z_extent<T: TileMetrics + ?Sized>(&self, tiles: &T) -> (i32, i32) {
        let (_, height) = tiles.tile_size(self.picnum);
        let (_, yoff) = tiles.tile_offset(self.picnum);
        let k = (height * self.yrepeat as i32) << 2;
        let mut bottom = self.z;
        if self.has(SpriteStat::Centered) {
            bottom += k >> 1;
        }
        bottom -= (yoff * self.yrepeat as i32) << 2;
        (bottom - k, bottom)
    }

    /// The two ends of a wall-aligned sprite, left to right seen from its
    /// front
    pub fn wall_ends<T: TileMetrics + ?Sized>(&self, tiles: &T) -> ((i32, i32), (i32, i32)) {
        let (width, _) = tiles.tile_size(self.picnum);
        let (toff, _) = tiles.tile_offset(self.picnum);
        let mut xoff = toff + self.xoffset as i32;
        if self.has(SpriteStat::XFlip) {
            xoff = -xoff;
        }
        let ang = self.ang as i32;
        let dax = sin(ang) * self.xrepeat as i32;
        let day = -cos(ang) * self.xrepeat as i32;
        let k = (width >> 1) + xoff;
        let x1 = self.x - mul_scale(dax, k, 16);
        let y1 = self.y - mul_scale(day, k, 16);
        (
            (x1, y1),
            (x1 + mul_scale(dax, width, 16), y1 + mul_scale(day, width, 16)),
        )
    }

    /// The four corners of a floor-aligned sprite in winding order
    pub fn floor_corners<T: TileMetrics + ?Sized>(&self, tiles: &T) -> [(i32, i32); 4] {
        let (xspan, yspan) = tiles.tile_size(self.picnum);
        let (tx, ty) = tiles.tile_offset(self.picnum);
        let mut xoff = tx + self.xoffset as i32;
        let mut yoff = ty + self.yoffset as i32;
        if self.has(SpriteStat::XFlip) {
            xoff = -xoff;
        }
        if self.has(SpriteStat::YFlip) {
            yoff = -yoff;
        }
        let ang = self.ang as i32;
        let cosang = sin(ang + ANGLE_90);
        let sinang = sin(ang);
        let xrep = self.xrepeat as i32;
        let yrep = self.yrepeat as i32;

        let dax = ((xspan >> 1) + xoff) * xrep;
        let day = ((yspan >> 1) + yoff) * yrep;
        let x0 = self.x + dmul_scale(sinang, dax, cosang, day, 16);
        let y0 = self.y + dmul_scale(sinang, day, -cosang, dax, 16);
        let l = xspan * xrep;
        let x1 = x0 - mul_scale(sinang, l, 16);
        let y1 = y0 + mul_scale(cosang, l, 16);
        let l = yspan * yrep;
        let kx = -mul_scale(cosang, l, 16);
        let ky = -mul_scale(sinang, l, 16);
        [(x0, y0), (x1, y1), (x1 + kx, y1 + ky), (x0 + kx, y0 + ky)]
    }

    /// `sectnum` and `statnum` must already be known to be in range
    pub(crate) fn from_map(s: &MapSprite) -> Self {
        Self {
            x: s.x,
            y: s.y,
            z: s.z,
            cstat: s.cstat,
            picnum: s.picnum,
            shade: s.shade,
            pal: s.pal,
            clipdist: s.clipdist,
            filler: s.filler,
            xrepeat: s.xrepeat,
            yrepeat: s.yrepeat,
            xoffset: s.xoffset,
            yoffset: s.yoffset,
            ang: s.ang,
            owner: s.owner,
            xvel: s.xvel,
            yvel: s.yvel,
            zvel: s.zvel,
            lotag: s.lotag,
            hitag: s.hitag,
            extra: s.extra,
            sector: s.sectnum as usize,
            status: s.statnum as usize,
        }
    }

    pub(crate) fn to_map(&self) -> MapSprite {
        MapSprite {
            x: self.x,
            y: self.y,
            z: self.z,
            cstat: self.cstat,
            picnum: self.picnum,
            shade: self.shade,
            pal: self.pal,
            clipdist: self.clipdist,
            filler: self.filler,
            xrepeat: self.xrepeat,
            yrepeat: self.yrepeat,
            xoffset: self.xoffset,
            yoffset: self.yoffset,
            sectnum: self.sector as i16,
            statnum: self.status as i16,
            ang: self.ang,
            owner: self.owner,
            xvel: self.xvel,
            yvel: self.yvel,
            zvel: self.zvel,
            lotag: self.lotag,
            hitag: self.hitag,
            extra: self.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileTable;

    fn tiles() -> TileTable {
        let mut t = TileTable::default();
        t.set_size(1, 64, 32);
        t
    }

    #[test]
    fn upright_extent_and_centering() {
        let mut s = Sprite {
            z: 1000,
            picnum: 1,
            yrepeat: 64,
            ..Sprite::default()
        };
        // 32 texels * 64 repeat << 2 = 8192 z units tall
        assert_eq!(s.z_extent(&tiles()), (1000 - 8192, 1000));
        s.cstat |= SpriteStat::Centered as u16;
        assert_eq!(s.z_extent(&tiles()), (1000 - 4096, 1000 + 4096));
    }

    #[test]
    fn wall_sprite_is_centred_on_its_position() {
        let s = Sprite {
            x: 100,
            y: 100,
            picnum: 1,
            xrepeat: 64,
            cstat: SpriteStat::WallAligned as u16,
            ..Sprite::default()
        };
        // Angle 0 faces +x, so the picture runs along y, 64 texels * 64 / 4 wide
        let ((x1, y1), (x2, y2)) = s.wall_ends(&tiles());
        assert_eq!((x1, x2), (100, 100));
        assert_eq!(y1 - y2, 1024);
        assert_eq!(y1 + y2, 200);
    }

    #[test]
    fn floor_sprite_spans_its_tile() {
        let s = Sprite {
            picnum: 1,
            xrepeat: 64,
            yrepeat: 64,
            cstat: SpriteStat::FloorAligned as u16,
            ..Sprite::default()
        };
        let c = s.floor_corners(&tiles());
        let xs: Vec<i32> = c.iter().map(|p| p.0).collect();
        let ys: Vec<i32> = c.iter().map(|p| p.1).collect();
        let w = xs.iter().max().unwrap() - xs.iter().min().unwrap();
        let h = ys.iter().max().unwrap() - ys.iter().min().unwrap();
        assert_eq!((w, h), (512, 1024));
        assert_eq!(s.orientation(), SpriteOrientation::Floor);
    }
}
