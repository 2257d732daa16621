//! The fixed-size records that make up the body of a map.
//!
//! The structs mirror the version 7/8 layout field for field. Older versions
//! are widened into them on read and narrowed back on write.

use log::debug;

use crate::bytes::{ByteReader, ByteWriter};
use crate::{MapError, MapVersion};

/// Sector flag bit marking a sloped plane, shared with the runtime flags
const STAT_SLOPED: u16 = 2;
/// v6 stores slopes as `heinum >> 5` in a signed byte
const V6_SLOPE_SHIFT: u32 = 5;

/// A sector record.
///
/// Version 7/8 layout:
///
/// | Field Size | Data Type | Content            |
/// |------------|-----------|--------------------|
/// |  0x00-0x01 |    i16    | First wall         |
/// |  0x02-0x03 |    i16    | Wall count         |
/// |  0x04-0x07 |    i32    | Ceiling z          |
/// |  0x08-0x0B |    i32    | Floor z            |
/// |  0x0C-0x0D |    u16    | Ceiling stat       |
/// |  0x0E-0x0F |    u16    | Floor stat         |
/// |  0x10-0x11 |    i16    | Ceiling picnum     |
/// |  0x12-0x13 |    i16    | Ceiling heinum     |
/// |  0x14      |    i8     | Ceiling shade      |
/// |  0x15-0x17 |    u8     | Ceiling pal, x/y panning |
/// |  0x18-0x19 |    i16    | Floor picnum       |
/// |  0x1A-0x1B |    i16    | Floor heinum       |
/// |  0x1C      |    i8     | Floor shade        |
/// |  0x1D-0x1F |    u8     | Floor pal, x/y panning |
/// |  0x20      |    u8     | Visibility         |
/// |  0x21      |    u8     | Filler             |
/// |  0x22-0x27 |    i16    | lotag, hitag, extra |
///
/// Each record is 40 bytes. Version 6 packs the same data in 35 bytes with
/// byte-sized stats and slopes, version 5 in 30 bytes without slopes,
/// palettes, or visibility.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MapSector {
    pub wallptr: i16,
    pub wallnum: i16,
    pub ceiling_z: i32,
    pub floor_z: i32,
    pub ceiling_stat: u16,
    pub floor_stat: u16,
    pub ceiling_picnum: i16,
    pub ceiling_heinum: i16,
    pub ceiling_shade: i8,
    pub ceiling_pal: u8,
    pub ceiling_xpanning: u8,
    pub ceiling_ypanning: u8,
    pub floor_picnum: i16,
    pub floor_heinum: i16,
    pub floor_shade: i8,
    pub floor_pal: u8,
    pub floor_xpanning: u8,
    pub floor_ypanning: u8,
    pub visibility: u8,
    pub filler: u8,
    pub lotag: i16,
    pub hitag: i16,
    pub extra: i16,
}

impl MapSector {
    pub(crate) fn read(r: &mut ByteReader, version: MapVersion) -> Result<Self, MapError> {
        match version {
            MapVersion::V7 | MapVersion::V8 => Ok(Self {
                wallptr: r.i16()?,
                wallnum: r.i16()?,
                ceiling_z: r.i32()?,
                floor_z: r.i32()?,
                ceiling_stat: r.u16()?,
                floor_stat: r.u16()?,
                ceiling_picnum: r.i16()?,
                ceiling_heinum: r.i16()?,
                ceiling_shade: r.i8()?,
                ceiling_pal: r.u8()?,
                ceiling_xpanning: r.u8()?,
                ceiling_ypanning: r.u8()?,
                floor_picnum: r.i16()?,
                floor_heinum: r.i16()?,
                floor_shade: r.i8()?,
                floor_pal: r.u8()?,
                floor_xpanning: r.u8()?,
                floor_ypanning: r.u8()?,
                visibility: r.u8()?,
                filler: r.u8()?,
                lotag: r.i16()?,
                hitag: r.i16()?,
                extra: r.i16()?,
            }),
            MapVersion::V6 => {
                let mut s = Self {
                    wallptr: r.i16()?,
                    wallnum: r.i16()?,
                    ceiling_picnum: r.i16()?,
                    floor_picnum: r.i16()?,
                    ..Self::default()
                };
                s.ceiling_heinum = (r.i8()? as i16) << V6_SLOPE_SHIFT;
                s.floor_heinum = (r.i8()? as i16) << V6_SLOPE_SHIFT;
                s.ceiling_z = r.i32()?;
                s.floor_z = r.i32()?;
                s.ceiling_shade = r.i8()?;
                s.floor_shade = r.i8()?;
                s.ceiling_xpanning = r.u8()?;
                s.floor_xpanning = r.u8()?;
                s.ceiling_ypanning = r.u8()?;
                s.floor_ypanning = r.u8()?;
                s.ceiling_stat = r.u8()? as u16;
                s.floor_stat = r.u8()? as u16;
                s.ceiling_pal = r.u8()?;
                s.floor_pal = r.u8()?;
                s.visibility = r.u8()?;
                s.lotag = r.i16()?;
                s.hitag = r.i16()?;
                s.extra = r.i16()?;
                Ok(s)
            }
            MapVersion::V5 => {
                let mut s = Self {
                    wallptr: r.i16()?,
                    wallnum: r.i16()?,
                    ceiling_picnum: r.i16()?,
                    floor_picnum: r.i16()?,
                    ..Self::default()
                };
                s.ceiling_z = r.i32()?;
                s.floor_z = r.i32()?;
                s.ceiling_shade = r.i8()?;
                s.floor_shade = r.i8()?;
                s.ceiling_xpanning = r.u8()?;
                s.floor_xpanning = r.u8()?;
                s.ceiling_ypanning = r.u8()?;
                s.floor_ypanning = r.u8()?;
                s.ceiling_stat = r.u8()? as u16;
                s.floor_stat = r.u8()? as u16;
                s.lotag = r.i16()?;
                s.hitag = r.i16()?;
                s.extra = r.i16()?;
                Ok(s)
            }
        }
    }

    /// Check that this sector survives being written as `version`
    pub(crate) fn check_fits(&self, index: usize, version: MapVersion) -> Result<(), MapError> {
        let check = |heinum: i16, stat: u16| -> Result<(), MapError> {
            let fits = match version {
                MapVersion::V7 | MapVersion::V8 => true,
                MapVersion::V6 => (-128..=127).contains(&(heinum >> V6_SLOPE_SHIFT)),
                MapVersion::V5 => heinum == 0 && stat & STAT_SLOPED == 0,
            };
            if fits {
                Ok(())
            } else {
                Err(MapError::SlopeOutOfRange {
                    sector: index,
                    heinum,
                })
            }
        };
        check(self.ceiling_heinum, self.ceiling_stat)?;
        check(self.floor_heinum, self.floor_stat)
    }

    pub(crate) fn write(&self, w: &mut ByteWriter, version: MapVersion) {
        match version {
            MapVersion::V7 | MapVersion::V8 => {
                w.i16(self.wallptr);
                w.i16(self.wallnum);
                w.i32(self.ceiling_z);
                w.i32(self.floor_z);
                w.u16(self.ceiling_stat);
                w.u16(self.floor_stat);
                w.i16(self.ceiling_picnum);
                w.i16(self.ceiling_heinum);
                w.i8(self.ceiling_shade);
                w.u8(self.ceiling_pal);
                w.u8(self.ceiling_xpanning);
                w.u8(self.ceiling_ypanning);
                w.i16(self.floor_picnum);
                w.i16(self.floor_heinum);
                w.i8(self.floor_shade);
                w.u8(self.floor_pal);
                w.u8(self.floor_xpanning);
                w.u8(self.floor_ypanning);
                w.u8(self.visibility);
                w.u8(self.filler);
                w.i16(self.lotag);
                w.i16(self.hitag);
                w.i16(self.extra);
            }
            MapVersion::V6 => {
                if (self.ceiling_heinum | self.floor_heinum) & ((1 << V6_SLOPE_SHIFT) - 1) != 0 {
                    debug!("v6 save drops low slope bits of sector at wall {}", self.wallptr);
                }
                w.i16(self.wallptr);
                w.i16(self.wallnum);
                w.i16(self.ceiling_picnum);
                w.i16(self.floor_picnum);
                w.i8((self.ceiling_heinum >> V6_SLOPE_SHIFT) as i8);
                w.i8((self.floor_heinum >> V6_SLOPE_SHIFT) as i8);
                w.i32(self.ceiling_z);
                w.i32(self.floor_z);
                w.i8(self.ceiling_shade);
                w.i8(self.floor_shade);
                w.u8(self.ceiling_xpanning);
                w.u8(self.floor_xpanning);
                w.u8(self.ceiling_ypanning);
                w.u8(self.floor_ypanning);
                w.u8(narrow_stat(self.ceiling_stat));
                w.u8(narrow_stat(self.floor_stat));
                w.u8(self.ceiling_pal);
                w.u8(self.floor_pal);
                w.u8(self.visibility);
                w.i16(self.lotag);
                w.i16(self.hitag);
                w.i16(self.extra);
            }
            MapVersion::V5 => {
                if self.ceiling_pal != 0 || self.floor_pal != 0 || self.visibility != 0 {
                    debug!("v5 save drops palette/visibility of sector at wall {}", self.wallptr);
                }
                w.i16(self.wallptr);
                w.i16(self.wallnum);
                w.i16(self.ceiling_picnum);
                w.i16(self.floor_picnum);
                w.i32(self.ceiling_z);
                w.i32(self.floor_z);
                w.i8(self.ceiling_shade);
                w.i8(self.floor_shade);
                w.u8(self.ceiling_xpanning);
                w.u8(self.floor_xpanning);
                w.u8(self.ceiling_ypanning);
                w.u8(self.floor_ypanning);
                w.u8(narrow_stat(self.ceiling_stat));
                w.u8(narrow_stat(self.floor_stat));
                w.i16(self.lotag);
                w.i16(self.hitag);
                w.i16(self.extra);
            }
        }
    }
}

fn narrow_stat(stat: u16) -> u8 {
    if stat > u8::MAX as u16 {
        debug!("dropping high flag bits {:#x}", stat & 0xFF00);
    }
    stat as u8
}

/// A wall record.
///
/// Version 7/8 layout:
///
/// | Field Size | Data Type | Content                 |
/// |------------|-----------|-------------------------|
/// |  0x00-0x03 |    i32    | X                       |
/// |  0x04-0x07 |    i32    | Y                       |
/// |  0x08-0x09 |    i16    | Next wall in loop       |
/// |  0x0A-0x0B |    i16    | Portal partner wall, -1 |
/// |  0x0C-0x0D |    i16    | Portal sector, -1       |
/// |  0x0E-0x0F |    u16    | cstat                   |
/// |  0x10-0x11 |    i16    | picnum                  |
/// |  0x12-0x13 |    i16    | Masked picnum           |
/// |  0x14      |    i8     | shade                   |
/// |  0x15-0x19 |    u8     | pal, x/y repeat, x/y panning |
/// |  0x1A-0x1F |    i16    | lotag, hitag, extra     |
///
/// Each record is 32 bytes. Version 6 is also 32 bytes in a different
/// order, version 5 drops the palette and narrows cstat to a byte.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MapWall {
    pub x: i32,
    pub y: i32,
    pub point2: i16,
    pub nextwall: i16,
    pub nextsector: i16,
    pub cstat: u16,
    pub picnum: i16,
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

impl MapWall {
    pub(crate) fn read(r: &mut ByteReader, version: MapVersion) -> Result<Self, MapError> {
        match version {
            MapVersion::V7 | MapVersion::V8 => Ok(Self {
                x: r.i32()?,
                y: r.i32()?,
                point2: r.i16()?,
                nextwall: r.i16()?,
                nextsector: r.i16()?,
                cstat: r.u16()?,
                picnum: r.i16()?,
                overpicnum: r.i16()?,
                shade: r.i8()?,
                pal: r.u8()?,
                xrepeat: r.u8()?,
                yrepeat: r.u8()?,
                xpanning: r.u8()?,
                ypanning: r.u8()?,
                lotag: r.i16()?,
                hitag: r.i16()?,
                extra: r.i16()?,
            }),
            MapVersion::V6 => {
                let mut w = Self {
                    x: r.i32()?,
                    y: r.i32()?,
                    point2: r.i16()?,
                    ..Self::default()
                };
                w.nextsector = r.i16()?;
                w.nextwall = r.i16()?;
                w.picnum = r.i16()?;
                w.overpicnum = r.i16()?;
                w.shade = r.i8()?;
                w.pal = r.u8()?;
                w.cstat = r.i16()? as u16;
                w.xrepeat = r.u8()?;
                w.yrepeat = r.u8()?;
                w.xpanning = r.u8()?;
                w.ypanning = r.u8()?;
                w.lotag = r.i16()?;
                w.hitag = r.i16()?;
                w.extra = r.i16()?;
                Ok(w)
            }
            MapVersion::V5 => {
                let mut w = Self {
                    x: r.i32()?,
                    y: r.i32()?,
                    point2: r.i16()?,
                    ..Self::default()
                };
                w.nextsector = r.i16()?;
                w.nextwall = r.i16()?;
                w.picnum = r.i16()?;
                w.overpicnum = r.i16()?;
                w.shade = r.i8()?;
                w.xrepeat = r.u8()?;
                w.yrepeat = r.u8()?;
                w.xpanning = r.u8()?;
                w.ypanning = r.u8()?;
                w.cstat = r.u8()? as u16;
                w.lotag = r.i16()?;
                w.hitag = r.i16()?;
                w.extra = r.i16()?;
                Ok(w)
            }
        }
    }

    pub(crate) fn write(&self, w: &mut ByteWriter, version: MapVersion) {
        match version {
            MapVersion::V7 | MapVersion::V8 => {
                w.i32(self.x);
                w.i32(self.y);
                w.i16(self.point2);
                w.i16(self.nextwall);
                w.i16(self.nextsector);
                w.u16(self.cstat);
                w.i16(self.picnum);
                w.i16(self.overpicnum);
                w.i8(self.shade);
                w.u8(self.pal);
                w.u8(self.xrepeat);
                w.u8(self.yrepeat);
                w.u8(self.xpanning);
                w.u8(self.ypanning);
                w.i16(self.lotag);
                w.i16(self.hitag);
                w.i16(self.extra);
            }
            MapVersion::V6 => {
                w.i32(self.x);
                w.i32(self.y);
                w.i16(self.point2);
                w.i16(self.nextsector);
                w.i16(self.nextwall);
                w.i16(self.picnum);
                w.i16(self.overpicnum);
                w.i8(self.shade);
                w.u8(self.pal);
                w.i16(self.cstat as i16);
                w.u8(self.xrepeat);
                w.u8(self.yrepeat);
                w.u8(self.xpanning);
                w.u8(self.ypanning);
                w.i16(self.lotag);
                w.i16(self.hitag);
                w.i16(self.extra);
            }
            MapVersion::V5 => {
                if self.pal != 0 {
                    debug!("v5 save drops wall palette {}", self.pal);
                }
                w.i32(self.x);
                w.i32(self.y);
                w.i16(self.point2);
                w.i16(self.nextsector);
                w.i16(self.nextwall);
                w.i16(self.picnum);
                w.i16(self.overpicnum);
                w.i8(self.shade);
                w.u8(self.xrepeat);
                w.u8(self.yrepeat);
                w.u8(self.xpanning);
                w.u8(self.ypanning);
                w.u8(narrow_stat(self.cstat));
                w.i16(self.lotag);
                w.i16(self.hitag);
                w.i16(self.extra);
            }
        }
    }
}

/// Clip distance given to sprites from versions that don't store one
pub const DEFAULT_CLIPDIST: u8 = 32;

/// A sprite record.
///
/// Version 7/8 layout:
///
/// | Field Size | Data Type | Content                     |
/// |------------|-----------|-----------------------------|
/// |  0x00-0x0B |    i32    | X, Y, Z                     |
/// |  0x0C-0x0D |    u16    | cstat                       |
/// |  0x0E-0x0F |    i16    | picnum                      |
/// |  0x10      |    i8     | shade                       |
/// |  0x11-0x15 |    u8     | pal, clipdist, filler, x/y repeat |
/// |  0x16-0x17 |    i8     | x/y offset                  |
/// |  0x18-0x19 |    i16    | Sector                      |
/// |  0x1A-0x1B |    i16    | Status                      |
/// |  0x1C-0x1D |    i16    | Angle                       |
/// |  0x1E-0x1F |    i16    | Owner                       |
/// |  0x20-0x25 |    i16    | x/y/z velocity              |
/// |  0x26-0x2B |    i16    | lotag, hitag, extra         |
///
/// Each record is 44 bytes. Version 6 is 43 bytes, version 5 is 39 bytes
/// with no palette, clip distance, or offsets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MapSprite {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub cstat: u16,
    pub picnum: i16,
    pub shade: i8,
    pub pal: u8,
    pub clipdist: u8,
    pub filler: u8,
    pub xrepeat: u8,
    pub yrepeat: u8,
    pub xoffset: i8,
    pub yoffset: i8,
    pub sectnum: i16,
    pub statnum: i16,
    pub ang: i16,
    pub owner: i16,
    pub xvel: i16,
    pub yvel: i16,
    pub zvel: i16,
    pub lotag: i16,
    pub hitag: i16,
    pub extra: i16,
}

impl MapSprite {
    pub(crate) fn read(r: &mut ByteReader, version: MapVersion) -> Result<Self, MapError> {
        match version {
            MapVersion::V7 | MapVersion::V8 => Ok(Self {
                x: r.i32()?,
                y: r.i32()?,
                z: r.i32()?,
                cstat: r.u16()?,
                picnum: r.i16()?,
                shade: r.i8()?,
                pal: r.u8()?,
                clipdist: r.u8()?,
                filler: r.u8()?,
                xrepeat: r.u8()?,
                yrepeat: r.u8()?,
                xoffset: r.i8()?,
                yoffset: r.i8()?,
                sectnum: r.i16()?,
                statnum: r.i16()?,
                ang: r.i16()?,
                owner: r.i16()?,
                xvel: r.i16()?,
                yvel: r.i16()?,
                zvel: r.i16()?,
                lotag: r.i16()?,
                hitag: r.i16()?,
                extra: r.i16()?,
            }),
            MapVersion::V6 | MapVersion::V5 => {
                let mut s = Self {
                    x: r.i32()?,
                    y: r.i32()?,
                    z: r.i32()?,
                    clipdist: DEFAULT_CLIPDIST,
                    ..Self::default()
                };
                s.cstat = r.i16()? as u16;
                s.shade = r.i8()?;
                if version == MapVersion::V6 {
                    s.pal = r.u8()?;
                    s.clipdist = r.u8()?;
                }
                s.xrepeat = r.u8()?;
                s.yrepeat = r.u8()?;
                if version == MapVersion::V6 {
                    s.xoffset = r.i8()?;
                    s.yoffset = r.i8()?;
                }
                s.picnum = r.i16()?;
                s.ang = r.i16()?;
                s.xvel = r.i16()?;
                s.yvel = r.i16()?;
                s.zvel = r.i16()?;
                s.owner = r.i16()?;
                s.sectnum = r.i16()?;
                s.statnum = r.i16()?;
                s.lotag = r.i16()?;
                s.hitag = r.i16()?;
                s.extra = r.i16()?;
                Ok(s)
            }
        }
    }

    pub(crate) fn write(&self, w: &mut ByteWriter, version: MapVersion) {
        match version {
            MapVersion::V7 | MapVersion::V8 => {
                w.i32(self.x);
                w.i32(self.y);
                w.i32(self.z);
                w.u16(self.cstat);
                w.i16(self.picnum);
                w.i8(self.shade);
                w.u8(self.pal);
                w.u8(self.clipdist);
                w.u8(self.filler);
                w.u8(self.xrepeat);
                w.u8(self.yrepeat);
                w.i8(self.xoffset);
                w.i8(self.yoffset);
                w.i16(self.sectnum);
                w.i16(self.statnum);
                w.i16(self.ang);
                w.i16(self.owner);
                w.i16(self.xvel);
                w.i16(self.yvel);
                w.i16(self.zvel);
                w.i16(self.lotag);
                w.i16(self.hitag);
                w.i16(self.extra);
            }
            MapVersion::V6 | MapVersion::V5 => {
                if version == MapVersion::V5
                    && (self.pal != 0 || self.xoffset != 0 || self.yoffset != 0)
                {
                    debug!("v5 save drops palette/offsets of sprite at {},{}", self.x, self.y);
                }
                w.i32(self.x);
                w.i32(self.y);
                w.i32(self.z);
                w.i16(self.cstat as i16);
                w.i8(self.shade);
                if version == MapVersion::V6 {
                    w.u8(self.pal);
                    w.u8(self.clipdist);
                }
                w.u8(self.xrepeat);
                w.u8(self.yrepeat);
                if version == MapVersion::V6 {
                    w.i8(self.xoffset);
                    w.i8(self.yoffset);
                }
                w.i16(self.picnum);
                w.i16(self.ang);
                w.i16(self.xvel);
                w.i16(self.yvel);
                w.i16(self.zvel);
                w.i16(self.owner);
                w.i16(self.sectnum);
                w.i16(self.statnum);
                w.i16(self.lotag);
                w.i16(self.hitag);
                w.i16(self.extra);
            }
        }
    }
}
