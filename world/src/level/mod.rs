//! The world tables, the runtime forms of the map records, and the sprite
//! arena that links sprites into per-sector and per-status chains.

pub mod builder;
pub mod flags;
pub mod map_data;
pub mod map_defs;
pub mod sprites;
