use std::error::Error;
use std::{fmt, io};

/// Everything that can go wrong reading or writing a map. A failed load never
/// hands back a partially filled `MapFile`.
#[derive(Debug)]
pub enum MapError {
    Io(io::Error),
    /// The header carries a version this crate doesn't know
    UnsupportedVersion(i32),
    /// Ran out of bytes while reading `what` at `offset`
    Truncated { what: &'static str, offset: usize },
    /// A record count is over the limit of the target version
    TooMany {
        what: &'static str,
        count: usize,
        max: usize,
    },
    /// A sector slope can't be stored in the target version
    SlopeOutOfRange { sector: usize, heinum: i16 },
}

impl Error for MapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MapError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io(e) => write!(f, "map io error: {}", e),
            MapError::UnsupportedVersion(v) => write!(f, "unsupported map version {}", v),
            MapError::Truncated { what, offset } => {
                write!(f, "map data truncated reading {} at offset {}", what, offset)
            }
            MapError::TooMany { what, count, max } => {
                write!(f, "too many {}: {} (max {})", what, count, max)
            }
            MapError::SlopeOutOfRange { sector, heinum } => {
                write!(f, "sector {} slope {} doesn't fit the target version", sector, heinum)
            }
        }
    }
}

impl From<io::Error> for MapError {
    fn from(e: io::Error) -> Self {
        MapError::Io(e)
    }
}
