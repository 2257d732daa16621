use std::str::FromStr;

use argh::FromArgs;

/// A world position given as `x,y,z`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosArg {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl FromStr for PosArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, z] = parts[..] else {
            return Err(format!("expected x,y,z, got {:?}", s));
        };
        let num = |v: &str| v.parse::<i32>().map_err(|e| format!("{:?}: {}", v, e));
        Ok(Self {
            x: num(x)?,
            y: num(y)?,
            z: num(z)?,
        })
    }
}

/// Render a sector map to an indexed frame and poke at it with queries
#[derive(Debug, Clone, FromArgs)]
pub struct CLIOptions {
    /// verbose level: off, error, warn, info, debug, trace
    #[argh(option, short = 'v')]
    pub verbose: Option<log::LevelFilter>,
    /// path to a map file, a demo map is built when none is given
    #[argh(option, default = "Default::default()")]
    pub map: String,
    /// frame width in pixels
    #[argh(option, default = "0")]
    pub width: u32,
    /// frame height in pixels
    #[argh(option, default = "0")]
    pub height: u32,
    /// camera position as x,y,z, the map's start when unset
    #[argh(option)]
    pub pos: Option<PosArg>,
    /// camera angle, 0-2047 with 512 facing +y
    #[argh(option)]
    pub angle: Option<i32>,
    /// look up or down, 100 is level
    #[argh(option)]
    pub horiz: Option<i32>,
    /// how many frames to render
    #[argh(option, default = "1")]
    pub frames: u32,
    /// write the last frame's raw palette indices here
    #[argh(option)]
    pub out: Option<String>,
    /// run clip_move, hitscan and get_zrange from the camera and log them
    #[argh(switch)]
    pub query: bool,
    /// re-save the map as this version (5-8) next to the original
    #[argh(option)]
    pub save_version: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::PosArg;

    #[test]
    fn parse_position() {
        assert_eq!(
            "1, -2,3".parse::<PosArg>(),
            Ok(PosArg { x: 1, y: -2, z: 3 })
        );
        assert!("1,2".parse::<PosArg>().is_err());
        assert!("1,b,3".parse::<PosArg>().is_err());
    }
}
