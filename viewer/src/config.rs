//! User configuration options.

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

use dirs::config_dir;
use log::{error, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::{CLIOptions, BASE_DIR};

const LOG_TAG: &str = "UserConfig";

fn get_cfg_file() -> io::Result<PathBuf> {
    let mut dir = config_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no user config dir"))?;
    dir.push(BASE_DIR);
    if !dir.exists() {
        create_dir_all(&dir)?;
    }
    dir.push("user.toml");
    Ok(dir)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Map loaded when none is given on the command line
    pub map: String,
    pub width: u32,
    pub height: u32,
    /// 100 looks level
    pub horizon: i32,
    /// Distance fade, higher darkens sooner
    pub visibility: i32,
    pub log_level: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            map: String::new(),
            width: 320,
            height: 200,
            horizon: 100,
            visibility: 512,
            log_level: "info".to_string(),
        }
    }
}

impl UserConfig {
    /// Read the config, writing out a default one on first run
    pub fn load() -> io::Result<Self> {
        let path = get_cfg_file()?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        let mut buf = String::new();
        if file.read_to_string(&mut buf)? == 0 {
            return UserConfig::create_default(&mut file);
        }
        match toml::from_str(&buf) {
            Ok(data) => {
                info!(target: LOG_TAG, "Loaded user config file");
                Ok(data)
            }
            Err(e) => {
                warn!(target: LOG_TAG, "Could not deserialise {:?} ({}), recreating config", path, e);
                UserConfig::create_default(&mut File::create(&path)?)
            }
        }
    }

    fn create_default(file: &mut File) -> io::Result<Self> {
        let config = UserConfig::default();
        let data = toml::to_string(&config)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        file.write_all(data.as_bytes())?;
        info!(target: LOG_TAG, "Created default user config file");
        Ok(config)
    }

    pub fn write(&self) {
        let written = get_cfg_file().and_then(|path| {
            let data = toml::to_string_pretty(self)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            File::create(path)?.write_all(data.as_bytes())
        });
        if let Err(err) = written {
            error!(target: LOG_TAG, "Could not write config: {}", err);
        }
    }

    /// The configured log level, `Info` if it doesn't parse
    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    /// Sync the CLI options and UserOptions with each other
    pub fn sync_cli(&mut self, cli: &mut CLIOptions) {
        if !cli.map.is_empty() && cli.map != self.map {
            cli.map.clone_into(&mut self.map);
        } else {
            self.map.clone_into(&mut cli.map);
        }

        if cli.width != 0 && cli.width != self.width {
            self.width = cli.width;
        } else {
            cli.width = self.width;
        }

        if cli.height != 0 && cli.height != self.height {
            self.height = cli.height;
        } else {
            cli.height = self.height;
        }

        if let Some(horiz) = cli.horiz {
            self.horizon = horiz;
        } else {
            cli.horiz = Some(self.horizon);
        }

        if let Some(level) = cli.verbose {
            self.log_level = level.to_string().to_ascii_lowercase();
        } else {
            cli.verbose = Some(self.log_level());
        }
    }
}
