use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

pub const DEFAULT_DENSITY: f32 = 1.0;
/// Upper bound for the density scale; real panels stay well below this.
pub const MAX_DENSITY: f32 = 16.0;
const CONFIG_DIR_NAME: &str = ".fpsinfo";
const CONFIG_FILE_NAME: &str = "config.toml";

/// User-supplied settings loaded from the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub density: f32,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            log_level: None,
            log_file: None,
        }
    }
}

impl Config {
    pub fn load_or_default() -> Result<Self> {
        let path = config_path()?;
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Result<Self> {
        let mut cfg = Config::default();

        for (idx, line) in raw.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (key, value) = trimmed.split_once('=').ok_or_else(|| {
                Error::InvalidArgs(format!("invalid config line {}: '{}'", idx + 1, line))
            })?;

            let key = key.trim();
            let value = value.trim().trim_matches('"');
            match key {
                "density" => {
                    cfg.density = parse_density(value).ok_or_else(|| {
                        Error::InvalidArgs(format!("invalid density value on line {}", idx + 1))
                    })?;
                }
                "log_level" => cfg.log_level = Some(value.to_string()),
                "log_file" => cfg.log_file = Some(value.to_string()),
                other => {
                    return Err(Error::InvalidArgs(format!(
                        "unknown config key '{}' on line {}",
                        other,
                        idx + 1
                    )));
                }
            }
        }

        Ok(cfg)
    }
}

/// Screen density must be a positive scale factor no larger than [`MAX_DENSITY`].
pub fn parse_density(raw: &str) -> Option<f32> {
    raw.parse::<f32>()
        .ok()
        .filter(|d| *d > 0.0 && *d <= MAX_DENSITY)
}

fn config_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| Error::InvalidArgs("HOME not set; cannot locate config directory".into()))?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
