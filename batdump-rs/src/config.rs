//! Configuration file handling.
//!
//! Settings come from three places, highest precedence first: command line
//! flags, the TOML config file, built-in defaults.
//!
//! ```toml
//! [stream]
//! pid = 3002
//! verify_crc = true
//! strict_sync = false
//! buffer_size = 1048576
//!
//! [output]
//! pretty = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BatdumpError;
use crate::extractor::ExtractorConfig;
use crate::ts_analyzer::MAX_PID;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "batdump.toml";

/// Configuration file format.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub stream: StreamSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Deserialize, Default)]
pub struct StreamSection {
    pub pid: Option<u16>,
    pub verify_crc: Option<bool>,
    pub strict_sync: Option<bool>,
    pub buffer_size: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OutputSection {
    pub pretty: Option<bool>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub pid: Option<u16>,
    pub pretty: bool,
    pub strict_sync: bool,
    pub no_crc: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub extractor: ExtractorConfig,
    pub pretty: bool,
}

impl Settings {
    /// Merge command line overrides over the config file.
    pub fn resolve(file: &ConfigFile, overrides: &Overrides) -> Result<Self, BatdumpError> {
        let mut extractor = ExtractorConfig::default();

        if let Some(pid) = overrides.pid.or(file.stream.pid) {
            if pid > MAX_PID {
                return Err(BatdumpError::InvalidPid(pid));
            }
            extractor.pid = pid;
        }
        if let Some(verify_crc) = file.stream.verify_crc {
            extractor.reassembler.verify_crc = verify_crc;
        }
        if overrides.no_crc {
            extractor.reassembler.verify_crc = false;
        }
        if let Some(buffer_size) = file.stream.buffer_size {
            extractor.buffer_size = buffer_size;
        }
        extractor.strict_sync = overrides.strict_sync || file.stream.strict_sync.unwrap_or(false);

        Ok(Settings {
            extractor,
            pretty: overrides.pretty || file.output.pretty.unwrap_or(false),
        })
    }
}

/// Parse a config file from its contents.
pub fn parse_config(path: &Path, contents: &str) -> Result<ConfigFile, BatdumpError> {
    toml::from_str(contents).map_err(|source| BatdumpError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a config file.
pub fn load_config(path: &Path) -> Result<ConfigFile, BatdumpError> {
    let contents = std::fs::read_to_string(path).map_err(|source| BatdumpError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(path, &contents)
}

/// Pick the config file to load: explicit path > auto-detect > none.
pub fn find_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    find_config_in(explicit, Path::new(""))
}

/// Same as [`find_config`], auto-detecting in `dir`.
pub fn find_config_in(explicit: Option<PathBuf>, dir: &Path) -> Option<PathBuf> {
    explicit.or_else(|| {
        let default_path = dir.join(DEFAULT_CONFIG_FILE);
        default_path.exists().then_some(default_path)
    })
}
