//! Facilities for loading the reader's configuration file.
//!
//! The file is TOML with two optional tables: `[wiring]` (see
//! [`Wiring`]) and `[timing]` (see [`Timing`]).  A missing table takes its
//! defaults; within `[timing]`, missing keys do too.

use crate::line::{Wiring, WiringError};
use crate::rom::{Timing, TimingError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

//===========================================================================//

/// An error encountered while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML, or does not match the expected layout.
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    /// The configuration could not be rendered as TOML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// The wiring is inconsistent.
    #[error("invalid wiring: {0}")]
    Wiring(#[from] WiringError),
    /// The timing would produce invalid reads.
    #[error("invalid timing: {0}")]
    Timing(#[from] TimingError),
}

//===========================================================================//

/// The complete configuration of the reader.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Which line is connected to each pin of the chip.
    pub wiring: Wiring,
    /// The delays that make up a read cycle.
    pub timing: Timing,
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| {
            ConfigError::Io { path: path.to_path_buf(), source }
        })?;
        let config = Config::from_toml_str(&contents)?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the wiring is consistent and the timing is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wiring.validate()?;
        self.timing.check()?;
        Ok(())
    }

    /// Renders this configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

//===========================================================================//


//===========================================================================//
