#![forbid(unsafe_code)]

mod error;
mod sample_trigger;
mod trace;

pub use error::Error;
pub use sample_trigger::SampleTrigger;
pub use trace::Trace;

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub trace: Trace,
}

impl Config {
    /// Load configuration from a TOML file. Missing fields are filled with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Config = toml_edit::de::from_str(&text)?;
        config.normalize();
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let toml = toml_edit::ser::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    fn normalize(&mut self) {
        // Keep the first occurrence of each trigger.
        let mut seen = Vec::with_capacity(self.trace.sample_on.len());
        self.trace.sample_on.retain(|trigger| {
            if seen.contains(trigger) {
                false
            } else {
                seen.push(*trigger);
                true
            }
        });
    }
}
