//! Per-tag image configuration.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use kiln_common::{KilnError, KilnResult};
use serde::{Deserialize, Serialize};

/// Name of the per-tag configuration file.
pub const CONFIG_FILE: &str = "config.json";

/// Configuration record stored next to each Dockerfile.
///
/// Unknown keys are tolerated; all fields are optional. A missing
/// `end_of_life` means the image variant never expires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Date after which the variant is no longer built or published.
    #[serde(default)]
    pub end_of_life: Option<NaiveDate>,

    /// Base distribution flavor (e.g. "alpine", "bookworm").
    #[serde(default)]
    pub flavor: Option<String>,

    /// Upstream base image reference.
    #[serde(default)]
    pub base: Option<String>,
}

impl ImageConfig {
    /// Read and validate a config file.
    ///
    /// # Errors
    ///
    /// [`KilnError::ConfigNotFound`] if the file is absent,
    /// [`KilnError::ConfigMalformed`] if it is not valid JSON or
    /// `end_of_life` is not a `YYYY-MM-DD` date.
    pub fn from_file(path: &Path) -> KilnResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(KilnError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(err) => return Err(KilnError::Io(err)),
        };

        serde_json::from_str(&content).map_err(|err| KilnError::ConfigMalformed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Whether the variant is still supported on `today`.
    #[must_use]
    pub fn eligible(&self, today: NaiveDate) -> bool {
        self.end_of_life.is_none_or(|eol| eol > today)
    }
}
