//! Build unit discovery.
//!
//! Walks a two-level `<root>/<name>/<tag>/` tree and returns the variants
//! that are complete (Dockerfile + config.json) and not end-of-life.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use kiln_common::KilnResult;

use crate::config::{CONFIG_FILE, ImageConfig};
use crate::version::VersionKey;

/// Name of the build definition file a variant must carry.
pub const BUILD_FILE: &str = "Dockerfile";

/// One buildable image variant, identified by `(name, tag)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildUnit {
    /// Image name (first-level directory).
    pub name: String,
    /// Image tag (second-level directory).
    pub tag: String,
}

impl BuildUnit {
    /// Create a unit from name and tag.
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }

    /// Build context directory for this unit under `root`.
    #[must_use]
    pub fn context_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.name).join(&self.tag)
    }

    /// Path of this unit's config file under `root`.
    #[must_use]
    pub fn config_path(&self, root: &Path) -> PathBuf {
        self.context_dir(root).join(CONFIG_FILE)
    }

    /// Canonical ordering: name ascending, then version-aware tag order.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| VersionKey::parse(&self.tag).cmp(&VersionKey::parse(&other.tag)))
    }
}

impl fmt::Display for BuildUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// Scan `root` for eligible build units.
///
/// A `(name, tag)` directory pair qualifies when it contains both a
/// `Dockerfile` and a readable `config.json` whose `end_of_life` is unset
/// or after `today`. Unreadable configs are logged and skipped; only a
/// failure to enumerate directories aborts the scan.
///
/// The result is sorted by `(name, version-aware tag)` and is a pure
/// function of the directory snapshot and `today`.
///
/// # Errors
///
/// [`kiln_common::KilnError::Io`] when `root` or one of its name
/// directories cannot be enumerated.
pub fn discover(root: &Path, today: NaiveDate) -> KilnResult<Vec<BuildUnit>> {
    let mut units = Vec::new();

    for name_entry in fs::read_dir(root)? {
        let name_entry = name_entry?;
        if !name_entry.file_type()?.is_dir() {
            continue;
        }
        let name = name_entry.file_name().to_string_lossy().into_owned();

        for tag_entry in fs::read_dir(name_entry.path())? {
            let tag_entry = tag_entry?;
            if !tag_entry.file_type()?.is_dir() {
                continue;
            }
            let tag = tag_entry.file_name().to_string_lossy().into_owned();
            let tag_dir = tag_entry.path();

            if !tag_dir.join(BUILD_FILE).exists() || !tag_dir.join(CONFIG_FILE).exists() {
                continue;
            }

            let config = match ImageConfig::from_file(&tag_dir.join(CONFIG_FILE)) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(unit = %format!("{name}:{tag}"), %err, "skipping unreadable config");
                    continue;
                }
            };

            if config.eligible(today) {
                units.push(BuildUnit::new(&name, &tag));
            } else {
                tracing::debug!(unit = %format!("{name}:{tag}"), "skipping end-of-life variant");
            }
        }
    }

    units.sort_by(BuildUnit::canonical_cmp);
    Ok(units)
}
