//! Published-image manifest.
//!
//! The build pass records every successfully built variant, together with
//! its config metadata, in a single `manifest.json` inside the site
//! directory. The push pass reads that manifest back to recover exactly
//! the set of images worth pushing; when the manifest is missing or
//! unreadable it degrades to a fresh discovery scan.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use kiln_common::{KilnError, KilnResult};
use serde::{Deserialize, Serialize};

use crate::config::{CONFIG_FILE, ImageConfig};
use crate::discover::{BuildUnit, discover};
use crate::orchestrate::Outcome;

/// Manifest file name inside the site directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File holding the site hostname, one line, GitHub Pages style.
pub const DOMAIN_FILE: &str = "CNAME";

/// Hostname used when no domain file is present.
pub const DEFAULT_DOMAIN: &str = "images.kiln.dev";

/// Path segment under which per-image configs are served.
const IMAGES_SEGMENT: &str = "images";

/// Manifest entry for one published image variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// URL of the hosted copy of this variant's config.
    pub config: String,
    /// End-of-life date carried over from the config.
    pub end_of_life: Option<NaiveDate>,
    /// Flavor carried over from the config.
    pub flavor: Option<String>,
    /// Base image carried over from the config.
    pub base: Option<String>,
}

/// Two-level record of published images: namespaced name -> tag -> entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, BTreeMap<String, ManifestEntry>>);

impl Manifest {
    /// Record an entry under `name` (already namespaced) and `tag`.
    pub fn insert(&mut self, name: String, tag: String, entry: ManifestEntry) {
        self.0.entry(name).or_default().insert(tag, entry);
    }

    /// Total number of recorded variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// Whether the manifest records nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten into build units, stripping `namespace/` from name keys.
    #[must_use]
    pub fn units(&self, namespace: &str) -> Vec<BuildUnit> {
        let prefix = format!("{namespace}/");
        self.0
            .iter()
            .flat_map(|(name, tags)| {
                let name = name.strip_prefix(&prefix).unwrap_or(name);
                tags.keys().map(move |tag| BuildUnit::new(name, tag))
            })
            .collect()
    }

    /// Parse a manifest file.
    ///
    /// # Errors
    ///
    /// [`KilnError::Io`] when the file cannot be read,
    /// [`KilnError::ConfigMalformed`] when it is not valid manifest JSON.
    pub fn from_file(path: &Path) -> KilnResult<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|err| KilnError::ConfigMalformed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}

/// Build and persist the manifest for a finished build pass.
///
/// Only successful outcomes are recorded. Each recorded variant's raw
/// `config.json` is also copied into `{site}/images/{name}/{tag}/` so the
/// hosted site serves the same file the manifest links to. The manifest
/// fully replaces any previous one.
///
/// Variants whose config cannot be re-read are omitted with a warning.
///
/// # Errors
///
/// [`KilnError::EmptyManifest`] when nothing was built successfully (or
/// every successful variant had to be omitted); nothing is written in
/// that case. [`KilnError::Persist`] when writing the manifest or
/// copying a config fails.
pub fn publish(
    outcomes: &[Outcome],
    root: &Path,
    site: &Path,
    namespace: &str,
) -> KilnResult<Manifest> {
    let successful = outcomes.iter().filter(|o| o.success).map(|o| &o.unit);

    let domain = read_domain(site);
    let mut manifest = Manifest::default();
    let mut included = Vec::new();

    for unit in successful {
        let config = match ImageConfig::from_file(&unit.config_path(root)) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(unit = %unit, %err, "omitting variant from manifest");
                continue;
            }
        };

        let entry = ManifestEntry {
            config: config_url(&domain, unit),
            end_of_life: config.end_of_life,
            flavor: config.flavor,
            base: config.base,
        };
        manifest.insert(format!("{namespace}/{}", unit.name), unit.tag.clone(), entry);
        included.push(unit);
    }

    if manifest.is_empty() {
        return Err(KilnError::EmptyManifest);
    }

    let manifest_path = site.join(MANIFEST_FILE);
    let body = serde_json::to_vec_pretty(&manifest).map_err(|err| KilnError::Persist {
        path: manifest_path.clone(),
        source: std::io::Error::other(err),
    })?;
    write_persistent(&manifest_path, &body)?;

    for unit in included {
        let dest_dir = site
            .join(IMAGES_SEGMENT)
            .join(&unit.name)
            .join(&unit.tag);
        fs::create_dir_all(&dest_dir).map_err(|err| KilnError::Persist {
            path: dest_dir.clone(),
            source: err,
        })?;
        let dest = dest_dir.join(CONFIG_FILE);
        fs::copy(unit.config_path(root), &dest).map_err(|err| KilnError::Persist {
            path: dest,
            source: err,
        })?;
    }

    tracing::info!(
        path = %manifest_path.display(),
        images = manifest.len(),
        "manifest published"
    );
    Ok(manifest)
}

/// Recover the units recorded by a previous build pass.
///
/// When the manifest is missing or unparseable this falls back to a live
/// [`discover`] scan, so a push can run standalone. The flattened list is
/// re-sorted by the canonical `(name, version-aware tag)` rule rather
/// than trusting map iteration order.
///
/// # Errors
///
/// Only the discovery fallback can fail, with its own errors.
pub fn load_units(
    path: &Path,
    root: &Path,
    today: NaiveDate,
    namespace: &str,
) -> KilnResult<Vec<BuildUnit>> {
    let manifest = match Manifest::from_file(path) {
        Ok(manifest) => manifest,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                %err,
                "manifest unavailable, falling back to discovery"
            );
            return discover(root, today);
        }
    };

    let mut units = manifest.units(namespace);
    units.sort_by(BuildUnit::canonical_cmp);
    Ok(units)
}

/// Read the site hostname from the domain file, falling back to
/// [`DEFAULT_DOMAIN`].
fn read_domain(site: &Path) -> String {
    fs::read_to_string(site.join(DOMAIN_FILE))
        .ok()
        .and_then(|content| {
            let line = content.lines().next()?.trim();
            (!line.is_empty()).then(|| line.to_string())
        })
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string())
}

/// Hosted config URL for one variant.
fn config_url(domain: &str, unit: &BuildUnit) -> String {
    format!(
        "https://{domain}/{IMAGES_SEGMENT}/{}/{}/{CONFIG_FILE}",
        unit.name, unit.tag
    )
}

fn write_persistent(path: &Path, body: &[u8]) -> KilnResult<()> {
    fs::write(path, body).map_err(|err| KilnError::Persist {
        path: path.to_path_buf(),
        source: err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, tag: &str, success: bool) -> Outcome {
        Outcome {
            unit: BuildUnit::new(name, tag),
            success,
            message: String::new(),
        }
    }

    fn add_variant(root: &Path, name: &str, tag: &str, config: &str) {
        let dir = root.join(name).join(tag);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONFIG_FILE), config).unwrap();
    }

    #[test]
    fn empty_successful_set_writes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let site = temp.path().join("site");
        fs::create_dir_all(&site).unwrap();

        let outcomes = vec![outcome("app", "1.0", false)];
        let err = publish(&outcomes, temp.path(), &site, "kilnhq").unwrap_err();

        assert!(matches!(err, KilnError::EmptyManifest));
        assert!(!site.join(MANIFEST_FILE).exists());
    }

    #[test]
    fn unreadable_config_omits_only_that_variant() {
        let temp = tempfile::tempdir().unwrap();
        let site = temp.path().join("site");
        fs::create_dir_all(&site).unwrap();
        add_variant(temp.path(), "app", "1.0", r#"{"flavor": "alpine"}"#);
        // app:2.0 succeeded but has no config on disk anymore.

        let outcomes = vec![outcome("app", "1.0", true), outcome("app", "2.0", true)];
        let manifest = publish(&outcomes, temp.path(), &site, "kilnhq").unwrap();

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.units("kilnhq"), vec![BuildUnit::new("app", "1.0")]);
    }

    #[test]
    fn entries_link_to_domain_hosted_configs() {
        let temp = tempfile::tempdir().unwrap();
        let site = temp.path().join("site");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join(DOMAIN_FILE), "images.example.org\n").unwrap();
        add_variant(temp.path(), "app", "1.0", r#"{"base": "alpine:3.19"}"#);

        let outcomes = vec![outcome("app", "1.0", true)];
        let manifest = publish(&outcomes, temp.path(), &site, "kilnhq").unwrap();

        let written = Manifest::from_file(&site.join(MANIFEST_FILE)).unwrap();
        assert_eq!(written, manifest);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(site.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(
            json["kilnhq/app"]["1.0"]["config"],
            "https://images.example.org/images/app/1.0/config.json"
        );
        assert_eq!(json["kilnhq/app"]["1.0"]["base"], "alpine:3.19");

        // Raw config copied into the site tree.
        let copied = site.join("images").join("app").join("1.0").join(CONFIG_FILE);
        assert!(copied.exists());
    }

    #[test]
    fn missing_domain_file_uses_fallback_host() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(read_domain(temp.path()), DEFAULT_DOMAIN);

        fs::write(temp.path().join(DOMAIN_FILE), "\n").unwrap();
        assert_eq!(read_domain(temp.path()), DEFAULT_DOMAIN);

        fs::write(temp.path().join(DOMAIN_FILE), "  host.example \n").unwrap();
        assert_eq!(read_domain(temp.path()), "host.example");
    }

    #[test]
    fn load_units_resorts_canonically() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(MANIFEST_FILE);

        let mut manifest = Manifest::default();
        for tag in ["latest", "1.9", "1.10"] {
            manifest.insert(
                "kilnhq/app".to_string(),
                tag.to_string(),
                ManifestEntry {
                    config: String::new(),
                    end_of_life: None,
                    flavor: None,
                    base: None,
                },
            );
        }
        fs::write(&path, serde_json::to_vec_pretty(&manifest).unwrap()).unwrap();

        let today = "2024-01-01".parse().unwrap();
        let units = load_units(&path, temp.path(), today, "kilnhq").unwrap();
        assert_eq!(
            units,
            vec![
                BuildUnit::new("app", "1.9"),
                BuildUnit::new("app", "1.10"),
                BuildUnit::new("app", "latest"),
            ]
        );
    }

    #[test]
    fn missing_manifest_falls_back_to_discovery() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("app").join("1.0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(crate::discover::BUILD_FILE), "FROM scratch\n").unwrap();
        fs::write(dir.join(CONFIG_FILE), "{}").unwrap();

        let today = "2024-01-01".parse().unwrap();
        let units = load_units(&temp.path().join(MANIFEST_FILE), temp.path(), today, "kilnhq")
            .unwrap();
        assert_eq!(units, vec![BuildUnit::new("app", "1.0")]);
    }
}
