//! # kiln
//!
//! Batch builder and publisher for versioned container image trees.
//!
//! Kiln scans a `<root>/<name>/<tag>/` directory layout for image build
//! definitions, filters out end-of-life variants, builds and pushes the
//! rest with the docker CLI, and publishes a JSON manifest describing
//! what was built.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod discover;
pub mod docker;
pub mod manifest;
pub mod orchestrate;
pub mod version;

pub use config::ImageConfig;
pub use discover::{BuildUnit, discover};
pub use manifest::{Manifest, ManifestEntry};
pub use orchestrate::{Outcome, run_all};
pub use version::VersionKey;
