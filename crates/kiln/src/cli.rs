//! Kiln CLI.

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};

use crate::discover::{BuildUnit, discover};
use crate::manifest::MANIFEST_FILE;
use crate::orchestrate::run_all;
use crate::{docker, manifest};

/// Kiln - batch builder and publisher for versioned image trees
#[derive(Parser)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Kiln commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List the eligible build configurations under the root
    List {
        /// Image tree root (<root>/<name>/<tag>/)
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Build every eligible image and publish the manifest
    Build {
        /// Image tree root (<root>/<name>/<tag>/)
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Registry namespace images are tagged under
        #[arg(long, env = "KILN_NAMESPACE", default_value = "kilnhq")]
        namespace: String,

        /// Site output directory (manifest + hosted config copies)
        #[arg(long, default_value = "site")]
        site: PathBuf,

        /// Build only, do not write the manifest
        #[arg(long)]
        skip_manifest: bool,
    },

    /// Push previously built images recorded in the manifest
    Push {
        /// Image tree root, used when the manifest is missing
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Registry namespace images are tagged under
        #[arg(long, env = "KILN_NAMESPACE", default_value = "kilnhq")]
        namespace: String,

        /// Site directory holding the manifest
        #[arg(long, default_value = "site")]
        site: PathBuf,

        /// Manifest path override (default: <site>/manifest.json)
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        // Discovery always runs against the filesystem as it is now, with
        // today's date resolved at invocation time.
        let today = Local::now().date_naive();

        match self.command {
            Commands::List { root } => {
                let units = discover(&root, today)?;
                if units.is_empty() {
                    println!("No build configurations found");
                    return Ok(());
                }
                print_units(&units);
                Ok(())
            }

            Commands::Build {
                root,
                namespace,
                site,
                skip_manifest,
            } => {
                let units = discover(&root, today)?;
                if units.is_empty() {
                    return Err(eyre!(
                        "no eligible build configurations under {}",
                        root.display()
                    ));
                }
                print_units(&units);
                println!();

                let outcomes = run_all("Build", &units, |unit: &BuildUnit| {
                    let image = docker::image_reference(&namespace, unit);
                    let context = unit.context_dir(&root);
                    async move { docker::build(&image, &context).await }
                })
                .await;

                if skip_manifest {
                    return Ok(());
                }

                let manifest = manifest::publish(&outcomes, &root, &site, &namespace)?;
                println!(
                    "Manifest written to {} ({} images)",
                    site.join(MANIFEST_FILE).display(),
                    manifest.len()
                );
                Ok(())
            }

            Commands::Push {
                root,
                namespace,
                site,
                manifest,
            } => {
                let path = manifest.unwrap_or_else(|| site.join(MANIFEST_FILE));
                let units = manifest::load_units(&path, &root, today, &namespace)?;
                if units.is_empty() {
                    return Err(eyre!("no images to push"));
                }
                print_units(&units);
                println!();

                run_all("Push", &units, |unit: &BuildUnit| {
                    let image = docker::image_reference(&namespace, unit);
                    async move { docker::push(&image).await }
                })
                .await;
                Ok(())
            }
        }
    }
}

fn print_units(units: &[BuildUnit]) {
    println!("Found {} build configurations:", units.len());
    for unit in units {
        println!("  - {unit}");
    }
}
