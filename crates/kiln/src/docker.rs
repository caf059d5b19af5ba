//! Docker CLI collaborator.
//!
//! Thin wrappers around `docker build` and `docker push`. Failures come
//! back as plain strings: callers record them as failed outcomes rather
//! than propagating them.

use std::path::Path;
use std::process::Output;

use tokio::process::Command;

use crate::discover::BuildUnit;

/// Full registry reference for a unit, e.g. `kilnhq/app:1.0`.
#[must_use]
pub fn image_reference(namespace: &str, unit: &BuildUnit) -> String {
    format!("{namespace}/{}:{}", unit.name, unit.tag)
}

/// Build `image` from the given context directory.
pub async fn build(image: &str, context: &Path) -> Result<String, String> {
    if !context.is_dir() {
        return Err(format!(
            "build context '{}' does not exist",
            context.display()
        ));
    }

    tracing::debug!(image, context = %context.display(), "docker build");
    let output = Command::new("docker")
        .args(["build", "-t", image])
        .arg(context)
        .output()
        .await
        .map_err(|err| format!("failed to run docker: {err}"))?;

    if output.status.success() {
        Ok(format!("image '{image}' built"))
    } else {
        Err(command_failure("docker build", &output))
    }
}

/// Push `image` to its registry.
pub async fn push(image: &str) -> Result<String, String> {
    tracing::debug!(image, "docker push");
    let output = Command::new("docker")
        .args(["push", image])
        .output()
        .await
        .map_err(|err| format!("failed to run docker: {err}"))?;

    if output.status.success() {
        Ok(format!("image '{image}' pushed"))
    } else {
        Err(command_failure("docker push", &output))
    }
}

/// Summarize a failed docker invocation, preferring stderr.
fn command_failure(cmd: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout)
    } else {
        stderr
    };
    format!("{cmd} failed ({}): {}", output.status, detail.trim())
}
