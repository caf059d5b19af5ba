//! Sequential per-unit action runner.

use crate::discover::BuildUnit;

/// Result of running the per-unit action once.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The unit the action ran for.
    pub unit: BuildUnit,
    /// Whether the action reported success.
    pub success: bool,
    /// Human-readable success or failure detail.
    pub message: String,
}

/// Run `action` once per unit, strictly in input order.
///
/// Failures are recorded, never retried, and never abort the pass; the
/// returned outcomes are in input order and one per unit. Prints a
/// per-unit status line and the `"{phase} complete: X/Y succeeded"`
/// summary after the full pass.
pub async fn run_all<F, Fut>(phase: &str, units: &[BuildUnit], action: F) -> Vec<Outcome>
where
    F: Fn(&BuildUnit) -> Fut,
    Fut: Future<Output = Result<String, String>>,
{
    let mut outcomes = Vec::with_capacity(units.len());

    for unit in units {
        println!("--- {phase} {unit} ---");
        tracing::info!(unit = %unit, phase, "starting");

        let (success, message) = match action(unit).await {
            Ok(message) => {
                println!("{message}");
                (true, message)
            }
            Err(message) => {
                tracing::error!(unit = %unit, phase, "failed: {message}");
                eprintln!("{phase} failed for {unit}: {message}");
                (false, message)
            }
        };

        outcomes.push(Outcome {
            unit: unit.clone(),
            success,
            message,
        });
    }

    let succeeded = outcomes.iter().filter(|o| o.success).count();
    println!("\n{phase} complete: {succeeded}/{} succeeded", units.len());
    tracing::info!(phase, succeeded, total = units.len(), "pass finished");

    outcomes
}
