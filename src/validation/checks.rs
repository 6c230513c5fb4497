//! Evaluate-all predicate groups
//!
//! Some validators are a set of independent pure checks over one value. All of
//! them run, in parallel, and every failure is reported together so the caller
//! can fix the input in one round trip.

use rayon::prelude::*;

/// A pure check over one input. Returns the failure reason, if any.
pub type Check = fn(&str) -> Option<String>;

/// Runs every check and joins the failures in check order.
///
/// Returns `Err("validation failed: a; b")` when any check fails.
pub fn evaluate_all(input: &str, checks: &[Check]) -> Result<(), String> {
    // par_iter + collect keeps the input order
    let failures: Vec<String> = checks
        .par_iter()
        .filter_map(|check| check(input))
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!("validation failed: {}", failures.join("; ")))
    }
}
