use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};
use log::{error, info};

/// Unique invariant descriptions that have been asserted (and held) so far.
fn checked_invariants() -> &'static Mutex<HashSet<String>> {
    static CHECKED: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    CHECKED.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Asserts that a workflow invariant holds.
///
/// A false condition panics in debug/test builds and logs a critical error in
/// release builds. A true condition records the description so contract tests
/// can later verify the check actually ran.
///
/// # Arguments
/// * `condition` - The boolean result of the check.
/// * `description` - Human-readable invariant (e.g., "artifact exists at the canonical output path").
/// * `component` - Optional component tag (e.g., "Builder", "Launcher").
pub fn assert_invariant(condition: bool, description: &str, component: Option<&str>) {
    if !condition {
        let msg = format!(
            "CRITICAL INVARIANT VIOLATION [{}]: {}",
            component.unwrap_or("General"),
            description
        );
        error!("{}", msg);
        if cfg!(debug_assertions) || cfg!(test) {
            panic!("{}", msg);
        }
    } else if let Ok(mut set) = checked_invariants().lock() {
        set.insert(description.to_string());
    }
}

/// Verifies that the listed invariants were asserted during execution.
/// Panics naming whichever were never checked.
#[allow(dead_code)]
pub fn contract_test(context: &str, required_invariants: &[&str]) {
    let checked = checked_invariants().lock().unwrap();
    let missing: Vec<&str> = required_invariants
        .iter()
        .copied()
        .filter(|req| !checked.contains(*req))
        .collect();

    if !missing.is_empty() {
        panic!(
            "Contract Test Failed for '{}'. The following invariants were NOT checked:\n{:#?}",
            context, missing
        );
    }
    info!("Contract Test Passed: {}", context);
}

/// Clears the record of checked invariants. Call before an isolated test.
#[allow(dead_code)]
pub fn clear_invariant_log() {
    if let Ok(mut set) = checked_invariants().lock() {
        set.clear();
    }
}
