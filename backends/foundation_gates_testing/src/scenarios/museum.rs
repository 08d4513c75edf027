//! Visiting groups that may share the museum only with their own group.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use foundation_gates::{Category, CategoryGate, GateResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuseumReport {
    /// Visits completed, indexed by group.
    pub visits: Vec<usize>,
    /// True if two groups were ever inside together.
    pub mixed: bool,
}

/// Sends `group_sizes[g]` visitors of group `g` through `gate`, each
/// staying for `stay`.
///
/// # Errors
///
/// An unknown group, i.e. more groups than the gate has categories.
///
/// # Panics
///
/// Re-raises the panic of any visitor thread that panicked.
pub fn run_museum(
    gate: &Arc<CategoryGate>,
    group_sizes: &[usize],
    stay: Duration,
) -> GateResult<MuseumReport> {
    let mixed = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::new();

    for (group, size) in group_sizes.iter().copied().enumerate() {
        for _ in 0..size {
            let gate = Arc::clone(gate);
            let mixed = Arc::clone(&mixed);
            handles.push((
                group,
                thread::spawn(move || -> GateResult<()> {
                    let permit = gate.admit(Category::new(group))?;
                    let snapshot = gate.snapshot();
                    if snapshot.occupants.iter().filter(|count| **count > 0).count() > 1 {
                        mixed.store(true, Ordering::SeqCst);
                    }
                    thread::sleep(stay);
                    drop(permit);
                    Ok(())
                }),
            ));
        }
    }

    let mut visits = vec![0; group_sizes.len()];
    for (group, handle) in handles {
        match handle.join() {
            Ok(visit) => {
                visit?;
                visits[group] += 1;
            }
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    Ok(MuseumReport {
        visits,
        mixed: mixed.load(Ordering::SeqCst),
    })
}
