//! Children of two categories taking turns on a weight-limited trampoline.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use foundation_gates::{Category, CombinedGate, GateResult};

/// One child waiting for the trampoline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visitor {
    pub category: Category,
    pub weight: usize,
}

impl Visitor {
    #[must_use]
    pub const fn new(category: Category, weight: usize) -> Self {
        Self { category, weight }
    }
}

/// What was seen on the trampoline over a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrampolineReport {
    pub jumps: usize,
    pub peak_weight: usize,
    pub peak_count: usize,
    /// True if two categories were ever seen on the trampoline together.
    pub mixed: bool,
}

/// Sends every visitor through `gate` on its own thread; each jumps for
/// `jump` and leaves.
///
/// # Errors
///
/// The first visitor the gate rejects, e.g. one heavier than its capacity.
///
/// # Panics
///
/// Re-raises the panic of any visitor thread that panicked.
pub fn run_trampoline(
    gate: &Arc<CombinedGate>,
    visitors: &[Visitor],
    jump: Duration,
) -> GateResult<TrampolineReport> {
    let peak_weight = Arc::new(AtomicUsize::new(0));
    let peak_count = Arc::new(AtomicUsize::new(0));
    let mixed = Arc::new(AtomicBool::new(false));

    let handles: Vec<_> = visitors
        .iter()
        .copied()
        .map(|visitor| {
            let gate = Arc::clone(gate);
            let peak_weight = Arc::clone(&peak_weight);
            let peak_count = Arc::clone(&peak_count);
            let mixed = Arc::clone(&mixed);
            thread::spawn(move || -> GateResult<()> {
                let permit = gate.admit(visitor.category, visitor.weight)?;

                let snapshot = gate.snapshot();
                peak_weight.fetch_max(snapshot.occupied_weight, Ordering::SeqCst);
                peak_count.fetch_max(snapshot.occupied_count, Ordering::SeqCst);
                if snapshot.occupants.iter().filter(|count| **count > 0).count() > 1 {
                    mixed.store(true, Ordering::SeqCst);
                }

                thread::sleep(jump);
                drop(permit);
                Ok(())
            })
        })
        .collect();

    let mut jumps = 0;
    let mut first_error = None;
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => jumps += 1,
            Ok(Err(err)) => {
                first_error.get_or_insert(err);
            }
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    let report = TrampolineReport {
        jumps,
        peak_weight: peak_weight.load(Ordering::SeqCst),
        peak_count: peak_count.load(Ordering::SeqCst),
        mixed: mixed.load(Ordering::SeqCst),
    };
    tracing::info!(?report, "trampoline run finished");
    Ok(report)
}
