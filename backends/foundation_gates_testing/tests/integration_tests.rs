//! Stress runs and scenarios against every gate.
//!
//! These tests drive the gates from many threads at once and rely on the
//! invariant checks inside each stress iteration; timing-sensitive runs are
//! serialized so they do not compete for cores.

use foundation_gates::{Category, CategoryGate, CombinedGate, RendezvousConfig, RwPolicy};
use foundation_gates_testing::scenarios::{run_barbershop, run_museum, run_trampoline, Visitor};
use foundation_gates_testing::stress::gates::{
    run_bounded_queue_stress, run_capacity_pool_stress, run_category_gate_stress,
    run_combined_gate_stress, run_count_pool_stress, run_readers_writers_stress,
    run_rendezvous_stress,
};
use foundation_gates_testing::{PerformanceReport, StressConfig, StressHarness};
use ntest::timeout;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn config() -> StressConfig {
    StressConfig::new()
        .threads(8)
        .iterations(300)
        .wait_timeout(Duration::from_secs(5))
}

#[test]
#[serial]
#[timeout(60000)]
fn test_capacity_pool_never_exceeds_weight() {
    let result = run_capacity_pool_stress(config(), 300).unwrap();
    assert_eq!(result.failures, 0);
    assert_eq!(result.successes, 8 * 300);
}

#[test]
#[serial]
#[timeout(60000)]
fn test_count_pool_never_exceeds_count() {
    let result = run_count_pool_stress(config(), 3).unwrap();
    assert_eq!(result.failures, 0);
    assert_eq!(result.successes, 8 * 300);
}

#[test]
#[serial]
#[timeout(60000)]
fn test_category_gate_never_mixes() {
    let config = config()
        .threads(9)
        .iterations(100)
        .wait_timeout(Duration::from_secs(30));
    let result = run_category_gate_stress(config, 3).unwrap();
    assert_eq!(result.failures, 0);
}

#[test]
#[serial]
#[timeout(60000)]
fn test_combined_gate_holds_all_limits() {
    let config = config()
        .iterations(100)
        .wait_timeout(Duration::from_secs(30));
    let result = run_combined_gate_stress(config, 300, 5, 2).unwrap();
    assert_eq!(result.failures, 0);
}

#[test]
#[serial]
#[timeout(60000)]
fn test_readers_writers_exclusion_under_both_policies() {
    for policy in [RwPolicy::ReaderPreference, RwPolicy::WriterPreference] {
        let result = run_readers_writers_stress(config(), policy);
        assert_eq!(result.failures, 0, "{policy:?}");
    }
}

#[test]
#[serial]
#[timeout(60000)]
fn test_bounded_queue_balanced_roles() {
    let result = run_bounded_queue_stress(config(), 12).unwrap();
    assert_eq!(result.failures, 0);
    assert_eq!(result.successes, 8 * 300);
}

#[test]
#[serial]
#[timeout(60000)]
fn test_rendezvous_balanced_roles() {
    let result = run_rendezvous_stress(config().iterations(100));
    assert_eq!(result.failures, 0);
    assert_eq!(result.successes, 8 * 100);
}

#[test]
fn test_stress_rejects_invalid_gate() {
    assert!(run_count_pool_stress(config(), 0).unwrap_err().is_invalid());
    assert!(run_category_gate_stress(config(), 0).unwrap_err().is_invalid());
}

#[test]
#[timeout(30000)]
fn test_harness_collects_metrics() {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = Arc::clone(&counter);
    let harness = StressHarness::new(StressConfig::new().threads(4).iterations(50));

    let (result, metrics) = harness.run_with_metrics(move |_thread_id, _iteration| {
        counter_clone.fetch_add(1, Ordering::Relaxed);
        true
    });

    assert_eq!(result.successes, 200);
    assert_eq!(metrics.latencies.len(), 200);
    assert_eq!(counter.load(Ordering::Relaxed), 200);

    let report = PerformanceReport::new("counter", result, metrics);
    assert!(report.to_string().contains("Operations: 200 (0 failed)"));
}

#[test]
#[timeout(30000)]
fn test_harness_stops_at_duration() {
    let config = StressConfig::new()
        .threads(2)
        .iterations(usize::MAX)
        .duration(Duration::from_millis(100));

    let result = StressHarness::new(config).run(|_thread_id, _iteration| {
        std::thread::sleep(Duration::from_millis(1));
        true
    });

    assert!(result.successes > 0);
    assert!(result.duration < Duration::from_secs(5));
}

#[test]
#[timeout(30000)]
fn test_trampoline_scenario() {
    let gate = Arc::new(CombinedGate::new(300, 5, 2).unwrap());
    let boys = Category::new(0);
    let girls = Category::new(1);
    let visitors: Vec<Visitor> = (0..12)
        .map(|index| {
            let category = if index % 2 == 0 { boys } else { girls };
            Visitor::new(category, 40 + index * 5)
        })
        .collect();

    let report = run_trampoline(&gate, &visitors, Duration::from_millis(5)).unwrap();

    assert_eq!(report.jumps, 12);
    assert!(!report.mixed);
    assert!(report.peak_weight <= 300);
    assert!(report.peak_count <= 5);
    assert_eq!(gate.snapshot().occupied_weight, 0);
}

#[test]
fn test_trampoline_rejects_overweight_visitor() {
    let gate = Arc::new(CombinedGate::new(100, 5, 2).unwrap());
    let visitors = [Visitor::new(Category::new(0), 150)];
    let err = run_trampoline(&gate, &visitors, Duration::ZERO).unwrap_err();
    assert!(err.is_invalid());
}

#[test]
#[timeout(30000)]
fn test_museum_scenario() {
    let gate = Arc::new(CategoryGate::new(3).unwrap());
    let report = run_museum(&gate, &[4, 3, 5], Duration::from_millis(2)).unwrap();
    assert_eq!(report.visits, vec![4, 3, 5]);
    assert!(!report.mixed);
}

#[test]
#[timeout(30000)]
fn test_barbershop_serves_min_of_roles() {
    let report = run_barbershop(2, 9, RendezvousConfig::default(), Duration::from_millis(500));
    assert_eq!(report.haircuts, 9);
    assert_eq!(report.completed_pairings, 9);
    assert_eq!(report.turned_away + report.gave_up, 0);
}
