//! Barbers and customers meeting at a rendezvous point.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use foundation_gates::{GateError, RendezvousConfig, RendezvousPoint, WaitOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarbershopReport {
    pub haircuts: usize,
    /// Customers sent away because the waiting room was full.
    pub turned_away: usize,
    /// Customers that ran out of patience while waiting.
    pub gave_up: usize,
    pub completed_pairings: u64,
}

/// Runs `barbers` barbers and `customers` customers through one shop.
///
/// Customers wait at most `patience`. Barbers keep offering haircuts until
/// nobody shows up within `patience`, then close.
///
/// # Panics
///
/// Re-raises the panic of any barber or customer thread that panicked.
#[must_use]
pub fn run_barbershop(
    barbers: usize,
    customers: usize,
    config: RendezvousConfig,
    patience: Duration,
) -> BarbershopReport {
    let shop = Arc::new(RendezvousPoint::new(config));

    let barber_handles: Vec<_> = (0..barbers)
        .map(|_| {
            let shop = Arc::clone(&shop);
            thread::spawn(move || {
                let mut haircuts = 0usize;
                while shop
                    .offer_service_with(&WaitOptions::new().timeout(patience))
                    .is_ok()
                {
                    haircuts += 1;
                }
                haircuts
            })
        })
        .collect();

    let customer_handles: Vec<_> = (0..customers)
        .map(|_| {
            let shop = Arc::clone(&shop);
            thread::spawn(move || {
                shop.request_service_with(&WaitOptions::new().timeout(patience))
            })
        })
        .collect();

    let mut report = BarbershopReport {
        haircuts: 0,
        turned_away: 0,
        gave_up: 0,
        completed_pairings: 0,
    };
    for handle in customer_handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(GateError::WaitingRoomFull)) => report.turned_away += 1,
            Ok(Err(_)) => report.gave_up += 1,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
    for handle in barber_handles {
        match handle.join() {
            Ok(haircuts) => report.haircuts += haircuts,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    report.completed_pairings = shop.snapshot().completed_pairings;
    tracing::info!(?report, "barbershop closed");
    report
}
