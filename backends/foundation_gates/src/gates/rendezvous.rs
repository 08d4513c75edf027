//! Strict one-to-one handshake between servers and clients.
//!
//! The sleeping barber: a barber offers service and sleeps until a customer
//! arrives; a customer requests service and waits until a barber is free.
//! Roles are tracked separately so two callers of the same role never pair.

use serde::{Deserialize, Serialize};

use crate::errors::{GateError, GateResult};
use crate::primitives::{Monitor, NotifyDirective, QueueId, WaitOptions, WaitStatus};

const SERVERS: QueueId = QueueId(0);
const CLIENTS: QueueId = QueueId(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendezvousConfig {
    /// Clients allowed to wait at once; `None` is unbounded.
    #[serde(default)]
    pub max_waiting_clients: Option<usize>,
}

impl RendezvousConfig {
    #[must_use]
    pub fn bounded(max_waiting_clients: usize) -> Self {
        Self {
            max_waiting_clients: Some(max_waiting_clients),
        }
    }
}

/// Waiting parties are split into those still unmatched (`idle_servers`,
/// `waiting_clients`) and those already matched but not yet resumed
/// (`server_grants`, `client_grants`).
#[derive(Debug, Default)]
struct RendezvousState {
    idle_servers: usize,
    waiting_clients: usize,
    server_grants: usize,
    client_grants: usize,
    completed_pairings: u64,
}

/// Point-in-time view of a [`RendezvousPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RendezvousSnapshot {
    pub idle_servers: usize,
    pub waiting_clients: usize,
    pub completed_pairings: u64,
}

/// `RendezvousPoint` pairs each `offer_service` with exactly one
/// `request_service`.
///
/// The arriving party completes the pairing under the lock and wakes exactly
/// one waiter of the other role. A waiter that gives up before being matched
/// withdraws itself, so it can never be paired afterwards.
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use foundation_gates::{RendezvousConfig, RendezvousPoint};
///
/// let salon = Arc::new(RendezvousPoint::new(RendezvousConfig::default()));
/// let barber = {
///     let salon = Arc::clone(&salon);
///     thread::spawn(move || salon.offer_service())
/// };
/// salon.request_service().unwrap();
/// barber.join().unwrap().unwrap();
/// assert_eq!(salon.snapshot().completed_pairings, 1);
/// ```
#[derive(Debug)]
pub struct RendezvousPoint {
    monitor: Monitor<RendezvousState>,
    config: RendezvousConfig,
}

impl RendezvousPoint {
    #[must_use]
    pub fn new(config: RendezvousConfig) -> Self {
        Self {
            monitor: Monitor::new(RendezvousState::default(), 2),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> RendezvousConfig {
        self.config
    }

    /// Registers an available server and blocks until a client takes it.
    ///
    /// # Errors
    ///
    /// Never fails without wait options.
    pub fn offer_service(&self) -> GateResult<()> {
        self.offer_service_with(&WaitOptions::new())
    }

    /// # Errors
    ///
    /// [`GateError::Cancelled`] or [`GateError::TimedOut`]; the server is
    /// withdrawn and no pairing was made.
    pub fn offer_service_with(&self, options: &WaitOptions) -> GateResult<()> {
        let mut state = self.monitor.lock();
        if state.waiting_clients > 0 {
            state.waiting_clients -= 1;
            state.client_grants += 1;
            state.completed_pairings += 1;
            crate::debug!(pairings = state.completed_pairings, "server met waiting client");
            drop(state);
            self.monitor.notify(CLIENTS, NotifyDirective::One);
            return Ok(());
        }

        state.idle_servers += 1;
        let (mut state, status) =
            self.monitor
                .wait_until(state, SERVERS, options, |state| state.server_grants > 0);
        if status != WaitStatus::Ready {
            state.idle_servers -= 1;
            crate::warn!(?status, "server withdrew");
            return status.into_result();
        }

        state.server_grants -= 1;
        Ok(())
    }

    /// Registers a waiting client and blocks until a server takes it.
    ///
    /// # Errors
    ///
    /// [`GateError::WaitingRoomFull`] when no server is idle and the waiting
    /// room is at its bound.
    pub fn request_service(&self) -> GateResult<()> {
        self.request_service_with(&WaitOptions::new())
    }

    /// # Errors
    ///
    /// [`GateError::WaitingRoomFull`], [`GateError::Cancelled`] or
    /// [`GateError::TimedOut`]; the client is withdrawn and no pairing was
    /// made.
    pub fn request_service_with(&self, options: &WaitOptions) -> GateResult<()> {
        let mut state = self.monitor.lock();
        if state.idle_servers > 0 {
            state.idle_servers -= 1;
            state.server_grants += 1;
            state.completed_pairings += 1;
            crate::debug!(pairings = state.completed_pairings, "client met idle server");
            drop(state);
            self.monitor.notify(SERVERS, NotifyDirective::One);
            return Ok(());
        }

        if let Some(bound) = self.config.max_waiting_clients {
            if state.waiting_clients >= bound {
                crate::info!(bound, "waiting room full, client turned away");
                return Err(GateError::WaitingRoomFull);
            }
        }

        state.waiting_clients += 1;
        let (mut state, status) =
            self.monitor
                .wait_until(state, CLIENTS, options, |state| state.client_grants > 0);
        if status != WaitStatus::Ready {
            state.waiting_clients -= 1;
            crate::warn!(?status, "client withdrew");
            return status.into_result();
        }

        state.client_grants -= 1;
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> RendezvousSnapshot {
        self.monitor.inspect(|state| RendezvousSnapshot {
            idle_servers: state.idle_servers,
            waiting_clients: state.waiting_clients,
            completed_pairings: state.completed_pairings,
        })
    }
}

impl Default for RendezvousPoint {
    fn default() -> Self {
        Self::new(RendezvousConfig::default())
    }
}
