//! Stress testing, scenarios and benchmarks for [`foundation_gates`].
//!
//! This crate provides:
//! - **Stress harness**: many threads hammering one gate, each iteration
//!   checking the gate's invariant from the inside
//! - **Scenarios**: the classic simulations each gate was built for
//!   (trampoline, museum, barbershop)
//! - **Performance metrics**: per-operation latency and throughput
//! - **Criterion benchmarks**: broadcast vs signal-one wakes, queue
//!   throughput, read-heavy locking
//!
//! # Examples
//!
//! ```rust
//! use foundation_gates_testing::stress::{gates::run_count_pool_stress, StressConfig};
//!
//! let config = StressConfig::new().threads(8).iterations(200);
//! let result = run_count_pool_stress(config, 3).unwrap();
//!
//! assert_eq!(result.failures, 0);
//! assert_eq!(result.successes, 1600);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod metrics;
pub mod scenarios;
pub mod stress;

pub use metrics::{Metrics, PerformanceReport};
pub use stress::{StressConfig, StressHarness, StressResult};
