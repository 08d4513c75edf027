//! The classic simulations the gates model, with the timing randomness
//! replaced by fixed stays so runs are reproducible.
//!
//! - Trampoline: two categories sharing a weight and head-count limit
//! - Museum: three visiting groups that never mix
//! - Barbershop: barbers and customers paired one to one

pub mod barbershop;
pub mod museum;
pub mod trampoline;

pub use barbershop::{run_barbershop, BarbershopReport};
pub use museum::{run_museum, MuseumReport};
pub use trampoline::{run_trampoline, TrampolineReport, Visitor};
