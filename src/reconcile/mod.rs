//! Meeting lifecycle reconciliation.
//!
//! A sweep re-derives every active meeting's status from what the provider
//! reports about its bot. Each sweep moves a meeting at most one step;
//! anything not ready yet is simply looked at again next sweep.

mod engine;
pub mod transition;

pub use engine::{Reconciler, SweepOptions, SweepReport, Transition};
pub use transition::{next_step, Step};
