//! Repeat policy and the pass loop.
//!
//! A pass probes every address once, sequentially. After each pass the
//! [`RepeatPolicy`] decides whether to stop or sleep and run another one; the
//! sleep races the run deadline, and addresses may be resolved again before
//! the next pass.

mod policy;
mod run;

pub use policy::{RepeatDecision, RepeatPolicy};
pub use run::{run_passes, LoopResult, StopReason};
