//! Search orchestration: one fan-out per query, reduced to a single outcome.
//!
//! [`Orchestrator`] runs the adapters and the reduction pipeline;
//! [`SearchSession`] wraps it with the saved list, remembered filters and a
//! generation counter that discards stale results.

mod orchestrator;
mod session;

pub use orchestrator::Orchestrator;
pub use session::SearchSession;
