//! The SVR (Stop / Value / Repeat) scoring engine: per-agent computation,
//! parallel fan-out with a deadline, and the deterministic decision rule
//! that picks the next speaker or ends the round.

pub mod decider;
pub mod parallel_engine;
pub mod svr_computer;

pub use decider::SvrDecider;
pub use parallel_engine::ParallelSvrEngine;
pub use svr_computer::SvrComputer;
