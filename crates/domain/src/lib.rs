//! Core data model for the discussion orchestration engine: agents, turns,
//! the discussion context, SVR tuples, decisions, config, and the shared
//! error type. No I/O lives here — this crate is pure domain logic shared
//! by `conclave-backend`, `conclave-engine`, `conclave-store`, and
//! `conclave-gateway`.

pub mod agent;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod svr;
pub mod think;
pub mod trace;
pub mod turn;

pub use agent::{AgentSpec, ModelParams};
pub use context::{ContextView, Digest, DiscussionContext, Phase};
pub use decision::{Decision, DecisionAction};
pub use error::{Error, Result};
pub use svr::{SvrError, SvrTuple};
pub use think::ThinkError;
pub use turn::{Speaker, Turn};
