//! Agent backend adapters: the `AgentBackend` trait, a generic HTTP/JSON
//! adapter, a deterministic scripted adapter for tests, and the registry
//! that binds platform ids to concrete instances.

pub mod http_json;
pub mod registry;
pub mod scripted;
pub mod traits;
pub(crate) mod util;

pub use http_json::HttpJsonBackend;
pub use registry::BackendRegistry;
pub use scripted::{ScriptedBackend, ScriptedStep};
pub use traits::{AgentBackend, HistoryTurn, ThinkParams, ThinkReply, ThinkRequest, Usage};
