use std::fmt;

/// Distinguishable errors an `AgentBackend::think` call can surface.
/// `Timeout`/`Transient` trigger in-round substitution; `Permanent`/
/// `PolicyBlocked` mark the agent degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThinkError {
    Transient(String),
    Permanent(String),
    Timeout,
    Canceled,
    PolicyBlocked(String),
}

impl fmt::Display for ThinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThinkError::Transient(msg) => write!(f, "transient: {msg}"),
            ThinkError::Permanent(msg) => write!(f, "permanent: {msg}"),
            ThinkError::Timeout => write!(f, "timeout"),
            ThinkError::Canceled => write!(f, "canceled"),
            ThinkError::PolicyBlocked(msg) => write!(f, "policy blocked: {msg}"),
        }
    }
}

impl std::error::Error for ThinkError {}

impl ThinkError {
    /// Whether this error warrants substituting a different agent
    /// in-round rather than immediately degrading the agent.
    pub fn is_substitutable(&self) -> bool {
        matches!(self, ThinkError::Timeout | ThinkError::Transient(_))
    }

    /// Whether this error counts toward the degraded-agent threshold.
    pub fn is_degrading(&self) -> bool {
        matches!(self, ThinkError::Permanent(_) | ThinkError::PolicyBlocked(_))
    }
}
