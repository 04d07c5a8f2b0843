/// Shared error type used across all conclave crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("backend {platform}: {message}")]
    Backend { platform: String, message: String },

    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("room invalid: {0}")]
    RoomInvalid(String),

    #[error("room already active: {0}")]
    AlreadyActive(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The stable wire error code for this error, per the client protocol.
    pub fn code(&self) -> &'static str {
        match self {
            Error::RoomNotFound(_) => "ROOM_NOT_FOUND",
            Error::RoomInvalid(_) => "ROOM_INVALID",
            Error::AlreadyActive(_) => "ALREADY_ACTIVE",
            Error::Backend { .. } | Error::Http(_) | Error::Timeout(_) => "AGENT_TIMEOUT",
            Error::Config(_) | Error::Auth(_) => "BAD_REQUEST",
            Error::Io(_) | Error::Json(_) | Error::Other(_) => "BAD_REQUEST",
        }
    }
}
