//! Error taxonomy for the academy session core.

/// Failures reported by an external collaborator (quiz grader, badge minter).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Non-2xx response without a collaborator-supplied detail.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    /// The collaborator refused the request and explained why.
    ///
    /// The detail is rendered verbatim so it can be shown to the player.
    #[error("{0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Result type for collaborator calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Academy session errors. Every variant is recoverable by repeating the
/// player action once its precondition holds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcademyError {
    /// The action is not allowed at the current stage or verification level.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A collaborator call failed; the message is shown to the player.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("wallet not connected")]
    WalletNotConnected,

    /// The action makes no sense in the current state (e.g. minting twice).
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("answer must not be empty")]
    EmptyAnswer,

    #[error("quiz session is finished; retry to start a new one")]
    SessionFinished,

    #[error("a request is already in flight")]
    SubmissionInFlight,

    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),
}

impl From<ServiceError> for AcademyError {
    fn from(err: ServiceError) -> Self {
        AcademyError::NetworkFailure(err.to_string())
    }
}

impl AcademyError {
    /// Whether this error came from a collaborator rather than a local check.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::NetworkFailure(_))
    }
}

/// Result type for academy operations.
pub type Result<T> = std::result::Result<T, AcademyError>;
