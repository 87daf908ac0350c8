//! Client construction errors.
//!
//! Request-time failures are reported as [`academy_core::ServiceError`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
