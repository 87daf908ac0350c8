//! HTTP collaborators for the Agent Academy session core.
//!
//! [`TutorApiClient`] talks to the tutor backend (quiz grading) and the
//! badge minter, which share one base URL.

pub mod client;
pub mod config;
pub mod error;

pub use client::{HealthStatus, TutorApiClient};
pub use config::{ApiConfig, API_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ClientError, Result};
