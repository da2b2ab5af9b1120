//! Fatal error taxonomy for a polling cycle.
//!
//! Anything in here stops the run. Per-notification speech failures live in
//! `speech::SpeechError` and never reach this type.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to fetch notifications: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request failed with status {0}")]
    Status(StatusCode),

    #[error("failed to parse notifications JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
