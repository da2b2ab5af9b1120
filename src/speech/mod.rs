//! Speech output for announcements.
//!
//! Components:
//! - `piper`: synthesizer → player subprocess pipeline (Piper + aplay by default)
//! - `history`: daily JSONL log of what was spoken

pub mod history;
pub mod piper;

use thiserror::Error;
use tracing::info;

/// Failure confined to a single announcement. Logged, never fatal.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to send text to {program}: {source}")]
    Stdin {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exited {
        program: String,
        status: std::process::ExitStatus,
    },
}

/// Something that can say a sentence out loud.
#[allow(async_fn_in_trait)]
pub trait Speaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

/// `--dry-run`: log the sentence instead of speaking it.
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        info!("[dry run] {text}");
        Ok(())
    }
}
