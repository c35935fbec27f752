//! Crate-wide error type.
//!
//! Every stage of the bridge (argument handling, model loading, synthesis,
//! WAV encoding and output) reports failures through [`Error`], so the binary
//! has exactly one place that turns a failure into a diagnostic and exit code.

#[cfg(feature = "kokoro")]
use crate::engines::kokoro::KokoroError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Usage(String),
    #[cfg(feature = "kokoro")]
    #[error(transparent)]
    Kokoro(#[from] KokoroError),
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Render the error as the single stderr line the binary reports.
    ///
    /// Multi-line messages (espeak-ng stderr, for instance) are collapsed so
    /// the diagnostic always fits on one line.
    pub fn diagnostic(&self) -> String {
        let message = self.to_string();
        let collapsed = message
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        format!("Error: {collapsed}")
    }
}
