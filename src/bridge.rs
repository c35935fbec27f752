//! The text → WAV pipeline.
//!
//! A [`SpeechRequest`] is handed to a loaded [`SynthesisEngine`], the samples
//! are encoded to WAV in memory, and only then are the bytes written out. A
//! failure before emission therefore never leaves a partial WAV header on the
//! sink.

use std::io::Write;
use std::time::Instant;

use derive_builder::Builder;

use crate::{Error, Result, SynthesisEngine};

/// Voice used when the caller does not pick one.
pub const DEFAULT_VOICE: &str = "ko_1";
/// Speech speed multiplier passed to the engine.
pub const DEFAULT_SPEED: f32 = 1.0;
/// espeak-ng language code passed to the engine.
pub const DEFAULT_LANGUAGE: &str = "ko";

/// A single synthesis request.
///
/// Built through [`SpeechRequestBuilder`], which rejects blank text, so every
/// `SpeechRequest` in existence has something to say.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate", error = "Error"))]
pub struct SpeechRequest {
    text: String,
    #[builder(default = "DEFAULT_VOICE.to_string()")]
    voice: String,
    #[builder(default = "DEFAULT_SPEED")]
    speed: f32,
    #[builder(default = "DEFAULT_LANGUAGE.to_string()")]
    language: String,
}

impl SpeechRequestBuilder {
    fn validate(&self) -> std::result::Result<(), Error> {
        if let Some(text) = &self.text {
            if text.trim().is_empty() {
                return Err(Error::Usage("text must not be empty".to_string()));
            }
        }
        if let Some(voice) = &self.voice {
            if voice.trim().is_empty() {
                return Err(Error::Usage("voice must not be empty".to_string()));
            }
        }
        if let Some(speed) = self.speed {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(Error::Usage(format!("speed must be positive, got {speed}")));
            }
        }
        Ok(())
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Error::Usage(format!("missing required field `{}`", err.field_name()))
    }
}

impl SpeechRequest {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

/// Synthesize `request` with `engine` and write the WAV bytes to `out`.
///
/// Returns the number of bytes written.
pub fn run<E, W>(engine: &mut E, request: &SpeechRequest, out: W) -> Result<usize>
where
    E: SynthesisEngine,
    for<'a> E::SynthesisParams: From<&'a SpeechRequest>,
    W: Write,
{
    let synth_start = Instant::now();
    let audio = engine.synthesize(request.text(), Some(request.into()))?;
    log::info!(
        "Synthesized {:.2}s of audio ({} samples @ {}Hz) in {:.2?}",
        audio.duration_secs(),
        audio.samples.len(),
        audio.sample_rate,
        synth_start.elapsed()
    );

    let bytes = audio.to_wav_bytes()?;
    emit(out, &bytes)?;
    Ok(bytes.len())
}

/// Write an encoded buffer to the sink in one piece and flush it.
pub fn emit<W: Write>(mut out: W, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes)?;
    out.flush()?;
    log::debug!("Wrote {} bytes", bytes.len());
    Ok(())
}
