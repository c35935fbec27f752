//! # kokoro-bridge
//!
//! Turns a line of text into a WAV byte stream using the Kokoro engine.
//!
//! The crate is split into a small pipeline:
//!
//! - [`bridge::SpeechRequest`] describes what to say and with which voice
//! - a [`SynthesisEngine`] (Kokoro, behind the `kokoro` feature) produces a
//!   [`SynthesisResult`]
//! - [`wav::encode_pcm16`] packages the samples into a 16-bit PCM WAV container
//! - [`bridge::run`] ties the steps together and writes the bytes to any sink
//!
//! The `kokoro-bridge` binary wires this pipeline to the command line and
//! writes the WAV to stdout.
//!
//! ```ignore
//! use std::path::Path;
//! use kokoro_bridge::{bridge, engines::kokoro::KokoroEngine, SynthesisEngine};
//!
//! let mut engine = KokoroEngine::new();
//! engine.load_model(Path::new("kokoro-v0_19.onnx"), Path::new("voices.bin"))?;
//!
//! let request = bridge::SpeechRequestBuilder::default()
//!     .text("안녕하세요")
//!     .build()?;
//! bridge::run(&mut engine, &request, std::io::stdout().lock())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bridge;
#[cfg(feature = "kokoro")]
pub mod cli;
pub mod engines;
pub mod error;
pub mod wav;

pub use error::{Error, Result};

use std::path::Path;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the format they were produced in.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values, interleaved when `channels > 1`
    pub samples: Vec<f32>,
    /// Sample rate of the audio (24000 for Kokoro)
    pub sample_rate: u32,
    /// Number of interleaved channels (1 for Kokoro)
    pub channels: u16,
}

impl SynthesisResult {
    /// Build a single-channel result.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Encode the audio as a 16-bit PCM WAV byte buffer.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        wav::encode_pcm16(self)
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        let frames = self.samples.len() / self.channels as usize;
        frames as f64 / self.sample_rate as f64
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// An engine is loaded once from a model file and a voice bank, then asked to
/// synthesize text. Each engine chooses its own parameter types for model
/// loading and inference.
pub trait SynthesisEngine {
    /// Parameters for configuring inference behavior (voice, speed, etc.)
    type SynthesisParams;
    /// Parameters for configuring model loading (threads, etc.)
    type ModelParams: Default;

    /// Load a model and voice bank using default parameters.
    fn load_model(&mut self, model_path: &Path, voices_path: &Path) -> Result<()> {
        self.load_model_with_params(model_path, voices_path, Self::ModelParams::default())
    }

    /// Load a model and voice bank with custom parameters.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        voices_path: &Path,
        params: Self::ModelParams,
    ) -> Result<()>;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult>;
}

#[cfg(test)]
mod tests {
    use super::SynthesisResult;

    #[test]
    fn duration_counts_frames_not_samples() {
        let stereo = SynthesisResult {
            samples: vec![0.0; 48_000],
            sample_rate: 24_000,
            channels: 2,
        };
        assert_eq!(stereo.duration_secs(), 1.0);
    }

    #[test]
    fn duration_of_degenerate_audio_is_zero() {
        let broken = SynthesisResult {
            samples: vec![0.0; 10],
            sample_rate: 0,
            channels: 1,
        };
        assert_eq!(broken.duration_secs(), 0.0);
    }
}
