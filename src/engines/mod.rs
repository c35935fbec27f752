//! Speech synthesis engines.
//!
//! Enable engines via Cargo features:
//! - `kokoro` - Kokoro TTS (ONNX format, espeak-ng required), on by default

#[cfg(feature = "kokoro")]
pub mod kokoro;
