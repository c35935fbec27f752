//! Kokoro-82M text-to-speech engine implementation.
//!
//! Runs the Kokoro ONNX model through ONNX Runtime and uses espeak-ng to turn
//! text into IPA phonemes.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed (or pointed to with
//! [`EspeakConfig`]):
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>
//!
//! # Model Files
//!
//! ```text
//! kokoro-v0_19.onnx   # ONNX model
//! voices.bin          # Voice bank (.npz archive, or JSON)
//! config.json         # Optional, next to the model: token vocabulary
//! ```
//!
//! # Language Support
//!
//! The language is passed explicitly by the bridge (`ko`). When it is left
//! unset, it is derived from the voice prefix:
//!
//! | Voice prefix | Language | espeak-ng code |
//! |---|---|---|
//! | `af_`, `am_` | American English | `en-us` |
//! | `bf_`, `bm_` | British English | `en-gb` |
//! | `ef_`, `em_` | Spanish | `es` |
//! | `ff_` | French | `fr` |
//! | `hf_`, `hm_` | Hindi | `hi` |
//! | `if_`, `im_` | Italian | `it` |
//! | `jf_`, `jm_` | Japanese | `ja` |
//! | `ko_`, `kf_`, `km_` | Korean | `ko` |
//! | `pf_`, `pm_` | Brazilian Portuguese | `pt-br` |
//! | `zf_`, `zm_` | Mandarin Chinese | `cmn` |
//!
//! # Example
//!
//! ```rust,no_run
//! use kokoro_bridge::{SynthesisEngine, engines::kokoro::{KokoroEngine, KokoroInferenceParams}};
//! use std::path::Path;
//!
//! let mut engine = KokoroEngine::new();
//! engine.load_model(Path::new("kokoro-v0_19.onnx"), Path::new("voices.bin"))?;
//!
//! let params = KokoroInferenceParams {
//!     voice: "ko_1".to_string(),
//!     language: Some("ko".to_string()),
//!     ..Default::default()
//! };
//! let result = engine.synthesize("안녕하세요", Some(params))?;
//! println!("Generated {} samples at {}Hz", result.samples.len(), result.sample_rate);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod model;
pub mod phonemizer;
pub mod vocab;
pub mod voices;

pub use engine::{KokoroEngine, KokoroInferenceParams, KokoroModelParams};
pub use model::KokoroError;
pub use phonemizer::EspeakConfig;
