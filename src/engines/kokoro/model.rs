use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use super::phonemizer::{phonemize, EspeakConfig};
use super::voices::{VoiceStore, STYLE_DIM};

/// Maximum number of phoneme tokens per chunk (before padding).
pub const MAX_PHONEME_LEN: usize = 510;

/// Output sample rate from the Kokoro model.
pub const SAMPLE_RATE: u32 = 24000;

/// Accepted range for the speed multiplier.
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

/// Crossfade (in samples) used when concatenating chunk audio.
const CHUNK_CROSSFADE_SAMPLES: usize = 240; // 10ms @ 24kHz

/// Punctuation token ids in the Kokoro vocabulary: `; : , . ! ?`
const PUNCT_IDS: &[i64] = &[1, 2, 3, 4, 5, 6];

#[derive(thiserror::Error, Debug)]
pub enum KokoroError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("Voice bank not found: {}", .0.display())]
    VoicesNotFound(PathBuf),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Phonemization failed: {0}")]
    PhonemizerFailed(String),
    #[error("Voice '{0}' not found in the voice bank")]
    VoiceNotFound(String),
    #[error("Speed should be between 0.5 and 2.0, got {0}")]
    InvalidSpeed(f32),
    #[error("Model not loaded. Call load_model() first.")]
    ModelNotLoaded,
    #[error("Invalid config.json: {0}")]
    Config(String),
    #[error("Failed to parse voice file: {0}")]
    VoiceParse(String),
}

/// Internal Kokoro ONNX model state.
pub struct KokoroModel {
    session: Session,
    voice_store: VoiceStore,
    vocab: HashMap<char, i64>,
    /// Detected input name: "input_ids" or "tokens"
    tokens_input_name: String,
    /// True if the speed input expects int32, false for float32
    speed_is_int32: bool,
}

impl KokoroModel {
    /// Load the Kokoro model and its voice bank.
    ///
    /// If a `config.json` sits next to the model file its `vocab` table is
    /// used, otherwise the built-in vocabulary.
    pub fn load(
        model_path: &Path,
        voices_path: &Path,
        num_threads: Option<usize>,
        optimized_cache_path: Option<&Path>,
    ) -> Result<Self, KokoroError> {
        if !model_path.is_file() {
            return Err(KokoroError::ModelNotFound(model_path.to_path_buf()));
        }
        if !voices_path.is_file() {
            return Err(KokoroError::VoicesNotFound(voices_path.to_path_buf()));
        }

        let voice_store = VoiceStore::load(voices_path)?;

        log::info!("Loading Kokoro model from {}", model_path.display());
        let session = init_session(model_path, num_threads, optimized_cache_path)?;

        let tokens_input_name = detect_tokens_input(&session);
        let speed_is_int32 = detect_speed_type(&session);

        log::info!(
            "Detected: tokens_input='{}', speed_is_int32={}",
            tokens_input_name,
            speed_is_int32
        );

        let config_path = model_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("config.json");
        let vocab = if config_path.is_file() {
            log::info!("Loading vocab from {}", config_path.display());
            super::vocab::load_vocab(&config_path)?
        } else {
            log::warn!("config.json not found, using hardcoded vocab");
            super::vocab::hardcoded_vocab()
        };

        Ok(Self {
            session,
            voice_store,
            vocab,
            tokens_input_name,
            speed_is_int32,
        })
    }

    /// Synthesize audio from text using the given voice, speed and language.
    pub fn synthesize_text(
        &mut self,
        text: &str,
        voice_name: &str,
        speed: f32,
        lang: &str,
        style_idx_override: Option<usize>,
        espeak: &EspeakConfig,
    ) -> Result<Vec<f32>, KokoroError> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(KokoroError::InvalidSpeed(speed));
        }
        // Fail on an unknown voice before spawning espeak-ng.
        self.voice_store.get_style(voice_name, 0)?;

        let ids = phonemize(text, lang, &self.vocab, espeak)?;
        if ids.is_empty() {
            log::warn!("No phoneme tokens produced for text: {text:?}");
            return Ok(vec![]);
        }

        // Keep a stable style index so adjacent chunks don't change prosody
        // based on chunk length.
        let style_idx = style_idx_override.unwrap_or(ids.len());
        let style = self.voice_store.get_style(voice_name, style_idx)?;
        let estimated_samples = ids.len() * 300;
        let chunks = if ids.len() > MAX_PHONEME_LEN {
            log::debug!(
                "Kokoro phoneme sequence exceeded limit ({} > {}), chunking",
                ids.len(),
                MAX_PHONEME_LEN
            );
            split_chunks(&ids)
        } else {
            vec![ids]
        };

        let mut combined = Vec::with_capacity(estimated_samples);
        for chunk_ids in &chunks {
            let audio = self.synthesize_chunk(chunk_ids, &style, speed)?;
            if audio.is_empty() {
                continue;
            }

            if combined.is_empty() {
                combined.extend_from_slice(&audio);
            } else {
                append_with_crossfade(&mut combined, &audio, CHUNK_CROSSFADE_SAMPLES);
            }
        }

        Ok(combined)
    }

    /// Run ONNX inference on a single chunk of phoneme token IDs.
    fn synthesize_chunk(
        &mut self,
        tokens: &[i64],
        style: &[f32; STYLE_DIM],
        speed: f32,
    ) -> Result<Vec<f32>, KokoroError> {
        let tokens_arr = Array2::from_shape_vec((1, tokens.len() + 2), pad_tokens(tokens))?;
        let style_view = ndarray::ArrayView2::from_shape((1, STYLE_DIM), style.as_slice())?;

        let output = if self.speed_is_int32 {
            let speed_arr = ndarray::arr1(&[speed.round() as i32]);
            let inputs = inputs![
                self.tokens_input_name.as_str() => TensorRef::from_array_view(tokens_arr.view())?,
                "style" => TensorRef::from_array_view(style_view)?,
                "speed" => TensorRef::from_array_view(speed_arr.view())?,
            ];
            self.session.run(inputs)?
        } else {
            let speed_arr = ndarray::arr1(&[speed]);
            let inputs = inputs![
                self.tokens_input_name.as_str() => TensorRef::from_array_view(tokens_arr.view())?,
                "style" => TensorRef::from_array_view(style_view)?,
                "speed" => TensorRef::from_array_view(speed_arr.view())?,
            ];
            self.session.run(inputs)?
        };

        let (_, waveform) = output
            .iter()
            .next()
            .ok_or_else(|| KokoroError::Ort(ort::Error::new("No output from model")))?;
        let waveform = waveform.try_extract_array::<f32>()?;

        Ok(waveform.iter().copied().collect())
    }

    /// List all available voice names.
    pub fn list_voices(&self) -> Vec<&str> {
        self.voice_store.list_voices()
    }
}

/// Initialize an ONNX session with optional on-disk graph caching.
///
/// The first load with a cache path runs Level3 optimization and serialises
/// the result there; later loads read that file at `Disable` level.
fn init_session(
    onnx_path: &Path,
    num_threads: Option<usize>,
    optimized_cache_path: Option<&Path>,
) -> Result<Session, KokoroError> {
    let providers = vec![CPUExecutionProvider::default().build()];

    let (load_path, opt_level, write_cache) = match optimized_cache_path {
        Some(cache) if cache.exists() => {
            log::info!(
                "Loading pre-optimized Kokoro graph from {} (skipping Level3)",
                cache.display()
            );
            (cache, GraphOptimizationLevel::Disable, None)
        }
        Some(cache) => {
            log::info!(
                "First load: running Level3 optimization; saving graph to {}",
                cache.display()
            );
            (onnx_path, GraphOptimizationLevel::Level3, Some(cache))
        }
        None => (onnx_path, GraphOptimizationLevel::Level3, None),
    };

    let mut builder = Session::builder()?
        .with_optimization_level(opt_level)?
        .with_execution_providers(providers)?;

    if let Some(cache) = write_cache {
        builder = builder.with_optimized_model_path(cache)?;
    }

    if let Some(threads) = num_threads {
        builder = builder
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?;
    }

    Ok(builder.commit_from_file(load_path)?)
}

/// Detect the token input name ("input_ids" or "tokens") from session inputs.
fn detect_tokens_input(session: &Session) -> String {
    session
        .inputs()
        .iter()
        .map(|input| input.name())
        .find(|name| *name == "input_ids" || *name == "tokens")
        .unwrap_or("input_ids")
        .to_string()
}

/// Detect whether the speed input expects int32 (true) or float32 (false).
fn detect_speed_type(session: &Session) -> bool {
    match session.inputs().iter().find(|input| input.name() == "speed") {
        Some(input) => {
            let type_str = format!("{:?}", input.dtype());
            type_str.contains("Int32") || type_str.contains("int32")
        }
        // Modern Kokoro exports use int32.
        None => true,
    }
}

/// Surround token ids with the `0` boundary token Kokoro expects.
fn pad_tokens(tokens: &[i64]) -> Vec<i64> {
    let mut padded = Vec::with_capacity(tokens.len() + 2);
    padded.push(0);
    padded.extend_from_slice(tokens);
    padded.push(0);
    padded
}

/// Split phoneme IDs into chunks of at most `MAX_PHONEME_LEN`, preferring punctuation.
fn split_chunks(ids: &[i64]) -> Vec<Vec<i64>> {
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < ids.len() {
        let end = (start + MAX_PHONEME_LEN).min(ids.len());
        if end == ids.len() {
            chunks.push(ids[start..end].to_vec());
            break;
        }

        let split = ids[start..end]
            .iter()
            .rposition(|id| PUNCT_IDS.contains(id))
            .map(|i| start + i + 1)
            .unwrap_or(end);

        chunks.push(ids[start..split].to_vec());
        start = split;
    }

    chunks
}

fn append_with_crossfade(dst: &mut Vec<f32>, src: &[f32], crossfade_samples: usize) {
    let overlap = crossfade_samples.min(dst.len()).min(src.len());
    if overlap == 0 {
        dst.extend_from_slice(src);
        return;
    }

    let dst_start = dst.len() - overlap;
    for (i, &right) in src[..overlap].iter().enumerate() {
        let t = (i + 1) as f32 / (overlap as f32 + 1.0);
        dst[dst_start + i] = dst[dst_start + i] * (1.0 - t) + right * t;
    }

    dst.extend_from_slice(&src[overlap..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_tokens_with_boundary_zeros() {
        assert_eq!(pad_tokens(&[7, 8]), vec![0, 7, 8, 0]);
        assert_eq!(pad_tokens(&[]), vec![0, 0]);
    }

    #[test]
    fn short_sequences_stay_in_one_chunk() {
        let ids: Vec<i64> = (0..MAX_PHONEME_LEN as i64).map(|i| 16 + i % 50).collect();
        assert_eq!(split_chunks(&ids), vec![ids.clone()]);
    }

    #[test]
    fn long_sequences_split_after_last_punctuation() {
        let mut ids = vec![43i64; 600];
        ids[300] = 4; // '.'
        let chunks = split_chunks(&ids);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 301);
        assert_eq!(*chunks[0].last().unwrap(), 4);
        assert_eq!(chunks[1].len(), 299);
    }

    #[test]
    fn long_sequences_without_punctuation_split_at_limit() {
        let ids = vec![43i64; 1200];
        let chunks = split_chunks(&ids);

        assert_eq!(
            chunks.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![MAX_PHONEME_LEN, MAX_PHONEME_LEN, 180]
        );
    }

    #[test]
    fn crossfade_blends_overlap_and_keeps_tail() {
        let mut dst = vec![1.0; 10];
        let src = vec![0.0; 10];
        append_with_crossfade(&mut dst, &src, 4);

        assert_eq!(dst.len(), 16);
        assert_eq!(&dst[..6], &[1.0; 6]);
        assert!(dst[6] > dst[7] && dst[7] > dst[8] && dst[8] > dst[9]);
        assert!(dst[9] > 0.0);
        assert_eq!(&dst[10..], &[0.0; 6]);
    }

    #[test]
    fn crossfade_with_empty_destination_appends() {
        let mut dst = Vec::new();
        append_with_crossfade(&mut dst, &[0.5, 0.25], CHUNK_CROSSFADE_SAMPLES);
        assert_eq!(dst, vec![0.5, 0.25]);
    }

    #[test]
    fn load_reports_missing_model_before_touching_onnx() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("kokoro-v0_19.onnx");
        let voices = dir.path().join("voices.bin");

        match KokoroModel::load(&model, &voices, None, None) {
            Err(KokoroError::ModelNotFound(path)) => assert_eq!(path, model),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("load succeeded without a model"),
        }
    }

    #[test]
    fn load_reports_missing_voice_bank() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("kokoro-v0_19.onnx");
        std::fs::write(&model, b"not really onnx").unwrap();
        let voices = dir.path().join("voices.bin");

        assert!(matches!(
            KokoroModel::load(&model, &voices, None, None),
            Err(KokoroError::VoicesNotFound(_))
        ));
    }
}
