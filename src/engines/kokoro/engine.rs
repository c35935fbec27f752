use std::path::{Path, PathBuf};

use crate::bridge::SpeechRequest;
use crate::{SynthesisEngine, SynthesisResult};

use super::model::{KokoroError, KokoroModel, SAMPLE_RATE};
use super::phonemizer::{voice_lang, EspeakConfig};

/// Parameters for configuring Kokoro model loading.
#[derive(Debug, Clone, Default)]
pub struct KokoroModelParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
    /// Path for caching the Level3-optimized ONNX graph.
    ///
    /// The first load writes the optimized graph here; later loads read it
    /// back without re-running optimization. Must be writable.
    pub optimized_model_cache_path: Option<PathBuf>,
}

/// Parameters for configuring a Kokoro synthesis request.
#[derive(Debug, Clone)]
pub struct KokoroInferenceParams {
    /// Voice name (e.g. `"ko_1"`, `"af_heart"`).
    pub voice: String,
    /// Speech speed multiplier. Range: 0.5–2.0, default 1.0.
    pub speed: f32,
    /// espeak-ng language code. `None` derives it from the voice prefix.
    pub language: Option<String>,
    /// Override the style vector index. `None` = auto (uses phoneme token count).
    pub style_index: Option<usize>,
}

impl Default for KokoroInferenceParams {
    fn default() -> Self {
        Self {
            voice: crate::bridge::DEFAULT_VOICE.to_string(),
            speed: 1.0,
            language: None,
            style_index: None,
        }
    }
}

impl KokoroInferenceParams {
    /// The espeak-ng language this request will be phonemized with.
    pub fn resolved_language(&self) -> &str {
        self.language
            .as_deref()
            .unwrap_or_else(|| voice_lang(&self.voice))
    }
}

impl From<&SpeechRequest> for KokoroInferenceParams {
    fn from(request: &SpeechRequest) -> Self {
        Self {
            voice: request.voice().to_string(),
            speed: request.speed(),
            language: Some(request.language().to_string()),
            style_index: None,
        }
    }
}

/// Kokoro text-to-speech engine.
///
/// Wraps the Kokoro-82M ONNX model and a voice bank. Requires espeak-ng for
/// phonemization.
///
/// ```rust,no_run
/// use kokoro_bridge::{SynthesisEngine, engines::kokoro::KokoroEngine};
/// use std::path::Path;
///
/// let mut engine = KokoroEngine::new();
/// engine.load_model(Path::new("kokoro-v0_19.onnx"), Path::new("voices.bin"))?;
/// let result = engine.synthesize("안녕하세요", None)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct KokoroEngine {
    model: Option<KokoroModel>,
    espeak: EspeakConfig,
}

impl Default for KokoroEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KokoroEngine {
    /// Create a new engine that uses `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self::with_espeak(EspeakConfig::default())
    }

    /// Create a new engine with an explicit espeak-ng installation.
    pub fn with_espeak(espeak: EspeakConfig) -> Self {
        Self {
            model: None,
            espeak,
        }
    }

    /// List all available voice names (requires model to be loaded).
    pub fn list_voices(&self) -> Vec<&str> {
        self.model
            .as_ref()
            .map(|m| m.list_voices())
            .unwrap_or_default()
    }
}

impl Drop for KokoroEngine {
    fn drop(&mut self) {
        self.unload_model();
    }
}

impl SynthesisEngine for KokoroEngine {
    type SynthesisParams = KokoroInferenceParams;
    type ModelParams = KokoroModelParams;

    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        voices_path: &Path,
        params: Self::ModelParams,
    ) -> crate::Result<()> {
        let model = KokoroModel::load(
            model_path,
            voices_path,
            params.num_threads,
            params.optimized_model_cache_path.as_deref(),
        )?;
        log::info!("Kokoro voices available: {:?}", model.list_voices());
        self.model = Some(model);
        Ok(())
    }

    fn unload_model(&mut self) {
        self.model = None;
    }

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> crate::Result<SynthesisResult> {
        let model = self.model.as_mut().ok_or(KokoroError::ModelNotLoaded)?;

        let p = params.unwrap_or_default();
        let samples = model.synthesize_text(
            text,
            &p.voice,
            p.speed,
            p.resolved_language(),
            p.style_index,
            &self.espeak,
        )?;

        Ok(SynthesisResult::mono(samples, SAMPLE_RATE))
    }
}
