//! Command-line surface of the `kokoro-bridge` binary.

use std::path::PathBuf;

use clap::builder::NonEmptyStringValueParser;
use clap::Parser;

use crate::bridge::{SpeechRequest, SpeechRequestBuilder, DEFAULT_VOICE};
use crate::engines::kokoro::{EspeakConfig, KokoroModelParams};
use crate::Result;

pub const DEFAULT_MODEL: &str = "kokoro-v0_19.onnx";
pub const DEFAULT_VOICES: &str = "voices.bin";

#[derive(Parser, Debug)]
#[command(name = "kokoro-bridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Synthesize speech with Kokoro and write 16-bit PCM WAV to stdout")]
pub struct Cli {
    /// Text to speak
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub text: String,

    /// Voice name from the voice bank
    #[arg(long, default_value = DEFAULT_VOICE)]
    pub voice: String,

    /// Kokoro ONNX model file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_MODEL)]
    pub model: PathBuf,

    /// Voice bank file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_VOICES)]
    pub voices: PathBuf,

    /// ONNX Runtime intra/inter-op thread count
    #[arg(long, value_name = "N", env = "KOKORO_BRIDGE_THREADS")]
    pub threads: Option<usize>,

    /// Cache file for the optimized ONNX graph
    #[arg(long, value_name = "PATH", env = "KOKORO_BRIDGE_OPTIMIZED_MODEL")]
    pub optimized_model_cache: Option<PathBuf>,

    /// espeak-ng executable to use instead of the one on PATH
    #[arg(long, value_name = "PATH", env = "KOKORO_BRIDGE_ESPEAK_BIN")]
    pub espeak_bin: Option<PathBuf>,

    /// Directory holding espeak-ng-data
    #[arg(long, value_name = "PATH", env = "KOKORO_BRIDGE_ESPEAK_DATA")]
    pub espeak_data: Option<PathBuf>,
}

impl Cli {
    /// The synthesis request described by the arguments.
    ///
    /// Speed and language are not exposed on the command line and keep their
    /// defaults (1.0, `ko`).
    pub fn request(&self) -> Result<SpeechRequest> {
        SpeechRequestBuilder::default()
            .text(self.text.as_str())
            .voice(self.voice.as_str())
            .build()
    }

    pub fn model_params(&self) -> KokoroModelParams {
        KokoroModelParams {
            num_threads: self.threads,
            optimized_model_cache_path: self.optimized_model_cache.clone(),
        }
    }

    pub fn espeak_config(&self) -> EspeakConfig {
        EspeakConfig {
            bin_path: self.espeak_bin.clone(),
            data_path: self.espeak_data.clone(),
        }
    }
}

/// Reduce a clap parse error to a one-line message without its `error: ` tag.
///
/// Only the first paragraph is kept; the usage block and `--help` hint that
/// clap appends are dropped.
pub fn usage_message(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let message = rendered
        .lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty())
        .take_while(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    match message.strip_prefix("error: ") {
        Some(rest) => rest.to_string(),
        None if message.is_empty() => "invalid arguments".to_string(),
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("kokoro-bridge").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_match_the_bridge_contract() {
        let cli = parse(&["--text", "안녕하세요"]).unwrap();

        assert_eq!(cli.text, "안녕하세요");
        assert_eq!(cli.voice, "ko_1");
        assert_eq!(cli.model, PathBuf::from("kokoro-v0_19.onnx"));
        assert_eq!(cli.voices, PathBuf::from("voices.bin"));
    }

    #[test]
    fn all_paths_can_be_overridden() {
        let cli = parse(&[
            "--text",
            "hi",
            "--voice",
            "af_heart",
            "--model",
            "/models/kokoro.onnx",
            "--voices",
            "/models/voices.json",
            "--threads",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.voice, "af_heart");
        assert_eq!(cli.model, PathBuf::from("/models/kokoro.onnx"));
        assert_eq!(cli.voices, PathBuf::from("/models/voices.json"));
        assert_eq!(cli.model_params().num_threads, Some(2));
    }

    #[test]
    fn text_is_required() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let message = usage_message(&err);
        assert!(message.contains("--text"), "{message}");
        assert!(!message.starts_with("error:"));
        assert!(!message.contains('\n'));
    }

    #[test]
    fn empty_text_is_rejected_by_the_parser() {
        let err = parse(&["--text", ""]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn whitespace_text_is_rejected_when_building_the_request() {
        let cli = parse(&["--text", "   "]).unwrap();
        assert!(matches!(cli.request(), Err(crate::Error::Usage(_))));
    }

    #[test]
    fn request_keeps_fixed_speed_and_language() {
        let cli = parse(&["--text", "안녕", "--voice", "ko_2"]).unwrap();
        let request = cli.request().unwrap();

        assert_eq!(request.text(), "안녕");
        assert_eq!(request.voice(), "ko_2");
        assert_eq!(request.speed(), 1.0);
        assert_eq!(request.language(), "ko");
    }

    #[test]
    fn espeak_overrides_are_forwarded() {
        let cli = parse(&["--text", "hi", "--espeak-bin", "/opt/espeak/bin/espeak-ng"]).unwrap();
        let config = cli.espeak_config();

        assert_eq!(
            config.bin_path,
            Some(PathBuf::from("/opt/espeak/bin/espeak-ng"))
        );
    }
}
