use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::model::KokoroError;

/// The subset of Kokoro's `config.json` the engine reads.
#[derive(Debug, Deserialize)]
struct KokoroConfig {
    vocab: HashMap<String, i64>,
}

/// Load the Kokoro vocabulary from a config.json file.
///
/// The config.json must contain a `"vocab"` field mapping single-character
/// strings to integer token IDs.
pub fn load_vocab(config_path: &Path) -> Result<HashMap<char, i64>, KokoroError> {
    let content = std::fs::read_to_string(config_path)?;
    parse_vocab(&content)
}

fn parse_vocab(content: &str) -> Result<HashMap<char, i64>, KokoroError> {
    let config: KokoroConfig = serde_json::from_str(content)
        .map_err(|e| KokoroError::Config(format!("Failed to parse JSON: {e}")))?;

    config
        .vocab
        .into_iter()
        .map(|(key, id)| {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Ok((ch, id)),
                _ => Err(KokoroError::Config(format!(
                    "vocab keys must be single characters, got {key:?}"
                ))),
            }
        })
        .collect()
}

/// Built-in vocabulary as runs of consecutive token ids.
///
/// Each entry is `(first_id, symbols)`: the n-th char of `symbols` maps to
/// `first_id + n`.
const VOCAB_RUNS: &[(i64, &str)] = &[
    (1, ";:,.!?"),
    (9, "—…\"()\u{201c}\u{201d} \u{0303}ʣʥʦʨᵝꭧ"),
    (24, "AI"),
    (31, "O"),
    (33, "Q"),
    (35, "ST"),
    (39, "W"),
    (41, "Yᵊabcdef"),
    (50, "hijklmnopqrstuvwxyzɑɐɒæ"),
    (75, "βɔɕç"),
    (80, "ɖðʤə"),
    (85, "ɚɛɜ"),
    (90, "ɟ"),
    (92, "ɡ"),
    (99, "ɥ"),
    (101, "ɨɪʝ"),
    (110, "ɯɰŋɳɲɴø"),
    (118, "ɸθœ"),
    (123, "ɹ"),
    (125, "ɾɻ"),
    (128, "ʁɽʂʃʈʧ"),
    (135, "ʊʋ"),
    (138, "ʌɣɤ"),
    (142, "χʎ"),
    (147, "ʒʔ"),
    (156, "ˈˌː"),
    (162, "ʰ"),
    (164, "ʲ"),
    (169, "↓"),
    (171, "→↗↘"),
    (177, "ᵻ"),
];

/// Hardcoded Kokoro vocabulary, used when no config.json sits next to the model.
pub fn hardcoded_vocab() -> HashMap<char, i64> {
    VOCAB_RUNS
        .iter()
        .flat_map(|&(first, symbols)| symbols.chars().zip(first..))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardcoded_vocab_matches_kokoro_ids() {
        let vocab = hardcoded_vocab();

        assert_eq!(vocab.len(), 114);
        assert_eq!(vocab[&';'], 1);
        assert_eq!(vocab[&'?'], 6);
        assert_eq!(vocab[&'—'], 9);
        assert_eq!(vocab[&' '], 16);
        assert_eq!(vocab[&'\u{0303}'], 17);
        assert_eq!(vocab[&'ꭧ'], 23);
        assert_eq!(vocab[&'a'], 43);
        assert_eq!(vocab[&'h'], 50);
        assert_eq!(vocab[&'z'], 68);
        assert_eq!(vocab[&'ə'], 83);
        assert_eq!(vocab[&'ɯ'], 110);
        assert_eq!(vocab[&'ˈ'], 156);
        assert_eq!(vocab[&'ᵻ'], 177);
        assert!(!vocab.contains_key(&'g'));
    }

    #[test]
    fn hardcoded_ids_are_unique() {
        let vocab = hardcoded_vocab();
        let mut ids: Vec<i64> = vocab.values().copied().collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), vocab.len());
    }

    #[test]
    fn parses_config_vocab() {
        let vocab = parse_vocab(r#"{"n_token": 178, "vocab": {"a": 43, "ə": 83, " ": 16}}"#)
            .unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab[&'ə'], 83);
    }

    #[test]
    fn rejects_config_without_vocab() {
        assert!(matches!(
            parse_vocab(r#"{"n_token": 178}"#),
            Err(KokoroError::Config(_))
        ));
    }

    #[test]
    fn rejects_multi_character_keys() {
        assert!(matches!(
            parse_vocab(r#"{"vocab": {"ab": 1}}"#),
            Err(KokoroError::Config(_))
        ));
    }

    #[test]
    fn loads_vocab_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"vocab": {";": 1}}"#).unwrap();

        assert_eq!(load_vocab(&path).unwrap()[&';'], 1);
    }
}
