use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use serde::Deserialize;

use super::model::KokoroError;

/// Style vector dimension for Kokoro.
pub const STYLE_DIM: usize = 256;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Storage for all loaded voice style vectors.
///
/// Each voice is stored as a flat list of style vectors, where each vector
/// has 256 floats. The index into the list corresponds to the phoneme token
/// count, enabling prosody-consistent synthesis.
pub struct VoiceStore {
    voices: HashMap<String, Vec<[f32; STYLE_DIM]>>,
}

impl VoiceStore {
    /// Load a voice bank from disk.
    ///
    /// Two layouts are understood, detected from the file contents:
    /// - a `.npz` (numpy zip) archive with one `<voice>.npy` entry per voice,
    ///   which is what `voices.bin` ships as
    /// - a JSON object mapping voice names to nested float arrays, as in the
    ///   older `voices.json`
    pub fn load(path: &Path) -> Result<Self, KokoroError> {
        let data = std::fs::read(path)?;
        let store = Self::from_bytes(&data)?;
        log::info!("Loaded {} voices from {}", store.voices.len(), path.display());
        Ok(store)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, KokoroError> {
        let voices = if data.starts_with(ZIP_MAGIC) {
            parse_npz(data)?
        } else if data.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{') {
            parse_json(data)?
        } else {
            return Err(KokoroError::VoiceParse(
                "unrecognised voice bank format (expected .npz archive or JSON)".to_string(),
            ));
        };

        if voices.is_empty() {
            return Err(KokoroError::VoiceParse("voice bank contains no voices".to_string()));
        }
        Ok(Self { voices })
    }

    /// Get the style vector for a voice at the given index.
    ///
    /// The index is clamped to the valid range, so any index is safe.
    pub fn get_style(&self, voice: &str, idx: usize) -> Result<[f32; STYLE_DIM], KokoroError> {
        let styles = self
            .voices
            .get(voice)
            .ok_or_else(|| KokoroError::VoiceNotFound(voice.to_string()))?;

        let clamped = idx.min(styles.len().saturating_sub(1));
        Ok(styles[clamped])
    }

    /// List all available voice names in sorted order.
    pub fn list_voices(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.voices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn parse_npz(data: &[u8]) -> Result<HashMap<String, Vec<[f32; STYLE_DIM]>>, KokoroError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| KokoroError::VoiceParse(format!("Failed to open zip archive: {e}")))?;

    let mut voices = HashMap::new();
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| KokoroError::VoiceParse(format!("Failed to read zip entry {i}: {e}")))?;
        if entry.is_dir() {
            continue;
        }

        let raw_name = entry.name().to_string();
        let voice_name = raw_name.trim_end_matches(".npy");
        if voice_name.is_empty() {
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| KokoroError::VoiceParse(format!("Failed to read {raw_name}: {e}")))?;

        let floats = parse_npy(&bytes, &raw_name)?;
        voices.insert(voice_name.to_string(), into_styles(floats, &raw_name)?);
    }

    Ok(voices)
}

/// Arbitrarily nested JSON float arrays, e.g. `[[[f32; 256]; 1]; 511]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Nested {
    Value(f32),
    List(Vec<Nested>),
}

impl Nested {
    fn flatten_into(self, out: &mut Vec<f32>) {
        match self {
            Nested::Value(v) => out.push(v),
            Nested::List(items) => items.into_iter().for_each(|item| item.flatten_into(out)),
        }
    }
}

fn parse_json(data: &[u8]) -> Result<HashMap<String, Vec<[f32; STYLE_DIM]>>, KokoroError> {
    let raw: HashMap<String, Nested> = serde_json::from_slice(data)
        .map_err(|e| KokoroError::VoiceParse(format!("Failed to parse JSON voice bank: {e}")))?;

    raw.into_iter()
        .map(|(name, nested)| {
            let mut floats = Vec::new();
            nested.flatten_into(&mut floats);
            let styles = into_styles(floats, &name)?;
            Ok((name, styles))
        })
        .collect()
}

/// Group a flat float buffer into 256-wide style vectors.
fn into_styles(floats: Vec<f32>, name: &str) -> Result<Vec<[f32; STYLE_DIM]>, KokoroError> {
    if floats.is_empty() || floats.len() % STYLE_DIM != 0 {
        return Err(KokoroError::VoiceParse(format!(
            "{name}: float count {} is not a non-zero multiple of {STYLE_DIM} (style vector dim)",
            floats.len()
        )));
    }

    Ok(floats
        .chunks_exact(STYLE_DIM)
        .map(|chunk| {
            let mut style = [0f32; STYLE_DIM];
            style.copy_from_slice(chunk);
            style
        })
        .collect())
}

/// Parse a numpy .npy payload holding little-endian float32 data.
///
/// Only C-ordered `<f4` arrays are accepted; the shape is ignored beyond the
/// total element count.
fn parse_npy(data: &[u8], name: &str) -> Result<Vec<f32>, KokoroError> {
    if data.len() < 10 || !data.starts_with(NPY_MAGIC) {
        return Err(KokoroError::VoiceParse(format!(
            "{name}: invalid numpy magic bytes"
        )));
    }

    // Version 1 uses a u16 header length, versions 2 and 3 a u32.
    let (header_start, header_len) = match data[6] {
        1 => (10, u16::from_le_bytes([data[8], data[9]]) as usize),
        2 | 3 if data.len() >= 12 => (
            12,
            u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize,
        ),
        version => {
            return Err(KokoroError::VoiceParse(format!(
                "{name}: unsupported npy version {version}"
            )))
        }
    };
    let data_offset = header_start + header_len;
    if data.len() < data_offset {
        return Err(KokoroError::VoiceParse(format!(
            "{name}: header truncated (need {data_offset} bytes, got {})",
            data.len()
        )));
    }

    let header = String::from_utf8_lossy(&data[header_start..data_offset]);
    if !header.contains("'descr': '<f4'") {
        return Err(KokoroError::VoiceParse(format!(
            "{name}: expected little-endian float32 data, header was {}",
            header.trim()
        )));
    }
    if header.contains("'fortran_order': True") {
        return Err(KokoroError::VoiceParse(format!(
            "{name}: Fortran-ordered arrays are not supported"
        )));
    }

    let float_data = &data[data_offset..];
    if float_data.len() % 4 != 0 {
        return Err(KokoroError::VoiceParse(format!(
            "{name}: float data length {} is not a multiple of 4",
            float_data.len()
        )));
    }

    Ok(float_data
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
