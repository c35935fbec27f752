//! In-memory WAV encoding.

use std::io::Cursor;

use crate::{Error, Result, SynthesisResult};

/// Bit depth of the encoded PCM samples.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Encode synthesized audio as a RIFF/WAVE buffer of 16-bit signed PCM.
///
/// Samples are clamped to `[-1.0, 1.0]` before scaling, so out-of-range model
/// output saturates instead of wrapping. An empty sample buffer produces a
/// valid header-only file.
pub fn encode_pcm16(audio: &SynthesisResult) -> Result<Vec<u8>> {
    validate(audio)?;

    let spec = hound::WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };

    // 44-byte canonical header plus two bytes per sample.
    let mut cursor = Cursor::new(Vec::with_capacity(44 + audio.samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    {
        let mut pcm = writer.get_i16_writer(audio.samples.len() as u32);
        for &sample in &audio.samples {
            pcm.write_sample(to_pcm16(sample));
        }
        pcm.flush()?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

/// Convert a float sample to 16-bit PCM, saturating at full scale.
pub fn to_pcm16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn validate(audio: &SynthesisResult) -> Result<()> {
    if audio.sample_rate == 0 {
        return Err(Error::InvalidAudio("sample rate must be positive".to_string()));
    }
    if audio.channels == 0 {
        return Err(Error::InvalidAudio("channel count must be positive".to_string()));
    }
    if audio.samples.len() % audio.channels as usize != 0 {
        return Err(Error::InvalidAudio(format!(
            "{} samples do not divide into {} channels",
            audio.samples.len(),
            audio.channels
        )));
    }
    if audio.samples.len() > u32::MAX as usize / 2 {
        return Err(Error::InvalidAudio(format!(
            "{} samples exceed the WAV size limit",
            audio.samples.len()
        )));
    }
    Ok(())
}
