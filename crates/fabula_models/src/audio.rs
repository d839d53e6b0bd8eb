//! Narration duration derivation.

use fabula_error::ServiceErrorKind;
use std::io::Cursor;

/// Playback length of a WAV payload in milliseconds.
///
/// The frame count comes from the header, clamped to the whole frames
/// actually present after the data chunk starts. Streaming encoders often
/// write a placeholder data length.
///
/// # Examples
///
/// ```
/// let spec = hound::WavSpec {
///     channels: 1,
///     sample_rate: 8000,
///     bits_per_sample: 16,
///     sample_format: hound::SampleFormat::Int,
/// };
/// let mut buf = std::io::Cursor::new(Vec::new());
/// let mut writer = hound::WavWriter::new(&mut buf, spec).unwrap();
/// for _ in 0..8000 {
///     writer.write_sample(0i16).unwrap();
/// }
/// writer.finalize().unwrap();
///
/// assert_eq!(fabula_models::wav_duration_ms(buf.get_ref()).unwrap(), 1000);
/// ```
pub fn wav_duration_ms(bytes: &[u8]) -> Result<i64, ServiceErrorKind> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| ServiceErrorKind::MalformedResponse(format!("invalid WAV audio: {}", e)))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 || spec.channels == 0 {
        return Err(ServiceErrorKind::MalformedResponse(
            "WAV header has zero sample rate or channels".to_string(),
        ));
    }

    let declared_frames = u64::from(reader.duration());
    // The reader stops at the first sample, so the cursor marks the data offset.
    let data_start = reader.into_inner().position();
    let data_len = (bytes.len() as u64).saturating_sub(data_start);

    let bytes_per_frame = u64::from(spec.channels) * u64::from(spec.bits_per_sample).div_ceil(8);
    let available_frames = data_len.checked_div(bytes_per_frame).unwrap_or(0);
    let frames = declared_frames.min(available_frames);

    let millis = frames * 1000 / u64::from(spec.sample_rate);
    i64::try_from(millis)
        .map_err(|_| ServiceErrorKind::MalformedResponse("WAV duration overflow".to_string()))
}

/// Bitrate the speech endpoint encodes MP3 narration at.
const MP3_BITRATE_KBPS: u64 = 128;

/// Playback length of a constant-bitrate MP3 payload.
pub fn mp3_duration_ms(bytes: &[u8]) -> i64 {
    let millis = (bytes.len() as u64) * 8 / MP3_BITRATE_KBPS;
    i64::try_from(millis).unwrap_or(i64::MAX)
}
