use super::synthesis_repository::SynthesisError;

/// Wrap raw little-endian PCM samples in a RIFF/WAV container.
///
/// Providers return headerless PCM for the linear encoding; the stored
/// object is a playable WAV file.
pub(crate) fn pcm_to_wav(
    pcm: &[u8],
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> Vec<u8> {
    let byte_rate = sample_rate * u32::from(channels) * u32::from(bits_per_sample / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format tag
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}

/// Parse an `s3://bucket/key` URI into its bucket and object key.
pub(crate) fn parse_s3_uri(uri: &str) -> Result<(String, String), SynthesisError> {
    let rest = uri.strip_prefix("s3://").ok_or_else(|| {
        SynthesisError::InvalidRequest(format!("unsupported output uri scheme: {uri}"))
    })?;

    let (bucket, key) = rest.split_once('/').ok_or_else(|| {
        SynthesisError::InvalidRequest(format!("output uri has no object key: {uri}"))
    })?;

    if bucket.is_empty() || key.is_empty() {
        return Err(SynthesisError::InvalidRequest(format!(
            "output uri has an empty bucket or key: {uri}"
        )));
    }

    Ok((bucket.to_string(), key.to_string()))
}
