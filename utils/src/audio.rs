use base64::Engine;
use ringbuf::HeapRb;
use rubato::{FastFixedIn, PolynomialDegree};

/// Sample rate the service expects for microphone audio.
pub const CAPTURE_SAMPLE_RATE: f64 = 16_000.0;
/// Sample rate of synthesized audio returned by the service.
pub const PLAYBACK_SAMPLE_RATE: f64 = 24_000.0;

const PCM16_SCALE: f32 = 32_768.0;

/// Creates a resampler to convert between audio sample rates.
pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1,
    )?;
    Ok(resampler)
}

/// Splits samples into fixed-size chunks, zero-padding the last one.
pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples
        .chunks(chunk_size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            chunk.resize(chunk_size, 0.0);
            chunk
        })
        .collect()
}

/// Heap ring buffer shared between the playout task and the output stream.
pub fn shared_buffer(size: usize) -> HeapRb<f32> {
    HeapRb::new(size)
}

/// Encodes raw bytes into the printable transport form. Lossless and
/// bijective with [`decode_bytes`].
pub fn encode_bytes(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decodes the printable transport form back into raw bytes.
pub fn decode_bytes(encoded: &str) -> anyhow::Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::STANDARD.decode(encoded)?)
}

/// Encodes normalized f32 samples as transport-encoded little-endian PCM16.
pub fn encode(pcm32: &[f32]) -> String {
    let pcm16: Vec<u8> = pcm32
        .iter()
        .flat_map(|&sample| {
            let v = (sample * PCM16_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            v.to_le_bytes()
        })
        .collect();
    encode_bytes(&pcm16)
}

/// Decodes a transport-encoded PCM16 fragment into normalized f32 samples.
/// A malformed fragment decodes to silence rather than failing the stream.
pub fn decode(fragment: &str) -> Vec<f32> {
    match decode_bytes(fragment) {
        Ok(pcm16) => pcm16_bytes_to_f32(&pcm16),
        Err(e) => {
            tracing::error!("failed to decode audio fragment: {}", e);
            Vec::new()
        }
    }
}

/// Interprets little-endian PCM16 bytes as normalized f32 samples.
pub fn pcm16_bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|chunk| {
            let v = i16::from_le_bytes([chunk[0], chunk[1]]);
            v as f32 / PCM16_SCALE
        })
        .collect()
}

/// Converts normalized f32 samples to PCM16, clamping out-of-range input.
pub fn convert_f32_to_i16(pcm32: &[f32]) -> Vec<i16> {
    pcm32
        .iter()
        .map(|&sample| (sample * PCM16_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Converts PCM16 samples to normalized f32.
pub fn convert_i16_to_f32(pcm16: &[i16]) -> Vec<f32> {
    pcm16
        .iter()
        .map(|&sample| sample as f32 / PCM16_SCALE)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm16_round_trip_stays_within_one_quantization_step() {
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 / 500.0) - 1.0).collect();
        let recovered = convert_i16_to_f32(&convert_f32_to_i16(&samples));
        for (x, y) in samples.iter().zip(recovered.iter()) {
            assert!(
                (x - y).abs() <= 1.0 / 32_768.0,
                "sample {} recovered as {}",
                x,
                y
            );
        }
    }

    #[test]
    fn out_of_range_samples_clamp_instead_of_wrapping() {
        let converted = convert_f32_to_i16(&[1.5, -1.5, 1.0]);
        assert_eq!(converted[0], i16::MAX);
        assert_eq!(converted[1], i16::MIN);
        assert_eq!(converted[2], i16::MAX);
    }

    #[test]
    fn transport_encoding_is_a_bijection_on_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        let encoded = encode_bytes(&bytes);
        assert_eq!(decode_bytes(&encoded).unwrap(), bytes);
    }

    #[test]
    fn encode_decode_round_trip() {
        let samples = vec![0.0, 0.25, -0.25, 0.5, -0.5, 0.999];
        let recovered = decode(&encode(&samples));
        assert_eq!(recovered.len(), samples.len());
        for (x, y) in samples.iter().zip(recovered.iter()) {
            assert!((x - y).abs() <= 1.0 / 32_768.0);
        }
    }

    #[test]
    fn malformed_fragment_decodes_to_silence() {
        assert!(decode("not base64!!!").is_empty());
    }

    #[test]
    fn split_pads_final_chunk() {
        let chunks = split_for_chunks(&[1.0, 2.0, 3.0], 2);
        assert_eq!(chunks, vec![vec![1.0, 2.0], vec![3.0, 0.0]]);
    }
}
