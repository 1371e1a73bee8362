use crate::models::config::{CaptureConfig, ChannelLayout, SampleFormat};
use crate::models::error::CaptureError;
use crate::models::geometry::FrameGeometry;
use crate::traits::frame_codec::FrameCodec;

// Largest packet libopus produces for one frame at maximum bitrate.
const MAX_PACKET_BYTES: usize = 4000;

/// Default `FrameCodec` backed by libopus via the `opus` crate.
///
/// Holds one encoder and one decoder, both initialized once at construction
/// and bound to the configuration's rate/channel/frame-size triple. Frames
/// are interleaved 16-bit little-endian PCM; the binding encodes `i16`
/// samples, so `SampleFormat::S16` is required.
#[derive(Debug)]
pub struct OpusCodec {
    encoder: opus::Encoder,
    decoder: opus::Decoder,
    channels: usize,
    frame_size: usize,
}

impl OpusCodec {
    /// Build an encoder/decoder pair for `config`.
    ///
    /// Fails if the format is not 16-bit, the sample rate has no Opus
    /// equivalent, or the frame geometry yields an invalid Opus frame size.
    pub fn new(config: &CaptureConfig) -> Result<Self, CaptureError> {
        if config.format != SampleFormat::S16 {
            return Err(CaptureError::InvalidConfig(
                "opus codec requires 16-bit PCM".into(),
            ));
        }

        let geometry = FrameGeometry::for_config(config)?;
        let frame_size = geometry.opus_frame_size()?;
        let opus_rate = opus_sample_rate(config.sample_rate)?;

        let channels = match config.channels {
            ChannelLayout::Mono => opus::Channels::Mono,
            ChannelLayout::Stereo => opus::Channels::Stereo,
        };

        let encoder = opus::Encoder::new(opus_rate, channels, opus::Application::Audio)
            .map_err(|e| CaptureError::InvalidConfig(format!("opus encoder init: {e}")))?;
        let decoder = opus::Decoder::new(opus_rate, channels)
            .map_err(|e| CaptureError::InvalidConfig(format!("opus decoder init: {e}")))?;

        Ok(Self {
            encoder,
            decoder,
            channels: config.channels.count(),
            frame_size,
        })
    }

    /// Samples per channel in one frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn expected_frame_bytes(&self) -> usize {
        self.frame_size * self.channels * 2
    }
}

impl FrameCodec for OpusCodec {
    fn encode(&mut self, pcm: &[u8]) -> Result<Vec<u8>, CaptureError> {
        let expected = self.expected_frame_bytes();
        if pcm.len() != expected {
            return Err(CaptureError::EncodeFailed(format!(
                "frame is {} bytes, codec expects {}",
                pcm.len(),
                expected
            )));
        }

        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        let mut packet = vec![0u8; MAX_PACKET_BYTES];
        let len = self
            .encoder
            .encode(&samples, &mut packet)
            .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;
        packet.truncate(len);
        Ok(packet)
    }

    fn decode(&mut self, packet: &[u8]) -> Result<Vec<u8>, CaptureError> {
        let mut samples = vec![0i16; self.frame_size * self.channels];
        let decoded = self
            .decoder
            .decode(packet, &mut samples, false)
            .map_err(|e| CaptureError::DecodeFailed(e.to_string()))?;

        let pcm = samples[..decoded * self.channels]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        Ok(pcm)
    }
}

/// Map a capture sample rate to the Opus rate the codec runs at.
///
/// Non-native rates follow the reference mapping to the nearest Opus rate;
/// the codec then treats the frame as if captured at that rate.
fn opus_sample_rate(sample_rate: u32) -> Result<u32, CaptureError> {
    match sample_rate {
        8000 | 12000 | 16000 | 24000 | 48000 => Ok(sample_rate),
        11025 => Ok(12000),
        22050 => Ok(24000),
        44100 => Ok(48000),
        other => Err(CaptureError::InvalidConfig(format!(
            "sample rate {other}Hz has no opus equivalent"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FrameDuration;

    fn s16_config(sample_rate: u32, frame_duration: FrameDuration) -> CaptureConfig {
        CaptureConfig {
            sample_rate,
            frame_duration,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_invalid_frame_size_at_construction() {
        // 16000 Hz * 5 ms = 80 samples, not an Opus frame size
        let err = OpusCodec::new(&s16_config(16000, FrameDuration::Ms5)).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_non_s16_format() {
        let config = CaptureConfig {
            format: SampleFormat::S8,
            ..s16_config(16000, FrameDuration::Ms20)
        };
        assert!(matches!(
            OpusCodec::new(&config),
            Err(CaptureError::InvalidConfig(_))
        ));
    }

    #[test]
    fn round_trip_preserves_frame_length() {
        let config = s16_config(16000, FrameDuration::Ms60);
        let mut codec = OpusCodec::new(&config).unwrap();
        assert_eq!(codec.frame_size(), 960);

        // A quiet ramp; content is lossy but the length invariant must hold.
        let frame: Vec<u8> = (0..960)
            .flat_map(|i| ((i % 128) as i16).to_le_bytes())
            .collect();
        assert_eq!(frame.len(), 1920);

        let packet = codec.encode(&frame).unwrap();
        assert!(!packet.is_empty());
        assert!(packet.len() < frame.len());

        let decoded = codec.decode(&packet).unwrap();
        assert_eq!(decoded.len(), frame.len());
    }

    #[test]
    fn encode_rejects_wrong_length_input() {
        let mut codec = OpusCodec::new(&s16_config(16000, FrameDuration::Ms20)).unwrap();
        let err = codec.encode(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, CaptureError::EncodeFailed(_)));
    }
}
