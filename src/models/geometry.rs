use super::config::CaptureConfig;
use super::error::CaptureError;

/// Frame sizes (samples per channel) that Opus accepts.
pub const OPUS_FRAME_SIZES: [usize; 11] = [
    120, 160, 240, 320, 480, 640, 960, 1280, 1920, 2560, 2880,
];

/// Buffer and frame sizing derived from a capture configuration.
///
/// `buffer_size_bytes` is bytes-per-millisecond times the requested frame
/// duration, computed in floating point and truncated — the intermediate is
/// legitimately fractional for 2.5 ms frames. A result that is zero or not a
/// whole number of samples is a configuration error, surfaced here before
/// any hardware resource is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Capture buffer size: one frame's worth of interleaved PCM bytes.
    pub buffer_size_bytes: usize,

    /// Samples per channel in one frame.
    pub samples_per_frame: usize,
}

impl FrameGeometry {
    pub fn for_config(config: &CaptureConfig) -> Result<Self, CaptureError> {
        config.validate()?;

        let channels = config.channels.count();
        let bytes = config.format.bytes_per_sample();
        let sample_stride = channels * bytes;

        let exact = config.sample_rate as f64 / 1000.0
            * sample_stride as f64
            * config.frame_duration.as_millis();
        let buffer_size_bytes = exact as usize;

        if buffer_size_bytes == 0 {
            return Err(CaptureError::InvalidConfig(format!(
                "frame of {}ms at {}Hz is empty",
                config.frame_duration.as_millis(),
                config.sample_rate
            )));
        }
        if buffer_size_bytes % sample_stride != 0 {
            return Err(CaptureError::InvalidConfig(format!(
                "buffer of {} bytes is not a whole number of {}-byte samples",
                buffer_size_bytes, sample_stride
            )));
        }

        Ok(Self {
            buffer_size_bytes,
            samples_per_frame: buffer_size_bytes / sample_stride,
        })
    }

    /// The Opus frame size for this geometry.
    ///
    /// Opus only operates on a fixed discrete set of frame sizes; any other
    /// `samples_per_frame` is a configuration error, reported at engine
    /// construction rather than at first encode.
    pub fn opus_frame_size(&self) -> Result<usize, CaptureError> {
        if OPUS_FRAME_SIZES.contains(&self.samples_per_frame) {
            Ok(self.samples_per_frame)
        } else {
            Err(CaptureError::InvalidConfig(format!(
                "{} samples per frame is not a valid Opus frame size",
                self.samples_per_frame
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::{ChannelLayout, FrameDuration, SampleFormat};

    fn config(
        sample_rate: u32,
        channels: ChannelLayout,
        format: SampleFormat,
        frame_duration: FrameDuration,
    ) -> CaptureConfig {
        CaptureConfig {
            sample_rate,
            channels,
            format,
            frame_duration,
            ..Default::default()
        }
    }

    #[test]
    fn sixty_ms_at_16k_mono_s16() {
        let geometry = FrameGeometry::for_config(&config(
            16000,
            ChannelLayout::Mono,
            SampleFormat::S16,
            FrameDuration::Ms60,
        ))
        .unwrap();

        assert_eq!(geometry.buffer_size_bytes, 1920);
        assert_eq!(geometry.samples_per_frame, 960);
        assert_eq!(geometry.opus_frame_size().unwrap(), 960);
    }

    #[test]
    fn fractional_duration_with_whole_byte_result() {
        // 16000 Hz / 1000 * 2 bytes * 2.5 ms = 80.0
        let geometry = FrameGeometry::for_config(&config(
            16000,
            ChannelLayout::Mono,
            SampleFormat::S16,
            FrameDuration::Ms2_5,
        ))
        .unwrap();

        assert_eq!(geometry.buffer_size_bytes, 80);
        assert_eq!(geometry.samples_per_frame, 40);
    }

    #[test]
    fn fractional_duration_truncating_to_partial_sample_is_rejected() {
        // 11025 Hz / 1000 * 2 bytes * 2.5 ms = 55.125 → 55, not a whole sample
        let err = FrameGeometry::for_config(&config(
            11025,
            ChannelLayout::Mono,
            SampleFormat::S16,
            FrameDuration::Ms2_5,
        ))
        .unwrap_err();

        assert!(matches!(err, CaptureError::InvalidConfig(_)));
    }

    #[test]
    fn buffer_is_positive_multiple_of_sample_stride_for_all_valid_geometries() {
        let rates = [11025u32, 16000, 22050, 44100];
        let layouts = [ChannelLayout::Mono, ChannelLayout::Stereo];
        let formats = [SampleFormat::S8, SampleFormat::S16, SampleFormat::S32];
        let durations = [
            FrameDuration::Ms2_5,
            FrameDuration::Ms5,
            FrameDuration::Ms10,
            FrameDuration::Ms20,
            FrameDuration::Ms40,
            FrameDuration::Ms60,
        ];

        for rate in rates {
            for layout in layouts {
                for format in formats {
                    for duration in durations {
                        let cfg = config(rate, layout, format, duration);
                        let Ok(geometry) = FrameGeometry::for_config(&cfg) else {
                            continue; // partial-sample combinations are rejected
                        };
                        let stride = layout.count() * format.bytes_per_sample();
                        assert!(geometry.buffer_size_bytes > 0);
                        assert_eq!(geometry.buffer_size_bytes % stride, 0, "{cfg:?}");
                        assert_eq!(
                            geometry.samples_per_frame,
                            geometry.buffer_size_bytes / stride
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn non_opus_frame_size_is_rejected() {
        // 16000 Hz * 5 ms = 80 samples per channel, not in the Opus set
        let geometry = FrameGeometry::for_config(&config(
            16000,
            ChannelLayout::Mono,
            SampleFormat::S16,
            FrameDuration::Ms5,
        ))
        .unwrap();

        assert_eq!(geometry.samples_per_frame, 80);
        assert!(matches!(
            geometry.opus_frame_size(),
            Err(CaptureError::InvalidConfig(_))
        ));
    }
}
