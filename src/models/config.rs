use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Logical hardware input selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Default,
    Microphone,
    VoiceCommunication,
}

/// Channel layout of the captured stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn count(&self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// Signed PCM sample width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    S8,
    S16,
    S32,
}

impl SampleFormat {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::S8 => 1,
            Self::S16 => 2,
            Self::S32 => 4,
        }
    }
}

/// Capture frame duration.
///
/// The set is closed: these are exactly the frame durations Opus accepts.
/// Durations outside the set cannot be expressed, which removes the
/// unchecked-integer-argument failure mode of passing a raw millisecond
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameDuration {
    #[serde(rename = "2.5ms")]
    Ms2_5,
    #[serde(rename = "5ms")]
    Ms5,
    #[serde(rename = "10ms")]
    Ms10,
    #[serde(rename = "20ms")]
    Ms20,
    #[serde(rename = "40ms")]
    Ms40,
    #[serde(rename = "60ms")]
    Ms60,
}

impl FrameDuration {
    /// Duration in milliseconds. Fractional for the 2.5 ms frame.
    pub fn as_millis(&self) -> f64 {
        match self {
            Self::Ms2_5 => 2.5,
            Self::Ms5 => 5.0,
            Self::Ms10 => 10.0,
            Self::Ms20 => 20.0,
            Self::Ms40 => 40.0,
            Self::Ms60 => 60.0,
        }
    }
}

/// Configuration for a capture engine, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Which hardware input to capture from.
    pub source: InputSource,

    /// Sample rate in Hz. Typical values: 11025, 16000, 22050, 44100.
    pub sample_rate: u32,

    /// Mono or stereo.
    pub channels: ChannelLayout,

    /// PCM sample width.
    pub format: SampleFormat,

    /// Frame duration pulled per blocking read.
    pub frame_duration: FrameDuration,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.sample_rate == 0 {
            return Err(CaptureError::InvalidConfig(
                "sample rate must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: InputSource::Microphone,
            sample_rate: 16000,
            channels: ChannelLayout::Mono,
            format: SampleFormat::S16,
            frame_duration: FrameDuration::Ms20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sample_rate() {
        let config = CaptureConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CaptureError::InvalidConfig(_))
        ));
    }

    #[test]
    fn parses_from_json() {
        let config: CaptureConfig = serde_json::from_str(
            r#"{
                "source": "microphone",
                "sample_rate": 44100,
                "channels": "stereo",
                "format": "s16",
                "frame_duration": "2.5ms"
            }"#,
        )
        .unwrap();

        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channels, ChannelLayout::Stereo);
        assert_eq!(config.frame_duration, FrameDuration::Ms2_5);
        config.validate().unwrap();
    }
}
