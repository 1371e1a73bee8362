//! # opus-recorder
//!
//! Continuous microphone capture with an optional Opus encode/decode
//! round trip and lazily-opened file sinks.
//!
//! A background worker pulls fixed-size frames from a blocking
//! `AudioSource`, optionally runs them through a `FrameCodec`, and fans
//! each frame out to up to three headerless byte streams (raw PCM, Opus
//! packets, decoded PCM) plus a listener callback. Platform capture
//! primitives implement the `AudioSource` trait and plug into the generic
//! `CaptureEngine`.
//!
//! ## Architecture
//!
//! ```text
//! opus-recorder
//! ├── traits/   ← AudioSource, FrameCodec (capability boundaries)
//! ├── models/   ← CaptureConfig, FrameGeometry, EngineState, CaptureError
//! ├── codec/    ← OpusCodec (default FrameCodec, via libopus)
//! ├── storage/  ← FrameSink (lazy append-mode byte sink)
//! └── engine/   ← CaptureEngine (capture/transform/fan-out loop)
//! ```

pub mod codec;
pub mod engine;
pub mod models;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use codec::opus::OpusCodec;
pub use engine::capture_engine::{CaptureDiagnostics, CaptureEngine, SinkPaths};
pub use models::config::{CaptureConfig, ChannelLayout, FrameDuration, InputSource, SampleFormat};
pub use models::error::CaptureError;
pub use models::geometry::{FrameGeometry, OPUS_FRAME_SIZES};
pub use models::state::EngineState;
pub use storage::frame_sink::{FrameSink, PathProvider};
pub use traits::audio_source::AudioSource;
pub use traits::frame_codec::FrameCodec;
