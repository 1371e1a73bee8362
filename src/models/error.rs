use thiserror::Error;

/// Errors that can occur while building or running a capture engine.
///
/// Construction-time errors (`InvalidConfig`, `PermissionDenied`,
/// `DeviceNotAvailable`) propagate to the caller synchronously. Per-frame
/// errors (`EncodeFailed`, `DecodeFailed`, `Storage`) are contained inside
/// the capture loop and never cross the thread boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("encode failed: {0}")]
    EncodeFailed(String),

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("storage error: {0}")]
    Storage(String),
}
