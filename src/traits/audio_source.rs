use crate::models::error::CaptureError;

/// Interface for platform blocking audio-capture primitives.
///
/// Implementations acquire the hardware device in their constructor (the
/// `open` boundary): that is where `CaptureError::PermissionDenied` or
/// `CaptureError::DeviceNotAvailable` surface, before the engine ever sees
/// the source. The engine assumes capture permission has already been
/// granted by the caller.
pub trait AudioSource: Send {
    /// Begin delivering samples. The engine guards against calling this
    /// twice without an intervening `stop_capturing`.
    fn start_capturing(&mut self) -> Result<(), CaptureError>;

    /// Blocking read: fills up to `buf.len()` bytes and returns the count
    /// actually read, which may be shorter. This is the capture loop's sole
    /// suspension point.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError>;

    /// Stop delivering samples. Reversible: the source can be restarted.
    fn stop_capturing(&mut self) -> Result<(), CaptureError>;

    /// Release the hardware handle. Terminal.
    fn release(&mut self) -> Result<(), CaptureError>;
}
