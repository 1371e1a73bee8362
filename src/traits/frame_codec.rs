use crate::models::error::CaptureError;

/// Frame-based encode/decode capability consumed by the capture engine.
///
/// One instance per engine, bound to a single sample-rate/channel/frame-size
/// triple for its lifetime. The engine never retries a failed call: an
/// encode or decode error skips that frame's transformed sinks and the loop
/// moves on.
pub trait FrameCodec: Send {
    /// Encode exactly one frame of interleaved PCM bytes into a packet.
    ///
    /// Fails if the input length does not match the configured frame size.
    fn encode(&mut self, pcm: &[u8]) -> Result<Vec<u8>, CaptureError>;

    /// Decode a previously encoded packet back to PCM bytes.
    fn decode(&mut self, packet: &[u8]) -> Result<Vec<u8>, CaptureError>;
}
