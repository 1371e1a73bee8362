pub mod audio_source;
pub mod frame_codec;
