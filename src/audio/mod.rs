//! Music playback
//!
//! Ogg Vorbis files are decoded up front with lewton and played through the
//! default cpal output device. [`DeviceTrack`] is the `AudioTrack` the
//! animation cues drive.

mod decode;
mod output;

pub use decode::{decode_ogg, PcmClip};
pub use output::{render_frames, DeviceTrack, PlaybackState};

/// Errors raised while opening a playback track
#[derive(Debug)]
pub enum AudioError {
    Io(std::io::Error),
    /// The file is not a readable Ogg Vorbis stream
    Decode(lewton::VorbisError),
    /// The stream decoded to no samples
    Empty,
    /// No default output device
    NoDevice,
    Config(cpal::DefaultStreamConfigError),
    Stream(cpal::BuildStreamError),
    Play(cpal::PlayStreamError),
    UnsupportedFormat(cpal::SampleFormat),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::Io(e) => write!(f, "IO error: {}", e),
            AudioError::Decode(e) => write!(f, "Vorbis decode error: {}", e),
            AudioError::Empty => write!(f, "Audio file has no samples"),
            AudioError::NoDevice => write!(f, "No default output device"),
            AudioError::Config(e) => write!(f, "Failed to get output config: {}", e),
            AudioError::Stream(e) => write!(f, "Failed to build stream: {}", e),
            AudioError::Play(e) => write!(f, "Failed to start stream: {}", e),
            AudioError::UnsupportedFormat(format) => {
                write!(f, "Unsupported sample format: {:?}", format)
            }
        }
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(e: std::io::Error) -> Self {
        AudioError::Io(e)
    }
}

impl From<lewton::VorbisError> for AudioError {
    fn from(e: lewton::VorbisError) -> Self {
        AudioError::Decode(e)
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        AudioError::Config(e)
    }
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(e: cpal::BuildStreamError) -> Self {
        AudioError::Stream(e)
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(e: cpal::PlayStreamError) -> Self {
        AudioError::Play(e)
    }
}
