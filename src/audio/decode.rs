//! Ogg Vorbis decoding

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use lewton::inside_ogg::OggStreamReader;

use super::AudioError;

/// Interleaved PCM in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct PcmClip {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl PcmClip {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }
}

/// Decode a whole `.ogg` file into memory
pub fn decode_ogg(path: &Path) -> Result<PcmClip, AudioError> {
    let file = File::open(path)?;
    decode_stream(BufReader::new(file))
}

fn decode_stream<R: Read + Seek>(reader: R) -> Result<PcmClip, AudioError> {
    let mut stream = OggStreamReader::new(reader)?;
    let channels = stream.ident_hdr.audio_channels as u16;
    let sample_rate = stream.ident_hdr.audio_sample_rate;

    let mut samples = Vec::new();
    while let Some(packet) = stream.read_dec_packet_itl()? {
        samples.extend(packet.iter().map(|&s| s as f32 / 32768.0));
    }

    if channels == 0 || samples.is_empty() {
        return Err(AudioError::Empty);
    }
    Ok(PcmClip {
        samples,
        channels,
        sample_rate,
    })
}
