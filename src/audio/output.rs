//! Output device playback via cpal

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::decode::{decode_ogg, PcmClip};
use super::AudioError;
use crate::animation::AudioTrack;

/// Transport state shared with the output callback
#[derive(Debug)]
pub struct PlaybackState {
    playing: AtomicBool,
    muted: AtomicBool,
    looping: bool,
    /// Read head in source frames, stored as `f64` bits
    position: AtomicU64,
}

impl PlaybackState {
    /// Paused at the start
    pub fn new(looping: bool) -> Self {
        Self {
            playing: AtomicBool::new(false),
            muted: AtomicBool::new(false),
            looping,
            position: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Release);
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn position(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Acquire))
    }

    pub fn rewind(&self) {
        self.position.store(0f64.to_bits(), Ordering::Release);
    }
}

/// Fill one output buffer from `clip`
///
/// Writes silence while paused. A muted track still advances so unmuting
/// picks up where the music would be. Output channel `c` reads source channel
/// `min(c, channels - 1)` and the rate is converted by nearest-frame stepping.
/// A non-looping track stops itself at the end.
pub fn render_frames(
    clip: &PcmClip,
    state: &PlaybackState,
    out: &mut [f32],
    out_channels: usize,
    out_rate: u32,
) {
    out.fill(0.0);
    if out_channels == 0 || !state.is_playing() {
        return;
    }
    let frames = clip.frames();
    if frames == 0 {
        state.set_playing(false);
        return;
    }

    let src_channels = clip.channels as usize;
    let step = clip.sample_rate as f64 / out_rate.max(1) as f64;
    let end = frames as f64;
    let muted = state.is_muted();
    let start = state.position.load(Ordering::Acquire);
    let mut pos = f64::from_bits(start);

    for frame in out.chunks_mut(out_channels) {
        if pos >= end {
            if state.looping {
                pos %= end;
            } else {
                pos = end;
                state.set_playing(false);
                break;
            }
        }
        if !muted {
            let base = pos as usize * src_channels;
            for (c, sample) in frame.iter_mut().enumerate() {
                *sample = clip.samples[base + c.min(src_channels - 1)];
            }
        }
        pos += step;
    }

    // Losing the exchange means rewind() ran during this buffer
    let _ = state.position.compare_exchange(
        start,
        pos.to_bits(),
        Ordering::AcqRel,
        Ordering::Acquire,
    );
}

/// A decoded file playing through the default output device
pub struct DeviceTrack {
    source: PathBuf,
    frames: usize,
    state: Arc<PlaybackState>,
    _stream: cpal::Stream,
}

impl std::fmt::Debug for DeviceTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceTrack")
            .field("source", &self.source)
            .field("frames", &self.frames)
            .field("state", &self.state)
            .finish()
    }
}

impl DeviceTrack {
    /// Decode `path` and open a paused output stream for it
    pub fn open(path: impl AsRef<Path>, looping: bool) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let clip = Arc::new(decode_ogg(path)?);
        let state = Arc::new(PlaybackState::new(looping));
        let stream = build_stream(Arc::clone(&clip), Arc::clone(&state))?;
        stream.play()?;

        tracing::info!(
            "Audio track {} ready: {} Hz, {} channels, {:.1}s",
            path.display(),
            clip.sample_rate,
            clip.channels,
            clip.duration_secs()
        );

        Ok(Self {
            source: path.to_path_buf(),
            frames: clip.frames(),
            state,
            _stream: stream,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

fn build_stream(clip: Arc<PcmClip>, state: Arc<PlaybackState>) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
    let config = device.default_output_config()?;
    let channels = config.channels() as usize;
    let rate = config.sample_rate().0;

    let err_fn = |err| tracing::error!("Audio output error: {}", err);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                render_frames(&clip, &state, data, channels, rate);
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => {
            let mut scratch = Vec::new();
            device.build_output_stream(
                &config.into(),
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0.0);
                    render_frames(&clip, &state, &mut scratch, channels, rate);
                    for (out, &s) in data.iter_mut().zip(&scratch) {
                        *out = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    }
                },
                err_fn,
                None,
            )
        }
        cpal::SampleFormat::U16 => {
            let mut scratch = Vec::new();
            device.build_output_stream(
                &config.into(),
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0.0);
                    render_frames(&clip, &state, &mut scratch, channels, rate);
                    for (out, &s) in data.iter_mut().zip(&scratch) {
                        *out = ((s.clamp(-1.0, 1.0) + 1.0) * 0.5 * u16::MAX as f32) as u16;
                    }
                },
                err_fn,
                None,
            )
        }
        other => return Err(AudioError::UnsupportedFormat(other)),
    }?;

    Ok(stream)
}

impl AudioTrack for DeviceTrack {
    fn play(&mut self) {
        if !self.state.is_looping() && self.state.position() >= self.frames as f64 {
            self.state.rewind();
        }
        self.state.set_playing(true);
    }

    fn pause(&mut self) {
        self.state.set_playing(false);
    }

    fn rewind(&mut self) {
        self.state.rewind();
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.set_muted(muted);
    }

    fn is_paused(&self) -> bool {
        !self.state.is_playing()
    }

    fn is_muted(&self) -> bool {
        self.state.is_muted()
    }
}
