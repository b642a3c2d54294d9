//! Audio cues paired with animation clips
//!
//! The manager drives each cue through [`AudioTrack`]. The shipped music cue
//! is a [`DeviceTrack`] on the default output device.

use std::collections::HashMap;
use std::path::Path;

use crate::audio::DeviceTrack;

/// Clip whose playback is paired with the music track
pub const MUSIC_CLIP: &str = "PlayMusic";

/// Music file, relative to the asset root
pub const MUSIC_SOURCE: &str = "sounds/music.ogg";

/// A controllable audio track
pub trait AudioTrack {
    fn play(&mut self);
    fn pause(&mut self);
    /// Seek back to the start
    fn rewind(&mut self);
    fn set_muted(&mut self, muted: bool);
    fn is_paused(&self) -> bool;
    fn is_muted(&self) -> bool;
}

/// State-only track for tests
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct CueTrack {
    pub source: String,
    pub looping: bool,
    paused: bool,
    muted: bool,
    /// Times the track was (re)started from paused
    play_count: u32,
    /// Times the track was reset to the start
    rewind_count: u32,
}

#[cfg(test)]
impl CueTrack {
    pub fn new(source: impl Into<String>, looping: bool) -> Self {
        Self {
            source: source.into(),
            looping,
            paused: true,
            muted: false,
            play_count: 0,
            rewind_count: 0,
        }
    }

    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    pub fn rewind_count(&self) -> u32 {
        self.rewind_count
    }
}

#[cfg(test)]
impl AudioTrack for CueTrack {
    fn play(&mut self) {
        if self.paused {
            self.play_count += 1;
        }
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn rewind(&mut self) {
        self.rewind_count += 1;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}

/// Clip name -> paired audio track
#[derive(Default)]
pub struct AudioCues {
    tracks: HashMap<String, Box<dyn AudioTrack>>,
}

impl std::fmt::Debug for AudioCues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.tracks.keys().collect();
        names.sort();
        f.debug_struct("AudioCues").field("clips", &names).finish()
    }
}

impl AudioCues {
    /// No cues
    pub fn new() -> Self {
        Self::default()
    }

    /// The shipped catalog: looping music paired with [`MUSIC_CLIP`]
    ///
    /// Without a readable music file or an output device the catalog is
    /// empty and the clip plays silently.
    pub fn builtin(asset_root: &Path) -> Self {
        let path = asset_root.join(MUSIC_SOURCE);
        match DeviceTrack::open(&path, true) {
            Ok(track) => Self::new().with_track(MUSIC_CLIP, Box::new(track)),
            Err(e) => {
                tracing::warn!("Music unavailable from {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// [`MUSIC_CLIP`] paired with a [`CueTrack`]
    #[cfg(test)]
    pub(crate) fn cue_music() -> Self {
        Self::new().with_track(MUSIC_CLIP, Box::new(CueTrack::new(MUSIC_SOURCE, true)))
    }

    pub fn with_track(mut self, clip: impl Into<String>, track: Box<dyn AudioTrack>) -> Self {
        self.tracks.insert(clip.into(), track);
        self
    }

    pub fn get(&self, clip: &str) -> Option<&dyn AudioTrack> {
        self.tracks.get(clip).map(|t| t.as_ref())
    }

    pub fn get_mut(&mut self, clip: &str) -> Option<&mut (dyn AudioTrack + 'static)> {
        self.tracks.get_mut(clip).map(|t| t.as_mut())
    }

    /// Start the paired track if it is paused
    pub fn start(&mut self, clip: &str, muted: bool) {
        if let Some(track) = self.tracks.get_mut(clip) {
            if !track.is_paused() {
                return;
            }
            track.set_muted(muted);
            track.play();
            tracing::debug!("Audio cue started for {}", clip);
        }
    }

    /// Pause the paired track, optionally rewinding it
    pub fn pause(&mut self, clip: &str, rewind: bool) {
        if let Some(track) = self.tracks.get_mut(clip) {
            track.pause();
            if rewind {
                track.rewind();
            }
        }
    }

    /// Pause and rewind every track
    pub fn reset_all(&mut self) {
        for track in self.tracks.values_mut() {
            track.pause();
            track.rewind();
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        for track in self.tracks.values_mut() {
            track.set_muted(muted);
        }
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }
}
