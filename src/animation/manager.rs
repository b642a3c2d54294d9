//! Named-clip playback on top of the mixer
//!
//! Tracks at most one action per clip name, pairs clips with audio cues,
//! and fires one-shot completion callbacks when the mixer reports that a
//! specific action finished.

use std::collections::{BTreeMap, HashMap};

use crate::scene::SceneGraph;

use super::audio::AudioCues;
use super::clip::AnimationClip;
use super::mixer::{Action, ActionId, AnimationMixer, LoopMode};
use super::routing::{InteractivePart, ToggleState};

/// Offset from the clip end for reverse playback, so the first update
/// doesn't land exactly on the boundary
pub const START_AT_END_EPSILON: f32 = 1e-4;

/// One-shot callback run when a specific action finishes
pub type CompletionCallback = Box<dyn FnOnce(&mut AnimationManager)>;

/// Options for [`AnimationManager::play`]
pub struct PlayOptions {
    pub looping: bool,
    /// Signed speed; negative plays backward
    pub time_scale: f32,
    pub clamp_when_finished: bool,
    /// Begin at `duration - ε` instead of 0
    pub start_at_end: bool,
    pub on_complete: Option<CompletionCallback>,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            looping: false,
            time_scale: 1.0,
            clamp_when_finished: true,
            start_at_end: false,
            on_complete: None,
        }
    }
}

impl std::fmt::Debug for PlayOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayOptions")
            .field("looping", &self.looping)
            .field("time_scale", &self.time_scale)
            .field("clamp_when_finished", &self.clamp_when_finished)
            .field("start_at_end", &self.start_at_end)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl PlayOptions {
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn with_clamp_when_finished(mut self, clamp: bool) -> Self {
        self.clamp_when_finished = clamp;
        self
    }

    pub fn with_start_at_end(mut self, start_at_end: bool) -> Self {
        self.start_at_end = start_at_end;
        self
    }

    pub fn with_on_complete(mut self, callback: impl FnOnce(&mut AnimationManager) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

/// Per-model animation controller
pub struct AnimationManager {
    /// Absent when the model had no clips
    mixer: Option<AnimationMixer>,
    /// Clip name -> the single tracked action for that name
    current: BTreeMap<String, ActionId>,
    listeners: Vec<(ActionId, CompletionCallback)>,
    audio: AudioCues,
    audio_muted: bool,
    toggle_states: HashMap<InteractivePart, ToggleState>,
    disposed: bool,
}

impl std::fmt::Debug for AnimationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationManager")
            .field("clips", &self.available_clips())
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .field("audio_muted", &self.audio_muted)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl AnimationManager {
    pub fn new(clips: Vec<AnimationClip>, audio: AudioCues) -> Self {
        let mixer = if clips.is_empty() {
            None
        } else {
            let names: Vec<&str> = clips.iter().map(|c| c.name.as_str()).collect();
            tracing::info!("Animation clips loaded: {:?}", names);
            Some(AnimationMixer::new(clips))
        };
        Self {
            mixer,
            current: BTreeMap::new(),
            listeners: Vec::new(),
            audio,
            audio_muted: false,
            toggle_states: HashMap::new(),
            disposed: false,
        }
    }

    pub fn has_mixer(&self) -> bool {
        self.mixer.is_some()
    }

    /// Start `name` from scratch, replacing any action already tracked for it
    ///
    /// Returns `None` and logs a warning when there is no mixer or no such
    /// clip.
    pub fn play(&mut self, name: &str, options: PlayOptions) -> Option<ActionId> {
        if self.disposed {
            return None;
        }
        let Some(mixer) = self.mixer.as_mut() else {
            tracing::warn!("No animation mixer available, can't play {}", name);
            return None;
        };
        let Some(clip_index) = mixer.clip_index(name) else {
            let names: Vec<&str> = mixer.clips().iter().map(|c| c.name.as_str()).collect();
            tracing::warn!("Animation \"{}\" not found (available: {:?})", name, names);
            return None;
        };

        if let Some(previous) = self.current.remove(name) {
            mixer.remove_action(previous);
            self.listeners.retain(|(id, _)| *id != previous);
        }

        let duration = mixer.clip(clip_index).map(|c| c.duration).unwrap_or(0.0);
        let id = mixer.create_action(clip_index)?;
        if let Some(action) = mixer.action_mut(id) {
            action.clamp_when_finished = options.clamp_when_finished;
            action.loop_mode = if options.looping {
                LoopMode::Repeat
            } else {
                LoopMode::Once
            };
            action.time = if options.start_at_end && duration > 0.0 {
                (duration - START_AT_END_EPSILON).max(0.0)
            } else {
                0.0
            };
            action.time_scale = options.time_scale;
        }

        self.audio.start(name, self.audio_muted);

        if let Some(callback) = options.on_complete {
            self.listeners.push((id, callback));
        }
        self.current.insert(name.to_string(), id);
        tracing::info!("Playing animation {} (time scale {})", name, options.time_scale);
        Some(id)
    }

    /// Pause the tracked action for `name` and its audio
    pub fn pause(&mut self, name: &str) -> Option<ActionId> {
        let id = *self.current.get(name)?;
        if let Some(action) = self.mixer.as_mut().and_then(|m| m.action_mut(id)) {
            action.paused = true;
        }
        self.audio.pause(name, false);
        Some(id)
    }

    /// Unpause the tracked action for `name`, optionally changing its speed
    ///
    /// Returns `None` when nothing is tracked for `name`.
    pub fn resume(&mut self, name: &str, time_scale: Option<f32>) -> Option<ActionId> {
        let id = *self.current.get(name)?;
        if let Some(action) = self.mixer.as_mut().and_then(|m| m.action_mut(id)) {
            if let Some(scale) = time_scale {
                action.time_scale = scale;
            }
            action.paused = false;
        }
        self.audio.start(name, self.audio_muted);
        Some(id)
    }

    /// Drop the tracked action for `name` and rewind its audio
    ///
    /// Completion callbacks registered for the dropped action are discarded.
    pub fn stop(&mut self, name: &str) {
        if let Some(id) = self.current.remove(name) {
            if let Some(mixer) = self.mixer.as_mut() {
                mixer.remove_action(id);
            }
            self.listeners.retain(|(listener, _)| *listener != id);
            self.audio.pause(name, true);
        }
    }

    /// Stop every tracked action and rewind every audio cue
    pub fn stop_all(&mut self) {
        let names: Vec<String> = self.current.keys().cloned().collect();
        for name in names {
            self.stop(&name);
        }
        self.audio.reset_all();
    }

    /// Whether the tracked action for `name` is enabled, unpaused and moving
    pub fn is_playing(&self, name: &str) -> bool {
        self.current_action_state(name)
            .map(Action::is_running)
            .unwrap_or(false)
    }

    pub fn available_clips(&self) -> Vec<&str> {
        self.mixer
            .as_ref()
            .map(|m| m.clips().iter().map(|c| c.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Tracked actions by clip name
    pub fn current_actions(&self) -> &BTreeMap<String, ActionId> {
        &self.current
    }

    pub fn current_action(&self, name: &str) -> Option<ActionId> {
        self.current.get(name).copied()
    }

    pub fn current_action_state(&self, name: &str) -> Option<&Action> {
        let id = self.current.get(name)?;
        self.mixer.as_ref()?.action(*id)
    }

    /// Live mixer actions playing the clip `name`
    pub fn active_action_count(&self, name: &str) -> usize {
        self.mixer
            .as_ref()
            .and_then(|m| m.clip_index(name).map(|index| m.actions_for_clip(index)))
            .unwrap_or(0)
    }

    /// Advance the mixer by `dt` seconds and fire completion callbacks
    pub fn update(&mut self, dt: f32, graph: &mut SceneGraph) {
        if self.disposed {
            return;
        }
        let Some(mixer) = self.mixer.as_mut() else {
            return;
        };
        let finished = mixer.update(dt, graph);

        for id in finished {
            let (fire, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.listeners)
                .into_iter()
                .partition(|(listener, _)| *listener == id);
            self.listeners = keep;
            for (_, callback) in fire {
                callback(self);
            }
        }
    }

    /// Set the mute flag on every audio cue; returns the new state
    pub fn set_audio_muted(&mut self, muted: bool) -> bool {
        self.audio_muted = muted;
        self.audio.set_muted(muted);
        self.audio_muted
    }

    pub fn toggle_audio_muted(&mut self) -> bool {
        self.set_audio_muted(!self.audio_muted)
    }

    pub fn is_audio_muted(&self) -> bool {
        self.audio_muted
    }

    pub fn audio(&self) -> &AudioCues {
        &self.audio
    }

    /// Click toggle state of an interactive part
    pub fn toggle_state(&self, part: InteractivePart) -> ToggleState {
        self.toggle_states.get(&part).copied().unwrap_or_default()
    }

    pub(crate) fn set_toggle_state(&mut self, part: InteractivePart, state: ToggleState) {
        self.toggle_states.insert(part, state);
    }

    /// Stop everything and release the mixer's actions
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop_all();
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.stop_all_actions();
        }
        self.listeners.clear();
        self.audio.reset_all();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::animation::audio::{AudioTrack, MUSIC_CLIP};
    use crate::animation::clip::{Interpolation, Track, TrackValues};

    fn clip(graph: &mut SceneGraph, name: &str, duration: f32) -> AnimationClip {
        let node = graph.add_node(name, None);
        AnimationClip::new(
            name,
            vec![Track {
                node,
                times: vec![0.0, duration],
                values: TrackValues::Translation(vec![Vec3::ZERO, Vec3::X]),
                interpolation: Interpolation::Linear,
            }],
        )
    }

    fn manager(graph: &mut SceneGraph) -> AnimationManager {
        let clips = vec![
            clip(graph, "Open", 1.0),
            clip(graph, "Play", 2.0),
            clip(graph, MUSIC_CLIP, 4.0),
        ];
        AnimationManager::new(clips, AudioCues::cue_music())
    }

    #[test]
    fn test_unknown_clip_leaves_actions_unchanged() {
        let mut graph = SceneGraph::new();
        let mut anim = manager(&mut graph);
        anim.play("Open", PlayOptions::default());
        let before = anim.current_actions().clone();

        assert!(anim.play("Missing", PlayOptions::default()).is_none());
        assert_eq!(anim.current_actions(), &before);
    }

    #[test]
    fn test_no_mixer_is_a_noop() {
        let mut graph = SceneGraph::new();
        let mut anim = AnimationManager::new(Vec::new(), AudioCues::new());
        assert!(!anim.has_mixer());
        assert!(anim.play("Open", PlayOptions::default()).is_none());
        assert!(anim.available_clips().is_empty());
        anim.update(0.1, &mut graph);
    }

    #[test]
    fn test_play_twice_keeps_one_action() {
        let mut graph = SceneGraph::new();
        let mut anim = manager(&mut graph);
        let first = anim.play("Open", PlayOptions::default()).unwrap();
        let second = anim.play("Open", PlayOptions::default()).unwrap();

        assert_ne!(first, second);
        assert_eq!(anim.active_action_count("Open"), 1);
        assert_eq!(anim.current_action("Open"), Some(second));
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let mut graph = SceneGraph::new();
        let mut anim = manager(&mut graph);
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        anim.play(
            "Open",
            PlayOptions::default().with_on_complete(move |_| counter.set(counter.get() + 1)),
        );

        anim.update(0.5, &mut graph);
        assert_eq!(fired.get(), 0);
        anim.update(0.6, &mut graph);
        assert_eq!(fired.get(), 1);
        anim.update(0.6, &mut graph);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_replaced_action_does_not_fire_old_callback() {
        let mut graph = SceneGraph::new();
        let mut anim = manager(&mut graph);
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        anim.play("Open", PlayOptions::default().with_on_complete(move |_| flag.set(true)));
        anim.play("Open", PlayOptions::default());

        anim.update(2.0, &mut graph);
        assert!(!fired.get());
    }

    #[test]
    fn test_completion_can_start_another_clip() {
        let mut graph = SceneGraph::new();
        let mut anim = manager(&mut graph);
        anim.play(
            "Open",
            PlayOptions::default().with_on_complete(|m| {
                m.play(MUSIC_CLIP, PlayOptions::default().with_looping(true));
            }),
        );
        anim.update(1.5, &mut graph);
        assert!(anim.is_playing(MUSIC_CLIP));
        assert!(!anim.audio().get(MUSIC_CLIP).unwrap().is_paused());
    }

    #[test]
    fn test_start_at_end_seeks_near_duration() {
        let mut graph = SceneGraph::new();
        let mut anim = manager(&mut graph);
        anim.play(
            "Play",
            PlayOptions::default().with_time_scale(-1.0).with_start_at_end(true),
        );
        let action = anim.current_action_state("Play").unwrap();
        assert!((action.time - (2.0 - START_AT_END_EPSILON)).abs() < 1e-6);
        assert_eq!(action.time_scale, -1.0);
    }

    #[test]
    fn test_pause_resume_and_stop() {
        let mut graph = SceneGraph::new();
        let mut anim = manager(&mut graph);
        anim.play(MUSIC_CLIP, PlayOptions::default().with_looping(true));
        assert!(anim.is_playing(MUSIC_CLIP));

        anim.pause(MUSIC_CLIP);
        assert!(!anim.is_playing(MUSIC_CLIP));
        assert!(anim.audio().get(MUSIC_CLIP).unwrap().is_paused());

        assert!(anim.resume(MUSIC_CLIP, Some(2.0)).is_some());
        assert!(anim.is_playing(MUSIC_CLIP));
        assert_eq!(anim.current_action_state(MUSIC_CLIP).unwrap().time_scale, 2.0);

        anim.stop(MUSIC_CLIP);
        assert!(anim.current_action(MUSIC_CLIP).is_none());
        assert_eq!(anim.active_action_count(MUSIC_CLIP), 0);
        assert!(anim.audio().get(MUSIC_CLIP).unwrap().is_paused());
        assert!(anim.resume(MUSIC_CLIP, None).is_none());
    }

    #[test]
    fn test_mute_propagates_to_audio() {
        let mut graph = SceneGraph::new();
        let mut anim = manager(&mut graph);
        assert!(anim.set_audio_muted(true));
        assert!(anim.audio().get(MUSIC_CLIP).unwrap().is_muted());
        assert!(!anim.toggle_audio_muted());
        assert!(!anim.is_audio_muted());
    }

    #[test]
    fn test_dispose_stops_everything() {
        let mut graph = SceneGraph::new();
        let mut anim = manager(&mut graph);
        anim.play("Open", PlayOptions::default());
        anim.play(MUSIC_CLIP, PlayOptions::default().with_looping(true));

        anim.dispose();
        assert!(anim.current_actions().is_empty());
        assert!(anim.audio().get(MUSIC_CLIP).unwrap().is_paused());
        assert!(anim.play("Open", PlayOptions::default()).is_none());
    }
}
