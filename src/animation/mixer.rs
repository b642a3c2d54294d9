//! Animation mixer and actions
//!
//! The mixer owns the clips of one model and the live actions playing them.
//! Each `update` advances every running action, reports the ones that ran
//! out, and writes the sampled pose into the scene graph.

use crate::scene::SceneGraph;

use super::clip::AnimationClip;

/// Handle to a live action; never reused within a mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(u64);

/// What happens when an action reaches the end of its clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Stop at the end and emit a finished event
    #[default]
    Once,
    /// Wrap around, in either direction
    Repeat,
}

/// A running instance of a clip
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    id: ActionId,
    clip: usize,
    /// Local time in seconds
    pub time: f32,
    /// Signed playback speed; negative plays backward
    pub time_scale: f32,
    pub loop_mode: LoopMode,
    /// Hold the end pose (paused) instead of disabling when a `Once` action ends
    pub clamp_when_finished: bool,
    pub paused: bool,
    pub enabled: bool,
}

impl Action {
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// Index of the clip inside the mixer
    pub fn clip_index(&self) -> usize {
        self.clip
    }

    /// Enabled, unpaused and moving
    pub fn is_running(&self) -> bool {
        self.enabled && !self.paused && self.time_scale != 0.0
    }
}

/// Per-model clip player
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    clips: Vec<AnimationClip>,
    actions: Vec<Action>,
    next_id: u64,
}

impl AnimationMixer {
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        Self {
            clips,
            actions: Vec::new(),
            next_id: 1,
        }
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name == name)
    }

    pub fn clip(&self, index: usize) -> Option<&AnimationClip> {
        self.clips.get(index)
    }

    /// Create a fresh action at time 0, enabled and unpaused
    pub fn create_action(&mut self, clip: usize) -> Option<ActionId> {
        self.clips.get(clip)?;
        let id = ActionId(self.next_id);
        self.next_id += 1;
        self.actions.push(Action {
            id,
            clip,
            time: 0.0,
            time_scale: 1.0,
            loop_mode: LoopMode::Once,
            clamp_when_finished: false,
            paused: false,
            enabled: true,
        });
        Some(id)
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut Action> {
        self.actions.iter_mut().find(|a| a.id == id)
    }

    /// Stop and forget an action; its pose is no longer applied
    pub fn remove_action(&mut self, id: ActionId) -> bool {
        let before = self.actions.len();
        self.actions.retain(|a| a.id != id);
        self.actions.len() != before
    }

    /// Remove every action
    pub fn stop_all_actions(&mut self) {
        self.actions.clear();
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Number of live actions bound to clip `clip`
    pub fn actions_for_clip(&self, clip: usize) -> usize {
        self.actions.iter().filter(|a| a.clip == clip).count()
    }

    /// Advance running actions by `dt` seconds and pose the graph
    ///
    /// Returns the ids of `Once` actions that reached an end during this
    /// update, in action order.
    pub fn update(&mut self, dt: f32, graph: &mut SceneGraph) -> Vec<ActionId> {
        let mut finished = Vec::new();

        for action in &mut self.actions {
            if !action.is_running() {
                continue;
            }
            let duration = self.clips[action.clip].duration;
            action.time += dt * action.time_scale;

            match action.loop_mode {
                LoopMode::Repeat => {
                    action.time = if duration > 0.0 {
                        action.time.rem_euclid(duration)
                    } else {
                        0.0
                    };
                }
                LoopMode::Once => {
                    let ended = if action.time_scale > 0.0 {
                        action.time >= duration
                    } else {
                        action.time <= 0.0
                    };
                    if ended {
                        action.time = action.time.clamp(0.0, duration);
                        if action.clamp_when_finished {
                            action.paused = true;
                        } else {
                            action.enabled = false;
                        }
                        finished.push(action.id);
                    }
                }
            }
        }

        for action in &self.actions {
            if action.enabled || finished.contains(&action.id) {
                self.clips[action.clip].apply(action.time, graph);
            }
        }

        finished
    }
}
