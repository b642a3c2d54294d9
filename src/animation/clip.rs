//! Keyframe clips
//!
//! A clip is an immutable set of tracks, each driving one property of one
//! node. Sampling writes the interpolated value into the node transform.

use glam::{Quat, Vec3};

use crate::scene::{NodeId, NodeOffset, SceneGraph};

/// Keyframe interpolation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    /// Hold each key until the next one
    Step,
}

/// Keyframe values of a track, one per time
#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl TrackValues {
    pub fn len(&self) -> usize {
        match self {
            TrackValues::Translation(v) | TrackValues::Scale(v) => v.len(),
            TrackValues::Rotation(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One animated property of one node
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub node: NodeId,
    /// Ascending key times in seconds
    pub times: Vec<f32>,
    pub values: TrackValues,
    pub interpolation: Interpolation,
}

impl Track {
    /// Bracketing key indices and blend factor for `time`
    fn locate(&self, time: f32) -> Option<(usize, usize, f32)> {
        let count = self.times.len().min(self.values.len());
        if count == 0 {
            return None;
        }
        let last = count - 1;
        if time <= self.times[0] {
            return Some((0, 0, 0.0));
        }
        if time >= self.times[last] {
            return Some((last, last, 0.0));
        }
        let next = self.times[..count].partition_point(|&t| t <= time);
        let prev = next - 1;
        let span = self.times[next] - self.times[prev];
        let alpha = if span > 0.0 {
            (time - self.times[prev]) / span
        } else {
            0.0
        };
        match self.interpolation {
            Interpolation::Linear => Some((prev, next, alpha)),
            Interpolation::Step => Some((prev, prev, 0.0)),
        }
    }

    /// Write the sampled value at `time` into the target node
    pub fn apply(&self, time: f32, graph: &mut SceneGraph) {
        let Some((a, b, alpha)) = self.locate(time) else {
            return;
        };
        let Some(node) = graph.node_mut(self.node) else {
            return;
        };
        match &self.values {
            TrackValues::Translation(v) => {
                node.transform.translation = v[a].lerp(v[b], alpha);
            }
            TrackValues::Rotation(v) => {
                node.transform.rotation = v[a].slerp(v[b], alpha).normalize();
            }
            TrackValues::Scale(v) => {
                node.transform.scale = v[a].lerp(v[b], alpha);
            }
        }
    }
}

/// Named, fixed-duration keyframe animation
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Seconds
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Duration is the last key time over all tracks
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .filter_map(|t| t.times.last().copied())
            .fold(0.0_f32, f32::max);
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    /// Shift every track target after the model graph was appended
    pub fn retarget(&mut self, offset: NodeOffset) {
        for track in &mut self.tracks {
            track.node = track.node.offset(offset);
        }
    }

    /// Pose every targeted node at `time`
    pub fn apply(&self, time: f32, graph: &mut SceneGraph) {
        for track in &self.tracks {
            track.apply(time, graph);
        }
    }
}
