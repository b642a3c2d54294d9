//! Click routing from picked meshes to part animations
//!
//! Interactive parts are a closed set. Their nodes are resolved by name once
//! per model load; a click then only walks parent ids until it meets one of
//! the resolved nodes.

use std::collections::HashMap;

use crate::scene::{NodeId, SceneGraph};

use super::audio::MUSIC_CLIP;
use super::manager::{AnimationManager, PlayOptions};
use super::mixer::ActionId;

/// Model parts that react to clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteractivePart {
    DustCover,
    Drawer,
    Pickup,
}

impl InteractivePart {
    pub const ALL: [InteractivePart; 3] = [
        InteractivePart::DustCover,
        InteractivePart::Drawer,
        InteractivePart::Pickup,
    ];

    /// Node name the part is authored under
    pub fn node_name(self) -> &'static str {
        match self {
            InteractivePart::DustCover => "DustCover",
            InteractivePart::Drawer => "Gaveta",
            InteractivePart::Pickup => "Pickup",
        }
    }

    pub fn from_node_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.node_name() == name)
    }
}

/// Base playback parameters of a mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    pub looping: bool,
    /// Unsigned base speed; direction comes from the toggle state
    pub time_scale: f32,
    pub clamp_when_finished: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            looping: false,
            time_scale: 1.0,
            clamp_when_finished: true,
        }
    }
}

impl PlaybackSettings {
    pub fn to_play_options(self) -> PlayOptions {
        PlayOptions {
            looping: self.looping,
            time_scale: self.time_scale,
            clamp_when_finished: self.clamp_when_finished,
            ..PlayOptions::default()
        }
    }
}

/// Clip to resume or start once a forward play completes
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOnComplete {
    pub clip: String,
    pub settings: PlaybackSettings,
    /// Pause the chained clip when the part finishes playing in reverse
    pub pause_when_reversed: bool,
}

/// Animation behaviour of one interactive part
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationMapping {
    /// Clips cycled through on successive clicks
    pub clips: Vec<String>,
    pub settings: PlaybackSettings,
    /// Alternate play direction between clicks
    pub toggle_reversed: bool,
    pub chain: Option<ChainOnComplete>,
}

impl AnimationMapping {
    pub fn new(clips: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            clips: clips.into_iter().map(Into::into).collect(),
            settings: PlaybackSettings::default(),
            toggle_reversed: false,
            chain: None,
        }
    }

    pub fn with_toggle_reversed(mut self, toggle: bool) -> Self {
        self.toggle_reversed = toggle;
        self
    }

    pub fn with_settings(mut self, settings: PlaybackSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_chain(mut self, chain: ChainOnComplete) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Shipped mapping for a part
    pub fn builtin(part: InteractivePart) -> Self {
        match part {
            InteractivePart::DustCover => Self::new(["Open.001"]).with_toggle_reversed(true),
            InteractivePart::Drawer => Self::new(["Open"]).with_toggle_reversed(true),
            InteractivePart::Pickup => Self::new(["Play"])
                .with_toggle_reversed(true)
                .with_chain(ChainOnComplete {
                    clip: MUSIC_CLIP.to_string(),
                    settings: PlaybackSettings {
                        looping: true,
                        ..PlaybackSettings::default()
                    },
                    pause_when_reversed: true,
                }),
        }
    }
}

/// Per-part click state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleState {
    /// Next clip index
    pub index: usize,
    /// Whether the next play runs backward
    pub reversed: bool,
}

impl ToggleState {
    /// State after one click on a mapping with `clip_count` clips
    ///
    /// The index cycles through the clips. With direction toggling on, the
    /// direction flips each time the cycle wraps back to the first clip, so
    /// a single-clip part alternates every click.
    pub fn advance(self, clip_count: usize, toggle_reversed: bool) -> Self {
        let index = if clip_count > 1 {
            (self.index + 1) % clip_count
        } else {
            0
        };
        let reversed = toggle_reversed && (self.reversed ^ (index == 0));
        Self { index, reversed }
    }
}

/// Node -> interactive part table, built once per model load
#[derive(Debug, Clone, Default)]
pub struct ClickRoutes {
    by_node: HashMap<NodeId, InteractivePart>,
    mappings: HashMap<InteractivePart, AnimationMapping>,
}

impl ClickRoutes {
    /// Resolve the shipped mappings below `root`
    pub fn resolve(graph: &SceneGraph, root: NodeId) -> Self {
        Self::resolve_with(
            graph,
            root,
            InteractivePart::ALL
                .into_iter()
                .map(|p| (p, AnimationMapping::builtin(p))),
        )
    }

    /// Resolve custom mappings below `root`
    pub fn resolve_with(
        graph: &SceneGraph,
        root: NodeId,
        mappings: impl IntoIterator<Item = (InteractivePart, AnimationMapping)>,
    ) -> Self {
        let mappings: HashMap<_, _> = mappings.into_iter().collect();
        let by_node: HashMap<_, _> = graph
            .descendants(root)
            .into_iter()
            .filter_map(|id| {
                let part = InteractivePart::from_node_name(&graph.node(id)?.name)?;
                mappings.contains_key(&part).then_some((id, part))
            })
            .collect();

        for part in mappings.keys() {
            if !by_node.values().any(|p| p == part) {
                tracing::warn!("Interactive node {} not found in model", part.node_name());
            }
        }

        Self { by_node, mappings }
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    /// Number of resolved interactive nodes
    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn mapping(&self, part: InteractivePart) -> Option<&AnimationMapping> {
        self.mappings.get(&part)
    }

    /// Nearest interactive part at or above `hit`
    pub fn part_for(&self, graph: &SceneGraph, hit: NodeId) -> Option<InteractivePart> {
        graph
            .self_and_ancestors(hit)
            .find_map(|id| self.by_node.get(&id).copied())
    }
}

/// What a click did
#[derive(Debug, Clone, PartialEq)]
pub struct ClickDispatch {
    pub part: InteractivePart,
    pub clip: String,
    pub reversed: bool,
    /// `None` when the clip could not be played
    pub action: Option<ActionId>,
}

/// Route a picked mesh to its part animation
///
/// Returns `None` when the hit isn't below any interactive part.
pub fn handle_object_click(
    hit: NodeId,
    routes: &ClickRoutes,
    graph: &SceneGraph,
    manager: &mut AnimationManager,
) -> Option<ClickDispatch> {
    let part = routes.part_for(graph, hit)?;
    let mapping = routes.mapping(part)?;
    let Some(first) = mapping.clips.first() else {
        tracing::warn!("No animation configured for {}", part.node_name());
        return None;
    };

    let state = manager.toggle_state(part);
    let clip = mapping.clips.get(state.index).unwrap_or(first).clone();
    let reversed = mapping.toggle_reversed && state.reversed;

    let base = if mapping.settings.time_scale == 0.0 {
        1.0
    } else {
        mapping.settings.time_scale.abs()
    };
    let mut options = mapping.settings.to_play_options();
    options.time_scale = if reversed { -base } else { base };
    options.start_at_end = reversed;

    if let Some(chain) = &mapping.chain {
        if !reversed {
            let chain = chain.clone();
            options.on_complete = Some(Box::new(move |m: &mut AnimationManager| {
                trigger_chain(m, &chain);
            }));
        } else if chain.pause_when_reversed {
            let chained = chain.clip.clone();
            options.on_complete = Some(Box::new(move |m: &mut AnimationManager| {
                m.pause(&chained);
            }));
        }
    }

    tracing::debug!(
        "Click on {} -> {} ({})",
        part.node_name(),
        clip,
        if reversed { "reverse" } else { "forward" }
    );
    let action = manager.play(&clip, options);
    manager.set_toggle_state(part, state.advance(mapping.clips.len(), mapping.toggle_reversed));

    Some(ClickDispatch {
        part,
        clip,
        reversed,
        action,
    })
}

/// Resume the chained clip, or start it when nothing is tracked for it
fn trigger_chain(manager: &mut AnimationManager, chain: &ChainOnComplete) {
    if manager
        .resume(&chain.clip, Some(chain.settings.time_scale))
        .is_some()
    {
        return;
    }
    manager.play(&chain.clip, chain.settings.to_play_options());
}
