//! Part animations
//!
//! Clips come embedded in the model. The [`AnimationManager`] plays them by
//! name on an [`AnimationMixer`], and [`handle_object_click`] turns a picked
//! mesh into a play request using the per-part toggle state.

pub mod audio;
pub mod clip;
pub mod manager;
pub mod mixer;
pub mod routing;

pub use audio::{AudioCues, AudioTrack, MUSIC_CLIP, MUSIC_SOURCE};
pub use clip::{AnimationClip, Interpolation, Track, TrackValues};
pub use manager::{AnimationManager, CompletionCallback, PlayOptions, START_AT_END_EPSILON};
pub use mixer::{Action, ActionId, AnimationMixer, LoopMode};
pub use routing::{
    handle_object_click, AnimationMapping, ChainOnComplete, ClickDispatch, ClickRoutes,
    InteractivePart, PlaybackSettings, ToggleState,
};
