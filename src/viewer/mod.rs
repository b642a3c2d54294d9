//! Viewer controller and its render-surface seam

pub mod controller;
pub mod overrides;
pub mod surface;

pub use controller::{Viewer, ViewerError, ViewerOptions};
pub use overrides::OverrideSet;
pub use surface::{FrameRecord, HeadlessSurface, LayoutBox, RenderSurface};
