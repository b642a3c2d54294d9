//! Render surface seam

use crate::raycast::Rect;
use crate::scene::{PerspectiveCamera, Scene};

/// Size and position of the element hosting the viewer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutBox {
    pub left: f32,
    pub top: f32,
    pub width: u32,
    /// 0 when the container has no height of its own
    pub height: u32,
}

impl LayoutBox {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }
}

/// Something the viewer can draw a scene into
pub trait RenderSurface {
    /// Bounding box in client coordinates, used for pointer picking
    fn bounds(&self) -> Rect;

    /// Resize the drawable area
    fn set_size(&mut self, width: u32, height: u32);

    /// Draw one frame
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera);

    /// Release GPU or window resources; later calls are no-ops
    fn dispose(&mut self);
}

/// What a [`HeadlessSurface`] saw in its last frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameRecord {
    pub mesh_count: usize,
    pub has_environment: bool,
    pub aspect: f32,
}

/// Surface without a GPU that records what it was asked to do
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    origin: (f32, f32),
    size: (u32, u32),
    frames: u64,
    last_frame: Option<FrameRecord>,
    disposed: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the surface at a client-space offset
    pub fn with_origin(mut self, left: f32, top: f32) -> Self {
        self.origin = (left, top);
        self
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> Option<FrameRecord> {
        self.last_frame
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl RenderSurface for HeadlessSurface {
    fn bounds(&self) -> Rect {
        Rect::new(
            self.origin.0,
            self.origin.1,
            self.size.0 as f32,
            self.size.1 as f32,
        )
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        if self.disposed {
            return;
        }
        self.frames += 1;
        self.last_frame = Some(FrameRecord {
            mesh_count: scene.mesh_count(),
            has_environment: scene.environment.is_some(),
            aspect: camera.aspect,
        });
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
