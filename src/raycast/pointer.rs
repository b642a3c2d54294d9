//! Pointer events in surface client coordinates

use glam::Vec2;

/// Mouse / pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button or primary touch
    Primary,
    Middle,
    Secondary,
    Other(u16),
}

/// A pointer-down event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
    pub button: PointerButton,
}

impl PointerEvent {
    pub fn primary(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            button: PointerButton::Primary,
        }
    }
}

/// Bounding box of the render surface in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rect at the origin
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// Normalized device coordinates of a client point: x right, y up, both in
/// [-1, 1] inside the rect
///
/// `None` for a degenerate rect.
pub fn to_ndc(client_x: f32, client_y: f32, rect: Rect) -> Option<Vec2> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        (client_x - rect.left) / rect.width * 2.0 - 1.0,
        -((client_y - rect.top) / rect.height) * 2.0 + 1.0,
    ))
}
