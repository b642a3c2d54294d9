//! Raycast picking
//!
//! Converts pointer-downs on the render surface into the nearest clickable
//! mesh and hands it to a single click target.

pub mod manager;
pub mod pointer;

pub use manager::{ClickTarget, RaycastHit, RaycastManager};
pub use pointer::{to_ndc, PointerButton, PointerEvent, Rect};
