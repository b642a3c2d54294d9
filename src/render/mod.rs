//! wgpu render surface
//!
//! [`WgpuSurface`] implements the viewer's render-surface seam for a winit
//! window.

pub mod gpu_context;
pub mod renderer;
pub mod vertex;

pub use gpu_context::GpuContext;
pub use renderer::WgpuSurface;
pub use vertex::MeshVertex;

/// Errors that can occur while setting up the GPU
#[derive(Debug)]
pub enum RenderError {
    /// The window surface could not be created or has no usable format
    Surface(String),
    /// No adapter can present to the window
    NoAdapter,
    /// The adapter refused to open a device
    Device(wgpu::RequestDeviceError),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Surface(e) => write!(f, "Surface error: {}", e),
            RenderError::NoAdapter => write!(f, "No suitable GPU adapter found"),
            RenderError::Device(e) => write!(f, "Device error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<wgpu::CreateSurfaceError> for RenderError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        RenderError::Surface(e.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for RenderError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        RenderError::Device(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_display() {
        assert_eq!(RenderError::NoAdapter.to_string(), "No suitable GPU adapter found");
        assert!(RenderError::Surface("lost".into()).to_string().contains("lost"));
    }
}
