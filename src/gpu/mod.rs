//! GPU depth capture pipeline built on wgpu.
//!
//! Architecture:
//! - `context` - wgpu device/queue acquisition
//! - `buffers` - buffer creation and blocking readback mapping
//! - `types` - #[repr(C)] types crossing the CPU/GPU boundary
//! - `shaders` - the WGSL depth pass
//! - `renderer` - render pipeline, offscreen targets, per-camera render + readback

mod buffers;
mod context;
mod renderer;
mod shaders;
mod types;

pub use context::GpuContext;
pub use renderer::DepthRenderer;
pub use types::{CameraUniform, VertexGPU};

use crate::core::CameraError;
use thiserror::Error;

/// Errors from context creation, rendering, and readback.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("failed to create device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error("no geometry uploaded")]
    NoGeometry,

    #[error("camera resolution {camera_width}x{camera_height} does not match the {surface_width}x{surface_height} render surface")]
    ResolutionMismatch {
        surface_width: u32,
        surface_height: u32,
        camera_width: u32,
        camera_height: u32,
    },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("depth readback failed: {0}")]
    Readback(String),
}

impl RenderError {
    /// Whether the error poisons the shared context for all later cameras.
    ///
    /// Calibration and precondition errors are scoped to one camera; a failed
    /// adapter, device, or readback means the context itself is unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RenderError::AdapterNotFound
                | RenderError::DeviceRequest(_)
                | RenderError::Readback(_)
        )
    }
}
