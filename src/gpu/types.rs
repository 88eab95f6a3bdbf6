//! GPU-friendly data types for the depth pass.
//!
//! These types are uploaded directly to GPU buffers:
//! - Flat memory layout (no pointers)
//! - 16-byte alignment where WGSL expects it
//! - bytemuck Pod + Zeroable traits

use crate::core::{Camera, CameraError};
use nalgebra::Matrix4;

/// One mesh vertex as the vertex stage consumes it.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexGPU {
    /// Position in world space
    pub position: [f32; 3],
}

impl VertexGPU {
    /// Vertex buffer layout matching `shaders::DEPTH_SHADER`'s vs_main input.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<VertexGPU>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            shader_location: 0,
            offset: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    };
}

/// Per-camera uniform block consumed by the depth shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// Combined projection * view, column-major as WGSL mat4x4 expects
    pub view_proj: [[f32; 4]; 4],

    /// Clip planes (near, far, padding, padding)
    pub clip: [f32; 4],
}

impl CameraUniform {
    /// Build the uniform for one camera and clip pair.
    pub fn new(camera: &Camera, near: f32, far: f32) -> Result<Self, CameraError> {
        let view_proj = camera.projection_matrix(near, far)? * camera.view_matrix();
        Ok(Self {
            view_proj: matrix_to_columns(&view_proj),
            clip: [near, far, 0.0, 0.0],
        })
    }
}

/// Flatten a 4x4 matrix into column arrays (nalgebra and WGSL are both
/// column-major, so each inner array is one column).
fn matrix_to_columns(m: &Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut out = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            out[col][row] = m[(row, col)];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Extrinsic, Intrinsic};

    #[test]
    fn test_camera_uniform_size() {
        // 4x4 matrix + clip vector, 16-byte aligned
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
    }

    #[test]
    fn test_matrix_upload_is_column_major() {
        #[rustfmt::skip]
        let m = Matrix4::new(
            1.0, 2.0, 3.0, 4.0,
            5.0, 6.0, 7.0, 8.0,
            9.0, 10.0, 11.0, 12.0,
            13.0, 14.0, 15.0, 16.0,
        );
        let cols = matrix_to_columns(&m);
        assert_eq!(cols[0], [1.0, 5.0, 9.0, 13.0]);
        assert_eq!(cols[3], [4.0, 8.0, 12.0, 16.0]);
    }

    #[test]
    fn test_uniform_carries_clip_planes() {
        let intrinsic = Intrinsic {
            fx: 100.0,
            fy: 100.0,
            cx: 50.0,
            cy: 50.0,
            width: 100,
            height: 100,
        };
        let camera = Camera::new(intrinsic, Extrinsic::identity()).unwrap();
        let uniform = CameraUniform::new(&camera, 0.5, 42.0).unwrap();
        assert_eq!(uniform.clip[0], 0.5);
        assert_eq!(uniform.clip[1], 42.0);
    }

    #[test]
    fn test_uniform_rejects_bad_clip_planes() {
        let intrinsic = Intrinsic {
            fx: 100.0,
            fy: 100.0,
            cx: 50.0,
            cy: 50.0,
            width: 100,
            height: 100,
        };
        let camera = Camera::new(intrinsic, Extrinsic::identity()).unwrap();
        assert!(CameraUniform::new(&camera, 10.0, 1.0).is_err());
    }
}
