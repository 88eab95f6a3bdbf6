//! WGSL shader for the depth pass.

use wgpu::{Device, ShaderModule};

/// Vertex + fragment stages of the depth pass.
///
/// The vertex stage transforms mesh positions by the camera's combined
/// projection * view. The fragment stage inverts the hardware depth (range
/// [0, 1]) back to view-space depth, normalizes it across [near, far],
/// quantizes to 16 bits and splits the result across the red/green channels;
/// blue is reserved. `core::depth` holds the host mirror of this encoding
/// and must stay bit-exact with it.
pub const DEPTH_SHADER: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    clip: vec4<f32>, // (near, far, 0, 0)
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = camera.view_proj * vec4<f32>(position, 1.0);
    return out;
}

// Invert the non-linear hardware depth back to view-space depth
fn linearize_depth(depth: f32, near: f32, far: f32) -> f32 {
    return near * far / (far - depth * (far - near));
}

@fragment
fn fs_main(inp: VertexOutput) -> @location(0) vec4<f32> {
    let near = camera.clip.x;
    let far = camera.clip.y;

    let z_eye = linearize_depth(inp.position.z, near, far);
    let norm = clamp((z_eye - near) / (far - near), 0.0, 1.0);

    let quantized = u32(round(norm * 65535.0));
    let lo = f32(quantized & 0xffu) / 255.0;
    let hi = f32((quantized >> 8u) & 0xffu) / 255.0;
    return vec4<f32>(lo, hi, 0.0, 1.0);
}
"#;

/// Compile the depth shader module.
pub fn create_depth_shader(device: &Device) -> ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Depth Shader"),
        source: wgpu::ShaderSource::Wgsl(DEPTH_SHADER.into()),
    })
}
