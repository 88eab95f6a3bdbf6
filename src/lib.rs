//! # lfdepth-rs: ground-truth depth maps from calibrated camera rigs
//!
//! This crate renders a static triangle mesh from an ordered list of
//! calibrated cameras (pinhole intrinsics + world-to-camera extrinsics) and
//! writes one 16-bit depth image per camera, for synthesizing ground-truth
//! depth for lightfield and RGB-D datasets.
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - `core`: fundamental data structures (cameras, depth codec, geometry)
//! - `io`: file I/O (calibration parsing, OBJ meshes, PNG output)
//! - `gpu`: the wgpu depth pass (context, pipeline, readback)
//! - `capture`: the per-camera capture loop and its collaborator seams
//!
//! ## Depth wire format
//!
//! Depth crosses the GPU/host boundary as 8-bit RGB with the 16-bit
//! quantized depth split across red (low byte) and green (high byte); see
//! `core::depth` for the contract and `gpu::shaders` for the producing
//! shader. The host decodes each frame, restores scanline order, and hands
//! it to a `capture::DepthSink`.

// Core data structures and math
pub mod core;

// I/O operations (calibration, OBJ, PNG)
pub mod io;

// GPU depth pass
pub mod gpu;

// Capture sequencing
pub mod capture;

// Re-export commonly used types at crate root for convenience
pub use crate::capture::{
    CaptureEntry, CaptureReport, CaptureSequencer, DepthSink, RenderBackend, SinkError,
};
pub use crate::core::{Camera, DepthImage, Extrinsic, Geometry, Intrinsic};
pub use crate::gpu::{DepthRenderer, GpuContext, RenderError};
pub use crate::io::LoadError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
