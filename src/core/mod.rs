//! Core data structures and math.
//!
//! This module contains the fundamental types used throughout the system:
//! - `Camera`: pinhole intrinsics, rigid extrinsics, view/projection matrices
//! - `depth`: the 16-bit depth wire format and its host-side codec
//! - `Geometry`: static triangle meshes
//!
//! All types here are "pure data" - no I/O, no GPU state.

pub mod camera;
pub mod depth;
pub mod mesh;

// Re-export public types
pub use camera::{validate_clip_planes, Camera, CameraError, Extrinsic, Intrinsic};
pub use depth::{decode_rgb, CodecError, DepthImage, FAR_SENTINEL};
pub use mesh::{Geometry, GeometryError};
