//! I/O collaborators: calibration readers, meshes, depth image output.
//!
//! This module handles all file format parsing and export:
//! - Plain-text calibration files and per-subfolder rig discovery
//! - COLMAP binary calibration (cameras.bin + images.bin)
//! - Wavefront OBJ meshes
//! - 16-bit PNG depth output

mod calib;
mod colmap;
mod depth_png;
mod obj;

// Re-export public types and functions
pub use calib::{
    discover_rig, load_camera_files, load_camera_json, parse_extrinsics, parse_intrinsics,
    LoadError, EXTRINSIC_FILENAME, INTRINSIC_FILENAME,
};
pub use colmap::load_colmap_rig;
pub use depth_png::PngDepthSink;
pub use obj::{load_obj, parse_obj};
