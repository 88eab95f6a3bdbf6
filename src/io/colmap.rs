//! COLMAP binary calibration reader.
//!
//! COLMAP sparse reconstructions store calibration in two binary files that
//! together describe a capture rig:
//! - `cameras.bin`: intrinsics, indexed by camera_id
//! - `images.bin`: per-image pose (world-to-camera quaternion + translation)
//!
//! Format spec: https://colmap.github.io/format.html
//!
//! Poses in `images.bin` are already world-to-camera, matching the
//! `Extrinsic` convention, so no inversion is needed.

use crate::capture::CaptureEntry;
use crate::core::{Extrinsic, Intrinsic};
use crate::io::LoadError;
use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load a capture rig from a COLMAP sparse directory (e.g. `sparse/0`).
///
/// One entry per registered image, identified by the image name stem and
/// sorted by it so capture order is deterministic.
pub fn load_colmap_rig(sparse_dir: &Path) -> Result<Vec<CaptureEntry>, LoadError> {
    let cameras = read_cameras_bin(&sparse_dir.join("cameras.bin"))?;
    let images = read_images_bin(&sparse_dir.join("images.bin"))?;

    let mut entries = Vec::with_capacity(images.len());
    for image in images {
        let intrinsic = cameras.get(&image.camera_id).copied().ok_or_else(|| {
            LoadError::Parse(format!(
                "image '{}' references unknown camera id {}",
                image.name, image.camera_id
            ))
        })?;

        let id = Path::new(&image.name)
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| image.name.clone());

        entries.push(CaptureEntry {
            id,
            intrinsic,
            extrinsic: image.extrinsic,
        });
    }
    entries.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(entries)
}

struct ImageRecord {
    camera_id: u32,
    name: String,
    extrinsic: Extrinsic,
}

/// Read `cameras.bin` (little-endian).
///
/// Layout: `num_cameras: u64`, then per camera `camera_id: u32`,
/// `model_id: i32`, `width: u64`, `height: u64`, `params: [f64; N]` with N
/// determined by the model.
fn read_cameras_bin(path: &Path) -> Result<HashMap<u32, Intrinsic>, LoadError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let num_cameras = reader.read_u64::<LittleEndian>()?;
    let mut cameras = HashMap::with_capacity(num_cameras as usize);

    for _ in 0..num_cameras {
        let camera_id = reader.read_u32::<LittleEndian>()?;
        let model_id = reader.read_i32::<LittleEndian>()?;
        let width = reader.read_u64::<LittleEndian>()? as u32;
        let height = reader.read_u64::<LittleEndian>()? as u32;

        // Model ids: 0=SIMPLE_PINHOLE, 1=PINHOLE, 2=SIMPLE_RADIAL, 3=RADIAL,
        // 4=OPENCV, 5=OPENCV_FISHEYE. The focal parameters come first in every
        // model; trailing distortion coefficients are skipped.
        let (focal_params, distortion_params) = match model_id {
            0 => (3, 0),
            1 => (4, 0),
            2 => (3, 1),
            3 => (3, 2),
            4 | 5 => (4, 4),
            _ => return Err(LoadError::UnsupportedCameraModel(model_id)),
        };

        let mut params = [0.0f64; 4];
        for value in params.iter_mut().take(focal_params) {
            *value = reader.read_f64::<LittleEndian>()?;
        }
        for _ in 0..distortion_params {
            reader.read_f64::<LittleEndian>()?;
        }
        if distortion_params > 0 {
            log::warn!(
                "camera {} uses a distortion model (id {}); coefficients ignored, \
                 images are assumed undistorted",
                camera_id,
                model_id
            );
        }

        let intrinsic = if focal_params == 3 {
            // Single focal length: f, cx, cy
            Intrinsic {
                fx: params[0] as f32,
                fy: params[0] as f32,
                cx: params[1] as f32,
                cy: params[2] as f32,
                width,
                height,
            }
        } else {
            // fx, fy, cx, cy
            Intrinsic {
                fx: params[0] as f32,
                fy: params[1] as f32,
                cx: params[2] as f32,
                cy: params[3] as f32,
                width,
                height,
            }
        };

        cameras.insert(camera_id, intrinsic);
    }

    Ok(cameras)
}

/// Read `images.bin` (little-endian).
///
/// Layout: `num_images: u64`, then per image `image_id: u32`,
/// `qw qx qy qz: f64`, `tx ty tz: f64`, `camera_id: u32`, a null-terminated
/// name, and `num_points2d: u64` keypoints (24 bytes each) which are skipped.
fn read_images_bin(path: &Path) -> Result<Vec<ImageRecord>, LoadError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let num_images = reader.read_u64::<LittleEndian>()?;
    let mut images = Vec::with_capacity(num_images as usize);

    for _ in 0..num_images {
        let _image_id = reader.read_u32::<LittleEndian>()?;

        let qw = reader.read_f64::<LittleEndian>()? as f32;
        let qx = reader.read_f64::<LittleEndian>()? as f32;
        let qy = reader.read_f64::<LittleEndian>()? as f32;
        let qz = reader.read_f64::<LittleEndian>()? as f32;

        let tx = reader.read_f64::<LittleEndian>()? as f32;
        let ty = reader.read_f64::<LittleEndian>()? as f32;
        let tz = reader.read_f64::<LittleEndian>()? as f32;

        let camera_id = reader.read_u32::<LittleEndian>()?;

        let mut name_bytes = Vec::new();
        loop {
            let byte = reader.read_u8()?;
            if byte == 0 {
                break;
            }
            name_bytes.push(byte);
        }
        let name = String::from_utf8(name_bytes)
            .map_err(|e| LoadError::Parse(format!("invalid UTF-8 in image name: {}", e)))?;

        // Skip 2D keypoints: x (f64), y (f64), point3d_id (u64) each
        let num_points2d = reader.read_u64::<LittleEndian>()?;
        for _ in 0..num_points2d {
            reader.read_f64::<LittleEndian>()?;
            reader.read_f64::<LittleEndian>()?;
            reader.read_u64::<LittleEndian>()?;
        }

        let rotation = nalgebra::UnitQuaternion::from_quaternion(
            nalgebra::Quaternion::new(qw, qx, qy, qz).normalize(),
        )
        .to_rotation_matrix()
        .into_inner();

        images.push(ImageRecord {
            camera_id,
            name,
            extrinsic: Extrinsic {
                rotation,
                translation: nalgebra::Vector3::new(tx, ty, tz),
            },
        });
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn write_cameras_bin(path: &Path) {
        let mut data = Vec::new();
        data.write_u64::<LittleEndian>(1).unwrap(); // num_cameras
        data.write_u32::<LittleEndian>(7).unwrap(); // camera_id
        data.write_i32::<LittleEndian>(1).unwrap(); // PINHOLE
        data.write_u64::<LittleEndian>(640).unwrap();
        data.write_u64::<LittleEndian>(480).unwrap();
        for param in [500.0, 510.0, 320.0, 240.0] {
            data.write_f64::<LittleEndian>(param).unwrap();
        }
        File::create(path).unwrap().write_all(&data).unwrap();
    }

    fn write_images_bin(path: &Path, names: &[&str]) {
        let mut data = Vec::new();
        data.write_u64::<LittleEndian>(names.len() as u64).unwrap();
        for (i, name) in names.iter().enumerate() {
            data.write_u32::<LittleEndian>(i as u32 + 1).unwrap(); // image_id
            for q in [1.0, 0.0, 0.0, 0.0] {
                data.write_f64::<LittleEndian>(q).unwrap(); // identity quaternion
            }
            for t in [0.0, 0.0, (i + 1) as f64] {
                data.write_f64::<LittleEndian>(t).unwrap();
            }
            data.write_u32::<LittleEndian>(7).unwrap(); // camera_id
            data.write_all(name.as_bytes()).unwrap();
            data.write_u8(0).unwrap();
            data.write_u64::<LittleEndian>(0).unwrap(); // no 2D points
        }
        File::create(path).unwrap().write_all(&data).unwrap();
    }

    #[test]
    fn test_load_colmap_rig() {
        let dir = tempfile::tempdir().unwrap();
        write_cameras_bin(&dir.path().join("cameras.bin"));
        write_images_bin(&dir.path().join("images.bin"), &["b.png", "a.png"]);

        let entries = load_colmap_rig(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
        // Sorted by name stem; "a.png" was written second with tz = 2
        assert_eq!(entries[0].id, "a");
        assert_eq!(entries[1].id, "b");
        assert_eq!(entries[0].intrinsic.width, 640);
        assert_eq!(entries[0].intrinsic.fy, 510.0);
        assert_eq!(entries[0].extrinsic.translation.z, 2.0);
        assert_eq!(entries[1].extrinsic.translation.z, 1.0);
    }

    #[test]
    fn test_unknown_camera_model_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cameras.bin");
        let mut data = Vec::new();
        data.write_u64::<LittleEndian>(1).unwrap();
        data.write_u32::<LittleEndian>(0).unwrap();
        data.write_i32::<LittleEndian>(99).unwrap(); // no such model
        data.write_u64::<LittleEndian>(640).unwrap();
        data.write_u64::<LittleEndian>(480).unwrap();
        File::create(&path).unwrap().write_all(&data).unwrap();

        assert!(matches!(
            read_cameras_bin(&path),
            Err(LoadError::UnsupportedCameraModel(99))
        ));
    }
}
