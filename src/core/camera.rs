//! Camera model (pinhole intrinsics + rigid-body extrinsics).
//!
//! Cameras are used to:
//! - Move world-space geometry into camera space (view matrix)
//! - Map camera space to clip space for the rasterizer (projection matrix)
//! - Reject malformed calibration before a render is attempted

use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance for the orthonormality check on calibration rotations.
const ROTATION_TOLERANCE: f32 = 1e-3;

/// Errors from malformed calibration or clip configuration.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("invalid resolution {width}x{height}")]
    Resolution { width: u32, height: u32 },

    #[error("focal lengths must be non-zero (fx={fx}, fy={fy})")]
    FocalLength { fx: f32, fy: f32 },

    #[error("rotation is not orthonormal (det={det})")]
    NonOrthonormalRotation { det: f32 },

    #[error("clip planes must satisfy 0 < near < far (near={near}, far={far})")]
    ClipPlanes { near: f32, far: f32 },
}

/// Pinhole projection parameters of a single camera view.
///
/// Immutable once constructed; one instance per view, produced by the
/// calibration readers in `io`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Intrinsic {
    /// Focal length in X (pixels)
    pub fx: f32,

    /// Focal length in Y (pixels)
    pub fy: f32,

    /// Principal point X (pixels)
    pub cx: f32,

    /// Principal point Y (pixels)
    pub cy: f32,

    /// Image width (pixels)
    pub width: u32,

    /// Image height (pixels)
    pub height: u32,
}

/// Rigid-body pose of a single camera view.
///
/// Stores the world-to-camera transform directly: `p_cam = R * p_world + t`,
/// with the camera looking down +Z and the pixel v axis growing downward
/// (the COLMAP/OpenCV convention). Calibration formats that store the
/// camera-to-world pose must be inverted by the reader before constructing
/// an `Extrinsic`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Extrinsic {
    /// Rotation from world to camera coordinates
    pub rotation: Matrix3<f32>,

    /// Translation from world to camera coordinates
    pub translation: Vector3<f32>,
}

impl Extrinsic {
    /// Identity pose: camera at the world origin looking down +Z.
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Camera center in world coordinates: `C = -R^T * t`.
    pub fn camera_center(&self) -> Vector3<f32> {
        -self.rotation.transpose() * self.translation
    }
}

/// One intrinsic + one extrinsic, the unit a render pass consumes.
///
/// Ephemeral: constructed (and validated) per render, not persisted.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Camera {
    pub intrinsic: Intrinsic,
    pub extrinsic: Extrinsic,
}

impl Camera {
    /// Combine calibration records into a camera, rejecting malformed input.
    ///
    /// The rotation must be orthonormal with determinant +1 within a small
    /// tolerance; anything else indicates a corrupt calibration file rather
    /// than a pose worth rendering.
    pub fn new(intrinsic: Intrinsic, extrinsic: Extrinsic) -> Result<Self, CameraError> {
        if intrinsic.width == 0 || intrinsic.height == 0 {
            return Err(CameraError::Resolution {
                width: intrinsic.width,
                height: intrinsic.height,
            });
        }
        if intrinsic.fx == 0.0 || intrinsic.fy == 0.0 {
            return Err(CameraError::FocalLength {
                fx: intrinsic.fx,
                fy: intrinsic.fy,
            });
        }

        let r = extrinsic.rotation;
        let det = r.determinant();
        let drift = (r * r.transpose() - Matrix3::identity()).abs().max();
        if !det.is_finite() || (det - 1.0).abs() > ROTATION_TOLERANCE || drift > ROTATION_TOLERANCE
        {
            return Err(CameraError::NonOrthonormalRotation { det });
        }

        Ok(Self {
            intrinsic,
            extrinsic,
        })
    }

    /// Transform a point from world coordinates to camera coordinates.
    pub fn world_to_camera(&self, point_world: &Vector3<f32>) -> Vector3<f32> {
        self.extrinsic.rotation * point_world + self.extrinsic.translation
    }

    /// View matrix: the world-to-camera transform as a homogeneous 4x4.
    ///
    /// ```text
    /// [ R | t ]
    /// [ 0 | 1 ]
    /// ```
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&self.extrinsic.rotation);
        m.fixed_view_mut::<3, 1>(0, 3)
            .copy_from(&self.extrinsic.translation);
        m
    }

    /// Projection matrix mapping camera space to clip space, depth in [0, 1].
    ///
    /// Derived from the pinhole mapping `u = fx*x/z + cx`, `v = fy*y/z + cy`.
    /// The y row keeps the same sign as the x row, so the framebuffer holds
    /// the image mirrored vertically; readback therefore yields rows
    /// bottom-to-top and the decode stage restores scanline order.
    ///
    /// The third row encodes `z_clip/w = far*(z - near) / ((far - near)*z)`,
    /// which `core::depth::linearize_depth` inverts.
    pub fn projection_matrix(&self, near: f32, far: f32) -> Result<Matrix4<f32>, CameraError> {
        validate_clip_planes(near, far)?;

        let w = self.intrinsic.width as f32;
        let h = self.intrinsic.height as f32;
        let (fx, fy) = (self.intrinsic.fx, self.intrinsic.fy);
        let (cx, cy) = (self.intrinsic.cx, self.intrinsic.cy);

        #[rustfmt::skip]
        let proj = Matrix4::new(
            2.0 * fx / w, 0.0,          2.0 * cx / w - 1.0, 0.0,
            0.0,          2.0 * fy / h, 2.0 * cy / h - 1.0, 0.0,
            0.0,          0.0,          far / (far - near), -far * near / (far - near),
            0.0,          0.0,          1.0,                0.0,
        );
        Ok(proj)
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.intrinsic.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.intrinsic.height
    }
}

/// Reject inverted, degenerate or non-finite near/far pairs.
///
/// A bad clip pair is a fatal configuration error, checked once before the
/// capture loop starts and again inside every projection build.
pub fn validate_clip_planes(near: f32, far: f32) -> Result<(), CameraError> {
    if !(near > 0.0 && far > near && far.is_finite()) {
        return Err(CameraError::ClipPlanes { near, far });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::depth::linearize_depth;
    use approx::assert_relative_eq;

    fn test_intrinsic() -> Intrinsic {
        Intrinsic {
            fx: 500.0,
            fy: 500.0,
            cx: 320.0,
            cy: 240.0,
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn test_world_to_camera_identity_rotation() {
        let extrinsic = Extrinsic {
            rotation: Matrix3::identity(),
            translation: Vector3::new(1.0, 2.0, 3.0),
        };
        let camera = Camera::new(test_intrinsic(), extrinsic).unwrap();
        let p = camera.world_to_camera(&Vector3::new(4.0, 5.0, 6.0));

        assert_relative_eq!(p.x, 5.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 7.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 9.0, epsilon = 1e-6);
    }

    #[test]
    fn test_view_matrix_matches_world_to_camera() {
        let extrinsic = Extrinsic {
            rotation: nalgebra::Rotation3::from_euler_angles(0.1, -0.2, 0.3).into_inner(),
            translation: Vector3::new(0.5, -1.0, 2.0),
        };
        let camera = Camera::new(test_intrinsic(), extrinsic).unwrap();

        let p = Vector3::new(1.0, 2.0, 3.0);
        let homogeneous = camera.view_matrix() * p.push(1.0);
        let direct = camera.world_to_camera(&p);

        assert_relative_eq!(homogeneous.x, direct.x, epsilon = 1e-5);
        assert_relative_eq!(homogeneous.y, direct.y, epsilon = 1e-5);
        assert_relative_eq!(homogeneous.z, direct.z, epsilon = 1e-5);
        assert_relative_eq!(homogeneous.w, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_projection_principal_axis_hits_principal_point() {
        let camera = Camera::new(test_intrinsic(), Extrinsic::identity()).unwrap();
        let proj = camera.projection_matrix(1.0, 100.0).unwrap();

        let clip = proj * Vector3::new(0.0, 0.0, 10.0).push(1.0);
        let x_ndc = clip.x / clip.w;
        // NDC -1..1 maps back to pixel u = (x_ndc + 1)/2 * W = cx
        let u = (x_ndc + 1.0) * 0.5 * 640.0;
        assert_relative_eq!(u, 320.0, epsilon = 1e-3);
    }

    #[test]
    fn test_projection_depth_roundtrip() {
        let camera = Camera::new(test_intrinsic(), Extrinsic::identity()).unwrap();
        let (near, far) = (1.0f32, 100.0f32);
        let proj = camera.projection_matrix(near, far).unwrap();

        for z_eye in [near, (near + far) / 2.0, far] {
            let clip = proj * Vector3::new(0.0, 0.0, z_eye).push(1.0);
            let hw_depth = clip.z / clip.w;
            assert!(
                (0.0..=1.0).contains(&hw_depth),
                "depth {} out of range",
                hw_depth
            );
            let recovered = linearize_depth(hw_depth, near, far);
            assert_relative_eq!(recovered, z_eye, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_non_orthonormal_rotation_rejected() {
        let mut rotation = Matrix3::identity();
        rotation[(0, 0)] = 2.0; // scaled axis, not a rotation
        let extrinsic = Extrinsic {
            rotation,
            translation: Vector3::zeros(),
        };

        let result = Camera::new(test_intrinsic(), extrinsic);
        assert!(matches!(
            result,
            Err(CameraError::NonOrthonormalRotation { .. })
        ));
    }

    #[test]
    fn test_reflection_rejected() {
        // Orthogonal but det = -1: a mirror, not a rotation
        let mut rotation = Matrix3::identity();
        rotation[(2, 2)] = -1.0;
        let extrinsic = Extrinsic {
            rotation,
            translation: Vector3::zeros(),
        };

        assert!(Camera::new(test_intrinsic(), extrinsic).is_err());
    }

    #[test]
    fn test_zero_focal_length_rejected() {
        let intrinsic = Intrinsic {
            fx: 0.0,
            ..test_intrinsic()
        };
        assert!(matches!(
            Camera::new(intrinsic, Extrinsic::identity()),
            Err(CameraError::FocalLength { .. })
        ));
    }

    #[test]
    fn test_clip_plane_validation() {
        assert!(validate_clip_planes(1.0, 100.0).is_ok());
        assert!(validate_clip_planes(0.0, 100.0).is_err());
        assert!(validate_clip_planes(-1.0, 100.0).is_err());
        assert!(validate_clip_planes(100.0, 1.0).is_err());
        assert!(validate_clip_planes(1.0, 1.0).is_err());
        assert!(validate_clip_planes(f32::NAN, 1.0).is_err());
    }

    #[test]
    fn test_camera_center_roundtrip() {
        let rotation = nalgebra::Rotation3::from_euler_angles(0.4, 0.1, -0.2).into_inner();
        let center = Vector3::new(1.0, -2.0, 3.0);
        let extrinsic = Extrinsic {
            rotation,
            translation: -rotation * center,
        };

        let recovered = extrinsic.camera_center();
        assert_relative_eq!(recovered.x, center.x, epsilon = 1e-5);
        assert_relative_eq!(recovered.y, center.y, epsilon = 1e-5);
        assert_relative_eq!(recovered.z, center.z, epsilon = 1e-5);
    }
}
