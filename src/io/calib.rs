//! Plain-text calibration readers and rig discovery.
//!
//! Two on-disk layouts are supported:
//! - a single `intrinsics.txt` + `extrinsics.txt` pair holding N cameras
//!   each, output identifiers being zero-padded positional indices
//! - a rig root folder whose subfolders each hold one such pair (one camera
//!   per subfolder), the subfolder name being the identifier
//!
//! An intrinsic record is 6 numbers: `fx fy cx cy width height`. An
//! extrinsic record is 12 numbers: the world-to-camera rotation in row-major
//! order followed by the translation. Whitespace and line breaks are
//! interchangeable; `#` starts a comment.

use crate::capture::CaptureEntry;
use crate::core::{Extrinsic, Intrinsic};
use nalgebra::{Matrix3, Vector3};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Fixed filenames looked up in each rig subfolder.
pub const INTRINSIC_FILENAME: &str = "intrinsics.txt";
pub const EXTRINSIC_FILENAME: &str = "extrinsics.txt";

const INTRINSIC_RECORD_LEN: usize = 6;
const EXTRINSIC_RECORD_LEN: usize = 12;

/// Errors that can occur when loading calibration or mesh data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid calibration data: {0}")]
    Parse(String),

    #[error("calibration count mismatch: {intrinsics} intrinsics vs {extrinsics} extrinsics")]
    CountMismatch {
        intrinsics: usize,
        extrinsics: usize,
    },

    #[error("unsupported camera model id {0}")]
    UnsupportedCameraModel(i32),

    #[error("invalid camera JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse intrinsic records from calibration text.
pub fn parse_intrinsics(text: &str) -> Result<Vec<Intrinsic>, LoadError> {
    let values = parse_numbers(text)?;
    if values.len() % INTRINSIC_RECORD_LEN != 0 {
        return Err(LoadError::Parse(format!(
            "intrinsic records are {} values each, file holds {}",
            INTRINSIC_RECORD_LEN,
            values.len()
        )));
    }

    values
        .chunks_exact(INTRINSIC_RECORD_LEN)
        .map(|c| {
            if c[4] < 1.0 || c[5] < 1.0 {
                return Err(LoadError::Parse(format!(
                    "intrinsic resolution {}x{} is not positive",
                    c[4], c[5]
                )));
            }
            Ok(Intrinsic {
                fx: c[0],
                fy: c[1],
                cx: c[2],
                cy: c[3],
                width: c[4] as u32,
                height: c[5] as u32,
            })
        })
        .collect()
}

/// Parse extrinsic records (row-major rotation, then translation).
pub fn parse_extrinsics(text: &str) -> Result<Vec<Extrinsic>, LoadError> {
    let values = parse_numbers(text)?;
    if values.len() % EXTRINSIC_RECORD_LEN != 0 {
        return Err(LoadError::Parse(format!(
            "extrinsic records are {} values each, file holds {}",
            EXTRINSIC_RECORD_LEN,
            values.len()
        )));
    }

    Ok(values
        .chunks_exact(EXTRINSIC_RECORD_LEN)
        .map(|c| Extrinsic {
            #[rustfmt::skip]
            rotation: Matrix3::new(
                c[0], c[1], c[2],
                c[3], c[4], c[5],
                c[6], c[7], c[8],
            ),
            translation: Vector3::new(c[9], c[10], c[11]),
        })
        .collect())
}

/// Load a multi-camera rig from one intrinsics/extrinsics file pair.
///
/// Record i of each file describes camera i; identifiers are zero-padded
/// positional indices (`0000`, `0001`, ...). Differing record counts are a
/// configuration error - the files describe no well-defined rig.
pub fn load_camera_files(
    intrinsic_path: &Path,
    extrinsic_path: &Path,
) -> Result<Vec<CaptureEntry>, LoadError> {
    let intrinsics = parse_intrinsics(&fs::read_to_string(intrinsic_path)?)?;
    let extrinsics = parse_extrinsics(&fs::read_to_string(extrinsic_path)?)?;

    if intrinsics.len() != extrinsics.len() {
        return Err(LoadError::CountMismatch {
            intrinsics: intrinsics.len(),
            extrinsics: extrinsics.len(),
        });
    }

    Ok(intrinsics
        .into_iter()
        .zip(extrinsics)
        .enumerate()
        .map(|(index, (intrinsic, extrinsic))| CaptureEntry {
            id: format!("{:04}", index),
            intrinsic,
            extrinsic,
        })
        .collect())
}

/// Discover a rig under `root`: one camera per subfolder.
///
/// Subfolders are visited in name order; those missing either calibration
/// file are skipped. Each file must hold exactly one record. An empty result
/// is not an error - the caller decides what an empty rig means.
pub fn discover_rig(root: &Path) -> Result<Vec<CaptureEntry>, LoadError> {
    let mut dirs: Vec<_> = fs::read_dir(root)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let mut entries = Vec::new();
    for dir in dirs {
        let intrinsic_path = dir.join(INTRINSIC_FILENAME);
        let extrinsic_path = dir.join(EXTRINSIC_FILENAME);
        if !intrinsic_path.is_file() || !extrinsic_path.is_file() {
            log::debug!("skipping {}: no calibration pair", dir.display());
            continue;
        }

        let id = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut cameras = load_camera_files(&intrinsic_path, &extrinsic_path)?;
        if cameras.len() != 1 {
            return Err(LoadError::Parse(format!(
                "{} holds {} cameras, expected exactly one per subfolder",
                dir.display(),
                cameras.len()
            )));
        }

        let mut entry = cameras.remove(0);
        entry.id = id;
        entries.push(entry);
    }

    Ok(entries)
}

#[derive(Deserialize)]
struct CameraJson {
    #[serde(default)]
    id: Option<String>,
    intrinsic: Intrinsic,
    extrinsic: Extrinsic,
}

/// Load a single camera from a JSON file, for one-off captures.
pub fn load_camera_json(path: &Path) -> Result<Vec<CaptureEntry>, LoadError> {
    let text = fs::read_to_string(path)?;
    let camera: CameraJson = serde_json::from_str(&text)?;

    let id = camera.id.unwrap_or_else(|| {
        path.file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "0000".to_string())
    });

    Ok(vec![CaptureEntry {
        id,
        intrinsic: camera.intrinsic,
        extrinsic: camera.extrinsic,
    }])
}

/// Tokenize calibration text into numbers, honoring `#` comments.
fn parse_numbers(text: &str) -> Result<Vec<f32>, LoadError> {
    let mut values = Vec::new();
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("");
        for token in line.split_whitespace() {
            let value = token
                .parse::<f32>()
                .map_err(|_| LoadError::Parse(format!("not a number: '{}'", token)))?;
            values.push(value);
        }
    }
    Ok(values)
}
