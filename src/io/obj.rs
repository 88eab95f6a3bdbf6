//! Wavefront OBJ mesh loader.
//!
//! Only the records the depth pass needs are read: `v` positions and `f`
//! faces. Texture/normal references in face tokens (`v/vt/vn`) are accepted
//! and discarded, and polygons with more than three vertices are
//! fan-triangulated.

use crate::core::Geometry;
use crate::io::LoadError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load a triangle mesh from an OBJ file.
pub fn load_obj(path: &Path) -> Result<Geometry, LoadError> {
    let file = File::open(path)?;
    parse_obj(BufReader::new(file))
}

/// Parse OBJ text from any reader.
pub fn parse_obj<R: BufRead>(reader: R) -> Result<Geometry, LoadError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let coords: Vec<&str> = parts.collect();
                if coords.len() < 3 {
                    return Err(parse_error(line_number, "vertex needs 3 coordinates"));
                }
                let mut position = [0.0f32; 3];
                for (slot, token) in position.iter_mut().zip(&coords) {
                    *slot = token.parse().map_err(|_| {
                        parse_error(line_number, &format!("bad vertex coordinate '{}'", token))
                    })?;
                }
                positions.push(position);
            }
            Some("f") => {
                let corners: Vec<u32> = parts
                    .map(|token| parse_face_index(token, positions.len(), line_number))
                    .collect::<Result<_, _>>()?;
                if corners.len() < 3 {
                    return Err(parse_error(line_number, "face needs at least 3 vertices"));
                }
                // Fan triangulation for quads and larger polygons
                for i in 1..corners.len() - 1 {
                    indices.push(corners[0]);
                    indices.push(corners[i]);
                    indices.push(corners[i + 1]);
                }
            }
            // vn, vt, usemtl, o, g, s, mtllib... irrelevant to depth
            _ => continue,
        }
    }

    Geometry::new(positions, indices)
        .map_err(|e| LoadError::Parse(format!("invalid mesh: {}", e)))
}

/// Parse one face corner token (`7`, `7/1`, `7/1/3`, `7//3`) into a
/// zero-based position index. Negative indices count from the end, per the
/// OBJ specification.
fn parse_face_index(token: &str, vertex_count: usize, line_number: usize) -> Result<u32, LoadError> {
    let first = token.split('/').next().unwrap_or("");
    let raw: i64 = first
        .parse()
        .map_err(|_| parse_error(line_number, &format!("bad face index '{}'", token)))?;

    let index = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        vertex_count as i64 + raw
    } else {
        return Err(parse_error(line_number, "face index 0 is not valid"));
    };

    if index < 0 || index as usize >= vertex_count {
        return Err(parse_error(
            line_number,
            &format!("face index {} out of range", raw),
        ));
    }
    Ok(index as u32)
}

fn parse_error(line_number: usize, message: &str) -> LoadError {
    LoadError::Parse(format!("line {}: {}", line_number + 1, message))
}
