//! Static triangle geometry consumed by the render pipeline.

use thiserror::Error;

/// Errors from constructing invalid geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("mesh has no triangles")]
    Empty,

    #[error("index count {count} is not a multiple of 3")]
    PartialTriangle { count: usize },

    #[error("index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
}

/// A static triangle mesh: vertex positions plus a triangle index list.
///
/// Owned by the render pipeline for the lifetime of a capture run and
/// read-only during rendering. Construction validates the index list, so a
/// `Geometry` value is always safe to upload.
#[derive(Clone, Debug)]
pub struct Geometry {
    positions: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl Geometry {
    /// Build a mesh, rejecting empty or out-of-bounds index lists.
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Result<Self, GeometryError> {
        if positions.is_empty() || indices.is_empty() {
            return Err(GeometryError::Empty);
        }
        if indices.len() % 3 != 0 {
            return Err(GeometryError::PartialTriangle {
                count: indices.len(),
            });
        }
        for &index in &indices {
            if index as usize >= positions.len() {
                return Err(GeometryError::IndexOutOfBounds {
                    index,
                    vertex_count: positions.len(),
                });
            }
        }

        Ok(Self { positions, indices })
    }

    /// Vertex positions in world space.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Triangle index list, three indices per triangle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_positions() -> Vec<[f32; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]
    }

    #[test]
    fn test_valid_mesh() {
        let mesh = Geometry::new(quad_positions(), vec![0, 1, 2, 0, 2, 3]).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.positions().len(), 4);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            Geometry::new(vec![], vec![]),
            Err(GeometryError::Empty)
        ));
        assert!(matches!(
            Geometry::new(quad_positions(), vec![]),
            Err(GeometryError::Empty)
        ));
    }

    #[test]
    fn test_partial_triangle_rejected() {
        assert!(matches!(
            Geometry::new(quad_positions(), vec![0, 1]),
            Err(GeometryError::PartialTriangle { count: 2 })
        ));
    }

    #[test]
    fn test_out_of_bounds_index_rejected() {
        assert!(matches!(
            Geometry::new(quad_positions(), vec![0, 1, 4]),
            Err(GeometryError::IndexOutOfBounds {
                index: 4,
                vertex_count: 4
            })
        ));
    }
}
