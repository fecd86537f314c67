//! In-memory point cloud and the sink the decoders feed.

use serde::{Deserialize, Serialize};

/// Upper bound on up-front allocation driven by a header's vertex count.
pub(crate) const MAX_PREALLOC: usize = 1 << 20;

/// A single point of the cloud.
///
/// Fields the file does not declare keep their defaults: a zero normal and
/// white color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [u8; 3],
}

impl Vertex {
    pub const DEFAULT_POSITION: [f32; 3] = [0.0; 3];
    pub const DEFAULT_NORMAL: [f32; 3] = [0.0; 3];
    pub const DEFAULT_COLOR: [u8; 3] = [255; 3];

    pub fn new(position: [f32; 3], color: [u8; 3]) -> Self {
        Self {
            position,
            normal: Self::DEFAULT_NORMAL,
            color,
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Self::DEFAULT_POSITION,
            normal: Self::DEFAULT_NORMAL,
            color: Self::DEFAULT_COLOR,
        }
    }
}

/// Parallel per-vertex arrays produced by the binary decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexArrays {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<[u8; 3]>,
}

impl VertexArrays {
    /// `count` entries of every array, filled with the vertex defaults.
    pub fn with_defaults(count: usize) -> Self {
        Self {
            positions: vec![Vertex::DEFAULT_POSITION; count],
            normals: vec![Vertex::DEFAULT_NORMAL; count],
            colors: vec![Vertex::DEFAULT_COLOR; count],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn into_vertices(self) -> impl Iterator<Item = Vertex> {
        self.positions
            .into_iter()
            .zip(self.normals)
            .zip(self.colors)
            .map(|((position, normal), color)| Vertex {
                position,
                normal,
                color,
            })
    }
}

/// Destination for decoded vertices.
///
/// The ascii decoder streams one vertex at a time through `push_vertex`;
/// the binary decoder hands over the whole body at once via `assign_arrays`.
pub trait VertexSink {
    /// Called once before streaming with the vertex count from the header.
    fn prepare(&mut self, _count: usize) {}

    fn push_vertex(&mut self, vertex: Vertex);

    fn assign_arrays(&mut self, arrays: VertexArrays);
}

/// A point cloud: an ordered list of vertices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    vertices: Vec<Vertex>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut Vec<Vertex> {
        &mut self.vertices
    }

    pub fn push(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }
}

impl VertexSink for PointCloud {
    fn prepare(&mut self, count: usize) {
        self.vertices.reserve(count.min(MAX_PREALLOC));
    }

    fn push_vertex(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    fn assign_arrays(&mut self, arrays: VertexArrays) {
        self.vertices = arrays.into_vertices().collect();
    }
}
