//! Vertex-only PLY point cloud loading and saving.
//!
//! PLY files describe their records in a text header, so the header is
//! parsed first and a [`VertexLayout`] is resolved from the declared
//! properties. That layout then drives either the ascii decoder (one line per
//! vertex) or the binary decoder (one fixed-stride block for all vertices).
//! Face elements are ignored.
//!
//! Saving always produces `binary_little_endian` files with position and
//! color per vertex.
//!
//! # Example
//!
//! ```rust
//! use ply_cloud::Vertex;
//!
//! let ply_data = "ply
//! format ascii 1.0
//! element vertex 2
//! property float x
//! property float y
//! property float z
//! property uchar red
//! property uchar green
//! property uchar blue
//! end_header
//! 0 0 0 255 0 0
//! 1 2 3 0 255 0
//! ";
//!
//! let cloud = ply_cloud::load_scene_from_reader(ply_data.as_bytes()).unwrap();
//! assert_eq!(cloud.vertex_count(), 2);
//! assert_eq!(cloud.vertices()[1].color, [0, 255, 0]);
//!
//! // Write it back out as binary and read it again.
//! let bytes = ply_cloud::to_bytes(&cloud).unwrap();
//! let reloaded = ply_cloud::load_scene_from_reader(&bytes[..]).unwrap();
//! assert_eq!(reloaded.vertices()[1], Vertex::new([1.0, 2.0, 3.0], [0, 255, 0]));
//! ```

mod de;
mod error;
mod header;
mod layout;
mod model;
mod ser;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

pub use de::load_into;
pub use error::{PlyError, PlyResult};
pub use header::{LoadOptions, PlyFormat, PlyHeader, PropertyDescriptor, PropertyRole, ScalarType};
pub use layout::{LayoutField, VertexLayout};
pub use model::{PointCloud, Vertex, VertexArrays, VertexSink};
pub use ser::{save_scene_stream, to_bytes};

/// Load the point cloud stored in the PLY file at `path`.
pub fn load_scene(path: impl AsRef<Path>) -> PlyResult<PointCloud> {
    load_scene_with_options(path, &LoadOptions::default())
}

/// Load the PLY file at `path` with explicit [`LoadOptions`].
pub fn load_scene_with_options(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> PlyResult<PointCloud> {
    let file = File::open(path)?;
    let mut cloud = PointCloud::new();
    load_into(BufReader::new(file), options, &mut cloud)?;
    Ok(cloud)
}

/// Load a point cloud from any byte source.
pub fn load_scene_from_reader<R: Read>(reader: R) -> PlyResult<PointCloud> {
    let mut cloud = PointCloud::new();
    load_into(BufReader::new(reader), &LoadOptions::default(), &mut cloud)?;
    Ok(cloud)
}

/// Save `cloud` to `path`, replacing any existing file.
pub fn save_scene(path: impl AsRef<Path>, cloud: &PointCloud) -> PlyResult<()> {
    let file = File::create(path)?;
    save_scene_stream(BufWriter::new(file), cloud)
}
