//! Binary little-endian PLY writer.
//!
//! The output layout is fixed: `x y z` as floats followed by `red green blue`
//! as uchars, and an empty face element so other tools recognise the file as
//! a mesh container.

use std::io::Write;

use byteorder::LittleEndian;
use tracing::debug;

use crate::model::PointCloud;
use crate::ser::val_writer::{BinValWriter, ScalarWriter};
use crate::PlyResult;

mod val_writer;

fn write_header(mut writer: impl Write, vertex_count: usize) -> PlyResult<()> {
    let header = format!(
        "ply\n\
         format binary_little_endian 1.0\n\
         comment Generated by ply_cloud\n\
         element vertex {vertex_count}\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property uchar red\n\
         property uchar green\n\
         property uchar blue\n\
         element face 0\n\
         property list uchar int vertex_indices\n\
         end_header\n"
    );
    writer.write_all(header.as_bytes())?;
    Ok(())
}

/// Write `cloud` to any byte sink as a binary little-endian PLY file.
///
/// Colors are written verbatim; normals are not written.
pub fn save_scene_stream<W: Write>(mut writer: W, cloud: &PointCloud) -> PlyResult<()> {
    debug!(vertex_count = cloud.vertex_count(), "writing ply point cloud");

    write_header(&mut writer, cloud.vertex_count())?;

    let mut out = BinValWriter::<_, LittleEndian>::new(&mut writer);
    for vertex in cloud.vertices() {
        out.write_f32x3(vertex.position)?;
        out.write_u8x3(vertex.color)?;
    }

    writer.flush()?;
    Ok(())
}

/// Serialize `cloud` into an in-memory PLY file.
pub fn to_bytes(cloud: &PointCloud) -> PlyResult<Vec<u8>> {
    let mut buf = vec![];
    save_scene_stream(&mut buf, cloud)?;
    Ok(buf)
}
