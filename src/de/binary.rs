use std::io::Read;
use std::marker::PhantomData;

use byteorder::ByteOrder;

use crate::de::val_reader::{BinValReader, ScalarReader};
use crate::layout::{LayoutField, VertexLayout};
use crate::model::{VertexArrays, MAX_PREALLOC};
use crate::{PlyError, PlyResult};

/// Decodes the whole binary vertex block in one pass.
///
/// The block is read as `vertex_count` fixed-stride records whose field
/// offsets come from the [`VertexLayout`]. Groups the layout lacks keep the
/// defaults of [`VertexArrays::with_defaults`].
pub(crate) struct BinaryDecoder<'l, E: ByteOrder> {
    layout: &'l VertexLayout,
    vertex_count: usize,
    _endian: PhantomData<E>,
}

impl<'l, E: ByteOrder> BinaryDecoder<'l, E> {
    pub fn new(layout: &'l VertexLayout, vertex_count: usize) -> Self {
        Self {
            layout,
            vertex_count,
            _endian: PhantomData,
        }
    }

    pub fn decode<R: Read>(&self, reader: R) -> PlyResult<VertexArrays> {
        let stride = self.layout.stride();
        if stride == 0 {
            if self.vertex_count > 0 {
                return Err(PlyError::Format(format!(
                    "{} binary vertices declared without any supported property",
                    self.vertex_count
                )));
            }
            return Ok(VertexArrays::default());
        }

        let body = self.read_body(reader, stride)?;
        let mut arrays = VertexArrays::with_defaults(self.vertex_count);

        for (i, record) in body.chunks_exact(stride).enumerate() {
            let values = BinValReader::<E>::new(record);
            if let Some(position) = self.layout.position() {
                arrays.positions[i] = values.read_f32x3(offsets(position), position.scalar_type)?;
            }
            if let Some(normal) = self.layout.normal() {
                arrays.normals[i] = values.read_f32x3(offsets(normal), normal.scalar_type)?;
            }
            if let Some(color) = self.layout.color() {
                arrays.colors[i] = values.read_u8x3(offsets(color), color.scalar_type)?;
            }
        }

        Ok(arrays)
    }

    /// Reads exactly `vertex_count * stride` bytes, failing if the stream ends early.
    fn read_body<R: Read>(&self, reader: R, stride: usize) -> PlyResult<Vec<u8>> {
        let expected = self.vertex_count.checked_mul(stride).ok_or_else(|| {
            PlyError::Format(format!(
                "Vertex block of {} x {stride} bytes is too large",
                self.vertex_count
            ))
        })?;

        let mut body = Vec::with_capacity(expected.min(MAX_PREALLOC * stride.max(1)));
        reader.take(expected as u64).read_to_end(&mut body)?;

        if body.len() < expected {
            return Err(PlyError::Truncated(format!(
                "Expected {expected} bytes of vertex data ({} vertices x {stride} bytes), found {}",
                self.vertex_count,
                body.len()
            )));
        }
        Ok(body)
    }
}

fn offsets(field: &LayoutField) -> [usize; 3] {
    [
        field.scalar_offset(0),
        field.scalar_offset(1),
        field.scalar_offset(2),
    ]
}
