use std::io::BufRead;

use crate::de::val_reader::{AsciiValReader, ScalarReader};
use crate::header::ScalarType;
use crate::layout::VertexLayout;
use crate::model::{Vertex, VertexSink};
use crate::{PlyError, PlyResult};

const POSITION_TOKENS: [usize; 3] = [0, 1, 2];
const NORMAL_TOKENS: [usize; 3] = [3, 4, 5];

/// Streams ascii vertex lines into a [`VertexSink`].
///
/// Token positions are fixed: position at 0..3, then the normal at 3..6 if
/// the header declares one, then the color. The header's declaration order
/// is not consulted, so files that put color before position are misread.
/// This matches what the legacy writer/reader pair produces and consumes.
pub(crate) struct AsciiDecoder<'l, R> {
    reader: R,
    layout: &'l VertexLayout,
    vertex_count: usize,
    vertices_read: usize,
    line: Vec<u8>,
}

impl<'l, R: BufRead> AsciiDecoder<'l, R> {
    pub fn new(reader: R, layout: &'l VertexLayout, vertex_count: usize) -> Self {
        Self {
            reader,
            layout,
            vertex_count,
            vertices_read: 0,
            line: Vec::with_capacity(128),
        }
    }

    fn color_tokens(&self) -> [usize; 3] {
        let start = if self.layout.has_normal() { 6 } else { 3 };
        [start, start + 1, start + 2]
    }

    fn required_tokens(&self) -> usize {
        if self.layout.has_color() {
            self.color_tokens()[2] + 1
        } else if self.layout.has_normal() {
            NORMAL_TOKENS[2] + 1
        } else {
            POSITION_TOKENS[2] + 1
        }
    }

    /// Decode the next vertex line, or `None` once `vertex_count` lines were read.
    pub fn next_vertex(&mut self) -> PlyResult<Option<Vertex>> {
        if self.vertices_read >= self.vertex_count {
            return Ok(None);
        }

        self.line.clear();
        if self.reader.read_until(b'\n', &mut self.line)? == 0 {
            return Err(PlyError::Truncated(format!(
                "Expected {} vertex lines, found {}",
                self.vertex_count, self.vertices_read
            )));
        }
        self.vertices_read += 1;

        let line = std::str::from_utf8(&self.line)
            .map_err(|e| {
                PlyError::Format(format!("Vertex line {}: {e}", self.vertices_read))
            })?
            .trim_end_matches(['\n', '\r']);

        let values = AsciiValReader::new(line, self.vertices_read);
        if values.token_count() < self.required_tokens() {
            return Err(PlyError::Truncated(format!(
                "Vertex line {}: expected {} tokens, found {}",
                self.vertices_read,
                self.required_tokens(),
                values.token_count()
            )));
        }

        let mut vertex = Vertex {
            position: values.read_f32x3(POSITION_TOKENS, ScalarType::Float)?,
            ..Vertex::default()
        };
        if let Some(normal) = self.layout.normal() {
            vertex.normal = values.read_f32x3(NORMAL_TOKENS, normal.scalar_type)?;
        }
        if let Some(color) = self.layout.color() {
            vertex.color = values.read_u8x3(self.color_tokens(), color.scalar_type)?;
        }

        Ok(Some(vertex))
    }

    /// Decode every remaining vertex, handing each to `sink` as soon as it is read.
    pub fn decode_into<S: VertexSink + ?Sized>(mut self, sink: &mut S) -> PlyResult<()> {
        sink.prepare(self.vertex_count);
        while let Some(vertex) = self.next_vertex()? {
            sink.push_vertex(vertex);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::PlyHeader;
    use crate::model::PointCloud;
    use std::io::Cursor;

    fn decode(ply: &str) -> PlyResult<PointCloud> {
        let mut cursor = Cursor::new(ply);
        let header = PlyHeader::parse(&mut cursor)?;
        let layout = header.layout();
        let mut cloud = PointCloud::new();
        AsciiDecoder::new(&mut cursor, &layout, header.vertex_count).decode_into(&mut cloud)?;
        Ok(cloud)
    }

    #[test]
    fn test_position_only() {
        let cloud = decode(
            "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n4.5 -5 6e1\n",
        )
        .unwrap();

        assert_eq!(cloud.vertex_count(), 2);
        assert_eq!(cloud.vertices()[1].position, [4.5, -5.0, 60.0]);
        assert_eq!(cloud.vertices()[1].color, Vertex::DEFAULT_COLOR);
        assert_eq!(cloud.vertices()[1].normal, Vertex::DEFAULT_NORMAL);
    }

    #[test]
    fn test_position_normal_color() {
        let cloud = decode(
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nproperty float nx\nproperty float ny\nproperty float nz\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n1 2 3 0 0 1 10 20 30\r\n",
        )
        .unwrap();

        let vertex = cloud.vertices()[0];
        assert_eq!(vertex.position, [1.0, 2.0, 3.0]);
        assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertex.color, [10, 20, 30]);
    }

    #[test]
    fn test_color_follows_position_regardless_of_header_order() {
        let cloud = decode(
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3 4 5 6\n",
        )
        .unwrap();

        let vertex = cloud.vertices()[0];
        assert_eq!(vertex.position, [1.0, 2.0, 3.0]);
        assert_eq!(vertex.color, [4, 5, 6]);
    }

    #[test]
    fn test_too_few_tokens() {
        let err = decode(
            "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty uchar red\nend_header\n0 0 0 1 2 3\n1 2 3\n",
        )
        .unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_too_few_lines() {
        let err = decode(
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nend_header\n0 0 0\n1 1 1\n",
        )
        .unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_extra_lines_left_unread() {
        let mut cursor = Cursor::new("1 2 3\n4 5 6\n");
        let layout = VertexLayout::default();
        let mut decoder = AsciiDecoder::new(&mut cursor, &layout, 1);
        assert!(decoder.next_vertex().unwrap().is_some());
        assert!(decoder.next_vertex().unwrap().is_none());
        assert_eq!(cursor.position(), 6);
    }
}
