//! Textual PLY header parsing.
//!
//! Only the vertex part of the header is interpreted. Everything from the
//! first `element face ` declaration onward is skipped, and property lines
//! are reduced to the group leaders (`x`, `nx`, `red`, `alpha`) that make up
//! the vertex record. The stream is always consumed up to and including the
//! `end_header` line so the body can be decoded from the same reader.
//!
//! A few things are accepted leniently: a `format` line without a version
//! token (the version is left empty), a stream that ends before
//! `end_header`, and `list` properties, which are skipped even in strict
//! mode.

use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::layout::VertexLayout;
use crate::{PlyError, PlyResult};

const MAGIC: &str = "ply";
const END_HEADER: &str = "end_header";
const FACE_ELEMENT: &str = "element face ";
const VERTEX_ELEMENT: &str = "element vertex ";

/// PLY file format (ascii or binary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl fmt::Display for PlyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlyFormat::Ascii => write!(f, "ascii"),
            PlyFormat::BinaryLittleEndian => write!(f, "binary_little_endian"),
            PlyFormat::BinaryBigEndian => write!(f, "binary_big_endian"),
        }
    }
}

impl FromStr for PlyFormat {
    type Err = PlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascii" => Ok(PlyFormat::Ascii),
            "binary_little_endian" => Ok(PlyFormat::BinaryLittleEndian),
            "binary_big_endian" => Ok(PlyFormat::BinaryBigEndian),
            _ => Err(PlyError::Format(format!("Unknown format token: {s}"))),
        }
    }
}

/// Scalar types understood by the vertex loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Float,
    UChar,
}

impl ScalarType {
    /// Maps a header type token. Anything but `float` and `uchar` is unsupported.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "float" => Some(ScalarType::Float),
            "uchar" => Some(ScalarType::UChar),
            _ => None,
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            ScalarType::Float => 4,
            ScalarType::UChar => 1,
        }
    }
}

/// What a vertex property means to the point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyRole {
    Position,
    Normal,
    ColorRed,
    ColorGreen,
    ColorBlue,
    Alpha,
    Unknown,
}

impl PropertyRole {
    pub fn from_name(name: &str) -> Self {
        match name {
            "x" | "y" | "z" => PropertyRole::Position,
            "nx" | "ny" | "nz" => PropertyRole::Normal,
            "red" => PropertyRole::ColorRed,
            "green" => PropertyRole::ColorGreen,
            "blue" => PropertyRole::ColorBlue,
            "alpha" => PropertyRole::Alpha,
            _ => PropertyRole::Unknown,
        }
    }

    /// Number of consecutive scalars a group starting with this role spans.
    pub fn group_size(&self) -> usize {
        match self {
            PropertyRole::Position | PropertyRole::Normal | PropertyRole::ColorRed => 3,
            PropertyRole::Alpha => 1,
            _ => 0,
        }
    }
}

/// A group-leading vertex property, in header declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub source_name: String,
    pub role: PropertyRole,
    pub scalar_type: ScalarType,
    pub group_size: usize,
}

impl PropertyDescriptor {
    /// Builds a descriptor for names that start a group; `None` for everything else.
    ///
    /// `y`, `z`, `ny`, `green` and friends are covered by the group size of
    /// their leader and never get a descriptor of their own.
    pub fn group_leader(name: &str, scalar_type: ScalarType) -> Option<Self> {
        let role = match name {
            "x" | "nx" | "red" | "alpha" => PropertyRole::from_name(name),
            _ => return None,
        };
        Some(Self {
            source_name: name.to_string(),
            role,
            scalar_type,
            group_size: role.group_size(),
        })
    }

    pub fn byte_width(&self) -> usize {
        self.scalar_type.size_bytes() * self.group_size
    }
}

/// Knobs for reading PLY files. The default reproduces the lenient legacy behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Reject property lines whose type is not `float` or `uchar` instead of dropping them.
    pub strict_property_types: bool,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self {
            strict_property_types: true,
        }
    }
}

/// The vertex-relevant content of a PLY header.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyHeader {
    pub format: PlyFormat,
    pub version: String,
    pub vertex_count: usize,
    pub properties: Vec<PropertyDescriptor>,
    pub comments: Vec<String>,
}

impl PlyHeader {
    /// Parse a PLY header with the default, lenient options.
    pub fn parse<R: BufRead>(reader: &mut R) -> PlyResult<Self> {
        Self::parse_with_options(reader, &LoadOptions::default())
    }

    /// Parse a PLY header, leaving `reader` at the first byte after `end_header`.
    pub fn parse_with_options<R: BufRead>(
        reader: &mut R,
        options: &LoadOptions,
    ) -> PlyResult<Self> {
        let lines = read_header_lines(reader)?;

        if lines.first().map(String::as_str) != Some(MAGIC) {
            return Err(PlyError::Format("File must start with 'ply'".to_string()));
        }

        let format_line = lines
            .iter()
            .find(|line| !line.starts_with("comment ") && line.contains("format "))
            .ok_or_else(|| PlyError::Format("Missing format specification".to_string()))?;
        let mut parts = format_line.split_whitespace().skip(1);
        let format = parts
            .next()
            .ok_or_else(|| PlyError::Format(format!("Invalid format line: {format_line}")))?
            .parse::<PlyFormat>()?;
        let version = parts.next().unwrap_or_default().to_string();

        let mut vertex_count = None;
        let mut properties = Vec::new();
        let mut comments = Vec::new();

        for line in &lines {
            if let Some(comment) = line.strip_prefix("comment ") {
                comments.push(comment.to_string());
            } else if let Some((_, count)) = line.split_once(VERTEX_ELEMENT) {
                let count = count.trim().parse::<usize>().map_err(|_| {
                    PlyError::Format(format!("Invalid vertex count: {}", count.trim()))
                })?;
                vertex_count = Some(count);
            } else if line.contains("property ") {
                if let Some(descriptor) = parse_property_line(line, options)? {
                    properties.push(descriptor);
                }
            }
        }

        let vertex_count = vertex_count
            .ok_or_else(|| PlyError::Format("Missing 'element vertex' declaration".to_string()))?;

        Ok(PlyHeader {
            format,
            version,
            vertex_count,
            properties,
            comments,
        })
    }

    /// Resolve the byte/token layout of one vertex record.
    pub fn layout(&self) -> VertexLayout {
        VertexLayout::from_properties(&self.properties)
    }
}

/// Reads header lines up to `end_header` (or end of stream), keeping only the
/// part before the first face element.
fn read_header_lines<R: BufRead>(reader: &mut R) -> PlyResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut raw = Vec::new();
    let mut faces_reached = false;

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }

        let line = std::str::from_utf8(&raw)
            .map_err(|e| PlyError::Format(format!("Invalid UTF-8 in header: {e}")))?
            .trim_end_matches(['\n', '\r']);

        if line == END_HEADER {
            break;
        }
        if faces_reached {
            continue;
        }

        match line.split_once(FACE_ELEMENT) {
            Some((before, _)) => {
                faces_reached = true;
                if !before.is_empty() {
                    lines.push(before.to_string());
                }
            }
            None => lines.push(line.to_string()),
        }
    }

    Ok(lines)
}

fn parse_property_line(
    line: &str,
    options: &LoadOptions,
) -> PlyResult<Option<PropertyDescriptor>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.first() != Some(&"property") {
        return Ok(None);
    }
    if parts.len() < 3 {
        return Err(PlyError::Format(format!("Invalid property line: {line}")));
    }

    let (type_token, name) = (parts[1], parts[2]);
    if type_token == "list" {
        trace!(
            property = parts[parts.len() - 1],
            "list property not part of the vertex layout"
        );
        return Ok(None);
    }
    let Some(scalar_type) = ScalarType::parse(type_token) else {
        if options.strict_property_types {
            return Err(PlyError::Format(format!(
                "Unsupported property type '{type_token}' for '{}'",
                parts[parts.len() - 1]
            )));
        }
        warn!(
            property = parts[parts.len() - 1],
            type_token, "dropping property with unsupported type"
        );
        return Ok(None);
    };

    let descriptor = PropertyDescriptor::group_leader(name, scalar_type);
    if descriptor.is_none() {
        trace!(property = name, "property not part of the vertex layout");
    }
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn test_parse_simple_header() {
        let header_text = "ply\n\
format ascii 1.0\n\
comment A simple PLY file\n\
element vertex 3\n\
property float x\n\
property float y\n\
property float z\n\
property uchar red\n\
property uchar green\n\
property uchar blue\n\
element face 1\n\
property list uchar int vertex_indices\n\
end_header\n";

        let mut cursor = Cursor::new(header_text);
        let header = PlyHeader::parse(&mut cursor).unwrap();

        assert_eq!(header.format, PlyFormat::Ascii);
        assert_eq!(header.version, "1.0");
        assert_eq!(header.vertex_count, 3);
        assert_eq!(header.comments, vec!["A simple PLY file".to_string()]);

        let names: Vec<&str> = header
            .properties
            .iter()
            .map(|p| p.source_name.as_str())
            .collect();
        assert_eq!(names, vec!["x", "red"]);
        assert_eq!(header.properties[0].role, PropertyRole::Position);
        assert_eq!(header.properties[0].group_size, 3);
        assert_eq!(header.properties[1].scalar_type, ScalarType::UChar);
    }

    #[test]
    fn test_stream_positioned_after_header() {
        let data = b"ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty uchar alpha\nend_header\n\x07rest";
        let mut cursor = Cursor::new(&data[..]);
        let header = PlyHeader::parse(&mut cursor).unwrap();
        assert_eq!(header.format, PlyFormat::BinaryLittleEndian);

        let mut body = Vec::new();
        cursor.read_to_end(&mut body).unwrap();
        assert_eq!(body, b"\x07rest");
    }

    #[test]
    fn test_crlf_header() {
        let text = "ply\r\nformat binary_big_endian 1.0\r\nelement vertex 2\r\nproperty float nx\r\nend_header\r\n";
        let header = PlyHeader::parse(&mut Cursor::new(text)).unwrap();
        assert_eq!(header.format, PlyFormat::BinaryBigEndian);
        assert_eq!(header.vertex_count, 2);
        assert_eq!(header.properties[0].role, PropertyRole::Normal);
    }

    #[test]
    fn test_face_section_is_discarded() {
        let text = "ply\nformat ascii 1.0\nelement vertex 0\nelement face 4\nproperty float x\nend_header\n";
        let header = PlyHeader::parse(&mut Cursor::new(text)).unwrap();
        assert!(header.properties.is_empty());
    }

    #[test]
    fn test_bad_magic() {
        let text = "plx\nformat ascii 1.0\nelement vertex 0\nend_header\n";
        let err = PlyHeader::parse(&mut Cursor::new(text)).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_unknown_format_token() {
        let text = "ply\nformat binary_middle_endian 1.0\nelement vertex 0\nend_header\n";
        let err = PlyHeader::parse(&mut Cursor::new(text)).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_bad_vertex_count() {
        let text = "ply\nformat ascii 1.0\nelement vertex many\nend_header\n";
        let err = PlyHeader::parse(&mut Cursor::new(text)).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_unsupported_type_leniency() {
        let text = "ply\nformat ascii 1.0\nelement vertex 0\nproperty double x\nproperty uchar red\nend_header\n";
        let header = PlyHeader::parse(&mut Cursor::new(text)).unwrap();
        assert_eq!(header.properties.len(), 1);
        assert_eq!(header.properties[0].role, PropertyRole::ColorRed);

        let err = PlyHeader::parse_with_options(&mut Cursor::new(text), &LoadOptions::strict())
            .unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_list_property_skipped_in_strict_mode() {
        let text = "ply\nformat ascii\nelement vertex 0\nproperty float x\nproperty list uchar int idx\nend_header\n";
        let header =
            PlyHeader::parse_with_options(&mut Cursor::new(text), &LoadOptions::strict()).unwrap();
        assert_eq!(header.properties.len(), 1);
        assert_eq!(header.properties[0].source_name, "x");
        assert_eq!(header.version, "");
    }

    #[test]
    fn test_unrecognized_names_dropped() {
        let text = "ply\nformat ascii 1.0\nelement vertex 0\nproperty float intensity\nproperty float x\nend_header\n";
        let header = PlyHeader::parse(&mut Cursor::new(text)).unwrap();
        assert_eq!(header.properties.len(), 1);
        assert_eq!(header.properties[0].source_name, "x");
    }

    #[test]
    fn test_comment_mentioning_format() {
        let text = "ply\ncomment format ascii 1.0\nformat binary_big_endian 1.0\nelement vertex 0\nend_header\n";
        let header = PlyHeader::parse(&mut Cursor::new(text)).unwrap();
        assert_eq!(header.format, PlyFormat::BinaryBigEndian);
        assert_eq!(header.comments, vec!["format ascii 1.0".to_string()]);
    }

    #[test]
    fn test_role_table() {
        assert_eq!(PropertyRole::from_name("z"), PropertyRole::Position);
        assert_eq!(PropertyRole::from_name("ny"), PropertyRole::Normal);
        assert_eq!(PropertyRole::from_name("blue"), PropertyRole::ColorBlue);
        assert_eq!(PropertyRole::from_name("intensity"), PropertyRole::Unknown);
        assert!(PropertyDescriptor::group_leader("green", ScalarType::UChar).is_none());
        assert_eq!(
            PropertyDescriptor::group_leader("alpha", ScalarType::UChar)
                .unwrap()
                .byte_width(),
            1
        );
    }
}
