//! Vertex body decoders.
//!
//! Ascii bodies are streamed line by line into the sink; binary bodies are
//! read in one block and handed over as parallel arrays.

mod ascii;
mod binary;
mod val_reader;

use std::io::BufRead;

use byteorder::{BigEndian, LittleEndian};
use tracing::debug;

use crate::header::{LoadOptions, PlyFormat, PlyHeader};
use crate::model::VertexSink;
use crate::PlyResult;

use ascii::AsciiDecoder;
use binary::BinaryDecoder;

/// Parse the header from `reader` and decode its vertices into `sink`.
///
/// The header is validated completely before any body byte is read.
pub fn load_into<R, S>(
    mut reader: R,
    options: &LoadOptions,
    sink: &mut S,
) -> PlyResult<PlyHeader>
where
    R: BufRead,
    S: VertexSink + ?Sized,
{
    let header = PlyHeader::parse_with_options(&mut reader, options)?;
    let layout = header.layout();
    let count = header.vertex_count;

    debug!(
        format = %header.format,
        vertex_count = count,
        stride = layout.stride(),
        has_position = layout.has_position(),
        has_normal = layout.has_normal(),
        has_color = layout.has_color(),
        "decoding ply vertices"
    );

    match header.format {
        PlyFormat::Ascii => AsciiDecoder::new(&mut reader, &layout, count).decode_into(sink)?,
        PlyFormat::BinaryLittleEndian => {
            let arrays = BinaryDecoder::<LittleEndian>::new(&layout, count).decode(&mut reader)?;
            sink.assign_arrays(arrays)
        }
        PlyFormat::BinaryBigEndian => {
            let arrays = BinaryDecoder::<BigEndian>::new(&layout, count).decode(&mut reader)?;
            sink.assign_arrays(arrays)
        }
    }

    Ok(header)
}
