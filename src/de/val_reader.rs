use std::marker::PhantomData;

use byteorder::ByteOrder;

use crate::header::ScalarType;
use crate::{PlyError, PlyResult};

/// Random access to the scalars of one vertex record.
///
/// `at` is a byte offset for binary records and a token index for ascii lines.
/// Values are converted to the requested width whatever their declared type.
pub(crate) trait ScalarReader {
    fn read_f32(&self, at: usize, data_type: ScalarType) -> PlyResult<f32>;
    fn read_u8(&self, at: usize, data_type: ScalarType) -> PlyResult<u8>;

    fn read_f32x3(&self, at: [usize; 3], data_type: ScalarType) -> PlyResult<[f32; 3]> {
        Ok([
            self.read_f32(at[0], data_type)?,
            self.read_f32(at[1], data_type)?,
            self.read_f32(at[2], data_type)?,
        ])
    }

    fn read_u8x3(&self, at: [usize; 3], data_type: ScalarType) -> PlyResult<[u8; 3]> {
        Ok([
            self.read_u8(at[0], data_type)?,
            self.read_u8(at[1], data_type)?,
            self.read_u8(at[2], data_type)?,
        ])
    }
}

/// Reads scalars out of a fixed-stride binary record.
pub(crate) struct BinValReader<'a, E: ByteOrder> {
    record: &'a [u8],
    _endian: PhantomData<E>,
}

impl<'a, E: ByteOrder> BinValReader<'a, E> {
    pub(crate) fn new(record: &'a [u8]) -> Self {
        Self {
            record,
            _endian: PhantomData,
        }
    }

    fn bytes(&self, at: usize, data_type: ScalarType) -> PlyResult<&'a [u8]> {
        self.record
            .get(at..at + data_type.size_bytes())
            .ok_or_else(|| PlyError::Truncated(format!("Record too short for offset {at}")))
    }
}

impl<E: ByteOrder> ScalarReader for BinValReader<'_, E> {
    fn read_f32(&self, at: usize, data_type: ScalarType) -> PlyResult<f32> {
        let bytes = self.bytes(at, data_type)?;
        Ok(match data_type {
            ScalarType::Float => E::read_f32(bytes),
            ScalarType::UChar => f32::from(bytes[0]),
        })
    }

    fn read_u8(&self, at: usize, data_type: ScalarType) -> PlyResult<u8> {
        let bytes = self.bytes(at, data_type)?;
        Ok(match data_type {
            ScalarType::Float => E::read_f32(bytes) as u8,
            ScalarType::UChar => bytes[0],
        })
    }
}

/// Reads scalars out of the tokens of one ascii line.
pub(crate) struct AsciiValReader<'a> {
    tokens: Vec<&'a str>,
    line_index: usize,
}

impl<'a> AsciiValReader<'a> {
    /// Splits on a single literal space; consecutive spaces yield empty tokens.
    pub(crate) fn new(line: &'a str, line_index: usize) -> Self {
        Self {
            tokens: line.split(' ').collect(),
            line_index,
        }
    }

    pub(crate) fn token_count(&self) -> usize {
        self.tokens.len()
    }

    fn token(&self, at: usize) -> PlyResult<&'a str> {
        self.tokens.get(at).copied().map(str::trim).ok_or_else(|| {
            PlyError::Truncated(format!(
                "Vertex line {}: expected at least {} tokens, found {}",
                self.line_index,
                at + 1,
                self.tokens.len()
            ))
        })
    }

    fn invalid(&self, token: &str, expected: &str) -> PlyError {
        PlyError::Format(format!(
            "Vertex line {}: '{token}' is not a valid {expected}",
            self.line_index
        ))
    }
}

impl ScalarReader for AsciiValReader<'_> {
    fn read_f32(&self, at: usize, _data_type: ScalarType) -> PlyResult<f32> {
        let token = self.token(at)?;
        token.parse::<f32>().map_err(|_| self.invalid(token, "float"))
    }

    fn read_u8(&self, at: usize, data_type: ScalarType) -> PlyResult<u8> {
        let token = self.token(at)?;
        match data_type {
            ScalarType::UChar => token.parse::<u8>().map_err(|_| self.invalid(token, "uchar")),
            ScalarType::Float => token
                .parse::<f32>()
                .map(|v| v as u8)
                .map_err(|_| self.invalid(token, "float")),
        }
    }
}
