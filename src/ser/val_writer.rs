use std::io::Write;
use std::marker::PhantomData;

use byteorder::{ByteOrder, WriteBytesExt};

use crate::PlyResult;

pub(crate) struct BinValWriter<W: Write, E: ByteOrder> {
    writer: W,
    _endian: PhantomData<E>,
}

impl<W: Write, E: ByteOrder> BinValWriter<W, E> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer,
            _endian: PhantomData,
        }
    }
}

/// Sink for the scalar types a written vertex record can hold.
pub(crate) trait ScalarWriter {
    fn write_u8(&mut self, val: u8) -> PlyResult<()>;
    fn write_f32(&mut self, val: f32) -> PlyResult<()>;

    fn write_f32x3(&mut self, vals: [f32; 3]) -> PlyResult<()> {
        vals.into_iter().try_for_each(|val| self.write_f32(val))
    }

    fn write_u8x3(&mut self, vals: [u8; 3]) -> PlyResult<()> {
        vals.into_iter().try_for_each(|val| self.write_u8(val))
    }
}

impl<W: Write, E: ByteOrder> ScalarWriter for BinValWriter<W, E> {
    fn write_u8(&mut self, val: u8) -> PlyResult<()> {
        Ok(self.writer.write_u8(val)?)
    }

    fn write_f32(&mut self, val: f32) -> PlyResult<()> {
        Ok(self.writer.write_f32::<E>(val)?)
    }
}
