// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Low-level decoding of Avro values.

use crate::{
    AvroResult,
    error::Details,
    util::{safe_len, zag_i32, zag_i64},
};
use std::io::Read;

/// Low-level support for decoding Avro values, implemented by every
/// decoder in this crate.
///
/// Leaf operations mirror [`Encoder`](crate::Encoder). For arrays and
/// maps, `array_start`/`array_next` return the item count of the next
/// block, with 0 signalling the end; `skip_*` variants consume a value
/// without materializing it.
pub trait Decoder {
    /// Decode a null; consumes no bytes.
    fn decode_null(&mut self) -> AvroResult<()>;

    /// Decode a boolean.
    fn decode_bool(&mut self) -> AvroResult<bool>;

    /// Decode a 32-bit signed int.
    fn decode_int(&mut self) -> AvroResult<i32>;

    /// Decode a 64-bit signed long.
    fn decode_long(&mut self) -> AvroResult<i64>;

    /// Decode a single-precision float.
    fn decode_float(&mut self) -> AvroResult<f32>;

    /// Decode a double-precision float.
    fn decode_double(&mut self) -> AvroResult<f64>;

    /// Decode a UTF-8 string.
    fn decode_string(&mut self) -> AvroResult<String>;

    /// Skip a string.
    fn skip_string(&mut self) -> AvroResult<()>;

    /// Decode arbitrary binary data.
    fn decode_bytes(&mut self) -> AvroResult<Vec<u8>>;

    /// Skip a bytes value.
    fn skip_bytes(&mut self) -> AvroResult<()>;

    /// Decode a fixed value of the given length.
    fn decode_fixed(&mut self, len: usize) -> AvroResult<Vec<u8>>;

    /// Skip a fixed value of the given length.
    fn skip_fixed(&mut self, len: usize) -> AvroResult<()>;

    /// Decode an enum symbol index.
    fn decode_enum(&mut self) -> AvroResult<usize>;

    /// Begin an array; returns the item count of the first block, 0 for an
    /// empty array.
    fn array_start(&mut self) -> AvroResult<usize>;

    /// Returns the item count of the next array block, 0 at the end.
    fn array_next(&mut self) -> AvroResult<usize>;

    /// Skip an array. Returns 0 if the array was skipped in its entirety;
    /// otherwise the count of items the caller must skip one by one,
    /// calling `skip_array` again afterwards.
    fn skip_array(&mut self) -> AvroResult<usize>;

    /// Begin a map; returns the entry count of the first block.
    fn map_start(&mut self) -> AvroResult<usize>;

    /// Returns the entry count of the next map block, 0 at the end.
    fn map_next(&mut self) -> AvroResult<usize>;

    /// Skip a map, with the same contract as [`skip_array`](Self::skip_array).
    fn skip_map(&mut self) -> AvroResult<usize>;

    /// Decode the branch index of a union.
    fn decode_union_index(&mut self) -> AvroResult<usize>;

    /// For resolving decoders: the order in which the current record's
    /// fields must be read, as reader-field indices in the writer's
    /// on-the-wire order. Plain decoders return `None`.
    ///
    /// On a resolving decoder this must be called once per record,
    /// **before** decoding any of its fields: the call consumes the
    /// record boundary and the field-order list from the grammar, and
    /// decoding a field without it fails with a validation error
    /// (`ExpectedSymbol` naming the pending field-order list).
    /// [`GenericReader`](crate::GenericReader) follows this contract for
    /// every record it traverses, including records nested in arrays,
    /// maps, unions and spliced defaults.
    fn field_order(&mut self) -> AvroResult<Option<Vec<usize>>> {
        Ok(None)
    }
}

/// A [`Decoder`] reading the Avro binary format from a [`Read`] stream.
#[derive(Debug)]
pub struct BinaryDecoder<R> {
    reader: R,
}

impl<R: Read> BinaryDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Consume the decoder and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn decode_len(&mut self) -> AvroResult<usize> {
        let len = zag_i64(&mut self.reader)?;
        if len < 0 {
            return Err(Details::NegativeLength(len).into());
        }
        safe_len(len as usize)
    }

    /// Read a block count. A negative count carries the block's byte size
    /// in the following long; the absolute value is the item count.
    fn decode_block_count(&mut self) -> AvroResult<usize> {
        let count = zag_i64(&mut self.reader)?;
        if count < 0 {
            let size = zag_i64(&mut self.reader)?;
            if size < 0 {
                return Err(Details::NegativeLength(size).into());
            }
            safe_len(count.unsigned_abs() as usize)
        } else {
            safe_len(count as usize)
        }
    }

    fn skip_exact(&mut self, len: u64) -> AvroResult<()> {
        let skipped = std::io::copy(&mut self.reader.by_ref().take(len), &mut std::io::sink())
            .map_err(|e| Details::SkipBytes(e, len))?;
        if skipped < len {
            let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "input ended");
            return Err(Details::SkipBytes(eof, len).into());
        }
        Ok(())
    }

    /// Skip whole blocks using the byte size when the writer provided one;
    /// returns the item count of the first block without a byte size, or 0
    /// once the terminating block is reached.
    fn skip_blocks(&mut self) -> AvroResult<usize> {
        loop {
            let count = zag_i64(&mut self.reader)?;
            if count == 0 {
                return Ok(0);
            }
            if count < 0 {
                let size = zag_i64(&mut self.reader)?;
                if size < 0 {
                    return Err(Details::NegativeLength(size).into());
                }
                self.skip_exact(size as u64)?;
            } else {
                return safe_len(count as usize);
            }
        }
    }
}

impl<R: Read> Decoder for BinaryDecoder<R> {
    fn decode_null(&mut self) -> AvroResult<()> {
        Ok(())
    }

    fn decode_bool(&mut self) -> AvroResult<bool> {
        let mut buf = [0u8; 1];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadBoolean)?;
        match buf[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Details::BoolValue(other).into()),
        }
    }

    fn decode_int(&mut self) -> AvroResult<i32> {
        zag_i32(&mut self.reader)
    }

    fn decode_long(&mut self) -> AvroResult<i64> {
        zag_i64(&mut self.reader)
    }

    fn decode_float(&mut self) -> AvroResult<f32> {
        let mut buf = [0u8; 4];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadFloat)?;
        Ok(f32::from_le_bytes(buf))
    }

    fn decode_double(&mut self) -> AvroResult<f64> {
        let mut buf = [0u8; 8];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadDouble)?;
        Ok(f64::from_le_bytes(buf))
    }

    fn decode_string(&mut self) -> AvroResult<String> {
        let len = self.decode_len()?;
        let mut buf = vec![0u8; len];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadString)?;
        String::from_utf8(buf).map_err(|e| Details::ConvertToUtf8(e).into())
    }

    fn skip_string(&mut self) -> AvroResult<()> {
        let len = self.decode_len()?;
        self.skip_exact(len as u64)
    }

    fn decode_bytes(&mut self) -> AvroResult<Vec<u8>> {
        let len = self.decode_len()?;
        let mut buf = vec![0u8; len];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadBytes)?;
        Ok(buf)
    }

    fn skip_bytes(&mut self) -> AvroResult<()> {
        let len = self.decode_len()?;
        self.skip_exact(len as u64)
    }

    fn decode_fixed(&mut self, len: usize) -> AvroResult<Vec<u8>> {
        safe_len(len)?;
        let mut buf = vec![0u8; len];
        self.reader
            .read_exact(&mut buf)
            .map_err(|e| Details::ReadFixed(e, len))?;
        Ok(buf)
    }

    fn skip_fixed(&mut self, len: usize) -> AvroResult<()> {
        self.skip_exact(len as u64)
    }

    fn decode_enum(&mut self) -> AvroResult<usize> {
        let index = zag_i64(&mut self.reader)?;
        if index < 0 {
            return Err(Details::NegativeLength(index).into());
        }
        Ok(index as usize)
    }

    fn array_start(&mut self) -> AvroResult<usize> {
        self.decode_block_count()
    }

    fn array_next(&mut self) -> AvroResult<usize> {
        self.decode_block_count()
    }

    fn skip_array(&mut self) -> AvroResult<usize> {
        self.skip_blocks()
    }

    fn map_start(&mut self) -> AvroResult<usize> {
        self.decode_block_count()
    }

    fn map_next(&mut self) -> AvroResult<usize> {
        self.decode_block_count()
    }

    fn skip_map(&mut self) -> AvroResult<usize> {
        self.skip_blocks()
    }

    fn decode_union_index(&mut self) -> AvroResult<usize> {
        let index = zag_i64(&mut self.reader)?;
        if index < 0 {
            return Err(Details::NegativeLength(index).into());
        }
        Ok(index as usize)
    }
}
