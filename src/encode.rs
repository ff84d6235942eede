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

//! Low-level encoding of Avro values.

use crate::{
    AvroResult,
    error::Details,
    util::{zig_i32, zig_i64},
};
use std::io::Write;

/// Low-level support for encoding Avro values, implemented by every
/// encoder in this crate.
///
/// One group of operations encodes leaf values (`encode_long`,
/// `encode_string`, ...). The other group drives maps and arrays:
/// `array_start`, `set_item_count`, `start_item` and `array_end` (with map
/// analogues). An encoder may split the items of one array or map into
/// several blocks by calling `set_item_count` more than once.
pub trait Encoder {
    /// Encode a null; no bytes are produced.
    fn encode_null(&mut self) -> AvroResult<()>;

    /// Encode a boolean as a single byte.
    fn encode_bool(&mut self, b: bool) -> AvroResult<()>;

    /// Encode a 32-bit signed int.
    fn encode_int(&mut self, i: i32) -> AvroResult<()>;

    /// Encode a 64-bit signed long.
    fn encode_long(&mut self, l: i64) -> AvroResult<()>;

    /// Encode a single-precision float.
    fn encode_float(&mut self, f: f32) -> AvroResult<()>;

    /// Encode a double-precision float.
    fn encode_double(&mut self, d: f64) -> AvroResult<()>;

    /// Encode a UTF-8 string.
    fn encode_string(&mut self, s: &str) -> AvroResult<()>;

    /// Encode arbitrary binary data.
    fn encode_bytes(&mut self, bytes: &[u8]) -> AvroResult<()>;

    /// Encode a fixed value; the length must equal the schema-declared size.
    fn encode_fixed(&mut self, bytes: &[u8]) -> AvroResult<()>;

    /// Encode an enum value by its symbol index.
    fn encode_enum(&mut self, index: usize) -> AvroResult<()>;

    /// Begin an array.
    fn array_start(&mut self) -> AvroResult<()>;

    /// End an array; every promised item must have been encoded.
    fn array_end(&mut self) -> AvroResult<()>;

    /// Begin a map.
    fn map_start(&mut self) -> AvroResult<()>;

    /// End a map; every promised entry must have been encoded.
    fn map_end(&mut self) -> AvroResult<()>;

    /// Announce the number of items in the next block of the current
    /// array or map. A count of zero is a no-op.
    fn set_item_count(&mut self, count: usize) -> AvroResult<()>;

    /// Mark the start of the next item of the current array or map.
    fn start_item(&mut self) -> AvroResult<()>;

    /// Encode the branch index of a union, followed by the branch value.
    fn encode_union_index(&mut self, index: usize) -> AvroResult<()>;

    /// Flush the underlying stream.
    fn flush(&mut self) -> AvroResult<()>;
}

/// An [`Encoder`] producing the Avro binary format on a [`Write`] stream.
pub struct BinaryEncoder<W> {
    writer: W,
}

impl<W: Write> BinaryEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the encoder and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, bytes: &[u8]) -> AvroResult<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| Details::WriteBytes(e).into())
    }
}

impl<W: Write> Encoder for BinaryEncoder<W> {
    fn encode_null(&mut self) -> AvroResult<()> {
        Ok(())
    }

    fn encode_bool(&mut self, b: bool) -> AvroResult<()> {
        self.write(&[u8::from(b)])
    }

    fn encode_int(&mut self, i: i32) -> AvroResult<()> {
        zig_i32(i, &mut self.writer).map(|_| ())
    }

    fn encode_long(&mut self, l: i64) -> AvroResult<()> {
        zig_i64(l, &mut self.writer).map(|_| ())
    }

    fn encode_float(&mut self, f: f32) -> AvroResult<()> {
        self.write(&f.to_le_bytes())
    }

    fn encode_double(&mut self, d: f64) -> AvroResult<()> {
        self.write(&d.to_le_bytes())
    }

    fn encode_string(&mut self, s: &str) -> AvroResult<()> {
        self.encode_bytes(s.as_bytes())
    }

    fn encode_bytes(&mut self, bytes: &[u8]) -> AvroResult<()> {
        self.encode_long(bytes.len() as i64)?;
        self.write(bytes)
    }

    fn encode_fixed(&mut self, bytes: &[u8]) -> AvroResult<()> {
        self.write(bytes)
    }

    fn encode_enum(&mut self, index: usize) -> AvroResult<()> {
        self.encode_long(index as i64)
    }

    fn array_start(&mut self) -> AvroResult<()> {
        Ok(())
    }

    fn array_end(&mut self) -> AvroResult<()> {
        // Terminating block with count 0.
        self.encode_long(0)
    }

    fn map_start(&mut self) -> AvroResult<()> {
        Ok(())
    }

    fn map_end(&mut self) -> AvroResult<()> {
        self.encode_long(0)
    }

    fn set_item_count(&mut self, count: usize) -> AvroResult<()> {
        if count == 0 {
            Ok(())
        } else {
            self.encode_long(count as i64)
        }
    }

    fn start_item(&mut self) -> AvroResult<()> {
        Ok(())
    }

    fn encode_union_index(&mut self, index: usize) -> AvroResult<()> {
        self.encode_long(index as i64)
    }

    fn flush(&mut self) -> AvroResult<()> {
        self.writer.flush().map_err(|e| Details::FlushWriter(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn encoded(f: impl FnOnce(&mut BinaryEncoder<&mut Vec<u8>>) -> AvroResult<()>) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut encoder = BinaryEncoder::new(&mut buffer);
        f(&mut encoder).unwrap();
        buffer
    }

    #[test]
    fn test_encode_long_boundaries() {
        assert_eq!(encoded(|e| e.encode_long(0)), [0x00]);
        assert_eq!(encoded(|e| e.encode_long(-1)), [0x01]);
        assert_eq!(encoded(|e| e.encode_long(-64)), [0x7f]);
        assert_eq!(encoded(|e| e.encode_long(64)), [0x80, 0x01]);
    }

    #[test]
    fn test_encode_floats_little_endian() {
        assert_eq!(encoded(|e| e.encode_float(1.0)), [0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(
            encoded(|e| e.encode_double(1.0)),
            [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf0, 0x3f]
        );
    }

    #[test]
    fn test_encode_string_length_prefixed() {
        assert_eq!(encoded(|e| e.encode_string("hi")), [0x04, 0x68, 0x69]);
    }

    #[test]
    fn test_encode_array_block() -> TestResult {
        let bytes = encoded(|e| {
            e.array_start()?;
            e.set_item_count(3)?;
            for i in [1, 2, 3] {
                e.start_item()?;
                e.encode_int(i)?;
            }
            e.array_end()
        });
        assert_eq!(bytes, [0x06, 0x02, 0x04, 0x06, 0x00]);
        Ok(())
    }

    #[test]
    fn test_encode_empty_array() {
        let bytes = encoded(|e| {
            e.array_start()?;
            e.set_item_count(0)?;
            e.array_end()
        });
        assert_eq!(bytes, [0x00]);
    }
}
