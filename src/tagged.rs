//! The tagged, self-describing wire encoding.
//!
//! Every instance leads with a varint wire-kind tag, lengths and field tags
//! are varints, and a struct's declared field count comes from the wire
//! rather than the schema. Fields the schema does not know are skipped
//! structurally via [`TaggedDecoder::skip_instance`], so newer data decodes
//! against an older schema without losing recognized fields.

use crate::bitstream::{BitStream, Endian};
use crate::decoder::{Decoder, MAX_NEST_DEPTH};
use crate::error::{Error, Result};
use crate::schema::{ChoiceArm, FieldDescriptor, IntBounds, TypeDescriptor, TypeId, TypeSchema};
use crate::value::{Record, Value};

// Wire-kind tags. Each encoded instance starts with one, which is what lets
// `skip_instance` walk unknown data without a schema entry.
const WIRE_ARRAY: u64 = 0;
const WIRE_BITARRAY: u64 = 1;
const WIRE_BLOB: u64 = 2;
const WIRE_CHOICE: u64 = 3;
const WIRE_OPTIONAL: u64 = 4;
const WIRE_STRUCT: u64 = 5;
const WIRE_BOOL: u64 = 6;
const WIRE_U32: u64 = 7;
const WIRE_U64: u64 = 8;
const WIRE_VARINT: u64 = 9;

/// Decoder for the tagged, version-tolerant encoding.
pub struct TaggedDecoder<'a> {
    stream: BitStream<'a>,
    schema: &'a TypeSchema,
    depth: usize,
}

impl<'a> TaggedDecoder<'a> {
    /// Creates a decoder over `data`. One decoder serves one decode pass;
    /// it is not restartable.
    pub fn new(data: &'a [u8], schema: &'a TypeSchema) -> Self {
        Self {
            stream: BitStream::new(data, Endian::Big),
            schema,
            depth: 0,
        }
    }

    /// Reads an unsigned LEB128 varint: 7 bits per byte, low-order group
    /// first, continuation on the high bit. Works at any bit offset.
    pub fn read_varint(&mut self) -> Result<u64> {
        let offset = self.stream.used_bits();
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.stream.read_bits(8)?;
            result |= (byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift >= 64 {
                return Err(Error::malformed("varint exceeds 10 bytes", offset));
            }
        }
    }

    /// Reads a wire-kind tag and requires it to equal `expected`.
    ///
    /// A mismatch means schema and data disagree on structure — typically
    /// the wrong decoder variant was selected for this build.
    pub fn expect_tag(&mut self, expected: u64) -> Result<()> {
        let offset = self.stream.used_bits();
        let actual = self.read_varint()?;
        if actual == expected {
            Ok(())
        } else {
            Err(Error::TagMismatch {
                expected,
                actual,
                offset,
            })
        }
    }

    /// Skips one complete wire-level instance without a schema entry,
    /// advancing the cursor past it. This is the forward-compatibility
    /// mechanism behind unknown struct fields.
    ///
    /// The nesting here is dictated entirely by the wire, so it shares the
    /// decoder's depth limit.
    pub fn skip_instance(&mut self) -> Result<()> {
        if self.depth >= MAX_NEST_DEPTH {
            return Err(Error::malformed(
                "wire nesting too deep",
                self.stream.used_bits(),
            ));
        }
        self.depth += 1;
        let result = self.skip_value();
        self.depth -= 1;
        result
    }

    fn skip_value(&mut self) -> Result<()> {
        let offset = self.stream.used_bits();
        let kind = self.read_varint()?;
        match kind {
            WIRE_ARRAY => {
                let count = self.read_varint()?;
                for _ in 0..count {
                    self.skip_instance()?;
                }
            }
            WIRE_BITARRAY => {
                let len = self.read_varint()? as usize;
                self.stream.read_unaligned_bytes(len.div_ceil(8))?;
            }
            WIRE_BLOB => {
                let len = self.read_varint()? as usize;
                self.stream.read_unaligned_bytes(len)?;
            }
            WIRE_CHOICE => {
                self.read_varint()?;
                self.skip_instance()?;
            }
            WIRE_OPTIONAL => {
                if self.stream.read_bits(1)? != 0 {
                    self.skip_instance()?;
                }
            }
            WIRE_STRUCT => {
                let count = self.read_varint()?;
                for _ in 0..count {
                    self.read_varint()?;
                    self.skip_instance()?;
                }
            }
            WIRE_BOOL => {
                self.stream.read_bits(8)?;
            }
            WIRE_U32 => {
                self.stream.byte_align();
                self.stream.read_aligned_bytes(4)?;
            }
            WIRE_U64 => {
                self.stream.byte_align();
                self.stream.read_aligned_bytes(8)?;
            }
            WIRE_VARINT => {
                self.read_varint()?;
            }
            other => {
                return Err(Error::malformed(format!("unknown wire kind {other}"), offset));
            }
        }
        Ok(())
    }

    pub fn decode_int(&mut self, bounds: &IntBounds) -> Result<i64> {
        self.expect_tag(WIRE_VARINT)?;
        let raw = self.read_varint()?;
        Ok(bounds.bias.wrapping_add(raw as i64))
    }

    pub fn decode_bool(&mut self) -> Result<bool> {
        self.expect_tag(WIRE_BOOL)?;
        Ok(self.stream.read_bits(8)? != 0)
    }

    pub fn decode_blob(&mut self, _bounds: &IntBounds) -> Result<Vec<u8>> {
        self.expect_tag(WIRE_BLOB)?;
        let len = self.read_length()?;
        self.stream.read_unaligned_bytes(len)
    }

    pub fn decode_array(&mut self, _bounds: &IntBounds, element: TypeId) -> Result<Vec<Value>> {
        self.expect_tag(WIRE_ARRAY)?;
        let offset = self.stream.used_bits();
        let count = self.read_length()?;
        if count > self.remaining_bits() {
            return Err(Error::malformed(format!("array length {count}"), offset));
        }
        let mut values = Vec::new();
        for _ in 0..count {
            values.push(self.decode_by_type_id(element)?);
        }
        Ok(values)
    }

    /// Returns the declared bit length plus the raw buffer; flag extraction
    /// is deferred to the caller in this encoding.
    pub fn decode_bitarray(&mut self, _bounds: &IntBounds) -> Result<(usize, Vec<u8>)> {
        self.expect_tag(WIRE_BITARRAY)?;
        let len = self.read_length()?;
        let bytes = self.stream.read_unaligned_bytes(len.div_ceil(8))?;
        Ok((len, bytes))
    }

    pub fn decode_optional(&mut self, inner: TypeId) -> Result<Value> {
        self.expect_tag(WIRE_OPTIONAL)?;
        if self.stream.read_bits(1)? != 0 {
            self.decode_by_type_id(inner)
        } else {
            Ok(Value::Null)
        }
    }

    /// Decodes a struct from its wire-declared field list. Tags present in
    /// the schema decode in place; unknown tags are skipped; fields the
    /// wire omits are absent from the output record.
    pub fn decode_struct(&mut self, fields: &[FieldDescriptor]) -> Result<Record> {
        self.expect_tag(WIRE_STRUCT)?;
        let offset = self.stream.used_bits();
        let count = self.read_length()?;
        if count > self.remaining_bits() / 8 {
            return Err(Error::malformed(format!("struct field count {count}"), offset));
        }
        let mut record = Record::new();
        for _ in 0..count {
            let tag = self.read_varint()? as i64;
            match fields.iter().find(|field| field.tag == tag) {
                Some(field) => {
                    let value = self.decode_by_type_id(field.type_id)?;
                    record.push(field.name.clone(), value);
                }
                None => self.skip_instance()?,
            }
        }
        Ok(record)
    }

    pub fn decode_choice(
        &mut self,
        _bounds: &IntBounds,
        arms: &[ChoiceArm],
        type_id: TypeId,
    ) -> Result<Value> {
        self.expect_tag(WIRE_CHOICE)?;
        let offset = self.stream.used_bits();
        let tag = self.read_varint()? as i64;
        let arm = arms
            .iter()
            .find(|arm| arm.tag == tag)
            .ok_or(Error::UnknownChoiceTag {
                type_id,
                tag,
                offset,
            })?;
        let value = self.decode_by_type_id(arm.type_id)?;
        Ok(Value::Choice {
            name: arm.name.clone(),
            value: Box::new(value),
        })
    }

    pub fn decode_fourcc(&mut self) -> Result<[u8; 4]> {
        self.expect_tag(WIRE_U32)?;
        self.stream.byte_align();
        let bytes = self.stream.read_aligned_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn decode_null(&mut self) -> Result<Value> {
        Ok(Value::Null)
    }

    pub fn decode_real32(&mut self) -> Result<f64> {
        self.expect_tag(WIRE_U32)?;
        self.stream.byte_align();
        let raw = self.stream.read_bits(32)?;
        Ok(f64::from(f32::from_bits(raw as u32)))
    }

    pub fn decode_real64(&mut self) -> Result<f64> {
        self.expect_tag(WIRE_U64)?;
        self.stream.byte_align();
        let raw = self.stream.read_bits(64)?;
        Ok(f64::from_bits(raw))
    }

    fn read_length(&mut self) -> Result<usize> {
        let offset = self.stream.used_bits();
        let len = self.read_varint()?;
        usize::try_from(len).map_err(|_| Error::malformed(format!("length {len}"), offset))
    }

    fn remaining_bits(&self) -> usize {
        self.total_bits() - self.used_bits()
    }
}

impl Decoder for TaggedDecoder<'_> {
    fn decode_by_type_id(&mut self, type_id: TypeId) -> Result<Value> {
        if self.depth >= MAX_NEST_DEPTH {
            return Err(Error::malformed(
                "value nesting too deep",
                self.stream.used_bits(),
            ));
        }
        self.depth += 1;
        let result = self.decode_descriptor(type_id);
        self.depth -= 1;
        result
    }

    fn byte_align(&mut self) {
        self.stream.byte_align();
    }

    fn is_done(&self) -> bool {
        self.stream.is_done()
    }

    fn used_bits(&self) -> usize {
        self.stream.used_bits()
    }

    fn total_bits(&self) -> usize {
        self.stream.total_bits()
    }
}

impl TaggedDecoder<'_> {
    fn decode_descriptor(&mut self, type_id: TypeId) -> Result<Value> {
        let descriptor = self.schema.get(type_id)?;
        match descriptor {
            TypeDescriptor::Int(bounds) => self.decode_int(bounds).map(Value::Int),
            TypeDescriptor::Blob(bounds) => self.decode_blob(bounds).map(Value::Blob),
            TypeDescriptor::Bool => self.decode_bool().map(Value::Bool),
            TypeDescriptor::Array { bounds, element } => {
                self.decode_array(bounds, *element).map(Value::Array)
            }
            TypeDescriptor::BitArray(bounds) => self
                .decode_bitarray(bounds)
                .map(|(len, bytes)| Value::BitBlob { len, bytes }),
            TypeDescriptor::Optional { inner } => self.decode_optional(*inner),
            TypeDescriptor::Struct { fields } => self.decode_struct(fields).map(Value::Struct),
            TypeDescriptor::Choice { bounds, arms } => self.decode_choice(bounds, arms, type_id),
            TypeDescriptor::FourCc => self.decode_fourcc().map(Value::FourCc),
            TypeDescriptor::Null => self.decode_null(),
            TypeDescriptor::Real32 => self.decode_real32().map(Value::Real),
            TypeDescriptor::Real64 => self.decode_real64().map(Value::Real),
        }
    }
}
