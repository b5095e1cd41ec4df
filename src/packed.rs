//! The dense legacy wire encoding.
//!
//! Struct fields are decoded strictly in schema declaration order — there is
//! no on-wire tag; position alone determines identity. The format assumes
//! producer and schema are in lock-step: a mismatch shows up as garbage
//! values or buffer exhaustion, never as a detectable structural error. That
//! is a property of the encoding, not of this implementation.

use crate::bitstream::{BitStream, Endian};
use crate::decoder::{Decoder, MAX_NEST_DEPTH};
use crate::error::{Error, Result};
use crate::schema::{ChoiceArm, FieldDescriptor, IntBounds, TypeDescriptor, TypeId, TypeSchema};
use crate::value::{Record, Value};

/// Decoder for the bit-packed legacy encoding.
pub struct PackedDecoder<'a> {
    stream: BitStream<'a>,
    schema: &'a TypeSchema,
    depth: usize,
}

impl<'a> PackedDecoder<'a> {
    /// Creates a decoder over `data`. One decoder serves one decode pass;
    /// it is not restartable.
    pub fn new(data: &'a [u8], schema: &'a TypeSchema) -> Self {
        Self {
            stream: BitStream::new(data, Endian::Big),
            schema,
            depth: 0,
        }
    }

    pub fn decode_int(&mut self, bounds: &IntBounds) -> Result<i64> {
        let raw = self.stream.read_bits(bounds.bits)?;
        Ok(bounds.bias.wrapping_add(raw as i64))
    }

    pub fn decode_bool(&mut self) -> Result<bool> {
        Ok(self.stream.read_bits(1)? != 0)
    }

    pub fn decode_blob(&mut self, bounds: &IntBounds) -> Result<Vec<u8>> {
        let len = self.decode_length(bounds)?;
        self.stream.read_unaligned_bytes(len)
    }

    pub fn decode_array(&mut self, bounds: &IntBounds, element: TypeId) -> Result<Vec<Value>> {
        let len = self.decode_length(bounds)?;
        let mut values = Vec::new();
        for _ in 0..len {
            values.push(self.decode_by_type_id(element)?);
        }
        Ok(values)
    }

    /// Decodes a length-prefixed run of individual flag bits.
    pub fn decode_bitarray(&mut self, bounds: &IntBounds) -> Result<Vec<bool>> {
        let len = self.decode_length(bounds)?;
        if len > self.remaining_bits() {
            return Err(Error::BufferExhausted {
                offset: self.used_bits(),
                needed: len,
                total: self.total_bits(),
            });
        }
        let mut flags = Vec::with_capacity(len);
        for _ in 0..len {
            flags.push(self.stream.read_bits(1)? != 0);
        }
        Ok(flags)
    }

    pub fn decode_optional(&mut self, inner: TypeId) -> Result<Value> {
        if self.stream.read_bits(1)? != 0 {
            self.decode_by_type_id(inner)
        } else {
            Ok(Value::Null)
        }
    }

    pub fn decode_struct(&mut self, fields: &[FieldDescriptor]) -> Result<Record> {
        let mut record = Record::new();
        for field in fields {
            let value = self.decode_by_type_id(field.type_id)?;
            record.push(field.name.clone(), value);
        }
        Ok(record)
    }

    pub fn decode_choice(
        &mut self,
        bounds: &IntBounds,
        arms: &[ChoiceArm],
        type_id: TypeId,
    ) -> Result<Value> {
        let offset = self.used_bits();
        let tag = self.decode_int(bounds)?;
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
        self.stream.byte_align();
        let bytes = self.stream.read_aligned_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn decode_null(&mut self) -> Result<Value> {
        Ok(Value::Null)
    }

    pub fn decode_real32(&mut self) -> Result<f64> {
        self.stream.byte_align();
        let raw = self.stream.read_bits(32)?;
        Ok(f64::from(f32::from_bits(raw as u32)))
    }

    pub fn decode_real64(&mut self) -> Result<f64> {
        self.stream.byte_align();
        let raw = self.stream.read_bits(64)?;
        Ok(f64::from_bits(raw))
    }

    fn decode_descriptor(&mut self, type_id: TypeId) -> Result<Value> {
        let descriptor = self.schema.get(type_id)?;
        match descriptor {
            TypeDescriptor::Int(bounds) => self.decode_int(bounds).map(Value::Int),
            TypeDescriptor::Blob(bounds) => self.decode_blob(bounds).map(Value::Blob),
            TypeDescriptor::Bool => self.decode_bool().map(Value::Bool),
            TypeDescriptor::Array { bounds, element } => {
                self.decode_array(bounds, *element).map(Value::Array)
            }
            TypeDescriptor::BitArray(bounds) => self.decode_bitarray(bounds).map(Value::Flags),
            TypeDescriptor::Optional { inner } => self.decode_optional(*inner),
            TypeDescriptor::Struct { fields } => self.decode_struct(fields).map(Value::Struct),
            TypeDescriptor::Choice { bounds, arms } => self.decode_choice(bounds, arms, type_id),
            TypeDescriptor::FourCc => self.decode_fourcc().map(Value::FourCc),
            TypeDescriptor::Null => self.decode_null(),
            TypeDescriptor::Real32 => self.decode_real32().map(Value::Real),
            TypeDescriptor::Real64 => self.decode_real64().map(Value::Real),
        }
    }

    fn decode_length(&mut self, bounds: &IntBounds) -> Result<usize> {
        let offset = self.used_bits();
        let len = self.decode_int(bounds)?;
        usize::try_from(len)
            .map_err(|_| Error::malformed(format!("negative length {len}"), offset))
    }

    fn remaining_bits(&self) -> usize {
        self.total_bits() - self.used_bits()
    }
}

impl Decoder for PackedDecoder<'_> {
    fn decode_by_type_id(&mut self, type_id: TypeId) -> Result<Value> {
        if self.depth >= MAX_NEST_DEPTH {
            return Err(Error::malformed("value nesting too deep", self.used_bits()));
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
