//! The versioned type-descriptor table that drives decoding.
//!
//! A [`TypeSchema`] is produced by an external schema-generation layer and is
//! treated here as read-only, pre-validated input: construction checks that
//! every referenced type id exists, so decode-time dispatch never chases a
//! dangling reference.

use crate::error::{Error, Result};

/// Index into a [`TypeSchema`]'s descriptor table.
pub type TypeId = usize;

/// The `(bias, bit width)` pair shared by integer-like wire fields.
///
/// The raw unsigned value read from the stream is offset by `bias`; container
/// lengths and choice tags are decoded with the owning descriptor's own
/// bounds before any payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntBounds {
    pub bias: i64,
    pub bits: u32,
}

impl IntBounds {
    pub const fn new(bias: i64, bits: u32) -> Self {
        Self { bias, bits }
    }
}

/// One named field of a struct descriptor, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Wire tag used by the tagged encoding; ignored by the packed encoding,
    /// where position alone determines identity.
    pub tag: i64,
    pub type_id: TypeId,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, tag: i64, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            tag,
            type_id,
        }
    }
}

/// One arm of a choice descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceArm {
    pub tag: i64,
    pub name: String,
    pub type_id: TypeId,
}

impl ChoiceArm {
    pub fn new(tag: i64, name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            tag,
            name: name.into(),
            type_id,
        }
    }
}

/// A single type descriptor. The set of kinds is closed; decoders match
/// exhaustively, so a malformed table cannot select an unknown decode path.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// Unsigned field of `bits` bits; value = `bias` + raw.
    Int(IntBounds),
    /// Length (decoded as an `Int` with these bounds), then that many bytes.
    Blob(IntBounds),
    /// One-bit truthiness.
    Bool,
    /// Length-prefixed homogeneous sequence.
    Array { bounds: IntBounds, element: TypeId },
    /// Length-prefixed bit flags.
    BitArray(IntBounds),
    /// One-bit presence flag, then the inner type or nothing.
    Optional { inner: TypeId },
    /// Ordered named fields.
    Struct { fields: Vec<FieldDescriptor> },
    /// Tagged union; exactly one arm is active per decoded instance.
    Choice {
        bounds: IntBounds,
        arms: Vec<ChoiceArm>,
    },
    /// Four raw bytes, byte-aligned.
    FourCc,
    /// Consumes nothing.
    Null,
    /// 32 raw bits reinterpreted as a float, byte-aligned.
    Real32,
    /// 64 raw bits reinterpreted as a float, byte-aligned.
    Real64,
}

/// An ordered, validated table of type descriptors addressed by [`TypeId`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSchema {
    types: Vec<TypeDescriptor>,
}

impl TypeSchema {
    /// Builds a schema, verifying that every type id referenced by an array
    /// element, struct field, optional inner type, or choice arm exists in
    /// the table.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaReference`] on the first dangling id found.
    pub fn new(types: Vec<TypeDescriptor>) -> Result<Self> {
        let schema = Self { types };
        for descriptor in &schema.types {
            match descriptor {
                TypeDescriptor::Array { element, .. } => schema.check_ref(*element)?,
                TypeDescriptor::Optional { inner } => schema.check_ref(*inner)?,
                TypeDescriptor::Struct { fields } => {
                    for field in fields {
                        schema.check_ref(field.type_id)?;
                    }
                }
                TypeDescriptor::Choice { arms, .. } => {
                    for arm in arms {
                        schema.check_ref(arm.type_id)?;
                    }
                }
                _ => {}
            }
        }
        Ok(schema)
    }

    fn check_ref(&self, type_id: TypeId) -> Result<()> {
        if type_id < self.types.len() {
            Ok(())
        } else {
            Err(Error::SchemaReference { type_id })
        }
    }

    /// Number of descriptors in the table.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Looks up a descriptor by id.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaReference`] when `type_id` is out of range. Root type
    /// ids arrive from outside the validated table, so this stays a checked
    /// lookup rather than an index.
    pub fn get(&self, type_id: TypeId) -> Result<&TypeDescriptor> {
        self.types
            .get(type_id)
            .ok_or(Error::SchemaReference { type_id })
    }
}
