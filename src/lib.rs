//! # replaystream
//!
//! A schema-driven decoder for versioned, bit-packed replay telemetry.
//!
//! ## Overview
//!
//! Multiplayer replay archives record telemetry in an undisclosed,
//! versioned binary encoding. Two mutually incompatible bit-level framing
//! strategies exist across the game's history — a densely bit-packed legacy
//! form and a later tagged, self-describing form — selected by a
//! build-number threshold found in the match header. `replaystream` is the
//! decode engine: a bit-precision stream reader plus an interpreter that
//! walks an externally produced type-descriptor table and yields
//! dynamically-shaped value trees, with lazy single-pass decoding for the
//! repeated event files.
//!
//! ## Key Features
//!
//! * **Bit-precision reads**: a cursor with exact bit-offset bookkeeping,
//!   big- and little-endian assembly, and aligned/unaligned byte access
//! * **Two encodings, one contract**: [`PackedDecoder`] and
//!   [`TaggedDecoder`] are independent strategies behind the [`Decoder`]
//!   trait, picked at runtime from the build number
//! * **Forward compatible**: the tagged encoding skips unknown struct
//!   fields instead of failing
//! * **Lazy event streams**: one record at a time with bit-level progress
//!   reporting
//! * **Hostile-input safe**: malformed buffers surface as typed errors with
//!   offsets, never panics or partial output
//!
//! ## Quick Start
//!
//! ```rust
//! use replaystream::*;
//!
//! // The descriptor table normally comes from the schema-generation layer.
//! let schema = TypeSchema::new(vec![
//!     TypeDescriptor::Int(IntBounds::new(0, 8)),
//!     TypeDescriptor::Struct {
//!         fields: vec![
//!             FieldDescriptor::new("version", 0, 0),
//!             FieldDescriptor::new("frames", 1, 0),
//!         ],
//!     },
//! ])?;
//!
//! let data = [0x02, 0x30];
//! let mut decoder = PackedDecoder::new(&data, &schema);
//! let header = decoder.decode_by_type_id(1)?;
//! assert_eq!(header.field("version").and_then(|v| v.as_int()), Some(2));
//! assert_eq!(header.field("frames").and_then(|v| v.as_int()), Some(48));
//! # Ok::<(), replaystream::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Data flows leaves-first: raw buffer → [`BitStream`] →
//! decoder([`TypeSchema`]) → [`Value`] tree; event buffers additionally go
//! through an [`EventStream`] that invokes the decoder once per record. The
//! [`Protocol`] facade binds one schema, build number, decoder variant, and
//! the named root type ids into the entry points the archive-orchestration
//! layer calls.
//!
//! Decoding is synchronous and allocation-light: a decode call is a pure
//! function of `(buffer, schema, variant, root type)`, so independent calls
//! can run on separate threads without coordination.

pub mod attributes;
pub mod bitstream;
pub mod decoder;
pub mod error;
pub mod events;
pub mod packed;
pub mod protocol;
pub mod schema;
pub mod tagged;
pub mod value;

// Re-export the main public API for user convenience.
pub use attributes::{decode_attribute_events, Attribute, AttributeEvents};
pub use bitstream::{BitStream, Endian};
pub use decoder::{Decoder, VersionGate, WireDecoder, WireEncoding, MAX_NEST_DEPTH};
pub use error::{Error, Result};
pub use events::{Event, EventStream, EventTypeTable, Progress};
pub use packed::PackedDecoder;
pub use protocol::{
    unit_tag, unit_tag_index, unit_tag_recycle, Protocol, ProtocolEventStream, ProtocolInfo,
    RootTypes,
};
pub use schema::{ChoiceArm, FieldDescriptor, IntBounds, TypeDescriptor, TypeId, TypeSchema};
pub use tagged::TaggedDecoder;
pub use value::{Record, Value};
