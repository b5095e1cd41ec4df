//! The protocol facade: one schema + build number + decoder variant bound
//! into the entry points the orchestration layer calls.
//!
//! A [`Protocol`] is a pure decode surface. Construction selects the wire
//! encoding from the replay's build number; after that, every decode call
//! is a pure function of its input buffer — independent calls over
//! independent buffers share no mutable state and may run on separate
//! threads without coordination.

use crate::attributes::{decode_attribute_events, AttributeEvents};
use crate::decoder::{VersionGate, WireDecoder, WireEncoding};
use crate::error::Result;
use crate::events::{EventStream, EventTypeTable};
use crate::packed::PackedDecoder;
use crate::schema::{TypeId, TypeSchema};
use crate::tagged::TaggedDecoder;
use crate::value::Value;

/// Root type ids for the non-repeated files and the event-record framing
/// types, as published by the schema-generation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootTypes {
    pub header: TypeId,
    pub details: TypeId,
    pub init_data: TypeId,
    /// Per-record delta-encoded game-loop offset.
    pub delta: TypeId,
    /// Per-record originating user on the game and message streams, when
    /// the protocol version carries one. Tracker streams never do.
    pub user_id: Option<TypeId>,
    /// On-wire event id, one per event file kind.
    pub game_event_id: TypeId,
    pub message_event_id: TypeId,
    pub tracker_event_id: TypeId,
}

/// Everything the schema-generation layer supplies for one protocol build.
#[derive(Debug, Clone)]
pub struct ProtocolInfo {
    pub build: u32,
    pub gate: VersionGate,
    pub schema: TypeSchema,
    pub roots: RootTypes,
    pub game_event_types: EventTypeTable,
    pub message_event_types: EventTypeTable,
    pub tracker_event_types: EventTypeTable,
}

/// Event streams returned by the facade, decoder variant picked at runtime.
pub type ProtocolEventStream<'p> = EventStream<'p, WireDecoder<'p>>;

/// A bound decode surface for one protocol build.
pub struct Protocol {
    info: ProtocolInfo,
    encoding: WireEncoding,
}

impl Protocol {
    /// Binds a protocol, selecting the decoder variant for `info.build`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedEncoding`] when no variant is known for the
    /// build number.
    ///
    /// [`Error::UnsupportedEncoding`]: crate::Error::UnsupportedEncoding
    pub fn new(info: ProtocolInfo) -> Result<Self> {
        let encoding = info.gate.encoding_for(info.build)?;
        Ok(Self { info, encoding })
    }

    pub fn build(&self) -> u32 {
        self.info.build
    }

    pub fn encoding(&self) -> WireEncoding {
        self.encoding
    }

    pub fn schema(&self) -> &TypeSchema {
        &self.info.schema
    }

    fn decoder<'p>(&'p self, data: &'p [u8]) -> WireDecoder<'p> {
        match self.encoding {
            WireEncoding::Packed => {
                WireDecoder::Packed(PackedDecoder::new(data, &self.info.schema))
            }
            WireEncoding::Tagged => {
                WireDecoder::Tagged(TaggedDecoder::new(data, &self.info.schema))
            }
        }
    }

    /// Decodes one instance of `root` from `data` with a fresh cursor.
    pub fn decode(&self, data: &[u8], root: TypeId) -> Result<Value> {
        use crate::decoder::Decoder;
        self.decoder(data).decode_by_type_id(root)
    }

    pub fn decode_header(&self, data: &[u8]) -> Result<Value> {
        self.decode(data, self.info.roots.header)
    }

    pub fn decode_details(&self, data: &[u8]) -> Result<Value> {
        self.decode(data, self.info.roots.details)
    }

    pub fn decode_init_data(&self, data: &[u8]) -> Result<Value> {
        self.decode(data, self.info.roots.init_data)
    }

    /// Decodes the attribute-events blob (fixed layout, schema-independent).
    pub fn decode_attribute_events(&self, data: &[u8]) -> Result<AttributeEvents> {
        decode_attribute_events(data)
    }

    pub fn game_events<'p>(&'p self, data: &'p [u8]) -> ProtocolEventStream<'p> {
        self.events(
            data,
            &self.info.game_event_types,
            self.info.roots.game_event_id,
            self.info.roots.user_id,
        )
    }

    pub fn message_events<'p>(&'p self, data: &'p [u8]) -> ProtocolEventStream<'p> {
        self.events(
            data,
            &self.info.message_event_types,
            self.info.roots.message_event_id,
            self.info.roots.user_id,
        )
    }

    pub fn tracker_events<'p>(&'p self, data: &'p [u8]) -> ProtocolEventStream<'p> {
        self.events(
            data,
            &self.info.tracker_event_types,
            self.info.roots.tracker_event_id,
            None,
        )
    }

    fn events<'p>(
        &'p self,
        data: &'p [u8],
        table: &'p EventTypeTable,
        event_id_type: TypeId,
        user_id: Option<TypeId>,
    ) -> ProtocolEventStream<'p> {
        let stream =
            EventStream::new(self.decoder(data), table, self.info.roots.delta, event_id_type);
        match user_id {
            Some(type_id) => stream.with_user_id(type_id),
            None => stream,
        }
    }
}

// Unit-tag bit packing. The convention is schema-defined and identical
// across both decoder variants: bits 18 and up hold the slot index, the low
// 18 bits a recycle counter, so callers can correlate born/died events for
// the same logical entity.

const RECYCLE_BITS: u32 = 18;
const INDEX_MASK: u32 = 0x3FFF;
const RECYCLE_MASK: u32 = 0x3FFFF;

/// Packs a slot index and recycle counter into one opaque correlation id.
pub fn unit_tag(index: u32, recycle: u32) -> u32 {
    (index << RECYCLE_BITS) | (recycle & RECYCLE_MASK)
}

/// Extracts the slot index from a unit tag.
pub fn unit_tag_index(tag: u32) -> u32 {
    (tag >> RECYCLE_BITS) & INDEX_MASK
}

/// Extracts the recycle counter from a unit tag.
pub fn unit_tag_recycle(tag: u32) -> u32 {
    tag & RECYCLE_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_tag_roundtrip() {
        let tag = unit_tag(37, 4021);
        assert_eq!(unit_tag_index(tag), 37);
        assert_eq!(unit_tag_recycle(tag), 4021);
    }

    #[test]
    fn unit_tag_fields_do_not_bleed() {
        let tag = unit_tag(INDEX_MASK, RECYCLE_MASK);
        assert_eq!(unit_tag_index(tag), INDEX_MASK);
        assert_eq!(unit_tag_recycle(tag), RECYCLE_MASK);

        assert_eq!(unit_tag_index(unit_tag(0, RECYCLE_MASK)), 0);
        assert_eq!(unit_tag_recycle(unit_tag(INDEX_MASK, 0)), 0);
    }
}
