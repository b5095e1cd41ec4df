//! Decoding of the attribute-events blob.
//!
//! Attributes are the one replay file not driven by the type schema: a
//! fixed little-endian layout shared by every protocol version. Each entry
//! scopes a four-byte attribute value to a player slot (or the global scope
//! 16).

use crate::bitstream::{BitStream, Endian};
use crate::error::Result;

/// One scoped attribute entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attribute {
    pub namespace: u32,
    pub id: u32,
    pub scope: u8,
    /// Raw value bytes in display order, NUL padding stripped.
    pub value: Vec<u8>,
}

/// The decoded attribute-events file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AttributeEvents {
    pub source: u8,
    pub map_namespace: u32,
    /// Entries in wire order.
    pub attributes: Vec<Attribute>,
}

impl AttributeEvents {
    /// Entries belonging to one scope (player slot, or 16 for global).
    pub fn for_scope(&self, scope: u8) -> impl Iterator<Item = &Attribute> {
        self.attributes
            .iter()
            .filter(move |attribute| attribute.scope == scope)
    }
}

/// Decodes the attribute-events buffer. An empty buffer is a valid, empty
/// result.
pub fn decode_attribute_events(data: &[u8]) -> Result<AttributeEvents> {
    let mut stream = BitStream::new(data, Endian::Little);
    let mut events = AttributeEvents::default();
    if stream.is_done() {
        return Ok(events);
    }

    events.source = stream.read_bits(8)? as u8;
    events.map_namespace = stream.read_bits(32)? as u32;
    // Entry count; the wire also terminates the list, so it is advisory.
    let _count = stream.read_bits(32)?;

    while !stream.is_done() {
        let namespace = stream.read_bits(32)? as u32;
        let id = stream.read_bits(32)? as u32;
        let scope = stream.read_bits(8)? as u8;
        // Value bytes arrive reversed and NUL-padded.
        let mut value = stream.read_aligned_bytes(4)?.to_vec();
        value.reverse();
        trim_nul_padding(&mut value);
        events.attributes.push(Attribute {
            namespace,
            id,
            scope,
            value,
        });
    }
    Ok(events)
}

fn trim_nul_padding(value: &mut Vec<u8>) {
    let end = value.iter().rposition(|&byte| byte != 0).map_or(0, |i| i + 1);
    value.truncate(end);
    let start = value.iter().position(|&byte| byte != 0).unwrap_or(0);
    value.drain(..start);
}
