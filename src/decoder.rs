//! The shared decoder contract and wire-encoding selection.
//!
//! Two encodings exist across the game's history: a densely bit-packed
//! legacy form ([`PackedDecoder`]) and a later tagged, self-describing form
//! ([`TaggedDecoder`]). They are independent strategy structs behind one
//! trait; [`WireDecoder`] lets the protocol facade pick a variant at runtime
//! from the replay's build number.
//!
//! [`PackedDecoder`]: crate::packed::PackedDecoder
//! [`TaggedDecoder`]: crate::tagged::TaggedDecoder

use crate::error::{Error, Result};
use crate::packed::PackedDecoder;
use crate::schema::TypeId;
use crate::tagged::TaggedDecoder;
use crate::value::Value;

/// Deepest value nesting either decoder will follow before reporting
/// [`Error::MalformedValue`].
///
/// Self-referential schemas are legal, and on the tagged wire the skip path
/// recurses under full control of the input, so depth has to be bounded
/// explicitly rather than by the call stack. Real protocol schemas nest a
/// couple dozen levels at most.
pub const MAX_NEST_DEPTH: usize = 1000;

/// The schema interpreter contract shared by both wire encodings.
///
/// `decode_by_type_id` is the only recursive entry point: it dispatches on
/// the descriptor kind at `type_id` and every container kind calls back into
/// it for nested types. Byte-alignment happens inside the decoder, exactly
/// where the encoding requires it (FourCC and the float kinds); callers
/// never align manually.
pub trait Decoder {
    /// Decodes one instance of the type at `type_id` from the current cursor
    /// position.
    fn decode_by_type_id(&mut self, type_id: TypeId) -> Result<Value>;

    /// Advances the cursor to the next byte boundary. Idempotent.
    fn byte_align(&mut self);

    /// True once the underlying buffer is fully consumed.
    fn is_done(&self) -> bool;

    /// Bits consumed so far.
    fn used_bits(&self) -> usize;

    /// Buffer length in bits.
    fn total_bits(&self) -> usize;
}

/// Which bit-level framing strategy a replay build uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireEncoding {
    /// Dense legacy encoding: fixed field order, no wire tags.
    Packed,
    /// Self-describing encoding: varint framing, per-field tags, and
    /// skip-on-mismatch forward compatibility.
    Tagged,
}

/// Build-number thresholds supplied by the schema-generation layer.
///
/// Builds below `min_build` predate any known encoding; builds at or above
/// `tagged_from` use the tagged encoding, everything in between the packed
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionGate {
    pub min_build: u32,
    pub tagged_from: u32,
}

impl VersionGate {
    /// Selects the wire encoding for `build`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedEncoding`] when `build` is below the minimum
    /// supported build.
    pub fn encoding_for(&self, build: u32) -> Result<WireEncoding> {
        if build < self.min_build {
            Err(Error::UnsupportedEncoding { build })
        } else if build < self.tagged_from {
            Ok(WireEncoding::Packed)
        } else {
            Ok(WireEncoding::Tagged)
        }
    }
}

/// A runtime-selected decoder variant.
///
/// The two strategies stay independent structs; this enum only forwards the
/// shared contract so one facade and one event streamer can serve both.
pub enum WireDecoder<'a> {
    Packed(PackedDecoder<'a>),
    Tagged(TaggedDecoder<'a>),
}

impl Decoder for WireDecoder<'_> {
    fn decode_by_type_id(&mut self, type_id: TypeId) -> Result<Value> {
        match self {
            WireDecoder::Packed(decoder) => decoder.decode_by_type_id(type_id),
            WireDecoder::Tagged(decoder) => decoder.decode_by_type_id(type_id),
        }
    }

    fn byte_align(&mut self) {
        match self {
            WireDecoder::Packed(decoder) => decoder.byte_align(),
            WireDecoder::Tagged(decoder) => decoder.byte_align(),
        }
    }

    fn is_done(&self) -> bool {
        match self {
            WireDecoder::Packed(decoder) => decoder.is_done(),
            WireDecoder::Tagged(decoder) => decoder.is_done(),
        }
    }

    fn used_bits(&self) -> usize {
        match self {
            WireDecoder::Packed(decoder) => decoder.used_bits(),
            WireDecoder::Tagged(decoder) => decoder.used_bits(),
        }
    }

    fn total_bits(&self) -> usize {
        match self {
            WireDecoder::Packed(decoder) => decoder.total_bits(),
            WireDecoder::Tagged(decoder) => decoder.total_bits(),
        }
    }
}
