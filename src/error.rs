use crate::schema::TypeId;
use thiserror::Error;

/// Custom error types for the replaystream library.
///
/// Every variant is fatal for the decode call that raised it; the engine has
/// no partial-success notion for a single value and never retries internally.
/// Variants carry the bit offset and schema context needed to tell truncated
/// input apart from a wrong schema or a wrong decoder variant.
#[derive(Error, Debug)]
pub enum Error {
    /// A read requested more bits than remain in the buffer.
    #[error("buffer exhausted: needed {needed} bits at bit {offset} of {total}")]
    BufferExhausted {
        offset: usize,
        needed: usize,
        total: usize,
    },

    /// The schema references a type id that does not exist in the table.
    #[error("schema references missing type id {type_id}")]
    SchemaReference { type_id: TypeId },

    /// A choice's on-wire tag has no matching arm in the schema.
    #[error("choice tag {tag} has no arm in type {type_id} (bit {offset})")]
    UnknownChoiceTag {
        type_id: TypeId,
        tag: i64,
        offset: usize,
    },

    /// An `expect_tag` check failed in the tagged encoding. Usually means the
    /// wrong decoder variant was selected for this build number.
    #[error("wire tag mismatch: expected {expected}, found {actual} at bit {offset}")]
    TagMismatch {
        expected: u64,
        actual: u64,
        offset: usize,
    },

    /// No wire encoding is known for the given build number.
    #[error("no known wire encoding for build {build}")]
    UnsupportedEncoding { build: u32 },

    /// An event stream carried an event id missing from the type table.
    #[error("event id {event_id} is not in the event type table (bit {offset})")]
    UnknownEventType { event_id: i64, offset: usize },

    /// The wire data is structurally invalid (e.g. a negative length after
    /// bias, or an overlong varint).
    #[error("malformed value: {message} (bit {offset})")]
    MalformedValue { message: String, offset: usize },
}

impl Error {
    /// Create a new `MalformedValue` error with a descriptive message.
    pub fn malformed(message: impl Into<String>, offset: usize) -> Self {
        Self::MalformedValue {
            message: message.into(),
            offset,
        }
    }
}

/// Result type alias for the library operations.
pub type Result<T> = std::result::Result<T, Error>;
