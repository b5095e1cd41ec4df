//! Lazy, single-pass decoding of concatenated event records.
//!
//! Event buffers hold back-to-back records: a delta-encoded game-loop
//! offset, an originating user id on the streams that carry one, an
//! event-type id, and a schema-typed payload. [`EventStream`]
//! walks them one at a time, accumulating the absolute timestamp and
//! reporting bit-level progress after each record. The sequence is finite,
//! forward-only, and not restartable — cursor position is the only
//! synchronization mechanism, so one bad record invalidates the remainder
//! of the stream.

use crate::decoder::Decoder;
use crate::error::{Error, Result};
use crate::schema::TypeId;
use crate::value::Value;
use std::collections::BTreeMap;

/// Maps on-wire event ids to their payload root type and event name.
///
/// Built by the schema-generation layer; one table per event file kind
/// (game, message, tracker).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTypeTable {
    entries: BTreeMap<i64, (TypeId, String)>,
}

impl EventTypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, event_id: i64, type_id: TypeId, name: impl Into<String>) {
        self.entries.insert(event_id, (type_id, name.into()));
    }

    pub fn get(&self, event_id: i64) -> Option<(TypeId, &str)> {
        self.entries
            .get(&event_id)
            .map(|(type_id, name)| (*type_id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(i64, TypeId, S)> for EventTypeTable {
    fn from_iter<I: IntoIterator<Item = (i64, TypeId, S)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (event_id, type_id, name) in iter {
            table.insert(event_id, type_id, name);
        }
        table
    }
}

/// One decoded event record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Event<'p> {
    pub event_type_id: i64,
    /// Event name from the type table, e.g. `NNet.Game.SCmdEvent`.
    pub name: &'p str,
    /// Absolute game loop, reconstructed from the per-record delta.
    pub game_loop: i64,
    /// Originating user, on streams configured with a user-id type (game
    /// and message events carry one; tracker events do not).
    pub user_id: Option<Value>,
    pub payload: Value,
}

/// Decode progress in bit units, non-decreasing across yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// A lazy iterator over the event records of one buffer.
///
/// Holds the decoder (and with it the bit cursor) and the running game-loop
/// accumulator as its only state. Single-pass: consumers needing another
/// pass must obtain a fresh stream over the same buffer. Not thread-safe
/// for concurrent iteration; one stream belongs to exactly one consumer.
pub struct EventStream<'p, D: Decoder> {
    decoder: D,
    table: &'p EventTypeTable,
    delta_type: TypeId,
    event_id_type: TypeId,
    user_id_type: Option<TypeId>,
    game_loop: i64,
}

impl<'p, D: Decoder> EventStream<'p, D> {
    pub fn new(
        decoder: D,
        table: &'p EventTypeTable,
        delta_type: TypeId,
        event_id_type: TypeId,
    ) -> Self {
        Self {
            decoder,
            table,
            delta_type,
            event_id_type,
            user_id_type: None,
            game_loop: 0,
        }
    }

    /// Configures a per-record user id, decoded between the delta and the
    /// event id. Game and message streams carry one; tracker streams do not.
    pub fn with_user_id(mut self, user_id_type: TypeId) -> Self {
        self.user_id_type = Some(user_id_type);
        self
    }

    /// Decodes the next record.
    ///
    /// Returns `Ok(None)` once the buffer is fully consumed. Any decode
    /// error is fatal for the remaining stream; there is no resync.
    pub fn next(&mut self) -> Result<Option<Event<'p>>> {
        if self.decoder.is_done() {
            return Ok(None);
        }

        let offset = self.decoder.used_bits();
        let delta = self.decoder.decode_by_type_id(self.delta_type)?;
        let delta = delta
            .game_loop_delta()
            .ok_or_else(|| Error::malformed("non-integer game loop delta", offset))?;
        self.game_loop += delta;

        let user_id = match self.user_id_type {
            Some(type_id) => Some(self.decoder.decode_by_type_id(type_id)?),
            None => None,
        };

        let offset = self.decoder.used_bits();
        let event_id = self
            .decoder
            .decode_by_type_id(self.event_id_type)?
            .as_int()
            .ok_or_else(|| Error::malformed("non-integer event id", offset))?;
        let (root, name) = self
            .table
            .get(event_id)
            .ok_or(Error::UnknownEventType { event_id, offset })?;

        let payload = self.decoder.decode_by_type_id(root)?;
        // Records are byte-aligned on the wire.
        self.decoder.byte_align();

        Ok(Some(Event {
            event_type_id: event_id,
            name,
            game_loop: self.game_loop,
            user_id,
            payload,
        }))
    }

    /// Decodes every remaining record, handing each to `handler`.
    ///
    /// Stops at the first error from decoding or from the handler.
    pub fn process_all<F>(&mut self, mut handler: F) -> Result<()>
    where
        F: FnMut(Event<'p>) -> Result<()>,
    {
        while let Some(event) = self.next()? {
            handler(event)?;
        }
        Ok(())
    }

    /// Bits consumed versus buffer size, for slow large buffers (tracker
    /// streams can run to tens of thousands of records).
    pub fn progress(&self) -> Progress {
        Progress {
            current: self.decoder.used_bits(),
            total: self.decoder.total_bits(),
        }
    }
}
