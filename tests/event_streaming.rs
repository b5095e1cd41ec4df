//! Streaming decode of concatenated event records: laziness, progress,
//! timestamp accumulation, and failure behavior.

mod harness {
    pub mod bit_writer;
}

use harness::bit_writer::BitWriter;
use replaystream::*;

// Schema layout shared by the packed streaming tests.
const DELTA: TypeId = 0;
const EVENT_ID: TypeId = 1;
const MOVE_EVENT: TypeId = 2;
const CHAT_EVENT: TypeId = 3;

fn packed_schema() -> TypeSchema {
    TypeSchema::new(vec![
        TypeDescriptor::Int(IntBounds::new(0, 8)),
        TypeDescriptor::Int(IntBounds::new(0, 8)),
        TypeDescriptor::Struct {
            fields: vec![
                FieldDescriptor::new("x", 0, 0),
                FieldDescriptor::new("y", 1, 0),
            ],
        },
        TypeDescriptor::Blob(IntBounds::new(0, 8)),
    ])
    .unwrap()
}

fn event_table() -> EventTypeTable {
    [(1, MOVE_EVENT, "MoveEvent"), (2, CHAT_EVENT, "ChatEvent")]
        .into_iter()
        .collect()
}

fn stream<'p>(
    data: &'p [u8],
    schema: &'p TypeSchema,
    table: &'p EventTypeTable,
) -> EventStream<'p, PackedDecoder<'p>> {
    EventStream::new(PackedDecoder::new(data, schema), table, DELTA, EVENT_ID)
}

#[test]
fn three_records_consume_the_whole_buffer() {
    let schema = packed_schema();
    let table = event_table();
    let data = BitWriter::big()
        .write_bits(3, 8) // delta
        .write_bits(1, 8) // MoveEvent
        .write_bits(10, 8)
        .write_bits(20, 8)
        .write_bits(2, 8) // delta
        .write_bits(2, 8) // ChatEvent
        .write_bits(2, 8)
        .write_unaligned_bytes(b"hi")
        .write_bits(0, 8) // delta
        .write_bits(1, 8) // MoveEvent
        .write_bits(1, 8)
        .write_bits(2, 8)
        .finish();

    let mut events = stream(&data, &schema, &table);
    let mut last_progress = 0;
    let mut seen = Vec::new();
    while let Some(event) = events.next().unwrap() {
        let progress = events.progress();
        assert!(progress.current >= last_progress, "progress went backwards");
        last_progress = progress.current;
        assert_eq!(event.user_id, None);
        seen.push((event.event_type_id, event.name.to_owned(), event.game_loop));
    }

    assert_eq!(
        seen,
        vec![
            (1, "MoveEvent".to_owned(), 3),
            (2, "ChatEvent".to_owned(), 5),
            (1, "MoveEvent".to_owned(), 5),
        ]
    );
    let progress = events.progress();
    assert_eq!(progress.current, progress.total);
    assert_eq!(progress.current, data.len() * 8);

    // The stream stays exhausted.
    assert!(events.next().unwrap().is_none());
    assert!(events.next().unwrap().is_none());
}

#[test]
fn empty_buffer_yields_nothing() {
    let schema = packed_schema();
    let table = event_table();
    let mut events = stream(&[], &schema, &table);
    assert!(events.next().unwrap().is_none());
}

#[test]
fn records_are_byte_aligned() {
    // A payload ending mid-byte must not leak bits into the next record.
    let schema = TypeSchema::new(vec![
        TypeDescriptor::Int(IntBounds::new(0, 8)),
        TypeDescriptor::Int(IntBounds::new(0, 8)),
        TypeDescriptor::Struct {
            fields: vec![FieldDescriptor::new("flag", 0, 3)],
        },
        TypeDescriptor::Bool,
    ])
    .unwrap();
    let table: EventTypeTable = [(1, 2, "FlagEvent")].into_iter().collect();

    let mut writer = BitWriter::big();
    writer.write_bits(1, 8).write_bits(1, 8).write_bit(true);
    writer.byte_align();
    writer.write_bits(4, 8).write_bits(1, 8).write_bit(false);
    let data = writer.finish();

    let mut events = EventStream::new(PackedDecoder::new(&data, &schema), &table, 0, 1);
    let first = events.next().unwrap().unwrap();
    assert_eq!(first.payload.field("flag"), Some(&Value::Bool(true)));
    assert_eq!(first.game_loop, 1);
    let second = events.next().unwrap().unwrap();
    assert_eq!(second.payload.field("flag"), Some(&Value::Bool(false)));
    assert_eq!(second.game_loop, 5);
    assert!(events.next().unwrap().is_none());
}

#[test]
fn user_id_decodes_between_delta_and_event_id() {
    let schema = packed_schema();
    let table = event_table();
    let data = BitWriter::big()
        .write_bits(2, 8) // delta
        .write_bits(3, 8) // user slot
        .write_bits(1, 8) // MoveEvent
        .write_bits(7, 8)
        .write_bits(8, 8)
        .finish();

    let mut events = stream(&data, &schema, &table).with_user_id(0);
    let event = events.next().unwrap().unwrap();
    assert_eq!(event.name, "MoveEvent");
    assert_eq!(event.game_loop, 2);
    assert_eq!(event.user_id, Some(Value::Int(3)));
    assert_eq!(event.payload.field("x"), Some(&Value::Int(7)));
    assert!(events.next().unwrap().is_none());
}

#[test]
fn delta_unwraps_choice_wrappers() {
    // Mirrors schemas that wrap the game-loop delta in a width-choice.
    let schema = TypeSchema::new(vec![
        TypeDescriptor::Int(IntBounds::new(0, 6)),
        TypeDescriptor::Choice {
            bounds: IntBounds::new(0, 2),
            arms: vec![ChoiceArm::new(0, "six_bits", 0)],
        },
        TypeDescriptor::Int(IntBounds::new(0, 8)),
        TypeDescriptor::Null,
    ])
    .unwrap();
    let table: EventTypeTable = [(7, 3, "Marker")].into_iter().collect();

    let mut writer = BitWriter::big();
    writer.write_bits(0, 2).write_bits(25, 6).write_bits(7, 8);
    writer.byte_align();
    let data = writer.finish();

    let mut events = EventStream::new(PackedDecoder::new(&data, &schema), &table, 1, 2);
    let event = events.next().unwrap().unwrap();
    assert_eq!(event.game_loop, 25);
    assert_eq!(event.payload, Value::Null);
}

#[test]
fn unknown_event_id_is_fatal() {
    let schema = packed_schema();
    let table = event_table();
    let data = BitWriter::big()
        .write_bits(0, 8)
        .write_bits(9, 8) // not in the table
        .finish();
    let mut events = stream(&data, &schema, &table);
    match events.next() {
        Err(Error::UnknownEventType { event_id: 9, .. }) => {}
        other => panic!("expected UnknownEventType, got {other:?}"),
    }
}

#[test]
fn truncated_record_surfaces_exhaustion() {
    let schema = packed_schema();
    let table = event_table();
    // MoveEvent with only one of its two payload bytes.
    let data = BitWriter::big()
        .write_bits(0, 8)
        .write_bits(1, 8)
        .write_bits(10, 8)
        .finish();
    let mut events = stream(&data, &schema, &table);
    assert!(matches!(
        events.next(),
        Err(Error::BufferExhausted { .. })
    ));
}

#[test]
fn process_all_visits_every_record() {
    let schema = packed_schema();
    let table = event_table();
    let mut writer = BitWriter::big();
    for i in 0..10u64 {
        writer
            .write_bits(1, 8)
            .write_bits(1, 8)
            .write_bits(i, 8)
            .write_bits(i, 8);
    }
    let data = writer.finish();

    let mut events = stream(&data, &schema, &table);
    let mut count = 0;
    events
        .process_all(|event| {
            count += 1;
            assert_eq!(event.game_loop, count);
            Ok(())
        })
        .unwrap();
    assert_eq!(count, 10);
}

#[test]
fn tagged_variant_streams_identically() {
    let schema = TypeSchema::new(vec![
        TypeDescriptor::Int(IntBounds::new(0, 8)),
        TypeDescriptor::Int(IntBounds::new(0, 8)),
        TypeDescriptor::Struct {
            fields: vec![FieldDescriptor::new("target", 0, 0)],
        },
    ])
    .unwrap();
    let table: EventTypeTable = [(4, 2, "OrderEvent")].into_iter().collect();

    let mut writer = BitWriter::big();
    for loop_delta in [16u64, 32] {
        // delta and event id are int instances; payload a one-field struct.
        writer.write_varint(9).write_varint(loop_delta);
        writer.write_varint(9).write_varint(4);
        writer.write_varint(5).write_varint(1);
        writer.write_varint(0);
        writer.write_varint(9).write_varint(150);
        writer.byte_align();
    }
    let data = writer.finish();

    let mut events = EventStream::new(TaggedDecoder::new(&data, &schema), &table, 0, 1);
    let first = events.next().unwrap().unwrap();
    assert_eq!(first.name, "OrderEvent");
    assert_eq!(first.game_loop, 16);
    assert_eq!(first.payload.field("target"), Some(&Value::Int(150)));
    let second = events.next().unwrap().unwrap();
    assert_eq!(second.game_loop, 48);
    assert!(events.next().unwrap().is_none());
}
