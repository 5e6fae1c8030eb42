/// Property tests for the integer codec and for decoder robustness.
///
/// - Every single-byte fixnum decodes to what the short-form table says.
/// - Every `i32` written the way the engine writes it decodes back unchanged.
/// - Arbitrary bytes never panic the decoder; they either decode or error.
/// - A stream cut short anywhere fails with `UnexpectedEndOfInput`.
mod common;

use common::{fixnum, Stream};
use proptest::prelude::*;
use rxdata_core::cursor::Cursor;
use rxdata_core::fixnum::read_fixnum;
use rxdata_core::{decode, load, DecodeOptions, Decoder, MarshalError, Value};

/// Meaning of a one-byte fixnum, or `None` when the byte starts a long form.
fn short_form(b: u8) -> Option<i32> {
    let c = b as i8;
    match c {
        0 => Some(0),
        1..=4 | -4..=-1 => None,
        5..=127 => Some(i32::from(c) - 5),
        _ => Some(i32::from(c) + 5),
    }
}

fn arb_scalar_stream() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        any::<i32>().prop_map(|n| Stream::new().int(n).bytes()),
        "[a-z]{0,40}".prop_map(|s| Stream::new().string(&s).bytes()),
        "[A-Za-z_]{1,20}".prop_map(|s| Stream::new().symbol(&s).bytes()),
        (-1.0e9f64..1.0e9).prop_map(|f| Stream::new().float_text(f.to_string().as_bytes()).bytes()),
    ]
}

/// A small map-like document: an object holding a hash of arrays.
fn arb_document() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::collection::vec(any::<i32>(), 0..8), 0..8).prop_map(|rows| {
        let mut s = Stream::header()
            .object("RPG::Map", 2)
            .symbol("@name")
            .utf8_string("Town")
            .symbol("@events")
            .hash(rows.len() as i32);
        for (i, row) in rows.iter().enumerate() {
            s = s.int(i as i32).array(row.len() as i32);
            for n in row {
                s = s.int(*n);
            }
        }
        s.bytes()
    })
}

// ============================================================================
// Exhaustive short form
// ============================================================================

#[test]
fn every_single_byte_fixnum_matches_the_short_form_table() {
    for b in 0..=u8::MAX {
        let Some(expected) = short_form(b) else {
            continue;
        };
        let mut c = Cursor::new(std::slice::from_ref(&b));
        assert_eq!(read_fixnum(&mut c).unwrap(), expected, "byte {b:#04x}");
        assert!(c.is_empty());
    }
}

#[test]
fn every_length_prefix_without_payload_is_truncated() {
    for b in [1u8, 2, 3, 4, 0xFC, 0xFD, 0xFE, 0xFF] {
        let mut c = Cursor::new(std::slice::from_ref(&b));
        assert!(matches!(
            read_fixnum(&mut c),
            Err(MarshalError::UnexpectedEndOfInput { offset: 1, .. })
        ));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Engine-encoded integers decode back to the same value.
    #[test]
    fn fixnum_decodes_engine_encoding(n in any::<i32>()) {
        let bytes = fixnum(n);
        let mut c = Cursor::new(&bytes);
        prop_assert_eq!(read_fixnum(&mut c).unwrap(), n);
        prop_assert!(c.is_empty(), "unread bytes after {} in {:02x?}", n, bytes);
    }

    /// Same through the full decoder and the `i` tag.
    #[test]
    fn integer_value_roundtrip(n in any::<i32>()) {
        let doc = decode(&Stream::new().int(n).bytes()).unwrap();
        prop_assert_eq!(doc.root(), Value::Integer(n));
    }

    /// Any byte string decodes or fails; it never panics.
    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode(&bytes);
        let _ = load(&bytes);
        let lenient = DecodeOptions::new()
            .with_strict_payload(false)
            .with_ivar_slot(false);
        let _ = Decoder::with_options(&bytes, lenient).decode();
    }

    /// Recognized-but-unimplemented tags always fail, whatever follows them.
    #[test]
    fn unsupported_tags_fail_closed(
        tag in prop::sample::select(b"eCl/}SUdMcm".to_vec()),
        rest in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut bytes = vec![tag];
        bytes.extend_from_slice(&rest);
        let is_unsupported = matches!(
            decode(&bytes),
            Err(MarshalError::UnsupportedFormat { offset: 0, .. })
        );
        prop_assert!(is_unsupported);
    }

    /// Scalars with arbitrary garbage appended still decode, counting the rest.
    #[test]
    fn trailing_garbage_is_counted(
        stream in arb_scalar_stream(),
        tail in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let mut bytes = stream.clone();
        bytes.extend_from_slice(&tail);
        let doc = decode(&bytes).unwrap();
        prop_assert_eq!(doc.trailing_bytes(), tail.len());
    }

    /// Cutting a valid document anywhere is an end-of-input error.
    #[test]
    fn truncated_document_fails_cleanly(bytes in arb_document(), cut in any::<prop::sample::Index>()) {
        prop_assert!(load(&bytes).is_ok());
        let at = cut.index(bytes.len());
        let result = load(&bytes[..at]);
        prop_assert!(
            matches!(result, Err(MarshalError::UnexpectedEndOfInput { .. })),
            "cut at {} of {}: {:?}",
            at,
            bytes.len(),
            result.err()
        );
    }

    /// Generated map documents expose their rows unchanged.
    #[test]
    fn map_document_rows_survive(rows in prop::collection::vec(prop::collection::vec(any::<i32>(), 0..8), 0..8)) {
        let mut s = Stream::header().hash(rows.len() as i32);
        for (i, row) in rows.iter().enumerate() {
            s = s.int(i as i32).array(row.len() as i32);
            for n in row {
                s = s.int(*n);
            }
        }
        let doc = load(&s.bytes()).unwrap();
        let map = doc.hash(doc.root()).unwrap();
        prop_assert_eq!(map.len(), rows.len());
        for (i, row) in rows.iter().enumerate() {
            let items = doc.array(map[&(i as i32)]).unwrap();
            let decoded: Vec<i32> = items.iter().filter_map(Value::as_integer).collect();
            prop_assert_eq!(&decoded, row);
        }
    }
}
