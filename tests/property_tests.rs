//! Property-based tests for the line codec and key matching.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Key and value split at the first delimiter
//! - Payload encoding preserves note lines
//! - Fuzzy matching ignores case and token order

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use fnote::models::{decode_payload, encode_payload};
use fnote::{Note, parse_key, parse_value};
use proptest::prelude::*;

proptest! {
    /// Property: key and value are recovered when the key has no delimiter.
    #[test]
    fn prop_key_value_split(key in "[^:\n]{0,40}", value in "[^\n]{0,80}") {
        let note = Note::new(&key, &value);
        prop_assert_eq!(parse_key(note.as_str()), key.as_str());
        prop_assert_eq!(parse_value(note.as_str()), value.as_str());
    }

    /// Property: lines without a delimiter have empty key and value.
    #[test]
    fn prop_no_delimiter_is_empty(line in "[^:]{0,60}") {
        prop_assert_eq!(parse_key(&line), "");
        prop_assert_eq!(parse_value(&line), "");
    }

    /// Property: key + ":" + value reassembles the line.
    #[test]
    fn prop_split_reassembles(line in "[^\n]{0,80}") {
        prop_assume!(line.contains(':'));
        prop_assert_eq!(format!("{}:{}", parse_key(&line), parse_value(&line)), line);
    }

    /// Property: payload decoding returns the encoded lines in order.
    #[test]
    fn prop_payload_preserves_lines(lines in prop::collection::vec("[^\n]{1,40}", 0..20)) {
        let notes: Vec<Note> = lines.iter().map(|l| Note::from(l.as_str())).collect();
        let payload = encode_payload(&notes).unwrap();
        prop_assert_eq!(decode_payload(&payload).unwrap(), notes);
    }

    /// Property: a key always matches its own tokens in any case and order.
    #[test]
    fn prop_fuzzy_match_own_tokens(a in "[a-z]{1,8}", b in "[a-z]{1,8}", mid in "[0-9-]{0,4}") {
        let note = Note::new(&format!("{a}{mid}{b}"), "v");
        let upper = [b.to_uppercase(), a.to_uppercase()];
        prop_assert!(note.key_contains_all(&upper));
    }

    /// Property: a token absent from the key never matches.
    #[test]
    fn prop_fuzzy_missing_token(key in "[a-m]{0,12}", token in "[n-z]{1,4}") {
        let note = Note::new(&key, "v");
        prop_assert!(!note.key_contains_all(&[token]));
    }
}
