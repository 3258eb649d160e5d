//! Token codec integration tests

use visitrack::codec::{DEFAULT_MIN_LENGTH, TokenCodec};

#[test]
fn test_round_trip_across_id_range() {
    let codec = TokenCodec::new("HashidsKey", DEFAULT_MIN_LENGTH).unwrap();
    let ids = (1..2_000u64)
        .chain([65_535, 1 << 31, 1 << 32, 1 << 53, i64::MAX as u64]);
    for id in ids {
        let token = codec.encode(id);
        assert_eq!(codec.decode(&token), Some(id), "id {} token {}", id, token);
    }
}

#[test]
fn test_tokens_are_key_specific() {
    let ours = TokenCodec::new("HashidsKey", 16).unwrap();
    let theirs = TokenCodec::new("AnotherKey", 16).unwrap();
    for id in 1..200u64 {
        let token = ours.encode(id);
        assert_ne!(token, theirs.encode(id));
        assert_ne!(theirs.decode(&token), Some(id));
    }
}

#[test]
fn test_min_length_is_part_of_the_token_format() {
    let short = TokenCodec::new("HashidsKey", 8).unwrap();
    let long = TokenCodec::new("HashidsKey", 16).unwrap();
    let token = short.encode(42);
    assert!(token.len() >= 8);
    assert_eq!(long.decode(&token), None);
}

#[test]
fn test_single_character_edits_never_decode_to_same_id() {
    let codec = TokenCodec::new("HashidsKey", 16).unwrap();
    let token = codec.encode(1);
    for (i, original) in token.char_indices() {
        for replacement in ['a', 'Z', '7'] {
            if replacement == original {
                continue;
            }
            let mut edited = token.clone();
            edited.replace_range(i..i + 1, &replacement.to_string());
            assert_ne!(codec.decode(&edited), Some(1), "edited token {}", edited);
        }
    }
}
