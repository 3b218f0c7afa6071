//! Encode/decode behaviour against the cl100k-style fixture.

mod common;

use common::{chat_codec, chat_codec_with_cache, fixture_tiktoken, IM_END, IM_START};
use tokencodec::{vocab, Codec, CodecError, Scheme, CL100K_BASE_PATTERN, ENDOFTEXT};

#[test]
fn test_encode_hello_world() {
    let codec = chat_codec();
    let tokens = codec.encode("Hello World!", &[]).unwrap();
    assert_eq!(tokens, vec![9906, 4435, 0]);
    assert_eq!(codec.decode(&[9906, 4435, 0]), "Hello World!");
}

#[test]
fn test_encode_chat_markers() {
    let codec = chat_codec();
    let tokens = codec
        .encode("<|im_start|>Hello World<|im_end|>", &[IM_START, IM_END])
        .unwrap();
    assert_eq!(tokens, vec![100264, 9906, 4435, 100265]);
    assert_eq!(codec.decode(&tokens), "<|im_start|>Hello World<|im_end|>");
}

#[test]
fn test_encode_empty() {
    let codec = chat_codec();
    assert!(codec.encode("", &[]).unwrap().is_empty());
    assert_eq!(codec.decode(&[]), "");
}

#[test]
fn test_merge_path_for_unknown_piece() {
    let codec = chat_codec();
    // "Hellx" is not a token: ll, He, Hell merge, then 'x' stays a byte.
    assert_eq!(codec.encode("Hellx", &[]).unwrap(), vec![6000, 87]);
    // " Worldly" merges to " World" and leaves "l", "y".
    assert_eq!(
        codec.encode(" Worldly", &[]).unwrap(),
        vec![4435, b'l' as u32 - 0x21, b'y' as u32 - 0x21]
    );
}

#[test]
fn test_roundtrip() {
    let codec = chat_codec();
    let cases = [
        "Hello, world!",
        "The quick brown fox jumps over the lazy dog.",
        "1234567890",
        "Multi-line\ntext\r\nwith\n\nnewlines   and  spaces ",
        "Unicode: こんにちは 世界 🦀 café",
        "it's they're we'll I'D",
        "\u{0}\u{7f} control",
    ];
    for text in cases {
        let tokens = codec.encode(text, &[]).unwrap();
        assert_eq!(codec.decode(&tokens), text, "roundtrip failed for {:?}", text);
        assert_eq!(codec.decode_strict(&tokens).unwrap(), text);
    }
}

#[test]
fn test_disallowed_special_is_plain_text() {
    let codec = chat_codec();
    let text = "<|im_start|>Hello<|im_end|>";

    let plain = codec.encode(text, &[]).unwrap();
    assert!(!plain.contains(&100264));
    assert!(!plain.contains(&100265));
    assert_eq!(codec.decode(&plain), text);

    let only_end = codec.encode(text, &[IM_END]).unwrap();
    assert_eq!(only_end.last(), Some(&100265));
    assert!(!only_end.contains(&100264));
    assert_eq!(codec.decode(&only_end), text);
}

#[test]
fn test_scheme_default_specials() {
    let codec = chat_codec();
    assert_eq!(
        codec.encode_with_all_special("Hello<|endoftext|>").unwrap(),
        vec![9906, 100257]
    );
    assert_eq!(codec.encode(ENDOFTEXT, &[ENDOFTEXT]).unwrap(), vec![100257]);
    assert_eq!(codec.special_tokens()["<|endofprompt|>"], 100276);
}

#[test]
fn test_determinism_across_cache_states() {
    let text = "Hello World! Hello Worldly Hellx, Hello World.";
    let cold = chat_codec_with_cache(1);
    let warm = chat_codec_with_cache(1024);

    let expected = warm.encode(text, &[]).unwrap();
    for _ in 0..3 {
        assert_eq!(warm.encode(text, &[]).unwrap(), expected);
        assert_eq!(cold.encode(text, &[]).unwrap(), expected);
    }
    warm.clear_cache();
    assert_eq!(warm.encode(text, &[]).unwrap(), expected);
    assert!(cold.cache_len() <= 1);
}

#[test]
fn test_unknown_ids_are_skipped() {
    let codec = chat_codec();
    assert_eq!(codec.decode(&[9906, 123_456, 100265]), "Hello<|im_end|>");
    assert!(matches!(
        codec.decode_strict(&[9906, 123_456]),
        Err(CodecError::UnknownToken(123_456))
    ));
}

#[test]
fn test_decode_split_utf8() {
    let codec = chat_codec();
    let tokens = codec.encode("é", &[]).unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(codec.decode(&tokens[..1]), "\u{fffd}");
    assert!(matches!(codec.decode_strict(&tokens[..1]), Err(CodecError::Utf8)));
    assert_eq!(codec.decode_bytes(&tokens), "é".as_bytes());
}

#[test]
fn test_from_tiktoken_bytes() {
    let specials = Scheme::Cl100kBase.special_tokens();
    let codec = Codec::from_tiktoken(&fixture_tiktoken(), specials, CL100K_BASE_PATTERN).unwrap();
    assert_eq!(codec.encode("Hello World!", &[]).unwrap(), vec![9906, 4435, 0]);
    assert_eq!(codec.vocab_size(), 100277);
}

#[test]
fn test_malformed_rank_file_names_line() {
    let mut data = fixture_tiktoken();
    data.extend_from_slice(b"\nnot-a-valid-line\n");
    let lines = data.split(|&b| b == b'\n').count();
    match vocab::load_tiktoken_bpe(&data) {
        Err(CodecError::InvalidLine { line, content }) => {
            assert_eq!(line, lines - 1);
            assert_eq!(content, "not-a-valid-line");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("malformed table accepted"),
    }
}

#[test]
fn test_missing_byte_surfaces() {
    let mut table = tokencodec::RankTable::new();
    for b in b'a'..=b'z' {
        table.set(&[b], b as u32);
    }
    let codec = Codec::new(table, Default::default(), CL100K_BASE_PATTERN).unwrap();
    assert_eq!(codec.encode("abc", &[]).unwrap(), vec![97, 98, 99]);
    match codec.encode("abc DEF", &[]) {
        Err(CodecError::MissingByte { byte, piece }) => {
            assert_eq!(byte, b' ');
            assert_eq!(piece, " DEF");
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
    // The failed piece is not cached; the good one still is.
    assert_eq!(codec.encode("abc", &[]).unwrap(), vec![97, 98, 99]);
}

#[test]
fn test_batch_encode_decode() {
    let codec = chat_codec();
    let texts = ["Hello World!", "", "<|im_start|>Hello", "Hellx Hellx"];
    let batch = codec.encode_batch(&texts, &[IM_START]).unwrap();
    assert_eq!(batch.len(), texts.len());
    for (text, tokens) in texts.iter().zip(&batch) {
        assert_eq!(tokens, &codec.encode(text, &[IM_START]).unwrap());
    }
    let decoded = codec.decode_batch(&batch);
    for (text, back) in texts.iter().zip(&decoded) {
        assert_eq!(text, back);
    }
}

#[test]
fn test_o200k_pattern_roundtrip() {
    let table = vocab::load_tiktoken_bpe(&fixture_tiktoken()).unwrap();
    let codec = Codec::from_scheme(Scheme::O200kBase, table).unwrap();
    let text = "Hello World! path/to/file CamelCase it's";
    let tokens = codec.encode(text, &[]).unwrap();
    assert_eq!(codec.decode(&tokens), text);
}
