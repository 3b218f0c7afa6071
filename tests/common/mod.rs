//! Synthetic cl100k-style rank table.
//!
//! Single bytes take ranks 0..256 in byte-level order (printable bytes first,
//! so `!` is 0 and space is 220). A handful of merges reproduce the real ids of
//! `Hello` and ` World`.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine};
use tokencodec::{Codec, CodecConfig, Rank, Scheme};

pub const IM_START: &str = "<|im_start|>";
pub const IM_END: &str = "<|im_end|>";

pub const MERGES: &[(&str, Rank)] = &[
    ("or", 269),
    (" W", 468),
    ("ld", 509),
    ("ll", 657),
    ("He", 1548),
    ("orld", 1813),
    (" World", 4435),
    ("Hell", 6000),
    ("Hello", 9906),
];

pub fn byte_rank_order() -> Vec<u8> {
    let mut printable: Vec<u8> = (0x21..=0x7e).chain(0xa1..=0xac).chain(0xae..=0xff).collect();
    let rest: Vec<u8> = (0u16..256)
        .map(|b| b as u8)
        .filter(|b| !printable.contains(b))
        .collect();
    printable.extend(rest);
    printable
}

pub fn fixture_ranks() -> Vec<(Vec<u8>, Rank)> {
    let mut ranks: Vec<(Vec<u8>, Rank)> = byte_rank_order()
        .into_iter()
        .enumerate()
        .map(|(rank, b)| (vec![b], rank as Rank))
        .collect();
    ranks.extend(MERGES.iter().map(|&(s, r)| (s.as_bytes().to_vec(), r)));
    ranks
}

/// The fixture in rank-file form.
pub fn fixture_tiktoken() -> Vec<u8> {
    let mut out = String::new();
    for (bytes, rank) in fixture_ranks() {
        out.push_str(&format!("{} {}\n", STANDARD.encode(&bytes), rank));
    }
    out.into_bytes()
}

pub fn chat_codec() -> Codec {
    chat_codec_with_cache(64)
}

pub fn chat_codec_with_cache(cache_size: usize) -> Codec {
    let table = tokencodec::vocab::load_tiktoken_bpe(&fixture_tiktoken()).unwrap();
    let config = CodecConfig::for_scheme(Scheme::Cl100kBase)
        .with_special_token(IM_START, 100264)
        .with_special_token(IM_END, 100265)
        .with_cache_size(cache_size);
    Codec::from_config(&config, table).unwrap()
}
