//! Rank-file loading.
//!
//! Each line of a tiktoken rank file holds a base64 byte sequence, one space
//! and the decimal rank:
//!
//! ```text
//! SGVsbG8= 9906
//! IFdvcmxk 4435
//! IQ== 0
//! ```
//!
//! Blank lines are skipped. Anything else is a construction error naming the
//! 1-based line number.

use std::io::Read;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{CodecError, Result};
use crate::rank_table::RankTable;
use crate::Rank;

/// Parse raw rank-file bytes into `(bytes, rank)` pairs in file order.
pub fn parse_tiktoken_bpe(data: &[u8]) -> Result<Vec<(Vec<u8>, Rank)>> {
    let mut ranks = Vec::new();

    for (idx, line) in data.split(|&b| b == b'\n').enumerate() {
        let line_no = idx + 1;
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }

        let invalid = || CodecError::InvalidLine {
            line: line_no,
            content: String::from_utf8_lossy(line).into_owned(),
        };

        let space = line.iter().position(|&b| b == b' ').ok_or_else(invalid)?;
        let (token_b64, rank_str) = (&line[..space], &line[space + 1..]);
        if token_b64.is_empty() || rank_str.is_empty() || rank_str.contains(&b' ') {
            return Err(invalid());
        }

        let token = STANDARD
            .decode(token_b64)
            .map_err(|source| CodecError::Base64 {
                line: line_no,
                source,
            })?;
        if token.is_empty() {
            return Err(invalid());
        }

        let rank = std::str::from_utf8(rank_str)
            .ok()
            .and_then(|s| s.parse::<Rank>().ok())
            .ok_or_else(|| CodecError::InvalidRank {
                line: line_no,
                content: String::from_utf8_lossy(rank_str).into_owned(),
            })?;

        ranks.push((token, rank));
    }

    Ok(ranks)
}

pub fn load_tiktoken_bpe(data: &[u8]) -> Result<RankTable> {
    RankTable::from_ranks(parse_tiktoken_bpe(data)?)
}

pub fn load_tiktoken_reader<R: Read>(mut reader: R) -> Result<RankTable> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    load_tiktoken_bpe(&data)
}

pub fn load_tiktoken_file<P: AsRef<Path>>(path: P) -> Result<RankTable> {
    let data = std::fs::read(path)?;
    load_tiktoken_bpe(&data)
}
