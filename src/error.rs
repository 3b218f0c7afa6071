use thiserror::Error;

use crate::Rank;

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("rank table line {line}: expected `<base64> <rank>`, got {content:?}")]
    InvalidLine { line: usize, content: String },
    #[error("rank table line {line}: invalid base64: {source}")]
    Base64 {
        line: usize,
        #[source]
        source: base64::DecodeError,
    },
    #[error("rank table line {line}: invalid rank {content:?}")]
    InvalidRank { line: usize, content: String },
    #[error("encoder and decoder must be of equal length (encoder: {encoder}, decoder: {decoder})")]
    SizeMismatch { encoder: usize, decoder: usize },
    #[error("special token {token:?} reuses rank {rank} of the rank table")]
    SpecialTokenCollision { token: String, rank: Rank },
    #[error("byte {byte:#04x} of piece {piece:?} has no rank")]
    MissingByte { byte: u8, piece: String },
    #[error("unknown token id {0}")]
    UnknownToken(Rank),
    #[error("decoded bytes are not valid UTF-8")]
    Utf8,
    #[error("regex error: {0}")]
    Regex(#[from] fancy_regex::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
