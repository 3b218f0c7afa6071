//! Exact tiktoken-compatible byte-pair encoding.
//!
//! A [`Codec`] is built from a rank table, a pre-segmentation regex and a
//! special-token map. It encodes text to ids and back, and offers two bounded
//! encoders that keep either the first or the last `n` ids together with the
//! text they cover.
//!
//! ```no_run
//! use tokencodec::{vocab, Codec, Scheme};
//!
//! let table = vocab::load_tiktoken_file("cl100k_base.tiktoken")?;
//! let codec = Codec::from_scheme(Scheme::Cl100kBase, table)?;
//! let ids = codec.encode("Hello World!", &[])?;
//! assert_eq!(codec.decode(&ids), "Hello World!");
//! # Ok::<(), tokencodec::CodecError>(())
//! ```

mod bpe;
mod cache;
mod codec;
mod config;
mod error;
mod rank_table;
mod scheme;
mod segment;
pub mod vocab;

/// Merge priority of a byte sequence, which is also its token id.
pub type Rank = u32;

pub use bpe::byte_pair_encode;
pub use cache::{PieceCache, DEFAULT_CACHE_SIZE};
pub use codec::{Codec, Trimmed};
pub use config::CodecConfig;
pub use error::{CodecError, Result};
pub use rank_table::RankTable;
pub use scheme::{
    merge_special_tokens, Scheme, CL100K_BASE_PATTERN, ENDOFPROMPT, ENDOFTEXT, FIM_MIDDLE,
    FIM_PREFIX, FIM_SUFFIX, O200K_BASE_PATTERN, R50K_PATTERN,
};
pub use segment::{Segment, Segmenter};
