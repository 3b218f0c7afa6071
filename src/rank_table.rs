/// Byte-sequence → rank lookup, built once per codec.
///
/// Keys are resolved six bytes at a time. Each chunk packs its bytes and its
/// length into one `u64`, so `[0x00]` and `[0x00, 0x00]` are different keys and
/// no lookup ever hashes a variable-length byte string.
use rustc_hash::FxHashMap;

use crate::error::{CodecError, Result};
use crate::Rank;

const CHUNK: usize = 6;

#[inline(always)]
fn chunk_key(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= CHUNK);
    let mut packed = 0u64;
    for &b in bytes {
        packed = (packed << 8) | b as u64;
    }
    packed | ((bytes.len() as u64) << (8 * CHUNK))
}

#[derive(Default)]
struct Level {
    // Sequences whose remainder at this level is 1..=6 bytes.
    terminal: FxHashMap<u64, Rank>,
    // Sequences longer than 6 bytes, keyed by their next full chunk.
    nested: FxHashMap<u64, Level>,
}

impl Level {
    #[inline]
    fn get(&self, key: &[u8]) -> Option<Rank> {
        let mut level = self;
        let mut rest = key;
        while rest.len() > CHUNK {
            level = level.nested.get(&chunk_key(&rest[..CHUNK]))?;
            rest = &rest[CHUNK..];
        }
        level.terminal.get(&chunk_key(rest)).copied()
    }

    fn set(&mut self, key: &[u8], rank: Rank) -> Option<Rank> {
        let mut level = self;
        let mut rest = key;
        while rest.len() > CHUNK {
            level = level.nested.entry(chunk_key(&rest[..CHUNK])).or_default();
            rest = &rest[CHUNK..];
        }
        level.terminal.insert(chunk_key(rest), rank)
    }
}

#[derive(Default)]
pub struct RankTable {
    root: Level,
    len: usize,
    decoder: FxHashMap<Rank, Vec<u8>>,
}

impl RankTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(bytes, rank)` pairs.
    ///
    /// A later pair for the same bytes replaces an earlier one. Fails when two
    /// byte sequences claim the same rank or a sequence is empty.
    pub fn from_ranks<I>(ranks: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<u8>, Rank)>,
    {
        let mut encoder: FxHashMap<Vec<u8>, Rank> = FxHashMap::default();
        for (bytes, rank) in ranks {
            if bytes.is_empty() {
                return Err(CodecError::InvalidLine {
                    line: 0,
                    content: format!("empty byte sequence for rank {}", rank),
                });
            }
            encoder.insert(bytes, rank);
        }

        let mut table = RankTable::new();
        for (bytes, rank) in encoder {
            table.set(&bytes, rank);
        }
        table.validate()?;
        Ok(table)
    }

    /// Insert one entry. Construction-time only.
    pub fn set(&mut self, bytes: &[u8], rank: Rank) {
        match self.root.set(bytes, rank) {
            Some(previous) if previous != rank => {
                if self.decoder.get(&previous).map(Vec::as_slice) == Some(bytes) {
                    self.decoder.remove(&previous);
                }
            }
            Some(_) => {}
            None => self.len += 1,
        }
        self.decoder.insert(rank, bytes.to_vec());
    }

    /// Check the forward and reverse directions hold the same number of entries.
    pub fn validate(&self) -> Result<()> {
        if self.len != self.decoder.len() {
            return Err(CodecError::SizeMismatch {
                encoder: self.len,
                decoder: self.decoder.len(),
            });
        }
        Ok(())
    }

    /// Rank of `bytes[start..end]`.
    #[inline]
    pub fn get(&self, bytes: &[u8], start: usize, end: usize) -> Option<Rank> {
        if start >= end {
            return None;
        }
        self.root.get(&bytes[start..end])
    }

    #[inline]
    pub fn rank(&self, bytes: &[u8]) -> Option<Rank> {
        self.get(bytes, 0, bytes.len())
    }

    #[inline]
    pub fn decode(&self, rank: Rank) -> Option<&[u8]> {
        self.decoder.get(&rank).map(Vec::as_slice)
    }

    pub fn contains_rank(&self, rank: Rank) -> bool {
        self.decoder.contains_key(&rank)
    }

    pub fn max_rank(&self) -> Option<Rank> {
        self.decoder.keys().max().copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
