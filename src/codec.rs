/// Encode/decode façade over the rank table, piece cache and segmenter.
///
/// Tokenization: special-token segmentation → regex pre-tokenization of each
/// ordinary span → per-piece cache, whole-piece lookup, then byte-pair merge.
use std::ops::Range;
use std::sync::Arc;

use log::{debug, trace};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::bpe::byte_pair_encode;
use crate::cache::{PieceCache, DEFAULT_CACHE_SIZE};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::rank_table::RankTable;
use crate::scheme::Scheme;
use crate::segment::Segmenter;
use crate::vocab::load_tiktoken_bpe;
use crate::Rank;

/// Output of the bounded encoders: the kept ids and the text they cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trimmed {
    pub tokens: Vec<Rank>,
    pub text: String,
}

enum Flow {
    Continue,
    Stop,
}

pub struct Codec {
    table: Arc<RankTable>,
    special_tokens: Arc<FxHashMap<String, Rank>>,
    special_decoder: FxHashMap<Rank, String>,
    pattern: String,
    regex: fancy_regex::Regex,
    segmenter: Arc<Segmenter>,
    cache: PieceCache,
}

impl Codec {
    pub fn new(
        table: RankTable,
        special_tokens: FxHashMap<String, Rank>,
        pattern: &str,
    ) -> Result<Self> {
        Self::with_cache_size(table, special_tokens, pattern, DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(
        table: RankTable,
        special_tokens: FxHashMap<String, Rank>,
        pattern: &str,
        cache_size: usize,
    ) -> Result<Self> {
        Self::with_shared_table(Arc::new(table), Arc::new(special_tokens), pattern, cache_size)
    }

    /// Build a codec over tables that other codecs may also hold. Only the
    /// piece cache is owned by this instance.
    pub fn with_shared_table(
        table: Arc<RankTable>,
        special_tokens: Arc<FxHashMap<String, Rank>>,
        pattern: &str,
        cache_size: usize,
    ) -> Result<Self> {
        table.validate()?;

        let mut special_decoder = FxHashMap::default();
        for (token, &rank) in special_tokens.iter() {
            if table.contains_rank(rank) {
                return Err(CodecError::SpecialTokenCollision {
                    token: token.clone(),
                    rank,
                });
            }
            special_decoder.insert(rank, token.clone());
        }

        let regex = fancy_regex::Regex::new(pattern)?;
        let segmenter = Segmenter::new(special_tokens.keys().map(String::as_str))?;
        let cache = PieceCache::new(cache_size);

        debug!(
            "codec ready: {} ranks, {} special tokens, cache capacity {}",
            table.len(),
            special_tokens.len(),
            cache.capacity()
        );

        Ok(Codec {
            table,
            special_tokens,
            special_decoder,
            pattern: pattern.to_string(),
            regex,
            segmenter: Arc::new(segmenter),
            cache,
        })
    }

    /// Build from raw rank-file bytes.
    pub fn from_tiktoken(
        data: &[u8],
        special_tokens: FxHashMap<String, Rank>,
        pattern: &str,
    ) -> Result<Self> {
        Self::new(load_tiktoken_bpe(data)?, special_tokens, pattern)
    }

    pub fn from_scheme(scheme: Scheme, table: RankTable) -> Result<Self> {
        Self::from_config(&CodecConfig::for_scheme(scheme), table)
    }

    pub fn from_config(config: &CodecConfig, table: RankTable) -> Result<Self> {
        Self::with_cache_size(
            table,
            config.resolved_special_tokens(),
            config.resolved_pattern()?,
            config.cache_size,
        )
    }

    /// A codec sharing this one's tables with an empty cache of its own.
    pub fn fork(&self) -> Self {
        Codec {
            table: Arc::clone(&self.table),
            special_tokens: Arc::clone(&self.special_tokens),
            special_decoder: self.special_decoder.clone(),
            pattern: self.pattern.clone(),
            regex: self.regex.clone(),
            segmenter: Arc::clone(&self.segmenter),
            cache: PieceCache::new(self.cache.capacity()),
        }
    }

    fn allowed_set<'a>(&self, allowed_special: &[&'a str]) -> FxHashSet<&'a str> {
        allowed_special.iter().copied().collect()
    }

    fn all_special(&self) -> FxHashSet<&str> {
        self.special_tokens.keys().map(String::as_str).collect()
    }

    /// Token ids of one regex piece, through the cache.
    fn encode_piece(&self, piece: &str) -> Result<Vec<Rank>> {
        if let Some(tokens) = self.cache.lookup(piece) {
            return Ok(tokens);
        }
        let bytes = piece.as_bytes();
        let tokens = match self.table.rank(bytes) {
            Some(rank) => vec![rank],
            None => {
                trace!("merging uncached piece {:?}", piece);
                byte_pair_encode(bytes, &self.table)?
            }
        };
        self.cache.insert(piece, &tokens);
        Ok(tokens)
    }

    /// Drive segmentation and hand every emission (its ids and the byte range
    /// of text it covers) to `emit` until the text ends or `emit` stops.
    fn scan<F>(&self, text: &str, allowed: &FxHashSet<&str>, mut emit: F) -> Result<()>
    where
        F: FnMut(&[Rank], Range<usize>) -> Flow,
    {
        let mut start = 0;
        loop {
            let segment = self.segmenter.next_segment(text, start, allowed)?;
            let span = segment.ordinary;

            for m in self.regex.find_iter(&text[span.clone()]) {
                let m = m?;
                if m.start() == m.end() {
                    continue;
                }
                let tokens = self.encode_piece(m.as_str())?;
                let range = span.start + m.start()..span.start + m.end();
                if let Flow::Stop = emit(&tokens, range) {
                    return Ok(());
                }
            }

            match segment.special {
                Some(special) => {
                    let rank = self.special_tokens[&text[special.clone()]];
                    start = special.end;
                    if let Flow::Stop = emit(&[rank], special) {
                        return Ok(());
                    }
                }
                None => return Ok(()),
            }
        }
    }

    pub fn encode(&self, text: &str, allowed_special: &[&str]) -> Result<Vec<Rank>> {
        let allowed = self.allowed_set(allowed_special);
        self.encode_with(text, &allowed)
    }

    pub fn encode_ordinary(&self, text: &str) -> Result<Vec<Rank>> {
        self.encode_with(text, &FxHashSet::default())
    }

    pub fn encode_with_all_special(&self, text: &str) -> Result<Vec<Rank>> {
        self.encode_with(text, &self.all_special())
    }

    fn encode_with(&self, text: &str, allowed: &FxHashSet<&str>) -> Result<Vec<Rank>> {
        let mut tokens = Vec::new();
        self.scan(text, allowed, |ids, _| {
            tokens.extend_from_slice(ids);
            Flow::Continue
        })?;
        Ok(tokens)
    }

    /// Encode at most `max_tokens` ids from the start of `text`.
    ///
    /// A piece that does not fit is cut at the token level, never re-merged.
    /// The returned text ends where the kept ids end, rounded down to a char
    /// boundary when the cut falls inside a multi-byte character.
    pub fn encode_trim_suffix(
        &self,
        text: &str,
        max_tokens: usize,
        allowed_special: &[&str],
    ) -> Result<Trimmed> {
        if max_tokens == 0 {
            return Ok(Trimmed {
                tokens: Vec::new(),
                text: String::new(),
            });
        }
        let allowed = self.allowed_set(allowed_special);
        let mut tokens = Vec::new();
        let mut consumed = 0;

        self.scan(text, &allowed, |ids, range| {
            if tokens.len() + ids.len() <= max_tokens {
                tokens.extend_from_slice(ids);
                consumed = range.end;
                // Full: the next piece must not be merged at all.
                if tokens.len() == max_tokens {
                    return Flow::Stop;
                }
                return Flow::Continue;
            }
            let kept = &ids[..max_tokens - tokens.len()];
            let kept_len: usize = kept.iter().map(|&t| self.token_len(t)).sum();
            let mut end = (range.start + kept_len).min(range.end);
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            tokens.extend_from_slice(kept);
            consumed = end;
            Flow::Stop
        })?;

        Ok(Trimmed {
            tokens,
            text: text[..consumed].to_string(),
        })
    }

    /// Encode the whole text but keep at most the last `max_tokens` ids.
    ///
    /// The ids are always the trailing `min(max_tokens, total)` ids of the full
    /// encoding. The text starts at the first emission boundary that drops
    /// exactly enough ids. When a piece straddles the cut, the text starts
    /// where that piece's kept ids begin, rounded up to a char boundary.
    pub fn encode_trim_prefix(
        &self,
        text: &str,
        max_tokens: usize,
        allowed_special: &[&str],
    ) -> Result<Trimmed> {
        let allowed = self.allowed_set(allowed_special);
        let mut tokens = Vec::new();
        // (cumulative ids, byte offset where those ids end)
        let mut boundaries: Vec<(usize, usize)> = vec![(0, 0)];

        self.scan(text, &allowed, |ids, range| {
            tokens.extend_from_slice(ids);
            boundaries.push((tokens.len(), range.end));
            Flow::Continue
        })?;

        if tokens.len() <= max_tokens {
            return Ok(Trimmed {
                tokens,
                text: text.to_string(),
            });
        }

        let prefix_count = tokens.len() - max_tokens;
        let (drop_tokens, drop_len) = boundaries
            .iter()
            .copied()
            .find(|&(count, _)| count >= prefix_count)
            .unwrap_or((tokens.len(), text.len()));

        if drop_tokens > prefix_count {
            debug!(
                "prefix trim boundary drops {} ids (need {}), cutting inside a piece",
                drop_tokens, prefix_count
            );
            let straddled: usize = tokens[prefix_count..drop_tokens]
                .iter()
                .map(|&t| self.token_len(t))
                .sum();
            let mut start = drop_len.saturating_sub(straddled);
            while !text.is_char_boundary(start) {
                start += 1;
            }
            return Ok(Trimmed {
                tokens: tokens.split_off(prefix_count),
                text: text[start..].to_string(),
            });
        }

        Ok(Trimmed {
            tokens: tokens.split_off(drop_tokens),
            text: text[drop_len..].to_string(),
        })
    }

    fn token_len(&self, token: Rank) -> usize {
        match self.table.decode(token) {
            Some(bytes) => bytes.len(),
            None => self.special_decoder.get(&token).map_or(0, String::len),
        }
    }

    /// Concatenated bytes of the ids. Unknown ids contribute nothing.
    pub fn decode_bytes(&self, tokens: &[Rank]) -> Vec<u8> {
        let mut out = Vec::with_capacity(tokens.len() * 4);
        for &token in tokens {
            if let Some(bytes) = self.table.decode(token) {
                out.extend_from_slice(bytes);
            } else if let Some(special) = self.special_decoder.get(&token) {
                out.extend_from_slice(special.as_bytes());
            }
        }
        out
    }

    /// Decode ids to text, replacing invalid UTF-8. Unknown ids are skipped.
    pub fn decode(&self, tokens: &[Rank]) -> String {
        String::from_utf8_lossy(&self.decode_bytes(tokens)).into_owned()
    }

    /// Like [`Codec::decode`] but unknown ids and invalid UTF-8 are errors.
    pub fn decode_strict(&self, tokens: &[Rank]) -> Result<String> {
        if let Some(&unknown) = tokens
            .iter()
            .find(|&&t| !self.table.contains_rank(t) && !self.special_decoder.contains_key(&t))
        {
            return Err(CodecError::UnknownToken(unknown));
        }
        String::from_utf8(self.decode_bytes(tokens)).map_err(|_| CodecError::Utf8)
    }

    pub fn encode_batch(&self, texts: &[&str], allowed_special: &[&str]) -> Result<Vec<Vec<Rank>>> {
        let allowed = self.allowed_set(allowed_special);
        texts
            .par_iter()
            .map(|text| self.encode_with(text, &allowed))
            .collect()
    }

    pub fn decode_batch(&self, token_lists: &[Vec<Rank>]) -> Vec<String> {
        token_lists
            .par_iter()
            .map(|tokens| self.decode(tokens))
            .collect()
    }

    /// Id of a byte sequence that is a single ordinary or special token.
    pub fn encode_single_token(&self, bytes: &[u8]) -> Option<Rank> {
        self.table.rank(bytes).or_else(|| {
            std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| self.special_tokens.get(s).copied())
        })
    }

    /// Largest id in use plus one.
    pub fn vocab_size(&self) -> usize {
        let max_rank = self.table.max_rank();
        let max_special = self.special_tokens.values().max().copied();
        max_rank.max(max_special).map_or(0, |max| max as usize + 1)
    }

    pub fn rank_table(&self) -> &Arc<RankTable> {
        &self.table
    }

    pub fn special_tokens(&self) -> &FxHashMap<String, Rank> {
        &self.special_tokens
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
