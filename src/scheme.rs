//! Fixed encoding schemes: their pre-segmentation pattern and default special
//! tokens. Rank tables are supplied separately by the caller.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::Rank;

/// Pattern shared by `r50k_base` and the `p50k` family.
pub const R50K_PATTERN: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

pub const CL100K_BASE_PATTERN: &str = r"(?i:'s|'t|'re|'ve|'m|'ll|'d)|[^\r\n\p{L}\p{N}]?\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]+[\r\n]*|\s*[\r\n]+|\s+(?!\S)|\s+";

pub const O200K_BASE_PATTERN: &str = concat!(
    r"[^\r\n\p{L}\p{N}]?[\p{Lu}\p{Lt}\p{Lm}\p{Lo}\p{M}]*[\p{Ll}\p{Lm}\p{Lo}\p{M}]+(?i:'s|'t|'re|'ve|'m|'ll|'d)?",
    r"|[^\r\n\p{L}\p{N}]?[\p{Lu}\p{Lt}\p{Lm}\p{Lo}\p{M}]+[\p{Ll}\p{Lm}\p{Lo}\p{M}]*(?i:'s|'t|'re|'ve|'m|'ll|'d)?",
    r"|\p{N}{1,3}",
    r"| ?[^\s\p{L}\p{N}]+[\r\n/]*",
    r"|\s*[\r\n]+",
    r"|\s+(?!\S)",
    r"|\s+",
);

pub const ENDOFTEXT: &str = "<|endoftext|>";
pub const FIM_PREFIX: &str = "<|fim_prefix|>";
pub const FIM_MIDDLE: &str = "<|fim_middle|>";
pub const FIM_SUFFIX: &str = "<|fim_suffix|>";
pub const ENDOFPROMPT: &str = "<|endofprompt|>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    R50kBase,
    P50kBase,
    P50kEdit,
    Cl100kBase,
    O200kBase,
}

impl Scheme {
    pub const ALL: [Scheme; 5] = [
        Scheme::R50kBase,
        Scheme::P50kBase,
        Scheme::P50kEdit,
        Scheme::Cl100kBase,
        Scheme::O200kBase,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Scheme::R50kBase => "r50k_base",
            Scheme::P50kBase => "p50k_base",
            Scheme::P50kEdit => "p50k_edit",
            Scheme::Cl100kBase => "cl100k_base",
            Scheme::O200kBase => "o200k_base",
        }
    }

    pub fn pattern(self) -> &'static str {
        match self {
            Scheme::R50kBase | Scheme::P50kBase | Scheme::P50kEdit => R50K_PATTERN,
            Scheme::Cl100kBase => CL100K_BASE_PATTERN,
            Scheme::O200kBase => O200K_BASE_PATTERN,
        }
    }

    pub fn special_tokens(self) -> FxHashMap<String, Rank> {
        let pairs: &[(&str, Rank)] = match self {
            Scheme::R50kBase | Scheme::P50kBase => &[(ENDOFTEXT, 50256)],
            Scheme::P50kEdit => &[
                (ENDOFTEXT, 50256),
                (FIM_PREFIX, 50281),
                (FIM_MIDDLE, 50282),
                (FIM_SUFFIX, 50283),
            ],
            Scheme::Cl100kBase => &[
                (ENDOFTEXT, 100257),
                (FIM_PREFIX, 100258),
                (FIM_MIDDLE, 100259),
                (FIM_SUFFIX, 100260),
                (ENDOFPROMPT, 100276),
            ],
            Scheme::O200kBase => &[(ENDOFTEXT, 199999), (ENDOFPROMPT, 200018)],
        };
        pairs.iter().map(|&(s, r)| (s.to_string(), r)).collect()
    }
}

/// Scheme defaults overlaid with caller extras; extras win on collision.
pub fn merge_special_tokens<I>(defaults: FxHashMap<String, Rank>, extras: I) -> FxHashMap<String, Rank>
where
    I: IntoIterator<Item = (String, Rank)>,
{
    let mut merged = defaults;
    merged.extend(extras);
    merged
}
