use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_SIZE;
use crate::error::{CodecError, Result};
use crate::scheme::{merge_special_tokens, Scheme};
use crate::Rank;

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

/// Everything a codec needs besides its rank table.
///
/// ```json
/// { "scheme": "cl100k_base",
///   "special_tokens": { "<|im_start|>": 100264, "<|im_end|>": 100265 },
///   "cache_size": 8192 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    #[serde(default)]
    pub scheme: Option<Scheme>,
    /// Overrides the scheme's pattern.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Merged over the scheme's defaults.
    #[serde(default)]
    pub special_tokens: BTreeMap<String, Rank>,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl CodecConfig {
    pub fn for_scheme(scheme: Scheme) -> Self {
        CodecConfig {
            scheme: Some(scheme),
            pattern: None,
            special_tokens: BTreeMap::new(),
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_slice(json: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    pub fn with_special_token(mut self, token: &str, rank: Rank) -> Self {
        self.special_tokens.insert(token.to_string(), rank);
        self
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn resolved_pattern(&self) -> Result<&str> {
        match (&self.pattern, self.scheme) {
            (Some(pattern), _) => Ok(pattern.as_str()),
            (None, Some(scheme)) => Ok(scheme.pattern()),
            (None, None) => Err(CodecError::Config(
                "either `scheme` or `pattern` must be set".to_string(),
            )),
        }
    }

    pub fn resolved_special_tokens(&self) -> FxHashMap<String, Rank> {
        let defaults = self.scheme.map(Scheme::special_tokens).unwrap_or_default();
        merge_special_tokens(
            defaults,
            self.special_tokens.iter().map(|(k, v)| (k.clone(), *v)),
        )
    }
}
