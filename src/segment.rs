use std::ops::Range;

use rustc_hash::FxHashSet;

use crate::error::Result;

/// One step of segmentation: an ordinary span, optionally followed by an
/// allowed special token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub ordinary: Range<usize>,
    pub special: Option<Range<usize>>,
}

/// Finds special tokens in text, honouring a per-call allowed set.
pub struct Segmenter {
    regex: Option<fancy_regex::Regex>,
}

fn escape_literal(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len() * 2);
    for c in literal.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl Segmenter {
    pub fn new<'a, I>(specials: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut literals: Vec<&str> = specials.into_iter().filter(|s| !s.is_empty()).collect();
        if literals.is_empty() {
            return Ok(Segmenter { regex: None });
        }
        // Longest first so a token that prefixes another never shadows it.
        literals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        literals.dedup();

        let pattern = literals
            .iter()
            .map(|s| escape_literal(s))
            .collect::<Vec<_>>()
            .join("|");
        let regex = fancy_regex::Regex::new(&pattern)?;
        Ok(Segmenter { regex: Some(regex) })
    }

    /// Byte range of the next allowed special token at or after `start`.
    ///
    /// A disallowed match is skipped by resuming one character past its start,
    /// so an allowed token beginning inside it can still be found.
    pub fn next_special(
        &self,
        text: &str,
        start: usize,
        allowed: &FxHashSet<&str>,
    ) -> Result<Option<Range<usize>>> {
        let Some(regex) = &self.regex else {
            return Ok(None);
        };
        if allowed.is_empty() {
            return Ok(None);
        }

        let mut pos = start;
        while pos <= text.len() {
            let Some(m) = regex.find_from_pos(text, pos)? else {
                return Ok(None);
            };
            if allowed.contains(m.as_str()) {
                return Ok(Some(m.start()..m.end()));
            }
            pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
        Ok(None)
    }

    pub fn next_segment(
        &self,
        text: &str,
        start: usize,
        allowed: &FxHashSet<&str>,
    ) -> Result<Segment> {
        Ok(match self.next_special(text, start, allowed)? {
            Some(special) => Segment {
                ordinary: start..special.start,
                special: Some(special),
            },
            None => Segment {
                ordinary: start..text.len(),
                special: None,
            },
        })
    }
}
