//! End-of-response detection.
//!
//! Modem responses span multiple lines; the caller configures which lines
//! conclude one. A criterion is either an exact line (`"OK"`, `"ERROR"`) or
//! a prefix followed by the `*` wildcard (`"+CME ERROR:*"`). Criteria are
//! evaluated in declared order against the full completed line.
//!
//! When prompt mode is active the prompt byte short-circuits everything: a
//! line containing it anywhere ends the response regardless of the
//! configured criteria. This is what lets a `>` upload prompt unblock the
//! response collector.

/// The wildcard marker recognized in criterion strings.
pub const WILDCARD: char = '*';

/// A single end-of-response criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndPattern {
    /// Matches only on full-line equality.
    Exact(String),
    /// Matches any line starting with the prefix.
    Prefix(String),
}

impl EndPattern {
    /// Parse a criterion string.
    ///
    /// A `*` anywhere in the string turns it into a prefix pattern over the
    /// text before the first `*`; everything after the marker is ignored.
    pub fn parse(criterion: &str) -> Self {
        match criterion.find(WILDCARD) {
            Some(idx) => EndPattern::Prefix(criterion[..idx].to_string()),
            None => EndPattern::Exact(criterion.to_string()),
        }
    }

    /// Check whether a completed line satisfies this pattern.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            EndPattern::Exact(text) => line == text.as_str(),
            EndPattern::Prefix(prefix) => line.starts_with(prefix.as_str()),
        }
    }
}

/// An ordered set of end-of-response criteria.
///
/// Reconfiguration replaces the whole set; criteria are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndCriteria {
    patterns: Vec<EndPattern>,
}

impl EndCriteria {
    /// Build a criteria set from literal criterion strings, in order.
    pub fn new<I, S>(criteria: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        EndCriteria {
            patterns: criteria
                .into_iter()
                .map(|c| EndPattern::parse(c.as_ref()))
                .collect(),
        }
    }

    /// The parsed patterns, in declared order.
    pub fn patterns(&self) -> &[EndPattern] {
        &self.patterns
    }

    /// Decide whether `line` concludes the current response.
    ///
    /// If `prompt` is set and the line contains the prompt byte anywhere,
    /// the response ends unconditionally and the criteria are not consulted.
    /// Otherwise the first matching pattern in declared order decides; with
    /// no match the line does not end the response.
    pub fn is_end_of_response(&self, line: &str, prompt: Option<u8>) -> bool {
        if let Some(prompt_byte) = prompt {
            if line.as_bytes().contains(&prompt_byte) {
                return true;
            }
        }
        self.patterns.iter().any(|p| p.matches(line))
    }
}
