//! Glob-or-regex pattern compiler for policy subjects/actions/resources.
//!
//! A pattern is an ordinary literal with zero or more `<regex>` segments
//! embedded in it. `<` and `>` delimit the regex fragments; everything
//! outside them is matched literally. A pattern with no `<...>` segment is
//! an exact match. Patterns are compiled once, when a snapshot is installed,
//! never per-request.
//!
//! Examples: `"users:<peter|ken>"`, `"resources:articles:<.*>"`,
//! `"resources:printer"` (plain literal).

use regex::Regex;

use crate::error::PatternCompileError;

/// A single compiled subject/action/resource pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source` into a pattern. See the module docs for the syntax.
    pub fn compile(source: &str) -> Result<Self, PatternCompileError> {
        let regex = build_regex(source)?;
        Ok(Self {
            source: source.to_owned(),
            regex,
        })
    }

    /// Whether `value` satisfies this pattern.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// The original, uncompiled pattern text.
    pub fn source(&self) -> &str {
        &self.source
    }
}

fn build_regex(source: &str) -> Result<Regex, PatternCompileError> {
    let mut assembled = String::from("^");
    let mut segment = String::new();
    let mut in_regex = false;

    for ch in source.chars() {
        match ch {
            '<' if !in_regex => {
                assembled.push_str(&regex::escape(&segment));
                segment.clear();
                in_regex = true;
            }
            '>' if in_regex => {
                assembled.push_str("(?:");
                assembled.push_str(&segment);
                assembled.push(')');
                segment.clear();
                in_regex = false;
            }
            _ => segment.push(ch),
        }
    }

    if in_regex {
        return Err(PatternCompileError::UnterminatedSegment(source.to_owned()));
    }
    assembled.push_str(&regex::escape(&segment));
    assembled.push('$');

    Regex::new(&assembled).map_err(|source_err| PatternCompileError::InvalidRegex {
        pattern: source.to_owned(),
        source: source_err,
    })
}

/// Compile every pattern in `sources`, short-circuiting on the first failure.
pub fn compile_all(sources: &[String]) -> Result<Vec<Pattern>, PatternCompileError> {
    sources.iter().map(|s| Pattern::compile(s)).collect()
}

/// Whether any pattern in `patterns` matches `value`.
///
/// An empty pattern set never matches anything, by spec: an absent
/// subjects/actions/resources list is not a wildcard.
pub fn matches_any(patterns: &[Pattern], value: &str) -> bool {
    !patterns.is_empty() && patterns.iter().any(|p| p.is_match(value))
}
