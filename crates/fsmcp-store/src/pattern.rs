// pattern.rs: Glob matching for search.
//
// Names are matched case-insensitively against the bare entry name;
// exclusions are matched case-sensitively against the root-relative path.
// Both use shell `fnmatch` rules: `*` crosses `/`, a leading dot is an
// ordinary character, and `**` is just two stars. Case folding lowercases
// both sides with full Unicode rules before a case-sensitive match.

use glob::{MatchOptions, Pattern};

use crate::error::StoreError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Collapse every run of `*` into one. With separators not special a single
/// star already spans directories, and glob would otherwise read `**` as a
/// recursive component.
fn collapse_stars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

fn compile(pattern: &str) -> Result<Pattern, StoreError> {
    Pattern::new(&collapse_stars(pattern)).map_err(|e| StoreError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.msg.to_string(),
    })
}

/// Compiled include/exclude patterns for one search.
#[derive(Debug)]
pub struct SearchFilter {
    include: Pattern,
    exclude: Vec<Pattern>,
}

impl SearchFilter {
    /// Compile the filter. Fails on the first pattern that is not a valid glob.
    pub fn new<S: AsRef<str>>(pattern: &str, exclude: &[S]) -> Result<Self, StoreError> {
        let include = compile(&pattern.to_lowercase())?;
        let exclude = exclude
            .iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { include, exclude })
    }

    /// True when `name` matches the include pattern, ignoring case.
    pub fn matches_name(&self, name: &str) -> bool {
        self.include.matches_with(&name.to_lowercase(), MATCH_OPTIONS)
    }

    /// True when the root-relative path matches any exclusion.
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.exclude
            .iter()
            .any(|p| p.matches_with(relative_path, MATCH_OPTIONS))
    }

    /// Full decision for one walk candidate.
    pub fn accepts(&self, name: &str, relative_path: &str) -> bool {
        self.matches_name(name) && !self.is_excluded(relative_path)
    }
}
