//! Ignore pattern parsing and matching.

use std::path::Path;

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

/// Ordered set of shell-style ignore patterns.
///
/// Patterns follow `fnmatch` conventions: `*` matches any run of characters (path separators
/// included), `?` matches a single character and `[...]` matches a character class. Braces are
/// plain characters. A path is ignored when any pattern matches either the full path or its
/// final segment.
#[derive(Debug, Clone)]
pub struct IgnorePatterns {
    patterns: Vec<String>,
    globs: GlobSet,
}

impl Default for IgnorePatterns {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            globs: GlobSet::empty(),
        }
    }
}

impl PartialEq for IgnorePatterns {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl Eq for IgnorePatterns {}

impl IgnorePatterns {
    /// Create an empty pattern set that ignores nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse multi-line pattern text, one pattern per line.
    ///
    /// Lines are trimmed; blank lines and lines starting with `#` are dropped.
    pub fn parse(text: &str) -> Self {
        Self::from_patterns(parse_lines(text))
    }

    /// Build a set from individual patterns, keeping their order.
    ///
    /// Each pattern is trimmed and the same blank/comment rules as [`IgnorePatterns::parse`]
    /// apply.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut kept = Vec::new();
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns.into_iter().map(Into::into) {
            let pattern = pattern.trim().to_owned();
            if !is_pattern_line(&pattern) {
                continue;
            }
            match compile(&pattern) {
                Some(glob) => {
                    builder.add(glob);
                    kept.push(pattern);
                }
                None => tracing::warn!(pattern = %pattern, "dropping unusable ignore pattern"),
            }
        }
        let patterns = kept;
        let globs = builder.build().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to build ignore matcher, ignoring nothing");
            GlobSet::empty()
        });

        Self { patterns, globs }
    }

    /// Append more patterns after the existing ones.
    pub fn extend<I, S>(&self, more: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let combined = self
            .patterns
            .iter()
            .cloned()
            .chain(more.into_iter().map(Into::into));
        Self::from_patterns(combined)
    }

    /// Effective patterns in evaluation order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `path` is excluded by any pattern.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.matching_pattern(path).is_some()
    }

    /// The first pattern (in set order) matching the full path or its final segment.
    pub fn matching_pattern(&self, path: &Path) -> Option<&str> {
        if self.globs.is_empty() {
            return None;
        }

        let mut hits = self.globs.matches(path);
        if let Some(name) = path.file_name() {
            hits.extend(self.globs.matches(Path::new(name)));
        }

        hits.into_iter()
            .min()
            .and_then(|index| self.patterns.get(index))
            .map(String::as_str)
    }
}

/// Split pattern text into trimmed, non-comment lines.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| is_pattern_line(line))
        .map(str::to_owned)
        .collect()
}

fn is_pattern_line(line: &str) -> bool {
    !line.is_empty() && !line.starts_with('#')
}

fn compile(pattern: &str) -> Option<Glob> {
    let translated = literal_braces(pattern);
    match glob_builder(&translated).build() {
        Ok(glob) => Some(glob),
        Err(err) => {
            // Malformed classes such as an unclosed `[` match literally.
            tracing::debug!(pattern, error = %err, "treating ignore pattern literally");
            glob_builder(&globset::escape(pattern)).build().ok()
        }
    }
}

/// Rewrite `{` and `}` outside character classes as one-character classes so braces match
/// literally instead of as alternation.
fn literal_braces(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end + 1;
                    continue;
                }
                None => out.push('['),
            },
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Index of the `]` closing the class opened at `start`. A leading `!`/`^` and a `]` right
/// after it belong to the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if matches!(chars.get(i), Some('!' | '^')) {
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    chars[i.min(chars.len())..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| i + offset)
}

fn glob_builder(pattern: &str) -> GlobBuilder<'_> {
    let mut builder = GlobBuilder::new(pattern);
    builder
        .literal_separator(false)
        .backslash_escape(false)
        .case_insensitive(cfg!(windows));
    builder
}
