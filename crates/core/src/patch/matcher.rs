//! Search patterns for source patches

use std::fmt;

use regex::Regex;

use super::PatchError;

/// What a patch looks for in program text
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact text; the replacement is inserted verbatim
    Literal(String),
    /// Regular expression; the replacement may use `$1` / `${name}` references
    Pattern(Regex),
}

impl Matcher {
    /// Match exact text
    pub fn literal(text: impl Into<String>) -> Self {
        Matcher::Literal(text.into())
    }

    /// Compile a regular expression
    pub fn regex(pattern: &str) -> Result<Self, PatchError> {
        Regex::new(pattern)
            .map(Matcher::Pattern)
            .map_err(|e| PatchError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Whether `text` contains a match
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Literal(needle) => text.contains(needle.as_str()),
            Matcher::Pattern(regex) => regex.is_match(text),
        }
    }

    /// Number of non-overlapping matches in `text`
    pub fn count(&self, text: &str) -> usize {
        match self {
            Matcher::Literal(needle) if needle.is_empty() => 0,
            Matcher::Literal(needle) => text.matches(needle.as_str()).count(),
            Matcher::Pattern(regex) => regex.find_iter(text).count(),
        }
    }

    /// Replace the first match, leaving all other text untouched
    pub fn replace_first(&self, text: &str, replacement: &str) -> String {
        match self {
            Matcher::Literal(needle) => text.replacen(needle.as_str(), replacement, 1),
            Matcher::Pattern(regex) => regex.replacen(text, 1, replacement).into_owned(),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Literal(needle) => write!(f, "{:?}", needle),
            Matcher::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl From<&str> for Matcher {
    fn from(text: &str) -> Self {
        Matcher::literal(text)
    }
}

impl From<String> for Matcher {
    fn from(text: String) -> Self {
        Matcher::Literal(text)
    }
}

impl From<Regex> for Matcher {
    fn from(regex: Regex) -> Self {
        Matcher::Pattern(regex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_replace_first_only() {
        let matcher = Matcher::literal("foo");
        assert!(matcher.is_match("a foo b foo"));
        assert_eq!(matcher.count("a foo b foo"), 2);
        assert_eq!(matcher.replace_first("a foo b foo", "bar"), "a bar b foo");
    }

    #[test]
    fn test_literal_replacement_is_verbatim() {
        let matcher = Matcher::literal("x");
        assert_eq!(matcher.replace_first("x", "$1"), "$1");
    }

    #[test]
    fn test_regex_backreferences() {
        let matcher = Matcher::regex(r"(var speed = )(\d+);").unwrap();
        let text = "var speed = 50;\nvar other = 1;";
        assert_eq!(
            matcher.replace_first(text, "${1}100;"),
            "var speed = 100;\nvar other = 1;"
        );
    }

    #[test]
    fn test_invalid_regex() {
        let err = Matcher::regex("(unclosed").unwrap_err();
        assert!(matches!(err, PatchError::InvalidPattern { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(Matcher::literal("foo").to_string(), "\"foo\"");
        assert_eq!(Matcher::regex("fo+").unwrap().to_string(), "/fo+/");
    }
}
