//! Dialog tag syntax conversion

use regex::{Captures, Regex};

use crate::patch::PatchError;

/// Pattern matching `(tag ...)` and `\(tag ...)` for one tag name
pub fn tag_pattern(tag: &str) -> Result<Regex, PatchError> {
    let pattern = format!(r#"\\?\(({}(\s+(".+?"|.+?))?)\)"#, regex::escape(tag));
    Regex::new(&pattern).map_err(|e| PatchError::InvalidPattern {
        pattern,
        reason: e.to_string(),
    })
}

/// Rewrite `(tag ...)` to `{tag ...}` and `\(tag ...)` to `(tag ...)`
pub fn convert_dialog_tags(pattern: &Regex, text: &str) -> String {
    pattern
        .replace_all(text, |caps: &Captures| {
            if caps[0].starts_with('\\') {
                format!("({})", &caps[1])
            } else {
                format!("{{{}}}", &caps[1])
            }
        })
        .into_owned()
}

/// Split raw tag parameters on commas, trimming each one
pub fn parse_params(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(',').map(|param| param.trim().to_string()).collect()
}
