//! Source patcher
//!
//! Rewrites program text before the subsystems built from it are
//! reconstructed. A patch names a matcher and a replacement; applying it finds
//! the one eligible source block containing the matcher, replaces the first
//! occurrence, and swaps the block for a new one holding the patched text.
//!
//! # Eligibility
//!
//! A block is eligible when it contains the matcher and was not contributed
//! by the hack that registered the patch, so a hack's own source is never
//! mistaken for its target.
//!
//! # Example
//!
//! ```ignore
//! use hackkit_core::patch::{patch_text, Matcher};
//!
//! let patched = patch_text("var speed = 50;", &Matcher::regex(r"speed = \d+")?, "speed = 10")?;
//! assert_eq!(patched, "var speed = 10;");
//! ```

mod matcher;

use hackkit_engine::{BlockId, Program};

pub use matcher::Matcher;

/// Errors raised while applying source patches
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatchError {
    /// No eligible block contains the matcher
    #[error("Couldn't find {matcher} in any source block; the hack does not match this program version")]
    NotFound { matcher: String },

    /// Several eligible blocks contain the matcher
    #[error("{matcher} matches {} source blocks ({}); expected exactly one", .blocks.len(), .blocks.join(", "))]
    Ambiguous { matcher: String, blocks: Vec<String> },

    /// The matcher occurs several times inside its block (strict mode only)
    #[error("{matcher} occurs {count} times in source block '{block}'; expected exactly one")]
    MultipleMatches {
        matcher: String,
        block: String,
        count: usize,
    },

    /// The regular expression does not compile
    #[error("Invalid pattern /{pattern}/: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A queued source patch
#[derive(Debug, Clone)]
pub struct PatchEntry {
    /// What to look for
    pub matcher: Matcher,
    /// Concatenated replacement fragments
    pub replacement: String,
    /// Hack that registered the patch
    pub hack: Option<String>,
}

impl PatchEntry {
    /// Build a patch from replacement fragments
    pub fn new<I, S>(matcher: Matcher, fragments: I, hack: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let replacement = fragments
            .into_iter()
            .fold(String::new(), |mut acc, fragment| {
                acc.push_str(fragment.as_ref());
                acc
            });

        Self {
            matcher,
            replacement,
            hack: hack.map(str::to_string),
        }
    }
}

/// Replace the first match in a single buffer
///
/// Fails with [`PatchError::NotFound`] when the matcher does not occur.
pub fn patch_text(text: &str, matcher: &Matcher, replacement: &str) -> Result<String, PatchError> {
    if !matcher.is_match(text) {
        return Err(PatchError::NotFound {
            matcher: matcher.to_string(),
        });
    }
    Ok(matcher.replace_first(text, replacement))
}

/// Apply one patch to the program's sources
///
/// Returns the id of the block holding the patched text.
pub fn apply_patch(program: &Program, patch: &PatchEntry, strict: bool) -> Result<BlockId, PatchError> {
    let mut sources = program.sources_mut();

    let candidates: Vec<(BlockId, String)> = sources
        .iter()
        .filter(|(_, block)| patch.hack.is_none() || block.author() != patch.hack.as_deref())
        .filter(|(_, block)| patch.matcher.is_match(block.text()))
        .map(|(id, block)| (id, block.label().to_string()))
        .collect();

    let (id, label) = match candidates.as_slice() {
        [] => {
            return Err(PatchError::NotFound {
                matcher: patch.matcher.to_string(),
            })
        }
        [single] => single.clone(),
        many => {
            return Err(PatchError::Ambiguous {
                matcher: patch.matcher.to_string(),
                blocks: many.iter().map(|(_, label)| label.clone()).collect(),
            })
        }
    };

    let text = sources
        .get(id)
        .map(|block| block.text().to_string())
        .unwrap_or_default();

    let count = patch.matcher.count(&text);
    if count > 1 {
        if strict {
            return Err(PatchError::MultipleMatches {
                matcher: patch.matcher.to_string(),
                block: label,
                count,
            });
        }
        tracing::warn!(
            "{} occurs {} times in source block '{}', patching the first",
            patch.matcher,
            count,
            label
        );
    }

    let patched = patch.matcher.replace_first(&text, &patch.replacement);
    let new_id = sources.replace(id, patched).ok_or_else(|| PatchError::NotFound {
        matcher: patch.matcher.to_string(),
    })?;

    tracing::debug!(
        "Patched {} in source block '{}'{}",
        patch.matcher,
        label,
        patch
            .hack
            .as_deref()
            .map(|hack| format!(" for hack '{}'", hack))
            .unwrap_or_default()
    );

    Ok(new_id)
}

/// Apply patches in order, each against the text left by the previous ones
///
/// Stops at the first failure. Returns the number of patches applied.
pub fn apply_patches(program: &Program, patches: &[PatchEntry], strict: bool) -> Result<usize, PatchError> {
    for patch in patches {
        apply_patch(program, patch, strict)?;
    }
    Ok(patches.len())
}
