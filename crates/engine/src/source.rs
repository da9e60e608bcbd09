//! Source blocks of the program
//!
//! A source block is one unit of raw program text (one script). Blocks keep
//! their load order; replacing a block gives the new text a fresh id at the
//! same position so stale ids never alias patched text.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle for a source block
    pub struct BlockId;
}

/// One unit of program text
#[derive(Debug, Clone)]
pub struct SourceBlock {
    label: String,
    author: Option<String>,
    text: String,
}

impl SourceBlock {
    /// Human readable name (e.g. "engine", "dialog")
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Hack that contributed this block, `None` for program text
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// The raw text
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered collection of source blocks
#[derive(Debug, Default)]
pub struct SourceSet {
    blocks: SlotMap<BlockId, SourceBlock>,
    order: Vec<BlockId>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block
    pub fn add(&mut self, label: &str, author: Option<&str>, text: impl Into<String>) -> BlockId {
        let id = self.blocks.insert(SourceBlock {
            label: label.to_string(),
            author: author.map(str::to_string),
            text: text.into(),
        });
        self.order.push(id);
        tracing::trace!("Added source block '{}' ({} blocks)", label, self.order.len());
        id
    }

    /// Get a block by id
    pub fn get(&self, id: BlockId) -> Option<&SourceBlock> {
        self.blocks.get(id)
    }

    /// Iterate blocks in load order
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &SourceBlock)> {
        self.order
            .iter()
            .filter_map(move |id| self.blocks.get(*id).map(|block| (*id, block)))
    }

    /// Find the first block with a label
    pub fn find_by_label(&self, label: &str) -> Option<(BlockId, &SourceBlock)> {
        self.iter().find(|(_, block)| block.label == label)
    }

    /// Text of the first block with a label
    pub fn text_of(&self, label: &str) -> Option<&str> {
        self.find_by_label(label).map(|(_, block)| block.text())
    }

    /// Discard a block and put a new one with `text` in its place
    ///
    /// The new block keeps the label, author and position of the old one.
    /// Returns `None` if `id` is unknown.
    pub fn replace(&mut self, id: BlockId, text: impl Into<String>) -> Option<BlockId> {
        let position = self.order.iter().position(|existing| *existing == id)?;
        let old = self.blocks.remove(id)?;
        let new_id = self.blocks.insert(SourceBlock {
            label: old.label,
            author: old.author,
            text: text.into(),
        });
        self.order[position] = new_id;
        Some(new_id)
    }

    /// Remove a block
    pub fn remove(&mut self, id: BlockId) -> Option<SourceBlock> {
        let block = self.blocks.remove(id)?;
        self.order.retain(|existing| *existing != id);
        Some(block)
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no blocks
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_keep_load_order() {
        let mut set = SourceSet::new();
        set.add("engine", None, "a");
        set.add("dialog", None, "b");
        set.add("hack", Some("my-hack"), "c");

        let labels: Vec<_> = set.iter().map(|(_, b)| b.label().to_string()).collect();
        assert_eq!(labels, vec!["engine", "dialog", "hack"]);
        assert_eq!(set.text_of("hack"), Some("c"));
        assert_eq!(set.find_by_label("hack").unwrap().1.author(), Some("my-hack"));
    }

    #[test]
    fn test_replace_keeps_position_and_invalidates_old_id() {
        let mut set = SourceSet::new();
        set.add("engine", None, "a");
        let dialog = set.add("dialog", None, "b");
        set.add("script", None, "c");

        let new_id = set.replace(dialog, "patched").unwrap();
        assert_ne!(new_id, dialog);
        assert!(set.get(dialog).is_none());

        let texts: Vec<_> = set.iter().map(|(_, b)| b.text().to_string()).collect();
        assert_eq!(texts, vec!["a", "patched", "c"]);
        assert_eq!(set.get(new_id).unwrap().label(), "dialog");
    }

    #[test]
    fn test_replace_unknown_id() {
        let mut set = SourceSet::new();
        let id = set.add("engine", None, "a");
        set.remove(id);
        assert!(set.replace(id, "x").is_none());
        assert!(set.is_empty());
    }
}
