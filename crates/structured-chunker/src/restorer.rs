use crate::protector::{CodeBlockRegistry, Segment};
use crate::types::Chunk;

/// Substitutes every placeholder left in chunk content with its original code
pub struct PlaceholderRestorer<'a> {
    registry: &'a CodeBlockRegistry,
}

impl<'a> PlaceholderRestorer<'a> {
    pub const fn new(registry: &'a CodeBlockRegistry) -> Self {
        Self { registry }
    }

    /// Restore chunk contents and section titles (a heading may hold a long
    /// inline span)
    pub fn restore(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        chunks
            .into_iter()
            .map(|mut chunk| {
                chunk.content = self.restore_text(&chunk.content);
                chunk.metadata.section_title = self.restore_text(&chunk.metadata.section_title);
                chunk
            })
            .collect()
    }

    /// Restore one string.
    ///
    /// Idempotent: restored code never contains the registry's placeholder
    /// prefix, so a second pass finds nothing to replace.
    pub fn restore_text(&self, text: &str) -> String {
        if self.registry.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        for segment in self.registry.segments(text) {
            match segment {
                Segment::Text(plain) => out.push_str(plain),
                Segment::Block(block) => out.push_str(&block.to_markdown()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protector::CodeBlockProtector;
    use crate::types::{ChunkMetadata, ChunkType, Metadata, Section};
    use pretty_assertions::assert_eq;

    fn chunk(content: &str) -> Chunk {
        let section = Section::new(0, "Content");
        let metadata = ChunkMetadata::new(&Metadata::new(), &section, ChunkType::Text);
        Chunk::new(content.to_string(), metadata)
    }

    #[test]
    fn test_restores_fenced_and_inline() {
        let inline = "session.query(User).filter(User.name == name).first()";
        let text = format!("Use `{inline}` here.\n```python\nprint('hi')\n```");
        let (protected, registry) = CodeBlockProtector::new(50).protect(&text);
        let restorer = PlaceholderRestorer::new(&registry);

        assert_eq!(registry.len(), 2);
        assert_eq!(restorer.restore_text(&protected), text);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let text = "Intro\n```rust\nlet s = \"__CODE_BLOCK_\";\n```\nend";
        let (protected, registry) = CodeBlockProtector::new(50).protect(text);
        let restorer = PlaceholderRestorer::new(&registry);

        let once = restorer.restore(vec![chunk(&protected)]);
        let twice = restorer.restore(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once[0].content, text);
    }

    #[test]
    fn test_section_title_restored() {
        let span = "x".repeat(60);
        let (protected, registry) = CodeBlockProtector::new(50).protect(&format!("# Use `{span}`"));
        let section = Section::new(1, protected.trim_start_matches("# "));
        let metadata = ChunkMetadata::new(&Metadata::new(), &section, ChunkType::Section);

        let chunks = vec![Chunk::new(String::new(), metadata)];
        let restored = PlaceholderRestorer::new(&registry).restore(chunks);
        assert_eq!(restored[0].metadata.section_title, format!("Use `{span}`"));
    }

    #[test]
    fn test_untagged_fence_restored_without_info() {
        let (protected, registry) = CodeBlockProtector::new(50).protect("```\nmake\n```");
        let restored = PlaceholderRestorer::new(&registry).restore_text(&protected);
        assert_eq!(restored, "```\nmake\n```");
    }

    #[test]
    fn test_text_without_placeholders_unchanged() {
        let (_, registry) = CodeBlockProtector::new(50).protect("```\nx\n```");
        let restorer = PlaceholderRestorer::new(&registry);
        assert_eq!(restorer.restore_text("plain `id` text"), "plain `id` text");
    }
}
