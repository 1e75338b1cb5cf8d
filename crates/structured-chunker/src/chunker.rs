use crate::code_splitter::CodeUnitSplitter;
use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::html::HtmlSectionExtractor;
use crate::protector::{CodeBlockProtector, CodeBlockRegistry};
use crate::restorer::PlaceholderRestorer;
use crate::section::SectionParser;
use crate::section_chunker::SectionChunker;
use crate::syntax::SyntaxRegistry;
use crate::types::{Chunk, ChunkType, Document, Metadata, Section};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Main chunker interface for processing documents
#[derive(Debug, Clone, Default)]
pub struct StructuredChunker {
    config: ChunkerConfig,
    syntax: SyntaxRegistry,
}

impl StructuredChunker {
    /// Create a new chunker with configuration and the default syntax registry
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            syntax: SyntaxRegistry::default(),
        })
    }

    /// Builder: replace the languages available to function-level splitting
    #[must_use]
    pub fn with_syntax_registry(mut self, syntax: SyntaxRegistry) -> Self {
        self.syntax = syntax;
        self
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    #[must_use]
    pub const fn syntax_registry(&self) -> &SyntaxRegistry {
        &self.syntax
    }

    /// Chunk Markdown or plain text.
    ///
    /// Total over all inputs: empty text yields no chunks, and malformed code
    /// degrades to simpler splitting instead of failing.
    pub fn split_text(&self, text: &str, metadata: &Metadata) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let (protected, registry) = if self.config.preserve_code_blocks {
            CodeBlockProtector::new(self.config.inline_code_protect_threshold).protect(text)
        } else {
            (text.to_string(), CodeBlockRegistry::for_source(text))
        };

        let sections =
            SectionParser::new(self.config.preserve_markdown_structure).parse(&protected);
        self.chunk_sections(&sections, &registry, metadata)
    }

    /// Chunk one document, carrying its metadata into every chunk
    pub fn split_document(&self, document: &Document) -> Vec<Chunk> {
        self.split_text(&document.content, &document.metadata)
    }

    /// Chunk documents in order
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|document| self.split_document(document))
            .collect()
    }

    /// Chunk documents on the rayon pool; output order matches [`Self::split_documents`]
    pub fn split_documents_parallel(&self, documents: &[Document]) -> Vec<Chunk> {
        let per_document: Vec<Vec<Chunk>> = documents
            .par_iter()
            .map(|document| self.split_document(document))
            .collect();
        per_document.into_iter().flatten().collect()
    }

    /// Chunk raw HTML, discovering sections and code from the markup
    pub fn split_html(&self, html: &str, metadata: &Metadata) -> Vec<Chunk> {
        if html.trim().is_empty() {
            return Vec::new();
        }

        let extractor = HtmlSectionExtractor::new(
            self.config.inline_code_protect_threshold,
            self.config.preserve_code_blocks,
            self.config.preserve_markdown_structure,
        );
        let (sections, registry) = extractor.extract(html);
        self.chunk_sections(&sections, &registry, metadata)
    }

    fn chunk_sections(
        &self,
        sections: &[Section],
        registry: &CodeBlockRegistry,
        metadata: &Metadata,
    ) -> Vec<Chunk> {
        let splitter = CodeUnitSplitter::new(
            &self.syntax,
            self.config.preserve_functions,
            self.config.code_lines_per_chunk(),
        );
        let chunker = SectionChunker::new(&self.config, splitter);

        let chunks: Vec<Chunk> = sections
            .iter()
            .flat_map(|section| chunker.chunk(section, registry, metadata))
            .collect();
        let chunks = PlaceholderRestorer::new(registry).restore(chunks);

        log::debug!(
            "Chunked document: {} sections, {} code blocks, {} chunks",
            sections.len(),
            registry.len(),
            chunks.len()
        );

        chunks
    }

    /// Get statistics about chunking
    #[must_use]
    pub fn stats(chunks: &[Chunk]) -> ChunkingStats {
        let mut by_type = BTreeMap::new();
        for chunk in chunks {
            *by_type.entry(chunk.chunk_type().as_str()).or_insert(0) += 1;
        }

        let total_chars: usize = chunks.iter().map(Chunk::char_len).sum();
        ChunkingStats {
            total_chunks: chunks.len(),
            by_type,
            total_chars,
            avg_chars_per_chunk: if chunks.is_empty() {
                0
            } else {
                total_chars / chunks.len()
            },
            min_chars: chunks.iter().map(Chunk::char_len).min().unwrap_or(0),
            max_chars: chunks.iter().map(Chunk::char_len).max().unwrap_or(0),
            code_chunks: chunks
                .iter()
                .filter(|chunk| chunk.chunk_type().is_code())
                .count(),
        }
    }
}

/// Statistics about chunking results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    /// Chunk count per chunk type name
    pub by_type: BTreeMap<&'static str, usize>,
    pub total_chars: usize,
    pub avg_chars_per_chunk: usize,
    pub min_chars: usize,
    pub max_chars: usize,
    pub code_chunks: usize,
}

impl ChunkingStats {
    /// Number of chunks of one type
    #[must_use]
    pub fn count(&self, chunk_type: ChunkType) -> usize {
        self.by_type.get(chunk_type.as_str()).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Code: {} | Chars: {} | Avg: {} | Range: {}-{}",
            self.total_chunks,
            self.code_chunks,
            self.total_chars,
            self.avg_chars_per_chunk,
            self.min_chars,
            self.max_chars
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChunkerError;
    use pretty_assertions::assert_eq;

    const GUIDE: &str = r#"# Quickstart

Install the client first.

```python
def connect(url):
    return Client(url)
```

## Usage

Call `connect` with the server address.
"#;

    #[test]
    fn test_split_text() {
        let chunker = StructuredChunker::default();
        let chunks = chunker.split_text(GUIDE, &Metadata::new());

        let titles: Vec<_> = chunks
            .iter()
            .map(|c| c.metadata.section_title.as_str())
            .collect();
        assert_eq!(titles, vec!["Quickstart", "Usage"]);
        assert!(chunks[0].content.contains("```python\ndef connect(url):"));
        assert!(chunks[0].metadata.has_code);
        assert!(!chunks[1].metadata.has_code);
        assert!(chunks[1].content.contains("`connect`"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ChunkerConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        let result = StructuredChunker::new(config);
        assert!(matches!(result, Err(ChunkerError::InvalidConfig(_))));
    }

    #[test]
    fn test_document_metadata_carried() {
        let chunker = StructuredChunker::default();
        let document = Document::new(GUIDE).with_metadata("url", "https://docs.example.com");
        let chunks = chunker.split_document(&document);

        assert!(chunks
            .iter()
            .all(|c| c.metadata.to_map()["url"] == "https://docs.example.com"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let chunker = StructuredChunker::new(ChunkerConfig::smart(80, true, true)).unwrap();
        let documents: Vec<Document> = (0..8)
            .map(|i| {
                Document::new(format!("{GUIDE}\nExtra paragraph {i}.")).with_metadata("doc", i)
            })
            .collect();

        let sequential = chunker.split_documents(&documents);
        let parallel = chunker.split_documents_parallel(&documents);
        assert_eq!(sequential, parallel);
        assert!(sequential.len() > documents.len());
    }

    #[test]
    fn test_preserve_code_blocks_disabled() {
        let config = ChunkerConfig {
            preserve_code_blocks: false,
            ..Default::default()
        };
        let chunker = StructuredChunker::new(config).unwrap();
        let chunks = chunker.split_text(GUIDE, &Metadata::new());
        assert!(chunks.iter().all(|c| !c.metadata.has_code));
        assert!(chunks[0].content.contains("```python"));
    }

    #[test]
    fn test_markdown_structure_disabled() {
        let config = ChunkerConfig {
            preserve_markdown_structure: false,
            ..Default::default()
        };
        let chunker = StructuredChunker::new(config).unwrap();
        let chunks = chunker.split_text(GUIDE, &Metadata::new());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.section_title, "Content");
        assert!(chunks[0].content.starts_with("# Quickstart"));
    }

    #[test]
    fn test_chunking_stats() {
        let chunker = StructuredChunker::new(ChunkerConfig::smart(60, true, true)).unwrap();
        let chunks = chunker.split_text(GUIDE, &Metadata::new());
        let stats = StructuredChunker::stats(&chunks);

        assert_eq!(stats.total_chunks, chunks.len());
        assert_eq!(stats.count(ChunkType::Code), 1);
        assert_eq!(stats.code_chunks, 1);
        assert!(stats.min_chars <= stats.avg_chars_per_chunk);
        assert!(stats.avg_chars_per_chunk <= stats.max_chars);
        assert!(stats.to_string().starts_with(&format!("Chunks: {}", chunks.len())));

        let empty = StructuredChunker::stats(&[]);
        assert_eq!(empty.total_chunks, 0);
        assert_eq!(empty.avg_chars_per_chunk, 0);
    }

    #[test]
    fn test_empty_inputs() {
        let chunker = StructuredChunker::default();
        assert!(chunker.split_text("", &Metadata::new()).is_empty());
        assert!(chunker.split_text("\n  \n", &Metadata::new()).is_empty());
        assert!(chunker.split_html("", &Metadata::new()).is_empty());
        assert!(chunker.split_documents(&[]).is_empty());
    }
}
