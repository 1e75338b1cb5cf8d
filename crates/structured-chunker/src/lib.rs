//! # Structured Chunker
//!
//! Structure-preserving chunking of Markdown, plain text and HTML documents
//! for retrieval pipelines.
//!
//! ## Philosophy
//!
//! The chunker creates bounded fragments that:
//! - Never cut a code block or a top-level function/class in half
//! - Follow the heading structure of the document
//! - Carry document, section and chunk metadata in a fixed precedence
//! - Keep local context across text boundaries via line overlap
//!
//! ## Architecture
//!
//! ```text
//! Document text
//!     │
//!     ├──> Code Block Protection (fenced + long inline → placeholders)
//!     │
//!     ├──> Section Parsing (ATX headings, or HTML h1-h6)
//!     │
//!     ├──> Section Chunking
//!     │    ├─> Small section → one chunk
//!     │    ├─> Text lines → size-bounded chunks with overlap
//!     │    └─> Placeholder lines → code chunks
//!     │         └─> Oversized code → tree-sitter units or line groups
//!     │
//!     └──> Placeholder Restoration → Chunk[] with metadata
//! ```
//!
//! ## Example
//!
//! ```rust
//! use structured_chunker::{ChunkerConfig, Document, StructuredChunker};
//!
//! let chunker = StructuredChunker::new(ChunkerConfig::default()).unwrap();
//!
//! let document = Document::new("# Setup\n\nInstall:\n\n```bash\npip install client\n```\n")
//!     .with_metadata("source", "docs/setup.md");
//!
//! for chunk in chunker.split_document(&document) {
//!     println!(
//!         "[{}] {}: {}",
//!         chunk.metadata.chunk_type.as_str(),
//!         chunk.metadata.section_title,
//!         chunk.content
//!     );
//! }
//! ```

mod chunker;
mod code_splitter;
mod config;
mod error;
mod html;
mod language;
mod protector;
mod restorer;
mod section;
mod section_chunker;
mod syntax;
mod types;

pub use chunker::{ChunkingStats, StructuredChunker};
pub use code_splitter::CodeUnitSplitter;
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use html::HtmlSectionExtractor;
pub use language::Language;
pub use protector::{CodeBlockProtector, CodeBlockRegistry, Segment};
pub use restorer::PlaceholderRestorer;
pub use section::{SectionParser, PREAMBLE_SECTION, UNTITLED_SECTION};
pub use section_chunker::SectionChunker;
pub use syntax::{CodeUnit, Grammar, SyntaxRegistry, SyntaxSupport, UnitKind, UnitParser};
pub use types::{
    Chunk, ChunkMetadata, ChunkType, CodeBlock, CodeBlockKind, Document, Metadata, Section,
};
