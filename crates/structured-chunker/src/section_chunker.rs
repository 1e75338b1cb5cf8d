use crate::code_splitter::CodeUnitSplitter;
use crate::config::ChunkerConfig;
use crate::protector::{CodeBlockRegistry, Segment};
use crate::types::{char_len, Chunk, ChunkMetadata, ChunkType, CodeBlock, Metadata, Section};

/// Turns one section into size-bounded chunks without cutting code blocks.
///
/// Text is split only at line boundaries; lines holding placeholders are
/// routed to code chunks (or to the [`CodeUnitSplitter`] when the block is
/// oversized). Placeholders are left in place for the restorer.
pub struct SectionChunker<'a> {
    config: &'a ChunkerConfig,
    splitter: CodeUnitSplitter<'a>,
}

impl<'a> SectionChunker<'a> {
    pub fn new(config: &'a ChunkerConfig, splitter: CodeUnitSplitter<'a>) -> Self {
        Self { config, splitter }
    }

    /// Chunk `section` in document order
    pub fn chunk(
        &self,
        section: &Section,
        registry: &CodeBlockRegistry,
        document: &Metadata,
    ) -> Vec<Chunk> {
        let text = section.text();
        if registry.restored_char_len(&text) <= self.config.chunk_size {
            let has_code = registry.contains_placeholder(&text);
            let metadata =
                ChunkMetadata::new(document, section, ChunkType::Section).has_code(has_code);
            return vec![Chunk::new(text, metadata)];
        }

        let mut state = SplitState {
            section,
            document,
            buffer: TextBuffer::default(),
            chunks: Vec::new(),
        };

        for line in &section.content_lines {
            if registry.contains_placeholder(line) {
                state.flush_text();
                state.buffer.clear();
                self.chunk_code_line(line, registry, &mut state);
            } else {
                self.push_text_line(line, &mut state);
            }
        }
        state.flush_text();

        state.chunks
    }

    fn push_text_line<'s>(&self, line: &'s str, state: &mut SplitState<'s, '_>) {
        let line_len = char_len(line);
        if state.buffer.has_new_lines()
            && state.buffer.len_with(line_len) > self.config.chunk_size
        {
            state.flush_text();
            let overlap = state.buffer.overlap(
                self.config.chunk_overlap,
                self.config.overlap_max_lines,
                line_len,
                self.config.chunk_size,
            );
            state.buffer.reseed(overlap);
        }
        state.buffer.push(line, line_len);
    }

    /// Emit the pieces of a placeholder line: small blocks stay together as one
    /// `code` chunk, oversized blocks are split into code units.
    fn chunk_code_line(
        &self,
        line: &str,
        registry: &CodeBlockRegistry,
        state: &mut SplitState<'_, '_>,
    ) {
        let mut pending = String::new();
        let mut blocks: Vec<&CodeBlock> = Vec::new();

        for segment in registry.segments(line) {
            match segment {
                Segment::Text(text) => pending.push_str(text),
                Segment::Block(block) if block.char_len() > self.config.code_block_max_size => {
                    state.flush_code_piece(&mut pending, &mut blocks);
                    let split = self.splitter.split(block, state.document, state.section);
                    state.chunks.extend(split);
                }
                Segment::Block(block) => {
                    pending.push_str(&block.id);
                    blocks.push(block);
                }
            }
        }

        state.flush_code_piece(&mut pending, &mut blocks);
    }
}

struct SplitState<'s, 'a> {
    section: &'a Section,
    document: &'a Metadata,
    buffer: TextBuffer<'s>,
    chunks: Vec<Chunk>,
}

impl SplitState<'_, '_> {
    /// Emit buffered lines as a `text` chunk unless they are only carried-over
    /// overlap or blank
    fn flush_text(&mut self) {
        if !self.buffer.has_new_content() {
            return;
        }
        let metadata = ChunkMetadata::new(self.document, self.section, ChunkType::Text);
        self.chunks.push(Chunk::new(self.buffer.text(), metadata));
    }

    fn flush_code_piece(&mut self, pending: &mut String, blocks: &mut Vec<&CodeBlock>) {
        let content = std::mem::take(pending);

        if let Some(first) = blocks.first() {
            let metadata = ChunkMetadata::new(self.document, self.section, ChunkType::Code)
                .language(first.language.clone())
                .function_names(blocks.iter().flat_map(|b| b.function_names.iter().cloned()))
                .class_names(blocks.iter().flat_map(|b| b.class_names.iter().cloned()));
            self.chunks.push(Chunk::new(content, metadata));
        } else if !content.trim().is_empty() {
            let metadata = ChunkMetadata::new(self.document, self.section, ChunkType::Text);
            self.chunks.push(Chunk::new(content, metadata));
        }

        blocks.clear();
    }
}

/// Lines of the chunk being built, with its length in characters
#[derive(Default)]
struct TextBuffer<'s> {
    lines: Vec<&'s str>,
    /// Joined length including newline separators
    size: usize,
    /// Leading lines copied from the previous chunk
    carried: usize,
}

impl<'s> TextBuffer<'s> {
    fn push(&mut self, line: &'s str, line_len: usize) {
        self.size = self.len_with(line_len);
        self.lines.push(line);
    }

    /// Length after appending a line of `line_len` characters
    fn len_with(&self, line_len: usize) -> usize {
        if self.lines.is_empty() {
            line_len
        } else {
            self.size + 1 + line_len
        }
    }

    fn has_new_lines(&self) -> bool {
        self.lines.len() > self.carried
    }

    fn has_new_content(&self) -> bool {
        self.lines[self.carried..]
            .iter()
            .any(|line| !line.trim().is_empty())
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.size = 0;
        self.carried = 0;
    }

    /// Trailing lines worth at most `budget` characters and `max_lines` lines,
    /// trimmed from the oldest side until `next_len` more characters still fit
    /// in `chunk_size`
    fn overlap(
        &self,
        budget: usize,
        max_lines: usize,
        next_len: usize,
        chunk_size: usize,
    ) -> Vec<&'s str> {
        let mut taken: Vec<&'s str> = Vec::new();
        let mut size = 0;

        for &line in self.lines.iter().rev().take(max_lines) {
            let line_len = char_len(line);
            let grown = if taken.is_empty() {
                line_len
            } else {
                size + 1 + line_len
            };
            if grown > budget {
                break;
            }
            size = grown;
            taken.push(line);
        }
        taken.reverse();

        // Drop the oldest overlapped line first (keep the most recent context).
        while !taken.is_empty() && size + 1 + next_len > chunk_size {
            let dropped = taken.remove(0);
            size = size.saturating_sub(char_len(dropped) + 1);
            if taken.is_empty() {
                size = 0;
            }
        }

        taken
    }

    fn reseed(&mut self, overlap: Vec<&'s str>) {
        self.clear();
        for line in overlap {
            self.push(line, char_len(line));
        }
        self.carried = self.lines.len();
    }
}
