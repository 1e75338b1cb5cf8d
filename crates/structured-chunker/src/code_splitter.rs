use crate::language::Language;
use crate::syntax::{CodeUnit, SyntaxRegistry, SyntaxSupport, UnitKind};
use crate::types::{fence, Chunk, ChunkMetadata, ChunkType, CodeBlock, Metadata, Section};

/// Splits oversized code blocks into function/class units or line groups
pub struct CodeUnitSplitter<'a> {
    syntax: &'a SyntaxRegistry,
    preserve_functions: bool,
    lines_per_chunk: usize,
}

impl<'a> CodeUnitSplitter<'a> {
    pub fn new(
        syntax: &'a SyntaxRegistry,
        preserve_functions: bool,
        lines_per_chunk: usize,
    ) -> Self {
        Self {
            syntax,
            preserve_functions,
            lines_per_chunk: lines_per_chunk.max(1),
        }
    }

    /// Split `block` into `code_function` chunks, falling back to `code_partial` groups.
    ///
    /// Never fails: every syntax problem ends in the line-count split.
    pub fn split(&self, block: &CodeBlock, document: &Metadata, section: &Section) -> Vec<Chunk> {
        let lines: Vec<&str> = block.content.split('\n').collect();
        let ctx = ChunkContext {
            block,
            document,
            section,
        };

        if self.preserve_functions {
            match self.locate_units(block) {
                Some(units) => {
                    log::debug!(
                        "Split {} block {} into {} code units",
                        block.language,
                        block.id,
                        units.len()
                    );
                    return self.split_by_units(&lines, &units, &ctx);
                }
                None => log::debug!(
                    "Falling back to line split for {} block {}",
                    block.language,
                    block.id
                ),
            }
        }

        let mut chunks = Vec::new();
        self.push_line_groups(&lines, &ctx, &mut chunks);
        chunks
    }

    fn locate_units(&self, block: &CodeBlock) -> Option<Vec<CodeUnit>> {
        let language = Language::from_tag(&block.language);
        let SyntaxSupport::SyntaxCapable(mut parser) = self.syntax.support_for(language) else {
            log::debug!("No syntax support for {}", block.language);
            return None;
        };

        match parser.top_level_units(&block.content) {
            Ok(units) => Some(units),
            Err(e) => {
                log::debug!("Code unit parsing failed for {}: {e}", block.language);
                None
            }
        }
    }

    fn split_by_units(
        &self,
        lines: &[&str],
        units: &[CodeUnit],
        ctx: &ChunkContext<'_>,
    ) -> Vec<Chunk> {
        let last_line = lines.len().saturating_sub(1);
        let mut chunks = Vec::new();
        let mut cursor = 0;

        for unit in merge_overlapping(units) {
            let start = unit.start.min(last_line);
            let end = unit.end.min(last_line);

            if start > cursor {
                self.push_line_groups(&lines[cursor..start], ctx, &mut chunks);
            }

            let metadata = ctx
                .metadata(ChunkType::CodeFunction)
                .function_names(unit.function_names)
                .class_names(unit.class_names);
            chunks.push(Chunk::new(ctx.fenced(&lines[start..=end]), metadata));
            cursor = end + 1;
        }

        if cursor <= last_line {
            self.push_line_groups(&lines[cursor..], ctx, &mut chunks);
        }

        chunks
    }

    /// Emit `lines` as `code_partial` groups, skipping blank leading/trailing lines
    fn push_line_groups(&self, lines: &[&str], ctx: &ChunkContext<'_>, chunks: &mut Vec<Chunk>) {
        let Some(first) = lines.iter().position(|line| !line.trim().is_empty()) else {
            return;
        };
        let last = lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .unwrap_or(first);

        for group in lines[first..=last].chunks(self.lines_per_chunk) {
            chunks.push(Chunk::new(
                ctx.fenced(group),
                ctx.metadata(ChunkType::CodePartial),
            ));
        }
    }
}

struct ChunkContext<'a> {
    block: &'a CodeBlock,
    document: &'a Metadata,
    section: &'a Section,
}

impl ChunkContext<'_> {
    fn metadata(&self, chunk_type: ChunkType) -> ChunkMetadata {
        ChunkMetadata::new(self.document, self.section, chunk_type)
            .language(self.block.language.clone())
    }

    fn fenced(&self, lines: &[&str]) -> String {
        fence(&self.block.fence_info, &lines.join("\n"))
    }
}

/// Line range covering one or more units that share lines
struct UnitSpan {
    start: usize,
    end: usize,
    function_names: Vec<String>,
    class_names: Vec<String>,
}

fn merge_overlapping(units: &[CodeUnit]) -> Vec<UnitSpan> {
    let mut spans: Vec<UnitSpan> = Vec::with_capacity(units.len());

    for unit in units {
        let shares_line = spans.last().is_some_and(|prev| unit.start_line <= prev.end);
        if !shares_line {
            spans.push(UnitSpan {
                start: unit.start_line,
                end: unit.end_line,
                function_names: Vec::new(),
                class_names: Vec::new(),
            });
        }
        let Some(span) = spans.last_mut() else {
            continue;
        };
        span.end = span.end.max(unit.end_line);

        if let Some(name) = &unit.name {
            match unit.kind {
                UnitKind::Function => span.function_names.push(name.clone()),
                UnitKind::Class => span.class_names.push(name.clone()),
            }
        }
    }

    spans
}
