use crate::language::Language;
use crate::types::{char_len, CodeBlock, CodeBlockKind};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

const PLACEHOLDER_STEM: &str = "__CODE_BLOCK_";
const PLACEHOLDER_END: &str = "__";

/// Opening fence: three backticks, optional info string, end of line.
/// The first word of the info string is the language, the rest are attributes.
static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```((?:[^\s`][^\n`]*)?)[ \t]*\r?\n").expect("fence pattern"));

static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`]+)`").expect("inline code pattern"));

/// Per-document store of protected code blocks, keyed by placeholder.
///
/// The placeholder prefix is chosen so that it never occurs in the source
/// text, and the numeric suffix grows with every registration, so every
/// placeholder is unique within the document and absent from its content.
#[derive(Debug, Clone)]
pub struct CodeBlockRegistry {
    prefix: String,
    blocks: Vec<CodeBlock>,
    index: HashMap<String, usize>,
}

/// Piece of text split at placeholder boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Block(&'a CodeBlock),
}

impl CodeBlockRegistry {
    /// Create an empty registry whose placeholders cannot collide with `source`
    pub fn for_source(source: &str) -> Self {
        let mut prefix = PLACEHOLDER_STEM.to_string();
        while source.contains(&prefix) {
            prefix.push_str("X_");
        }

        Self {
            prefix,
            blocks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a code span and return its placeholder
    pub fn register(
        &mut self,
        kind: CodeBlockKind,
        language: impl Into<String>,
        fence_info: impl Into<String>,
        content: impl Into<String>,
    ) -> String {
        let id = format!("{}{}{}", self.prefix, self.blocks.len(), PLACEHOLDER_END);
        let language = language.into();
        let content = content.into();

        let (function_names, class_names) = match kind {
            CodeBlockKind::Fenced => {
                let lang = Language::from_tag(&language);
                (lang.function_names(&content), lang.class_names(&content))
            }
            CodeBlockKind::Inline => (Vec::new(), Vec::new()),
        };

        self.index.insert(id.clone(), self.blocks.len());
        self.blocks.push(CodeBlock {
            id: id.clone(),
            language,
            kind,
            content,
            fence_info: fence_info.into(),
            function_names,
            class_names,
        });

        id
    }

    /// Look up a block by placeholder
    pub fn get(&self, id: &str) -> Option<&CodeBlock> {
        self.index.get(id).map(|&idx| &self.blocks[idx])
    }

    /// All blocks in registration order
    pub fn blocks(&self) -> &[CodeBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether `text` holds at least one placeholder of this registry
    pub fn contains_placeholder(&self, text: &str) -> bool {
        self.segments(text)
            .iter()
            .any(|segment| matches!(segment, Segment::Block(_)))
    }

    /// Length of `text` in characters once its placeholders are restored
    pub fn restored_char_len(&self, text: &str) -> usize {
        self.segments(text)
            .iter()
            .map(|segment| match segment {
                Segment::Text(plain) => char_len(plain),
                Segment::Block(block) => char_len(&block.to_markdown()),
            })
            .sum()
    }

    /// Split `text` into plain runs and placeholder references, in order
    pub fn segments<'a>(&'a self, text: &'a str) -> Vec<Segment<'a>> {
        let mut segments = Vec::new();
        let mut plain_start = 0;
        let mut search = 0;

        while let Some(offset) = text[search..].find(&self.prefix) {
            let start = search + offset;
            let digits_start = start + self.prefix.len();
            let digits = text[digits_start..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            let suffix_start = digits_start + digits;

            if digits > 0 && text[suffix_start..].starts_with(PLACEHOLDER_END) {
                let end = suffix_start + PLACEHOLDER_END.len();
                if let Some(block) = self.get(&text[start..end]) {
                    if start > plain_start {
                        segments.push(Segment::Text(&text[plain_start..start]));
                    }
                    segments.push(Segment::Block(block));
                    plain_start = end;
                    search = end;
                    continue;
                }
            }

            // A stem match may overlap the start of a real placeholder.
            search = start + 1;
        }

        if plain_start < text.len() {
            segments.push(Segment::Text(&text[plain_start..]));
        }

        segments
    }
}

/// Replaces fenced blocks and long inline spans with placeholders
#[derive(Debug, Clone, Copy)]
pub struct CodeBlockProtector {
    inline_threshold: usize,
}

impl CodeBlockProtector {
    /// Inline spans shorter than `inline_threshold` characters are left in place
    pub const fn new(inline_threshold: usize) -> Self {
        Self { inline_threshold }
    }

    /// Protect `text`, returning the substituted text and the block registry
    pub fn protect(&self, text: &str) -> (String, CodeBlockRegistry) {
        let mut registry = CodeBlockRegistry::for_source(text);
        let fenced = Self::protect_fenced(text, &mut registry);
        let protected = self.protect_inline(&fenced, &mut registry);

        log::debug!(
            "Protected {} code blocks ({} chars in, {} chars out)",
            registry.len(),
            text.len(),
            protected.len()
        );

        (protected, registry)
    }

    fn protect_fenced(text: &str, registry: &mut CodeBlockRegistry) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;

        while let Some(caps) = FENCE_OPEN.captures_at(text, pos) {
            let (Some(open), Some(info)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            out.push_str(&text[pos..open.start()]);

            let content_start = open.end();
            let (raw_content, next) = match text[content_start..].find("```") {
                Some(offset) => (
                    &text[content_start..content_start + offset],
                    content_start + offset + 3,
                ),
                // Unterminated fence: the block runs to the end of the text.
                None => (&text[content_start..], text.len()),
            };

            let content = strip_final_newline(raw_content);
            let fence_info = info.as_str().trim_end();
            let language = fence_info.split_whitespace().next().unwrap_or("plain");

            let id = registry.register(CodeBlockKind::Fenced, language, fence_info, content);
            out.push_str(&id);
            pos = next;
        }

        out.push_str(&text[pos..]);
        out
    }

    fn protect_inline(&self, text: &str, registry: &mut CodeBlockRegistry) -> String {
        let prefix = registry.prefix.clone();
        INLINE_CODE
            .replace_all(text, |caps: &Captures<'_>| {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                let code = caps.get(1).map_or("", |m| m.as_str());
                // Stray backticks around a fenced placeholder are not a span.
                if char_len(code) < self.inline_threshold || code.contains(&prefix) {
                    whole.to_string()
                } else {
                    registry.register(CodeBlockKind::Inline, "inline", "", code)
                }
            })
            .into_owned()
    }
}

fn strip_final_newline(content: &str) -> &str {
    content
        .strip_suffix('\n')
        .map_or(content, |rest| rest.strip_suffix('\r').unwrap_or(rest))
}
