use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered string-keyed metadata carried by documents and chunks
pub type Metadata = serde_json::Map<String, Value>;

/// Length in characters, the unit every size budget is expressed in
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Input document: extracted text plus provenance tags
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document without metadata
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Builder: add a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// How a protected code span was written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeBlockKind {
    /// Triple-backtick block (or `<pre>` in HTML)
    Fenced,
    /// Single-backtick span (or `<code>` outside `<pre>` in HTML)
    Inline,
}

/// A code span lifted out of the text and replaced by a placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Placeholder token standing in for the block
    pub id: String,
    /// Declared language, `plain` for untagged fences and `inline` for spans
    pub language: String,
    pub kind: CodeBlockKind,
    /// Original content, without the fence lines
    pub content: String,
    /// Info string written after the opening fence, empty when absent
    pub fence_info: String,
    /// Best-effort function names; may miss definitions
    pub function_names: Vec<String>,
    /// Best-effort class names; may miss definitions
    pub class_names: Vec<String>,
}

impl CodeBlock {
    /// Length of the original content in characters
    #[must_use]
    pub fn char_len(&self) -> usize {
        char_len(&self.content)
    }

    /// Render the block back into Markdown
    #[must_use]
    pub fn to_markdown(&self) -> String {
        match self.kind {
            CodeBlockKind::Fenced => fence(&self.fence_info, &self.content),
            CodeBlockKind::Inline => format!("`{}`", self.content),
        }
    }
}

/// Wrap code in triple-backtick fences with the given info string
pub(crate) fn fence(info: &str, code: &str) -> String {
    if code.is_empty() {
        return format!("```{info}\n```");
    }
    format!("```{info}\n{code}\n```")
}

/// Heading-delimited region of a document.
///
/// Sections are flat; nesting exists only through `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// 0 for the implicit top-level section, 1..=6 for headings
    pub level: u8,
    pub title: String,
    pub content_lines: Vec<String>,
}

impl Section {
    pub fn new(level: u8, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            content_lines: Vec::new(),
        }
    }

    /// Content lines joined with newlines
    #[must_use]
    pub fn text(&self) -> String {
        self.content_lines.join("\n")
    }

    /// True when no content line holds anything but whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content_lines.iter().all(|line| line.trim().is_empty())
    }
}

/// Classification of an emitted chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// Whole section that fit the size budget
    Section,
    /// Plain-text slice of an oversized section
    Text,
    /// Code block (or inline span) emitted whole
    Code,
    /// One top-level function or class of an oversized block
    CodeFunction,
    /// Line-count slice of an oversized block
    CodePartial,
}

impl ChunkType {
    /// Whether chunks of this type carry code
    #[must_use]
    pub const fn is_code(self) -> bool {
        matches!(self, Self::Code | Self::CodeFunction | Self::CodePartial)
    }

    /// Get the metadata name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Text => "text",
            Self::Code => "code",
            Self::CodeFunction => "code_function",
            Self::CodePartial => "code_partial",
        }
    }
}

/// Metadata attached to a chunk.
///
/// Stored as typed layers; [`ChunkMetadata::to_map`] flattens them with a fixed
/// precedence: document metadata, then section tags, then chunk tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// Metadata of the source document
    pub document: Metadata,
    pub section_title: String,
    pub section_level: u8,
    pub chunk_type: ChunkType,
    pub has_code: bool,
    pub language: Option<String>,
    #[serde(default)]
    pub function_names: Vec<String>,
    #[serde(default)]
    pub class_names: Vec<String>,
}

impl ChunkMetadata {
    /// Metadata for a chunk of `section`; `has_code` follows the chunk type
    pub fn new(document: &Metadata, section: &Section, chunk_type: ChunkType) -> Self {
        Self {
            document: document.clone(),
            section_title: section.title.clone(),
            section_level: section.level,
            chunk_type,
            has_code: chunk_type.is_code(),
            language: None,
            function_names: Vec::new(),
            class_names: Vec::new(),
        }
    }

    /// Builder: set has_code
    #[must_use]
    pub const fn has_code(mut self, has_code: bool) -> Self {
        self.has_code = has_code;
        self
    }

    /// Builder: set language
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Builder: add function names
    #[must_use]
    pub fn function_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.function_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Builder: add class names
    #[must_use]
    pub fn class_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Flatten the layers into one mapping; later layers win on key clashes
    #[must_use]
    pub fn to_map(&self) -> Metadata {
        let mut map = self.document.clone();

        map.insert("section_title".into(), Value::from(self.section_title.clone()));
        map.insert("section_level".into(), Value::from(self.section_level));

        map.insert("chunk_type".into(), Value::from(self.chunk_type.as_str()));
        map.insert("has_code".into(), Value::from(self.has_code));
        if self.chunk_type.is_code() {
            if let Some(language) = &self.language {
                map.insert("language".into(), Value::from(language.clone()));
            }
            map.insert(
                "function_names".into(),
                Value::from(self.function_names.clone()),
            );
            map.insert("class_names".into(), Value::from(self.class_names.clone()));
        }
        if self.chunk_type == ChunkType::CodeFunction {
            if let Some(name) = self.function_names.first() {
                map.insert("function_name".into(), Value::from(name.clone()));
            } else if let Some(name) = self.class_names.first() {
                map.insert("class_name".into(), Value::from(name.clone()));
            }
        }

        map
    }
}

/// Output unit: bounded content plus classification metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    #[must_use]
    pub const fn new(content: String, metadata: ChunkMetadata) -> Self {
        Self { content, metadata }
    }

    #[must_use]
    pub const fn chunk_type(&self) -> ChunkType {
        self.metadata.chunk_type
    }

    /// Content length in characters
    #[must_use]
    pub fn char_len(&self) -> usize {
        char_len(&self.content)
    }
}
