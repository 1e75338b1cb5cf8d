use thiserror::Error;

/// Result type for chunker construction and configuration
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors raised while configuring a chunker or parsing code units.
///
/// Chunking itself never fails: parse problems inside documents degrade to
/// simpler splitting and never reach callers of `StructuredChunker`.
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for `ChunkerConfig`
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Source could not be parsed cleanly
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No grammar registered for the language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}

impl ChunkerError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitter(msg.into())
    }
}
