use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for structure-preserving chunking.
///
/// All sizes are measured in characters. Every field has a default, so a
/// TOML table only needs the keys it wants to override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Target size of text and section chunks (soft limit)
    pub chunk_size: usize,

    /// Characters of trailing context carried into the next text chunk
    pub chunk_overlap: usize,

    /// Code blocks longer than this are split into code units
    pub code_block_max_size: usize,

    /// Protect fenced and long inline code from the text splitter
    pub preserve_code_blocks: bool,

    /// Split oversized code along function/class boundaries when a grammar is available
    pub preserve_functions: bool,

    /// Partition documents by their heading structure
    pub preserve_markdown_structure: bool,

    /// Inline code spans shorter than this stay as plain text
    pub inline_code_protect_threshold: usize,

    /// Assumed average line length when splitting code by line count
    pub code_split_line_divisor: usize,

    /// Upper bound on the number of trailing lines used as overlap
    pub overlap_max_lines: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
            code_block_max_size: 3000,
            preserve_code_blocks: true,
            preserve_functions: true,
            preserve_markdown_structure: true,
            inline_code_protect_threshold: 50,
            code_split_line_divisor: 40,
            overlap_max_lines: 5,
        }
    }
}

impl ChunkerConfig {
    /// Preset keyed on chunk size alone: overlap is a fifth of the chunk, capped at 200.
    ///
    /// `preserve_code` drives both code-block protection and function-level splitting.
    pub fn smart(chunk_size: usize, preserve_code: bool, preserve_structure: bool) -> Self {
        Self {
            chunk_size,
            chunk_overlap: (chunk_size / 5).min(200),
            preserve_code_blocks: preserve_code,
            preserve_functions: preserve_code,
            preserve_markdown_structure: preserve_structure,
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML and validate it
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file (TOML) and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Number of code lines per group for the line-count split
    #[must_use]
    pub fn code_lines_per_chunk(&self) -> usize {
        (self.chunk_size / self.code_split_line_divisor.max(1)).max(1)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::invalid_config("chunk_size must be > 0"));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkerError::invalid_config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.code_block_max_size == 0 {
            return Err(ChunkerError::invalid_config(
                "code_block_max_size must be > 0",
            ));
        }

        if self.code_split_line_divisor == 0 {
            return Err(ChunkerError::invalid_config(
                "code_split_line_divisor must be > 0",
            ));
        }

        if self.chunk_overlap > 0 && self.overlap_max_lines == 0 {
            return Err(ChunkerError::invalid_config(
                "overlap_max_lines must be > 0 when chunk_overlap is set",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ChunkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 1500);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.code_block_max_size, 3000);
        assert_eq!(config.inline_code_protect_threshold, 50);
        assert_eq!(config.code_split_line_divisor, 40);
    }

    #[test]
    fn test_smart_preset() {
        let config = ChunkerConfig::smart(500, false, true);
        assert_eq!(config.chunk_overlap, 100);
        assert!(!config.preserve_code_blocks);
        assert!(!config.preserve_functions);
        assert!(config.preserve_markdown_structure);
        assert!(config.validate().is_ok());

        let large = ChunkerConfig::smart(4000, true, true);
        assert_eq!(large.chunk_overlap, 200);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ChunkerConfig::default();

        // Invalid: overlap >= size
        config.chunk_overlap = 1500;
        assert!(config.validate().is_err());

        // Invalid: size = 0
        config.chunk_overlap = 0;
        config.chunk_size = 0;
        assert!(config.validate().is_err());

        // Invalid: divisor = 0
        config.chunk_size = 1000;
        config.code_split_line_divisor = 0;
        assert!(config.validate().is_err());

        // Invalid: overlap without a line allowance
        config.code_split_line_divisor = 40;
        config.chunk_overlap = 100;
        config.overlap_max_lines = 0;
        assert!(config.validate().is_err());

        // Valid configuration
        config.overlap_max_lines = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_code_lines_per_chunk() {
        let config = ChunkerConfig::default();
        assert_eq!(config.code_lines_per_chunk(), 37);

        let tiny = ChunkerConfig {
            chunk_size: 10,
            chunk_overlap: 0,
            ..Default::default()
        };
        assert_eq!(tiny.code_lines_per_chunk(), 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ChunkerConfig::from_toml_str("chunk_size = 800\nchunk_overlap = 100\n")
            .expect("valid toml");
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.code_block_max_size, 3000);
        assert!(config.preserve_functions);
    }

    #[test]
    fn test_toml_rejects_invalid_values() {
        let err = ChunkerConfig::from_toml_str("chunk_size = 100\nchunk_overlap = 200\n")
            .expect_err("overlap larger than size");
        assert!(matches!(err, ChunkerError::InvalidConfig(_)));

        let err = ChunkerConfig::from_toml_str("chunk_size = \"big\"").expect_err("bad type");
        assert!(matches!(err, ChunkerError::ConfigParse(_)));
    }
}
