use std::fs;

use pretty_assertions::assert_eq;
use structured_chunker::{ChunkerConfig, ChunkerError, Metadata, StructuredChunker};
use tempfile::TempDir;

#[test]
fn loads_partial_config_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("chunker.toml");
    fs::write(
        &path,
        "chunk_size = 600\nchunk_overlap = 120\npreserve_functions = false\n",
    )
    .expect("write config");

    let config = ChunkerConfig::from_file(&path).expect("load config");
    assert_eq!(
        config,
        ChunkerConfig {
            chunk_size: 600,
            chunk_overlap: 120,
            preserve_functions: false,
            ..Default::default()
        }
    );

    let chunker = StructuredChunker::new(config).expect("valid config");
    assert_eq!(chunker.config().chunk_size, 600);
    assert!(!chunker.split_text("# Title\nbody", &Metadata::new()).is_empty());
}

#[test]
fn config_round_trips_through_toml() {
    let config = ChunkerConfig::smart(900, true, false);
    let raw = toml::to_string(&config).expect("serialize config");

    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("smart.toml");
    fs::write(&path, raw).expect("write config");

    assert_eq!(ChunkerConfig::from_file(&path).expect("load config"), config);
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = ChunkerConfig::from_file(dir.path().join("absent.toml")).expect_err("missing");
    assert!(matches!(err, ChunkerError::Io(_)));
}

#[test]
fn invalid_values_rejected_on_load() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "chunk_size = 0\nchunk_overlap = 0\n").expect("write config");

    let err = ChunkerConfig::from_file(&path).expect_err("zero chunk size");
    assert!(matches!(err, ChunkerError::InvalidConfig(_)));
    assert!(err.to_string().contains("chunk_size"));
}

#[test]
fn malformed_toml_is_parse_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "chunk_size = [").expect("write config");

    let err = ChunkerConfig::from_file(&path).expect_err("broken toml");
    assert!(matches!(err, ChunkerError::ConfigParse(_)));
}
