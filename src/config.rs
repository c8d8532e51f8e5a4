use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::piece::PiecePolicy;

/// Read size for content scanning (4 KiB)
pub const BLOCK_SIZE: usize = 4096;

/// Fixed eDonkey2000 chunk size; ed2k hashes are MD4 over these
pub const ED2K_PIECE_LENGTH: u64 = 9_728_000;

/// Starting point for verification piece length doubling
pub const MIN_PIECE_LENGTH: u64 = 1024;

/// Upper bound on the number of verification pieces
pub const DEFAULT_MAX_PIECES: u64 = 255;

/// Lower bound on verification piece length, in KiB
pub const DEFAULT_CHUNK_SIZE_KIB: u64 = 256;

/// Shortest accepted tracker URL
pub const MIN_TRACKER_LENGTH: usize = 10;

/// Bencode nesting limit for both directions
pub const MAX_DEPTH: usize = 64;

/// Torrent metadata defaults applied by the `create` command.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TorrentDefaults {
    pub trackers: Vec<String>,
    pub comment: Option<String>,
    pub created_by: Option<String>,
}

/// User configuration, read from `config.toml`.
///
/// ```toml
/// overwrite = false
///
/// [scan]
/// max_pieces = 255
/// chunk_size_kib = 256
///
/// [torrent]
/// trackers = ["http://tracker.example/announce"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Replace existing output files instead of writing `<name>.new`
    pub overwrite: bool,
    pub scan: PiecePolicy,
    pub torrent: TorrentDefaults,
}

impl Config {
    /// Location of the per-user configuration file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "metahash")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load `path`, or the per-user file when `path` is `None`.
    ///
    /// A missing per-user file is not an error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.overwrite);
        assert_eq!(config.scan.max_pieces, DEFAULT_MAX_PIECES);
        assert_eq!(config.scan.chunk_size_kib, DEFAULT_CHUNK_SIZE_KIB);
        assert!(config.torrent.trackers.is_empty());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml(
            r#"
            overwrite = true

            [scan]
            max_pieces = 100

            [torrent]
            trackers = ["http://tracker.example/announce"]
            "#,
        )
        .unwrap();

        assert!(config.overwrite);
        assert_eq!(config.scan.max_pieces, 100);
        assert_eq!(config.scan.chunk_size_kib, DEFAULT_CHUNK_SIZE_KIB);
        assert_eq!(config.torrent.trackers.len(), 1);
        assert_eq!(config.torrent.created_by, None);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
