//! # metahash
//!
//! A library for gathering and reconciling file integrity metadata.
//!
//! Hash values come from three places: a single streaming pass over the file
//! itself ([`ContentScanner`]), checksum lists such as `SHA256SUMS`
//! ([`HashRegistry::parse_sum_file`]), and `.torrent` files
//! ([`TorrentDescriptor`]). A [`HashRegistry`] merges them without ever
//! replacing a value it already has.
//!
//! ## Example
//!
//! ```no_run
//! use metahash::{ContentScanner, HashAlgorithm, HashRegistry};
//! use std::path::Path;
//!
//! let mut hashes = HashRegistry::new();
//! hashes.parse_sum_file("d41d8cd98f00b204e9800998ecf8427e  empty.txt", None, None);
//! hashes.set_file("empty.txt");
//!
//! let result = ContentScanner::default().scan(Path::new("empty.txt")).unwrap();
//! hashes.apply_scan(result);
//! assert!(hashes.has(&HashAlgorithm::Sha256));
//! ```

pub mod bencode;
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod hashing;
pub mod links;
pub mod models;
pub mod piece;
pub mod registry;
pub mod scanner;
pub mod sumfile;

// Re-export main types for convenience
pub use builder::{CreatedTorrent, TorrentBuilder, write_torrent};
pub use error::{Error, FormatError, Result, ValidationError};
pub use hashing::HashAlgorithm;
pub use links::{ed2k_link, magnet_links};
pub use models::{TorrentDescriptor, TorrentFile, TorrentSpec, Trackers};
pub use piece::PiecePolicy;
pub use registry::HashRegistry;
pub use scanner::{ContentScanner, ScanResult};
