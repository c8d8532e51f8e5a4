use serde::Serialize;
use sha1::{Digest, Sha1};
use std::path::Path;
use tracing::warn;

use super::file::TorrentFile;
use crate::bencode::{self, Value};
use crate::builder::{CreatedTorrent, TorrentBuilder};
use crate::error::{FormatError, Result};

/// Length of one SHA-1 piece digest in the `pieces` byte string
const PIECE_HASH_LEN: usize = 20;

/// Tracker URLs for a new torrent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trackers {
    /// A single tier
    Flat(Vec<String>),
    /// Tiers in priority order
    Tiers(Vec<Vec<String>>),
}

impl Default for Trackers {
    fn default() -> Self {
        Trackers::Tiers(Vec::new())
    }
}

impl Trackers {
    /// Build tiers from command-line style values: each value is one tier and
    /// commas inside it separate the trackers of that tier.
    pub fn from_tier_strings<S: AsRef<str>>(values: &[S]) -> Self {
        Trackers::Tiers(
            values
                .iter()
                .map(|tier| {
                    tier.as_ref()
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .collect(),
        )
    }

    pub fn tiers(&self) -> Vec<Vec<String>> {
        match self {
            Trackers::Flat(list) if list.is_empty() => Vec::new(),
            Trackers::Flat(list) => vec![list.clone()],
            Trackers::Tiers(tiers) => tiers.clone(),
        }
    }

    /// Number of tracker URLs across all tiers
    pub fn count(&self) -> usize {
        match self {
            Trackers::Flat(list) => list.len(),
            Trackers::Tiers(tiers) => tiers.iter().map(Vec::len).sum(),
        }
    }
}

impl From<Vec<Vec<String>>> for Trackers {
    fn from(tiers: Vec<Vec<String>>) -> Self {
        Trackers::Tiers(tiers)
    }
}

/// Everything needed to create a single-file torrent
#[derive(Debug, Clone, Default)]
pub struct TorrentSpec {
    pub files: Vec<TorrentFile>,
    /// Bytes per piece; must be positive
    pub piece_length: i64,
    /// Hex SHA-1 digest of each piece
    pub pieces: Vec<String>,
    pub trackers: Trackers,
    pub comment: Option<String>,
    pub created_by: Option<String>,
}

/// What a `.torrent` file says about its content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TorrentDescriptor {
    pub announce: Option<String>,
    pub announce_list: Vec<Vec<String>>,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    /// Unix timestamp
    pub creation_date: Option<i64>,
    pub files: Vec<TorrentFile>,
    pub piece_length: u64,
    /// Lowercase hex SHA-1 per piece, only filled for single-file torrents
    pub pieces: Vec<String>,
    /// Uppercase hex SHA-1 of the info dictionary exactly as it appeared in the input
    pub info_hash: String,
    /// Problems that did not prevent parsing
    pub warnings: Vec<String>,
}

impl TorrentDescriptor {
    /// Read and parse a `.torrent` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parse bencoded torrent metadata.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let decoded = bencode::decode(data)?;
        let root = &decoded.value;
        if root.as_dict().is_none() {
            return Err(FormatError::InvalidField("torrent").into());
        }

        let info = root.get(b"info").ok_or(FormatError::MissingField("info"))?;
        if info.as_dict().is_none() {
            return Err(FormatError::InvalidField("info").into());
        }
        let info_bytes = decoded
            .info_span
            .and_then(|span| data.get(span))
            .ok_or(FormatError::MissingField("info"))?;
        let info_hash = hex::encode_upper(Sha1::digest(info_bytes));

        let name = text(info.get(b"name"))
            .ok_or(FormatError::MissingField("name"))?
            .trim()
            .to_string();
        let piece_length = info
            .get(b"piece length")
            .ok_or(FormatError::MissingField("piece length"))?
            .as_integer()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or(FormatError::InvalidField("piece length"))?;
        let raw_pieces = info
            .get(b"pieces")
            .ok_or(FormatError::MissingField("pieces"))?
            .as_bytes()
            .ok_or(FormatError::InvalidField("pieces"))?;

        let mut files = Vec::new();
        if let Some(length) = info.get(b"length") {
            let length = length
                .as_integer()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or(FormatError::InvalidField("length"))?;
            files.push(TorrentFile::new(name.clone(), length));
        }
        if let Some(entries) = info.get(b"files") {
            let entries = entries
                .as_list()
                .ok_or(FormatError::InvalidField("files"))?;
            files.extend(entries.iter().filter_map(|entry| file_entry(&name, entry)));
        }

        let mut descriptor = TorrentDescriptor {
            announce: text(root.get(b"announce")),
            announce_list: announce_list(root.get(b"announce-list")),
            comment: text(root.get(b"comment")),
            created_by: text(root.get(b"created by")),
            creation_date: root.get(b"creation date").and_then(Value::as_integer),
            files,
            piece_length,
            info_hash,
            ..Default::default()
        };

        if descriptor.files.len() == 1 {
            if raw_pieces.len() % PIECE_HASH_LEN == 0 {
                descriptor.pieces = raw_pieces
                    .chunks_exact(PIECE_HASH_LEN)
                    .map(hex::encode)
                    .collect();
            } else {
                let message = format!(
                    "pieces length {} is not a multiple of {}, ignoring piece hashes",
                    raw_pieces.len(),
                    PIECE_HASH_LEN
                );
                warn!("{}", message);
                descriptor.warnings.push(message);
            }
        }

        Ok(descriptor)
    }

    /// Validate `spec` and encode it as a torrent. See [`TorrentBuilder`].
    pub fn create(spec: &TorrentSpec) -> Result<CreatedTorrent> {
        TorrentBuilder::new(spec.clone()).build()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.length).sum()
    }

    pub fn is_single_file(&self) -> bool {
        self.files.len() == 1
    }

    /// Every tracker URL, tiers flattened, `announce` first.
    pub fn trackers(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.announce.as_deref().into_iter().collect();
        for url in self.announce_list.iter().flatten() {
            if !urls.contains(&url.as_str()) {
                urls.push(url);
            }
        }
        urls
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_bytes)
        .map(|b| String::from_utf8_lossy(b).into_owned())
}

fn announce_list(value: Option<&Value>) -> Vec<Vec<String>> {
    let Some(tiers) = value.and_then(Value::as_list) else {
        return Vec::new();
    };
    tiers
        .iter()
        .filter_map(Value::as_list)
        .map(|tier| tier.iter().filter_map(|url| text(Some(url))).collect::<Vec<_>>())
        .filter(|tier| !tier.is_empty())
        .collect()
}

/// A multi-file entry; entries without a length or path are skipped.
fn file_entry(name: &str, entry: &Value) -> Option<TorrentFile> {
    let length = entry
        .get(b"length")?
        .as_integer()
        .and_then(|n| u64::try_from(n).ok())?;
    let components = entry.get(b"path")?.as_list()?;
    let mut path = vec![name.to_string()];
    for component in components {
        path.push(text(Some(component))?);
    }
    Some(TorrentFile::new(path.join("/"), length))
}
