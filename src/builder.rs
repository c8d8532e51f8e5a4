use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::bencode::{self, Value};
use crate::config::MIN_TRACKER_LENGTH;
use crate::error::{Result, ValidationError};
use crate::hashing::HashAlgorithm;
use crate::models::TorrentSpec;

/// Shorter `comment`/`created by` values are left out of the torrent.
const MIN_TEXT_FIELD_LENGTH: usize = 3;

/// A freshly encoded torrent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTorrent {
    /// Canonical bencode of the whole metainfo
    pub bytes: Vec<u8>,
    /// Uppercase hex SHA-1 of the encoded info dictionary
    pub info_hash: String,
}

/// Builder for single-file torrent metainfo from already computed piece hashes
pub struct TorrentBuilder {
    spec: TorrentSpec,
    creation_date: Option<i64>,
}

impl TorrentBuilder {
    /// Create a new TorrentBuilder
    pub fn new(spec: TorrentSpec) -> Self {
        Self {
            spec,
            creation_date: None,
        }
    }

    /// Use a fixed creation date instead of the current time
    pub fn with_creation_date(mut self, timestamp: i64) -> Self {
        self.creation_date = Some(timestamp);
        self
    }

    /// Every reason this [`TorrentSpec`] cannot be turned into a torrent.
    pub fn validate(&self) -> Vec<String> {
        let spec = &self.spec;
        let mut errors = Vec::new();

        match spec.files.as_slice() {
            [] => errors.push("files: exactly one file is required, none given".to_string()),
            [file] => {
                if file.path.trim().is_empty() {
                    errors.push("files: file name must not be empty".to_string());
                }
                if i64::try_from(file.length).is_err() {
                    errors.push(format!(
                        "files: length {} does not fit in a bencode integer",
                        file.length
                    ));
                }
            }
            files => errors.push(format!(
                "files: only single-file torrents can be created, {} given",
                files.len()
            )),
        }

        if spec.piece_length <= 0 {
            errors.push(format!(
                "piece length: must be a positive number, got {}",
                spec.piece_length
            ));
        }

        if spec.pieces.is_empty() {
            errors.push("pieces: must be a non-empty list".to_string());
        } else if let Some(i) = spec
            .pieces
            .iter()
            .position(|p| !HashAlgorithm::Sha1.accepts(p))
        {
            errors.push(format!(
                "pieces: entry {} is not a 40-character hex SHA-1 digest",
                i
            ));
        }

        let tiers = spec.trackers.tiers();
        if tiers.is_empty() {
            errors.push("trackers: list of trackers must not be empty".to_string());
        } else if tiers.iter().any(Vec::is_empty) {
            errors.push("trackers: tracker tiers must not be empty".to_string());
        } else if let Some(url) = tiers
            .iter()
            .flatten()
            .find(|url| url.len() < MIN_TRACKER_LENGTH)
        {
            errors.push(format!(
                "trackers: {:?} is not a tracker URL (at least {} characters)",
                url, MIN_TRACKER_LENGTH
            ));
        }

        errors
    }

    /// Validate and encode. All problems are reported together.
    pub fn build(self) -> Result<CreatedTorrent> {
        let reasons = self.validate();
        if !reasons.is_empty() {
            return Err(ValidationError { reasons }.into());
        }

        let info = self.info_dict()?;
        let info_hash = hex::encode_upper(Sha1::digest(bencode::encode(&info)?));

        let tiers = self.spec.trackers.tiers();
        let mut root = Value::dict().with("info", info);
        if let Some(announce) = tiers.first().and_then(|tier| tier.first()) {
            root = root.with("announce", announce.as_str());
        }
        if self.spec.trackers.count() > 1 {
            let list: Vec<Value> = tiers
                .iter()
                .map(|tier| Value::List(tier.iter().map(|url| Value::string(url)).collect()))
                .collect();
            root = root.with("announce-list", list);
        }
        if let Some(comment) = text_field(&self.spec.comment) {
            root = root.with("comment", comment);
        }
        if let Some(created_by) = text_field(&self.spec.created_by) {
            root = root.with("created by", created_by);
        }

        let creation_date = self.creation_date.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or_default()
        });
        root = root.with("creation date", creation_date);

        let bytes = bencode::encode(&root)?;
        debug!(
            "Built torrent of {} bytes, info-hash {}",
            bytes.len(),
            info_hash
        );
        Ok(CreatedTorrent { bytes, info_hash })
    }

    fn info_dict(&self) -> Result<Value> {
        // validate() has ensured exactly one file and well-formed pieces
        let Some(file) = self.spec.files.first() else {
            return Err(ValidationError {
                reasons: vec!["files: exactly one file is required, none given".to_string()],
            }
            .into());
        };
        let name = Path::new(file.path.trim())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.path.trim().to_string());

        let mut pieces = Vec::with_capacity(self.spec.pieces.len() * 20);
        for piece in &self.spec.pieces {
            pieces.extend(hex::decode(piece).map_err(|e| ValidationError {
                reasons: vec![format!("pieces: {}", e)],
            })?);
        }

        let length = i64::try_from(file.length).map_err(|_| ValidationError {
            reasons: vec![format!(
                "files: length {} does not fit in a bencode integer",
                file.length
            )],
        })?;

        let mut info = BTreeMap::new();
        info.insert(b"name".to_vec(), Value::string(&name));
        info.insert(b"length".to_vec(), Value::Integer(length));
        info.insert(
            b"piece length".to_vec(),
            Value::Integer(self.spec.piece_length),
        );
        info.insert(b"pieces".to_vec(), Value::Bytes(pieces));
        Ok(Value::Dict(info))
    }
}

fn text_field(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|s| s.trim().len() >= MIN_TEXT_FIELD_LENGTH)
}

/// Write `bytes` to `path`. An existing file is only replaced when `overwrite`
/// is set; otherwise the torrent goes to `<path>.new`. Returns the path written.
pub fn write_torrent(path: &Path, bytes: &[u8], overwrite: bool) -> std::io::Result<PathBuf> {
    let target = if path.exists() && !overwrite {
        let mut name = path.as_os_str().to_owned();
        name.push(".new");
        PathBuf::from(name)
    } else {
        path.to_path_buf()
    };
    std::fs::write(&target, bytes)?;
    debug!("Wrote {}", target.display());
    Ok(target)
}
