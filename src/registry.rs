//! Reconciled hash values for one or more files.
//!
//! A registry collects digests from content scans, checksum files and torrent
//! metadata. Values only ever fill gaps: whatever arrived first for a given
//! file and algorithm stays, unless a caller explicitly asks to overwrite.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::warn;

use crate::error::Result;
use crate::hashing::HashAlgorithm;
use crate::models::TorrentDescriptor;
use crate::scanner::{ContentScanner, ScanResult};
use crate::sumfile::{parse_lines, strip_sum_extension};

/// Key for values set before any file name is known.
const UNNAMED: &str = "";

#[derive(Debug, Clone, Default)]
pub struct HashRegistry {
    current: Option<String>,
    files: BTreeMap<String, BTreeMap<HashAlgorithm, String>>,
    piece_length: u64,
    piece_type: Option<HashAlgorithm>,
    pieces: Vec<String>,
    warnings: Vec<String>,
}

impl HashRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose current file is `name`.
    pub fn for_file(name: &str) -> Self {
        let mut registry = Self::new();
        registry.set_file(name);
        registry
    }

    /// Select the file that `has`/`get`/`set` refer to.
    ///
    /// Directory components and checksum-file extensions are dropped, so both
    /// `dl/foo.iso` and `foo.iso.sha1` select `foo.iso`. Values stored before a
    /// name was set move to the new name without overwriting anything there.
    /// Returns `false` for a blank name.
    pub fn set_file(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let base = Path::new(name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        let base = strip_sum_extension(&base).to_string();

        if let Some(unnamed) = self.files.remove(UNNAMED) {
            let entry = self.files.entry(base.clone()).or_default();
            for (alg, hex) in unnamed {
                entry.entry(alg).or_insert(hex);
            }
        }
        self.current = Some(base);
        true
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Names of every file with at least one digest.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .filter(|(_, hashes)| !hashes.is_empty())
            .map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.files.values().all(BTreeMap::is_empty) && self.pieces.is_empty()
    }

    /// Whether the current file has a non-empty digest for `alg`.
    ///
    /// With no current file this only holds if exactly one file has one.
    pub fn has(&self, alg: &HashAlgorithm) -> bool {
        self.get(alg).is_some()
    }

    pub fn get(&self, alg: &HashAlgorithm) -> Option<&str> {
        match &self.current {
            Some(name) => self.get_file(name, alg),
            None => {
                let mut found = self
                    .files
                    .values()
                    .filter_map(|hashes| hashes.get(alg))
                    .map(|hex| hex.trim())
                    .filter(|hex| !hex.is_empty());
                let first = found.next()?;
                found.next().is_none().then_some(first)
            }
        }
    }

    /// The digest stored for a specific file.
    pub fn get_file(&self, name: &str, alg: &HashAlgorithm) -> Option<&str> {
        self.files
            .get(name)?
            .get(alg)
            .map(|hex| hex.trim())
            .filter(|hex| !hex.is_empty())
    }

    /// Every non-empty digest stored for `name`.
    pub fn file_hashes<'a>(&'a self, name: &str) -> impl Iterator<Item = (&'a HashAlgorithm, &'a str)> {
        self.files
            .get(name)
            .into_iter()
            .flatten()
            .map(|(alg, hex)| (alg, hex.as_str()))
            .filter(|(_, hex)| !hex.is_empty())
    }

    /// Every digest visible for the current file.
    pub fn get_all(&self) -> BTreeMap<HashAlgorithm, String> {
        let mut algs: Vec<&HashAlgorithm> = self.files.values().flat_map(|h| h.keys()).collect();
        algs.sort();
        algs.dedup();
        algs.into_iter()
            .filter_map(|alg| self.get(alg).map(|hex| (alg.clone(), hex.to_string())))
            .collect()
    }

    /// Store `hex` for the current file, replacing any previous value.
    pub fn set(&mut self, alg: HashAlgorithm, hex: impl Into<String>) {
        let key = self.current.clone().unwrap_or_else(|| UNNAMED.to_string());
        self.set_file_hash(&key, alg, hex);
    }

    fn set_file_hash(&mut self, name: &str, alg: HashAlgorithm, hex: impl Into<String>) {
        let hex = hex.into().trim().to_string();
        self.files.entry(name.to_string()).or_default().insert(alg, hex);
    }

    /// Drop `alg` for the current file, or for every file when none is selected.
    pub fn remove(&mut self, alg: &HashAlgorithm) {
        match &self.current {
            Some(name) => {
                if let Some(hashes) = self.files.get_mut(name) {
                    hashes.remove(alg);
                }
            }
            None => {
                for hashes in self.files.values_mut() {
                    hashes.remove(alg);
                }
            }
        }
    }

    /// Move all digests of `old` to `new`. Values already under `new` win.
    pub fn rename_file(&mut self, old: &str, new: &str) {
        if let Some(hashes) = self.files.remove(old) {
            let entry = self.files.entry(new.to_string()).or_default();
            for (alg, hex) in hashes {
                entry.entry(alg).or_insert(hex);
            }
        }
        if self.current.as_deref() == Some(old) {
            self.current = Some(new.to_string());
        }
    }

    pub fn pieces(&self) -> &[String] {
        &self.pieces
    }

    pub fn piece_length(&self) -> u64 {
        self.piece_length
    }

    /// Algorithm of the piece digests (SHA-1 unless set otherwise).
    pub fn piece_type(&self) -> HashAlgorithm {
        self.piece_type.clone().unwrap_or(HashAlgorithm::Sha1)
    }

    pub fn set_pieces(&mut self, piece_length: u64, piece_type: HashAlgorithm, pieces: Vec<String>) {
        self.piece_length = piece_length;
        self.piece_type = Some(piece_type);
        self.pieces = pieces;
    }

    /// Copy into `self` every digest of `other`'s current file that `self` lacks,
    /// or every digest when `overwrite` is set. The piece list follows the same
    /// rule. Returns the number of digests copied.
    pub fn merge(&mut self, other: &HashRegistry, overwrite: bool) -> usize {
        let mut copied = 0;
        for (alg, hex) in other.get_all() {
            if overwrite || !self.has(&alg) {
                self.set(alg, hex);
                copied += 1;
            }
        }
        if !other.pieces.is_empty() && (overwrite || self.pieces.is_empty()) {
            self.set_pieces(other.piece_length, other.piece_type(), other.pieces.clone());
        }
        copied
    }

    /// Fill gaps from a content scan. Adopts the scanned file name when no
    /// file is selected yet.
    pub fn apply_scan(&mut self, result: ScanResult) {
        if self.current.is_none() {
            if let Some(name) = &result.filename {
                self.set_file(name);
            }
        }
        for (alg, hex) in result.digests {
            if !self.has(&alg) {
                self.set(alg, hex);
            }
        }
        if self.pieces.is_empty() && !result.pieces.is_empty() {
            self.set_pieces(result.piece_length, HashAlgorithm::Sha1, result.pieces);
        }
    }

    /// Scan `path` with everything already known passed to the scanner, then
    /// record the outcome. On cancellation the registry is left untouched.
    pub fn scan_file<F>(&mut self, path: &Path, scanner: ContentScanner, on_progress: F) -> Result<()>
    where
        F: FnMut(u32) -> ControlFlow<()>,
    {
        if self.current.is_none() {
            if let Some(name) = path.file_name() {
                self.set_file(&name.to_string_lossy());
            }
        }
        let scanner = scanner
            .with_known(&self.get_all())
            .with_known_pieces(self.piece_length, self.pieces.clone());
        let result = scanner.scan_with_progress(path, on_progress)?;
        self.apply_scan(result);
        Ok(())
    }

    /// Record what a torrent says about its content: the info-hash as `btih`
    /// and, for single-file torrents, the piece list.
    pub fn import_torrent(&mut self, torrent: &TorrentDescriptor) {
        if self.current.is_none() {
            if let Some(file) = torrent.files.first() {
                self.set_file(&file.path);
            }
        }
        if !self.has(&HashAlgorithm::Btih) {
            self.set(HashAlgorithm::Btih, torrent.info_hash.clone());
        }
        if self.pieces.is_empty() && !torrent.pieces.is_empty() {
            self.set_pieces(torrent.piece_length, HashAlgorithm::Sha1, torrent.pieces.clone());
        }
    }

    /// Import the lines of a checksum file and return how many were stored.
    ///
    /// A `?TAG` on a line decides the algorithm; otherwise `force` does, and
    /// failing that the digest length (32 md5, 40 sha1, 64 sha256). With `force`
    /// set, lines tagged for another algorithm are ignored. With `filter_name`,
    /// only lines for exactly that name are imported. Lines whose digest length
    /// does not fit the algorithm are skipped and reported as warnings.
    pub fn parse_sum_file(
        &mut self,
        text: &str,
        force: Option<&HashAlgorithm>,
        filter_name: Option<&str>,
    ) -> usize {
        let mut count = 0;
        for line in parse_lines(text) {
            if filter_name.is_some_and(|f| f != line.name) {
                continue;
            }

            let alg = match (&line.tag, force) {
                (Some(tag), Some(forced)) if tag != forced => continue,
                (Some(tag), _) => tag.clone(),
                (None, Some(forced)) => forced.clone(),
                (None, None) => match HashAlgorithm::from_hex_len(line.digest.len()) {
                    Some(alg) => alg,
                    None => {
                        self.warn(format!(
                            "Unrecognised {}-character digest: {}",
                            line.digest.len(),
                            line.line
                        ));
                        continue;
                    }
                },
            };

            if let Some(expected) = alg.hex_len() {
                if line.digest.len() != expected {
                    self.warn(format!(
                        "Invalid {} hash (expected {} characters, found {}): {}",
                        alg.id().to_uppercase(),
                        expected,
                        line.digest.len(),
                        line.line
                    ));
                    continue;
                }
            }

            self.set_file_hash(&line.name, alg, line.digest);
            count += 1;
        }
        count
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Warnings collected since the last call.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Reasons why stored values are not well-formed digests.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, hashes) in &self.files {
            for (alg, hex) in hashes {
                if !alg.accepts(hex) {
                    let file = if name.is_empty() { "<unnamed>" } else { name };
                    errors.push(format!("Invalid {} hash for {}: {}", alg, file, hex));
                }
            }
        }
        let piece_type = self.piece_type();
        if let Some(i) = self.pieces.iter().position(|p| !piece_type.accepts(p)) {
            errors.push(format!("Invalid {} piece hash at index {}", piece_type, i));
        }
        if !self.pieces.is_empty() && self.piece_length == 0 {
            errors.push("Piece hashes present without a piece length".to_string());
        }
        errors
    }
}
