use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::ops::ControlFlow;
use std::path::Path;
use tracing::debug;

use crate::config::BLOCK_SIZE;
use crate::error::{Error, Result};
use crate::hashing::io::read_block;
use crate::hashing::{Ed2kHasher, HashAlgorithm, PieceHasher};
use crate::piece::{PiecePolicy, calculate_piece_length, uses_pieces};

/// Everything one pass over a file produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub filename: Option<String>,
    pub size: u64,
    /// Lowercase hex digests of the whole file
    pub digests: BTreeMap<HashAlgorithm, String>,
    pub piece_length: u64,
    /// Lowercase hex SHA-1 of each verification piece; empty when the file
    /// would have fewer than two pieces
    pub pieces: Vec<String>,
}

impl ScanResult {
    pub fn get(&self, alg: &HashAlgorithm) -> Option<&str> {
        self.digests.get(alg).map(String::as_str)
    }
}

/// Streams a file once and computes ed2k, MD5, SHA-1, SHA-256 and SHA-1
/// verification pieces from the same blocks.
///
/// Digests passed in through [`with_known`](Self::with_known) are not
/// recomputed. The scanner keeps no state between calls.
#[derive(Debug, Clone)]
pub struct ContentScanner {
    policy: PiecePolicy,
    use_pieces: bool,
    known: BTreeMap<HashAlgorithm, String>,
    known_pieces: Option<(u64, Vec<String>)>,
}

/// Per-scan accumulators; an algorithm that is already known has `None`.
struct Accumulators {
    ed2k: Option<Ed2kHasher>,
    md5: Option<Md5>,
    sha1: Option<Sha1>,
    sha256: Option<Sha256>,
    pieces: Option<PieceHasher>,
}

impl Accumulators {
    fn update(&mut self, block: &[u8]) {
        if let Some(h) = &mut self.ed2k {
            h.update(block);
        }
        if let Some(h) = &mut self.md5 {
            h.update(block);
        }
        if let Some(h) = &mut self.sha1 {
            h.update(block);
        }
        if let Some(h) = &mut self.sha256 {
            h.update(block);
        }
        if let Some(h) = &mut self.pieces {
            h.update(block);
        }
    }

    fn finish(self, digests: &mut BTreeMap<HashAlgorithm, String>) -> Option<Vec<String>> {
        if let Some(h) = self.ed2k {
            digests.insert(HashAlgorithm::Ed2k, h.finish_hex());
        }
        if let Some(h) = self.md5 {
            digests.insert(HashAlgorithm::Md5, hex::encode(h.finalize()));
        }
        if let Some(h) = self.sha1 {
            digests.insert(HashAlgorithm::Sha1, hex::encode(h.finalize()));
        }
        if let Some(h) = self.sha256 {
            digests.insert(HashAlgorithm::Sha256, hex::encode(h.finalize()));
        }
        self.pieces.map(PieceHasher::finish_hex)
    }
}

impl Default for ContentScanner {
    fn default() -> Self {
        Self::new(PiecePolicy::default())
    }
}

impl ContentScanner {
    pub fn new(policy: PiecePolicy) -> Self {
        Self {
            policy,
            use_pieces: true,
            known: BTreeMap::new(),
            known_pieces: None,
        }
    }

    /// Enable or disable verification piece hashing
    pub fn with_pieces(mut self, use_pieces: bool) -> Self {
        self.use_pieces = use_pieces;
        self
    }

    /// Digests obtained elsewhere; only the scanned algorithms are kept.
    pub fn with_known(mut self, known: &BTreeMap<HashAlgorithm, String>) -> Self {
        self.known = known
            .iter()
            .filter(|(alg, hex)| HashAlgorithm::SCANNED.contains(alg) && !hex.is_empty())
            .map(|(alg, hex)| (alg.clone(), hex.clone()))
            .collect();
        self
    }

    /// A piece list obtained elsewhere; piece hashing is skipped when non-empty.
    pub fn with_known_pieces(mut self, piece_length: u64, pieces: Vec<String>) -> Self {
        self.known_pieces = (!pieces.is_empty()).then_some((piece_length, pieces));
        self
    }

    pub fn policy(&self) -> &PiecePolicy {
        &self.policy
    }

    /// Scan `path` without progress reporting.
    pub fn scan(&self, path: &Path) -> Result<ScanResult> {
        self.scan_with_progress(path, |_| ControlFlow::Continue(()))
    }

    /// Scan `path`, reporting percent complete to `on_progress` at most about
    /// a hundred times. Returning `ControlFlow::Break` aborts with
    /// [`Error::Cancelled`].
    pub fn scan_with_progress<F>(&self, path: &Path, on_progress: F) -> Result<ScanResult>
    where
        F: FnMut(u32) -> ControlFlow<()>,
    {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let mut result = self.scan_reader(file, size, on_progress)?;
        result.filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(result)
    }

    /// Scan `size` bytes from `reader`.
    pub fn scan_reader<R, F>(&self, mut reader: R, size: u64, mut on_progress: F) -> Result<ScanResult>
    where
        R: Read,
        F: FnMut(u32) -> ControlFlow<()>,
    {
        let mut result = ScanResult {
            size,
            digests: self.known.clone(),
            ..ScanResult::default()
        };

        let piece_length = calculate_piece_length(size, &self.policy);
        let hash_pieces =
            self.use_pieces && self.known_pieces.is_none() && uses_pieces(size, piece_length);
        let all_known = HashAlgorithm::SCANNED
            .iter()
            .all(|alg| self.known.contains_key(alg));
        if all_known && !hash_pieces {
            debug!("All hashes already known, skipping scan");
            match &self.known_pieces {
                Some((known_length, known)) => {
                    result.piece_length = *known_length;
                    result.pieces = known.clone();
                }
                None => result.piece_length = piece_length,
            }
            return Ok(result);
        }

        debug!(
            "Using piece length {} ({} KiB), piece hashing {}",
            piece_length,
            piece_length / 1024,
            if hash_pieces { "on" } else { "off" }
        );

        let wanted = |alg: HashAlgorithm| !self.known.contains_key(&alg);
        let mut acc = Accumulators {
            ed2k: wanted(HashAlgorithm::Ed2k).then(|| Ed2kHasher::new(size)),
            md5: wanted(HashAlgorithm::Md5).then(Md5::new),
            sha1: wanted(HashAlgorithm::Sha1).then(Sha1::new),
            sha256: wanted(HashAlgorithm::Sha256).then(Sha256::new),
            pieces: hash_pieces.then(|| PieceHasher::new(piece_length)),
        };

        let total_blocks = size.div_ceil(BLOCK_SIZE as u64);
        let blocks_per_step = total_blocks.div_ceil(100);
        let mut blocks_left = blocks_per_step;
        let mut percent = 0u32;

        let mut buffer = vec![0u8; BLOCK_SIZE];
        let mut read = 0u64;
        loop {
            let n = read_block(&mut reader, &mut buffer)?;
            if n == 0 {
                break;
            }
            read += n as u64;
            if read > size {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("content is longer than the expected {} bytes", size),
                )
                .into());
            }

            if blocks_per_step > 0 {
                blocks_left = blocks_left.saturating_sub(1);
                if blocks_left == 0 {
                    blocks_left = blocks_per_step;
                    percent = (percent + 1).min(100);
                    if on_progress(percent).is_break() {
                        debug!("Scan cancelled at {}%", percent);
                        return Err(Error::Cancelled);
                    }
                }
            }

            acc.update(&buffer[..n]);
        }

        if read < size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("content ended after {} of {} bytes", read, size),
            )
            .into());
        }

        match acc.finish(&mut result.digests) {
            Some(pieces) => {
                result.piece_length = piece_length;
                if pieces.len() >= 2 {
                    result.pieces = pieces;
                }
                debug!("Total number of pieces: {}", result.pieces.len());
            }
            None => match &self.known_pieces {
                Some((known_length, known)) => {
                    result.piece_length = *known_length;
                    result.pieces = known.clone();
                }
                None => result.piece_length = piece_length,
            },
        }

        let _ = on_progress(100);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scan_bytes(scanner: &ContentScanner, data: &[u8]) -> Result<ScanResult> {
        scanner.scan_reader(Cursor::new(data), data.len() as u64, |_| {
            ControlFlow::Continue(())
        })
    }

    #[test]
    fn test_empty_content() {
        let result = scan_bytes(&ContentScanner::default(), b"").unwrap();
        assert_eq!(
            result.get(&HashAlgorithm::Md5),
            Some("d41d8cd98f00b204e9800998ecf8427e")
        );
        assert_eq!(
            result.get(&HashAlgorithm::Sha1),
            Some("da39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
        assert_eq!(
            result.get(&HashAlgorithm::Sha256),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        assert_eq!(
            result.get(&HashAlgorithm::Ed2k),
            Some("31d6cfe0d16ae931b73c59d7e0c089c0")
        );
        assert!(result.pieces.is_empty());
    }

    #[test]
    fn test_pieces_with_small_policy() {
        let policy = PiecePolicy {
            max_pieces: 255,
            chunk_size_kib: 1,
        };
        let data: Vec<u8> = (0..5000u32).map(|i| (i * 7) as u8).collect();
        let result = scan_bytes(&ContentScanner::new(policy), &data).unwrap();

        assert_eq!(result.piece_length, 1024);
        assert_eq!(result.pieces.len(), 5);
        assert_eq!(result.pieces[4], hex::encode(Sha1::digest(&data[4096..])));
    }

    #[test]
    fn test_single_piece_collapses() {
        let policy = PiecePolicy {
            max_pieces: 255,
            chunk_size_kib: 1,
        };
        // 1.5 pieces: fewer than two whole pieces disables piece mode
        let data = vec![1u8; 1536];
        let result = scan_bytes(&ContentScanner::new(policy), &data).unwrap();
        assert!(result.pieces.is_empty());
        assert!(result.get(&HashAlgorithm::Sha1).is_some());
    }

    #[test]
    fn test_pieces_disabled() {
        let policy = PiecePolicy {
            max_pieces: 255,
            chunk_size_kib: 1,
        };
        let data = vec![1u8; 8192];
        let scanner = ContentScanner::new(policy).with_pieces(false);
        assert!(scan_bytes(&scanner, &data).unwrap().pieces.is_empty());
    }

    #[test]
    fn test_known_digests_are_kept() {
        let mut known = BTreeMap::new();
        known.insert(HashAlgorithm::Md5, "00000000000000000000000000000000".to_string());
        known.insert(HashAlgorithm::Btih, "ignored".to_string());

        let scanner = ContentScanner::default().with_known(&known);
        let result = scan_bytes(&scanner, b"abc").unwrap();
        assert_eq!(
            result.get(&HashAlgorithm::Md5),
            Some("00000000000000000000000000000000")
        );
        assert_eq!(
            result.get(&HashAlgorithm::Sha1),
            Some("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
        assert_eq!(result.get(&HashAlgorithm::Btih), None);
    }

    #[test]
    fn test_everything_known_is_noop() {
        let known: BTreeMap<_, _> = HashAlgorithm::SCANNED
            .into_iter()
            .map(|alg| (alg, "ab".to_string()))
            .collect();
        let scanner = ContentScanner::default()
            .with_known(&known)
            .with_known_pieces(1024, vec!["p0".into(), "p1".into()]);

        let mut called = false;
        let result = scanner
            .scan_reader(Cursor::new(vec![0u8; 10]), 10, |_| {
                called = true;
                ControlFlow::Continue(())
            })
            .unwrap();
        assert!(!called);
        assert_eq!(result.pieces, vec!["p0", "p1"]);
        assert_eq!(result.piece_length, 1024);
        assert_eq!(result.digests, known);
    }

    #[test]
    fn test_everything_known_without_pieces_skips_reading() {
        let known: BTreeMap<_, _> = HashAlgorithm::SCANNED
            .into_iter()
            .map(|alg| (alg, "ab".to_string()))
            .collect();
        let scanner = ContentScanner::default()
            .with_known(&known)
            .with_pieces(false);

        let mut called = false;
        let result = scanner
            .scan_reader(Cursor::new(vec![0u8; 8192]), 8192, |_| {
                called = true;
                ControlFlow::Continue(())
            })
            .unwrap();
        assert!(!called);
        assert!(result.pieces.is_empty());
        assert_eq!(result.digests, known);
    }

    #[test]
    fn test_short_content_is_an_error() {
        let result = ContentScanner::default().scan_reader(
            Cursor::new(vec![1u8; 100]),
            20_000_000,
            |_| ControlFlow::Continue(()),
        );
        match result {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected an EOF error, got {:?}", other),
        }
    }

    #[test]
    fn test_long_content_is_an_error() {
        let result = ContentScanner::default().scan_reader(
            Cursor::new(vec![1u8; BLOCK_SIZE * 3]),
            100,
            |_| ControlFlow::Continue(()),
        );
        match result {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("expected an InvalidData error, got {:?}", other),
        }
    }

    #[test]
    fn test_ed2k_small_content_is_plain_md4() {
        use md4::Md4;
        let data = vec![1u8; 100];
        let result = scan_bytes(&ContentScanner::default(), &data).unwrap();
        assert_eq!(
            result.get(&HashAlgorithm::Ed2k),
            Some(hex::encode(Md4::digest(&data)).as_str())
        );
    }

    #[test]
    fn test_progress_is_batched() {
        let data = vec![0u8; BLOCK_SIZE * 250];
        let mut calls = Vec::new();
        ContentScanner::default()
            .scan_reader(Cursor::new(&data), data.len() as u64, |p| {
                calls.push(p);
                ControlFlow::Continue(())
            })
            .unwrap();

        // 250 blocks in steps of 3, then the final 100
        assert_eq!(calls.len(), 84);
        assert!(calls.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(calls.last(), Some(&100));
    }

    #[test]
    fn test_cancel() {
        let data = vec![0u8; BLOCK_SIZE * 10];
        let result = ContentScanner::default().scan_reader(
            Cursor::new(&data),
            data.len() as u64,
            |p| {
                if p >= 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        );
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
