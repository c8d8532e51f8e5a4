//! Hash algorithm identifiers and the incremental hashers used by the scanner.

mod ed2k;
pub(crate) mod io;
mod pieces;

pub use ed2k::Ed2kHasher;
pub use pieces::PieceHasher;

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Hash algorithms a registry can hold.
///
/// Only [`HashAlgorithm::SCANNED`] are computed from file content; the rest are
/// stored as imported. `Other` keeps tags this crate does not know about.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
    /// eDonkey2000 hash (MD4, chunked above 9,728,000 bytes)
    Ed2k,
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    Rmd160,
    Tiger,
    Crc32,
    /// BitTorrent info-hash
    Btih,
    /// eMule Advanced Intelligent Corruption Handling root hash
    Aich,
    Other(String),
}

impl HashAlgorithm {
    /// Algorithms computed by a content scan, in report order.
    pub const SCANNED: [HashAlgorithm; 4] = [
        HashAlgorithm::Ed2k,
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
    ];

    /// Every algorithm with a fixed identifier.
    pub const KNOWN: [HashAlgorithm; 11] = [
        HashAlgorithm::Ed2k,
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Rmd160,
        HashAlgorithm::Tiger,
        HashAlgorithm::Crc32,
        HashAlgorithm::Btih,
        HashAlgorithm::Aich,
    ];

    pub fn id(&self) -> &str {
        match self {
            HashAlgorithm::Ed2k => "ed2k",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Rmd160 => "rmd160",
            HashAlgorithm::Tiger => "tiger",
            HashAlgorithm::Crc32 => "crc32",
            HashAlgorithm::Btih => "btih",
            HashAlgorithm::Aich => "aich",
            HashAlgorithm::Other(name) => name,
        }
    }

    /// Length of the hex digest, where the algorithm fixes one.
    pub fn hex_len(&self) -> Option<usize> {
        match self {
            HashAlgorithm::Ed2k | HashAlgorithm::Md5 | HashAlgorithm::Aich => Some(32),
            HashAlgorithm::Sha1 | HashAlgorithm::Rmd160 | HashAlgorithm::Btih => Some(40),
            HashAlgorithm::Sha256 => Some(64),
            HashAlgorithm::Sha384 => Some(96),
            HashAlgorithm::Sha512 => Some(128),
            HashAlgorithm::Tiger => Some(48),
            HashAlgorithm::Crc32 => Some(8),
            HashAlgorithm::Other(_) => None,
        }
    }

    /// The conventional filesystem checksum for an unlabeled digest of this length.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            32 => Some(HashAlgorithm::Md5),
            40 => Some(HashAlgorithm::Sha1),
            64 => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }

    /// Whether `hex` is a plausible digest for this algorithm.
    pub fn accepts(&self, hex: &str) -> bool {
        let is_hex = !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit());
        match self.hex_len() {
            Some(len) => is_hex && hex.len() == len,
            None => is_hex,
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_id(s))
    }
}

impl HashAlgorithm {
    /// Parse an identifier; unknown names become [`HashAlgorithm::Other`].
    pub fn from_id(s: &str) -> Self {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "ed2k" | "md4" | "edonkey" => HashAlgorithm::Ed2k,
            "md5" => HashAlgorithm::Md5,
            "sha1" | "sha-1" => HashAlgorithm::Sha1,
            "sha256" | "sha-256" => HashAlgorithm::Sha256,
            "sha384" | "sha-384" => HashAlgorithm::Sha384,
            "sha512" | "sha-512" => HashAlgorithm::Sha512,
            "rmd160" | "ripemd160" => HashAlgorithm::Rmd160,
            "tiger" => HashAlgorithm::Tiger,
            "crc32" => HashAlgorithm::Crc32,
            "btih" => HashAlgorithm::Btih,
            "aich" => HashAlgorithm::Aich,
            _ => HashAlgorithm::Other(lower),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.id())
    }
}

impl Serialize for HashAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}
