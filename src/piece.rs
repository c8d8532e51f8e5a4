use serde::Deserialize;

use crate::config::{DEFAULT_CHUNK_SIZE_KIB, DEFAULT_MAX_PIECES, MIN_PIECE_LENGTH};

/// Controls how verification pieces are sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PiecePolicy {
    /// Double the piece length until the file fits in this many pieces
    pub max_pieces: u64,
    /// Never use pieces smaller than this many KiB
    pub chunk_size_kib: u64,
}

impl Default for PiecePolicy {
    fn default() -> Self {
        Self {
            max_pieces: DEFAULT_MAX_PIECES,
            chunk_size_kib: DEFAULT_CHUNK_SIZE_KIB,
        }
    }
}

impl PiecePolicy {
    pub fn min_piece_bytes(&self) -> u64 {
        self.chunk_size_kib.saturating_mul(1024)
    }
}

/// Calculate the verification piece length for a file of `total_size` bytes.
///
/// Starts at 1 KiB and doubles while there would be more than `max_pieces`
/// pieces or the piece is below the policy minimum.
pub fn calculate_piece_length(total_size: u64, policy: &PiecePolicy) -> u64 {
    let min_len = policy.min_piece_bytes();
    let mut piece_length = MIN_PIECE_LENGTH;
    while total_size / piece_length > policy.max_pieces || piece_length < min_len {
        match piece_length.checked_mul(2) {
            Some(next) => piece_length = next,
            None => break,
        }
    }
    piece_length
}

/// Whether piece hashing is worth doing at all: fewer than two whole pieces
/// collapses to no piece list.
pub fn uses_pieces(total_size: u64, piece_length: u64) -> bool {
    total_size / piece_length >= 2
}

/// Calculate the number of pieces for a given total size and piece length
pub fn calculate_num_pieces(total_size: u64, piece_length: u64) -> u64 {
    total_size.div_ceil(piece_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1_048_576;

    #[test]
    fn test_calculate_piece_length() {
        let policy = PiecePolicy::default();

        // Small files are held at the minimum
        assert_eq!(calculate_piece_length(0, &policy), 262144);
        assert_eq!(calculate_piece_length(MB, &policy), 262144);
        assert_eq!(calculate_piece_length(20 * MB, &policy), 262144);

        // 255 * 256 KiB is the last size that fits
        assert_eq!(calculate_piece_length(255 * 262144 + 262143, &policy), 262144);
        assert_eq!(calculate_piece_length(256 * 262144, &policy), 524288);

        assert_eq!(calculate_piece_length(1024 * MB, &policy), 8 * MB);
    }

    #[test]
    fn test_calculate_piece_length_custom_policy() {
        let policy = PiecePolicy {
            max_pieces: 10,
            chunk_size_kib: 1,
        };
        assert_eq!(calculate_piece_length(5 * 1024, &policy), 1024);
        assert_eq!(calculate_piece_length(11 * 1024, &policy), 2048);
        assert_eq!(calculate_piece_length(100 * 1024, &policy), 16384);
    }

    #[test]
    fn test_uses_pieces() {
        assert!(!uses_pieces(0, 1024));
        assert!(!uses_pieces(1024, 1024));
        assert!(!uses_pieces(2047, 1024));
        assert!(uses_pieces(2048, 1024));
    }

    #[test]
    fn test_calculate_num_pieces() {
        assert_eq!(calculate_num_pieces(0, 1024), 0);
        assert_eq!(calculate_num_pieces(100, 100), 1);
        assert_eq!(calculate_num_pieces(101, 100), 2);
        assert_eq!(calculate_num_pieces(1024, 1024), 1);
        assert_eq!(calculate_num_pieces(2048, 1024), 2);
        assert_eq!(calculate_num_pieces(2049, 1024), 3);
    }
}
