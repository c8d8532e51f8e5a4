use md4::{Digest, Md4};

use super::pieces::PieceHasher;
use crate::config::ED2K_PIECE_LENGTH;

/// Incremental eDonkey2000 hash.
///
/// Content up to one ed2k chunk (9,728,000 bytes) hashes to its plain MD4.
/// Anything larger hashes to the MD4 of the concatenated per-chunk MD4 digests.
/// Which form applies is fixed by the declared total size.
pub enum Ed2kHasher {
    Single(Md4),
    Chunked(PieceHasher<Md4>),
}

impl Ed2kHasher {
    pub fn new(total_size: u64) -> Self {
        Self::with_chunk_length(total_size, ED2K_PIECE_LENGTH)
    }

    pub(crate) fn with_chunk_length(total_size: u64, chunk_length: u64) -> Self {
        if total_size <= chunk_length {
            Ed2kHasher::Single(Md4::new())
        } else {
            Ed2kHasher::Chunked(PieceHasher::new(chunk_length))
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Ed2kHasher::Single(md4) => md4.update(data),
            Ed2kHasher::Chunked(chunks) => chunks.update(data),
        }
    }

    /// Lowercase hex digest.
    pub fn finish_hex(self) -> String {
        let digest = match self {
            Ed2kHasher::Single(md4) => md4.finalize(),
            Ed2kHasher::Chunked(chunks) => {
                let mut outer = Md4::new();
                for chunk in chunks.finish() {
                    outer.update(chunk);
                }
                outer.finalize()
            }
        };
        hex::encode(digest)
    }
}
