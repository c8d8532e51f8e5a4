use sha1::Sha1;
use sha1::digest::{Digest, Output};

/// Splits a byte stream into fixed-size pieces and hashes each one.
///
/// The last piece may be shorter. Feeding order is the only thing that matters;
/// how the stream is cut into `update` calls does not change the result.
pub struct PieceHasher<D: Digest + Default = Sha1> {
    piece_length: u64,
    current: D,
    filled: u64,
    digests: Vec<Output<D>>,
}

impl<D: Digest + Default> PieceHasher<D> {
    pub fn new(piece_length: u64) -> Self {
        assert!(piece_length > 0, "piece length must be positive");
        Self {
            piece_length,
            current: D::default(),
            filled: 0,
            digests: Vec::new(),
        }
    }

    pub fn piece_length(&self) -> u64 {
        self.piece_length
    }

    /// Number of completed pieces so far.
    pub fn completed(&self) -> usize {
        self.digests.len()
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let room = self.piece_length - self.filled;
            let take = room.min(data.len() as u64) as usize;
            self.current.update(&data[..take]);
            self.filled += take as u64;
            data = &data[take..];

            if self.filled == self.piece_length {
                self.close_piece();
            }
        }
    }

    fn close_piece(&mut self) {
        let digest = std::mem::take(&mut self.current).finalize();
        self.digests.push(digest);
        self.filled = 0;
    }

    /// Closes the trailing short piece, if any, and returns every piece digest.
    pub fn finish(mut self) -> Vec<Output<D>> {
        if self.filled > 0 {
            self.close_piece();
        }
        self.digests
    }

    /// [`finish`](Self::finish), hex-encoded.
    pub fn finish_hex(self) -> Vec<String> {
        self.finish().iter().map(hex::encode).collect()
    }
}
