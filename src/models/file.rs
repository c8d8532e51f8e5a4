use serde::Serialize;

/// A file listed in a torrent's info dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TorrentFile {
    /// Path inside the torrent, components joined with `/`. For multi-file
    /// torrents the first component is the torrent name.
    pub path: String,
    /// File size in bytes
    pub length: u64,
}

impl TorrentFile {
    pub fn new(path: impl Into<String>, length: u64) -> Self {
        Self {
            path: path.into(),
            length,
        }
    }
}
