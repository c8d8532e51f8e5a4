mod file;
mod torrent;

pub use file::TorrentFile;
pub use torrent::{TorrentDescriptor, TorrentSpec, Trackers};
