use md4::{Digest, Md4};
use sha1::Sha1;
use std::fs;
use std::ops::ControlFlow;

use metahash::config::ED2K_PIECE_LENGTH;
use metahash::{ContentScanner, Error, HashAlgorithm, HashRegistry, PiecePolicy};

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn test_default_policy_20_mib() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("data.bin");
    let data = pattern(20 * 1024 * 1024);
    fs::write(&path, &data).unwrap();

    let result = ContentScanner::default().scan(&path).unwrap();

    assert_eq!(result.filename.as_deref(), Some("data.bin"));
    assert_eq!(result.size, 20_971_520);
    assert_eq!(result.piece_length, 262144);
    assert_eq!(result.pieces.len(), 80);
    assert_eq!(
        result.pieces[79],
        hex::encode(Sha1::digest(&data[79 * 262144..]))
    );
    assert_eq!(
        result.get(&HashAlgorithm::Sha1),
        Some(hex::encode(Sha1::digest(&data)).as_str())
    );
}

#[test]
fn test_ed2k_two_level_above_chunk_size() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("big.bin");
    let chunk = ED2K_PIECE_LENGTH as usize;
    let data = pattern(chunk + 1000);
    fs::write(&path, &data).unwrap();

    let result = ContentScanner::default()
        .with_pieces(false)
        .scan(&path)
        .unwrap();

    let mut outer = Md4::new();
    outer.update(Md4::digest(&data[..chunk]));
    outer.update(Md4::digest(&data[chunk..]));
    let expected = hex::encode(outer.finalize());

    assert_eq!(result.get(&HashAlgorithm::Ed2k), Some(expected.as_str()));
    assert_ne!(
        result.get(&HashAlgorithm::Ed2k),
        Some(hex::encode(Md4::digest(&data)).as_str())
    );
    assert!(result.pieces.is_empty());
}

#[test]
fn test_ed2k_at_chunk_size_is_plain_md4() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("exact.bin");
    let data = pattern(ED2K_PIECE_LENGTH as usize);
    fs::write(&path, &data).unwrap();

    let result = ContentScanner::default()
        .with_pieces(false)
        .scan(&path)
        .unwrap();
    assert_eq!(
        result.get(&HashAlgorithm::Ed2k),
        Some(hex::encode(Md4::digest(&data)).as_str())
    );
}

#[test]
fn test_registry_scan_keeps_imported_values() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("file.iso");
    fs::write(&path, b"hello world").unwrap();

    let mut hashes = HashRegistry::new();
    let imported = hashes.parse_sum_file(
        "ffffffffffffffffffffffffffffffff  file.iso\n",
        None,
        Some("file.iso"),
    );
    assert_eq!(imported, 1);
    hashes.set_file("file.iso.md5");

    let policy = PiecePolicy {
        max_pieces: 255,
        chunk_size_kib: 1,
    };
    hashes
        .scan_file(&path, ContentScanner::new(policy), |_| ControlFlow::Continue(()))
        .unwrap();

    // The imported md5 wins over the scanned one
    assert_eq!(
        hashes.get(&HashAlgorithm::Md5),
        Some("ffffffffffffffffffffffffffffffff")
    );
    assert_eq!(
        hashes.get(&HashAlgorithm::Sha1),
        Some("2aae6c35c94fcfb415dbe95f408b9ce91ee846ed")
    );
    assert!(hashes.pieces().is_empty());
}

#[test]
fn test_cancelled_scan_leaves_registry_untouched() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("cancel.bin");
    fs::write(&path, pattern(1024 * 1024)).unwrap();

    let mut hashes = HashRegistry::for_file("cancel.bin");
    let result = hashes.scan_file(&path, ContentScanner::default(), |_| ControlFlow::Break(()));

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(hashes.is_empty());
}

#[test]
fn test_missing_file_is_io_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let result = ContentScanner::default().scan(&tmp_dir.path().join("nope"));
    assert!(matches!(result, Err(Error::Io(_))));
}
