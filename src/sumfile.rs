//! Checksum list files (`MD5SUMS`, `foo.iso.sha1`, ...).
//!
//! One digest per line: `<hex> [?TAG] [*]<name>`, where the optional tag is one
//! of `AICH`, `BTIH`, `EDONKEY`, `SHA1` or `SHA256`.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::hashing::HashAlgorithm;

static SUM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^([0-9a-f]{32,64})[ \t]+(?:\?(AICH|BTIH|EDONKEY|SHA1|SHA256)[ \t]*)?\*?([^\r\n]+)",
    )
    .expect("sum line pattern is valid")
});

/// Whole-directory checksum lists.
pub const GENERAL_SUM_FILES: [&str; 3] = ["MD5SUMS", "SHA1SUMS", "SHA256SUMS"];

/// Extensions of per-file checksum files, longest first so `.md5sum` wins over `.md5`.
pub const SUM_EXTENSIONS: [&str; 6] = ["md5sum", "sha1sum", "sha256sum", "md5", "sha1", "sha256"];

/// One matched line of a checksum file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumLine {
    pub digest: String,
    /// Algorithm named by a `?TAG`, if present
    pub tag: Option<HashAlgorithm>,
    pub name: String,
    /// The matched text, for diagnostics
    pub line: String,
}

/// Extract every digest line from `text`. Lines that do not match are skipped.
pub fn parse_lines(text: &str) -> Vec<SumLine> {
    SUM_LINE
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(3)?.as_str().trim();
            if name.is_empty() {
                return None;
            }
            Some(SumLine {
                digest: caps.get(1)?.as_str().to_string(),
                tag: caps.get(2).map(|t| HashAlgorithm::from_id(t.as_str())),
                name: name.to_string(),
                line: caps.get(0)?.as_str().trim().to_string(),
            })
        })
        .collect()
}

/// `foo.iso.sha1` → `foo.iso`; other names are returned unchanged.
pub fn strip_sum_extension(name: &str) -> &str {
    let lower = name.to_ascii_lowercase();
    for ext in SUM_EXTENSIONS {
        let suffix = format!(".{}", ext);
        if lower.ends_with(&suffix) && name.len() > suffix.len() {
            return &name[..name.len() - suffix.len()];
        }
    }
    name
}

/// Whether `path` looks like a checksum file by name.
pub fn is_sum_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    GENERAL_SUM_FILES
        .iter()
        .any(|g| name.eq_ignore_ascii_case(g))
        || strip_sum_extension(name).len() != name.len()
}

/// Checksum files that sit next to `target`.
///
/// For a directory only the general lists inside it are considered; for a file
/// the general lists of its directory plus `<name>.md5`, `<name>.sha1sum` etc.
pub fn discover_sum_files(target: &Path) -> Vec<PathBuf> {
    let (dir, name) = if target.is_dir() {
        (target.to_path_buf(), None)
    } else {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        (dir, target.file_name().map(|n| n.to_string_lossy().into_owned()))
    };

    let mut candidates: Vec<PathBuf> = GENERAL_SUM_FILES.iter().map(|g| dir.join(g)).collect();
    if let Some(name) = name {
        for ext in ["md5", "sha1", "sha256"] {
            candidates.push(dir.join(format!("{}.{}", name, ext)));
            candidates.push(dir.join(format!("{}.{}sum", name, ext)));
        }
    }

    candidates.into_iter().filter(|p| p.is_file()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_plain_line() {
        let lines = parse_lines("d41d8cd98f00b204e9800998ecf8427e  empty.txt\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].digest, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(lines[0].tag, None);
        assert_eq!(lines[0].name, "empty.txt");
    }

    #[test]
    fn test_parse_tagged_and_binary_lines() {
        let text = "1234567890abcdef1234567890abcdef ?EDONKEY emule.bin\r\n\
                    da39a3ee5e6b4b0d3255bfef95601890afd80709 *disk image.iso\n\
                    not a checksum line\n";
        let lines = parse_lines(text);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].tag, Some(HashAlgorithm::Ed2k));
        assert_eq!(lines[0].name, "emule.bin");
        assert_eq!(lines[1].tag, None);
        assert_eq!(lines[1].name, "disk image.iso");
    }

    #[test]
    fn test_tag_is_case_insensitive() {
        let lines = parse_lines("1234567890ABCDEF1234567890ABCDEF1234ABCD ?btih file\n");
        assert_eq!(lines[0].tag, Some(HashAlgorithm::Btih));
        assert_eq!(lines[0].digest, "1234567890ABCDEF1234567890ABCDEF1234ABCD");
    }

    #[test]
    fn test_strip_sum_extension() {
        assert_eq!(strip_sum_extension("foo.iso.sha1"), "foo.iso");
        assert_eq!(strip_sum_extension("foo.iso.MD5SUM"), "foo.iso");
        assert_eq!(strip_sum_extension("foo.iso"), "foo.iso");
        assert_eq!(strip_sum_extension(".md5"), ".md5");
    }

    #[test]
    fn test_is_sum_file() {
        assert!(is_sum_file(Path::new("/tmp/SHA256SUMS")));
        assert!(is_sum_file(Path::new("dir/foo.iso.sha256sum")));
        assert!(!is_sum_file(Path::new("foo.iso")));
    }

    #[test]
    fn test_discover_sum_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("foo.iso");
        fs::write(&target, b"data").unwrap();
        fs::write(dir.path().join("MD5SUMS"), b"").unwrap();
        fs::write(dir.path().join("foo.iso.sha1"), b"").unwrap();
        fs::write(dir.path().join("bar.iso.sha1"), b"").unwrap();

        let found = discover_sum_files(&target);
        assert_eq!(found.len(), 2);
        assert!(found.contains(&dir.path().join("MD5SUMS")));
        assert!(found.contains(&dir.path().join("foo.iso.sha1")));

        let found = discover_sum_files(dir.path());
        assert_eq!(found, vec![dir.path().join("MD5SUMS")]);
    }
}
