//! ed2k and magnet links derived from registry contents.

use crate::hashing::HashAlgorithm;
use crate::registry::HashRegistry;

/// `ed2k://|file|<name>|<size>|<ED2K>|[h=<AICH>|]/`, if an ed2k hash is known
/// and the file has a name and a non-zero size.
pub fn ed2k_link(name: &str, size: u64, hashes: &HashRegistry) -> Option<String> {
    let ed2k = hashes.get(&HashAlgorithm::Ed2k)?;
    let name = base_name(name);
    if name.is_empty() || size == 0 {
        return None;
    }
    let aich = hashes
        .get(&HashAlgorithm::Aich)
        .map(|h| format!("h={}|", h.to_uppercase()))
        .unwrap_or_default();
    Some(format!(
        "ed2k://|file|{}|{}|{}|{}/",
        urlencoding::encode(name),
        size,
        ed2k.to_uppercase(),
        aich
    ))
}

/// Magnet links for the file: one carrying name, size and the sha1/ed2k URNs,
/// and a second one with the BitTorrent info-hash when that is known.
pub fn magnet_links(name: &str, size: u64, hashes: &HashRegistry) -> Vec<String> {
    let mut params = Vec::new();
    let name = base_name(name);
    if !name.is_empty() {
        params.push(format!("dn={}", urlencoding::encode(name)));
    }
    if size > 0 {
        params.push(format!("xl={}", size));
    }
    if let Some(sha1) = hashes.get(&HashAlgorithm::Sha1) {
        params.push(format!("xt=urn:sha1:{}", sha1.to_uppercase()));
    }
    if let Some(ed2k) = hashes.get(&HashAlgorithm::Ed2k) {
        params.push(format!("xt=urn:ed2k:{}", ed2k.to_lowercase()));
    }

    let mut links = Vec::new();
    if !params.is_empty() {
        links.push(format!("magnet:?{}", params.join("&")));
    }
    if let Some(btih) = hashes.get(&HashAlgorithm::Btih) {
        links.push(format!("magnet:?xt=urn:btih:{}", btih.to_uppercase()));
    }
    links
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED2K: &str = "1bee69a46ba811185c194762abaeae90";

    fn registry() -> HashRegistry {
        let mut hashes = HashRegistry::for_file("my file.iso");
        hashes.set(HashAlgorithm::Ed2k, ED2K);
        hashes.set(HashAlgorithm::Sha1, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        hashes
    }

    #[test]
    fn test_ed2k_link() {
        let mut hashes = registry();
        assert_eq!(
            ed2k_link("dir/my file.iso", 1000, &hashes).as_deref(),
            Some("ed2k://|file|my%20file.iso|1000|1BEE69A46BA811185C194762ABAEAE90|/")
        );

        hashes.set(HashAlgorithm::Aich, "abcdefabcdefabcdefabcdefabcdefab");
        let link = ed2k_link("my file.iso", 1000, &hashes).unwrap();
        assert!(link.ends_with("|h=ABCDEFABCDEFABCDEFABCDEFABCDEFAB|/"));

        assert!(ed2k_link("my file.iso", 0, &hashes).is_none());
        assert!(ed2k_link("my file.iso", 10, &HashRegistry::new()).is_none());
    }

    #[test]
    fn test_magnet_links() {
        let mut hashes = registry();
        let links = magnet_links("my file.iso", 1000, &hashes);
        assert_eq!(
            links,
            vec![format!(
                "magnet:?dn=my%20file.iso&xl=1000&xt=urn:sha1:DA39A3EE5E6B4B0D3255BFEF95601890AFD80709&xt=urn:ed2k:{}",
                ED2K
            )]
        );

        hashes.set(HashAlgorithm::Btih, "0123456789abcdef0123456789abcdef01234567");
        let links = magnet_links("", 0, &hashes);
        assert_eq!(links.len(), 2);
        assert!(!links[0].contains("dn="));
        assert_eq!(
            links[1],
            "magnet:?xt=urn:btih:0123456789ABCDEF0123456789ABCDEF01234567"
        );
    }

    #[test]
    fn test_no_links_without_data() {
        assert!(magnet_links("", 0, &HashRegistry::new()).is_empty());
    }
}
