use sha2::{Digest, Sha256};

/// Content-identity digest for exact-duplicate detection.
///
/// SHA-256 over `link + "|" + title`, hex-encoded. No salt, no time
/// component: identical (link, title) pairs produce identical fingerprints
/// across process restarts. Hash collisions are treated as true duplicates.
pub fn fingerprint(link: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        let a = fingerprint("https://example.com/story", "Local team wins championship");
        let b = fingerprint("https://example.com/story", "Local team wins championship");
        assert_eq!(a, b);
    }

    #[test]
    fn sixty_four_lowercase_hex_chars() {
        let fp = fingerprint("https://example.com", "A title");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn differs_for_differing_pairs() {
        let base = fingerprint("https://example.com/a", "Title");
        assert_ne!(base, fingerprint("https://example.com/b", "Title"));
        assert_ne!(base, fingerprint("https://example.com/a", "Other title"));
        // The separator keeps (link, title) boundaries unambiguous.
        assert_ne!(
            fingerprint("https://example.com/a|x", "y"),
            fingerprint("https://example.com/a", "x|y")
        );
    }
}
