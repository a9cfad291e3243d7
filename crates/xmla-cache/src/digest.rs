//! Content digests for cache keys and session ids.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// SHA-256 of `request`, as lowercase hex.
///
/// Used as the cache key when `DIGEST_KEYS` is enabled, and handy for
/// logging a request without dumping it.
pub fn request_digest(request: &[u8]) -> String {
    hex(&Sha256::digest(request))
}

/// Stable id for a configuration: identical property maps give identical
/// ids regardless of iteration order.
pub fn session_id(
    connection: &HashMap<String, String>,
    cache: &HashMap<String, String>,
) -> String {
    let mut hasher = Sha256::new();
    for (section, props) in [("connection", connection), ("cache", cache)] {
        let mut entries: Vec<(&String, &String)> = props.iter().collect();
        entries.sort();
        hasher.update(section.as_bytes());
        hasher.update([0u8]);
        for (key, value) in entries {
            hasher.update(key.as_bytes());
            hasher.update([b'=']);
            hasher.update(value.as_bytes());
            hasher.update([0u8]);
        }
    }
    hex(&hasher.finalize())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_digest_known_value() {
        assert_eq!(
            request_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_session_id_ignores_order() {
        let a = HashMap::from([
            ("Catalog".to_string(), "FoodMart".to_string()),
            ("Url".to_string(), "http://x".to_string()),
        ]);
        let mut b = HashMap::new();
        b.insert("Url".to_string(), "http://x".to_string());
        b.insert("Catalog".to_string(), "FoodMart".to_string());
        assert_eq!(session_id(&a, &HashMap::new()), session_id(&b, &HashMap::new()));
    }

    #[test]
    fn test_session_id_separates_sections() {
        let props = HashMap::from([("PLAY".to_string(), "true".to_string())]);
        assert_ne!(
            session_id(&props, &HashMap::new()),
            session_id(&HashMap::new(), &props)
        );
        assert_eq!(session_id(&HashMap::new(), &props).len(), 64);
    }
}
