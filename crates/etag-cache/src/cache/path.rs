//! Cache key and artifact path computation.

use std::fmt;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Stable identifier for one URL's cache artifacts.
///
/// The key is the lowercase hex SHA-256 of the URL's UTF-8 bytes, so it is the
/// same across processes and machines and depends on nothing but the URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Compute the cache key for a URL.
    pub fn for_url(url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        CacheKey(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the validator (ETag) record under `cache_dir`.
    ///
    /// Layout: `{cache_dir}/etag_{key}.txt`
    pub fn validator_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(format!("etag_{}.txt", self.0))
    }

    /// Path of the body record under `cache_dir`.
    ///
    /// Layout: `{cache_dir}/data_{key}.json`
    pub fn body_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(format!("data_{}.json", self.0))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_sha256_of_url() {
        // SHA256 of "hello"
        let key = CacheKey::for_url("hello");
        assert_eq!(
            key.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = CacheKey::for_url("https://example.test/a");
        let b = CacheKey::for_url("https://example.test/a");
        let c = CacheKey::for_url("https://example.test/b");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_artifact_paths() {
        let key = CacheKey::for_url("hello");
        let dir = PathBuf::from("/cache");

        assert_eq!(
            key.validator_path(&dir),
            PathBuf::from(
                "/cache/etag_2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824.txt"
            )
        );
        assert_eq!(
            key.body_path(&dir),
            PathBuf::from(
                "/cache/data_2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824.json"
            )
        );
    }

    #[test]
    fn test_display_matches_as_str() {
        let key = CacheKey::for_url("https://example.test/a");
        assert_eq!(key.to_string(), key.as_str());
    }
}
