//! Artifact checksum verification (SHA-256, SHA-1, MD5) as an
//! `ArtifactResolverPostProcessor`.

use std::sync::Arc;

use async_trait::async_trait;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use resolver_model::collaborators::{ArtifactResolverPostProcessor, Transport};
use resolver_util::errors::ResolverError;

/// Verifies a downloaded artifact against the `.sha256`/`.sha1`/`.md5`
/// sidecar published next to it, trying the strongest algorithm first.
pub struct ChecksumPostProcessor {
    transport: Arc<dyn Transport>,
}

impl ChecksumPostProcessor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn fetch_sidecar(&self, url: &str) -> Option<String> {
        let tmp = tempfile::NamedTempFile::new().ok()?;
        let resp = self.transport.get(url, tmp.path(), 0).await.ok()?;
        Some(String::from_utf8_lossy(&resp.bytes).to_string())
    }
}

#[async_trait]
impl ArtifactResolverPostProcessor for ChecksumPostProcessor {
    async fn process(&self, source_url: &str, data: &[u8]) -> Result<(), ResolverError> {
        if let Some(expected) = self.fetch_sidecar(&format!("{source_url}.sha256")).await {
            return check(&hex_sha256(data), &extract_hash(&expected), "SHA-256", source_url);
        }
        if let Some(expected) = self.fetch_sidecar(&format!("{source_url}.sha1")).await {
            return check(&hex_sha1(data), &extract_hash(&expected), "SHA-1", source_url);
        }
        if let Some(expected) = self.fetch_sidecar(&format!("{source_url}.md5")).await {
            return check(&hex_md5(data), &extract_hash(&expected), "MD5", source_url);
        }

        warn!(%source_url, "no checksum sidecar found");
        Ok(())
    }
}

fn check(actual: &str, expected: &str, algo: &str, url: &str) -> Result<(), ResolverError> {
    if actual.eq_ignore_ascii_case(expected) {
        debug!(%algo, %url, "checksum ok");
        Ok(())
    } else {
        Err(ResolverError::kinded(
            resolver_util::errors::ErrorKind::ChecksumMismatch,
            format!("{algo} mismatch for {url}: expected {expected}, got {actual}"),
        ))
    }
}

/// Maven checksum files may contain just the hash, or `hash  filename`.
fn extract_hash(content: &str) -> String {
    content.split_whitespace().next().unwrap_or("").to_string()
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hex_sha1(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hex_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_hash_simple() {
        assert_eq!(extract_hash("abc123\n"), "abc123");
    }

    #[test]
    fn extract_hash_with_filename() {
        assert_eq!(extract_hash("abc123  my-lib-1.0.jar\n"), "abc123");
    }

    #[test]
    fn sha256_computation() {
        let hash = hex_sha256(b"hello world");
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn md5_computation() {
        let hash = hex_md5(b"hello world");
        assert_eq!(hash, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn checksum_match_succeeds() {
        assert!(check("ABC123", "abc123", "SHA-256", "http://x").is_ok());
    }

    #[test]
    fn checksum_mismatch_fails() {
        assert!(check("abc123", "def456", "SHA-256", "http://x").is_err());
    }
}
