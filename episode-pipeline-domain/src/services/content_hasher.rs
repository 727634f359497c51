// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Content Hasher
//!
//! Stateless SHA-256 fingerprinting. A domain service rather than an
//! infrastructure port: hashing is pure computation over bytes already in
//! hand, so it lives in the domain and stays synchronous. File reads are
//! the one I/O surface; they go through `std::fs`, keeping checksum
//! calculation off the async runtime.

use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::{ContentHash, PipelineError};

/// Chunk size used while streaming a file through the hasher.
const CHUNK_SIZE: usize = 64 * 1024;

pub trait ContentHasher: Send + Sync {
    fn hash_file(&self, path: &Path) -> Result<ContentHash, PipelineError>;
    fn hash_bytes(&self, bytes: &[u8]) -> ContentHash;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256ContentHasher;

impl ContentHasher for Sha256ContentHasher {
    fn hash_file(&self, path: &Path) -> Result<ContentHash, PipelineError> {
        let mut file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::NotFound(format!("{}: {e}", path.display()))
            } else {
                PipelineError::IoError(format!("{}: {e}", path.display()))
            }
        })?;

        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = file.read(&mut buf).map_err(|e| PipelineError::IoError(format!("{}: {e}", path.display())))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        let digest = hasher.finalize();
        ContentHash::new(hex::encode(digest))
    }

    fn hash_bytes(&self, bytes: &[u8]) -> ContentHash {
        let digest = Sha256::digest(bytes);
        // hex::encode always produces 64 lowercase hex characters for a
        // 32-byte SHA-256 digest, so this cannot fail validation.
        ContentHash::new(hex::encode(digest)).expect("sha256 digest is always a valid content hash")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn hash_bytes_is_deterministic() {
        let hasher = Sha256ContentHasher;
        let a = hasher.hash_bytes(b"hello world");
        let b = hasher.hash_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_bytes_distinguishes_inputs() {
        let hasher = Sha256ContentHasher;
        assert_ne!(hasher.hash_bytes(b"a"), hasher.hash_bytes(b"b"));
    }

    #[test]
    fn hash_file_matches_hash_bytes() {
        let hasher = Sha256ContentHasher;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::File::create(&path).unwrap().write_all(b"episode audio bytes").unwrap();

        assert_eq!(hasher.hash_file(&path).unwrap(), hasher.hash_bytes(b"episode audio bytes"));
    }

    #[test]
    fn hash_file_missing_is_not_found() {
        let hasher = Sha256ContentHasher;
        let err = hasher.hash_file(Path::new("/nonexistent/path/does/not/exist")).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }
}
