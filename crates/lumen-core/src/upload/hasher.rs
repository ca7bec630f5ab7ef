use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::hash::Hasher as _;
use std::io::Read;
use std::path::Path;
use twox_hash::XxHash64;

use crate::error::Error;

/// Files are folded into the hash accumulator in fixed-size chunks so memory
/// use stays O(chunk size) regardless of file size.
pub const CHUNK_SIZE: usize = 4096;

/// Content fingerprint algorithm, resolved once at startup from
/// configuration. XxHash64 is the fast default; SHA-256 is the
/// cryptographic fallback for environments that want a fixed 256-bit
/// fingerprint. Both are deterministic and stable across runs, which is
/// the only correctness requirement for dedup keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Xx64,
    Sha256,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Xx64
    }
}

/// Compute the lowercase hex content fingerprint of a file, streaming in
/// `CHUNK_SIZE` reads.
pub fn hash_file(algo: HashAlgorithm, path: &Path) -> Result<String, Error> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut file = File::open(path)?;
    let mut buffer = [0u8; CHUNK_SIZE];

    match algo {
        HashAlgorithm::Xx64 => {
            let mut hasher = XxHash64::with_seed(0);
            loop {
                let n = file.read(&mut buffer)?;
                if n == 0 {
                    break;
                }
                hasher.write(&buffer[..n]);
            }
            Ok(format!("{:016x}", hasher.finish()))
        }
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let n = file.read(&mut buffer)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buffer[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_same_content_same_hash_across_paths() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a.bin");
        let b = tmp.path().join("b.bin");
        fs::write(&a, b"identical bytes").unwrap();
        fs::write(&b, b"identical bytes").unwrap();

        let ha = hash_file(HashAlgorithm::Xx64, &a).unwrap();
        let hb = hash_file(HashAlgorithm::Xx64, &b).unwrap();
        assert_eq!(ha, hb);
    }

    #[test]
    fn test_different_content_different_hash() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a.bin");
        let b = tmp.path().join("b.bin");
        fs::write(&a, b"content one").unwrap();
        fs::write(&b, b"content two").unwrap();

        assert_ne!(
            hash_file(HashAlgorithm::Xx64, &a).unwrap(),
            hash_file(HashAlgorithm::Xx64, &b).unwrap()
        );
        assert_ne!(
            hash_file(HashAlgorithm::Sha256, &a).unwrap(),
            hash_file(HashAlgorithm::Sha256, &b).unwrap()
        );
    }

    #[test]
    fn test_multi_chunk_file_is_stable() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("large.bin");
        // Spans multiple chunks plus a partial tail
        fs::write(&path, vec![0xABu8; CHUNK_SIZE * 3 + 17]).unwrap();

        let first = hash_file(HashAlgorithm::Xx64, &path).unwrap();
        let second = hash_file(HashAlgorithm::Xx64, &path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 16);
    }

    #[test]
    fn test_sha256_known_vector() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("abc.txt");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            hash_file(HashAlgorithm::Sha256, &path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("nope.bin");
        match hash_file(HashAlgorithm::Xx64, &missing) {
            Err(Error::FileNotFound(p)) => assert_eq!(p, missing),
            other => panic!("Expected FileNotFound, got {:?}", other.map(|_| ())),
        }
    }
}
