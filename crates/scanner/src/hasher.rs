use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Computes a collision-resistant digest of a file's content.
#[async_trait::async_trait]
pub trait ContentHasher: Send + Sync {
    async fn hash(&self, path: &Path) -> io::Result<String>;
}

/// Hex-encoded SHA-256 of the whole file, read on a blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

#[async_trait::async_trait]
impl ContentHasher for Sha256Hasher {
    async fn hash(&self, path: &Path) -> io::Result<String> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || hash_file(&path))
            .await
            .map_err(io::Error::other)?
    }
}

fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
