//! Blob storage for uploaded document files.
//!
//! Document rows only carry metadata; the bytes are written through a
//! [`StorageBackend`] under a UUIDv7-derived path:
//!
//! ```text
//! documents/{first-2-hex}/{next-2-hex}/{uuid}.bin
//! ```
//!
//! Writes are atomic (temp file + rename) so a crashed upload never leaves a
//! half-written blob at a path a document row points to.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use notegraph_core::defaults::MAX_FILENAME_LEN;
use notegraph_core::{Error, Result, StoredFile};

/// Storage backend trait for different storage implementations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified path. Missing paths are not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if data exists at the specified path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Filesystem storage backend rooted at `base_path`.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        // Storage paths are generated server side; anything climbing out of the
        // base directory is a bug or a tampered row.
        if path.is_empty() || path.starts_with('/') || path.split('/').any(|c| c == "..") {
            return Err(Error::Storage(format!("invalid storage path: {}", path)));
        }
        Ok(self.base_path.join(path))
    }

    /// Round-trip a probe file so filesystem problems surface at startup.
    pub async fn validate(&self) -> Result<()> {
        let probe = "documents/.health-check/probe.bin";
        self.write(probe, b"storage-health-check").await?;
        let data = self.read(probe).await?;
        if data != b"storage-health-check" {
            return Err(Error::Storage("read-back mismatch".to_string()));
        }
        self.delete(probe).await?;
        let _ = fs::remove_dir(self.base_path.join("documents/.health-check")).await;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path)?;
        debug!(
            subsystem = "storage",
            storage_path = %path,
            size = data.len(),
            "file_storage: write"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "file_storage: create_dir_all failed");
                e
            })?;
        }

        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "file_storage: rename failed");
            e
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path)?;
        Ok(fs::read(full_path).await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path)?;
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path)?;
        Ok(fs::try_exists(full_path).await?)
    }
}

/// Compute BLAKE3 hash of data with "blake3:" prefix.
pub fn compute_content_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("blake3:{}", hash.to_hex())
}

/// Generate storage path from UUID.
///
/// Example: `documents/01/94/01948f7e-8b2a-7c3d-9e4f-5a6b7c8d9e0f.bin`
pub fn generate_storage_path(uuid: &Uuid) -> String {
    let hex = uuid.simple().to_string();
    format!(
        "documents/{}/{}/{}.bin",
        &hex[0..2],
        &hex[2..4],
        uuid.as_hyphenated()
    )
}

/// Reduce a client-supplied filename to a safe display name.
///
/// Strips any directory components, replaces control and path characters,
/// and truncates to [`MAX_FILENAME_LEN`] characters. Returns `"upload"` when
/// nothing usable is left.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            c if c.is_control() => '_',
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .take(MAX_FILENAME_LEN)
        .collect();
    let trimmed = cleaned.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write an uploaded file to the backend and describe where it went.
pub async fn store_upload(
    backend: &dyn StorageBackend,
    file_name: &str,
    data: &[u8],
) -> Result<StoredFile> {
    let storage_path = generate_storage_path(&Uuid::now_v7());
    backend.write(&storage_path, data).await?;
    Ok(StoredFile {
        file_name: sanitize_filename(file_name),
        storage_path,
        size_bytes: data.len() as i64,
        content_hash: compute_content_hash(data),
    })
}
