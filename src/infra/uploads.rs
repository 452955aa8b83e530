//! Filesystem-backed media storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use slug::slugify;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::application::media::{MediaStore, MediaStoreError};
use crate::domain::media::MediaAsset;

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Stores binaries under a local root and serves them by relative path.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
    public_prefix: String,
}

impl UploadStorage {
    /// Initialise storage rooted at `root`, creating it if necessary. Stored
    /// files become addressable under `public_prefix` (e.g. `/uploads`).
    pub fn new(root: PathBuf, public_prefix: &str) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// Write the payload under a dated, collision-resistant name and return
    /// its relative stored path plus a content checksum.
    pub async fn write(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<(String, String), UploadStorageError> {
        let stored_path = self.build_stored_path(original_name);
        let absolute = self.resolve(&stored_path)?;

        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&absolute, data).await?;
        let checksum = hex::encode(Sha256::digest(data));

        Ok((stored_path, checksum))
    }

    /// Read a stored payload back into memory.
    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove a stored payload. Missing files are treated as success so
    /// deletion stays idempotent.
    pub async fn remove(&self, stored_path: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        match fs::remove_file(&absolute).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    pub fn public_url(&self, stored_path: &str) -> String {
        format!("{}/{stored_path}", self.public_prefix)
    }

    /// Map a public URL back to the relative stored path, if it is ours.
    pub fn stored_path_for(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_prefix)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .filter(|path| !path.is_empty())
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }

    fn build_stored_path(&self, original_name: &str) -> String {
        let (year, month, day) = time::OffsetDateTime::now_utc().to_calendar_date();
        let directory = format!("{year}/{:02}/{:02}", month as u8, day);
        let identifier = Uuid::new_v4();
        let filename = sanitize_filename(original_name);
        format!("{directory}/{identifier}-{filename}")
    }
}

/// The local-disk [`MediaStore`]: no deletion handle, deletes by the path
/// embedded in the public URL.
#[async_trait]
impl MediaStore for UploadStorage {
    async fn store(
        &self,
        original_name: &str,
        _content_type: &str,
        data: Bytes,
    ) -> Result<MediaAsset, MediaStoreError> {
        let (stored_path, _checksum) = self
            .write(original_name, &data)
            .await
            .map_err(|err| MediaStoreError::Io(err.to_string()))?;

        Ok(MediaAsset {
            url: self.public_url(&stored_path),
            deletion_handle: None,
        })
    }

    async fn delete(&self, asset: &MediaAsset) -> Result<(), MediaStoreError> {
        let stored_path = self
            .stored_path_for(&asset.url)
            .ok_or(MediaStoreError::InvalidReference)?;
        self.remove(&stored_path)
            .await
            .map_err(|err| MediaStoreError::Io(err.to_string()))
    }
}

fn sanitize_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, UploadStorage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf(), "/uploads").expect("storage");
        (dir, storage)
    }

    #[tokio::test]
    async fn write_read_remove_roundtrip() {
        let (_dir, storage) = storage();

        let (stored_path, checksum) = storage.write("Héro Image.PNG", b"payload").await.unwrap();
        assert!(stored_path.ends_with(".png"));
        assert_eq!(checksum.len(), 64);

        let data = storage.read(&stored_path).await.unwrap();
        assert_eq!(&data[..], b"payload");

        storage.remove(&stored_path).await.unwrap();
        // Removing again is a no-op, not an error.
        storage.remove(&stored_path).await.unwrap();
        assert!(storage.read(&stored_path).await.is_err());
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let (_dir, storage) = storage();
        assert!(matches!(
            storage.read("../escape").await,
            Err(UploadStorageError::InvalidPath)
        ));
        assert!(matches!(
            storage.read("/etc/passwd").await,
            Err(UploadStorageError::InvalidPath)
        ));
    }

    #[tokio::test]
    async fn media_store_urls_map_back_to_stored_paths() {
        let (_dir, storage) = storage();
        let asset = MediaStore::store(
            &storage,
            "logo.png",
            "image/png",
            Bytes::from_static(b"data"),
        )
        .await
        .unwrap();

        assert!(asset.url.starts_with("/uploads/"));
        assert!(asset.deletion_handle.is_none());

        let stored_path = storage.stored_path_for(&asset.url).unwrap();
        assert_eq!(&storage.read(&stored_path).await.unwrap()[..], b"data");

        MediaStore::delete(&storage, &asset).await.unwrap();
        assert!(storage.read(&stored_path).await.is_err());
    }

    #[test]
    fn foreign_urls_do_not_resolve() {
        let (_dir, storage) = storage();
        assert!(storage.stored_path_for("https://cdn.example.com/x.png").is_none());
        assert!(storage.stored_path_for("/uploads").is_none());
    }
}
