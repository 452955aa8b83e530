//! The upload/replace/cleanup lifecycle keeping each entity at no more than
//! one live media asset, independent of the backing store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::warn;

use crate::domain::media::{MediaAsset, UploadValidationError, validate_image};

#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("media store i/o failure: {0}")]
    Io(String),
    #[error("invalid stored media reference")]
    InvalidReference,
}

/// Backing store seam. Local disk deletes by path; a remote asset service
/// would delete by the handle it returned from `store`.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(
        &self,
        original_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<MediaAsset, MediaStoreError>;

    async fn delete(&self, asset: &MediaAsset) -> Result<(), MediaStoreError>;
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Validation(#[from] UploadValidationError),
    #[error(transparent)]
    Store(#[from] MediaStoreError),
}

/// An inbound binary plus its declared metadata, as read from a multipart
/// field.
#[derive(Debug, Clone)]
pub struct InboundImage {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// What an update request asked to do with the entity's image.
#[derive(Debug, Clone, Default)]
pub enum ImageChange {
    /// No new binary and no explicit clear: leave the reference untouched.
    #[default]
    Keep,
    /// The caller explicitly blanked the reference.
    Clear,
    /// A new binary replaces whatever is there.
    Replace(InboundImage),
}

pub struct MediaService {
    store: Arc<dyn MediaStore>,
}

impl MediaService {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    /// Validate and store an inbound binary for a new entity. If persisting
    /// the entity afterwards fails, the stored binary is an accepted orphan —
    /// inert until referenced, so cleanup stays best-effort.
    pub async fn ingest(&self, image: InboundImage) -> Result<MediaAsset, MediaError> {
        validate_image(&image.content_type, image.data.len())?;
        let asset = self
            .store
            .store(&image.filename, &image.content_type, image.data)
            .await?;
        Ok(asset)
    }

    /// Apply an [`ImageChange`] against the entity's current asset and return
    /// the reference to persist.
    ///
    /// New binaries are stored before the old asset is touched, so a failure
    /// leaves the current reference intact. Deleting the old asset is
    /// best-effort: a failure is logged and never blocks the update, which is
    /// how the "exactly one live reference" guarantee survives a misbehaving
    /// store.
    pub async fn apply_change(
        &self,
        current: Option<&MediaAsset>,
        change: ImageChange,
    ) -> Result<Option<MediaAsset>, MediaError> {
        match change {
            ImageChange::Keep => Ok(current.cloned()),
            ImageChange::Clear => {
                if let Some(previous) = current {
                    self.discard(previous).await;
                }
                Ok(None)
            }
            ImageChange::Replace(image) => {
                let asset = self.ingest(image).await?;
                if let Some(previous) = current {
                    self.discard(previous).await;
                }
                Ok(Some(asset))
            }
        }
    }

    /// Best-effort deletion, used for replacements and entity deletion.
    pub async fn discard(&self, asset: &MediaAsset) {
        if let Err(err) = self.store.delete(asset).await {
            warn!(url = %asset.url, error = %err, "failed to delete media asset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store that can be told to fail deletions.
    struct FlakyStore {
        stored: Mutex<Vec<String>>,
        delete_fails: bool,
        deletes_attempted: AtomicUsize,
    }

    impl FlakyStore {
        fn new(delete_fails: bool) -> Self {
            Self {
                stored: Mutex::new(Vec::new()),
                delete_fails,
                deletes_attempted: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MediaStore for FlakyStore {
        async fn store(
            &self,
            original_name: &str,
            _content_type: &str,
            _data: Bytes,
        ) -> Result<MediaAsset, MediaStoreError> {
            let url = format!("/uploads/{original_name}");
            self.stored.lock().unwrap().push(url.clone());
            Ok(MediaAsset {
                url,
                deletion_handle: None,
            })
        }

        async fn delete(&self, asset: &MediaAsset) -> Result<(), MediaStoreError> {
            self.deletes_attempted.fetch_add(1, Ordering::SeqCst);
            if self.delete_fails {
                return Err(MediaStoreError::Io("permission denied".into()));
            }
            self.stored.lock().unwrap().retain(|url| url != &asset.url);
            Ok(())
        }
    }

    fn png(name: &str) -> InboundImage {
        InboundImage {
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from_static(b"\x89PNG fake"),
        }
    }

    #[tokio::test]
    async fn ingest_rejects_disallowed_type_before_storing() {
        let store = Arc::new(FlakyStore::new(false));
        let service = MediaService::new(store.clone());

        let mut upload = png("cv.pdf");
        upload.content_type = "application/pdf".into();
        let err = service.ingest(upload).await.expect_err("must reject");
        assert!(matches!(err, MediaError::Validation(_)));
        assert!(store.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_swaps_to_exactly_one_reference() {
        let store = Arc::new(FlakyStore::new(false));
        let service = MediaService::new(store.clone());

        let first = service.ingest(png("one.png")).await.expect("stored");
        let second = service
            .apply_change(Some(&first), ImageChange::Replace(png("two.png")))
            .await
            .expect("replaced")
            .expect("asset present");

        assert_eq!(second.url, "/uploads/two.png");
        let live = store.stored.lock().unwrap();
        assert_eq!(live.as_slice(), ["/uploads/two.png"]);
    }

    #[tokio::test]
    async fn replace_survives_failing_delete_of_old_asset() {
        let store = Arc::new(FlakyStore::new(true));
        let service = MediaService::new(store.clone());

        let first = service.ingest(png("one.png")).await.expect("stored");
        let second = service
            .apply_change(Some(&first), ImageChange::Replace(png("two.png")))
            .await
            .expect("update must not fail")
            .expect("asset present");

        // The new reference wins even though the old binary lingers.
        assert_eq!(second.url, "/uploads/two.png");
        assert_eq!(store.deletes_attempted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_deletes_and_blanks_the_reference() {
        let store = Arc::new(FlakyStore::new(false));
        let service = MediaService::new(store.clone());

        let asset = service.ingest(png("one.png")).await.expect("stored");
        let result = service
            .apply_change(Some(&asset), ImageChange::Clear)
            .await
            .expect("cleared");

        assert!(result.is_none());
        assert!(store.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn keep_leaves_reference_untouched() {
        let store = Arc::new(FlakyStore::new(false));
        let service = MediaService::new(store.clone());

        let asset = service.ingest(png("one.png")).await.expect("stored");
        let result = service
            .apply_change(Some(&asset), ImageChange::Keep)
            .await
            .expect("kept");

        assert_eq!(result.as_ref(), Some(&asset));
        assert_eq!(store.deletes_attempted.load(Ordering::SeqCst), 0);
    }
}
