//! The image lifecycle through the project service against real disk
//! storage: every entity holds at most one live asset, and replaced or
//! orphaned binaries are cleaned up.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use plinth::application::events::EventBus;
use plinth::application::media::{ImageChange, InboundImage, MediaService};
use plinth::application::projects::{ProjectError, ProjectInput, ProjectService};
use plinth::application::repos::{
    CreateProjectParams, ProjectFilter, ProjectsRepo, RepoError, UpdateProjectParams,
};
use plinth::domain::entities::ProjectRecord;
use plinth::infra::uploads::UploadStorage;

#[derive(Default)]
struct MemoryProjects {
    rows: Mutex<HashMap<Uuid, ProjectRecord>>,
}

#[async_trait]
impl ProjectsRepo for MemoryProjects {
    async fn list_projects(
        &self,
        _filter: &ProjectFilter,
    ) -> Result<Vec<ProjectRecord>, RepoError> {
        Ok(self.rows.lock().await.values().cloned().collect())
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<ProjectRecord>, RepoError> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn create_project(
        &self,
        params: CreateProjectParams,
    ) -> Result<ProjectRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = ProjectRecord {
            id: Uuid::new_v4(),
            title: params.title,
            description: params.description,
            category: params.category,
            tech_stack: params.tech_stack,
            github_url: params.github_url,
            live_url: params.live_url,
            featured: params.featured,
            image: params.image,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_project(
        &self,
        params: UpdateProjectParams,
    ) -> Result<ProjectRecord, RepoError> {
        let mut rows = self.rows.lock().await;
        let record = rows.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        record.title = params.title;
        record.description = params.description;
        record.category = params.category;
        record.tech_stack = params.tech_stack;
        record.github_url = params.github_url;
        record.live_url = params.live_url;
        record.featured = params.featured;
        record.image = params.image;
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows
            .lock()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    storage: Arc<UploadStorage>,
    service: ProjectService,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage =
        Arc::new(UploadStorage::new(dir.path().to_path_buf(), "/uploads").expect("storage"));
    let media = Arc::new(MediaService::new(storage.clone()));
    let service = ProjectService::new(
        Arc::new(MemoryProjects::default()),
        media,
        EventBus::new(),
    );
    Fixture {
        _dir: dir,
        storage,
        service,
    }
}

fn input(title: &str) -> ProjectInput {
    ProjectInput {
        title: title.into(),
        description: "A tiny demo".into(),
        category: "web".into(),
        tech_stack: vec!["rust".into()],
        github_url: None,
        live_url: None,
        featured: false,
    }
}

fn png(name: &str, payload: &'static [u8]) -> InboundImage {
    InboundImage {
        filename: name.into(),
        content_type: "image/png".into(),
        data: Bytes::from_static(payload),
    }
}

async fn on_disk(storage: &UploadStorage, url: &str) -> bool {
    match storage.stored_path_for(url) {
        Some(path) => storage.read(&path).await.is_ok(),
        None => false,
    }
}

#[tokio::test]
async fn create_stores_the_binary_and_links_it() {
    let fx = fixture();

    let record = fx
        .service
        .create(input("Shipped"), Some(png("cover.png", b"first")))
        .await
        .unwrap();

    let asset = record.image.expect("image linked");
    assert!(asset.url.starts_with("/uploads/"));
    assert!(on_disk(&fx.storage, &asset.url).await);
}

#[tokio::test]
async fn replace_swaps_the_binary_and_removes_the_old_one() {
    let fx = fixture();
    let record = fx
        .service
        .create(input("Shipped"), Some(png("cover.png", b"first")))
        .await
        .unwrap();
    let old_url = record.image.as_ref().unwrap().url.clone();

    let updated = fx
        .service
        .update(
            record.id,
            input("Shipped"),
            ImageChange::Replace(png("cover-v2.png", b"second")),
        )
        .await
        .unwrap();

    let new_url = updated.image.expect("image still linked").url;
    assert_ne!(new_url, old_url);
    assert!(on_disk(&fx.storage, &new_url).await);
    assert!(!on_disk(&fx.storage, &old_url).await);
}

#[tokio::test]
async fn clear_unlinks_and_removes_the_binary() {
    let fx = fixture();
    let record = fx
        .service
        .create(input("Shipped"), Some(png("cover.png", b"first")))
        .await
        .unwrap();
    let url = record.image.as_ref().unwrap().url.clone();

    let updated = fx
        .service
        .update(record.id, input("Shipped"), ImageChange::Clear)
        .await
        .unwrap();

    assert!(updated.image.is_none());
    assert!(!on_disk(&fx.storage, &url).await);
}

#[tokio::test]
async fn keep_leaves_the_asset_alone() {
    let fx = fixture();
    let record = fx
        .service
        .create(input("Shipped"), Some(png("cover.png", b"first")))
        .await
        .unwrap();
    let url = record.image.as_ref().unwrap().url.clone();

    let updated = fx
        .service
        .update(record.id, input("Renamed"), ImageChange::Keep)
        .await
        .unwrap();

    assert_eq!(updated.image.unwrap().url, url);
    assert_eq!(updated.title, "Renamed");
    assert!(on_disk(&fx.storage, &url).await);
}

#[tokio::test]
async fn delete_removes_the_record_and_its_binary() {
    let fx = fixture();
    let record = fx
        .service
        .create(input("Shipped"), Some(png("cover.png", b"first")))
        .await
        .unwrap();
    let url = record.image.as_ref().unwrap().url.clone();

    fx.service.delete(record.id).await.unwrap();

    assert!(matches!(
        fx.service.get(record.id).await,
        Err(ProjectError::NotFound)
    ));
    assert!(!on_disk(&fx.storage, &url).await);
}

#[tokio::test]
async fn oversized_uploads_are_rejected_before_touching_the_repo() {
    let fx = fixture();

    let huge = InboundImage {
        filename: "huge.png".into(),
        content_type: "image/png".into(),
        data: Bytes::from(vec![0u8; 5 * 1024 * 1024 + 1]),
    };

    let err = fx
        .service
        .create(input("Oversized"), Some(huge))
        .await
        .expect_err("must reject");
    assert!(matches!(err, ProjectError::Media(_)));
    assert!(fx.service.list(&ProjectFilter::default()).await.unwrap().is_empty());
}
