//! # Photo Workflows Module
//!
//! This module provides the high-level operations of the gallery backend:
//! uploading a photo (blob upload, automatic tagging, metadata insert),
//! re-tagging an existing photo, and the plain metadata operations (find,
//! list, partial update, remove).
//!
//! ## Provided Structures
//!
//! - **UploadPhotoCommand**: Central to creating photos, this struct carries
//!   the raw image bytes, the original filename, and an optional title, and
//!   drives the three-stage upload workflow.
//!
//! ## Error Handling
//!
//! Every workflow stage converts only the failures of its own external call
//! into the matching [`AppError`] variant, so callers can tell a storage
//! failure from a tagging failure from a database failure. No stage retries.
//! When a stage after the blob upload fails, the uploaded blob is removed
//! again on a best-effort basis so no orphan is left behind.

use crate::{
    blob::{BlobError, ObjectStore},
    database::{Database, DatabaseError},
    photo::{DEFAULT_TITLE, FieldError, NO_TAGS_SENTINEL, Photo, PhotoDraft, PhotoPatch},
    vision::{TAG_LANGUAGE, TagLabel, Tagger, VisionError},
};
use tracing::{info, warn};

/// Represents a command for adding a photo to the gallery.
///
/// This structure holds the raw image bytes, the original filename, and an
/// optional title. Use the builder-style `with_title` to set the title
/// before calling `execute()` to run the upload workflow.
pub struct UploadPhotoCommand {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// Filename as submitted by the uploader; only its extension matters.
    pub filename: String,
    /// Optional title; a fixed placeholder is used when absent.
    pub title: Option<String>,
}

impl UploadPhotoCommand {
    /// Creates a new `UploadPhotoCommand` for the given image payload.
    pub fn new(bytes: &[u8], filename: &str) -> Self {
        UploadPhotoCommand {
            bytes: bytes.to_vec(),
            filename: filename.to_string(),
            title: None,
        }
    }

    /// Sets the photo title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Executes the upload workflow.
    ///
    /// Stages, in order: store the bytes in the blob store, request tags
    /// from the vision service, validate the assembled record, persist it.
    /// A failure in any stage after the blob upload removes the uploaded
    /// blob again before the error is returned.
    ///
    /// # Returns
    ///
    /// The created [`Photo`] on success, or the first stage's [`AppError`].
    pub async fn execute(
        self,
        store: &dyn ObjectStore,
        tagger: &dyn Tagger,
        db: &Database,
    ) -> Result<Photo, AppError> {
        info!(filename = %self.filename, "uploading photo to blob storage");
        let url = store.upload(&self.bytes, &self.filename).await?;

        match self.tag_and_persist(&url, tagger, db).await {
            Ok(photo) => Ok(photo),
            Err(e) => {
                if let Err(cleanup) = store.ensure_deleted(&url).await {
                    warn!(url = %url, error = %cleanup, "could not remove blob of aborted upload");
                }
                Err(e)
            }
        }
    }

    async fn tag_and_persist(
        &self,
        url: &str,
        tagger: &dyn Tagger,
        db: &Database,
    ) -> Result<Photo, AppError> {
        info!("requesting tags from vision service");
        let labels = tagger.tag(&self.bytes, TAG_LANGUAGE).await?;
        let tags = labels_to_tags(labels);

        let draft = PhotoDraft {
            title: self
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            image: url.to_string(),
            tags,
        };
        draft.validate().map_err(AppError::Validation)?;

        let photo = db.insert_photo(&draft).await?;
        info!(id = photo.id, "created photo record");

        Ok(photo)
    }
}

/// Converts vision labels into the tag list to persist.
///
/// An empty answer becomes the sentinel, so the stored tag string is never
/// empty.
pub fn labels_to_tags(labels: Vec<TagLabel>) -> Vec<String> {
    if labels.is_empty() {
        vec![NO_TAGS_SENTINEL.to_string()]
    } else {
        labels.into_iter().map(|label| label.name).collect()
    }
}

/// Re-runs tagging for an existing photo and overwrites its tags.
///
/// The image bytes are re-downloaded from the stored URL; title, image and
/// creation time are left untouched.
///
/// # Returns
///
/// The updated [`Photo`], or [`AppError::PhotoNotFound`] for an unknown id.
pub async fn retag_photo(
    db: &Database,
    store: &dyn ObjectStore,
    tagger: &dyn Tagger,
    id: i64,
) -> Result<Photo, AppError> {
    let photo = db
        .get_photo(id)
        .await?
        .ok_or(AppError::PhotoNotFound { id })?;

    info!(id, url = %photo.image, "re-downloading photo for tagging");
    let bytes = store.download(&photo.image).await?;

    let labels = tagger.tag(&bytes, TAG_LANGUAGE).await?;
    let tags = labels_to_tags(labels);

    if !db.update_tags(id, &tags).await? {
        // The record vanished between lookup and update.
        return Err(AppError::PhotoNotFound { id });
    }

    info!(id, "overwrote photo tags");

    Ok(Photo { tags, ..photo })
}

/// Fetches one photo by id.
pub async fn find_photo(db: &Database, id: i64) -> Result<Photo, AppError> {
    db.get_photo(id)
        .await?
        .ok_or(AppError::PhotoNotFound { id })
}

/// Returns all photos, newest first.
pub async fn list_photos(db: &Database) -> Result<Vec<Photo>, AppError> {
    Ok(db.list_photos().await?)
}

/// Applies a partial update and returns the updated record.
///
/// Only the fields present in the patch are validated and written; an empty
/// patch returns the record unchanged.
pub async fn update_photo(db: &Database, id: i64, patch: PhotoPatch) -> Result<Photo, AppError> {
    patch.validate().map_err(AppError::Validation)?;

    if !db.update_photo(id, &patch).await? {
        return Err(AppError::PhotoNotFound { id });
    }

    find_photo(db, id).await
}

/// Removes one photo record by id.
///
/// The blob behind the record is left in place; only metadata is deleted.
pub async fn remove_photo(db: &Database, id: i64) -> Result<(), AppError> {
    if !db.delete_photo(id).await? {
        return Err(AppError::PhotoNotFound { id });
    }

    Ok(())
}

/// Error types within the application, tagged by the workflow stage that
/// produced them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] BlobError),

    #[error("tagging error: {0}")]
    Tagging(#[from] VisionError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("photo not found: {id}")]
    PhotoNotFound { id: i64 },

    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
}

#[cfg(test)]
mod tests {
    use crate::{
        app::{
            AppError, UploadPhotoCommand, find_photo, labels_to_tags, list_photos, remove_photo,
            retag_photo, update_photo,
        },
        blob::{BlobError, ObjectStore},
        database::{Database, Pool},
        photo::{DEFAULT_TITLE, MAX_TITLE_LEN, NO_TAGS_SENTINEL, PhotoPatch},
        vision::{TagLabel, Tagger, VisionError},
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::StatusCode;
    use std::{collections::HashMap, sync::Mutex};

    /// In-memory stand-in for the blob store.
    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            MemoryStore {
                objects: Mutex::new(HashMap::new()),
            }
        }

        fn object_count(&self) -> usize {
            self.objects.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn upload(&self, bytes: &[u8], original_filename: &str) -> Result<String, BlobError> {
            let url = format!("https://blobs.test/photos/{original_filename}");
            self.objects
                .lock()
                .unwrap()
                .insert(url.clone(), bytes.to_vec());
            Ok(url)
        }

        async fn download(&self, url: &str) -> Result<Bytes, BlobError> {
            self.objects
                .lock()
                .unwrap()
                .get(url)
                .map(|bytes| Bytes::from(bytes.clone()))
                .ok_or(BlobError::NotFound {
                    url: url.to_string(),
                })
        }

        async fn ensure_deleted(&self, url: &str) -> Result<(), BlobError> {
            self.objects.lock().unwrap().remove(url);
            Ok(())
        }
    }

    /// Tagger answering with a canned label list.
    struct FixedTagger {
        labels: Vec<TagLabel>,
    }

    #[async_trait]
    impl Tagger for FixedTagger {
        async fn tag(&self, _bytes: &[u8], _language: &str) -> Result<Vec<TagLabel>, VisionError> {
            Ok(self.labels.clone())
        }
    }

    /// Tagger that always fails.
    struct FailingTagger;

    #[async_trait]
    impl Tagger for FailingTagger {
        async fn tag(&self, _bytes: &[u8], _language: &str) -> Result<Vec<TagLabel>, VisionError> {
            Err(VisionError::Service {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            })
        }
    }

    fn label(name: &str) -> TagLabel {
        TagLabel {
            name: name.to_string(),
            confidence: 0.9,
        }
    }

    async fn get_db() -> Database {
        Database::with_migration(Pool::connect(":memory:").await.unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_creates_record() {
        let db = get_db().await;
        let store = MemoryStore::new();
        let tagger = FixedTagger {
            labels: vec![label("beach"), label("sky")],
        };

        let photo = UploadPhotoCommand::new(b"bytes", "photo.jpg")
            .with_title("Sunset")
            .execute(&store, &tagger, &db)
            .await
            .unwrap();

        assert_eq!("Sunset", photo.title);
        assert!(photo.image.starts_with("https://blobs.test/"));
        assert_eq!(vec!["beach".to_string(), "sky".to_string()], photo.tags);
        assert_eq!(1, store.object_count());

        assert_eq!(photo, find_photo(&db, photo.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_without_title_uses_placeholder() {
        let db = get_db().await;
        let store = MemoryStore::new();
        let tagger = FixedTagger {
            labels: vec![label("beach")],
        };

        let photo = UploadPhotoCommand::new(b"bytes", "photo.jpg")
            .execute(&store, &tagger, &db)
            .await
            .unwrap();

        assert_eq!(DEFAULT_TITLE, photo.title);
    }

    #[tokio::test]
    async fn test_upload_with_no_labels_stores_sentinel() {
        let db = get_db().await;
        let store = MemoryStore::new();
        let tagger = FixedTagger { labels: vec![] };

        let photo = UploadPhotoCommand::new(b"bytes", "photo.jpg")
            .execute(&store, &tagger, &db)
            .await
            .unwrap();

        assert_eq!(vec![NO_TAGS_SENTINEL.to_string()], photo.tags);
        assert_eq!(photo.tags, find_photo(&db, photo.id).await.unwrap().tags);
    }

    #[tokio::test]
    async fn test_upload_removes_blob_when_tagging_fails() {
        let db = get_db().await;
        let store = MemoryStore::new();

        let result = UploadPhotoCommand::new(b"bytes", "photo.jpg")
            .execute(&store, &FailingTagger, &db)
            .await;

        assert!(matches!(result, Err(AppError::Tagging(_))));
        assert_eq!(0, store.object_count());
        assert!(list_photos(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_removes_blob_when_validation_fails() {
        let db = get_db().await;
        let store = MemoryStore::new();
        let tagger = FixedTagger {
            labels: vec![label("beach")],
        };

        let result = UploadPhotoCommand::new(b"bytes", "photo.jpg")
            .with_title(&"x".repeat(MAX_TITLE_LEN + 1))
            .execute(&store, &tagger, &db)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(0, store.object_count());
        assert!(list_photos(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_photos_newest_first() {
        let db = get_db().await;
        let store = MemoryStore::new();
        let tagger = FixedTagger {
            labels: vec![label("beach")],
        };

        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            UploadPhotoCommand::new(b"bytes", name)
                .execute(&store, &tagger, &db)
                .await
                .unwrap();
        }

        let titles: Vec<String> = list_photos(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.image)
            .collect();
        assert_eq!(
            vec![
                "https://blobs.test/photos/c.jpg",
                "https://blobs.test/photos/b.jpg",
                "https://blobs.test/photos/a.jpg"
            ],
            titles
        );
    }

    #[tokio::test]
    async fn test_retag_overwrites_tags_only() {
        let db = get_db().await;
        let store = MemoryStore::new();

        let before = UploadPhotoCommand::new(b"bytes", "photo.jpg")
            .with_title("Sunset")
            .execute(
                &store,
                &FixedTagger {
                    labels: vec![label("beach")],
                },
                &db,
            )
            .await
            .unwrap();

        let after = retag_photo(
            &db,
            &store,
            &FixedTagger {
                labels: vec![label("mountain"), label("snow")],
            },
            before.id,
        )
        .await
        .unwrap();

        assert_eq!(
            vec!["mountain".to_string(), "snow".to_string()],
            after.tags
        );
        assert_eq!(before.title, after.title);
        assert_eq!(before.image, after.image);
        assert_eq!(before.created_at, after.created_at);

        assert_eq!(after, find_photo(&db, before.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_retag_with_no_labels_stores_sentinel() {
        let db = get_db().await;
        let store = MemoryStore::new();

        let photo = UploadPhotoCommand::new(b"bytes", "photo.jpg")
            .execute(
                &store,
                &FixedTagger {
                    labels: vec![label("beach")],
                },
                &db,
            )
            .await
            .unwrap();

        let after = retag_photo(&db, &store, &FixedTagger { labels: vec![] }, photo.id)
            .await
            .unwrap();

        assert_eq!(vec![NO_TAGS_SENTINEL.to_string()], after.tags);
    }

    #[tokio::test]
    async fn test_retag_unknown_id() {
        let db = get_db().await;
        let store = MemoryStore::new();

        let result = retag_photo(&db, &store, &FailingTagger, 5).await;

        assert!(matches!(
            result,
            Err(AppError::PhotoNotFound { id: 5 })
        ));
        assert!(list_photos(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_photo_touches_only_supplied_fields() {
        let db = get_db().await;
        let store = MemoryStore::new();

        let before = UploadPhotoCommand::new(b"bytes", "photo.jpg")
            .with_title("Sunset")
            .execute(
                &store,
                &FixedTagger {
                    labels: vec![label("beach")],
                },
                &db,
            )
            .await
            .unwrap();

        let patch = PhotoPatch {
            title: Some("New".to_string()),
            ..PhotoPatch::default()
        };
        let after = update_photo(&db, before.id, patch).await.unwrap();

        assert_eq!("New", after.title);
        assert_eq!(before.image, after.image);
        assert_eq!(before.tags, after.tags);
        assert_eq!(before.created_at, after.created_at);
    }

    #[tokio::test]
    async fn test_update_photo_rejects_invalid_patch() {
        let db = get_db().await;
        let store = MemoryStore::new();

        let before = UploadPhotoCommand::new(b"bytes", "photo.jpg")
            .with_title("Sunset")
            .execute(
                &store,
                &FixedTagger {
                    labels: vec![label("beach")],
                },
                &db,
            )
            .await
            .unwrap();

        let patch = PhotoPatch {
            title: Some("x".repeat(MAX_TITLE_LEN + 1)),
            ..PhotoPatch::default()
        };
        let result = update_photo(&db, before.id, patch).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(before, find_photo(&db, before.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_photo_unknown_id() {
        let db = get_db().await;

        let patch = PhotoPatch {
            title: Some("New".to_string()),
            ..PhotoPatch::default()
        };
        let result = update_photo(&db, 42, patch).await;

        assert!(matches!(result, Err(AppError::PhotoNotFound { id: 42 })));
        assert!(list_photos(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_photo() {
        let db = get_db().await;
        let store = MemoryStore::new();

        let photo = UploadPhotoCommand::new(b"bytes", "photo.jpg")
            .execute(
                &store,
                &FixedTagger {
                    labels: vec![label("beach")],
                },
                &db,
            )
            .await
            .unwrap();

        remove_photo(&db, photo.id).await.unwrap();

        assert!(matches!(
            find_photo(&db, photo.id).await,
            Err(AppError::PhotoNotFound { .. })
        ));
        assert!(matches!(
            remove_photo(&db, photo.id).await,
            Err(AppError::PhotoNotFound { .. })
        ));
    }

    #[test]
    fn test_labels_to_tags_substitutes_sentinel() {
        assert_eq!(
            vec![NO_TAGS_SENTINEL.to_string()],
            labels_to_tags(vec![])
        );
        assert_eq!(
            vec!["beach".to_string()],
            labels_to_tags(vec![label("beach")])
        );
    }
}
