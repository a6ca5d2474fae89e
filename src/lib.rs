//! # Photo Gallery Backend
//!
//! This crate provides the backend of a photo gallery: uploaded images are
//! written to a remote blob store, automatically labeled by a cloud vision
//! service, and persisted as metadata records (title, image URL, tags,
//! creation time) in a relational store. The primary entry point is the
//! `UploadPhotoCommand` struct, which provides a fluent interface for
//! constructing and executing the upload workflow.
//!
//! ## Features
//!
//! - **Blob storage**: Store image bytes in an object-storage service under
//!   a unique key and address them by URL.
//! - **Automatic tagging**: Request descriptive labels from a vision service
//!   and persist them alongside the photo.
//! - **Metadata management**: List, fetch, partially update, delete, and
//!   re-tag photo records.
//! - **Swappable clients**: The blob store and the vision service are
//!   reached through the `ObjectStore` and `Tagger` ports, so workflows can
//!   be exercised against in-memory fakes.
//!
//! ## Usage
//!
//! ```no_run
//! use garou::app::UploadPhotoCommand;
//! use garou::blob::ObjectStore;
//! use garou::database::Database;
//! use garou::vision::Tagger;
//!
//! async fn perform_upload(
//!     store: &dyn ObjectStore,
//!     tagger: &dyn Tagger,
//!     db: &Database,
//!     bytes: &[u8],
//! ) {
//!     let command = UploadPhotoCommand::new(bytes, "sunset.jpg").with_title("Sunset");
//!
//!     match command.execute(store, tagger, db).await {
//!         Ok(photo) => println!("Created photo {} at {}", photo.id, photo.image),
//!         Err(error) => eprintln!("Failed to upload photo: {}", error),
//!     }
//! }
//! ```

pub mod app;
pub mod blob;
pub mod config;
pub mod database;
mod dialect;
pub mod photo;
pub mod vision;
