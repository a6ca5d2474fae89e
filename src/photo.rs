//! Photo model and field validation.
//!
//! A photo is a metadata record pointing at an image held in blob storage.
//! Tags are modeled as an ordered sequence of strings inside the crate and
//! flattened to one comma-joined string at the storage and wire boundary.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Title given to uploads that carry no title field.
pub const DEFAULT_TITLE: &str = "untitled";

/// Stored in place of an empty tag list so the tags column is never blank.
pub const NO_TAGS_SENTINEL: &str = "no tags";

/// Column widths of the photos table.
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_IMAGE_LEN: usize = 500;
pub const MAX_TAGS_LEN: usize = 500;

/// A persisted photo record.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    /// Identifier assigned by the store on creation.
    pub id: i64,
    /// Short user-supplied label.
    pub title: String,
    /// URL of the image in blob storage. Not touched after creation.
    pub image: String,
    /// Descriptive tags, in the order the vision service returned them.
    pub tags: Vec<String>,
    /// Set once at insertion.
    pub created_at: DateTime<Utc>,
}

/// Joins tags into the comma-delimited storage/wire form.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

/// Splits the comma-delimited storage/wire form back into a tag list.
///
/// Empty segments are dropped, so a blank column yields an empty list.
pub fn split_tags(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// A validation failure on a single field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    if title.is_empty() {
        errors.push(FieldError::new("title", "must not be empty"));
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.push(FieldError::new(
            "title",
            format!("must be at most {MAX_TITLE_LEN} characters"),
        ));
    }
}

fn check_image(image: &str, errors: &mut Vec<FieldError>) {
    if image.is_empty() {
        errors.push(FieldError::new("image", "must not be empty"));
    } else if image.chars().count() > MAX_IMAGE_LEN {
        errors.push(FieldError::new(
            "image",
            format!("must be at most {MAX_IMAGE_LEN} characters"),
        ));
    }
}

fn check_tags(tags: &[String], errors: &mut Vec<FieldError>) {
    if join_tags(tags).chars().count() > MAX_TAGS_LEN {
        errors.push(FieldError::new(
            "tags",
            format!("must be at most {MAX_TAGS_LEN} characters when joined"),
        ));
    }
}

/// A not-yet-persisted photo, as assembled by the upload workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoDraft {
    pub title: String,
    pub image: String,
    pub tags: Vec<String>,
}

impl PhotoDraft {
    /// Checks the draft against the column constraints of the photos table.
    ///
    /// Returns every violated field so callers can report them all at once.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        check_title(&self.title, &mut errors);
        check_image(&self.image, &mut errors);
        check_tags(&self.tags, &mut errors);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// A partial update. Only fields that are `Some` are validated and applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoPatch {
    pub title: Option<String>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl PhotoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.image.is_none() && self.tags.is_none()
    }

    /// Validates only the fields present in the patch.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if let Some(title) = &self.title {
            check_title(title, &mut errors);
        }
        if let Some(image) = &self.image {
            check_image(image, &mut errors);
        }
        if let Some(tags) = &self.tags {
            check_tags(tags, &mut errors);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
