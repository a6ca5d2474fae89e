use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use bytes::BytesMut;
use futures::TryStreamExt;
use garou::{
    app::{self, AppError, UploadPhotoCommand},
    blob::ObjectStore,
    database::Database,
    photo::{FieldError, Photo, PhotoPatch, join_tags, split_tags},
    vision::Tagger,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub store: Arc<dyn ObjectStore>,
    pub tagger: Arc<dyn Tagger>,
}

/// Wire shape of a photo record.
///
/// Tags travel as one comma-joined string, exactly as stored.
#[derive(Serialize, Debug)]
pub struct PhotoResponse {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub tags: String,
    pub created_at: String,
}

impl PhotoResponse {
    fn from_photo(value: Photo) -> Self {
        PhotoResponse {
            id: value.id,
            title: value.title,
            image: value.image,
            tags: join_tags(&value.tags),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// POST /photos/ runs the upload workflow on a multipart `image` file with
/// an optional `title`.
pub async fn upload_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PhotoResponse>), PhotoError> {
    let mut bytes = None;
    let mut filename = String::new();
    let mut title = None;

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" => {
                filename = field.file_name().unwrap_or_default().to_string();

                let mut data = BytesMut::new();
                let mut stream = field.into_stream();
                while let Some(chunk) = stream.try_next().await.unwrap_or(None) {
                    data.extend_from_slice(&chunk);
                }
                bytes = Some(data.freeze().to_vec());
            }
            "title" => {
                title = Some(field.text().await.unwrap_or_default());
            }
            _ => {} // ignore
        }
    }

    let bytes = match bytes {
        Some(b) => b,
        None => return Err(PhotoError::BadRequest("No image file found".to_string())),
    };

    let cmd = UploadPhotoCommand::new(&bytes, &filename);

    let cmd = if let Some(t) = title {
        cmd.with_title(&t)
    } else {
        cmd
    };

    let photo = cmd
        .execute(state.store.as_ref(), state.tagger.as_ref(), &state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(PhotoResponse::from_photo(photo))))
}

/// GET /photos/list/ returns every record, newest first.
pub async fn list_photos(
    State(state): State<AppState>,
) -> Result<Json<Vec<PhotoResponse>>, PhotoError> {
    let photos = app::list_photos(&state.db).await?;

    Ok(Json(
        photos.into_iter().map(PhotoResponse::from_photo).collect(),
    ))
}

/// GET /photos/{id}/
pub async fn get_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PhotoResponse>, PhotoError> {
    let photo = app::find_photo(&state.db, id).await?;

    Ok(Json(PhotoResponse::from_photo(photo)))
}

#[derive(Deserialize)]
pub struct UpdatePhotoRequest {
    title: Option<String>,
    image: Option<String>,
    /// Comma-joined, as stored and served.
    tags: Option<String>,
}

/// PUT /photos/{id}/ applies a partial update; absent fields stay untouched.
pub async fn update_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePhotoRequest>,
) -> Result<Json<PhotoResponse>, PhotoError> {
    let patch = PhotoPatch {
        title: req.title,
        image: req.image,
        tags: req.tags.as_deref().map(split_tags),
    };

    let photo = app::update_photo(&state.db, id, patch).await?;

    Ok(Json(PhotoResponse::from_photo(photo)))
}

/// DELETE /photos/{id}/
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, PhotoError> {
    app::remove_photo(&state.db, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /photos/{id}/retag/ re-runs tagging on the stored image.
pub async fn retag_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PhotoResponse>, PhotoError> {
    let photo =
        app::retag_photo(&state.db, state.store.as_ref(), state.tagger.as_ref(), id).await?;

    Ok(Json(PhotoResponse::from_photo(photo)))
}

pub enum PhotoError {
    App(AppError),

    BadRequest(String),
}

impl From<AppError> for PhotoError {
    fn from(value: AppError) -> Self {
        PhotoError::App(value)
    }
}

impl IntoResponse for PhotoError {
    fn into_response(self) -> axum::response::Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        #[derive(Serialize)]
        struct ValidationResponse {
            error: String,
            fields: Vec<FieldError>,
        }

        let (status, error) = match self {
            PhotoError::App(AppError::Validation(fields)) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ValidationResponse {
                        error: "validation failed".to_string(),
                        fields,
                    }),
                )
                    .into_response();
            }
            PhotoError::App(app_error @ AppError::PhotoNotFound { .. }) => {
                (StatusCode::NOT_FOUND, app_error.to_string())
            }
            PhotoError::App(app_error) => {
                (StatusCode::INTERNAL_SERVER_ERROR, app_error.to_string())
            }
            PhotoError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
