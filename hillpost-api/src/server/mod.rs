use crate::service::{
    query::{PostQueryService, QueryError},
    write::{PostWriteService, WriteError},
};
use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request, multipart::MultipartError,
        rejection::PathRejection},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use hillpost_common::model::{
    Id, ModelValidationError, post::PostMarker, user::UserMarker,
};
use hillpost_db::{client::DbClient, repository::DbError};
use hillpost_images::{ImageStore, ImageStoreError};
use json::Json;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;
use tracing::error;
use upload::UploadSpool;

mod auth;
mod json;
mod routes;
mod upload;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub write: PostWriteService<DbClient>,
    pub query: PostQueryService<DbClient>,
    pub uploads: UploadSpool,
}

impl ServerState {
    #[must_use]
    pub fn new(db: Arc<DbClient>, images: Arc<dyn ImageStore>, upload_dir: PathBuf) -> Self {
        Self {
            write: PostWriteService::new(Arc::clone(&db), images),
            query: PostQueryService::new(db),
            uploads: UploadSpool::new(upload_dir),
        }
    }
}

pub fn routes() -> ServerRouter {
    routes::routes()
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(upload::MAX_IMAGE_BYTES))
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided actor token was not a valid id: {0}")]
    InvalidActorToken(uuid::Error),
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    InvalidField(#[from] ModelValidationError),
    #[error("No image file provided")]
    MissingImage,
    #[error("Image exceeds the upload size limit")]
    ImageTooLarge,
    #[error("Image ingestion failed: {0}")]
    ImageIngest(ImageStoreError),
    #[error("Could not spool uploaded image: {0}")]
    ImageSpool(std::io::Error),
    #[error("Post with id {0} was not found.")]
    PostNotFound(Id<PostMarker>),
    #[error("Author with id {0} was not found.")]
    AuthorNotFound(Id<UserMarker>),
    #[error("Not the author of post {0}")]
    NotPostAuthor(Id<PostMarker>),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<WriteError> for ServerError {
    fn from(value: WriteError) -> Self {
        match value {
            WriteError::MissingImage => ServerError::MissingImage,
            WriteError::Ingest(err) => ServerError::ImageIngest(err),
            WriteError::PostNotFound(id) => ServerError::PostNotFound(id),
            WriteError::NotAuthor(id) => ServerError::NotPostAuthor(id),
            WriteError::Db(err) => ServerError::Database(err),
        }
    }
}

impl From<QueryError> for ServerError {
    fn from(value: QueryError) -> Self {
        match value {
            QueryError::PostNotFound(id) => ServerError::PostNotFound(id),
            QueryError::AuthorNotFound(id) => ServerError::AuthorNotFound(id),
            QueryError::Db(err) => ServerError::Database(err),
        }
    }
}

impl ServerError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostNotFound(_)
            | ServerError::AuthorNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::NotPostAuthor(_) => StatusCode::FORBIDDEN,
            ServerError::ImageTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidActorToken(_)
            | ServerError::Multipart(_)
            | ServerError::MissingField(_)
            | ServerError::InvalidField(_)
            | ServerError::MissingImage
            | ServerError::ImageIngest(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_)
            | ServerError::ImageSpool(_)
            | ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(error_response)).into_response()
    }
}
