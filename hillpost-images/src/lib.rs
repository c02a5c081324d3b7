//! Client for the external image store. The store receives a staged local
//! file and answers with a durable public URL; nothing else about image
//! handling lives in this backend.

use async_trait::async_trait;
use hillpost_common::model::post::{ImageUrl, InvalidImageUrlError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub type Result<T, E = ImageStoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("Could not read staged image {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Image upload request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Image store response carried no usable URL")]
    MissingUrl,
    #[error(transparent)]
    InvalidUrl(#[from] InvalidImageUrlError),
}

/// Resolves an already-staged local file into a durable image URL. A
/// single attempt per call; failures are terminal for the request.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn ingest(&self, local: &Path) -> Result<ImageUrl>;
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub struct ImageStoreConfig {
    /// Unsigned-upload endpoint of the image store.
    pub upload_url: String,
    pub upload_preset: String,
}

/// HTTP implementation speaking the store's unsigned multipart upload
/// API.
pub struct HttpImageStore {
    client: reqwest::Client,
    config: ImageStoreConfig,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

impl HttpImageStore {
    #[must_use]
    pub fn new(config: ImageStoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

fn url_from_response(response: UploadResponse) -> Result<ImageUrl> {
    let url = response
        .secure_url
        .filter(|url| !url.is_empty())
        .ok_or(ImageStoreError::MissingUrl)?;

    Ok(ImageUrl::new(url)?)
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn ingest(&self, local: &Path) -> Result<ImageUrl> {
        let bytes = tokio::fs::read(local)
            .await
            .map_err(|source| ImageStoreError::Io {
                path: local.to_path_buf(),
                source,
            })?;

        let file_name = local
            .file_name()
            .map_or_else(|| "image".to_owned(), |name| name.to_string_lossy().into_owned());

        debug!(path = %local.display(), bytes = bytes.len(), "Uploading staged image");

        let form = Form::new()
            .text("upload_preset", self.config.upload_preset.clone())
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(&self.config.upload_url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<UploadResponse>()
            .await?;

        let url = url_from_response(response)?;
        debug!(url = url.get(), "Image resolved");

        Ok(url)
    }
}
