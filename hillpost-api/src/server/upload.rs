use crate::server::{Result, ServerError};
use crate::service::write::{CreatePostInput, UpdatePostInput};
use axum::extract::multipart::{Field, Multipart};
use hillpost_common::model::{
    ModelValidationError,
    post::{Category, PostContent, PostTitle},
};
use std::{
    path::PathBuf,
    sync::Arc,
};
use tracing::debug;
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Disk staging for uploaded images. The image field of a post form is
/// written under a unique name in the spool directory; the write service
/// hands the path to the image store and discards the file afterwards.
#[derive(Clone, Debug)]
pub struct UploadSpool {
    dir: Arc<PathBuf>,
}

/// Raw fields of a create/update post form. Empty text fields are
/// recorded as absent.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostForm {
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<PathBuf>,
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

fn parse_category(raw: String) -> Result<Category> {
    raw.parse::<Category>()
        .map_err(|err| ServerError::InvalidField(ModelValidationError::from(err)))
}

fn parse_title(raw: String) -> Result<PostTitle> {
    PostTitle::new(raw).map_err(|err| ServerError::InvalidField(ModelValidationError::from(err)))
}

fn parse_content(raw: String) -> Result<PostContent> {
    PostContent::new(raw).map_err(|err| ServerError::InvalidField(ModelValidationError::from(err)))
}

impl PostForm {
    /// Creation requires every field; the image is checked later by the
    /// write service so that the missing-image failure is its own error.
    pub fn into_create_input(self) -> Result<CreatePostInput> {
        Ok(CreatePostInput {
            category: parse_category(self.category.ok_or(ServerError::MissingField("category"))?)?,
            title: parse_title(self.title.ok_or(ServerError::MissingField("title"))?)?,
            content: parse_content(self.content.ok_or(ServerError::MissingField("content"))?)?,
            image: self.image,
        })
    }

    /// Updates are partial: absent and empty fields leave the stored
    /// values untouched.
    pub fn into_update_input(self) -> Result<UpdatePostInput> {
        Ok(UpdatePostInput {
            category: self.category.map(parse_category).transpose()?,
            title: self.title.map(parse_title).transpose()?,
            content: self.content.map(parse_content).transpose()?,
            image: self.image,
        })
    }
}

impl UploadSpool {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir: Arc::new(dir) }
    }

    /// Drains a multipart post form, spooling the image field to disk.
    pub async fn read_form(&self, mut multipart: Multipart) -> Result<PostForm> {
        let mut form = PostForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(ToOwned::to_owned);
            match name.as_deref() {
                Some("category") => form.category = non_empty(field.text().await?),
                Some("title") => form.title = non_empty(field.text().await?),
                Some("content") => form.content = non_empty(field.text().await?),
                Some("image") => form.image = Some(self.spool(field).await?),
                _ => {}
            }
        }

        Ok(form)
    }

    async fn spool(&self, field: Field<'_>) -> Result<PathBuf> {
        let extension = field
            .file_name()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, extension)| extension.to_ascii_lowercase());

        let bytes = field.bytes().await?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ServerError::ImageTooLarge);
        }

        let file_name = match extension {
            Some(extension) => format!("image-{}.{extension}", Uuid::new_v4()),
            None => format!("image-{}", Uuid::new_v4()),
        };
        let path = self.dir.join(file_name);

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(ServerError::ImageSpool)?;
        debug!(path = %path.display(), bytes = bytes.len(), "Spooled uploaded image");

        Ok(path)
    }
}
