use hillpost_common::model::{
    Id,
    post::{Category, ImageUrl, Post, PostContent, PostMarker, PostTitle},
    user::UserMarker,
};
use hillpost_db::repository::{DbError, PostRepository};
use hillpost_images::{ImageStore, ImageStoreError};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use time::UtcDateTime;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("No image file provided")]
    MissingImage,
    #[error("Image ingestion failed: {0}")]
    Ingest(#[from] ImageStoreError),
    #[error("Post with id {0} was not found")]
    PostNotFound(Id<PostMarker>),
    #[error("Actor is not the author of post {0}")]
    NotAuthor(Id<PostMarker>),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Validated creation payload. The image is a path to a spooled upload;
/// its absence is a validation failure raised before any external call.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePostInput {
    pub category: Category,
    pub title: PostTitle,
    pub content: PostContent,
    pub image: Option<PathBuf>,
}

/// Validated update payload. Every field is optional; absent fields
/// leave the stored values untouched.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct UpdatePostInput {
    pub category: Option<Category>,
    pub title: Option<PostTitle>,
    pub content: Option<PostContent>,
    pub image: Option<PathBuf>,
}

/// Orchestrates the two-step post writes: resolve the image through the
/// external store first, only then touch the database.
pub struct PostWriteService<R: ?Sized> {
    repo: Arc<R>,
    images: Arc<dyn ImageStore>,
}

impl<R: ?Sized> Clone for PostWriteService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            images: Arc::clone(&self.images),
        }
    }
}

impl<R: PostRepository + ?Sized> PostWriteService<R> {
    #[must_use]
    pub fn new(repo: Arc<R>, images: Arc<dyn ImageStore>) -> Self {
        Self { repo, images }
    }

    /// Creates a post owned by `actor`. The author always comes from the
    /// authenticated actor, never from the payload. Repeating the call
    /// creates a second post.
    pub async fn create(
        &self,
        actor: Id<UserMarker>,
        input: CreatePostInput,
    ) -> Result<Post, WriteError> {
        let staged = input.image.ok_or(WriteError::MissingImage)?;
        let image = self.ingest(&staged).await?;

        let post = Post {
            id: Id::random(),
            category: input.category,
            title: input.title,
            content: input.content,
            image,
            author: actor,
            created_at: UtcDateTime::now(),
        };

        // If this insert fails the uploaded image stays orphaned in the
        // external store; there is no compensating delete.
        self.repo.insert_post(&post).await?;
        info!(post_id = %post.id, author = %post.author, "Created post");

        Ok(post)
    }

    /// Applies a partial update to an existing post. Only the post's
    /// author may do this; the ownership check runs before any field is
    /// touched. A new image, when supplied, is re-ingested
    /// unconditionally.
    pub async fn update(
        &self,
        actor: Id<UserMarker>,
        post_id: Id<PostMarker>,
        input: UpdatePostInput,
    ) -> Result<Post, WriteError> {
        let mut post = self
            .repo
            .fetch_post(post_id)
            .await?
            .ok_or(WriteError::PostNotFound(post_id))?;

        if !post.is_authored_by(actor) {
            return Err(WriteError::NotAuthor(post_id));
        }

        if let Some(category) = input.category {
            post.category = category;
        }
        if let Some(title) = input.title {
            post.title = title;
        }
        if let Some(content) = input.content {
            post.content = content;
        }
        if let Some(staged) = input.image {
            post.image = self.ingest(&staged).await?;
        }

        self.repo.update_post(&post).await?;
        info!(post_id = %post.id, "Updated post");

        Ok(post)
    }

    async fn ingest(&self, staged: &Path) -> Result<ImageUrl, WriteError> {
        let resolved = self.images.ingest(staged).await;

        // The spool file has served its purpose whether or not the
        // ingestion succeeded.
        if let Err(err) = tokio::fs::remove_file(staged).await {
            warn!(path = %staged.display(), error = %err, "Could not remove spooled image");
        }

        Ok(resolved?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fakes::{FakeImageStore, FakeRepo, sample_post};
    use hillpost_common::model::post::Category;

    fn create_input(image: Option<&str>) -> CreatePostInput {
        CreatePostInput {
            category: Category::Sports,
            title: PostTitle::new("T".to_owned()).unwrap(),
            content: PostContent::new("C".to_owned()).unwrap(),
            image: image.map(PathBuf::from),
        }
    }

    fn title_update(title: &str) -> UpdatePostInput {
        UpdatePostInput {
            title: Some(PostTitle::new(title.to_owned()).unwrap()),
            ..UpdatePostInput::default()
        }
    }

    #[tokio::test]
    async fn create_without_image_persists_nothing() {
        let repo = Arc::new(FakeRepo::default());
        let images = Arc::new(FakeImageStore::resolving("https://img.example/f1.jpg"));
        let service = PostWriteService::new(Arc::clone(&repo), images.clone());

        let result = service.create(Id::random(), create_input(None)).await;

        assert!(matches!(result, Err(WriteError::MissingImage)));
        assert_eq!(repo.post_count(), 0);
        assert_eq!(images.ingest_count(), 0);
    }

    #[tokio::test]
    async fn create_sets_author_from_actor() {
        let repo = Arc::new(FakeRepo::default());
        let images = Arc::new(FakeImageStore::resolving("https://img.example/f1.jpg"));
        let service = PostWriteService::new(Arc::clone(&repo), images);
        let actor = Id::random();

        let post = service
            .create(actor, create_input(Some("/tmp/f1.jpg")))
            .await
            .unwrap();

        assert_eq!(post.author, actor);
        assert_eq!(post.image.get(), "https://img.example/f1.jpg");
        assert_eq!(repo.stored_post(post.id).unwrap(), post);
    }

    #[tokio::test]
    async fn create_aborts_without_write_when_ingest_fails() {
        let repo = Arc::new(FakeRepo::default());
        let images = Arc::new(FakeImageStore::failing());
        let service = PostWriteService::new(Arc::clone(&repo), images);

        let result = service
            .create(Id::random(), create_input(Some("/tmp/f1.jpg")))
            .await;

        assert!(matches!(result, Err(WriteError::Ingest(_))));
        assert_eq!(repo.post_count(), 0);
    }

    #[tokio::test]
    async fn repeated_create_inserts_distinct_posts() {
        let repo = Arc::new(FakeRepo::default());
        let images = Arc::new(FakeImageStore::resolving("https://img.example/f1.jpg"));
        let service = PostWriteService::new(Arc::clone(&repo), images);
        let actor = Id::random();

        let first = service
            .create(actor, create_input(Some("/tmp/f1.jpg")))
            .await
            .unwrap();
        let second = service
            .create(actor, create_input(Some("/tmp/f1.jpg")))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(repo.post_count(), 2);
    }

    #[tokio::test]
    async fn non_author_update_is_rejected_and_changes_nothing() {
        let repo = Arc::new(FakeRepo::default());
        let author = Id::random();
        let stored = sample_post(author, Category::Sports, "T", "C");
        repo.seed_post(stored.clone());
        let images = Arc::new(FakeImageStore::resolving("https://img.example/f2.jpg"));
        let service = PostWriteService::new(Arc::clone(&repo), images);

        let result = service.update(Id::random(), stored.id, title_update("X")).await;

        assert!(matches!(result, Err(WriteError::NotAuthor(id)) if id == stored.id));
        assert_eq!(repo.stored_post(stored.id).unwrap(), stored);
    }

    #[tokio::test]
    async fn update_of_unknown_post_is_not_found() {
        let repo = Arc::new(FakeRepo::default());
        let images = Arc::new(FakeImageStore::resolving("https://img.example/f2.jpg"));
        let service = PostWriteService::new(repo, images);

        let missing = Id::random();
        let result = service.update(Id::random(), missing, title_update("X")).await;

        assert!(matches!(result, Err(WriteError::PostNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn partial_update_preserves_unsupplied_fields() {
        let repo = Arc::new(FakeRepo::default());
        let author = Id::random();
        let stored = sample_post(author, Category::Sports, "T", "C");
        repo.seed_post(stored.clone());
        let images = Arc::new(FakeImageStore::resolving("https://img.example/f2.jpg"));
        let service = PostWriteService::new(Arc::clone(&repo), images.clone());

        let updated = service
            .update(author, stored.id, title_update("X"))
            .await
            .unwrap();

        assert_eq!(updated.title.get(), "X");
        assert_eq!(updated.category, stored.category);
        assert_eq!(updated.content, stored.content);
        assert_eq!(updated.image, stored.image);
        assert_eq!(updated.created_at, stored.created_at);
        assert_eq!(repo.stored_post(stored.id).unwrap(), updated);
        // No new image was supplied, so nothing was re-ingested.
        assert_eq!(images.ingest_count(), 0);
    }

    #[tokio::test]
    async fn new_image_is_reingested_and_replaces_the_url() {
        let repo = Arc::new(FakeRepo::default());
        let author = Id::random();
        let stored = sample_post(author, Category::Sports, "T", "C");
        repo.seed_post(stored.clone());
        let images = Arc::new(FakeImageStore::resolving("https://img.example/f2.jpg"));
        let service = PostWriteService::new(Arc::clone(&repo), images.clone());

        let input = UpdatePostInput {
            image: Some(PathBuf::from("/tmp/f2.jpg")),
            ..UpdatePostInput::default()
        };
        let updated = service.update(author, stored.id, input).await.unwrap();

        assert_eq!(updated.image.get(), "https://img.example/f2.jpg");
        assert_eq!(images.ingest_count(), 1);
    }

    #[tokio::test]
    async fn failed_ingest_on_update_leaves_the_post_untouched() {
        let repo = Arc::new(FakeRepo::default());
        let author = Id::random();
        let stored = sample_post(author, Category::Sports, "T", "C");
        repo.seed_post(stored.clone());
        let images = Arc::new(FakeImageStore::failing());
        let service = PostWriteService::new(Arc::clone(&repo), images);

        let input = UpdatePostInput {
            title: Some(PostTitle::new("X".to_owned()).unwrap()),
            image: Some(PathBuf::from("/tmp/f2.jpg")),
            ..UpdatePostInput::default()
        };
        let result = service.update(author, stored.id, input).await;

        assert!(matches!(result, Err(WriteError::Ingest(_))));
        assert_eq!(repo.stored_post(stored.id).unwrap(), stored);
    }

    // The end-to-end ownership scenario: A creates, B is forbidden, A
    // then edits the title without disturbing the other fields.
    #[tokio::test]
    async fn ownership_gated_update_flow() {
        let repo = Arc::new(FakeRepo::default());
        let images = Arc::new(FakeImageStore::resolving("https://img.example/f1.jpg"));
        let service = PostWriteService::new(Arc::clone(&repo), images);
        let actor_a = Id::random();
        let actor_b = Id::random();

        let created = service
            .create(actor_a, create_input(Some("/tmp/f1.jpg")))
            .await
            .unwrap();
        assert_eq!(created.author, actor_a);
        assert_eq!(created.category, Category::Sports);
        assert_eq!(created.image.get(), "https://img.example/f1.jpg");

        let forbidden = service.update(actor_b, created.id, title_update("X")).await;
        assert!(matches!(forbidden, Err(WriteError::NotAuthor(_))));
        assert_eq!(repo.stored_post(created.id).unwrap().title.get(), "T");

        let updated = service
            .update(actor_a, created.id, title_update("X"))
            .await
            .unwrap();
        assert_eq!(updated.title.get(), "X");
        assert_eq!(updated.category, Category::Sports);
        assert_eq!(updated.image.get(), "https://img.example/f1.jpg");
    }
}
