use async_trait::async_trait;
use hillpost_common::model::{
    Id, ModelValidationError,
    post::{Category, Post, PostMarker, PostWithAuthor},
    user::{User, UserMarker},
};
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Storage interface for posts and the read-only view of users. The
/// server talks to this trait so the services can be exercised against an
/// in-memory store.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    /// Persist a freshly created post. Ids are assigned by the caller, so
    /// repeating a create always inserts a second row.
    async fn insert_post(&self, post: &Post) -> Result<()>;

    /// Full-record write of an existing post. Last write wins; there is
    /// no concurrency token.
    async fn update_post(&self, post: &Post) -> Result<()>;

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>>;

    async fn posts_by_author(&self, author: Id<UserMarker>) -> Result<Vec<Post>>;

    /// Posts joined with their author profiles, optionally scoped to one
    /// category. The join is inner: a post whose author cannot be
    /// resolved is dropped from the result, not reported.
    async fn posts_with_authors(&self, category: Option<Category>)
    -> Result<Vec<PostWithAuthor>>;
}
