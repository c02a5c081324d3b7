use hillpost_common::model::{
    Id,
    post::{Category, Post, PostMarker, PostWithAuthor},
    user::{User, UserMarker},
};
use hillpost_db::repository::{DbError, PostRepository};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Post with id {0} was not found")]
    PostNotFound(Id<PostMarker>),
    #[error("Author with id {0} was not found")]
    AuthorNotFound(Id<UserMarker>),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Detail view of a single post. The author may be unresolvable; the
/// post is still served with a null author rather than dropped.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author: Option<User>,
}

/// An author's profile together with everything they have published.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct AuthorPosts {
    pub author: User,
    pub posts: Vec<Post>,
}

/// Read side of the post pipeline. Every operation is public; reads
/// never consult ownership.
pub struct PostQueryService<R: ?Sized> {
    repo: Arc<R>,
}

impl<R: ?Sized> Clone for PostQueryService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: PostRepository + ?Sized> PostQueryService<R> {
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Every post with a resolvable author, joined with the author's
    /// profile.
    pub async fn list_all(&self) -> Result<Vec<PostWithAuthor>, QueryError> {
        Ok(self.repo.posts_with_authors(None).await?)
    }

    /// Same shape as [`Self::list_all`], scoped to one category.
    pub async fn list_by_category(
        &self,
        category: Category,
    ) -> Result<Vec<PostWithAuthor>, QueryError> {
        Ok(self.repo.posts_with_authors(Some(category)).await?)
    }

    /// All posts owned by the given actor, without the author join; the
    /// caller already knows who they are.
    pub async fn list_by_author(&self, actor: Id<UserMarker>) -> Result<Vec<Post>, QueryError> {
        Ok(self.repo.posts_by_author(actor).await?)
    }

    /// Single post plus its author's profile. The post lookup comes
    /// first; when it misses, no author lookup is issued.
    pub async fn get_full(&self, post_id: Id<PostMarker>) -> Result<PostDetail, QueryError> {
        let post = self
            .repo
            .fetch_post(post_id)
            .await?
            .ok_or(QueryError::PostNotFound(post_id))?;

        let author = self.repo.fetch_user(post.author).await?;

        Ok(PostDetail { post, author })
    }

    /// An author's profile and posts. Fails when the author does not
    /// exist, even if they would have zero posts.
    pub async fn author_posts(&self, author_id: Id<UserMarker>) -> Result<AuthorPosts, QueryError> {
        let author = self
            .repo
            .fetch_user(author_id)
            .await?
            .ok_or(QueryError::AuthorNotFound(author_id))?;

        let posts = self.repo.posts_by_author(author_id).await?;

        Ok(AuthorPosts { author, posts })
    }
}
