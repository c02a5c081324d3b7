use crate::record::{PostRecord, PostWithAuthorRecord, UserRecord};
use crate::repository::{DbError, PostRepository, Result};
use async_trait::async_trait;
use hillpost_common::model::{
    Id,
    post::{Category, Post, PostMarker, PostWithAuthor},
    user::{User, UserMarker},
};
use sqlx::PgPool;
use time::OffsetDateTime;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.map_err(DbError::from)
    }
}

#[async_trait]
impl PostRepository for DbClient {
    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = sqlx::query_as::<_, PostRecord>(
            "
            SELECT
                posts.post_id,
                posts.category,
                posts.title,
                posts.content,
                posts.image_url,
                posts.author_id,
                posts.created_at
            FROM
                posts
            WHERE
                posts.post_id = $1
            ",
        )
        .bind(post_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn insert_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            "
            INSERT INTO posts (post_id, category, title, content, image_url, author_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(post.id.uuid())
        .bind(post.category.as_str())
        .bind(post.title.get())
        .bind(post.content.get())
        .bind(post.image.get())
        .bind(post.author.uuid())
        .bind(OffsetDateTime::from(post.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            "
            UPDATE posts
            SET category = $2, title = $3, content = $4, image_url = $5
            WHERE post_id = $1
            ",
        )
        .bind(post.id.uuid())
        .bind(post.category.as_str())
        .bind(post.title.get())
        .bind(post.content.get())
        .bind(post.image.get())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.handle,
                users.display_name
            FROM
                users
            WHERE
                users.user_id = $1
            ",
        )
        .bind(user_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn posts_by_author(&self, author: Id<UserMarker>) -> Result<Vec<Post>> {
        let records = sqlx::query_as::<_, PostRecord>(
            "
            SELECT
                posts.post_id,
                posts.category,
                posts.title,
                posts.content,
                posts.image_url,
                posts.author_id,
                posts.created_at
            FROM
                posts
            WHERE
                posts.author_id = $1
            ",
        )
        .bind(author.uuid())
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| Post::try_from(record).map_err(DbError::from))
            .collect()
    }

    async fn posts_with_authors(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<PostWithAuthor>> {
        let records = sqlx::query_as::<_, PostWithAuthorRecord>(
            "
            SELECT
                posts.post_id,
                posts.category,
                posts.title,
                posts.content,
                posts.image_url,
                posts.created_at,
                users.user_id,
                users.handle,
                users.display_name
            FROM
                posts JOIN users ON posts.author_id = users.user_id
            WHERE
                $1::text IS NULL OR posts.category = $1
            ",
        )
        .bind(category.map(Category::as_str))
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| PostWithAuthor::try_from(record).map_err(DbError::from))
            .collect()
    }
}
