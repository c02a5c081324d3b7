use hillpost_common::model::{
    ModelValidationError,
    post::{Category, ImageUrl, Post, PostContent, PostTitle, PostWithAuthor},
    user::{User, UserHandle},
};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq, Debug, Hash, sqlx::FromRow)]
pub(crate) struct UserRecord {
    pub user_id: Uuid,
    pub handle: String,
    pub display_name: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, sqlx::FromRow)]
pub(crate) struct PostRecord {
    pub post_id: Uuid,
    pub category: String,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, sqlx::FromRow)]
pub(crate) struct PostWithAuthorRecord {
    pub post_id: Uuid,
    pub category: String,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub created_at: OffsetDateTime,
    pub user_id: Uuid,
    pub handle: String,
    pub display_name: Option<String>,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.into(),
            handle: UserHandle::new(value.handle)?,
            display_name: value.display_name,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.into(),
            category: value.category.parse::<Category>()?,
            title: PostTitle::new(value.title)?,
            content: PostContent::new(value.content)?,
            image: ImageUrl::new(value.image_url)?,
            author: value.author_id.into(),
            created_at: value.created_at.to_utc(),
        })
    }
}

impl TryFrom<PostWithAuthorRecord> for PostWithAuthor {
    type Error = ModelValidationError;

    fn try_from(value: PostWithAuthorRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.into(),
            category: value.category.parse::<Category>()?,
            title: PostTitle::new(value.title)?,
            content: PostContent::new(value.content)?,
            image: ImageUrl::new(value.image_url)?,
            author: User {
                id: value.user_id.into(),
                handle: UserHandle::new(value.handle)?,
                display_name: value.display_name,
            },
            created_at: value.created_at.to_utc(),
        })
    }
}
