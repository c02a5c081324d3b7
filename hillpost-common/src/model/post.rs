use crate::model::{
    Id,
    user::{User, UserMarker},
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// Closed set of blog categories. Filtering and creation both go through
/// this enum, so a misspelt category is rejected at the boundary instead
/// of matching nothing.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
pub enum Category {
    College,
    Hillfair,
    Nimbus,
    Sports,
    Events,
    Others,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::College,
        Category::Hillfair,
        Category::Nimbus,
        Category::Sports,
        Category::Events,
        Category::Others,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::College => "College",
            Category::Hillfair => "Hillfair",
            Category::Nimbus => "Nimbus",
            Category::Sports => "Sports",
            Category::Events => "Events",
            Category::Others => "Others",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown category: {0}")]
pub struct InvalidCategoryError(String);

impl FromStr for Category {
    type Err = InvalidCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Exact, case-sensitive names only.
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| InvalidCategoryError(s.to_owned()))
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidPostTextError {
    #[error("The post title must not be empty")]
    EmptyTitle,
    #[error("The post content must not be empty")]
    EmptyContent,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostTitle(String);

impl PostTitle {
    pub fn new(title: String) -> Result<Self, InvalidPostTextError> {
        if title.trim().is_empty() {
            Err(InvalidPostTextError::EmptyTitle)
        } else {
            Ok(PostTitle(title))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for PostTitle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostTitle::new(inner).map_err(Error::custom)
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostContent(String);

impl PostContent {
    pub fn new(content: String) -> Result<Self, InvalidPostTextError> {
        if content.trim().is_empty() {
            Err(InvalidPostTextError::EmptyContent)
        } else {
            Ok(PostContent(content))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for PostContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostContent::new(inner).map_err(Error::custom)
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Not a resolved image URL: {0}")]
pub struct InvalidImageUrlError(String);

/// URL of an image already resolved by the external image store. A local
/// staging path never satisfies this, so a half-ingested image cannot be
/// persisted by construction.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageUrl(String);

impl ImageUrl {
    pub fn new(url: String) -> Result<Self, InvalidImageUrlError> {
        if url.starts_with("https://") || url.starts_with("http://") {
            Ok(ImageUrl(url))
        } else {
            Err(InvalidImageUrlError(url))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for ImageUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        ImageUrl::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"ImageUrl"))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub category: Category,
    pub title: PostTitle,
    pub content: PostContent,
    pub image: ImageUrl,
    pub author: Id<UserMarker>,
    pub created_at: UtcDateTime,
}

impl Post {
    /// Ownership predicate used to gate mutation.
    #[must_use]
    pub fn is_authored_by(&self, actor: Id<UserMarker>) -> bool {
        self.author == actor
    }
}

/// A post joined with its author's public profile, the shape served by
/// the public listing endpoints.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PostWithAuthor {
    pub id: Id<PostMarker>,
    pub category: Category,
    pub title: PostTitle,
    pub content: PostContent,
    pub image: ImageUrl,
    pub author: User,
    pub created_at: UtcDateTime,
}
