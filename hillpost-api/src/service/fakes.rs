//! In-memory stand-ins for the repository and image store, used by the
//! service tests.

use async_trait::async_trait;
use hillpost_common::model::{
    Id,
    post::{Category, ImageUrl, Post, PostContent, PostMarker, PostTitle, PostWithAuthor},
    user::{User, UserHandle, UserMarker},
};
use hillpost_db::repository::{PostRepository, Result as DbResult};
use hillpost_images::{ImageStore, ImageStoreError, Result as ImageResult};
use std::{
    path::Path,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use time::UtcDateTime;

pub(crate) fn sample_user(handle: &str) -> User {
    User {
        id: Id::random(),
        handle: UserHandle::new(handle.to_owned()).unwrap(),
        display_name: None,
    }
}

pub(crate) fn sample_post(
    author: Id<UserMarker>,
    category: Category,
    title: &str,
    content: &str,
) -> Post {
    Post {
        id: Id::random(),
        category,
        title: PostTitle::new(title.to_owned()).unwrap(),
        content: PostContent::new(content.to_owned()).unwrap(),
        image: ImageUrl::new("https://img.example/f1.jpg".to_owned()).unwrap(),
        author,
        created_at: UtcDateTime::now(),
    }
}

#[derive(Default)]
pub(crate) struct FakeRepo {
    posts: Mutex<Vec<Post>>,
    users: Mutex<Vec<User>>,
    user_fetches: AtomicUsize,
}

impl FakeRepo {
    pub(crate) fn seed_post(&self, post: Post) {
        self.posts.lock().unwrap().push(post);
    }

    pub(crate) fn seed_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub(crate) fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub(crate) fn stored_post(&self, id: Id<PostMarker>) -> Option<Post> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|post| post.id == id)
            .cloned()
    }

    pub(crate) fn user_fetch_count(&self) -> usize {
        self.user_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostRepository for FakeRepo {
    async fn fetch_post(&self, post_id: Id<PostMarker>) -> DbResult<Option<Post>> {
        Ok(self.stored_post(post_id))
    }

    async fn insert_post(&self, post: &Post) -> DbResult<()> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(())
    }

    async fn update_post(&self, post: &Post) -> DbResult<()> {
        let mut posts = self.posts.lock().unwrap();
        if let Some(stored) = posts.iter_mut().find(|stored| stored.id == post.id) {
            *stored = post.clone();
        }
        Ok(())
    }

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> DbResult<Option<User>> {
        self.user_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == user_id)
            .cloned())
    }

    async fn posts_by_author(&self, author: Id<UserMarker>) -> DbResult<Vec<Post>> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|post| post.author == author)
            .cloned()
            .collect())
    }

    async fn posts_with_authors(
        &self,
        category: Option<Category>,
    ) -> DbResult<Vec<PostWithAuthor>> {
        let users = self.users.lock().unwrap().clone();
        let joined = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|post| category.is_none_or(|category| post.category == category))
            .filter_map(|post| {
                let author = users.iter().find(|user| user.id == post.author)?;
                Some(PostWithAuthor {
                    id: post.id,
                    category: post.category,
                    title: post.title.clone(),
                    content: post.content.clone(),
                    image: post.image.clone(),
                    author: author.clone(),
                    created_at: post.created_at,
                })
            })
            .collect();
        Ok(joined)
    }
}

pub(crate) struct FakeImageStore {
    url: Option<String>,
    ingests: AtomicUsize,
}

impl FakeImageStore {
    pub(crate) fn resolving(url: &str) -> Self {
        Self {
            url: Some(url.to_owned()),
            ingests: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            url: None,
            ingests: AtomicUsize::new(0),
        }
    }

    pub(crate) fn ingest_count(&self) -> usize {
        self.ingests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageStore for FakeImageStore {
    async fn ingest(&self, _local: &Path) -> ImageResult<ImageUrl> {
        self.ingests.fetch_add(1, Ordering::SeqCst);
        match &self.url {
            Some(url) => Ok(ImageUrl::new(url.clone()).unwrap()),
            None => Err(ImageStoreError::MissingUrl),
        }
    }
}
