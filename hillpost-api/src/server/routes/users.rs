use crate::server::{Result, ServerError, ServerRouter, json::Json};
use crate::service::query::{AuthorPosts, PostQueryService};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use hillpost_common::model::{Id, user::UserMarker};
use hillpost_db::client::DbClient;
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(author_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/posts", rejection(ServerError))]
struct AuthorPostsPath {
    id: Id<UserMarker>,
}

async fn author_posts(
    AuthorPostsPath { id }: AuthorPostsPath,
    State(query): State<PostQueryService<DbClient>>,
) -> Result<Json<AuthorPosts>> {
    let profile = query.author_posts(id).await?;

    Ok(Json(profile))
}
