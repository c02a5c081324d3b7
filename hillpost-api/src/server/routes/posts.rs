use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json, upload::UploadSpool,
};
use crate::service::{
    query::{PostDetail, PostQueryService},
    write::PostWriteService,
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
};
use axum_extra::routing::{RouterExt, TypedPath};
use hillpost_common::model::{
    Id,
    post::{Category, Post, PostMarker, PostWithAuthor},
};
use hillpost_db::client::DbClient;
use serde::Deserialize;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_post)
        .typed_patch(update_post)
        .typed_get(list_posts)
        .typed_get(my_posts)
        .typed_get(full_post)
        .typed_get(category_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/create", rejection(ServerError))]
struct CreatePostPath();

async fn create_post(
    CreatePostPath(): CreatePostPath,
    State(uploads): State<UploadSpool>,
    State(write): State<PostWriteService<DbClient>>,
    actor: AuthenticatedUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Post>)> {
    let form = uploads.read_form(multipart).await?;
    let input = form.into_create_input()?;

    let post = write.create(actor.user_id(), input).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct UpdatePostPath {
    id: Id<PostMarker>,
}

async fn update_post(
    UpdatePostPath { id }: UpdatePostPath,
    State(uploads): State<UploadSpool>,
    State(write): State<PostWriteService<DbClient>>,
    actor: AuthenticatedUser,
    multipart: Multipart,
) -> Result<Json<Post>> {
    let form = uploads.read_form(multipart).await?;
    let input = form.into_update_input()?;

    let post = write.update(actor.user_id(), id, input).await?;

    Ok(Json(post))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct ListPostsPath();

async fn list_posts(
    ListPostsPath(): ListPostsPath,
    State(query): State<PostQueryService<DbClient>>,
) -> Result<Json<Vec<PostWithAuthor>>> {
    let posts = query.list_all().await?;

    Ok(Json(posts))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/mine", rejection(ServerError))]
struct MyPostsPath();

async fn my_posts(
    MyPostsPath(): MyPostsPath,
    State(query): State<PostQueryService<DbClient>>,
    actor: AuthenticatedUser,
) -> Result<Json<Vec<Post>>> {
    let posts = query.list_by_author(actor.user_id()).await?;

    Ok(Json(posts))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/full", rejection(ServerError))]
struct FullPostPath {
    id: Id<PostMarker>,
}

async fn full_post(
    FullPostPath { id }: FullPostPath,
    State(query): State<PostQueryService<DbClient>>,
) -> Result<Json<PostDetail>> {
    let detail = query.get_full(id).await?;

    Ok(Json(detail))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/category/{category}", rejection(ServerError))]
struct CategoryPostsPath {
    category: Category,
}

async fn category_posts(
    CategoryPostsPath { category }: CategoryPostsPath,
    State(query): State<PostQueryService<DbClient>>,
) -> Result<Json<Vec<PostWithAuthor>>> {
    let posts = query.list_by_category(category).await?;

    Ok(Json(posts))
}
