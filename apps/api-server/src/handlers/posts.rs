//! Post handlers: the public archive and authoring.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use archive_core::domain::{Post, PostBuckets, PostInput, Profile};
use archive_core::services::ArchiveEntry;
use archive_shared::dto::{
    AuthorSummary, PostBucketsResponse, PostResponse, PostSummary, SavePostRequest,
};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn author_summary(profile: &Profile) -> AuthorSummary {
    AuthorSummary {
        id: profile.id,
        name: profile.display_name().to_string(),
        avatar_url: profile.avatar_url.clone(),
    }
}

fn post_response(post: Post, author: Option<&Profile>) -> PostResponse {
    PostResponse {
        reading_time_minutes: post.reading_time_minutes(),
        author: author.map(author_summary),
        id: post.id,
        author_id: post.author_id,
        title: post.title,
        slug: post.slug,
        content: post.content,
        excerpt: post.excerpt,
        featured_image: post.featured_image,
        images: post.images,
        published: post.published,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

fn post_summary(post: Post, author: Option<&Profile>) -> PostSummary {
    PostSummary {
        reading_time_minutes: post.reading_time_minutes(),
        author: author.map(author_summary),
        id: post.id,
        title: post.title,
        slug: post.slug,
        excerpt: post.excerpt,
        featured_image: post.featured_image,
        published: post.published,
        created_at: post.created_at,
    }
}

fn post_input(body: SavePostRequest) -> PostInput {
    PostInput {
        title: body.title,
        content: body.content,
        excerpt: body.excerpt,
        featured_image: body.featured_image,
        images: body.images,
        published: body.published,
    }
}

/// GET /api/posts
pub async fn list_archive(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let entries = state.posts.list_archive().await?;

    let summaries: Vec<PostSummary> = entries
        .into_iter()
        .map(|ArchiveEntry { post, author }| post_summary(post, author.as_ref()))
        .collect();

    Ok(HttpResponse::Ok().json(summaries))
}

/// GET /api/posts/{slug} - drafts are only visible to their author.
pub async fn get_post(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let viewer = viewer.account();

    let ArchiveEntry { post, author } = state
        .posts
        .get_post_by_slug(&slug, viewer.as_ref())
        .await?;

    Ok(HttpResponse::Ok().json(post_response(post, author.as_ref())))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<SavePostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .create_post(&identity.account(), post_input(body.into_inner()))
        .await?;

    Ok(HttpResponse::Created().json(post_response(post, None)))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<SavePostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .update_post(
            &identity.account(),
            path.into_inner(),
            post_input(body.into_inner()),
        )
        .await?;

    Ok(HttpResponse::Ok().json(post_response(post, None)))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete_post(&identity.account(), path.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/me/posts
pub async fn my_posts(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let PostBuckets { published, drafts } = state.posts.my_posts(&identity.account()).await?;

    Ok(HttpResponse::Ok().json(PostBucketsResponse {
        published: published.into_iter().map(|p| post_summary(p, None)).collect(),
        drafts: drafts.into_iter().map(|p| post_summary(p, None)).collect(),
    }))
}
