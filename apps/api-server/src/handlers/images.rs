//! Post image uploads.

use actix_web::{HttpRequest, HttpResponse, web};

use archive_shared::dto::{ImageUploadResponse, UploadQuery};

use super::upload_file;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/images?filename= - raw image bytes in the body.
pub async fn upload_image(
    state: web::Data<AppState>,
    identity: Identity,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    payload: web::Payload,
) -> AppResult<HttpResponse> {
    let file = upload_file(&req, query.into_inner(), payload, state.upload_limit).await?;
    let stored = state
        .images
        .upload_post_image(&identity.account(), file)
        .await?;

    Ok(HttpResponse::Created().json(ImageUploadResponse {
        key: stored.key.to_string(),
        url: stored.url,
    }))
}
