//! Profile and avatar handlers.

use actix_web::{HttpRequest, HttpResponse, web};

use archive_core::domain::{Profile, ProfileOverview};
use archive_shared::dto::{ProfileResponse, UpdateProfileRequest, UploadQuery};

use super::upload_file;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn profile_response(profile: Profile, counts: Option<(usize, usize)>) -> ProfileResponse {
    ProfileResponse {
        id: profile.id,
        email: profile.email,
        full_name: profile.full_name,
        avatar_url: profile.avatar_url,
        published_count: counts.map(|(published, _)| published),
        draft_count: counts.map(|(_, drafts)| drafts),
        created_at: profile.created_at,
        updated_at: profile.updated_at,
    }
}

/// GET /api/profile
pub async fn get_profile(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let ProfileOverview {
        profile,
        published_count,
        draft_count,
    } = state.profiles.get_profile(&identity.account()).await?;

    Ok(HttpResponse::Ok().json(profile_response(
        profile,
        Some((published_count, draft_count)),
    )))
}

/// PUT /api/profile
pub async fn update_profile(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let profile = state
        .profiles
        .update_profile(&identity.account(), body.into_inner().full_name)
        .await?;

    Ok(HttpResponse::Ok().json(profile_response(profile, None)))
}

/// PUT /api/profile/avatar?filename= - raw image bytes in the body.
pub async fn upload_avatar(
    state: web::Data<AppState>,
    identity: Identity,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    payload: web::Payload,
) -> AppResult<HttpResponse> {
    let file = upload_file(&req, query.into_inner(), payload, state.upload_limit).await?;
    let profile = state
        .profiles
        .upload_avatar(&identity.account(), file)
        .await?;

    Ok(HttpResponse::Ok().json(profile_response(profile, None)))
}

/// DELETE /api/profile/avatar
pub async fn delete_avatar(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let profile = state.profiles.delete_avatar(&identity.account()).await?;

    Ok(HttpResponse::Ok().json(profile_response(profile, None)))
}
