//! HTTP handlers and route configuration.

mod health;
mod images;
mod posts;
mod profile;

use actix_web::{HttpRequest, http::header, web};

use archive_core::domain::UploadFile;
use archive_shared::dto::UploadQuery;

use crate::middleware::error::{AppError, AppResult};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            // Archive and authoring
            .service(
                web::resource("/posts")
                    .route(web::get().to(posts::list_archive))
                    .route(web::post().to(posts::create_post)),
            )
            // GET addresses a post by slug, PUT and DELETE by id
            .service(
                web::resource("/posts/{post}")
                    .route(web::get().to(posts::get_post))
                    .route(web::put().to(posts::update_post))
                    .route(web::delete().to(posts::delete_post)),
            )
            .route("/me/posts", web::get().to(posts::my_posts))
            .route("/images", web::post().to(images::upload_image))
            // Profile
            .service(
                web::resource("/profile")
                    .route(web::get().to(profile::get_profile))
                    .route(web::put().to(profile::update_profile)),
            )
            .service(
                web::resource("/profile/avatar")
                    .route(web::put().to(profile::upload_avatar))
                    .route(web::delete().to(profile::delete_avatar)),
            ),
    );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Build an upload from a raw request body of at most `limit` bytes.
async fn upload_file(
    req: &HttpRequest,
    query: UploadQuery,
    payload: web::Payload,
    limit: usize,
) -> AppResult<UploadFile> {
    let body = match payload.to_bytes_limited(limit).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => return Err(AppError::BadRequest(e.to_string())),
        Err(_) => {
            return Err(AppError::PayloadTooLarge(format!(
                "Image exceeds the {limit} byte upload limit"
            )));
        }
    };

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    Ok(UploadFile {
        filename: query.filename,
        content_type,
        bytes: body.to_vec(),
    })
}
