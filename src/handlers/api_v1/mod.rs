pub mod evidence;
pub mod meetings;
pub mod reviews;
pub mod ttfus;
pub mod users;

use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::require_auth;
use crate::errors::ApiErrorResponse;

/// Success envelope for every API response: `{success: true, data}`.
#[derive(Serialize, Debug)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        success: true,
        data,
    })
}

pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse {
        success: true,
        data,
    })
}

/// Generic paginated payload inside the success envelope.
#[derive(Serialize, Debug)]
pub struct PaginatedData<T: Serialize> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Page/limit query parameters shared by the list endpoints.
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Upper bound on `page` so the OFFSET arithmetic can never overflow.
pub(crate) const MAX_PAGE: i64 = 100_000;

impl PageQuery {
    /// Clamp to 1 <= page <= MAX_PAGE and 1 <= limit <= 100 (default 25).
    pub fn clamp(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = self.limit.unwrap_or(25).clamp(1, 100);
        (page, per_page)
    }
}

/// CSRF protection for REST API mutation endpoints.
///
/// Rejects POST/PUT/DELETE requests that don't have Content-Type:
/// application/json. Browsers cannot send cross-origin JSON with cookies
/// via simple form POST, so the Content-Type check acts as a CSRF guard
/// without requiring tokens. GET requests are exempt.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = HttpResponse::BadRequest().json(ApiErrorResponse {
                error: "Content-Type must be application/json for mutation requests".to_string(),
                details: None,
            });
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Configure API v1 routes. The auth scope is public; everything else
/// requires a session.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("/login", web::post().to(crate::handlers::auth_handlers::login))
            .route("/logout", web::post().to(crate::handlers::auth_handlers::logout))
            .route("/me", web::get().to(crate::handlers::auth_handlers::me)),
    );
    cfg.service(
        web::scope("/users")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .wrap(actix_web::middleware::from_fn(require_auth))
            .route("", web::get().to(users::list))
            .route("", web::post().to(users::create))
            .route("/{id}", web::get().to(users::read))
            .route("/{id}", web::delete().to(users::delete)),
    );
    cfg.service(
        web::scope("/meetings")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .wrap(actix_web::middleware::from_fn(require_auth))
            .route("", web::get().to(meetings::list))
            .route("", web::post().to(meetings::create))
            .route("/{id}", web::get().to(meetings::read))
            .route("/{id}", web::delete().to(meetings::delete))
            .route("/{id}/participants", web::post().to(meetings::add_participant)),
    );
    cfg.service(
        web::scope("/ttfus")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .wrap(actix_web::middleware::from_fn(require_auth))
            .route("", web::get().to(ttfus::list))
            .route("", web::post().to(ttfus::create))
            .route("/{id}", web::get().to(ttfus::read))
            .route("/{id}", web::delete().to(ttfus::delete))
            .route("/{id}/status", web::put().to(ttfus::update_status))
            .route("/{id}/evidence", web::get().to(evidence::list))
            .route("/{id}/evidence", web::post().to(evidence::create)),
    );
    cfg.service(
        web::scope("/evidence")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .wrap(actix_web::middleware::from_fn(require_auth))
            .route("/{id}/reviews", web::get().to(reviews::list))
            .route("/{id}/reviews", web::post().to(reviews::create)),
    );
}
