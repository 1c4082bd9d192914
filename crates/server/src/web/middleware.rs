use crate::config::Cors;
use crate::state::AppState;
use crate::web::auth::token;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::CorsLayer;
use vcloud_common::prelude::{AuthError, Error, Result};

/// A middleware to print a blank line after each response.
///
/// This serves as a simple visual separator between requests in the development
/// console logs.
pub async fn log_mapper(res: Response) -> Response {
    #[cfg(debug_assertions)]
    println!();

    res
}

/// Axum middleware to require authentication.
/// Extracts the Bearer token from the `Authorization` header,
/// validates it, and stores the resulting claims in the request extensions.
///
/// # Arguments
///
/// * `app_state`: Shared state holding the token settings.
/// * `request`: Body of the incoming request.
/// * `next`: `Next` middleware in the chain.
///
/// # Returns
///
/// Response from the next middleware if authentication is successful.
///
pub async fn require_auth(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|slice| slice.strip_prefix("Bearer "))
        .ok_or(Error::Auth(AuthError::Token))?;

    let claims = token::validate(bearer, &app_state.token)?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Configures CORS from the application settings.
///
pub fn allow_cors(cors: &Cors) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(cors.allow_origin())
        .allow_methods(cors.allow_methods())
        .allow_headers(cors.allow_headers())
}
