//! Admin authorization for the product write endpoints.

use crate::config::AuthConfig;
use crate::server::{AppContext, AppError};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeader,
};
use storefront_common::Error;
use subtle::ConstantTimeEq;

/// Whether `token` grants admin access.
///
/// With no token configured nothing is accepted.
fn check_admin(auth_config: &AuthConfig, token: Option<&str>) -> bool {
    match (auth_config.admin_token.as_deref(), token) {
        (Some(expected), Some(given)) => {
            expected.len() == given.len() && expected.as_bytes().ct_eq(given.as_bytes()).into()
        }
        _ => false,
    }
}

/// Middleware requiring `Authorization: Bearer <admin token>`.
pub async fn admin_auth_middleware(
    State(ctx): State<AppContext>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer.as_ref().map(|b| b.token());

    if check_admin(&ctx.config.server.auth, token) {
        return next.run(request).await;
    }

    tracing::debug!(
        "Rejected admin request {} {}",
        request.method(),
        request.uri().path()
    );
    let mut response =
        AppError::from(Error::unauthorized("Invalid admin token")).into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}

/// Generate a random admin token
pub fn generate_token() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
