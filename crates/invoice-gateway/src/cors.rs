//! CORS policy: browsers may call the API only from pages served by this machine

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Whether an `Origin` header names `localhost` or `127.0.0.1`
pub fn is_local_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let Ok(url) = url::Url::parse(origin) else {
        return false;
    };

    match url.host_str() {
        Some(host) => host.eq_ignore_ascii_case("localhost") || host == "127.0.0.1",
        None => false,
    }
}

pub fn local_only() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin, _| is_local_origin(origin)))
        .allow_methods(Any)
        .allow_headers(Any)
}
