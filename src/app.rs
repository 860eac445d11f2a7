use std::net::SocketAddr;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;
use crate::{blogs, users};

pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.client_url);

    Router::new()
        .nest("/api/v1/user", users::router())
        .nest("/api/v1/blogs", blogs::router())
        .fallback(|| async { (StatusCode::NOT_FOUND, "OOPS!! 404 page not found") })
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

/// Credentials (the session cookie) require an exact allowed origin; a
/// wildcard origin cannot be combined with credentials, so `*` falls
/// back to a credential-less permissive policy.
fn cors_layer(client_url: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match client_url.parse::<HeaderValue>() {
        Ok(origin) if client_url != "*" => base.allow_origin(origin).allow_credentials(true),
        _ => base.allow_origin(Any),
    }
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
