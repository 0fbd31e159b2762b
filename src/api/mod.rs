use std::{sync::Arc, time::Instant};

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{from_fn, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app_state::AppState;

pub mod middleware;
pub mod response;
pub mod transfer_api;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(transfer_api::health))
        .route("/api/v1/chains", get(transfer_api::list_chains))
        .route("/api/v1/chains/:chain/transfer", post(transfer_api::transfer))
        .route("/api/v1/chains/:chain/raw_sign", post(transfer_api::raw_sign))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(from_fn(middleware::trace_id_middleware))
                .layer(from_fn(add_response_time_header)),
        )
        .with_state(state)
}

async fn add_response_time_header(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut resp = next.run(req).await;
    let elapsed_ms = start.elapsed().as_millis();
    if let Ok(value) = HeaderValue::from_str(&format!("{}ms", elapsed_ms)) {
        resp.headers_mut().insert("x-response-time", value);
    }
    resp
}
