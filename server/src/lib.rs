//! Shortlink: a small URL shortener.
//!
//! Links live in a [`store::Store`] persisted as a flat JSON file. Short keys
//! are served under `/r/` (temporary redirect) and `/s/` (print target), and
//! new links are registered with `POST /manage/`.

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod resolver;
pub mod store;

use handlers::redirect::{Redirector, SuccessAction};
use resolver::{Resolver, StoreResolver};
use store::Store;

/// Namespace for redirecting short links.
pub const REDIRECT_PREFIX: &str = "/r/";
/// Namespace for showing the target of a short link.
pub const SHOW_PREFIX: &str = "/s/";

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub store: Arc<Store>,
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn build_router(state: Arc<AppState>) -> Router {
    let resolver: Arc<dyn Resolver> = Arc::new(StoreResolver::new(state.store.clone()));

    Router::new()
        // Liveness probe
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/manage/", post(handlers::manage::create_link))
        .with_state(state)
        .merge(
            Redirector::new(REDIRECT_PREFIX, resolver.clone(), SuccessAction::Redirect)
                .into_router(),
        )
        .merge(Redirector::new(SHOW_PREFIX, resolver, SuccessAction::Print).into_router())
        .fallback(|| async { error::plain_text(StatusCode::NOT_FOUND, "Not Found") })
        .layer(TraceLayer::new_for_http())
}
