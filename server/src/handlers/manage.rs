use crate::{error::plain_text, AppState};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

/// Body of `POST /manage/`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewLink {
    #[serde(alias = "key")]
    key: String,
    #[serde(alias = "target")]
    target: String,
}

/// POST /manage/
///
/// Registers `Key → Target` and persists the database. The body is parsed by
/// hand so that every malformed body (empty, not JSON, missing or empty
/// fields) is answered the same way.
pub async fn create_link(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let link = match serde_json::from_slice::<NewLink>(&body) {
        Ok(link) if !link.key.is_empty() && !link.target.is_empty() => link,
        _ => {
            return plain_text(StatusCode::UNPROCESSABLE_ENTITY, "Unprocessable Entity");
        }
    };

    if let Err(e) = state.store.add(&link.key, &link.target).await {
        tracing::info!("Rejected link '{}': {}", link.key, e);
        return e.into_response();
    }
    tracing::info!("Created link '{}' → {}", link.key, link.target);

    if let Err(e) = state.store.save("").await {
        // Not durable, so not created either.
        state.store.remove(&link.key).await;
        tracing::warn!("Rolled back link '{}' after failed save", link.key);
        return e.into_response();
    }

    StatusCode::CREATED.into_response()
}
