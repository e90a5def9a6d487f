use crate::{error::plain_text, resolver::Resolver};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

/// What a route does with a resolved target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessAction {
    /// 307 Temporary Redirect to the target.
    Redirect,
    /// 200 OK with the raw target as the body.
    Print,
}

impl SuccessAction {
    fn respond(self, target: String) -> Response {
        match self {
            Self::Redirect => match HeaderValue::try_from(target.as_str()) {
                Ok(location) => {
                    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
                }
                Err(_) => {
                    tracing::error!("Stored target '{}' is not a valid Location header", target);
                    plain_text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                }
            },
            Self::Print => (StatusCode::OK, target).into_response(),
        }
    }
}

/// Serves every path below `prefix`: the rest of the path is the short key,
/// which is looked up through the resolver and answered with `action`.
#[derive(Clone)]
pub struct Redirector {
    prefix: &'static str,
    resolver: Arc<dyn Resolver>,
    action: SuccessAction,
}

impl Redirector {
    /// `prefix` is the namespace root including both slashes, e.g. `"/r/"`.
    pub fn new(prefix: &'static str, resolver: Arc<dyn Resolver>, action: SuccessAction) -> Self {
        Self {
            prefix,
            resolver,
            action,
        }
    }

    /// Extract the short key from an (escaped) request path.
    ///
    /// Returns `None` for the bare namespace root.
    pub fn key<'a>(&self, path: &'a str) -> Option<&'a str> {
        let key = path.strip_prefix(self.prefix).unwrap_or(path);
        if key.is_empty() || key == "/" {
            None
        } else {
            Some(key)
        }
    }

    /// GET `<prefix><key>`
    ///
    /// 1. Extract the key (bare root → not found, resolver untouched).
    /// 2. Resolve it.
    /// 3. Run the success action, or answer 404.
    pub async fn respond(&self, path: &str) -> Response {
        let target = match self.key(path) {
            Some(key) => self.resolver.resolve(key).await,
            None => None,
        };

        match target {
            Some(target) if !target.is_empty() => self.action.respond(target),
            _ => plain_text(StatusCode::NOT_FOUND, "Not Found"),
        }
    }

    /// Routes for the namespace root and everything below it.
    pub fn into_router(self) -> Router {
        let prefix = self.prefix;
        Router::new()
            .route(prefix, get(handle))
            .route(&format!("{prefix}*key"), get(handle))
            .with_state(Arc::new(self))
    }
}

async fn handle(State(redirector): State<Arc<Redirector>>, uri: Uri) -> Response {
    redirector.respond(uri.path()).await
}
