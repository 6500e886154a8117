/// Caller identity layers
///
/// [`authenticate_layer`] runs on every route: it validates a bearer token
/// when one is sent and stores the [`AuthContext`] in request extensions.
/// Requests without a token continue anonymously; requests with a bad token
/// stop here with 401.
///
/// [`require_auth_layer`] additionally rejects anonymous requests on the
/// routes it wraps.
///
/// Write handlers call [`resolve_actor`] to find the user a write is
/// attributed to.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use kanbanflow_shared::auth::{
    identity::{self, Actor},
    middleware::{authenticate, AuthContext},
};
use tracing::{debug, warn};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Attaches an [`AuthContext`] for requests carrying a valid access token
pub async fn authenticate_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    if let Some(auth) = authenticate(req.headers(), state.jwt_secret())? {
        debug!(user_id = %auth.user_id, "Request authenticated");
        req.extensions_mut().insert(auth);
    }

    Ok(next.run(req).await)
}

/// Rejects requests that [`authenticate_layer`] left anonymous
pub async fn require_auth_layer(req: Request, next: Next) -> ApiResult<Response> {
    if req.extensions().get::<AuthContext>().is_none() {
        return Err(ApiError::Unauthorized(
            "Authentication credentials were not provided.".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

/// Resolves the user a write is attributed to
///
/// An authenticated caller always wins. Anonymous callers get the
/// placeholder user when the fallback is enabled, and 401 otherwise.
pub async fn resolve_actor(state: &AppState, auth: Option<&AuthContext>) -> ApiResult<Actor> {
    if let Some(auth) = auth {
        return Ok(identity::resolve_authenticated(&state.db, auth.user_id).await?);
    }

    if !state.config.identity.placeholder_fallback {
        return Err(ApiError::Unauthorized(
            "Authentication credentials were not provided.".to_string(),
        ));
    }

    let actor = identity::resolve_placeholder(&state.db).await?;
    warn!(
        user_id = %actor.id(),
        username = %actor.user().username,
        "Anonymous write attributed to placeholder user; not for production use"
    );

    Ok(actor)
}
