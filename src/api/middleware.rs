//! Login gate for the pages that need a signed-in user.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::Result;
use crate::models::User;
use crate::session;
use crate::AppState;

/// The signed-in user, placed in request extensions by [`require_login`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Redirect anonymous requests to the login page before the handler runs.
///
/// A session naming a user that no longer exists is flushed and treated as
/// anonymous.
pub async fn require_login(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let Some(user_id) = session::current_user_id(&session).await? else {
        tracing::debug!(
            "Anonymous {} {}, redirecting to login",
            request.method(),
            request.uri().path()
        );
        return Ok(Redirect::to("/").into_response());
    };

    let Some(user) = state.db.get_user(user_id)? else {
        tracing::warn!("Session refers to unknown user {}, clearing it", user_id);
        session::sign_out(&session).await?;
        return Ok(Redirect::to("/").into_response());
    };

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
