use axum::{
    extract::State,
    response::{Html, Redirect},
    Extension, Form,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::CurrentUser;
use crate::error::Result;
use crate::models::{CreateTodoInput, DeleteTodoInput};
use crate::quotes::fallback_quote;
use crate::session;
use crate::views;
use crate::AppState;

/// The dashboard: quote of the day, to-do list and note titles.
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Html<String>> {
    let quote = match state.quotes.random_quote().await {
        Ok(quote) => quote,
        Err(e) => {
            tracing::warn!("Quote fetch failed, using fallback: {}", e);
            fallback_quote()
        }
    };

    let todos = state.db.list_todos(user.id)?;
    let notes = state.db.list_notes(user.id)?;
    let flashes = session::take_flashes(&session).await?;

    Ok(Html(views::dashboard(&user, &quote, &todos, &notes, &flashes)))
}

pub async fn add_todo(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(input): Form<CreateTodoInput>,
) -> Result<Redirect> {
    let content = input.content.trim();
    if content.is_empty() {
        return Ok(Redirect::to("/main"));
    }

    let todo = state.db.add_todo(
        user.id,
        CreateTodoInput {
            content: content.to_string(),
        },
    )?;
    tracing::debug!("User {} added todo {}", user.id, todo.id);

    Ok(Redirect::to("/main"))
}

/// Unknown or malformed ids leave the list unchanged.
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(input): Form<DeleteTodoInput>,
) -> Result<Redirect> {
    match Uuid::parse_str(input.todo_id.trim()) {
        Ok(todo_id) => {
            if state.db.delete_todo(user.id, todo_id)? {
                tracing::debug!("User {} deleted todo {}", user.id, todo_id);
            } else {
                tracing::debug!("User {} has no todo {}", user.id, todo_id);
            }
        }
        Err(_) => tracing::debug!("Ignoring malformed todo id {:?}", input.todo_id),
    }

    Ok(Redirect::to("/main"))
}
