use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::CurrentUser;
use crate::error::{AppError, Result};
use crate::models::{normalize_title, CreateNoteInput, DeleteNoteInput, MAX_NOTES_PER_USER};
use crate::session;
use crate::views;
use crate::AppState;

pub const NOTE_LIMIT_MESSAGE: &str = "You can only keep 3 notes. Delete one to write another.";
pub const MISSING_TITLE_MESSAGE: &str = "A note needs a title with at least one letter or digit.";

/// The note form, or back to the dashboard when the user is at capacity.
pub async fn new_note(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response> {
    if state.db.count_notes(user.id)? >= MAX_NOTES_PER_USER {
        session::flash(&session, NOTE_LIMIT_MESSAGE).await?;
        return Ok(Redirect::to("/main").into_response());
    }

    let flashes = session::take_flashes(&session).await?;
    Ok(Html(views::create_note_page(&flashes)).into_response())
}

pub async fn create_note(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(input): Form<CreateNoteInput>,
) -> Result<Redirect> {
    // A title with no letters or digits has no slug to address it by.
    let title = input.title.trim();
    if normalize_title(title).is_empty() {
        session::flash(&session, MISSING_TITLE_MESSAGE).await?;
        return Ok(Redirect::to("/create"));
    }

    let input = CreateNoteInput {
        title: title.to_string(),
        content: input.content,
    };

    match state.db.create_note(user.id, input) {
        Ok(note) => {
            tracing::debug!("User {} created note {}", user.id, note.id);
            Ok(Redirect::to("/main"))
        }
        Err(AppError::NoteLimitReached) => {
            tracing::info!("User {} is at the note limit", user.id);
            session::flash(&session, NOTE_LIMIT_MESSAGE).await?;
            Ok(Redirect::to("/main"))
        }
        Err(e) => Err(e),
    }
}

pub async fn show_note(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(slug): Path<String>,
) -> Result<Response> {
    let Some(note) = state.db.find_note_by_slug(user.id, &slug)? else {
        return Ok((
            StatusCode::NOT_FOUND,
            Html(views::not_found_page("There is no note with that title.")),
        )
            .into_response());
    };

    let flashes = session::take_flashes(&session).await?;
    Ok(Html(views::note_page(&note, &flashes)).into_response())
}

/// The note is chosen by the id in the form; the slug only names the page
/// the form was on.
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(slug): Path<String>,
    Form(input): Form<DeleteNoteInput>,
) -> Result<Redirect> {
    match Uuid::parse_str(input.note_id.trim()) {
        Ok(note_id) => {
            if state.db.delete_note(user.id, note_id)? {
                tracing::debug!("User {} deleted note {} ({})", user.id, note_id, slug);
            } else {
                tracing::debug!("User {} has no note {}", user.id, note_id);
            }
        }
        Err(_) => tracing::debug!("Ignoring malformed note id {:?}", input.note_id),
    }

    Ok(Redirect::to("/main"))
}
