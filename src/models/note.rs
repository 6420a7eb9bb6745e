use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of notes a single user may hold.
pub const MAX_NOTES_PER_USER: usize = 3;

/// A titled free-text note.
///
/// Notes are addressed in URLs by a slug derived from the title; see
/// [`Note::matches_slug`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Free text, rendered as-is with line breaks preserved.
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// URL path segment for this note.
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    /// Whether `slug` names this note, ignoring case and word separators.
    pub fn matches_slug(&self, slug: &str) -> bool {
        normalize_title(&self.title) == normalize_title(slug)
    }
}

/// Input for creating a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Form body for removing a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteNoteInput {
    #[serde(default)]
    pub note_id: String,
}

fn words(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Lower-cased words of `s` joined by single spaces.
///
/// `"My-First_Note"`, `"my first note"` and `"  MY FIRST NOTE "` all
/// normalize to `"my first note"`.
pub fn normalize_title(s: &str) -> String {
    words(s).collect::<Vec<_>>().join(" ")
}

/// Lower-cased words of `s` joined by `-`.
pub fn slugify(s: &str) -> String {
    words(s).collect::<Vec<_>>().join("-")
}
