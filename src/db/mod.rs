mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

/// Shared handle to the SQLite database.
///
/// All access goes through one connection behind a mutex, so every operation
/// below observes and mutates a consistent view of a user's records.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        tracing::info!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> anyhow::Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "pocketdesk")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("pocketdesk.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // User operations
    // ============================================================

    pub fn count_users(&self) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let user = conn
            .query_row(
                "SELECT id, username, password_hash, google_id, created_at
                 FROM users WHERE id = ?",
                [id.to_string()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        find_user_by_username(&conn, username)
    }

    /// Insert a local account. Fails with [`AppError::UsernameTaken`] if the
    /// username already exists; the existing account is left untouched.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let conn = self.conn.lock().expect("database lock poisoned");

        if find_user_by_username(&conn, username)?.is_some() {
            return Err(AppError::UsernameTaken);
        }

        insert_user(&conn, username, Some(password_hash), None)
    }

    /// Find the account linked to a Google profile, creating it on first
    /// sign-in with the profile email as username.
    ///
    /// An existing local account whose username equals the email is not
    /// linked; that case fails with [`AppError::UsernameTaken`].
    pub fn find_or_create_google_user(&self, profile: &GoogleProfile) -> Result<User> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let existing = conn
            .query_row(
                "SELECT id, username, password_hash, google_id, created_at
                 FROM users WHERE google_id = ?",
                [&profile.id],
                user_from_row,
            )
            .optional()?;
        if let Some(user) = existing {
            return Ok(user);
        }

        if find_user_by_username(&conn, &profile.email)?.is_some() {
            return Err(AppError::UsernameTaken);
        }

        let user = insert_user(&conn, &profile.email, None, Some(&profile.id))?;
        tracing::info!("Created user {} from Google sign-in", user.id);
        Ok(user)
    }

    // ============================================================
    // Todo operations
    // ============================================================

    pub fn list_todos(&self, user_id: Uuid) -> Result<Vec<Todo>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, user_id, content, created_at
             FROM todos WHERE user_id = ? ORDER BY rowid",
        )?;

        let todos = stmt
            .query_map([user_id.to_string()], |row| {
                Ok(Todo {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    user_id: parse_uuid(row.get::<_, String>(1)?),
                    content: row.get(2)?,
                    created_at: parse_datetime(row.get::<_, String>(3)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(todos)
    }

    pub fn add_todo(&self, user_id: Uuid, input: CreateTodoInput) -> Result<Todo> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO todos (id, user_id, content, created_at) VALUES (?, ?, ?, ?)",
            (
                id.to_string(),
                user_id.to_string(),
                &input.content,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Todo {
            id,
            user_id,
            content: input.content,
            created_at: now,
        })
    }

    /// Remove one of the user's todos. Returns `false` if the user has no
    /// todo with that id.
    pub fn delete_todo(&self, user_id: Uuid, todo_id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "DELETE FROM todos WHERE id = ? AND user_id = ?",
            [todo_id.to_string(), user_id.to_string()],
        )?;
        Ok(rows > 0)
    }

    // ============================================================
    // Note operations
    // ============================================================

    pub fn list_notes(&self, user_id: Uuid) -> Result<Vec<Note>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        list_notes(&conn, user_id)
    }

    pub fn count_notes(&self, user_id: Uuid) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        count_notes(&conn, user_id)
    }

    /// Add a note, refusing with [`AppError::NoteLimitReached`] once the user
    /// already holds [`MAX_NOTES_PER_USER`] notes. The count and the insert
    /// run in one transaction.
    pub fn create_note(&self, user_id: Uuid, input: CreateNoteInput) -> Result<Note> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        if count_notes(&tx, user_id)? >= MAX_NOTES_PER_USER {
            return Err(AppError::NoteLimitReached);
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        tx.execute(
            "INSERT INTO notes (id, user_id, title, content, created_at) VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                user_id.to_string(),
                &input.title,
                &input.content,
                now.to_rfc3339(),
            ),
        )?;
        tx.commit()?;

        Ok(Note {
            id,
            user_id,
            title: input.title,
            content: input.content,
            created_at: now,
        })
    }

    /// First of the user's notes, in creation order, whose title matches `slug`.
    pub fn find_note_by_slug(&self, user_id: Uuid, slug: &str) -> Result<Option<Note>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let notes = list_notes(&conn, user_id)?;
        Ok(notes.into_iter().find(|note| note.matches_slug(slug)))
    }

    /// Remove one of the user's notes. Returns `false` if the user has no
    /// note with that id.
    pub fn delete_note(&self, user_id: Uuid, note_id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "DELETE FROM notes WHERE id = ? AND user_id = ?",
            [note_id.to_string(), user_id.to_string()],
        )?;
        Ok(rows > 0)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(row.get::<_, String>(0)?),
        username: row.get(1)?,
        password_hash: row.get(2)?,
        google_id: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, password_hash, google_id, created_at
             FROM users WHERE username = ?",
            [username],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

fn insert_user(
    conn: &Connection,
    username: &str,
    password_hash: Option<&str>,
    google_id: Option<&str>,
) -> Result<User> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO users (id, username, password_hash, google_id, created_at)
         VALUES (?, ?, ?, ?, ?)",
        (
            id.to_string(),
            username,
            password_hash,
            google_id,
            now.to_rfc3339(),
        ),
    )
    .map_err(|e| match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => AppError::UsernameTaken,
        _ => AppError::Database(e),
    })?;

    Ok(User {
        id,
        username: username.to_string(),
        password_hash: password_hash.map(str::to_string),
        google_id: google_id.map(str::to_string),
        created_at: now,
    })
}

fn list_notes(conn: &Connection, user_id: Uuid) -> Result<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, content, created_at
         FROM notes WHERE user_id = ? ORDER BY rowid",
    )?;

    let notes = stmt
        .query_map([user_id.to_string()], |row| {
            Ok(Note {
                id: parse_uuid(row.get::<_, String>(0)?),
                user_id: parse_uuid(row.get::<_, String>(1)?),
                title: row.get(2)?,
                content: row.get(3)?,
                created_at: parse_datetime(row.get::<_, String>(4)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(notes)
}

fn count_notes(conn: &Connection, user_id: Uuid) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM notes WHERE user_id = ?",
        [user_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
