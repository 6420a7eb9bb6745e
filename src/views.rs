//! Server-rendered HTML pages.
//!
//! Every value that originates from a user or a remote service goes through
//! [`escape`] before it is written into markup.

use std::fmt::Write;

use axum::http::StatusCode;

use crate::models::{Note, Todo, User, MAX_NOTES_PER_USER};
use crate::quotes::Quote;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flashes: &[String], signed_in: bool, body: &str) -> String {
    let mut flash_html = String::new();
    for message in flashes {
        let _ = write!(
            flash_html,
            r#"<div class="flash">{}</div>"#,
            escape(message)
        );
    }

    let nav = if signed_in {
        r#"<nav><a href="/main">Dashboard</a> <a href="/create">New note</a> <a href="/logout">Log out</a></nav>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · PocketDesk</title>
</head>
<body>
<header><h1>PocketDesk</h1>{nav}</header>
{flash_html}
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn google_button(google_enabled: bool) -> &'static str {
    if google_enabled {
        r#"<p><a class="google" href="/auth/google">Sign in with Google</a></p>"#
    } else {
        ""
    }
}

pub fn login_page(flashes: &[String], google_enabled: bool) -> String {
    let body = format!(
        r#"<h2>Log in</h2>
<form action="/" method="post">
<label>Username <input type="text" name="username" autocomplete="username" required></label>
<label>Password <input type="password" name="password" autocomplete="current-password" required></label>
<button type="submit">Log in</button>
</form>
{google}
<p>No account yet? <a href="/register">Register</a></p>"#,
        google = google_button(google_enabled),
    );
    layout("Log in", flashes, false, &body)
}

pub fn register_page(flashes: &[String], google_enabled: bool) -> String {
    let body = format!(
        r#"<h2>Register</h2>
<form action="/register" method="post">
<label>Username <input type="text" name="username" autocomplete="username" required></label>
<label>Password <input type="password" name="password" autocomplete="new-password" required></label>
<button type="submit">Register</button>
</form>
{google}
<p>Already registered? <a href="/">Log in</a></p>"#,
        google = google_button(google_enabled),
    );
    layout("Register", flashes, false, &body)
}

pub fn dashboard(
    user: &User,
    quote: &Quote,
    todos: &[Todo],
    notes: &[Note],
    flashes: &[String],
) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<p class="greeting">Hello, {}!</p>
<blockquote class="quote"><p>{}</p><footer>{}</footer></blockquote>"#,
        escape(&user.username),
        escape(&quote.text),
        escape(quote.display_author()),
    );

    body.push_str(r#"<section class="todos"><h2>To-do</h2><ul>"#);
    for todo in todos {
        let _ = write!(
            body,
            r#"<li><form action="/delete" method="post"><input type="checkbox" name="todo_id" value="{}" onchange="this.form.submit()"> {}</form></li>"#,
            todo.id,
            escape(&todo.content),
        );
    }
    body.push_str(
        r#"</ul>
<form action="/main" method="post">
<input type="text" name="content" placeholder="New item" autocomplete="off">
<button type="submit">+</button>
</form></section>"#,
    );

    let _ = write!(
        body,
        r#"<section class="notes"><h2>Notes ({}/{})</h2><ul>"#,
        notes.len(),
        MAX_NOTES_PER_USER
    );
    for note in notes {
        let _ = write!(
            body,
            r#"<li><a href="/notes/{}">{}</a></li>"#,
            escape(&note.slug()),
            escape(&note.title),
        );
    }
    body.push_str("</ul>");
    if notes.len() < MAX_NOTES_PER_USER {
        body.push_str(r#"<p><a href="/create">Write a note</a></p>"#);
    }
    body.push_str("</section>");

    layout("Dashboard", flashes, true, &body)
}

pub fn create_note_page(flashes: &[String]) -> String {
    let body = r#"<h2>New note</h2>
<form action="/create" method="post">
<label>Title <input type="text" name="title" required></label>
<label>Content <textarea name="content" rows="10"></textarea></label>
<button type="submit">Save</button>
</form>"#;
    layout("New note", flashes, true, body)
}

pub fn note_page(note: &Note, flashes: &[String]) -> String {
    let body = format!(
        r#"<article class="note"><h2>{title}</h2>
<div class="content" style="white-space: pre-wrap">{content}</div></article>
<form action="/notes/{slug}" method="post">
<input type="hidden" name="note_id" value="{id}">
<button type="submit">Delete note</button>
</form>"#,
        title = escape(&note.title),
        content = escape(&note.content),
        slug = escape(&note.slug()),
        id = note.id,
    );
    layout(&note.title, flashes, true, &body)
}

/// Only reachable behind the login gate, so the signed-in nav is shown.
pub fn not_found_page(message: &str) -> String {
    let body = format!(
        r#"<h2>Not found</h2><p>{}</p><p><a href="/main">Back to dashboard</a></p>"#,
        escape(message)
    );
    layout("Not found", &[], true, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        r#"<h2>{}</h2><p>{}</p><p><a href="/">Home</a></p>"#,
        status.as_u16(),
        escape(message)
    );
    layout("Error", &[], false, &body)
}
