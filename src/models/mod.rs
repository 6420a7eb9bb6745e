//! Domain models for PocketDesk.
//!
//! # Core Concepts
//!
//! - [`User`]: an account, created by registration or first Google sign-in.
//!   Users are never deleted by the application.
//! - [`Todo`]: a single to-do item owned by one user.
//! - [`Note`]: a titled free-text note owned by one user. A user holds at most
//!   [`MAX_NOTES_PER_USER`] notes.
//!
//! Todo and note ids are only meaningful together with their owner's id; every
//! lookup and delete is scoped by both.

mod note;
mod todo;
mod user;

pub use note::*;
pub use todo::*;
pub use user::*;
