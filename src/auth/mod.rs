//! Local password authentication and Google sign-in.

pub mod google;
pub mod password;

pub use google::{GoogleEndpoints, GoogleOAuth, PendingAuthorization};
pub use password::{hash_password_blocking, verify_password_blocking};
