//! Typed wrappers over the backend endpoints.

pub mod auth;
pub mod dreams;

pub use auth::{AuthApi, ProfileUpdate};
pub use dreams::{DEFAULT_PAGE_SIZE, DreamApi, ListQuery};
