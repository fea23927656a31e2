//! Host seams for the request pipeline.
//!
//! - [`credentials`] - Where tokens and identity live
//! - [`navigator`] - Where redirects go

pub mod credentials;
pub mod navigator;

pub use credentials::{Credential, CredentialStore, MemoryCredentialStore};
pub use navigator::{Navigator, NoopNavigator};
