// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Dreamlog Client
//!
//! Authenticated access to the Dreamlog backend.
//!
//! ## Request Pipeline
//!
//! Every call made through [`ApiClient`] passes the same stages:
//!
//! - [`interceptor::authorize`] - Stamps the current access token
//! - [`interceptor::disposition`] - Decides what a failed response means
//! - [`refresh::RefreshCoordinator`] - Runs at most one token refresh at a
//!   time; concurrent 401s wait for it and replay once
//!
//! ## Host Seams
//!
//! - [`host::CredentialStore`] - Where tokens and identity live
//! - [`host::Navigator`] - Where login and access-denied redirects go
//!
//! ## Jobs
//!
//! - [`poller::JobPoller`] - Starts a job and polls it to a terminal state
//!
//! ## Example
//!
//! ```ignore
//! use dreamlog_client::{ApiClient, DreamApi, JobPoller, PollOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = ApiClient::builder("http://localhost:8080/api").build()?;
//! let poller = JobPoller::new(DreamApi::new(client), PollOptions::default());
//! let dream = poller.poll_until_terminal(42, &CancellationToken::new()).await?;
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod host;
pub mod interceptor;
pub mod poller;
pub mod refresh;
pub mod request;
pub mod session;

// Errors
pub use error::{ApiError, GENERIC_FAILURE_MESSAGE, JOB_FAILED_MESSAGE, POLL_TIMEOUT_MESSAGE};

// Pipeline
pub use client::{ApiClient, ApiClientBuilder, DEFAULT_TIMEOUT};
pub use interceptor::Disposition;
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use request::{ApiRequest, Attempt};

// Host seams
pub use host::{Credential, CredentialStore, MemoryCredentialStore, Navigator, NoopNavigator};

// Endpoints & session
pub use api::{AuthApi, DreamApi, ListQuery, ProfileUpdate};
pub use session::{AuthSession, LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE};

// Jobs
pub use poller::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, JobPoller, JobSource, JobStatus, PollOptions,
};
