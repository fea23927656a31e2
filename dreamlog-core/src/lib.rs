// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Dreamlog Core
//!
//! Core types and models shared by the Dreamlog crates.
//!
//! The backend owns the data schema; the types here mirror its JSON shapes
//! so the client and the CLI can work with typed values.
//!
//! ## Key Types
//!
//! ### Authentication
//! - [`User`] - Account identity returned by the backend
//! - [`LoginResponse`] - Token pair plus identity issued on login/registration
//! - [`TokenPair`] - Access/refresh pair issued by the refresh exchange
//! - [`AccessClaims`] - Unverified view of an access token's JWT payload
//!
//! ### Dreams
//! - [`Dream`] - A journal entry, optionally carrying an [`AiSummary`]
//! - [`DreamRequest`] - Create/update payload
//! - [`PageResponse`] - Paginated list wrapper
//!
//! ### Analysis Jobs
//! - [`AiSummary`] - Asynchronously generated analysis
//! - [`SummaryStatus`] - `PENDING`, `COMPLETED` or `FAILED`

pub mod error;
pub mod models;
pub mod token;

pub use error::CoreError;

pub use models::{
    // Auth
    LoginRequest,
    LoginResponse,
    RegisterRequest,
    Role,
    TokenPair,
    User,
    UserStatus,
    // Dreams
    Dream,
    DreamRequest,
    DreamStatistics,
    DreamType,
    FavoriteToggle,
    Mood,
    PageResponse,
    SleepQuality,
    // Analysis
    AiSummary,
    DreamSymbol,
    EmotionAnalysis,
    EmotionScore,
    EmotionSpectrum,
    GenerationTicket,
    Keywords,
    SummaryStatus,
    SymbolAnalysis,
};

pub use token::AccessClaims;
