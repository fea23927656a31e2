//! Domain models for Dreamlog.
//!
//! These types mirror the JSON shapes served by the Dream Journal backend.
//! Field names are camelCase on the wire.
//!
//! ## Submodules
//!
//! - [`user`] - Accounts and authentication payloads
//! - [`dream`] - Journal entries, pagination, statistics
//! - [`summary`] - AI analysis jobs attached to dreams

mod dream;
mod summary;
mod user;

pub use dream::{
    Dream, DreamRequest, DreamStatistics, DreamType, FavoriteToggle, Mood, PageResponse,
    SleepQuality,
};
pub use summary::{
    AiSummary, DreamSymbol, EmotionAnalysis, EmotionScore, EmotionSpectrum, GenerationTicket,
    Keywords, SummaryStatus, SymbolAnalysis,
};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, Role, TokenPair, User, UserStatus};
