//! Dream journal entries.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::summary::AiSummary;

// ============================================================================
// Enumerations
// ============================================================================

/// Subjective sleep quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SleepQuality {
    /// Excellent sleep.
    Excellent,
    /// Good sleep.
    Good,
    /// Fair sleep.
    Fair,
    /// Poor sleep.
    Poor,
    /// Terrible sleep.
    Terrible,
}

/// Mood before sleeping or after waking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    /// Happy.
    Happy,
    /// Calm.
    Calm,
    /// Anxious.
    Anxious,
    /// Sad.
    Sad,
    /// Stressed.
    Stressed,
    /// Excited.
    Excited,
    /// Tired.
    Tired,
    /// Confused.
    Confused,
    /// Refreshed.
    Refreshed,
}

/// Kind of dream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DreamType {
    /// Ordinary dream.
    #[default]
    Normal,
    /// Lucid dream.
    Lucid,
    /// Nightmare.
    Nightmare,
    /// Recurring dream.
    Recurring,
    /// Prophetic dream.
    Prophetic,
}

impl DreamType {
    /// Wire name, as used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Lucid => "LUCID",
            Self::Nightmare => "NIGHTMARE",
            Self::Recurring => "RECURRING",
            Self::Prophetic => "PROPHETIC",
        }
    }
}

impl std::fmt::Display for DreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Dream
// ============================================================================

/// A journal entry.
///
/// `GET /dreams/{id}` embeds the entry's [`AiSummary`]; list endpoints omit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dream {
    /// Backend identifier.
    pub id: i64,
    /// Owner.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Title.
    pub title: String,
    /// Free-form narrative.
    #[serde(default)]
    pub content: String,
    /// Night the dream belongs to.
    pub dream_date: NaiveDate,
    /// Time the dreamer fell asleep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_start_time: Option<NaiveTime>,
    /// Time the dreamer woke up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_end_time: Option<NaiveTime>,
    /// Sleep quality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_quality: Option<SleepQuality>,
    /// Mood before sleeping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_before_sleep: Option<Mood>,
    /// Mood after waking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_after_wake: Option<Mood>,
    /// Kind of dream.
    #[serde(default)]
    pub dream_type: DreamType,
    /// Vividness, 1-10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vividness: Option<u8>,
    /// Marked as favorite.
    #[serde(default)]
    pub is_favorite: bool,
    /// Hidden from sharing.
    #[serde(default)]
    pub is_private: bool,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Attached analysis, if one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<AiSummary>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Body of `POST /dreams` and `PUT /dreams/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamRequest {
    /// Title.
    pub title: String,
    /// Narrative.
    pub content: String,
    /// Night the dream belongs to.
    pub dream_date: Option<NaiveDate>,
    /// Time the dreamer fell asleep.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_start_time: Option<NaiveTime>,
    /// Time the dreamer woke up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_end_time: Option<NaiveTime>,
    /// Sleep quality.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_quality: Option<SleepQuality>,
    /// Mood before sleeping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_before_sleep: Option<Mood>,
    /// Mood after waking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_after_wake: Option<Mood>,
    /// Kind of dream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dream_type: Option<DreamType>,
    /// Vividness, 1-10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vividness: Option<u8>,
    /// Favorite flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    /// Private flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    /// Tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Ask the backend to start an analysis after saving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_ai_summary: Option<bool>,
}

// ============================================================================
// Pagination & Statistics
// ============================================================================

/// One page of a list endpoint.
///
/// `current_page` is 1-based, as served by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Total items across pages.
    #[serde(default)]
    pub total_elements: u64,
    /// Total pages.
    #[serde(default)]
    pub total_pages: u64,
    /// 1-based page index.
    #[serde(default = "first_page")]
    pub current_page: u64,
    /// Requested page size.
    #[serde(default)]
    pub page_size: u64,
    /// More pages follow.
    #[serde(default)]
    pub has_next: bool,
    /// Earlier pages exist.
    #[serde(default)]
    pub has_previous: bool,
}

fn first_page() -> u64 {
    1
}

impl<T> PageResponse<T> {
    /// Returns the 0-based index of this page.
    pub fn page_index(&self) -> u64 {
        self.current_page.saturating_sub(1)
    }

    /// Returns true if the page holds no items.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Result of `PUT /dreams/{id}/favorite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggle {
    /// Favorite flag after the toggle.
    pub is_favorite: bool,
}

/// Result of `GET /dreams/statistics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamStatistics {
    /// Number of entries.
    #[serde(default)]
    pub total_dreams: u64,
    /// Number of favorites.
    #[serde(default)]
    pub total_favorites: u64,
    /// Entries per mood.
    #[serde(default)]
    pub dreams_by_mood: BTreeMap<String, u64>,
    /// Entries per month (`YYYY-MM`).
    #[serde(default)]
    pub dreams_by_month: BTreeMap<String, u64>,
    /// Mean sleep quality score.
    #[serde(default)]
    pub average_sleep_quality: Option<f64>,
}
