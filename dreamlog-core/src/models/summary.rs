//! AI analysis attached to a dream.
//!
//! The backend generates analyses asynchronously. A summary is created in
//! [`SummaryStatus::Pending`] and later moves to `Completed` or `Failed`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Generation state of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryStatus {
    /// Still being generated.
    #[default]
    Pending,
    /// Generated successfully.
    Completed,
    /// Generation failed; see [`AiSummary::error_message`].
    Failed,
}

impl SummaryStatus {
    /// Returns true for states that never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// An analysis of a dream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiSummary {
    /// Backend identifier.
    #[serde(default)]
    pub id: Option<i64>,
    /// Dream this analysis belongs to.
    #[serde(default)]
    pub dream_id: Option<i64>,
    /// Short narrative summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Extracted keywords.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Keywords>,
    /// Emotional reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_analysis: Option<EmotionAnalysis>,
    /// Symbol interpretation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_analysis: Option<SymbolAnalysis>,
    /// Psychological reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psychological_insight: Option<String>,
    /// Suggestions for the dreamer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    /// Model that produced the analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
    /// Generation state.
    #[serde(default)]
    pub status: SummaryStatus,
    /// Failure reason when `status` is `FAILED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Keywords pulled from the narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Keywords {
    /// Main keywords.
    #[serde(default)]
    pub primary: Vec<String>,
    /// Supporting keywords.
    #[serde(default)]
    pub secondary: Vec<String>,
    /// Emotion words.
    #[serde(default)]
    pub emotions: Vec<String>,
}

/// Emotional reading of a dream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmotionAnalysis {
    /// Strongest emotion.
    #[serde(default)]
    pub dominant_emotion: Option<String>,
    /// Positive/negative/neutral split.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_spectrum: Option<EmotionSpectrum>,
    /// Overall intensity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    /// Individual emotions with scores.
    #[serde(default)]
    pub emotions_detected: Vec<EmotionScore>,
}

/// Positive/negative/neutral split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EmotionSpectrum {
    /// Positive share.
    #[serde(default)]
    pub positive: f64,
    /// Negative share.
    #[serde(default)]
    pub negative: f64,
    /// Neutral share.
    #[serde(default)]
    pub neutral: f64,
}

/// A detected emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    /// Emotion name.
    pub emotion: String,
    /// Confidence score.
    pub score: f64,
}

/// Symbol interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SymbolAnalysis {
    /// Symbols found in the dream.
    #[serde(default)]
    pub symbols: Vec<DreamSymbol>,
    /// Overall theme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_theme: Option<String>,
    /// Connection to waking life.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_connection: Option<String>,
}

/// One interpreted symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamSymbol {
    /// The symbol.
    pub symbol: String,
    /// Its meaning.
    pub meaning: String,
    /// Psychological reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psychological_interpretation: Option<String>,
}

/// Returned by `POST /dreams/{id}/ai-summary/regenerate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationTicket {
    /// Status of the freshly queued job.
    #[serde(default)]
    pub status: SummaryStatus,
    /// Backend estimate in seconds.
    #[serde(default)]
    pub estimated_time: Option<u64>,
}
