//! Text output formatting with vividness bars and colors.

use chrono::{DateTime, Local, Utc};
use dreamlog_core::{
    AiSummary, Dream, DreamStatistics, DreamType, PageResponse, SummaryStatus, User,
};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";

// Vividness bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';
const VIVIDNESS_MAX: u8 = 10;

const FAVORITE_MARK: &str = "★";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ========================================================================
    // Dreams
    // ========================================================================

    /// One line per dream: id, date, type, title and favorite mark.
    pub fn format_dream_rows(&self, dreams: &[Dream]) -> String {
        if dreams.is_empty() {
            return self.dim("No dreams found.");
        }
        dreams
            .iter()
            .map(|dream| self.format_dream_row(dream))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A page of dreams with its position footer.
    pub fn format_dream_page(&self, page: &PageResponse<Dream>) -> String {
        let mut lines = vec![self.format_dream_rows(&page.content)];
        lines.push(String::new());
        lines.push(self.dim(&format!(
            "Page {}/{} · {} dreams",
            page.current_page,
            page.total_pages.max(1),
            page.total_elements
        )));
        lines.join("\n")
    }

    fn format_dream_row(&self, dream: &Dream) -> String {
        let favorite = if dream.is_favorite {
            self.yellow(FAVORITE_MARK)
        } else {
            " ".to_string()
        };
        format!(
            "{:>6}  {}  {:<10} {} {}",
            self.dim(&format!("#{}", dream.id)),
            dream.dream_date.format("%Y-%m-%d"),
            self.color_for_type(dream.dream_type),
            favorite,
            dream.title
        )
    }

    /// Full dream with its analysis, if any.
    pub fn format_dream(&self, dream: &Dream) -> String {
        let mut lines = Vec::new();

        let mut header = self.bold(&dream.title);
        if dream.is_favorite {
            header.push(' ');
            header.push_str(&self.yellow(FAVORITE_MARK));
        }
        lines.push(header);
        lines.push("─".repeat(40));

        lines.push(format!("Date:      {}", dream.dream_date.format("%Y-%m-%d")));
        lines.push(format!("Type:      {}", self.color_for_type(dream.dream_type)));
        if let Some(vividness) = dream.vividness {
            lines.push(format!(
                "Vividness: {} {vividness}/{VIVIDNESS_MAX}",
                self.vividness_bar(vividness)
            ));
        }
        if let Some(quality) = dream.sleep_quality {
            lines.push(format!("Sleep:     {quality:?}"));
        }
        if let (Some(before), Some(after)) = (dream.mood_before_sleep, dream.mood_after_wake) {
            lines.push(format!("Mood:      {before:?} → {after:?}"));
        }
        if !dream.tags.is_empty() {
            let tags: Vec<String> = dream.tags.iter().map(|t| self.cyan(&format!("#{t}"))).collect();
            lines.push(format!("Tags:      {}", tags.join(" ")));
        }
        if dream.is_private {
            lines.push(self.dim("Private"));
        }

        lines.push(String::new());
        lines.push(dream.content.clone());

        if let Some(summary) = &dream.ai_summary {
            lines.push(String::new());
            lines.push(self.format_summary(summary));
        }

        lines.join("\n")
    }

    /// An AI analysis block.
    pub fn format_summary(&self, summary: &AiSummary) -> String {
        let mut lines = vec![format!(
            "{} {}",
            self.bold("AI Analysis"),
            self.color_for_status(summary.status)
        )];

        match summary.status {
            SummaryStatus::Pending => {
                lines.push(self.dim("Analysis in progress."));
            }
            SummaryStatus::Failed => {
                let reason = summary
                    .error_message
                    .as_deref()
                    .unwrap_or("Analysis failed");
                lines.push(self.red(reason));
            }
            SummaryStatus::Completed => {
                if let Some(text) = &summary.summary {
                    lines.push(text.clone());
                }
                if let Some(keywords) = &summary.keywords {
                    if !keywords.primary.is_empty() {
                        lines.push(format!("Keywords: {}", keywords.primary.join(", ")));
                    }
                }
                if let Some(dominant) = summary
                    .emotion_analysis
                    .as_ref()
                    .and_then(|e| e.dominant_emotion.as_deref())
                {
                    lines.push(format!("Emotion:  {}", self.cyan(dominant)));
                }
                if let Some(symbols) = &summary.symbol_analysis {
                    for symbol in &symbols.symbols {
                        lines.push(format!("  • {}: {}", self.bold(&symbol.symbol), symbol.meaning));
                    }
                    if let Some(theme) = &symbols.overall_theme {
                        lines.push(format!("Theme:    {theme}"));
                    }
                }
                if let Some(insight) = &summary.psychological_insight {
                    lines.push(String::new());
                    lines.push(insight.clone());
                }
                if let Some(advice) = &summary.advice {
                    lines.push(format!("{} {advice}", self.green("Advice:")));
                }
            }
        }

        lines.join("\n")
    }

    /// Journal statistics.
    pub fn format_statistics(&self, stats: &DreamStatistics) -> String {
        let mut lines = vec![self.bold("Dream Statistics"), "─".repeat(40)];
        lines.push(format!("Total dreams: {}", stats.total_dreams));
        lines.push(format!("Favorites:    {}", stats.total_favorites));
        if let Some(quality) = stats.average_sleep_quality {
            lines.push(format!("Avg. sleep:   {quality:.1}"));
        }

        if !stats.dreams_by_mood.is_empty() {
            lines.push(String::new());
            lines.push("By mood:".to_string());
            for (mood, count) in &stats.dreams_by_mood {
                lines.push(format!("  {mood:<12} {count}"));
            }
        }
        if !stats.dreams_by_month.is_empty() {
            lines.push(String::new());
            lines.push("By month:".to_string());
            for (month, count) in &stats.dreams_by_month {
                lines.push(format!("  {month:<12} {count}"));
            }
        }

        lines.join("\n")
    }

    // ========================================================================
    // Account
    // ========================================================================

    /// The signed-in account.
    pub fn format_user(&self, user: &User, token_expires_at: Option<DateTime<Utc>>) -> String {
        let mut lines = vec![format!(
            "{} {}",
            self.bold(user.display_name()),
            self.dim(&format!("({})", user.username))
        )];
        lines.push(format!("Email:   {}", self.cyan(&user.email)));
        lines.push(format!("Role:    {:?}", user.role));
        if let Some(expires) = token_expires_at {
            let local = expires.with_timezone(&Local);
            let text = format!("Token:   valid until {}", local.format("%Y-%m-%d %H:%M"));
            if expires <= Utc::now() {
                lines.push(self.yellow(&format!("{text} (expired, refreshed on next call)")));
            } else {
                lines.push(text);
            }
        }
        lines.join("\n")
    }

    // ========================================================================
    // Pieces
    // ========================================================================

    /// Renders vividness (1-10) as a bar.
    pub fn vividness_bar(&self, vividness: u8) -> String {
        let filled = usize::from(vividness.min(VIVIDNESS_MAX));
        let empty = usize::from(VIVIDNESS_MAX) - filled;
        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );
        if self.use_colors {
            format!("{BLUE}{bar}{RESET}")
        } else {
            bar
        }
    }

    fn color_for_type(&self, kind: DreamType) -> String {
        let text = format!("{:<10}", kind.as_str());
        match kind {
            DreamType::Nightmare => self.red(&text),
            DreamType::Lucid => self.cyan(&text),
            DreamType::Prophetic => self.yellow(&text),
            DreamType::Normal | DreamType::Recurring => text,
        }
    }

    fn color_for_status(&self, status: SummaryStatus) -> String {
        let text = format!("[{status}]");
        match status {
            SummaryStatus::Completed => self.green(&text),
            SummaryStatus::Pending => self.yellow(&text),
            SummaryStatus::Failed => self.red(&text),
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}
