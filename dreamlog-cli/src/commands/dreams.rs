//! Dreams command - browse and manage journal entries.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use dreamlog_client::{DreamApi, GENERIC_FAILURE_MESSAGE, ListQuery};
use dreamlog_core::DreamType;
use dreamlog_store::SettingsStore;
use serde::Serialize;

use super::user_facing;
use crate::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the dreams command.
#[derive(Args)]
pub struct DreamsArgs {
    #[command(subcommand)]
    pub action: DreamsAction,
}

/// Dreams subcommands.
#[derive(Subcommand)]
pub enum DreamsAction {
    /// List dreams, newest first.
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show one dream with its analysis.
    Show {
        /// Dream id.
        id: i64,
    },

    /// Full-text search.
    Search {
        /// Text to look for.
        keyword: String,
    },

    /// List favorites.
    Favorites,

    /// Toggle the favorite mark.
    Favorite {
        /// Dream id.
        id: i64,
    },

    /// Delete a dream.
    Delete {
        /// Dream id.
        id: i64,
    },

    /// Journal statistics.
    Stats,
}

/// Filters for `dreams list`.
#[derive(Args)]
pub struct ListArgs {
    /// Page to show, starting at 1.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Dreams per page.
    #[arg(long, default_value_t = dreamlog_client::api::DEFAULT_PAGE_SIZE)]
    pub size: u32,

    /// Only dreams containing this text.
    #[arg(long)]
    pub keyword: Option<String>,

    /// Earliest dream date (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest dream date (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Only this kind of dream.
    #[arg(long = "type", value_enum)]
    pub dream_type: Option<DreamKind>,

    /// Only favorites.
    #[arg(long)]
    pub favorites: bool,
}

impl ListArgs {
    fn to_query(&self) -> ListQuery {
        ListQuery {
            page: self.page.saturating_sub(1),
            size: self.size,
            keyword: self.keyword.clone(),
            start_date: self.from,
            end_date: self.to,
            dream_type: self.dream_type.map(DreamType::from),
            is_favorite: self.favorites.then_some(true),
        }
    }
}

/// Dream kinds accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DreamKind {
    Normal,
    Lucid,
    Nightmare,
    Recurring,
    Prophetic,
}

impl From<DreamKind> for DreamType {
    fn from(kind: DreamKind) -> Self {
        match kind {
            DreamKind::Normal => DreamType::Normal,
            DreamKind::Lucid => DreamType::Lucid,
            DreamKind::Nightmare => DreamType::Nightmare,
            DreamKind::Recurring => DreamType::Recurring,
            DreamKind::Prophetic => DreamType::Prophetic,
        }
    }
}

/// Runs the dreams command.
pub async fn run(args: &DreamsArgs, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let ctx = AppContext::build(cli, settings).await?;
    let api = ctx.dreams();
    let text = TextFormatter::new(!cli.no_color);

    match &args.action {
        DreamsAction::List(list) => {
            let page = api.list(&list.to_query()).await.map_err(failed)?;
            emit(cli, &page, || text.format_dream_page(&page))
        }
        DreamsAction::Show { id } => {
            let dream = api.get(*id).await.map_err(failed)?;
            emit(cli, &dream, || text.format_dream(&dream))
        }
        DreamsAction::Search { keyword } => {
            let dreams = api.search(keyword).await.map_err(failed)?;
            emit(cli, &dreams, || text.format_dream_rows(&dreams))
        }
        DreamsAction::Favorites => {
            let dreams = api.favorites().await.map_err(failed)?;
            emit(cli, &dreams, || text.format_dream_rows(&dreams))
        }
        DreamsAction::Favorite { id } => {
            let toggle = api.toggle_favorite(*id).await.map_err(failed)?;
            emit(cli, &toggle, || {
                if toggle.is_favorite {
                    format!("Dream #{id} added to favorites.")
                } else {
                    format!("Dream #{id} removed from favorites.")
                }
            })
        }
        DreamsAction::Delete { id } => delete(&api, *id, cli).await,
        DreamsAction::Stats => {
            let stats = api.statistics().await.map_err(failed)?;
            emit(cli, &stats, || text.format_statistics(&stats))
        }
    }
}

async fn delete(api: &DreamApi, id: i64, cli: &Cli) -> Result<()> {
    api.delete(id).await.map_err(failed)?;

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Dream #{id} deleted.");
            }
        }
        OutputFormat::Json => {
            let body = serde_json::json!({ "id": id, "deleted": true });
            println!("{}", JsonFormatter::new(cli.pretty).format(&body)?);
        }
    }
    Ok(())
}

/// Prints `value` as JSON or the text rendering from `render`.
fn emit<T: Serialize>(cli: &Cli, value: &T, render: impl FnOnce() -> String) -> Result<()> {
    match cli.format {
        OutputFormat::Text => println!("{}", render()),
        OutputFormat::Json => println!("{}", JsonFormatter::new(cli.pretty).format(value)?),
    }
    Ok(())
}

fn failed(error: dreamlog_client::ApiError) -> anyhow::Error {
    user_facing(error, GENERIC_FAILURE_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_list_args_to_query() {
        let cli = Cli::try_parse_from([
            "dreamlog", "dreams", "list", "--page", "3", "--type", "nightmare", "--favorites",
            "--from", "2024-01-01",
        ])
        .unwrap();

        let crate::Commands::Dreams(DreamsArgs {
            action: DreamsAction::List(list),
        }) = cli.command
        else {
            panic!("expected dreams list");
        };

        let query = list.to_query();
        assert_eq!(query.page, 2);
        assert_eq!(query.size, dreamlog_client::api::DEFAULT_PAGE_SIZE);
        assert_eq!(query.dream_type, Some(DreamType::Nightmare));
        assert_eq!(query.is_favorite, Some(true));
        assert_eq!(query.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(query.end_date, None);
    }

    #[test]
    fn test_page_zero_rejected() {
        let result = Cli::try_parse_from(["dreamlog", "dreams", "list", "--page", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_favorites_flag_off_means_no_filter() {
        let cli = Cli::try_parse_from(["dreamlog", "d", "ls"]).unwrap();
        let crate::Commands::Dreams(DreamsArgs {
            action: DreamsAction::List(list),
        }) = cli.command
        else {
            panic!("expected dreams list");
        };
        assert_eq!(list.to_query().is_favorite, None);
        assert_eq!(list.to_query().page, 0);
    }
}
