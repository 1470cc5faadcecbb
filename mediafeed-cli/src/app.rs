//! Command dispatch against a feed session.

use crate::commands::{Command, HELP};
use crate::render::{render_items, render_sections, render_stats, render_summary};
use mediafeed_core::FetchGateway;
use mediafeed_sync::{FeedSession, FetchOutcome};

/// What the loop should print, and whether it should stop afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub output: String,
    pub quit: bool,
}

impl Reply {
    fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            quit: false,
        }
    }
}

fn describe(outcome: &FetchOutcome) -> Option<String> {
    match outcome {
        FetchOutcome::Failed(err) => Some(format!("fetch failed: {}", err)),
        FetchOutcome::Stale => Some("result superseded by a newer request".to_string()),
        FetchOutcome::Replaced { .. } | FetchOutcome::Appended { .. } => None,
    }
}

pub async fn execute<G: FetchGateway + 'static>(session: &FeedSession<G>, command: Command) -> Reply {
    let note = match command {
        Command::Quit => {
            return Reply {
                output: "bye".to_string(),
                quit: true,
            }
        }
        Command::Help => return Reply::text(HELP),
        Command::Show => return Reply::text(render_items(&session.snapshot().await)),
        Command::Sections => {
            let snapshot = session.snapshot().await;
            return Reply::text(render_sections(&snapshot.sections, &snapshot.active_section));
        }
        Command::Stats => {
            if let Err(err) = session.reload_stats().await {
                tracing::warn!(error = %err, "Stats reload failed");
            }
            return Reply::text(render_stats(session.snapshot().await.stats.as_ref()));
        }
        Command::Filter(section) => match session.set_filter(section.as_str()).await {
            Ok(Some(outcome)) => describe(&outcome),
            Ok(None) => Some(format!("already showing {}", section)),
            Err(err) => Some(err.to_string()),
        },
        Command::More => match session.load_more().await {
            Some(outcome) => describe(&outcome),
            None => Some("nothing more to load".to_string()),
        },
        Command::Refresh => describe(&session.refresh_now().await),
        Command::Select(id) => {
            if session.select_item(&id).await {
                None
            } else {
                Some(format!("no item '{}' in the current feed", id))
            }
        }
        Command::Next => {
            session.select_next().await;
            None
        }
        Command::Prev => {
            session.select_previous().await;
            None
        }
    };

    let summary = render_summary(&session.snapshot().await);
    match note {
        Some(note) => Reply::text(format!("{}\n{}", note, summary)),
        None => Reply::text(summary),
    }
}
