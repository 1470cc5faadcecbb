//! Plain-text rendering of feed snapshots.

use mediafeed_core::{Section, SummaryStats, Timestamp};
use mediafeed_sync::FeedSnapshot;
use std::fmt::Write;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn date(value: Option<Timestamp>, missing: &str) -> String {
    value
        .map(|ts| ts.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| missing.to_string())
}

/// One status line: section, counts, flags, and the current selection.
pub fn render_summary(snapshot: &FeedSnapshot) -> String {
    let mut out = format!(
        "[{}] {} items",
        snapshot.active_section,
        snapshot.items.len()
    );
    if snapshot.more_available {
        out.push_str(" (more)");
    }
    if snapshot.loading {
        out.push_str(" loading...");
    }
    if snapshot.loading_more {
        out.push_str(" loading more...");
    }
    if let Some(selected) = &snapshot.selected {
        let _ = write!(out, " | > {} {}", selected.id, selected.title);
    }
    if let Some(error) = &snapshot.error {
        let _ = write!(out, "\n  error: {}", error.message);
    }
    if let Some(error) = &snapshot.load_more_error {
        let _ = write!(out, "\n  load more failed: {} (try 'more' again)", error.message);
    }
    out
}

/// The full item list, marking the selected item.
pub fn render_items(snapshot: &FeedSnapshot) -> String {
    let selected = snapshot.selected.as_ref().map(|item| item.id.as_str());
    let mut out = String::new();
    for (index, item) in snapshot.items.iter().enumerate() {
        let marker = if Some(item.id.as_str()) == selected {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{} {:>3}. {}  {} [{}] {}",
            marker,
            index + 1,
            item.id,
            item.title,
            item.section,
            item.published_at.format(DATE_FORMAT)
        );
    }
    out.push_str(&render_summary(snapshot));
    out
}

pub fn render_sections(sections: &[Section], active: &Section) -> String {
    sections
        .iter()
        .map(|section| {
            if section == active {
                format!("* {}", section)
            } else {
                format!("  {}", section)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_stats(stats: Option<&SummaryStats>) -> String {
    match stats {
        Some(stats) => format!(
            "{} items from {} sources, {} .. {}, last update {}",
            stats.item_count,
            stats.source_count,
            date(stats.oldest, "N/A"),
            date(stats.newest, "N/A"),
            date(stats.last_update, "never")
        ),
        None => "no stats available".to_string(),
    }
}
