//! Plain-text rendering of library listings and surface views.

use std::fmt::Write;

use chrono::{DateTime, NaiveDateTime};
use shelf_client::{FileItem, SearchResult};
use shelf_core::{ChatView, DeckView, ErrorView, FlashcardsView, JobState, Role, SummaryView};

pub(crate) fn file_list(files: &[FileItem]) -> String {
    if files.is_empty() {
        return "No documents yet.\n".to_string();
    }
    let mut out = String::new();
    for file in files {
        let _ = writeln!(out, "{}", file_line(file));
    }
    out
}

pub(crate) fn search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No matches.\n".to_string();
    }
    let mut out = String::new();
    for result in results {
        let _ = write!(out, "{}", file_line(&result.file));
        if let Some(score) = result.score {
            let _ = write!(out, "  score {score:.2}");
        }
        if let Some(matched_in) = &result.matched_in {
            let _ = write!(out, "  (in {matched_in})");
        }
        out.push('\n');
        if let Some(preview) = result.preview.as_deref().map(str::trim) {
            if !preview.is_empty() {
                let _ = writeln!(out, "    {preview}");
            }
        }
    }
    out
}

fn file_line(file: &FileItem) -> String {
    let mut line = format!("{}  {}", file.id, file.title);
    if let Some(subject) = file.subject.as_deref().filter(|s| !s.is_empty()) {
        let _ = write!(line, "  [{subject}]");
    }
    if let Some(tags) = file.tags.as_ref().filter(|tags| !tags.is_empty()) {
        let _ = write!(line, "  #{}", tags.join(" #"));
    }
    if let Some(size) = file.size {
        let _ = write!(line, "  {}", human_size(size));
    }
    if let Some(created) = file.created_at.as_deref() {
        let _ = write!(line, "  {}", display_date(created));
    }
    line
}

pub(crate) fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Calendar date of a backend timestamp; unparseable input is shown as-is.
pub(crate) fn display_date(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

pub(crate) fn stage_label(stage: Option<JobState>) -> &'static str {
    match stage {
        Some(JobState::Queued) => "queued",
        Some(JobState::Processing) => "processing",
        _ => "starting",
    }
}

pub(crate) fn error(view: &ErrorView) -> String {
    let mut out = format!("{}\n", view.message);
    if let Some(detail) = &view.detail {
        let _ = writeln!(out, "  ({detail})");
    }
    if view.can_retry {
        out.push_str("Run the command again to retry.\n");
    }
    out
}

pub(crate) fn summary(view: &SummaryView) -> String {
    match view {
        SummaryView::Closed => String::new(),
        SummaryView::Loading { stage } => format!("Summary {}...\n", stage_label(*stage)),
        SummaryView::Empty => "No summary yet. Use --generate to create one.\n".to_string(),
        SummaryView::Content { paragraphs } => {
            let mut out = String::new();
            for paragraph in paragraphs {
                let _ = writeln!(out, "{paragraph}");
            }
            out
        }
        SummaryView::Error(err) => error(err),
    }
}

/// Header line for a flashcards surface that is not showing a card.
pub(crate) fn flashcards_status(view: &FlashcardsView) -> Option<String> {
    match view {
        FlashcardsView::Closed => Some(String::new()),
        FlashcardsView::Loading { stage } => {
            Some(format!("Flashcards {}...\n", stage_label(*stage)))
        }
        FlashcardsView::Empty => {
            Some("No flashcards yet. Use --generate to create them.\n".to_string())
        }
        FlashcardsView::Content(deck) if deck.total == 0 => {
            Some("The deck has no cards.\n".to_string())
        }
        FlashcardsView::Content(_) => None,
        FlashcardsView::Error(err) => Some(error(err)),
    }
}

pub(crate) fn card(deck: &DeckView) -> String {
    let Some(card) = &deck.card else {
        return String::new();
    };
    let mut out = format!("[{} / {}] Q: {}\n", deck.position, deck.total, card.question);
    if card.showing_answer {
        let _ = writeln!(out, "        A: {}", card.answer);
    }
    out
}

pub(crate) fn chat(view: &ChatView) -> String {
    let mut out = String::new();
    for message in &view.messages {
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        let content = if message.pending {
            "..."
        } else {
            message.content.as_str()
        };
        let _ = writeln!(out, "{speaker}: {content}");
    }
    out
}
