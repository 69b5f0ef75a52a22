use std::fmt;

use serde::{Deserialize, Serialize};

use crate::infrastructure::mix_client::model::mix_model::CatalogEntry;

pub const THUMBNAIL_CDN: &str = "https://img.youtube.com/vi";
pub const UNTITLED: &str = "Untitled";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// What a click on a list row reports back to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub id: String,
    /// The backend's title as-is; `None` when the entry has none.
    pub title: Option<String>,
    pub kind: TrackKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    pub source_title: Option<String>,
    pub artist: String,
    pub duration_label: String,
    pub thumbnail_url: String,
    pub selected: bool,
}

/// One of the two pick lists. Video lists only show entries that have a clip.
#[derive(Debug, Clone)]
pub struct CatalogList {
    kind: TrackKind,
    rows: Vec<ListRow>,
}

impl CatalogList {
    pub fn new(entries: &[CatalogEntry], kind: TrackKind, selected_id: Option<&str>) -> Self {
        let rows = entries
            .iter()
            .filter(|entry| kind == TrackKind::Audio || entry.is_video)
            .map(|entry| ListRow {
                id: entry.youtube_link.clone(),
                title: display_or(entry.title.as_deref(), UNTITLED),
                source_title: entry.title.clone(),
                artist: display_or(entry.artist.as_deref(), UNKNOWN_ARTIST),
                duration_label: format_duration(entry.duration_sec),
                thumbnail_url: thumbnail_url(&entry.youtube_link),
                selected: selected_id == Some(entry.youtube_link.as_str()),
            })
            .collect();

        CatalogList { kind, rows }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn find(&self, id: &str) -> Option<&ListRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Reports the backend title, not the displayed fallback.
    pub fn select(&self, row: &ListRow) -> Selection {
        Selection {
            id: row.id.clone(),
            title: row.source_title.clone(),
            kind: self.kind,
        }
    }
}

impl fmt::Display for CatalogList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind.to_string().to_uppercase())?;
        for row in &self.rows {
            let marker = if row.selected { '*' } else { ' ' };
            writeln!(
                f,
                "{} {:<14} {} - {} [{}]",
                marker, row.id, row.title, row.artist, row.duration_label
            )?;
        }
        Ok(())
    }
}

pub fn thumbnail_url(id: &str) -> String {
    format!("{}/{}/0.jpg", THUMBNAIL_CDN, id)
}

/// `125` -> `"2:05"`.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Same shape as [`format_duration`] for fractional player times. Anything
/// that is not a positive finite number renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

fn display_or(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}
