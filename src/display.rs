//! Derived presentation values.
//!
//! Everything here is a pure function over the current snapshot, recomputed
//! on every observation. Nothing is cached across updates, so two calls on
//! the same snapshot always agree.

use crate::playback::PlaybackSnapshot;

pub const NO_SONG_LABEL: &str = "No song playing";

/// Where the album artwork should come from for the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artwork<'a> {
    /// Bundled fallback tile, used when nothing is playing or the album
    /// carries no images.
    Placeholder,
    Url(&'a str),
}

pub fn artwork(snapshot: Option<&PlaybackSnapshot>) -> Artwork<'_> {
    match snapshot.and_then(|s| s.item.album.images.first()) {
        Some(image) => Artwork::Url(&image.url),
        None => Artwork::Placeholder,
    }
}

/// Progress through the current track as a percentage with one decimal
/// place. The host does not guarantee `progress_ms <= duration_ms`, so the
/// result can exceed 100; callers clamp where it matters visually.
pub fn progress_percent(snapshot: Option<&PlaybackSnapshot>) -> f64 {
    let Some(snapshot) = snapshot else {
        return 0.0;
    };
    // A zero-length track would divide by zero; 1 ms is the degenerate floor.
    let duration = snapshot.item.duration_ms.max(1);
    (snapshot.progress_ms as f64 / duration as f64 * 1000.0).round() / 10.0
}

/// Clock-face `MM:SS` with both components zero-padded.
///
/// Minutes wrap at 60 like the wall clock the original widget read its
/// components from, so an hour-long track shows `00:00` again.
pub fn format_clock_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{minutes:02}:{seconds:02}")
}

pub fn progress_label(snapshot: Option<&PlaybackSnapshot>) -> String {
    format_clock_time(snapshot.map_or(0, |s| s.progress_ms))
}

pub fn duration_label(snapshot: Option<&PlaybackSnapshot>) -> String {
    format_clock_time(snapshot.map_or(0, |s| s.item.duration_ms))
}

pub fn track_title(snapshot: Option<&PlaybackSnapshot>) -> &str {
    snapshot.map_or(NO_SONG_LABEL, |s| s.item.name.as_str())
}

pub fn album_name(snapshot: Option<&PlaybackSnapshot>) -> &str {
    snapshot.map_or("", |s| s.item.album.name.as_str())
}

/// Credited artists joined with `", "`; empty when nothing is playing.
pub fn artist_line(snapshot: Option<&PlaybackSnapshot>) -> String {
    let Some(snapshot) = snapshot else {
        return String::new();
    };
    snapshot
        .item
        .artists
        .iter()
        .map(|artist| artist.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
