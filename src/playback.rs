use serde::Deserialize;

/// One poll's worth of playback state as reported by the host process.
///
/// Field names follow the host's JSON payload; only the fields the widget
/// actually renders are kept. The snapshot is immutable once received — a
/// new poll produces a brand-new value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: u64,
    pub item: TrackInfo,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    pub duration_ms: u64,
    /// Credited order, as delivered by the host.
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    pub album: AlbumRef,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlbumRef {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    /// First entry is the primary artwork.
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

/// Current user, fetched once per authenticated session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Holds the last-known playback snapshot, or `None` when the host reports
/// nothing playing.
///
/// The store is written only by the refresh success path and read by every
/// presentation consumer. Each `publish` replaces the value wholesale and
/// bumps the revision, so whichever refresh completes last wins and
/// consumers can tell a fresh snapshot from the one they already saw. A
/// failed refresh never publishes, leaving the previous value untouched.
#[derive(Debug, Default)]
pub struct PlaybackStore {
    current: Option<PlaybackSnapshot>,
    revision: u64,
}

impl PlaybackStore {
    pub fn publish(&mut self, snapshot: Option<PlaybackSnapshot>) {
        self.current = snapshot;
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn get(&self) -> Option<&PlaybackSnapshot> {
        self.current.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
