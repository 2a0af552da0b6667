use spotifalc_gui::display::{self, Artwork};
use spotifalc_gui::playback::{AlbumRef, ArtistRef, ImageRef, PlaybackSnapshot, TrackInfo};

fn playing_snapshot() -> PlaybackSnapshot {
    PlaybackSnapshot {
        is_playing: true,
        progress_ms: 30_000,
        item: TrackInfo {
            name: "Track".to_string(),
            duration_ms: 200_000,
            artists: vec![
                ArtistRef {
                    name: "A".to_string(),
                },
                ArtistRef {
                    name: "B".to_string(),
                },
            ],
            album: AlbumRef {
                name: "Album".to_string(),
                id: None,
                images: vec![ImageRef {
                    url: "https://img.example/cover".to_string(),
                }],
            },
        },
    }
}

#[test]
fn clock_labels_are_zero_padded_mm_ss() {
    assert_eq!(display::format_clock_time(0), "00:00");
    assert_eq!(display::format_clock_time(65_000), "01:05");
    assert_eq!(display::format_clock_time(599_000), "09:59");
}

#[test]
fn nothing_playing_renders_the_empty_shell() {
    assert_eq!(display::track_title(None), "No song playing");
    assert_eq!(display::album_name(None), "");
    assert_eq!(display::artist_line(None), "");
    assert_eq!(display::progress_label(None), "00:00");
    assert_eq!(display::duration_label(None), "00:00");
    assert_eq!(display::progress_percent(None), 0.0);
    assert_eq!(display::artwork(None), Artwork::Placeholder);
}

#[test]
fn playing_snapshot_derives_all_presentation_values() {
    let snapshot = playing_snapshot();
    let snapshot = Some(&snapshot);

    assert_eq!(display::track_title(snapshot), "Track");
    assert_eq!(display::album_name(snapshot), "Album");
    assert_eq!(display::artist_line(snapshot), "A, B");
    assert_eq!(display::progress_percent(snapshot), 15.0);
    assert_eq!(display::progress_label(snapshot), "00:30");
    assert_eq!(display::duration_label(snapshot), "03:20");
    assert_eq!(
        display::artwork(snapshot),
        Artwork::Url("https://img.example/cover")
    );
}

#[test]
fn album_without_images_falls_back_to_the_placeholder() {
    let mut snapshot = playing_snapshot();
    snapshot.item.album.images.clear();
    assert_eq!(display::artwork(Some(&snapshot)), Artwork::Placeholder);
}

#[test]
fn derivations_are_stable_for_the_same_snapshot() {
    let snapshot = playing_snapshot();
    let snapshot = Some(&snapshot);
    assert_eq!(
        display::progress_percent(snapshot),
        display::progress_percent(snapshot)
    );
    assert_eq!(
        display::artist_line(snapshot),
        display::artist_line(snapshot)
    );
}

#[test]
fn progress_past_the_duration_is_reported_untouched() {
    let mut snapshot = playing_snapshot();
    snapshot.progress_ms = 250_000;
    assert_eq!(display::progress_percent(Some(&snapshot)), 125.0);
}

#[test]
fn zero_duration_track_does_not_divide_by_zero() {
    let mut snapshot = playing_snapshot();
    snapshot.item.duration_ms = 0;
    snapshot.progress_ms = 0;
    assert_eq!(display::progress_percent(Some(&snapshot)), 0.0);
}
