//! The widget application: owns the playback store, drives the polling
//! scheduler, and renders either the player or the login prompt.

use crate::config::Config;
use crate::display::{self, Artwork};
use crate::host::{spawn_host_worker, HostClient, HostCommand, HostEvent, ProcessHost};
use crate::playback::{PlaybackStore, UserProfile};
use crate::theme;
use eframe::egui::{
    self, Align2, Color32, ColorImage, CornerRadius, CursorIcon, FontId, RichText, TextureHandle,
    TextureOptions,
};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

const ARTWORK_SIDE: f32 = 140.0;
const PROGRESS_BAR_HEIGHT: f32 = 4.0;
const TRANSPORT_ICON_SIZE: f32 = 26.0;
const PLAY_ICON_SIZE: f32 = 34.0;
const TRANSPORT_SPACING: f32 = 18.0;

/// Authentication mode, re-derived from every poll tick.
///
/// `Unknown` covers startup before the first tick answers; the player shell
/// renders with placeholder values rather than flashing the login prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    SignedOut,
    SignedIn,
}

struct ArtworkMessage {
    request_id: u64,
    url: String,
    image: Option<ColorImage>,
    error: Option<String>,
}

pub struct App {
    config: Config,
    store: PlaybackStore,
    auth: AuthState,
    profile: Option<UserProfile>,
    /// Locally-held play/pause icon state, flipped optimistically on click
    /// and resynchronized whenever a new snapshot lands.
    play_affordance: bool,
    seen_revision: u64,
    last_tick: Option<Instant>,
    host_tx: Option<mpsc::Sender<HostCommand>>,
    host_rx: Option<mpsc::Receiver<HostEvent>>,
    artwork_texture: Option<TextureHandle>,
    /// URL the current texture (or the last failed download) came from.
    artwork_url: Option<String>,
    artwork_rx: Option<mpsc::Receiver<ArtworkMessage>>,
    artwork_inflight: Option<(u64, String)>,
    next_artwork_request: u64,
}

impl App {
    pub fn new(config: Config) -> Self {
        match ProcessHost::spawn(&config.host) {
            Ok(host) => Self::with_client(config, Box::new(host)),
            Err(err) => {
                log::error!("Failed to start host process: {err:#}");
                Self::with_channels(config, None, None)
            }
        }
    }

    pub fn with_client(config: Config, client: Box<dyn HostClient>) -> Self {
        let (host_tx, host_rx) = spawn_host_worker(client);
        Self::with_channels(config, Some(host_tx), Some(host_rx))
    }

    fn with_channels(
        config: Config,
        host_tx: Option<mpsc::Sender<HostCommand>>,
        host_rx: Option<mpsc::Receiver<HostEvent>>,
    ) -> Self {
        Self {
            config,
            store: PlaybackStore::default(),
            auth: AuthState::Unknown,
            profile: None,
            play_affordance: false,
            seen_revision: 0,
            last_tick: None,
            host_tx,
            host_rx,
            artwork_texture: None,
            artwork_url: None,
            artwork_rx: None,
            artwork_inflight: None,
            next_artwork_request: 1,
        }
    }

    fn drain_host_events(&mut self) {
        let mut events = Vec::new();
        if let Some(rx) = self.host_rx.as_ref() {
            loop {
                match rx.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        log::warn!("Host worker disconnected; keeping the last snapshot");
                        self.host_rx = None;
                        self.host_tx = None;
                        break;
                    }
                }
            }
        }

        for event in events {
            self.apply_host_event(event);
        }
    }

    fn apply_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Authenticated(true) => self.auth = AuthState::SignedIn,
            HostEvent::Authenticated(false) => self.auth = AuthState::SignedOut,
            HostEvent::Profile(profile) => self.profile = profile,
            HostEvent::Playback(snapshot) => {
                self.store.publish(snapshot);
                self.sync_affordance();
            }
        }
    }

    /// Mirror `is_playing` into the affordance, but only when the snapshot
    /// identity moved. Between polls the optimistic flip from a just-clicked
    /// play/pause is left alone.
    fn sync_affordance(&mut self) {
        if self.seen_revision != self.store.revision() {
            self.seen_revision = self.store.revision();
            self.play_affordance = self.store.get().is_some_and(|s| s.is_playing);
        }
    }

    /// Fixed-cadence tick. Deliberately no in-flight guard: a slow refresh
    /// does not delay or coalesce the next one, and the store's last-write-
    /// wins replacement makes the overlap safe.
    fn maybe_tick(&mut self) {
        let now = Instant::now();
        let due = self
            .last_tick
            .is_none_or(|tick| now.duration_since(tick) >= self.config.poll.interval());
        if !due {
            return;
        }
        self.last_tick = Some(now);
        self.send_command(HostCommand::Poll);
    }

    fn time_until_next_tick(&self) -> Duration {
        let interval = self.config.poll.interval();
        match self.last_tick {
            Some(tick) => interval.saturating_sub(tick.elapsed()),
            None => Duration::ZERO,
        }
    }

    fn send_command(&mut self, command: HostCommand) {
        if let Some(tx) = self.host_tx.as_ref() {
            if tx.send(command).is_err() {
                log::warn!("Host worker is gone; dropping command");
                self.host_tx = None;
            }
        }
    }

    fn toggle_play_pause(&mut self) {
        if self.play_affordance {
            self.send_command(HostCommand::Pause);
        } else {
            self.send_command(HostCommand::Play);
        }
        // Optimistic: the next successful poll confirms or corrects this.
        self.play_affordance = !self.play_affordance;
    }

    fn sync_artwork(&mut self) {
        let desired = match display::artwork(self.store.get()) {
            Artwork::Url(url) => Some(url.to_owned()),
            Artwork::Placeholder => None,
        };

        match desired {
            None => {
                self.artwork_texture = None;
                self.artwork_url = None;
                self.artwork_inflight = None;
                self.artwork_rx = None;
            }
            Some(url) => {
                if self.artwork_url.as_deref() == Some(url.as_str()) {
                    return;
                }
                if self
                    .artwork_inflight
                    .as_ref()
                    .is_some_and(|(_, inflight)| inflight == &url)
                {
                    return;
                }
                self.request_artwork(url);
            }
        }
    }

    fn request_artwork(&mut self, url: String) {
        let request_id = self.next_artwork_request;
        self.next_artwork_request = self.next_artwork_request.wrapping_add(1);

        let (tx, rx) = mpsc::channel();
        self.artwork_rx = Some(rx);
        self.artwork_inflight = Some((request_id, url.clone()));

        thread::spawn(move || {
            let message = match download_artwork(&url).and_then(|bytes| decode_artwork(&bytes)) {
                Ok(image) => ArtworkMessage {
                    request_id,
                    url,
                    image: Some(image),
                    error: None,
                },
                Err(err) => ArtworkMessage {
                    request_id,
                    url,
                    image: None,
                    error: Some(err),
                },
            };
            let _ = tx.send(message);
        });
    }

    fn drain_artwork_channel(&mut self, ctx: &egui::Context) {
        let mut clear_rx = false;
        if let Some(rx) = self.artwork_rx.as_ref() {
            loop {
                match rx.try_recv() {
                    Ok(msg) => {
                        let inflight_id = self.artwork_inflight.as_ref().map(|(id, _)| *id);
                        if inflight_id != Some(msg.request_id) {
                            // Stale download for a track we already left.
                            continue;
                        }
                        self.artwork_inflight = None;
                        clear_rx = true;

                        if let Some(err) = msg.error {
                            // Placeholder keeps rendering; a track change
                            // with a new URL will retry.
                            log::debug!("Artwork download failed: {err}");
                            self.artwork_texture = None;
                        } else if let Some(image) = msg.image {
                            let texture = ctx.load_texture(
                                "spotifalc.artwork",
                                image,
                                TextureOptions::LINEAR,
                            );
                            self.artwork_texture = Some(texture);
                        }
                        self.artwork_url = Some(msg.url);
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.artwork_inflight = None;
                        clear_rx = true;
                        break;
                    }
                }
            }
        }
        if clear_rx {
            self.artwork_rx = None;
        }
    }

    fn render_login(&mut self, ui: &mut egui::Ui) {
        ui.add_space(ui.available_height() * 0.3);
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("Spotifalc").size(28.0).strong());
            ui.add_space(8.0);
            ui.label(
                RichText::new("Connect your Spotify account to see what's playing.")
                    .color(theme::TEXT_SECONDARY),
            );
            ui.add_space(16.0);
            if ui.button("Log in with Spotify").clicked() {
                self.send_command(HostCommand::Login);
            }
        });
    }

    fn render_player(&mut self, ui: &mut egui::Ui) {
        let snapshot = self.store.get();
        let title = display::track_title(snapshot).to_owned();
        let artists = display::artist_line(snapshot);
        let album = display::album_name(snapshot).to_owned();
        let percent = display::progress_percent(snapshot);
        let progress = display::progress_label(snapshot);
        let duration = display::duration_label(snapshot);

        if self.auth == AuthState::SignedIn {
            let listener = self
                .profile
                .as_ref()
                .and_then(|p| p.display_name.clone())
                .unwrap_or_else(|| "Listener".to_string());
            ui.label(
                RichText::new(format!("Signed in as {listener}"))
                    .size(11.0)
                    .color(theme::TEXT_SECONDARY),
            );
            ui.add_space(6.0);
        }

        ui.horizontal(|ui| {
            self.paint_artwork(ui);
            ui.add_space(12.0);
            ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |col| {
                col.label(RichText::new(&album).color(theme::TEXT_SECONDARY));
                col.label(RichText::new(&title).size(24.0).strong());
                col.label(RichText::new(&artists).color(theme::TEXT_SECONDARY));
            });
        });

        ui.add_space(18.0);
        Self::paint_progress_bar(ui, percent);

        ui.columns(2, |columns| {
            columns[0].with_layout(egui::Layout::left_to_right(egui::Align::Center), |col| {
                col.label(RichText::new(&progress).size(11.0).strong());
            });
            columns[1].with_layout(egui::Layout::right_to_left(egui::Align::Center), |col| {
                col.label(RichText::new(&duration).size(11.0).strong());
            });
        });

        ui.add_space(8.0);
        self.render_transport_controls(ui);
    }

    fn paint_artwork(&mut self, ui: &mut egui::Ui) {
        let size = egui::vec2(ARTWORK_SIDE, ARTWORK_SIDE);
        let rounding = CornerRadius::same(4);

        if let Some(texture) = self.artwork_texture.as_ref() {
            let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
            let image = egui::Image::new((texture.id(), size))
                .fit_to_exact_size(size)
                .corner_radius(rounding);
            ui.put(rect, image);
        } else {
            let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, rounding, theme::PLACEHOLDER_TILE);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "♪",
                FontId::proportional(ARTWORK_SIDE * 0.4),
                theme::TEXT_SECONDARY,
            );
        }
    }

    fn paint_progress_bar(ui: &mut egui::Ui, percent: f64) {
        let width = ui.available_width();
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(width, PROGRESS_BAR_HEIGHT), egui::Sense::hover());
        let rounding = CornerRadius::same((PROGRESS_BAR_HEIGHT / 2.0) as u8);

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, rounding, theme::PROGRESS_TRACK);

        // The derivation tolerates progress beyond the duration; the fill
        // just pins at full.
        let fraction = (percent / 100.0).clamp(0.0, 1.0) as f32;
        if fraction > 0.0 {
            let fill = egui::Rect::from_min_size(
                rect.min,
                egui::vec2(rect.width() * fraction, rect.height()),
            );
            painter.rect_filled(fill, rounding, theme::PROGRESS_FILL);
        }
    }

    fn render_transport_controls(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.horizontal(|row| {
                row.spacing_mut().item_spacing.x = TRANSPORT_SPACING;

                // Seek-back, seek-forward, and favorite are visual stubs:
                // present in the layout but wired to no host command.
                let _ = transport_glyph(row, "↩", TRANSPORT_ICON_SIZE, theme::TEXT_PRIMARY)
                    .on_hover_text("Back 10 seconds");

                let previous =
                    transport_glyph(row, "⏮", TRANSPORT_ICON_SIZE, theme::TEXT_PRIMARY)
                        .on_hover_text("Previous track");
                if previous.clicked() {
                    self.send_command(HostCommand::PreviousTrack);
                }

                let glyph = if self.play_affordance { "⏸" } else { "▶" };
                let hint = if self.play_affordance { "Pause" } else { "Play" };
                let play_pause = transport_glyph(row, glyph, PLAY_ICON_SIZE, theme::TEXT_PRIMARY)
                    .on_hover_text(hint);
                if play_pause.clicked() {
                    self.toggle_play_pause();
                }

                let next = transport_glyph(row, "⏭", TRANSPORT_ICON_SIZE, theme::TEXT_PRIMARY)
                    .on_hover_text("Next track");
                if next.clicked() {
                    self.send_command(HostCommand::NextTrack);
                }

                let _ = transport_glyph(row, "↪", TRANSPORT_ICON_SIZE, theme::TEXT_PRIMARY)
                    .on_hover_text("Forward 10 seconds");
                let _ = transport_glyph(row, "♥", TRANSPORT_ICON_SIZE, theme::FAVORITE)
                    .on_hover_text("Favorite");
            });
        });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        theme::apply_style(ctx);

        self.drain_host_events();
        self.drain_artwork_channel(ctx);
        self.maybe_tick();
        self.sync_artwork();

        egui::CentralPanel::default().show(ctx, |ui| match self.auth {
            AuthState::SignedOut => self.render_login(ui),
            AuthState::Unknown | AuthState::SignedIn => self.render_player(ui),
        });

        // Keep ticking even when the window sits idle.
        ctx.request_repaint_after(self.time_until_next_tick());
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(tx) = self.host_tx.take() {
            let _ = tx.send(HostCommand::Shutdown);
        }
    }
}

fn transport_glyph(ui: &mut egui::Ui, glyph: &str, size: f32, color: Color32) -> egui::Response {
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(size + 10.0, size + 10.0), egui::Sense::click());
    if response.hovered() {
        ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
    }
    ui.painter().text(
        rect.center(),
        Align2::CENTER_CENTER,
        glyph,
        FontId::proportional(size),
        color,
    );
    response
}

fn download_artwork(url: &str) -> Result<Vec<u8>, String> {
    let response =
        reqwest::blocking::get(url).map_err(|e| format!("Failed to fetch artwork: {e}"))?;
    let response = response
        .error_for_status()
        .map_err(|e| format!("Artwork request failed: {e}"))?;
    let bytes = response
        .bytes()
        .map_err(|e| format!("Failed to read artwork bytes: {e}"))?;
    Ok(bytes.to_vec())
}

fn decode_artwork(bytes: &[u8]) -> Result<ColorImage, String> {
    let image =
        image::load_from_memory(bytes).map_err(|e| format!("Failed to decode artwork: {e}"))?;
    let image = image.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    let pixels = image.into_raw();
    Ok(ColorImage::from_rgba_unmultiplied(size, &pixels))
}
