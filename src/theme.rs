//! Fixed widget palette, lifted from the styling of the original widget.

use eframe::egui::{self, Color32};

pub const BACKGROUND: Color32 = Color32::from_rgb(11, 11, 11);
pub const TEXT_PRIMARY: Color32 = Color32::WHITE;
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(146, 145, 144);
// 58% opacity over the panel, as in the original progress track.
pub const PROGRESS_TRACK: Color32 = Color32::from_rgba_premultiplied(78, 78, 78, 148);
pub const PROGRESS_FILL: Color32 = Color32::WHITE;
pub const FAVORITE: Color32 = Color32::from_rgb(255, 0, 0);
pub const PLACEHOLDER_TILE: Color32 = Color32::from_rgb(32, 32, 32);

pub fn apply_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.visuals = egui::Visuals::dark();
    style.visuals.override_text_color = Some(TEXT_PRIMARY);
    style.visuals.panel_fill = BACKGROUND;
    style.visuals.window_fill = BACKGROUND;
    style.visuals.widgets.inactive.fg_stroke.color = TEXT_PRIMARY;
    style.visuals.widgets.hovered.fg_stroke.color = TEXT_PRIMARY;
    ctx.set_style(style);
}
