//! Theme Styling Functions
//!
//! Helpers that apply the palette consistently across screens.

use eframe::egui::{self, Color32, CornerRadius, Stroke};
use super::colors;

/// Apply the global theme to the egui context
pub fn apply_global_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    // Window styling
    style.visuals.window_fill = colors::MODAL_BG;
    style.visuals.window_stroke = Stroke::new(1.0, colors::BORDER);

    // Panel styling
    style.visuals.panel_fill = colors::BG_DARK;
    style.visuals.extreme_bg_color = colors::INPUT_BG;
    style.visuals.hyperlink_color = colors::LINK;

    // Widget styling
    style.visuals.widgets.noninteractive.bg_fill = colors::FORM_BG;
    style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, colors::TEXT_LIGHT);

    style.visuals.widgets.inactive.bg_fill = colors::BUTTON_SECONDARY;
    style.visuals.widgets.inactive.weak_bg_fill = colors::BUTTON_SECONDARY;
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, colors::TEXT_LIGHT);

    style.visuals.widgets.hovered.bg_fill = colors::BORDER;
    style.visuals.widgets.hovered.weak_bg_fill = colors::BORDER;
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, colors::TEXT_LIGHT);

    style.visuals.widgets.active.bg_fill = colors::ACCENT;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, colors::TEXT_LIGHT);

    // Selection color
    style.visuals.selection.bg_fill = colors::ACCENT;
    style.visuals.selection.stroke = Stroke::new(1.0, colors::TEXT_LIGHT);

    ctx.set_style(style);
}

/// Create a frame style for the top bar
pub fn top_bar_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::TOP_BAR_BG)
        .inner_margin(egui::Margin::symmetric(12, 8))
}

/// Create a frame style for the main area
pub fn main_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::BG_DARK)
        .inner_margin(egui::Margin::symmetric(24, 16))
}

/// Create a frame style for the bookmark form
pub fn form_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::FORM_BG)
        .stroke(Stroke::new(1.0, colors::BORDER))
        .corner_radius(CornerRadius::same(8))
        .inner_margin(egui::Margin::same(12))
}

/// Create a frame for a bookmark row
pub fn row_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::ROW_BG)
        .corner_radius(CornerRadius::same(6))
        .inner_margin(egui::Margin::symmetric(12, 10))
}

/// Create a frame for modal dialogs
pub fn modal_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(colors::MODAL_BG)
        .stroke(Stroke::new(2.0, colors::BORDER))
        .corner_radius(CornerRadius::same(12))
        .inner_margin(egui::Margin::same(20))
        .shadow(egui::epaint::Shadow {
            offset: [0, 4],
            blur: 12,
            spread: 0,
            color: Color32::from_black_alpha(60),
        })
}

/// A filled accent button
pub fn primary_button(text: &str) -> egui::Button<'static> {
    egui::Button::new(egui::RichText::new(text.to_owned()).color(colors::TEXT_LIGHT))
        .fill(colors::ACCENT)
        .stroke(Stroke::NONE)
        .corner_radius(CornerRadius::same(6))
}
