use eframe::egui;

use crate::egui_app::realtime::SubscriptionStatus;
use crate::egui_app::state::AppState;
use crate::egui_app::theme::{colors, styles};
use crate::egui_app::AppView;

pub mod auth_view;
pub mod bookmarks_view;

pub fn render_top_bar(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::top("top_panel")
        .frame(styles::top_bar_frame())
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(
                    colors::TEXT_LIGHT,
                    egui::RichText::new("🔖 Smartmarks").size(18.0).strong(),
                );

                if state.current_view != AppView::Bookmarks {
                    return;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Logout").clicked() {
                        state.logout();
                    }
                    if let Some(email) = state.user_email() {
                        ui.colored_label(colors::TEXT_SECONDARY, email);
                    }

                    ui.add_space(16.0);
                    render_channel_status(ui, state.bookmarks.channel_status());

                    if state.bookmarks.is_busy() {
                        ui.spinner();
                    }
                });
            });
        });
}

/// Live channel indicator
fn render_channel_status(ui: &mut egui::Ui, status: Option<&SubscriptionStatus>) {
    let (color, text) = match status {
        Some(SubscriptionStatus::Connected) => (colors::STATUS_ONLINE, "● Live"),
        Some(SubscriptionStatus::Error(_)) => (colors::ERROR, "● Not syncing"),
        Some(SubscriptionStatus::Disconnected) => (colors::STATUS_OFFLINE, "● Closed"),
        Some(SubscriptionStatus::Connecting) | None => (colors::STATUS_OFFLINE, "● Connecting"),
    };
    let label = ui.colored_label(color, text);
    if let Some(SubscriptionStatus::Error(reason)) = status {
        label.on_hover_text(reason.as_str());
    }
}

pub fn render_main_panel(ctx: &egui::Context, state: &mut AppState) {
    egui::CentralPanel::default()
        .frame(styles::main_frame())
        .show(ctx, |ui| match state.current_view {
            AppView::Restoring => auth_view::render_restoring(ui),
            AppView::Login => auth_view::render(ui, state),
            AppView::Bookmarks => bookmarks_view::render(ui, state),
        });
}

/// Blocking warning; the rest of the window is inert until it is dismissed.
pub fn render_warning(ctx: &egui::Context, state: &mut AppState) {
    let Some(message) = state.bookmarks.warning().map(str::to_owned) else {
        return;
    };

    let mut dismissed = false;
    let response = egui::Modal::new(egui::Id::new("warning_modal"))
        .frame(styles::modal_frame())
        .show(ctx, |ui| {
            ui.set_min_width(240.0);
            ui.colored_label(colors::WARNING, egui::RichText::new("⚠ Warning").strong());
            ui.add_space(8.0);
            ui.colored_label(colors::TEXT_LIGHT, message);
            ui.add_space(12.0);
            ui.vertical_centered(|ui| {
                if ui.add(styles::primary_button("OK")).clicked() {
                    dismissed = true;
                }
            });
        });

    if dismissed || response.should_close() {
        state.bookmarks.dismiss_warning();
    }
}
