use eframe::egui;

use crate::egui_app::state::AppState;
use crate::egui_app::theme::{colors, styles};

pub fn render_restoring(ui: &mut egui::Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space((ui.available_height() / 2.0 - 40.0).max(0.0));
        ui.spinner();
        ui.add_space(8.0);
        ui.colored_label(colors::TEXT_SECONDARY, "Restoring session...");
    });
}

pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    ui.vertical_centered(|ui| {
        let top_space = (ui.available_height() - 220.0).max(0.0) / 2.0;
        ui.add_space(top_space);

        ui.label(
            egui::RichText::new("🔖 Smartmarks")
                .size(32.0)
                .strong()
                .color(colors::TEXT_LIGHT),
        );
        ui.add_space(8.0);
        ui.colored_label(colors::TEXT_SECONDARY, "Your bookmarks, on every device.");
        ui.add_space(28.0);

        if let Some(ref error) = state.login_error {
            ui.label(egui::RichText::new(error).color(colors::ERROR));
            ui.add_space(10.0);
        }

        let signing_in = state.session.is_signing_in();
        let label = if signing_in { "Open sign-in page again" } else { "Sign in" };
        if ui
            .add_sized([220.0, 36.0], styles::primary_button(label))
            .clicked()
        {
            if let Some(url) = state.handle_login() {
                ui.ctx().open_url(egui::OpenUrl::new_tab(url));
            }
        }

        if signing_in {
            ui.add_space(15.0);
            ui.horizontal(|ui| {
                ui.add_space((ui.available_width() - 220.0).max(0.0) / 2.0);
                ui.spinner();
                ui.colored_label(colors::TEXT_LIGHT, "Waiting for the browser...");
            });
        }
    });
}
