use eframe::egui;
use uuid::Uuid;

use crate::egui_app::state::AppState;
use crate::egui_app::theme::{colors, styles};
use crate::shared::bookmark::Bookmark;

enum RowAction {
    Edit(Bookmark),
    Delete(Uuid),
}

pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    render_form(ui, state);
    ui.add_space(16.0);
    render_list(ui, state);
}

fn render_form(ui: &mut egui::Ui, state: &mut AppState) {
    let vm = &mut state.bookmarks;
    let mut submit = false;
    let mut cancel = false;

    styles::form_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());
        egui::Grid::new("bookmark_form")
            .num_columns(2)
            .spacing([8.0, 8.0])
            .show(ui, |ui| {
                ui.colored_label(colors::TEXT_SECONDARY, "Title");
                ui.add(
                    egui::TextEdit::singleline(&mut vm.draft.title)
                        .hint_text("Rust docs")
                        .desired_width(f32::INFINITY),
                );
                ui.end_row();

                ui.colored_label(colors::TEXT_SECONDARY, "URL");
                let url = ui.add(
                    egui::TextEdit::singleline(&mut vm.draft.url)
                        .hint_text("https://doc.rust-lang.org")
                        .desired_width(f32::INFINITY),
                );
                if url.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                ui.end_row();
            });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.add(styles::primary_button(vm.submit_label())).clicked() {
                submit = true;
            }
            if vm.draft.editing().is_some() && ui.button("Cancel").clicked() {
                cancel = true;
            }
        });
    });

    if cancel {
        vm.cancel_edit();
    } else if submit {
        vm.submit();
    }
}

fn render_list(ui: &mut egui::Ui, state: &mut AppState) {
    let vm = &mut state.bookmarks;
    let mut action = None;

    if vm.bookmarks().is_empty() {
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            ui.colored_label(colors::TEXT_SECONDARY, "No bookmarks yet.");
        });
        return;
    }

    let editing = vm.draft.editing();
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for bookmark in vm.bookmarks() {
                let frame = if editing == Some(bookmark.id) {
                    styles::row_frame().stroke(egui::Stroke::new(1.0, colors::ACCENT))
                } else {
                    styles::row_frame()
                };
                frame.show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            ui.hyperlink_to(
                                egui::RichText::new(&bookmark.title).strong(),
                                &bookmark.url,
                            );
                            ui.colored_label(colors::TEXT_SECONDARY, &bookmark.url);
                        });
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Delete").clicked() {
                                action = Some(RowAction::Delete(bookmark.id));
                            }
                            if ui.button("Edit").clicked() {
                                action = Some(RowAction::Edit(bookmark.clone()));
                            }
                        });
                    });
                });
                ui.add_space(6.0);
            }
        });

    match action {
        Some(RowAction::Edit(bookmark)) => vm.begin_edit(&bookmark),
        Some(RowAction::Delete(id)) => vm.remove(id),
        None => {}
    }
}
