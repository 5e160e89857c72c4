use crate::app_state::AppState;
use crate::settings::{Palette, Settings};
use eframe::egui;

pub fn show(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_settings {
        return;
    }
    // edits go to a draft so cancelling leaves the live settings alone
    let mut draft = state
        .settings_draft
        .take()
        .unwrap_or_else(|| state.settings.clone());

    let screen_rect = ctx.input(|i| i.screen_rect());
    let mut action = None;

    egui::Area::new("settings_overlay")
        .fixed_pos(egui::pos2(0.0, 0.0))
        .interactable(true)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            let _blocker = ui.allocate_rect(screen_rect, egui::Sense::click_and_drag());
            ui.painter()
                .rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(180));

            let rect = egui::Rect::from_center_size(screen_rect.center(), egui::vec2(420.0, 320.0));
            ui.allocate_ui_at_rect(rect, |ui| {
                egui::Frame::none()
                    .fill(egui::Color32::from_rgb(20, 20, 22))
                    .rounding(20.0)
                    .inner_margin(24.0)
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_white_alpha(15)))
                    .show(ui, |ui| {
                        ui.heading(
                            egui::RichText::new("Heatmap Settings")
                                .size(20.0)
                                .strong()
                                .color(egui::Color32::from_white_alpha(240)),
                        );
                        ui.add_space(10.0);
                        ui.separator();
                        ui.add_space(10.0);
                        render_body(ui, &mut draft);
                        ui.add_space(16.0);
                        action = render_footer(ui);
                    });
            });
        });

    match action {
        Some(FooterAction::Apply) => {
            state.apply_settings(draft);
            state.show_settings = false;
        }
        Some(FooterAction::Save) => {
            state.apply_settings(draft);
            state.save_settings();
            state.show_settings = false;
        }
        Some(FooterAction::Cancel) => state.show_settings = false,
        None => state.settings_draft = Some(draft),
    }
}

enum FooterAction {
    Apply,
    Save,
    Cancel,
}

fn render_body(ui: &mut egui::Ui, settings: &mut Settings) {
    let label_color = egui::Color32::from_gray(170);
    egui::Grid::new("heatmap_settings_grid")
        .num_columns(2)
        .spacing([40.0, 12.0])
        .show(ui, |ui| {
            ui.label(egui::RichText::new("Max speed (units/s)").color(label_color));
            ui.add(
                egui::DragValue::new(&mut settings.max_speed_per_second)
                    .clamp_range(1.0..=10_000.0)
                    .speed(10.0),
            );
            ui.end_row();

            ui.label(egui::RichText::new("Resolution (buckets)").color(label_color));
            ui.add(
                egui::DragValue::new(&mut settings.resolution)
                    .clamp_range(1..=crate::heatmap::MAX_BITMAP_RESOLUTION as usize)
                    .speed(16),
            );
            ui.end_row();

            ui.label(egui::RichText::new("Strip height").color(label_color));
            ui.add(
                egui::DragValue::new(&mut settings.strip_height)
                    .clamp_range(8.0..=256.0)
                    .suffix(" px"),
            );
            ui.end_row();

            ui.label(egui::RichText::new("Palette").color(label_color));
            ui.horizontal(|ui| {
                ui.selectable_value(&mut settings.palette, Palette::Strip, "Strip");
                ui.selectable_value(&mut settings.palette, Palette::Lines, "Lines");
            });
            ui.end_row();
        });
}

fn render_footer(ui: &mut egui::Ui) -> Option<FooterAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        if ui.button("Cancel").clicked() {
            action = Some(FooterAction::Cancel);
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add(egui::Button::new("Save").fill(egui::Color32::from_rgb(0, 120, 215)))
                .clicked()
            {
                action = Some(FooterAction::Save);
            }
            if ui.button("Apply").clicked() {
                action = Some(FooterAction::Apply);
            }
        });
    });
    action
}
