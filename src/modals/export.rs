use crate::app_state::AppState;
use crate::renderer::{save_png, Backend};
use anyhow::Result;
use eframe::egui;
use image::RgbaImage;
use std::path::Path;

#[cfg(feature = "wgpu")]
type RenderState<'a> = Option<&'a egui_wgpu::RenderState>;
#[cfg(not(feature = "wgpu"))]
type RenderState<'a> = Option<&'a ()>;

pub fn show(ctx: &egui::Context, state: &mut AppState, render_state: RenderState<'_>) {
    if !state.show_export_modal {
        return;
    }

    let screen_rect = ctx.input(|i| i.screen_rect());
    let mut export_clicked = false;
    let mut close = false;

    egui::Area::new("export_modal_overlay")
        .fixed_pos(egui::pos2(0.0, 0.0))
        .interactable(true)
        .order(egui::Order::Tooltip)
        .show(ctx, |ui| {
            let _blocker = ui.allocate_rect(screen_rect, egui::Sense::click_and_drag());
            ui.painter()
                .rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(210));

            let rect = egui::Rect::from_center_size(screen_rect.center(), egui::vec2(420.0, 260.0));
            ui.allocate_ui_at_rect(rect, |ui| {
                egui::Frame::window(ui.style())
                    .fill(egui::Color32::from_rgb(28, 28, 32))
                    .inner_margin(24.0)
                    .rounding(14.0)
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_white_alpha(25)))
                    .show(ui, |ui| {
                        ui.vertical_centered(|ui| {
                            ui.label(
                                egui::RichText::new("Export Heatmap")
                                    .size(22.0)
                                    .strong()
                                    .color(egui::Color32::WHITE),
                            );
                        });
                        ui.add_space(14.0);

                        egui::Grid::new("export_config_grid")
                            .num_columns(2)
                            .spacing(egui::vec2(16.0, 10.0))
                            .show(ui, |ui| {
                                let max = crate::heatmap::MAX_BITMAP_RESOLUTION;
                                ui.label("Width");
                                ui.add(egui::DragValue::new(&mut state.export_width).clamp_range(1..=max).suffix(" px"));
                                ui.end_row();
                                ui.label("Height");
                                ui.add(egui::DragValue::new(&mut state.export_height).clamp_range(1..=max).suffix(" px"));
                                ui.end_row();
                            });

                        if let Some(last) = &state.export_output_path {
                            ui.add_space(8.0);
                            ui.label(
                                egui::RichText::new(format!("Last export: {}", last.display()))
                                    .size(12.0)
                                    .color(egui::Color32::from_white_alpha(140)),
                            );
                        }

                        ui.add_space(20.0);
                        ui.horizontal(|ui| {
                            if ui.button("Cancel").clicked() {
                                close = true;
                            }
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                let export_btn = egui::Button::new(
                                    egui::RichText::new("Export  →").size(14.0).strong(),
                                )
                                .min_size(egui::vec2(130.0, 36.0))
                                .fill(egui::Color32::from_rgb(0, 120, 215));
                                if ui.add(export_btn).clicked() {
                                    export_clicked = true;
                                }
                            });
                        });
                    });
            });
        });

    if export_clicked {
        let default_name = state
            .script
            .as_ref()
            .and_then(|s| s.title.clone())
            .unwrap_or_else(|| "heatmap".to_string());
        let dialog = rfd::FileDialog::new()
            .set_title("Save heatmap")
            .add_filter("PNG Image", &["png"])
            .set_file_name(format!("{default_name}.png"));
        if let Some(path) = dialog.save_file() {
            match export_bitmap(state, render_state, &path) {
                Ok(backend) => {
                    state.status = Some(format!("exported {} ({:?})", path.display(), backend));
                }
                Err(e) => {
                    log::error!("export failed: {e:#}");
                    state.status = Some(format!("export failed: {e:#}"));
                }
            }
            state.export_output_path = Some(path);
            close = true;
        }
    }
    if close {
        state.show_export_modal = false;
    }
}

/// Renders the current speeds at the requested size and writes a PNG, on the
/// viewer's GPU when it has one.
pub fn export_bitmap(state: &AppState, render_state: RenderState<'_>, path: &Path) -> Result<Backend> {
    let (img, backend) = render_current(state, render_state);
    save_png(&img, path)?;
    log::info!("exported {}x{} heatmap to {}", img.width(), img.height(), path.display());
    Ok(backend)
}

#[cfg(feature = "wgpu")]
fn render_current(state: &AppState, render_state: RenderState<'_>) -> (RgbaImage, Backend) {
    use crate::render::HeatmapResources;

    if let Some(rs) = render_state.filter(|_| state.gpu_available) {
        let mut renderer = rs.renderer.write();
        if let Some(resources) = renderer.callback_resources.get_mut::<HeatmapResources>() {
            // the strip may not have been painted since the last change
            if state.gradient_version > resources.gradient_version {
                resources.set_gradient(&rs.device, &rs.queue, &state.strip_gradient);
                resources.gradient_version = state.gradient_version;
            }
            if state.speeds_version > resources.speeds_version {
                resources.update_speeds(&rs.device, &rs.queue, &state.speeds);
                resources.speeds_version = state.speeds_version;
            }
            match crate::render::render_to_bitmap(
                &rs.device,
                &rs.queue,
                resources,
                state.export_width,
                state.export_height,
            ) {
                Ok(img) => return (img, Backend::Gpu),
                Err(e) => log::warn!("GPU export unavailable, using CPU rasterizer: {e:#}"),
            }
        }
    }
    render_cpu(state)
}

#[cfg(not(feature = "wgpu"))]
fn render_current(state: &AppState, _render_state: RenderState<'_>) -> (RgbaImage, Backend) {
    render_cpu(state)
}

fn render_cpu(state: &AppState) -> (RgbaImage, Backend) {
    let img = crate::heatmap::rasterize(
        &state.speeds,
        &state.strip_gradient,
        state.export_width,
        state.export_height,
    );
    (img, Backend::Cpu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_without_gpu_uses_the_rasterizer() {
        let mut state = AppState::default();
        state.export_width = 40;
        state.export_height = 6;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("strip.png");
        let backend = export_bitmap(&state, None, &path).expect("exported");
        assert_eq!(backend, Backend::Cpu);
        let img = image::open(&path).expect("readable").to_rgba8();
        assert_eq!(img.dimensions(), (40, 6));
    }
}
