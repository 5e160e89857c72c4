use crate::app_state::AppState;
use crate::heatmap::rasterize;
use eframe::egui;

pub fn show(ui: &mut egui::Ui, state: &mut AppState) {
    egui::Frame::none()
        .fill(egui::Color32::from_rgb(40, 40, 42))
        .show(ui, |ui| {
            ui.set_min_size(ui.available_size());

            let (rect, response) =
                ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

            let ruler_height = 24.0;
            let duration = state.total_duration();

            // --- Input Handling (Pan & Zoom) ---
            if response.dragged_by(egui::PointerButton::Middle) {
                state.timeline_pan_x -= response.drag_delta().x;
            }
            let scroll_delta = ui.input(|i| i.raw_scroll_delta);
            if ui.input(|i| i.modifiers.ctrl) && scroll_delta.y != 0.0 {
                let zoom_factor = if scroll_delta.y > 0.0 { 1.1 } else { 0.9 };
                state.timeline_zoom = (state.timeline_zoom * zoom_factor).clamp(1.0, 2000.0);
            } else if scroll_delta.x != 0.0 || scroll_delta.y != 0.0 {
                state.timeline_pan_x -= scroll_delta.x + scroll_delta.y;
            }
            let max_pan = (duration * state.timeline_zoom - rect.width()).max(0.0);
            state.timeline_pan_x = state.timeline_pan_x.clamp(0.0, max_pan);

            let pixels_per_sec = state.timeline_zoom;
            let pan_x = state.timeline_pan_x;
            let time_to_x = |t: f32| rect.left() + t * pixels_per_sec - pan_x;

            if response.clicked_by(egui::PointerButton::Primary)
                || response.dragged_by(egui::PointerButton::Primary)
            {
                if let Some(pos) = response.interact_pointer_pos() {
                    let t = (pos.x - rect.left() + pan_x) / pixels_per_sec;
                    state.set_time(t);
                }
            }

            let painter = ui.painter_at(rect);

            // --- 1. Ruler ---
            let ruler_rect =
                egui::Rect::from_min_size(rect.min, egui::vec2(rect.width(), ruler_height));
            painter.rect_filled(ruler_rect, 0.0, egui::Color32::from_rgb(55, 55, 57));
            painter.line_segment(
                [ruler_rect.left_bottom(), ruler_rect.right_bottom()],
                egui::Stroke::new(1.0, egui::Color32::from_gray(80)),
            );
            draw_ruler_ticks(&painter, ruler_rect, pixels_per_sec, pan_x, duration);

            // --- 2. Position graph ---
            let graph_rect = egui::Rect::from_min_max(
                egui::pos2(rect.left(), ruler_rect.bottom() + 6.0),
                egui::pos2(rect.right(), rect.bottom() - 6.0),
            );
            if let Some(script) = &state.script {
                let max_speed = state.settings.max_speed_per_second;
                let pos_to_y = |pos: f32| graph_rect.bottom() - pos / 100.0 * graph_rect.height();
                let visible = rect.x_range();

                for pair in script.actions.as_slice().windows(2) {
                    let (prev, next) = (pair[0], pair[1]);
                    let (x0, x1) = (time_to_x(prev.at_s), time_to_x(next.at_s));
                    if x1 < visible.min || x0 > visible.max {
                        continue;
                    }
                    let dt = next.at_s - prev.at_s;
                    let speed = if dt > 0.0 { (next.pos - prev.pos).abs() / dt } else { 0.0 };
                    let color = state.line_gradient.compute_color32(speed / max_speed);
                    painter.line_segment(
                        [
                            egui::pos2(x0, pos_to_y(prev.pos)),
                            egui::pos2(x1, pos_to_y(next.pos)),
                        ],
                        egui::Stroke::new(2.0, color),
                    );
                }
                for a in script.actions.iter() {
                    let x = time_to_x(a.at_s);
                    if visible.contains(x) {
                        painter.circle_filled(
                            egui::pos2(x, pos_to_y(a.pos)),
                            3.0,
                            egui::Color32::from_gray(220),
                        );
                    }
                }
            } else {
                painter.text(
                    graph_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Open or drop a .funscript file",
                    egui::FontId::proportional(14.0),
                    egui::Color32::GRAY,
                );
            }

            // --- 3. Playhead ---
            let x = time_to_x(state.time);
            if rect.x_range().contains(x) {
                painter.line_segment(
                    [egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
                    egui::Stroke::new(1.5, egui::Color32::from_rgb(255, 80, 80)),
                );
            }
        });
}

fn draw_ruler_ticks(
    painter: &egui::Painter,
    ruler_rect: egui::Rect,
    pixels_per_sec: f32,
    pan_x: f32,
    duration: f32,
) {
    let font_id = egui::FontId::proportional(10.0);
    // aim for a labelled tick every ~80px
    let step_secs = [1.0f32, 5.0, 10.0, 30.0, 60.0, 300.0]
        .into_iter()
        .find(|s| s * pixels_per_sec >= 80.0)
        .unwrap_or(600.0);

    let start = (pan_x / pixels_per_sec / step_secs).floor() as i32;
    let end = ((pan_x + ruler_rect.width()) / pixels_per_sec / step_secs).ceil() as i32;
    for s in start.max(0)..=end {
        let sec_val = s as f32 * step_secs;
        if sec_val > duration.max(0.0) + step_secs {
            break;
        }
        let x = ruler_rect.left() + sec_val * pixels_per_sec - pan_x;
        painter.line_segment(
            [
                egui::pos2(x, ruler_rect.bottom()),
                egui::pos2(x, ruler_rect.bottom() - 10.0),
            ],
            egui::Stroke::new(1.0, egui::Color32::LIGHT_GRAY),
        );
        painter.text(
            egui::pos2(x + 2.0, ruler_rect.top() + 4.0),
            egui::Align2::LEFT_TOP,
            format_time(sec_val),
            font_id.clone(),
            egui::Color32::GRAY,
        );
    }
}

pub fn format_time(secs: f32) -> String {
    let total = secs.max(0.0) as u32;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Heatmap strip for the whole script. Clicking it seeks the playhead.
pub fn show_heatmap_strip(ui: &mut egui::Ui, state: &mut AppState) {
    let height = state.settings.strip_height;
    let (rect, response) = ui.allocate_exact_size(
        egui::vec2(ui.available_width(), height),
        egui::Sense::click_and_drag(),
    );
    let painter = ui.painter_at(rect);

    if state.gpu_available {
        #[cfg(feature = "wgpu")]
        crate::render::paint_heatmap(
            &painter,
            rect,
            crate::render::HeatmapCallback {
                speeds: state.speeds.clone(),
                speeds_version: state.speeds_version,
                gradient: state.strip_gradient.clone(),
                gradient_version: state.gradient_version,
            },
        );
    } else {
        paint_cpu_strip(ui.ctx(), &painter, rect, state);
    }

    let duration = state.total_duration();
    if duration > 0.0 {
        if let Some(pos) = response.interact_pointer_pos() {
            if response.clicked() || response.dragged() {
                state.set_time((pos.x - rect.left()) / rect.width() * duration);
            }
        }
        let x = rect.left() + state.time / duration * rect.width();
        painter.line_segment(
            [egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
            egui::Stroke::new(1.5, egui::Color32::WHITE),
        );
    }
    response.on_hover_text(format!(
        "{} / {}",
        format_time(state.time),
        format_time(duration)
    ));
}

/// Fallback when the wgpu renderer is not running: rasterize on the CPU and
/// cache the result as an egui texture until the speeds or ramp change.
fn paint_cpu_strip(ctx: &egui::Context, painter: &egui::Painter, rect: egui::Rect, state: &mut AppState) {
    let stale = match &state.cpu_strip_texture {
        Some((_, speeds_v, gradient_v)) => {
            *speeds_v != state.speeds_version || *gradient_v != state.gradient_version
        }
        None => true,
    };
    if stale {
        let width = (rect.width().max(1.0) * ctx.pixels_per_point()) as u32;
        let img = rasterize(&state.speeds, &state.strip_gradient, width, 32);
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [img.width() as usize, img.height() as usize],
            img.as_raw(),
        );
        let handle = ctx.load_texture("heatmap_strip_cpu", color_image, egui::TextureOptions::LINEAR);
        state.cpu_strip_texture = Some((handle, state.speeds_version, state.gradient_version));
    }
    if let Some((handle, _, _)) = &state.cpu_strip_texture {
        painter.image(
            handle.id(),
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_labels() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(75.9), "01:15");
        assert_eq!(format_time(-3.0), "00:00");
    }
}
