use crate::app_state::AppState;
use crate::modals;
use crate::timeline;
use eframe::egui;

pub struct MyApp {
    state: AppState,
}

/// Builds the app, creating the heatmap GPU resources when the wgpu renderer is running.
pub fn create_app(cc: &eframe::CreationContext<'_>, mut state: AppState) -> MyApp {
    #[cfg(feature = "wgpu")]
    if let Some(render_state) = cc.wgpu_render_state.as_ref() {
        let resources = crate::render::HeatmapResources::new(
            &render_state.device,
            &render_state.queue,
            render_state.target_format,
            &state.strip_gradient,
            state.settings.resolution,
        );
        crate::render::install(render_state, resources);
        state.gpu_available = true;
    }
    if !state.gpu_available {
        log::warn!("wgpu renderer not available, drawing the heatmap on the CPU");
    }
    #[cfg(not(feature = "wgpu"))]
    let _ = cc;
    MyApp { state }
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let state = &mut self.state;

        handle_dropped_files(ctx, state);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("📂 Open").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Funscript", &["funscript", "json"])
                        .pick_file()
                    {
                        open_path(state, &path);
                    }
                }
                let has_script = state.script.is_some();
                if ui
                    .add_enabled(has_script, egui::Button::new("🖼 Export PNG"))
                    .clicked()
                {
                    state.show_export_modal = true;
                }
                if ui.button("⚙ Settings").clicked() {
                    state.settings_draft = None;
                    state.show_settings = true;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(if state.gpu_available { "GPU" } else { "CPU" })
                            .small()
                            .color(egui::Color32::GRAY),
                    );
                    if let Some(status) = &state.status {
                        ui.label(egui::RichText::new(status).color(egui::Color32::from_gray(190)));
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("heatmap_panel")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                timeline::show_heatmap_strip(ui, state);
                ui.horizontal(|ui| {
                    ui.label(format!(
                        "{} / {}",
                        timeline::format_time(state.time),
                        timeline::format_time(state.total_duration())
                    ));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format!(
                            "max {:.0} units/s · {} buckets",
                            state.settings.max_speed_per_second, state.settings.resolution
                        ));
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            timeline::show(ui, state);
        });

        modals::project_settings::show(ctx, state);
        #[cfg(feature = "wgpu")]
        modals::export::show(ctx, state, frame.wgpu_render_state());
        #[cfg(not(feature = "wgpu"))]
        {
            let _ = frame;
            modals::export::show(ctx, state, None);
        }
    }
}

pub fn open_path(state: &mut AppState, path: &std::path::Path) {
    if let Err(e) = state.open_script(path) {
        log::error!("{e:#}");
        state.status = Some(format!("{e:#}"));
    }
}

fn handle_dropped_files(ctx: &egui::Context, state: &mut AppState) {
    let dropped: Vec<std::path::PathBuf> = ctx.input(|i| {
        i.raw
            .dropped_files
            .iter()
            .filter_map(|f| f.path.clone())
            .collect()
    });
    // only the last file is kept, like opening them one after another
    if let Some(path) = dropped.last() {
        open_path(state, path);
    }
}
