//! Integración con egui: el paint callback que dibuja la franja dentro de un rect de la UI.

use eframe::egui;
use super::resources::HeatmapResources;
use crate::heatmap::Gradient;
use std::sync::Arc;

/// Datos de un dibujado de la franja. `prepare` solo sube datos cuando la
/// versión es más nueva que la que ya tiene la GPU.
pub struct HeatmapCallback {
    pub speeds: Arc<Vec<f32>>,
    pub speeds_version: u64,
    pub gradient: Arc<Gradient>,
    pub gradient_version: u64,
}

impl egui_wgpu::CallbackTrait for HeatmapCallback {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        _screen_descriptor: &egui_wgpu::ScreenDescriptor,
        _egui_encoder: &mut wgpu::CommandEncoder,
        callback_resources: &mut egui_wgpu::CallbackResources,
    ) -> Vec<wgpu::CommandBuffer> {
        let Some(resources) = callback_resources.get_mut::<HeatmapResources>() else {
            return Vec::new();
        };
        if self.gradient_version > resources.gradient_version {
            resources.set_gradient(device, queue, &self.gradient);
            resources.gradient_version = self.gradient_version;
        }
        if self.speeds_version > resources.speeds_version {
            resources.update_speeds(device, queue, &self.speeds);
            resources.speeds_version = self.speeds_version;
        }
        Vec::new()
    }

    fn paint<'a>(
        &'a self,
        _info: egui::PaintCallbackInfo,
        render_pass: &mut wgpu::RenderPass<'a>,
        callback_resources: &'a egui_wgpu::CallbackResources,
    ) {
        if let Some(resources) = callback_resources.get::<HeatmapResources>() {
            render_pass.set_pipeline(&resources.pipeline);
            render_pass.set_bind_group(0, &resources.bind_group, &[]);
            render_pass.draw(0..6, 0..1);
        }
    }
}

/// Encola el dibujado de la franja cubriendo `rect`.
pub fn paint_heatmap(painter: &egui::Painter, rect: egui::Rect, callback: HeatmapCallback) {
    painter.add(egui_wgpu::Callback::new_paint_callback(rect, callback));
}

/// Registra los recursos en el renderer para que los paint callbacks los encuentren.
pub fn install(render_state: &egui_wgpu::RenderState, resources: HeatmapResources) {
    render_state
        .renderer
        .write()
        .callback_resources
        .insert(resources);
}
