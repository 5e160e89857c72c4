/// Bloque de uniforms compartido con `heatmap.wgsl`.
/// El layout debe coincidir con la struct de WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HeatmapUniforms {
    pub speed_count: f32,
    pub ramp_count: f32,
    pub smooth_ramp: f32,
    pub srgb_target: f32,
}

impl HeatmapUniforms {
    pub fn new(speed_count: u32, ramp_count: u32, smooth_ramp: bool, srgb_target: bool) -> Self {
        Self {
            speed_count: speed_count.max(1) as f32,
            ramp_count: ramp_count.max(2) as f32,
            smooth_ramp: if smooth_ramp { 1.0 } else { 0.0 },
            srgb_target: if srgb_target { 1.0 } else { 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<HeatmapUniforms>(), 16);
    }

    #[test]
    fn counts_never_underflow_the_shader_indexing() {
        let u = HeatmapUniforms::new(0, 1, true, false);
        assert_eq!(u.speed_count, 1.0);
        assert_eq!(u.ramp_count, 2.0);
        assert_eq!(u.smooth_ramp, 1.0);
        assert_eq!(u.srgb_target, 0.0);
    }
}
