//! Color ramp used to turn a normalized speed into a color.

/// Speed colors from 0 to 2000 units/s in steps of 50.
const HEAT_COLORS: [[u8; 3]; 41] = [
    [0x00, 0xEE, 0xFF], // 0    cyan
    [0x00, 0xFF, 0xF3], // 50   cyan
    [0x00, 0xFF, 0x8A], // 100  lime
    [0x00, 0xF7, 0x00], // 150  lime
    [0x78, 0xE0, 0x00], // 200  lime
    [0xE8, 0xBD, 0x00], // 250  gold
    [0xFF, 0x8C, 0x00], // 300  orange
    [0xFF, 0x40, 0x00], // 350  orange
    [0xFF, 0x00, 0x00], // 400  red
    [0xFF, 0x00, 0x1E], // 450  red
    [0xFF, 0x00, 0xAB], // 500  magenta
    [0xFF, 0x00, 0xC4], // 550  magenta
    [0x96, 0x00, 0xC5], // 600  violet
    [0x77, 0x00, 0xF9], // 650  purple
    [0x52, 0x00, 0xFF], // 700  blue
    [0x00, 0x00, 0xFF], // 750  blue
    [0x00, 0x03, 0xFE], // 800  blue
    [0x00, 0x5A, 0x9B], // 850  blue
    [0x00, 0x57, 0x58], // 900  teal
    [0x00, 0x58, 0x44], // 950  teal
    [0x04, 0x57, 0x2D], // 1000 green
    [0x32, 0x52, 0x10], // 1050 green
    [0x4A, 0x4C, 0x00], // 1100 olive
    [0x5C, 0x44, 0x00], // 1150 olive
    [0x69, 0x3C, 0x00], // 1200 brown
    [0x71, 0x34, 0x0A], // 1250 brown
    [0x74, 0x2E, 0x27], // 1300 maroon
    [0x73, 0x2D, 0x3E], // 1350 maroon
    [0x6D, 0x2E, 0x52], // 1400 purple
    [0x62, 0x32, 0x64], // 1450 purple
    [0x54, 0x37, 0x72], // 1500 indigo
    [0x42, 0x3E, 0x7B], // 1550 indigo
    [0x2A, 0x45, 0x7D], // 1600 navy
    [0x00, 0x4C, 0x78], // 1650 navy
    [0x00, 0x52, 0x6E], // 1700 teal
    [0x00, 0x56, 0x5D], // 1750 teal
    [0x00, 0x58, 0x4A], // 1800 green
    [0x00, 0x57, 0x33], // 1850 green
    [0x29, 0x54, 0x19], // 1900 green
    [0x44, 0x4E, 0x00], // 1950 olive
    [0x57, 0x46, 0x00], // 2000 olive
];

/// The strip starts from black so idle sections read as empty.
const STRIP_HEAD: [[u8; 3]; 2] = [[0x00, 0x00, 0x00], [0x00, 0x80, 0x7A]];

const CACHE_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampMode {
    Linear,
    /// smoothstep between neighbouring marks
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientMark {
    pub position: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct Gradient {
    marks: Vec<GradientMark>,
    mode: RampMode,
    cache: Vec<[f32; 4]>,
}

impl Gradient {
    pub fn new(mode: RampMode) -> Self {
        Self {
            marks: Vec::new(),
            mode,
            cache: Vec::new(),
        }
    }

    /// Palette used to color position-graph lines by stroke speed.
    pub fn heat_lines() -> Self {
        Self::evenly_spaced(&HEAT_COLORS, RampMode::Linear)
    }

    /// Palette used for the heatmap strip and bitmap export.
    pub fn heat_strip() -> Self {
        let colors: Vec<[u8; 3]> = STRIP_HEAD
            .iter()
            .chain(HEAT_COLORS.iter().skip(STRIP_HEAD.len()))
            .copied()
            .collect();
        Self::evenly_spaced(&colors, RampMode::Smooth)
    }

    fn evenly_spaced(colors: &[[u8; 3]], mode: RampMode) -> Self {
        let n = colors.len();
        let mut g = Self::new(mode);
        let step = if n > 1 { 1.0 / (n - 1) as f32 } else { 0.0 };
        for (i, &[r, gr, b]) in colors.iter().enumerate() {
            g.add_mark(i as f32 * step, rgb8(r, gr, b));
        }
        g.refresh_cache();
        g
    }

    pub fn mode(&self) -> RampMode {
        self.mode
    }

    pub fn marks(&self) -> &[GradientMark] {
        &self.marks
    }

    /// Adds a mark; call [`Gradient::refresh_cache`] after a batch of changes.
    pub fn add_mark(&mut self, position: f32, color: [f32; 4]) {
        let position = position.clamp(0.0, 1.0);
        let idx = self.marks.partition_point(|m| m.position <= position);
        self.marks.insert(idx, GradientMark { position, color });
    }

    pub fn refresh_cache(&mut self) {
        self.cache = (0..CACHE_SIZE)
            .map(|i| self.compute_color_uncached(i as f32 / (CACHE_SIZE - 1) as f32))
            .collect();
    }

    /// Color at `t` (clamped to `[0, 1]`), read from the lookup table when it is fresh.
    pub fn compute_color(&self, t: f32) -> [f32; 4] {
        if self.cache.len() == CACHE_SIZE {
            let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
            let idx = (t * (CACHE_SIZE - 1) as f32).round() as usize;
            return self.cache[idx];
        }
        self.compute_color_uncached(t)
    }

    /// Exact color at `t`, bypassing the lookup table.
    pub fn compute_color_uncached(&self, t: f32) -> [f32; 4] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let (first, last) = match (self.marks.first(), self.marks.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return [0.0, 0.0, 0.0, 1.0],
        };
        if t <= first.position {
            return first.color;
        }
        if t >= last.position {
            return last.color;
        }

        let upper = self.marks.partition_point(|m| m.position <= t);
        let a = &self.marks[upper - 1];
        let b = &self.marks[upper];
        let span = b.position - a.position;
        let mut f = if span > 0.0 { (t - a.position) / span } else { 0.0 };
        if self.mode == RampMode::Smooth {
            f = f * f * (3.0 - 2.0 * f);
        }
        lerp(a.color, b.color, f)
    }

    /// The marks as RGBA8 texels, one per mark, for the ramp texture.
    pub fn to_rgba8_table(&self) -> Vec<[u8; 4]> {
        self.marks.iter().map(|m| to_rgba8(m.color)).collect()
    }

    pub fn compute_color32(&self, t: f32) -> egui::Color32 {
        let [r, g, b, a] = to_rgba8(self.compute_color(t));
        egui::Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

fn rgb8(r: u8, g: u8, b: u8) -> [f32; 4] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

pub(crate) fn to_rgba8(c: [f32; 4]) -> [u8; 4] {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn lerp(a: [f32; 4], b: [f32; 4], f: f32) -> [f32; 4] {
    [
        a[0] + (b[0] - a[0]) * f,
        a[1] + (b[1] - a[1]) * f,
        a[2] + (b[2] - a[2]) * f,
        a[3] + (b[3] - a[3]) * f,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_have_all_marks() {
        assert_eq!(Gradient::heat_lines().marks().len(), 41);
        assert_eq!(Gradient::heat_strip().marks().len(), 41);
    }

    #[test]
    fn endpoints_match_first_and_last_mark() {
        let g = Gradient::heat_strip();
        assert_eq!(to_rgba8(g.compute_color(0.0)), [0, 0, 0, 255]);
        assert_eq!(to_rgba8(g.compute_color(1.0)), [0x57, 0x46, 0x00, 255]);
        // out of range input is clamped
        assert_eq!(g.compute_color(-4.0), g.compute_color(0.0));
        assert_eq!(g.compute_color(7.0), g.compute_color(1.0));

        let lines = Gradient::heat_lines();
        assert_eq!(to_rgba8(lines.compute_color(0.0)), [0x00, 0xEE, 0xFF, 255]);
    }

    #[test]
    fn linear_midpoint() {
        let mut g = Gradient::new(RampMode::Linear);
        g.add_mark(1.0, [1.0, 1.0, 1.0, 1.0]);
        g.add_mark(0.0, [0.0, 0.0, 0.0, 1.0]);
        let c = g.compute_color_uncached(0.25);
        assert!((c[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn smooth_eases_between_marks() {
        let mut g = Gradient::new(RampMode::Smooth);
        g.add_mark(0.0, [0.0, 0.0, 0.0, 1.0]);
        g.add_mark(1.0, [1.0, 1.0, 1.0, 1.0]);
        let c = g.compute_color_uncached(0.25);
        // smoothstep(0.25) = 0.15625
        assert!((c[0] - 0.15625).abs() < 1e-6);
        assert!((g.compute_color_uncached(0.5)[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_gradient_is_black() {
        let g = Gradient::new(RampMode::Linear);
        assert_eq!(g.compute_color(0.5), [0.0, 0.0, 0.0, 1.0]);
        assert!(g.to_rgba8_table().is_empty());
    }
}
