use std::f32::consts::PI;

use crate::scene::domain::scene::Scene;
use crate::shared::frame::Frame;

/// Animated colour plasma. Mirrors `shaders/plasma.wgsl` so CPU and GPU
/// framebuffers produce the same picture.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlasmaScene;

impl PlasmaScene {
    pub fn new() -> Self {
        Self
    }
}

impl Scene for PlasmaScene {
    fn render(&self, time: f64, target: &mut Frame) {
        let t = time as f32;
        let width = target.width();
        let height = target.height();
        let row_bytes = width as usize * 4;

        for (y, row) in target.data_mut().chunks_exact_mut(row_bytes).enumerate() {
            let v = (y as f32 + 0.5) / height as f32;
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let u = (x as f32 + 0.5) / width as f32;
                let [r, g, b] = plasma_color(u, v, t);
                pixel.copy_from_slice(&[to_byte(r), to_byte(g), to_byte(b), 255]);
            }
        }
    }
}

/// Colour at texture coordinate (`u`, `v`), top-left origin, in `0.0..=1.0`.
pub fn plasma_color(u: f32, v: f32, t: f32) -> [f32; 3] {
    let value = (u * 10.0 + t).sin()
        + (v * 10.0 + t * 1.3).sin()
        + ((u + v) * 10.0 + t * 0.7).sin();
    [
        0.5 + 0.5 * (PI * value).sin(),
        0.5 + 0.5 * (PI * value + 2.0 * PI / 3.0).sin(),
        0.5 + 0.5 * (PI * value + 4.0 * PI / 3.0).sin(),
    ]
}

fn to_byte(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}
