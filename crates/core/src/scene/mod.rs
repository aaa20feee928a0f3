use std::str::FromStr;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::{
    raster::{ComputePass, RasterBuffer},
    CaptureError,
};

/// Built-in compute passes selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    Nebula,
    Gradient,
}

impl SceneKind {
    pub fn build(self) -> Box<dyn ComputePass> {
        match self {
            Self::Nebula => Box::new(Nebula),
            Self::Gradient => Box::new(Gradient),
        }
    }
}

impl FromStr for SceneKind {
    type Err = CaptureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "nebula" => Ok(Self::Nebula),
            "gradient" => Ok(Self::Gradient),
            other => Err(CaptureError::Config(format!("unknown scene `{other}`"))),
        }
    }
}

/// Cheap time-dependent gradient, useful for smoke runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gradient;

impl ComputePass for Gradient {
    fn shade(&self, time: f64, target: &mut RasterBuffer) {
        let width = target.width().max(1) as f32;
        let height = target.height().max(1) as f32;
        let blue = to_channel((time.sin() * 0.5 + 0.5) as f32);
        target.fill_with(|x, y| {
            [
                to_channel(x as f32 / width),
                to_channel(y as f32 / height),
                blue,
                255,
            ]
        });
    }
}

const MAX_ITER: usize = 18;
const FREQS: [f32; 4] = [0.45, 0.4, 0.15, 0.9];

/// Two-layer kaliset nebula with a star field, evaluated per pixel on the CPU.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nebula;

impl ComputePass for Nebula {
    fn shade(&self, time: f64, target: &mut RasterBuffer) {
        let resolution = Vec2::new(target.width() as f32, target.height() as f32);
        let height = target.height();
        let time = time as f32;
        target.fill_with(|x, y| {
            // Fragment coordinates have their origin at the bottom-left pixel centre.
            let frag = Vec2::new(x as f32 + 0.5, (height - y) as f32 - 0.5);
            let colour = nebula_pixel(frag, resolution, time);
            [
                to_channel(colour.x),
                to_channel(colour.y),
                to_channel(colour.z),
                255,
            ]
        });
    }
}

fn nebula_pixel(frag: Vec2, resolution: Vec2, time: f32) -> Vec3 {
    let time = time / (resolution.x / 1000.0);
    let drift = Vec3::new((time / 32.0).sin(), (time / 24.0).sin(), (time / 64.0).sin());

    let uv = 2.0 * frag / resolution - 1.0;
    let uvs = uv * resolution / resolution.x.max(resolution.y);

    let mut p = (uvs / 2.5).extend(0.0) + Vec3::new(0.8, -1.3, 0.0);
    p += 0.45 * drift;
    p.x += mix(-0.02, 0.02, 1.0 / resolution.x);
    p.y += mix(-0.02, 0.02, 1.0 / resolution.y);

    let t = field(p, FREQS[2], 13);
    let v = (1.0 - ((uv.x.abs() - 1.0) * 6.0).exp()) * (1.0 - ((uv.y.abs() - 1.0) * 6.0).exp());

    let zoom = 4.0 + (time * 0.11).sin() * 0.2 + 0.2 + (time * 0.15).sin() * 0.3 + 0.4;
    let mut p2 = (uvs / zoom).extend(4.0) + Vec3::new(2.0, -1.3, -1.0);
    p2 += 0.16 * drift;
    p2.x += mix(-0.01, 0.01, 1.0 / resolution.x);
    p2.y += mix(-0.01, 0.01, 1.0 / resolution.y);

    let t2 = field(p2, FREQS[3], 18);
    let c2 = mix(0.5, 0.2, v)
        * Vec4::new(5.5 * t2 * t2 * t2, 2.1 * t2 * t2, 2.2 * t2 * FREQS[0], t2);

    let stars =
        star_layer(p.truncate(), resolution, time) + star_layer(p2.truncate(), resolution, time);

    let colour = mix(FREQS[3] - 0.3, 1.0, v)
        * Vec4::new(
            1.5 * FREQS[2] * t * t * t,
            1.2 * FREQS[1] * t * t,
            FREQS[3] * t,
            1.0,
        )
        + c2
        + stars;
    colour.truncate()
}

fn field(mut p: Vec3, s: f32, iterations: usize) -> f32 {
    let mut accum = s / 4.0;
    let mut prev = 0.0;
    let mut tw = 0.0;
    for i in 0..iterations.min(MAX_ITER) {
        let mag = p.dot(p);
        p = p.abs() / mag + Vec3::new(-0.5, -0.4, -1.487);
        let w = (-(i as f32) / 5.0).exp();
        accum += w * (-9.025 * (mag - prev).abs().powf(2.2)).exp();
        tw += w;
        prev = mag;
    }
    (5.2 * accum / tw - 0.65).max(0.0)
}

fn star_layer(p: Vec2, resolution: Vec2, time: f32) -> Vec4 {
    let seed = (1.9 * p * resolution.x.max(600.0) / 1.5).floor();
    let rnd = nrand3(seed);
    let brightness = rnd.y.powf(17.0);
    let mul = 10.0 * rnd.x;
    let twinkle = (time * mul + mul).sin() * 0.25 + 1.0;
    Vec4::new(
        brightness * twinkle,
        brightness * twinkle,
        brightness * twinkle,
        brightness,
    )
}

fn nrand3(co: Vec2) -> Vec3 {
    let a = fract(Vec3::splat((co.x * 8.3e-3 + co.y).cos()) * Vec3::new(1.3e5, 4.7e5, 2.9e5));
    let b = fract(Vec3::splat((co.x * 0.3e-3 + co.y).sin()) * Vec3::new(8.1e5, 1.0e5, 0.1e5));
    a.lerp(b, 0.5)
}

fn fract(v: Vec3) -> Vec3 {
    v - v.floor()
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn to_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
