//! Synthetic single-band frames for exercising pipelines.
//!
//! Values are in detector-like units: a sky background around 1000 with
//! stars peaking up to ~50000.

use crate::Pattern;
use anyhow::Result;
use sky_core::PixelBuffer;

const SKY: f32 = 1000.0;
const SKY_NOISE: f32 = 30.0;

/// Deterministic integer hash.
#[inline]
fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h ^= x;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= y;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Hash to `[0, 1]`.
#[inline]
fn unit(x: u32, y: u32, seed: u32) -> f32 {
    (hash(x, y, seed) & 0x7F_FFFF) as f32 / 0x7F_FFFF as f32
}

/// Roughly normal noise: sum of four uniforms, centered, unit variance.
#[inline]
fn gauss(x: u32, y: u32, seed: u32) -> f32 {
    let s: f32 = (0..4u32).map(|k| unit(x, y, seed.wrapping_add(k.wrapping_mul(0x9e37_79b9)))).sum();
    (s - 2.0) * 3.0f32.sqrt()
}

/// Builds a `width x height` mono frame.
pub fn generate(pattern: Pattern, width: usize, height: usize, seed: u32) -> Result<PixelBuffer> {
    let data = match pattern {
        Pattern::Gradient => gradient(width, height),
        Pattern::Noise => noise(width, height, seed),
        Pattern::Stars => stars(width, height, seed),
    };
    Ok(PixelBuffer::mono(width, height, data)?)
}

fn gradient(width: usize, height: usize) -> Vec<f32> {
    let span = (width + height).saturating_sub(2).max(1) as f32;
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x + y) as f32 / span * 10_000.0))
        .collect()
}

fn noise(width: usize, height: usize, seed: u32) -> Vec<f32> {
    (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| SKY + SKY_NOISE * gauss(x as u32, y as u32, seed))
        })
        .collect()
}

fn stars(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = noise(width, height, seed);
    let count = (width * height / 2000).max(5) as u32;
    for i in 0..count {
        let cx = unit(i, 1, seed) * width as f32;
        let cy = unit(i, 2, seed) * height as f32;
        // brightness falls off steeply: few bright stars, many faint ones
        let peak = 200.0 + 50_000.0 * unit(i, 3, seed).powi(4);
        let sigma = 1.0 + 1.5 * unit(i, 4, seed);
        let r = (sigma * 4.0).ceil() as isize;
        for dy in -r..=r {
            let y = cy as isize + dy;
            if y < 0 || y >= height as isize {
                continue;
            }
            for dx in -r..=r {
                let x = cx as isize + dx;
                if x < 0 || x >= width as isize {
                    continue;
                }
                let (fx, fy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                let v = peak * (-(fx * fx + fy * fy) / (2.0 * sigma * sigma)).exp();
                data[y as usize * width + x as usize] += v;
            }
        }
    }
    data
}
