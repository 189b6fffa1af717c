//! Geometric kernels built on a backward coordinate remap: every output pixel samples
//! the source at a mapped position with bilinear interpolation, and anything outside the
//! source reads as black.

use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::frame::Frame;

/// Shifts each channel horizontally by its own pixel offset.
pub fn ca_linear(frame: &Frame, shift_r: i32, shift_g: i32, shift_b: i32) -> Frame {
    let shifts = [shift_b, shift_g, shift_r];
    remap_channels(frame, |c, x, y| (x - shifts[c] as f32, y))
}

/// Scales each channel radially around the center by `1 + strength% * r`, where `r` is
/// the distance to the center normalized by the half diagonal.
pub fn ca_radial(frame: &Frame, strength_r: i32, strength_g: i32, strength_b: i32) -> Frame {
    let strengths = [strength_b, strength_g, strength_r].map(|s| s as f32 / 100.0);
    let (w, h) = frame.dims();
    let (cx, cy) = (w as f32 * 0.5, h as f32 * 0.5);
    let max_radius = (cx * cx + cy * cy).sqrt();

    remap_channels(frame, |c, x, y| {
        let (dx, dy) = (x - cx, y - cy);
        let radius = (dx * dx + dy * dy).sqrt() / max_radius;
        let factor = 1.0 + strengths[c] * radius;
        (cx + dx * factor, cy + dy * factor)
    })
}

/// CRT barrel curvature, `k = curvature / 1000`.
pub fn warp(frame: &Frame, curvature: i32) -> Frame {
    let k = curvature as f32 / 1000.0;
    let (w, h) = frame.dims();
    let xs = linspace(w);
    let ys = linspace(h);

    remap_channels(frame, |_, x, y| {
        let (nx, ny) = (xs[x as usize], ys[y as usize]);
        let wx = nx * (1.0 + k * ny * ny);
        let wy = ny * (1.0 + k * nx * nx);
        ((wx + 1.0) * 0.5 * w as f32, (wy + 1.0) * 0.5 * h as f32)
    })
}

/// `n` evenly spaced samples covering `[-1, 1]`.
fn linspace(n: usize) -> Vec<f32> {
    if n == 1 {
        return vec![-1.0];
    }
    let step = 2.0 / (n - 1) as f32;
    (0..n).map(|i| -1.0 + step * i as f32).collect()
}

/// `map(channel, x, y)` returns the source position sampled for output pixel `(x, y)`.
fn remap_channels<F>(frame: &Frame, map: F) -> Frame
where
    F: Fn(usize, f32, f32) -> (f32, f32),
{
    let src = frame.as_array();
    let mut out = Array3::<u8>::zeros(src.dim());

    for c in 0..3 {
        let plane = src.index_axis(Axis(2), c);
        let (h, w) = plane.dim();
        let mapped = Array2::from_shape_fn((h, w), |(y, x)| {
            let (sx, sy) = map(c, x as f32, y as f32);
            sample_bilinear(plane, sx, sy).round().clamp(0.0, 255.0) as u8
        });
        out.index_axis_mut(Axis(2), c).assign(&mapped);
    }

    Frame::wrap(out)
}

fn sample_bilinear(plane: ArrayView2<u8>, fx: f32, fy: f32) -> f32 {
    if !fx.is_finite() || !fy.is_finite() {
        return 0.0;
    }

    let (h, w) = plane.dim();
    let x0 = fx.floor();
    let y0 = fy.floor();
    let (dx, dy) = (fx - x0, fy - y0);
    let (x0, y0) = (x0 as isize, y0 as isize);

    let tap = |x: isize, y: isize| -> f32 {
        if x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h {
            f32::from(plane[[y as usize, x as usize]])
        } else {
            0.0
        }
    };

    tap(x0, y0) * (1.0 - dx) * (1.0 - dy)
        + tap(x0 + 1, y0) * dx * (1.0 - dy)
        + tap(x0, y0 + 1) * (1.0 - dx) * dy
        + tap(x0 + 1, y0 + 1) * dx * dy
}
