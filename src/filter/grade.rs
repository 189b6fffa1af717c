//! Per-pixel color grading. Every intensity is a percentage in `[-100, 100]`
//! where 0 leaves the frame untouched.

use ndarray::Axis;

use crate::frame::Frame;

const PIVOT: f32 = 128.0;
const WARMTH_SHIFT: f32 = 40.0;
const VIGNETTE_STRENGTH: f32 = 0.6;

fn clip(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

fn percent(intensity: i32) -> f32 {
    intensity as f32 / 100.0
}

pub fn contrast(frame: &Frame, intensity: i32) -> Frame {
    let factor = 1.0 + percent(intensity);
    Frame::wrap(
        frame
            .as_array()
            .mapv(|v| clip((f32::from(v) - PIVOT) * factor + PIVOT)),
    )
}

/// Pulls every channel toward (or pushes it away from) the pixel's luma.
pub fn saturation(frame: &Frame, intensity: i32) -> Frame {
    let factor = 1.0 + percent(intensity);
    let mut out = frame.as_array().clone();

    for mut px in out.lanes_mut(Axis(2)) {
        let luma = 0.114 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.299 * f32::from(px[2]);
        // `v * f + luma * (1 - f)` keeps f == 1 exact.
        px.mapv_inplace(|v| clip(f32::from(v) * factor + luma * (1.0 - factor)));
    }

    Frame::wrap(out)
}

/// Shifts red up and blue down (or the reverse for negative intensity).
pub fn warmth(frame: &Frame, intensity: i32) -> Frame {
    let shift = WARMTH_SHIFT * percent(intensity.clamp(-100, 100));
    let mut out = frame.as_array().clone();

    out.index_axis_mut(Axis(2), 2)
        .mapv_inplace(|r| clip(f32::from(r) + shift));
    out.index_axis_mut(Axis(2), 0)
        .mapv_inplace(|b| clip(f32::from(b) - shift));

    Frame::wrap(out)
}

/// Radial darkening (positive) or brightening (negative) with a quadratic falloff.
pub fn vignette(frame: &Frame, intensity: i32) -> Frame {
    let k = VIGNETTE_STRENGTH * percent(intensity);
    let (w, h) = frame.dims();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let max_dist = (cx * cx + cy * cy).sqrt();
    let mut out = frame.as_array().clone();

    for (y, mut row) in out.outer_iter_mut().enumerate() {
        let dy = y as f32 - cy;
        for (x, mut px) in row.outer_iter_mut().enumerate() {
            let dx = x as f32 - cx;
            let d = (dx * dx + dy * dy).sqrt() / max_dist;
            let factor = 1.0 - k * d * d;
            px.mapv_inplace(|v| clip(f32::from(v) * factor));
        }
    }

    Frame::wrap(out)
}

/// Power curve with exponent `gamma / 100`, clamped to `[0, 1]` before rescaling.
pub fn gamma(frame: &Frame, gamma: i32) -> Frame {
    let exponent = gamma as f32 / 100.0;
    Frame::wrap(frame.as_array().mapv(|v| {
        let out = (f32::from(v) / 255.0).powf(exponent).clamp(0.0, 1.0);
        (out * 255.0) as u8
    }))
}

/// Same curve as [`gamma`] without the intermediate clamp.
pub fn gamma_linear(frame: &Frame, gamma: i32) -> Frame {
    let exponent = gamma as f32 / 100.0;
    Frame::wrap(
        frame
            .as_array()
            .mapv(|v| ((f32::from(v) / 255.0).powf(exponent) * 255.0) as u8),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn noisy_frame() -> Frame {
        Frame::from_array(Array3::from_shape_fn((7, 9, 3), |(y, x, c)| {
            ((x * 37 + y * 101 + c * 53) % 256) as u8
        }))
        .unwrap()
    }

    #[test]
    fn neutral_intensity_is_identity() {
        let src = noisy_frame();
        assert_eq!(contrast(&src, 0), src);
        assert_eq!(saturation(&src, 0), src);
        assert_eq!(warmth(&src, 0), src);
        assert_eq!(vignette(&src, 0), src);
    }

    #[test]
    fn full_desaturation_collapses_to_luma() {
        let frame = Frame::filled(3, 2, [10, 200, 50]).unwrap();
        let out = saturation(&frame, -100);
        assert!(out.as_array().iter().all(|&v| v == 133));
    }

    #[test]
    fn full_warmth_shifts_red_and_blue_by_forty() {
        let src = noisy_frame();
        let out = warmth(&src, 100);
        for y in 0..src.height() {
            for x in 0..src.width() {
                let [b, g, r] = src.pixel(x, y);
                let [ob, og, or] = out.pixel(x, y);
                assert_eq!(or, r.saturating_add(40));
                assert_eq!(ob, b.saturating_sub(40));
                assert_eq!(og, g);
            }
        }
    }

    #[test]
    fn contrast_pivots_on_mid_gray() {
        let frame = Frame::filled(1, 1, [128, 100, 200]).unwrap();
        assert_eq!(contrast(&frame, 100).pixel(0, 0), [128, 72, 255]);
        assert_eq!(contrast(&frame, -100).pixel(0, 0), [128; 3]);
    }

    #[test]
    fn vignette_darkens_corners_not_center() {
        let frame = Frame::filled(9, 9, [200; 3]).unwrap();
        let out = vignette(&frame, 100);
        assert!(out.pixel(0, 0)[0] < 200);
        assert!(out.pixel(4, 4)[0] >= 197);

        let bright = vignette(&frame, -100);
        assert!(bright.pixel(0, 0)[0] > 200);
    }

    #[test]
    fn unit_gamma_is_identity() {
        let src = noisy_frame();
        assert_eq!(gamma(&src, 100), src);
        assert_eq!(gamma_linear(&src, 100), src);
    }

    #[test]
    fn gamma_brightens_below_one_and_darkens_above() {
        let frame = Frame::filled(1, 1, [64; 3]).unwrap();
        assert!(gamma(&frame, 50).pixel(0, 0)[0] > 64);
        assert!(gamma(&frame, 200).pixel(0, 0)[0] < 64);
        assert_eq!(gamma(&frame, 0).pixel(0, 0), [255; 3]);
    }
}
