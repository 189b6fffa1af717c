use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::blur::{gaussian_plane, gaussian_weights, ksize_for_sigma};
use crate::frame::Frame;

const MIN_GAMMA: f32 = 0.2;
const MAX_GAMMA: f32 = 3.0;

/// Film grain as a smoothed random gamma field.
///
/// `x_noise`/`y_noise` pick the grain size along each axis (higher is finer) and
/// `intensity` how far the local gamma strays from 1. The field is seeded from the frame
/// and the parameters, so the same input always yields the same grain.
pub fn noise(frame: &Frame, x_noise: i32, y_noise: i32, intensity: i32) -> Frame {
    if (x_noise == 0 && y_noise == 0) || intensity == 0 {
        return frame.clone();
    }

    let (w, h) = frame.dims();
    let sigma_x = (101 - x_noise).max(1) as f32;
    let sigma_y = (101 - y_noise).max(1) as f32;
    let strength = intensity as f32 / 100.0;

    let mut rng = StdRng::seed_from_u64(grain_seed(frame, x_noise, y_noise, intensity));
    let field = Array2::from_shape_simple_fn((h, w), || rng.random::<f32>());
    let smooth = gaussian_plane(
        field.view(),
        &gaussian_weights(ksize_for_sigma(sigma_x), sigma_x),
        &gaussian_weights(ksize_for_sigma(sigma_y), sigma_y),
    );
    let gamma_map =
        smooth.mapv(|n| (1.0 + (n - 0.5) * 2.0 * strength * 2.0).clamp(MIN_GAMMA, MAX_GAMMA));

    let mut out = frame.as_array().clone();
    for ((y, x, _), v) in out.indexed_iter_mut() {
        let norm = f32::from(*v) / 255.0;
        *v = (norm.powf(gamma_map[[y, x]]).clamp(0.0, 1.0) * 255.0) as u8;
    }

    Frame::wrap(out)
}

fn grain_seed(frame: &Frame, x_noise: i32, y_noise: i32, intensity: i32) -> u64 {
    let mut hasher = DefaultHasher::new();
    frame.as_array().hash(&mut hasher);
    (x_noise, y_noise, intensity).hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn gradient() -> Frame {
        Frame::from_array(Array3::from_shape_fn((12, 16, 3), |(y, x, c)| {
            (x * 12 + y * 5 + c * 30) as u8
        }))
        .unwrap()
    }

    #[test]
    fn zero_noise_or_zero_intensity_is_identity() {
        let src = gradient();
        assert_eq!(noise(&src, 0, 0, 5), src);
        assert_eq!(noise(&src, 5, 5, 0), src);
    }

    #[test]
    fn same_input_gives_same_grain() {
        let src = gradient();
        assert_eq!(noise(&src, 90, 90, 80), noise(&src, 90, 90, 80));
    }

    #[test]
    fn extremes_are_fixed_points() {
        let frame = Frame::filled(8, 8, [0, 255, 0]).unwrap();
        assert_eq!(noise(&frame, 100, 100, 100), frame);
    }

    #[test]
    fn strong_fine_grain_changes_midtones() {
        let frame = Frame::filled(16, 16, [128; 3]).unwrap();
        let out = noise(&frame, 100, 100, 100);
        assert_eq!(out.dims(), frame.dims());
        assert!(out.as_array().iter().any(|&v| v != 128));
    }
}
