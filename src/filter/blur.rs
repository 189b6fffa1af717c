use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::frame::Frame;

/// Gaussian blur with a `2 * blur_intensity + 1` square kernel and the sigma derived
/// from the kernel size.
pub fn blur(frame: &Frame, blur_intensity: i32) -> Frame {
    let radius = blur_intensity.max(0) as usize;
    if radius == 0 {
        return frame.clone();
    }

    let weights = gaussian_weights(2 * radius + 1, 0.0);
    let src = frame.as_array().mapv(f32::from);
    let mut out = Array3::<u8>::zeros(src.dim());

    for c in 0..3 {
        let blurred = gaussian_plane(src.index_axis(Axis(2), c), &weights, &weights);
        out.index_axis_mut(Axis(2), c)
            .assign(&blurred.mapv(|v| v.round().clamp(0.0, 255.0) as u8));
    }

    Frame::wrap(out)
}

/// Fixed taps used for a derived sigma on small kernels, matching OpenCV.
const SMALL_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[
        0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
    ],
];

/// Normalized 1-D Gaussian taps. A non-positive `sigma` is derived from `ksize`.
pub(crate) fn gaussian_weights(ksize: usize, sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 && ksize % 2 == 1 && ksize <= 7 {
        return SMALL_KERNELS[ksize / 2].to_vec();
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let half = (ksize / 2) as f32;
    let denom = 2.0 * sigma * sigma;

    let mut weights: Vec<f32> = (0..ksize)
        .map(|i| {
            let x = i as f32 - half;
            (-(x * x) / denom).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= sum);
    weights
}

/// Kernel size used when only a sigma is given for float data.
pub(crate) fn ksize_for_sigma(sigma: f32) -> usize {
    ((sigma * 8.0 + 1.0).round() as usize) | 1
}

/// Separable convolution with mirrored borders (`dcb|abcd|cba`).
///
/// Both passes accumulate one tap at a time over contiguous rows, so every output sums
/// its taps in kernel order.
pub(crate) fn gaussian_plane(plane: ArrayView2<f32>, kx: &[f32], ky: &[f32]) -> Array2<f32> {
    let (h, w) = plane.dim();
    let rx = (kx.len() / 2) as isize;
    let ry = (ky.len() / 2) as isize;

    let mut horizontal = Array2::<f32>::zeros((h, w));
    let mut padded = vec![0.0f32; w + kx.len() - 1];
    for (src, mut dst) in plane.rows().into_iter().zip(horizontal.rows_mut()) {
        for (j, p) in padded.iter_mut().enumerate() {
            *p = src[reflect_101(j as isize - rx, w)];
        }
        for (i, k) in kx.iter().enumerate() {
            for (d, v) in dst.iter_mut().zip(&padded[i..i + w]) {
                *d += k * v;
            }
        }
    }

    let mut out = Array2::<f32>::zeros((h, w));
    for (y, mut dst) in out.rows_mut().into_iter().enumerate() {
        for (i, k) in ky.iter().enumerate() {
            let src = horizontal.row(reflect_101(y as isize + i as isize - ry, h));
            dst.scaled_add(*k, &src);
        }
    }

    out
}

fn reflect_101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }

    let period = 2 * (len as isize - 1);
    let i = i.rem_euclid(period);
    if i >= len as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_intensity_is_identity() {
        let frame = Frame::filled(3, 2, [1, 2, 3]).unwrap();
        assert_eq!(blur(&frame, 0), frame);
    }

    #[test]
    fn flat_frame_stays_flat() {
        let frame = Frame::filled(6, 5, [10, 120, 240]).unwrap();
        assert_eq!(blur(&frame, 3), frame);
    }

    #[test]
    fn blur_spreads_a_single_bright_pixel() {
        let mut data = Frame::new(7, 7).unwrap().into_array();
        data[[3, 3, 1]] = 255;
        let out = blur(&Frame::from_array(data).unwrap(), 1);

        assert!(out.pixel(3, 3)[1] < 255);
        assert!(out.pixel(2, 3)[1] > 0);
        assert!(out.pixel(3, 4)[1] > 0);
        assert_eq!(out.pixel(3, 3)[0], 0);
    }

    #[test]
    fn weights_are_normalized_and_symmetric() {
        let w = gaussian_weights(5, 0.0);
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((w[0] - w[4]).abs() < 1e-7);
        assert!(w[2] > w[1]);
    }

    #[test]
    fn small_derived_kernels_use_fixed_taps() {
        assert_eq!(gaussian_weights(3, 0.0), vec![0.25, 0.5, 0.25]);
        assert_eq!(gaussian_weights(7, 0.0)[3], 0.28125);
        assert_eq!(gaussian_weights(9, 0.0).len(), 9);
        assert_ne!(gaussian_weights(3, 2.0), vec![0.25, 0.5, 0.25]);
    }

    #[test]
    fn radius_one_blur_matches_the_binomial_kernel() {
        let mut data = Frame::new(5, 5).unwrap().into_array();
        data[[2, 2, 2]] = 160;
        let out = blur(&Frame::from_array(data).unwrap(), 1);

        assert_eq!(out.pixel(2, 2)[2], 40);
        assert_eq!(out.pixel(1, 2)[2], 20);
        assert_eq!(out.pixel(1, 1)[2], 10);
        assert_eq!(out.pixel(0, 0)[2], 0);
    }

    /// One tap at a time with per-tap reflection, the direct form of the convolution.
    fn direct_plane(plane: ArrayView2<f32>, kx: &[f32], ky: &[f32]) -> Array2<f32> {
        let (h, w) = plane.dim();
        let rx = (kx.len() / 2) as isize;
        let ry = (ky.len() / 2) as isize;
        let horizontal = Array2::from_shape_fn((h, w), |(y, x)| {
            kx.iter()
                .enumerate()
                .map(|(i, k)| k * plane[[y, reflect_101(x as isize + i as isize - rx, w)]])
                .sum::<f32>()
        });
        Array2::from_shape_fn((h, w), |(y, x)| {
            ky.iter()
                .enumerate()
                .map(|(i, k)| k * horizontal[[reflect_101(y as isize + i as isize - ry, h), x]])
                .sum::<f32>()
        })
    }

    #[test]
    fn plane_matches_direct_convolution() {
        let plane = Array2::from_shape_fn((9, 13), |(y, x)| {
            ((x * 37 + y * 91) % 17) as f32 / 17.0
        });
        let sigma_taps = |sigma: f32| gaussian_weights(ksize_for_sigma(sigma), sigma);
        let cases = [
            (gaussian_weights(5, 0.0), gaussian_weights(3, 0.0)),
            (sigma_taps(4.0), gaussian_weights(11, 0.0)),
            (sigma_taps(91.0), sigma_taps(61.0)),
        ];

        for (kx, ky) in cases {
            assert_eq!(
                gaussian_plane(plane.view(), &kx, &ky),
                direct_plane(plane.view(), &kx, &ky)
            );
        }
    }

    #[test]
    fn reflection_skips_the_edge_pixel() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(13, 5), 3);
        assert_eq!(reflect_101(-7, 1), 0);
    }

    #[test]
    fn sigma_kernel_size_is_odd() {
        assert_eq!(ksize_for_sigma(1.0), 9);
        assert_eq!(ksize_for_sigma(2.0) % 2, 1);
    }
}
