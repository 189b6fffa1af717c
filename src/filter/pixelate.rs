use ndarray::{Array3, ArrayView3};

use crate::frame::Frame;

/// Pixelizes by area-averaging down to `scale_percent` of the size and scaling back up
/// with nearest-neighbor sampling. 100% (or more) returns the frame untouched.
pub fn downscale_resolution(frame: &Frame, scale_percent: i32) -> Frame {
    if scale_percent >= 100 {
        return frame.clone();
    }

    let (w, h) = frame.dims();
    let pct = scale_percent.max(1) as usize;
    let small_w = (w * pct / 100).max(1);
    let small_h = (h * pct / 100).max(1);

    let small = resize_area(frame.as_array().view(), small_w, small_h);
    Frame::wrap(resize_nearest(small.view(), w, h))
}

/// Source pixels (and their coverage weights) that fall under each destination pixel.
fn area_taps(src: usize, dst: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src as f64 / dst as f64;

    (0..dst)
        .map(|d| {
            let start = d as f64 * scale;
            let end = (start + scale).min(src as f64);
            let mut taps = Vec::new();
            let mut s = start.floor() as usize;
            while (s as f64) < end && s < src {
                let covered = end.min(s as f64 + 1.0) - start.max(s as f64);
                if covered > 1e-9 {
                    taps.push((s, (covered / scale) as f32));
                }
                s += 1;
            }
            taps
        })
        .collect()
}

fn resize_area(src: ArrayView3<u8>, dst_w: usize, dst_h: usize) -> Array3<u8> {
    let (h, w, channels) = src.dim();
    let x_taps = area_taps(w, dst_w);
    let y_taps = area_taps(h, dst_h);

    Array3::from_shape_fn((dst_h, dst_w, channels), |(y, x, c)| {
        let mut acc = 0.0f32;
        for &(sy, wy) in &y_taps[y] {
            for &(sx, wx) in &x_taps[x] {
                acc += f32::from(src[[sy, sx, c]]) * wy * wx;
            }
        }
        acc.round().clamp(0.0, 255.0) as u8
    })
}

fn resize_nearest(src: ArrayView3<u8>, dst_w: usize, dst_h: usize) -> Array3<u8> {
    let (h, w, channels) = src.dim();
    Array3::from_shape_fn((dst_h, dst_w, channels), |(y, x, c)| {
        let sy = (y * h / dst_h).min(h - 1);
        let sx = (x * w / dst_w).min(w - 1);
        src[[sy, sx, c]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Frame {
        Frame::from_array(Array3::from_shape_fn((8, 8, 3), |(y, x, _)| {
            if (x + y) % 2 == 0 {
                200
            } else {
                0
            }
        }))
        .unwrap()
    }

    #[test]
    fn full_scale_is_bit_identical() {
        let src = checker();
        assert_eq!(downscale_resolution(&src, 100), src);
    }

    #[test]
    fn half_scale_averages_two_by_two_blocks() {
        let out = downscale_resolution(&checker(), 50);
        assert!(out.as_array().iter().all(|&v| v == 100));
    }

    #[test]
    fn blocks_are_replicated_on_the_way_up() {
        let frame = Frame::from_array(Array3::from_shape_fn((4, 4, 3), |(_, x, _)| {
            if x < 2 {
                40
            } else {
                160
            }
        }))
        .unwrap();
        let out = downscale_resolution(&frame, 50);
        assert_eq!(out.pixel(0, 0), [40; 3]);
        assert_eq!(out.pixel(1, 3), [40; 3]);
        assert_eq!(out.pixel(2, 0), [160; 3]);
        assert_eq!(out.pixel(3, 3), [160; 3]);
    }

    #[test]
    fn tiny_scale_collapses_to_one_pixel() {
        let out = downscale_resolution(&checker(), 1);
        assert_eq!(out.dims(), (8, 8));
        assert!(out.as_array().iter().all(|&v| v == 100));
    }

    #[test]
    fn fractional_area_weights_sum_to_one() {
        for taps in area_taps(7, 3) {
            let total: f32 = taps.iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-5);
        }
    }
}
