use ndarray::Axis;

use crate::frame::Frame;

/// Quantizes each channel to `2^bits` levels. The top level is folded into the one below
/// it, so `bits` levels never produce more than `2^bits` distinct values.
pub fn bit_depth(frame: &Frame, bits: i32) -> Frame {
    let levels = 2f32.powi(bits.clamp(1, 8));
    let top = levels - 1.0;

    Frame::wrap(frame.as_array().mapv(|v| {
        let level = (f32::from(v) / 255.0 * levels).floor().min(top);
        (level / levels * 255.0) as u8
    }))
}

pub fn banding(frame: &Frame, levels: i32) -> Frame {
    let step = band_step(levels);
    Frame::wrap(frame.as_array().mapv(|v| v / step * step))
}

/// Banding on the HSV value channel only, hue and saturation kept.
pub fn banding_luminance(frame: &Frame, levels: i32) -> Frame {
    let step = band_step(levels);
    let mut out = frame.as_array().clone();

    for mut px in out.lanes_mut(Axis(2)) {
        let (h, s, v) = bgr_to_hsv(px[0], px[1], px[2]);
        let [b, g, r] = hsv_to_bgr(h, s, v / step * step);
        px[0] = b;
        px[1] = g;
        px[2] = r;
    }

    Frame::wrap(out)
}

/// Snaps each channel to the middle of its band.
pub fn posterize(frame: &Frame, levels: i32) -> Frame {
    let step = u16::from(band_step(levels));
    Frame::wrap(
        frame
            .as_array()
            .mapv(|v| (u16::from(v) / step * step + step / 2).min(255) as u8),
    )
}

fn band_step(levels: i32) -> u8 {
    (256 / levels.clamp(1, 256)).clamp(1, 255) as u8
}

/// 8-bit HSV: hue in `[0, 180)`, saturation and value in `[0, 255]`.
fn bgr_to_hsv(b: u8, g: u8, r: u8) -> (u8, u8, u8) {
    let v = b.max(g).max(r);
    let min = b.min(g).min(r);
    let diff = f32::from(v - min);

    if diff == 0.0 {
        return (0, 0, v);
    }

    let s = (diff * 255.0 / f32::from(v)).round() as u8;
    let (b, g, r, max) = (f32::from(b), f32::from(g), f32::from(r), f32::from(v));
    let degrees = if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };

    let h = (degrees.rem_euclid(360.0) / 2.0).round() as u16 % 180;
    (h as u8, s, v)
}

fn hsv_to_bgr(h: u8, s: u8, v: u8) -> [u8; 3] {
    if s == 0 {
        return [v; 3];
    }

    let s = f32::from(s) / 255.0;
    let v = f32::from(v) / 255.0;
    let sector_pos = (f32::from(h) * 6.0 / 180.0).rem_euclid(6.0);
    let sector = sector_pos.floor();
    let f = sector_pos - sector;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    [b, g, r].map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8)
}
