use ndarray::Axis;

use crate::frame::Frame;

/// Dims every `spacing`-th row, starting with the first, by `intensity` percent.
pub fn scanlines(frame: &Frame, intensity: i32, spacing: i32) -> Frame {
    let keep = 1.0 - f64::from(intensity) / 100.0;
    let spacing = spacing.max(1) as usize;
    let mut out = frame.as_array().clone();

    for mut row in out.axis_iter_mut(Axis(0)).step_by(spacing) {
        row.mapv_inplace(|v| (f64::from(v) * keep).clamp(0.0, 255.0) as u8);
    }

    Frame::wrap(out)
}
