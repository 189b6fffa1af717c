use image::{Rgb, RgbImage};
use ndarray::Array3;

use crate::error::{FilterError, FilterResult};

/// One decoded raster: `(height, width, 3)` bytes in BGR order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Array3<u8>,
}

impl Frame {
    /// A black frame.
    pub fn new(width: usize, height: usize) -> FilterResult<Self> {
        Self::filled(width, height, [0, 0, 0])
    }

    pub fn filled(width: usize, height: usize, bgr: [u8; 3]) -> FilterResult<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::EmptyFrame);
        }

        Ok(Self {
            data: Array3::from_shape_fn((height, width, 3), |(_, _, c)| bgr[c]),
        })
    }

    pub fn from_array(data: Array3<u8>) -> FilterResult<Self> {
        let (height, width, channels) = data.dim();
        if width == 0 || height == 0 {
            return Err(FilterError::EmptyFrame);
        }
        if channels != 3 {
            return Err(FilterError::invalid_frame(format!(
                "expected 3 channels, got {channels}"
            )));
        }

        Ok(Self { data })
    }

    /// Wraps a packed `bgr24` buffer, the layout ffmpeg emits for `-pix_fmt bgr24`.
    pub fn from_bgr_bytes(width: usize, height: usize, bytes: Vec<u8>) -> FilterResult<Self> {
        let expected = width * height * 3;
        if bytes.len() != expected {
            return Err(FilterError::invalid_frame(format!(
                "{width}x{height} bgr24 frame needs {expected} bytes, got {}",
                bytes.len()
            )));
        }

        let data = Array3::from_shape_vec((height, width, 3), bytes)
            .map_err(|e| FilterError::invalid_frame(e.to_string()))?;
        Self::from_array(data)
    }

    /// Same as [`Frame::from_bgr_bytes`] for packed `rgb24` input.
    pub fn from_rgb_bytes(width: usize, height: usize, mut bytes: Vec<u8>) -> FilterResult<Self> {
        for px in bytes.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        Self::from_bgr_bytes(width, height, bytes)
    }

    pub fn from_rgb_image(img: &RgbImage) -> FilterResult<Self> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        if width == 0 || height == 0 {
            return Err(FilterError::EmptyFrame);
        }

        let data = Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
            img.get_pixel(x as u32, y as u32)[2 - c]
        });
        Ok(Self { data })
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            let [b, g, r] = self.pixel(x as usize, y as usize);
            Rgb([r, g, b])
        })
    }

    /// Kernels build their output with the input's shape, so no re-validation.
    pub(crate) fn wrap(data: Array3<u8>) -> Self {
        debug_assert_eq!(data.dim().2, 3);
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// `(width, height)`
    pub fn dims(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        [
            self.data[[y, x, 0]],
            self.data[[y, x, 1]],
            self.data[[y, x, 2]],
        ]
    }

    pub fn as_array(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn into_array(self) -> Array3<u8> {
        self.data
    }

    /// Row-major packed `bgr24` bytes.
    pub fn to_bgr_bytes(&self) -> Vec<u8> {
        self.data.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_frames_are_rejected() {
        assert!(matches!(Frame::new(0, 4), Err(FilterError::EmptyFrame)));
        assert!(matches!(Frame::new(4, 0), Err(FilterError::EmptyFrame)));
    }

    #[test]
    fn bgr_bytes_keep_row_major_layout() {
        let bytes: Vec<u8> = (0..18).collect();
        let frame = Frame::from_bgr_bytes(3, 2, bytes.clone()).unwrap();
        assert_eq!(frame.dims(), (3, 2));
        assert_eq!(frame.pixel(1, 0), [3, 4, 5]);
        assert_eq!(frame.pixel(0, 1), [9, 10, 11]);
        assert_eq!(frame.to_bgr_bytes(), bytes);
    }

    #[test]
    fn short_buffers_are_invalid() {
        let err = Frame::from_bgr_bytes(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFrame(_)));
    }

    #[test]
    fn rgb_bytes_are_stored_as_bgr() {
        let frame = Frame::from_rgb_bytes(1, 1, vec![1, 2, 3]).unwrap();
        assert_eq!(frame.pixel(0, 0), [3, 2, 1]);
    }

    #[test]
    fn rgb_image_swaps_channel_order() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(1, 0, Rgb([10, 20, 30]));
        let frame = Frame::from_rgb_image(&img).unwrap();
        assert_eq!(frame.pixel(1, 0), [30, 20, 10]);
        assert_eq!(frame.to_rgb_image(), img);
    }

    #[test]
    fn four_channel_arrays_are_rejected() {
        let err = Frame::from_array(Array3::zeros((2, 2, 4))).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFrame(_)));
    }
}
