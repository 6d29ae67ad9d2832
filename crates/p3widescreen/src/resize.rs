//! Image resizing used to stretch full-screen artwork.

use std::io::Cursor;

use image::imageops::FilterType;
use tracing::debug;

use crate::error::Result;

/// Scales an encoded image to an exact size, keeping its file format.
pub trait ImageResizer: Send + Sync {
    fn resize(&self, image: &[u8], width: u32, height: u32) -> Result<Vec<u8>>;
}

/// Lanczos resampling followed by a light unsharp mask.
#[derive(Debug, Clone, Copy)]
pub struct LanczosResizer {
    pub sharpen_sigma: f32,
    pub sharpen_threshold: i32,
}

impl Default for LanczosResizer {
    fn default() -> Self {
        Self {
            sharpen_sigma: 0.7,
            sharpen_threshold: 2,
        }
    }
}

impl ImageResizer for LanczosResizer {
    fn resize(&self, image: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let format = image::guess_format(image)?;
        let original = image::load_from_memory_with_format(image, format)?;
        debug!(
            "Resizing {:?} image {}x{} -> {}x{}",
            format,
            original.width(),
            original.height(),
            width,
            height
        );

        let mut resized = original.resize_exact(width, height, FilterType::Lanczos3);
        if self.sharpen_sigma > 0.0 {
            resized = resized.unsharpen(self.sharpen_sigma, self.sharpen_threshold);
        }

        let mut out = Cursor::new(Vec::new());
        resized.write_to(&mut out, format)?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn sample_bmp() -> Vec<u8> {
        let img = RgbImage::from_fn(8, 6, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 128]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Bmp).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_resize_keeps_bmp_format() {
        let resized = LanczosResizer::default()
            .resize(&sample_bmp(), 12, 5)
            .unwrap();
        assert_eq!(image::guess_format(&resized).unwrap(), ImageFormat::Bmp);

        let decoded = image::load_from_memory(&resized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 5));
    }

    #[test]
    fn test_resize_rejects_garbage() {
        assert!(LanczosResizer::default()
            .resize(b"definitely not an image", 4, 4)
            .is_err());
    }
}
