//! 16-bit PNG depth writer.

use crate::capture::{DepthSink, SinkError};
use crate::core::DepthImage;
use image::{ImageBuffer, Luma};
use std::path::PathBuf;

/// Writes each decoded depth image as `<id>.png` under an output directory.
///
/// PNG stores the full 16-bit depth range losslessly as single-channel
/// grayscale. With previews enabled, an additional 8-bit `<id>_preview.png`
/// (high byte only) is written for quick visual inspection; the 16-bit file
/// stays the authoritative output.
pub struct PngDepthSink {
    out_dir: PathBuf,
    preview: bool,
}

impl PngDepthSink {
    /// Create the sink, creating the output directory if needed.
    pub fn new(out_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let out_dir = out_dir.into();
        std::fs::create_dir_all(&out_dir)?;
        Ok(Self {
            out_dir,
            preview: false,
        })
    }

    /// Also write an 8-bit preview next to each depth image.
    pub fn with_preview(mut self, enabled: bool) -> Self {
        self.preview = enabled;
        self
    }
}

impl DepthSink for PngDepthSink {
    fn write(&mut self, id: &str, image: &DepthImage) -> Result<(), SinkError> {
        let (width, height) = (image.width(), image.height());

        let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_raw(width, height, image.pixels().to_vec())
                .ok_or("depth image dimensions do not match pixel count")?;
        buffer.save(self.out_dir.join(format!("{}.png", id)))?;

        if self.preview {
            let preview: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_raw(
                width,
                height,
                image.pixels().iter().map(|d| (d >> 8) as u8).collect(),
            )
            .ok_or("depth image dimensions do not match pixel count")?;
            preview.save(self.out_dir.join(format!("{}_preview.png", id)))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::depth::{decode_rgb, encode_pixel};

    fn gradient_image(width: u32, height: u32) -> DepthImage {
        // Build via the codec so the test exercises the public path
        let mut encoded = Vec::new();
        for row in 0..height {
            for col in 0..width {
                let depth = (row * width + col) as u16 * 257;
                encoded.extend_from_slice(&encode_pixel(depth));
            }
        }
        decode_rgb(&encoded, width, height).unwrap()
    }

    #[test]
    fn test_write_and_reload_16bit() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PngDepthSink::new(dir.path().join("depth")).unwrap();

        let image = gradient_image(4, 3);
        sink.write("0000", &image).unwrap();

        let reloaded = image::open(dir.path().join("depth/0000.png")).unwrap().into_luma16();
        assert_eq!(reloaded.width(), 4);
        assert_eq!(reloaded.height(), 3);
        for (x, y, pixel) in reloaded.enumerate_pixels() {
            assert_eq!(pixel.0[0], image.get(x, y));
        }
    }

    #[test]
    fn test_preview_written_alongside() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PngDepthSink::new(dir.path()).unwrap().with_preview(true);

        sink.write("cam_a", &gradient_image(2, 2)).unwrap();

        assert!(dir.path().join("cam_a.png").is_file());
        assert!(dir.path().join("cam_a_preview.png").is_file());
    }
}
