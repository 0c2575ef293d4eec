//! Frame capture: snapshot the live surface into a JPEG blob.
//!
use common::blob::ImageBlob;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ColorType, RgbImage};

use crate::{sensors::VideoSurface, Error};

/// Canvas size used when the surface does not report its dimensions.
pub const DEFAULT_CANVAS_SIZE: (u32, u32) = (640, 480);

pub const JPEG_QUALITY: u8 = 92;

/// Canvas dimensions for a surface, falling back to the default size.
pub fn canvas_size(surface: &dyn VideoSurface) -> (u32, u32) {
    match surface.dimensions() {
        Some((width, height)) if width > 0 && height > 0 => (width, height),
        _ => DEFAULT_CANVAS_SIZE,
    }
}

/// Frame grabbed from a surface together with the canvas it is drawn on.
#[derive(Debug)]
pub struct Snapshot {
    frame: RgbImage,
    canvas: (u32, u32),
}

impl Snapshot {
    pub fn canvas_size(&self) -> (u32, u32) {
        self.canvas
    }

    /// Draw the frame onto the canvas, scaling it when sizes differ.
    pub fn draw(self) -> RgbImage {
        let (width, height) = self.canvas;
        if self.frame.dimensions() == (width, height) {
            return self.frame;
        }

        log::debug!(
            "Scaling {:?} frame onto {}x{} canvas",
            self.frame.dimensions(),
            width,
            height
        );
        image::imageops::resize(&self.frame, width, height, FilterType::Triangle)
    }
}

/// Grab the current frame of the surface and size a canvas for it.
///
/// Returns `None` when the surface has no frame to offer.
pub fn take_snapshot(surface: &dyn VideoSurface) -> Option<Snapshot> {
    let canvas = canvas_size(surface);
    let frame = surface.current_frame()?;
    Some(Snapshot { frame, canvas })
}

/// Draw and JPEG-encode a snapshot on the blocking pool.
pub async fn encode_jpeg(snapshot: Snapshot) -> Result<ImageBlob, Error> {
    let data = tokio::task::spawn_blocking(move || {
        let canvas = snapshot.draw();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            ColorType::Rgb8,
        )?;
        Ok::<_, Error>(buf)
    })
    .await??;

    log::debug!("Encoded capture ({} bytes)", data.len());
    Ok(ImageBlob::jpeg_capture(data))
}

#[cfg(test)]
mod test {

    use super::*;
    use image::Rgb;

    struct StillSurface {
        dimensions: Option<(u32, u32)>,
        frame: Option<RgbImage>,
    }

    impl VideoSurface for StillSurface {
        fn dimensions(&self) -> Option<(u32, u32)> {
            self.dimensions
        }

        fn current_frame(&self) -> Option<RgbImage> {
            self.frame.clone()
        }
    }

    #[test]
    fn test_canvas_follows_surface_dimensions() {
        let surface = StillSurface {
            dimensions: Some((320, 200)),
            frame: Some(RgbImage::from_pixel(320, 200, Rgb([10, 20, 30]))),
        };

        let canvas = take_snapshot(&surface).expect("frame").draw();
        assert_eq!(canvas.dimensions(), (320, 200));
        assert_eq!(canvas.get_pixel(5, 5), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_unknown_dimensions_fall_back_to_default() {
        for dimensions in [None, Some((0, 0)), Some((1280, 0))] {
            let surface = StillSurface {
                dimensions,
                frame: Some(RgbImage::new(32, 24)),
            };

            assert_eq!(canvas_size(&surface), DEFAULT_CANVAS_SIZE);
            assert_eq!(
                take_snapshot(&surface).expect("frame").draw().dimensions(),
                DEFAULT_CANVAS_SIZE
            );
        }
    }

    #[test]
    fn test_no_frame_draws_nothing() {
        let surface = StillSurface {
            dimensions: Some((640, 480)),
            frame: None,
        };

        assert!(take_snapshot(&surface).is_none());
    }

    #[tokio::test]
    async fn test_encode_scales_onto_fallback_canvas() -> Result<(), Error> {
        let surface = StillSurface {
            dimensions: None,
            frame: Some(RgbImage::new(32, 24)),
        };

        let blob = encode_jpeg(take_snapshot(&surface).expect("frame")).await?;
        let decoded = image::load_from_memory(&blob.data)?;
        assert_eq!((decoded.width(), decoded.height()), DEFAULT_CANVAS_SIZE);

        Ok(())
    }

    #[tokio::test]
    async fn test_encode_jpeg_blob() -> Result<(), Error> {
        let surface = StillSurface {
            dimensions: Some((64, 48)),
            frame: Some(RgbImage::from_pixel(64, 48, Rgb([200, 100, 0]))),
        };
        let snapshot = take_snapshot(&surface).expect("frame");

        let blob = encode_jpeg(snapshot).await?;
        assert_eq!(blob.mime, "image/jpeg");
        assert_eq!(blob.file_name, "capture.jpg");
        assert_eq!(&blob.data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&blob.data)?;
        assert_eq!((decoded.width(), decoded.height()), (64, 48));

        Ok(())
    }
}
