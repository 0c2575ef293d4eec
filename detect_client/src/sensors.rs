//! Sensors module.
//!
//! Camera acquisition and the video surface the frame capturer reads from.
use std::thread;

use image::{ImageFormat, RgbImage};
use rscam::{Camera, Config};
use tokio::sync::watch;

use crate::Error;

/// Frames are requested as motion JPEG and decoded as they arrive.
pub const MJPG: &str = "MJPG";

/// A live video source that can be snapshotted.
pub trait VideoSurface: Send {
    /// Current pixel dimensions, `None` when the source has not reported any.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// The currently visible frame. Must return without waiting on the
    /// device.
    fn current_frame(&self) -> Option<RgbImage>;
}

/// Camera settings, unset values are negotiated with the device.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub device: String,
    pub format: String,
    pub resolution: Option<(u32, u32)>,
    pub frame_rate: Option<(u32, u32)>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_owned(),
            format: MJPG.to_owned(),
            resolution: None,
            frame_rate: None,
        }
    }
}

/// Live video surface fed by a background reader thread.
///
/// The reader keeps draining the source so the driver never queues stale
/// frames, and publishes each decoded frame as the latest one.
pub struct CameraSurface {
    latest: watch::Receiver<Option<RgbImage>>,
    resolution: Option<(u32, u32)>,
}

impl CameraSurface {
    /// Spawn a thread pulling frames from `source` until it fails or the
    /// surface is dropped.
    ///
    /// `source` blocks until the next frame, `Ok(None)` skips a frame that
    /// could not be decoded.
    pub fn spawn<F>(name: &str, resolution: Option<(u32, u32)>, mut source: F) -> Self
    where
        F: FnMut() -> std::io::Result<Option<RgbImage>> + Send + 'static,
    {
        let (tx, latest) = watch::channel(None);
        let name = name.to_owned();

        thread::spawn(move || {
            while !tx.is_closed() {
                match source() {
                    Ok(Some(frame)) => {
                        tx.send_replace(Some(frame));
                    }
                    Ok(None) => {}
                    Err(err) => {
                        log::error!("Error capturing frame from {}: {}", &name, err);
                        break;
                    }
                }
            }
            log::debug!("Frame reader for {} stopped", &name);
        });

        Self { latest, resolution }
    }
}

impl VideoSurface for CameraSurface {
    fn dimensions(&self) -> Option<(u32, u32)> {
        self.resolution
    }

    fn current_frame(&self) -> Option<RgbImage> {
        self.latest.borrow().clone()
    }
}

fn decode_mjpg(device: &str, frame: &rscam::Frame) -> Option<RgbImage> {
    match image::load_from_memory_with_format(&frame[..], ImageFormat::Jpeg) {
        Ok(image) => Some(image.to_rgb8()),
        Err(err) => {
            log::warn!("Unable to decode frame from {}: {}", device, err);
            None
        }
    }
}

/// Open and start the configured video device.
///
/// Video only. When resolution or frame rate are not configured, the
/// largest the device offers for the format is used.
pub fn acquire_camera(config: &CameraConfig) -> Result<CameraSurface, Error> {
    if config.format != MJPG {
        return Err(Error::UnsupportedFormat(config.format.clone()));
    }

    let device = config.device.as_str();
    let open_err = |source| Error::CameraOpen {
        device: device.to_owned(),
        source,
    };

    let mut cam = Camera::new(device).map_err(open_err)?;
    log_supported_formats(&cam, &config.format);
    let format = config.format.as_bytes();

    log::info!("Using camera {}", device);

    let resolution = match config.resolution {
        Some(resolution) => resolution,
        None => get_max_resolution(&cam, format)
            .map_err(open_err)?
            .ok_or_else(|| mode_err(config, "resolution"))?,
    };

    let frame_rate = match config.frame_rate {
        Some(frame_rate) => frame_rate,
        None => get_max_frame_rate(&cam, format, resolution)
            .map_err(open_err)?
            .ok_or_else(|| mode_err(config, "frame rate"))?,
    };

    log::debug!(
        "Starting {} at {:?} with interval {:?}",
        device,
        resolution,
        frame_rate
    );

    cam.start(&Config {
        interval: frame_rate,
        resolution,
        format,
        ..Default::default()
    })
    .map_err(|source| Error::CameraStart {
        device: device.to_owned(),
        source,
    })?;

    let name = device.to_owned();
    Ok(CameraSurface::spawn(device, Some(resolution), move || {
        let frame = cam.capture()?;
        log::trace!("Captured {} bytes at {:?}", frame.len(), frame.resolution);
        Ok(decode_mjpg(&name, &frame))
    }))
}

fn mode_err(config: &CameraConfig, what: &'static str) -> Error {
    Error::CameraMode {
        device: config.device.clone(),
        format: config.format.clone(),
        what,
    }
}

/// Get the maximum supported resolution for the given format.
fn get_max_resolution(cam: &Camera, format: &[u8]) -> std::io::Result<Option<(u32, u32)>> {
    let resolution_info = cam.resolutions(format).map_err(std::io::Error::other)?;
    log::debug!("Found resolutions: {:?}", &resolution_info);
    Ok(max_resolution(&resolution_info))
}

fn max_resolution(info: &rscam::ResolutionInfo) -> Option<(u32, u32)> {
    match info {
        rscam::ResolutionInfo::Discretes(resolutions) => resolutions
            .iter()
            // Highest resolution in terms of number of pixels
            .max_by_key(|(width, height)| width * height)
            .copied(),
        rscam::ResolutionInfo::Stepwise { max, .. } => Some(*max),
    }
}

/// Get the maximum supported frame rate for the given format and resolution.
fn get_max_frame_rate(
    cam: &Camera,
    format: &[u8],
    resolution: (u32, u32),
) -> std::io::Result<Option<(u32, u32)>> {
    let interval_info = cam
        .intervals(format, resolution)
        .map_err(std::io::Error::other)?;
    log::debug!("Found frame rates: {:?}", &interval_info);
    Ok(max_frame_rate(&interval_info))
}

fn max_frame_rate(info: &rscam::IntervalInfo) -> Option<(u32, u32)> {
    match info {
        // Intervals are seconds per frame as (numerator, denominator)
        rscam::IntervalInfo::Discretes(intervals) => intervals
            .iter()
            .filter(|(numerator, _)| *numerator > 0)
            .max_by_key(|(numerator, denominator)| denominator / numerator)
            .copied(),
        // The shortest interval gives the highest rate
        rscam::IntervalInfo::Stepwise { min, .. } => Some(*min),
    }
}

fn log_supported_formats(cam: &Camera, format: &str) {
    let formats: Vec<_> = cam.formats().filter_map(|fmt| fmt.ok()).collect();
    log::debug!(
        "Supported formats: {:?}, using format {:?}",
        formats,
        format
    );
}
