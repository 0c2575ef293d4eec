//! Wire contract of the detection endpoint.
//!

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/detect_image";

/// Path of the detection route on the server.
pub const DETECT_PATH: &str = "/detect_image";

/// Name of the single multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// File name attached to camera snapshots.
pub const CAPTURE_FILE_NAME: &str = "capture.jpg";

pub const JPEG_MIME: &str = "image/jpeg";

/// Fallback MIME type for files with an unknown extension.
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";
