//! Image blobs handed to the detection endpoint.
//!
use std::path::Path;

use bytes::Bytes;

use crate::protocol::{CAPTURE_FILE_NAME, JPEG_MIME, OCTET_STREAM_MIME};

/// Opaque image payload together with the metadata sent alongside it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageBlob {
    pub data: Bytes,
    pub mime: String,
    pub file_name: String,
}

impl ImageBlob {
    pub fn new(
        data: impl Into<Bytes>,
        mime: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            mime: mime.into(),
            file_name: file_name.into(),
        }
    }

    /// Blob for a JPEG-encoded camera snapshot.
    pub fn jpeg_capture(data: impl Into<Bytes>) -> Self {
        Self::new(data, JPEG_MIME, CAPTURE_FILE_NAME)
    }

    /// Blob for the raw contents of a user-selected file.
    ///
    /// The MIME type is derived from the extension, the file name is kept
    /// as is.
    pub fn from_file(path: &Path, data: impl Into<Bytes>) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_owned());
        Self::new(data, mime_for_path(path), file_name)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Guess the image MIME type from a file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => JPEG_MIME,
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => OCTET_STREAM_MIME,
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("photo.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("/tmp/IMG_0001.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("scan.tiff")), "image/tiff");
        assert_eq!(mime_for_path(Path::new("notes")), OCTET_STREAM_MIME);
        assert_eq!(mime_for_path(Path::new("archive.tar.gz")), OCTET_STREAM_MIME);
    }

    #[test]
    fn test_file_blob_keeps_name_and_bytes() {
        let blob = ImageBlob::from_file(Path::new("/home/user/photo.png"), vec![0x89, b'P']);

        assert_eq!(blob.file_name, "photo.png");
        assert_eq!(blob.mime, "image/png");
        assert_eq!(&blob.data[..], &[0x89, b'P']);
    }

    #[test]
    fn test_capture_blob() {
        let blob = ImageBlob::jpeg_capture(vec![0xFF_u8, 0xD8]);

        assert_eq!(blob.file_name, CAPTURE_FILE_NAME);
        assert_eq!(blob.mime, JPEG_MIME);
        assert_eq!(blob.len(), 2);
    }
}
