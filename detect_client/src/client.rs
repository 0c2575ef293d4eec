//! Detection endpoint client.
//!
use bytes::Bytes;
use common::{blob::ImageBlob, protocol::FILE_FIELD};
use reqwest::{header::CONTENT_TYPE, multipart, Client};

use crate::Error;

/// Raw reply of the detection endpoint.
#[derive(Debug)]
pub struct DetectionResponse {
    pub bytes: Bytes,
    /// Content type as declared by the server, informational only.
    pub content_type: Option<String>,
}

/// Uploads images to the detection endpoint.
///
/// Stateless apart from the pooled HTTP client, so it can be cloned into
/// request tasks freely.
#[derive(Clone, Debug)]
pub struct DetectionClient {
    http: Client,
    endpoint: String,
}

impl DetectionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post an image as the single `file` field and return the image the
    /// endpoint answers with.
    ///
    /// Any 2xx response counts as success, whatever content type it declares.
    pub async fn detect(&self, blob: ImageBlob) -> Result<DetectionResponse, Error> {
        log::info!(
            "Uploading {} ({}, {} bytes) to {}",
            &blob.file_name,
            &blob.mime,
            blob.len(),
            &self.endpoint
        );

        let ImageBlob {
            data,
            mime,
            file_name,
        } = blob;
        let length = data.len() as u64;
        let part = multipart::Part::stream_with_length(data, length)
            .file_name(file_name)
            .mime_str(&mime)?;
        let form = multipart::Form::new().part(FILE_FIELD, part);

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?;

        log::info!(
            "Received {} bytes ({}) from {}",
            bytes.len(),
            content_type.as_deref().unwrap_or("no content type"),
            &self.endpoint
        );

        Ok(DetectionResponse {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_error() {
        // Bind and drop to get a port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("bind")
            .port();
        let client = DetectionClient::new(format!("http://127.0.0.1:{port}/detect_image"));

        let result = client
            .detect(ImageBlob::jpeg_capture(vec![0xFF_u8, 0xD8, 0xFF]))
            .await;

        assert!(matches!(result, Err(Error::Detection(_))));
    }

    #[tokio::test]
    async fn test_invalid_mime_is_rejected() {
        let client = DetectionClient::new("http://127.0.0.1:1/detect_image");
        let blob = ImageBlob::new(vec![1_u8, 2, 3], "not a mime", "x.bin");

        let result = client.detect(blob).await;

        assert!(matches!(result, Err(Error::Detection(_))));
    }
}
