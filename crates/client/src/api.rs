//! REST client for the plant recognition and registration endpoints.
//!
//! Wraps the two HTTP calls (multipart image recognition, JSON plant
//! creation) using [`reqwest`]. Errors here are raw wire errors; the
//! [`pipeline`](crate::pipeline) classifies them into outcomes.

use guguma_core::draft::CreatePlantRequest;
use reqwest::multipart::{Form, Part};

use crate::config::ClientConfig;

/// Name of the multipart part carrying the image.
pub const IMAGE_PART_NAME: &str = "image";
/// Content type of the uploaded image part.
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Errors from the plant REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum PlantApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A success status arrived but its body could not be read.
    #[error("Failed to read response body (HTTP {status}): {source}")]
    Body {
        status: u16,
        #[source]
        source: reqwest::Error,
    },

    /// The server returned a non-2xx status code.
    #[error("Plant API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

/// HTTP client for the plant services.
///
/// One instance holds one [`reqwest::Client`], so both calls share a
/// connection pool.
#[derive(Debug, Clone)]
pub struct PlantApi {
    client: reqwest::Client,
    recognize_url: String,
    create_url: String,
    upload_file_name: String,
}

impl PlantApi {
    /// Build a client with the configured timeouts.
    pub fn new(config: &ClientConfig) -> Result<Self, PlantApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            recognize_url: config.recognize_url.clone(),
            create_url: config.create_url.clone(),
            upload_file_name: config.upload_file_name.clone(),
        }
    }

    pub fn recognize_url(&self) -> &str {
        &self.recognize_url
    }

    pub fn create_url(&self) -> &str {
        &self.create_url
    }

    /// Upload a JPEG for recognition.
    ///
    /// Sends a multipart `POST` with a single `image` part and returns the
    /// raw response text on a success status.
    pub async fn recognize(&self, jpeg: Vec<u8>) -> Result<String, PlantApiError> {
        let size = jpeg.len();
        let part = Part::bytes(jpeg)
            .file_name(self.upload_file_name.clone())
            .mime_str(IMAGE_CONTENT_TYPE)?;
        let form = Form::new().part(IMAGE_PART_NAME, part);

        tracing::debug!(url = %self.recognize_url, size, "Uploading image for recognition");

        let response = self
            .client
            .post(&self.recognize_url)
            .multipart(form)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let status = response.status().as_u16();
        response
            .text()
            .await
            .map_err(|source| PlantApiError::Body { status, source })
    }

    /// Register a plant.
    ///
    /// Sends the request as a JSON `POST`; any success status counts,
    /// the body is ignored.
    pub async fn create_plant(&self, request: &CreatePlantRequest) -> Result<(), PlantApiError> {
        tracing::debug!(url = %self.create_url, ?request, "Sending plant creation request");

        let response = self
            .client
            .post(&self.create_url)
            .json(request)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    // ---- private helpers ----

    /// Returns the response unchanged on a success status, or a
    /// [`PlantApiError::ApiError`] with the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, PlantApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlantApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
