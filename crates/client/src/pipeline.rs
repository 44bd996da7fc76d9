//! Submission pipeline: image preparation, recognition, and plant creation.
//!
//! [`SubmissionPipeline`] owns one shared [`PlantApi`] and one
//! [`ImagePreparer`]. Every network call yields exactly one classified
//! outcome ([`RecognitionResult`] or [`CreateResult`]); nothing is
//! retried and no error escapes as a panic or `Err`.
//!
//! Callers that prefer a completion callback over awaiting can use
//! [`SubmissionPipeline::dispatch_recognize`] and
//! [`SubmissionPipeline::dispatch_create`], which spawn the call on the
//! tokio runtime and hand the outcome to a continuation.

use std::sync::Arc;

use guguma_core::draft::PlantDraft;
use guguma_core::image_prep::{ImagePreparer, PrepareError, PreparedImage};
use tokio::task::JoinHandle;

use crate::api::{PlantApi, PlantApiError};
use crate::outcome::{CreateResult, Failure, FailureKind, RecognitionResult, UNKNOWN_ERROR_DETAIL};

/// Sequences the outbound calls of a plant registration flow.
#[derive(Debug, Clone)]
pub struct SubmissionPipeline {
    api: Arc<PlantApi>,
    preparer: ImagePreparer,
}

impl SubmissionPipeline {
    pub fn new(api: PlantApi, preparer: ImagePreparer) -> Self {
        Self {
            api: Arc::new(api),
            preparer,
        }
    }

    /// Decode and shrink an encoded image on the blocking thread pool.
    pub async fn prepare(&self, source: Vec<u8>) -> Result<PreparedImage, PrepareError> {
        let preparer = self.preparer;
        match tokio::task::spawn_blocking(move || preparer.prepare_bytes(&source)).await {
            Ok(result) => result,
            Err(e) => Err(PrepareError::Interrupted(e.to_string())),
        }
    }

    /// Ask the recognition service for the plant's name.
    pub async fn recognize(&self, image: &PreparedImage) -> RecognitionResult {
        self.recognize_bytes(image.bytes.clone()).await
    }

    /// Same as [`recognize`](Self::recognize) for an already encoded JPEG.
    pub async fn recognize_bytes(&self, jpeg: Vec<u8>) -> RecognitionResult {
        if jpeg.is_empty() {
            return RecognitionResult::Failure(Failure::validation("Image is empty"));
        }

        let result = classify_recognition(self.api.recognize(jpeg).await);
        match &result {
            RecognitionResult::Success { name } => {
                tracing::info!(name = %name, "Plant recognized");
            }
            RecognitionResult::Failure(failure) => {
                tracing::warn!(kind = %failure.kind, detail = %failure.detail, "Plant recognition failed");
            }
        }
        result
    }

    /// Validate the draft and register the plant.
    ///
    /// An invalid draft yields a [`FailureKind::Validation`] failure
    /// without any request being sent.
    pub async fn create_record(&self, draft: &PlantDraft) -> CreateResult {
        let request = match draft.to_create_request() {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Plant draft rejected before submission");
                return CreateResult::Failure(Failure::validation(e.to_string()));
            }
        };

        let result = classify_creation(self.api.create_plant(&request).await);
        match &result {
            CreateResult::Success => {
                tracing::info!(nickname = %request.nickname, "Plant registered");
            }
            CreateResult::Failure(failure) => {
                tracing::warn!(kind = %failure.kind, detail = %failure.detail, "Plant registration failed");
            }
        }
        result
    }

    /// Spawn a recognition call and deliver its outcome to `on_done`.
    pub fn dispatch_recognize<F>(&self, jpeg: Vec<u8>, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(RecognitionResult) + Send + 'static,
    {
        let pipeline = self.clone();
        tokio::spawn(async move {
            on_done(pipeline.recognize_bytes(jpeg).await);
        })
    }

    /// Spawn a create-record call and deliver its outcome to `on_done`.
    pub fn dispatch_create<F>(&self, draft: PlantDraft, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(CreateResult) + Send + 'static,
    {
        let pipeline = self.clone();
        tokio::spawn(async move {
            on_done(pipeline.create_record(&draft).await);
        })
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Map a raw recognition result to an outcome.
///
/// A success status with a blank body is not a recognition.
pub fn classify_recognition(result: Result<String, PlantApiError>) -> RecognitionResult {
    match result {
        Ok(body) => {
            let name = body.trim();
            if name.is_empty() {
                RecognitionResult::Failure(Failure::new(
                    FailureKind::EmptyOrRejected,
                    "Recognition returned an empty name",
                ))
            } else {
                RecognitionResult::Success {
                    name: name.to_string(),
                }
            }
        }
        Err(PlantApiError::Request(e)) => RecognitionResult::Failure(Failure::transport(e.to_string())),
        Err(PlantApiError::Body { status, source }) => RecognitionResult::Failure(Failure::new(
            FailureKind::EmptyOrRejected,
            format!("Recognition body unreadable (HTTP {status}): {source}"),
        )),
        Err(PlantApiError::ApiError { status, .. }) => RecognitionResult::Failure(Failure::new(
            FailureKind::EmptyOrRejected,
            format!("Recognition rejected with HTTP {status}"),
        )),
    }
}

/// Map a raw creation result to an outcome.
pub fn classify_creation(result: Result<(), PlantApiError>) -> CreateResult {
    match result {
        Ok(()) => CreateResult::Success,
        Err(PlantApiError::Request(e)) => CreateResult::Failure(Failure::transport(e.to_string())),
        Err(PlantApiError::Body { status, source }) => CreateResult::Failure(Failure::new(
            FailureKind::Rejected,
            format!("Response body unreadable (HTTP {status}): {source}"),
        )),
        Err(PlantApiError::ApiError { status, body }) => {
            tracing::debug!(status, body = %body, "Creation endpoint returned an error");
            CreateResult::Failure(Failure::new(
                FailureKind::Rejected,
                extract_error_message(&body),
            ))
        }
    }
}

/// Pull the `message` string out of a JSON error body.
///
/// Missing, blank, non-string, or unparsable messages fall back to
/// [`UNKNOWN_ERROR_DETAIL`].
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .unwrap_or(UNKNOWN_ERROR_DETAIL)
        .to_string()
}
