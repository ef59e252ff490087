use std::{future::Future, pin::Pin};

use serde::{Deserialize, Serialize};

use crate::error::ArtError;

pub mod http;
pub use http::YandexArtApi;

pub const IAM_TOKEN_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";
pub const GENERATION_URL: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/imageGenerationAsync";
pub const OPERATION_URL: &str = "https://llm.api.cloud.yandex.net/operations/";

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ArtError>> + Send + 'a>>;

/// The three calls the pipeline makes against the cloud API. Object-safe so
/// tests can drop in an in-process implementation.
pub trait ArtApi: Send + Sync {
    /// Exchanges the long-lived OAuth secret for a short-lived IAM token
    fn fetch_token<'a>(&'a self, oauth_token: &'a str) -> ApiFuture<'a, String>;

    fn submit<'a>(
        &'a self,
        request: &'a GenerationRequest,
        token: &'a str,
    ) -> ApiFuture<'a, JobHandle>;

    fn poll<'a>(&'a self, handle: &'a JobHandle, token: &'a str) -> ApiFuture<'a, JobStatus>;
}

/// Server-side operation id. Handed from submission to the poller and
/// discarded afterwards.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub operation_id: String,
}

#[derive(Debug)]
pub enum JobStatus {
    Pending,
    /// The payload stays base64-encoded here; the poll loop decodes it
    Done { image_base64: String },
    Failed { error: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    model_uri: String,
    generation_options: GenerationOptions,
    messages: Vec<PromptMessage>,
}

impl GenerationRequest {
    /// Fixed-shape request: one weighted text message, square aspect ratio,
    /// deterministic seed. The field values are strings on the wire.
    pub fn new(folder_id: &str, prompt: &str) -> Self {
        Self {
            model_uri: format!("art://{folder_id}/yandex-art/latest"),
            generation_options: GenerationOptions {
                seed: "1863",
                aspect_ratio: AspectRatio {
                    width_ratio: "1",
                    height_ratio: "1",
                },
            },
            messages: vec![PromptMessage {
                weight: "1",
                text: prompt.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationOptions {
    seed: &'static str,
    aspect_ratio: AspectRatio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AspectRatio {
    width_ratio: &'static str,
    height_ratio: &'static str,
}

#[derive(Debug, Serialize)]
struct PromptMessage {
    weight: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest<'a> {
    pub yandex_passport_oauth_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub iam_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub done: bool,
    pub response: Option<OperationResponse>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct OperationResponse {
    pub image: Option<String>,
}

impl OperationStatus {
    /// An `error` field always means failure, even when `done` is set.
    pub fn into_job_status(self) -> Result<JobStatus, ArtError> {
        if let Some(error) = self.error {
            return Ok(JobStatus::Failed {
                error: error.to_string(),
            });
        }

        if !self.done {
            return Ok(JobStatus::Pending);
        }

        let image_base64 = self
            .response
            .and_then(|r| r.image)
            .ok_or_else(|| ArtError::Request {
                message: "operation finished without an image payload".into(),
            })?;

        Ok(JobStatus::Done { image_base64 })
    }
}
