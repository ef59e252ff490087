use log::debug;
use reqwest::{Client, StatusCode};

use super::{
    ApiFuture, ArtApi, GENERATION_URL, GenerationRequest, IAM_TOKEN_URL, JobHandle, JobStatus,
    OPERATION_URL, OperationStatus, SubmitResponse, TokenRequest, TokenResponse,
};
use crate::error::ArtError;

/// Talks to the real YandexART endpoints.
#[derive(Debug, Clone)]
pub struct YandexArtApi {
    client: Client,
}

impl YandexArtApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ArtApi for YandexArtApi {
    fn fetch_token<'a>(&'a self, oauth_token: &'a str) -> ApiFuture<'a, String> {
        Box::pin(async move {
            let auth_err = |message: String| ArtError::Auth { message };

            let resp = self
                .client
                .post(IAM_TOKEN_URL)
                .json(&TokenRequest {
                    yandex_passport_oauth_token: oauth_token,
                })
                .send()
                .await
                .map_err(|e| auth_err(format!("token exchange failed: {e}")))?;

            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| auth_err(format!("token exchange failed: {e}")))?;

            if !status.is_success() {
                return Err(auth_err(format!("token exchange failed: {status} - {body}")));
            }

            let token: TokenResponse = serde_json::from_str(&body)
                .map_err(|e| auth_err(format!("malformed token response: {e}")))?;

            Ok(token.iam_token)
        })
    }

    fn submit<'a>(
        &'a self,
        request: &'a GenerationRequest,
        token: &'a str,
    ) -> ApiFuture<'a, JobHandle> {
        Box::pin(async move {
            let resp = self
                .client
                .post(GENERATION_URL)
                .bearer_auth(token)
                .json(request)
                .send()
                .await
                .map_err(|e| ArtError::Request {
                    message: format!("submission failed: {e}"),
                })?;

            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();

            // 401 is reported distinctly so the orchestrator can refresh
            // the credential and resubmit once
            if status == StatusCode::UNAUTHORIZED {
                return Err(ArtError::Auth {
                    message: format!("{status} - {body}"),
                });
            }

            if !status.is_success() {
                return Err(ArtError::Request {
                    message: format!("{status} - {body}"),
                });
            }

            let submit: SubmitResponse =
                serde_json::from_str(&body).map_err(|_| ArtError::Request {
                    message: format!("response missing operation id: {body}"),
                })?;

            debug!("submission response: operation id {}", submit.id);
            Ok(JobHandle {
                operation_id: submit.id,
            })
        })
    }

    fn poll<'a>(&'a self, handle: &'a JobHandle, token: &'a str) -> ApiFuture<'a, JobStatus> {
        Box::pin(async move {
            let request_err = |message: String| ArtError::Request { message };

            let resp = self
                .client
                .get(format!("{OPERATION_URL}{}", handle.operation_id))
                .bearer_auth(token)
                .send()
                .await
                .map_err(|e| request_err(format!("status query failed: {e}")))?;

            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| request_err(format!("status query failed: {e}")))?;

            if !status.is_success() {
                return Err(request_err(format!("{status} - {body}")));
            }

            let operation: OperationStatus = serde_json::from_str(&body)
                .map_err(|e| request_err(format!("malformed status response: {e}")))?;

            operation.into_job_status()
        })
    }
}
