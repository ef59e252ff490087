use std::{path::PathBuf, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use log::{info, warn};

use crate::{
    art_api::{ArtApi, GenerationRequest, JobHandle, JobStatus, YandexArtApi},
    clock::{Clock, TokioClock},
    config::Config,
    credentials::CredentialManager,
    error::ArtError,
    storage,
};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEADLINE: Duration = Duration::from_secs(60);

/// Artifacts land here, relative to the working directory
pub const IMAGE_DIR: &str = "temp/generated_images";

/// Drives one prompt through the whole pipeline: credential, submission,
/// polling, storage. Designed for one request in flight at a time; the
/// cached credential is the only state that survives between calls.
pub struct Generator {
    api: Box<dyn ArtApi>,
    clock: Box<dyn Clock>,
    credentials: CredentialManager,
    folder_id: String,
    image_dir: PathBuf,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        Self::with_parts(
            Box::new(YandexArtApi::new(reqwest::Client::new())),
            Box::new(TokioClock),
            config,
            PathBuf::from(IMAGE_DIR),
        )
    }

    pub fn with_parts(
        api: Box<dyn ArtApi>,
        clock: Box<dyn Clock>,
        config: Config,
        image_dir: PathBuf,
    ) -> Self {
        Self {
            api,
            clock,
            credentials: CredentialManager::new(config.oauth_token),
            folder_id: config.folder_id,
            image_dir,
        }
    }

    /// Generates an image for `prompt` and returns the path it was saved
    /// under. The caller owns the file afterwards.
    pub async fn generate(&mut self, prompt: &str) -> Result<PathBuf, ArtError> {
        let mut credential = self.credentials.ensure_valid(self.api.as_ref()).await?;
        let request = GenerationRequest::new(&self.folder_id, prompt);

        info!("submitting generation request");
        let handle = match self.api.submit(&request, &credential.token).await {
            Err(ArtError::Auth { message }) => {
                // stale token: refresh and resubmit once, a second
                // authorization failure is fatal
                warn!("authorization rejected ({message}), refreshing IAM token");
                credential = self.credentials.refresh(self.api.as_ref()).await?;
                self.api.submit(&request, &credential.token).await?
            }
            other => other?,
        };
        info!("received operation id: {}", handle.operation_id);

        let image = wait_for_result(
            self.api.as_ref(),
            self.clock.as_ref(),
            &handle,
            &credential.token,
            DEADLINE,
        )
        .await?;

        let path = storage::unique_image_path(&self.image_dir);
        let artifact = storage::save(&image, &path)?;
        Ok(artifact.path)
    }
}

/// Polls at a fixed interval until the operation completes or `deadline` of
/// wall-clock time has passed. No poll is issued once the deadline is
/// crossed. A poll that fails at the transport layer propagates immediately.
async fn wait_for_result(
    api: &dyn ArtApi,
    clock: &dyn Clock,
    handle: &JobHandle,
    token: &str,
    deadline: Duration,
) -> Result<Vec<u8>, ArtError> {
    let start = clock.now();

    loop {
        let elapsed = clock.now().duration_since(start);
        if elapsed > deadline {
            return Err(ArtError::Timeout { deadline });
        }

        match api.poll(handle, token).await? {
            JobStatus::Done { image_base64 } => {
                let bytes =
                    BASE64
                        .decode(image_base64.as_bytes())
                        .map_err(|e| ArtError::Request {
                            message: format!("couldn't decode image payload: {e}"),
                        })?;
                info!("received image ({} bytes)", bytes.len());
                return Ok(bytes);
            }
            JobStatus::Failed { error } => {
                return Err(ArtError::Generation { message: error });
            }
            JobStatus::Pending => {
                info!("waiting for generation, {}s elapsed", elapsed.as_secs());
                clock.sleep(POLL_INTERVAL).await;
            }
        }
    }
}
