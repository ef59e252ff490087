use chrono::{DateTime, Utc};
use log::info;

use crate::{art_api::ArtApi, error::ArtError};

/// Short-lived IAM bearer token exchanged from the long-lived OAuth secret
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

/// Caches at most one credential per process. There is no background refresh
/// timer; staleness is detected reactively when a downstream call reports an
/// authorization failure and the orchestrator calls [`refresh`].
///
/// [`refresh`]: CredentialManager::refresh
pub struct CredentialManager {
    oauth_token: String,
    cached: Option<Credential>,
}

impl CredentialManager {
    pub fn new(oauth_token: String) -> Self {
        Self {
            oauth_token,
            cached: None,
        }
    }

    /// Returns the cached credential, fetching one first if none is cached.
    /// Idempotent while a credential is held.
    pub async fn ensure_valid(&mut self, api: &dyn ArtApi) -> Result<Credential, ArtError> {
        if let Some(credential) = &self.cached {
            return Ok(credential.clone());
        }
        self.fetch(api).await
    }

    /// Discards the cached credential and fetches a new one. The discarded
    /// credential is never handed out again.
    pub async fn refresh(&mut self, api: &dyn ArtApi) -> Result<Credential, ArtError> {
        self.cached = None;
        self.fetch(api).await
    }

    async fn fetch(&mut self, api: &dyn ArtApi) -> Result<Credential, ArtError> {
        let token = api.fetch_token(&self.oauth_token).await?;
        info!("obtained new IAM token");

        let credential = Credential {
            token,
            issued_at: Utc::now(),
        };
        self.cached = Some(credential.clone());
        Ok(credential)
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::art_api::{ApiFuture, GenerationRequest, JobHandle, JobStatus};

    struct TokenApi {
        fetches: AtomicUsize,
        fail: bool,
    }

    impl TokenApi {
        fn new(fail: bool) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl ArtApi for TokenApi {
        fn fetch_token<'a>(&'a self, _oauth_token: &'a str) -> ApiFuture<'a, String> {
            Box::pin(async move {
                let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
                if self.fail {
                    Err(ArtError::Auth {
                        message: "invalid oauth token".into(),
                    })
                } else {
                    Ok(format!("iam-{n}"))
                }
            })
        }

        fn submit<'a>(
            &'a self,
            _request: &'a GenerationRequest,
            _token: &'a str,
        ) -> ApiFuture<'a, JobHandle> {
            unreachable!("credential tests never submit")
        }

        fn poll<'a>(&'a self, _handle: &'a JobHandle, _token: &'a str) -> ApiFuture<'a, JobStatus> {
            unreachable!("credential tests never poll")
        }
    }

    #[tokio::test]
    async fn ensure_valid_is_idempotent() -> Result<(), ArtError> {
        let api = TokenApi::new(false);
        let mut manager = CredentialManager::new("oauth".into());

        let first = manager.ensure_valid(&api).await?;
        let second = manager.ensure_valid(&api).await?;

        assert_eq!(first.token, "iam-1");
        assert_eq!(second.token, "iam-1");
        assert_eq!(api.fetches.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_discards_and_fetches() -> Result<(), ArtError> {
        let api = TokenApi::new(false);
        let mut manager = CredentialManager::new("oauth".into());

        manager.ensure_valid(&api).await?;
        let refreshed = manager.refresh(&api).await?;
        let cached = manager.ensure_valid(&api).await?;

        assert_eq!(refreshed.token, "iam-2");
        assert_eq!(cached.token, "iam-2");
        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn failed_fetch_caches_nothing() {
        let api = TokenApi::new(true);
        let mut manager = CredentialManager::new("oauth".into());

        let err = manager.ensure_valid(&api).await.unwrap_err();
        assert!(matches!(err, ArtError::Auth { .. }));
        assert!(manager.cached.is_none());

        // the next call tries again instead of reusing a failure
        let _ = manager.ensure_valid(&api).await.unwrap_err();
        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
    }
}
