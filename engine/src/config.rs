use std::env;

use color_eyre::{Result, eyre::eyre};

/// Startup configuration. Both values are required; a missing one is a fatal
/// configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    /// Long-lived OAuth secret, exchanged for short-lived IAM tokens
    pub oauth_token: String,
    /// Cloud folder the art model lives in
    pub folder_id: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // a missing .env file is fine, the vars may come from the environment
        let _ = dotenvy::dotenv();

        Ok(Self {
            oauth_token: required_var("YANDEX_OAUTH_TOKEN")?,
            folder_id: required_var("YANDEX_FOLDER_ID")?,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| eyre!("Missing required environment variable: {name}"))
}
