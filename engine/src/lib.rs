pub mod art_api;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod generator;
pub mod storage;

pub use config::Config;
pub use error::ArtError;
pub use generator::Generator;
