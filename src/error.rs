use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The package inventory could not be read (adb missing, device offline, bad output)
    #[error("package source: {0}")]
    Source(String),

    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("could not resolve label for '{0}'")]
    Label(String),

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("could not determine {0} directory")]
    DataDir(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
