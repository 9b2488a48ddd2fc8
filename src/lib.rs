pub mod cli;
pub mod compose;
pub mod config;
pub mod context;
pub mod service;
pub mod settings;

#[derive(Debug)]
pub enum EntitledError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
    Settings(String),
}

impl std::fmt::Display for EntitledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntitledError::Io(e) => write!(f, "io: {e}"),
            EntitledError::Json(e) => write!(f, "json: {e}"),
            EntitledError::Config(msg) => write!(f, "config: {msg}"),
            EntitledError::Settings(msg) => write!(f, "settings: {msg}"),
        }
    }
}

impl std::error::Error for EntitledError {}

impl From<std::io::Error> for EntitledError {
    fn from(e: std::io::Error) -> Self {
        EntitledError::Io(e)
    }
}

impl From<serde_json::Error> for EntitledError {
    fn from(e: serde_json::Error) -> Self {
        EntitledError::Json(e)
    }
}
