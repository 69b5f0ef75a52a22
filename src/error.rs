use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("player bridge: {0}")]
    Bridge(String),

    #[error("reading settings: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },

    #[error("controller is no longer running")]
    ControllerClosed,
}

/// Messages shown to the user. Every failure the controller surfaces is one of
/// these; the underlying [`Error`] only goes to the log.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserError {
    #[error("Could not reach the backend. Make sure the mix service and its database are running.")]
    BackendUnreachable,

    #[error("No random mix available. Is the catalog populated?")]
    EmptyRandomPool,

    #[error("Failed to create the custom mix.")]
    CustomMixFailed,

    #[error("Choose both an audio and a video source.")]
    ChooseBoth,
}
