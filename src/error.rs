use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The generative API credential is absent from the environment
    #[error("No API key found in environment variable {0}")]
    MissingApiKey(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The generative API answered with a non-200 status
    #[error("Gemini API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Gemini response contained no generated text")]
    EmptyResponse,

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse feed: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),
}
