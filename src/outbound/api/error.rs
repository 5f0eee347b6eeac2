use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("back-office api rejected the token or credentials")]
    Unauthorized,

    #[error("back-office api error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("invalid back-office api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
