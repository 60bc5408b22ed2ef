use {std::error::Error as StdError, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    /// The HTTP client could not be built. Holds teloxide's own `reqwest`
    /// error, which may be a different major version than ours.
    #[error("failed to build telegram http client: {0}")]
    HttpClient(#[source] Box<dyn StdError + Send + Sync>),

    #[error("invalid telegram config: {message}")]
    Config { message: String },
}

impl Error {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn http_client<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::HttpClient(Box::new(source))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
