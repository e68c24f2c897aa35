use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the server or the client can run into.
///
/// The first three variants are meant for the caller and carry the message that ends up in the
/// response body. The rest are infrastructure failures: they are logged, and surface to the
/// client as an opaque 500.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("No response from server")]
    NoResponse,

    #[error("Connection reset by peer")]
    ConnectionReset,

    #[error("Thread pool error: {0}")]
    ThreadPool(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed HTTP message: {0}")]
    Http(#[from] httparse::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid route: {0}")]
    Route(#[from] matchit::InsertError),
}

impl Error {
    /// HTTP status code used when this error is turned into a response
    pub fn status(&self) -> u16 {
        match self {
            Error::BadRequest(_) => 400,
            Error::NotFound(_) => 404,
            Error::MethodNotAllowed(_) => 405,
            _ => 500,
        }
    }

    /// Message exposed to the client. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Error::BadRequest(msg) | Error::NotFound(msg) | Error::MethodNotAllowed(msg) => {
                msg.clone()
            }
            _ => "Internal server error".to_string(),
        }
    }
}
