use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("http status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("malformed response from {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
