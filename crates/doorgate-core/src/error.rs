use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Credential errors
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Credential length {len} outside single-block range {min}-{max}")]
    CredentialLength { len: usize, min: usize, max: usize },

    // Identity and key errors
    #[error("Invalid device ID: {0}")]
    InvalidDeviceId(String),

    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    // Crypto errors
    #[error("Entropy source failed: {0}")]
    Entropy(String),

    #[error("Cipher operation failed: {0}")]
    Crypto(String),

    // Protocol errors
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request encoding failed: {0}")]
    RequestEncoding(String),

    // Door errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
