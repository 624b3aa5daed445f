use thiserror::Error;

/// Errors of the host side image tool.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Store(#[from] totp_keeper::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("could not parse URI: {0}")]
    UriParseError(#[from] url::ParseError),

    #[error("not an otpauth://totp/ URI: {0}")]
    NotTotpUri(String),

    #[error("URI has no secret parameter")]
    MissingSecret,

    #[error("secret is not valid base32: {0}")]
    SecretDecode(#[from] data_encoding::DecodeError),

    #[error("secret cannot be used as HMAC key")]
    InvalidKey,

    #[error("invalid slot count {0}: must be 4 or 15")]
    InvalidSlotCount(u8),

    #[error("operation canceled")]
    Canceled,
}
