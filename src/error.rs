use thiserror::Error;

/// Errors from the symmetric cipher codecs.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected 16 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Invalid IV length: expected {expected} bytes, got {got}")]
    InvalidIvLength { expected: usize, got: usize },

    #[error("Invalid message key: {0}")]
    InvalidMessageKey(String),

    #[error("Malformed base64: {0}")]
    Encoding(String),

    #[error("Ciphertext length {0} is not a positive multiple of the block size")]
    CiphertextLength(usize),

    #[error("Invalid PKCS#7 padding")]
    Padding,

    #[error("{0} is decrypt-only")]
    UnsupportedOperation(&'static str),
}

/// Errors from envelope signing, framing, and wire parsing.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Signature mismatch")]
    SignatureMismatch,

    #[error("Frame identity does not match the configured app id")]
    IdentityMismatch,

    #[error("Frame truncated: need {needed} bytes, got {got}")]
    FrameTruncated { needed: usize, got: usize },

    #[error("Envelope XML error: {0}")]
    Xml(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Errors from the credential cache and its remote token endpoint.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Platform error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Token refresh deadline exceeded")]
    Timeout,

    #[error("Token serialization error: {0}")]
    Serialization(String),
}
