//! Secure message envelopes and credential caching for the Pigeon open
//! platform.
//!
//! Inbound webhook payloads travel as signed envelopes: the signature is
//! verified, the ciphertext decrypted, and the internal frame validated
//! before any content reaches business logic. Outbound API calls lease
//! short-lived bearer tokens from a TTL cache that refreshes them through
//! a caller-supplied remote endpoint.
//!
//! HTTP transport, per-endpoint wrappers, and business payload schemas
//! live outside this crate; it only meets them at the [`TokenFetcher`]
//! and [`CacheStore`] seams.

pub mod cache;
pub mod cipher;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod pkcs7;
pub mod token;

pub use cache::{CacheStore, MemoryCache};
pub use cipher::{CbcCipher, EcbCipher};
pub use envelope::{sign, Envelope, EnvelopeCodec, EnvelopeConfig};
pub use error::{CryptoError, EnvelopeError, TokenError};
pub use token::{
    CredentialCache, Credentials, Token, TokenFetcher, TokenResponse, SAFETY_MARGIN_SECS,
};
