//! Signed wire envelopes for webhook payloads.
//!
//! An inbound envelope is signature-checked before any decryption; an
//! outbound payload is framed, encrypted, and signed. The signature is the
//! platform's sorted-SHA1 construction: the shared token, timestamp, nonce,
//! and ciphertext sorted lexicographically, concatenated with no
//! separators, hashed, and rendered as lowercase hex. It is not an HMAC and
//! must stay bit-compatible with the platform.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::cipher::CbcCipher;
use crate::error::{CryptoError, EnvelopeError};
use crate::frame;

/// Length of the decoded platform message key.
const MESSAGE_KEY_LENGTH: usize = 32;

/// Signed envelope around an encrypted frame.
///
/// Field names follow the platform's XML wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "xml")]
pub struct Envelope {
    /// Base64 ciphertext of the framed message.
    #[serde(rename = "Encrypt")]
    pub ciphertext: String,

    #[serde(rename = "TimeStamp")]
    pub timestamp: String,

    #[serde(rename = "Nonce")]
    pub nonce: String,

    #[serde(rename = "MsgSignature")]
    pub signature: String,
}

impl Envelope {
    /// Serialize to the platform's `<xml>` document.
    pub fn to_xml(&self) -> Result<String, EnvelopeError> {
        quick_xml::se::to_string(self).map_err(|e| EnvelopeError::Xml(e.to_string()))
    }

    /// Parse a platform `<xml>` document.
    pub fn from_xml(xml: &str) -> Result<Self, EnvelopeError> {
        quick_xml::de::from_str(xml).map_err(|e| EnvelopeError::Xml(e.to_string()))
    }
}

/// Compute the envelope signature over `(token, timestamp, nonce, ciphertext)`.
///
/// Deterministic: identical inputs always produce identical output.
pub fn sign(token: &str, timestamp: &str, nonce: &str, ciphertext: &str) -> String {
    let mut parts = [token, timestamp, nonce, ciphertext];
    parts.sort_unstable();
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Envelope configuration, validated once at construction.
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    /// Application identity embedded in every frame.
    pub app_id: String,
    /// Shared webhook token mixed into signatures.
    pub token: String,
    /// Platform message key: unpadded base64 of 32 key bytes. The IV is
    /// the first 16 bytes of the decoded key.
    pub encoded_aes_key: String,
}

/// Produces and validates signed envelopes for one application.
///
/// Stateless per call; configuration is immutable after construction.
pub struct EnvelopeCodec {
    cipher: CbcCipher,
    token: String,
    app_id: String,
}

impl EnvelopeCodec {
    pub fn new(config: EnvelopeConfig) -> Result<Self, CryptoError> {
        let key = STANDARD_NO_PAD
            .decode(&config.encoded_aes_key)
            .map_err(|e| CryptoError::InvalidMessageKey(e.to_string()))?;
        if key.len() != MESSAGE_KEY_LENGTH {
            return Err(CryptoError::InvalidMessageKey(format!(
                "expected {MESSAGE_KEY_LENGTH} decoded bytes, got {}",
                key.len()
            )));
        }
        let cipher = CbcCipher::new(&key, &key[..16])?;
        Ok(Self {
            cipher,
            token: config.token,
            app_id: config.app_id,
        })
    }

    /// Frame, encrypt, and sign `content` into an envelope.
    pub fn encrypt(
        &self,
        content: &[u8],
        timestamp: &str,
        nonce: &str,
    ) -> Result<Envelope, EnvelopeError> {
        let framed = frame::wrap(content, self.app_id.as_bytes());
        let ciphertext = self.cipher.encrypt(&framed)?;
        let signature = sign(&self.token, timestamp, nonce, &ciphertext);
        Ok(Envelope {
            ciphertext,
            timestamp: timestamp.to_owned(),
            nonce: nonce.to_owned(),
            signature,
        })
    }

    /// Verify and decrypt an envelope, returning the framed content.
    ///
    /// The signature is recomputed and compared in constant time before any
    /// decryption happens; a mismatched envelope is rejected as
    /// unauthenticated.
    pub fn decrypt(&self, envelope: &Envelope) -> Result<Vec<u8>, EnvelopeError> {
        let expected = sign(
            &self.token,
            &envelope.timestamp,
            &envelope.nonce,
            &envelope.ciphertext,
        );
        if expected
            .as_bytes()
            .ct_eq(envelope.signature.as_bytes())
            .unwrap_u8()
            == 0
        {
            return Err(EnvelopeError::SignatureMismatch);
        }
        let framed = self.cipher.decrypt(&envelope.ciphertext)?;
        frame::unwrap(&framed, self.app_id.as_bytes())
    }
}
