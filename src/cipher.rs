//! AES message codecs with base64 at the edges.
//!
//! Two variants share one contract: CBC (encrypt + decrypt, 16- or 32-byte
//! keys) and a decrypt-only AES-256-ECB used for payment notification
//! payloads. Padding is PKCS#7, applied before the block mode runs.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::CryptoError;
use crate::pkcs7::{self, BLOCK_SIZE};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256EcbDec = ecb::Decryptor<aes::Aes256>;

/// IV length required by the CBC variant.
pub const IV_LENGTH: usize = 16;

/// AES-256 key length required by the ECB variant.
pub const ECB_KEY_LENGTH: usize = 32;

enum CbcKey {
    Aes128([u8; 16]),
    Aes256([u8; 32]),
}

/// AES-CBC codec over PKCS#7-padded plaintext.
///
/// The key selects the variant: 16 bytes for AES-128, 32 for AES-256.
/// Key and IV are validated once, at construction.
pub struct CbcCipher {
    key: CbcKey,
    iv: [u8; IV_LENGTH],
}

impl CbcCipher {
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        let key = match key.len() {
            16 => CbcKey::Aes128(
                <[u8; 16]>::try_from(key).map_err(|_| CryptoError::InvalidKeyLength(key.len()))?,
            ),
            32 => CbcKey::Aes256(
                <[u8; 32]>::try_from(key).map_err(|_| CryptoError::InvalidKeyLength(key.len()))?,
            ),
            other => return Err(CryptoError::InvalidKeyLength(other)),
        };
        let iv = <[u8; IV_LENGTH]>::try_from(iv).map_err(|_| CryptoError::InvalidIvLength {
            expected: IV_LENGTH,
            got: iv.len(),
        })?;
        Ok(Self { key, iv })
    }

    /// Pad, encrypt, and base64-encode `plaintext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let padded = pkcs7::pad(plaintext);
        let ciphertext = match &self.key {
            CbcKey::Aes128(key) => Aes128CbcEnc::new(key.into(), (&self.iv).into())
                .encrypt_padded_vec_mut::<NoPadding>(&padded),
            CbcKey::Aes256(key) => Aes256CbcEnc::new(key.into(), (&self.iv).into())
                .encrypt_padded_vec_mut::<NoPadding>(&padded),
        };
        Ok(STANDARD.encode(ciphertext))
    }

    /// Base64-decode, decrypt, and strip PKCS#7 padding.
    pub fn decrypt(&self, ciphertext: &str) -> Result<Vec<u8>, CryptoError> {
        let raw = decode_blocks(ciphertext)?;
        let padded = match &self.key {
            CbcKey::Aes128(key) => Aes128CbcDec::new(key.into(), (&self.iv).into())
                .decrypt_padded_vec_mut::<NoPadding>(&raw)
                .map_err(|_| CryptoError::CiphertextLength(raw.len()))?,
            CbcKey::Aes256(key) => Aes256CbcDec::new(key.into(), (&self.iv).into())
                .decrypt_padded_vec_mut::<NoPadding>(&raw)
                .map_err(|_| CryptoError::CiphertextLength(raw.len()))?,
        };
        pkcs7::unpad(&padded)
    }
}

/// Decrypt-only AES-256-ECB codec.
///
/// The platform only ever sends ECB material inbound (payment
/// notifications), so encryption is not part of the contract and fails
/// unconditionally.
pub struct EcbCipher {
    key: [u8; ECB_KEY_LENGTH],
}

impl EcbCipher {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let key = <[u8; ECB_KEY_LENGTH]>::try_from(key)
            .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
        Ok(Self { key })
    }

    /// Always fails: this variant is decrypt-only.
    pub fn encrypt(&self, _plaintext: &[u8]) -> Result<String, CryptoError> {
        Err(CryptoError::UnsupportedOperation("AES-256-ECB"))
    }

    /// Base64-decode, decrypt block-by-block, and strip PKCS#7 padding.
    pub fn decrypt(&self, ciphertext: &str) -> Result<Vec<u8>, CryptoError> {
        let raw = decode_blocks(ciphertext)?;
        let padded = Aes256EcbDec::new((&self.key).into())
            .decrypt_padded_vec_mut::<NoPadding>(&raw)
            .map_err(|_| CryptoError::CiphertextLength(raw.len()))?;
        pkcs7::unpad(&padded)
    }
}

fn decode_blocks(ciphertext: &str) -> Result<Vec<u8>, CryptoError> {
    let raw = STANDARD
        .decode(ciphertext)
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;
    if raw.is_empty() || raw.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::CiphertextLength(raw.len()));
    }
    Ok(raw)
}
