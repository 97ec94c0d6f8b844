//! Message-integrity framing inside the encrypted payload.
//!
//! Layout: `[16 bytes: random][4 bytes: u32 BE content length][content][identity]`
//!
//! The random prefix is discarded on decode; the identity suffix carries no
//! length prefix and consumes the remainder of the buffer.

use crate::error::EnvelopeError;

const RANDOM_LENGTH: usize = 16;
const LENGTH_PREFIX_SIZE: usize = 4;
const HEADER_SIZE: usize = RANDOM_LENGTH + LENGTH_PREFIX_SIZE;

const RANDOM_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

fn random_prefix() -> [u8; RANDOM_LENGTH] {
    let mut raw = [0u8; RANDOM_LENGTH];
    getrandom::getrandom(&mut raw).expect("getrandom failed");
    let mut prefix = [0u8; RANDOM_LENGTH];
    for (dst, byte) in prefix.iter_mut().zip(raw) {
        *dst = RANDOM_CHARSET[byte as usize % RANDOM_CHARSET.len()];
    }
    prefix
}

/// Frame `content` for encryption: random prefix, length, content, identity.
pub fn wrap(content: &[u8], identity: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_SIZE + content.len() + identity.len());
    frame.extend_from_slice(&random_prefix());
    frame.extend_from_slice(&(content.len() as u32).to_be_bytes());
    frame.extend_from_slice(content);
    frame.extend_from_slice(identity);
    frame
}

/// Validate and strip framing from a decrypted buffer.
///
/// The trailing identity is compared byte-for-byte against
/// `expected_identity`.
pub fn unwrap(frame: &[u8], expected_identity: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    if frame.len() < HEADER_SIZE {
        return Err(EnvelopeError::FrameTruncated {
            needed: HEADER_SIZE,
            got: frame.len(),
        });
    }
    let length_bytes: [u8; LENGTH_PREFIX_SIZE] = frame[RANDOM_LENGTH..HEADER_SIZE]
        .try_into()
        .expect("4 bytes");
    let content_length = u32::from_be_bytes(length_bytes) as usize;

    let needed = HEADER_SIZE + content_length;
    if frame.len() < needed {
        return Err(EnvelopeError::FrameTruncated {
            needed,
            got: frame.len(),
        });
    }

    let content = &frame[HEADER_SIZE..needed];
    let identity = &frame[needed..];
    if identity != expected_identity {
        return Err(EnvelopeError::IdentityMismatch);
    }
    Ok(content.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_unwrap_round_trip() {
        let frame = wrap(b"payload", b"app-1");
        assert_eq!(unwrap(&frame, b"app-1").unwrap(), b"payload");
    }

    #[test]
    fn layout() {
        let frame = wrap(b"abc", b"app-1");
        assert_eq!(frame.len(), 16 + 4 + 3 + 5);
        // u32 BE length at offset 16
        assert_eq!(&frame[16..20], &[0, 0, 0, 3]);
        assert_eq!(&frame[20..23], b"abc");
        assert_eq!(&frame[23..], b"app-1");
    }

    #[test]
    fn random_prefix_is_printable() {
        let frame = wrap(b"", b"");
        assert!(frame[..16].iter().all(u8::is_ascii_alphanumeric));
    }

    #[test]
    fn random_prefix_differs_between_frames() {
        let a = wrap(b"same", b"id");
        let b = wrap(b"same", b"id");
        assert_ne!(a[..16], b[..16]);
    }

    #[test]
    fn empty_content() {
        let frame = wrap(b"", b"app-1");
        assert!(unwrap(&frame, b"app-1").unwrap().is_empty());
    }

    #[test]
    fn empty_identity() {
        let frame = wrap(b"data", b"");
        assert_eq!(unwrap(&frame, b"").unwrap(), b"data");
    }

    #[test]
    fn identity_mismatch() {
        let frame = wrap(b"payload", b"A");
        assert!(matches!(
            unwrap(&frame, b"B"),
            Err(EnvelopeError::IdentityMismatch)
        ));
    }

    #[test]
    fn identity_comparison_is_case_sensitive() {
        let frame = wrap(b"payload", b"App");
        assert!(matches!(
            unwrap(&frame, b"app"),
            Err(EnvelopeError::IdentityMismatch)
        ));
    }

    #[test]
    fn truncated_header() {
        assert!(matches!(
            unwrap(&[0u8; 10], b"app"),
            Err(EnvelopeError::FrameTruncated { needed: 20, got: 10 })
        ));
    }

    #[test]
    fn truncated_content() {
        let mut frame = wrap(b"payload", b"app-1");
        // Claim more content than the buffer holds.
        frame[16..20].copy_from_slice(&1000u32.to_be_bytes());
        assert!(matches!(
            unwrap(&frame, b"app-1"),
            Err(EnvelopeError::FrameTruncated { needed: 1020, .. })
        ));
    }

    #[test]
    fn extra_identity_bytes_do_not_match() {
        let frame = wrap(b"payload", b"app-1x");
        assert!(matches!(
            unwrap(&frame, b"app-1"),
            Err(EnvelopeError::IdentityMismatch)
        ));
    }
}
