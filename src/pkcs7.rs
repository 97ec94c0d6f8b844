//! PKCS#7 block padding.
//!
//! Every pad byte equals the number of pad bytes added. A plaintext that
//! is already block-aligned gains a full block of padding, so `pad` always
//! adds between 1 and [`BLOCK_SIZE`] bytes.

use crate::error::CryptoError;

/// AES block size in bytes, shared by every supported variant.
pub const BLOCK_SIZE: usize = 16;

/// Pad `data` to a multiple of [`BLOCK_SIZE`].
pub fn pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);
    padded
}

/// Strip PKCS#7 padding.
///
/// Returns `Err` if the final byte is outside `[1, BLOCK_SIZE]`, claims
/// more bytes than are present, or the pad bytes are not all equal.
pub fn unpad(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let Some(&last) = data.last() else {
        return Err(CryptoError::Padding);
    };
    let pad_len = last as usize;
    if pad_len == 0 || pad_len > BLOCK_SIZE || pad_len > data.len() {
        return Err(CryptoError::Padding);
    }
    let (rest, padding) = data.split_at(data.len() - pad_len);
    if padding.iter().any(|&b| b != last) {
        return Err(CryptoError::Padding);
    }
    Ok(rest.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_unpad_round_trip() {
        for len in 0..4 * BLOCK_SIZE {
            let data = vec![0xAB; len];
            let padded = pad(&data);
            assert_eq!(unpad(&padded).unwrap(), data, "length {len}");
        }
    }

    #[test]
    fn pad_adds_between_one_and_block_size() {
        for len in 0..4 * BLOCK_SIZE {
            let data = vec![0; len];
            let padded = pad(&data);
            let added = padded.len() - len;
            assert!((1..=BLOCK_SIZE).contains(&added), "length {len} added {added}");
            assert_eq!(padded.len() % BLOCK_SIZE, 0);
        }
    }

    #[test]
    fn aligned_input_gains_full_block() {
        let data = vec![7; BLOCK_SIZE];
        let padded = pad(&data);
        assert_eq!(padded.len(), 2 * BLOCK_SIZE);
        assert_eq!(padded[BLOCK_SIZE..], [BLOCK_SIZE as u8; BLOCK_SIZE]);
    }

    #[test]
    fn empty_input_pads_to_one_block() {
        let padded = pad(b"");
        assert_eq!(padded, [BLOCK_SIZE as u8; BLOCK_SIZE]);
        assert!(unpad(&padded).unwrap().is_empty());
    }

    #[test]
    fn rejects_empty_buffer() {
        assert!(matches!(unpad(b""), Err(CryptoError::Padding)));
    }

    #[test]
    fn rejects_zero_pad_byte() {
        let mut padded = pad(b"abc");
        let last = padded.len() - 1;
        padded[last] = 0;
        assert!(matches!(unpad(&padded), Err(CryptoError::Padding)));
    }

    #[test]
    fn rejects_pad_byte_beyond_block_size() {
        let mut padded = pad(b"abc");
        let last = padded.len() - 1;
        padded[last] = BLOCK_SIZE as u8 + 1;
        assert!(matches!(unpad(&padded), Err(CryptoError::Padding)));
    }

    #[test]
    fn rejects_pad_byte_beyond_data() {
        // A single block claiming more padding than bytes available.
        let mut buf = vec![0u8; 4];
        buf[3] = 9;
        assert!(matches!(unpad(&buf), Err(CryptoError::Padding)));
    }

    #[test]
    fn rejects_inconsistent_pad_bytes() {
        let mut padded = pad(b"abc");
        let n = padded.len();
        padded[n - 2] ^= 0x01;
        assert!(matches!(unpad(&padded), Err(CryptoError::Padding)));
    }
}
