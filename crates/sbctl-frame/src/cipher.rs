//! AES-256-CBC with the protocol's fixed key material.
//!
//! The key and IV are not secrets: they are constants shared by every device
//! running the firmware, so they live here rather than in configuration.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::error::{FrameError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Protocol key (256 bits).
pub const KEY: &[u8; 32] = b"T^&*J%^7tr~4^%^&I(o%^!jIJ__+a0 k";

/// Protocol initialization vector (128 bits).
pub const IV: &[u8; 16] = b"'%^Ur7gy$~t+f)%@";

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Encrypt `plaintext` with PKCS#7 padding.
///
/// The output length is always a non-zero multiple of [`BLOCK_SIZE`].
pub fn encrypt(plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(KEY.into(), IV.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt `ciphertext` and strip PKCS#7 padding.
pub fn decrypt(ciphertext: &[u8]) -> Result<Vec<u8>> {
    Aes256CbcDec::new(KEY.into(), IV.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| FrameError::Decrypt {
            len: ciphertext.len(),
        })
}

/// Ciphertext length produced for a plaintext of `len` bytes.
pub fn encrypted_len(len: usize) -> usize {
    (len / BLOCK_SIZE + 1) * BLOCK_SIZE
}
