//! Authenticated cipher contexts.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, KeyInit, Nonce};

use crate::data::DataPointer;
use crate::error::{CryptoError, Reason, Result};
use crate::handle::{Handle, Resource};

/// Supported cipher algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherAlgorithm {
    Aes128Gcm,
    Aes256Gcm,
}

impl CipherAlgorithm {
    /// Looks an algorithm up by name, e.g. `"aes-256-gcm"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "aes-128-gcm" | "id-aes128-gcm" => Some(CipherAlgorithm::Aes128Gcm),
            "aes-256-gcm" | "id-aes256-gcm" => Some(CipherAlgorithm::Aes256Gcm),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CipherAlgorithm::Aes128Gcm => "aes-128-gcm",
            CipherAlgorithm::Aes256Gcm => "aes-256-gcm",
        }
    }

    pub fn key_length(self) -> usize {
        match self {
            CipherAlgorithm::Aes128Gcm => 16,
            CipherAlgorithm::Aes256Gcm => 32,
        }
    }

    pub fn nonce_length(self) -> usize {
        12
    }

    pub fn tag_length(self) -> usize {
        16
    }
}

/// A keyed cipher ready to seal and open messages.
#[derive(Clone)]
pub enum CipherCtx {
    Aes128Gcm(Aes128Gcm),
    Aes256Gcm(Aes256Gcm),
}

impl CipherCtx {
    /// Keys a new context. The key must be exactly the algorithm's key length.
    pub fn new(alg: CipherAlgorithm, key: &[u8]) -> Result<Self> {
        let invalid = |_| {
            CryptoError::InvalidInput(format!(
                "{} needs a {}-byte key, got {}",
                alg.name(),
                alg.key_length(),
                key.len()
            ))
        };
        Ok(match alg {
            CipherAlgorithm::Aes128Gcm => {
                CipherCtx::Aes128Gcm(Aes128Gcm::new_from_slice(key).map_err(invalid)?)
            }
            CipherAlgorithm::Aes256Gcm => {
                CipherCtx::Aes256Gcm(Aes256Gcm::new_from_slice(key).map_err(invalid)?)
            }
        })
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        match self {
            CipherCtx::Aes128Gcm(_) => CipherAlgorithm::Aes128Gcm,
            CipherCtx::Aes256Gcm(_) => CipherAlgorithm::Aes256Gcm,
        }
    }

    /// Encrypts `plaintext`, authenticating `aad` alongside it. The output is
    /// the ciphertext followed by the tag.
    pub fn seal(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<DataPointer> {
        let nonce = self.nonce(nonce)?;
        let payload = Payload {
            msg: plaintext,
            aad,
        };
        let sealed = match self {
            CipherCtx::Aes128Gcm(c) => c.encrypt(nonce, payload),
            CipherCtx::Aes256Gcm(c) => c.encrypt(nonce, payload),
        }
        .map_err(|_| CryptoError::EncodingError("cipher rejected the message".to_string()))?;
        Ok(DataPointer::from(sealed))
    }

    /// Decrypts and authenticates ciphertext-plus-tag. A tag mismatch is
    /// `bad decrypt`.
    pub fn open(&self, nonce: &[u8], aad: &[u8], sealed: &[u8]) -> Result<DataPointer> {
        let nonce = self.nonce(nonce)?;
        let payload = Payload { msg: sealed, aad };
        let opened = match self {
            CipherCtx::Aes128Gcm(c) => c.decrypt(nonce, payload),
            CipherCtx::Aes256Gcm(c) => c.decrypt(nonce, payload),
        }
        .map_err(|_| CryptoError::Toolkit(Reason::EVP_BAD_DECRYPT.error_code()))?;
        Ok(DataPointer::from(opened))
    }

    fn nonce<'n>(&self, nonce: &'n [u8]) -> Result<&'n Nonce<aes_gcm::aead::consts::U12>> {
        let expected = self.algorithm().nonce_length();
        if nonce.len() != expected {
            return Err(CryptoError::InvalidInput(format!(
                "nonce must be {expected} bytes, got {}",
                nonce.len()
            )));
        }
        Ok(Nonce::from_slice(nonce))
    }
}

impl Resource for CipherCtx {
    const KIND: &'static str = "cipher context";
}

pub type CipherCtxPointer = Handle<CipherCtx>;

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn aes128_gcm_empty_message() {
        // NIST GCM test case 1: zero key, zero nonce, no data.
        let ctx = CipherCtx::new(CipherAlgorithm::Aes128Gcm, &[0u8; 16]).unwrap();
        let sealed = ctx.seal(&[0u8; 12], b"", b"").unwrap();
        assert_eq!(hex(sealed.as_slice()), "58e2fccefa7e3061367f1d57a4e7455a");
    }

    #[test]
    fn seal_then_open() {
        let ctx = CipherCtx::new(CipherAlgorithm::Aes256Gcm, &[7u8; 32]).unwrap();
        let sealed = ctx.seal(&[1u8; 12], b"header", b"attack at dawn").unwrap();
        assert_eq!(sealed.len(), 14 + CipherAlgorithm::Aes256Gcm.tag_length());
        let opened = ctx.open(&[1u8; 12], b"header", sealed.as_slice()).unwrap();
        assert_eq!(opened.as_slice(), b"attack at dawn");
    }

    #[test]
    fn tampering_is_bad_decrypt() {
        let ctx = CipherCtx::new(CipherAlgorithm::Aes128Gcm, &[3u8; 16]).unwrap();
        let mut sealed = ctx.seal(&[0u8; 12], b"", b"payload").unwrap().to_vec();
        sealed[0] ^= 1;
        assert_eq!(
            ctx.open(&[0u8; 12], b"", &sealed).unwrap_err(),
            CryptoError::Toolkit(Reason::EVP_BAD_DECRYPT.error_code())
        );
        assert!(ctx.open(&[0u8; 12], b"other", &sealed).is_err());
    }

    #[test]
    fn lengths_are_checked() {
        assert!(CipherCtx::new(CipherAlgorithm::Aes256Gcm, &[0u8; 16]).is_err());
        let ctx = CipherCtx::new(CipherAlgorithm::Aes128Gcm, &[0u8; 16]).unwrap();
        assert!(matches!(
            ctx.seal(&[0u8; 8], b"", b"x"),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn names() {
        assert_eq!(
            CipherAlgorithm::from_name("AES-256-GCM"),
            Some(CipherAlgorithm::Aes256Gcm)
        );
        assert_eq!(CipherAlgorithm::from_name("des-cbc"), None);
    }
}
