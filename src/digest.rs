//! Message digest and HMAC contexts.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::data::DataPointer;
use crate::error::{CryptoError, Result};
use crate::handle::{Handle, Resource};

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Looks an algorithm up by name, e.g. `"sha256"` or `"SHA-256"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "sha1" => Some(DigestAlgorithm::Sha1),
            "sha256" => Some(DigestAlgorithm::Sha256),
            "sha384" => Some(DigestAlgorithm::Sha384),
            "sha512" => Some(DigestAlgorithm::Sha512),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
        }
    }

    /// Output length in bytes.
    pub fn output_size(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }
}

/// A running digest computation.
#[derive(Clone)]
pub enum DigestCtx {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl DigestCtx {
    pub fn new(alg: DigestAlgorithm) -> Self {
        match alg {
            DigestAlgorithm::Sha1 => DigestCtx::Sha1(Sha1::new()),
            DigestAlgorithm::Sha256 => DigestCtx::Sha256(Sha256::new()),
            DigestAlgorithm::Sha384 => DigestCtx::Sha384(Sha384::new()),
            DigestAlgorithm::Sha512 => DigestCtx::Sha512(Sha512::new()),
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        match self {
            DigestCtx::Sha1(_) => DigestAlgorithm::Sha1,
            DigestCtx::Sha256(_) => DigestAlgorithm::Sha256,
            DigestCtx::Sha384(_) => DigestAlgorithm::Sha384,
            DigestCtx::Sha512(_) => DigestAlgorithm::Sha512,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            DigestCtx::Sha1(h) => Digest::update(h, data),
            DigestCtx::Sha256(h) => Digest::update(h, data),
            DigestCtx::Sha384(h) => Digest::update(h, data),
            DigestCtx::Sha512(h) => Digest::update(h, data),
        }
    }

    /// Returns the digest and resets the context for reuse.
    pub fn finalize(&mut self) -> DataPointer {
        let out = match self {
            DigestCtx::Sha1(h) => h.finalize_reset().to_vec(),
            DigestCtx::Sha256(h) => h.finalize_reset().to_vec(),
            DigestCtx::Sha384(h) => h.finalize_reset().to_vec(),
            DigestCtx::Sha512(h) => h.finalize_reset().to_vec(),
        };
        DataPointer::from(out)
    }
}

impl Resource for DigestCtx {
    const KIND: &'static str = "digest context";
}

pub type DigestCtxPointer = Handle<DigestCtx>;

/// A running HMAC computation.
#[derive(Clone)]
pub enum HmacCtx {
    Sha1(Hmac<Sha1>),
    Sha256(Hmac<Sha256>),
    Sha384(Hmac<Sha384>),
    Sha512(Hmac<Sha512>),
}

impl HmacCtx {
    pub fn new(alg: DigestAlgorithm, key: &[u8]) -> Result<Self> {
        let invalid = |e: hmac::digest::InvalidLength| CryptoError::InvalidInput(e.to_string());
        Ok(match alg {
            DigestAlgorithm::Sha1 => {
                HmacCtx::Sha1(<Hmac<Sha1> as Mac>::new_from_slice(key).map_err(invalid)?)
            }
            DigestAlgorithm::Sha256 => {
                HmacCtx::Sha256(<Hmac<Sha256> as Mac>::new_from_slice(key).map_err(invalid)?)
            }
            DigestAlgorithm::Sha384 => {
                HmacCtx::Sha384(<Hmac<Sha384> as Mac>::new_from_slice(key).map_err(invalid)?)
            }
            DigestAlgorithm::Sha512 => {
                HmacCtx::Sha512(<Hmac<Sha512> as Mac>::new_from_slice(key).map_err(invalid)?)
            }
        })
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            HmacCtx::Sha1(m) => m.update(data),
            HmacCtx::Sha256(m) => m.update(data),
            HmacCtx::Sha384(m) => m.update(data),
            HmacCtx::Sha512(m) => m.update(data),
        }
    }

    pub fn finalize(&mut self) -> DataPointer {
        let out = match self {
            HmacCtx::Sha1(m) => m.finalize_reset().into_bytes().to_vec(),
            HmacCtx::Sha256(m) => m.finalize_reset().into_bytes().to_vec(),
            HmacCtx::Sha384(m) => m.finalize_reset().into_bytes().to_vec(),
            HmacCtx::Sha512(m) => m.finalize_reset().into_bytes().to_vec(),
        };
        DataPointer::from(out)
    }
}

impl Resource for HmacCtx {
    const KIND: &'static str = "hmac context";
}

pub type HmacCtxPointer = Handle<HmacCtx>;
