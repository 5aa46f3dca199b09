//! use cryptoguard::error::CryptoError;

use std::fmt;

use thiserror::Error;

/// Represents errors that can occur in the cryptoguard library.
///
/// Failures reported by the toolkit itself travel as [`ErrorCode`] through the
/// per-thread error queue; everything else is described here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// An operation needed a resource but the wrapper owns nothing.
    #[error("{0} handle is empty")]
    EmptyHandle(&'static str),

    /// The minimal big-endian encoding does not fit the requested width.
    #[error("bignum needs {required} bytes but the requested width is {width}")]
    BignumTooLong { required: usize, width: usize },

    /// The caller's output region is smaller than the requested width.
    #[error("output buffer holds {available} bytes but {required} are needed")]
    BufferTooSmall { required: usize, available: usize },

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// A certificate extension is present but cannot be decoded.
    #[error("malformed {0} extension")]
    MalformedExtension(&'static str),

    /// The key or signature algorithm is not handled.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A failure recorded in the toolkit error queue.
    #[error("{0}")]
    Toolkit(ErrorCode),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

impl From<der::Error> for CryptoError {
    /// Converts a `der::Error` into a `CryptoError`.
    fn from(err: der::Error) -> Self {
        CryptoError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::Error> for CryptoError {
    fn from(err: pkcs8::Error) -> Self {
        CryptoError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CryptoError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CryptoError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for CryptoError {
    fn from(err: rsa::Error) -> Self {
        CryptoError::InvalidInput(err.to_string())
    }
}

impl From<ErrorCode> for CryptoError {
    fn from(code: ErrorCode) -> Self {
        CryptoError::Toolkit(code)
    }
}

/// Subsystems that push records into the error queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Library {
    Bn = 3,
    Rsa = 4,
    Evp = 6,
    Pem = 9,
    X509 = 11,
    Asn1 = 13,
    Crypto = 15,
    Ec = 16,
    X509v3 = 34,
    Rand = 36,
    Engine = 38,
    Prov = 57,
    User = 128,
}

impl Library {
    pub const fn name(self) -> &'static str {
        match self {
            Library::Bn => "bignum routines",
            Library::Rsa => "rsa routines",
            Library::Evp => "digital envelope routines",
            Library::Pem => "PEM routines",
            Library::X509 => "x509 certificate routines",
            Library::Asn1 => "asn1 encoding routines",
            Library::Crypto => "common libcrypto routines",
            Library::Ec => "elliptic curve routines",
            Library::X509v3 => "X509 V3 routines",
            Library::Rand => "random number generator",
            Library::Engine => "engine routines",
            Library::Prov => "Provider routines",
            Library::User => "user library",
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        ALL_LIBRARIES.iter().copied().find(|lib| *lib as u8 == code)
    }
}

const ALL_LIBRARIES: [Library; 13] = [
    Library::Bn,
    Library::Rsa,
    Library::Evp,
    Library::Pem,
    Library::X509,
    Library::Asn1,
    Library::Crypto,
    Library::Ec,
    Library::X509v3,
    Library::Rand,
    Library::Engine,
    Library::Prov,
    Library::User,
];

/// A reason a toolkit operation failed, scoped to its library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reason {
    pub library: Library,
    pub code: u32,
    pub text: &'static str,
}

impl Reason {
    const fn new(library: Library, code: u32, text: &'static str) -> Self {
        Self {
            library,
            code,
            text,
        }
    }

    pub const BIGNUM_TOO_LONG: Reason = Reason::new(Library::Bn, 114, "bignum too long");
    pub const PEM_NO_START_LINE: Reason = Reason::new(Library::Pem, 108, "no start line");
    pub const PEM_BAD_PASSWORD_READ: Reason = Reason::new(Library::Pem, 104, "bad password read");
    pub const EVP_BAD_DECRYPT: Reason = Reason::new(Library::Evp, 100, "bad decrypt");
    pub const EVP_UNSUPPORTED_ALGORITHM: Reason =
        Reason::new(Library::Evp, 156, "unsupported algorithm");
    pub const EVP_DECODE_ERROR: Reason = Reason::new(Library::Evp, 114, "decode error");
    pub const ASN1_DECODE_ERROR: Reason = Reason::new(Library::Asn1, 198, "decode error");
    pub const ASN1_ENCODE_ERROR: Reason = Reason::new(Library::Asn1, 112, "encode error");
    pub const X509V3_EXTENSION_DECODE: Reason =
        Reason::new(Library::X509v3, 148, "error in extension");
    pub const X509_KEY_VALUES_MISMATCH: Reason =
        Reason::new(Library::X509, 116, "key values mismatch");
    pub const ENGINE_NO_SUCH_ENGINE: Reason = Reason::new(Library::Engine, 116, "no such engine");
    pub const ENGINE_INIT_FAILED: Reason = Reason::new(Library::Engine, 109, "init failed");
    pub const ENGINE_FAILED_LOADING_PRIVATE_KEY: Reason =
        Reason::new(Library::Engine, 128, "failed loading private key");
    pub const ENGINE_SET_DEFAULT_FAILED: Reason =
        Reason::new(Library::Engine, 137, "engine is not in the list");
    pub const CRYPTO_FIPS_MODE_NOT_SUPPORTED: Reason =
        Reason::new(Library::Crypto, 115, "fips mode not supported");
    pub const RAND_ERROR_RETRIEVING_ENTROPY: Reason =
        Reason::new(Library::Rand, 128, "error retrieving entropy");
    pub const CRYPTO_PASSED_NULL_PARAMETER: Reason =
        Reason::new(Library::Crypto, 262, "passed a null parameter");

    const KNOWN: [Reason; 17] = [
        Reason::BIGNUM_TOO_LONG,
        Reason::PEM_NO_START_LINE,
        Reason::PEM_BAD_PASSWORD_READ,
        Reason::EVP_BAD_DECRYPT,
        Reason::EVP_UNSUPPORTED_ALGORITHM,
        Reason::EVP_DECODE_ERROR,
        Reason::ASN1_DECODE_ERROR,
        Reason::ASN1_ENCODE_ERROR,
        Reason::X509V3_EXTENSION_DECODE,
        Reason::X509_KEY_VALUES_MISMATCH,
        Reason::ENGINE_NO_SUCH_ENGINE,
        Reason::ENGINE_INIT_FAILED,
        Reason::ENGINE_FAILED_LOADING_PRIVATE_KEY,
        Reason::ENGINE_SET_DEFAULT_FAILED,
        Reason::CRYPTO_FIPS_MODE_NOT_SUPPORTED,
        Reason::RAND_ERROR_RETRIEVING_ENTROPY,
        Reason::CRYPTO_PASSED_NULL_PARAMETER,
    ];

    /// The packed code for this reason.
    pub const fn error_code(self) -> ErrorCode {
        ErrorCode::pack(self.library as u8, self.code)
    }
}

/// A packed toolkit error code: library in bits 23..31, reason in bits 0..23.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(u32);

impl ErrorCode {
    const REASON_MASK: u32 = 0x7F_FFFF;
    const LIB_SHIFT: u32 = 23;

    pub const fn pack(library: u8, reason: u32) -> Self {
        ErrorCode(((library as u32) << Self::LIB_SHIFT) | (reason & Self::REASON_MASK))
    }

    pub const fn from_raw(raw: u32) -> Self {
        ErrorCode(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn library_code(self) -> u8 {
        (self.0 >> Self::LIB_SHIFT) as u8
    }

    pub const fn reason_code(self) -> u32 {
        self.0 & Self::REASON_MASK
    }

    pub fn library(self) -> Option<Library> {
        Library::from_code(self.library_code())
    }

    pub fn reason(self) -> Option<Reason> {
        Reason::KNOWN
            .iter()
            .copied()
            .find(|r| r.error_code() == self)
    }
}

impl From<Reason> for ErrorCode {
    fn from(reason: Reason) -> Self {
        reason.error_code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lib = match self.library() {
            Some(lib) => lib.name().to_string(),
            None => format!("lib({})", self.library_code()),
        };
        let reason = match self.reason() {
            Some(r) => r.text.to_string(),
            None => format!("reason({})", self.reason_code()),
        };
        write!(f, "error:{:08X}:{}::{}", self.0, lib, reason)
    }
}
