//! # cryptoguard - Safe Handles Over a Pure Rust Crypto Toolkit
//!
//! cryptoguard puts a resource-safety layer over the rustcrypto stack. Every
//! toolkit object (big integers, certificates, keys, EC groups and points,
//! cipher and digest contexts, engines) is owned by exactly one wrapper and
//! released exactly once. Failures are recorded in a per-thread error queue
//! that callers scope with guards instead of clearing by hand.
//!
//! ## Key Features
//!
//! - **Single ownership**: wrappers move, never copy, and free on drop
//! - **Scoped error queue**: clear-on-return and mark-pop-on-return guards
//! - **Fixed-width bignums**: big-endian encoding padded to an exact width
//! - **Identity matching**: hostname, email and IP checks against X.509
//!   certificates with `X509_check_host` wildcard rules
//! - **Injection-safe printing**: alternative names are quoted when they could
//!   be mistaken for list syntax
//!
//! ## Quick Start
//!
//! ### Encoding a Bignum to a Fixed Width
//!
//! ```rust
//! use cryptoguard::{bignum::BignumPointer, error::CryptoError};
//!
//! # fn main() -> Result<(), CryptoError> {
//! let mut bn = BignumPointer::new();
//! bn.set_word(0x1234)?;
//!
//! let padded = bn.encode_padded(4)?;
//! assert_eq!(padded.as_slice(), &[0x00, 0x00, 0x12, 0x34]);
//!
//! // Too narrow is an error, never a truncation.
//! assert!(matches!(
//!     bn.encode_padded(1),
//!     Err(CryptoError::BignumTooLong { required: 2, width: 1 })
//! ));
//! # Ok(())
//! # }
//! ```
//!
//! ### Checking a Certificate's Hostname
//!
//! ```rust,no_run
//! use cryptoguard::{
//!     cert::{CheckFlag, CheckMatch, X509Pointer},
//!     data::DataPointer,
//! };
//!
//! # fn main() {
//! let pem = std::fs::read("server.pem").unwrap();
//! let cert = X509Pointer::parse(pem.as_slice().into()).unwrap();
//!
//! let mut peer = DataPointer::null();
//! match cert
//!     .view()
//!     .check_host("www.example.com", CheckFlag::NoPartialWildcards.into(), Some(&mut peer))
//! {
//!     CheckMatch::Match => println!("matched {}", String::from_utf8_lossy(peer.as_slice())),
//!     CheckMatch::NoMatch => println!("wrong host"),
//!     CheckMatch::InvalidName => println!("not a hostname"),
//!     CheckMatch::OperationFailed => println!("certificate could not be examined"),
//! }
//! # }
//! ```
//!
//! ### Scoping the Error Queue
//!
//! ```rust
//! use cryptoguard::{
//!     error::Reason,
//!     error_stack::{self, CryptoErrorList, MarkPopErrorOnReturn},
//! };
//!
//! error_stack::put_error(Reason::PEM_NO_START_LINE);
//!
//! let mut errors = CryptoErrorList::new();
//! {
//!     let _scope = MarkPopErrorOnReturn::new(Some(&mut errors));
//!     error_stack::put_error(Reason::ASN1_DECODE_ERROR);
//! }
//!
//! // The scope saw both records but removed only its own.
//! assert_eq!(errors.len(), 2);
//! assert_eq!(error_stack::error_depth(), 1);
//! ```
//!
//! ## Module Organization
//!
//! - [`handle`]: The generic owning wrapper every resource kind uses
//! - [`error_stack`]: The per-thread error queue and its scope guards
//! - [`bignum`]: Big integers and their fixed-width codec
//! - [`cert`]: Certificate parsing, field extraction and identity checks
//! - [`key`]: Key loading, passphrase callbacks, signature checks and EC handles
//! - [`digest`], [`cipher`]: Hash, HMAC and AEAD cipher contexts
//! - [`engine`], [`fips`], [`rand`]: Engines, FIPS status and the OS CSPRNG
//! - [`error`]: Error types and packed toolkit error codes

use std::sync::{Arc, Once};

pub mod bignum;
pub mod cert;
pub mod cipher;
pub mod data;
pub mod digest;
pub mod engine;
pub mod error;
pub mod error_stack;
pub mod fips;
pub mod handle;
pub mod key;
pub mod rand;

use engine::Engine;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: &str = env!("CARGO_PKG_VERSION_MAJOR");
pub const VERSION_MINOR: &str = env!("CARGO_PKG_VERSION_MINOR");
pub const VERSION_REVISION: &str = env!("CARGO_PKG_VERSION_PATCH");

/// Process-wide settings applied by [`init_with`].
#[derive(bon::Builder)]
pub struct InitOptions {
    /// Records each thread's error queue holds before evicting the oldest.
    #[builder(default = error_stack::DEFAULT_QUEUE_CAPACITY)]
    pub error_queue_capacity: usize,
    /// Engines to register.
    #[builder(default)]
    pub engines: Vec<Arc<dyn Engine>>,
}

impl Default for InitOptions {
    fn default() -> Self {
        InitOptions::builder().build()
    }
}

static INIT: Once = Once::new();

/// One-time library initialization with default options.
pub fn init() {
    init_with(InitOptions::default());
}

/// One-time library initialization. Only the first call has any effect.
pub fn init_with(options: InitOptions) {
    INIT.call_once(|| {
        error_stack::set_queue_capacity(options.error_queue_capacity);
        let engines = options.engines.len();
        engine::init_engines_once(options.engines);
        tracing::debug!(
            version = VERSION,
            error_queue_capacity = options.error_queue_capacity,
            engines,
            "cryptoguard initialized"
        );
    });
}

pub fn is_initialized() -> bool {
    INIT.is_completed()
}
