//! Public and private keys, and private-key parsing with passphrase prompts.

pub mod ec;
pub mod password;

use std::fmt;

use const_oid::ObjectIdentifier;
use const_oid::db::{rfc5912, rfc8410};
use der::Decode;
use ecdsa::signature::Verifier;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::bignum::{Bignum, BignumPointer};
use crate::data::Buffer;
use crate::error::{CryptoError, ErrorCode, Reason, Result};
use crate::error_stack::{MarkPopErrorOnReturn, put_error};
use crate::handle::{Handle, Resource};

pub use password::{
    PASSPHRASE_CAPACITY, PasswordCallback, no_password_callback, password_callback,
};

/// The algorithm family of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
    EcdsaP256,
    EcdsaP384,
    EcdsaP521,
    Ed25519,
}

/// A public key.
#[derive(Clone, PartialEq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(p256::PublicKey),
    EcdsaP384(p384::PublicKey),
    EcdsaP521(p521::PublicKey),
    Ed25519(ed25519_dalek::VerifyingKey),
}

/// A private key. The public half can always be derived.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(Box<RsaPrivateKey>),
    EcdsaP256(p256::SecretKey),
    EcdsaP384(p384::SecretKey),
    EcdsaP521(p521::SecretKey),
    Ed25519(ed25519_dalek::SigningKey),
}

/// Either half of a key pair, as owned by a [`KeyPointer`].
#[derive(Clone)]
pub enum Key {
    Public(PublicKey),
    Private(PrivateKey),
}

impl Resource for Key {
    const KIND: &'static str = "key";
}

pub type KeyPointer = Handle<Key>;

impl PublicKey {
    /// Decodes a DER `SubjectPublicKeyInfo`, dispatching on its algorithm.
    ///
    /// # Arguments
    /// * `der` - The DER-encoded SubjectPublicKeyInfo.
    ///
    /// # Returns
    /// The decoded key, or `UnsupportedAlgorithm` for unknown algorithms and curves.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let spki = pkcs8::spki::SubjectPublicKeyInfoRef::from_der(der)?;
        match spki.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => Ok(PublicKey::Rsa(RsaPublicKey::from_public_key_der(der)?)),
            rfc5912::ID_EC_PUBLIC_KEY => match spki.algorithm.parameters_oid()? {
                rfc5912::SECP_256_R_1 => Ok(PublicKey::EcdsaP256(
                    p256::PublicKey::from_public_key_der(der)?,
                )),
                rfc5912::SECP_384_R_1 => Ok(PublicKey::EcdsaP384(
                    p384::PublicKey::from_public_key_der(der)?,
                )),
                rfc5912::SECP_521_R_1 => Ok(PublicKey::EcdsaP521(
                    p521::PublicKey::from_public_key_der(der)?,
                )),
                curve => Err(CryptoError::UnsupportedAlgorithm(format!("curve {curve}"))),
            },
            rfc8410::ID_ED_25519 => Ok(PublicKey::Ed25519(
                ed25519_dalek::VerifyingKey::from_public_key_der(der)?,
            )),
            oid => Err(CryptoError::UnsupportedAlgorithm(oid.to_string())),
        }
    }

    /// Encodes the key as a DER `SubjectPublicKeyInfo`.
    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        let doc = match self {
            PublicKey::Rsa(k) => k.to_public_key_der(),
            PublicKey::EcdsaP256(k) => k.to_public_key_der(),
            PublicKey::EcdsaP384(k) => k.to_public_key_der(),
            PublicKey::EcdsaP521(k) => k.to_public_key_der(),
            PublicKey::Ed25519(k) => k.to_public_key_der(),
        }
        .map_err(|e| CryptoError::EncodingError(e.to_string()))?;
        Ok(doc.into_vec())
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            PublicKey::Rsa(_) => KeyType::Rsa,
            PublicKey::EcdsaP256(_) => KeyType::EcdsaP256,
            PublicKey::EcdsaP384(_) => KeyType::EcdsaP384,
            PublicKey::EcdsaP521(_) => KeyType::EcdsaP521,
            PublicKey::Ed25519(_) => KeyType::Ed25519,
        }
    }

    /// Verifies `signature` over `message` for the signature algorithm `alg`.
    ///
    /// Supported pairings are RSA PKCS#1 v1.5 with SHA-256/384/512, ECDSA
    /// P-256 with SHA-256, ECDSA P-384 with SHA-384, and Ed25519. Anything
    /// else does not verify.
    pub fn verify(&self, alg: ObjectIdentifier, message: &[u8], signature: &[u8]) -> bool {
        match (self, alg) {
            (PublicKey::Rsa(k), rfc5912::SHA_256_WITH_RSA_ENCRYPTION) => {
                verify_rsa::<sha2::Sha256>(k, message, signature)
            }
            (PublicKey::Rsa(k), rfc5912::SHA_384_WITH_RSA_ENCRYPTION) => {
                verify_rsa::<sha2::Sha384>(k, message, signature)
            }
            (PublicKey::Rsa(k), rfc5912::SHA_512_WITH_RSA_ENCRYPTION) => {
                verify_rsa::<sha2::Sha512>(k, message, signature)
            }
            (PublicKey::EcdsaP256(k), rfc5912::ECDSA_WITH_SHA_256) => {
                let Ok(sig) = p256::ecdsa::Signature::from_der(signature) else {
                    return false;
                };
                p256::ecdsa::VerifyingKey::from(k)
                    .verify(message, &sig)
                    .is_ok()
            }
            (PublicKey::EcdsaP384(k), rfc5912::ECDSA_WITH_SHA_384) => {
                let Ok(sig) = p384::ecdsa::Signature::from_der(signature) else {
                    return false;
                };
                p384::ecdsa::VerifyingKey::from(k)
                    .verify(message, &sig)
                    .is_ok()
            }
            (PublicKey::Ed25519(k), rfc8410::ID_ED_25519) => {
                let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                    return false;
                };
                k.verify(message, &sig).is_ok()
            }
            _ => false,
        }
    }
}

fn verify_rsa<D>(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool
where
    D: sha2::Digest + const_oid::AssociatedOid,
{
    let Ok(sig) = rsa::pkcs1v15::Signature::try_from(signature) else {
        return false;
    };
    rsa::pkcs1v15::VerifyingKey::<D>::new(key.clone())
        .verify(message, &sig)
        .is_ok()
}

impl PrivateKey {
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Rsa(k) => PublicKey::Rsa(k.to_public_key()),
            PrivateKey::EcdsaP256(k) => PublicKey::EcdsaP256(k.public_key()),
            PrivateKey::EcdsaP384(k) => PublicKey::EcdsaP384(k.public_key()),
            PrivateKey::EcdsaP521(k) => PublicKey::EcdsaP521(k.public_key()),
            PrivateKey::Ed25519(k) => PublicKey::Ed25519(k.verifying_key()),
        }
    }
}

impl Key {
    pub fn public_key(&self) -> PublicKey {
        match self {
            Key::Public(k) => k.clone(),
            Key::Private(k) => k.public_key(),
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, Key::Private(_))
    }

    pub fn key_type(&self) -> KeyType {
        self.public_key().key_type()
    }

    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        self.public_key().to_spki_der()
    }

    /// The RSA modulus, for RSA keys.
    pub fn rsa_modulus(&self) -> Option<BignumPointer> {
        match self.public_key() {
            PublicKey::Rsa(k) => Some(BignumPointer::from(Bignum::from(k.n().clone()))),
            _ => None,
        }
    }
}

impl From<PublicKey> for Key {
    fn from(key: PublicKey) -> Self {
        Key::Public(key)
    }
}

impl From<PrivateKey> for Key {
    fn from(key: PrivateKey) -> Self {
        Key::Private(key)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({:?})", self.key_type())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({:?})", self.public_key().key_type())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Public(k) => k.fmt(f),
            Key::Private(k) => k.fmt(f),
        }
    }
}

/// Parses a private key from PEM or DER, asking `callback` for a passphrase
/// when the key is encrypted.
///
/// Accepted forms are PEM `PRIVATE KEY`, `ENCRYPTED PRIVATE KEY` and
/// `RSA PRIVATE KEY`, and their DER equivalents. Errors pushed while parsing
/// are popped before returning; the code of the failure is returned instead.
pub fn parse_private_key<U>(
    input: Buffer<'_, u8>,
    callback: PasswordCallback<U>,
    user: Option<&U>,
) -> std::result::Result<KeyPointer, ErrorCode> {
    parse_private_key_with(input, |buf, rwflag| callback(buf, rwflag, user))
}

/// Like [`parse_private_key`], with an arbitrary passphrase source.
pub fn parse_private_key_with(
    input: Buffer<'_, u8>,
    mut passphrase: impl FnMut(&mut [u8], i32) -> i32,
) -> std::result::Result<KeyPointer, ErrorCode> {
    let _guard = MarkPopErrorOnReturn::new(None);
    match decode_private_key(input.data(), &mut passphrase) {
        Ok(key) => Ok(KeyPointer::new(Key::Private(key))),
        Err(reason) => {
            tracing::debug!(reason = reason.text, "private key parse failed");
            Err(put_error(reason))
        }
    }
}

type Passphrase<'a> = &'a mut dyn FnMut(&mut [u8], i32) -> i32;

fn decode_private_key(
    input: &[u8],
    passphrase: Passphrase<'_>,
) -> std::result::Result<PrivateKey, Reason> {
    // Text before the first boundary, such as bag attributes, is skipped.
    if let Ok(pem) = pem::parse(input) {
        return match pem.tag() {
            "PRIVATE KEY" => decode_pkcs8(pem.contents()),
            "ENCRYPTED PRIVATE KEY" => decrypt_pkcs8(pem.contents(), passphrase),
            "RSA PRIVATE KEY" => decode_pkcs1(pem.contents()),
            _ => Err(Reason::PEM_NO_START_LINE),
        };
    }

    if pkcs8::PrivateKeyInfo::try_from(input).is_ok() {
        decode_pkcs8(input)
    } else if pkcs8::EncryptedPrivateKeyInfo::try_from(input).is_ok() {
        decrypt_pkcs8(input, passphrase)
    } else {
        decode_pkcs1(input)
    }
}

fn decode_pkcs8(der: &[u8]) -> std::result::Result<PrivateKey, Reason> {
    let info = pkcs8::PrivateKeyInfo::try_from(der).map_err(|_| Reason::ASN1_DECODE_ERROR)?;
    match info.algorithm.oid {
        rfc5912::RSA_ENCRYPTION => {
            RsaPrivateKey::from_pkcs8_der(der).map(|k| PrivateKey::Rsa(Box::new(k)))
        }
        rfc5912::ID_EC_PUBLIC_KEY => match info.algorithm.parameters_oid() {
            Ok(rfc5912::SECP_256_R_1) => {
                p256::SecretKey::from_pkcs8_der(der).map(PrivateKey::EcdsaP256)
            }
            Ok(rfc5912::SECP_384_R_1) => {
                p384::SecretKey::from_pkcs8_der(der).map(PrivateKey::EcdsaP384)
            }
            Ok(rfc5912::SECP_521_R_1) => {
                p521::SecretKey::from_pkcs8_der(der).map(PrivateKey::EcdsaP521)
            }
            _ => return Err(Reason::EVP_UNSUPPORTED_ALGORITHM),
        },
        rfc8410::ID_ED_25519 => {
            ed25519_dalek::SigningKey::from_pkcs8_der(der).map(PrivateKey::Ed25519)
        }
        _ => return Err(Reason::EVP_UNSUPPORTED_ALGORITHM),
    }
    .map_err(|_| Reason::EVP_DECODE_ERROR)
}

fn decrypt_pkcs8(der: &[u8], passphrase: Passphrase<'_>) -> std::result::Result<PrivateKey, Reason> {
    let encrypted =
        pkcs8::EncryptedPrivateKeyInfo::try_from(der).map_err(|_| Reason::ASN1_DECODE_ERROR)?;
    let secret = password::read_passphrase(passphrase)?;
    let document = encrypted
        .decrypt(secret.as_slice())
        .map_err(|_| Reason::EVP_BAD_DECRYPT)?;
    decode_pkcs8(document.as_bytes())
}

fn decode_pkcs1(der: &[u8]) -> std::result::Result<PrivateKey, Reason> {
    RsaPrivateKey::from_pkcs1_der(der)
        .map(|k| PrivateKey::Rsa(Box::new(k)))
        .map_err(|_| Reason::ASN1_DECODE_ERROR)
}
