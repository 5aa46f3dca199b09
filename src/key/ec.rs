//! Elliptic curve groups, points and key pairs.

use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;

use super::{Key, PrivateKey, PublicKey};
use crate::bignum::BignumPointer;
use crate::data::DataPointer;
use crate::error::{CryptoError, Result};
use crate::handle::{Handle, Resource};

/// A named prime curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcGroup {
    P256,
    P384,
    P521,
}

impl EcGroup {
    /// Looks a curve up by NIST, SEC or X9.62 name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "P-256" | "prime256v1" | "secp256r1" => Some(EcGroup::P256),
            "P-384" | "secp384r1" => Some(EcGroup::P384),
            "P-521" | "secp521r1" => Some(EcGroup::P521),
            _ => None,
        }
    }

    pub fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        match oid {
            rfc5912::SECP_256_R_1 => Some(EcGroup::P256),
            rfc5912::SECP_384_R_1 => Some(EcGroup::P384),
            rfc5912::SECP_521_R_1 => Some(EcGroup::P521),
            _ => None,
        }
    }

    pub fn oid(self) -> ObjectIdentifier {
        match self {
            EcGroup::P256 => rfc5912::SECP_256_R_1,
            EcGroup::P384 => rfc5912::SECP_384_R_1,
            EcGroup::P521 => rfc5912::SECP_521_R_1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EcGroup::P256 => "prime256v1",
            EcGroup::P384 => "secp384r1",
            EcGroup::P521 => "secp521r1",
        }
    }

    pub fn degree(self) -> usize {
        match self {
            EcGroup::P256 => 256,
            EcGroup::P384 => 384,
            EcGroup::P521 => 521,
        }
    }

    /// Length of a field element in bytes.
    pub fn field_size(self) -> usize {
        self.degree().div_ceil(8)
    }
}

impl Resource for EcGroup {
    const KIND: &'static str = "ec group";
}

pub type EcGroupPointer = Handle<EcGroup>;

/// A point on a curve, held in validated form.
#[derive(Clone, PartialEq)]
pub enum EcPoint {
    P256(p256::PublicKey),
    P384(p384::PublicKey),
    P521(p521::PublicKey),
}

impl EcPoint {
    /// Decodes a SEC1 compressed or uncompressed point. Points not on the
    /// curve, and the identity, are rejected.
    pub fn from_sec1(group: EcGroup, bytes: &[u8]) -> Result<Self> {
        let invalid =
            |_| CryptoError::InvalidInput(format!("not a point on {}", group.name()));
        Ok(match group {
            EcGroup::P256 => EcPoint::P256(p256::PublicKey::from_sec1_bytes(bytes).map_err(invalid)?),
            EcGroup::P384 => EcPoint::P384(p384::PublicKey::from_sec1_bytes(bytes).map_err(invalid)?),
            EcGroup::P521 => EcPoint::P521(p521::PublicKey::from_sec1_bytes(bytes).map_err(invalid)?),
        })
    }

    pub fn group(&self) -> EcGroup {
        match self {
            EcPoint::P256(_) => EcGroup::P256,
            EcPoint::P384(_) => EcGroup::P384,
            EcPoint::P521(_) => EcGroup::P521,
        }
    }

    /// SEC1 encoding, compressed or uncompressed.
    pub fn to_sec1(&self, compress: bool) -> DataPointer {
        let bytes = match self {
            EcPoint::P256(p) => p.to_encoded_point(compress).as_bytes().to_vec(),
            EcPoint::P384(p) => p.to_encoded_point(compress).as_bytes().to_vec(),
            EcPoint::P521(p) => p.to_encoded_point(compress).as_bytes().to_vec(),
        };
        DataPointer::from(bytes)
    }

    /// The point as a public key.
    pub fn to_public_key(&self) -> PublicKey {
        match self {
            EcPoint::P256(p) => PublicKey::EcdsaP256(p.clone()),
            EcPoint::P384(p) => PublicKey::EcdsaP384(p.clone()),
            EcPoint::P521(p) => PublicKey::EcdsaP521(p.clone()),
        }
    }
}

impl Resource for EcPoint {
    const KIND: &'static str = "ec point";
}

pub type EcPointPointer = Handle<EcPoint>;

/// An EC key pair.
#[derive(Clone)]
pub enum EcKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

impl EcKey {
    /// Generates a key pair on `group` from the OS CSPRNG.
    pub fn generate(group: EcGroup) -> Self {
        match group {
            EcGroup::P256 => EcKey::P256(p256::SecretKey::random(&mut OsRng)),
            EcGroup::P384 => EcKey::P384(p384::SecretKey::random(&mut OsRng)),
            EcGroup::P521 => EcKey::P521(p521::SecretKey::random(&mut OsRng)),
        }
    }

    /// Builds a key from its big-endian private scalar. The scalar must be
    /// non-zero and below the group order.
    pub fn from_private_scalar(group: EcGroup, scalar: &[u8]) -> Result<Self> {
        let width = group.field_size();
        if scalar.len() > width {
            return Err(CryptoError::BignumTooLong {
                required: scalar.len(),
                width,
            });
        }
        let mut padded = zeroize::Zeroizing::new(vec![0u8; width]);
        padded[width - scalar.len()..].copy_from_slice(scalar);
        let invalid = |_| CryptoError::InvalidInput("private scalar out of range".to_string());
        Ok(match group {
            EcGroup::P256 => EcKey::P256(p256::SecretKey::from_slice(&padded).map_err(invalid)?),
            EcGroup::P384 => EcKey::P384(p384::SecretKey::from_slice(&padded).map_err(invalid)?),
            EcGroup::P521 => EcKey::P521(p521::SecretKey::from_slice(&padded).map_err(invalid)?),
        })
    }

    pub fn group(&self) -> EcGroup {
        match self {
            EcKey::P256(_) => EcGroup::P256,
            EcKey::P384(_) => EcGroup::P384,
            EcKey::P521(_) => EcGroup::P521,
        }
    }

    pub fn public_point(&self) -> EcPoint {
        match self {
            EcKey::P256(k) => EcPoint::P256(k.public_key()),
            EcKey::P384(k) => EcPoint::P384(k.public_key()),
            EcKey::P521(k) => EcPoint::P521(k.public_key()),
        }
    }

    /// The private scalar. The returned bignum is wiped when freed.
    pub fn private_scalar(&self) -> BignumPointer {
        let bytes = match self {
            EcKey::P256(k) => zeroize::Zeroizing::new(k.to_bytes().to_vec()),
            EcKey::P384(k) => zeroize::Zeroizing::new(k.to_bytes().to_vec()),
            EcKey::P521(k) => zeroize::Zeroizing::new(k.to_bytes().to_vec()),
        };
        BignumPointer::from_bytes(&bytes)
    }
}

impl From<EcKey> for Key {
    fn from(key: EcKey) -> Self {
        Key::Private(match key {
            EcKey::P256(k) => PrivateKey::EcdsaP256(k),
            EcKey::P384(k) => PrivateKey::EcdsaP384(k),
            EcKey::P521(k) => PrivateKey::EcdsaP521(k),
        })
    }
}

impl Resource for EcKey {
    const KIND: &'static str = "ec key";
}

pub type EcKeyPointer = Handle<EcKey>;
