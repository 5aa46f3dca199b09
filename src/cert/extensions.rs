use const_oid::AssociatedOid;
use der::DecodeOwned;
use x509_cert::Certificate;
use x509_cert::ext::pkix::{
    AuthorityInfoAccessSyntax, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAltName,
};

use crate::error::{CryptoError, Result};

/// An X.509 extension this crate knows how to look up.
///
/// The extension's OID comes from [`AssociatedOid`]; `NAME` is what error
/// messages call it.
pub trait KnownExtension: AssociatedOid + DecodeOwned {
    const NAME: &'static str;
}

impl KnownExtension for SubjectAltName {
    const NAME: &'static str = "subjectAltName";
}

impl KnownExtension for BasicConstraints {
    const NAME: &'static str = "basicConstraints";
}

impl KnownExtension for KeyUsage {
    const NAME: &'static str = "keyUsage";
}

impl KnownExtension for ExtendedKeyUsage {
    const NAME: &'static str = "extendedKeyUsage";
}

impl KnownExtension for AuthorityInfoAccessSyntax {
    const NAME: &'static str = "authorityInfoAccess";
}

/// Finds and decodes extension `E` in `cert`.
///
/// # Returns
/// `Ok(None)` when the extension is absent, and `MalformedExtension` when it
/// cannot be decoded or appears more than once.
pub fn find_extension<E: KnownExtension>(cert: &Certificate) -> Result<Option<E>> {
    let mut found = None;
    let matching = cert
        .tbs_certificate
        .extensions
        .iter()
        .flatten()
        .filter(|ext| ext.extn_id == E::OID);
    for ext in matching {
        if found.is_some() {
            return Err(CryptoError::MalformedExtension(E::NAME));
        }
        let value = E::from_der(ext.extn_value.as_bytes())
            .map_err(|_| CryptoError::MalformedExtension(E::NAME))?;
        found = Some(value);
    }
    Ok(found)
}
