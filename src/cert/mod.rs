//! Owned certificates and borrowed views over them.
//!
//! [`X509Pointer`] owns a parsed certificate; [`X509View`] borrows one and
//! exposes field extraction and identity checks. A view never outlives the
//! certificate it looks at.

pub mod check;
pub mod extensions;
mod name;
mod print;

use std::net::IpAddr;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode, EncodePem, SliceReader};
use time::OffsetDateTime;
use x509_cert::Certificate;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    AuthorityInfoAccessSyntax, BasicConstraints, ExtendedKeyUsage, KeyUsage, KeyUsages,
    SubjectAltName,
};
use x509_cert::time::Time;

use crate::bignum::BignumPointer;
use crate::data::{Buffer, DataPointer};
use crate::error::{CryptoError, ErrorCode, Reason, Result};
use crate::error_stack::{MarkPopErrorOnReturn, put_error};
use crate::handle::{Handle, Resource};
use crate::key::{Key, KeyPointer, PublicKey};

pub use check::{CheckFlag, CheckFlags, CheckMatch};
pub use extensions::find_extension;

use check::{HostMatcher, email_matches, is_valid_email, normalize_host};
use name::{COMMON_NAME, EMAIL_ADDRESS, NameStyle, attribute_string, print_name};

impl Resource for Certificate {
    const KIND: &'static str = "certificate";
}

/// Owns one certificate, or nothing.
#[derive(Debug, Default)]
pub struct X509Pointer {
    cert: Handle<Certificate>,
}

impl X509Pointer {
    /// Parses a certificate from PEM (`CERTIFICATE` or `TRUSTED CERTIFICATE`)
    /// or, failing that, from DER.
    ///
    /// Records pushed while parsing are popped before returning.
    pub fn parse(input: Buffer<'_, u8>) -> std::result::Result<X509Pointer, ErrorCode> {
        let _guard = MarkPopErrorOnReturn::new(None);
        match decode_certificate(input.data()) {
            Ok(cert) => Ok(X509Pointer::from(cert)),
            Err(reason) => {
                tracing::debug!(reason = reason.text, "certificate parse failed");
                Err(put_error(reason))
            }
        }
    }

    pub fn empty() -> Self {
        Self {
            cert: Handle::empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.cert.is_null()
    }

    pub fn get(&self) -> Option<&Certificate> {
        self.cert.get()
    }

    pub fn reset(&mut self, cert: Option<Certificate>) {
        self.cert.reset(cert);
    }

    pub fn release(&mut self) -> Option<Certificate> {
        self.cert.release()
    }

    pub fn take(&mut self) -> X509Pointer {
        X509Pointer {
            cert: self.cert.take(),
        }
    }

    pub fn view(&self) -> X509View<'_> {
        X509View {
            cert: self.cert.get(),
        }
    }
}

impl From<Certificate> for X509Pointer {
    fn from(cert: Certificate) -> Self {
        Self {
            cert: Handle::new(cert),
        }
    }
}

impl<'a> From<&'a X509Pointer> for X509View<'a> {
    fn from(ptr: &'a X509Pointer) -> Self {
        ptr.view()
    }
}

fn decode_certificate(input: &[u8]) -> std::result::Result<Certificate, Reason> {
    if let Ok(pem) = pem::parse(input) {
        return match pem.tag() {
            "CERTIFICATE" => {
                Certificate::from_der(pem.contents()).map_err(|_| Reason::ASN1_DECODE_ERROR)
            }
            // Trusted certificates carry auxiliary trust data after the certificate.
            "TRUSTED CERTIFICATE" => SliceReader::new(pem.contents())
                .and_then(|mut reader| Certificate::decode(&mut reader))
                .map_err(|_| Reason::ASN1_DECODE_ERROR),
            _ => Err(Reason::PEM_NO_START_LINE),
        };
    }
    Certificate::from_der(input).map_err(|_| Reason::ASN1_DECODE_ERROR)
}

/// A borrowed, possibly empty, view of a certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct X509View<'a> {
    cert: Option<&'a Certificate>,
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn format_time(time: &Time) -> String {
    let dt = match time {
        Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    };
    format!(
        "{} {:2} {:02}:{:02}:{:02} {} GMT",
        MONTHS[usize::from(u8::from(dt.month())) - 1],
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.year()
    )
}

impl<'a> X509View<'a> {
    pub fn new(cert: &'a Certificate) -> Self {
        Self { cert: Some(cert) }
    }

    pub fn is_null(&self) -> bool {
        self.cert.is_none()
    }

    pub fn get(&self) -> Option<&'a Certificate> {
        self.cert
    }

    fn cert(&self) -> Result<&'a Certificate> {
        self.cert
            .ok_or(CryptoError::EmptyHandle(Certificate::KIND))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<DataPointer> {
        let pem = self
            .cert()?
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| CryptoError::EncodingError(e.to_string()))?;
        Ok(DataPointer::from(pem))
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<DataPointer> {
        let der = self
            .cert()?
            .to_der()
            .map_err(|e| CryptoError::EncodingError(e.to_string()))?;
        Ok(DataPointer::from(der))
    }

    /// The subject, one RDN per line.
    pub fn subject(&self) -> Result<String> {
        Ok(print_name(&self.cert()?.tbs_certificate.subject, NameStyle::Multiline))
    }

    /// The issuer, one RDN per line.
    pub fn issuer(&self) -> Result<String> {
        Ok(print_name(&self.cert()?.tbs_certificate.issuer, NameStyle::Multiline))
    }

    /// The subject alternative names as `DNS:a, IP Address:b, ...`, or `None`
    /// when the extension is absent.
    pub fn subject_alt_name(&self) -> Result<Option<String>> {
        let san = find_extension::<SubjectAltName>(self.cert()?)?;
        Ok(san.map(|san| print::print_alt_names(&san.0)))
    }

    /// The authority information access lines, or `None` when absent.
    pub fn info_access(&self) -> Result<Option<String>> {
        let aia = find_extension::<AuthorityInfoAccessSyntax>(self.cert()?)?;
        Ok(aia.map(|aia| print::print_info_access(&aia)))
    }

    /// Start of the validity period, e.g. `Nov 14 22:13:20 2023 GMT`.
    pub fn valid_from(&self) -> Result<String> {
        Ok(format_time(&self.cert()?.tbs_certificate.validity.not_before))
    }

    /// End of the validity period.
    pub fn valid_to(&self) -> Result<String> {
        Ok(format_time(&self.cert()?.tbs_certificate.validity.not_after))
    }

    /// The serial number as uppercase hex.
    pub fn serial_number(&self) -> Result<DataPointer> {
        let serial = &self.cert()?.tbs_certificate.serial_number;
        BignumPointer::from_bytes(serial.as_bytes()).to_hex()
    }

    /// The subject public key.
    pub fn public_key(&self) -> std::result::Result<KeyPointer, ErrorCode> {
        let _guard = MarkPopErrorOnReturn::new(None);
        let Some(cert) = self.cert else {
            return Err(put_error(Reason::CRYPTO_PASSED_NULL_PARAMETER));
        };
        let key = cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(CryptoError::from)
            .and_then(|der| PublicKey::from_spki_der(&der));
        match key {
            Ok(key) => Ok(KeyPointer::new(Key::Public(key))),
            Err(CryptoError::UnsupportedAlgorithm(_)) => {
                Err(put_error(Reason::EVP_UNSUPPORTED_ALGORITHM))
            }
            Err(_) => Err(put_error(Reason::EVP_DECODE_ERROR)),
        }
    }

    /// The extended key usage purposes, or `None` when unrestricted.
    pub fn key_usage(&self) -> Result<Option<Vec<ObjectIdentifier>>> {
        let eku = find_extension::<ExtendedKeyUsage>(self.cert()?)?;
        Ok(eku.map(|eku| eku.0))
    }

    /// Whether this is a CA certificate: basic constraints assert `cA`, and a
    /// key usage extension, if present, allows certificate signing.
    pub fn is_ca(&self) -> bool {
        let Some(cert) = self.cert else {
            return false;
        };
        let ca = matches!(
            find_extension::<BasicConstraints>(cert),
            Ok(Some(BasicConstraints { ca: true, .. }))
        );
        let can_sign = match find_extension::<KeyUsage>(cert) {
            Ok(Some(ku)) => ku.0.contains(KeyUsages::KeyCertSign),
            Ok(None) => true,
            Err(_) => false,
        };
        ca && can_sign
    }

    /// Whether `issuer`'s subject is byte-for-byte this certificate's issuer.
    pub fn is_issued_by(&self, issuer: &X509View<'_>) -> bool {
        let (Some(cert), Some(issuer)) = (self.cert, issuer.cert) else {
            return false;
        };
        match (
            cert.tbs_certificate.issuer.to_der(),
            issuer.tbs_certificate.subject.to_der(),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Whether `key` is the private half of this certificate's key.
    pub fn check_private_key(&self, key: &KeyPointer) -> bool {
        match key.get() {
            Some(key @ Key::Private(_)) => self.cert_public_key().is_some_and(|cert_key| {
                cert_key == key.public_key()
            }),
            _ => false,
        }
    }

    /// Whether this certificate's signature verifies under `key`.
    pub fn check_public_key(&self, key: &KeyPointer) -> bool {
        let (Some(cert), Some(key)) = (self.cert, key.get()) else {
            return false;
        };
        let Ok(tbs) = cert.tbs_certificate.to_der() else {
            return false;
        };
        key.public_key().verify(
            cert.signature_algorithm.oid,
            &tbs,
            cert.signature.raw_bytes(),
        )
    }

    fn cert_public_key(&self) -> Option<PublicKey> {
        let der = self.cert?.tbs_certificate.subject_public_key_info.to_der().ok()?;
        PublicKey::from_spki_der(&der).ok()
    }

    /// Checks `host` against the DNS alternative names and, when allowed by
    /// `flags`, the subject common names.
    ///
    /// On a match, `peer_name` (if given) receives the certificate name that
    /// matched, which differs from `host` when a wildcard matched.
    ///
    /// Identity checks are not scoped: when the certificate cannot be examined
    /// the result is `OperationFailed` and the record explaining why stays on
    /// the error queue for the caller to inspect or clear.
    pub fn check_host(
        &self,
        host: &str,
        flags: CheckFlags,
        peer_name: Option<&mut DataPointer>,
    ) -> CheckMatch {
        let Some(cert) = self.cert else {
            return CheckMatch::OperationFailed;
        };
        let Some(presented) = normalize_host(host) else {
            return CheckMatch::InvalidName;
        };
        let presented = presented.as_bytes();
        let matcher = HostMatcher::new(flags, presented);

        let outcome = check_names(
            cert,
            flags,
            |gn| match gn {
                GeneralName::DnsName(dns) => Some(dns.to_string().into_bytes()),
                _ => None,
            },
            Some(COMMON_NAME),
            |pattern| matcher.matches(pattern, presented),
        );
        match outcome {
            NameCheck::Matched(pattern) => {
                if let Some(peer) = peer_name {
                    peer.reset(Some(pattern));
                }
                CheckMatch::Match
            }
            NameCheck::NotMatched => CheckMatch::NoMatch,
            NameCheck::Failed => CheckMatch::OperationFailed,
        }
    }

    /// Checks `email` against the rfc822 alternative names and, when allowed
    /// by `flags`, the subject email addresses.
    pub fn check_email(&self, email: &str, flags: CheckFlags) -> CheckMatch {
        let Some(cert) = self.cert else {
            return CheckMatch::OperationFailed;
        };
        if !is_valid_email(email) {
            return CheckMatch::InvalidName;
        }
        let presented = email.as_bytes();
        let outcome = check_names(
            cert,
            flags,
            |gn| match gn {
                GeneralName::Rfc822Name(addr) => Some(addr.to_string().into_bytes()),
                _ => None,
            },
            Some(EMAIL_ADDRESS),
            |pattern| email_matches(pattern, presented),
        );
        outcome.into()
    }

    /// Checks the textual IPv4 or IPv6 address `ip` against the IP address
    /// alternative names. The subject is never consulted.
    pub fn check_ip(&self, ip: &str, flags: CheckFlags) -> CheckMatch {
        let Some(cert) = self.cert else {
            return CheckMatch::OperationFailed;
        };
        let octets = match ip.parse::<IpAddr>() {
            Ok(IpAddr::V4(v4)) => v4.octets().to_vec(),
            Ok(IpAddr::V6(v6)) => v6.octets().to_vec(),
            Err(_) => return CheckMatch::InvalidName,
        };
        let outcome = check_names(
            cert,
            flags,
            |gn| match gn {
                GeneralName::IpAddress(addr) => Some(addr.as_bytes().to_vec()),
                _ => None,
            },
            None,
            |listed| listed == octets.as_slice(),
        );
        outcome.into()
    }
}

enum NameCheck {
    Matched(Vec<u8>),
    NotMatched,
    Failed,
}

impl From<NameCheck> for CheckMatch {
    fn from(outcome: NameCheck) -> Self {
        match outcome {
            NameCheck::Matched(_) => CheckMatch::Match,
            NameCheck::NotMatched => CheckMatch::NoMatch,
            NameCheck::Failed => CheckMatch::OperationFailed,
        }
    }
}

/// Walks the alternative names of one kind, then the subject attributes of
/// type `subject_attr` unless alternative names of that kind exist or the
/// flags rule the subject out.
///
/// A `Failed` outcome leaves its record on the queue.
fn check_names(
    cert: &Certificate,
    flags: CheckFlags,
    select: impl Fn(&GeneralName) -> Option<Vec<u8>>,
    subject_attr: Option<ObjectIdentifier>,
    matches: impl Fn(&[u8]) -> bool,
) -> NameCheck {
    let san = match find_extension::<SubjectAltName>(cert) {
        Ok(san) => san,
        Err(e) => {
            tracing::debug!(error = %e, "cannot examine alternative names");
            put_error(Reason::X509V3_EXTENSION_DECODE);
            return NameCheck::Failed;
        }
    };

    if let Some(san) = san {
        let mut present = false;
        for candidate in san.0.iter().filter_map(&select) {
            present = true;
            if matches(&candidate) {
                return NameCheck::Matched(candidate);
            }
        }
        if present && !flags.contains(CheckFlag::AlwaysCheckSubject) {
            return NameCheck::NotMatched;
        }
    }

    let Some(attr) = subject_attr else {
        return NameCheck::NotMatched;
    };
    if flags.contains(CheckFlag::NeverCheckSubject) {
        return NameCheck::NotMatched;
    }

    let values = cert
        .tbs_certificate
        .subject
        .0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .filter(|atv| atv.oid == attr);
    for atv in values {
        let Some(text) = attribute_string(&atv.value) else {
            put_error(Reason::ASN1_DECODE_ERROR);
            return NameCheck::Failed;
        };
        if matches(text.as_bytes()) {
            return NameCheck::Matched(text.into_bytes());
        }
    }
    NameCheck::NotMatched
}
