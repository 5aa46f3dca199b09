#![allow(dead_code)]

use std::net::IpAddr;
use std::time::Duration;

use const_oid::{AssociatedOid, ObjectIdentifier};
use der::asn1::{BitString, Ia5String, OctetString, UtcTime};
use der::{Any, Encode, EncodePem, Tag};
use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey};
use pkcs8::{EncodePrivateKey, LineEnding};
use x509_cert::Certificate;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::certificate::{TbsCertificateInner, Version};
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    AccessDescription, AuthorityInfoAccessSyntax, BasicConstraints, ExtendedKeyUsage, KeyUsage,
    KeyUsages, SubjectAltName,
};
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};

pub const COMMON_NAME: &str = "2.5.4.3";
pub const ORGANIZATION: &str = "2.5.4.10";
pub const COUNTRY: &str = "2.5.4.6";
pub const EMAIL_ADDRESS: &str = "1.2.840.113549.1.9.1";

/// Start of every test certificate's validity period.
pub const NOT_BEFORE_UNIX: u64 = 1_700_000_000;
pub const NOT_BEFORE_TEXT: &str = "Nov 14 22:13:20 2023 GMT";
pub const NOT_AFTER_TEXT: &str = "Nov 13 22:13:20 2024 GMT";

/// A subjectAltName whose SEQUENCE claims more bytes than it holds.
pub const MALFORMED_SAN: [u8; 4] = [0x30, 0x03, 0x82, 0x05];

const ECDSA_WITH_SHA_256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
const ID_AD_OCSP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1");
const ID_AD_CA_ISSUERS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.2");

/// A deterministic P-256 key derived from `seed`.
pub fn secret_key(seed: u8) -> p256::SecretKey {
    p256::SecretKey::from_slice(&[seed.max(1); 32]).unwrap()
}

/// The PKCS#8 DER encoding of `secret_key(seed)`.
pub fn pkcs8_der(seed: u8) -> Vec<u8> {
    secret_key(seed).to_pkcs8_der().unwrap().as_bytes().to_vec()
}

/// A name with one attribute per RDN, in the order given.
pub fn name(attrs: &[(&str, &str)]) -> Name {
    RdnSequence(
        attrs
            .iter()
            .map(|(oid, value)| {
                let atv = AttributeTypeAndValue {
                    oid: ObjectIdentifier::new_unwrap(oid),
                    value: Any::new(Tag::Utf8String, value.as_bytes()).unwrap(),
                };
                RelativeDistinguishedName(vec![atv].try_into().unwrap())
            })
            .collect(),
    )
}

fn extension<E: AssociatedOid + Encode>(value: &E, critical: bool) -> Extension {
    Extension {
        extn_id: E::OID,
        critical,
        extn_value: OctetString::new(value.to_der().unwrap()).unwrap(),
    }
}

/// Who signs the certificate. Self-signed when absent.
pub struct IssuedBy<'a> {
    pub name: &'a Name,
    pub key: &'a p256::SecretKey,
}

/// Options for a test certificate.
#[derive(bon::Builder)]
pub struct TestCert<'a> {
    #[builder(default = name(&[(COMMON_NAME, "test.local")]))]
    pub subject: Name,
    #[builder(default = 1)]
    pub key_seed: u8,
    #[builder(default = vec![0x01])]
    pub serial: Vec<u8>,
    #[builder(default)]
    pub dns_names: Vec<&'a str>,
    #[builder(default)]
    pub emails: Vec<&'a str>,
    #[builder(default)]
    pub ips: Vec<IpAddr>,
    #[builder(default)]
    pub uris: Vec<&'a str>,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub server_auth: bool,
    pub ocsp: Option<&'a str>,
    pub ca_issuers: Option<&'a str>,
    /// Extensions appended verbatim as `(oid, DER value)`.
    #[builder(default)]
    pub raw_extensions: Vec<(&'a str, Vec<u8>)>,
    pub issuer: Option<IssuedBy<'a>>,
}

impl TestCert<'_> {
    pub fn issue(&self) -> Certificate {
        let subject_key = secret_key(self.key_seed);

        let mut extensions = Vec::new();
        if self.is_ca {
            extensions.push(extension(
                &BasicConstraints {
                    ca: true,
                    path_len_constraint: None,
                },
                true,
            ));
            extensions.push(extension(
                &KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign),
                true,
            ));
        }
        if self.server_auth {
            extensions.push(extension(
                &ExtendedKeyUsage(vec![const_oid::db::rfc5912::ID_KP_SERVER_AUTH]),
                false,
            ));
        }

        let mut names = Vec::new();
        for dns in &self.dns_names {
            names.push(GeneralName::DnsName(Ia5String::new(dns).unwrap()));
        }
        for email in &self.emails {
            names.push(GeneralName::Rfc822Name(Ia5String::new(email).unwrap()));
        }
        for ip in &self.ips {
            let octets = match ip {
                IpAddr::V4(v4) => v4.octets().to_vec(),
                IpAddr::V6(v6) => v6.octets().to_vec(),
            };
            names.push(GeneralName::IpAddress(OctetString::new(octets).unwrap()));
        }
        for uri in &self.uris {
            names.push(GeneralName::UniformResourceIdentifier(
                Ia5String::new(uri).unwrap(),
            ));
        }
        if !names.is_empty() {
            extensions.push(extension(&SubjectAltName(names), false));
        }

        let mut access = Vec::new();
        for (method, location) in [(ID_AD_OCSP, self.ocsp), (ID_AD_CA_ISSUERS, self.ca_issuers)] {
            if let Some(location) = location {
                access.push(AccessDescription {
                    access_method: method,
                    access_location: GeneralName::UniformResourceIdentifier(
                        Ia5String::new(location).unwrap(),
                    ),
                });
            }
        }
        if !access.is_empty() {
            extensions.push(extension(&AuthorityInfoAccessSyntax(access), false));
        }

        for (oid, value) in &self.raw_extensions {
            extensions.push(Extension {
                extn_id: ObjectIdentifier::new_unwrap(oid),
                critical: false,
                extn_value: OctetString::new(value.clone()).unwrap(),
            });
        }

        let (issuer_name, signing_key) = match &self.issuer {
            Some(signer) => (signer.name.clone(), SigningKey::from(signer.key)),
            None => (self.subject.clone(), SigningKey::from(&subject_key)),
        };

        let not_before = Duration::from_secs(NOT_BEFORE_UNIX);
        let not_after = not_before + Duration::from_secs(365 * 24 * 60 * 60);
        let signature_algorithm = AlgorithmIdentifierOwned {
            oid: ECDSA_WITH_SHA_256,
            parameters: None,
        };

        let tbs_certificate = TbsCertificateInner {
            version: Version::V3,
            serial_number: SerialNumber::new(&self.serial).unwrap(),
            signature: signature_algorithm.clone(),
            issuer: issuer_name,
            validity: Validity {
                not_before: Time::UtcTime(UtcTime::from_unix_duration(not_before).unwrap()),
                not_after: Time::UtcTime(UtcTime::from_unix_duration(not_after).unwrap()),
            },
            subject: self.subject.clone(),
            subject_public_key_info: SubjectPublicKeyInfoOwned::from_key(subject_key.public_key())
                .unwrap(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        };

        let tbs_der = tbs_certificate.to_der().unwrap();
        let signature: Signature = signing_key.sign(&tbs_der);

        Certificate {
            tbs_certificate,
            signature_algorithm,
            signature: BitString::from_bytes(signature.to_der().as_bytes()).unwrap(),
        }
    }

    pub fn issue_der(&self) -> Vec<u8> {
        self.issue().to_der().unwrap()
    }

    pub fn issue_pem(&self) -> String {
        self.issue().to_pem(LineEnding::LF).unwrap()
    }
}

/// A CA named `CN=Test CA` with key seed 100, plus its name.
pub fn ca() -> (Certificate, Name) {
    let ca_name = name(&[(COUNTRY, "US"), (COMMON_NAME, "Test CA")]);
    let cert = TestCert::builder()
        .subject(ca_name.clone())
        .key_seed(100)
        .is_ca(true)
        .build()
        .issue();
    (cert, ca_name)
}
