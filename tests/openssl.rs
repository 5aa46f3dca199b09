mod util;

use cryptoguard::bignum::BignumPointer;
use cryptoguard::cert::X509Pointer;
use cryptoguard::data::Buffer;
use openssl::bn::BigNum;
use openssl::x509::X509;
use util::{COMMON_NAME, IssuedBy, TestCert};

const SAMPLES: &[&[u8]] = &[
    &[],
    &[0x00],
    &[0x01],
    &[0x00, 0x00, 0x7F],
    &[0x80, 0x00],
    &[0x01, 0x02, 0xAB],
    &[0xFF; 17],
    &[0x00, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01],
];

#[test]
fn padded_encoding_matches_openssl() {
    for bytes in SAMPLES {
        let ours = BignumPointer::from_bytes(bytes);
        let theirs = BigNum::from_slice(bytes).unwrap();

        // OpenSSL reports a zero-width request as an error even for zero.
        for width in 1..24 {
            let expected = theirs.to_vec_padded(width as i32).ok();
            let actual = ours.encode_padded(width).ok().map(|d| d.to_vec());
            assert_eq!(actual, expected, "bytes {bytes:02X?} width {width}");
        }
        assert_eq!(ours.encode().unwrap().to_vec(), theirs.to_vec());
        assert_eq!(ours.byte_length(), theirs.num_bytes() as usize);
        assert_eq!(ours.bit_length(), theirs.num_bits() as usize);
    }
}

#[test]
fn hex_matches_openssl() {
    for bytes in SAMPLES {
        let ours = BignumPointer::from_bytes(bytes).to_hex().unwrap();
        let theirs = BigNum::from_slice(bytes).unwrap().to_hex_str().unwrap();
        assert_eq!(ours.as_slice(), theirs.as_bytes(), "bytes {bytes:02X?}");
    }
}

#[test]
fn certificate_fields_match_openssl() {
    let (_, ca_name) = util::ca();
    let ca_key = util::secret_key(100);
    let der = TestCert::builder()
        .subject(util::name(&[(COMMON_NAME, "server.myca.local")]))
        .key_seed(9)
        .serial(vec![0x4A, 0x00, 0x11])
        .dns_names(vec!["server.myca.local"])
        .issuer(IssuedBy {
            name: &ca_name,
            key: &ca_key,
        })
        .build()
        .issue_der();

    let ours = X509Pointer::parse(Buffer::from(&der)).unwrap();
    let view = ours.view();
    let theirs = X509::from_der(&der).expect("openssl failed to parse certificate");

    let serial = theirs.serial_number().to_bn().unwrap().to_hex_str().unwrap();
    assert_eq!(view.serial_number().unwrap().as_slice(), serial.as_bytes());

    assert_eq!(view.valid_from().unwrap(), theirs.not_before().to_string());
    assert_eq!(view.valid_to().unwrap(), theirs.not_after().to_string());

    let dns: Vec<String> = theirs
        .subject_alt_names()
        .unwrap()
        .iter()
        .filter_map(|name| name.dnsname().map(|d| format!("DNS:{d}")))
        .collect();
    assert_eq!(view.subject_alt_name().unwrap(), Some(dns.join(", ")));

    let ca_der = util::ca().0;
    let ca = X509Pointer::from(ca_der);
    let ca_openssl = X509::from_der(&ca.view().to_der().unwrap().to_vec()).unwrap();
    let verified = theirs.verify(&ca_openssl.public_key().unwrap()).unwrap();
    assert_eq!(view.check_public_key(&ca.view().public_key().unwrap()), verified);
    assert!(verified);
}
