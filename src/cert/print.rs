//! Injection-safe rendering of alternative names and access descriptions.
//!
//! A value that could be mistaken for list syntax is wrapped in double quotes
//! with JSON-style escapes, so a crafted name can never fake extra entries.

use const_oid::ObjectIdentifier;
use der::Tagged;
use x509_cert::ext::pkix::AuthorityInfoAccessSyntax;
use x509_cert::ext::pkix::name::{GeneralName, OtherName};

use super::name::{NameStyle, print_name};

const ID_ON_XMPP_ADDR: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.8.5");
const ID_ON_DNS_SRV: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.8.7");
const ID_ON_NAI_REALM: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.8.8");
const ID_ON_SMTP_UTF8_MAILBOX: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.8.9");

const ID_AD_OCSP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1");
const ID_AD_CA_ISSUERS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.2");
const ID_AD_TIME_STAMPING: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.3");
const ID_AD_CA_REPOSITORY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.5");

const UTF8_STRING: u8 = 0x0C;
const IA5_STRING: u8 = 0x16;

fn is_safe(value: &[u8], utf8: bool) -> bool {
    value.iter().all(|&c| match c {
        b'"' | b'\\' | b',' | b'\'' => false,
        _ if utf8 => c >= b' ' && c != 0x7f,
        _ => (b' '..=b'~').contains(&c),
    })
}

fn print_alt_name(out: &mut Vec<u8>, value: &[u8], utf8: bool, prefix: Option<&str>) {
    if is_safe(value, utf8) {
        if let Some(prefix) = prefix {
            out.extend_from_slice(prefix.as_bytes());
            out.push(b':');
        }
        out.extend_from_slice(value);
        return;
    }

    out.push(b'"');
    if let Some(prefix) = prefix {
        out.extend_from_slice(prefix.as_bytes());
        out.push(b':');
    }
    for &c in value {
        match c {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'"' => out.extend_from_slice(b"\\\""),
            _ if (b' '..=b'~').contains(&c) && c != b',' => out.push(c),
            _ if utf8 && c & 0x80 != 0 => out.push(c),
            _ => out.extend_from_slice(format!("\\u00{c:02x}").as_bytes()),
        }
    }
    out.push(b'"');
}

fn print_other_name(out: &mut Vec<u8>, other: &OtherName) {
    let (prefix, expected_tag) = match other.type_id {
        ID_ON_SMTP_UTF8_MAILBOX => ("SmtpUTF8Mailbox", UTF8_STRING),
        ID_ON_XMPP_ADDR => ("XmppAddr", UTF8_STRING),
        ID_ON_DNS_SRV => ("SRVName", IA5_STRING),
        ID_ON_NAI_REALM => ("NAIRealm", UTF8_STRING),
        _ => {
            out.extend_from_slice(b"othername:<unsupported>");
            return;
        }
    };
    if u8::from(other.value.tag()) != expected_tag {
        out.extend_from_slice(b"othername:<unsupported>");
        return;
    }
    out.extend_from_slice(b"othername:");
    print_alt_name(out, other.value.value(), expected_tag == UTF8_STRING, Some(prefix));
}

pub(crate) fn print_general_name(out: &mut Vec<u8>, name: &GeneralName) {
    match name {
        GeneralName::DnsName(dns) => {
            out.extend_from_slice(b"DNS:");
            print_alt_name(out, dns.to_string().as_bytes(), false, None);
        }
        GeneralName::Rfc822Name(email) => {
            out.extend_from_slice(b"email:");
            print_alt_name(out, email.to_string().as_bytes(), false, None);
        }
        GeneralName::UniformResourceIdentifier(uri) => {
            out.extend_from_slice(b"URI:");
            print_alt_name(out, uri.to_string().as_bytes(), false, None);
        }
        GeneralName::DirectoryName(dir) => {
            out.extend_from_slice(b"DirName:");
            let text = print_name(dir, NameStyle::Rfc2253);
            print_alt_name(out, text.as_bytes(), true, None);
        }
        GeneralName::IpAddress(ip) => {
            out.extend_from_slice(b"IP Address:");
            out.extend_from_slice(format_ip(ip.as_bytes()).as_bytes());
        }
        GeneralName::RegisteredId(oid) => {
            out.extend_from_slice(format!("Registered ID:{oid}").as_bytes());
        }
        GeneralName::OtherName(other) => print_other_name(out, other),
        GeneralName::EdiPartyName(_) => out.extend_from_slice(b"EdiPartyName:<unsupported>"),
    }
}

fn format_ip(octets: &[u8]) -> String {
    match octets.len() {
        4 => format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]),
        16 => octets
            .chunks_exact(2)
            .map(|pair| format!("{:X}", u16::from_be_bytes([pair[0], pair[1]])))
            .collect::<Vec<_>>()
            .join(":"),
        _ => "<invalid>".to_string(),
    }
}

/// Renders alternative names as `DNS:a, IP Address:1.2.3.4, ...`.
pub(crate) fn print_alt_names(names: &[GeneralName]) -> String {
    let mut out = Vec::new();
    for (i, name) in names.iter().enumerate() {
        if i != 0 {
            out.extend_from_slice(b", ");
        }
        print_general_name(&mut out, name);
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn access_method_name(oid: &ObjectIdentifier) -> String {
    match *oid {
        ID_AD_OCSP => "OCSP".to_string(),
        ID_AD_CA_ISSUERS => "CA Issuers".to_string(),
        ID_AD_CA_REPOSITORY => "CA Repository".to_string(),
        ID_AD_TIME_STAMPING => "AD Time Stamping".to_string(),
        other => other.to_string(),
    }
}

/// One `method - location` line per access description.
pub(crate) fn print_info_access(aia: &AuthorityInfoAccessSyntax) -> String {
    let mut out = Vec::new();
    for (i, desc) in aia.0.iter().enumerate() {
        if i != 0 {
            out.push(b'\n');
        }
        out.extend_from_slice(access_method_name(&desc.access_method).as_bytes());
        out.extend_from_slice(b" - ");
        print_general_name(&mut out, &desc.access_location);
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::asn1::{Ia5String, OctetString};

    fn dns(name: &str) -> GeneralName {
        GeneralName::DnsName(Ia5String::new(name).unwrap())
    }

    #[test]
    fn plain_names() {
        let names = vec![
            dns("example.com"),
            GeneralName::IpAddress(OctetString::new(vec![127, 0, 0, 1]).unwrap()),
            GeneralName::RegisteredId(ObjectIdentifier::new_unwrap("1.2.3.4")),
        ];
        assert_eq!(
            print_alt_names(&names),
            "DNS:example.com, IP Address:127.0.0.1, Registered ID:1.2.3.4"
        );
    }

    #[test]
    fn ipv6_groups() {
        let mut octets = vec![0u8; 16];
        octets[0] = 0x20;
        octets[1] = 0x01;
        octets[2] = 0x0d;
        octets[3] = 0xb8;
        octets[15] = 1;
        assert_eq!(format_ip(&octets), "2001:DB8:0:0:0:0:0:1");
        assert_eq!(format_ip(&[1, 2, 3]), "<invalid>");
    }

    #[test]
    fn injected_separators_are_quoted() {
        let names = vec![dns("evil.com, DNS:good.com")];
        assert_eq!(
            print_alt_names(&names),
            "DNS:\"evil.com\\u002c DNS:good.com\""
        );
    }

    #[test]
    fn quotes_and_backslashes_escape() {
        let names = vec![dns("a\"b\\c")];
        assert_eq!(print_alt_names(&names), "DNS:\"a\\\"b\\\\c\"");
    }
}
