//! Distinguished name rendering.

use const_oid::ObjectIdentifier;
use der::{Any, Encode, Tagged};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::Name;

pub(crate) const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
pub(crate) const EMAIL_ADDRESS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

const SHORT_NAMES: &[(ObjectIdentifier, &str)] = &[
    (COMMON_NAME, "CN"),
    (ObjectIdentifier::new_unwrap("2.5.4.4"), "SN"),
    (ObjectIdentifier::new_unwrap("2.5.4.5"), "serialNumber"),
    (ObjectIdentifier::new_unwrap("2.5.4.6"), "C"),
    (ObjectIdentifier::new_unwrap("2.5.4.7"), "L"),
    (ObjectIdentifier::new_unwrap("2.5.4.8"), "ST"),
    (ObjectIdentifier::new_unwrap("2.5.4.9"), "street"),
    (ObjectIdentifier::new_unwrap("2.5.4.10"), "O"),
    (ObjectIdentifier::new_unwrap("2.5.4.11"), "OU"),
    (ObjectIdentifier::new_unwrap("2.5.4.12"), "title"),
    (ObjectIdentifier::new_unwrap("2.5.4.15"), "businessCategory"),
    (ObjectIdentifier::new_unwrap("2.5.4.17"), "postalCode"),
    (ObjectIdentifier::new_unwrap("2.5.4.42"), "GN"),
    (ObjectIdentifier::new_unwrap("2.5.4.43"), "initials"),
    (ObjectIdentifier::new_unwrap("2.5.4.44"), "generationQualifier"),
    (ObjectIdentifier::new_unwrap("2.5.4.46"), "dnQualifier"),
    (ObjectIdentifier::new_unwrap("2.5.4.65"), "pseudonym"),
    (ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.1"), "UID"),
    (ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.25"), "DC"),
    (EMAIL_ADDRESS, "emailAddress"),
];

fn short_name(oid: &ObjectIdentifier) -> Option<&'static str> {
    SHORT_NAMES
        .iter()
        .find(|(known, _)| known == oid)
        .map(|(_, name)| *name)
}

// Universal tag numbers of the string types an attribute value may carry.
const UTF8_STRING: u8 = 0x0C;
const NUMERIC_STRING: u8 = 0x12;
const PRINTABLE_STRING: u8 = 0x13;
const TELETEX_STRING: u8 = 0x14;
const IA5_STRING: u8 = 0x16;
const VISIBLE_STRING: u8 = 0x1A;
const UNIVERSAL_STRING: u8 = 0x1C;
const BMP_STRING: u8 = 0x1E;

/// Decodes a string-typed attribute value. `None` when the value is not a
/// string type or is not valid for its type.
pub(crate) fn attribute_string(value: &Any) -> Option<String> {
    let bytes = value.value();
    match u8::from(value.tag()) {
        UTF8_STRING => String::from_utf8(bytes.to_vec()).ok(),
        NUMERIC_STRING | PRINTABLE_STRING | IA5_STRING | VISIBLE_STRING => bytes
            .is_ascii()
            .then(|| bytes.iter().map(|b| char::from(*b)).collect()),
        TELETEX_STRING => Some(bytes.iter().map(|b| char::from(*b)).collect()),
        BMP_STRING => {
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units).collect::<Result<String, _>>().ok()
        }
        UNIVERSAL_STRING => {
            if bytes.len() % 4 != 0 {
                return None;
            }
            bytes
                .chunks_exact(4)
                .map(|quad| char::from_u32(u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]])))
                .collect()
        }
        _ => None,
    }
}

/// How a name is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameStyle {
    /// One RDN per line in encoded order, control characters escaped.
    Multiline,
    /// RFC 2253: reversed order, comma separated, unknown fields dumped as hex.
    Rfc2253,
}

impl NameStyle {
    fn rdn_separator(self) -> &'static str {
        match self {
            NameStyle::Multiline => "\n",
            NameStyle::Rfc2253 => ",",
        }
    }

    fn value_separator(self) -> &'static str {
        match self {
            NameStyle::Multiline => " + ",
            NameStyle::Rfc2253 => "+",
        }
    }
}

pub(crate) fn print_name(name: &Name, style: NameStyle) -> String {
    let mut rdns: Vec<_> = name.0.iter().collect();
    if style == NameStyle::Rfc2253 {
        rdns.reverse();
    }
    rdns.into_iter()
        .map(|rdn| {
            rdn.0
                .iter()
                .map(|atv| print_attribute(atv, style))
                .collect::<Vec<_>>()
                .join(style.value_separator())
        })
        .collect::<Vec<_>>()
        .join(style.rdn_separator())
}

fn print_attribute(atv: &AttributeTypeAndValue, style: NameStyle) -> String {
    let short = short_name(&atv.oid);
    let mut out = match short {
        Some(name) => name.to_string(),
        None => atv.oid.to_string(),
    };
    out.push('=');
    let dump = short.is_none() && style == NameStyle::Rfc2253;
    match attribute_string(&atv.value).filter(|_| !dump) {
        Some(text) => escape_value(&text, style == NameStyle::Multiline, &mut out),
        None => {
            out.push('#');
            match atv.value.to_der() {
                Ok(der) => out.extend(der.iter().map(|b| format!("{b:02X}"))),
                Err(_) => out.push_str("<invalid>"),
            }
        }
    }
    out
}

fn escape_value(text: &str, escape_ctrl: bool, out: &mut String) {
    let count = text.chars().count();
    for (i, c) in text.chars().enumerate() {
        let special = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';')
            || (i == 0 && matches!(c, '#' | ' '))
            || (i + 1 == count && c == ' ');
        if special {
            out.push('\\');
            out.push(c);
        } else if escape_ctrl && c.is_ascii_control() {
            out.push_str(&format!("\\{:02X}", u32::from(c)));
        } else {
            out.push(c);
        }
    }
}
