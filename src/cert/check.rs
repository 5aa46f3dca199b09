//! Identity matching rules for hostnames and email addresses.
//!
//! Comparison follows the toolkit's documented `X509_check_host` semantics:
//! case-insensitive labels, at most one wildcard confined to the leftmost
//! label, and flags that tighten or loosen those rules.

use der::flagset::{FlagSet, flags};

flags! {
    /// Flags adjusting how a presented name is compared against a certificate.
    pub enum CheckFlag: u32 {
        /// Consult the subject even when alternative names of the kind exist.
        AlwaysCheckSubject = 0x1,
        /// Compare wildcard patterns literally.
        NoWildcards = 0x2,
        /// Only a wildcard that fills the whole leftmost label is honored.
        NoPartialWildcards = 0x4,
        /// A full-label wildcard may match more than one label.
        MultiLabelWildcards = 0x8,
        /// A presented `.example.com` matches exactly one extra label.
        SingleLabelSubdomains = 0x10,
        /// Never fall back to the subject.
        NeverCheckSubject = 0x20,
    }
}

pub type CheckFlags = FlagSet<CheckFlag>;

/// The outcome of an identity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMatch {
    NoMatch,
    Match,
    /// The presented identifier is not a valid name of its kind.
    InvalidName,
    /// The certificate could not be examined.
    OperationFailed,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct HostMatcher {
    flags: CheckFlags,
    dot_subdomains: bool,
}

impl HostMatcher {
    pub(crate) fn new(flags: CheckFlags, presented: &[u8]) -> Self {
        Self {
            flags,
            dot_subdomains: presented.len() > 1 && presented[0] == b'.',
        }
    }

    /// Whether certificate name `pattern` matches the presented `subject`.
    pub(crate) fn matches(&self, pattern: &[u8], subject: &[u8]) -> bool {
        if self.flags.contains(CheckFlag::NoWildcards) {
            return self.equal_nocase(pattern, subject);
        }
        let star = if subject.len() > 1 && subject[0] == b'.' {
            None
        } else {
            valid_star(pattern, self.flags)
        };
        match star {
            None => self.equal_nocase(pattern, subject),
            Some(i) => self.wildcard_match(&pattern[..i], &pattern[i + 1..], subject),
        }
    }

    fn equal_nocase(&self, pattern: &[u8], subject: &[u8]) -> bool {
        eq_nocase(self.skip_prefix(pattern, subject), subject)
    }

    /// With a presented `.domain`, drops leading pattern labels so that
    /// subdomains of it compare equal.
    fn skip_prefix<'p>(&self, pattern: &'p [u8], subject: &[u8]) -> &'p [u8] {
        if !self.dot_subdomains {
            return pattern;
        }
        let single = self.flags.contains(CheckFlag::SingleLabelSubdomains);
        let mut rest = pattern;
        while rest.len() > subject.len() && rest[0] != 0 {
            if single && rest[0] == b'.' {
                break;
            }
            rest = &rest[1..];
        }
        if rest.len() == subject.len() {
            rest
        } else {
            pattern
        }
    }

    fn wildcard_match(&self, prefix: &[u8], suffix: &[u8], subject: &[u8]) -> bool {
        if subject.len() < prefix.len() + suffix.len() {
            return false;
        }
        let wild_end = subject.len() - suffix.len();
        if !eq_nocase(prefix, &subject[..prefix.len()]) || !eq_nocase(&subject[wild_end..], suffix) {
            return false;
        }
        let wildcard = &subject[prefix.len()..wild_end];

        let mut allow_idna = false;
        let mut allow_multi = false;
        if prefix.is_empty() && suffix.first() == Some(&b'.') {
            if wildcard.is_empty() {
                return false;
            }
            allow_idna = true;
            allow_multi = self.flags.contains(CheckFlag::MultiLabelWildcards);
        }
        if !allow_idna && is_idna_label(subject) {
            return false;
        }
        if wildcard == b"*" {
            return true;
        }
        wildcard
            .iter()
            .all(|c| c.is_ascii_alphanumeric() || *c == b'-' || (allow_multi && *c == b'.'))
    }
}

fn is_idna_label(s: &[u8]) -> bool {
    s.len() >= 4 && s[..4].eq_ignore_ascii_case(b"xn--")
}

/// Position of the pattern's wildcard, if it is one the rules accept.
fn valid_star(p: &[u8], flags: CheckFlags) -> Option<usize> {
    let mut star = None;
    let mut label_start = true;
    let mut label_hyphen = false;
    let mut label_idna = false;
    let mut dots = 0;

    for (i, &c) in p.iter().enumerate() {
        match c {
            b'*' => {
                let at_start = label_start;
                let at_end = i + 1 == p.len() || p[i + 1] == b'.';
                if star.is_some() || label_idna || dots > 0 {
                    return None;
                }
                if flags.contains(CheckFlag::NoPartialWildcards) && !(at_start && at_end) {
                    return None;
                }
                // No "foo*bar".
                if !at_start && !at_end {
                    return None;
                }
                star = Some(i);
                label_start = false;
            }
            c if c.is_ascii_alphanumeric() => {
                if label_start && is_idna_label(&p[i..]) {
                    label_idna = true;
                }
                label_start = false;
                label_hyphen = false;
            }
            b'.' => {
                if label_start || label_hyphen {
                    return None;
                }
                label_start = true;
                label_hyphen = false;
                label_idna = false;
                dots += 1;
            }
            b'-' => {
                if label_start {
                    return None;
                }
                label_hyphen = true;
            }
            _ => return None,
        }
    }

    if label_start || label_hyphen || dots < 2 {
        return None;
    }
    star
}

fn eq_nocase(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(l, r)| *l != 0 && l.eq_ignore_ascii_case(r))
}

fn eq_case(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(l, r)| *l != 0 && l == r)
}

/// Exact local part, case-insensitive domain. The split is at the last `@`.
pub(crate) fn email_matches(pattern: &[u8], subject: &[u8]) -> bool {
    if pattern.len() != subject.len() {
        return false;
    }
    let at = (0..pattern.len())
        .rev()
        .find(|&i| pattern[i] == b'@' || subject[i] == b'@');
    match at {
        Some(i) => eq_nocase(&pattern[i..], &subject[i..]) && eq_case(&pattern[..i], &subject[..i]),
        None => eq_case(pattern, subject),
    }
}

/// The presented host with one trailing dot removed, or `None` if it is not a
/// usable hostname. Control characters (NUL included) and spaces are refused;
/// other bytes, non-ASCII ones too, are left for matching to reject.
pub(crate) fn normalize_host(host: &str) -> Option<&str> {
    let host = host.strip_suffix('.').unwrap_or(host);
    let usable = !host.bytes().any(|b| b.is_ascii_control() || b == b' ');
    (!host.is_empty() && host != "." && usable).then_some(host)
}

/// Whether `email` is a usable presented address.
pub(crate) fn is_valid_email(email: &str) -> bool {
    if email.bytes().any(|b| b.is_ascii_control()) {
        return false;
    }
    match email.rsplit_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}
