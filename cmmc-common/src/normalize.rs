//! Domain name canonicalization and free-text normalization
//!
//! Catalog documents spell domain names many ways ("Access Control (AC)",
//! "AC - Access Control", "AC"). Everything is mapped onto the 14 canonical
//! CMMC domain names, in this fixed priority order.

use serde::Deserialize;

/// Canonical domains as (code, name), in display priority order
pub const DOMAINS: [(&str, &str); 14] = [
    ("AC", "Access Control"),
    ("AT", "Awareness and Training"),
    ("AU", "Audit and Accountability"),
    ("CM", "Configuration Management"),
    ("IA", "Identification and Authentication"),
    ("IR", "Incident Response"),
    ("MA", "Maintenance"),
    ("MP", "Media Protection"),
    ("PS", "Personnel Security"),
    ("PE", "Physical Protection"),
    ("RA", "Risk Assessment"),
    ("CA", "Security Assessment"),
    ("SC", "System and Communications Protection"),
    ("SI", "System and Information Integrity"),
];

/// Look up the canonical name for a two-letter domain code
pub fn domain_name_for_code(code: &str) -> Option<&'static str> {
    DOMAINS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Canonical domain name for arbitrary input.
///
/// Matches a two-letter code in parentheses, e.g. "(AC)", or input that is
/// itself a bare code. Unrecognized input is returned unchanged.
pub fn canonicalize_domain(raw: &str) -> String {
    if let Some(name) = parenthesized_code(raw).and_then(domain_name_for_code) {
        return name.to_string();
    }

    let trimmed = raw.trim();
    if trimmed.len() == 2 {
        if let Some(name) = domain_name_for_code(trimmed) {
            return name.to_string();
        }
    }

    raw.to_string()
}

/// Position of a canonical domain in the priority order, `None` if unknown
pub fn domain_priority(name: &str) -> Option<usize> {
    DOMAINS.iter().position(|(_, n)| *n == name)
}

/// Domain code prefix of a practice identifier (`AC.L1-3.1.1` → `AC`)
pub fn code_from_practice_id(practice_id: &str) -> Option<&str> {
    let (prefix, _) = practice_id.split_once('.')?;
    domain_name_for_code(prefix).map(|_| prefix)
}

/// First `(XY)` with two ASCII letters inside
fn parenthesized_code(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    for (i, window) in bytes.windows(4).enumerate() {
        if window[0] == b'('
            && window[1].is_ascii_alphabetic()
            && window[2].is_ascii_alphabetic()
            && window[3] == b')'
        {
            return Some(&raw[i + 1..i + 3]);
        }
    }
    None
}

/// Free-text field that arrives either as one string or as a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    One(String),
    Many(Vec<String>),
}

impl TextField {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            TextField::One(s) if s.trim().is_empty() => Vec::new(),
            TextField::One(s) => vec![s],
            TextField::Many(v) => v,
        }
    }
}

/// Normalize an optional string-or-list field to a list (empty if absent)
pub fn text_list(field: Option<TextField>) -> Vec<String> {
    field.map(TextField::into_vec).unwrap_or_default()
}

/// Join an optional string-or-list field into one block of text
pub fn text_block(field: Option<TextField>) -> String {
    text_list(field).join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parenthesized_code_maps_to_canonical_name() {
        assert_eq!(canonicalize_domain("Access Control (AC)"), "Access Control");
        assert_eq!(canonicalize_domain("ACCESS CONTROL (AC)"), "Access Control");
        assert_eq!(canonicalize_domain("(SI) Integrity"), "System and Information Integrity");
        assert_eq!(canonicalize_domain("Security Assessment (CA)"), "Security Assessment");
    }

    #[test]
    fn test_bare_code_maps_to_canonical_name() {
        assert_eq!(canonicalize_domain("PE"), "Physical Protection");
        assert_eq!(canonicalize_domain(" mp "), "Media Protection");
    }

    #[test]
    fn test_unrecognized_passes_through() {
        assert_eq!(canonicalize_domain("Supply Chain (SR)"), "Supply Chain (SR)");
        assert_eq!(canonicalize_domain("Something Else"), "Something Else");
        assert_eq!(canonicalize_domain(""), "");
        // Three letters in parentheses is not a code
        assert_eq!(canonicalize_domain("Foo (ACX)"), "Foo (ACX)");
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(domain_priority("Access Control"), Some(0));
        assert_eq!(domain_priority("System and Information Integrity"), Some(13));
        assert!(domain_priority("Physical Protection") > domain_priority("Personnel Security"));
        assert_eq!(domain_priority("Supply Chain"), None);
    }

    #[test]
    fn test_code_from_practice_id() {
        assert_eq!(code_from_practice_id("AC.L1-3.1.1"), Some("AC"));
        assert_eq!(code_from_practice_id("ZZ.L2-1"), None);
        assert_eq!(code_from_practice_id("nodot"), None);
    }

    #[test]
    fn test_text_field_normalization() {
        let one: TextField = serde_json::from_str("\"single\"").unwrap();
        assert_eq!(one.into_vec(), vec!["single".to_string()]);

        let many: TextField = serde_json::from_str("[\"a\", \"b\"]").unwrap();
        assert_eq!(many.into_vec(), vec!["a".to_string(), "b".to_string()]);

        let blank: TextField = serde_json::from_str("\"  \"").unwrap();
        assert!(blank.into_vec().is_empty());

        assert!(text_list(None).is_empty());
        assert_eq!(
            text_block(Some(TextField::Many(vec!["p1".into(), "p2".into()]))),
            "p1\n\np2"
        );
    }
}
