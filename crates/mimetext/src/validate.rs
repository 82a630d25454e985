//! Validation of content types, charsets, transfer encodings and header names.

use std::fmt;

/// Content transfer encodings defined by RFC 2045.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    #[cfg_attr(feature = "serde", serde(rename = "7bit"))]
    SevenBit,
    /// 8-bit text.
    #[cfg_attr(feature = "serde", serde(rename = "8bit"))]
    EightBit,
    /// Binary (no encoding).
    Binary,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Base64 encoding.
    Base64,
}

impl TransferEncoding {
    /// Parses a transfer encoding name, case-insensitively.
    ///
    /// Returns `None` for anything outside the five standard values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7bit" => Some(Self::SevenBit),
            "8bit" => Some(Self::EightBit),
            "binary" => Some(Self::Binary),
            "quoted-printable" => Some(Self::QuotedPrintable),
            "base64" => Some(Self::Base64),
            _ => None,
        }
    }

    /// Returns the header value for this encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Binary => "binary",
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content types accepted for message bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextType {
    /// `text/plain`.
    Plain,
    /// `text/html`.
    Html,
}

impl TextType {
    /// All accepted body types, in the order reported by errors.
    pub const ALL: [Self; 2] = [Self::Html, Self::Plain];

    /// Parses an exact body content type.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text/plain" => Some(Self::Plain),
            "text/html" => Some(Self::Html),
            _ => None,
        }
    }

    /// Returns the `type/subtype` string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }
}

impl fmt::Display for TextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const KNOWN_CHARSETS: &[&str] = &[
    "utf-8",
    "utf8",
    "utf16le",
    "utf-16le",
    "latin1",
    "iso-8859-1",
    "us-ascii",
];

/// Checks a charset name against the charsets this crate knows about.
#[must_use]
pub fn is_known_charset(charset: &str) -> bool {
    KNOWN_CHARSETS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(charset.trim()))
}

/// Checks the shape of a header field name (RFC 5322 `ftext`).
#[must_use]
pub fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| (33..=126).contains(&b) && b != b':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), Some(TransferEncoding::SevenBit));
        assert_eq!(TransferEncoding::parse("BASE64"), Some(TransferEncoding::Base64));
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            Some(TransferEncoding::QuotedPrintable)
        );
        assert_eq!(TransferEncoding::parse("uuencode"), None);
    }

    #[test]
    fn test_transfer_encoding_display() {
        assert_eq!(TransferEncoding::EightBit.to_string(), "8bit");
        assert_eq!(TransferEncoding::Binary.to_string(), "binary");
    }

    #[test]
    fn test_text_type_is_exact() {
        assert_eq!(TextType::parse("text/html"), Some(TextType::Html));
        assert_eq!(TextType::parse("text/plain; charset=utf-8"), None);
        assert_eq!(TextType::parse("none"), None);
    }

    #[test]
    fn test_known_charsets() {
        assert!(is_known_charset("UTF-8"));
        assert!(is_known_charset("latin1"));
        assert!(!is_known_charset("klingon"));
    }

    #[test]
    fn test_field_names() {
        assert!(is_valid_field_name("X-Custom-Header"));
        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name("Bad Name"));
        assert!(!is_valid_field_name("Bad:Name"));
        assert!(!is_valid_field_name("Bäd"));
    }
}
