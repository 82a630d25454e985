//! Encoding utilities used while composing messages.
//!
//! Supports Base64, base64url, Quoted-Printable and RFC 2047 encoded-words.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use std::fmt::Write as _;

/// Charset announced in every encoded-word this crate produces.
pub const ENCODED_WORD_CHARSET: &str = "utf-8";

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Encodes data as unpadded base64url (RFC 4648 section 5).
#[must_use]
pub fn encode_base64url(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decodes unpadded base64url data into UTF-8 text.
///
/// # Errors
///
/// Returns an error if the input is not valid base64url or not UTF-8.
pub fn decode_base64url(data: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD.decode(data)?;
    String::from_utf8(bytes).map_err(Into::into)
}

/// Wraps text in an RFC 2047 B-encoded word.
///
/// Format: `=?utf-8?B?encoded-text?=`. The text is always encoded, even when
/// it is plain ASCII.
#[must_use]
pub fn encoded_word(text: &str) -> String {
    format!(
        "=?{ENCODED_WORD_CHARSET}?B?{}?=",
        encode_base64(text.as_bytes())
    )
}

/// Maximum line length for Quoted-Printable encoding.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// CRLF pairs are kept as hard line breaks; other lines are soft-broken so no
/// encoded line exceeds 76 characters.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::new();

    for (i, line) in text.split("\r\n").enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        encode_qp_line(line.as_bytes(), &mut result);
    }

    result
}

fn encode_qp_line(bytes: &[u8], out: &mut String) {
    let mut line_length = 0;

    for (i, byte) in bytes.iter().enumerate() {
        let is_last = i + 1 == bytes.len();
        let mut token = String::with_capacity(3);

        match byte {
            b'!'..=b'<' | b'>'..=b'~' => token.push(*byte as char),
            // Whitespace at the end of a line must be encoded
            b' ' | b'\t' if !is_last => token.push(*byte as char),
            _ => {
                let _ = write!(token, "={byte:02X}");
            }
        }

        // Keep room for the trailing '=' of a soft break
        if line_length + token.len() > MAX_LINE_LENGTH - 1 {
            out.push_str("=\r\n");
            line_length = 0;
        }

        out.push_str(&token);
        line_length += token.len();
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64url_is_url_safe() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet
        let encoded = encode_base64url(&[0xfb, 0xff]);
        assert_eq!(encoded, "-_8");
        assert!(!encoded.contains('='));
    }

    #[test]
    fn test_base64url_decode_text() {
        let encoded = encode_base64url("Subject: ok\r\n\r\nbody".as_bytes());
        assert_eq!(
            decode_base64url(&encoded).unwrap(),
            "Subject: ok\r\n\r\nbody"
        );
        assert!(decode_base64url("***").is_err());
    }

    #[test]
    fn test_encoded_word_ascii() {
        assert_eq!(encoded_word("Test Subject"), "=?utf-8?B?VGVzdCBTdWJqZWN0?=");
    }

    #[test]
    fn test_encoded_word_utf8() {
        let word = encoded_word("Héllo");
        assert_eq!(word, "=?utf-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_quoted_printable_encode() {
        let text = "Hello, World!";
        assert_eq!(encode_quoted_printable(text), "Hello, World!");

        let encoded = encode_quoted_printable("Héllo, Wørld!");
        assert!(encoded.contains("=C3=A9"));
        assert!(encode_quoted_printable("a=b").contains("=3D"));
    }

    #[test]
    fn test_quoted_printable_keeps_hard_breaks() {
        let encoded = encode_quoted_printable("line one \r\nline two");
        assert_eq!(encoded, "line one=20\r\nline two");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        let text = "x".repeat(200);
        let encoded = encode_quoted_printable(&text);
        for line in encoded.split("\r\n") {
            assert!(line.len() <= MAX_LINE_LENGTH);
        }
        assert_eq!(encoded.replace("=\r\n", ""), text);
    }
}
