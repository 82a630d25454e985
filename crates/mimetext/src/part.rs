//! A single MIME body part.

use crate::content_type::ContentType;
use crate::error::Result;
use crate::header::{HeaderValue, PartHeaders};

/// One MIME part: content headers plus an already-encoded payload.
#[derive(Debug, Clone, Default)]
pub struct BodyPart {
    headers: PartHeaders,
    data: String,
}

impl BodyPart {
    /// Creates a part, merging the given headers into the part fields.
    ///
    /// # Errors
    ///
    /// Returns an error if a header is rejected (see [`PartHeaders::set`]).
    pub fn new<I, K, V>(data: impl Into<String>, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<HeaderValue>,
    {
        let mut part = Self {
            headers: PartHeaders::new(),
            data: data.into(),
        };
        part.headers.set_all(headers)?;
        Ok(part)
    }

    /// Returns the payload.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Returns the part headers.
    #[must_use]
    pub const fn headers(&self) -> &PartHeaders {
        &self.headers
    }

    /// Returns a header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(HeaderValue::as_text)
    }

    /// Sets a header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is rejected.
    pub fn set_header(&mut self, name: &str, value: impl Into<HeaderValue>) -> Result<()> {
        self.headers.set(name, value)
    }

    /// Sets several headers in order.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected header.
    pub fn set_headers<I, K, V>(&mut self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<HeaderValue>,
    {
        self.headers.set_all(headers)
    }

    /// Parses the `Content-Type` header, if present and well formed.
    #[must_use]
    pub fn content_type(&self) -> Option<ContentType> {
        self.header("Content-Type")
            .and_then(|value| ContentType::parse(value).ok())
    }

    /// Returns true if `Content-Disposition` mentions `attachment`.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition_contains("attachment")
    }

    /// Returns true if `Content-Disposition` mentions `inline`.
    #[must_use]
    pub fn is_inline_attachment(&self) -> bool {
        self.disposition_contains("inline")
    }

    fn disposition_contains(&self, needle: &str) -> bool {
        self.header("Content-Disposition")
            .is_some_and(|disposition| disposition.contains(needle))
    }

    /// Renders the headers, a blank line and the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the headers cannot be rendered.
    pub fn render(&self) -> Result<String> {
        Ok(format!("{}\r\n\r\n{}", self.headers.render()?, self.data))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn part() -> BodyPart {
        BodyPart::new("Test data", Vec::<(&str, &str)>::new()).unwrap()
    }

    #[test]
    fn test_render_headers_then_data() {
        let mut content = part();
        content.set_header("Content-Type", "text/plain").unwrap();
        assert_eq!(
            content.render().unwrap(),
            "Content-Type: text/plain\r\n\r\nTest data"
        );
    }

    #[test]
    fn test_declared_fields_keep_their_order() {
        let content = BodyPart::new(
            "x",
            [
                ("X-Extra", "1"),
                ("Content-Disposition", "inline"),
                ("Content-Type", "image/png"),
                ("content-id", "<logo>"),
            ],
        )
        .unwrap();

        assert_eq!(
            content.render().unwrap(),
            "Content-ID: <logo>\r\nContent-Type: image/png\r\n\
             Content-Disposition: inline\r\nX-Extra: 1\r\n\r\nx"
        );
    }

    #[test]
    fn test_attachment_classification() {
        let mut content = part();
        assert!(!content.is_attachment());
        assert!(!content.is_inline_attachment());

        content
            .set_header("Content-Disposition", "attachment; filename=test.txt")
            .unwrap();
        assert!(content.is_attachment());
        assert!(!content.is_inline_attachment());

        content
            .set_header("Content-Disposition", "inline; filename=test.txt")
            .unwrap();
        assert!(!content.is_attachment());
        assert!(content.is_inline_attachment());
    }

    #[test]
    fn test_custom_headers() {
        let mut content = part();
        content
            .set_headers([("X-Custom-Header1", "Value1"), ("X-Custom-Header2", "Value2")])
            .unwrap();
        assert_eq!(content.header("X-Custom-Header1"), Some("Value1"));
        assert_eq!(content.header("x-custom-header2"), Some("Value2"));
        assert!(content.headers().field("X-Custom-Header2").unwrap().is_custom());
    }

    #[test]
    fn test_content_type() {
        let mut content = part();
        assert!(content.content_type().is_none());

        content
            .set_header("Content-Type", "text/html; charset=UTF-8")
            .unwrap();
        let ct = content.content_type().unwrap();
        assert_eq!(ct.essence(), "text/html");
        assert_eq!(ct.charset(), Some("UTF-8"));
    }
}
