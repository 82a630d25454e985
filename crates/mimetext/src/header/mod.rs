//! Ordered header collections.
//!
//! A [`HeaderCollection`] is built from a [`FieldSet`] describing the declared
//! fields, their order, validators, renderers and generators. Names that are
//! not declared are appended as custom text fields.

mod field;

pub use field::{
    FieldSet, Generator, HeaderField, HeaderValue, MessageFields, PartFields, Renderer, Validator,
};

use crate::error::{Error, Result};
use crate::validate::is_valid_field_name;
use field::is_text;
use std::fmt;
use std::marker::PhantomData;

/// Line terminator used between header lines.
const CRLF: &str = "\r\n";

/// Returns true if a text value would break out of its header line.
fn spans_lines(value: &HeaderValue) -> bool {
    value
        .as_text()
        .is_some_and(|text| text.contains(['\r', '\n']))
}

/// Ordered collection of header fields.
pub struct HeaderCollection<F: FieldSet> {
    fields: Vec<HeaderField>,
    _set: PhantomData<fn() -> F>,
}

/// Top-level message headers.
pub type MessageHeaders = HeaderCollection<MessageFields>;

/// Headers of a single body part.
pub type PartHeaders = HeaderCollection<PartFields>;

impl<F: FieldSet> HeaderCollection<F> {
    /// Creates a collection holding the declared fields, all unset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: F::fields(),
            _set: PhantomData,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.matches(name))
    }

    /// Returns the field with the given name (case-insensitive).
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&HeaderField> {
        self.position(name).map(|i| &self.fields[i])
    }

    /// Gets the current value of a header (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.field(name).and_then(HeaderField::value)
    }

    /// Sets a header value.
    ///
    /// Declared fields run their validator first. Unknown names are appended
    /// as custom fields, which only hold text. Text containing CR or LF is
    /// never stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderValue`] if the validator rejects the
    /// value or the text spans lines, or [`Error::InvalidHeaderField`] for a
    /// malformed custom field.
    pub fn set(&mut self, name: &str, value: impl Into<HeaderValue>) -> Result<()> {
        let value = value.into();
        if spans_lines(&value) {
            return Err(Error::InvalidHeaderValue(name.to_string()));
        }

        let Some(i) = self.position(name) else {
            let HeaderValue::Text(text) = value else {
                return Err(Error::InvalidHeaderField(format!(
                    "custom header {name} must have a text value"
                )));
            };
            return self.push_custom(HeaderField::custom(name.to_string(), text));
        };

        let field = &mut self.fields[i];
        if !field.accepts(&value) {
            return Err(Error::InvalidHeaderValue(field.name.to_string()));
        }
        field.value = Some(value);
        Ok(())
    }

    /// Sets several headers in order.
    ///
    /// # Errors
    ///
    /// Stops at the first header that [`set`](Self::set) rejects.
    pub fn set_all<I, K, V>(&mut self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<HeaderValue>,
    {
        headers
            .into_iter()
            .try_for_each(|(name, value)| self.set(name.as_ref(), value))
    }

    /// Appends a fully described custom field.
    ///
    /// Fields without a validator get one that only accepts text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderField`] if the name is malformed or the
    /// value is not text, and [`Error::InvalidHeaderValue`] if the text spans
    /// lines.
    pub fn push_custom(&mut self, mut field: HeaderField) -> Result<()> {
        if !is_valid_field_name(&field.name) {
            return Err(Error::InvalidHeaderField(format!(
                "\"{}\" is not a valid header name",
                field.name.escape_debug()
            )));
        }
        if !matches!(field.value, Some(HeaderValue::Text(_))) {
            return Err(Error::InvalidHeaderField(format!(
                "custom header {} must have a text value",
                field.name
            )));
        }

        if field.value.as_ref().is_some_and(spans_lines) {
            return Err(Error::InvalidHeaderValue(field.name.to_string()));
        }

        field.custom = true;
        field.validate.get_or_insert(is_text);
        self.fields.push(field);
        Ok(())
    }

    /// Enables or disables a field; disabled fields are skipped when rendering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderField`] if no field has this name.
    pub fn set_disabled(&mut self, name: &str, disabled: bool) -> Result<()> {
        let i = self
            .position(name)
            .ok_or_else(|| Error::InvalidHeaderField(format!("unknown header {name}")))?;
        self.fields[i].disabled = disabled;
        Ok(())
    }

    /// Returns an iterator over field names and current values, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&HeaderValue>)> {
        self.fields
            .iter()
            .map(|field| (field.name(), field.value()))
    }

    /// Renders the header block without a trailing line break.
    ///
    /// Generators of unset fields run once; their result is kept for later
    /// renders and lookups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHeader`] if a required field has neither a
    /// value nor a generator.
    pub fn render(&self) -> Result<String> {
        let mut lines = Vec::with_capacity(self.fields.len());

        for field in self.fields.iter().filter(|field| !field.disabled) {
            let value = match (&field.value, field.generate) {
                (Some(value), _) => value,
                (None, Some(generate)) => field.generated.get_or_init(|| {
                    tracing::trace!(header = %field.name, "generating header value");
                    generate(&self.fields)
                }),
                (None, None) if field.required => {
                    return Err(Error::MissingHeader(field.name.to_string()));
                }
                (None, None) => continue,
            };

            let rendered = field
                .render
                .map_or_else(|| value.to_string(), |render| render(value));
            lines.push(format!("{}: {rendered}", field.name));
        }

        Ok(lines.join(CRLF))
    }
}

impl<F: FieldSet> Default for HeaderCollection<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FieldSet> Clone for HeaderCollection<F> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            _set: PhantomData,
        }
    }
}

impl<F: FieldSet> fmt::Debug for HeaderCollection<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderCollection")
            .field("fields", &self.fields)
            .finish()
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
    use crate::mailbox::Mailbox;

    fn mailbox(text: &str) -> Mailbox {
        Mailbox::parse(text).unwrap()
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let mut headers = MessageHeaders::new();
        headers.set("subject", "Hi").unwrap();
        assert_eq!(headers.get("SUBJECT").and_then(HeaderValue::as_text), Some("Hi"));
        assert!(headers.get("X-Unknown").is_none());
    }

    #[test]
    fn test_missing_required_header() {
        let mut headers = MessageHeaders::new();
        headers.set("Subject", "Hi").unwrap();

        let err = headers.render().unwrap_err();
        assert!(matches!(err, Error::MissingHeader(ref name) if name == "From"));

        let mut headers = MessageHeaders::new();
        headers.set("From", mailbox("sender@example.com")).unwrap();
        assert!(matches!(headers.render(), Err(Error::MissingHeader(ref name)) if name == "Subject"));
    }

    #[test]
    fn test_optional_fields_are_skipped() {
        let mut headers = MessageHeaders::new();
        headers.set("From", mailbox("sender@example.com")).unwrap();
        headers.set("Subject", "Test Subject").unwrap();

        let rendered = headers.render().unwrap();
        assert!(rendered.contains("From: <sender@example.com>\r\n"));
        assert!(rendered.contains("Subject: =?utf-8?B?VGVzdCBTdWJqZWN0?=\r\n"));
        assert!(rendered.ends_with("MIME-Version: 1.0"));
        assert!(!rendered.contains("Sender:"));
        assert!(!rendered.contains("Cc:"));
    }

    #[test]
    fn test_render_order_and_terminator() {
        let mut headers = MessageHeaders::new();
        headers.set("Subject", "S").unwrap();
        headers.set("To", vec![mailbox("to@example.com")]).unwrap();
        headers.set("From", mailbox("from@example.com")).unwrap();

        let rendered = headers.render().unwrap();
        let names: Vec<&str> = rendered
            .split("\r\n")
            .map(|line| line.split_once(':').unwrap().0)
            .collect();
        assert_eq!(
            names,
            ["Date", "From", "To", "Message-ID", "Subject", "MIME-Version"]
        );
        assert!(!rendered.ends_with("\r\n"));
    }

    #[test]
    fn test_generators_run_once() {
        let mut headers = MessageHeaders::new();
        headers.set("From", mailbox("sender@example.com")).unwrap();
        headers.set("Subject", "Hi").unwrap();
        assert!(headers.get("Message-ID").is_none());

        let first = headers.render().unwrap();
        let id = headers.get("Message-ID").cloned().unwrap();
        assert!(id.as_text().unwrap().ends_with("@example.com>"));

        let second = headers.render().unwrap();
        assert_eq!(first, second);
        assert_eq!(headers.get("Message-ID"), Some(&id));
    }

    #[test]
    fn test_explicit_value_beats_generator() {
        let mut headers = MessageHeaders::new();
        headers.set("From", mailbox("sender@example.com")).unwrap();
        headers.set("Subject", "Hi").unwrap();
        headers.set("Date", "Thu, 01 Jan 2026 00:00:00 +0000").unwrap();

        let rendered = headers.render().unwrap();
        assert!(rendered.starts_with("Date: Thu, 01 Jan 2026 00:00:00 +0000\r\n"));
    }

    #[test]
    fn test_validator_rejects_value() {
        let mut headers = MessageHeaders::new();
        let err = headers.set("From", "sender@example.com").unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(ref name) if name == "From"));

        let err = headers.set("Subject", mailbox("a@example.com")).unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(_)));
        assert!(headers.get("Subject").is_none());
    }

    #[test]
    fn test_custom_headers() {
        let mut headers = MessageHeaders::new();
        headers.set("X-Custom-Header", "CustomValue").unwrap();
        assert_eq!(
            headers.get("x-custom-header").and_then(HeaderValue::as_text),
            Some("CustomValue")
        );
        assert!(headers.field("X-Custom-Header").unwrap().is_custom());

        // A second set updates the existing custom field
        headers.set("X-Custom-Header", "Other").unwrap();
        assert_eq!(headers.iter().filter(|(n, _)| *n == "X-Custom-Header").count(), 1);

        headers.set("From", mailbox("a@example.com")).unwrap();
        headers.set("Subject", "S").unwrap();
        assert!(headers.render().unwrap().ends_with("\r\nX-Custom-Header: Other"));
    }

    #[test]
    fn test_custom_header_rejects_non_text() {
        let mut headers = MessageHeaders::new();
        let err = headers.set("X-Owner", mailbox("a@example.com")).unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderField(_)));

        headers.set("X-Owner", "text").unwrap();
        let err = headers.set("X-Owner", mailbox("a@example.com")).unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(_)));
    }

    #[test]
    fn test_custom_header_rejects_bad_name() {
        let mut headers = PartHeaders::new();
        assert!(matches!(
            headers.set("Bad Name", "v"),
            Err(Error::InvalidHeaderField(_))
        ));
        assert!(matches!(headers.set("", "v"), Err(Error::InvalidHeaderField(_))));
    }

    #[test]
    fn test_push_custom_with_renderer() {
        let mut headers = PartHeaders::new();
        headers
            .push_custom(HeaderField::custom("X-Shout", "quiet").renderer(|v| v.to_string().to_uppercase()))
            .unwrap();
        assert_eq!(headers.render().unwrap(), "X-Shout: QUIET");

        let err = headers.push_custom(HeaderField::new("X-Empty")).unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderField(_)));
    }

    #[test]
    fn test_text_cannot_span_lines() {
        let mut headers = MessageHeaders::new();
        let err = headers.set("X-A", "v\r\nBcc: evil@x.com").unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(ref name) if name == "X-A"));
        assert!(headers.field("X-A").is_none());

        assert!(matches!(
            headers.set("Subject", "Hi\nBcc: evil@x.com"),
            Err(Error::InvalidHeaderValue(_))
        ));
        assert!(headers.get("Subject").is_none());

        headers.set("X-A", "ok").unwrap();
        assert!(headers.set("x-a", "bad\r").is_err());
        assert_eq!(headers.get("X-A").and_then(HeaderValue::as_text), Some("ok"));

        let err = headers
            .push_custom(HeaderField::custom("X-B", "a\nX-Evil: 1"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(_)));

        let mut part = PartHeaders::new();
        assert!(part.set("Content-ID", "<a>\r\nX-Evil: 1").is_err());
        assert_eq!(part.render().unwrap(), "");
    }

    #[test]
    fn test_disabled_fields_are_skipped() {
        let mut headers = MessageHeaders::new();
        headers.set("From", mailbox("a@example.com")).unwrap();
        headers.set("Subject", "S").unwrap();
        headers.set_disabled("date", true).unwrap();
        headers.set_disabled("Message-ID", true).unwrap();

        let rendered = headers.render().unwrap();
        assert!(rendered.starts_with("From: "));
        assert!(!rendered.contains("Message-ID"));

        assert!(headers.set_disabled("X-Nope", true).is_err());
    }

    #[test]
    fn test_disabled_required_field_does_not_fail() {
        let mut headers = MessageHeaders::new();
        headers.set("From", mailbox("a@example.com")).unwrap();
        headers.set_disabled("Subject", true).unwrap();
        assert!(headers.render().is_ok());
    }

    #[test]
    fn test_set_all() {
        let mut headers = PartHeaders::new();
        headers
            .set_all([("Content-Type", "text/plain"), ("X-Trace", "1")])
            .unwrap();
        assert_eq!(headers.render().unwrap(), "Content-Type: text/plain\r\nX-Trace: 1");
    }

    #[test]
    fn test_part_headers_empty_render() {
        assert_eq!(PartHeaders::new().render().unwrap(), "");
    }
}
