//! Header field descriptors, values and the two built-in field sets.

use crate::encoding::encoded_word;
use crate::mailbox::Mailbox;
use crate::token::random_token;
use chrono::Utc;
use std::borrow::Cow;
use std::cell::OnceCell;
use std::fmt;

/// Checks a value before it is stored in a field.
pub type Validator = fn(&HeaderValue) -> bool;

/// Renders a stored value into header text.
pub type Renderer = fn(&HeaderValue) -> String;

/// Produces a value at render time; receives every field of the collection.
pub type Generator = fn(&[HeaderField]) -> HeaderValue;

/// Value held by a header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    /// Plain text.
    Text(String),
    /// A single mailbox.
    Address(Mailbox),
    /// A list of mailboxes.
    AddressList(Vec<Mailbox>),
}

impl HeaderValue {
    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Address(_) | Self::AddressList(_) => None,
        }
    }

    /// Returns the mailboxes held by this value (empty for text).
    #[must_use]
    pub fn mailboxes(&self) -> &[Mailbox] {
        match self {
            Self::Text(_) => &[],
            Self::Address(mailbox) => std::slice::from_ref(mailbox),
            Self::AddressList(list) => list,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Address(mailbox) => write!(f, "{mailbox}"),
            Self::AddressList(list) => {
                let dumped: Vec<String> = list.iter().map(Mailbox::dump).collect();
                f.write_str(&dumped.join(", "))
            }
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Mailbox> for HeaderValue {
    fn from(mailbox: Mailbox) -> Self {
        Self::Address(mailbox)
    }
}

impl From<Vec<Mailbox>> for HeaderValue {
    fn from(list: Vec<Mailbox>) -> Self {
        Self::AddressList(list)
    }
}

/// One named header field with its behaviour.
///
/// The value set by the caller and the memoised generated value are kept
/// apart, so an unset field is never mistaken for one awaiting generation.
#[derive(Debug, Clone)]
pub struct HeaderField {
    pub(crate) name: Cow<'static, str>,
    pub(crate) value: Option<HeaderValue>,
    pub(crate) generated: OnceCell<HeaderValue>,
    pub(crate) required: bool,
    pub(crate) disabled: bool,
    pub(crate) validate: Option<Validator>,
    pub(crate) render: Option<Renderer>,
    pub(crate) generate: Option<Generator>,
    pub(crate) custom: bool,
}

impl HeaderField {
    /// Creates an optional field without behaviour.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            value: None,
            generated: OnceCell::new(),
            required: false,
            disabled: false,
            validate: None,
            render: None,
            generate: None,
            custom: false,
        }
    }

    /// Creates a custom field holding a text value.
    #[must_use]
    pub fn custom(name: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Self {
            value: Some(HeaderValue::Text(value.into())),
            custom: true,
            ..Self::new(name)
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the validator.
    #[must_use]
    pub fn validator(mut self, validate: Validator) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Sets the renderer.
    #[must_use]
    pub fn renderer(mut self, render: Renderer) -> Self {
        self.render = Some(render);
        self
    }

    /// Sets the generator.
    #[must_use]
    pub fn generator(mut self, generate: Generator) -> Self {
        self.generate = Some(generate);
        self
    }

    /// Returns the field name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the caller's value, else the generated one.
    #[must_use]
    pub fn value(&self) -> Option<&HeaderValue> {
        self.value.as_ref().or_else(|| self.generated.get())
    }

    /// Returns true if the field must have a value at render time.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns true if the field is skipped at render time.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns true if the field was added by name rather than declared.
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        self.custom
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub(crate) fn accepts(&self, value: &HeaderValue) -> bool {
        self.validate.is_none_or(|validate| validate(value))
    }
}

/// Declares the fields a header collection starts with.
pub trait FieldSet {
    /// Returns the declared fields in output order.
    fn fields() -> Vec<HeaderField>;
}

/// Top-level message fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFields;

impl FieldSet for MessageFields {
    fn fields() -> Vec<HeaderField> {
        vec![
            HeaderField::new("Date")
                .validator(is_text)
                .generator(generate_date),
            HeaderField::new("From")
                .required()
                .validator(is_single_mailbox)
                .renderer(render_mailboxes),
            HeaderField::new("Sender")
                .validator(is_single_mailbox)
                .renderer(render_mailboxes),
            HeaderField::new("Reply-To")
                .validator(is_mailbox_or_list)
                .renderer(render_mailboxes),
            HeaderField::new("To")
                .validator(is_mailbox_or_list)
                .renderer(render_mailboxes),
            HeaderField::new("Cc")
                .validator(is_mailbox_or_list)
                .renderer(render_mailboxes),
            HeaderField::new("Bcc")
                .validator(is_mailbox_or_list)
                .renderer(render_mailboxes),
            HeaderField::new("Message-ID")
                .validator(is_text)
                .generator(generate_message_id),
            HeaderField::new("Subject")
                .required()
                .validator(is_text)
                .renderer(render_subject),
            HeaderField::new("MIME-Version")
                .validator(is_text)
                .generator(|_| HeaderValue::Text("1.0".into())),
        ]
    }
}

/// Per-part content fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartFields;

impl FieldSet for PartFields {
    fn fields() -> Vec<HeaderField> {
        vec![
            HeaderField::new("Content-ID"),
            HeaderField::new("Content-Type"),
            HeaderField::new("Content-Transfer-Encoding"),
            HeaderField::new("Content-Disposition"),
        ]
    }
}

pub(crate) fn is_text(value: &HeaderValue) -> bool {
    matches!(value, HeaderValue::Text(_))
}

fn is_single_mailbox(value: &HeaderValue) -> bool {
    matches!(value, HeaderValue::Address(_))
}

fn is_mailbox_or_list(value: &HeaderValue) -> bool {
    match value {
        HeaderValue::Address(_) => true,
        HeaderValue::AddressList(list) => !list.is_empty(),
        HeaderValue::Text(_) => false,
    }
}

/// Renders a mailbox with its display name as an encoded-word.
fn encode_mailbox(mailbox: &Mailbox) -> String {
    if mailbox.display_name().is_empty() {
        mailbox.dump()
    } else {
        format!(
            "{} <{}>",
            encoded_word(mailbox.display_name()),
            mailbox.address()
        )
    }
}

/// Renders one or more mailboxes, folding after each comma.
fn render_mailboxes(value: &HeaderValue) -> String {
    let rendered: Vec<String> = value.mailboxes().iter().map(encode_mailbox).collect();
    rendered.join(",\r\n ")
}

fn render_subject(value: &HeaderValue) -> String {
    match value.as_text() {
        Some(text) if !text.is_empty() => encoded_word(text),
        _ => String::new(),
    }
}

fn generate_date(_: &[HeaderField]) -> HeaderValue {
    HeaderValue::Text(Utc::now().format("%a, %d %b %Y %H:%M:%S +0000").to_string())
}

fn generate_message_id(fields: &[HeaderField]) -> HeaderValue {
    let domain = fields
        .iter()
        .find(|field| field.matches("From"))
        .and_then(HeaderField::value)
        .and_then(|value| value.mailboxes().first())
        .map(Mailbox::domain)
        .filter(|domain| !domain.is_empty())
        .unwrap_or("localhost");

    HeaderValue::Text(format!("<{}@{domain}>", random_token(16).to_lowercase()))
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

    fn mailbox(text: &str) -> Mailbox {
        Mailbox::parse(text).unwrap()
    }

    #[test]
    fn test_value_accessors() {
        let text = HeaderValue::from("hello");
        assert_eq!(text.as_text(), Some("hello"));
        assert!(text.mailboxes().is_empty());

        let single = HeaderValue::from(mailbox("a@example.com"));
        assert_eq!(single.mailboxes().len(), 1);
        assert_eq!(single.as_text(), None);
    }

    #[test]
    fn test_value_display() {
        let list = HeaderValue::from(vec![mailbox("a@example.com"), mailbox("B <b@example.com>")]);
        assert_eq!(list.to_string(), "<a@example.com>, \"B\" <b@example.com>");
    }

    #[test]
    fn test_render_mailboxes_encodes_names() {
        let value = HeaderValue::from(mailbox("Lorem Ipsum <lorem@ipsum.com>"));
        assert_eq!(
            render_mailboxes(&value),
            "=?utf-8?B?TG9yZW0gSXBzdW0=?= <lorem@ipsum.com>"
        );

        let bare = HeaderValue::from(mailbox("foo@test.com"));
        assert_eq!(render_mailboxes(&bare), "<foo@test.com>");
    }

    #[test]
    fn test_render_mailbox_list_folds() {
        let value = HeaderValue::from(vec![mailbox("a@example.com"), mailbox("b@example.com")]);
        assert_eq!(render_mailboxes(&value), "<a@example.com>,\r\n <b@example.com>");
    }

    #[test]
    fn test_render_subject() {
        assert_eq!(
            render_subject(&"Test Subject".into()),
            "=?utf-8?B?VGVzdCBTdWJqZWN0?="
        );
        assert_eq!(render_subject(&"".into()), "");
    }

    #[test]
    fn test_validators() {
        let single = HeaderValue::from(mailbox("a@example.com"));
        let list = HeaderValue::from(vec![mailbox("a@example.com")]);
        let text = HeaderValue::from("invalid");

        assert!(is_single_mailbox(&single));
        assert!(!is_single_mailbox(&list));
        assert!(!is_single_mailbox(&text));

        assert!(is_mailbox_or_list(&single));
        assert!(is_mailbox_or_list(&list));
        assert!(!is_mailbox_or_list(&text));
        assert!(!is_mailbox_or_list(&HeaderValue::AddressList(Vec::new())));
    }

    #[test]
    fn test_generate_message_id_uses_from_domain() {
        let mut fields = MessageFields::fields();
        let from = fields.iter_mut().find(|f| f.matches("from")).unwrap();
        from.value = Some(mailbox("test@example.com").into());

        let id = generate_message_id(&fields);
        let id = id.as_text().unwrap();
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@example.com>"));
    }

    #[test]
    fn test_generate_message_id_without_from() {
        let id = generate_message_id(&MessageFields::fields());
        assert!(id.as_text().unwrap().ends_with("@localhost>"));
    }

    #[test]
    fn test_generate_date_format() {
        let date = generate_date(&[]);
        let date = date.as_text().unwrap();
        assert!(date.ends_with(" +0000"));
        assert!(chrono::DateTime::parse_from_rfc2822(date).is_ok());
    }

    #[test]
    fn test_message_field_order() {
        let names: Vec<String> = MessageFields::fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(
            names,
            [
                "Date",
                "From",
                "Sender",
                "Reply-To",
                "To",
                "Cc",
                "Bcc",
                "Message-ID",
                "Subject",
                "MIME-Version"
            ]
        );
    }
}
