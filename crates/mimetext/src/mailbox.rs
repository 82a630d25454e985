//! Mailbox addresses (optional display name + address).

use crate::error::{Error, Result};
use std::fmt;

/// Header a mailbox is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MailboxRole {
    /// `From` header.
    From,
    /// `To` header.
    #[default]
    To,
    /// `Cc` header.
    Cc,
    /// `Bcc` header.
    Bcc,
    /// `Reply-To` header.
    ReplyTo,
}

impl MailboxRole {
    /// Returns the header field name for this role.
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::From => "From",
            Self::To => "To",
            Self::Cc => "Cc",
            Self::Bcc => "Bcc",
            Self::ReplyTo => "Reply-To",
        }
    }
}

/// Unparsed mailbox input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressInput {
    /// Already separated fields, copied without grammar checks.
    Structured {
        /// Email address.
        address: String,
        /// Display name.
        display_name: Option<String>,
        /// Role overriding the one requested by the caller.
        role: Option<MailboxRole>,
    },
    /// Free text such as `"Jane" <jane@example.com>` or `jane@example.com`.
    Text(String),
}

impl AddressInput {
    /// Creates structured input from an address and optional display name.
    #[must_use]
    pub fn structured(address: impl Into<String>, display_name: Option<&str>) -> Self {
        Self::Structured {
            address: address.into(),
            display_name: display_name.map(str::to_string),
            role: None,
        }
    }
}

impl From<&str> for AddressInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for AddressInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for AddressInput {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<Mailbox> for AddressInput {
    fn from(mailbox: Mailbox) -> Self {
        Self::Structured {
            address: mailbox.address,
            display_name: Some(mailbox.display_name),
            role: None,
        }
    }
}

impl From<&Mailbox> for AddressInput {
    fn from(mailbox: &Mailbox) -> Self {
        mailbox.clone().into()
    }
}

/// One or more mailbox inputs, as accepted by recipient setters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressList(Vec<AddressInput>);

impl AddressList {
    /// Parses every input into a mailbox with the given role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMailbox`] for the first input that fails to parse.
    pub fn parse_as(self, role: MailboxRole) -> Result<Vec<Mailbox>> {
        self.0
            .into_iter()
            .map(|input| Mailbox::parse_as(input, role))
            .collect()
    }
}

impl From<AddressInput> for AddressList {
    fn from(input: AddressInput) -> Self {
        Self(vec![input])
    }
}

impl From<&str> for AddressList {
    fn from(text: &str) -> Self {
        Self(vec![text.into()])
    }
}

impl From<String> for AddressList {
    fn from(text: String) -> Self {
        Self(vec![text.into()])
    }
}

impl From<Mailbox> for AddressList {
    fn from(mailbox: Mailbox) -> Self {
        Self(vec![mailbox.into()])
    }
}

impl<T: Into<AddressInput>> From<Vec<T>> for AddressList {
    fn from(inputs: Vec<T>) -> Self {
        Self(inputs.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<AddressInput>, const N: usize> From<[T; N]> for AddressList {
    fn from(inputs: [T; N]) -> Self {
        Self(inputs.into_iter().map(Into::into).collect())
    }
}

/// Mailbox (display name + address), immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "MailboxFields"))]
pub struct Mailbox {
    display_name: String,
    address: String,
    role: MailboxRole,
}

/// Unchecked mailbox fields as they arrive from a deserializer.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct MailboxFields {
    display_name: String,
    address: String,
    role: MailboxRole,
}

#[cfg(feature = "serde")]
impl TryFrom<MailboxFields> for Mailbox {
    type Error = Error;

    fn try_from(fields: MailboxFields) -> Result<Self> {
        let mailbox = Self {
            display_name: fields.display_name,
            address: fields.address,
            role: fields.role,
        };
        mailbox.check()?;
        Ok(mailbox)
    }
}

impl Mailbox {
    /// Creates a mailbox with just an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty or spans lines.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Self::parse(AddressInput::structured(address, None))
    }

    /// Creates a mailbox with a display name and address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty or spans lines.
    pub fn with_name(name: &str, address: impl Into<String>) -> Result<Self> {
        Self::parse(AddressInput::structured(address, Some(name)))
    }

    /// Parses a mailbox with the default `To` role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMailbox`] if no address can be extracted.
    pub fn parse(input: impl Into<AddressInput>) -> Result<Self> {
        Self::parse_as(input, MailboxRole::default())
    }

    /// Parses a mailbox for the given role.
    ///
    /// Accepted forms, tried in order: structured input, `<addr>`,
    /// `name <addr>` (name optionally quoted), and a bare address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMailbox`] if no address can be extracted.
    pub fn parse_as(input: impl Into<AddressInput>, role: MailboxRole) -> Result<Self> {
        let mailbox = match input.into() {
            AddressInput::Structured {
                address,
                display_name,
                role: own_role,
            } => Self {
                display_name: display_name.unwrap_or_default(),
                address,
                role: own_role.unwrap_or(role),
            },
            AddressInput::Text(text) => Self::parse_text(&text, role),
        };

        mailbox.check()?;
        Ok(mailbox)
    }

    fn parse_text(text: &str, role: MailboxRole) -> Self {
        let text = text.trim();

        if let Some(inner) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            return Self {
                display_name: String::new(),
                address: inner.to_string(),
                role,
            };
        }

        if let Some((name, address)) = split_name_addr(text) {
            return Self {
                display_name: unquote(name.trim()).to_string(),
                address: address.to_string(),
                role,
            };
        }

        Self {
            display_name: String::new(),
            address: text.to_string(),
            role,
        }
    }

    fn check(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::InvalidMailbox(
                "the input does not contain an address".into(),
            ));
        }
        if self.address.contains(['\r', '\n']) {
            return Err(Error::InvalidMailbox(format!(
                "address \"{}\" spans multiple lines",
                self.address.escape_debug()
            )));
        }
        Ok(())
    }

    /// Returns the display name (empty when absent).
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the role this mailbox was parsed for.
    #[must_use]
    pub const fn role(&self) -> MailboxRole {
        self.role
    }

    /// Returns the text after the last `@`, or an empty string.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map_or("", |(_, domain)| domain)
    }

    /// Formats the mailbox as `"name" <address>` or `<address>`.
    #[must_use]
    pub fn dump(&self) -> String {
        if self.display_name.is_empty() {
            format!("<{}>", self.address)
        } else {
            format!("\"{}\" <{}>", self.display_name, self.address)
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

/// Splits `name <addr>` at the first `<`.
///
/// The bracketed part must close the text and be non-empty, without angle
/// brackets or line breaks.
fn split_name_addr(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_suffix('>')?;
    let (name, address) = body.split_once('<')?;
    let valid = !address.is_empty() && !address.contains(['<', '>', '\r', '\n']);
    valid.then_some((name, address))
}

/// Strips one leading and one trailing quote character.
fn unquote(name: &str) -> &str {
    let name = name.strip_prefix(['"', '\'']).unwrap_or(name);
    name.strip_suffix(['"', '\'']).unwrap_or(name)
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
    use proptest::prelude::*;

    #[test]
    fn test_structured_input() {
        let mailbox = Mailbox::parse(AddressInput::Structured {
            address: "example@example.com".into(),
            display_name: Some("John Doe".into()),
            role: Some(MailboxRole::Cc),
        })
        .unwrap();

        assert_eq!(mailbox.address(), "example@example.com");
        assert_eq!(mailbox.display_name(), "John Doe");
        assert_eq!(mailbox.role(), MailboxRole::Cc);
    }

    #[test]
    fn test_quoted_name_and_address() {
        let mailbox = Mailbox::parse("\"John Doe\" <example@example.com>").unwrap();
        assert_eq!(mailbox.address(), "example@example.com");
        assert_eq!(mailbox.display_name(), "John Doe");
        assert_eq!(mailbox.role(), MailboxRole::To);
    }

    #[test]
    fn test_single_quoted_name() {
        let mailbox = Mailbox::parse("'Jane' <jane@example.com>").unwrap();
        assert_eq!(mailbox.display_name(), "Jane");
    }

    #[test]
    fn test_bare_address() {
        let mailbox = Mailbox::parse("example@example.com").unwrap();
        assert_eq!(mailbox.address(), "example@example.com");
        assert_eq!(mailbox.display_name(), "");
        assert_eq!(mailbox.dump(), "<example@example.com>");
    }

    #[test]
    fn test_angle_only_address() {
        let mailbox = Mailbox::parse("  <example@example.com> ").unwrap();
        assert_eq!(mailbox.address(), "example@example.com");
        assert_eq!(mailbox.display_name(), "");
    }

    #[test]
    fn test_unquoted_name_without_space() {
        let mailbox = Mailbox::parse("Jane<jane@example.com>").unwrap();
        assert_eq!(mailbox.display_name(), "Jane");
        assert_eq!(mailbox.address(), "jane@example.com");
    }

    #[test]
    fn test_empty_brackets_fall_back_to_bare() {
        let mailbox = Mailbox::parse("Jane <>").unwrap();
        assert_eq!(mailbox.address(), "Jane <>");
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(Mailbox::parse(""), Err(Error::InvalidMailbox(_))));
        assert!(matches!(Mailbox::parse("<>"), Err(Error::InvalidMailbox(_))));
        assert!(matches!(
            Mailbox::parse("a@b.com\r\nBcc: evil@x.com"),
            Err(Error::InvalidMailbox(_))
        ));
        assert!(Mailbox::new("   ").is_err());
    }

    #[test]
    fn test_dump_with_name() {
        let mailbox = Mailbox::with_name("John Doe", "example@example.com").unwrap();
        assert_eq!(mailbox.dump(), "\"John Doe\" <example@example.com>");
        assert_eq!(mailbox.to_string(), mailbox.dump());
    }

    #[test]
    fn test_domain() {
        assert_eq!(Mailbox::new("a@example.com").unwrap().domain(), "example.com");
        assert_eq!(Mailbox::new("\"a@b\"@c.org").unwrap().domain(), "c.org");
        assert_eq!(Mailbox::new("local").unwrap().domain(), "");
    }

    #[test]
    fn test_role_argument_and_override() {
        let mailbox = Mailbox::parse_as("a@example.com", MailboxRole::Bcc).unwrap();
        assert_eq!(mailbox.role(), MailboxRole::Bcc);

        // A mailbox passed back in takes the caller's role
        let again = Mailbox::parse_as(mailbox, MailboxRole::ReplyTo).unwrap();
        assert_eq!(again.role(), MailboxRole::ReplyTo);
    }

    #[test]
    fn test_address_list_conversions() {
        let single = AddressList::from("a@example.com")
            .parse_as(MailboxRole::To)
            .unwrap();
        assert_eq!(single.len(), 1);

        let many = AddressList::from(["a@example.com", "B <b@example.com>"])
            .parse_as(MailboxRole::Cc)
            .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].display_name(), "B");
        assert!(many.iter().all(|m| m.role() == MailboxRole::Cc));

        assert!(AddressList::from(vec!["ok@example.com", ""])
            .parse_as(MailboxRole::To)
            .is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_checks_address() {
        let mailbox = Mailbox::with_name("Jane", "jane@example.com").unwrap();
        let json = serde_json::to_string(&mailbox).unwrap();
        assert_eq!(serde_json::from_str::<Mailbox>(&json).unwrap(), mailbox);

        let empty = r#"{"display_name":"","address":"  ","role":"To"}"#;
        assert!(serde_json::from_str::<Mailbox>(empty).is_err());

        let multi_line = r#"{"display_name":"","address":"a@x.com\r\nBcc: b@x.com","role":"Cc"}"#;
        assert!(serde_json::from_str::<Mailbox>(multi_line).is_err());
    }

    proptest! {
        #[test]
        fn prop_name_addr_round_trip(
            name in "[A-Za-z][A-Za-z ]{0,20}[A-Za-z]",
            local in "[a-z0-9.]{1,12}",
            domain in "[a-z]{1,10}\\.[a-z]{2,4}",
        ) {
            let addr = format!("{local}@{domain}");
            let mailbox = Mailbox::parse(format!("{name} <{addr}>")).unwrap();
            prop_assert_eq!(mailbox.dump(), format!("\"{name}\" <{addr}>"));

            let reparsed = Mailbox::parse(mailbox.dump()).unwrap();
            prop_assert_eq!(reparsed, mailbox);
        }

        #[test]
        fn prop_bare_addr_dumps_in_brackets(
            local in "[a-z0-9]{1,12}",
            domain in "[a-z]{1,10}\\.[a-z]{2,4}",
        ) {
            let addr = format!("{local}@{domain}");
            let mailbox = Mailbox::parse(addr.as_str()).unwrap();
            prop_assert_eq!(mailbox.dump(), format!("<{addr}>"));
            prop_assert_eq!(mailbox.domain(), domain.as_str());
        }
    }
}
