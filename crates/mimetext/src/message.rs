//! MIME message assembly and rendering.

use crate::config::Config;
use crate::content_type::{ContentType, MultipartKind};
use crate::encoding::encode_base64url;
use crate::error::{Error, Result};
use crate::header::{HeaderValue, MessageHeaders};
use crate::mailbox::{AddressInput, AddressList, Mailbox, MailboxRole};
use crate::part::BodyPart;
use crate::token::random_token;
use crate::validate::{TextType, TransferEncoding, is_known_charset};
use std::fmt::Write as _;

/// Line terminator used throughout the rendered message.
const CRLF: &str = "\r\n";

/// Content type substituted when a part names an unknown transfer encoding.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Headers written per body part; the message level never carries them.
const PART_ONLY_HEADERS: [&str; 2] = ["Content-Type", "Content-Transfer-Encoding"];

/// Returns the value of a caller-supplied header, matching case-insensitively.
fn header_override(headers: &[(String, String)], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}

/// Options for a text or HTML body added with [`MimeMessage::add_message`].
#[derive(Debug, Clone, Default)]
pub struct MessageOptions {
    /// Body text, already encoded for its transfer encoding.
    pub data: String,
    /// `text/plain` or `text/html`.
    pub content_type: Option<String>,
    /// Transfer encoding name.
    pub encoding: Option<String>,
    /// Charset parameter.
    pub charset: Option<String>,
    /// Extra part headers; `Content-Type` and `Content-Transfer-Encoding`
    /// entries take precedence over the fields above.
    pub headers: Vec<(String, String)>,
}

impl MessageOptions {
    /// Creates options for the given content type.
    #[must_use]
    pub fn new(content_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: Some(content_type.into()),
            ..Self::default()
        }
    }

    /// Creates options for a `text/plain` body.
    #[must_use]
    pub fn text(data: impl Into<String>) -> Self {
        Self::new(TextType::Plain.as_str(), data)
    }

    /// Creates options for a `text/html` body.
    #[must_use]
    pub fn html(data: impl Into<String>) -> Self {
        Self::new(TextType::Html.as_str(), data)
    }

    /// Sets the transfer encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Sets the charset.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Adds a part header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Options for a file added with [`MimeMessage::add_attachment`].
#[derive(Debug, Clone, Default)]
pub struct AttachmentOptions {
    /// Attachment data, already encoded for its transfer encoding.
    pub data: String,
    /// File name announced in `Content-Type` and `Content-Disposition`.
    pub filename: Option<String>,
    /// Content type of the file.
    pub content_type: Option<String>,
    /// Transfer encoding name.
    pub encoding: Option<String>,
    /// Referenced from the body (`inline`) rather than offered for download.
    pub inline: bool,
    /// Extra part headers; `Content-Type`, `Content-Transfer-Encoding` and
    /// `Content-ID` entries take precedence over the fields above.
    pub headers: Vec<(String, String)>,
}

impl AttachmentOptions {
    /// Creates options for a named file.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            filename: Some(filename.into()),
            ..Self::default()
        }
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the transfer encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Marks the attachment as inline.
    #[must_use]
    pub const fn inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    /// Sets the `Content-ID` used to reference an inline attachment.
    #[must_use]
    pub fn content_id(self, id: impl Into<String>) -> Self {
        self.header("Content-ID", id)
    }

    /// Adds a part header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Boundary tokens, generated once per message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundaries {
    mixed: String,
    alternative: String,
    related: String,
}

impl Boundaries {
    /// Generates three distinct random tokens.
    fn generate(length: usize) -> Self {
        loop {
            let boundaries = Self {
                mixed: random_token(length),
                alternative: random_token(length),
                related: random_token(length),
            };
            if boundaries.mixed != boundaries.alternative
                && boundaries.mixed != boundaries.related
                && boundaries.alternative != boundaries.related
            {
                return boundaries;
            }
        }
    }

    /// Boundary of the `multipart/mixed` section.
    #[must_use]
    pub fn mixed(&self) -> &str {
        &self.mixed
    }

    /// Boundary of the `multipart/alternative` section.
    #[must_use]
    pub fn alternative(&self) -> &str {
        &self.alternative
    }

    /// Boundary of the `multipart/related` section.
    #[must_use]
    pub fn related(&self) -> &str {
        &self.related
    }

    fn all(&self) -> [&str; 3] {
        [&self.mixed, &self.alternative, &self.related]
    }
}

/// Overall layout chosen for a message at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Structure {
    /// `multipart/mixed` wrapping `multipart/related`, then attachments.
    MixedRelated,
    /// `multipart/mixed`: text content, then attachments.
    Mixed,
    /// `multipart/related`: text content, then inline attachments.
    Related,
    /// `multipart/alternative`: plain text, then HTML.
    Alternative,
    /// One body part directly under the message headers.
    SinglePart,
}

/// The primary text parts of a message.
#[derive(Clone, Copy)]
struct TextContent<'a> {
    plaintext: Option<&'a BodyPart>,
    html: Option<&'a BodyPart>,
}

impl<'a> TextContent<'a> {
    /// HTML is preferred over plain text.
    fn primary(self) -> Option<&'a BodyPart> {
        self.html.or(self.plaintext)
    }

    const fn has_both(self) -> bool {
        self.plaintext.is_some() && self.html.is_some()
    }
}

/// A MIME message under construction.
///
/// Configure the headers, add bodies and attachments, then call
/// [`render`](Self::render). Parts are append-only.
#[derive(Debug, Clone)]
pub struct MimeMessage {
    config: Config,
    headers: MessageHeaders,
    boundaries: Boundaries,
    parts: Vec<BodyPart>,
}

impl Default for MimeMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl MimeMessage {
    /// Creates an empty message with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty message with the given configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let boundaries = Boundaries::generate(config.effective_boundary_length());
        Self {
            config,
            headers: MessageHeaders::new(),
            boundaries,
            parts: Vec::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the boundary tokens.
    #[must_use]
    pub const fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// Returns the top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &MessageHeaders {
        &self.headers
    }

    /// Returns every part in the order added.
    #[must_use]
    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    /// Sets a top-level header.
    ///
    /// `Content-Type` and `Content-Transfer-Encoding` are written by the
    /// renderer and cannot be set here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderField`] for `Content-Type` or
    /// `Content-Transfer-Encoding`, or an error if the header rejects the value.
    pub fn set_header(&mut self, name: &str, value: impl Into<HeaderValue>) -> Result<()> {
        if PART_ONLY_HEADERS
            .iter()
            .any(|header| header.eq_ignore_ascii_case(name))
        {
            return Err(Error::InvalidHeaderField(format!(
                "{name} is written per body part and cannot be set on the message"
            )));
        }
        self.headers.set(name, value)
    }

    /// Sets several top-level headers in order.
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
        headers
            .into_iter()
            .try_for_each(|(name, value)| self.set_header(name.as_ref(), value))
    }

    /// Gets a top-level header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Sets the `From` mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMailbox`] if the input cannot be parsed.
    pub fn set_sender(&mut self, input: impl Into<AddressInput>) -> Result<Mailbox> {
        let mailbox = Mailbox::parse_as(input, MailboxRole::From)?;
        self.headers
            .set(MailboxRole::From.header_name(), mailbox.clone())?;
        Ok(mailbox)
    }

    /// Returns the `From` mailbox.
    #[must_use]
    pub fn sender(&self) -> Option<&Mailbox> {
        self.header(MailboxRole::From.header_name())
            .and_then(|value| value.mailboxes().first())
    }

    /// Sets the mailboxes of a recipient header, replacing earlier ones.
    ///
    /// Accepts a single address or a list and always stores a list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMailbox`] if an input cannot be parsed, or
    /// [`Error::InvalidHeaderValue`] if the header rejects the list. An empty
    /// list is rejected; earlier mailboxes are kept in that case.
    pub fn set_recipients(
        &mut self,
        input: impl Into<AddressList>,
        role: MailboxRole,
    ) -> Result<Vec<Mailbox>> {
        let mailboxes = input.into().parse_as(role)?;
        self.headers.set(role.header_name(), mailboxes.clone())?;
        Ok(mailboxes)
    }

    /// Returns the mailboxes of a recipient header.
    #[must_use]
    pub fn recipients(&self, role: MailboxRole) -> &[Mailbox] {
        self.header(role.header_name())
            .map(HeaderValue::mailboxes)
            .unwrap_or_default()
    }

    /// Sets the `To` mailboxes.
    ///
    /// # Errors
    ///
    /// See [`set_recipients`](Self::set_recipients).
    pub fn set_recipient(&mut self, input: impl Into<AddressList>) -> Result<Vec<Mailbox>> {
        self.set_recipients(input, MailboxRole::To)
    }

    /// Sets the `To` mailboxes.
    ///
    /// # Errors
    ///
    /// See [`set_recipients`](Self::set_recipients).
    pub fn set_to(&mut self, input: impl Into<AddressList>) -> Result<Vec<Mailbox>> {
        self.set_recipients(input, MailboxRole::To)
    }

    /// Sets the `Cc` mailboxes.
    ///
    /// # Errors
    ///
    /// See [`set_recipients`](Self::set_recipients).
    pub fn set_cc(&mut self, input: impl Into<AddressList>) -> Result<Vec<Mailbox>> {
        self.set_recipients(input, MailboxRole::Cc)
    }

    /// Sets the `Bcc` mailboxes.
    ///
    /// # Errors
    ///
    /// See [`set_recipients`](Self::set_recipients).
    pub fn set_bcc(&mut self, input: impl Into<AddressList>) -> Result<Vec<Mailbox>> {
        self.set_recipients(input, MailboxRole::Bcc)
    }

    /// Sets the `Reply-To` mailboxes.
    ///
    /// # Errors
    ///
    /// See [`set_recipients`](Self::set_recipients).
    pub fn set_reply_to(&mut self, input: impl Into<AddressList>) -> Result<Vec<Mailbox>> {
        self.set_recipients(input, MailboxRole::ReplyTo)
    }

    /// Sets the subject.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderValue`] if the field rejects the value.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<()> {
        self.headers.set("Subject", subject.into())
    }

    /// Returns the subject.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.header("Subject").and_then(HeaderValue::as_text)
    }

    /// Adds a `text/plain` or `text/html` body.
    ///
    /// An unknown transfer encoding does not fail: the part is labelled
    /// `application/octet-stream` instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMessageType`] for any other content type.
    pub fn add_message(&mut self, opts: MessageOptions) -> Result<&BodyPart> {
        let MessageOptions {
            data,
            content_type,
            encoding,
            charset,
            headers,
        } = opts;

        let requested = header_override(&headers, "Content-Type")
            .or(content_type)
            .unwrap_or_else(|| "none".to_string());
        let Some(text_type) = TextType::parse(&requested) else {
            let valid: Vec<&str> = TextType::ALL.iter().map(|t| t.as_str()).collect();
            return Err(Error::InvalidMessageType(format!(
                "valid content types are {} but you specified \"{requested}\"",
                valid.join(", ")
            )));
        };

        let encoding = header_override(&headers, "Content-Transfer-Encoding")
            .or(encoding)
            .unwrap_or_else(|| self.config.message_encoding.to_string());
        let (mime_type, encoding) = resolve_encoding(text_type.as_str(), encoding);

        let charset = charset.unwrap_or_else(|| self.config.charset.clone());
        if !is_known_charset(&charset) {
            tracing::warn!(%charset, "unknown charset for text part");
        }
        let content_type = ContentType::parse(mime_type)?.with_parameter("charset", charset);

        let part = BodyPart::new(
            data,
            headers.into_iter().chain([
                ("Content-Type".to_string(), content_type.to_string()),
                ("Content-Transfer-Encoding".to_string(), encoding),
            ]),
        )?;
        tracing::debug!(content_type = %content_type, "added message part");
        Ok(self.push_part(part))
    }

    /// Adds an attachment.
    ///
    /// The content type defaults to `none` and the transfer encoding to the
    /// configured attachment encoding. An unknown transfer encoding labels the
    /// part `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFilename`] without a filename and
    /// [`Error::InvalidMessageType`] for an empty content type.
    pub fn add_attachment(&mut self, opts: AttachmentOptions) -> Result<&BodyPart> {
        let AttachmentOptions {
            data,
            filename,
            content_type,
            encoding,
            inline,
            headers,
        } = opts;

        let filename = filename.ok_or(Error::MissingFilename)?;
        if filename.contains(['\r', '\n']) {
            return Err(Error::InvalidFilename(format!(
                "\"{}\" spans multiple lines",
                filename.escape_debug()
            )));
        }
        let requested = header_override(&headers, "Content-Type")
            .or(content_type)
            .unwrap_or_else(|| "none".to_string());
        if requested.trim().is_empty() {
            return Err(Error::InvalidMessageType(format!(
                "you specified an invalid content type \"{requested}\""
            )));
        }

        let encoding = header_override(&headers, "Content-Transfer-Encoding")
            .or(encoding)
            .unwrap_or_else(|| self.config.attachment_encoding.to_string());
        let (mime_type, encoding) = resolve_encoding(&requested, encoding);
        let content_id = header_override(&headers, "Content-ID").map(|id| wrap_content_id(&id));

        let filename = quote_filename(&filename);
        let disposition = if inline { "inline" } else { "attachment" };
        let mut overrides = vec![
            ("Content-Type".to_string(), format!("{mime_type}; name={filename}")),
            ("Content-Transfer-Encoding".to_string(), encoding),
            (
                "Content-Disposition".to_string(),
                format!("{disposition}; filename={filename}"),
            ),
        ];
        if let Some(id) = content_id {
            overrides.push(("Content-ID".to_string(), id));
        }

        let part = BodyPart::new(data, headers.into_iter().chain(overrides))?;
        tracing::debug!(%filename, disposition, "added attachment part");
        Ok(self.push_part(part))
    }

    fn push_part(&mut self, part: BodyPart) -> &BodyPart {
        self.parts.push(part);
        &self.parts[self.parts.len() - 1]
    }

    /// Returns true if any part is an attachment.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        self.parts.iter().any(BodyPart::is_attachment)
    }

    /// Returns true if any part is an inline attachment.
    #[must_use]
    pub fn has_inline_attachments(&self) -> bool {
        self.parts.iter().any(BodyPart::is_inline_attachment)
    }

    /// Returns the attachments in the order added.
    pub fn attachments(&self) -> impl Iterator<Item = &BodyPart> {
        self.parts.iter().filter(|part| part.is_attachment())
    }

    /// Returns the inline attachments in the order added.
    pub fn inline_attachments(&self) -> impl Iterator<Item = &BodyPart> {
        self.parts.iter().filter(|part| part.is_inline_attachment())
    }

    /// Returns the first non-attachment part whose `Content-Type` contains
    /// `mime_type`.
    #[must_use]
    pub fn message_by_type(&self, mime_type: &str) -> Option<&BodyPart> {
        self.parts.iter().find(|part| {
            !part.is_attachment()
                && !part.is_inline_attachment()
                && part
                    .header("Content-Type")
                    .is_some_and(|value| value.contains(mime_type))
        })
    }

    fn text_content(&self) -> Result<TextContent<'_>> {
        let text = TextContent {
            plaintext: self.message_by_type(TextType::Plain.as_str()),
            html: self.message_by_type(TextType::Html.as_str()),
        };
        if text.primary().is_none() {
            return Err(Error::MissingBody);
        }
        Ok(text)
    }

    fn classify(&self, text: TextContent<'_>) -> Structure {
        match (self.has_attachments(), self.has_inline_attachments()) {
            (true, true) => Structure::MixedRelated,
            (true, false) => Structure::Mixed,
            (false, true) => Structure::Related,
            (false, false) if text.has_both() => Structure::Alternative,
            (false, false) => Structure::SinglePart,
        }
    }

    /// Returns the layout [`render`](Self::render) would produce.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBody`] if no text part was added.
    pub fn structure(&self) -> Result<Structure> {
        Ok(self.classify(self.text_content()?))
    }

    /// Renders the complete message: headers, a blank line, then the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBody`] if no text part was added and
    /// [`Error::MissingHeader`] if `From` or `Subject` is unset.
    pub fn render(&self) -> Result<String> {
        let text = self.text_content()?;
        let headers = self.headers.render()?;
        let structure = self.classify(text);
        tracing::debug!(?structure, parts = self.parts.len(), "rendering message");
        self.warn_on_boundary_in_data();

        let body = match structure {
            Structure::MixedRelated => self.render_mixed_related(text)?,
            Structure::Mixed => self.render_mixed(text)?,
            Structure::Related => self.render_related(text)?,
            Structure::Alternative => self.render_alternative(text)?,
            Structure::SinglePart => match text.primary() {
                Some(primary) => primary.render()?,
                None => return Err(Error::MissingBody),
            },
        };

        Ok(format!("{headers}{CRLF}{body}"))
    }

    /// Renders the message and encodes it as unpadded base64url.
    ///
    /// # Errors
    ///
    /// Same as [`render`](Self::render).
    pub fn render_encoded(&self) -> Result<String> {
        Ok(encode_base64url(self.render()?.as_bytes()))
    }

    fn render_mixed_related(&self, text: TextContent<'_>) -> Result<String> {
        let mixed = self.boundaries.mixed();
        let related = self.boundaries.related();
        let attachments = render_sections(mixed, self.attachments())?;
        let inline = render_sections(related, self.inline_attachments())?;

        Ok(format!(
            "{}{CRLF}{CRLF}--{mixed}{CRLF}{}{CRLF}{CRLF}{}{CRLF}{CRLF}{inline}--{related}--{CRLF}{attachments}--{mixed}--",
            multipart_header(MultipartKind::Mixed, mixed),
            multipart_header(MultipartKind::Related, related),
            self.dump_text_content(text, related)?,
        ))
    }

    fn render_mixed(&self, text: TextContent<'_>) -> Result<String> {
        let mixed = self.boundaries.mixed();
        let attachments = render_sections(mixed, self.attachments())?;
        // The nested alternative section already ends without a blank line
        let gap = if text.has_both() { "" } else { CRLF };

        Ok(format!(
            "{}{CRLF}{CRLF}{}{CRLF}{gap}{attachments}--{mixed}--",
            multipart_header(MultipartKind::Mixed, mixed),
            self.dump_text_content(text, mixed)?,
        ))
    }

    fn render_related(&self, text: TextContent<'_>) -> Result<String> {
        let related = self.boundaries.related();
        let inline = render_sections(related, self.inline_attachments())?;

        Ok(format!(
            "{}{CRLF}{CRLF}{}{CRLF}{CRLF}{inline}--{related}--",
            multipart_header(MultipartKind::Related, related),
            self.dump_text_content(text, related)?,
        ))
    }

    fn render_alternative(&self, text: TextContent<'_>) -> Result<String> {
        let alternative = self.boundaries.alternative();

        Ok(format!(
            "{}{CRLF}{CRLF}{}{CRLF}{CRLF}--{alternative}--",
            multipart_header(MultipartKind::Alternative, alternative),
            self.dump_text_content(text, alternative)?,
        ))
    }

    /// Renders the text section that opens a multipart body.
    ///
    /// With attachments but no inline parts, plain text and HTML get their
    /// own `multipart/alternative` section. With inline parts only the HTML
    /// is kept.
    fn dump_text_content(&self, text: TextContent<'_>, boundary: &str) -> Result<String> {
        let alternative = self.boundaries.alternative();

        match (text.plaintext, text.html) {
            (Some(plaintext), Some(html))
                if self.has_attachments() && !self.has_inline_attachments() =>
            {
                Ok(format!(
                    "--{boundary}{CRLF}{}{CRLF}{CRLF}--{alternative}{CRLF}{}{CRLF}{CRLF}--{alternative}{CRLF}{}{CRLF}{CRLF}--{alternative}--",
                    multipart_header(MultipartKind::Alternative, alternative),
                    plaintext.render()?,
                    html.render()?,
                ))
            }
            (Some(_), Some(html)) if self.has_inline_attachments() => {
                Ok(format!("--{boundary}{CRLF}{}", html.render()?))
            }
            (Some(plaintext), Some(html)) => Ok(format!(
                "--{boundary}{CRLF}{}{CRLF}{CRLF}--{boundary}{CRLF}{}",
                plaintext.render()?,
                html.render()?,
            )),
            _ => {
                let primary = text.primary().ok_or(Error::MissingBody)?;
                Ok(format!("--{boundary}{CRLF}{}", primary.render()?))
            }
        }
    }

    fn warn_on_boundary_in_data(&self) {
        for part in &self.parts {
            for boundary in self.boundaries.all() {
                if part.data().contains(boundary) {
                    tracing::warn!(boundary, "part data contains a boundary token");
                }
            }
        }
    }
}

/// Formats the `Content-Type` header line of a multipart section.
fn multipart_header(kind: MultipartKind, boundary: &str) -> String {
    format!("Content-Type: {}", ContentType::multipart(kind, boundary))
}

/// Renders each part as `--boundary CRLF part CRLF CRLF`, dropping the last CRLF.
fn render_sections<'a>(
    boundary: &str,
    parts: impl Iterator<Item = &'a BodyPart>,
) -> Result<String> {
    let mut out = String::new();
    for part in parts {
        let _ = write!(out, "--{boundary}{CRLF}{}{CRLF}{CRLF}", part.render()?);
    }
    if out.ends_with(CRLF) {
        out.truncate(out.len() - CRLF.len());
    }
    Ok(out)
}

/// Resolves the content type and `Content-Transfer-Encoding` value of a part.
///
/// A standard encoding is written in its canonical form. Anything else keeps
/// the caller's text and labels the part `application/octet-stream`.
fn resolve_encoding(requested: &str, encoding: String) -> (&str, String) {
    match TransferEncoding::parse(&encoding) {
        Some(known) => (requested, known.as_str().to_string()),
        None => {
            tracing::warn!(
                %encoding,
                requested,
                "unsupported transfer encoding, labelling part {FALLBACK_CONTENT_TYPE}"
            );
            (FALLBACK_CONTENT_TYPE, encoding)
        }
    }
}

/// Wraps a Content-ID in angle brackets unless it already carries one.
fn wrap_content_id(id: &str) -> String {
    if id.is_empty() || id.starts_with('<') || id.ends_with('>') {
        id.to_string()
    } else {
        format!("<{id}>")
    }
}

/// Quotes a filename for a header parameter.
fn quote_filename(filename: &str) -> String {
    format!(
        "\"{}\"",
        filename.replace('\\', "\\\\").replace('"', "\\\"")
    )
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

    fn message() -> MimeMessage {
        let mut msg = MimeMessage::new();
        msg.set_sender("Lorem Ipsum <lorem@ipsum.com>").unwrap();
        msg.set_recipient("foo@test.com").unwrap();
        msg.set_subject("Hi").unwrap();
        msg.headers.set_disabled("Date", true).unwrap();
        msg.headers.set_disabled("Message-ID", true).unwrap();
        msg
    }

    const HEADERS: &str = "From: =?utf-8?B?TG9yZW0gSXBzdW0=?= <lorem@ipsum.com>\r\n\
        To: <foo@test.com>\r\n\
        Subject: =?utf-8?B?SGk=?=\r\n\
        MIME-Version: 1.0";

    const PLAIN: &str = "Content-Type: text/plain; charset=UTF-8\r\n\
        Content-Transfer-Encoding: 7bit\r\n\r\nplain body";

    const HTML: &str = "Content-Type: text/html; charset=UTF-8\r\n\
        Content-Transfer-Encoding: 7bit\r\n\r\n<p>html body</p>";

    const ATTACHMENT: &str = "Content-Type: text/csv; name=\"a.csv\"\r\n\
        Content-Transfer-Encoding: base64\r\n\
        Content-Disposition: attachment; filename=\"a.csv\"\r\n\r\nYSxi";

    const INLINE: &str = "Content-ID: <logo>\r\n\
        Content-Type: image/png; name=\"logo.png\"\r\n\
        Content-Transfer-Encoding: base64\r\n\
        Content-Disposition: inline; filename=\"logo.png\"\r\n\r\niVBO";

    fn add_plain(msg: &mut MimeMessage) {
        msg.add_message(MessageOptions::text("plain body")).unwrap();
    }

    fn add_html(msg: &mut MimeMessage) {
        msg.add_message(MessageOptions::html("<p>html body</p>")).unwrap();
    }

    fn add_attachment(msg: &mut MimeMessage) {
        msg.add_attachment(AttachmentOptions::new("a.csv", "YSxi").content_type("text/csv"))
            .unwrap();
    }

    fn add_inline(msg: &mut MimeMessage) {
        msg.add_attachment(
            AttachmentOptions::new("logo.png", "iVBO")
                .content_type("image/png")
                .content_id("logo")
                .inline(true),
        )
        .unwrap();
    }

    #[test]
    fn test_boundaries_are_distinct() {
        let msg = MimeMessage::new();
        let [mixed, alternative, related] = msg.boundaries().all();
        assert_ne!(mixed, alternative);
        assert_ne!(mixed, related);
        assert_ne!(alternative, related);
        assert_eq!(mixed.len(), 24);
    }

    #[test]
    fn test_single_part() {
        let mut msg = message();
        add_plain(&mut msg);

        assert_eq!(msg.structure().unwrap(), Structure::SinglePart);
        assert_eq!(msg.render().unwrap(), format!("{HEADERS}\r\n{PLAIN}"));
    }

    #[test]
    fn test_single_part_prefers_html() {
        let mut msg = message();
        add_html(&mut msg);
        assert_eq!(msg.render().unwrap(), format!("{HEADERS}\r\n{HTML}"));
    }

    #[test]
    fn test_alternative() {
        let mut msg = message();
        add_plain(&mut msg);
        add_html(&mut msg);
        let a = msg.boundaries().alternative().to_string();

        assert_eq!(msg.structure().unwrap(), Structure::Alternative);
        assert_eq!(
            msg.render().unwrap(),
            format!(
                "{HEADERS}\r\nContent-Type: multipart/alternative; boundary={a}\r\n\r\n\
                 --{a}\r\n{PLAIN}\r\n\r\n--{a}\r\n{HTML}\r\n\r\n--{a}--"
            )
        );
    }

    #[test]
    fn test_mixed_with_single_text() {
        let mut msg = message();
        add_plain(&mut msg);
        add_attachment(&mut msg);
        let m = msg.boundaries().mixed().to_string();

        assert_eq!(msg.structure().unwrap(), Structure::Mixed);
        assert_eq!(
            msg.render().unwrap(),
            format!(
                "{HEADERS}\r\nContent-Type: multipart/mixed; boundary={m}\r\n\r\n\
                 --{m}\r\n{PLAIN}\r\n\r\n--{m}\r\n{ATTACHMENT}\r\n--{m}--"
            )
        );
    }

    #[test]
    fn test_mixed_nests_alternative() {
        let mut msg = message();
        add_plain(&mut msg);
        add_html(&mut msg);
        add_attachment(&mut msg);
        let m = msg.boundaries().mixed().to_string();
        let a = msg.boundaries().alternative().to_string();

        assert_eq!(
            msg.render().unwrap(),
            format!(
                "{HEADERS}\r\nContent-Type: multipart/mixed; boundary={m}\r\n\r\n\
                 --{m}\r\nContent-Type: multipart/alternative; boundary={a}\r\n\r\n\
                 --{a}\r\n{PLAIN}\r\n\r\n--{a}\r\n{HTML}\r\n\r\n--{a}--\r\n\
                 --{m}\r\n{ATTACHMENT}\r\n--{m}--"
            )
        );
    }

    #[test]
    fn test_related_keeps_only_html() {
        let mut msg = message();
        add_plain(&mut msg);
        add_html(&mut msg);
        add_inline(&mut msg);
        let r = msg.boundaries().related().to_string();

        assert_eq!(msg.structure().unwrap(), Structure::Related);
        assert_eq!(
            msg.render().unwrap(),
            format!(
                "{HEADERS}\r\nContent-Type: multipart/related; boundary={r}\r\n\r\n\
                 --{r}\r\n{HTML}\r\n\r\n--{r}\r\n{INLINE}\r\n--{r}--"
            )
        );
    }

    #[test]
    fn test_mixed_related() {
        let mut msg = message();
        add_html(&mut msg);
        add_inline(&mut msg);
        add_attachment(&mut msg);
        let m = msg.boundaries().mixed().to_string();
        let r = msg.boundaries().related().to_string();

        assert_eq!(msg.structure().unwrap(), Structure::MixedRelated);
        assert_eq!(
            msg.render().unwrap(),
            format!(
                "{HEADERS}\r\nContent-Type: multipart/mixed; boundary={m}\r\n\r\n\
                 --{m}\r\nContent-Type: multipart/related; boundary={r}\r\n\r\n\
                 --{r}\r\n{HTML}\r\n\r\n--{r}\r\n{INLINE}\r\n--{r}--\r\n\
                 --{m}\r\n{ATTACHMENT}\r\n--{m}--"
            )
        );
    }

    #[test]
    fn test_missing_body_with_attachments() {
        let mut msg = message();
        add_attachment(&mut msg);
        assert!(matches!(msg.render(), Err(Error::MissingBody)));
        assert!(matches!(msg.structure(), Err(Error::MissingBody)));
    }

    #[test]
    fn test_missing_body_is_checked_before_headers() {
        let msg = MimeMessage::new();
        assert!(matches!(msg.render(), Err(Error::MissingBody)));
    }

    #[test]
    fn test_missing_from() {
        let mut msg = MimeMessage::new();
        add_plain(&mut msg);
        let err = msg.render().unwrap_err();
        assert!(matches!(err, Error::MissingHeader(ref name) if name == "From"));
    }

    #[test]
    fn test_add_message_rejects_other_types() {
        let mut msg = MimeMessage::new();
        let err = msg
            .add_message(MessageOptions::text("x").header("Content-Type", "none"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMessageType(_)));
        assert!(err.to_string().contains("\"none\""));

        let err = msg
            .add_message(MessageOptions {
                data: "x".into(),
                ..MessageOptions::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMessageType(_)));
        assert!(msg.parts().is_empty());
    }

    #[test]
    fn test_add_message_options() {
        let mut msg = MimeMessage::new();
        let part = msg
            .add_message(
                MessageOptions::html("<b>x</b>")
                    .charset("iso-8859-1")
                    .encoding("quoted-printable")
                    .header("X-Part", "1"),
            )
            .unwrap();

        assert_eq!(part.header("Content-Type"), Some("text/html; charset=iso-8859-1"));
        assert_eq!(part.header("Content-Transfer-Encoding"), Some("quoted-printable"));
        assert_eq!(part.header("X-Part"), Some("1"));
    }

    #[test]
    fn test_unknown_encoding_downgrades_type() {
        let mut msg = MimeMessage::new();
        let part = msg
            .add_message(MessageOptions::text("x").encoding("uuencode"))
            .unwrap();
        assert_eq!(
            part.header("Content-Type"),
            Some("application/octet-stream; charset=UTF-8")
        );
        assert_eq!(part.header("Content-Transfer-Encoding"), Some("uuencode"));

        let part = msg
            .add_attachment(AttachmentOptions::new("a.bin", "x").content_type("image/png").encoding("x-custom"))
            .unwrap();
        assert_eq!(
            part.header("Content-Type"),
            Some("application/octet-stream; name=\"a.bin\"")
        );
    }

    #[test]
    fn test_downgraded_text_is_not_a_body() {
        let mut msg = message();
        msg.add_message(MessageOptions::text("x").encoding("uuencode"))
            .unwrap();
        assert!(matches!(msg.render(), Err(Error::MissingBody)));
    }

    #[test]
    fn test_attachment_defaults() {
        let mut msg = MimeMessage::new();
        let part = msg.add_attachment(AttachmentOptions::new("notes", "x")).unwrap();
        assert_eq!(part.header("Content-Type"), Some("none; name=\"notes\""));
        assert_eq!(part.header("Content-Transfer-Encoding"), Some("base64"));
        assert_eq!(
            part.header("Content-Disposition"),
            Some("attachment; filename=\"notes\"")
        );
        assert!(part.header("Content-ID").is_none());
    }

    #[test]
    fn test_attachment_errors() {
        let mut msg = MimeMessage::new();
        let err = msg
            .add_attachment(AttachmentOptions {
                data: "x".into(),
                ..AttachmentOptions::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::MissingFilename));

        let err = msg
            .add_attachment(AttachmentOptions::new("a.txt", "x").content_type(""))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMessageType(_)));
    }

    #[test]
    fn test_attachment_header_overrides() {
        let mut msg = MimeMessage::new();
        let part = msg
            .add_attachment(
                AttachmentOptions::new("a.pdf", "x")
                    .content_type("text/plain")
                    .header("Content-Type", "application/pdf")
                    .header("Content-Transfer-Encoding", "8bit"),
            )
            .unwrap();
        assert_eq!(part.header("Content-Type"), Some("application/pdf; name=\"a.pdf\""));
        assert_eq!(part.header("Content-Transfer-Encoding"), Some("8bit"));
    }

    #[test]
    fn test_standard_encoding_is_written_canonically() {
        let mut msg = MimeMessage::new();
        let part = msg
            .add_message(MessageOptions::text("x").encoding("BASE64 "))
            .unwrap();
        assert_eq!(part.header("Content-Type"), Some("text/plain; charset=UTF-8"));
        assert_eq!(part.header("Content-Transfer-Encoding"), Some("base64"));

        let part = msg
            .add_attachment(AttachmentOptions::new("a.txt", "x").encoding("Quoted-Printable"))
            .unwrap();
        assert_eq!(part.header("Content-Type"), Some("none; name=\"a.txt\""));
        assert_eq!(part.header("Content-Transfer-Encoding"), Some("quoted-printable"));
    }

    #[test]
    fn test_header_lines_cannot_be_injected() {
        let mut msg = message();
        add_plain(&mut msg);

        let err = msg.set_header("X-A", "v\r\nBcc: evil@x.com").unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(_)));

        let err = msg
            .add_attachment(AttachmentOptions::new("a.txt\r\nX-Evil: 1", "x"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFilename(_)));

        let err = msg
            .add_attachment(AttachmentOptions::new("a.png", "x").content_id("logo\r\nX-Evil: 1"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(_)));

        let err = msg
            .add_message(MessageOptions::html("<p>x</p>").charset("utf-8\nX-Evil: 1"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(_)));

        assert_eq!(msg.parts().len(), 1);
        let raw = msg.render().unwrap();
        assert!(!raw.contains("Bcc:"));
        assert!(!raw.contains("X-Evil"));
    }

    #[test]
    fn test_message_level_content_headers_are_rejected() {
        let mut msg = message();
        add_plain(&mut msg);
        add_html(&mut msg);

        for name in ["Content-Type", "content-type", "Content-Transfer-Encoding"] {
            let err = msg.set_header(name, "text/plain").unwrap_err();
            assert!(matches!(err, Error::InvalidHeaderField(_)));
        }
        assert!(msg.set_headers([("X-Ok", "1"), ("Content-Type", "text/plain")]).is_err());
        assert!(msg.header("X-Ok").is_some());

        let raw = msg.render().unwrap();
        assert_eq!(raw.matches("Content-Type:").count(), 3);
    }

    #[test]
    fn test_empty_recipient_list_is_rejected() {
        let mut msg = message();
        let err = msg.set_cc(Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(ref name) if name == "Cc"));

        let err = msg.set_to(Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderValue(_)));
        assert_eq!(msg.recipients(MailboxRole::To).len(), 1);
    }

    #[test]
    fn test_content_id_wrapping() {
        assert_eq!(wrap_content_id("logo"), "<logo>");
        assert_eq!(wrap_content_id("<logo>"), "<logo>");
        assert_eq!(wrap_content_id(""), "");
    }

    #[test]
    fn test_quote_filename() {
        assert_eq!(quote_filename("a.txt"), "\"a.txt\"");
        assert_eq!(quote_filename("say \"hi\".txt"), "\"say \\\"hi\\\".txt\"");
    }

    #[test]
    fn test_message_by_type_skips_attachments() {
        let mut msg = MimeMessage::new();
        msg.add_attachment(AttachmentOptions::new("a.txt", "x").content_type("text/plain"))
            .unwrap();
        assert!(msg.message_by_type("text/plain").is_none());

        add_plain(&mut msg);
        assert_eq!(msg.message_by_type("text/plain").unwrap().data(), "plain body");
    }

    #[test]
    fn test_config_defaults_apply() {
        let config = Config::builder()
            .charset("utf-8")
            .message_encoding(TransferEncoding::QuotedPrintable)
            .attachment_encoding(TransferEncoding::SevenBit)
            .boundary_length(40)
            .build();
        let mut msg = MimeMessage::with_config(config);
        assert_eq!(msg.boundaries().mixed().len(), 40);

        let part = msg.add_message(MessageOptions::text("x")).unwrap();
        assert_eq!(part.header("Content-Type"), Some("text/plain; charset=utf-8"));
        assert_eq!(part.header("Content-Transfer-Encoding"), Some("quoted-printable"));

        let part = msg.add_attachment(AttachmentOptions::new("a", "x")).unwrap();
        assert_eq!(part.header("Content-Transfer-Encoding"), Some("7bit"));
    }

    #[test]
    fn test_lorem_ipsum_single_part() {
        let mut msg = MimeMessage::new();
        msg.set_sender(AddressInput::structured("lorem@ipsum.com", Some("Lorem Ipsum")))
            .unwrap();
        msg.set_recipient("foo@test.com").unwrap();
        msg.set_subject("Hi").unwrap();
        msg.add_message(MessageOptions::text("Hi, I'm a simple text."))
            .unwrap();

        let raw = msg.render().unwrap();
        assert!(raw.contains("\r\nFrom: =?utf-8?B?TG9yZW0gSXBzdW0=?= <lorem@ipsum.com>\r\n"));
        assert!(raw.contains("\r\nTo: <foo@test.com>\r\n"));
        assert!(raw.ends_with("\r\n\r\nHi, I'm a simple text."));
        assert!(!raw.contains("boundary="));
        for boundary in msg.boundaries().all() {
            assert!(!raw.contains(boundary));
        }
    }

    #[test]
    fn test_two_attachments_share_mixed_boundary() {
        let mut msg = message();
        add_plain(&mut msg);
        add_attachment(&mut msg);
        msg.add_attachment(AttachmentOptions::new("b.txt", "Yg==").content_type("text/plain"))
            .unwrap();
        let m = msg.boundaries().mixed().to_string();

        let raw = msg.render().unwrap();
        let first = raw.find(&format!("--{m}\r\n{ATTACHMENT}")).unwrap();
        let second = raw.find("filename=\"b.txt\"\r\n\r\nYg==").unwrap();
        assert!(first < second);
        assert!(raw.ends_with(&format!("Yg==\r\n--{m}--")));
        assert_eq!(raw.matches(&format!("--{m}\r\n")).count(), 3);
    }

    #[test]
    fn test_part_with_both_dispositions_is_in_both_lists() {
        let mut msg = message();
        add_html(&mut msg);
        msg.parts.push(
            BodyPart::new(
                "eA==",
                [("Content-Disposition", "attachment; inline; filename=\"x.png\"")],
            )
            .unwrap(),
        );

        assert_eq!(msg.structure().unwrap(), Structure::MixedRelated);
        assert_eq!(msg.attachments().count(), 1);
        assert_eq!(msg.inline_attachments().count(), 1);
        assert_eq!(msg.render().unwrap().matches("eA==").count(), 2);
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut msg = MimeMessage::new();
        msg.set_sender("a@example.com").unwrap();
        msg.set_subject("Hi").unwrap();
        add_plain(&mut msg);
        add_attachment(&mut msg);

        let first = msg.render().unwrap();
        assert_eq!(msg.render().unwrap(), first);
    }

    proptest! {
        #[test]
        fn boundaries_are_distinct_for_any_length(length in 0usize..200) {
            let config = Config::builder().boundary_length(length).build();
            let msg = MimeMessage::with_config(config);
            let [mixed, alternative, related] = msg.boundaries().all();
            prop_assert!(mixed != alternative && mixed != related && alternative != related);
            prop_assert_eq!(mixed.len(), length.clamp(8, 70));
        }
    }
}
