//! # mimetext
//!
//! MIME message composition for email.
//!
//! ## Features
//!
//! - **Headers**: Ordered header collections with validation, RFC 2047
//!   encoded-word rendering and generated `Date`/`Message-ID` values
//! - **Mailboxes**: Parsing of `Name <addr>`, `<addr>` and bare addresses
//! - **Multipart**: Mixed, alternative and related layouts chosen from the
//!   parts added
//! - **Encoding**: Base64, base64url and Quoted-Printable helpers
//!
//! ## Quick Start
//!
//! ### Plain and HTML bodies
//!
//! ```ignore
//! use mimetext::{MessageOptions, MimeMessage};
//!
//! let mut msg = MimeMessage::new();
//! msg.set_sender("Lorem Ipsum <lorem@ipsum.com>")?;
//! msg.set_to(["foo@test.com", "Bar <bar@test.com>"])?;
//! msg.set_subject("Hello")?;
//! msg.add_message(MessageOptions::text("Hello, World!"))?;
//! msg.add_message(MessageOptions::html("<h1>Hello, World!</h1>"))?;
//!
//! let raw = msg.render()?; // multipart/alternative
//! ```
//!
//! ### Attachments
//!
//! ```ignore
//! use mimetext::{AttachmentOptions, MessageOptions, MimeMessage, encoding::encode_base64};
//!
//! let mut msg = MimeMessage::new();
//! msg.set_sender("sender@example.com")?;
//! msg.set_subject("Report")?;
//! msg.add_message(MessageOptions::text("See attached."))?;
//! msg.add_attachment(
//!     AttachmentOptions::new("report.csv", encode_base64(b"a,b\n1,2"))
//!         .content_type("text/csv"),
//! )?;
//!
//! // Gmail-style API payload
//! let payload = msg.render_encoded()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod content_type;
mod error;
mod header;
mod mailbox;
mod message;
mod part;
mod token;
mod validate;

pub mod encoding;

pub use config::{Config, ConfigBuilder};
pub use content_type::{ContentType, MultipartKind};
pub use error::{Error, Result};
pub use header::{
    FieldSet, Generator, HeaderCollection, HeaderField, HeaderValue, MessageFields, MessageHeaders,
    PartFields, PartHeaders, Renderer, Validator,
};
pub use mailbox::{AddressInput, AddressList, Mailbox, MailboxRole};
pub use message::{AttachmentOptions, Boundaries, MessageOptions, MimeMessage, Structure};
pub use part::BodyPart;
pub use validate::{TextType, TransferEncoding, is_known_charset, is_valid_field_name};
