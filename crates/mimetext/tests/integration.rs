//! Integration tests for message composition.
//!
//! These tests drive the public API end to end and check the rendered
//! message text.

use mimetext::encoding::{decode_base64url, encode_base64, encode_quoted_printable};
use mimetext::{
    AddressInput, AttachmentOptions, Config, Error, MailboxRole, MessageOptions, MimeMessage,
    Structure, TransferEncoding,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("mimetext=trace")
        .try_init();
}

fn lorem_ipsum() -> MimeMessage {
    let mut msg = MimeMessage::new();
    msg.set_sender("Lorem Ipsum <lorem@ipsum.com>").unwrap();
    msg.set_to(["foo@test.com", "Bar Baz <bar@test.com>"]).unwrap();
    msg.set_cc("cc@test.com").unwrap();
    msg.set_subject("Lorem Ipsum").unwrap();
    msg
}

#[test]
fn test_full_message_with_attachment() {
    init_tracing();

    let mut msg = lorem_ipsum();
    msg.set_header("X-Mailer", "mimetext").unwrap();
    msg.add_message(MessageOptions::text("Lorem ipsum dolor sit amet."))
        .unwrap();
    msg.add_message(MessageOptions::html("<p>Lorem ipsum dolor sit amet.</p>"))
        .unwrap();
    msg.add_attachment(
        AttachmentOptions::new("data.csv", encode_base64(b"a,b\r\n1,2"))
            .content_type("text/csv"),
    )
    .unwrap();

    assert_eq!(msg.structure().unwrap(), Structure::Mixed);

    let raw = msg.render().unwrap();
    let mixed = msg.boundaries().mixed();
    let alternative = msg.boundaries().alternative();

    assert!(raw.starts_with("Date: "));
    assert!(raw.contains("\r\nFrom: =?utf-8?B?TG9yZW0gSXBzdW0=?= <lorem@ipsum.com>\r\n"));
    assert!(raw.contains("\r\nTo: <foo@test.com>,\r\n =?utf-8?B?QmFyIEJheg==?= <bar@test.com>\r\n"));
    assert!(raw.contains("\r\nCc: <cc@test.com>\r\n"));
    assert!(raw.contains("\r\nMessage-ID: <"));
    assert!(raw.contains("@ipsum.com>\r\n"));
    assert!(raw.contains("\r\nSubject: =?utf-8?B?TG9yZW0gSXBzdW0=?=\r\n"));
    assert!(raw.contains(&format!(
        "\r\nMIME-Version: 1.0\r\nX-Mailer: mimetext\r\n\
         Content-Type: multipart/mixed; boundary={mixed}\r\n\r\n--{mixed}\r\n"
    )));
    assert!(raw.contains(&format!("Content-Type: multipart/alternative; boundary={alternative}")));
    assert!(raw.contains("Content-Disposition: attachment; filename=\"data.csv\"\r\n\r\nYSxiDQoxLDI="));
    assert!(raw.ends_with(&format!("--{mixed}--")));
    assert!(!raw.contains("\r\n\r\n\r\n"));
}

#[test]
fn test_render_encoded_round_trip() {
    let mut msg = lorem_ipsum();
    msg.add_message(MessageOptions::text("Hello")).unwrap();

    let encoded = msg.render_encoded().unwrap();
    assert!(!encoded.contains('='));
    assert!(!encoded.contains('+'));
    assert!(!encoded.contains('/'));
    assert_eq!(decode_base64url(&encoded).unwrap(), msg.render().unwrap());
}

#[test]
fn test_generated_headers_are_stable() {
    let mut msg = lorem_ipsum();
    msg.add_message(MessageOptions::text("Hello")).unwrap();
    assert!(msg.header("Date").is_none());

    let first = msg.render().unwrap();
    let date = msg.header("Date").and_then(|v| v.as_text()).unwrap().to_string();
    assert!(first.starts_with(&format!("Date: {date}\r\n")));
    assert_eq!(msg.render().unwrap(), first);
}

#[test]
fn test_inline_image_and_attachment() {
    let mut msg = lorem_ipsum();
    msg.add_message(MessageOptions::text("fallback")).unwrap();
    msg.add_message(MessageOptions::html("<img src=\"cid:logo\">"))
        .unwrap();
    msg.add_attachment(
        AttachmentOptions::new("logo.png", "iVBORw0KGgo=")
            .content_type("image/png")
            .content_id("logo")
            .inline(true),
    )
    .unwrap();
    msg.add_attachment(AttachmentOptions::new("a.txt", "YQ==").content_type("text/plain"))
        .unwrap();

    assert_eq!(msg.structure().unwrap(), Structure::MixedRelated);
    assert_eq!(msg.attachments().count(), 1);
    assert_eq!(msg.inline_attachments().count(), 1);

    let raw = msg.render().unwrap();
    let related = msg.boundaries().related();
    assert!(raw.contains("Content-ID: <logo>\r\n"));
    assert!(raw.contains(&format!("--{related}--\r\n--{}\r\n", msg.boundaries().mixed())));
    // Only the HTML body is kept next to inline parts
    assert!(!raw.contains("fallback"));
}

#[test]
fn test_quoted_printable_body() {
    let body = encode_quoted_printable("Grüße aus Köln");
    let mut msg = lorem_ipsum();
    msg.add_message(MessageOptions::text(body.clone()).encoding("quoted-printable"))
        .unwrap();

    let raw = msg.render().unwrap();
    assert!(raw.ends_with(&format!(
        "Content-Type: text/plain; charset=UTF-8\r\n\
         Content-Transfer-Encoding: quoted-printable\r\n\r\n{body}"
    )));
}

#[test]
fn test_recipient_accessors() {
    let mut msg = lorem_ipsum();
    msg.set_bcc(vec![
        AddressInput::structured("hidden@test.com", Some("Hidden")),
        AddressInput::from("other@test.com"),
    ])
    .unwrap();

    assert_eq!(msg.sender().unwrap().address(), "lorem@ipsum.com");
    assert_eq!(msg.recipients(MailboxRole::To).len(), 2);
    assert_eq!(msg.recipients(MailboxRole::To)[1].display_name(), "Bar Baz");

    let bcc = msg.recipients(MailboxRole::Bcc);
    assert_eq!(bcc[0].display_name(), "Hidden");
    assert_eq!(bcc[0].role(), MailboxRole::Bcc);
    assert!(msg.recipients(MailboxRole::ReplyTo).is_empty());
}

#[test]
fn test_error_kinds() {
    let mut msg = MimeMessage::new();
    assert_eq!(msg.render().unwrap_err().code(), "MIMETEXT_MISSING_BODY");

    let err = msg.set_sender("").unwrap_err();
    assert!(matches!(err, Error::InvalidMailbox(_)));

    let err = msg
        .add_message(MessageOptions::new("text/markdown", "# hi"))
        .unwrap_err();
    assert_eq!(err.code(), "MIMETEXT_INVALID_MESSAGE_TYPE");

    msg.add_message(MessageOptions::text("hi")).unwrap();
    assert_eq!(msg.render().unwrap_err().code(), "MIMETEXT_MISSING_HEADER");
}

#[test]
fn test_custom_config() {
    let config = Config::builder()
        .boundary_length(12)
        .attachment_encoding(TransferEncoding::QuotedPrintable)
        .build();
    let mut msg = MimeMessage::with_config(config);
    msg.set_sender("a@example.com").unwrap();
    msg.set_subject("S").unwrap();
    msg.add_message(MessageOptions::text("body")).unwrap();
    msg.add_attachment(AttachmentOptions::new("n.txt", "x")).unwrap();

    assert_eq!(msg.boundaries().mixed().len(), 12);
    let raw = msg.render().unwrap();
    assert!(raw.contains("Content-Type: none; name=\"n.txt\"\r\nContent-Transfer-Encoding: quoted-printable\r\n"));
}
