//! Error types for MIME composition.

use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME composition error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Address input matches none of the accepted mailbox forms.
    #[error("Invalid mailbox: {0}")]
    InvalidMailbox(String),

    /// A required header has neither a value nor a generator.
    #[error("The \"{0}\" header is required")]
    MissingHeader(String),

    /// No text/plain or text/html part was added.
    #[error("No content added to the message")]
    MissingBody,

    /// Unsupported or empty content type.
    #[error("Invalid message type: {0}")]
    InvalidMessageType(String),

    /// Attachment added without a filename.
    #[error("The filename must exist while adding attachments")]
    MissingFilename,

    /// Attachment filename that cannot be placed in a header parameter.
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// Value rejected by the header field's validator.
    #[error("Invalid value for the header {0}")]
    InvalidHeaderValue(String),

    /// Malformed custom header field.
    #[error("Invalid header field: {0}")]
    InvalidHeaderField(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),
}

impl Error {
    /// Returns the stable kind code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidMailbox(_) => "MIMETEXT_INVALID_MAILBOX",
            Self::MissingHeader(_) => "MIMETEXT_MISSING_HEADER",
            Self::MissingBody => "MIMETEXT_MISSING_BODY",
            Self::InvalidMessageType(_) => "MIMETEXT_INVALID_MESSAGE_TYPE",
            Self::MissingFilename => "MIMETEXT_MISSING_FILENAME",
            Self::InvalidFilename(_) => "MIMETEXT_INVALID_FILENAME",
            Self::InvalidHeaderValue(_) => "MIMETEXT_INVALID_HEADER_VALUE",
            Self::InvalidHeaderField(_) => "MIMETEXT_INVALID_HEADER_FIELD",
            Self::Base64Decode(_) | Self::Utf8Decode(_) => "MIMETEXT_DECODE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::MissingBody.code(), "MIMETEXT_MISSING_BODY");
        assert_eq!(
            Error::MissingHeader("From".into()).code(),
            "MIMETEXT_MISSING_HEADER"
        );
        assert_eq!(Error::MissingFilename.code(), "MIMETEXT_MISSING_FILENAME");
        assert_eq!(
            Error::InvalidFilename("a\nb".into()).code(),
            "MIMETEXT_INVALID_FILENAME"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::MissingHeader("From".into());
        assert_eq!(err.to_string(), "The \"From\" header is required");
    }
}
