//! Message composition settings.

use crate::validate::TransferEncoding;

/// Default boundary token length.
const DEFAULT_BOUNDARY_LENGTH: usize = 24;

/// Shortest boundary token accepted by the builder.
const MIN_BOUNDARY_LENGTH: usize = 8;

/// RFC 2046 limit on boundary length.
const MAX_BOUNDARY_LENGTH: usize = 70;

/// Settings applied when composing a message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Length of each generated boundary token.
    pub boundary_length: usize,
    /// Charset used for text parts that do not name one.
    pub charset: String,
    /// Transfer encoding for text parts that do not name one.
    pub message_encoding: TransferEncoding,
    /// Transfer encoding for attachments that do not name one.
    pub attachment_encoding: TransferEncoding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            boundary_length: DEFAULT_BOUNDARY_LENGTH,
            charset: "UTF-8".to_string(),
            message_encoding: TransferEncoding::SevenBit,
            attachment_encoding: TransferEncoding::Base64,
        }
    }
}

impl Config {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Boundary length as used, kept within 8..=70 even if set directly.
    pub(crate) fn effective_boundary_length(&self) -> usize {
        self.boundary_length
            .clamp(MIN_BOUNDARY_LENGTH, MAX_BOUNDARY_LENGTH)
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Sets the boundary token length, clamped to 8..=70.
    #[must_use]
    pub fn boundary_length(mut self, length: usize) -> Self {
        self.config.boundary_length = length.clamp(MIN_BOUNDARY_LENGTH, MAX_BOUNDARY_LENGTH);
        self
    }

    /// Sets the default charset for text parts.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.config.charset = charset.into();
        self
    }

    /// Sets the default transfer encoding for text parts.
    #[must_use]
    pub const fn message_encoding(mut self, encoding: TransferEncoding) -> Self {
        self.config.message_encoding = encoding;
        self
    }

    /// Sets the default transfer encoding for attachments.
    #[must_use]
    pub const fn attachment_encoding(mut self, encoding: TransferEncoding) -> Self {
        self.config.attachment_encoding = encoding;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.boundary_length, 24);
        assert_eq!(config.charset, "UTF-8");
        assert_eq!(config.message_encoding, TransferEncoding::SevenBit);
        assert_eq!(config.attachment_encoding, TransferEncoding::Base64);
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .boundary_length(32)
            .charset("iso-8859-1")
            .message_encoding(TransferEncoding::QuotedPrintable)
            .build();

        assert_eq!(config.boundary_length, 32);
        assert_eq!(config.charset, "iso-8859-1");
        assert_eq!(config.message_encoding, TransferEncoding::QuotedPrintable);
        assert_eq!(config.attachment_encoding, TransferEncoding::Base64);
    }

    #[test]
    fn test_boundary_length_is_clamped() {
        assert_eq!(Config::builder().boundary_length(1).build().boundary_length, 8);
        assert_eq!(Config::builder().boundary_length(500).build().boundary_length, 70);

        let config = Config {
            boundary_length: 0,
            ..Config::default()
        };
        assert_eq!(config.effective_boundary_length(), 8);
    }
}
