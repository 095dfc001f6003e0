//! All error types for the xliffconv crate.
//!
//! Only resource-level failures (opening input, creating outputs, undecodable or
//! unsupported input) abort a conversion. Per-record write failures and bookkeeping
//! inconsistencies are logged and recovered where they happen.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid markup: {0}")]
    InvalidMarkup(String),

    #[error("closing placeholder without an open reference id")]
    RidUnderflow,

    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("decode error: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Creates a new decode error with optional source error
    pub fn decode_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Decode {
            message: message.into(),
            source,
        }
    }

    /// Creates a new unsupported-input error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedInput(message.into())
    }

    /// Whether this error must abort the conversion of the current document.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::RidUnderflow)
    }
}
