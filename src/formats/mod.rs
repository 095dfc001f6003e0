pub mod xhtml;

// Reexporting the readers for easier access
pub use xhtml::{HtmlClassifier, XmlEventSource};

use std::{fmt::Display, path::Path};

use crate::error::Error;

/// Native input formats with a built-in event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// HTML written as well-formed XML.
    Xhtml,
    /// Any other well-formed XML, classified with the HTML table.
    Xml,
}

impl FormatType {
    /// Infers the format from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "html" | "htm" | "xhtml" => Ok(FormatType::Xhtml),
            "xml" => Ok(FormatType::Xml),
            other => Err(Error::unsupported(format!(
                "no reader for `.{}` files",
                other
            ))),
        }
    }

    /// XLIFF `datatype` attribute value.
    pub fn datatype(&self) -> &'static str {
        match self {
            FormatType::Xhtml => "html",
            FormatType::Xml => "xml",
        }
    }
}

impl Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatType::Xhtml => write!(f, "XHTML"),
            FormatType::Xml => write!(f, "XML"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(FormatType::from_path("a/page.HTML").unwrap(), FormatType::Xhtml);
        assert_eq!(FormatType::from_path("doc.xml").unwrap().datatype(), "xml");
        assert!(matches!(
            FormatType::from_path("slides.pdf"),
            Err(Error::UnsupportedInput(_))
        ));
        assert!(FormatType::from_path("README").is_err());
    }
}
