//! Seams between format-specific readers and the conversion core.

use crate::{ctype::native_ctype, error::Error};

/// Ordered `(name, value)` attribute list of a native element.
pub type Attributes = [(String, String)];

/// Receives the event stream of one native document.
///
/// Implementations may assume opens and closes are nested per the native
/// format's own grammar; they do not validate it.
pub trait EventSink {
    fn document_start(&mut self) -> Result<(), Error>;

    fn element_open(&mut self, name: &str, attributes: &Attributes) -> Result<(), Error>;

    fn element_close(&mut self, name: &str) -> Result<(), Error>;

    /// An element with no content. Defaults to an open directly followed by a close.
    fn element_empty(&mut self, name: &str, attributes: &Attributes) -> Result<(), Error> {
        self.element_open(name, attributes)?;
        self.element_close(name)
    }

    fn text(&mut self, characters: &str) -> Result<(), Error>;

    /// Native content that must be kept verbatim (comments, processing instructions…).
    fn verbatim(&mut self, _markup: &str) -> Result<(), Error> {
        Ok(())
    }

    fn document_end(&mut self) -> Result<(), Error>;
}

/// Produces the event stream of one native document.
pub trait EventSource {
    fn drive<S: EventSink>(self, sink: &mut S) -> Result<(), Error>;
}

/// How the conversion core treats a native element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRole {
    /// Starts and ends candidate units; recorded in the skeleton only.
    Block,
    /// Inline element enclosing text: `bx` … `ex`.
    Spanning,
    /// Inline element without text: `x`.
    Atomic,
    /// Element whose whole content is kept verbatim and never translated.
    Opaque,
}

/// Format-specific classification of native elements.
pub trait TagClassifier {
    fn role(&self, name: &str, attributes: &Attributes) -> TagRole;

    /// Attributes of `name` whose values are translatable text.
    fn translatable_attributes(&self, _name: &str) -> &[&str] {
        &[]
    }

    fn ctype(&self, name: &str, _attributes: &Attributes) -> String {
        native_ctype(name)
    }

    /// Spanning elements that only mark a location (e.g. `<a name="x">`).
    fn is_bookmark(&self, _name: &str, _attributes: &Attributes) -> bool {
        false
    }
}
