//! Event source for well-formed XML and the HTML element classification.

use std::io::BufRead;

use quick_xml::{
    Reader,
    escape::resolve_predefined_entity,
    events::{BytesStart, Event},
};

use crate::{
    error::Error,
    traits::{Attributes, EventSink, EventSource, TagClassifier, TagRole},
};

const BLOCK_ELEMENTS: &[&str] = &[
    "html", "head", "body", "title", "meta", "link", "base", "p", "div", "h1", "h2", "h3", "h4",
    "h5", "h6", "ul", "ol", "li", "dl", "dt", "dd", "table", "thead", "tbody", "tfoot", "tr",
    "td", "th", "caption", "colgroup", "col", "blockquote", "pre", "section", "article", "header",
    "footer", "nav", "aside", "main", "figure", "figcaption", "address", "hr", "form", "fieldset",
    "legend", "select", "option", "optgroup", "textarea", "details", "summary", "center",
];

const ATOMIC_ELEMENTS: &[&str] = &[
    "br", "img", "input", "wbr", "area", "embed", "param", "source", "track",
];

const OPAQUE_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Named entities accepted besides the five predefined XML ones.
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("nbsp", "\u{a0}"),
    ("shy", "\u{ad}"),
    ("copy", "©"),
    ("reg", "®"),
    ("trade", "™"),
    ("mdash", "—"),
    ("ndash", "–"),
    ("hellip", "…"),
    ("laquo", "«"),
    ("raquo", "»"),
    ("lsquo", "‘"),
    ("rsquo", "’"),
    ("ldquo", "“"),
    ("rdquo", "”"),
    ("euro", "€"),
];

fn resolve_entity(entity: &str) -> Option<&'static str> {
    resolve_predefined_entity(entity).or_else(|| {
        HTML_ENTITIES
            .iter()
            .find(|(name, _)| *name == entity)
            .map(|(_, value)| *value)
    })
}

/// Element classification for (X)HTML.
///
/// Elements not listed as block, atomic or opaque are inline spans.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlClassifier;

impl TagClassifier for HtmlClassifier {
    fn role(&self, name: &str, _attributes: &Attributes) -> TagRole {
        let name = name.to_ascii_lowercase();
        let name = name.as_str();
        if BLOCK_ELEMENTS.contains(&name) {
            TagRole::Block
        } else if ATOMIC_ELEMENTS.contains(&name) {
            TagRole::Atomic
        } else if OPAQUE_ELEMENTS.contains(&name) {
            TagRole::Opaque
        } else {
            TagRole::Spanning
        }
    }

    fn translatable_attributes(&self, name: &str) -> &[&str] {
        match name.to_ascii_lowercase().as_str() {
            "img" | "area" => &["alt", "title"],
            "input" | "textarea" => &["placeholder", "title"],
            "table" => &["summary", "title"],
            "option" | "optgroup" | "track" => &["label", "title"],
            _ => &["title"],
        }
    }

    fn is_bookmark(&self, name: &str, attributes: &Attributes) -> bool {
        let has = |key: &str| attributes.iter().any(|(k, _)| k.eq_ignore_ascii_case(key));
        name.eq_ignore_ascii_case("a") && (has("name") || has("id")) && !has("href")
    }
}

/// Turns a well-formed XML document into [`EventSink`] calls.
pub struct XmlEventSource<R: BufRead> {
    reader: Reader<R>,
}

impl<R: BufRead> XmlEventSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: Reader::from_reader(reader),
        }
    }
}

impl<'a> XmlEventSource<&'a [u8]> {
    pub fn from_str(content: &'a str) -> Self {
        Self::from_reader(content.as_bytes())
    }
}

fn element_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

fn attributes(element: &BytesStart) -> Result<Vec<(String, String)>, Error> {
    let mut attributes = Vec::new();
    for attr in element.attributes() {
        let attr = attr?;
        let value = attr.unescape_value_with(resolve_entity)?.into_owned();
        attributes.push((element_name(attr.key.as_ref()), value));
    }
    Ok(attributes)
}

/// XML Encryption payloads cannot be converted.
fn check_root(element: &BytesStart) -> Result<(), Error> {
    if element.local_name().as_ref() == b"EncryptedData" {
        return Err(Error::unsupported(
            "document is encrypted (XML Encryption EncryptedData root)",
        ));
    }
    Ok(())
}

impl<R: BufRead> EventSource for XmlEventSource<R> {
    fn drive<S: EventSink>(mut self, sink: &mut S) -> Result<(), Error> {
        sink.document_start()?;
        let mut buf = Vec::new();
        let mut root_seen = false;

        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    if !root_seen {
                        check_root(&e)?;
                        root_seen = true;
                    }
                    sink.element_open(&element_name(e.name().as_ref()), &attributes(&e)?)?;
                }
                Event::Empty(e) => {
                    if !root_seen {
                        check_root(&e)?;
                        root_seen = true;
                    }
                    sink.element_empty(&element_name(e.name().as_ref()), &attributes(&e)?)?;
                }
                Event::End(e) => sink.element_close(&element_name(e.name().as_ref()))?,
                Event::Text(e) => sink.text(&e.unescape_with(resolve_entity)?)?,
                Event::CData(e) => sink.text(&String::from_utf8_lossy(&e))?,
                Event::Comment(e) => {
                    sink.verbatim(&format!("<!--{}-->", String::from_utf8_lossy(&e)))?
                }
                Event::PI(e) => sink.verbatim(&format!("<?{}?>", String::from_utf8_lossy(&e)))?,
                Event::DocType(e) => {
                    sink.verbatim(&format!("<!DOCTYPE {}>", String::from_utf8_lossy(&e)))?
                }
                Event::Decl(_) => {}
                Event::Eof => break,
            }
            buf.clear();
        }

        sink.document_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records events as compact strings.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl EventSink for Recorder {
        fn document_start(&mut self) -> Result<(), Error> {
            self.events.push("start".to_string());
            Ok(())
        }

        fn element_open(&mut self, name: &str, attributes: &Attributes) -> Result<(), Error> {
            let attributes: Vec<String> = attributes.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            self.events.push(format!("<{} {}>", name, attributes.join(",")));
            Ok(())
        }

        fn element_close(&mut self, name: &str) -> Result<(), Error> {
            self.events.push(format!("</{}>", name));
            Ok(())
        }

        fn text(&mut self, characters: &str) -> Result<(), Error> {
            self.events.push(format!("'{}'", characters));
            Ok(())
        }

        fn verbatim(&mut self, markup: &str) -> Result<(), Error> {
            self.events.push(markup.to_string());
            Ok(())
        }

        fn document_end(&mut self) -> Result<(), Error> {
            self.events.push("end".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_events_in_document_order() {
        let mut recorder = Recorder::default();
        XmlEventSource::from_str("<p class=\"a&amp;b\">Tom &amp; Jerry<br/><!-- c --></p>")
            .drive(&mut recorder)
            .unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "start",
                "<p class=a&b>",
                "'Tom & Jerry'",
                "<br >",
                "</br>",
                "<!-- c -->",
                "</p>",
                "end"
            ]
        );
    }

    #[test]
    fn test_html_entities_are_resolved() {
        let mut recorder = Recorder::default();
        XmlEventSource::from_str("<p>a&nbsp;b&hellip;</p>")
            .drive(&mut recorder)
            .unwrap();
        assert_eq!(recorder.events[2], "'a\u{a0}b…'");
    }

    #[test]
    fn test_encrypted_document_is_rejected() {
        let mut recorder = Recorder::default();
        let result = XmlEventSource::from_str(
            "<EncryptedData xmlns=\"http://www.w3.org/2001/04/xmlenc#\"><CipherData/></EncryptedData>",
        )
        .drive(&mut recorder);
        assert!(matches!(result, Err(Error::UnsupportedInput(_))));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let mut recorder = Recorder::default();
        let result = XmlEventSource::from_str("<p>open <b>bold</p>").drive(&mut recorder);
        assert!(matches!(result, Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_html_roles() {
        let classifier = HtmlClassifier;
        assert_eq!(classifier.role("P", &[]), TagRole::Block);
        assert_eq!(classifier.role("img", &[]), TagRole::Atomic);
        assert_eq!(classifier.role("script", &[]), TagRole::Opaque);
        assert_eq!(classifier.role("strong", &[]), TagRole::Spanning);
        assert_eq!(classifier.translatable_attributes("img"), &["alt", "title"]);
    }

    #[test]
    fn test_bookmark_anchor() {
        let classifier = HtmlClassifier;
        let named = vec![("name".to_string(), "top".to_string())];
        let linked = vec![
            ("name".to_string(), "top".to_string()),
            ("href".to_string(), "#a".to_string()),
        ];
        assert!(classifier.is_bookmark("a", &named));
        assert!(!classifier.is_bookmark("a", &linked));
        assert!(!classifier.is_bookmark("span", &named));
    }
}
