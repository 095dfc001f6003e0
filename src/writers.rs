//! Streaming writers for the three conversion outputs.
//!
//! Each record is serialized in memory first and handed to the stream in a single
//! write followed by a flush. A failed write drops the whole record, so an
//! interrupted conversion leaves a well-formed prefix.

use std::io::Write;

use quick_xml::{
    Writer,
    events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{
    config::ConvertOptions, error::Error, format_log::FormatEntry, ids::TagId,
    unit::TranslationUnit,
};

const XLIFF_VERSION: &str = "1.2";
const XLIFF_NAMESPACE: &str = "urn:oasis:names:tc:xliff:document:1.2";

type RecordWriter = Writer<Vec<u8>>;

/// Splits `content` so that no section contains `]]>`.
fn cdata_sections(content: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = content;
    while let Some(index) = rest.find("]]>") {
        sections.push(&rest[..index + 2]);
        rest = &rest[index + 2..];
    }
    sections.push(rest);
    sections
}

fn write_cdata(writer: &mut RecordWriter, content: &str) -> Result<(), Error> {
    for section in cdata_sections(content) {
        writer.write_event(Event::CData(BytesCData::new(section)))?;
    }
    Ok(())
}

fn newline(writer: &mut RecordWriter) -> Result<(), Error> {
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(())
}

fn declaration(writer: &mut RecordWriter) -> Result<(), Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    newline(writer)
}

/// Serializes one record and sends it to `inner` as a single write.
fn commit<W, F>(inner: &mut W, build: F) -> Result<(), Error>
where
    W: Write,
    F: FnOnce(&mut RecordWriter) -> Result<(), Error>,
{
    let mut writer = Writer::new(Vec::new());
    build(&mut writer)?;
    inner.write_all(&writer.into_inner())?;
    inner.flush()?;
    Ok(())
}

/// Writes `</name>` and a line break.
fn close_element(writer: &mut RecordWriter, name: &str) -> Result<(), Error> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    newline(writer)
}

/// The XLIFF 1.2 document holding the translation units.
pub struct XliffWriter<W: Write> {
    inner: W,
}

impl<W: Write> XliffWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes everything up to and including the opening `<body>`.
    pub fn start(&mut self, options: &ConvertOptions) -> Result<(), Error> {
        commit(&mut self.inner, |writer| {
            declaration(writer)?;

            let mut xliff = BytesStart::new("xliff");
            xliff.push_attribute(("version", XLIFF_VERSION));
            xliff.push_attribute(("xmlns", XLIFF_NAMESPACE));
            writer.write_event(Event::Start(xliff))?;
            newline(writer)?;

            let mut file = BytesStart::new("file");
            file.push_attribute(("original", options.original.as_str()));
            file.push_attribute(("datatype", options.datatype.as_str()));
            file.push_attribute(("source-language", options.source_language.as_str()));
            writer.write_event(Event::Start(file))?;
            newline(writer)?;

            writer.write_event(Event::Start(BytesStart::new("header")))?;
            let mut prop = BytesStart::new("prop");
            prop.push_attribute(("prop-type", "segmentation"));
            writer.write_event(Event::Start(prop))?;
            let mode = options.segmentation.to_string();
            writer.write_event(Event::Text(BytesText::new(&mode)))?;
            writer.write_event(Event::End(BytesEnd::new("prop")))?;
            close_element(writer, "header")?;

            writer.write_event(Event::Start(BytesStart::new("body")))?;
            newline(writer)
        })
    }

    pub fn write_unit(&mut self, unit: &TranslationUnit, language: &str) -> Result<(), Error> {
        commit(&mut self.inner, |writer| {
            let mut element = BytesStart::new("trans-unit");
            element.push_attribute(("id", unit.id.as_str()));
            if let Some(paragraph_id) = &unit.paragraph_id {
                element.push_attribute(("paragraph-id", paragraph_id.as_str()));
            }
            if unit.mergeable {
                element.push_attribute(("mergeable", "true"));
            }
            writer.write_event(Event::Start(element))?;

            let mut source = BytesStart::new("source");
            source.push_attribute(("xml:lang", language));
            writer.write_event(Event::Start(source))?;
            // Already serialized inline markup: written as is.
            writer.write_event(Event::Text(BytesText::from_escaped(unit.source.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("source")))?;
            close_element(writer, "trans-unit")
        })
    }

    pub fn finish(mut self) -> Result<W, Error> {
        commit(&mut self.inner, |writer| {
            close_element(writer, "body")?;
            close_element(writer, "file")?;
            close_element(writer, "xliff")
        })?;
        Ok(self.inner)
    }
}

/// One record of the skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkeletonRecord {
    /// Native opening block markup.
    Open(String),
    Close(String),
    Empty(String),
    /// Text between units that is not part of any unit.
    Text(String),
    /// Back-reference to a translation unit.
    Unit {
        id: String,
        length: usize,
        no: usize,
        of: usize,
    },
    /// Back-reference to a format-log entry.
    Format(TagId),
}

fn markup_record(writer: &mut RecordWriter, name: &str, seq: &str, markup: &str) -> Result<(), Error> {
    let mut element = BytesStart::new(name);
    element.push_attribute(("seq", seq));
    writer.write_event(Event::Start(element))?;
    write_cdata(writer, markup)?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// The skeleton: document structure with references into the XLIFF and format outputs.
pub struct SkeletonWriter<W: Write> {
    inner: W,
    seq: u64,
}

impl<W: Write> SkeletonWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, seq: 0 }
    }

    pub fn start(&mut self, original: &str) -> Result<(), Error> {
        commit(&mut self.inner, |writer| {
            declaration(writer)?;
            let mut skeleton = BytesStart::new("skeleton");
            skeleton.push_attribute(("original", original));
            writer.write_event(Event::Start(skeleton))?;
            newline(writer)
        })
    }

    /// Appends `record` under the next sequence number. A record that fails to
    /// write does not use up its number.
    pub fn write(&mut self, record: &SkeletonRecord) -> Result<(), Error> {
        let seq = (self.seq + 1).to_string();
        commit(&mut self.inner, |writer| {
            match record {
                SkeletonRecord::Open(markup) => markup_record(writer, "open", &seq, markup)?,
                SkeletonRecord::Close(markup) => markup_record(writer, "close", &seq, markup)?,
                SkeletonRecord::Empty(markup) => markup_record(writer, "empty", &seq, markup)?,
                SkeletonRecord::Text(text) => {
                    let mut element = BytesStart::new("text");
                    element.push_attribute(("seq", seq.as_str()));
                    writer.write_event(Event::Start(element))?;
                    writer.write_event(Event::Text(BytesText::new(text)))?;
                    writer.write_event(Event::End(BytesEnd::new("text")))?;
                }
                SkeletonRecord::Unit { id, length, no, of } => {
                    let mut element = BytesStart::new("tu");
                    element.push_attribute(("seq", seq.as_str()));
                    element.push_attribute(("id", id.as_str()));
                    element.push_attribute(("length", length.to_string().as_str()));
                    element.push_attribute(("no", no.to_string().as_str()));
                    element.push_attribute(("of", of.to_string().as_str()));
                    writer.write_event(Event::Empty(element))?;
                }
                SkeletonRecord::Format(id) => {
                    let mut element = BytesStart::new("format");
                    element.push_attribute(("seq", seq.as_str()));
                    element.push_attribute(("id", id.to_string().as_str()));
                    writer.write_event(Event::Empty(element))?;
                }
            }
            newline(writer)
        })?;
        self.seq += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records(&self) -> u64 {
        self.seq
    }

    pub fn finish(mut self) -> Result<W, Error> {
        commit(&mut self.inner, |writer| close_element(writer, "skeleton"))?;
        Ok(self.inner)
    }
}

/// The format stream: one `<tag>` per format-log entry.
pub struct FormatWriter<W: Write> {
    inner: W,
}

impl<W: Write> FormatWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn start(&mut self, original: &str) -> Result<(), Error> {
        commit(&mut self.inner, |writer| {
            declaration(writer)?;
            let mut format = BytesStart::new("format");
            format.push_attribute(("original", original));
            writer.write_event(Event::Start(format))?;
            newline(writer)
        })
    }

    pub fn write_entry(&mut self, entry: &FormatEntry) -> Result<(), Error> {
        commit(&mut self.inner, |writer| {
            let mut tag = BytesStart::new("tag");
            tag.push_attribute(("id", entry.id.to_string().as_str()));
            if entry.recursive {
                tag.push_attribute(("recursive", "yes"));
            }
            writer.write_event(Event::Start(tag))?;
            write_cdata(writer, &entry.markup)?;
            close_element(writer, "tag")
        })
    }

    pub fn finish(mut self) -> Result<W, Error> {
        commit(&mut self.inner, |writer| close_element(writer, "format"))?;
        Ok(self.inner)
    }
}

/// The three outputs of one document conversion.
pub struct Outputs<W: Write> {
    pub xliff: XliffWriter<W>,
    pub skeleton: SkeletonWriter<W>,
    pub format: FormatWriter<W>,
}

impl<W: Write> Outputs<W> {
    pub fn new(xliff: W, skeleton: W, format: W) -> Self {
        Self {
            xliff: XliffWriter::new(xliff),
            skeleton: SkeletonWriter::new(skeleton),
            format: FormatWriter::new(format),
        }
    }

    /// Writes the prologue of all three outputs.
    pub fn start(&mut self, options: &ConvertOptions) -> Result<(), Error> {
        self.xliff.start(options)?;
        self.skeleton.start(&options.original)?;
        self.format.start(&options.original)
    }

    /// Closes all three outputs and hands back the streams as
    /// `(xliff, skeleton, format)`.
    pub fn finish(self) -> Result<(W, W, W), Error> {
        Ok((
            self.xliff.finish()?,
            self.skeleton.finish()?,
            self.format.finish()?,
        ))
    }
}

/// A stream that rejects chosen write calls, counting from 1.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FailingWriter {
    pub bytes: Vec<u8>,
    pub fail_on: Vec<usize>,
    calls: usize,
}

#[cfg(test)]
impl FailingWriter {
    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_on: calls.to_vec(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.bytes.clone()).unwrap()
    }
}

#[cfg(test)]
impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.calls += 1;
        if self.fail_on.contains(&self.calls) {
            return Err(std::io::Error::other("disk full"));
        }
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
