//! The document handler: native events in, XLIFF, skeleton and format out.
//!
//! Block elements delimit candidate units. Inline elements are turned into
//! placeholders in the working buffer, and when a block boundary (or the end of
//! the document) is reached the buffered unit runs through the pipeline:
//!
//! ```text
//! mark_core → collapse_core → split_marked → Segmenter::segment → UnitEmitter::emit
//! ```

use std::io::Write;

use serde::Serialize;

use crate::{
    collapse::collapse_core,
    config::ConvertOptions,
    context::ConversionContext,
    core_text::{mark_core, split_marked},
    ctype::NATIVE_CONTENT,
    emitter::{NativeTag, PlaceholderEmitter, TagKind},
    error::Error,
    placeholder::{Token, TokenBuffer, has_visible_text},
    segmenter::Segmenter,
    traits::{Attributes, EventSink, EventSource, TagClassifier, TagRole},
    unit::{UnitEmitter, report},
    writers::{Outputs, SkeletonRecord},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// Translation units written, attribute units included.
    pub units: u64,
    pub format_entries: usize,
    pub skeleton_records: u64,
}

/// Finished outputs of one document.
pub struct Converted<W> {
    pub summary: ConversionSummary,
    pub xliff: W,
    pub skeleton: W,
    pub format: W,
}

pub struct DocumentConverter<C: TagClassifier, W: Write> {
    classifier: C,
    options: ConvertOptions,
    segmenter: Segmenter,
    context: ConversionContext,
    outputs: Outputs<W>,
    buffer: TokenBuffer,
    /// Open native elements with the role they were given.
    elements: Vec<(String, TagRole)>,
    opaque_depth: usize,
}

impl<C: TagClassifier, W: Write> DocumentConverter<C, W> {
    pub fn new(classifier: C, options: ConvertOptions, outputs: Outputs<W>) -> Result<Self, Error> {
        let locale = options.locale()?;
        Ok(Self {
            classifier,
            segmenter: Segmenter::new(options.segmentation, &locale),
            context: ConversionContext::new(options.unit_ids.clone()),
            options,
            outputs,
            buffer: TokenBuffer::new(),
            elements: Vec::new(),
            opaque_depth: 0,
        })
    }

    pub fn context(&self) -> &ConversionContext {
        &self.context
    }

    /// Closes the outputs. Call after `document_end`.
    pub fn finish(self) -> Result<Converted<W>, Error> {
        let summary = ConversionSummary {
            units: self.context.unit_ids.issued(),
            format_entries: self.context.format_log.len(),
            skeleton_records: self.outputs.skeleton.records(),
        };
        let (xliff, skeleton, format) = self.outputs.finish()?;
        Ok(Converted {
            summary,
            xliff,
            skeleton,
            format,
        })
    }

    fn skeleton(&mut self, record: SkeletonRecord) {
        report(self.outputs.skeleton.write(&record), "skeleton record");
    }

    /// Runs the buffered candidate unit through the pipeline.
    fn flush_unit(&mut self) {
        let tokens = self.buffer.take();
        if !tokens.is_empty() {
            let tokens = PlaceholderEmitter::new(&mut self.context).detach_open(tokens);
            self.process(tokens, true);
        }
    }

    /// Converts one candidate unit. Returns its paragraph id when it produced
    /// at least one translation unit.
    fn process(&mut self, tokens: Vec<Token>, in_skeleton: bool) -> Option<String> {
        let marked = mark_core(tokens.clone(), &self.context.bookmarks);
        let unit = if marked.is_empty() {
            None
        } else {
            let (collapsed, stats) = collapse_core(marked, &mut self.context);
            if stats.rewrites > 0 {
                log::debug!(
                    "collapsed {} placeholder sequences in {} passes",
                    stats.rewrites,
                    stats.passes
                );
            }
            split_marked(collapsed)
        };

        let mut emitter = UnitEmitter::new(
            &mut self.context,
            &mut self.outputs,
            self.options.segmentation,
            &self.options.source_language,
        );
        if !in_skeleton {
            emitter = emitter.detached();
        }
        match unit {
            Some(unit) => {
                let segments = self.segmenter.segment(&unit.core);
                emitter.emit(&unit, &segments)
            }
            None => {
                emitter.verbatim(&tokens);
                None
            }
        }
    }

    /// Moves translatable attribute values of `tag` into their own units.
    fn extract_attributes(&mut self, tag: &mut NativeTag) {
        let translatable: Vec<String> = self
            .classifier
            .translatable_attributes(&tag.name)
            .iter()
            .map(|name| name.to_string())
            .collect();
        if translatable.is_empty() {
            return;
        }

        for (key, value) in tag.attributes.clone() {
            if !translatable.iter().any(|name| name.eq_ignore_ascii_case(&key)) {
                continue;
            }
            let tokens = vec![Token::text(value)];
            if !has_visible_text(&tokens) {
                continue;
            }
            if let Some(unit_id) = self.process(tokens, false) {
                log::debug!("attribute `{}` of <{}> extracted as {}", key, tag.name, unit_id);
                tag.extracted.push((key, unit_id));
            }
        }
    }

    fn role_of(&self, name: &str, attributes: &Attributes) -> TagRole {
        if self.opaque_depth > 0 {
            TagRole::Opaque
        } else {
            self.classifier.role(name, attributes)
        }
    }

    /// Handles an element start, with or without content.
    fn start(&mut self, name: &str, attributes: &Attributes, kind: TagKind) {
        let role = self.role_of(name, attributes);
        let mut tag = NativeTag::new(name, attributes, kind);

        match role {
            TagRole::Opaque => {
                if self.opaque_depth == 0 {
                    self.flush_unit();
                }
                self.skeleton(match kind {
                    TagKind::Empty => SkeletonRecord::Empty(tag.markup()),
                    _ => SkeletonRecord::Open(tag.markup()),
                });
            }
            TagRole::Block => {
                self.flush_unit();
                self.extract_attributes(&mut tag);
                self.skeleton(match kind {
                    TagKind::Empty => SkeletonRecord::Empty(tag.markup()),
                    _ => SkeletonRecord::Open(tag.markup()),
                });
            }
            TagRole::Spanning | TagRole::Atomic => {
                self.extract_attributes(&mut tag);
                let ctype = self.classifier.ctype(name, attributes);
                let bookmark = role == TagRole::Spanning && self.classifier.is_bookmark(name, attributes);
                PlaceholderEmitter::new(&mut self.context).emit(&mut self.buffer, &tag, role, &ctype, bookmark);
            }
        }

        if kind != TagKind::Empty {
            if role == TagRole::Opaque {
                self.opaque_depth += 1;
            }
            self.elements.push((name.to_string(), role));
        }
    }
}

impl<C: TagClassifier, W: Write> EventSink for DocumentConverter<C, W> {
    fn document_start(&mut self) -> Result<(), Error> {
        log::debug!(
            "converting `{}` ({} segmentation, {})",
            self.options.original,
            self.options.segmentation,
            self.options.source_language
        );
        self.outputs.start(&self.options)
    }

    fn element_open(&mut self, name: &str, attributes: &Attributes) -> Result<(), Error> {
        self.start(name, attributes, TagKind::Open);
        Ok(())
    }

    fn element_close(&mut self, name: &str) -> Result<(), Error> {
        let role = match self.elements.iter().rposition(|(open, _)| open == name) {
            Some(index) => {
                if index + 1 < self.elements.len() {
                    log::debug!(
                        "`</{}>` also closes {} inner elements",
                        name,
                        self.elements.len() - index - 1
                    );
                }
                let role = self.elements[index].1;
                self.elements.truncate(index);
                role
            }
            None => {
                log::debug!("`</{}>` has no matching start tag", name);
                self.role_of(name, &[])
            }
        };
        let tag = NativeTag::close(name);

        match role {
            TagRole::Opaque => {
                self.opaque_depth = self.opaque_depth.saturating_sub(1);
                self.skeleton(SkeletonRecord::Close(tag.markup()));
            }
            TagRole::Block => {
                self.flush_unit();
                self.skeleton(SkeletonRecord::Close(tag.markup()));
            }
            TagRole::Spanning | TagRole::Atomic => {
                let ctype = self.classifier.ctype(name, &[]);
                PlaceholderEmitter::new(&mut self.context).emit(&mut self.buffer, &tag, role, &ctype, false);
            }
        }
        Ok(())
    }

    fn element_empty(&mut self, name: &str, attributes: &Attributes) -> Result<(), Error> {
        self.start(name, attributes, TagKind::Empty);
        Ok(())
    }

    fn text(&mut self, characters: &str) -> Result<(), Error> {
        if self.opaque_depth > 0 {
            self.skeleton(SkeletonRecord::Text(characters.to_string()));
        } else {
            self.buffer.push_text(characters);
        }
        Ok(())
    }

    fn verbatim(&mut self, markup: &str) -> Result<(), Error> {
        if self.opaque_depth > 0 || self.buffer.is_blank() {
            self.flush_unit();
            self.skeleton(SkeletonRecord::Empty(markup.to_string()));
        } else {
            PlaceholderEmitter::new(&mut self.context).verbatim(&mut self.buffer, markup, NATIVE_CONTENT);
        }
        Ok(())
    }

    fn document_end(&mut self) -> Result<(), Error> {
        self.flush_unit();
        if self.context.ids.open_depth() > 0 {
            log::warn!(
                "document ended with {} spanning codes still open (rids {:?})",
                self.context.ids.open_depth(),
                self.context.ids.open_rids()
            );
        }
        if !self.elements.is_empty() {
            log::warn!("document ended with {} unclosed elements", self.elements.len());
        }
        UnitEmitter::new(
            &mut self.context,
            &mut self.outputs,
            self.options.segmentation,
            &self.options.source_language,
        )
        .flush_format_log();
        log::debug!(
            "{} translation units, {} format entries",
            self.context.unit_ids.issued(),
            self.context.format_log.len()
        );
        Ok(())
    }
}

/// Converts one document read from `source`.
pub fn convert<S, C, W>(
    source: S,
    classifier: C,
    options: ConvertOptions,
    outputs: Outputs<W>,
) -> Result<Converted<W>, Error>
where
    S: EventSource,
    C: TagClassifier,
    W: Write,
{
    let mut converter = DocumentConverter::new(classifier, options, outputs)?;
    source.drive(&mut converter)?;
    converter.finish()
}
