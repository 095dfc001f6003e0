//! Writing segments out as translation units.
//!
//! Translatable segments become `trans-unit` elements plus a `tu` back-reference
//! in the skeleton. Everything else in a unit (non-translatable segments, the
//! decoration around the core) is moved to the format log and referenced from the
//! skeleton, so the document can be rebuilt exactly.

use std::io::Write;

use crate::{
    config::SegmentationMode,
    context::ConversionContext,
    core_text::MarkedUnit,
    error::Error,
    placeholder::{Token, placeholder_count, render},
    segmenter::Segment,
    writers::{Outputs, SkeletonRecord},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub id: String,
    /// Id of the first unit cut from the same paragraph.
    pub paragraph_id: Option<String>,
    /// A later unit of the same paragraph is translatable.
    pub mergeable: bool,
    /// Inline XLIFF markup, without core markers.
    pub source: String,
}

/// Logs a failed record write; the conversion carries on.
pub(crate) fn report(result: Result<(), Error>, record: &str) {
    if let Err(e) = result {
        log::warn!("failed to write {}: {}", record, e);
    }
}

pub struct UnitEmitter<'a, W: Write> {
    context: &'a mut ConversionContext,
    outputs: &'a mut Outputs<W>,
    mode: SegmentationMode,
    language: &'a str,
    skeleton: bool,
}

impl<'a, W: Write> UnitEmitter<'a, W> {
    pub fn new(
        context: &'a mut ConversionContext,
        outputs: &'a mut Outputs<W>,
        mode: SegmentationMode,
        language: &'a str,
    ) -> Self {
        Self {
            context,
            outputs,
            mode,
            language,
            skeleton: true,
        }
    }

    /// Units that are referenced from markup (attribute values) rather than
    /// from the skeleton.
    pub fn detached(mut self) -> Self {
        self.skeleton = false;
        self
    }

    /// Emits a segmented unit and returns its paragraph id, which is the id of
    /// its first translation unit.
    pub fn emit(&mut self, unit: &MarkedUnit, segments: &[Segment]) -> Option<String> {
        self.decoration(&unit.before);
        let paragraph_id = self.segments(segments);
        self.decoration(&unit.after);
        self.flush_format_log();
        paragraph_id
    }

    /// A unit without translatable text, kept whole for reconstruction.
    pub fn verbatim(&mut self, tokens: &[Token]) {
        self.decoration(tokens);
        self.flush_format_log();
    }

    fn segments(&mut self, segments: &[Segment]) -> Option<String> {
        let of = segments.iter().filter(|s| s.translatable).count();
        let mut paragraph_id: Option<String> = None;
        let mut no = 0;

        for segment in segments {
            if !segment.translatable {
                self.decoration(&segment.tokens);
                continue;
            }
            no += 1;
            let id = self.context.unit_ids.next_id();
            let paragraph = paragraph_id.get_or_insert_with(|| id.clone()).clone();
            let unit = TranslationUnit {
                id: id.clone(),
                paragraph_id: (self.mode == SegmentationMode::Sentence).then_some(paragraph),
                mergeable: segment.has_translatable_successor,
                source: segment.source(),
            };
            log::debug!("unit {} ({}/{}): {}", unit.id, no, of, unit.source);
            report(self.outputs.xliff.write_unit(&unit, self.language), "trans-unit");
            if self.skeleton {
                let record = SkeletonRecord::Unit {
                    id,
                    length: unit.source.chars().count(),
                    no,
                    of,
                };
                report(self.outputs.skeleton.write(&record), "skeleton tu");
            }
        }
        paragraph_id
    }

    /// Moves tokens that are not translated to the format log.
    fn decoration(&mut self, tokens: &[Token]) {
        if tokens.is_empty() {
            return;
        }
        let id = self.context.ids.next_tag_id();
        if placeholder_count(tokens) > 0 {
            self.context.format_log.record_recursive(id, render(tokens));
        } else {
            self.context.format_log.record(id, render(tokens));
        }
        if self.skeleton {
            report(
                self.outputs.skeleton.write(&SkeletonRecord::Format(id)),
                "skeleton format reference",
            );
        }
    }

    /// Writes format-log entries recorded since the last flush.
    pub fn flush_format_log(&mut self) {
        for entry in self.context.format_log.take_pending() {
            report(self.outputs.format.write_entry(entry), "format entry");
        }
    }
}
