//! Conversion of native documents into XLIFF, skeleton and format outputs.
//!
//! Inline native markup is linearized into `bx`/`ex`/`x` placeholders, redundant
//! placeholder sequences are collapsed, the translatable core of every unit is
//! demarcated and cut into sentence or paragraph segments, and each segment is
//! written as a translation unit.
//!
//! ```no_run
//! use std::{fs::File, io::BufWriter};
//! use xliffconv::{ConvertOptions, Outputs, convert, formats::{HtmlClassifier, XmlEventSource}};
//!
//! let source = XmlEventSource::from_str("<p>Hello <b>world</b>. Bye.</p>");
//! let outputs = Outputs::new(
//!     BufWriter::new(File::create("page.xlf")?),
//!     BufWriter::new(File::create("page.skl")?),
//!     BufWriter::new(File::create("page.format")?),
//! );
//! let options = ConvertOptions::new().with_original("page.html");
//! let converted = convert(source, HtmlClassifier, options, outputs)?;
//! println!("{} units", converted.summary.units);
//! # Ok::<(), xliffconv::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod collapse;
pub mod config;
pub mod context;
pub mod converter;
pub mod core_text;
pub mod ctype;
pub mod decode;
pub mod emitter;
pub mod error;
pub mod format_log;
pub mod formats;
pub mod ids;
pub mod placeholder;
pub mod segmenter;
pub mod traits;
pub mod unit;
pub mod writers;

// Re-export most used types for easy consumption
pub use crate::{
    collapse::{collapse, collapse_core},
    config::{ConvertOptions, SegmentationMode, UnitIdStrategy},
    context::ConversionContext,
    converter::{ConversionSummary, Converted, DocumentConverter, convert},
    core_text::{mark_core, split_marked, strip_core_markers},
    error::Error,
    formats::FormatType,
    placeholder::{Token, parse_inline, render},
    segmenter::{Segment, Segmenter},
    traits::{EventSink, EventSource, TagClassifier, TagRole},
    unit::TranslationUnit,
    writers::Outputs,
};
