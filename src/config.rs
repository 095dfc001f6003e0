//! Conversion options.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::Error;

/// Where the segmenter splits a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationMode {
    #[default]
    Sentence,
    Paragraph,
}

impl Display for SegmentationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentationMode::Sentence => write!(f, "sentence"),
            SegmentationMode::Paragraph => write!(f, "paragraph"),
        }
    }
}

impl FromStr for SegmentationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentence" => Ok(SegmentationMode::Sentence),
            "paragraph" => Ok(SegmentationMode::Paragraph),
            other => Err(Error::InvalidConfig(format!(
                "unknown segmentation mode `{}`",
                other
            ))),
        }
    }
}

/// How translation-unit ids are generated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum UnitIdStrategy {
    /// Random v4 UUIDs, unique across documents.
    #[default]
    Uuid,
    /// `<prefix><n>`, counting from 1. Deterministic.
    Sequential { prefix: String },
}

/// Options for converting one document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub segmentation: SegmentationMode,
    /// Language tag of the source document (e.g. "en-US").
    pub source_language: String,
    /// Original file name echoed into every output.
    pub original: String,
    /// XLIFF `datatype` of the source document.
    pub datatype: String,
    pub unit_ids: UnitIdStrategy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            segmentation: SegmentationMode::Sentence,
            source_language: "en-US".to_string(),
            original: String::new(),
            datatype: "xml".to_string(),
            unit_ids: UnitIdStrategy::Uuid,
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segmentation(mut self, segmentation: SegmentationMode) -> Self {
        self.segmentation = segmentation;
        self
    }

    pub fn with_source_language(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = source_language.into();
        self
    }

    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original = original.into();
        self
    }

    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = datatype.into();
        self
    }

    pub fn with_unit_ids(mut self, unit_ids: UnitIdStrategy) -> Self {
        self.unit_ids = unit_ids;
        self
    }

    /// Parses `source_language` into a language identifier.
    pub fn locale(&self) -> Result<LanguageIdentifier, Error> {
        self.source_language.parse().map_err(|e| {
            Error::InvalidConfig(format!(
                "invalid source language `{}`: {}",
                self.source_language, e
            ))
        })
    }
}
