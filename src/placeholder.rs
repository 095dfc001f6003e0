//! Placeholder tokens and their inline XLIFF markup.
//!
//! A candidate unit is held as a flat list of [`Token`]s: literal text interleaved
//! with `bx`/`ex`/`x` placeholders and, while a unit is being processed, the two core
//! markers. Text tokens store unescaped characters; [`render`] produces the escaped
//! inline markup written into `<source>` elements and format log entries, and
//! [`parse_inline`] reads it back.

use std::fmt::{self, Display};

use lazy_static::lazy_static;
use quick_xml::escape::{escape, partial_escape, unescape};
use regex::Regex;

use crate::{
    error::Error,
    ids::{Rid, TagId},
};

/// Sentinel rendered for [`Token::CoreStart`].
pub const CORE_START_MARKER: &str = "<core-start/>";
/// Sentinel rendered for [`Token::CoreEnd`].
pub const CORE_END_MARKER: &str = "<core-end/>";

lazy_static! {
    static ref INLINE_TAG_REGEX: Regex = Regex::new(
        r#"<(bx|ex|x|core-start|core-end)((?:\s+[\w:.-]+\s*=\s*(?:'[^']*'|"[^"]*"))*)\s*/>"#
    )
    .unwrap();
    static ref ATTRIBUTE_REGEX: Regex =
        Regex::new(r#"([\w:.-]+)\s*=\s*(?:'([^']*)'|"([^"]*)")"#).unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal, unescaped text.
    Text(String),
    /// `bx`: opens a span of native formatting.
    Open { id: TagId, rid: Rid, ctype: String },
    /// `ex`: closes the span opened by the `bx` with the same rid.
    Close { id: TagId, rid: Rid },
    /// `x`: a native code that does not span text.
    Standalone {
        id: TagId,
        ctype: String,
        xid: Option<String>,
    },
    CoreStart,
    CoreEnd,
}

impl Token {
    pub fn text(value: impl Into<String>) -> Self {
        Token::Text(value.into())
    }

    pub fn open(id: TagId, rid: Rid, ctype: impl Into<String>) -> Self {
        Token::Open {
            id,
            rid,
            ctype: ctype.into(),
        }
    }

    pub fn close(id: TagId, rid: Rid) -> Self {
        Token::Close { id, rid }
    }

    pub fn standalone(id: TagId, ctype: impl Into<String>) -> Self {
        Token::Standalone {
            id,
            ctype: ctype.into(),
            xid: None,
        }
    }

    /// True for `bx`, `ex` and `x`.
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            Token::Open { .. } | Token::Close { .. } | Token::Standalone { .. }
        )
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Token::CoreStart | Token::CoreEnd)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Token::Text(text) => Some(text),
            _ => None,
        }
    }

    /// A text token with at least one non-whitespace character.
    pub fn has_visible_text(&self) -> bool {
        self.as_text()
            .is_some_and(|text| text.chars().any(|c| !c.is_whitespace()))
    }

    pub fn tag_id(&self) -> Option<TagId> {
        match self {
            Token::Open { id, .. } | Token::Close { id, .. } | Token::Standalone { id, .. } => {
                Some(*id)
            }
            _ => None,
        }
    }

    pub fn rid(&self) -> Option<Rid> {
        match self {
            Token::Open { rid, .. } | Token::Close { rid, .. } => Some(*rid),
            _ => None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Text(text) => write!(f, "{}", partial_escape(text)),
            Token::Open { id, rid, ctype } => {
                write!(f, "<bx id='{}' rid='{}'", id, rid)?;
                write_ctype(f, ctype)?;
                write!(f, "/>")
            }
            Token::Close { id, rid } => write!(f, "<ex id='{}' rid='{}'/>", id, rid),
            Token::Standalone { id, ctype, xid } => {
                write!(f, "<x id='{}'", id)?;
                write_ctype(f, ctype)?;
                if let Some(xid) = xid {
                    write!(f, " xid='{}'", escape(xid))?;
                }
                write!(f, "/>")
            }
            Token::CoreStart => write!(f, "{}", CORE_START_MARKER),
            Token::CoreEnd => write!(f, "{}", CORE_END_MARKER),
        }
    }
}

fn write_ctype(f: &mut fmt::Formatter<'_>, ctype: &str) -> fmt::Result {
    if ctype.is_empty() {
        Ok(())
    } else {
        write!(f, " ctype='{}'", escape(ctype))
    }
}

/// Serializes tokens to inline XLIFF markup.
pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(Token::to_string).collect()
}

/// Concatenated text content, placeholders and markers dropped.
pub fn plain_text(tokens: &[Token]) -> String {
    tokens.iter().filter_map(Token::as_text).collect()
}

/// Number of `bx`/`ex`/`x` tokens.
pub fn placeholder_count(tokens: &[Token]) -> usize {
    tokens.iter().filter(|t| t.is_placeholder()).count()
}

pub fn has_visible_text(tokens: &[Token]) -> bool {
    tokens.iter().any(Token::has_visible_text)
}

/// Merges adjacent text tokens and drops empty ones.
pub fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        push_token(&mut out, token);
    }
    out
}

fn push_token(out: &mut Vec<Token>, token: Token) {
    match token {
        Token::Text(text) if text.is_empty() => {}
        Token::Text(text) => match out.last_mut() {
            Some(Token::Text(last)) => last.push_str(&text),
            _ => out.push(Token::Text(text)),
        },
        other => out.push(other),
    }
}

/// Parses inline XLIFF markup (as produced by [`render`]) into tokens.
///
/// Attribute values may use single or double quotes. Text between tags is
/// unescaped; anything that is not a recognized placeholder stays text.
pub fn parse_inline(markup: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in INLINE_TAG_REGEX.captures_iter(markup) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_token(&mut tokens, Token::Text(unescape_text(&markup[last..whole.start()])?));
        last = whole.end();

        let attributes = parse_attributes(caps.get(2).map_or("", |m| m.as_str()))?;
        let token = match &caps[1] {
            "bx" => Token::Open {
                id: numeric_attribute(&attributes, "id", whole.as_str())?,
                rid: numeric_attribute(&attributes, "rid", whole.as_str())?,
                ctype: string_attribute(&attributes, "ctype").unwrap_or_default(),
            },
            "ex" => Token::Close {
                id: numeric_attribute(&attributes, "id", whole.as_str())?,
                rid: numeric_attribute(&attributes, "rid", whole.as_str())?,
            },
            "x" => Token::Standalone {
                id: numeric_attribute(&attributes, "id", whole.as_str())?,
                ctype: string_attribute(&attributes, "ctype").unwrap_or_default(),
                xid: string_attribute(&attributes, "xid"),
            },
            "core-start" => Token::CoreStart,
            _ => Token::CoreEnd,
        };
        tokens.push(token);
    }
    push_token(&mut tokens, Token::Text(unescape_text(&markup[last..])?));

    Ok(tokens)
}

fn unescape_text(raw: &str) -> Result<String, Error> {
    unescape(raw)
        .map(|text| text.into_owned())
        .map_err(|e| Error::InvalidMarkup(format!("{}: {:?}", e, raw)))
}

fn parse_attributes(raw: &str) -> Result<Vec<(String, String)>, Error> {
    ATTRIBUTE_REGEX
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            Ok((caps[1].to_string(), unescape_text(value)?))
        })
        .collect()
}

fn string_attribute(attributes: &[(String, String)], name: &str) -> Option<String> {
    attributes
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

fn numeric_attribute(attributes: &[(String, String)], name: &str, tag: &str) -> Result<u32, Error> {
    let value = string_attribute(attributes, name)
        .ok_or_else(|| Error::InvalidMarkup(format!("{} is missing '{}'", tag, name)))?;
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidMarkup(format!("{} has non-numeric '{}'", tag, name)))
}

/// The working buffer of one candidate unit.
#[derive(Debug, Clone, Default)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        push_token(&mut self.tokens, token);
    }

    pub fn push_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.push(Token::Text(text.to_string()));
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True when the buffer holds no placeholder and no visible text.
    pub fn is_blank(&self) -> bool {
        !self.tokens.iter().any(|t| t.is_placeholder() || t.has_visible_text())
    }

    /// Hands the buffered tokens over and leaves the buffer empty.
    pub fn take(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.tokens)
    }
}
