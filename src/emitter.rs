//! Turns native inline tags into placeholders.
//!
//! Spanning elements become a `bx`/`ex` pair linked through a stack-allocated rid,
//! atomic ones a single `x`. The native markup behind every placeholder goes to the
//! format log under the placeholder's id.

use quick_xml::escape::escape;

use crate::{
    context::ConversionContext,
    ctype::UNMATCHED_CLOSE,
    ids::TagId,
    placeholder::{Token, TokenBuffer},
    traits::TagRole,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
    Empty,
}

/// A native tag event with enough detail to reproduce its markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub kind: TagKind,
    /// Translatable attributes moved into their own units: `(attribute, unit id)`.
    pub extracted: Vec<(String, String)>,
}

impl NativeTag {
    pub fn new(name: impl Into<String>, attributes: &[(String, String)], kind: TagKind) -> Self {
        Self {
            name: name.into(),
            attributes: attributes.to_vec(),
            kind,
            extracted: Vec::new(),
        }
    }

    pub fn open(name: impl Into<String>, attributes: &[(String, String)]) -> Self {
        Self::new(name, attributes, TagKind::Open)
    }

    pub fn close(name: impl Into<String>) -> Self {
        Self::new(name, &[], TagKind::Close)
    }

    pub fn empty(name: impl Into<String>, attributes: &[(String, String)]) -> Self {
        Self::new(name, attributes, TagKind::Empty)
    }

    /// Unit id standing in for the first extracted attribute, if any.
    pub fn xid(&self) -> Option<&str> {
        self.extracted.first().map(|(_, id)| id.as_str())
    }

    /// The tag as it appeared natively. Extracted attribute values are replaced by
    /// an `x` reference to the unit holding their text.
    pub fn markup(&self) -> String {
        if self.kind == TagKind::Close {
            return format!("</{}>", self.name);
        }
        let mut markup = format!("<{}", self.name);
        for (key, value) in &self.attributes {
            match self.extracted.iter().find(|(attribute, _)| attribute == key) {
                Some((_, unit_id)) => {
                    markup.push_str(&format!(" {}=\"<x xid='{}'/>\"", key, escape(unit_id)))
                }
                None => markup.push_str(&format!(" {}=\"{}\"", key, escape(value))),
            }
        }
        markup.push_str(if self.kind == TagKind::Empty { "/>" } else { ">" });
        markup
    }
}

pub struct PlaceholderEmitter<'a> {
    context: &'a mut ConversionContext,
}

impl<'a> PlaceholderEmitter<'a> {
    pub fn new(context: &'a mut ConversionContext) -> Self {
        Self { context }
    }

    /// Emits the placeholder for `tag` according to its role.
    ///
    /// Blocks and opaque elements never reach the working buffer; for those
    /// nothing is emitted and `None` is returned.
    pub fn emit(
        &mut self,
        buffer: &mut TokenBuffer,
        tag: &NativeTag,
        role: TagRole,
        ctype: &str,
        bookmark: bool,
    ) -> Option<TagId> {
        match (role, tag.kind) {
            (TagRole::Spanning, TagKind::Open) => Some(self.open(buffer, tag, ctype, bookmark)),
            (TagRole::Spanning, TagKind::Close) => Some(self.close(buffer, tag, ctype)),
            (TagRole::Spanning, TagKind::Empty) | (TagRole::Atomic, _) => {
                Some(self.atomic(buffer, tag, ctype))
            }
            (TagRole::Block, _) | (TagRole::Opaque, _) => None,
        }
    }

    /// `x` for a tag that spans no text.
    pub fn atomic(&mut self, buffer: &mut TokenBuffer, tag: &NativeTag, ctype: &str) -> TagId {
        let id = self.context.ids.next_tag_id();
        buffer.push(Token::Standalone {
            id,
            ctype: ctype.to_string(),
            xid: tag.xid().map(str::to_string),
        });
        self.context.format_log.record(id, tag.markup());
        id
    }

    /// `x` for inline native content that is not an element (comments and the like).
    pub fn verbatim(&mut self, buffer: &mut TokenBuffer, markup: &str, ctype: &str) -> TagId {
        let id = self.context.ids.next_tag_id();
        buffer.push(Token::standalone(id, ctype));
        self.context.format_log.record(id, markup);
        id
    }

    /// `bx` with a freshly pushed rid.
    pub fn open(
        &mut self,
        buffer: &mut TokenBuffer,
        tag: &NativeTag,
        ctype: &str,
        bookmark: bool,
    ) -> TagId {
        let id = self.context.ids.next_tag_id();
        let rid = self.context.ids.open_rid();
        buffer.push(Token::open(id, rid, ctype));
        self.context.format_log.record(id, tag.markup());
        if bookmark {
            self.context.bookmarks.insert(id);
        }
        id
    }

    /// `ex` paired with the innermost open `bx`.
    ///
    /// A close with nothing open becomes an `x`, so every emitted `ex` keeps a
    /// matching `bx`. So does the close of a span whose `bx` left with an
    /// earlier unit.
    pub fn close(&mut self, buffer: &mut TokenBuffer, tag: &NativeTag, ctype: &str) -> TagId {
        let id = self.context.ids.next_tag_id();
        match self.context.ids.close_rid() {
            Ok(rid) if self.context.detached_rids.remove(&rid) => {
                buffer.push(Token::standalone(id, ctype))
            }
            Ok(rid) => buffer.push(Token::close(id, rid)),
            Err(e) => {
                if self.context.first_rid_underflow() {
                    log::warn!("{} on `</{}>`; emitting it as a standalone code", e, tag.name);
                } else {
                    log::debug!("{} on `</{}>`", e, tag.name);
                }
                buffer.push(Token::standalone(id, UNMATCHED_CLOSE));
            }
        }
        self.context.format_log.record(id, tag.markup());
        id
    }

    /// Turns every `bx` in `tokens` whose span is still open into an `x`.
    ///
    /// Called when a unit is cut while spans are open: the unit leaves without
    /// their `ex`, so both ends of such a span are emitted as `x`.
    pub fn detach_open(&mut self, tokens: Vec<Token>) -> Vec<Token> {
        let open = self.context.ids.open_rids().to_vec();
        if open.is_empty() {
            return tokens;
        }
        tokens
            .into_iter()
            .map(|token| match token {
                Token::Open { id, rid, ctype } if open.contains(&rid) => {
                    self.context.detached_rids.insert(rid);
                    Token::standalone(id, ctype)
                }
                other => other,
            })
            .collect()
    }
}
