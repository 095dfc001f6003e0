//! Collapsing of redundant placeholder sequences.
//!
//! Four rewrites, tried in this priority:
//!
//! 1. two adjacent `x` → one `x`;
//! 2. `bx₁ bx₂ … ex₂ ex₁` → one `bx … ex` pair with a fresh rid;
//! 3. `bx x ex` → one `x`;
//! 4. `bx ex` → one `x`.
//!
//! Each pass is a single shift-reduce scan: tokens are shifted onto an output list
//! and the rules are checked against its tail as soon as a token arrives, with a
//! stack of positions of unmatched `bx` tokens to find the partner of each `ex`.
//! Reductions cascade within the pass (an emptied pair becomes an `x`, which may
//! then merge with the `x` before it). Passes repeat until one rewrites nothing.
//! Every rewrite removes at least one placeholder, so the loop is bounded by the
//! placeholder count; the cap only guards against a faulty rule.
//!
//! Every replaced sequence is written to the format log, marked recursive, under
//! the id of the placeholder that replaces it.

use crate::{
    context::ConversionContext,
    ctype::{prefer_nested, prefer_standalone},
    ids::{Rid, TagId},
    placeholder::{Token, placeholder_count, render},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollapseStats {
    pub passes: usize,
    pub rewrites: usize,
}

/// Collapses `tokens` to a fixed point.
pub fn collapse(tokens: Vec<Token>, context: &mut ConversionContext) -> (Vec<Token>, CollapseStats) {
    for token in &tokens {
        context.ids.observe(token.tag_id(), token.rid());
    }

    let cap = placeholder_count(&tokens) + 1;
    let mut stats = CollapseStats::default();
    let mut current = tokens;

    loop {
        let mut pass = Pass::new(context);
        for token in current {
            pass.shift(token);
        }
        let (output, rewrites) = pass.finish();
        stats.passes += 1;
        stats.rewrites += rewrites;
        current = output;

        if rewrites == 0 {
            break;
        }
        if stats.passes >= cap {
            log::warn!(
                "placeholder collapsing stopped after {} passes without reaching a fixed point",
                stats.passes
            );
            break;
        }
    }

    (current, stats)
}

/// Collapses only the tokens between the core markers, or everything when the
/// tokens are not core-marked.
pub fn collapse_core(tokens: Vec<Token>, context: &mut ConversionContext) -> (Vec<Token>, CollapseStats) {
    let start = tokens.iter().position(|t| *t == Token::CoreStart);
    let end = tokens.iter().position(|t| *t == Token::CoreEnd);
    let (Some(start), Some(end)) = (start, end) else {
        return collapse(tokens, context);
    };
    if end <= start {
        return (tokens, CollapseStats::default());
    }
    for token in &tokens {
        context.ids.observe(token.tag_id(), token.rid());
    }

    let mut tokens = tokens;
    let mut tail = tokens.split_off(end);
    let core = tokens.split_off(start + 1);
    let (collapsed, stats) = collapse(core, context);
    tokens.extend(collapsed);
    tokens.append(&mut tail);
    (tokens, stats)
}

struct Pass<'c> {
    context: &'c mut ConversionContext,
    out: Vec<Token>,
    /// Positions in `out` of `bx` tokens whose `ex` has not been shifted yet.
    open: Vec<usize>,
    /// Position of the `bx` matched by the `ex` at the end of `out`, if it is one.
    last_close_of: Option<usize>,
    rewrites: usize,
}

impl<'c> Pass<'c> {
    fn new(context: &'c mut ConversionContext) -> Self {
        Self {
            context,
            out: Vec::new(),
            open: Vec::new(),
            last_close_of: None,
            rewrites: 0,
        }
    }

    fn finish(self) -> (Vec<Token>, usize) {
        (self.out, self.rewrites)
    }

    fn push(&mut self, token: Token) {
        self.last_close_of = None;
        self.out.push(token);
    }

    fn shift(&mut self, token: Token) {
        match token {
            Token::Standalone { .. } => self.shift_standalone(token),
            Token::Open { .. } => {
                self.open.push(self.out.len());
                self.push(token);
            }
            Token::Close { id, rid } => self.shift_close(id, rid),
            other => self.push(other),
        }
    }

    /// Rule 1.
    fn shift_standalone(&mut self, token: Token) {
        let mut token = token;
        while let Some(previous) = self.out.last() {
            let (Some(first), Some(second)) = (collapsible_ctype(previous), collapsible_ctype(&token))
            else {
                break;
            };
            let ctype = prefer_standalone(first, second).to_string();
            let Some(previous) = self.out.pop() else {
                break;
            };
            token = self.replace_with_standalone(&[previous, token], ctype);
        }
        self.push(token);
    }

    fn shift_close(&mut self, id: TagId, rid: Rid) {
        let close = Token::close(id, rid);
        let Some(depth) = self.open.iter().rposition(|&p| self.out[p].rid() == Some(rid)) else {
            // An ex whose bx is outside this run of tokens.
            self.push(close);
            return;
        };
        // bx tokens above the match stay unmatched in this pass.
        self.open.truncate(depth + 1);
        let Some(position) = self.open.pop() else {
            self.push(close);
            return;
        };

        let after = self.out.len() - position - 1;
        match (after, self.out.get(position + 1)) {
            // Rule 2: ex₂ just closed the bx₂ that directly follows bx₁.
            _ if self.last_close_of == Some(position + 1)
                && matches!(self.out.get(position + 1), Some(Token::Open { .. })) =>
            {
                self.collapse_nested(position, close);
            }
            // Rule 3.
            (1, Some(inner)) if collapsible_ctype(inner).is_some() => {
                let outer_ctype = open_ctype(&self.out[position]);
                let inner_ctype = collapsible_ctype(inner).unwrap_or_default();
                let ctype = prefer_nested(outer_ctype, inner_ctype).to_string();
                let mut replaced: Vec<Token> = self.out.drain(position..).collect();
                replaced.push(close);
                let token = self.replace_with_standalone(&replaced, ctype);
                self.shift_standalone(token);
            }
            // Rule 4.
            (0, _) => {
                let ctype = open_ctype(&self.out[position]).to_string();
                let mut replaced: Vec<Token> = self.out.drain(position..).collect();
                replaced.push(close);
                let token = self.replace_with_standalone(&replaced, ctype);
                self.shift_standalone(token);
            }
            _ => {
                self.push(close);
                self.last_close_of = Some(position);
            }
        }
    }

    fn collapse_nested(&mut self, outer_position: usize, outer_close: Token) {
        let (Some(inner_close), inner_open) = (self.out.pop(), self.out.remove(outer_position + 1))
        else {
            return;
        };
        let outer_open = self.out[outer_position].clone();
        let ctype = prefer_nested(open_ctype(&outer_open), open_ctype(&inner_open)).to_string();

        let open_id = self.context.ids.next_tag_id();
        let close_id = self.context.ids.next_tag_id();
        let rid = self.context.ids.next_rid();
        self.context
            .format_log
            .record_recursive(open_id, render(&[outer_open, inner_open]));
        self.context
            .format_log
            .record_recursive(close_id, render(&[inner_close, outer_close]));

        self.out[outer_position] = Token::open(open_id, rid, ctype);
        self.push(Token::close(close_id, rid));
        self.last_close_of = Some(outer_position);
        self.rewrites += 1;
    }

    fn replace_with_standalone(&mut self, replaced: &[Token], ctype: String) -> Token {
        let id = self.context.ids.next_tag_id();
        self.context.format_log.record_recursive(id, render(replaced));
        self.rewrites += 1;
        Token::Standalone {
            id,
            ctype,
            xid: None,
        }
    }
}

/// ctype of an `x` that may take part in collapsing; `x` tags referencing
/// another unit through `xid` never do.
fn collapsible_ctype(token: &Token) -> Option<&str> {
    match token {
        Token::Standalone {
            ctype, xid: None, ..
        } => Some(ctype),
        _ => None,
    }
}

fn open_ctype(token: &Token) -> &str {
    match token {
        Token::Open { ctype, .. } => ctype,
        _ => "",
    }
}
