//! Demarcation of the translatable core of a candidate unit.
//!
//! The core runs from the first to the last token with visible text. It is widened
//! to keep spans whole: a `bx` before the first text whose `ex` comes after it (or
//! lies in another unit) belongs to the core, and so does an `ex` after the last
//! text whose `bx` comes before it. Whatever else sits at the edges (`x` codes,
//! empty pairs, whitespace) is decoration and stays outside the markers.
//!
//! Empty bookmark anchors inside the core are moved in front of the core start so
//! they cannot split sentences apart.

use std::collections::HashSet;

use crate::{
    ids::TagId,
    placeholder::{Token, has_visible_text, normalize, placeholder_count},
};

/// Inserts `CoreStart`/`CoreEnd` around the core of `tokens`.
///
/// Input that already carries a `CoreStart` is returned unchanged. Input with no
/// visible text yields an empty list.
pub fn mark_core(tokens: Vec<Token>, bookmarks: &HashSet<TagId>) -> Vec<Token> {
    if tokens.iter().any(|t| *t == Token::CoreStart) {
        return tokens;
    }
    let tokens = normalize(tokens);
    if !has_visible_text(&tokens) {
        return Vec::new();
    }
    if placeholder_count(&tokens) == 0 {
        let mut marked = Vec::with_capacity(tokens.len() + 2);
        marked.push(Token::CoreStart);
        marked.extend(tokens);
        marked.push(Token::CoreEnd);
        return marked;
    }

    let (start, end) = core_bounds(&tokens);

    let mut before = tokens;
    let after = before.split_off(end + 1);
    let core = before.split_off(start);
    let (core, anchors) = take_empty_bookmarks(core, bookmarks);

    let mut marked = before;
    marked.extend(anchors);
    marked.push(Token::CoreStart);
    marked.extend(normalize(core));
    marked.push(Token::CoreEnd);
    marked.extend(after);
    marked
}

/// Removes the core markers and merges the text they separated.
pub fn strip_core_markers(tokens: Vec<Token>) -> Vec<Token> {
    normalize(tokens.into_iter().filter(|t| !t.is_marker()).collect())
}

/// A core-marked unit cut at its markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkedUnit {
    pub before: Vec<Token>,
    pub core: Vec<Token>,
    pub after: Vec<Token>,
}

/// Splits core-marked tokens at the markers; `None` when they are not marked.
pub fn split_marked(tokens: Vec<Token>) -> Option<MarkedUnit> {
    let start = tokens.iter().position(|t| *t == Token::CoreStart)?;
    let end = tokens.iter().position(|t| *t == Token::CoreEnd)?;
    if end < start {
        return None;
    }

    let mut before = tokens;
    let after = before.split_off(end + 1);
    let mut core = before.split_off(start);
    before.truncate(start);
    core.remove(0);
    core.pop();
    Some(MarkedUnit {
        before,
        core,
        after,
    })
}

/// Inclusive token range of the core. `tokens` must hold visible text.
fn core_bounds(tokens: &[Token]) -> (usize, usize) {
    let first = tokens.iter().position(Token::has_visible_text).unwrap_or(0);
    let last = tokens
        .iter()
        .rposition(Token::has_visible_text)
        .unwrap_or(tokens.len().saturating_sub(1));
    let partners = pair_partners(tokens);

    let start = (0..first)
        .find(|&i| {
            matches!(tokens[i], Token::Open { .. }) && partners[i].is_none_or(|close| close > first)
        })
        .unwrap_or(first);
    let end = (last + 1..tokens.len())
        .rev()
        .find(|&j| {
            matches!(tokens[j], Token::Close { .. }) && partners[j].is_none_or(|open| open < last)
        })
        .unwrap_or(last);

    (start, end)
}

/// For every `bx`/`ex`, the index of its partner within `tokens`, if present.
fn pair_partners(tokens: &[Token]) -> Vec<Option<usize>> {
    let mut partners = vec![None; tokens.len()];
    let mut open: Vec<usize> = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::Open { .. } => open.push(index),
            Token::Close { rid, .. } => {
                if let Some(depth) = open.iter().rposition(|&i| tokens[i].rid() == Some(*rid)) {
                    let partner = open.remove(depth);
                    partners[partner] = Some(index);
                    partners[index] = Some(partner);
                }
            }
            _ => {}
        }
    }
    partners
}

/// Removes empty bookmark pairs from `core`, returning them in document order.
fn take_empty_bookmarks(mut core: Vec<Token>, bookmarks: &HashSet<TagId>) -> (Vec<Token>, Vec<Token>) {
    let positions: Vec<usize> = core
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| match pair {
            [Token::Open { id, rid, .. }, Token::Close { rid: close_rid, .. }]
                if bookmarks.contains(id) && rid == close_rid =>
            {
                Some(i)
            }
            _ => None,
        })
        .collect();

    let mut anchors = Vec::with_capacity(positions.len() * 2);
    for &position in positions.iter().rev() {
        let close = core.remove(position + 1);
        let open = core.remove(position);
        anchors.push(close);
        anchors.push(open);
    }
    anchors.reverse();
    (core, anchors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::{parse_inline, plain_text, render};

    fn marked(markup: &str, bookmarks: &[TagId]) -> String {
        let bookmarks = bookmarks.iter().copied().collect();
        render(&mark_core(parse_inline(markup).unwrap(), &bookmarks))
    }

    #[test]
    fn test_plain_text_is_wrapped_whole() {
        assert_eq!(marked("  Hello world. ", &[]), "<core-start/>  Hello world. <core-end/>");
    }

    #[test]
    fn test_blank_input_yields_nothing() {
        assert!(mark_core(Vec::new(), &HashSet::new()).is_empty());
        assert!(mark_core(vec![Token::text(" \n\t")], &HashSet::new()).is_empty());
        assert!(mark_core(vec![Token::standalone(1, "lb")], &HashSet::new()).is_empty());
    }

    #[test]
    fn test_already_marked_is_unchanged() {
        let tokens = vec![Token::CoreStart, Token::text("a"), Token::CoreEnd, Token::text(" ")];
        assert_eq!(mark_core(tokens.clone(), &HashSet::new()), tokens);
    }

    #[test]
    fn test_edge_codes_are_decoration() {
        assert_eq!(
            marked("<x id='1' ctype='image'/> Caption text<x id='2' ctype='lb'/>", &[]),
            "<x id='1' ctype='image'/><core-start/> Caption text<core-end/><x id='2' ctype='lb'/>"
        );
    }

    #[test]
    fn test_enclosing_span_stays_in_core() {
        assert_eq!(
            marked(
                "<x id='1'/><bx id='2' rid='1' ctype='bold'/>Hello<ex id='3' rid='1'/> world<x id='4'/>",
                &[]
            ),
            "<x id='1'/><core-start/><bx id='2' rid='1' ctype='bold'/>Hello<ex id='3' rid='1'/> world<core-end/><x id='4'/>"
        );
    }

    #[test]
    fn test_empty_pair_at_edge_is_decoration() {
        assert_eq!(
            marked("<bx id='1' rid='1'/><ex id='2' rid='1'/>Text", &[]),
            "<bx id='1' rid='1'/><ex id='2' rid='1'/><core-start/>Text<core-end/>"
        );
    }

    #[test]
    fn test_span_from_previous_unit_stays_in_core() {
        assert_eq!(
            marked("tail<ex id='9' rid='3'/>", &[]),
            "<core-start/>tail<ex id='9' rid='3'/><core-end/>"
        );
    }

    #[test]
    fn test_empty_bookmark_moves_before_core() {
        assert_eq!(
            marked("a<bx id='1' rid='5'/><ex id='2' rid='5'/>b", &[1]),
            "<bx id='1' rid='5'/><ex id='2' rid='5'/><core-start/>ab<core-end/>"
        );
    }

    #[test]
    fn test_multiple_bookmarks_keep_order() {
        assert_eq!(
            marked(
                "One<bx id='1' rid='1'/><ex id='2' rid='1'/> two<bx id='3' rid='2'/><ex id='4' rid='2'/> three",
                &[1, 3]
            ),
            "<bx id='1' rid='1'/><ex id='2' rid='1'/><bx id='3' rid='2'/><ex id='4' rid='2'/><core-start/>One two three<core-end/>"
        );
    }

    #[test]
    fn test_non_bookmark_empty_pair_stays() {
        assert_eq!(
            marked("a<bx id='1' rid='5'/><ex id='2' rid='5'/>b", &[]),
            "<core-start/>a<bx id='1' rid='5'/><ex id='2' rid='5'/>b<core-end/>"
        );
    }

    #[test]
    fn test_strip_restores_text() {
        let tokens = parse_inline("<x id='1'/>Hello <bx id='2' rid='1'/>big<ex id='3' rid='1'/> world").unwrap();
        let stripped = strip_core_markers(mark_core(tokens.clone(), &HashSet::new()));
        assert_eq!(stripped, tokens);
        assert_eq!(plain_text(&stripped), "Hello big world");
    }

    #[test]
    fn test_split_marked() {
        let unit = split_marked(parse_inline("<x id='1'/><core-start/>Hi<core-end/> ").unwrap()).unwrap();
        assert_eq!(unit.before, vec![Token::standalone(1, "")]);
        assert_eq!(unit.core, vec![Token::text("Hi")]);
        assert_eq!(unit.after, vec![Token::text(" ")]);
        assert!(split_marked(vec![Token::text("Hi")]).is_none());
    }
}
