use proptest::prelude::*;
use std::collections::HashSet;
use unic_langid::LanguageIdentifier;
use xliffconv::{
    ConversionContext, SegmentationMode, Segmenter, Token, collapse, collapse_core, ids::IdAllocator,
    mark_core, placeholder::{normalize, placeholder_count, plain_text}, split_marked,
    strip_core_markers,
};

const CTYPES: &[&str] = &["bold", "italic", "link", "tab", "lb", "x-font", ""];

/// Native inline structure that is flattened into placeholders.
#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Code(&'static str),
    Span(&'static str, Vec<Node>),
}

fn node_strategy() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        3 => proptest::string::string_regex("[A-Za-z .!?\n]{1,10}")
            .expect("valid text regex")
            .prop_map(Node::Text),
        1 => prop::sample::select(CTYPES).prop_map(Node::Code),
    ];
    leaf.prop_recursive(4, 40, 4, |inner| {
        (prop::sample::select(CTYPES), prop::collection::vec(inner, 0..4))
            .prop_map(|(ctype, children)| Node::Span(ctype, children))
    })
}

fn tokens_strategy() -> impl Strategy<Value = Vec<Token>> {
    prop::collection::vec(node_strategy(), 0..6).prop_map(|nodes| {
        let mut ids = IdAllocator::new();
        let mut tokens = Vec::new();
        flatten(&nodes, &mut ids, &mut tokens);
        tokens
    })
}

fn flatten(nodes: &[Node], ids: &mut IdAllocator, out: &mut Vec<Token>) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push(Token::text(text.clone())),
            Node::Code(ctype) => out.push(Token::standalone(ids.next_tag_id(), *ctype)),
            Node::Span(ctype, children) => {
                let id = ids.next_tag_id();
                out.push(Token::open(id, ids.open_rid(), *ctype));
                flatten(children, ids, out);
                let id = ids.next_tag_id();
                out.push(Token::close(id, ids.close_rid().expect("balanced")));
            }
        }
    }
}

/// Every `ex` closes the innermost open `bx` and nothing stays open.
fn well_paired(tokens: &[Token]) -> bool {
    let mut open = Vec::new();
    for token in tokens {
        match token {
            Token::Open { rid, .. } => open.push(*rid),
            Token::Close { rid, .. } => {
                if open.pop() != Some(*rid) {
                    return false;
                }
            }
            _ => {}
        }
    }
    open.is_empty()
}

fn mode_strategy() -> impl Strategy<Value = SegmentationMode> {
    prop_oneof![Just(SegmentationMode::Sentence), Just(SegmentationMode::Paragraph)]
}

fn english() -> LanguageIdentifier {
    "en".parse().expect("valid language")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn collapse_reaches_a_fixed_point(tokens in tokens_strategy()) {
        let mut context = ConversionContext::sequential();
        let before = placeholder_count(&tokens);
        let (once, _) = collapse(tokens.clone(), &mut context);
        let (twice, stats) = collapse(once.clone(), &mut context);

        prop_assert_eq!(stats.rewrites, 0);
        prop_assert_eq!(&twice, &once);
        prop_assert!(placeholder_count(&once) <= before);
        prop_assert_eq!(plain_text(&once), plain_text(&tokens));
        prop_assert!(well_paired(&once));
    }

    #[test]
    fn core_markers_strip_back_to_input(tokens in tokens_strategy()) {
        let marked = mark_core(tokens.clone(), &HashSet::new());
        if marked.is_empty() {
            prop_assert!(plain_text(&tokens).trim().is_empty());
        } else {
            prop_assert_eq!(marked.iter().filter(|t| **t == Token::CoreStart).count(), 1);
            prop_assert_eq!(strip_core_markers(marked), normalize(tokens));
        }
    }

    #[test]
    fn segments_cover_the_core(tokens in tokens_strategy(), mode in mode_strategy()) {
        let core = normalize(tokens);
        let segments = Segmenter::new(mode, &english()).segment(&core);
        let joined: Vec<Token> = segments.iter().flat_map(|s| s.tokens.clone()).collect();
        prop_assert_eq!(normalize(joined), core);

        for (index, segment) in segments.iter().enumerate() {
            let successor = segments[index + 1..].iter().any(|s| s.translatable);
            prop_assert_eq!(segment.has_translatable_successor, successor);
        }
    }

    #[test]
    fn pipeline_keeps_rids_paired(tokens in tokens_strategy(), mode in mode_strategy()) {
        let mut context = ConversionContext::sequential();
        let marked = mark_core(tokens, &HashSet::new());
        prop_assume!(!marked.is_empty());

        let (collapsed, _) = collapse_core(marked, &mut context);
        let unit = split_marked(collapsed).expect("core markers survive collapsing");
        let segments = Segmenter::new(mode, &english()).segment(&unit.core);

        let mut document = unit.before.clone();
        for segment in &segments {
            document.extend(segment.tokens.iter().cloned());
        }
        document.extend(unit.after.iter().cloned());
        prop_assert!(well_paired(&document));
    }
}
