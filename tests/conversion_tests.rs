use indoc::indoc;
use regex::Regex;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufWriter;
use xliffconv::{
    ConversionContext, ConvertOptions, Outputs, SegmentationMode, Token, UnitIdStrategy, collapse,
    convert, formats::{HtmlClassifier, XmlEventSource}, mark_core, parse_inline, render,
    segmenter::{Segment, link_successors},
};

fn sequential_options() -> ConvertOptions {
    ConvertOptions::new()
        .with_original("page.html")
        .with_datatype("html")
        .with_unit_ids(UnitIdStrategy::Sequential {
            prefix: "tu".to_string(),
        })
}

fn convert_in_memory(html: &str, options: ConvertOptions) -> (String, String, String) {
    let converted = convert(
        XmlEventSource::from_str(html),
        HtmlClassifier,
        options,
        Outputs::new(Vec::new(), Vec::new(), Vec::new()),
    )
    .expect("conversion succeeds");
    (
        String::from_utf8(converted.xliff).unwrap(),
        String::from_utf8(converted.skeleton).unwrap(),
        String::from_utf8(converted.format).unwrap(),
    )
}

fn sources(xliff: &str) -> Vec<String> {
    let source = Regex::new(r#"<source xml:lang="[^"]*">(.*?)</source>"#).unwrap();
    source
        .captures_iter(xliff)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[test]
fn test_two_x_collapse_prefers_tab() {
    let mut context = ConversionContext::sequential();
    let tokens = parse_inline("<x id='1' ctype='tab'/><x id='2' ctype='bold'/>").unwrap();
    let (collapsed, stats) = collapse(tokens, &mut context);

    assert_eq!(render(&collapsed), "<x id='3' ctype='tab'/>");
    assert_eq!(stats.rewrites, 1);
    let entry = context.format_log.get(3).unwrap();
    assert!(entry.recursive);
    assert_eq!(entry.markup, "<x id='1' ctype='tab'/><x id='2' ctype='bold'/>");
    assert_eq!(context.format_log.len(), 1);
}

#[test]
fn test_nested_pair_collapse_prefers_link() {
    let mut context = ConversionContext::sequential();
    let tokens = parse_inline(
        "<bx id='1' rid='10' ctype='x-foo'/><bx id='2' rid='11' ctype='link'/>hello<ex id='3' rid='11'/><ex id='4' rid='10'/>",
    )
    .unwrap();
    let (collapsed, _) = collapse(tokens, &mut context);

    assert_eq!(
        render(&collapsed),
        "<bx id='5' rid='12' ctype='link'/>hello<ex id='6' rid='12'/>"
    );
    assert_eq!(
        context.format_log.get(5).unwrap().markup,
        "<bx id='1' rid='10' ctype='x-foo'/><bx id='2' rid='11' ctype='link'/>"
    );
    assert_eq!(
        context.format_log.get(6).unwrap().markup,
        "<ex id='3' rid='11'/><ex id='4' rid='10'/>"
    );
}

#[test]
fn test_empty_bookmark_is_relocated() {
    let tokens = parse_inline("a<bx id='1' rid='5'/><ex id='2' rid='5'/>b").unwrap();
    let bookmarks: HashSet<u32> = [1].into_iter().collect();
    let marked = mark_core(tokens, &bookmarks);

    assert_eq!(
        marked,
        vec![
            Token::open(1, 5, ""),
            Token::close(2, 5),
            Token::CoreStart,
            Token::text("ab"),
            Token::CoreEnd,
        ]
    );
}

#[test]
fn test_mergeability_lookahead() {
    let mut segments: Vec<Segment> = ["One.", " ", "Two.", "<x id='1'/>", "Three."]
        .iter()
        .map(|markup| Segment::new(parse_inline(markup).unwrap()))
        .collect();
    link_successors(&mut segments);

    let flags: Vec<(bool, bool)> = segments
        .iter()
        .map(|s| (s.translatable, s.has_translatable_successor))
        .collect();
    assert_eq!(
        flags,
        vec![
            (true, true),
            (false, true),
            (true, true),
            (false, true),
            (true, false)
        ]
    );
}

#[test]
fn test_html_page_conversion() {
    let html = indoc! {r#"
        <html>
        <body>
        <h1>User <em>guide</em></h1>
        <p>Press <b>Save</b>. Then close the window.</p>
        <p><a name="setup"></a>Setup takes two minutes. <a href="faq.html"><b>Read the FAQ</b></a>.</p>
        <script>if (a &lt; b) { go(); }</script>
        </body>
        </html>
    "#};
    let (xliff, skeleton, format) = convert_in_memory(html, sequential_options());

    assert_eq!(
        sources(&xliff),
        vec![
            "User <bx id='3' rid='1' ctype='italic'/>guide<ex id='4' rid='1'/>",
            "Press <bx id='6' rid='2' ctype='bold'/>Save<ex id='7' rid='2'/>. ",
            "Then close the window.",
            "Setup takes two minutes. ",
            "<bx id='15' rid='6' ctype='link'/>Read the FAQ<ex id='16' rid='6'/>.",
        ]
    );
    assert!(xliff.contains("<trans-unit id=\"tu2\" paragraph-id=\"tu2\" mergeable=\"true\">"));
    assert!(xliff.contains("<trans-unit id=\"tu3\" paragraph-id=\"tu2\">"));

    // The bookmark anchor stays outside the unit, uncollapsed.
    assert!(format.contains(
        "<tag id=\"17\" recursive=\"yes\"><![CDATA[<bx id='9' rid='3' ctype='link'/><ex id='10' rid='3'/>]]>"
    ));
    assert!(format.contains("<![CDATA[<a name=\"setup\">]]>"));
    assert!(skeleton.contains("<text seq="));
    assert!(skeleton.contains(">if (a &lt; b) { go(); }</text>"));
}

#[test]
fn test_rids_pair_across_document() {
    let html = indoc! {r#"
        <div>
        <p><b>Bold <i>and italic</i></b> text. <span>More <u>text</u>.</span></p>
        <p><i>One.</i> <i>Two.</i> Three <sup>2</sup>.</p>
        <span>Lead <p>Inner.</p>tail</span>
        <span><p>a</p>end</span>
        </div>
    "#};
    let (xliff, _, _) = convert_in_memory(html, sequential_options());

    let mut open = Vec::new();
    let mut closed = Vec::new();
    for source in sources(&xliff) {
        for token in parse_inline(&source).unwrap() {
            match token {
                Token::Open { rid, .. } => open.push(rid),
                Token::Close { rid, .. } => closed.push(rid),
                _ => {}
            }
        }
    }
    open.sort_unstable();
    closed.sort_unstable();
    assert!(!open.is_empty());
    assert_eq!(open, closed);
    assert!(xliff.contains(">Lead </source>"));
    assert!(xliff.contains(">tail</source>"));
    assert!(xliff.contains(">end</source>"));
}

#[test]
fn test_paragraph_mode_keeps_one_unit_per_block() {
    let html = "<body><p>First sentence. Second sentence.</p><p>Other block.</p></body>";
    let (xliff, _, _) = convert_in_memory(
        html,
        sequential_options().with_segmentation(SegmentationMode::Paragraph),
    );
    assert_eq!(
        sources(&xliff),
        vec!["First sentence. Second sentence.", "Other block."]
    );
    assert!(!xliff.contains("paragraph-id"));
}

#[test]
fn test_conversion_to_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let create = |name: &str| BufWriter::new(File::create(temp_dir.path().join(name)).unwrap());
    let outputs = Outputs::new(create("page.xlf"), create("page.skl"), create("page.format"));

    let converted = convert(
        XmlEventSource::from_str("<p title=\"Tooltip text\">Body text.</p>"),
        HtmlClassifier,
        sequential_options(),
        outputs,
    )
    .unwrap();
    assert_eq!(converted.summary.units, 2);
    drop(converted);

    let xliff = fs::read_to_string(temp_dir.path().join("page.xlf")).unwrap();
    let skeleton = fs::read_to_string(temp_dir.path().join("page.skl")).unwrap();
    assert_eq!(sources(&xliff), vec!["Tooltip text", "Body text."]);
    assert!(skeleton.contains("<![CDATA[<p title=\"<x xid='tu1'/>\">]]>"));
    assert!(skeleton.trim_end().ends_with("</skeleton>"));
}
