use serde::Serialize;
use unic_langid::LanguageIdentifier;
use xliffconv::{SegmentationMode, Segmenter, parse_inline};

#[derive(Debug, Clone)]
pub struct SegmentArgs {
    pub text: String,
    pub mode: SegmentationMode,
    pub lang: String,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SegmentView {
    source: String,
    translatable: bool,
    mergeable: bool,
}

fn segment_views(args: &SegmentArgs) -> Result<Vec<SegmentView>, String> {
    let locale: LanguageIdentifier = args
        .lang
        .parse()
        .map_err(|e| format!("Invalid language `{}`: {}", args.lang, e))?;
    let tokens = parse_inline(&args.text).map_err(|e| e.to_string())?;
    let segments = Segmenter::new(args.mode, &locale).segment(&tokens);
    Ok(segments
        .iter()
        .map(|segment| SegmentView {
            source: segment.source(),
            translatable: segment.translatable,
            mergeable: segment.has_translatable_successor,
        })
        .collect())
}

pub fn run_segment_command(args: SegmentArgs) -> Result<(), String> {
    let views = segment_views(&args)?;
    if args.json {
        let json = serde_json::to_string_pretty(&views).map_err(|e| e.to_string())?;
        println!("{}", json);
        return Ok(());
    }
    for view in views {
        let flag = if view.translatable { 'T' } else { 'N' };
        println!("{}\t{}", flag, view.source.replace('\n', "\\n"));
    }
    Ok(())
}
