use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use xliffconv::{
    ConvertOptions, Outputs, SegmentationMode, UnitIdStrategy, convert,
    decode::{join_decoder, spawn_decoder},
    formats::{FormatType, HtmlClassifier, XmlEventSource},
};

#[derive(Debug, Clone)]
pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub mode: Option<SegmentationMode>,
    pub lang: Option<String>,
    pub encoding: Option<String>,
    pub config: Option<PathBuf>,
    pub sequential_ids: bool,
    pub json: bool,
}

fn load_config(path: &Path) -> Result<ConvertOptions, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("Invalid config {}: {}", path.display(), e))
}

/// Options from the config file with command-line flags applied on top.
fn resolve_options(args: &ConvertArgs, format: FormatType) -> Result<ConvertOptions, String> {
    let mut options = match &args.config {
        Some(path) => load_config(path)?,
        None => ConvertOptions::default(),
    };
    if let Some(mode) = args.mode {
        options = options.with_segmentation(mode);
    }
    if let Some(lang) = args.lang.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        options = options.with_source_language(lang);
    }
    if args.sequential_ids {
        options = options.with_unit_ids(UnitIdStrategy::Sequential {
            prefix: "tu".to_string(),
        });
    }
    let original = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    options = options.with_original(original).with_datatype(format.datatype());
    options.locale().map_err(|e| e.to_string())?;
    Ok(options)
}

fn create(path: &Path) -> Result<BufWriter<File>, String> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| format!("Cannot create {}: {}", path.display(), e))
}

pub fn run_convert_command(args: ConvertArgs) -> Result<(), String> {
    let format = FormatType::from_path(&args.input).map_err(|e| e.to_string())?;
    let options = resolve_options(&args, format)?;

    let output_dir = match &args.output {
        Some(dir) => dir.clone(),
        None => args
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    fs::create_dir_all(&output_dir)
        .map_err(|e| format!("Cannot create {}: {}", output_dir.display(), e))?;
    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());

    let input = File::open(&args.input)
        .map_err(|e| format!("Cannot open {}: {}", args.input.display(), e))?;
    let (pipe, decoder) = spawn_decoder(input, args.encoding.as_deref()).map_err(|e| e.to_string())?;

    let outputs = Outputs::new(
        create(&output_dir.join(format!("{}.xlf", stem)))?,
        create(&output_dir.join(format!("{}.skl", stem)))?,
        create(&output_dir.join(format!("{}.format", stem)))?,
    );
    log::info!(
        "Converting {} ({}) into {}",
        args.input.display(),
        format,
        output_dir.display()
    );

    let result = convert(
        XmlEventSource::from_reader(BufReader::new(pipe)),
        HtmlClassifier,
        options,
        outputs,
    );
    join_decoder(decoder).map_err(|e| format!("Error decoding {}: {}", args.input.display(), e))?;
    let converted = result.map_err(|e| format!("Error converting {}: {}", args.input.display(), e))?;

    if args.json {
        let json = serde_json::to_string_pretty(&converted.summary).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        println!(
            "✅ {} translation units, {} format entries written to {}",
            converted.summary.units,
            converted.summary.format_entries,
            output_dir.display()
        );
    }
    Ok(())
}
