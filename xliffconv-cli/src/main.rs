mod convert;
mod segment;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use xliffconv::SegmentationMode;

use crate::{
    convert::{ConvertArgs, run_convert_command},
    segment::{SegmentArgs, run_segment_command},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an XML/XHTML document into XLIFF, skeleton and format files.
    Convert {
        /// The input document
        #[arg(short, long)]
        input: PathBuf,
        /// Directory for the three output files (defaults to the input's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Segmentation mode: sentence or paragraph
        #[arg(long)]
        mode: Option<SegmentationMode>,
        /// Source language tag, e.g. en-US
        #[arg(long)]
        lang: Option<String>,
        /// Input encoding label; detected from a byte-order mark, else UTF-8
        #[arg(long)]
        encoding: Option<String>,
        /// TOML file with conversion options; flags override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Use tu1, tu2, … instead of random unit ids
        #[arg(long)]
        sequential_ids: bool,
        /// Print the conversion summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split a text (which may contain bx/ex/x placeholders) into segments.
    Segment {
        /// The text to segment
        #[arg(short, long)]
        text: String,
        /// Segmentation mode: sentence or paragraph
        #[arg(long, default_value = "sentence")]
        mode: SegmentationMode,
        /// Language tag used for abbreviations and script rules
        #[arg(long, default_value = "en")]
        lang: String,
        /// Print the segments as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.commands {
        Commands::Convert {
            input,
            output,
            mode,
            lang,
            encoding,
            config,
            sequential_ids,
            json,
        } => run_convert_command(ConvertArgs {
            input,
            output,
            mode,
            lang,
            encoding,
            config,
            sequential_ids,
            json,
        }),
        Commands::Segment {
            text,
            mode,
            lang,
            json,
        } => run_segment_command(SegmentArgs {
            text,
            mode,
            lang,
            json,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
