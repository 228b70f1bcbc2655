use anyhow::bail;
use clap::{ArgAction, Parser};
use loader::font::load_font;
use loader::survey::data_path_for_title;
use log::LevelFilter;
use std::path::PathBuf;
use workflow::config::SurveyConfig;
use workflow::runner::{RunInputs, Runner};

mod loader;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Wi-Fi site-survey heat map generator")]
struct Args {
    /// Path to the floor-plan background image
    #[arg(value_name = "IMAGE")]
    image: PathBuf,
    /// Survey title; names the outputs and, by default, the `<TITLE>.json` data file
    #[arg(value_name = "TITLE")]
    title: String,
    /// Verbose output; repeat for debug-level output
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// SSID to leave out of the channel summary (repeatable)
    #[arg(short, long = "ignore", value_name = "SSID")]
    ignore: Vec<String>,
    /// Measurement file to read instead of `<TITLE>.json`
    #[arg(long)]
    data: Option<PathBuf>,
    /// Directory the rendered PNGs are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// Load survey settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// TrueType font for titles and colour-bar labels
    #[arg(long)]
    font: Option<PathBuf>,
    /// Stop at the first metric that fails instead of rendering the rest
    #[arg(long, default_value_t = false)]
    fail_fast: bool,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let survey_config = match &args.config {
        Some(path) => SurveyConfig::load(path)?,
        None => SurveyConfig::default(),
    }
    .merge_args(&args.ignore, args.fail_fast);
    survey_config.validate()?;

    let font = load_font(args.font.as_deref())?;
    let inputs = RunInputs {
        image: args.image.clone(),
        data: args
            .data
            .clone()
            .unwrap_or_else(|| data_path_for_title(&args.title)),
        output_dir: args.output_dir.clone(),
        title: args.title.clone(),
    };

    let result = Runner::new(survey_config).execute(&inputs, font.as_ref())?;

    println!("Channel summary for {}:", inputs.title);
    if result.channels.is_empty() {
        println!("  (no scan observations)");
    }
    for usage in result.channels.iter() {
        println!("  {}", usage);
    }

    for path in &result.written {
        println!("Wrote {}", path.display());
    }

    if !result.failures.is_empty() {
        eprintln!("{} metric(s) failed:", result.failures.len());
        for failure in &result.failures {
            eprintln!("  {}", failure);
        }
        for (stage, count) in &result.failures_by_stage {
            eprintln!("  {} during {}", count, stage);
        }
        bail!(
            "{} of the metric heat maps could not be rendered",
            result.failures.len()
        );
    }

    Ok(())
}
