use anyhow::{bail, Result};
use clap::Parser;
use dissector_converter::analysis::{SidecarAnalyzer, StructureAnalyzer, StubAnalyzer};
use dissector_converter::export::{BatchSummary, FrameCount};
use dissector_converter::validation::validate_record;
use dissector_converter::{ConvertConfig, ConvertPipeline};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "dissector-convert")]
#[command(about = "Convert music structure analysis into dissector records", long_about = None)]
struct Args {
    /// Analysis JSON files, audio files, or directories searched for *.json
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output root (records go to <output>/data)
    #[arg(short = 'o', long, default_value = "output")]
    output: String,

    /// Stem directory (default: stems/ beside each input)
    #[arg(long)]
    stems: Option<String>,

    /// Analyzer results directory searched for <name>/<name>.json
    #[arg(long)]
    results: Option<String>,

    /// Fine envelope frames per second of audio
    #[arg(long, default_value = "100")]
    wav_rate: f64,

    /// Fixed fine envelope length (overrides --wav-rate)
    #[arg(long)]
    wav_frames: Option<usize>,

    /// Coarse navigation envelope length
    #[arg(long, default_value = "1000")]
    nav_frames: usize,

    /// Numeric id prefix (0-9999)
    #[arg(long, value_parser = clap::value_parser!(u16).range(0..10000))]
    tag: Option<u16>,

    /// Don't consult an analyzer for audio inputs; synthesize a beat grid
    #[arg(long)]
    stub: bool,

    /// Tempo reported by --stub (default: the file's BPM tag)
    #[arg(long)]
    bpm: Option<f64>,

    /// Don't write <name>.json.gz
    #[arg(long)]
    no_gzip: bool,

    /// Don't write <name>.json
    #[arg(long)]
    no_plain_json: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Only validate existing records given as inputs
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let inputs: Vec<PathBuf> = args.inputs.iter().map(|i| expand(i)).collect();

    if args.validate {
        log::info!("Validation mode - checking existing records...");
        for path in &inputs {
            validate_record(path)?;
        }
        log::info!("Validated {} record(s)", inputs.len());
        return Ok(());
    }

    let mut config = ConvertConfig::new(expand(&args.output)).with_outputs(!args.no_gzip, !args.no_plain_json);

    let wav_frames = match args.wav_frames {
        Some(n) => FrameCount::Fixed(n),
        None => FrameCount::PerSecond(args.wav_rate),
    };
    config = config.with_resolution(wav_frames, FrameCount::Fixed(args.nav_frames));

    if let Some(stems) = &args.stems {
        config = config.with_stems_dir(expand(stems));
    }
    if let Some(tag) = args.tag {
        config = config.with_id_tag(tag);
    }

    let files = collect_inputs(&inputs);
    if files.is_empty() {
        bail!("No inputs found in {:?}", inputs);
    }
    log::info!("Found {} input(s)", files.len());
    log::info!("Output: {:?}", config.output_dir);

    let summary = if args.stub {
        let mut analyzer = StubAnalyzer::new();
        if let Some(bpm) = args.bpm {
            analyzer = analyzer.with_bpm(bpm);
        }
        run(config, analyzer, &files)?
    } else {
        let mut analyzer = SidecarAnalyzer::new();
        if let Some(results) = &args.results {
            analyzer = analyzer.with_results_dir(expand(results));
        }
        run(config, analyzer, &files)?
    };

    for (input, message) in &summary.failures {
        log::error!("  {:?}: {}", input, message);
    }
    log::info!("Converted {}/{} tracks", summary.succeeded, summary.attempted);

    if !summary.is_success() {
        bail!(
            "{} of {} conversions failed",
            summary.failures.len(),
            summary.attempted
        );
    }
    Ok(())
}

fn run<A: StructureAnalyzer + Sync>(
    config: ConvertConfig,
    analyzer: A,
    files: &[PathBuf],
) -> Result<BatchSummary> {
    let pipeline = ConvertPipeline::new(config, analyzer)?;
    Ok(pipeline.convert_batch(files))
}

/// Expand ~ in a path argument
fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Files are taken as given; directories contribute their *.json files
fn collect_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_analysis_json(p))
                .collect();
            found.sort();
            log::debug!("{} analysis file(s) under {:?}", found.len(), input);
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    files
}

fn is_analysis_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
