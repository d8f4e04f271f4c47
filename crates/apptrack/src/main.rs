use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};

use apptrack::classifier::{ClassifierSettings, DEFAULT_THRESHOLD};
use apptrack::config::{load_patterns, ConfigPaths};
use apptrack::logging::{init_tracing, LogFormat};
use apptrack::ml::{LinearPredictor, MessagePredictor, UnavailablePredictor};
use apptrack::pipeline::{
    read_json_lines, JsonLinesSink, MessageSink, Pipeline, ThreadStore, TracingProgress,
};

#[derive(Parser)]
#[command(name = "apptrack")]
#[command(about = "Classify job-application mail and extract company details", version)]
struct Cli {
    /// Directory holding patterns.json, companies.json and optionally domain_to_company.json
    #[arg(long, global = true, env = "APPTRACK_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Log output format
    #[arg(
        long,
        global = true,
        env = "APPTRACK_LOG_FORMAT",
        default_value_t = LogFormat::Text,
        value_parser = parse_log_format
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a JSON lines file of messages
    Classify {
        /// Input file, one message per line; `-` reads stdin
        #[arg(short, long)]
        input: PathBuf,

        /// Write one JSON record per kept message here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exported linear model; without it every rule miss becomes noise
        #[arg(long, env = "APPTRACK_MODEL")]
        model: Option<PathBuf>,

        /// Minimum model confidence to accept its label
        #[arg(long, env = "APPTRACK_THRESHOLD", default_value_t = DEFAULT_THRESHOLD, value_parser = parse_threshold)]
        threshold: f32,

        /// Your own address; mail from it is treated like a personal domain
        #[arg(long = "user-address")]
        user_addresses: Vec<String>,
    },

    /// Load the configuration and report skipped patterns
    CheckConfig {
        /// Fail if any pattern was skipped
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Classify {
            input,
            output,
            model,
            threshold,
            user_addresses,
        } => classify(
            &cli.config_dir,
            &input,
            output.as_deref(),
            model.as_deref(),
            ClassifierSettings {
                threshold,
                user_addresses,
            },
        ),
        Commands::CheckConfig { strict } => check_config(&cli.config_dir, strict),
    }
}

fn classify(
    config_dir: &Path,
    input: &Path,
    output: Option<&Path>,
    model: Option<&Path>,
    settings: ClassifierSettings,
) -> Result<()> {
    let patterns = load_patterns(&ConfigPaths::in_dir(config_dir))
        .with_context(|| format!("Failed to load config from {}", config_dir.display()))?;
    let pipeline = Pipeline::from_config(Arc::new(patterns), load_predictor(model), settings);

    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(input)
            .with_context(|| format!("Failed to open input {}", input.display()))?;
        Box::new(BufReader::new(file))
    };
    let messages = read_json_lines(reader);

    let mut threads = ThreadStore::new();
    let summary = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?;
            let mut sink = (ThreadStore::new(), JsonLinesSink::new(BufWriter::new(file)));
            let summary = pipeline.run_batch(messages, &mut sink, &TracingProgress);
            sink.flush()
                .with_context(|| format!("Failed to write output {}", path.display()))?;
            threads = sink.0;
            summary
        }
        None => pipeline.run_batch(messages, &mut threads, &TracingProgress),
    };

    let report = json!({
        "summary": summary,
        "threads": threads.len(),
        "status": threads.status_counts(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Falls back to the null predictor when no model is configured or it cannot be read.
fn load_predictor(model: Option<&Path>) -> Arc<dyn MessagePredictor> {
    let Some(path) = model else {
        info!("No model configured, rule misses fall back to noise");
        return Arc::new(UnavailablePredictor);
    };
    match LinearPredictor::from_path(path) {
        Ok(predictor) => {
            info!(path = %path.display(), labels = predictor.labels().len(), "Model loaded");
            Arc::new(predictor)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Model unavailable, continuing without it");
            Arc::new(UnavailablePredictor)
        }
    }
}

fn check_config(config_dir: &Path, strict: bool) -> Result<()> {
    let paths = ConfigPaths::in_dir(config_dir);
    let patterns = load_patterns(&paths)
        .with_context(|| format!("Failed to load config from {}", config_dir.display()))?;

    println!("patterns:   {}", paths.patterns.display());
    println!("companies:  {}", paths.companies.display());
    if let Some(map) = &paths.domain_map {
        println!("domain map: {}", map.display());
    }
    let priority: Vec<&str> = patterns.label_priority().iter().map(|l| l.as_str()).collect();
    println!("priority:   {}", priority.join(" > "));
    println!("compiled:   {}", patterns.pattern_count());
    println!("companies:  {} known", patterns.known_companies().len());

    for warning in patterns.warnings() {
        println!(
            "skipped [{}] {:?}: {}",
            warning.owner, warning.pattern, warning.reason
        );
    }

    if strict && !patterns.warnings().is_empty() {
        bail!("{} pattern(s) skipped", patterns.warnings().len());
    }
    Ok(())
}

fn parse_log_format(value: &str) -> std::result::Result<LogFormat, String> {
    value.parse()
}

fn parse_threshold(value: &str) -> std::result::Result<f32, String> {
    let threshold: f32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(format!("threshold must be within 0..=1, got {}", threshold));
    }
    Ok(threshold)
}
