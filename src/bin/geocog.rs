//! CLI binary for geocognition.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, runs one analysis and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use geocognition::{
    exif_gps_location, resolve_input, AnalysisConfig, AnalysisError, AnalysisReport, Geocoder,
    ImagePayload, Language, Orchestrator, PhaseObserver, PipelinePhase, TrustedLocation,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Spinner observer ─────────────────────────────────────────────────────────

/// Renders the current phase on an indicatif spinner and logs each phase
/// transition above it.
struct SpinnerObserver {
    bar: ProgressBar,
    started: Instant,
}

impl SpinnerObserver {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading image…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            started: Instant::now(),
        }
    }

    fn finish(&self, ok: bool) {
        self.bar.finish_and_clear();
        let secs = self.started.elapsed().as_secs_f64();
        if ok {
            eprintln!("{} Analysis complete {}", green("✔"), dim(&format!("{secs:.1}s")));
        } else {
            eprintln!("{} Analysis failed {}", red("✘"), dim(&format!("{secs:.1}s")));
        }
    }
}

impl PhaseObserver for SpinnerObserver {
    fn on_phase(&self, phase: PipelinePhase) {
        self.bar.set_prefix(format!("[{}/4]", phase.ordinal()));
        self.bar.set_message(phase_label(phase).to_string());
        self.bar.println(format!(
            "  {} {}",
            cyan("◆"),
            dim(&format!("{} — {}", phase, phase_label(phase)))
        ));
    }
}

fn phase_label(phase: PipelinePhase) -> &'static str {
    match phase {
        PipelinePhase::Initialization => "preparing request",
        PipelinePhase::FeatureExtraction => "extracting visual features",
        PipelinePhase::HypothesisGeneration => "searching the web for a candidate location",
        PipelinePhase::Synthesis => "writing the final report",
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a local photo (English report)
  geocog photo.jpg

  # Spanish report, JSON output
  geocog --lang es --json photo.jpg > report.json

  # Label the photo's EXIF GPS position via OpenStreetMap
  geocog --reverse-geocode photo.jpg

  # Supply the position by hand (overrides EXIF)
  geocog --lat 43.1467 --lon -4.2322 --label "Bárcena Mayor" photo.jpg

  # Ignore EXIF GPS and infer the location from the pixels
  geocog --no-exif-gps photo.jpg

  # Analyse an image from a URL with a different model
  geocog --model gemini-2.5-pro https://example.com/street.webp

  # Use another vision provider (no web-search grounding)
  geocog --provider openai --model gpt-4.1 photo.jpg

LANGUAGES:
  en (default), es, zh, hi, fr, ru, pt. Anything else falls back to English.

EXIT CODES:
  0  success
  1  bad input or configuration
  2  GENERIC_ERROR
  3  QUOTA_EXCEEDED
  4  INVALID_API_KEY
  5  INVALID_RESPONSE_FORMAT

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY     Google Gemini API key (API_KEY is accepted as a fallback)
  GEOCOG_MODEL       Override model ID
  GEOCOG_PROVIDER    Use an edgequake-llm provider instead of Gemini
  OPENAI_API_KEY     Read by the openai provider
  ANTHROPIC_API_KEY  Read by the anthropic provider
  RUST_LOG           Overrides the log filter
"#;

/// Locate where a photo was taken and check it for manipulation.
#[derive(Parser, Debug)]
#[command(
    name = "geocog",
    version,
    about = "Geolocate and forensically assess an image using multimodal LLMs",
    long_about = "Runs a staged analysis over an image: visual feature extraction, a \
web-search-grounded location hypothesis, and a structured final report with confidence, \
authenticity assessment and indoor/outdoor classification.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image path or HTTP/HTTPS URL.
    input: String,

    /// Report language (en, es, zh, hi, fr, ru, pt).
    #[arg(short, long, env = "GEOCOG_LANG", default_value = "en")]
    lang: Language,

    /// Trusted latitude; must be given with --lon. Overrides EXIF GPS.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Trusted longitude; must be given with --lat.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Human-readable label for the trusted location.
    #[arg(long, requires = "lat")]
    label: Option<String>,

    /// Look up an address label for the trusted location via OpenStreetMap
    /// Nominatim.
    #[arg(long, conflicts_with = "label")]
    reverse_geocode: bool,

    /// Do not use the photo's EXIF GPS position as a trusted location.
    #[arg(long, conflicts_with = "lat")]
    no_exif_gps: bool,

    /// Model ID (default: gemini-2.5-flash).
    #[arg(long, env = "GEOCOG_MODEL")]
    model: Option<String>,

    /// edgequake-llm provider (openai, anthropic, ollama, …) instead of Gemini.
    #[arg(long, env = "GEOCOG_PROVIDER")]
    provider: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Attempts per remote call when rate-limited.
    #[arg(long, default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..=10))]
    max_attempts: u32,

    /// Per-call HTTP timeout in seconds (also used for image downloads).
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Output the report as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let orchestrator = Orchestrator::new(build_config(&cli)?).context("Invalid configuration")?;

    let image = resolve_input(&cli.input, cli.timeout)
        .await
        .with_context(|| format!("Failed to load image '{}'", cli.input))?;

    let trusted = trusted_location(&cli, &image).await?;
    let mut request = orchestrator.request(image);
    if let Some(location) = trusted {
        if !cli.quiet {
            eprintln!(
                "{} Trusted location: {}",
                cyan("◆"),
                bold(&location.label.clone().unwrap_or_else(|| location.coordinates()))
            );
        }
        request = request.with_trusted_location(location);
    }

    let result = if show_progress {
        let observer = SpinnerObserver::new();
        let result = orchestrator.run_analysis(&request, &observer).await;
        observer.finish(result.is_ok());
        result
    } else {
        orchestrator
            .run_analysis(&request, &|phase: PipelinePhase| {
                tracing::info!("phase: {}", phase)
            })
            .await
    };

    match result {
        Ok(report) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialise report")?
                );
            } else {
                print_report(&report);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{} {}: {}", red("✘"), bold(e.code()), e);
            Ok(ExitCode::from(exit_code(&e)))
        }
    }
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .max_attempts(cli.max_attempts)
        .request_timeout_secs(cli.timeout)
        .default_language(cli.lang);

    if let Some(key) = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("API_KEY").ok())
    {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Build the trusted-location hint: `--lat/--lon` if given, else the photo's
/// EXIF GPS position unless `--no-exif-gps`. Optionally labelled.
async fn trusted_location(cli: &Cli, image: &ImagePayload) -> Result<Option<TrustedLocation>> {
    let explicit = TrustedLocation::from_parts(cli.lat, cli.lon).context("Invalid --lat/--lon")?;
    let Some(mut location) = explicit.or_else(|| {
        if cli.no_exif_gps {
            None
        } else {
            exif_gps_location(image)
        }
    }) else {
        if cli.reverse_geocode {
            tracing::warn!("--reverse-geocode ignored: no trusted location");
        }
        return Ok(None);
    };

    if let Some(ref label) = cli.label {
        location = location.with_label(label.clone());
    } else if cli.reverse_geocode {
        let geocoder = Geocoder::new(cli.timeout).context("Failed to build geocoder")?;
        match geocoder
            .reverse(location.latitude, location.longitude, cli.lang)
            .await
        {
            Ok(Some(address)) => location = location.with_label(address),
            Ok(None) => tracing::warn!("No address found for {}", location.coordinates()),
            Err(e) => tracing::warn!("Reverse geocoding failed: {}", e),
        }
    }

    Ok(Some(location))
}

fn exit_code(e: &AnalysisError) -> u8 {
    match e {
        AnalysisError::GenericFailure { .. } => 2,
        AnalysisError::QuotaExceeded => 3,
        AnalysisError::InvalidCredential => 4,
        AnalysisError::InvalidResponseFormat { .. } => 5,
    }
}

fn print_report(report: &AnalysisReport) {
    println!("{}  {}", bold("Location:"), bold(&report.location_name));
    println!("{}  {:.0}%", bold("Confidence:"), report.confidence_score);
    println!();
    println!("{}", report.description);
    println!();

    let forensic = &report.forensic;
    let verdict = if forensic.is_altered {
        red("likely altered")
    } else {
        green("no alteration detected")
    };
    println!(
        "{}  {}  {}",
        bold("Forensics:"),
        verdict,
        dim(&format!("({:.0}%)", forensic.alteration_confidence))
    );
    println!("  {}", forensic.summary);
    println!();
    println!(
        "{}  {}",
        bold("Environment:"),
        cyan(report.environment.kind.as_str())
    );
    println!("  {}", report.environment.details);

    if !report.citations.is_empty() {
        println!();
        println!("{}", bold("Sources:"));
        for (i, c) in report.citations.iter().enumerate() {
            println!("  [{}] {}  {}", i + 1, c.title, dim(&c.uri));
        }
    }
}
