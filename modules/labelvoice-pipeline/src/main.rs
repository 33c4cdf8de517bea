use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai_client::Gemini;
use labelvoice_common::{
    Config, FontSize, IngredientTable, PipelineOptions, PipelineOutcome, SpeakingRate,
    SummaryPolicy,
};
use labelvoice_pipeline::prompt::build_prompt;
use labelvoice_pipeline::render::{render_card_page, render_report};
use labelvoice_pipeline::summary::extract_summary;
use labelvoice_pipeline::upload::read_upload;
use labelvoice_pipeline::{BatchSession, Pipeline, SpeechSynthesizer};

#[derive(Parser)]
#[command(name = "labelvoice")]
#[command(about = "Read product labels aloud in plain Traditional Chinese")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret label photos and write text, summaries, audio and a report
    Run {
        /// JPEG or PNG label photos, processed in order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "labelvoice-out")]
        out: PathBuf,

        /// Narration speed: normal or slow
        #[arg(long, default_value = "normal")]
        rate: SpeakingRate,

        /// Report font size: normal, large or extra-large
        #[arg(long, default_value = "large")]
        font_size: FontSize,

        /// Which part of the reply is narrated: keyword or last-paragraph
        #[arg(long, default_value = "keyword")]
        summary_policy: SummaryPolicy,

        /// Skip ingredient highlighting
        #[arg(long)]
        no_highlight: bool,

        /// Only process the first image
        #[arg(long)]
        single: bool,

        /// Give up on an image after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Also write one standalone HTML card per image
        #[arg(long)]
        export_cards: bool,
    },

    /// Print the instruction text sent with every image
    Prompt,

    /// Extract the narrated summary from a saved interpretation
    Summarize {
        file: PathBuf,

        #[arg(long, default_value = "keyword")]
        summary_policy: SummaryPolicy,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("labelvoice=info".parse()?)
                .add_directive("ai_client=info".parse()?)
                .add_directive("speech_client=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            images,
            out,
            rate,
            font_size,
            summary_policy,
            no_highlight,
            single,
            timeout_secs,
            export_cards,
        } => {
            let options = PipelineOptions {
                multi_image: !single,
                highlight_ingredients: !no_highlight,
                font_size,
                speaking_rate: rate,
                summary_policy,
                per_image_timeout: timeout_secs.map(Duration::from_secs),
                export_cards,
            };
            cmd_run(&images, &out, options).await
        }
        Commands::Prompt => {
            println!("{}", build_prompt());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Summarize {
            file,
            summary_policy,
        } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            println!("{}", extract_summary(&raw, summary_policy));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_run(images: &[PathBuf], out: &Path, options: PipelineOptions) -> Result<ExitCode> {
    // Credentials are checked before any image is touched.
    let config = Config::from_env()?;
    config.log_redacted();

    let mut gemini = Gemini::new(&config.gemini_api_key, &config.gemini_model)?
        .with_timeout(config.http_timeout);
    if let Some(url) = &config.gemini_base_url {
        gemini = gemini.with_base_url(url);
    }
    let synthesizer = SpeechSynthesizer::from_config(&config)?;
    let ingredients = IngredientTable::load_or_builtin(config.ingredients_path.as_deref())?;
    info!(entries = ingredients.len(), "Ingredient table ready");

    let pipeline = Pipeline::new(
        Arc::new(gemini),
        Arc::new(synthesizer),
        Arc::new(ingredients),
    );

    let uploads: Vec<_> = images.iter().map(|path| read_upload(path)).collect();

    let mut session = BatchSession::new(options);
    info!(session = %session.id(), started_at = %session.started_at(), "Session created");
    session.run(&pipeline, &uploads).await;
    let outcomes = session.outcomes();

    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    for outcome in outcomes {
        write_outcome(out, outcome, session.options())?;
    }

    let report = render_report(outcomes, session.options());
    std::fs::write(out.join("report.html"), report)?;
    std::fs::write(
        out.join("report.json"),
        serde_json::to_string_pretty(outcomes)?,
    )?;

    let readable = session.readable_count();
    info!(
        out = %out.display(),
        processed = session.outcomes().len(),
        readable,
        elapsed_ms = (Utc::now() - session.started_at()).num_milliseconds(),
        "Results written"
    );

    if readable == 0 && !session.is_empty() {
        warn!("No image produced readable text");
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

/// Files for one outcome share an `NN-stem` prefix so they sort in batch order.
fn write_outcome(out: &Path, outcome: &PipelineOutcome, options: &PipelineOptions) -> Result<()> {
    let stem = Path::new(&outcome.image_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let prefix = format!("{:02}-{}", outcome.index + 1, stem);

    if outcome.has_text() {
        std::fs::write(out.join(format!("{prefix}.txt")), &outcome.display_text)?;
        std::fs::write(
            out.join(format!("{prefix}.summary.txt")),
            &outcome.summary_text,
        )?;
    }
    if let Some(audio) = outcome.audio_bytes() {
        std::fs::write(out.join(format!("{prefix}.mp3")), audio)?;
    }
    if options.export_cards {
        std::fs::write(
            out.join(format!("{prefix}.card.html")),
            render_card_page(outcome, options),
        )?;
    }
    if let Some(error) = &outcome.error {
        warn!(
            image = %outcome.image_name,
            kind = error.kind(),
            "{}",
            error.user_message()
        );
    }
    Ok(())
}
