use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use parley::config::{AppConfig, EngineKind};
use parley::pipeline::{Pipeline, PipelineOptions, RunReport};
use parley::services::concat::FfmpegConcatenator;
use parley::services::tts::{build_engine, EngineHandle};
use parley::voice::assign_voices;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Render a two-party dialogue transcript into a single audio file", long_about = None)]
struct Cli {
    /// TOML config file (defaults to $PARLEY_CONFIG or ./parley.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize every line and combine them into one file
    Render(RenderArgs),
    /// List the engine's voices and the ones that would be selected
    Voices {
        #[arg(long, value_enum)]
        engine: Option<EngineKind>,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Transcript file, or `-` for stdin
    #[arg(conflicts_with_all = ["text", "sample"])]
    file: Option<PathBuf>,

    /// Inline transcript text
    #[arg(short, long, conflicts_with = "sample")]
    text: Option<String>,

    /// Render the bundled sample call
    #[arg(long)]
    sample: bool,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    engine: Option<EngineKind>,

    /// Per-line synthesis timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long)]
    agent_voice: Option<String>,

    #[arg(long)]
    member_voice: Option<String>,

    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parley=info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already installed");
    }

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Render(args) => render(cli.config.as_deref(), args).await,
        Commands::Voices { engine } => voices(cli.config.as_deref(), engine).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n❌ Error during audio processing: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn render(config_path: Option<&Path>, args: RenderArgs) -> Result<()> {
    let mut config = AppConfig::load(config_path)?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(engine) = args.engine {
        config.synthesis.engine = engine;
    }
    if let Some(ms) = args.timeout_ms {
        config.synthesis.timeout_ms = ms;
    }
    if args.agent_voice.is_some() {
        config.voices.agent = args.agent_voice;
    }
    if args.member_voice.is_some() {
        config.voices.member = args.member_voice;
    }
    config.validate()?;

    let transcript = match (args.file, args.text, args.sample) {
        (_, _, true) => parley::SAMPLE_TRANSCRIPT.to_string(),
        (_, Some(text), _) => text,
        (Some(path), _, _) => read_transcript(&path).await?,
        (None, None, false) => bail!("no transcript given: pass a FILE, --text or --sample"),
    };

    let engine = build_engine(
        config.synthesis.engine,
        &config.engines,
        config.synthesis_settings(),
    )
    .context("no speech engine available")?;
    let concatenator = Arc::new(FfmpegConcatenator::new(config.assembly.ffmpeg_bin.clone()));

    let options = PipelineOptions {
        output_dir: config.output_dir.clone(),
        timeout: config.timeout(),
        poll_interval: config.poll_interval(),
        policy: config.voice_policy(),
        format: config.output_format(),
    };
    tracing::debug!(output_dir = ?options.output_dir, "Output directory");

    let pipeline = Pipeline::new(EngineHandle::new(engine), concatenator, options);
    let report = pipeline.run(&transcript).await?;

    print_summary(&report);
    if let Some(path) = args.report {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("writing report to {}", path.display()))?;
    }
    Ok(())
}

async fn voices(config_path: Option<&Path>, engine: Option<EngineKind>) -> Result<()> {
    let mut config = AppConfig::load(config_path)?;
    if let Some(engine) = engine {
        config.synthesis.engine = engine;
    }

    let engine = build_engine(
        config.synthesis.engine,
        &config.engines,
        config.synthesis_settings(),
    )?;
    let catalog = engine.list_voices().await?;

    println!("Available voices ({}):", engine.name());
    for voice in &catalog {
        println!(
            "ID: {}, Name: {}, Languages: {:?}, Gender: {}",
            voice.id,
            voice.name,
            voice.locale_tags,
            voice
                .gender
                .map(|g| format!("{:?}", g))
                .unwrap_or_else(|| "unknown".into())
        );
    }

    let assignment = assign_voices(&catalog, &config.voice_policy())?;
    println!("\nSelected voices:");
    for speaker in parley::transcript::Speaker::ALL {
        println!("{}: {}", speaker, assignment.voice_for(speaker));
    }
    Ok(())
}

async fn read_transcript(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("reading transcript from stdin")?;
        return Ok(buf);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading transcript {}", path.display()))
}

fn print_summary(report: &RunReport) {
    println!("\n✅ Successfully combined all audio segments!");
    println!(
        "Combined file: {} ({} segments)",
        report.output.display(),
        report.ready_count()
    );
    for warning in &report.warnings {
        println!("⚠️  {:?}", warning);
    }
    if !report.skipped_lines.is_empty() {
        println!("Skipped lines: {:?}", report.skipped_lines);
    }
}
