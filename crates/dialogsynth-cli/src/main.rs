use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialogsynth_core::{
    BatchReport, Config, ConversationRequest, Pipeline, SUPPORTED_LANGUAGES, Sentiment,
    parse_toml_file,
};
use dialogsynth_llm::TextGenerator;
use dialogsynth_speech::SpeechProvider;
use dialogsynth_speech::providers::openai_tts::OpenAITts;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

const GENERATION_KEY_ENV: &str = "DIALOGSYNTH_GENERATION_API_KEY";
const SPEECH_KEY_ENV: &str = "DIALOGSYNTH_SPEECH_API_KEY";

#[derive(Parser)]
#[command(name = "dialogsynth")]
#[command(about = "Generate synthetic customer-service conversations with multi-voice audio", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate conversations for one language
    Generate {
        /// Language code, e.g. en-US or fr-FR
        #[arg(short, long)]
        language: String,

        /// Number of conversations to generate
        #[arg(short, long, default_value = "1")]
        num_files: usize,

        /// Directory for transcripts; audio goes to its audio/ subdirectory
        #[arg(short, long, default_value = "./generated_conversations")]
        output_dir: PathBuf,

        /// Customer sentiment (random per conversation when omitted)
        #[arg(short, long)]
        sentiment: Option<Sentiment>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for voice, topic and pause selection
        #[arg(long)]
        seed: Option<u64>,

        /// Conversations processed at the same time
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Generate one conversation for every supported language
    AllLanguages {
        /// Root directory; each language writes to <output-dir>/<code>
        #[arg(short, long, default_value = "./generated_conversations")]
        output_dir: PathBuf,

        /// Customer sentiment (random per conversation when omitted)
        #[arg(short, long)]
        sentiment: Option<Sentiment>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Generate {
            language,
            num_files,
            output_dir,
            sentiment,
            config,
            seed,
            concurrency,
        } => {
            if num_files == 0 {
                anyhow::bail!("--num-files must be at least 1");
            }
            let mut config = load_config(config.as_deref())?;
            if seed.is_some() {
                config.pipeline.seed = seed;
            }
            if let Some(concurrency) = concurrency {
                config.pipeline.max_concurrent_conversations = concurrency;
            }
            generate(&config, &language, num_files, output_dir, sentiment).await?
        }
        Commands::AllLanguages {
            output_dir,
            sentiment,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            all_languages(&config, output_dir, sentiment).await?
        }
    };

    println!("\n{}", report);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            parse_toml_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

fn request(language: &str, sentiment: Option<Sentiment>) -> ConversationRequest {
    let request = ConversationRequest::new(language);
    match sentiment {
        Some(sentiment) => request.with_sentiment(sentiment),
        None => request,
    }
}

async fn generate(
    config: &Config,
    language: &str,
    num_files: usize,
    output_dir: PathBuf,
    sentiment: Option<Sentiment>,
) -> Result<BatchReport> {
    let (generator, speech) = build_providers(config)?;
    let pipeline = Pipeline::new(generator, speech, config, &output_dir)
        .context("Invalid configuration")?;

    log::info!(
        "Generating {} {} conversation(s) into {}",
        num_files,
        language,
        output_dir.display()
    );

    let requests = (0..num_files)
        .map(|_| request(language, sentiment))
        .collect();
    Ok(pipeline.run_batch(requests).await)
}

async fn all_languages(
    config: &Config,
    output_dir: PathBuf,
    sentiment: Option<Sentiment>,
) -> Result<BatchReport> {
    let (generator, speech) = build_providers(config)?;
    let started = Instant::now();
    let mut report = BatchReport::default();

    for code in SUPPORTED_LANGUAGES {
        let pipeline = Pipeline::new(
            generator.clone(),
            speech.clone(),
            config,
            output_dir.join(code),
        )
        .context("Invalid configuration")?;

        let batch = pipeline.run_batch(vec![request(code, sentiment)]).await;
        report.completed.extend(batch.completed);
        report.failed.extend(batch.failed);
    }

    report.elapsed = started.elapsed();
    Ok(report)
}

fn build_providers(config: &Config) -> Result<(Arc<dyn TextGenerator>, Arc<dyn SpeechProvider>)> {
    let backend = config.generation.backend;
    let generation_key = std::env::var(GENERATION_KEY_ENV)
        .ok()
        .or_else(|| backend.api_key_env().and_then(|name| std::env::var(name).ok()));

    let generator = dialogsynth_llm::from_config(&config.generation, generation_key)
        .with_context(|| {
            format!(
                "Failed to set up the {} text generator (set {} or {})",
                backend,
                GENERATION_KEY_ENV,
                backend.api_key_env().unwrap_or("no key needed")
            )
        })?;

    let speech_key = std::env::var(SPEECH_KEY_ENV)
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .with_context(|| {
            format!(
                "No speech API key found, set {} or OPENAI_API_KEY",
                SPEECH_KEY_ENV
            )
        })?;

    let speech: Arc<dyn SpeechProvider> = Arc::new(
        OpenAITts::new(speech_key, config.speech.clone())
            .context("Failed to set up the speech provider")?,
    );

    log::info!(
        "Using {} ({}) for text and {} for speech",
        generator.backend_name(),
        generator.model(),
        speech.provider_name()
    );

    Ok((generator, speech))
}
