//! Term abbreviation CLI
//!
//! # Usage
//!
//! ```bash
//! # Recommend an abbreviation
//! term_cli --workbook terms.yaml --embeddings words.yaml recommend 계좌번호
//!
//! # Show how each morpheme was resolved
//! term_cli --workbook terms.yaml recommend 고객번호 --trace
//!
//! # Improve a column definition
//! term_cli --workbook terms.yaml improve ACNT_NO
//!
//! # Menu-driven session
//! term_cli --workbook terms.yaml interactive
//!
//! # Compile a lexicon snapshot and reuse it
//! term_cli --workbook terms.yaml --embeddings words.yaml snapshot --out lexicon.bin
//! term_cli --snapshot lexicon.bin recommend 사용자번호
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use term_abbr::lexicon::{Record, Workbook};
use term_abbr::recommend::MorphemeResolution;
use term_abbr::{
    AppConfig, DefinitionImprover, DefinitionOutcome, DictionaryTokenizer, Lexicon,
    LexiconCompiler, LlmAbbreviationOracle, LlmClient, OpenAiClient, OpenAiEmbedder, Recommender,
    RecommenderConfig, RemoteTokenizer, Tokenizer,
};

#[derive(Parser)]
#[command(name = "term_cli")]
#[command(version = "0.1.0")]
#[command(about = "Recommend standard English abbreviations for Korean business terms")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workbook export with the term sheet and the word sheet
    #[arg(long, global = true, env = "TERM_ABBR_WORKBOOK")]
    workbook: Option<PathBuf>,

    /// Workbook export holding the embedding column (defaults to the word sheet)
    #[arg(long, global = true, env = "EXCEL_FILE_PATH")]
    embeddings: Option<PathBuf>,

    /// Load a compiled lexicon snapshot instead of the workbook
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Morphological analyzer endpoint; the built-in segmenter is used when absent
    #[arg(long, global = true, env = "TERM_ABBR_TOKENIZER_URL")]
    tokenizer_url: Option<String>,

    /// Resolve morphemes concurrently
    #[arg(long, global = true)]
    concurrent: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend an abbreviation for a term
    Recommend {
        text: String,

        /// Print the per-morpheme resolution trace
        #[arg(long)]
        trace: bool,
    },

    /// Improve the definition of the term with this abbreviation
    Improve { abbreviation: String },

    /// Menu-driven session
    Interactive,

    /// Report embedding dimensionality problems in the workbook
    Audit,

    /// Compile the workbook into a binary lexicon snapshot
    Snapshot {
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Check LLM connectivity
    Ping,
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(id) = &config.spreadsheet_id {
        tracing::info!(spreadsheet_id = %id, "term dictionary source");
    }

    match &cli.command {
        Commands::Recommend { text, trace } => cmd_recommend(&cli, &config, text, *trace).await,
        Commands::Improve { abbreviation } => cmd_improve(&cli, &config, abbreviation).await,
        Commands::Interactive => cmd_interactive(&cli, &config).await,
        Commands::Audit => cmd_audit(&cli, &config),
        Commands::Snapshot { out } => cmd_snapshot(&cli, &config, out),
        Commands::Ping => cmd_ping(&config).await,
    }
}

// =============================================================================
// SETUP
// =============================================================================

fn workbook_path(cli: &Cli, config: &AppConfig) -> Result<PathBuf> {
    cli.workbook
        .clone()
        .or_else(|| config.workbook_path.clone())
        .ok_or_else(|| anyhow!("No workbook given; pass --workbook or set TERM_ABBR_WORKBOOK"))
}

fn load_lexicon(cli: &Cli, config: &AppConfig) -> Result<Lexicon> {
    if let Some(snapshot) = &cli.snapshot {
        return Lexicon::load_binary(snapshot)
            .with_context(|| format!("Failed to load snapshot {}", snapshot.display()));
    }

    let workbook = workbook_path(cli, config)?;
    let embeddings = cli.embeddings.clone().or_else(|| config.embedding_path.clone());
    LexiconCompiler::new(config.columns.clone())
        .build_from_files(&workbook, embeddings.as_deref())
        .with_context(|| format!("Failed to build lexicon from {}", workbook.display()))
}

fn load_term_records(cli: &Cli, config: &AppConfig) -> Result<Vec<Record>> {
    let path = workbook_path(cli, config)?;
    let workbook = Workbook::load(&path)?;
    let sheet = workbook
        .sheet(0)
        .ok_or_else(|| anyhow!("{} has no term sheet", path.display()))?;
    Ok(sheet.records())
}

fn llm_client(config: &AppConfig) -> Result<Arc<dyn LlmClient>> {
    Ok(Arc::new(OpenAiClient::new(&config.openai)?))
}

fn build_recommender(cli: &Cli, config: &AppConfig) -> Result<Recommender> {
    let lexicon = load_lexicon(cli, config)?;
    println!("{} {}", "Lexicon:".bold(), lexicon.stats());

    let tokenizer: Arc<dyn Tokenizer> = match &cli.tokenizer_url {
        Some(url) => Arc::new(RemoteTokenizer::new(url.clone(), config.openai.timeout)?),
        None => Arc::new(DictionaryTokenizer::from_lexicon(&lexicon)),
    };
    let embedder = Arc::new(OpenAiEmbedder::new(&config.openai, &config.embedding)?);
    let oracle = Arc::new(LlmAbbreviationOracle::new(
        llm_client(config)?,
        config.recommend.clone(),
    ));

    Ok(Recommender::with_config(
        Arc::new(lexicon),
        tokenizer,
        embedder,
        oracle,
        RecommenderConfig {
            similarity_threshold: config.similarity_threshold,
            call_timeout: config.openai.timeout,
            concurrent_morphemes: cli.concurrent,
        },
    ))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

async fn cmd_recommend(cli: &Cli, config: &AppConfig, text: &str, trace: bool) -> Result<()> {
    let recommender = build_recommender(cli, config)?;
    recommend_once(&recommender, text, trace).await;
    Ok(())
}

async fn recommend_once(recommender: &Recommender, text: &str, trace: bool) {
    let result = recommender.recommend_detailed(text).await;

    if trace {
        for step in &result.trace {
            let detail = match &step.resolution {
                MorphemeResolution::ExactMatch { abbreviation } => {
                    format!("{} {}", "exact".green(), abbreviation)
                }
                MorphemeResolution::Skipped => "skipped".dimmed().to_string(),
                MorphemeResolution::Proposed {
                    abbreviation,
                    candidates,
                } => format!("{} {} ({} candidates)", "oracle".cyan(), abbreviation, candidates),
                MorphemeResolution::Failed { reason } => format!("{} {}", "failed".red(), reason),
            };
            println!("  {}/{}  {}", step.morpheme.surface, step.morpheme.tag, detail);
        }
    }

    if result.is_empty() {
        println!("{} no recommendation for '{}'", "✗".red(), text);
    } else if result.canonical_match {
        println!(
            "{} {} {}",
            "✓".green(),
            result.abbreviation.bold(),
            "(existing abbreviation)".dimmed()
        );
    } else {
        println!("{} {}", "✓".green(), result.abbreviation.bold());
    }
}

async fn cmd_improve(cli: &Cli, config: &AppConfig, abbreviation: &str) -> Result<()> {
    let records = load_term_records(cli, config)?;
    let improver = DefinitionImprover::new(llm_client(config)?, config.definition.clone());
    improve_once(&improver, &records, config, abbreviation).await
}

async fn improve_once(
    improver: &DefinitionImprover,
    records: &[Record],
    config: &AppConfig,
    abbreviation: &str,
) -> Result<()> {
    let outcome = improver
        .improve_term(abbreviation, records, &config.columns)
        .await;

    match outcome {
        DefinitionOutcome::Improved { current, improved } => {
            println!("{} {}", "Term:".bold(), abbreviation);
            println!("{}\n  {}", "Current:".bold(), current);
            println!("{}\n  {}", "Improved:".green().bold(), improved);
            Ok(())
        }
        DefinitionOutcome::NotFound {
            available_columns,
            sample_terms,
        } => {
            eprintln!("{} term '{}' not found", "✗".red(), abbreviation);
            eprintln!("  available columns: {}", available_columns.join(", "));
            let samples: Vec<_> = sample_terms.iter().take(5).map(String::as_str).collect();
            eprintln!("  sample terms: {}", samples.join(", "));
            bail!("term not found")
        }
        DefinitionOutcome::Incomplete => {
            bail!("term name or definition is empty for '{}'", abbreviation)
        }
        DefinitionOutcome::Failed { message } => bail!("definition improvement failed: {}", message),
    }
}

async fn cmd_interactive(cli: &Cli, config: &AppConfig) -> Result<()> {
    let recommender = build_recommender(cli, config)?;
    let records = load_term_records(cli, config)?;
    let improver = DefinitionImprover::new(llm_client(config)?, config.definition.clone());
    let mut rl = DefaultEditor::new()?;

    loop {
        println!();
        println!("{}", "=".repeat(50));
        println!("{}", "용어 추천 시스템".bold());
        println!("{}", "=".repeat(50));
        println!("1. 용어 정의 개선");
        println!("2. 약어 추천");
        println!("3. 시스템 종료");

        let Some(choice) = read_line(&mut rl, "선택 (1-3): ")? else {
            break;
        };
        match choice.as_str() {
            "1" => {
                while let Some(abbr) = read_line(&mut rl, "약어 (back: 뒤로): ")? {
                    if abbr.eq_ignore_ascii_case("back") {
                        break;
                    }
                    if abbr.is_empty() {
                        continue;
                    }
                    if let Err(e) = improve_once(&improver, &records, config, &abbr).await {
                        eprintln!("{}: {}", "error".red().bold(), e);
                    }
                }
            }
            "2" => {
                while let Some(text) = read_line(&mut rl, "용어 (back: 뒤로): ")? {
                    if text.eq_ignore_ascii_case("back") {
                        break;
                    }
                    if text.is_empty() {
                        continue;
                    }
                    recommend_once(&recommender, &text, true).await;
                }
            }
            "3" => break,
            other => println!("{} unknown choice '{}'", "✗".red(), other),
        }
    }
    Ok(())
}

/// Trimmed input line; `None` on Ctrl-C or Ctrl-D.
fn read_line(rl: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => {
            let line = line.trim().to_string();
            if !line.is_empty() {
                rl.add_history_entry(line.as_str())?;
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn cmd_audit(cli: &Cli, config: &AppConfig) -> Result<()> {
    let lexicon = load_lexicon(cli, config)?;
    let audit = lexicon.audit();
    println!("{} {}", "Lexicon:".bold(), lexicon.stats());
    println!("{}", audit);
    if audit.is_clean() {
        println!("{} all embeddings are canonical", "✓".green());
    } else {
        println!("{} embedding problems found", "⚠".yellow());
    }
    Ok(())
}

fn cmd_snapshot(cli: &Cli, config: &AppConfig, out: &Path) -> Result<()> {
    let lexicon = load_lexicon(cli, config)?;
    lexicon
        .save_binary(out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!(
        "{} wrote {} ({})",
        "✓".green(),
        out.display(),
        lexicon.stats()
    );
    Ok(())
}

async fn cmd_ping(config: &AppConfig) -> Result<()> {
    let client = llm_client(config)?;
    let reply = client
        .ping()
        .await
        .with_context(|| format!("{} is not reachable", client.provider_name()))?;
    println!("{} {}: {}", "✓".green(), client.provider_name(), reply);
    Ok(())
}
