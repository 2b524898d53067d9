//! doc-chunker CLI
//!
//! Parses documents into elements, splits them into chunks and writes the
//! chunks as JSON, once per chunking strategy.

use anyhow::{Context, Result};
use clap::Parser;
use doc_chunker::document::{
    ChunkingPlan, ParseOptions, ParseStrategy, PipelineConfig, PipelineOrchestrator,
    PipelineSettings,
};
use doc_chunker::text::chunking::{ChunkingStrategy, SplitterConfig};
use doc_chunker::util::tracing::{LoggingConfig, load_tracing_config_from_env, tracing_init};
use std::path::PathBuf;
use tracing::{error, warn};

#[derive(Parser, Debug)]
#[command(name = "doc-chunker")]
#[command(about = "Split documents into bounded, overlapping chunks for retrieval")]
#[command(version)]
struct Cli {
    /// Input file(s): text, markdown, source code, or a JSON element list
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory [default: $CHUNKER_OUTPUT_DIR or "output"]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Chunking strategy: recursive, fixed (alias character) or code; repeatable
    #[arg(short, long = "strategy")]
    strategies: Vec<String>,

    /// Maximum chunk size in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared between consecutive chunks
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Language for the code strategy (python, rust, js, ...)
    #[arg(short, long)]
    language: Option<String>,

    /// Separator for the fixed strategy
    #[arg(long)]
    separator: Option<String>,

    /// Do not record start_index in chunk metadata
    #[arg(long)]
    no_start_index: bool,

    /// Also write the unchunked elements
    #[arg(long)]
    save_parsed: bool,

    /// Add code chunking for source files
    #[arg(long)]
    auto_code: bool,

    /// Layout analysis hint for the parser: auto, fast or hi_res
    #[arg(long, default_value = "auto")]
    parse_strategy: ParseStrategy,

    /// OCR languages hint, e.g. chi_sim+eng
    #[arg(long)]
    ocr_languages: Option<String>,

    /// Extract images from PDFs
    #[arg(long)]
    extract_images: bool,

    /// Drop the HTML rendering of tables
    #[arg(long)]
    no_infer_table_structure: bool,

    /// Log level (overrides LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn output_dir(&self, settings: &PipelineSettings) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| settings.output_dir.clone())
    }

    /// One plan per requested strategy, labelled with the strategy name as given
    fn chunking_plans(&self, settings: &PipelineSettings) -> Result<Vec<ChunkingPlan>> {
        let chunk_size = self.chunk_size.unwrap_or(settings.chunk_size);
        let chunk_overlap = self.chunk_overlap.unwrap_or(settings.chunk_overlap);
        let language = self.language.as_deref().or(settings.language.as_deref());
        let strategies = if self.strategies.is_empty() {
            vec![settings.strategy.clone()]
        } else {
            self.strategies.clone()
        };

        strategies
            .iter()
            .map(|strategy| {
                let mut config =
                    SplitterConfig::from_strategy(strategy, chunk_size, chunk_overlap, language)
                        .with_context(|| format!("invalid configuration for '{strategy}'"))?;
                if let Some(separator) = &self.separator {
                    if config.strategy == ChunkingStrategy::Fixed {
                        config = config.with_separator(separator.clone());
                    } else {
                        warn!("--separator only applies to the fixed strategy, ignored for {strategy}");
                    }
                }
                let plan = ChunkingPlan::new(config.with_start_index(!self.no_start_index));
                Ok(match plan.config.strategy {
                    ChunkingStrategy::Code => plan,
                    _ => plan.with_label(strategy.trim().to_ascii_lowercase()),
                })
            })
            .collect()
    }

    fn pipeline_config(&self, settings: &PipelineSettings) -> Result<PipelineConfig> {
        let parse_options = ParseOptions {
            strategy: self.parse_strategy,
            ocr_languages: self.ocr_languages.clone(),
            extract_images_in_pdf: self.extract_images,
            infer_table_structure: !self.no_infer_table_structure,
        };
        let config = self
            .chunking_plans(settings)?
            .into_iter()
            .fold(PipelineConfig::new(self.output_dir(settings)), PipelineConfig::with_plan)
            .with_parse_options(parse_options)
            .with_save_parsed(self.save_parsed)
            .with_auto_code(self.auto_code);
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = load_tracing_config_from_env().unwrap_or_else(|_| LoggingConfig::default());
    let logging = match &cli.log_level {
        Some(level) => logging.with_level(level.clone()),
        None => logging,
    };
    tracing_init(logging)?;

    let settings = PipelineSettings::from_env().unwrap_or_else(|e| {
        warn!("ignoring invalid CHUNKER_* settings: {}", e);
        PipelineSettings::default()
    });
    let config = cli.pipeline_config(&settings)?;
    let output_dir = config.output_dir.clone();
    let orchestrator =
        PipelineOrchestrator::new(config).context("invalid chunking configuration")?;

    let results = orchestrator.process_files(cli.inputs.clone()).await;
    let mut succeeded = 0;
    for result in &results {
        match result {
            Ok(report) if report.is_success() => {
                succeeded += 1;
                if let Some(parsed) = &report.parsed_output {
                    println!("{}: parsed elements -> {}", report.input.display(), parsed.display());
                }
                for output in &report.outputs {
                    println!(
                        "{}: {} chunks ({}) -> {}",
                        report.input.display(),
                        output.chunk_count,
                        output.label,
                        output.path.display()
                    );
                }
            }
            Ok(report) => {
                if let Some(e) = &report.parse_error {
                    error!("{}: {}", report.input.display(), e);
                }
            }
            Err(e) => error!("{}", e),
        }
    }

    if succeeded == 0 {
        anyhow::bail!("none of the {} input files could be processed", results.len());
    }
    println!(
        "\nProcessing complete! All output files saved to '{}'",
        output_dir.display()
    );
    Ok(())
}
