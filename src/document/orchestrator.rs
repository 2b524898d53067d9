//! Parse → chunk → save for whole files

use super::element::Chunk;
use super::error::{PipelineError, Result};
use super::parser::{ParseOptions, ParserRegistry};
use super::pipeline::{chunk_elements_with_statistics, normalize_elements};
use super::sink::save_chunks_to_json;
use crate::text::chunking::{
    ChunkingError, ChunkingStatistics, ChunkingStrategy, Language, SplitterConfig,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// One splitter configuration to run against every parsed file
#[derive(Debug, Clone)]
pub struct ChunkingPlan {
    pub label: String,
    pub config: SplitterConfig,
}

impl ChunkingPlan {
    /// Chunk size used for source files picked up by `auto_code`
    pub const CODE_CHUNK_SIZE: usize = 800;
    pub const CODE_CHUNK_OVERLAP: usize = 100;

    pub fn new(config: SplitterConfig) -> Self {
        Self {
            label: config.label(),
            config,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Syntax-aware plan for a source file
    pub fn code(language: Language) -> Self {
        Self::new(SplitterConfig::code(
            language,
            Self::CODE_CHUNK_SIZE,
            Self::CODE_CHUNK_OVERLAP,
        ))
    }
}

/// CLI defaults, overridable with `CHUNKER_*` environment variables
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "PipelineSettings::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "PipelineSettings::default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "PipelineSettings::default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "PipelineSettings::default_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl PipelineSettings {
    fn default_chunk_size() -> usize {
        SplitterConfig::DEFAULT_CHUNK_SIZE
    }
    fn default_chunk_overlap() -> usize {
        SplitterConfig::DEFAULT_CHUNK_OVERLAP
    }
    fn default_output_dir() -> PathBuf {
        PathBuf::from("output")
    }
    fn default_strategy() -> String {
        ChunkingStrategy::Recursive.name().to_string()
    }

    pub fn from_env() -> std::result::Result<Self, envy::Error> {
        envy::prefixed("CHUNKER_").from_env::<Self>()
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
            chunk_overlap: Self::default_chunk_overlap(),
            output_dir: Self::default_output_dir(),
            strategy: Self::default_strategy(),
            language: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub parse_options: ParseOptions,
    pub plans: Vec<ChunkingPlan>,
    /// Also write the unchunked elements (`{stem}_parsed_only.json`)
    pub save_parsed: bool,
    /// Add a code plan for source files whose language is known
    pub auto_code: bool,
}

impl PipelineConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            parse_options: ParseOptions::default(),
            plans: Vec::new(),
            save_parsed: false,
            auto_code: false,
        }
    }

    pub fn with_plan(mut self, plan: ChunkingPlan) -> Self {
        self.plans.push(plan);
        self
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    pub fn with_save_parsed(mut self, save_parsed: bool) -> Self {
        self.save_parsed = save_parsed;
        self
    }

    pub fn with_auto_code(mut self, auto_code: bool) -> Self {
        self.auto_code = auto_code;
        self
    }

    /// Every plan must be valid and write to its own file
    pub fn validate(&self) -> std::result::Result<(), ChunkingError> {
        let mut labels = HashSet::new();
        for plan in &self.plans {
            plan.config.validate()?;
            if !labels.insert(plan.label.as_str()) {
                return Err(ChunkingError::configuration(format!(
                    "duplicate chunking plan label: {}",
                    plan.label
                )));
            }
        }
        if self.plans.is_empty() && !self.save_parsed && !self.auto_code {
            return Err(ChunkingError::configuration(
                "no chunking plan configured and parsed output disabled",
            ));
        }
        Ok(())
    }
}

/// Result of one chunking plan for one file
#[derive(Debug, Clone)]
pub struct OutputReport {
    pub label: String,
    pub path: PathBuf,
    pub chunk_count: usize,
    pub statistics: ChunkingStatistics,
}

/// Result of processing one input file
#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    pub element_count: usize,
    pub parsed_output: Option<PathBuf>,
    pub outputs: Vec<OutputReport>,
    /// Set when the file could not be read or parsed; nothing was written
    pub parse_error: Option<PipelineError>,
}

impl FileReport {
    fn new(input: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            element_count: 0,
            parsed_output: None,
            outputs: Vec::new(),
            parse_error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.parse_error.is_none()
    }

    pub fn total_chunks(&self) -> usize {
        self.outputs.iter().map(|o| o.chunk_count).sum()
    }
}

/// Runs the configured plans against input files
#[derive(Clone)]
pub struct PipelineOrchestrator {
    config: Arc<PipelineConfig>,
    registry: Arc<ParserRegistry>,
}

impl PipelineOrchestrator {
    /// Build an orchestrator, rejecting invalid plans before any file is touched
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(ParserRegistry::with_defaults()),
        })
    }

    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn stem(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }

    /// Configured plans plus the code plan `auto_code` adds for source files
    pub fn plans_for(&self, path: &Path) -> Vec<ChunkingPlan> {
        let mut plans = self.config.plans.clone();
        if self.config.auto_code {
            let language = Language::from_path(path).filter(Language::is_source_code);
            if let Some(language) = language {
                let covered = plans
                    .iter()
                    .any(|p| p.config.language == Some(language));
                if !covered {
                    info!("Detected {} source, adding code chunking", language);
                    plans.push(ChunkingPlan::code(language));
                }
            }
        }
        plans
    }

    /// Parse one file, then chunk and save it once per plan
    ///
    /// A missing or unparsable input is logged and reported in the returned
    /// [`FileReport`]; write failures are returned as errors.
    pub fn process_file(&self, path: &Path) -> Result<FileReport> {
        let mut report = FileReport::new(path);

        let elements = match self.registry.parse(path, &self.config.parse_options) {
            Ok(elements) => normalize_elements(elements, path),
            Err(e) => {
                warn!(
                    "Skipping {} ({}): {}",
                    path.display(),
                    e.category(),
                    e
                );
                report.parse_error = Some(e);
                return Ok(report);
            }
        };
        report.element_count = elements.len();
        if elements.is_empty() {
            warn!("No content parsed from {}", path.display());
        }

        let stem = Self::stem(path);
        if self.config.save_parsed {
            let parsed_path = self
                .config
                .output_dir
                .join(format!("{stem}_parsed_only.json"));
            let parsed: Vec<Chunk> = elements.iter().cloned().map(Chunk::from).collect();
            save_chunks_to_json(&parsed, &parsed_path)?;
            report.parsed_output = Some(parsed_path);
        }

        for plan in self.plans_for(path) {
            let (chunks, statistics) = chunk_elements_with_statistics(&elements, &plan.config)?;
            let output = self
                .config
                .output_dir
                .join(format!("{stem}_chunked_{}.json", plan.label));
            save_chunks_to_json(&chunks, &output)?;
            report.outputs.push(OutputReport {
                label: plan.label,
                path: output,
                chunk_count: chunks.len(),
                statistics,
            });
        }

        info!(
            "Processed {}: {} elements, {} chunks in {} outputs",
            path.display(),
            report.element_count,
            report.total_chunks(),
            report.outputs.len()
        );
        Ok(report)
    }

    /// Process files concurrently on blocking worker threads
    ///
    /// Results are returned in input order; one failing file does not affect the others.
    pub async fn process_files(&self, paths: Vec<PathBuf>) -> Vec<Result<FileReport>> {
        let tasks = paths.into_iter().map(|path| {
            let orchestrator = self.clone();
            async move {
                let worker_path = path.clone();
                tokio::task::spawn_blocking(move || orchestrator.process_file(&worker_path))
                    .await
                    .unwrap_or_else(|e| Err(PipelineError::io(&path, std::io::Error::other(e))))
            }
        });
        let results = futures::future::join_all(tasks).await;

        let failed = results
            .iter()
            .filter(|r| !matches!(r, Ok(report) if report.is_success()))
            .count();
        if failed > 0 {
            warn!("{} of {} files failed", failed, results.len());
        }
        results
    }
}
