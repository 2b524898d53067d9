use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Subscriber;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;

// default name (fixed)
const APP_SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Deserialize, Debug, Clone)]
pub struct LoggingConfig {
    pub app_name: Option<String>,
    pub level: Option<String>,
    pub file_name: Option<String>,
    pub file_dir: Option<String>,
    #[serde(default)]
    pub use_json: bool,
    #[serde(default = "default_use_stdout")]
    pub use_stdout: bool,
}

fn default_use_stdout() -> bool {
    true
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self {
            app_name: None,
            level: None,
            file_name: None,
            file_dir: None,
            use_json: false,
            use_stdout: true,
        }
    }

    /// Logging config with an explicit level (CLI override)
    pub fn with_level(self, level: impl Into<String>) -> Self {
        Self {
            level: Some(level.into()),
            ..self
        }
    }

    pub fn service_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(APP_SERVICE_NAME)
    }

    fn max_level(&self) -> tracing::Level {
        self.level
            .as_deref()
            .and_then(|l| tracing::Level::from_str(l).ok())
            .unwrap_or(tracing::Level::INFO)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_tracing_config_from_env() -> Result<LoggingConfig> {
    envy::prefixed("LOG_")
        .from_env::<LoggingConfig>()
        .context("cannot read logging config from env:")
}

pub fn tracing_init(conf: LoggingConfig) -> Result<()> {
    let layer = setup_layer_from_logging_config(&conf)?;
    tracing::subscriber::set_global_default(layer).context("setting default subscriber failed")?;
    tracing::debug!("logging initialized for {}", conf.service_name());
    Ok(())
}

pub fn tracing_init_from_env() -> Result<()> {
    match load_tracing_config_from_env() {
        Ok(conf) => tracing_init(conf),
        Err(e) => {
            eprintln!("failed to load logging config from env: {:?}", e);
            Err(e)
        }
    }
}

fn create_log_file(conf: &LoggingConfig) -> Result<Option<File>> {
    let Some(file_name) = conf.file_name.as_deref() else {
        return Ok(None);
    };
    let dir = match conf.file_dir.as_deref() {
        Some(d) => PathBuf::from(d),
        None => env::current_dir().context("cannot resolve current directory")?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create log file directory: {:?}", dir))?;
    let path = dir.join(file_name);
    let file = File::create(&path).with_context(|| format!("create log file to {:?}", path))?;
    Ok(Some(file))
}

pub fn setup_layer_from_logging_config(
    conf: &LoggingConfig,
) -> Result<Box<dyn Subscriber + Send + Sync + 'static>> {
    let lv = conf.max_level();
    // RUST_LOG directives refine the configured level
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(lv).into())
        .from_env_lossy();

    let file = create_log_file(conf)?;
    let (json_file, text_file) = match file {
        Some(f) if conf.use_json => (Some(f), None),
        Some(f) => (None, Some(f)),
        None => (None, None),
    };

    // stdout is reserved for results, so console logs go to stderr
    let subscriber = Box::new(
        tracing_subscriber::registry()
            .with(filter)
            .with(json_file.map(|f| {
                Layer::new()
                    .with_writer(f.with_max_level(lv))
                    .with_ansi(false)
                    .json()
            }))
            .with(text_file.map(|f| {
                Layer::new()
                    .with_writer(f.with_max_level(lv))
                    .with_ansi(false)
            }))
            .with(if !conf.use_json && conf.use_stdout {
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .pretty(),
                )
            } else {
                None
            })
            .with(if conf.use_json && conf.use_stdout {
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .json(),
                )
            } else {
                None
            }),
    );
    Ok(subscriber)
}

// for simple stdout logging
pub fn tracing_init_test(level: tracing::Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .try_init();
}
