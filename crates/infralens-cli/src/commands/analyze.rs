//! `infralens analyze`: diff in, report JSON out

use crate::error::CliError;
use crate::openai::OpenAiBackend;
use crate::settings::{api_key_from_env, Settings, API_KEY_ENV};
use clap::Args;
use infralens_core::config::Language;
use infralens_core::pipeline::Analyzer;
use infralens_core::OutputShape;
use infralens_store::FsBackend;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Diff file, or `-` for stdin
    pub input: PathBuf,

    /// Write the report here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Narrative language (en, nl, de, fr, es)
    #[arg(long)]
    pub language: Option<Language>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub max_length: Option<u32>,

    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output shape recorded in the report (comment, issue, both, markdown, json, html)
    #[arg(long)]
    pub format: Option<OutputShape>,

    #[arg(long)]
    pub max_attempts: Option<u32>,

    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Bypass the narrative cache entirely
    #[arg(long)]
    pub no_cache: bool,

    /// Skip the narrative stage
    #[arg(long)]
    pub no_narrative: bool,

    /// Exit non-zero before any narrative call if deletes or replaces exist
    #[arg(long)]
    pub fail_on_destructive: bool,

    /// Single-line JSON
    #[arg(long)]
    pub compact: bool,
}

pub fn execute(args: AnalyzeArgs, mut settings: Settings) -> Result<(), CliError> {
    apply_overrides(&mut settings, &args);

    let mut builder = Analyzer::builder(settings.analysis.clone())
        .cache_backend(Arc::new(FsBackend::new(&settings.cache_dir)));
    if settings.analysis.narrative.enabled {
        match api_key_from_env() {
            Some(key) => {
                let backend = OpenAiBackend::new(settings.api_url.clone(), key)
                    .map_err(|e| CliError::Http(e.to_string()))?;
                builder = builder.narrative_backend(Arc::new(backend));
            }
            None => tracing::info!(
                component = module_path!(),
                op = "analyze",
                "{} not set; narrative limited to cached entries",
                API_KEY_ENV
            ),
        }
    }
    let analyzer = builder.build()?;

    let bytes = read_input(&args.input)?;
    let report = analyzer.analyze_bytes(&bytes)?;

    let mut rendered = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    rendered.push('\n');

    match &args.out {
        Some(path) => std::fs::write(path, rendered).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        }),
        None => {
            print!("{}", rendered);
            Ok(())
        }
    }
}

fn apply_overrides(settings: &mut Settings, args: &AnalyzeArgs) {
    let config = &mut settings.analysis;
    if let Some(language) = args.language {
        config.narrative.language = language;
    }
    if let Some(model) = &args.model {
        config.narrative.model = model.clone();
    }
    if let Some(max_length) = args.max_length {
        config.narrative.max_length = max_length;
    }
    if let Some(temperature) = args.temperature {
        config.narrative.temperature = temperature;
    }
    if let Some(format) = args.format {
        config.output = format;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.retry.max_attempts = max_attempts;
    }
    if args.no_cache {
        config.cache.enabled = false;
    }
    if args.no_narrative {
        config.narrative.enabled = false;
    }
    if args.fail_on_destructive {
        config.fail_on_destructive = true;
    }
    if let Some(dir) = &args.cache_dir {
        settings.cache_dir = dir.clone();
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    let read_error = |source: std::io::Error| CliError::Read {
        path: path.to_path_buf(),
        source,
    };
    if path == Path::new("-") {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes).map_err(read_error)?;
        return Ok(bytes);
    }
    std::fs::read(path).map_err(read_error)
}
