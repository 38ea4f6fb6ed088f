//! Analysis pipeline
//!
//! `Analyzer` runs parse → classify → score → destructive gate → cache
//! lookup → summarize, and hands back an [`AnalysisReport`].
//!
//! ## Logging
//!
//! - `log_op_start!` / `log_op_end!` / `log_op_error!` around `analyze`
//! - Lower stages only emit `tracing::debug!` details

use crate::cache::{CacheBackend, MemoryBackend, SummaryCache};
use crate::classify::classify;
use crate::clock::{Clock, SystemClock};
use crate::config::{AnalysisConfig, OutputShape};
use crate::errors::{InfraLensError, Result};
use crate::fingerprint::Fingerprint;
use crate::model::ChangeSet;
use crate::parse::{parse_diff, parse_diff_bytes};
use crate::prompt::build_prompt;
use crate::risk::{score, RiskAssessment};
use crate::summarize::{NarrativeBackend, RetryingSummarizer};
use crate::{log_op_end, log_op_error, log_op_start};
use infralens_core_types::RunId;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Outcome of the narrative stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Narrative {
    /// Freshly produced by the backend
    Generated { text: String },
    /// Served from the cache
    Cached { text: String },
    /// Retries or deadline exhausted
    Unavailable { reason: String },
    /// Not attempted
    Skipped { reason: String },
}

impl Narrative {
    pub fn text(&self) -> Option<&str> {
        match self {
            Narrative::Generated { text } | Narrative::Cached { text } => Some(text),
            Narrative::Unavailable { .. } | Narrative::Skipped { .. } => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Narrative::Generated { .. } => "generated",
            Narrative::Cached { .. } => "cached",
            Narrative::Unavailable { .. } => "unavailable",
            Narrative::Skipped { .. } => "skipped",
        }
    }
}

/// Canonical output of one analysis run.
///
/// Owns the `ChangeSet`; the risk assessment is recomputed from it on
/// demand so the two can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    run_id: RunId,
    change_set: ChangeSet,
    fingerprint: Fingerprint,
    narrative: Narrative,
    output: OutputShape,
}

impl AnalysisReport {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn change_set(&self) -> &ChangeSet {
        &self.change_set
    }

    pub fn assessment(&self) -> RiskAssessment<'_> {
        score(&self.change_set)
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn narrative(&self) -> &Narrative {
        &self.narrative
    }

    pub fn output(&self) -> OutputShape {
        self.output
    }
}

#[derive(Serialize)]
struct ReportView<'a> {
    run_id: &'a RunId,
    output: OutputShape,
    fingerprint: &'a Fingerprint,
    change_set: &'a ChangeSet,
    assessment: RiskAssessment<'a>,
    narrative: &'a Narrative,
}

impl Serialize for AnalysisReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ReportView {
            run_id: &self.run_id,
            output: self.output,
            fingerprint: &self.fingerprint,
            change_set: &self.change_set,
            assessment: self.assessment(),
            narrative: &self.narrative,
        }
        .serialize(serializer)
    }
}

/// Configures and builds an [`Analyzer`]
pub struct AnalyzerBuilder {
    config: AnalysisConfig,
    cache_backend: Option<Arc<dyn CacheBackend>>,
    narrative_backend: Option<Arc<dyn NarrativeBackend>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AnalyzerBuilder {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            cache_backend: None,
            narrative_backend: None,
            clock: None,
        }
    }

    /// Defaults to an in-memory backend
    pub fn cache_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    /// Without a backend every narrative is `Skipped` unless cached
    pub fn narrative_backend(mut self, backend: Arc<dyn NarrativeBackend>) -> Self {
        self.narrative_backend = Some(backend);
        self
    }

    /// Defaults to the system clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// # Errors
    ///
    /// `InvalidConfig` if the configuration fails validation.
    pub fn build(self) -> Result<Analyzer> {
        self.config.validate()?;

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cache_backend: Arc<dyn CacheBackend> = self
            .cache_backend
            .unwrap_or_else(|| Arc::new(MemoryBackend::new()));
        let cache = SummaryCache::new(cache_backend, &self.config.cache, clock.clone());
        let summarizer = self.narrative_backend.map(|backend| {
            RetryingSummarizer::new(backend, clock.clone(), self.config.retry.clone())
        });

        Ok(Analyzer {
            config: self.config,
            cache,
            summarizer,
        })
    }
}

/// Single entry point for analysis runs
pub struct Analyzer {
    config: AnalysisConfig,
    cache: SummaryCache,
    summarizer: Option<RetryingSummarizer>,
}

impl Analyzer {
    pub fn builder(config: AnalysisConfig) -> AnalyzerBuilder {
        AnalyzerBuilder::new(config)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    /// Analyze raw diff bytes.
    ///
    /// # Errors
    ///
    /// - `MalformedInput` for unparseable input
    /// - `DestructiveChangeBlocked` when the gate is on and deletes or
    ///   replaces are present
    /// - `QuotaExceeded` if the narrative service refuses for quota
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<AnalysisReport> {
        self.run(|| parse_diff_bytes(bytes))
    }

    /// Analyze an already-decoded diff document.
    ///
    /// # Errors
    ///
    /// See [`Analyzer::analyze_bytes`].
    pub fn analyze(&self, raw: &serde_json::Value) -> Result<AnalysisReport> {
        self.run(|| parse_diff(raw))
    }

    /// Analyze a change set built by the caller.
    ///
    /// # Errors
    ///
    /// See [`Analyzer::analyze_bytes`].
    pub fn analyze_change_set(&self, change_set: ChangeSet) -> Result<AnalysisReport> {
        self.run(|| Ok(change_set))
    }

    fn run(&self, parse: impl FnOnce() -> Result<ChangeSet>) -> Result<AnalysisReport> {
        let run_id = RunId::new();
        log_op_start!("analyze", run_id = run_id.as_str());
        let start = std::time::Instant::now();

        let report = parse()
            .and_then(|change_set| self.assemble(run_id.clone(), change_set))
            .map_err(|e| {
                log_op_error!(
                    "analyze",
                    e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    run_id = run_id.as_str()
                );
                e
            })?;

        let assessment = report.assessment();
        log_op_end!(
            "analyze",
            duration_ms = start.elapsed().as_millis() as u64,
            run_id = run_id.as_str(),
            fingerprint = report.fingerprint().as_str(),
            stack_count = report.change_set().stacks().len() as u64,
            change_count = assessment.total_changes as u64,
            risk_level = assessment.level.as_str(),
            narrative = report.narrative().status()
        );

        Ok(report)
    }

    fn assemble(&self, run_id: RunId, mut change_set: ChangeSet) -> Result<AnalysisReport> {
        classify(&mut change_set);

        let assessment = score(&change_set);
        tracing::debug!(
            component = module_path!(),
            op = "score_risk",
            risk_level = assessment.level.as_str(),
            rule = assessment.rule.as_str(),
            destructive = assessment.destructive_changes as u64,
            "risk scored"
        );

        if self.config.fail_on_destructive && assessment.destructive_changes > 0 {
            return Err(InfraLensError::DestructiveChangeBlocked {
                destructive_count: assessment.destructive_changes,
            });
        }

        let fingerprint = Fingerprint::compute(&change_set, &self.config.narrative)?;
        let narrative = self.narrate(&change_set, &assessment, &fingerprint)?;

        Ok(AnalysisReport {
            run_id,
            change_set,
            fingerprint,
            narrative,
            output: self.config.output,
        })
    }

    fn narrate(
        &self,
        change_set: &ChangeSet,
        assessment: &RiskAssessment<'_>,
        fingerprint: &Fingerprint,
    ) -> Result<Narrative> {
        if change_set.is_empty() {
            return Ok(skipped("no changes detected"));
        }
        if !self.config.narrative.enabled {
            return Ok(skipped("narrative disabled"));
        }
        if let Some(text) = self.cache.lookup(fingerprint) {
            return Ok(Narrative::Cached { text });
        }
        let Some(summarizer) = &self.summarizer else {
            return Ok(skipped("no narrative backend configured"));
        };

        let prompt = build_prompt(change_set, assessment, &self.config.narrative);
        match summarizer.summarize(fingerprint, &prompt, &self.config.narrative, &self.cache) {
            Ok(text) => Ok(Narrative::Generated { text }),
            Err(err @ InfraLensError::SummarizationUnavailable { .. }) => {
                tracing::warn!(
                    component = module_path!(),
                    op = "summarize",
                    fingerprint = fingerprint.as_str(),
                    error = %err,
                    "narrative unavailable; continuing without it"
                );
                Ok(Narrative::Unavailable {
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }
}

fn skipped(reason: &str) -> Narrative {
    Narrative::Skipped {
        reason: reason.to_string(),
    }
}
