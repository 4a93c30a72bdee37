//! Evaluation pipeline — wires the generator, the cache and the scoring core together.
//!
//! Flow: job posting → (cache | generate → sanitize → build_rubric → cache put)
//!       → generate scores → sanitize → build_scores → aggregate.
//!
//! The rubric is always settled (and cached) before any candidate is scored against it,
//! so every candidate for one posting sees the same canonical criterion names.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{FsRubricStore, RubricCache};
use crate::config::Config;
use crate::errors::MatchError;
use crate::evaluation::prompts::{build_rubric_prompt, build_scoring_prompt};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{GenerationRequest, LlmClient, TextGenerator};
use crate::models::{CriterionScore, EvaluationResult, FitBand, Rubric};
use crate::scoring::{aggregate, build_rubric, build_scores, parse_json_response};

pub const RUBRIC_MAX_TOKENS: u32 = 2000;
/// Scoring needs room for evidence and gap text on every criterion.
pub const SCORING_MAX_TOKENS: u32 = 4000;

// ────────────────────────────────────────────────────────────────────────────
// Output models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RubricOutcome {
    pub rubric: Rubric,
    pub cache_hit: bool,
}

/// Wall-clock time spent in each step, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepTimings {
    pub rubric_extraction_ms: u64,
    pub criteria_scoring_ms: u64,
    pub score_calculation_ms: u64,
}

impl StepTimings {
    pub fn total_ms(&self) -> u64 {
        self.rubric_extraction_ms + self.criteria_scoring_ms + self.score_calculation_ms
    }
}

/// Everything one candidate evaluation produced, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateEvaluation {
    pub evaluation_id: Uuid,
    pub rubric: Rubric,
    pub scores: Vec<CriterionScore>,
    pub result: EvaluationResult,
    pub fit_band: FitBand,
    pub rubric_cache_hit: bool,
    pub timings: StepTimings,
}

/// Per-candidate outcome of a batch run. One candidate failing does not sink the batch.
#[derive(Debug)]
pub struct CandidateOutcome {
    pub candidate: String,
    pub outcome: Result<CandidateEvaluation, MatchError>,
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluator
// ────────────────────────────────────────────────────────────────────────────

pub struct Evaluator {
    generator: Arc<dyn TextGenerator>,
    cache: RubricCache,
}

impl Evaluator {
    pub fn new(generator: Arc<dyn TextGenerator>, cache: RubricCache) -> Self {
        Self { generator, cache }
    }

    /// OpenRouter client plus a filesystem cache (or a disabled one), as configured.
    pub fn from_config(config: &Config) -> Result<Self, MatchError> {
        let llm = LlmClient::new(config.openrouter_api_key.clone(), config.model.clone())?;
        let cache = if config.rubric_cache_enabled {
            RubricCache::new(FsRubricStore::new(&config.rubric_cache_dir)?)
        } else {
            RubricCache::disabled()
        };
        info!(
            "Evaluator initialized (model: {}, rubric cache: {})",
            config.model,
            if cache.is_enabled() { "on" } else { "off" }
        );
        Ok(Self::new(Arc::new(llm), cache))
    }

    pub fn cache(&self) -> &RubricCache {
        &self.cache
    }

    /// Returns the rubric for `job_posting`, generating and caching it on a miss.
    ///
    /// Cache failures never abort extraction: an unreadable record is treated as a miss
    /// and a failed write only costs the next caller a regeneration.
    pub async fn extract_rubric(&self, job_posting: &str) -> Result<RubricOutcome, MatchError> {
        require_text("job posting", job_posting)?;

        match self.cache.get(job_posting) {
            Ok(Some(rubric)) => {
                return Ok(RubricOutcome {
                    rubric,
                    cache_hit: true,
                })
            }
            Ok(None) => {}
            Err(e) => warn!("Rubric cache read failed, regenerating: {e}"),
        }

        let prompt = build_rubric_prompt(job_posting);
        let generation = self
            .generator
            .generate(GenerationRequest {
                name: "rubric_extraction",
                system: Some(JSON_ONLY_SYSTEM),
                prompt: &prompt,
                max_tokens: RUBRIC_MAX_TOKENS,
            })
            .await?;
        log_generation("rubric_extraction", generation.latency, generation.usage.total_tokens);

        let json = parse_json_response(&generation.text)?;
        let rubric = build_rubric(&json)?;
        info!("Extracted {} criteria via LLM", rubric.len());

        if let Err(e) = self
            .cache
            .put_with_model(job_posting, &rubric, self.generator.model())
        {
            warn!("Failed to save rubric to cache: {e}");
        }

        Ok(RubricOutcome {
            rubric,
            cache_hit: false,
        })
    }

    /// Scores `cv_profile` against every criterion of `rubric`.
    pub async fn score_candidate(
        &self,
        rubric: &Rubric,
        cv_profile: &str,
    ) -> Result<Vec<CriterionScore>, MatchError> {
        require_text("candidate profile", cv_profile)?;

        let prompt = build_scoring_prompt(rubric, cv_profile);
        let generation = self
            .generator
            .generate(GenerationRequest {
                name: "criteria_scoring",
                system: Some(JSON_ONLY_SYSTEM),
                prompt: &prompt,
                max_tokens: SCORING_MAX_TOKENS,
            })
            .await?;
        log_generation("criteria_scoring", generation.latency, generation.usage.total_tokens);

        let json = parse_json_response(&generation.text)?;
        let scores = build_scores(&json, rubric)?;
        info!("Scored {} of {} criteria via LLM", scores.len(), rubric.len());
        Ok(scores)
    }

    /// Full single-candidate run.
    pub async fn evaluate(
        &self,
        job_posting: &str,
        cv_profile: &str,
    ) -> Result<CandidateEvaluation, MatchError> {
        let evaluation_id = Uuid::new_v4();
        info!("Starting evaluation {evaluation_id}");

        let started = Instant::now();
        let RubricOutcome { rubric, cache_hit } = self.extract_rubric(job_posting).await?;
        let rubric_extraction_ms = elapsed_ms(started);

        self.score_rubric(evaluation_id, rubric, cache_hit, rubric_extraction_ms, cv_profile)
            .await
    }

    /// Extracts the rubric once and scores every `(name, cv_profile)` pair against it.
    /// A rubric failure is fatal for the whole batch; candidate failures are reported per candidate.
    pub async fn evaluate_many(
        &self,
        job_posting: &str,
        candidates: &[(String, String)],
    ) -> Result<Vec<CandidateOutcome>, MatchError> {
        let started = Instant::now();
        let RubricOutcome { rubric, cache_hit } = self.extract_rubric(job_posting).await?;
        let rubric_extraction_ms = elapsed_ms(started);
        info!(
            "Evaluating {} candidates against one rubric ({} criteria)",
            candidates.len(),
            rubric.len()
        );

        let mut outcomes = Vec::with_capacity(candidates.len());
        for (candidate, cv_profile) in candidates {
            let outcome = self
                .score_rubric(
                    Uuid::new_v4(),
                    rubric.clone(),
                    cache_hit,
                    rubric_extraction_ms,
                    cv_profile,
                )
                .await;
            match &outcome {
                Ok(evaluation) => info!(
                    "Candidate '{candidate}': {}/100",
                    evaluation.result.final_score
                ),
                Err(e) => warn!("Candidate '{candidate}' failed: {e}"),
            }
            outcomes.push(CandidateOutcome {
                candidate: candidate.clone(),
                outcome,
            });
        }

        Ok(outcomes)
    }

    async fn score_rubric(
        &self,
        evaluation_id: Uuid,
        rubric: Rubric,
        rubric_cache_hit: bool,
        rubric_extraction_ms: u64,
        cv_profile: &str,
    ) -> Result<CandidateEvaluation, MatchError> {
        let started = Instant::now();
        let scores = self.score_candidate(&rubric, cv_profile).await?;
        let criteria_scoring_ms = elapsed_ms(started);

        let started = Instant::now();
        let result = aggregate(&rubric, &scores)?;
        let score_calculation_ms = elapsed_ms(started);

        let timings = StepTimings {
            rubric_extraction_ms,
            criteria_scoring_ms,
            score_calculation_ms,
        };
        info!(
            "Evaluation {evaluation_id}: final_score={}/100, weight used={:.1}%, total {}ms",
            result.final_score,
            result.total_weight_used,
            timings.total_ms()
        );

        Ok(CandidateEvaluation {
            evaluation_id,
            fit_band: result.fit_band(),
            rubric,
            scores,
            result,
            rubric_cache_hit,
            timings,
        })
    }
}

fn require_text(what: &str, text: &str) -> Result<(), MatchError> {
    if text.trim().is_empty() {
        return Err(MatchError::InvalidInput(format!("{what} cannot be empty")));
    }
    Ok(())
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn log_generation(call: &str, latency: Duration, total_tokens: u32) {
    info!(
        "{call} LLM call: {:.2}s, {total_tokens} tokens",
        latency.as_secs_f64()
    );
}
