//! Orchestrator for concurrent multi-agent validation.
//!
//! The orchestrator implements:
//! - Concurrent fan-out to every enabled agent
//! - Per-agent failure isolation (errors and panics)
//! - Deterministic fan-in in declared agent order through the Synthesizer

use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::Instrument;

use qualis_core::{Actor, AgentResult, CompletenessRules, Conflict, Record, RecordKind, ValidationResult};

use crate::agents::{
    Agent, AnomalyDetectionAgent, ContentCompletionAgent, ContextAlignmentAgent,
};
use crate::config::OrchestratorConfig;
use crate::history::HistoryLookup;
use crate::synthesizer::Synthesizer;

/// Errors from building an orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Agent '{0}' registered more than once")]
    DuplicateAgent(String),
}

/// A verdict together with the evidence behind it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationReport {
    pub result: ValidationResult,

    /// One result per executed agent, in declared order
    pub agent_traces: Vec<AgentResult>,

    pub conflicts: Vec<Conflict>,

    pub execution_time_ms: u64,
}

/// Runs validation agents concurrently and synthesizes their findings.
///
/// # Architecture
/// - Fan-out: enabled agents run concurrently via `join_all`
/// - Isolation: a failing or panicking agent yields a zero-confidence result
/// - Fan-in: results are aggregated in declared order, never completion order
pub struct Orchestrator {
    config: OrchestratorConfig,

    /// Agents in declared order
    agents: Vec<Arc<dyn Agent>>,

    synthesizer: Synthesizer,
}

impl Orchestrator {
    /// Orchestrator with the three standard agents, in the order content
    /// completion, anomaly detection, context alignment.
    pub fn new(
        config: OrchestratorConfig,
        rules: Arc<dyn CompletenessRules>,
        history: Arc<dyn HistoryLookup>,
    ) -> Self {
        let agents: Vec<Arc<dyn Agent>> = vec![
            Arc::new(ContentCompletionAgent::new(rules)),
            Arc::new(AnomalyDetectionAgent::new(history)),
            Arc::new(ContextAlignmentAgent::new()),
        ];
        Self::with_agents(config, agents)
    }

    fn with_agents(config: OrchestratorConfig, agents: Vec<Arc<dyn Agent>>) -> Self {
        let synthesizer = Synthesizer::new(config.conflict_resolution);
        Self {
            config,
            agents,
            synthesizer,
        }
    }

    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Validate one submission.
    pub async fn validate_submission(
        &self,
        record: &Record,
        actor: &Actor,
        kind: RecordKind,
    ) -> ValidationResult {
        self.validate_submission_detailed(record, actor, kind).await.result
    }

    /// Validate one submission and keep per-agent traces and conflicts.
    pub async fn validate_submission_detailed(
        &self,
        record: &Record,
        actor: &Actor,
        kind: RecordKind,
    ) -> ValidationReport {
        let span = tracing::info_span!(
            "validate_submission",
            record_kind = %kind,
            record_id = record.id(),
            actor = %actor.id
        );
        self.run(record, actor, kind).instrument(span).await
    }

    async fn run(&self, record: &Record, actor: &Actor, kind: RecordKind) -> ValidationReport {
        let started = Instant::now();

        if kind != record.kind() {
            tracing::warn!(
                submitted = %kind,
                actual = %record.kind(),
                "Submitted kind does not match record, kind-specific checks skipped"
            );
        }

        let enabled: Vec<&Arc<dyn Agent>> = self
            .agents
            .iter()
            .filter(|agent| self.config.is_enabled(&agent.id()))
            .collect();

        if enabled.is_empty() {
            tracing::info!("No agents enabled, returning neutral verdict");
            return ValidationReport {
                result: ValidationResult::neutral(),
                agent_traces: Vec::new(),
                conflicts: Vec::new(),
                execution_time_ms: elapsed_ms(started),
            };
        }

        // Fan-out: join_all yields results in input order
        let agent_traces: Vec<AgentResult> = join_all(
            enabled
                .iter()
                .map(|agent| run_isolated(agent.as_ref(), record, actor, kind)),
        )
        .await;

        // Fan-in: deterministic synthesis
        let synthesis = self.synthesizer.synthesize(&agent_traces);

        ValidationReport {
            result: synthesis.result,
            agent_traces,
            conflicts: synthesis.conflicts,
            execution_time_ms: elapsed_ms(started),
        }
    }
}

/// Run one agent, turning errors and panics into a zero-confidence result.
async fn run_isolated(
    agent: &dyn Agent,
    record: &Record,
    actor: &Actor,
    kind: RecordKind,
) -> AgentResult {
    let id = agent.id();

    match AssertUnwindSafe(agent.analyze(record, actor, kind))
        .catch_unwind()
        .await
    {
        Ok(Ok(result)) => {
            tracing::debug!(agent = %id, confidence = result.confidence, "Agent finished");
            result
        }
        Ok(Err(e)) => {
            tracing::warn!(agent = %id, error = %e, "Agent failed");
            AgentResult::failed(id.as_str(), e)
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            tracing::warn!(agent = %id, panic = %reason, "Agent panicked");
            AgentResult::failed(id.as_str(), format!("panicked: {}", reason))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Builder for an Orchestrator with custom agents.
///
/// Agents run in registration order. Enable flags in the config apply to
/// the standard agent ids; custom ids always run.
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    agents: Vec<Arc<dyn Agent>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: OrchestratorConfig::default(),
            agents: Vec::new(),
        }
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an agent.
    pub fn agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    /// Register the three standard agents.
    pub fn standard_agents(
        self,
        rules: Arc<dyn CompletenessRules>,
        history: Arc<dyn HistoryLookup>,
    ) -> Self {
        self.agent(Arc::new(ContentCompletionAgent::new(rules)))
            .agent(Arc::new(AnomalyDetectionAgent::new(history)))
            .agent(Arc::new(ContextAlignmentAgent::new()))
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<Orchestrator, RuntimeError> {
        let mut seen = HashSet::new();
        for agent in &self.agents {
            let id = agent.id();
            if !seen.insert(id.clone()) {
                return Err(RuntimeError::DuplicateAgent(id.to_string()));
            }
        }

        Ok(Orchestrator::with_agents(self.config, self.agents))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{fixtures, AgentError, AgentId};
    use crate::config::ConflictStrategy;
    use crate::history::{HistoryError, NoHistory};
    use async_trait::async_trait;
    use qualis_core::record::fields;
    use qualis_core::{ConflictResolution, Finding, NonConformanceType, QualityBreakdown, StandardRules};
    use std::time::Duration;

    /// Agent returning a canned result after an optional delay.
    struct StubAgent {
        id: AgentId,
        delay: Duration,
        result: AgentResult,
    }

    impl StubAgent {
        fn new(id: AgentId, confidence: f64) -> Self {
            Self {
                result: AgentResult {
                    confidence,
                    ..AgentResult::new(id.as_str())
                },
                id,
                delay: Duration::ZERO,
            }
        }

        fn delayed(mut self, millis: u64) -> Self {
            self.delay = Duration::from_millis(millis);
            self
        }

        fn requirement(mut self, field: &str, message: &str) -> Self {
            self.result.requirements.push(Finding::new(field, message));
            self
        }

        fn error(mut self, field: &str, message: &str) -> Self {
            self.result.errors.push(Finding::new(field, message));
            self
        }
    }

    #[async_trait]
    impl Agent for StubAgent {
        fn id(&self) -> AgentId {
            self.id.clone()
        }

        async fn analyze(&self, _: &Record, _: &Actor, _: RecordKind) -> Result<AgentResult, AgentError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.result.clone())
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl Agent for FailingAgent {
        fn id(&self) -> AgentId {
            AgentId::AnomalyDetection
        }

        async fn analyze(&self, _: &Record, _: &Actor, _: RecordKind) -> Result<AgentResult, AgentError> {
            Err(AgentError::Lookup(HistoryError::QueryFailed("timeout".to_string())))
        }
    }

    /// Agent that always reports an internal error under the given id.
    struct BrokenAgent(AgentId);

    #[async_trait]
    impl Agent for BrokenAgent {
        fn id(&self) -> AgentId {
            self.0.clone()
        }

        async fn analyze(&self, _: &Record, _: &Actor, _: RecordKind) -> Result<AgentResult, AgentError> {
            Err(AgentError::Internal("rule table missing".to_string()))
        }
    }

    struct PanickingAgent;

    #[async_trait]
    impl Agent for PanickingAgent {
        fn id(&self) -> AgentId {
            AgentId::Custom("panicky".to_string())
        }

        async fn analyze(&self, _: &Record, _: &Actor, _: RecordKind) -> Result<AgentResult, AgentError> {
            panic!("index out of range");
        }
    }

    fn standard() -> Orchestrator {
        Orchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(StandardRules::new()),
            Arc::new(NoHistory),
        )
    }

    #[tokio::test]
    async fn test_standard_agents_on_clean_record() {
        let report = standard()
            .validate_submission_detailed(&fixtures::nca_record(), &fixtures::actor(), RecordKind::NonConformance)
            .await;

        let ids: Vec<&str> = report.agent_traces.iter().map(|r| r.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["content-completion", "anomaly-detection", "context-alignment"]);

        // (0.7 + 0.6 + 0.75) / 3
        assert_eq!(report.result.quality_assessment.score, 68);
        assert!(report.result.errors.is_empty());
        assert!(!report.result.valid);
        assert!(report.conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_no_enabled_agents_returns_neutral() {
        let orchestrator = Orchestrator::new(
            OrchestratorConfig::none_enabled(),
            Arc::new(StandardRules::new()),
            Arc::new(NoHistory),
        );
        let result = orchestrator
            .validate_submission(&fixtures::nca_record(), &fixtures::actor(), RecordKind::NonConformance)
            .await;

        assert_eq!(result, ValidationResult::neutral());
        assert!(result.valid && result.ready_for_submission);
        assert_eq!(result.quality_assessment.score, 75);
    }

    #[tokio::test]
    async fn test_disabled_agents_are_skipped() {
        let config = OrchestratorConfig {
            enable_anomaly_detection: false,
            ..OrchestratorConfig::default()
        };
        let orchestrator = Orchestrator::new(config, Arc::new(StandardRules::new()), Arc::new(NoHistory));
        let report = orchestrator
            .validate_submission_detailed(&fixtures::nca_record(), &fixtures::actor(), RecordKind::NonConformance)
            .await;

        assert_eq!(report.agent_traces.len(), 2);
        assert!(report.agent_traces.iter().all(|r| r.agent_id != "anomaly-detection"));
    }

    #[tokio::test]
    async fn test_failing_agent_is_isolated() {
        let orchestrator = Orchestrator::builder()
            .agent(Arc::new(StubAgent::new(AgentId::ContentCompletion, 0.8)))
            .agent(Arc::new(FailingAgent))
            .agent(Arc::new(StubAgent::new(AgentId::ContextAlignment, 0.8)))
            .build()
            .unwrap();

        let report = orchestrator
            .validate_submission_detailed(&fixtures::nca_record(), &fixtures::actor(), RecordKind::NonConformance)
            .await;

        let failed = &report.agent_traces[1];
        assert_eq!(failed.agent_id, "anomaly-detection");
        assert_eq!(failed.confidence, 0.0);
        assert!(failed.reasoning.starts_with("Agent execution failed"));
        assert_eq!(report.result.quality_assessment.score, 53);
    }

    #[tokio::test]
    async fn test_panicking_agent_is_isolated() {
        let orchestrator = Orchestrator::builder()
            .agent(Arc::new(StubAgent::new(AgentId::ContentCompletion, 0.9)))
            .agent(Arc::new(PanickingAgent))
            .build()
            .unwrap();

        let report = orchestrator
            .validate_submission_detailed(&fixtures::nca_record(), &fixtures::actor(), RecordKind::NonConformance)
            .await;

        assert_eq!(report.agent_traces.len(), 2);
        assert_eq!(report.agent_traces[0].confidence, 0.9);
        assert_eq!(report.agent_traces[1].agent_id, "panicky");
        assert!(report.agent_traces[1].reasoning.contains("index out of range"));
        assert_eq!(report.result.quality_assessment.score, 45);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_order_does_not_change_output() {
        let build = |delays: [u64; 3]| {
            Orchestrator::builder()
                .agent(Arc::new(
                    StubAgent::new(AgentId::ContentCompletion, 0.8)
                        .requirement(fields::ROOT_CAUSE_ANALYSIS, "Needs more depth")
                        .delayed(delays[0]),
                ))
                .agent(Arc::new(
                    StubAgent::new(AgentId::AnomalyDetection, 0.6)
                        .requirement(fields::NC_TYPE, "Frequent")
                        .delayed(delays[1]),
                ))
                .agent(Arc::new(
                    StubAgent::new(AgentId::ContextAlignment, 0.9)
                        .error(fields::ROOT_CAUSE_ANALYSIS, "Does not explain")
                        .delayed(delays[2]),
                ))
                .build()
                .unwrap()
        };

        let record = fixtures::nca_record();
        let actor = fixtures::actor();

        let first_done_first = build([10, 20, 30])
            .validate_submission_detailed(&record, &actor, RecordKind::NonConformance)
            .await;
        let last_done_first = build([30, 20, 10])
            .validate_submission_detailed(&record, &actor, RecordKind::NonConformance)
            .await;

        assert_eq!(first_done_first.result, last_done_first.result);
        assert_eq!(first_done_first.conflicts, last_done_first.conflicts);
        assert_eq!(first_done_first.agent_traces, last_done_first.agent_traces);
        assert_eq!(first_done_first.result.requirements[0].message, "Needs more depth");
    }

    #[tokio::test]
    async fn test_conflict_is_detected_and_resolved() {
        let orchestrator = Orchestrator::builder()
            .agent(Arc::new(
                StubAgent::new(AgentId::ContentCompletion, 0.8).requirement(fields::ROOT_CAUSE_ANALYSIS, "Needs more depth"),
            ))
            .agent(Arc::new(
                StubAgent::new(AgentId::ContextAlignment, 0.9).error(fields::ROOT_CAUSE_ANALYSIS, "Does not explain"),
            ))
            .build()
            .unwrap();

        let report = orchestrator
            .validate_submission_detailed(&fixtures::nca_record(), &fixtures::actor(), RecordKind::NonConformance)
            .await;

        assert_eq!(report.conflicts.len(), 1);
        let conflict = &report.conflicts[0];
        assert_eq!(conflict.conflicting_agent_ids, vec!["content-completion", "context-alignment"]);
        assert_eq!(conflict.resolution, ConflictResolution::Resolved);
        assert_eq!(report.result.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_weighted_strategy_leaves_conflicts_pending() {
        let config = OrchestratorConfig {
            conflict_resolution: ConflictStrategy::Weighted,
            ..OrchestratorConfig::default()
        };
        let orchestrator = Orchestrator::builder()
            .config(config)
            .agent(Arc::new(
                StubAgent::new(AgentId::ContentCompletion, 0.8).requirement(fields::CORRECTIVE_ACTION, "Add a timeline"),
            ))
            .agent(Arc::new(
                StubAgent::new(AgentId::AnomalyDetection, 0.8).error(fields::CORRECTIVE_ACTION, "Impossible date"),
            ))
            .build()
            .unwrap();

        let report = orchestrator
            .validate_submission_detailed(&fixtures::nca_record(), &fixtures::actor(), RecordKind::NonConformance)
            .await;

        assert_eq!(report.conflicts[0].resolution, ConflictResolution::Pending);
        assert_eq!(report.result.errors.len(), 1);
        assert_eq!(report.result.requirements.len(), 1);
    }

    #[tokio::test]
    async fn test_corrective_action_requirement_end_to_end() {
        let mut nca = fixtures::nca();
        nca.corrective_action = Some(
            "1) Retrain staff on handling procedures per SOP 5.3. 2) Supervisor will review weekly.".to_string(),
        );

        let report = standard()
            .validate_submission_detailed(&Record::NonConformance(nca), &fixtures::actor(), RecordKind::NonConformance)
            .await;

        let alignment = &report.agent_traces[2];
        assert_eq!(alignment.requirements.len(), 1);
        assert_eq!(alignment.requirements[0].field, fields::CORRECTIVE_ACTION);
        assert!(report
            .result
            .requirements
            .iter()
            .any(|f| f.message.starts_with("Corrective action does not appear to address")));
    }

    #[tokio::test]
    async fn test_frequent_category_through_history() {
        use crate::history::{HistoryEntry, InMemoryHistory};
        use chrono::{Duration as ChronoDuration, Utc};

        let now = Utc::now();
        let entries = (1..=6)
            .map(|d| HistoryEntry {
                category: NonConformanceType::FinishedGoods,
                reported_at: now - ChronoDuration::days(d),
            })
            .collect();
        let history = InMemoryHistory::with_entries(entries).as_of(now);

        let orchestrator = Orchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(StandardRules::new()),
            Arc::new(history),
        );
        let result = orchestrator
            .validate_submission(&fixtures::nca_record(), &fixtures::actor(), RecordKind::NonConformance)
            .await;

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, fields::NC_TYPE);
    }

    #[tokio::test]
    async fn test_report_serializes_with_traces() {
        let report = standard()
            .validate_submission_detailed(&fixtures::mjc_record(), &fixtures::actor(), RecordKind::MaintenanceJob)
            .await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["agent_traces"].as_array().unwrap().len(), 3);
        assert_eq!(json["result"]["quality_assessment"]["score"], 68);
        assert!(json["conflicts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_every_agent_failing_yields_zero_score() {
        let orchestrator = Orchestrator::builder()
            .agent(Arc::new(BrokenAgent(AgentId::ContentCompletion)))
            .agent(Arc::new(BrokenAgent(AgentId::AnomalyDetection)))
            .agent(Arc::new(BrokenAgent(AgentId::ContextAlignment)))
            .build()
            .unwrap();

        let report = orchestrator
            .validate_submission_detailed(&fixtures::nca_record(), &fixtures::actor(), RecordKind::NonConformance)
            .await;

        assert_eq!(report.agent_traces.len(), 3);
        assert!(report.agent_traces.iter().all(|r| r.confidence == 0.0));

        let result = &report.result;
        assert_eq!(result.quality_assessment.score, 0);
        assert_eq!(result.quality_assessment.breakdown, QualityBreakdown::default());
        assert!(!result.quality_assessment.threshold_met);
        assert!(!result.valid && !result.ready_for_submission);
        assert!(result.errors.is_empty() && result.requirements.is_empty() && result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_builder_standard_agents_match_new() {
        let built = Orchestrator::builder()
            .standard_agents(Arc::new(StandardRules::new()), Arc::new(NoHistory))
            .build()
            .unwrap();

        let record = fixtures::nca_record();
        let actor = fixtures::actor();
        let from_builder = built
            .validate_submission_detailed(&record, &actor, RecordKind::NonConformance)
            .await;
        let from_new = standard()
            .validate_submission_detailed(&record, &actor, RecordKind::NonConformance)
            .await;

        assert_eq!(from_builder.result, from_new.result);
        assert_eq!(from_builder.agent_traces, from_new.agent_traces);
    }

    #[test]
    fn test_standard_agents_cannot_be_registered_twice() {
        let result = Orchestrator::builder()
            .standard_agents(Arc::new(StandardRules::new()), Arc::new(NoHistory))
            .agent(Arc::new(ContextAlignmentAgent::new()))
            .build();
        assert!(matches!(result, Err(RuntimeError::DuplicateAgent(ref id)) if id == "context-alignment"));
    }

    #[test]
    fn test_duplicate_agents_are_rejected() {
        let result = Orchestrator::builder()
            .agent(Arc::new(StubAgent::new(AgentId::ContentCompletion, 0.8)))
            .agent(Arc::new(StubAgent::new(AgentId::ContentCompletion, 0.7)))
            .build();
        assert!(matches!(result, Err(RuntimeError::DuplicateAgent(ref id)) if id == "content-completion"));
    }
}
