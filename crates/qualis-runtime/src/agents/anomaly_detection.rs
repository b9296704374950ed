//! Deviation checks against typical ranges and recent history.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

use qualis_core::record::fields;
use qualis_core::{Actor, AgentResult, Finding, NonConformance, Record, RecordKind};

use super::{non_conformance, Agent, AgentError, AgentId};
use crate::history::HistoryLookup;

lazy_static! {
    static ref QUANTITY: Regex = Regex::new(
        r"(?i)\b(\d+(?:\.\d+)?)\s*(kg|units|meters|boxes|pallets)\b"
    ).unwrap();

    static ref DATE: Regex = Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b").unwrap();
}

/// Typical quantity range; values beyond 10x either end are flagged.
const TYPICAL_MIN: f64 = 10.0;
const TYPICAL_MAX: f64 = 1000.0;

const STALE_AFTER_DAYS: i64 = 30;

const FREQUENCY_WINDOW_DAYS: u32 = 30;
const FREQUENCY_LIMIT: u64 = 5;

/// Flags entries that deviate from norms: odd quantities, stale dates and
/// categories reported unusually often. Emits warnings only.
pub struct AnomalyDetectionAgent {
    history: Arc<dyn HistoryLookup>,

    /// Date that "30 days ago" is measured from; today when unset
    reference_date: Option<NaiveDate>,
}

impl AnomalyDetectionAgent {
    pub fn new(history: Arc<dyn HistoryLookup>) -> Self {
        Self {
            history,
            reference_date: None,
        }
    }

    /// Measure date staleness from a fixed day.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn today(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn check_quantity(description: &str) -> Option<Finding> {
        let caps = QUANTITY.captures(description)?;
        let quantity: f64 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();

        let (direction, average) = if quantity > TYPICAL_MAX * 10.0 {
            ("high", TYPICAL_MAX)
        } else if quantity < TYPICAL_MIN * 0.1 {
            ("low", TYPICAL_MIN)
        } else {
            return None;
        };

        Some(
            Finding::new(
                fields::NC_DESCRIPTION,
                format!(
                    "Quantity {} {} is unusually {} compared to historical average of {}. Please verify this is correct.",
                    quantity, unit, direction, average
                ),
            )
            .with_example_fix("Double-check the quantity affected. If correct, this will be flagged for review."),
        )
    }

    fn check_date(&self, description: &str) -> Option<Finding> {
        let caps = DATE.captures(description)?;
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year = expand_year(&caps[3])?;

        // Impossible dates (13/45/2024) are not dates
        let reported = NaiveDate::from_ymd_opt(year, month, day)?;

        let age = (self.today() - reported).num_days();
        if age <= STALE_AFTER_DAYS {
            return None;
        }

        Some(
            Finding::new(
                fields::NC_DESCRIPTION,
                format!(
                    "Reported date ({}) is more than 30 days ago. Please verify this is the correct date.",
                    &caps[0]
                ),
            )
            .with_example_fix("Ensure you are reporting the most recent occurrence of this issue."),
        )
    }

    async fn check_frequency(&self, nca: &NonConformance) -> Option<Finding> {
        let count = match self
            .history
            .count_recent_by_category(nca.nc_type, FREQUENCY_WINDOW_DAYS)
            .await
        {
            Ok(count) => count?,
            Err(e) => {
                tracing::warn!(
                    agent = %AgentId::AnomalyDetection,
                    category = %nca.nc_type,
                    error = %e,
                    "History lookup failed, skipping frequency check"
                );
                return None;
            }
        };

        if count <= FREQUENCY_LIMIT {
            return None;
        }

        Some(
            Finding::new(
                fields::NC_TYPE,
                format!(
                    "This type of issue has been reported {} times in the last {} days, which is above normal.",
                    count, FREQUENCY_WINDOW_DAYS
                ),
            )
            .with_example_fix("Consider if this indicates a systemic issue requiring immediate attention."),
        )
    }
}

/// Two-digit years: 00-49 are 20xx, 50-99 are 19xx.
fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(match raw.len() {
        2 if year < 50 => 2000 + year,
        2 => 1900 + year,
        _ => year,
    })
}

#[async_trait]
impl Agent for AnomalyDetectionAgent {
    fn id(&self) -> AgentId {
        AgentId::AnomalyDetection
    }

    async fn analyze(
        &self,
        record: &Record,
        actor: &Actor,
        kind: RecordKind,
    ) -> Result<AgentResult, AgentError> {
        let mut result = AgentResult::new(self.id().as_str());
        result.confidence = 0.6;

        if let Some(nca) = non_conformance(record, kind) {
            if let Some(description) = nca.description() {
                if let Some(warning) = Self::check_quantity(description) {
                    result.warnings.push(warning);
                    result.confidence = 0.7;
                }

                if let Some(warning) = self.check_date(description) {
                    result.warnings.push(warning);
                    result.confidence = 0.8;
                }
            }

            if let Some(warning) = self.check_frequency(nca).await {
                result.warnings.push(warning);
                result.confidence = 0.85;
            }
        }

        result.reasoning = format!(
            "Anomaly Detection Agent analyzed {} submission for deviations from historical patterns. Found {} potential anomalies based on quantity, date, and frequency analysis.",
            kind,
            result.warnings.len()
        );

        tracing::debug!(
            agent = %self.id(),
            actor = %actor.id,
            anomalies = result.warnings.len(),
            "Anomaly detection finished"
        );

        Ok(result)
    }
}
