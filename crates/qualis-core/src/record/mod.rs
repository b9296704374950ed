//! Compliance records.
//!
//! A submission is either a non-conformance advice (NCA) or a maintenance
//! job card (MJC). Records are plain data: they are parsed from YAML/JSON,
//! checked against the embedded JSON Schema, and never mutated afterwards.

mod parser;
mod schema;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::RecordKind;

pub use parser::RecordError;
pub use schema::{is_valid_record, validate_record_schema, SchemaError};

/// Field names referenced by findings.
pub mod fields {
    pub const NCA_ID: &str = "nca_id";
    pub const NC_DESCRIPTION: &str = "nc_description";
    pub const NC_TYPE: &str = "nc_type";
    pub const ROOT_CAUSE_ANALYSIS: &str = "root_cause_analysis";
    pub const CORRECTIVE_ACTION: &str = "corrective_action";

    pub const MJC_ID: &str = "mjc_id";
    pub const MACHINE_EQUIPMENT: &str = "machine_equipment";
}

/// Category tag of a non-conformance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NonConformanceType {
    RawMaterial,
    FinishedGoods,
    Wip,
    Incident,
    Other,
}

impl NonConformanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NonConformanceType::RawMaterial => "raw-material",
            NonConformanceType::FinishedGoods => "finished-goods",
            NonConformanceType::Wip => "wip",
            NonConformanceType::Incident => "incident",
            NonConformanceType::Other => "other",
        }
    }

    /// Readable label ("raw material").
    pub fn label(&self) -> String {
        self.as_str().replace('-', " ")
    }
}

impl fmt::Display for NonConformanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NonConformanceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw-material" => Ok(Self::RawMaterial),
            "finished-goods" => Ok(Self::FinishedGoods),
            "wip" => Ok(Self::Wip),
            "incident" => Ok(Self::Incident),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown non-conformance type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MachineStatus {
    Down,
    Operational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaintenanceCategory {
    Reactive,
    Planned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

/// Non-conformance advice (NCA).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonConformance {
    pub nca_id: String,
    pub nc_description: String,
    pub nc_type: NonConformanceType,

    /// Free-text category when `nc_type` is `other`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nc_type_other: Option<String>,

    pub machine_status: MachineStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_down_since: Option<DateTime<Utc>>,

    #[serde(default)]
    pub cross_contamination: bool,
    #[serde(default)]
    pub disposition_rework: bool,
    #[serde(default)]
    pub disposition_concession: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause_analysis: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrective_action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_order_id: Option<String>,
}

impl NonConformance {
    /// Description, if it carries any text.
    pub fn description(&self) -> Option<&str> {
        non_empty(Some(self.nc_description.as_str()))
    }

    /// Root cause analysis, if present and not blank. Whitespace-only text
    /// counts as absent.
    pub fn root_cause(&self) -> Option<&str> {
        non_empty(self.root_cause_analysis.as_deref())
    }

    /// Corrective action, if present and not blank.
    pub fn corrective_action(&self) -> Option<&str> {
        non_empty(self.corrective_action.as_deref())
    }
}

/// Maintenance job card (MJC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceJob {
    pub mjc_id: String,
    pub description_required: String,
    pub maintenance_category: MaintenanceCategory,

    #[serde(default)]
    pub maintenance_type_electrical: bool,
    #[serde(default)]
    pub maintenance_type_mechanical: bool,
    #[serde(default)]
    pub maintenance_type_pneumatical: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_type_other: Option<String>,

    pub machine_status: MachineStatus,
    pub urgency: Urgency,

    #[serde(default)]
    pub temporary_repair: bool,

    pub machine_equipment: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_performed: Option<String>,
}

/// A submitted compliance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Record {
    #[serde(rename = "nca")]
    NonConformance(NonConformance),

    #[serde(rename = "mjc")]
    MaintenanceJob(MaintenanceJob),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::NonConformance(_) => RecordKind::NonConformance,
            Record::MaintenanceJob(_) => RecordKind::MaintenanceJob,
        }
    }

    /// Record identifier (`nca_id` or `mjc_id`).
    pub fn id(&self) -> &str {
        match self {
            Record::NonConformance(nca) => &nca.nca_id,
            Record::MaintenanceJob(mjc) => &mjc.mjc_id,
        }
    }

    pub fn as_non_conformance(&self) -> Option<&NonConformance> {
        match self {
            Record::NonConformance(nca) => Some(nca),
            Record::MaintenanceJob(_) => None,
        }
    }

    pub fn as_maintenance_job(&self) -> Option<&MaintenanceJob> {
        match self {
            Record::MaintenanceJob(mjc) => Some(mjc),
            Record::NonConformance(_) => None,
        }
    }
}

/// Role of the person submitting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActorRole {
    Operator,
    TeamLeader,
    MaintenanceTechnician,
    QaSupervisor,
    MaintenanceManager,
    OperationsManager,
}

impl std::str::FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operator" => Ok(Self::Operator),
            "team-leader" => Ok(Self::TeamLeader),
            "maintenance-technician" => Ok(Self::MaintenanceTechnician),
            "qa-supervisor" => Ok(Self::QaSupervisor),
            "maintenance-manager" => Ok(Self::MaintenanceManager),
            "operations-manager" => Ok(Self::OperationsManager),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The person submitting a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
    pub name: String,
    pub department: String,

    #[serde(default)]
    pub induction_completed: bool,

    #[serde(default)]
    pub induction_date: Option<NaiveDate>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            role,
            name: String::new(),
            department: String::new(),
            induction_completed: false,
            induction_date: None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_follows_variant() {
        let nca = Record::NonConformance(fixtures::nca());
        let mjc = Record::MaintenanceJob(fixtures::mjc());
        assert_eq!(nca.kind(), RecordKind::NonConformance);
        assert_eq!(mjc.kind(), RecordKind::MaintenanceJob);
        assert_eq!(nca.id(), "NCA-001");
        assert!(mjc.as_non_conformance().is_none());
    }

    #[test]
    fn test_blank_optional_fields_are_absent() {
        let mut nca = fixtures::nca();
        nca.root_cause_analysis = Some("   ".to_string());
        nca.corrective_action = None;
        assert!(nca.root_cause().is_none());
        assert!(nca.corrective_action().is_none());
        assert!(nca.description().is_some());
    }

    #[test]
    fn test_type_label() {
        assert_eq!(NonConformanceType::RawMaterial.label(), "raw material");
        assert_eq!("wip".parse::<NonConformanceType>().unwrap(), NonConformanceType::Wip);
    }
}
