//! Record parsing from YAML/JSON.

use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_record_schema;
use super::{fields, Record};

/// Errors that can occur when loading records.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Failed to read record file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Record does not match schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl Record {
    /// Parse a record from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RecordError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a record from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a record from a file, choosing the format by extension.
    ///
    /// `.json` files are read as JSON; everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Validate a JSON value against the schema, then deserialize it.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordError> {
        validate_record_schema(&value).map_err(RecordError::SchemaViolation)?;

        let record: Record = serde_json::from_value(value)?;
        record.validate()?;

        tracing::debug!(record_id = record.id(), kind = %record.kind(), "Record parsed");
        Ok(record)
    }

    /// Structural checks the schema cannot express.
    fn validate(&self) -> Result<(), RecordError> {
        match self {
            Record::NonConformance(nca) => {
                if nca.nca_id.trim().is_empty() {
                    return Err(RecordError::MissingField(fields::NCA_ID.to_string()));
                }
            }
            Record::MaintenanceJob(mjc) => {
                if mjc.mjc_id.trim().is_empty() {
                    return Err(RecordError::MissingField(fields::MJC_ID.to_string()));
                }
                if mjc.machine_equipment.trim().is_empty() {
                    return Err(RecordError::MissingField(fields::MACHINE_EQUIPMENT.to_string()));
                }
            }
        }

        Ok(())
    }
}
