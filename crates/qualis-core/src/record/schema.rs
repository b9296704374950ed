//! JSON Schema validation for records.
//!
//! Record documents are checked against `schema/record.schema.json` before
//! they are deserialized, so operators get every structural problem at once
//! instead of the first serde error.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded record schema (loaded at compile time).
const RECORD_SCHEMA_JSON: &str = include_str!("../../schema/record.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(RECORD_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| SchemaError::LoadError(e.clone()))
}

/// Validate a record JSON value against the schema.
///
/// Returns every violation as `"<message> at <instance path>"`.
pub fn validate_record_schema(record_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(record_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check if a record JSON value is valid against the schema.
pub fn is_valid_record(record_json: &serde_json::Value) -> bool {
    get_validator()
        .map(|v| v.is_valid(record_json))
        .unwrap_or(false)
}
