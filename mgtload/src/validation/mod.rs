//! JSON Schema validation for job configuration files.
//!
//! The schema is embedded at compile time from `schemas/job-config.json`.

use once_cell::sync::Lazy;
use serde_json::Value;

static JOB_CONFIG_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/job-config.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a JSON schema (Draft 7).
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a job configuration document.
pub fn validate_job_config(data: &Value) -> Result<(), Vec<String>> {
    validate(&JOB_CONFIG_SCHEMA, data)
}
