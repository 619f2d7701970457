//! Interpretation of test-database responses.
//!
//! Every response carries a `uuAppErrorMap` object keyed by error code, e.g.
//! `cern-itkpd-main/uploadTestRunResults/componentAtDifferentLocation`. An
//! empty map (or one holding only warnings) means success.

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::CollaboratorError;
use crate::services::test_database::{Rejection, SubmitOutcome};

/// Error codes reported as `(code, message)`, warnings excluded.
pub fn error_entries(body: &Value) -> Vec<(String, String)> {
    let Some(map) = body.get("uuAppErrorMap").and_then(Value::as_object) else {
        return Vec::new();
    };

    map.iter()
        .filter(|(_, entry)| entry.get("type").and_then(Value::as_str) != Some("warning"))
        .map(|(code, entry)| {
            let message = entry
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (code.clone(), message)
        })
        .collect()
}

/// Maps an error code to a [`Rejection`] by its last path segment.
pub fn rejection_for(code: String, message: String) -> Rejection {
    match code.rsplit('/').next() {
        Some("componentAtDifferentLocation") => Rejection::ComponentAtDifferentLocation,
        Some("unassociatedStageWithTestType") => Rejection::StageWithoutTestType,
        _ => Rejection::Other { code, message },
    }
}

fn parse_body(status: StatusCode, body: &str) -> Result<Value, CollaboratorError> {
    serde_json::from_str(body).map_err(|e| {
        CollaboratorError::MalformedResponse(format!("status {status}, body is not JSON: {e}"))
    })
}

/// Interprets the response to `uploadTestRunResults`.
pub fn interpret_upload_response(
    status: StatusCode,
    body: &str,
) -> Result<SubmitOutcome, CollaboratorError> {
    let value = parse_body(status, body)?;

    if let Some((code, message)) = error_entries(&value).into_iter().next() {
        return Ok(SubmitOutcome::Rejected(rejection_for(code, message)));
    }
    if !status.is_success() {
        return Err(CollaboratorError::MalformedResponse(format!(
            "status {status} without an error code"
        )));
    }

    match value.pointer("/testRun/id") {
        Some(Value::String(id)) => Ok(SubmitOutcome::Accepted {
            test_run_id: id.clone(),
        }),
        _ => Err(CollaboratorError::MalformedResponse(
            "accepted response has no testRun.id".to_string(),
        )),
    }
}

/// Interprets the response to `createTestRunAttachment`.
pub fn interpret_attachment_response(status: StatusCode, body: &str) -> Result<(), CollaboratorError> {
    let value = match parse_body(status, body) {
        Ok(value) => value,
        Err(_) if status.is_success() => return Ok(()),
        Err(e) => return Err(e),
    };

    if let Some((code, message)) = error_entries(&value).into_iter().next() {
        return Err(CollaboratorError::Rejected(rejection_for(code, message)));
    }
    if !status.is_success() {
        return Err(CollaboratorError::MalformedResponse(format!(
            "status {status} without an error code"
        )));
    }
    Ok(())
}
