//! Request/response bodies for the HTTP façade.
//!
//! Shapes follow the LangServe convention: `{"input": ...}` in,
//! `{"output": ..., "metadata": ...}` out.

use crate::types::{InvestigationResult, RunMetadata, ValidationOutcome};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct InvokeRequest<T> {
    pub input: T,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest<T> {
    pub inputs: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct InvokeResponse<T, M> {
    pub output: T,
    pub metadata: M,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse<T> {
    pub output: Vec<T>,
}

/// Input for the investigation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct InvestigateInput {
    pub target: String,
}

/// Input for the validation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationInput {
    pub report: String,
}

pub type InvestigateResponse = InvokeResponse<InvestigationResult, RunMetadata>;

#[derive(Debug, Serialize)]
pub struct ValidationMetadata {
    pub run_id: String,
}

pub type ValidateResponse = InvokeResponse<ValidationOutcome, ValidationMetadata>;

/// Error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

pub fn investigate_input_schema() -> Value {
    json!({
        "title": "InvestigateRequest",
        "description": "Input for the investigation endpoint.",
        "type": "object",
        "properties": {
            "target": {
                "title": "Target",
                "description": "The domain to investigate.",
                "type": "string",
                "examples": ["google.com"]
            }
        },
        "required": ["target"]
    })
}

pub fn validation_input_schema() -> Value {
    json!({
        "title": "ValidationInput",
        "description": "Input for the threat validation endpoint.",
        "type": "object",
        "properties": {
            "report": {
                "title": "Report",
                "description": "The comprehensive security report to validate.",
                "type": "string",
                "examples": ["Threat Summary:\nThe domain youtupe.com has a medium-level threat score of 6.4%, ..."]
            }
        },
        "required": ["report"]
    })
}
