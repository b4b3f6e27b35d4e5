//! Validation stage: one classifier round trip per report.

use crate::error::InferenceError;
use crate::inference::ChatModel;
use crate::types::ChatMessage;
use std::sync::Arc;
use tracing::debug;

const VALIDATION_INSTRUCTION: &str = "You are a cybersecurity threat validator. Your task is to \
analyze a security report and determine if the findings indicate a **true positive** (a real, \
credible threat) or a **false positive** (an erroneous or harmless finding). The report you will \
analyze is provided below. Analyze the details carefully, considering the domain's reputation \
score, detection ratios, and related activities. Based on your analysis, respond with only the \
word 'true' if it is a true positive, or 'false' if it is a false positive. Do not add any other \
text, explanation, or punctuation.";

pub fn build_validation_prompt(report: &str) -> String {
    format!("{VALIDATION_INSTRUCTION}\n\nReport to analyze:\n{report}")
}

/// Classifier client. Returns the raw reply; normalization happens downstream.
#[derive(Clone)]
pub struct Validator {
    model: Arc<dyn ChatModel>,
}

impl Validator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Ask the classifier about `report`. No retry; any text is accepted.
    pub async fn validate(&self, report: &str) -> Result<String, InferenceError> {
        let messages = [ChatMessage::user(build_validation_prompt(report))];
        let resp = self.model.chat(&messages, &[]).await?;
        let raw = resp.content.unwrap_or_default();
        debug!("Classifier replied: {:?}", raw);
        Ok(raw)
    }
}
