//! Result merger: classification and domain extraction run side by side over
//! the same report and are folded into one [`ValidationOutcome`].

use crate::error::ValidationError;
use crate::types::{ValidationOutcome, Verdict};
use crate::validation::domain::extract_domain;
use crate::validation::stage::Validator;
use crate::validation::verdict::{is_canonical, normalize_verdict};
use tracing::debug;

/// Output of the classification branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub raw: String,
    pub verdict: Verdict,
}

/// Output of the extraction branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainExtraction {
    pub domain: Option<String>,
}

/// Run both branches concurrently and merge them.
pub async fn validate_report(
    validator: &Validator,
    report: &str,
) -> Result<ValidationOutcome, ValidationError> {
    let classify = async {
        let raw = validator.validate(report).await?;
        if !is_canonical(&raw) {
            debug!("Non-canonical classifier reply tolerated: {:?}", raw);
        }
        let verdict = normalize_verdict(&raw);
        Ok::<_, ValidationError>(Classification { raw, verdict })
    };
    let extract = async {
        DomainExtraction {
            domain: extract_domain(report),
        }
    };

    let (classification, extraction) = tokio::join!(classify, extract);
    Ok(merge(report, classification?, extraction))
}

/// Deterministic merge. The report is passed through untouched.
pub fn merge(
    report: &str,
    classification: Classification,
    extraction: DomainExtraction,
) -> ValidationOutcome {
    ValidationOutcome {
        domain: extraction.domain,
        result: classification.verdict,
        report: report.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::inference::ChatModel;
    use crate::tools::ToolDefinition;
    use crate::types::{ChatMessage, InferenceResponse};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    /// Says "True." when the prompt mentions "malicious", "false" otherwise.
    /// Sleeps a little so concurrent calls interleave.
    pub(crate) struct KeywordClassifier;

    #[async_trait]
    impl ChatModel for KeywordClassifier {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolDefinition],
        ) -> Result<InferenceResponse, InferenceError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let prompt = &messages[0].content;
            let reply = if prompt.contains("malicious") {
                "True."
            } else {
                "false"
            };
            Ok(InferenceResponse {
                content: Some(reply.into()),
                ..Default::default()
            })
        }
    }

    struct DownClassifier;

    #[async_trait]
    impl ChatModel for DownClassifier {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolDefinition],
        ) -> Result<InferenceResponse, InferenceError> {
            Err(InferenceError::Timeout(Duration::from_secs(60)))
        }
    }

    fn validator() -> Validator {
        Validator::new(Arc::new(KeywordClassifier))
    }

    #[tokio::test]
    async fn merges_verdict_domain_and_report() {
        let report = "Threat Summary:\nThe domain YouTupe.com was flagged malicious by 5 vendors.";
        let outcome = validate_report(&validator(), report).await.unwrap();

        assert_eq!(outcome.domain.as_deref(), Some("youtupe.com"));
        assert_eq!(outcome.result, Verdict::True);
        assert_eq!(outcome.report, report);
    }

    #[tokio::test]
    async fn empty_report_degrades_gracefully() {
        let outcome = validate_report(&validator(), "").await.unwrap();
        assert_eq!(outcome.domain, None);
        assert_eq!(outcome.result, Verdict::False);
        assert_eq!(outcome.report, "");
    }

    #[tokio::test]
    async fn report_passes_through_verbatim() {
        let reports = [
            "  leading and trailing whitespace  ",
            "Unicode — ünïcödé.example.com",
            "line1\r\nline2\n",
        ];
        for report in reports {
            let outcome = validate_report(&validator(), report).await.unwrap();
            assert_eq!(outcome.report, report);
        }
    }

    #[tokio::test]
    async fn classifier_failure_propagates() {
        let v = Validator::new(Arc::new(DownClassifier));
        let err = validate_report(&v, "anything.com").await.unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Inference(InferenceError::Timeout(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_do_not_cross_contaminate() {
        let v = validator();
        let mut handles = Vec::new();
        for i in 0..32 {
            let v = v.clone();
            handles.push(tokio::spawn(async move {
                let report = if i % 2 == 0 {
                    format!("host-{i}.example.com is malicious")
                } else {
                    format!("host-{i}.example.org looks clean")
                };
                let outcome = validate_report(&v, &report).await.unwrap();
                (i, report, outcome)
            }));
        }

        for handle in handles {
            let (i, report, outcome) = handle.await.unwrap();
            assert_eq!(outcome.report, report);
            if i % 2 == 0 {
                assert_eq!(outcome.domain, Some(format!("host-{i}.example.com")));
                assert_eq!(outcome.result, Verdict::True);
            } else {
                assert_eq!(outcome.domain, Some(format!("host-{i}.example.org")));
                assert_eq!(outcome.result, Verdict::False);
            }
        }
    }

    #[test]
    fn merge_is_pure() {
        let outcome = merge(
            "r",
            Classification {
                raw: "t".into(),
                verdict: Verdict::True,
            },
            DomainExtraction { domain: None },
        );
        assert_eq!(
            outcome,
            ValidationOutcome {
                domain: None,
                result: Verdict::True,
                report: "r".into()
            }
        );
    }
}
