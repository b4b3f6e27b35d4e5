//! HTTP façade over the investigation and validation pipelines.
//!
//! # Endpoints
//!
//! - `POST /investigate/invoke` - Run one investigation
//! - `POST /investigate/batch` - Run several investigations concurrently
//! - `GET /investigate/input_schema` - Input JSON schema
//! - `POST /validate_report/invoke` - Validate one report
//! - `POST /validate_report/batch` - Validate several reports concurrently
//! - `GET /validate_report/input_schema` - Input JSON schema
//! - `GET /health` - Liveness and discovered tools

use crate::error::{AgentError, InferenceError, ValidationError};
use crate::service::dto::*;
use crate::service::ServiceContext;
use crate::types::{InvestigationResult, ValidationOutcome};
use crate::validation;
use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::future::try_join_all;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub type AppState = Arc<ServiceContext>;

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Request-level failure mapped onto an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        let (status, kind) = match &e {
            AgentError::EmptyTarget => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_input"),
            AgentError::StepLimitExceeded { .. } | AgentError::TimeoutExceeded { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "budget_exhausted")
            }
            AgentError::Inference(_) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
        };
        let message = match &e {
            AgentError::Inference(inner) => client_message(inner),
            _ => e.to_string(),
        };
        Self {
            status,
            body: ErrorResponse::new(kind, message),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        let ValidationError::Inference(inner) = &e;
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: ErrorResponse::new("service_unavailable", client_message(inner)),
        }
    }
}

/// Upstream response bodies stay in the log, not in the reply.
fn client_message(e: &InferenceError) -> String {
    match e {
        InferenceError::Http { status, body } => {
            warn!("Inference service returned HTTP {}: {}", status, body);
            format!("inference service returned HTTP {status}")
        }
        other => other.to_string(),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /investigate/invoke
pub async fn investigate_invoke(
    State(ctx): State<AppState>,
    Json(req): Json<InvokeRequest<InvestigateInput>>,
) -> Result<Json<InvestigateResponse>, ApiError> {
    let (output, metadata) = ctx.investigator.investigate(&req.input.target).await?;
    Ok(Json(InvokeResponse { output, metadata }))
}

/// POST /investigate/batch
pub async fn investigate_batch(
    State(ctx): State<AppState>,
    Json(req): Json<BatchRequest<InvestigateInput>>,
) -> Result<Json<BatchResponse<InvestigationResult>>, ApiError> {
    let runs = req
        .inputs
        .iter()
        .map(|input| ctx.investigator.investigate(&input.target));
    let output = try_join_all(runs)
        .await?
        .into_iter()
        .map(|(result, _)| result)
        .collect();
    Ok(Json(BatchResponse { output }))
}

/// POST /validate_report/invoke
pub async fn validate_invoke(
    State(ctx): State<AppState>,
    Json(req): Json<InvokeRequest<ValidationInput>>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let output = validation::validate_report(&ctx.validator, &req.input.report).await?;
    Ok(Json(InvokeResponse {
        output,
        metadata: ValidationMetadata {
            run_id: ulid::Ulid::new().to_string(),
        },
    }))
}

/// POST /validate_report/batch
pub async fn validate_batch(
    State(ctx): State<AppState>,
    Json(req): Json<BatchRequest<ValidationInput>>,
) -> Result<Json<BatchResponse<ValidationOutcome>>, ApiError> {
    let runs = req
        .inputs
        .iter()
        .map(|input| validation::validate_report(&ctx.validator, &input.report));
    let output = try_join_all(runs).await?;
    Ok(Json(BatchResponse { output }))
}

pub async fn investigate_schema() -> Json<Value> {
    Json(investigate_input_schema())
}

pub async fn validate_schema() -> Json<Value> {
    Json(validation_input_schema())
}

/// GET /health
pub async fn health(State(ctx): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "tools": ctx.registry.names(),
        "investigator_model": ctx.config.investigator_model,
        "validator_model": ctx.config.validator_model,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Router and server
// ════════════════════════════════════════════════════════════════════════════════

pub fn router(ctx: AppState) -> Router {
    Router::new()
        .route("/investigate/invoke", post(investigate_invoke))
        .route("/investigate/batch", post(investigate_batch))
        .route("/investigate/input_schema", get(investigate_schema))
        .route("/validate_report/invoke", post(validate_invoke))
        .route("/validate_report/batch", post(validate_batch))
        .route("/validate_report/input_schema", get(validate_schema))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Bind and serve until `cancel` fires. The context is already initialized,
/// so nothing can be served against a partial registry.
pub async fn serve(ctx: AppState, addr: &str, cancel: CancellationToken) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid listen address '{addr}'"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("HTTP server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SentinelConfig;
    use crate::error::InferenceError;
    use crate::inference::ChatModel;
    use crate::tools::tests::StubTool;
    use crate::tools::{Tool, ToolDefinition, ToolRegistry};
    use crate::types::{ChatMessage, InferenceResponse, ToolCall};
    use crate::validation::merge::tests::KeywordClassifier;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Calls the report tool once, then summarizes the last observation.
    struct OneToolInvestigator;

    #[async_trait]
    impl ChatModel for OneToolInvestigator {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolDefinition],
        ) -> Result<InferenceResponse, InferenceError> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            if last.starts_with("[get_domain_report]") {
                return Ok(InferenceResponse {
                    content: Some(format!("Investigation report. Evidence: {last}")),
                    ..Default::default()
                });
            }
            let target = messages
                .iter()
                .find_map(|m| crate::validation::extract_domain(&m.content))
                .unwrap_or_default();
            Ok(InferenceResponse {
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call_0".into(),
                    name: "get_domain_report".into(),
                    arguments: json!({ "domain": target }),
                }],
                ..Default::default()
            })
        }
    }

    /// Never stops asking for tools.
    struct LoopingModel;

    #[async_trait]
    impl ChatModel for LoopingModel {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolDefinition],
        ) -> Result<InferenceResponse, InferenceError> {
            Ok(InferenceResponse {
                tool_calls: vec![ToolCall {
                    id: "x".into(),
                    name: "get_domain_report".into(),
                    arguments: json!({"domain": "a.com"}),
                }],
                ..Default::default()
            })
        }
    }

    /// Upstream rejects every request with a verbose error body.
    struct RejectingModel;

    #[async_trait]
    impl ChatModel for RejectingModel {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolDefinition],
        ) -> Result<InferenceResponse, InferenceError> {
            Err(InferenceError::Http {
                status: 500,
                body: "internal trace: key=sk-live-123".into(),
            })
        }
    }

    fn app(investigator: Arc<dyn ChatModel>) -> Router {
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(StubTool::ok(
            "get_domain_report",
            "3/94 security vendors flagged this domain",
        ))];
        let registry = Arc::new(ToolRegistry::from_tools(tools, Duration::from_secs(5)));
        let config = SentinelConfig {
            max_steps: 3,
            ..SentinelConfig::default()
        };
        let ctx = ServiceContext::from_parts(
            config,
            registry,
            investigator,
            Arc::new(KeywordClassifier),
        );
        router(Arc::new(ctx))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1_000_000)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn investigate_returns_non_empty_report() {
        let (status, body) = call(
            app(Arc::new(OneToolInvestigator)),
            "POST",
            "/investigate/invoke",
            Some(json!({"input": {"target": "google.com"}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let report = body["output"]["report"].as_str().unwrap();
        assert!(report.contains("3/94 security vendors"));
        assert_eq!(body["metadata"]["steps"], 1);
        assert!(body["metadata"]["run_id"].is_string());
    }

    #[tokio::test]
    async fn empty_target_is_unprocessable() {
        let (status, body) = call(
            app(Arc::new(OneToolInvestigator)),
            "POST",
            "/investigate/invoke",
            Some(json!({"input": {"target": ""}})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn exhausted_budget_is_service_unavailable() {
        let (status, body) = call(
            app(Arc::new(LoopingModel)),
            "POST",
            "/investigate/invoke",
            Some(json!({"input": {"target": "a.com"}})),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "budget_exhausted");
    }

    #[tokio::test]
    async fn upstream_error_body_is_not_returned() {
        let (status, body) = call(
            app(Arc::new(RejectingModel)),
            "POST",
            "/investigate/invoke",
            Some(json!({"input": {"target": "a.com"}})),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "service_unavailable");
        assert_eq!(body["message"], "inference service returned HTTP 500");
    }

    #[test]
    fn validation_error_hides_upstream_body() {
        let err = ApiError::from(ValidationError::Inference(InferenceError::Http {
            status: 502,
            body: "stack trace".into(),
        }));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.body.message, "inference service returned HTTP 502");
    }

    #[tokio::test]
    async fn validate_report_merges_outputs() {
        let report = "The domain Evil-Site.co was flagged malicious by 12 vendors.";
        let (status, body) = call(
            app(Arc::new(OneToolInvestigator)),
            "POST",
            "/validate_report/invoke",
            Some(json!({"input": {"report": report}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"]["domain"], "evil-site.co");
        assert_eq!(body["output"]["result"], "true");
        assert_eq!(body["output"]["report"], report);
    }

    #[tokio::test]
    async fn validate_empty_report_yields_null_domain_and_false() {
        let (status, body) = call(
            app(Arc::new(OneToolInvestigator)),
            "POST",
            "/validate_report/invoke",
            Some(json!({"input": {"report": ""}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"]["domain"], Value::Null);
        assert_eq!(body["output"]["result"], "false");
    }

    #[tokio::test]
    async fn validate_batch_keeps_input_order() {
        let (status, body) = call(
            app(Arc::new(OneToolInvestigator)),
            "POST",
            "/validate_report/batch",
            Some(json!({"inputs": [
                {"report": "first.com is malicious"},
                {"report": "second.org is fine"}
            ]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"][0]["domain"], "first.com");
        assert_eq!(body["output"][0]["result"], "true");
        assert_eq!(body["output"][1]["domain"], "second.org");
        assert_eq!(body["output"][1]["result"], "false");
    }

    #[tokio::test]
    async fn missing_field_is_rejected() {
        let (status, _) = call(
            app(Arc::new(OneToolInvestigator)),
            "POST",
            "/validate_report/invoke",
            Some(json!({"input": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn schema_and_health_endpoints() {
        let (status, body) = call(
            app(Arc::new(OneToolInvestigator)),
            "GET",
            "/investigate/input_schema",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["required"][0], "target");

        let (status, body) = call(app(Arc::new(OneToolInvestigator)), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tools"][0], "get_domain_report");
    }
}
