//! Core ReAct agent loop: Reason → Act → Observe.
//!
//! One run per investigation request:
//! 1. Ask the model for the next step, given the history
//! 2. Final answer → done
//! 3. Tool request → look up and invoke each tool, appending observations
//! 4. Repeat, within the step and wall-clock budgets

use crate::agent::context::AgentRun;
use crate::agent::system_prompt::EMPTY_REPLY_NUDGE;
use crate::error::AgentError;
use crate::inference::ChatModel;
use crate::tools::ToolRegistry;
use crate::types::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Budgets that bound a single run.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    /// Maximum tool steps. The model always gets one more reasoning turn
    /// after the last allowed observation.
    pub max_steps: u32,
    pub max_duration: Duration,
}

/// Drives investigation runs against a shared, read-only tool registry.
#[derive(Clone)]
pub struct Investigator {
    model: Arc<dyn ChatModel>,
    registry: Arc<ToolRegistry>,
    limits: RunLimits,
}

impl Investigator {
    pub fn new(model: Arc<dyn ChatModel>, registry: Arc<ToolRegistry>, limits: RunLimits) -> Self {
        Self {
            model,
            registry,
            limits,
        }
    }

    /// Investigate `target` until the model writes its report or a budget runs out.
    pub async fn investigate(
        &self,
        target: &str,
    ) -> Result<(InvestigationResult, RunMetadata), AgentError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(AgentError::EmptyTarget);
        }

        let mut run = AgentRun::new(target, self.registry.definitions());
        info!(
            "[{}] Starting investigation of '{}' ({} tools, max {} steps, {:?} budget)",
            run.run_id,
            target,
            self.registry.len(),
            self.limits.max_steps,
            self.limits.max_duration
        );

        let outcome = tokio::time::timeout(self.limits.max_duration, self.drive(&mut run)).await;

        match outcome {
            Ok(Ok(report)) => {
                run.transition(RunState::Terminal);
                info!(
                    "[{}] Report ready after {} step(s): {}",
                    run.run_id,
                    run.step_count,
                    truncate(&report, 200)
                );
                Ok((InvestigationResult { report }, run.metadata()))
            }
            Ok(Err(e)) => {
                run.transition(RunState::Failed);
                warn!("[{}] Investigation failed: {}", run.run_id, e);
                Err(e)
            }
            Err(_) => {
                run.transition(RunState::Failed);
                warn!(
                    "[{}] Investigation exceeded {:?} after {} step(s)",
                    run.run_id, self.limits.max_duration, run.step_count
                );
                Err(AgentError::TimeoutExceeded {
                    after: self.limits.max_duration,
                })
            }
        }
    }

    async fn drive(&self, run: &mut AgentRun) -> Result<String, AgentError> {
        loop {
            let response = self
                .model
                .chat(&run.history, self.registry.definitions())
                .await?;

            match AgentStepOutcome::from(response) {
                AgentStepOutcome::FinalAnswer(report) => {
                    run.history.push(ChatMessage::assistant(report.clone()));
                    return Ok(report);
                }
                AgentStepOutcome::Empty => {
                    self.ensure_step_available(run)?;
                    warn!("[{}] Empty model reply — nudging", run.run_id);
                    run.history.push(ChatMessage::user(EMPTY_REPLY_NUDGE));
                    run.step_count += 1;
                }
                AgentStepOutcome::ToolRequest { preamble, calls } => {
                    run.history
                        .push(ChatMessage::assistant_tool_calls(preamble, calls.clone()));

                    for call in &calls {
                        self.ensure_step_available(run)?;
                        run.transition(RunState::ToolCall);

                        let outcome = self.registry.invoke(call).await;
                        match &outcome {
                            Ok(output) => info!(
                                "[{}] Step {}: {} -> {} chars",
                                run.run_id,
                                run.step_count + 1,
                                call.name,
                                output.len()
                            ),
                            Err(e) => warn!(
                                "[{}] Step {}: {}",
                                run.run_id,
                                run.step_count + 1,
                                e
                            ),
                        }

                        run.transition(RunState::Observation);
                        run.observe(call, &outcome);
                    }
                    run.transition(RunState::Reasoning);
                }
            }
        }
    }

    fn ensure_step_available(&self, run: &AgentRun) -> Result<(), AgentError> {
        if run.step_count >= self.limits.max_steps {
            return Err(AgentError::StepLimitExceeded {
                max_steps: self.limits.max_steps,
            });
        }
        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
