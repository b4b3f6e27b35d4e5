//! Prompt text for the investigation agent.

use crate::tools::ToolDefinition;

const ANALYST_PERSONA: &str = "You are a Senior Cybersecurity Analyst.";

/// System message: persona plus the tools available this process lifetime.
pub fn build_system_prompt(tools: &[ToolDefinition]) -> String {
    let mut prompt = String::from(ANALYST_PERSONA);
    prompt.push_str(
        " You investigate domains by calling the reporting tools you are given, \
         then write a report for a security operations team.\n",
    );

    if tools.is_empty() {
        prompt.push_str("\nNo tools are currently available; say so in your report.\n");
    } else {
        prompt.push_str("\n## Available tools\n\n");
        for t in tools {
            prompt.push_str(&format!("- `{}`: {}\n", t.name, t.description));
        }
    }

    prompt.push_str(
        "\nIf a tool call fails you will receive an error observation; \
         adjust your arguments or pick another tool. \
         When you have enough information, reply with the final report only.",
    );
    prompt
}

/// User message that starts an investigation of `target`.
pub fn build_investigation_prompt(target: &str) -> String {
    format!(
        "Use the get domain report tool to investigate {target}, then provide a comprehensive \
         security investigation report including how many security vendors have flagged the \
         domain as malicious and which vendors they are, a risk assessment, related activities, \
         historical reputation, and recommended mitigations."
    )
}

/// Sent after the model returns nothing at all.
pub const EMPTY_REPLY_NUDGE: &str =
    "Your previous reply was empty. Continue the investigation or write the final report now.";
