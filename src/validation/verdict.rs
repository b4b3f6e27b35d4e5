//! Classifier output normalization.
//!
//! The rule is a prefix test, not a parse: trim, lower-case, and anything
//! starting with `t` is [`Verdict::True`]. Everything else, including empty
//! or malformed replies, is [`Verdict::False`]. Downstream consumers depend
//! on this exact behavior.

use crate::types::Verdict;

pub fn normalize_verdict(raw: &str) -> Verdict {
    if raw.trim().to_lowercase().starts_with('t') {
        Verdict::True
    } else {
        Verdict::False
    }
}

/// Whether the classifier followed its instruction to answer with a bare token.
pub fn is_canonical(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "false")
}
