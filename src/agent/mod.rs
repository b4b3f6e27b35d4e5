pub mod context;
pub mod loop_;
pub mod system_prompt;

pub use context::AgentRun;
pub use loop_::{Investigator, RunLimits};
