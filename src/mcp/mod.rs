pub mod client;
pub mod protocol;

pub use client::{McpClient, McpServerConfig};
pub use protocol::McpToolInfo;
