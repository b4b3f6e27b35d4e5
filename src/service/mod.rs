pub mod context;
pub mod dto;
pub mod http;

pub use context::ServiceContext;
pub use http::{router, serve};
