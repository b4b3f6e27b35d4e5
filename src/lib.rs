//! Domain Sentinel — domain threat-intelligence service.
//!
//! An investigation agent calls a remote reporting tool until it can write a
//! prose report on a domain; a validator classifies such reports as true or
//! false positives and extracts the domain they refer to.

pub mod agent;
pub mod config;
pub mod error;
pub mod inference;
pub mod mcp;
pub mod service;
pub mod tools;
pub mod types;
pub mod validation;
