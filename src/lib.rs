// src/lib.rs
// Fibery MCP server - query and search tools over the Fibery commands API

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod error;
pub mod fibery;
pub mod mcp;

pub use error::{FiberyError, Result};
