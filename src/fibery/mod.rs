// src/fibery/mod.rs
// Fibery API collaborators: schema metadata and the commands/documents client

pub mod client;
pub mod schema;

pub use client::{CommandResult, FiberyApi, FiberyClient};
pub use schema::{Database, Schema, SchemaField};
