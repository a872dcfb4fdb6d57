//! MCP (Model Context Protocol) server for Terraform state analysis
//!
//! Exposes two read-only tools over state files stored in S3:
//! - `list_tfstate_files`: enumerate `.tfstate` keys in a bucket
//! - `read_tfstate`: fetch and parse one state file, optionally filtering
//!   resources by type or name
//!
//! # Transport
//!
//! The server speaks MCP over stdio by default, or over streamable HTTP
//! when started with `--transport streamable-http`. All logging goes to
//! stderr so stdout stays protocol-clean.

pub mod server;
pub mod types;

pub use server::{ServerOptions, TfstateServer};
