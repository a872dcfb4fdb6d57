//! Core library for reading Terraform state from S3-compatible object stores.
//!
//! This crate provides the two read-only operations the MCP server exposes:
//! listing `.tfstate` object keys and fetching/parsing a single state file
//! with optional resource filtering. It is organized into:
//! - `state`: tfstate data model, tolerant parsing, resource filtering
//! - `client`: explicit store configuration and S3 client factory
//! - `backend`: the `StateBackend` trait seam
//! - `s3`: the S3 backend implementation and error classification
//! - `error`: the library error taxonomy

pub mod backend;
pub mod client;
pub mod error;
pub mod s3;
pub mod state;

pub use backend::StateBackend;
pub use client::{build_client, ClientFactory, StoreConfig};
pub use error::{Error, Result};
pub use s3::S3Backend;
pub use state::{is_state_file, Instance, Resource, StateFile, STATE_FILE_SUFFIX};
