//! Record identifiers and sharded-path utilities.
//!
//! Every patient record in the store is addressed by a *record id*: a UUID in canonical form,
//! **32 lowercase hexadecimal characters** with no hyphens.
//!
//! This crate provides:
//! - [`RecordId`], a wrapper that guarantees the canonical format once constructed.
//! - The sharding rule used to derive a record's directory from its id.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Externally supplied ids (CLI arguments, JSON documents) must already be canonical; use
//! [`RecordId::parse`] to validate them. Hyphenated or uppercase values are rejected.
//!
//! ## Sharded directory layout
//! For a canonical id `u` the record lives under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `patient_data/55/0e/550e8400e29b41d4a716446655440000/record.yaml`

mod record_id;

pub use record_id::{RecordId, Uuid};

/// Error type for record id operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for record id operations.
pub type UuidResult<T> = Result<T, UuidError>;
