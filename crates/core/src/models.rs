//! Core data models: the library → document → chunk hierarchy.
//!
//! Child types hold only their parent's id, never a direct reference, so the
//! catalog can be represented as flat maps keyed by id instead of a cyclic
//! object graph (see `DESIGN.md`).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Free-form metadata: string keys to arbitrary JSON-like values.
pub type Metadata = HashMap<String, JsonValue>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Library {
    pub id: Uuid,
    pub name: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub library_id: Uuid,
    pub title: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Maximum chunk text length.
pub const CHUNK_TEXT_MAX_LEN: usize = 10_000;

impl Chunk {
    pub fn validate_text(text: &str) -> Result<(), crate::error::Error> {
        if text.is_empty() {
            return Err(crate::error::Error::Validation(
                "chunk text must not be empty".to_string(),
            ));
        }
        if text.chars().count() > CHUNK_TEXT_MAX_LEN {
            return Err(crate::error::Error::Validation(format!(
                "chunk text exceeds {CHUNK_TEXT_MAX_LEN} characters"
            )));
        }
        Ok(())
    }
}

impl Library {
    pub fn validate_name(name: &str) -> Result<(), crate::error::Error> {
        if name.trim().is_empty() {
            return Err(crate::error::Error::Validation(
                "library name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Document {
    pub fn validate_title(title: &str) -> Result<(), crate::error::Error> {
        if title.trim().is_empty() {
            return Err(crate::error::Error::Validation(
                "document title must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
