//! Training definition used to create a workspace when the account has none.
//!
//! The default definition is compiled into the binary from `config/training/workspace.json`.
//! Parsing is permissive: fields we do not model are ignored, and fields that are absent
//! stay absent (they are left out of the create request rather than sent as empty values).
//! Intents, entities, dialog nodes and counterexamples are opaque JSON passed through as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

static BUNDLED_TRAINING: &str = include_str!("../config/training/workspace.json");

/// Workspace definition as sent to the "create workspace" call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intents: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog_nodes: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterexamples: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("reading training file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing training definition: {0}")]
    Parse(#[from] serde_json::Error),
}

impl TrainingDefinition {
    /// Parse a definition from JSON text. Unknown fields are ignored.
    pub fn parse(json: &str) -> Result<Self, TrainingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Raw JSON of the definition shipped with the binary.
    pub fn bundled_source() -> &'static str {
        BUNDLED_TRAINING
    }

    /// The definition shipped with the binary.
    pub fn bundled() -> Result<Self, TrainingError> {
        Self::parse(BUNDLED_TRAINING)
    }

    /// Read and parse a definition from disk.
    pub fn from_path(path: &Path) -> Result<Self, TrainingError> {
        let text = std::fs::read_to_string(path).map_err(|source| TrainingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Load from `path` when given, otherwise the bundled definition.
    pub fn load(path: Option<&Path>) -> Result<Self, TrainingError> {
        match path {
            Some(p) => Self::from_path(p),
            None => Self::bundled(),
        }
    }
}
