//! Static checks over emitted agent JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{ConvertError, Result};

/// Skipped during directory validation.
pub const INDEX_FILE: &str = "INDEX.json";

const REQUIRED_FIELDS: [&str; 2] = ["name", "prompt"];

/// Top-level keys the converter emits plus the ones the agent runner documents.
const ACCEPTED_FIELDS: &[&str] = &[
    "$schema",
    "name",
    "description",
    "model",
    "temperature",
    "prompt",
    "declaredTools",
    "allowedTools",
    "toolSettings",
    "integrations",
    "resources",
    "tools",
    "toolAliases",
    "mcpServers",
    "hooks",
    "toolsSettings",
    "includeMcpJson",
    "useLegacyMcpJson",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileValidation {
    pub path: PathBuf,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid: usize,
    /// Only files with at least one error.
    pub invalid: Vec<FileValidation>,
}

impl ValidationReport {
    pub fn scanned(&self) -> usize {
        self.valid + self.invalid.len()
    }

    pub fn is_ok(&self) -> bool {
        self.invalid.is_empty()
    }
}

pub fn validate_agent_json(content: &str) -> Vec<String> {
    let data: Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => return vec![format!("invalid JSON: {e}")],
    };
    let Some(obj) = data.as_object() else {
        return vec!["top-level value must be an object".to_string()];
    };

    let mut errors = Vec::new();
    for field in REQUIRED_FIELDS {
        match obj.get(field) {
            None => errors.push(format!("missing required field '{field}'")),
            Some(v) if !v.is_string() => errors.push(format!("field '{field}' must be a string")),
            Some(_) => {}
        }
    }
    let unknown: Vec<&str> = obj
        .keys()
        .map(String::as_str)
        .filter(|k| !ACCEPTED_FIELDS.contains(k))
        .collect();
    if !unknown.is_empty() {
        errors.push(format!("unknown fields: {}", unknown.join(", ")));
    }
    errors
}

pub fn validate_dir(dir: &Path) -> Result<ValidationReport> {
    let entries = fs::read_dir(dir).map_err(|source| ConvertError::Discovery {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension().and_then(|s| s.to_str()) == Some("json")
                && p.file_name().and_then(|s| s.to_str()) != Some(INDEX_FILE)
        })
        .collect();
    if files.is_empty() {
        return Err(ConvertError::NoInputs {
            path: dir.to_path_buf(),
        });
    }
    files.sort();

    let mut report = ValidationReport::default();
    for path in files {
        let errors = match fs::read_to_string(&path) {
            Ok(content) => validate_agent_json(&content),
            Err(e) => vec![format!("could not read file: {e}")],
        };
        if errors.is_empty() {
            tracing::debug!("valid {}", path.display());
            report.valid += 1;
        } else {
            tracing::warn!("invalid {}: {}", path.display(), errors.join("; "));
            report.invalid.push(FileValidation { path, errors });
        }
    }
    Ok(report)
}
