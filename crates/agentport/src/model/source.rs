//! Parsed input definitions prior to conversion.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::output::LaunchSpec;

/// Typed view of a definition's YAML frontmatter.
///
/// Only the fields conversion cares about are typed; everything else lands in
/// `extra` and is carried along untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frontmatter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub tools: ListField,
    #[serde(default)]
    pub mcp_servers: BTreeMap<String, LaunchSpec>,
    #[serde(default)]
    pub resources: ListField,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A header value written either as a YAML list or as a delimited string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    List(Vec<String>),
    Single(String),
    #[default]
    Empty,
}

impl ListField {
    /// Split on commas and whitespace (tool lists: `Read, Grep Glob`).
    /// An explicit YAML list is a declaration even when it is empty.
    pub fn to_tokens(&self) -> Option<Vec<String>> {
        match self {
            ListField::List(v) => Some(
                v.iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
            ),
            ListField::Single(s) => non_empty(
                s.split(|c: char| c == ',' || c.is_whitespace())
                    .map(|t| t.trim().to_string())
                    .collect(),
            ),
            ListField::Empty => None,
        }
    }

    /// Split on commas only, so items may contain spaces (resource locators).
    pub fn to_items(&self) -> Option<Vec<String>> {
        match self {
            ListField::List(v) => non_empty(v.iter().map(|t| t.trim().to_string()).collect()),
            ListField::Single(s) => non_empty(s.split(',').map(|t| t.trim().to_string()).collect()),
            ListField::Empty => None,
        }
    }
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    let v: Vec<String> = items.into_iter().filter(|t| !t.is_empty()).collect();
    if v.is_empty() { None } else { Some(v) }
}

/// One input definition: normalized identifier, parsed header, verbatim body.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub identifier: String,
    pub header: Frontmatter,
    pub body: String,
}

impl SourceRecord {
    /// Description from the header, or `""` when absent.
    pub fn description(&self) -> &str {
        self.header.description.as_deref().unwrap_or("")
    }
}
