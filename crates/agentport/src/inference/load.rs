use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::default::default_tables;
use super::types::{BroadeningRule, CategoryPolicy, CategoryRule, InferenceTables, IntegrationRule};
use crate::error::{ConvertError, Result};

/// On-disk overlay. Every field is optional; absent fields keep the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTables {
    classifier_body_prefix: Option<usize>,
    builtin_tools: Option<Vec<String>>,
    minimal_tools: Option<Vec<String>>,
    tool_aliases: Option<BTreeMap<String, String>>,
    #[serde(default)]
    categories: Vec<CategoryRule>,
    #[serde(default)]
    policies: Vec<CategoryPolicy>,
    broadening: Option<Vec<BroadeningRule>>,
    integrations: Option<Vec<IntegrationRule>>,
}

pub fn from_toml_str(s: &str) -> Result<InferenceTables> {
    let raw: RawTables = toml::from_str(s)?;
    Ok(overlay(default_tables(), raw))
}

pub fn load_from_file(path: &Path) -> Result<InferenceTables> {
    let content = std::fs::read_to_string(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_toml_str(&content)
}

pub fn load_default() -> InferenceTables {
    default_tables()
}

fn overlay(mut tables: InferenceTables, raw: RawTables) -> InferenceTables {
    if let Some(n) = raw.classifier_body_prefix {
        tables.classifier_body_prefix = n;
    }
    if let Some(v) = raw.builtin_tools {
        tables.builtin_tools = v;
    }
    if let Some(v) = raw.minimal_tools {
        tables.minimal_tools = v;
    }
    if let Some(m) = raw.tool_aliases {
        tables.tool_aliases.extend(m);
    }
    // Category rules and policies replace the entry for the same category in
    // place so the priority order of the defaults survives.
    for rule in raw.categories {
        match tables.categories.iter_mut().find(|r| r.category == rule.category) {
            Some(slot) => *slot = rule,
            None => tables.categories.push(rule),
        }
    }
    for policy in raw.policies {
        match tables.policies.iter_mut().find(|p| p.category == policy.category) {
            Some(slot) => *slot = policy,
            None => tables.policies.push(policy),
        }
    }
    if let Some(v) = raw.broadening {
        tables.broadening = v;
    }
    if let Some(v) = raw.integrations {
        tables.integrations = v;
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Category;

    #[test]
    fn overlay_replaces_named_category_and_keeps_the_rest() {
        let toml = r#"
classifier_body_prefix = 500

[tool_aliases]
WebSearch = "introspect"

[[categories]]
category = "quality"
keywords = ["lint"]

[[policies]]
category = "general"
tools = ["read"]
"#;
        let t = from_toml_str(toml).expect("parse ok");
        assert_eq!(t.classifier_body_prefix, 500);
        assert_eq!(t.canonical_tool("WebSearch"), "introspect");
        assert_eq!(t.canonical_tool("Bash"), "shell");

        let quality = t
            .categories
            .iter()
            .find(|r| r.category == Category::Quality)
            .unwrap();
        assert_eq!(quality.keywords, vec!["lint"]);
        assert_eq!(t.categories[0].category, Category::Security);
        assert_eq!(t.policy_for(Category::General).unwrap().tools, vec!["read"]);
        assert_eq!(t.integrations.len(), load_default().integrations.len());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = from_toml_str("colour = true").unwrap_err();
        assert!(matches!(err, ConvertError::Tables(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConvertError::Read { .. }));
    }
}
