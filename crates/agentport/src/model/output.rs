//! Converted agent records as written to `<output>/<name>.json`.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// How to launch one MCP server integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Restrictions attached to one allowed tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub denied_commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_paths: Vec<String>,
}

impl ToolSettings {
    pub fn is_empty(&self) -> bool {
        self.allowed_commands.is_empty()
            && self.denied_commands.is_empty()
            && self.allowed_paths.is_empty()
    }

    /// Sort and de-duplicate every list so output does not depend on merge order.
    pub fn normalize(&mut self) {
        for list in [
            &mut self.allowed_commands,
            &mut self.denied_commands,
            &mut self.allowed_paths,
        ] {
            list.sort();
            list.dedup();
        }
    }

    pub fn merge(&mut self, other: &ToolSettings) {
        self.allowed_commands
            .extend(other.allowed_commands.iter().cloned());
        self.denied_commands
            .extend(other.denied_commands.iter().cloned());
        self.allowed_paths.extend(other.allowed_paths.iter().cloned());
    }
}

/// Integration name → launch spec, serialized in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrationMap {
    entries: Vec<(String, LaunchSpec)>,
}

impl IntegrationMap {
    /// Insert unless the name is already present; returns whether it was added.
    pub fn insert_if_absent(&mut self, name: String, spec: LaunchSpec) -> bool {
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, spec));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn get(&self, name: &str) -> Option<&LaunchSpec> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for IntegrationMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, spec) in &self.entries {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

/// One converted agent definition. Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub temperature: f64,
    pub prompt: String,
    pub declared_tools: Vec<String>,
    pub allowed_tools: Vec<String>,
    pub tool_settings: BTreeMap<String, ToolSettings>,
    pub integrations: IntegrationMap,
    pub resources: Vec<String>,
}

impl OutputRecord {
    /// Pretty JSON with a trailing newline, as written to disk.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut s = serde_json::to_string_pretty(self)?;
        s.push('\n');
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(cmd: &str) -> LaunchSpec {
        LaunchSpec {
            command: cmd.into(),
            args: vec!["-y".into()],
            env: BTreeMap::new(),
        }
    }

    #[test]
    fn integration_map_keeps_insertion_order_when_serialized() {
        let mut m = IntegrationMap::default();
        assert!(m.insert_if_absent("slack".into(), spec("npx")));
        assert!(m.insert_if_absent("aws".into(), spec("npx")));
        assert!(!m.insert_if_absent("slack".into(), spec("other")));
        let json = serde_json::to_string(&m).expect("serialize");
        assert_eq!(
            json,
            r#"{"slack":{"command":"npx","args":["-y"]},"aws":{"command":"npx","args":["-y"]}}"#
        );
        assert_eq!(m.get("slack").map(|s| s.command.as_str()), Some("npx"));
    }

    #[test]
    fn merge_then_normalize_sorts_and_dedups() {
        let mut a = ToolSettings {
            denied_commands: vec!["sudo *".into(), "rm -rf *".into()],
            ..ToolSettings::default()
        };
        a.merge(&ToolSettings {
            denied_commands: vec!["rm -rf *".into()],
            allowed_paths: vec!["./**".into()],
            ..ToolSettings::default()
        });
        a.normalize();
        assert_eq!(a.denied_commands, vec!["rm -rf *", "sudo *"]);
        assert_eq!(a.allowed_paths, vec!["./**"]);
        assert!(a.allowed_commands.is_empty());
        assert!(!a.is_empty());
    }

    #[test]
    fn record_keys_follow_declared_order() {
        let record = OutputRecord {
            name: "n".into(),
            description: "d".into(),
            model: None,
            temperature: 0.7,
            prompt: "p".into(),
            declared_tools: vec!["*".into()],
            allowed_tools: vec!["read".into()],
            tool_settings: BTreeMap::new(),
            integrations: IntegrationMap::default(),
            resources: vec![],
        };
        let json = serde_json::to_string(&record).expect("serialize");
        assert_eq!(
            json,
            r#"{"name":"n","description":"d","temperature":0.7,"prompt":"p","declaredTools":["*"],"allowedTools":["read"],"toolSettings":{},"integrations":{},"resources":[]}"#
        );
    }
}
