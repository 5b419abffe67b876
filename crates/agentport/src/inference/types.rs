use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{LaunchSpec, ToolSettings};

/// Tool id meaning "every tool" in a declared tool list.
pub const WILDCARD: &str = "*";
pub const SHELL_TOOL: &str = "shell";
pub const WRITE_TOOL: &str = "write";

/// Closed set of category labels. Declaration order is the default priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Infrastructure,
    Architecture,
    Quality,
    Development,
    General,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Security,
        Category::Infrastructure,
        Category::Architecture,
        Category::Quality,
        Category::Development,
        Category::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Security => "security",
            Category::Infrastructure => "infrastructure",
            Category::Architecture => "architecture",
            Category::Quality => "quality",
            Category::Development => "development",
            Category::General => "general",
        }
    }

    /// Heading used in the agents index.
    pub fn label(self) -> &'static str {
        match self {
            Category::Security => "Security",
            Category::Infrastructure => "Infrastructure",
            Category::Architecture => "Architecture",
            Category::Quality => "Quality Assurance",
            Category::Development => "Development",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords that assign a category when found in an agent's text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Base tools and shell/write restrictions granted by one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPolicy {
    pub category: Category,
    pub tools: Vec<String>,
    #[serde(default)]
    pub allowed_commands: Vec<String>,
    #[serde(default)]
    pub denied_commands: Vec<String>,
    #[serde(default)]
    pub allowed_paths: Vec<String>,
}

impl CategoryPolicy {
    /// Command restrictions attached to `shell`.
    pub fn shell_settings(&self) -> ToolSettings {
        ToolSettings {
            allowed_commands: self.allowed_commands.clone(),
            denied_commands: self.denied_commands.clone(),
            allowed_paths: Vec::new(),
        }
    }

    /// Path restrictions attached to `write`.
    pub fn write_settings(&self) -> ToolSettings {
        ToolSettings {
            allowed_paths: self.allowed_paths.clone(),
            ..ToolSettings::default()
        }
    }
}

/// Grants an integration wildcard when a keyword appears and one of the gating
/// categories was assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadeningRule {
    pub keywords: Vec<String>,
    pub categories: Vec<Category>,
    pub grant: String,
}

/// Keyword → MCP server launch details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl IntegrationRule {
    pub fn launch_spec(&self) -> LaunchSpec {
        LaunchSpec {
            command: self.command.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
        }
    }

    /// Wildcard tool id covering every tool this integration exposes.
    pub fn tool_wildcard(&self) -> String {
        format!("@{}/*", self.name)
    }
}

/// Everything inference looks up. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceTables {
    /// Max characters of body text the classifier scans.
    pub classifier_body_prefix: usize,
    pub builtin_tools: Vec<String>,
    /// Granted to categories without a policy entry.
    pub minimal_tools: Vec<String>,
    /// Source tool names (`Read`, `Bash`, ...) → builtin tool ids.
    pub tool_aliases: BTreeMap<String, String>,
    /// Priority order: earlier rules win when keyword sets overlap.
    pub categories: Vec<CategoryRule>,
    pub policies: Vec<CategoryPolicy>,
    pub broadening: Vec<BroadeningRule>,
    /// Fixed order; detected integrations are emitted in this order.
    pub integrations: Vec<IntegrationRule>,
}

impl Default for InferenceTables {
    fn default() -> Self {
        super::default::default_tables()
    }
}

impl InferenceTables {
    pub fn policy_for(&self, category: Category) -> Option<&CategoryPolicy> {
        self.policies.iter().find(|p| p.category == category)
    }

    /// The closed universe of tool ids inference may emit.
    pub fn known_tools(&self) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = self.builtin_tools.iter().cloned().collect();
        out.extend(self.broadening.iter().map(|r| r.grant.clone()));
        out.extend(self.integrations.iter().map(IntegrationRule::tool_wildcard));
        out
    }

    /// Map a declared tool name onto its builtin id when an alias or a
    /// case-insensitive builtin match exists; otherwise keep it as written.
    pub fn canonical_tool(&self, tool: &str) -> String {
        if let Some(canon) = self.tool_aliases.get(tool) {
            return canon.clone();
        }
        let lower = tool.to_ascii_lowercase();
        if self.builtin_tools.contains(&lower) {
            return lower;
        }
        tool.to_string()
    }
}
