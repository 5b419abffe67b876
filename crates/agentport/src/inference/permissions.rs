use std::collections::{BTreeMap, BTreeSet};

use globset::Glob;

use super::classify::Classification;
use super::types::{InferenceTables, SHELL_TOOL, WRITE_TOOL};
use crate::model::ToolSettings;

/// Inferred tool grants for one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    /// Sorted, de-duplicated, every entry inside the known-tool universe.
    pub allowed_tools: Vec<String>,
    pub tool_settings: BTreeMap<String, ToolSettings>,
}

impl Permissions {
    pub fn allows(&self, tool: &str) -> bool {
        self.allowed_tools.iter().any(|t| t == tool)
    }

    /// True when a shell deny pattern matches `command`.
    pub fn denies(&self, command: &str) -> bool {
        self.tool_settings.get(SHELL_TOOL).is_some_and(|s| {
            s.denied_commands
                .iter()
                .any(|p| CommandPattern::new(p).matches(command))
        })
    }

    /// True when shell is allowed, an allow pattern matches and no deny pattern does.
    pub fn permits(&self, command: &str) -> bool {
        if !self.allows(SHELL_TOOL) || self.denies(command) {
            return false;
        }
        self.tool_settings.get(SHELL_TOOL).is_some_and(|s| {
            s.allowed_commands
                .iter()
                .any(|p| CommandPattern::new(p).matches(command))
        })
    }
}

/// Glob-style command pattern: `*` matches any run of characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPattern<'a>(&'a str);

impl<'a> CommandPattern<'a> {
    pub fn new(pattern: &'a str) -> Self {
        Self(pattern)
    }

    pub fn matches(&self, command: &str) -> bool {
        match Glob::new(self.0) {
            Ok(glob) => glob.compile_matcher().is_match(command.trim()),
            Err(e) => {
                tracing::warn!(pattern = self.0, error = %e, "invalid command pattern");
                false
            }
        }
    }
}

/// Derive `allowedTools` and `toolSettings` from the assigned categories and
/// the agent's raw text.
pub fn infer_permissions(
    classification: &Classification,
    raw_text: &str,
    tables: &InferenceTables,
) -> Permissions {
    let mut tools: BTreeSet<String> = BTreeSet::new();
    let mut shell = ToolSettings::default();
    let mut write = ToolSettings::default();

    for &category in classification.categories() {
        match tables.policy_for(category) {
            Some(policy) => {
                tools.extend(policy.tools.iter().cloned());
                shell.merge(&policy.shell_settings());
                write.merge(&policy.write_settings());
            }
            None => tools.extend(tables.minimal_tools.iter().cloned()),
        }
    }

    let lowered = raw_text.to_lowercase();
    for rule in &tables.broadening {
        let gated = rule.categories.iter().any(|c| classification.contains(*c));
        if gated
            && rule
                .keywords
                .iter()
                .any(|k| !k.is_empty() && lowered.contains(&k.to_lowercase()))
        {
            tools.insert(rule.grant.clone());
        }
    }

    let universe = tables.known_tools();
    tools.retain(|t| {
        let known = universe.contains(t);
        if !known {
            tracing::debug!(tool = %t, "dropping tool outside the known universe");
        }
        known
    });

    let mut tool_settings = BTreeMap::new();
    if tools.contains(SHELL_TOOL) {
        shell.normalize();
        if !shell.is_empty() {
            tool_settings.insert(SHELL_TOOL.to_string(), shell);
        }
    }
    if tools.contains(WRITE_TOOL) {
        write.normalize();
        if !write.is_empty() {
            tool_settings.insert(WRITE_TOOL.to_string(), write);
        }
    }

    Permissions {
        allowed_tools: tools.into_iter().collect(),
        tool_settings,
    }
}
