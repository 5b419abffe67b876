//! Pure composition of parsing output and inference into an [`OutputRecord`].

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConvertError, Result};
use crate::inference::{
    Category, InferenceTables, WILDCARD, classify, detect_integrations, infer_permissions,
};
use crate::model::{IntegrationMap, OutputRecord, SourceRecord};

pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Body paragraphs at or above this length are not used as a description.
const BODY_DESCRIPTION_MAX_CHARS: usize = 200;

pub(crate) fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

static AT_MENTION: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?:^|[\s(\[,])@([A-Za-z][A-Za-z0-9_-]*)"));
static USE_TOOL_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r"(?i)\buse\s+(?:the\s+)?`([A-Za-z][A-Za-z0-9_-]*)`\s+tool\b")
});

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Fill an empty description from the first short body paragraph.
    pub describe_from_body: bool,
    pub default_temperature: f64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            describe_from_body: false,
            default_temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// A converted record plus its primary category (index grouping).
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub record: OutputRecord,
    pub category: Category,
}

pub fn convert_record(
    source: &SourceRecord,
    tables: &InferenceTables,
    opts: &ConvertOptions,
) -> Result<Converted> {
    if source.identifier.trim().is_empty() {
        return Err(ConvertError::ConversionFailed {
            identifier: source.identifier.clone(),
            reason: "empty identifier".to_string(),
        });
    }

    let description = match source.description() {
        "" if opts.describe_from_body => description_from_body(&source.body).unwrap_or_default(),
        d => d.to_string(),
    };
    let raw_text = format!("{description}\n{}", source.body);

    let classification = classify(&source.identifier, &description, &source.body, tables);
    let permissions = infer_permissions(&classification, &raw_text, tables);
    let declared_tools = declared_tools(source, tables);

    let allowed_tools: Vec<String> = if declared_tools.iter().any(|t| t == WILDCARD) {
        permissions.allowed_tools
    } else {
        permissions
            .allowed_tools
            .into_iter()
            .filter(|t| is_declared(t, &declared_tools))
            .collect()
    };
    let tool_settings = permissions
        .tool_settings
        .into_iter()
        .filter(|(tool, _)| allowed_tools.contains(tool))
        .collect();

    let mut integrations = IntegrationMap::default();
    for (name, spec) in &source.header.mcp_servers {
        integrations.insert_if_absent(name.clone(), spec.clone());
    }
    let detected = detect_integrations(&raw_text, tables);
    for name in detected.names() {
        if let Some(spec) = detected.get(name) {
            if !integrations.insert_if_absent(name.to_string(), spec.clone()) {
                tracing::debug!(
                    identifier = %source.identifier,
                    integration = name,
                    "header mcpServers entry overrides detected integration"
                );
            }
        }
    }

    let record = OutputRecord {
        name: source.identifier.clone(),
        description,
        model: source.header.model.clone(),
        temperature: source
            .header
            .temperature
            .unwrap_or(opts.default_temperature),
        prompt: source.body.trim().to_string(),
        declared_tools,
        allowed_tools,
        tool_settings,
        integrations,
        resources: source.header.resources.to_items().unwrap_or_default(),
    };
    tracing::debug!(
        identifier = %record.name,
        category = %classification.primary(),
        tools = record.allowed_tools.len(),
        integrations = record.integrations.len(),
        "converted"
    );
    Ok(Converted {
        record,
        category: classification.primary(),
    })
}

/// Header tools (canonicalized, default `*`) followed by sorted `@name`
/// capability tags for tools mentioned in the body.
fn declared_tools(source: &SourceRecord, tables: &InferenceTables) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let header = source
        .header
        .tools
        .to_tokens()
        .unwrap_or_else(|| vec![WILDCARD.to_string()]);
    for tool in header {
        let canon = tables.canonical_tool(&tool);
        if !out.contains(&canon) {
            out.push(canon);
        }
    }
    for tag in extract_tool_mentions(&source.body) {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// `@name` mentions and ``use `name` tool`` phrases, as sorted `@name` tags.
pub fn extract_tool_mentions(body: &str) -> Vec<String> {
    let mut found: BTreeSet<String> = BTreeSet::new();
    for re in [&*AT_MENTION, &*USE_TOOL_PHRASE] {
        for caps in re.captures_iter(body) {
            if let Some(m) = caps.get(1) {
                found.insert(format!("@{}", m.as_str()));
            }
        }
    }
    found.into_iter().collect()
}

fn is_declared(tool: &str, declared: &[String]) -> bool {
    if declared.iter().any(|d| d == tool) {
        return true;
    }
    match tool.strip_suffix("/*") {
        Some(service) => declared.iter().any(|d| d == service),
        None => false,
    }
}

fn description_from_body(body: &str) -> Option<String> {
    let first = body.trim().split("\n\n").next()?;
    let cleaned = first.trim().trim_matches('#').trim();
    if cleaned.is_empty() || cleaned.chars().count() >= BODY_DESCRIPTION_MAX_CHARS {
        return None;
    }
    Some(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LaunchSpec, ListField};
    use crate::parser::{DefinitionParser, agent_md::AgentMarkdownParser};

    fn parse(identifier: &str, content: &str) -> SourceRecord {
        AgentMarkdownParser::parse(identifier, content).expect("parse")
    }

    fn convert(source: &SourceRecord) -> Converted {
        convert_record(source, &InferenceTables::default(), &ConvertOptions::default())
            .expect("convert")
    }

    #[test]
    fn infrastructure_agent_end_to_end() {
        let src = parse(
            "k8s-helper",
            "---\ndescription: Manage kubernetes clusters and terraform state\n---\nHelp with infra.\n",
        );
        let out = convert(&src);
        assert_eq!(out.category, Category::Infrastructure);
        let r = &out.record;
        assert_eq!(r.name, "k8s-helper");
        assert_eq!(r.model, None);
        assert_eq!(r.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(r.prompt, "Help with infra.");
        assert_eq!(r.declared_tools, vec!["*"]);
        assert!(r.allowed_tools.contains(&"@kubernetes/*".to_string()));
        assert!(r.tool_settings["shell"]
            .denied_commands
            .contains(&"terraform apply*".to_string()));
        assert!(r.integrations.contains("kubernetes"));
        assert!(r.resources.is_empty());
    }

    #[test]
    fn body_mention_of_terraform_apply_yields_deny_rule() {
        let src = parse(
            "cluster-ops",
            "---\ndescription: Kubernetes infrastructure specialist for cloud deployments\n---\nNever run terraform apply without review.\n",
        );
        let out = convert(&src);
        assert_eq!(out.category, Category::Infrastructure);
        let r = &out.record;
        let shell = &r.tool_settings["shell"];
        assert!(shell.denied_commands.contains(&"terraform apply*".to_string()));
        for t in ["read", "write", "shell", "@kubernetes/*"] {
            assert!(r.allowed_tools.contains(&t.to_string()), "missing {t}");
        }
        let names: Vec<&str> = r.integrations.names().collect();
        assert_eq!(names, vec!["kubernetes"]);
    }

    #[test]
    fn missing_header_gives_general_defaults() {
        let src = parse("helper", "Just a plain prompt.\n");
        let r = convert(&src).record;
        assert_eq!(r.description, "");
        assert_eq!(r.allowed_tools, vec!["list_dir", "read"]);
        assert!(r.tool_settings.is_empty());
        assert!(r.integrations.is_empty());
    }

    #[test]
    fn explicit_tool_list_restricts_allowed_tools() {
        let src = parse(
            "builder",
            "---\ndescription: Backend developer\ntools: Read, Grep\n---\nbody\n",
        );
        let r = convert(&src).record;
        assert_eq!(r.declared_tools, vec!["read", "grep"]);
        assert_eq!(r.allowed_tools, vec!["grep", "read"]);
        assert!(!r.tool_settings.contains_key("shell"));
        assert!(!r.tool_settings.contains_key("write"));
    }

    #[test]
    fn empty_tool_list_grants_nothing() {
        let src = parse(
            "k8s-helper",
            "---\ndescription: Manage kubernetes clusters\ntools: []\n---\nPing @jira when done.\n",
        );
        let r = convert(&src).record;
        assert_eq!(r.declared_tools, vec!["@jira"]);
        assert!(r.allowed_tools.is_empty());
        assert!(r.tool_settings.is_empty());
        assert!(r.integrations.contains("kubernetes"));
    }

    #[test]
    fn declared_service_tag_covers_its_wildcard() {
        assert!(is_declared("@aws/*", &["@aws".to_string()]));
        assert!(is_declared("@aws/*", &["@aws/*".to_string()]));
        assert!(!is_declared("@aws/*", &["read".to_string()]));
    }

    #[test]
    fn header_mcp_servers_come_first_and_win() {
        let mut src = parse("notifier", "Posts to slack and github.\n");
        src.header.mcp_servers.insert(
            "slack".into(),
            LaunchSpec {
                command: "slack-mcp".into(),
                args: vec![],
                env: Default::default(),
            },
        );
        let r = convert(&src).record;
        let names: Vec<&str> = r.integrations.names().collect();
        assert_eq!(names, vec!["slack", "github"]);
        assert_eq!(r.integrations.get("slack").unwrap().command, "slack-mcp");
    }

    #[test]
    fn mentions_become_capability_tags() {
        let body = "Ping @jira when done. Use the `linear` tool for tickets. mail me@example.com";
        assert_eq!(extract_tool_mentions(body), vec!["@jira", "@linear"]);

        let src = parse("helper", body);
        assert_eq!(convert(&src).record.declared_tools, vec!["*", "@jira", "@linear"]);
    }

    #[test]
    fn resources_and_model_pass_through() {
        let mut src = parse("helper", "---\nmodel: opus\ntemperature: 0.2\n---\nx");
        src.header.resources = ListField::Single("file://README.md, file://docs/a b.md".into());
        let r = convert(&src).record;
        assert_eq!(r.model.as_deref(), Some("opus"));
        assert_eq!(r.temperature, 0.2);
        assert_eq!(r.resources, vec!["file://README.md", "file://docs/a b.md"]);
    }

    #[test]
    fn describe_from_body_uses_first_short_paragraph() {
        let src = parse("helper", "# Friendly helper #\n\nLong text follows.");
        let opts = ConvertOptions {
            describe_from_body: true,
            ..ConvertOptions::default()
        };
        let r = convert_record(&src, &InferenceTables::default(), &opts).unwrap();
        assert_eq!(r.record.description, "Friendly helper");

        let long = format!("{}\n\nrest", "x".repeat(250));
        assert_eq!(description_from_body(&long), None);
        assert_eq!(convert(&src).record.description, "");
    }

    #[test]
    fn empty_identifier_fails() {
        let src = parse("", "body");
        let err = convert_record(&src, &InferenceTables::default(), &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::ConversionFailed { .. }));
    }

    #[test]
    fn records_differing_only_in_identifier_differ_only_in_name() {
        let content = "---\ndescription: Kubernetes operator with aws access\n---\nBody text.";
        let a = convert(&parse("alpha", content)).record;
        let mut b = convert(&parse("omega", content)).record;
        assert_ne!(a, b);
        b.name = a.name.clone();
        assert_eq!(a, b);
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;
    use crate::model::Frontmatter;

    fn source(identifier: &str, description: &str, body: &str) -> SourceRecord {
        SourceRecord {
            identifier: identifier.to_string(),
            header: Frontmatter {
                description: Some(description.to_string()),
                ..Frontmatter::default()
            },
            body: body.to_string(),
        }
    }

    proptest! {
        #[test]
        fn classification_is_never_empty(desc in ".{0,80}", body in ".{0,200}") {
            let tables = InferenceTables::default();
            let c = classify("agent", &desc, &body, &tables);
            prop_assert!(!c.categories().is_empty());
            prop_assert!(c.categories().iter().all(|cat| Category::ALL.contains(cat)));
            prop_assert!(c.categories().windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn allowed_tools_stay_inside_the_universe(
            desc in "(aws|k8s|scan|review|terraform|design|[a-z ]){0,40}",
            body in ".{0,120}",
        ) {
            let tables = InferenceTables::default();
            let universe = tables.known_tools();
            let out = convert_record(&source("agent", &desc, &body), &tables, &ConvertOptions::default())
                .expect("convert");
            prop_assert!(out.record.allowed_tools.iter().all(|t| universe.contains(t)));
            prop_assert!(out.record.tool_settings.keys().all(|k| out.record.allowed_tools.contains(k)));
        }

        #[test]
        fn conversion_is_deterministic(desc in ".{0,60}", body in ".{0,300}") {
            let tables = InferenceTables::default();
            let opts = ConvertOptions::default();
            let src = source("agent", &desc, &body);
            let a = convert_record(&src, &tables, &opts).expect("convert");
            let b = convert_record(&src, &tables, &opts).expect("convert");
            prop_assert_eq!(a.record.to_json().expect("json"), b.record.to_json().expect("json"));
        }
    }
}
