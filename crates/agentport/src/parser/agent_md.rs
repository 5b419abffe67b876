//! Parser for Claude Code agent definitions (`<name>.md` with YAML frontmatter).

use std::path::Path;

use crate::error::Result;
use crate::model::SourceRecord;

use super::{DefinitionParser, parse_document};

pub struct AgentMarkdownParser;

impl DefinitionParser for AgentMarkdownParser {
    type Output = SourceRecord;

    fn supports(path: &Path) -> bool {
        let Some(fname) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };
        if fname.starts_with('.') {
            return false;
        }
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("md"))
            .unwrap_or(false)
    }

    fn parse(identifier: &str, content: &str) -> Result<SourceRecord> {
        let (header, body) = parse_document(identifier, content)?;
        Ok(SourceRecord {
            identifier: identifier.to_string(),
            header,
            body: body.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_markdown_but_not_hidden_or_other_files() {
        assert!(AgentMarkdownParser::supports(Path::new("/a/agents/x.md")));
        assert!(AgentMarkdownParser::supports(Path::new("/a/agents/X.MD")));
        assert!(!AgentMarkdownParser::supports(Path::new("/a/agents/.draft.md")));
        assert!(!AgentMarkdownParser::supports(Path::new("/a/agents/x.json")));
    }

    #[test]
    fn parse_maps_header_fields() {
        let content = r#"---
name: backend-architect
description: Designs backend systems
model: opus
temperature: 0.3
tools: Read, Grep, Glob
---
You are a backend architect.
"#;
        let rec = AgentMarkdownParser::parse("backend-architect", content).expect("parse ok");
        assert_eq!(rec.identifier, "backend-architect");
        assert_eq!(rec.description(), "Designs backend systems");
        assert_eq!(rec.header.model.as_deref(), Some("opus"));
        assert_eq!(rec.header.temperature, Some(0.3));
        assert_eq!(
            rec.header.tools.to_tokens(),
            Some(vec!["Read".to_string(), "Grep".into(), "Glob".into()])
        );
        assert_eq!(rec.body, "You are a backend architect.\n");
    }

    #[test]
    fn parse_without_header_keeps_whole_text() {
        let content = "Just a prompt.\n";
        let rec = AgentMarkdownParser::parse("plain", content).expect("parse ok");
        assert_eq!(rec.description(), "");
        assert_eq!(rec.body, content);
    }
}
