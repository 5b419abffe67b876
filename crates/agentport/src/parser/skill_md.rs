//! Parser for Anthropic skill definitions (`SKILL.md` inside a skill directory).

use std::path::Path;

use crate::error::Result;

use super::{DefinitionParser, parse_document};

/// A parsed skill: header name/description plus its instructions.
#[derive(Debug, Clone)]
pub struct SkillDocument {
    pub name: Option<String>,
    pub description: Option<String>,
    pub body: String,
}

pub struct SkillMarkdownParser;

impl DefinitionParser for SkillMarkdownParser {
    type Output = SkillDocument;

    fn supports(path: &Path) -> bool {
        path.file_name().and_then(|s| s.to_str()) == Some("SKILL.md")
    }

    fn parse(identifier: &str, content: &str) -> Result<SkillDocument> {
        let (header, body) = parse_document(identifier, content)?;
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Ok(SkillDocument {
            name: clean(header.name),
            description: clean(header.description),
            body: body.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_only_skill_md() {
        assert!(SkillMarkdownParser::supports(Path::new("/s/stripe/SKILL.md")));
        assert!(!SkillMarkdownParser::supports(Path::new("/s/stripe/README.md")));
    }

    #[test]
    fn parse_trims_body_and_blank_fields() {
        let content = "---\nname: stripe-integration\ndescription: \"  \"\n---\n\n# Stripe\n\nSteps.\n";
        let doc = SkillMarkdownParser::parse("stripe", content).expect("parse ok");
        assert_eq!(doc.name.as_deref(), Some("stripe-integration"));
        assert!(doc.description.is_none());
        assert_eq!(doc.body, "# Stripe\n\nSteps.");
    }
}
