//! Definition parsers for Markdown documents with YAML frontmatter.
//!
//! Each parser declares a `supports` predicate over file paths and a `parse`
//! function producing its normalized record. The shared frontmatter split is
//! strict about the delimiters and never recovers a partial header.

use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::model::Frontmatter;

pub mod agent_md;
pub mod skill_md;

/// Parser trait implemented by each input format.
pub trait DefinitionParser {
    type Output;

    fn supports(path: &Path) -> bool;
    fn parse(identifier: &str, content: &str) -> Result<Self::Output>;
}

/// Outcome of looking for a `---` delimited block at the top of a document.
#[derive(Debug, PartialEq, Eq)]
pub enum Split<'a> {
    /// First line is not a delimiter; the whole text is body.
    NoHeader,
    Header { yaml: &'a str, body: &'a str },
    /// Opening delimiter without a closing one.
    Unterminated,
}

/// Locate the frontmatter block. The body slice is verbatim, starting right
/// after the closing delimiter line.
pub fn split_frontmatter(content: &str) -> Split<'_> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Split::NoHeader;
    };
    if first.trim_end() != "---" {
        return Split::NoHeader;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == "---" {
            return Split::Header {
                yaml: &content[yaml_start..offset],
                body: &content[offset + line.len()..],
            };
        }
        offset += line.len();
    }
    Split::Unterminated
}

/// Split and parse a document into `(header, body)`.
///
/// A missing block yields an empty header and the full text as body. A block
/// that is present but unparseable fails with `MalformedHeader`.
pub fn parse_document<'a>(identifier: &str, content: &'a str) -> Result<(Frontmatter, &'a str)> {
    match split_frontmatter(content) {
        Split::NoHeader => Ok((Frontmatter::default(), content)),
        Split::Unterminated => Err(ConvertError::UnterminatedHeader {
            identifier: identifier.to_string(),
        }),
        Split::Header { yaml, body } => {
            if yaml.trim().is_empty() {
                return Ok((Frontmatter::default(), body));
            }
            let header = serde_yaml::from_str::<Frontmatter>(yaml).map_err(|source| {
                ConvertError::MalformedHeader {
                    identifier: identifier.to_string(),
                    source,
                }
            })?;
            Ok((header, body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_finds_block_and_keeps_body_verbatim() {
        let doc = "---\ndescription: x\n---\n\n# Title\n  indented\n";
        match split_frontmatter(doc) {
            Split::Header { yaml, body } => {
                assert_eq!(yaml, "description: x\n");
                assert_eq!(body, "\n# Title\n  indented\n");
            }
            other => panic!("unexpected split: {other:?}"),
        }
    }

    #[test]
    fn split_tolerates_crlf_and_trailing_spaces_on_delimiters() {
        let doc = "--- \r\nmodel: opus\r\n---\r\nbody";
        assert_eq!(
            split_frontmatter(doc),
            Split::Header {
                yaml: "model: opus\r\n",
                body: "body"
            }
        );
    }

    #[test]
    fn no_delimiter_means_whole_text_is_body() {
        let doc = "# Plain\n---\nnot a header\n";
        assert_eq!(split_frontmatter(doc), Split::NoHeader);
        let (header, body) = parse_document("plain", doc).expect("parse ok");
        assert!(header.description.is_none());
        assert_eq!(body, doc);
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = parse_document("open", "---\ndescription: x\nbody").unwrap_err();
        assert!(matches!(err, ConvertError::UnterminatedHeader { ref identifier } if identifier == "open"));
    }

    #[test]
    fn invalid_yaml_is_malformed_header() {
        let err = parse_document("broken", "---\ndescription: [unclosed\n---\nbody").unwrap_err();
        match err {
            ConvertError::MalformedHeader { identifier, .. } => assert_eq!(identifier, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrongly_typed_known_field_is_malformed_header() {
        let err = parse_document("hot", "---\ntemperature: very\n---\nbody").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedHeader { .. }));
    }

    #[test]
    fn empty_block_is_empty_header() {
        let (header, body) = parse_document("empty", "---\n---\nbody\n").expect("parse ok");
        assert!(header.extra.is_empty());
        assert_eq!(body, "body\n");
    }
}
