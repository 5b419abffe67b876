use std::collections::BTreeMap;

use super::report::ConvertedEntry;
use crate::inference::Category;

/// Render the Markdown agents index for one batch: a section per non-empty
/// category in priority order, entries sorted by name.
pub fn render_index(entries: &[ConvertedEntry]) -> String {
    let mut groups: BTreeMap<Category, Vec<(&str, &str)>> = BTreeMap::new();
    for e in entries {
        let summary = e.record.description.lines().next().unwrap_or("").trim();
        groups
            .entry(e.category)
            .or_default()
            .push((e.record.name.as_str(), summary));
    }

    let mut out = String::from("# Available Agents\n\n");
    out.push_str(&format!("Total agents: {}\n", entries.len()));
    for (category, mut items) in groups {
        items.sort();
        out.push_str(&format!("\n## {}\n\n", category.label()));
        for (name, summary) in items {
            if summary.is_empty() {
                out.push_str(&format!("- **{name}**\n"));
            } else {
                out.push_str(&format!("- **{name}**: {summary}\n"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::model::{IntegrationMap, OutputRecord};

    fn entry(name: &str, description: &str, category: Category) -> ConvertedEntry {
        ConvertedEntry {
            record: OutputRecord {
                name: name.into(),
                description: description.into(),
                model: None,
                temperature: 0.7,
                prompt: String::new(),
                declared_tools: vec!["*".into()],
                allowed_tools: vec![],
                tool_settings: BTreeMap::new(),
                integrations: IntegrationMap::default(),
                resources: vec![],
            },
            category,
            target: PathBuf::from(format!("{name}.json")),
        }
    }

    #[test]
    fn groups_in_priority_order_with_sorted_names() {
        let entries = vec![
            entry("zeta", "Writes tests\nsecond line", Category::Quality),
            entry("k8s", "Cluster ops", Category::Infrastructure),
            entry("alpha", "", Category::Quality),
        ];
        let md = render_index(&entries);
        assert_eq!(
            md,
            "# Available Agents\n\nTotal agents: 3\n\n## Infrastructure\n\n- **k8s**: Cluster ops\n\n## Quality Assurance\n\n- **alpha**\n- **zeta**: Writes tests\n"
        );
    }

    #[test]
    fn empty_batch_has_header_only() {
        assert_eq!(render_index(&[]), "# Available Agents\n\nTotal agents: 0\n");
    }
}
