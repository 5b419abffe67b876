use super::types::{Category, InferenceTables};

/// Categories assigned to one agent, in priority order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    categories: Vec<Category>,
}

impl Classification {
    /// The category used for grouping in the index.
    pub fn primary(&self) -> Category {
        self.categories.first().copied().unwrap_or(Category::General)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }
}

/// Assign categories by case-insensitive keyword match over the identifier,
/// description and a bounded prefix of the body.
pub fn classify(
    identifier: &str,
    description: &str,
    body: &str,
    tables: &InferenceTables,
) -> Classification {
    let haystack = format!(
        "{identifier} {description} {}",
        bounded_prefix(body, tables.classifier_body_prefix)
    )
    .to_lowercase();

    let mut categories: Vec<Category> = Vec::new();
    for rule in &tables.categories {
        if rule.category == Category::General || categories.contains(&rule.category) {
            continue;
        }
        if rule
            .keywords
            .iter()
            .any(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
        {
            categories.push(rule.category);
        }
    }
    if categories.is_empty() {
        categories.push(Category::General);
    }
    tracing::trace!(identifier, ?categories, "classified");
    Classification { categories }
}

/// At most `max_chars` characters of `text`, cut on a char boundary.
pub fn bounded_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> InferenceTables {
        InferenceTables::default()
    }

    #[test]
    fn kubernetes_terraform_agent_is_infrastructure() {
        let c = classify(
            "k8s-helper",
            "Manage kubernetes clusters and terraform state",
            "",
            &tables(),
        );
        assert_eq!(c.primary(), Category::Infrastructure);
    }

    #[test]
    fn nothing_matches_means_general() {
        let c = classify("poet", "Writes haiku", "Be gentle.", &tables());
        assert_eq!(c.categories(), &[Category::General]);
    }

    #[test]
    fn empty_description_and_body_is_general() {
        let c = classify("agent", "", "", &tables());
        assert_eq!(c.categories(), &[Category::General]);
        assert_eq!(c.primary(), Category::General);
    }

    #[test]
    fn overlapping_matches_follow_priority_order() {
        let c = classify(
            "secure-reviewer",
            "Code review with a security audit focus",
            "",
            &tables(),
        );
        assert_eq!(c.primary(), Category::Security);
        assert!(c.contains(Category::Quality));
        assert!(!c.contains(Category::General));
    }

    #[test]
    fn keywords_past_the_body_prefix_are_ignored() {
        let mut t = tables();
        t.classifier_body_prefix = 10;
        let body = format!("{}terraform", " ".repeat(50));
        let c = classify("x", "", &body, &t);
        assert_eq!(c.primary(), Category::General);
    }

    #[test]
    fn bounded_prefix_respects_char_boundaries() {
        assert_eq!(bounded_prefix("héllo", 2), "hé");
        assert_eq!(bounded_prefix("ab", 10), "ab");
        assert_eq!(bounded_prefix("", 3), "");
    }
}
