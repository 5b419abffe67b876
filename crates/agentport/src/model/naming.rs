//! Identifier normalization and per-batch de-duplication.

use std::collections::HashSet;

/// Convert a file stem or display name into a lowercase kebab-case identifier.
///
/// ASCII alphanumerics are kept (lowercased); every other run of characters
/// collapses to a single `-`. Leading and trailing separators are dropped, so
/// a stem made only of punctuation yields an empty identifier.
pub fn normalize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Make identifiers unique in place, keeping the first occurrence unchanged and
/// suffixing later ones with `-2`, `-3`, ... Empty identifiers are left alone so
/// conversion can reject them.
pub fn dedupe_identifiers(ids: &mut [String]) {
    let mut taken: HashSet<String> = ids.iter().filter(|s| !s.is_empty()).cloned().collect();
    let mut seen: HashSet<String> = HashSet::new();
    for id in ids.iter_mut() {
        if id.is_empty() {
            continue;
        }
        if seen.insert(id.clone()) {
            continue;
        }
        let mut n = 2;
        let mut candidate = format!("{id}-{n}");
        while taken.contains(&candidate) {
            n += 1;
            candidate = format!("{id}-{n}");
        }
        tracing::warn!("duplicate identifier '{}' renamed to '{}'", id, candidate);
        taken.insert(candidate.clone());
        seen.insert(candidate.clone());
        *id = candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_separators() {
        assert_eq!(normalize_identifier("Backend_Architect"), "backend-architect");
        assert_eq!(normalize_identifier("  k8s  Ops--Guru "), "k8s-ops-guru");
        assert_eq!(normalize_identifier("code.reviewer"), "code-reviewer");
        assert_eq!(normalize_identifier("___"), "");
    }

    #[test]
    fn dedupe_suffixes_later_occurrences() {
        let mut ids = vec![
            "reviewer".to_string(),
            "reviewer".to_string(),
            "reviewer-2".to_string(),
            String::new(),
            String::new(),
        ];
        dedupe_identifiers(&mut ids);
        assert_eq!(ids, vec!["reviewer", "reviewer-3", "reviewer-2", "", ""]);
    }
}
