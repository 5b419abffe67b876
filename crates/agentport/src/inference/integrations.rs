use super::types::InferenceTables;
use crate::model::IntegrationMap;

/// Case-insensitive keyword scan of the raw text against the integration
/// table. Output order is table order; every match contributes one entry.
pub fn detect_integrations(raw_text: &str, tables: &InferenceTables) -> IntegrationMap {
    let lowered = raw_text.to_lowercase();
    let mut out = IntegrationMap::default();
    for rule in &tables.integrations {
        let hit = rule
            .keywords
            .iter()
            .any(|k| !k.is_empty() && lowered.contains(&k.to_lowercase()));
        if hit {
            out.insert_if_absent(rule.name.clone(), rule.launch_spec());
        }
    }
    out
}
