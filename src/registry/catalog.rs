use serde::Serialize;
use serde_json::Value as JsonValue;

use super::types::fuzzy_contains;
use super::{Domain, Registry};

#[derive(Debug, Clone, Serialize)]
pub struct ParameterEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A catalog entry: command metadata with type names resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub hidden: bool,
    pub is_static: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub parameters: Vec<ParameterEntry>,
}

/// Every registered command, hidden ones included.
pub fn catalog(registry: &Registry) -> Vec<CatalogEntry> {
    let types = registry.types();
    registry
        .commands()
        .map(|c| CatalogEntry {
            name: c.name.clone(),
            description: c.description.clone(),
            builtin: c.builtin,
            hidden: c.hidden,
            is_static: c.is_static,
            target: c
                .declaring_type
                .filter(|_| c.takes_target())
                .map(|t| types.name(t).to_string()),
            parameters: c
                .parameters
                .iter()
                .map(|p| ParameterEntry {
                    name: p.name.clone(),
                    ty: types.name(p.ty).to_string(),
                })
                .collect(),
        })
        .collect()
}

/// `name - description` for each command a user should see.
pub fn help_lines(registry: &Registry) -> Vec<String> {
    registry
        .commands()
        .filter(|c| !c.hidden)
        .map(super::command::CommandDescriptor::help_text)
        .collect()
}

/// Help for the console. No topic lists every visible command; a command
/// name shows its syntax; anything else filters names by fuzzy match.
pub fn help_text(registry: &Registry, topic: Option<&str>) -> String {
    let Some(topic) = topic else {
        let mut lines = vec!["Available commands:".to_string()];
        lines.extend(help_lines(registry).into_iter().map(|l| format!("  {l}")));
        return lines.join("\n");
    };

    if let Some(cmd) = registry.commands().find(|c| c.name == topic && !c.hidden) {
        let mut lines = vec![cmd.syntax_hint(usize::MAX, registry.types())];
        if !cmd.description.is_empty() {
            lines.push(format!("  {}", cmd.description));
        }
        return lines.join("\n");
    }

    let matching: Vec<String> = registry
        .commands()
        .filter(|c| !c.hidden && fuzzy_contains(&c.name, topic))
        .map(super::command::CommandDescriptor::help_text)
        .collect();
    if matching.is_empty() {
        format!("No command matches \"{topic}\". Use help to list commands.")
    } else {
        let mut lines = vec![format!("Commands matching \"{topic}\":")];
        lines.extend(matching.into_iter().map(|l| format!("  {l}")));
        lines.join("\n")
    }
}

/// JSON export for external tooling: commands, types and domain sizes.
pub fn to_json(registry: &Registry) -> JsonValue {
    let types: Vec<JsonValue> = registry
        .types()
        .iter()
        .map(|t| {
            let lineage: Vec<&str> = registry
                .types()
                .lineage(t.tag)
                .iter()
                .skip(1)
                .map(|tag| registry.types().name(*tag))
                .collect();
            serde_json::json!({ "name": t.name, "parents": lineage })
        })
        .collect();
    let counts: serde_json::Map<String, JsonValue> = Domain::all()
        .iter()
        .map(|d| (d.slug().to_string(), JsonValue::from(registry.count(*d))))
        .collect();

    serde_json::json!({
        "commands": catalog(registry),
        "types": types,
        "domains": counts,
    })
}
