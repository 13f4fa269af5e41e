//! Rendering command results as text or JSON.

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use cellbook_core::Diagnostic;
use cellbook_engine::engine::{CellId, ParseResult};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One line of `order` output.
#[derive(Debug, Serialize)]
pub struct OrderEntry {
    pub cell: CellId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

pub fn render_parse(result: &ParseResult, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(result)?);
    }

    let lines = match result {
        ParseResult::Assignment(assignment) => vec![
            "type: assignment".to_string(),
            format!(
                "name: {}",
                assignment.name.as_deref().unwrap_or("(anonymous)")
            ),
            format!("viewof: {}", assignment.viewof),
            format!("dependencies: {}", join_or_none(assignment.dependencies.iter())),
            format!("body: {}", assignment.body),
        ],
        ParseResult::Import(import) => vec![
            "type: import".to_string(),
            format!("urn: {}", import.urn),
            format!(
                "names: {}",
                join_or_none(import.names.iter().map(|n| {
                    if n.name == n.alias {
                        n.name.clone()
                    } else {
                        format!("{} as {}", n.name, n.alias)
                    }
                }))
            ),
        ],
        ParseResult::Exception(exception) => vec![
            "type: exception".to_string(),
            format!("error: {}", exception.exception),
        ],
    };
    Ok(lines.join("\n"))
}

pub fn render_diagnostics(diagnostics: &[Diagnostic], format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(diagnostics)?);
    }
    if diagnostics.is_empty() {
        return Ok("No problems found".to_string());
    }
    let lines: Vec<String> = diagnostics
        .iter()
        .map(|d| {
            let kind = d.kind.as_str();
            match d.position {
                Some(position) => format!("cell {} ({}): {}: {}", d.cell, position, kind, d.message),
                None => format!("cell {}: {}: {}", d.cell, kind, d.message),
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

pub fn render_order(entries: &[OrderEntry], format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(entries)?);
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|entry| match &entry.name {
            Some(name) => format!("{} {}", entry.cell, name),
            None => entry.cell.to_string(),
        })
        .collect();
    Ok(lines.join("\n"))
}

fn join_or_none<I, S>(items: I) -> String
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let items: Vec<String> = items.map(|s| s.as_ref().to_string()).collect();
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellbook_engine::engine::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_assignment() {
        let text = render_parse(&parse("x = y + z"), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "type: assignment\nname: x\nviewof: false\ndependencies: y, z\nbody: y + z"
        );
    }

    #[test]
    fn test_render_anonymous() {
        let text = render_parse(&parse("1 + 2"), OutputFormat::Text).unwrap();
        assert!(text.contains("name: (anonymous)"));
        assert!(text.contains("dependencies: (none)"));
    }

    #[test]
    fn test_render_import() {
        let text = render_parse(&parse("import {a as a1, b} from 'urn'"), OutputFormat::Text).unwrap();
        assert_eq!(text, "type: import\nurn: urn\nnames: a as a1, b");
    }

    #[test]
    fn test_render_exception() {
        let text = render_parse(&parse("x = "), OutputFormat::Text).unwrap();
        assert_eq!(text, "type: exception\nerror: Unexpected end of input (1:4)");
    }

    #[test]
    fn test_render_json() {
        let json = render_parse(&parse("x = 1"), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "assignment");
        assert_eq!(value["name"], "x");
    }

    #[test]
    fn test_render_order() {
        let entries = vec![
            OrderEntry {
                cell: 2,
                name: Some("a".to_string()),
            },
            OrderEntry { cell: 1, name: None },
        ];
        assert_eq!(render_order(&entries, OutputFormat::Text).unwrap(), "2 a\n1");
        let json: serde_json::Value =
            serde_json::from_str(&render_order(&entries, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!([{"cell": 2, "name": "a"}, {"cell": 1}]));
    }

    #[test]
    fn test_render_no_diagnostics() {
        assert_eq!(
            render_diagnostics(&[], OutputFormat::Text).unwrap(),
            "No problems found"
        );
        assert_eq!(render_diagnostics(&[], OutputFormat::Json).unwrap(), "[]");
    }
}
