//! Cell source classification and dependency extraction.
//!
//! [`parse`] turns the raw source of one cell into a [`ParseResult`]:
//!
//! - an [`AssignmentStatement`] for definitions (`x = ...`, `viewof x = ...`),
//!   block cells and bare expressions,
//! - an [`ImportStatement`] for `import {a as b} from "urn"`,
//! - an [`ExceptionStatement`] for anything the cell grammar rejects.
//!
//! The function is total and pure. It holds no state between calls and
//! may run on any number of threads at once.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use cellbook_syntax::{CellNode, Definition, ImportDecl, parse_cell};

use super::error::CellError;

/// Outcome of parsing one cell.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParseResult {
    Assignment(AssignmentStatement),
    Import(ImportStatement),
    Exception(ExceptionStatement),
}

/// A definition, block or bare expression.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AssignmentStatement {
    /// The bound name; absent for anonymous cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free references of the body. May include `name` itself.
    pub dependencies: BTreeSet<String>,
    /// The exact source text of the value-producing expression or block.
    pub body: String,
    pub viewof: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImportStatement {
    pub names: Vec<ImportName>,
    pub urn: String,
}

/// One imported binding. `alias` equals `name` when no `as` is given.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImportName {
    pub name: String,
    pub alias: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExceptionStatement {
    pub exception: CellError,
}

impl ParseResult {
    fn exception(exception: CellError) -> ParseResult {
        ParseResult::Exception(ExceptionStatement { exception })
    }

    /// The name bound by an assignment, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            ParseResult::Assignment(assignment) => assignment.name.as_deref(),
            _ => None,
        }
    }

    /// Every name this cell introduces into the notebook namespace: the
    /// assignment name, or each import alias.
    pub fn defined_names(&self) -> Vec<&str> {
        match self {
            ParseResult::Assignment(assignment) => assignment.name.as_deref().into_iter().collect(),
            ParseResult::Import(import) => import.names.iter().map(|n| n.alias.as_str()).collect(),
            ParseResult::Exception(_) => Vec::new(),
        }
    }

    /// Names this cell reads from the notebook namespace.
    pub fn dependencies(&self) -> Option<&BTreeSet<String>> {
        match self {
            ParseResult::Assignment(assignment) => Some(&assignment.dependencies),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CellError> {
        match self {
            ParseResult::Exception(exception) => Some(&exception.exception),
            _ => None,
        }
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, ParseResult::Exception(_))
    }
}

/// Classify one cell's source.
pub fn parse(source: &str) -> ParseResult {
    let node = match parse_cell(source) {
        Ok(node) => node,
        Err(err) => return ParseResult::exception(CellError::from_syntax(source, &err)),
    };

    let result = match &node {
        CellNode::Import(import) => import_statement(source, import).map(ParseResult::Import),
        CellNode::Definition(definition) => {
            assignment_statement(source, definition).map(ParseResult::Assignment)
        }
    };
    result.unwrap_or_else(ParseResult::exception)
}

fn import_statement(source: &str, import: &ImportDecl) -> Result<ImportStatement, CellError> {
    let literal = import
        .source
        .slice(source)
        .ok_or_else(|| CellError::new("Import source out of range"))?;
    let urn = literal
        .get(1..literal.len().saturating_sub(1))
        .ok_or_else(|| CellError::new("Malformed import source"))?;

    let names = import
        .specifiers
        .iter()
        .map(|specifier| ImportName {
            name: specifier.imported.name.clone(),
            alias: specifier.local.name.clone(),
        })
        .collect();

    Ok(ImportStatement {
        names,
        urn: urn.to_string(),
    })
}

fn assignment_statement(
    source: &str,
    definition: &Definition,
) -> Result<AssignmentStatement, CellError> {
    let body = definition
        .body
        .span()
        .slice(source)
        .ok_or_else(|| CellError::new("Cell body out of range"))?;

    Ok(AssignmentStatement {
        name: definition.id.as_ref().map(|id| id.name.clone()),
        dependencies: definition.references.clone(),
        body: body.to_string(),
        viewof: definition.viewof,
    })
}
