//! Cell data structures for the notebook.
//!
//! - [`CellKind`] - What a cell's source is written in (code, markdown or HTML)
//! - [`Cell`] - A cell with its source, parse result and evaluation state
//! - [`CellMap`] - Thread-safe cell storage keyed by [`CellId`] (backed by `DashMap`)

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::error::CellError;
use super::parse::{ParseResult, parse};

/// Stable identifier of a cell within a notebook.
pub type CellId = u32;

/// The language of a cell's source.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    #[default]
    Code,
    #[serde(rename = "md")]
    Markdown,
    Html,
}

impl CellKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CellKind::Code => "code",
            CellKind::Markdown => "md",
            CellKind::Html => "html",
        }
    }

    pub fn from_tag(tag: &str) -> Option<CellKind> {
        match tag {
            "code" => Some(CellKind::Code),
            "md" => Some(CellKind::Markdown),
            "html" => Some(CellKind::Html),
            _ => None,
        }
    }

    /// The template tag a non-code cell is rendered through.
    fn template_tag(self) -> Option<&'static str> {
        match self {
            CellKind::Code => None,
            CellKind::Markdown => Some("md"),
            CellKind::Html => Some("html"),
        }
    }
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell in the notebook.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub source: String,
    pub parsed: ParseResult,
    /// Inputs changed since the cell was last evaluated.
    pub stale: bool,
    pub pinned: bool,
}

impl Cell {
    /// Create a cell and parse its source. New cells start stale.
    pub fn new(kind: CellKind, source: &str) -> Cell {
        let parsed = parse(&program(kind, source));
        Cell {
            kind,
            source: source.to_string(),
            parsed,
            stale: true,
            pinned: false,
        }
    }

    pub fn new_code(source: &str) -> Cell {
        Cell::new(CellKind::Code, source)
    }

    /// Replace the source, re-parse and mark the cell stale.
    pub fn set_source(&mut self, source: &str) {
        self.parsed = parse(&program(self.kind, source));
        self.source = source.to_string();
        self.stale = true;
    }

    /// The program text handed to the parser: the source itself for code
    /// cells, a tagged template literal for markdown and HTML.
    pub fn program(&self) -> Cow<'_, str> {
        program(self.kind, &self.source)
    }

    pub fn name(&self) -> Option<&str> {
        self.parsed.name()
    }

    pub fn defined_names(&self) -> Vec<&str> {
        self.parsed.defined_names()
    }

    /// Names read by this cell. Empty for imports and failed parses.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.parsed
            .dependencies()
            .into_iter()
            .flat_map(BTreeSet::iter)
            .map(String::as_str)
    }

    pub fn error(&self) -> Option<&CellError> {
        self.parsed.error()
    }
}

fn program(kind: CellKind, source: &str) -> Cow<'_, str> {
    let Some(tag) = kind.template_tag() else {
        return Cow::Borrowed(source);
    };
    let mut text = String::with_capacity(source.len() + tag.len() + 2);
    text.push_str(tag);
    text.push('`');
    for c in source.chars() {
        if c == '\\' || c == '`' {
            text.push('\\');
        }
        text.push(c);
    }
    text.push('`');
    Cow::Owned(text)
}

/// Thread-safe cell storage shared between the notebook and its readers.
pub type CellMap = Arc<DashMap<CellId, Cell>>;
