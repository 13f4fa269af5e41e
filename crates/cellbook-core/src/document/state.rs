use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, warn};

use crate::error::Result;
use cellbook_engine::engine::{CellId, CellMap};

/// Names the notebook runtime provides without a defining cell.
pub const STANDARD_BUILTINS: &[&str] = &[
    "Array",
    "Boolean",
    "DOM",
    "Date",
    "Error",
    "FileAttachment",
    "Files",
    "Generators",
    "Infinity",
    "Inputs",
    "JSON",
    "Map",
    "Math",
    "NaN",
    "Number",
    "Object",
    "Plot",
    "Promise",
    "Promises",
    "Set",
    "String",
    "Symbol",
    "console",
    "d3",
    "document",
    "fetch",
    "globalThis",
    "html",
    "htl",
    "invalidation",
    "md",
    "now",
    "require",
    "svg",
    "tex",
    "undefined",
    "visibility",
    "width",
    "window",
];

/// UI-agnostic notebook state.
pub struct Notebook {
    /// Cell storage (shared; clones of the map handle are cheap)
    pub cells: CellMap,
    /// Cell ids in notebook order
    pub order: Vec<CellId>,
    /// Definition index: name -> cells defining it, in notebook order
    pub definitions: HashMap<String, Vec<CellId>>,
    /// Reverse dependency map: cell -> cells that read one of its names
    pub dependents: HashMap<CellId, HashSet<CellId>>,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the notebook has been modified since load/save
    pub modified: bool,
    /// Names supplied by the runtime
    pub builtins: HashSet<String>,
    pub(crate) next_id: CellId,
}

impl Notebook {
    /// Create an empty notebook with the standard builtins.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Self::with_builtins(STANDARD_BUILTINS.iter().copied())
    }

    /// Create an empty notebook with an explicit set of builtin names.
    pub fn with_builtins<I, S>(builtins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Notebook {
            cells: Arc::new(DashMap::new()),
            order: Vec::new(),
            definitions: HashMap::new(),
            dependents: HashMap::new(),
            file_path: None,
            modified: false,
            builtins: builtins.into_iter().map(Into::into).collect(),
            next_id: 1,
        }
    }

    /// Create a notebook and load a file if provided. A path that does not
    /// exist yet becomes the save target.
    pub fn with_file(path: Option<PathBuf>) -> Result<Self> {
        let mut notebook = Self::new();
        if let Some(p) = path {
            if p.exists() {
                notebook.load_file(&p)?;
            } else {
                notebook.file_path = Some(p);
            }
        }
        Ok(notebook)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Notebook position of a cell.
    pub fn position(&self, id: CellId) -> Option<usize> {
        self.order.iter().position(|&c| c == id)
    }

    /// Rebuild the definition index and reverse dependency map from the
    /// cells. Call this after cells are added, removed, moved or edited.
    pub fn rebuild_dependents(&mut self) {
        self.definitions.clear();
        self.dependents.clear();

        for &id in &self.order {
            let Some(cell) = self.cells.get(&id) else {
                continue;
            };
            for name in cell.defined_names() {
                let definers = self.definitions.entry(name.to_string()).or_default();
                definers.push(id);
                if definers.len() == 2 {
                    warn!("'{}' is defined by more than one cell", name);
                }
            }
        }

        for &id in &self.order {
            let Some(cell) = self.cells.get(&id) else {
                continue;
            };
            for name in cell.dependencies() {
                let Some(definers) = self.definitions.get(name) else {
                    continue;
                };
                for &definer in definers {
                    self.dependents.entry(definer).or_default().insert(id);
                }
            }
        }

        debug!(
            "rebuilt dependency index: {} cells, {} names, {} edges",
            self.order.len(),
            self.definitions.len(),
            self.dependents.values().map(HashSet::len).sum::<usize>()
        );
    }

    /// Cells a cell reads from, in notebook order.
    pub fn inputs(&self, id: CellId) -> Vec<CellId> {
        let Some(cell) = self.cells.get(&id) else {
            return Vec::new();
        };
        let mut inputs: Vec<CellId> = cell
            .dependencies()
            .filter_map(|name| self.definitions.get(name))
            .flatten()
            .copied()
            .collect();
        drop(cell);
        inputs.sort_by_key(|&input| self.position(input));
        inputs.dedup();
        inputs
    }
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new()
    }
}
