//! What a cell says, in terms of spans into its source.
//!
//! The ECMAScript tree itself lives only as long as a parse; callers get the
//! notebook-level shape of the cell: which name it binds, where its body is,
//! and which names that body reads.

use std::collections::BTreeSet;

use crate::span::Span;

/// An identifier together with where it appears.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Ident {
        Ident {
            name: name.into(),
            span,
        }
    }
}

/// A whole cell.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CellNode {
    Import(ImportDecl),
    Definition(Definition),
}

/// `import { a as b, c } from '<source>'`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    /// The module source literal, quotes included.
    pub source: Span,
    pub span: Span,
}

/// `imported as local`; both are the same name when no `as` is given.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImportSpecifier {
    pub imported: Ident,
    pub local: Ident,
}

/// A named definition (`x = ...`, `viewof x = ...`), a named function or
/// class, or an anonymous expression or block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Definition {
    pub viewof: bool,
    pub id: Option<Ident>,
    pub body: CellBody,
    /// Names the body reads or writes without binding them itself.
    pub references: BTreeSet<String>,
}

/// Where the value-producing part of a definition sits in the source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CellBody {
    Expr(Span),
    /// A `{ ... }` block, braces included.
    Block(Span),
}

impl CellBody {
    pub fn span(&self) -> Span {
        match self {
            CellBody::Expr(span) | CellBody::Block(span) => *span,
        }
    }
}
