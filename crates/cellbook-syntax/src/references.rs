//! Free-reference analysis of a parsed cell body.
//!
//! Scoping is done by `oxc_semantic`: a cell depends on every name that is
//! still unresolved once the whole wrapped body has been analysed. On top of
//! that a [`BodyWalk`] over the user's own nodes
//!
//! - bounds the tree depth, since left-associative chains (`a + a + ...`,
//!   `a.b.b...`, `f()()...`) are built by loops in the parser but walked
//!   recursively by every later pass;
//! - decides whether `arguments` is free, which it is only outside every
//!   non-arrow function written in the cell.

use std::collections::BTreeSet;

use oxc_ast::AstKind;
use oxc_ast::ast::{Expression, IdentifierReference, Program, Statement};
use oxc_ast_visit::{Visit, walk};
use oxc_semantic::SemanticBuilder;
use oxc_span::GetSpan;

/// Deepest expression/statement tree accepted after parsing.
#[cfg(not(debug_assertions))]
pub(crate) const MAX_TREE_DEPTH: usize = 1000;
#[cfg(debug_assertions)]
pub(crate) const MAX_TREE_DEPTH: usize = 200;

const ARGUMENTS: &str = "arguments";

/// Walks the nodes of a cell body, stopping at [`MAX_TREE_DEPTH`].
#[derive(Default)]
pub(crate) struct BodyWalk {
    depth: usize,
    /// Offset (in the parsed text) of the first node past the depth limit.
    too_deep: Option<u32>,
    functions: usize,
    free_arguments: bool,
}

impl BodyWalk {
    /// Walk `expression` and `statement` roots; returns the offset of the
    /// first node nested too deeply, if any.
    pub(crate) fn check<'a>(
        &mut self,
        expressions: &[&Expression<'a>],
        statements: &[&Statement<'a>],
    ) -> Option<u32> {
        for expression in expressions {
            self.visit_expression(expression);
        }
        for statement in statements {
            self.visit_statement(statement);
        }
        self.too_deep
    }

    /// Descend one level unless the limit is reached.
    fn enter(&mut self, start: u32) -> bool {
        if self.too_deep.is_some() {
            return false;
        }
        if self.depth >= MAX_TREE_DEPTH {
            self.too_deep = Some(start);
            return false;
        }
        self.depth += 1;
        true
    }
}

impl<'a> Visit<'a> for BodyWalk {
    fn enter_node(&mut self, kind: AstKind<'a>) {
        if let AstKind::Function(_) = kind {
            self.functions += 1;
        }
    }

    fn leave_node(&mut self, kind: AstKind<'a>) {
        if let AstKind::Function(_) = kind {
            self.functions = self.functions.saturating_sub(1);
        }
    }

    fn visit_expression(&mut self, it: &Expression<'a>) {
        if self.enter(it.span().start) {
            walk::walk_expression(self, it);
            self.depth -= 1;
        }
    }

    fn visit_statement(&mut self, it: &Statement<'a>) {
        if self.enter(it.span().start) {
            walk::walk_statement(self, it);
            self.depth -= 1;
        }
    }

    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if it.name.as_str() == ARGUMENTS && self.functions == 0 {
            self.free_arguments = true;
        }
    }
}

/// Free references of `program`, or the first semantic error.
///
/// `walk` must already have visited the cell body.
pub(crate) fn free_references<'a>(
    program: &'a Program<'a>,
    walk: &BodyWalk,
) -> Result<BTreeSet<String>, oxc_diagnostics::OxcDiagnostic> {
    let ret = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .build(program);
    if let Some(error) = ret.errors.into_iter().next() {
        return Err(error);
    }

    let mut references: BTreeSet<String> = ret
        .semantic
        .scoping()
        .root_unresolved_references()
        .keys()
        .map(|name| name.to_string())
        .filter(|name| name != ARGUMENTS)
        .collect();
    if walk.free_arguments {
        references.insert(ARGUMENTS.to_string());
    }
    Ok(references)
}
