//! Reading one cell.
//!
//! The notebook forms around a cell body (`viewof name =`, `name =` and the
//! cell-level `import`) are read directly from the source. The body itself
//! is handed to `oxc` inside an async generator wrapper, so `await`,
//! `yield` and (for blocks) `return` are allowed the way a notebook runtime
//! allows them. Every offset `oxc` reports is mapped back onto the cell
//! source.

use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, Function, ImportDeclarationSpecifier, Program, Statement};
use oxc_diagnostics::OxcDiagnostic;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};

use crate::ast::{CellBody, CellNode, Definition, Ident, ImportDecl, ImportSpecifier};
use crate::error::{SyntaxError, SyntaxResult};
use crate::nesting::{MAX_NESTING_DEPTH, TOO_DEEP, check_nesting};
use crate::references::{BodyWalk, free_references};
use crate::scan::{is_assign_at, is_reserved, skip_trivia, unexpected_at, word_at};
use crate::span::Span;

/// Wrapper around a `{ ... }` body.
const BLOCK_PREFIX: &str = "(async function* () {;\n";
/// Wrapper around an expression body. The leading `0,` forces an expression
/// context.
const EXPRESSION_PREFIX: &str = "(async function* () {;\n0,";
const SUFFIX: &str = "\n})";

/// Parse a single cell.
pub fn parse_cell(source: &str) -> SyntaxResult<CellNode> {
    check_nesting(source, MAX_NESTING_DEPTH)?;

    let start = skip_trivia(source, 0);
    if word_at(source, start) == Some("import") {
        let next = skip_trivia(source, start + "import".len());
        // `import(...)` and `import.meta` are expressions.
        if !source.get(next..).unwrap_or_default().starts_with(['(', '.']) {
            return parse_import(source, start).map(CellNode::Import);
        }
    }
    parse_definition(source, start).map(CellNode::Definition)
}

/// Maps offsets in the text handed to `oxc` back onto the cell source.
struct OffsetMap {
    prefix: usize,
    body_start: usize,
    source_len: usize,
}

impl OffsetMap {
    fn identity(source_len: usize) -> OffsetMap {
        OffsetMap {
            prefix: 0,
            body_start: 0,
            source_len,
        }
    }

    fn offset(&self, offset: usize) -> usize {
        (self.body_start + offset.saturating_sub(self.prefix)).min(self.source_len)
    }

    fn span(&self, span: oxc_span::Span) -> Span {
        Span::new(self.offset(span.start as usize), self.offset(span.end as usize))
    }

    fn error(&self, error: &OxcDiagnostic) -> SyntaxError {
        let offset = error
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map_or(0, |label| label.offset());
        SyntaxError::new(error.message.to_string(), self.offset(offset))
    }

    fn unexpected(&self, source: &str, offset: usize) -> SyntaxError {
        unexpected_at(source, skip_trivia(source, self.offset(offset)))
    }

    /// Only empty statements may follow the cell's own statement.
    fn reject_trailing(&self, source: &str, statements: &[&Statement<'_>]) -> SyntaxResult<()> {
        match statements
            .iter()
            .find(|statement| !matches!(statement, Statement::EmptyStatement(_)))
        {
            Some(statement) => Err(self.unexpected(source, statement.span().start as usize)),
            None => Ok(()),
        }
    }
}

fn parse_import(source: &str, start: usize) -> SyntaxResult<ImportDecl> {
    let map = OffsetMap::identity(source.len());
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(map.error(error));
    }

    let statements: Vec<&Statement> = ret.program.body.iter().collect();
    let (declaration, rest) = match statements.as_slice() {
        [Statement::ImportDeclaration(declaration), rest @ ..] => (declaration, rest),
        _ => return Err(unexpected_at(source, start)),
    };
    map.reject_trailing(source, rest)?;

    let Some(specifiers) = &declaration.specifiers else {
        return Err(SyntaxError::new(
            "Expected import specifiers",
            declaration.source.span.start as usize,
        ));
    };
    let specifiers = specifiers
        .iter()
        .map(|specifier| match specifier {
            ImportDeclarationSpecifier::ImportSpecifier(specifier) => {
                let local = &specifier.local;
                if is_reserved(local.name.as_str()) {
                    return Err(unexpected_at(source, local.span.start as usize));
                }
                Ok(ImportSpecifier {
                    imported: Ident::new(
                        specifier.imported.name().as_str(),
                        map.span(specifier.imported.span()),
                    ),
                    local: Ident::new(local.name.as_str(), map.span(local.span)),
                })
            }
            // Default and namespace imports.
            other => Err(unexpected_at(source, other.span().start as usize)),
        })
        .collect::<SyntaxResult<Vec<_>>>()?;

    Ok(ImportDecl {
        specifiers,
        source: map.span(declaration.source.span),
        span: map.span(declaration.span),
    })
}

/// Reads `viewof name =` or `name =` in front of the body. Returns the
/// viewof flag, the bound name and where the body starts.
fn definition_head(source: &str, start: usize) -> SyntaxResult<(bool, Option<Ident>, usize)> {
    let Some(word) = word_at(source, start) else {
        return Ok((false, None, start));
    };
    let after = skip_trivia(source, start + word.len());

    if word == "viewof" {
        if let Some(name) = word_at(source, after).filter(|name| !is_reserved(name)) {
            let equals = skip_trivia(source, after + name.len());
            if !is_assign_at(source, equals) {
                return Err(unexpected_at(source, equals));
            }
            let id = Ident::new(name, Span::new(after, after + name.len()));
            return Ok((true, Some(id), skip_trivia(source, equals + 1)));
        }
        if is_assign_at(source, after) {
            return Err(SyntaxError::new("Expected a binding name after viewof", after));
        }
    }

    if !is_reserved(word) && is_assign_at(source, after) {
        let id = Ident::new(word, Span::new(start, start + word.len()));
        return Ok((false, Some(id), skip_trivia(source, after + 1)));
    }
    Ok((false, None, start))
}

fn parse_definition(source: &str, start: usize) -> SyntaxResult<Definition> {
    let (viewof, id, body_start) = definition_head(source, start)?;
    let body = source.get(body_start..).unwrap_or_default();
    if body.is_empty() {
        return Err(SyntaxError::new("Unexpected end of input", source.len()));
    }

    let block = body.starts_with('{');
    let prefix = if block { BLOCK_PREFIX } else { EXPRESSION_PREFIX };
    let text = format!("{}{}{}", prefix, body, SUFFIX);
    let map = OffsetMap {
        prefix: prefix.len(),
        body_start,
        source_len: source.len(),
    };

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, &text, SourceType::mjs()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(map.error(error));
    }
    let program = ret.program;

    let function = wrapper_function(&program, text.len()).map_err(|at| map.unexpected(source, at))?;
    let Some(function_body) = &function.body else {
        return Err(map.unexpected(source, prefix.len()));
    };
    let statements: Vec<&Statement> = function_body.statements.iter().collect();
    let mut walk = BodyWalk::default();

    let (id, body, too_deep) = if block {
        let (block, rest) = match statements.as_slice() {
            [Statement::EmptyStatement(_), block @ Statement::BlockStatement(_), rest @ ..] => {
                (*block, rest)
            }
            _ => return Err(map.unexpected(source, prefix.len())),
        };
        map.reject_trailing(source, rest)?;
        let too_deep = walk.check(&[], &[block]);
        (id, CellBody::Block(map.span(block.span())), too_deep)
    } else {
        let (statement, rest) = match statements.as_slice() {
            [Statement::EmptyStatement(_), Statement::ExpressionStatement(statement), rest @ ..] => {
                (statement, rest)
            }
            _ => return Err(map.unexpected(source, prefix.len())),
        };
        map.reject_trailing(source, rest)?;
        let Expression::SequenceExpression(sequence) = &statement.expression else {
            return Err(map.unexpected(source, prefix.len()));
        };
        // Skip the `0` the wrapper put in front.
        let expressions: Vec<&Expression> = sequence.expressions.iter().skip(1).collect();
        let (Some(first), Some(last)) = (expressions.first(), expressions.last()) else {
            return Err(map.unexpected(source, prefix.len()));
        };
        let span = Span::new(
            map.offset(first.span().start as usize),
            map.offset(last.span().end as usize),
        );

        // A named function or class that forms the whole cell binds its name.
        let id = match (id, expressions.as_slice()) {
            (None, [Expression::FunctionExpression(function)]) => function
                .id
                .as_ref()
                .map(|id| Ident::new(id.name.as_str(), map.span(id.span))),
            (None, [Expression::ClassExpression(class)]) => class
                .id
                .as_ref()
                .map(|id| Ident::new(id.name.as_str(), map.span(id.span))),
            (id, _) => id,
        };
        let too_deep = walk.check(&expressions, &[]);
        (id, CellBody::Expr(span), too_deep)
    };

    if let Some(at) = too_deep {
        return Err(SyntaxError::new(TOO_DEEP, map.offset(at as usize)));
    }
    let references = free_references(&program, &walk).map_err(|error| map.error(&error))?;

    Ok(Definition {
        viewof,
        id,
        body,
        references,
    })
}

/// The wrapper function, provided the body did not close it early. On
/// failure returns the offset to report.
fn wrapper_function<'p, 'a>(program: &'p Program<'a>, len: usize) -> Result<&'p Function<'a>, usize> {
    let mut statements = program.body.iter();
    let (Some(Statement::ExpressionStatement(statement)), None) =
        (statements.next(), statements.next())
    else {
        return Err(0);
    };

    let mut expression = &statement.expression;
    if let Expression::ParenthesizedExpression(parenthesized) = expression {
        expression = &parenthesized.expression;
    }
    let Expression::FunctionExpression(function) = expression else {
        return Err(0);
    };

    let closes_at_end = function.span.end as usize + 1 == len;
    if statement.span.start != 0 || statement.span.end as usize != len || !closes_at_end {
        return Err((function.span.end as usize).saturating_sub(1));
    }
    Ok(function)
}
