//! Static vetter: screens a snippet before it is ever executed.
//!
//! This is a denylist meant to catch beginner mistakes and obviously unsafe
//! patterns: imports, scope-escape declarations and direct `__import__`
//! calls, at any nesting depth. It is not a security boundary. Everything
//! else passes, including calls to names the sandbox does not provide.

use crate::error::Fault;
use crate::lang::{self, Expr, Program, Stmt, StmtKind, Target};
use tracing::debug;

/// Parse and screen `source`.
///
/// # Errors
///
/// A [`crate::FaultKind::SyntaxFault`] when the source does not parse, or a
/// [`crate::FaultKind::PolicyViolation`] for the first disallowed construct
/// in source order.
pub fn vet(source: &str) -> Result<Program, Fault> {
    let program = lang::parse(source).map_err(|err| Fault::syntax(err.to_string()))?;
    check_block(&program.body)?;
    debug!(statements = program.body.len(), "snippet vetted");
    Ok(program)
}

fn check_block(body: &[Stmt]) -> Result<(), Fault> {
    body.iter().try_for_each(check_stmt)
}

fn check_stmt(stmt: &Stmt) -> Result<(), Fault> {
    let line = stmt.line;
    let violation = |what: String| Err(Fault::policy(format!("{what} (line {line})")));
    let expr = |e: &Expr| check_expr(e, line);

    match &stmt.kind {
        StmtKind::Import { modules } => {
            violation(format!("import of '{}' is not allowed", modules.join(", ")))
        }
        StmtKind::ImportFrom { module, .. } => {
            violation(format!("import from '{module}' is not allowed"))
        }
        StmtKind::Global(names) => violation(format!(
            "'global {}' is not allowed",
            names.join(", ")
        )),
        StmtKind::Nonlocal(names) => violation(format!(
            "'nonlocal {}' is not allowed",
            names.join(", ")
        )),
        StmtKind::Expr(value) | StmtKind::Return(Some(value)) => expr(value),
        StmtKind::Assign { targets, value } => {
            targets.iter().try_for_each(|t| check_target(t, line))?;
            expr(value)
        }
        StmtKind::AugAssign { target, value, .. } => {
            check_target(target, line)?;
            expr(value)
        }
        StmtKind::If { branches, orelse } => {
            for (test, body) in branches {
                expr(test)?;
                check_block(body)?;
            }
            check_block(orelse)
        }
        StmtKind::While { test, body } => {
            expr(test)?;
            check_block(body)
        }
        StmtKind::For { target, iter, body } => {
            check_target(target, line)?;
            expr(iter)?;
            check_block(body)
        }
        StmtKind::FunctionDef(def) => {
            for param in &def.params {
                if let Some(default) = &param.default {
                    expr(default)?;
                }
            }
            check_block(&def.body)
        }
        StmtKind::Delete(targets) => targets.iter().try_for_each(|t| check_target(t, line)),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue | StmtKind::Pass => Ok(()),
    }
}

fn check_target(target: &Target, line: u32) -> Result<(), Fault> {
    match target {
        Target::Name(_) => Ok(()),
        Target::Subscript { object, index } => {
            check_expr(object, line)?;
            check_expr(index, line)
        }
        Target::Tuple(targets) => targets.iter().try_for_each(|t| check_target(t, line)),
    }
}

fn check_expr(expr: &Expr, line: u32) -> Result<(), Fault> {
    let all = |exprs: &[Expr]| exprs.iter().try_for_each(|e| check_expr(e, line));
    match expr {
        Expr::Literal(_) | Expr::Name(_) => Ok(()),
        Expr::List(items) | Expr::Tuple(items) => all(items),
        Expr::Dict(entries) => entries.iter().try_for_each(|(k, v)| {
            check_expr(k, line)?;
            check_expr(v, line)
        }),
        Expr::ListComp {
            element,
            target,
            iter,
            conditions,
        } => {
            check_expr(element, line)?;
            check_target(target, line)?;
            check_expr(iter, line)?;
            all(conditions)
        }
        Expr::Unary { operand, .. } => check_expr(operand, line),
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            check_expr(left, line)?;
            check_expr(right, line)
        }
        Expr::Compare { left, rest } => {
            check_expr(left, line)?;
            rest.iter().try_for_each(|(_, e)| check_expr(e, line))
        }
        Expr::IfExpr { test, body, orelse } => {
            check_expr(test, line)?;
            check_expr(body, line)?;
            check_expr(orelse, line)
        }
        Expr::Call {
            func,
            args,
            keywords,
        } => {
            if matches!(func.as_ref(), Expr::Name(name) if name == "__import__") {
                return Err(Fault::policy(format!(
                    "calling __import__ is not allowed (line {line})"
                )));
            }
            check_expr(func, line)?;
            all(args)?;
            keywords.iter().try_for_each(|(_, e)| check_expr(e, line))
        }
        Expr::Attribute { object, .. } => check_expr(object, line),
        Expr::Subscript { object, index } => {
            check_expr(object, line)?;
            check_expr(index, line)
        }
        Expr::Slice {
            object,
            lower,
            upper,
            step,
        } => {
            check_expr(object, line)?;
            [lower, upper, step]
                .into_iter()
                .flatten()
                .try_for_each(|e| check_expr(e, line))
        }
    }
}
