//! Recursive-descent parser over the token stream.

use super::ast::{
    BinOp, CmpOp, Expr, FunctionDef, Literal, LogicalOp, Param, Program, Stmt, StmtKind, Target,
    UnaryOp,
};
use super::lexer::{Tok, Token};
use super::SyntaxError;
use std::sync::Arc;

/// Keywords that name statements or expressions outside the snippet grammar.
const UNSUPPORTED: &[&str] = &[
    "class", "try", "except", "finally", "with", "raise", "assert", "lambda", "yield", "async",
    "await",
];

/// Augmented assignment operators and the arithmetic they apply.
const AUG_OPS: &[(&str, BinOp)] = &[
    ("+=", BinOp::Add),
    ("-=", BinOp::Sub),
    ("*=", BinOp::Mul),
    ("/=", BinOp::Div),
    ("//=", BinOp::FloorDiv),
    ("%=", BinOp::Mod),
    ("**=", BinOp::Pow),
];

/// Deepest nesting of blocks and sub-expressions accepted.
const MAX_NESTING: usize = 100;

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
    /// Enclosing loops in the current function (or at top level).
    loop_depth: usize,
    /// Enclosing function definitions.
    function_depth: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            nesting: 0,
            loop_depth: 0,
            function_depth: 0,
        }
    }

    pub(crate) fn program(mut self) -> Result<Program, SyntaxError> {
        let mut body = Vec::new();
        loop {
            match self.peek() {
                Tok::Eof => break,
                Tok::Newline => self.pos += 1,
                Tok::Indent => return Err(self.error("unexpected indent")),
                _ => body.extend(self.statement()?),
            }
        }
        Ok(Program { body })
    }

    // ----- statements -----

    fn statement(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        match self.peek() {
            Tok::Keyword("if") => Ok(vec![self.if_stmt()?]),
            Tok::Keyword("while") => Ok(vec![self.while_stmt()?]),
            Tok::Keyword("for") => Ok(vec![self.for_stmt()?]),
            Tok::Keyword("def") => Ok(vec![self.def_stmt()?]),
            _ => self.simple_line(),
        }
    }

    fn simple_line(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let mut stmts = vec![self.simple_stmt()?];
        while self.eat_op(";") {
            if matches!(self.peek(), Tok::Newline | Tok::Eof) {
                break;
            }
            stmts.push(self.simple_stmt()?);
        }
        match self.peek() {
            Tok::Newline => {
                self.pos += 1;
                Ok(stmts)
            }
            Tok::Eof => Ok(stmts),
            _ => Err(self.unexpected()),
        }
    }

    fn simple_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.current().line;
        let kind = match self.peek() {
            Tok::Keyword("pass") => {
                self.pos += 1;
                StmtKind::Pass
            }
            Tok::Keyword("break") => {
                if self.loop_depth == 0 {
                    return Err(self.error("'break' outside loop"));
                }
                self.pos += 1;
                StmtKind::Break
            }
            Tok::Keyword("continue") => {
                if self.loop_depth == 0 {
                    return Err(self.error("'continue' not properly in loop"));
                }
                self.pos += 1;
                StmtKind::Continue
            }
            Tok::Keyword("return") => {
                if self.function_depth == 0 {
                    return Err(self.error("'return' outside function"));
                }
                self.pos += 1;
                if self.at_statement_end() {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.expr_list()?))
                }
            }
            Tok::Keyword("del") => {
                self.pos += 1;
                let targets = match self.expr_list()? {
                    Expr::Tuple(items) => items
                        .into_iter()
                        .map(|item| self.to_target(item))
                        .collect::<Result<_, _>>()?,
                    single => vec![self.to_target(single)?],
                };
                StmtKind::Delete(targets)
            }
            Tok::Keyword("import") => {
                self.pos += 1;
                let mut modules = vec![self.dotted_name()?];
                self.skip_alias()?;
                while self.eat_op(",") {
                    modules.push(self.dotted_name()?);
                    self.skip_alias()?;
                }
                StmtKind::Import { modules }
            }
            Tok::Keyword("from") => {
                self.pos += 1;
                let mut module = String::new();
                while self.eat_op(".") {
                    module.push('.');
                }
                if !self.at_keyword("import") {
                    module.push_str(&self.dotted_name()?);
                }
                self.expect_keyword("import")?;
                let names = self.import_names()?;
                StmtKind::ImportFrom { module, names }
            }
            Tok::Keyword("global") => {
                self.pos += 1;
                StmtKind::Global(self.name_list()?)
            }
            Tok::Keyword("nonlocal") => {
                self.pos += 1;
                StmtKind::Nonlocal(self.name_list()?)
            }
            Tok::Keyword(kw) if UNSUPPORTED.contains(kw) => {
                return Err(self.error(format!("'{kw}' is not supported in snippets")));
            }
            _ => self.expr_statement()?,
        };
        Ok(Stmt { kind, line })
    }

    fn expr_statement(&mut self) -> Result<StmtKind, SyntaxError> {
        let first = self.expr_list()?;

        if let Some(op) = self.aug_op() {
            self.pos += 1;
            if matches!(first, Expr::Tuple(_) | Expr::List(_)) {
                return Err(self.error("illegal expression for augmented assignment"));
            }
            let target = self.to_target(first)?;
            let value = self.expr_list()?;
            return Ok(StmtKind::AugAssign { target, op, value });
        }

        if self.at_op("=") {
            let mut exprs = vec![first];
            while self.eat_op("=") {
                exprs.push(self.expr_list()?);
            }
            let Some(value) = exprs.pop() else {
                return Err(self.unexpected());
            };
            let targets = exprs
                .into_iter()
                .map(|expr| self.to_target(expr))
                .collect::<Result<_, _>>()?;
            return Ok(StmtKind::Assign { targets, value });
        }

        Ok(StmtKind::Expr(first))
    }

    fn if_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.current().line;
        self.expect_keyword("if")?;
        let mut branches = Vec::new();
        let test = self.test()?;
        branches.push((test, self.block()?));

        while self.eat_keyword("elif") {
            let test = self.test()?;
            branches.push((test, self.block()?));
        }
        let orelse = if self.eat_keyword("else") {
            self.block()?
        } else {
            Vec::new()
        };

        Ok(Stmt {
            kind: StmtKind::If { branches, orelse },
            line,
        })
    }

    fn while_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.current().line;
        self.expect_keyword("while")?;
        let test = self.test()?;
        let body = self.loop_body()?;
        if self.at_keyword("else") {
            return Err(self.error("'else' after a loop is not supported in snippets"));
        }
        Ok(Stmt {
            kind: StmtKind::While { test, body },
            line,
        })
    }

    fn for_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.current().line;
        self.expect_keyword("for")?;
        let target = self.target_list()?;
        self.expect_keyword("in")?;
        let iter = self.expr_list()?;
        let body = self.loop_body()?;
        if self.at_keyword("else") {
            return Err(self.error("'else' after a loop is not supported in snippets"));
        }
        Ok(Stmt {
            kind: StmtKind::For { target, iter, body },
            line,
        })
    }

    fn def_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.current().line;
        self.expect_keyword("def")?;
        let name = self.expect_name()?;
        self.expect_op("(")?;

        let mut params: Vec<Param> = Vec::new();
        while !self.at_op(")") {
            let param_name = self.expect_name()?;
            if params.iter().any(|p| p.name == param_name) {
                return Err(self.error(format!(
                    "duplicate argument '{param_name}' in function definition"
                )));
            }
            let default = if self.eat_op("=") {
                Some(self.test()?)
            } else {
                if params.iter().any(|p| p.default.is_some()) {
                    return Err(self.error("non-default argument follows default argument"));
                }
                None
            };
            params.push(Param {
                name: param_name,
                default,
            });
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;

        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.block();
        self.function_depth -= 1;
        self.loop_depth = enclosing_loops;
        let body = body?;

        Ok(Stmt {
            kind: StmtKind::FunctionDef(Arc::new(FunctionDef { name, params, body })),
            line,
        })
    }

    fn loop_body(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.loop_depth += 1;
        let body = self.block();
        self.loop_depth -= 1;
        body
    }

    fn block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.nested(Self::block_inner)
    }

    /// `: NEWLINE INDENT stmt+ DEDENT` or `: simple_line`.
    fn block_inner(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect_op(":")?;
        if !matches!(self.peek(), Tok::Newline) {
            return self.simple_line();
        }
        self.pos += 1;
        if !matches!(self.peek(), Tok::Indent) {
            return Err(self.error("expected an indented block"));
        }
        self.pos += 1;

        let mut body = Vec::new();
        while !matches!(self.peek(), Tok::Dedent | Tok::Eof) {
            body.extend(self.statement()?);
        }
        if matches!(self.peek(), Tok::Dedent) {
            self.pos += 1;
        }
        Ok(body)
    }

    fn dotted_name(&mut self) -> Result<String, SyntaxError> {
        let mut name = self.expect_name()?;
        while self.eat_op(".") {
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        Ok(name)
    }

    fn skip_alias(&mut self) -> Result<(), SyntaxError> {
        if self.eat_keyword("as") {
            self.expect_name()?;
        }
        Ok(())
    }

    fn import_names(&mut self) -> Result<Vec<String>, SyntaxError> {
        if self.eat_op("*") {
            return Ok(vec!["*".to_string()]);
        }
        let parenthesized = self.eat_op("(");
        let mut names = Vec::new();
        loop {
            names.push(self.expect_name()?);
            self.skip_alias()?;
            if !self.eat_op(",") || (parenthesized && self.at_op(")")) {
                break;
            }
        }
        if parenthesized {
            self.expect_op(")")?;
        }
        Ok(names)
    }

    fn name_list(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut names = vec![self.expect_name()?];
        while self.eat_op(",") {
            names.push(self.expect_name()?);
        }
        Ok(names)
    }

    /// Loop targets stop before `in`, so they are parsed below comparisons.
    fn target_list(&mut self) -> Result<Target, SyntaxError> {
        let first = self.sum()?;
        if !self.at_op(",") {
            return self.to_target(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_keyword("in") {
                break;
            }
            items.push(self.sum()?);
        }
        self.to_target(Expr::Tuple(items))
    }

    fn to_target(&self, expr: Expr) -> Result<Target, SyntaxError> {
        match expr {
            Expr::Name(name) => Ok(Target::Name(name)),
            Expr::Subscript { object, index } => Ok(Target::Subscript { object, index }),
            Expr::Tuple(items) | Expr::List(items) => Ok(Target::Tuple(
                items
                    .into_iter()
                    .map(|item| self.to_target(item))
                    .collect::<Result<_, _>>()?,
            )),
            Expr::Attribute { .. } => {
                Err(self.error("assigning to attributes is not supported in snippets"))
            }
            Expr::Slice { .. } => Err(self.error("slice assignment is not supported in snippets")),
            Expr::Call { .. } => Err(self.error("cannot assign to function call")),
            Expr::Literal(_) => Err(self.error("cannot assign to literal")),
            _ => Err(self.error("cannot assign to expression")),
        }
    }

    // ----- expressions -----

    /// Comma-separated expressions; more than one (or a trailing comma) makes a tuple.
    fn expr_list(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.test()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_expr_list_end() {
                break;
            }
            items.push(self.test()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn test(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(Self::test_inner)
    }

    fn test_inner(&mut self) -> Result<Expr, SyntaxError> {
        let body = self.or_test()?;
        if !self.eat_keyword("if") {
            return Ok(body);
        }
        let test = self.or_test()?;
        self.expect_keyword("else")?;
        let orelse = self.test()?;
        Ok(Expr::IfExpr {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn or_test(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut left = parser.and_test()?;
            while parser.eat_keyword("or") {
                parser.link()?;
                let right = parser.and_test()?;
                left = Expr::Logical {
                    op: LogicalOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                };
            }
            Ok(left)
        })
    }

    fn and_test(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut left = parser.not_test()?;
            while parser.eat_keyword("and") {
                parser.link()?;
                let right = parser.not_test()?;
                left = Expr::Logical {
                    op: LogicalOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                };
            }
            Ok(left)
        })
    }

    fn not_test(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(Self::not_test_inner)
    }

    fn not_test_inner(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_keyword("not") {
            let operand = self.not_test()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.sum()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Tok::Op("==") => CmpOp::Eq,
                Tok::Op("!=") => CmpOp::NotEq,
                Tok::Op("<") => CmpOp::Lt,
                Tok::Op("<=") => CmpOp::LtE,
                Tok::Op(">") => CmpOp::Gt,
                Tok::Op(">=") => CmpOp::GtE,
                Tok::Keyword("in") => CmpOp::In,
                Tok::Keyword("not") if matches!(self.peek_at(1), Tok::Keyword("in")) => {
                    self.pos += 1;
                    CmpOp::NotIn
                }
                Tok::Keyword("is") => {
                    if matches!(self.peek_at(1), Tok::Keyword("not")) {
                        self.pos += 1;
                        CmpOp::IsNot
                    } else {
                        CmpOp::Is
                    }
                }
                _ => break,
            };
            self.pos += 1;
            rest.push((op, self.sum()?));
        }
        if rest.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                rest,
            })
        }
    }

    fn sum(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut left = parser.term()?;
            loop {
                let op = match parser.peek() {
                    Tok::Op("+") => BinOp::Add,
                    Tok::Op("-") => BinOp::Sub,
                    _ => break,
                };
                parser.pos += 1;
                parser.link()?;
                let right = parser.term()?;
                left = binary(op, left, right);
            }
            Ok(left)
        })
    }

    fn term(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut left = parser.factor()?;
            loop {
                let op = match parser.peek() {
                    Tok::Op("*") => BinOp::Mul,
                    Tok::Op("/") => BinOp::Div,
                    Tok::Op("//") => BinOp::FloorDiv,
                    Tok::Op("%") => BinOp::Mod,
                    _ => break,
                };
                parser.pos += 1;
                parser.link()?;
                let right = parser.factor()?;
                left = binary(op, left, right);
            }
            Ok(left)
        })
    }

    fn factor(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(Self::factor_inner)
    }

    fn factor_inner(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek() {
            Tok::Op("-") => UnaryOp::Neg,
            Tok::Op("+") => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.factor()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.postfix()?;
        if self.eat_op("**") {
            let exponent = self.factor()?;
            return Ok(binary(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut expr = parser.atom()?;
            loop {
                if !matches!(parser.peek(), Tok::Op("(" | "[" | ".")) {
                    return Ok(expr);
                }
                parser.link()?;
                if parser.eat_op("(") {
                    expr = parser.call(expr)?;
                } else if parser.eat_op("[") {
                    expr = parser.subscript(expr)?;
                } else {
                    parser.pos += 1;
                    let name = parser.expect_name()?;
                    expr = Expr::Attribute {
                        object: Box::new(expr),
                        name,
                    };
                }
            }
        })
    }

    fn call(&mut self, func: Expr) -> Result<Expr, SyntaxError> {
        let mut args = Vec::new();
        let mut keywords: Vec<(String, Expr)> = Vec::new();
        while !self.at_op(")") {
            if let (Tok::Name(name), Tok::Op("=")) = (self.peek(), self.peek_at(1)) {
                let name = name.clone();
                if keywords.iter().any(|(k, _)| *k == name) {
                    return Err(self.error(format!("keyword argument repeated: {name}")));
                }
                self.pos += 2;
                keywords.push((name, self.test()?));
            } else {
                if !keywords.is_empty() {
                    return Err(self.error("positional argument follows keyword argument"));
                }
                let arg = self.test()?;
                if self.at_keyword("for") {
                    if !args.is_empty() {
                        return Err(self.error("generator expression must be parenthesized"));
                    }
                    args.push(self.comprehension(arg)?);
                    break;
                }
                args.push(arg);
            }
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;
        Ok(Expr::Call {
            func: Box::new(func),
            args,
            keywords,
        })
    }

    fn subscript(&mut self, object: Expr) -> Result<Expr, SyntaxError> {
        let lower = if self.at_op(":") {
            None
        } else {
            Some(Box::new(self.test()?))
        };

        if !self.eat_op(":") {
            self.expect_op("]")?;
            return match lower {
                Some(index) => Ok(Expr::Subscript {
                    object: Box::new(object),
                    index,
                }),
                None => Err(self.unexpected()),
            };
        }

        let upper = if self.at_op(":") || self.at_op("]") {
            None
        } else {
            Some(Box::new(self.test()?))
        };
        let step = if self.eat_op(":") && !self.at_op("]") {
            Some(Box::new(self.test()?))
        } else {
            None
        };
        self.expect_op("]")?;
        Ok(Expr::Slice {
            object: Box::new(object),
            lower,
            upper,
            step,
        })
    }

    /// `for target in iter [if cond]*` following an already-parsed element.
    fn comprehension(&mut self, element: Expr) -> Result<Expr, SyntaxError> {
        self.expect_keyword("for")?;
        let target = self.target_list()?;
        self.expect_keyword("in")?;
        let iter = self.or_test()?;
        let mut conditions = Vec::new();
        while self.eat_keyword("if") {
            conditions.push(self.or_test()?);
        }
        if self.at_keyword("for") {
            return Err(self.error("nested comprehension loops are not supported in snippets"));
        }
        Ok(Expr::ListComp {
            element: Box::new(element),
            target,
            iter: Box::new(iter),
            conditions,
        })
    }

    fn atom(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.current().clone();
        match token.tok {
            Tok::Int(value) => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Int(value)))
            }
            Tok::Float(value) => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Float(value)))
            }
            Tok::Str(mut value) => {
                self.pos += 1;
                while let Tok::Str(next) = self.peek() {
                    value.push_str(next);
                    self.pos += 1;
                }
                Ok(Expr::Literal(Literal::Str(value)))
            }
            Tok::Keyword("True") => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            Tok::Keyword("False") => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            Tok::Keyword("None") => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::None))
            }
            Tok::Name(name) => {
                self.pos += 1;
                Ok(Expr::Name(name))
            }
            Tok::Op("(") => {
                self.pos += 1;
                self.parenthesized()
            }
            Tok::Op("[") => {
                self.pos += 1;
                self.list_display()
            }
            Tok::Op("{") => {
                self.pos += 1;
                self.dict_display()
            }
            Tok::Keyword(kw) if UNSUPPORTED.contains(&kw) => {
                Err(self.error(format!("'{kw}' is not supported in snippets")))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parenthesized(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_op(")") {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.test()?;
        if self.at_keyword("for") {
            let comp = self.comprehension(first)?;
            self.expect_op(")")?;
            return Ok(comp);
        }
        if !self.eat_op(",") {
            self.expect_op(")")?;
            return Ok(first);
        }
        let mut items = vec![first];
        while !self.at_op(")") {
            items.push(self.test()?);
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;
        Ok(Expr::Tuple(items))
    }

    fn list_display(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_op("]") {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.test()?;
        if self.at_keyword("for") {
            let comp = self.comprehension(first)?;
            self.expect_op("]")?;
            return Ok(comp);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_op("]") {
                break;
            }
            items.push(self.test()?);
        }
        self.expect_op("]")?;
        Ok(Expr::List(items))
    }

    fn dict_display(&mut self) -> Result<Expr, SyntaxError> {
        let mut entries = Vec::new();
        while !self.at_op("}") {
            let key = self.test()?;
            if self.at_op(",") || self.at_op("}") {
                return Err(self.error("set literals are not supported in snippets"));
            }
            self.expect_op(":")?;
            let value = self.test()?;
            entries.push((key, value));
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op("}")?;
        Ok(Expr::Dict(entries))
    }

    // ----- token helpers -----

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error("too many nested blocks or expressions"));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    /// Parse a left-associative chain whose links each deepen the tree. Links
    /// are counted against the nesting limit until the chain ends.
    fn chain<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        let outer = self.nesting;
        let result = parse(self);
        self.nesting = outer;
        result
    }

    /// One more link in the innermost [`chain`](Self::chain).
    fn link(&mut self) -> Result<(), SyntaxError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error("too many nested blocks or expressions"));
        }
        self.nesting += 1;
        Ok(())
    }

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek(&self) -> &Tok {
        &self.current().tok
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + offset).min(last)].tok
    }

    fn at_op(&self, op: &str) -> bool {
        matches!(self.peek(), Tok::Op(o) if *o == op)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), SyntaxError> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{op}' but found {}",
                describe(self.peek())
            )))
        }
    }

    fn at_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Tok::Keyword(k) if *k == kw)
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.at_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<(), SyntaxError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{kw}' but found {}",
                describe(self.peek())
            )))
        }
    }

    fn expect_name(&mut self) -> Result<String, SyntaxError> {
        if let Tok::Name(name) = self.peek() {
            let name = name.clone();
            self.pos += 1;
            Ok(name)
        } else {
            Err(self.error(format!(
                "expected a name but found {}",
                describe(self.peek())
            )))
        }
    }

    fn aug_op(&self) -> Option<BinOp> {
        match self.peek() {
            Tok::Op(op) => AUG_OPS
                .iter()
                .find(|(symbol, _)| symbol == op)
                .map(|(_, bin)| *bin),
            _ => None,
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), Tok::Newline | Tok::Eof | Tok::Op(";"))
    }

    fn at_expr_list_end(&self) -> bool {
        self.at_statement_end()
            || self.aug_op().is_some()
            || matches!(self.peek(), Tok::Op("=" | ")" | "]" | ":"))
    }

    fn unexpected(&self) -> SyntaxError {
        match self.peek() {
            Tok::Indent => self.error("unexpected indent"),
            Tok::Eof => self.error("unexpected end of input"),
            other => self.error(format!("invalid syntax near {}", describe(other))),
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        let token = self.current();
        SyntaxError {
            message: message.into(),
            line: token.line,
            col: token.col,
        }
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn describe(tok: &Tok) -> String {
    match tok {
        Tok::Name(name) => format!("'{name}'"),
        Tok::Keyword(kw) => format!("'{kw}'"),
        Tok::Int(value) => format!("'{value}'"),
        Tok::Float(value) => format!("'{value}'"),
        Tok::Str(_) => "a string".to_string(),
        Tok::Op(op) => format!("'{op}'"),
        Tok::Newline => "end of line".to_string(),
        Tok::Indent => "an indent".to_string(),
        Tok::Dedent => "a dedent".to_string(),
        Tok::Eof => "end of input".to_string(),
    }
}
