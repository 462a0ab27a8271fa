//! Tree-walking interpreter.
//!
//! Name resolution is two-level: the locals of the innermost call, then the
//! snippet's globals, then the capabilities. Functions do not capture their
//! defining scope. A name assigned anywhere in a function body is local to
//! that function for the whole body.

use super::builtins::Builtin;
use super::exception::{ErrorType, Exception, Raised};
use super::{methods, ops, SandboxConfig};
use crate::lang::{BinOp, Expr, Literal, LogicalOp, Program, Stmt, StmtKind, Target};
use crate::value::{Bindings, Dict, Function, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// How a block finished.
#[derive(Debug)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Locals of one active call.
struct Frame {
    locals: Bindings,
    /// Every name the function body assigns.
    assigned: HashSet<String>,
}

pub(super) struct Interpreter<'a> {
    config: &'a SandboxConfig,
    globals: Bindings,
    frames: Vec<Frame>,
    fuel: u64,
    output: String,
    output_lines: usize,
}

impl<'a> Interpreter<'a> {
    pub(super) fn new(config: &'a SandboxConfig, globals: Bindings) -> Self {
        Self {
            config,
            globals,
            frames: Vec::new(),
            fuel: 0,
            output: String::new(),
            output_lines: 0,
        }
    }

    pub(super) fn run(&mut self, program: &Program) -> Raised<()> {
        self.exec_block(&program.body).map(|_| ())
    }

    pub(super) fn fuel_used(&self) -> u64 {
        self.fuel
    }

    /// Final globals and captured output.
    pub(super) fn finish(self) -> (Bindings, String) {
        (self.globals, self.output)
    }

    pub(super) fn max_len(&self) -> usize {
        self.config.max_collection_len
    }

    /// Burn one unit of fuel.
    fn tick(&mut self) -> Raised<()> {
        self.burn(1)
    }

    /// Burn `units` of fuel. Usage never reads past one unit over budget.
    pub(super) fn burn(&mut self, units: u64) -> Raised<()> {
        if units == 0 {
            return Ok(());
        }
        let limit = self.config.step_budget.saturating_add(1);
        self.fuel = self.fuel.saturating_add(units).min(limit);
        if self.fuel > self.config.step_budget {
            return Err(Exception::new(
                ErrorType::TimeoutError,
                format!(
                    "execution budget of {} steps exhausted",
                    self.config.step_budget
                ),
            ));
        }
        Ok(())
    }

    /// Append printed text to the transcript.
    pub(super) fn write_output(&mut self, text: &str) -> Raised<()> {
        let lines = self.output_lines + text.matches('\n').count();
        let chars = self.output.len() + text.len();
        if lines > self.config.max_output_lines || chars > self.config.max_collection_len {
            return Err(Exception::new(
                ErrorType::MemoryError,
                format!(
                    "printed output exceeds {} lines or {} characters",
                    self.config.max_output_lines, self.config.max_collection_len
                ),
            ));
        }
        self.output.push_str(text);
        self.output_lines = lines;
        Ok(())
    }

    // ----- statements -----

    fn exec_block(&mut self, body: &[Stmt]) -> Raised<Flow> {
        for stmt in body {
            match self.exec(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt) -> Raised<Flow> {
        self.tick()
            .and_then(|()| self.exec_kind(&stmt.kind))
            .map_err(|e| e.at_line(stmt.line))
    }

    fn exec_kind(&mut self, kind: &StmtKind) -> Raised<Flow> {
        match kind {
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            }
            StmtKind::Assign { targets, value } => {
                let value = self.eval(value)?;
                for target in targets {
                    self.assign(target, value.clone())?;
                }
            }
            StmtKind::AugAssign { target, op, value } => {
                let rhs = self.eval(value)?;
                self.aug_assign(target, *op, &rhs)?;
            }
            StmtKind::If { branches, orelse } => {
                for (test, body) in branches {
                    if self.eval(test)?.is_truthy() {
                        return self.exec_block(body);
                    }
                }
                return self.exec_block(orelse);
            }
            StmtKind::While { test, body } => loop {
                self.tick()?;
                if !self.eval(test)?.is_truthy() {
                    break;
                }
                match self.exec_block(body)? {
                    Flow::Break => break,
                    Flow::Return(value) => return Ok(Flow::Return(value)),
                    Flow::Normal | Flow::Continue => {}
                }
            },
            StmtKind::For { target, iter, body } => {
                let items = ops::iterate(&self.eval(iter)?)?;
                for item in items {
                    self.tick()?;
                    self.assign(target, item)?;
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Pass => {}
            StmtKind::FunctionDef(def) => {
                let mut defaults = Vec::with_capacity(def.params.len());
                for param in &def.params {
                    let default = match &param.default {
                        Some(expr) => Some(self.eval(expr)?),
                        None => None,
                    };
                    defaults.push(default);
                }
                let function = Function {
                    def: Arc::clone(def),
                    defaults,
                };
                self.store(&def.name, Value::Function(Arc::new(function)));
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::Delete(targets) => {
                for target in targets {
                    self.delete(target)?;
                }
            }
            StmtKind::Import { modules } => {
                let module = modules.first().map_or("", String::as_str);
                return Err(no_module(module));
            }
            StmtKind::ImportFrom { module, .. } => return Err(no_module(module)),
            StmtKind::Global(_) => return Err(no_scope_escape("global")),
            StmtKind::Nonlocal(_) => return Err(no_scope_escape("nonlocal")),
        }
        Ok(Flow::Normal)
    }

    // ----- names and places -----

    fn lookup(&self, name: &str) -> Raised<Value> {
        if let Some(frame) = self.frames.last() {
            if let Some(value) = frame.locals.get(name) {
                return Ok(value.clone());
            }
            if frame.assigned.contains(name) {
                return Err(unbound_local(name));
            }
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        Builtin::lookup(name)
            .map(Value::Builtin)
            .ok_or_else(|| Exception::name_error(name))
    }

    /// Bind in the innermost scope.
    fn store(&mut self, name: &str, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => frame.locals.insert(name, value),
            None => self.globals.insert(name, value),
        };
    }

    /// Remove from the innermost scope.
    fn unbind(&mut self, name: &str) -> Option<Value> {
        match self.frames.last_mut() {
            Some(frame) => frame.locals.remove(name),
            None => self.globals.remove(name),
        }
    }

    /// Current binding in the innermost scope, without falling back.
    fn scope_get(&self, name: &str) -> Option<Value> {
        match self.frames.last() {
            Some(frame) => frame.locals.get(name).cloned(),
            None => self.globals.get(name).cloned(),
        }
    }

    fn is_variable(&self, name: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.locals.contains(name) || frame.assigned.contains(name))
            || self.globals.contains(name)
    }

    fn variable_mut(&mut self, name: &str) -> Raised<&mut Value> {
        if let Some(frame) = self.frames.last_mut() {
            if frame.locals.contains(name) {
                return frame
                    .locals
                    .get_mut(name)
                    .ok_or_else(|| Exception::name_error(name));
            }
            if frame.assigned.contains(name) {
                return Err(unbound_local(name));
            }
        }
        self.globals
            .get_mut(name)
            .ok_or_else(|| Exception::name_error(name))
    }

    /// Resolve `name[k1][k2]...` to a variable and a key path. Keys are
    /// evaluated here; `None` when the expression is not such a place.
    fn place_path(&mut self, expr: &Expr) -> Raised<Option<(String, Vec<Value>)>> {
        match expr {
            Expr::Name(name) if self.is_variable(name) => Ok(Some((name.clone(), Vec::new()))),
            Expr::Subscript { object, index } => {
                let Some((root, mut path)) = self.place_path(object)? else {
                    return Ok(None);
                };
                path.push(self.eval(index)?);
                Ok(Some((root, path)))
            }
            _ => Ok(None),
        }
    }

    fn place_mut(&mut self, root: &str, path: &[Value]) -> Raised<&mut Value> {
        let mut current = self.variable_mut(root)?;
        for key in path {
            current = child_mut(current, key)?;
        }
        Ok(current)
    }

    fn assign(&mut self, target: &Target, value: Value) -> Raised<()> {
        match target {
            Target::Name(name) => {
                self.store(name, value);
                Ok(())
            }
            Target::Subscript { object, index } => {
                let max_len = self.max_len();
                match self.place_path(object)? {
                    Some((root, path)) => {
                        let key = self.eval(index)?;
                        self.store_item(&root, &path, key, value)
                    }
                    None => {
                        let mut temporary = self.eval(object)?;
                        let key = self.eval(index)?;
                        set_item(&mut temporary, key, value, max_len)
                    }
                }
            }
            Target::Tuple(targets) => {
                let items = ops::iterate(&value).map_err(|_| {
                    Exception::type_error(format!(
                        "cannot unpack non-iterable {} object",
                        value.type_name()
                    ))
                })?;
                if items.len() < targets.len() {
                    return Err(Exception::value_error(format!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        items.len()
                    )));
                }
                if items.len() > targets.len() {
                    return Err(Exception::value_error(format!(
                        "too many values to unpack (expected {})",
                        targets.len()
                    )));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item)?;
                }
                Ok(())
            }
        }
    }

    /// `place[key] = value` on a named place. Storing a container re-measures
    /// the whole place, so it is charged as a copy.
    fn store_item(&mut self, root: &str, path: &[Value], key: Value, value: Value) -> Raised<()> {
        let max_len = self.max_len();
        let place = self.place_mut(root, path)?;
        let cost = if ops::is_scalar(&value) {
            ops::scan_cost(place)
        } else {
            ops::copy_cost(place)
        };
        self.burn(cost)?;
        set_item(self.place_mut(root, path)?, key, value, max_len)
    }

    fn aug_assign(&mut self, target: &Target, op: BinOp, rhs: &Value) -> Raised<()> {
        let max_len = self.max_len();
        match target {
            Target::Name(name) => {
                let current = self.lookup(name)?;
                self.burn(ops::copy_cost(&current))?;
                let updated = ops::binary(op, &current, rhs, max_len)?;
                self.store(name, updated);
                Ok(())
            }
            Target::Subscript { object, index } => match self.place_path(object)? {
                Some((root, path)) => {
                    let key = self.eval(index)?;
                    let current = ops::index(self.place_mut(&root, &path)?, &key)?;
                    let updated = ops::binary(op, &current, rhs, max_len)?;
                    self.store_item(&root, &path, key, updated)
                }
                None => {
                    let mut temporary = self.eval(object)?;
                    let key = self.eval(index)?;
                    let current = ops::index(&temporary, &key)?;
                    let updated = ops::binary(op, &current, rhs, max_len)?;
                    set_item(&mut temporary, key, updated, max_len)
                }
            },
            Target::Tuple(_) => Err(Exception::type_error(
                "augmented assignment needs a single target",
            )),
        }
    }

    fn delete(&mut self, target: &Target) -> Raised<()> {
        match target {
            Target::Name(name) => {
                if self.unbind(name).is_none() {
                    return Err(Exception::name_error(name));
                }
                Ok(())
            }
            Target::Subscript { object, index } => match self.place_path(object)? {
                Some((root, path)) => {
                    let key = self.eval(index)?;
                    del_item(self.place_mut(&root, &path)?, &key)
                }
                None => {
                    let mut temporary = self.eval(object)?;
                    let key = self.eval(index)?;
                    del_item(&mut temporary, &key)
                }
            },
            Target::Tuple(targets) => {
                for target in targets {
                    self.delete(target)?;
                }
                Ok(())
            }
        }
    }

    // ----- expressions -----

    pub(super) fn eval(&mut self, expr: &Expr) -> Raised<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::None => Value::None,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(f) => Value::Float(*f),
                Literal::Str(s) => Value::Str(s.clone()),
            }),
            Expr::Name(name) => {
                let value = self.lookup(name)?;
                self.burn(ops::copy_cost(&value))?;
                Ok(value)
            }
            Expr::List(items) => {
                let items = self.eval_all(items)?;
                self.bounded(Value::List(items))
            }
            Expr::Tuple(items) => {
                let items = self.eval_all(items)?;
                self.bounded(Value::Tuple(items))
            }
            Expr::Dict(entries) => {
                let mut dict = Dict::new();
                for (key, value) in entries {
                    let key = self.eval(key)?;
                    ops::check_hashable(&key)?;
                    let value = self.eval(value)?;
                    dict.insert(key, value);
                }
                self.bounded(Value::Dict(dict))
            }
            Expr::ListComp {
                element,
                target,
                iter,
                conditions,
            } => self.comprehension(element, target, iter, conditions),
            Expr::Unary { op, operand } => ops::unary(*op, &self.eval(operand)?),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                ops::binary(*op, &left, &right, self.max_len())
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Compare { left, rest } => {
                let mut left = self.eval(left)?;
                for (op, right) in rest {
                    let right = self.eval(right)?;
                    if !ops::compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::IfExpr { test, body, orelse } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(body)
                } else {
                    self.eval(orelse)
                }
            }
            Expr::Call {
                func,
                args,
                keywords,
            } => self.eval_call(func, args, keywords),
            Expr::Attribute { object, name } => {
                let receiver = self.eval(object)?;
                Err(methods::not_callable_here(&receiver, name))
            }
            Expr::Subscript { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                ops::index(&object, &index)
            }
            Expr::Slice {
                object,
                lower,
                upper,
                step,
            } => {
                let object = self.eval(object)?;
                let lower = self.eval_optional(lower.as_deref())?;
                let upper = self.eval_optional(upper.as_deref())?;
                let step = self.eval_optional(step.as_deref())?;
                ops::slice(&object, &lower, &upper, &step)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Raised<Vec<Value>> {
        if exprs.len() > self.max_len() {
            return Err(ops::memory_error(self.max_len()));
        }
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    /// Reject a freshly built container holding too many nested elements.
    fn bounded(&self, value: Value) -> Raised<Value> {
        ops::check_extent(ops::extent(&value), self.max_len())?;
        Ok(value)
    }

    fn eval_optional(&mut self, expr: Option<&Expr>) -> Raised<Value> {
        expr.map_or(Ok(Value::None), |expr| self.eval(expr))
    }

    /// `[element for target in iter if ...]`. Loop variables do not outlive
    /// the comprehension.
    fn comprehension(
        &mut self,
        element: &Expr,
        target: &Target,
        iter: &Expr,
        conditions: &[Expr],
    ) -> Raised<Value> {
        let items = ops::iterate(&self.eval(iter)?)?;
        let mut names = Vec::new();
        target_names(target, &mut names);
        let saved: Vec<(String, Option<Value>)> = names
            .into_iter()
            .map(|name| {
                let previous = self.scope_get(&name);
                (name, previous)
            })
            .collect();

        let mut produced = Vec::new();
        let mut size = ops::Extent::default();
        for item in items {
            self.tick()?;
            self.assign(target, item)?;
            let mut keep = true;
            for condition in conditions {
                if !self.eval(condition)?.is_truthy() {
                    keep = false;
                    break;
                }
            }
            if keep {
                let value = self.eval(element)?;
                let inner = ops::extent(&value);
                size.len = size.len.saturating_add(1).saturating_add(inner.len);
                size.depth = size.depth.max(inner.depth + 1);
                ops::check_extent(size, self.max_len())?;
                produced.push(value);
            }
        }

        for (name, previous) in saved {
            match previous {
                Some(value) => self.store(&name, value),
                None => {
                    self.unbind(&name);
                }
            }
        }
        Ok(Value::List(produced))
    }

    fn eval_call(
        &mut self,
        func: &Expr,
        args: &[Expr],
        keywords: &[(String, Expr)],
    ) -> Raised<Value> {
        if let Expr::Attribute { object, name } = func {
            let args = self.eval_all(args)?;
            let kwargs = self.eval_keywords(keywords)?;
            return self.call_method(object, name, args, kwargs);
        }

        let callee = self.eval(func)?;
        let args = self.eval_all(args)?;
        let kwargs = self.eval_keywords(keywords)?;
        self.call_value(&callee, args, kwargs)
    }

    fn eval_keywords(&mut self, keywords: &[(String, Expr)]) -> Raised<Vec<(String, Value)>> {
        keywords
            .iter()
            .map(|(name, expr)| Ok((name.clone(), self.eval(expr)?)))
            .collect()
    }

    /// Call a method. Receivers that name a place are updated in place.
    fn call_method(
        &mut self,
        object: &Expr,
        name: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Raised<Value> {
        let place = self.place_path(object)?;
        let max_len = self.max_len();

        if name == "sort" {
            let receiver = match &place {
                Some((root, path)) => self.place_mut(root, path)?.clone(),
                None => self.eval(object)?,
            };
            self.burn(ops::copy_cost(&receiver))?;
            let items = match receiver {
                Value::List(items) => items,
                other => return Err(methods::no_attribute(&other, name)),
            };
            let sorted = self.sort_method(items, &args, kwargs)?;
            if let Some((root, path)) = place {
                *self.place_mut(&root, &path)? = Value::List(sorted);
            }
            return Ok(Value::None);
        }

        match place {
            Some((root, path)) => {
                // Appending a scalar and popping the end stay constant-time
                let receiver = self.place_mut(&root, &path)?;
                let cost = if name == "pop" {
                    0
                } else if !args.iter().all(ops::is_scalar) {
                    ops::copy_cost(receiver)
                } else if name == "append" {
                    0
                } else {
                    ops::scan_cost(receiver)
                };
                self.burn(cost)?;
                let receiver = self.place_mut(&root, &path)?;
                methods::call(receiver, name, args, kwargs, max_len)
            }
            None => {
                let mut receiver = self.eval(object)?;
                methods::call(&mut receiver, name, args, kwargs, max_len)
            }
        }
    }

    fn sort_method(
        &mut self,
        items: Vec<Value>,
        args: &[Value],
        mut kwargs: Vec<(String, Value)>,
    ) -> Raised<Vec<Value>> {
        if !args.is_empty() {
            return Err(Exception::type_error(
                "sort() takes no positional arguments",
            ));
        }
        let key = take_keyword(&mut kwargs, "key");
        let reverse = take_keyword(&mut kwargs, "reverse");
        if let Some((unexpected, _)) = kwargs.first() {
            return Err(Exception::type_error(format!(
                "'{unexpected}' is an invalid keyword argument for sort()"
            )));
        }
        let reverse = reverse.as_ref().is_some_and(Value::is_truthy);
        self.sort_values(items, key.as_ref(), reverse)
    }

    pub(super) fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Raised<Value> {
        match callee {
            Value::Builtin(builtin) => self.call_builtin(*builtin, args, kwargs),
            Value::Function(function) => self.call_function(function, args, kwargs),
            other => Err(Exception::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(
        &mut self,
        function: &Function,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Raised<Value> {
        self.tick()?;
        if self.frames.len() >= self.config.max_call_depth {
            return Err(Exception::new(
                ErrorType::RecursionError,
                format!(
                    "maximum call depth of {} exceeded",
                    self.config.max_call_depth
                ),
            ));
        }

        let def = Arc::clone(&function.def);
        let locals = bind_arguments(function, args, kwargs)?;
        let mut assigned = HashSet::new();
        assigned_names(&def.body, &mut assigned);
        assigned.extend(def.params.iter().map(|param| param.name.clone()));

        self.frames.push(Frame { locals, assigned });
        let flow = self.exec_block(&def.body);
        self.frames.pop();

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::None),
        }
    }
}

/// Match call arguments to parameters, filling in defaults.
fn bind_arguments(
    function: &Function,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Raised<Bindings> {
    let def = &function.def;
    let params = &def.params;
    if args.len() > params.len() {
        return Err(Exception::type_error(format!(
            "{}() takes {} positional argument{} but {} were given",
            def.name,
            params.len(),
            if params.len() == 1 { "" } else { "s" },
            args.len()
        )));
    }

    let mut slots: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    slots.resize(params.len(), None);

    for (name, value) in kwargs {
        let Some(position) = params.iter().position(|param| param.name == name) else {
            return Err(Exception::type_error(format!(
                "{}() got an unexpected keyword argument '{name}'",
                def.name
            )));
        };
        if slots[position].is_some() {
            return Err(Exception::type_error(format!(
                "{}() got multiple values for argument '{name}'",
                def.name
            )));
        }
        slots[position] = Some(value);
    }

    let mut missing = Vec::new();
    let mut locals = Bindings::new();
    for ((param, slot), default) in params.iter().zip(slots).zip(&function.defaults) {
        match slot.or_else(|| default.clone()) {
            Some(value) => {
                locals.insert(param.name.as_str(), value);
            }
            None => missing.push(format!("'{}'", param.name)),
        }
    }

    if !missing.is_empty() {
        let plural = if missing.len() == 1 { "" } else { "s" };
        return Err(Exception::type_error(format!(
            "{}() missing {} required argument{plural}: {}",
            def.name,
            missing.len(),
            missing.join(", ")
        )));
    }
    Ok(locals)
}

/// Remove and return a keyword argument.
pub(super) fn take_keyword(kwargs: &mut Vec<(String, Value)>, name: &str) -> Option<Value> {
    let position = kwargs.iter().position(|(key, _)| key == name)?;
    Some(kwargs.remove(position).1)
}

fn target_names(target: &Target, out: &mut Vec<String>) {
    match target {
        Target::Name(name) => {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        Target::Tuple(targets) => {
            for target in targets {
                target_names(target, out);
            }
        }
        Target::Subscript { .. } => {}
    }
}

/// Names a function body binds, not descending into nested definitions.
fn assigned_names(body: &[Stmt], out: &mut HashSet<String>) {
    let add = |target: &Target, out: &mut HashSet<String>| {
        let mut names = Vec::new();
        target_names(target, &mut names);
        out.extend(names);
    };
    for stmt in body {
        match &stmt.kind {
            StmtKind::Assign { targets, .. } => {
                for target in targets {
                    add(target, out);
                }
            }
            StmtKind::AugAssign { target, .. } => add(target, out),
            StmtKind::For { target, body, .. } => {
                add(target, out);
                assigned_names(body, out);
            }
            StmtKind::While { body, .. } => assigned_names(body, out),
            StmtKind::If { branches, orelse } => {
                for (_, body) in branches {
                    assigned_names(body, out);
                }
                assigned_names(orelse, out);
            }
            StmtKind::FunctionDef(def) => {
                out.insert(def.name.clone());
            }
            StmtKind::Delete(targets) => {
                for target in targets {
                    add(target, out);
                }
            }
            _ => {}
        }
    }
}

fn child_mut<'v>(container: &'v mut Value, key: &Value) -> Raised<&'v mut Value> {
    match container {
        Value::List(items) => {
            let position = ops::sequence_position("list", key, items.len())?;
            Ok(&mut items[position])
        }
        Value::Tuple(items) => {
            let position = ops::sequence_position("tuple", key, items.len())?;
            Ok(&mut items[position])
        }
        Value::Dict(dict) => {
            ops::check_hashable(key)?;
            dict.get_mut(key)
                .ok_or_else(|| Exception::new(ErrorType::KeyError, key.repr()))
        }
        other => Err(Exception::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn set_item(container: &mut Value, key: Value, value: Value, max_len: usize) -> Raised<()> {
    let grows = !ops::is_scalar(&value);
    match container {
        Value::List(items) => {
            let position = ops::sequence_position("list", &key, items.len())?;
            items[position] = value;
        }
        Value::Dict(dict) => {
            ops::check_hashable(&key)?;
            if dict.get(&key).is_none() && dict.len() >= max_len {
                return Err(ops::memory_error(max_len));
            }
            dict.insert(key, value);
        }
        other => {
            return Err(Exception::type_error(format!(
                "'{}' object does not support item assignment",
                other.type_name()
            )));
        }
    }
    // A failed check ends the run, so the oversized container is never observed
    if grows {
        ops::check_extent(ops::extent(container), max_len)?;
    }
    Ok(())
}

fn del_item(container: &mut Value, key: &Value) -> Raised<()> {
    match container {
        Value::List(items) => {
            let position = ops::sequence_position("list", key, items.len())?;
            items.remove(position);
            Ok(())
        }
        Value::Dict(dict) => {
            ops::check_hashable(key)?;
            dict.remove(key)
                .map(|_| ())
                .ok_or_else(|| Exception::new(ErrorType::KeyError, key.repr()))
        }
        other => Err(Exception::type_error(format!(
            "'{}' object does not support item deletion",
            other.type_name()
        ))),
    }
}

fn unbound_local(name: &str) -> Exception {
    Exception::new(
        ErrorType::UnboundLocalError,
        format!("cannot access local variable '{name}' where it is not associated with a value"),
    )
}

fn no_module(module: &str) -> Exception {
    Exception::new(ErrorType::ImportError, format!("no module named '{module}'"))
}

fn no_scope_escape(keyword: &str) -> Exception {
    Exception::new(
        ErrorType::NameError,
        format!("'{keyword}' declarations are not available in the sandbox"),
    )
}

#[cfg(test)]
mod tests {
    use crate::sandbox::{ExecutionOutcome, Sandbox};
    use crate::value::{Bindings, Value};

    fn run(source: &str) -> Result<Bindings, String> {
        match Sandbox::default().execute_source(source, &Bindings::new()).outcome {
            ExecutionOutcome::Success(bindings) => Ok(bindings),
            ExecutionOutcome::Failure(fault) => Err(fault.message),
        }
    }

    fn value(source: &str, name: &str) -> Value {
        let bindings = run(source).unwrap_or_else(|e| panic!("{source:?} failed: {e}"));
        bindings
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("{name} not bound"))
    }

    fn error(source: &str) -> String {
        run(source).expect_err("expected a runtime fault")
    }

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_arithmetic_and_assignment() {
        assert_eq!(value("x = 7 // 2", "x"), Value::Int(3));
        assert_eq!(value("x = -7 // 2", "x"), Value::Int(-4));
        assert_eq!(value("x = -7 % 3", "x"), Value::Int(2));
        assert_eq!(value("x = 7 / 2", "x"), Value::Float(3.5));
        assert_eq!(value("a = b = 4\nx = a + b", "x"), Value::Int(8));
        assert_eq!(value("x = 5\nx += 2\nx *= 3", "x"), Value::Int(21));
    }

    #[test]
    fn test_tuple_swap() {
        let bindings = run("a, b = 1, 2\na, b = b, a").unwrap();
        assert_eq!(bindings.get("a"), Some(&Value::Int(2)));
        assert_eq!(bindings.get("b"), Some(&Value::Int(1)));
        assert!(error("a, b = 1, 2, 3").contains("too many values to unpack"));
        assert!(error("a, b = [1]").contains("not enough values to unpack"));
    }

    #[test]
    fn test_control_flow() {
        let source = "total = 0\nfor i in range(10):\n    if i % 2 == 0:\n        continue\n    if i > 7:\n        break\n    total += i\n";
        assert_eq!(value(source, "total"), Value::Int(1 + 3 + 5 + 7));

        let source = "n = 10\nsteps = 0\nwhile n != 1:\n    n = n // 2 if n % 2 == 0 else 3 * n + 1\n    steps += 1\n";
        assert_eq!(value(source, "steps"), Value::Int(6));
    }

    #[test]
    fn test_functions_defaults_and_keywords() {
        let source = "def greet(name, greeting='Hello'):\n    return greeting + ', ' + name\na = greet('Ada')\nb = greet('Bob', greeting='Hi')\n";
        assert_eq!(value(source, "a"), Value::Str("Hello, Ada".into()));
        assert_eq!(value(source, "b"), Value::Str("Hi, Bob".into()));

        assert!(error("def f(a):\n    return a\nf()").contains("missing 1 required argument: 'a'"));
        assert!(error("def f(a):\n    return a\nf(1, 2)").contains("takes 1 positional argument"));
        assert!(error("def f(a):\n    return a\nf(b=1)").contains("unexpected keyword argument 'b'"));
        assert!(error("def f(a):\n    return a\nf(1, a=2)").contains("multiple values"));
    }

    #[test]
    fn test_recursion() {
        let source = "def fact(n):\n    if n <= 1:\n        return 1\n    return n * fact(n - 1)\nx = fact(10)\n";
        assert_eq!(value(source, "x"), Value::Int(3_628_800));

        let message = error("def f(n):\n    return f(n + 1)\nf(0)\n");
        assert!(message.starts_with("RecursionError"), "{message}");
    }

    #[test]
    fn test_function_locals_do_not_leak() {
        let bindings = run("x = 1\ndef f():\n    x = 2\n    y = 3\n    return x\nz = f()\n").unwrap();
        assert_eq!(bindings.get("x"), Some(&Value::Int(1)));
        assert_eq!(bindings.get("z"), Some(&Value::Int(2)));
        assert!(!bindings.contains("y"));
    }

    #[test]
    fn test_functions_read_globals() {
        let source = "rate = 3\ndef scale(n):\n    return n * rate\nx = scale(2)\n";
        assert_eq!(value(source, "x"), Value::Int(6));
    }

    #[test]
    fn test_unbound_local() {
        let message = error("x = 1\ndef f():\n    x = x + 1\n    return x\nf()\n");
        assert!(message.starts_with("UnboundLocalError"), "{message}");
    }

    #[test]
    fn test_mutating_methods_update_places() {
        assert_eq!(value("L = [3, 1]\nL.append(2)\nL.sort()", "L"), ints(&[1, 2, 3]));
        assert_eq!(
            value("grid = [[0, 0], [0, 0]]\ngrid[1][0] = 5\ngrid[0].append(9)", "grid"),
            Value::List(vec![ints(&[0, 0, 9]), ints(&[5, 0])])
        );
        let source = "counts = {}\nfor w in ['a', 'b', 'a']:\n    counts[w] = counts.get(w, 0) + 1\n";
        let Value::Dict(counts) = value(source, "counts") else {
            panic!("not a dict");
        };
        assert_eq!(counts.get(&Value::Str("a".into())), Some(&Value::Int(2)));
        assert_eq!(counts.get(&Value::Str("b".into())), Some(&Value::Int(1)));
    }

    #[test]
    fn test_assignment_copies_containers() {
        let bindings = run("a = [1]\nb = a\nb.append(2)").unwrap();
        assert_eq!(bindings.get("a"), Some(&ints(&[1])));
        assert_eq!(bindings.get("b"), Some(&ints(&[1, 2])));
    }

    #[test]
    fn test_functions_mutate_global_lists() {
        let source = "log = []\ndef note(x):\n    log.append(x)\nnote(1)\nnote(2)\n";
        assert_eq!(value(source, "log"), ints(&[1, 2]));
    }

    #[test]
    fn test_sort_with_key_and_reverse() {
        let source = "words = ['bb', 'a', 'ccc', 'dd']\nwords.sort(key=len, reverse=True)\n";
        assert_eq!(
            value(source, "words"),
            Value::List(
                ["ccc", "bb", "dd", "a"]
                    .iter()
                    .map(|s| Value::Str((*s).into()))
                    .collect()
            )
        );
    }

    #[test]
    fn test_comprehension_scoping() {
        let bindings = run("x = 'kept'\nsquares = [x * x for x in range(4) if x != 2]").unwrap();
        assert_eq!(bindings.get("squares"), Some(&ints(&[0, 1, 9])));
        assert_eq!(bindings.get("x"), Some(&Value::Str("kept".into())));

        let bindings = run("evens = [n for n in range(5) if n % 2 == 0]").unwrap();
        assert!(!bindings.contains("n"));
    }

    #[test]
    fn test_delete() {
        let bindings = run("a = 1\nb = [1, 2, 3]\ndel a, b[0]").unwrap();
        assert!(!bindings.contains("a"));
        assert_eq!(bindings.get("b"), Some(&ints(&[2, 3])));
        assert!(error("del nothing").starts_with("NameError"));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(value("x = 0 or 'fallback'", "x"), Value::Str("fallback".into()));
        assert_eq!(value("x = [] and 1", "x"), Value::List(Vec::new()));
        assert_eq!(value("x = 1 < 2 < 3", "x"), Value::Bool(true));
        assert_eq!(value("x = 1 < 3 < 2", "x"), Value::Bool(false));
    }

    #[test]
    fn test_runtime_errors() {
        assert!(error("x = y").starts_with("NameError: name 'y' is not defined"));
        assert!(error("x = 1 + 'a'").starts_with("TypeError"));
        assert!(error("x = {}['k']").starts_with("KeyError: 'k'"));
        assert!(error("x = 9223372036854775807 + 1").starts_with("OverflowError"));
        assert!(error("x = (1, 2)\nx[0] = 5").contains("does not support item assignment"));
        assert!(error("x = 5\nx()").contains("not callable"));
        assert!(error("x = [1].push").starts_with("AttributeError"));
    }

    #[test]
    fn test_tuples_hold_mutable_lists() {
        let source = "t = ([1], 2)\nt[0].append(5)\n";
        assert_eq!(
            value(source, "t"),
            Value::Tuple(vec![ints(&[1, 5]), Value::Int(2)])
        );
    }
}
