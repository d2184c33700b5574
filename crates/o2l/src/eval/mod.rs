mod binary;
mod call;

pub(crate) use binary::{NumericPair, promote_pair};
pub(crate) use call::ArgValues;

use std::rc::Rc;

use crate::{
    exception::{Exception, RunError, RunResult, StackFrame, ThrownValue},
    expressions::{Expr, ExprLoc, Literal, LogicOp, Node, SourceLocation, UnaryOp},
    heap::{HeapData, ListInstance, MapInstance, SetInstance},
    run::Interpreter,
    value::{MapKey, Value},
};

/// Outcome of evaluating one statement.
///
/// `Return`/`Break`/`Continue` are ordinary values on the `Ok` channel;
/// each enclosing construct decides whether to absorb or propagate them.
/// Errors and user throws travel as `Err` (see `RunError`).
#[derive(Debug)]
pub(crate) enum Flow {
    Value(Value),
    Return(Value),
    Break,
    Continue,
}

impl Interpreter {
    // --- error helpers ----------------------------------------------------

    /// Wraps an exception with the current call-stack snapshot.
    pub(crate) fn raise(&self, exc: Exception) -> RunError {
        RunError::Exc(Box::new(exc.with_stack(&self.stack)))
    }

    pub(crate) fn eval_err(&self, message: impl Into<String>) -> RunError {
        self.raise(Exception::evaluation(message))
    }

    pub(crate) fn type_err(&self, message: impl Into<String>) -> RunError {
        self.raise(Exception::type_mismatch(message))
    }

    pub(crate) fn unresolved_err(&self, message: impl Into<String>) -> RunError {
        self.raise(Exception::unresolved(message))
    }

    // --- statement evaluation ---------------------------------------------

    /// Evaluates statements in order; yields the last statement's value.
    pub(crate) fn eval_block(&mut self, nodes: &[Node]) -> RunResult<Flow> {
        let mut last = Value::default();
        for node in nodes {
            match self.eval_node(node)? {
                Flow::Value(value) => last = value,
                other => return Ok(other),
            }
        }
        Ok(Flow::Value(last))
    }

    /// Evaluates a block in a fresh scope, so names declared inside are
    /// invisible outside.
    pub(crate) fn eval_scoped_block(&mut self, nodes: &[Node]) -> RunResult<Flow> {
        self.namespaces.push_scope();
        let result = self.eval_block(nodes);
        self.namespaces.pop_scope();
        result
    }

    pub(crate) fn eval_node(&mut self, node: &Node) -> RunResult<Flow> {
        match node {
            Node::Expr(expr) => Ok(Flow::Value(self.eval_expr(expr)?)),
            Node::VarDecl {
                name,
                type_name,
                value,
                ..
            } => {
                let value = self.eval_expr(value)?;
                let value = self.check_assignable(type_name, value, &format!("variable '{name}'"))?;
                self.namespaces
                    .define_variable(name, value.clone())
                    .map_err(|e| self.raise(e))?;
                Ok(Flow::Value(value))
            }
            Node::ConstDecl {
                name,
                type_name,
                value,
                ..
            } => {
                let value = self.eval_expr(value)?;
                let value = self.check_assignable(type_name, value, &format!("constant '{name}'"))?;
                self.namespaces
                    .define_constant(name, value.clone())
                    .map_err(|e| self.raise(e))?;
                Ok(Flow::Value(value))
            }
            Node::Assign { name, value, .. } => {
                let value = self.eval_expr(value)?;
                self.namespaces
                    .reassign(name, value.clone())
                    .map_err(|e| self.raise(e))?;
                Ok(Flow::Value(value))
            }
            Node::PropertyAssign { property, value, .. } => {
                let value = self.eval_expr(value)?;
                let Some(this_id) = self.namespaces.current_this() else {
                    return Err(self.eval_err("No 'this' object available in current context"));
                };
                let declared = match self.heap.get(this_id) {
                    HeapData::Object(object) => object.property_type(property).map(str::to_owned),
                    _ => None,
                };
                let value = match declared {
                    Some(declared) => {
                        self.check_assignable(&declared, value, &format!("property '{property}'"))?
                    }
                    None => value,
                };
                let HeapData::Object(object) = self.heap.get_mut(this_id) else {
                    return Err(self.eval_err("'this' is not an object"));
                };
                object
                    .set_property(property.clone(), value.clone())
                    .map_err(|message| self.eval_err(message))?;
                Ok(Flow::Value(value))
            }
            Node::If {
                condition,
                then_block,
                elif_branches,
                else_block,
                ..
            } => {
                if self.eval_condition(condition, "If")? {
                    return self.eval_scoped_block(then_block);
                }
                for (elif_condition, elif_block) in elif_branches {
                    if self.eval_condition(elif_condition, "If")? {
                        return self.eval_scoped_block(elif_block);
                    }
                }
                match else_block {
                    Some(block) => self.eval_scoped_block(block),
                    None => Ok(Flow::Value(Value::default())),
                }
            }
            Node::While { condition, body, .. } => {
                let mut last = Value::default();
                loop {
                    if !self.eval_condition(condition, "While")? {
                        return Ok(Flow::Value(last));
                    }
                    match self.eval_scoped_block(body)? {
                        Flow::Value(value) => last = value,
                        Flow::Break => return Ok(Flow::Value(last)),
                        Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
            }
            Node::Break { .. } => Ok(Flow::Break),
            Node::Continue { .. } => Ok(Flow::Continue),
            Node::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::default(),
                };
                Ok(Flow::Return(value))
            }
            Node::Throw { value, .. } => {
                let value = self.eval_expr(value)?;
                Err(RunError::Thrown(Box::new(ThrownValue {
                    value,
                    stack: self.stack.clone(),
                })))
            }
            Node::TryCatch {
                try_block,
                catch_name,
                catch_block,
                finally_block,
                ..
            } => self.eval_try_catch(try_block, catch_name, catch_block, finally_block.as_deref()),
            Node::Object(_) | Node::Enum(_) | Node::Record(_) | Node::Protocol(_) => {
                let (name, value) = self
                    .eval_declaration(node)?
                    .expect("declaration nodes always produce a binding");
                self.namespaces
                    .define_variable(&name, value.clone())
                    .map_err(|e| self.raise(e))?;
                Ok(Flow::Value(value))
            }
            Node::Namespace { path, body, .. } => {
                let prefix = path.join(".");
                self.eval_namespace(&prefix, body)?;
                Ok(Flow::Value(Value::default()))
            }
            Node::Import { path, .. } => {
                self.eval_import(path)?;
                Ok(Flow::Value(Value::default()))
            }
        }
    }

    fn eval_condition(&mut self, condition: &ExprLoc, construct: &str) -> RunResult<bool> {
        let value = self.eval_expr(condition)?;
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(self.type_err(format!(
                "{construct} condition must evaluate to Bool, got {}",
                other.type_name(&self.heap)
            ))),
        }
    }

    fn eval_try_catch(
        &mut self,
        try_block: &[Node],
        catch_name: &str,
        catch_block: &[Node],
        finally_block: Option<&[Node]>,
    ) -> RunResult<Flow> {
        let mut outcome = match self.eval_scoped_block(try_block) {
            Err(RunError::Thrown(thrown)) => {
                self.namespaces.push_scope();
                let bound = self.namespaces.define_variable(catch_name, thrown.value.clone());
                let result = match bound {
                    Ok(()) => self.eval_block(catch_block),
                    Err(e) => Err(self.raise(e)),
                };
                self.namespaces.pop_scope();
                result
            }
            other => other,
        };

        // The finally block runs on every exit path; its own unwind or
        // error supersedes whatever was in flight.
        if let Some(finally_block) = finally_block {
            match self.eval_scoped_block(finally_block) {
                Err(e) => outcome = Err(e),
                Ok(Flow::Value(_)) => {}
                Ok(control) => outcome = Ok(control),
            }
        }
        outcome
    }

    /// Evaluates declarations inside `namespace p { ... }`, binding each
    /// under its qualified name.
    fn eval_namespace(&mut self, prefix: &str, body: &[Node]) -> RunResult<()> {
        for node in body {
            match node {
                Node::Namespace { path, body, .. } => {
                    let nested = format!("{prefix}.{}", path.join("."));
                    self.eval_namespace(&nested, body)?;
                }
                Node::Import { path, .. } => {
                    self.eval_import(path)?;
                }
                _ => {
                    let Some((name, value)) = self.eval_declaration(node)? else {
                        return Err(self.eval_err("Only declarations are allowed inside a namespace"));
                    };
                    self.namespaces
                        .define_variable(&format!("{prefix}.{name}"), value)
                        .map_err(|e| self.raise(e))?;
                }
            }
        }
        Ok(())
    }

    // --- expression evaluation --------------------------------------------

    pub(crate) fn eval_expr(&mut self, expr: &ExprLoc) -> RunResult<Value> {
        match &expr.expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Name(name) | Expr::QualifiedName(name) => {
                self.namespaces.get(name).map_err(|e| self.raise(e))
            }
            Expr::This => match self.namespaces.current_this() {
                Some(id) => Ok(Value::Ref(id)),
                None => Err(self.eval_err("No 'this' object available in current context")),
            },
            Expr::Op { left, op, right } => {
                self.stack
                    .push(StackFrame::new("binary_operation", "expression", expr.location.clone()));
                let result = match self.eval_operand_pair(left, right) {
                    Ok((l, r)) => self.eval_binary(l, *op, r),
                    Err(e) => Err(e),
                };
                self.stack.pop();
                result
            }
            Expr::CmpOp { left, op, right } => {
                self.stack
                    .push(StackFrame::new("comparison", "expression", expr.location.clone()));
                let result = match self.eval_operand_pair(left, right) {
                    Ok((l, r)) => self.eval_comparison(l, *op, r),
                    Err(e) => Err(e),
                };
                self.stack.pop();
                result
            }
            Expr::Logic { left, op, right } => {
                let left_value = self.eval_expr(left)?;
                let Value::Bool(l) = left_value else {
                    return Err(self.eval_err(format!(
                        "Logical operator '{}' requires Bool operands, got {}",
                        op.symbol(),
                        left_value.type_name(&self.heap)
                    )));
                };
                // Short-circuit: the right operand is only evaluated when
                // it can affect the result.
                match (op, l) {
                    (LogicOp::And, false) => return Ok(Value::Bool(false)),
                    (LogicOp::Or, true) => return Ok(Value::Bool(true)),
                    _ => {}
                }
                let right_value = self.eval_expr(right)?;
                match right_value {
                    Value::Bool(r) => Ok(Value::Bool(r)),
                    other => Err(self.eval_err(format!(
                        "Logical operator '{}' requires Bool operands, got {}",
                        op.symbol(),
                        other.type_name(&self.heap)
                    ))),
                }
            }
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                match op {
                    UnaryOp::Neg => match value {
                        Value::Int(v) => Ok(Value::Int(v.wrapping_neg())),
                        Value::Long(v) => Ok(Value::Long(v.wrapping_neg())),
                        Value::Float(v) => Ok(Value::Float(-v)),
                        Value::Double(v) => Ok(Value::Double(-v)),
                        other => Err(self.eval_err(format!(
                            "Unary '-' requires a numeric operand, got {}",
                            other.type_name(&self.heap)
                        ))),
                    },
                    UnaryOp::Not => match value {
                        Value::Bool(v) => Ok(Value::Bool(!v)),
                        other => Err(self.eval_err(format!(
                            "Unary '!' requires a Bool operand, got {}",
                            other.type_name(&self.heap)
                        ))),
                    },
                }
            }
            Expr::MethodCall { object, method, args } => {
                self.eval_method_call(object, method, args, &expr.location)
            }
            Expr::MemberAccess { object, member } => self.eval_member_access(object, member),
            Expr::New { type_name, args } => self.eval_new(type_name, args, &expr.location),
            Expr::ResultCall { success, arg } => {
                let value = self.eval_expr(arg)?;
                Ok(Value::Result(Rc::new(crate::value::ResultValue {
                    success: *success,
                    value,
                })))
            }
            Expr::RecordInit { name, fields } => self.eval_record_init(name, fields),
            Expr::ListLiteral(elements) => self.eval_list_literal(elements),
            Expr::MapLiteral(entries) => self.eval_map_literal(entries),
            Expr::SetLiteral(elements) => self.eval_set_literal(elements),
        }
    }

    /// Evaluates both operands of a binary expression, left to right.
    fn eval_operand_pair(&mut self, left: &ExprLoc, right: &ExprLoc) -> RunResult<(Value, Value)> {
        let left_value = self.eval_expr(left)?;
        let right_value = self.eval_expr(right)?;
        Ok((left_value, right_value))
    }

    fn eval_list_literal(&mut self, elements: &[ExprLoc]) -> RunResult<Value> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            values.push(self.eval_expr(element)?);
        }
        let element_type = match values.first() {
            Some(first) => first.type_name(&self.heap),
            None => String::new(),
        };
        // Element tag equality is enforced at construction only.
        for value in &values {
            let tag = value.type_name(&self.heap);
            if tag != element_type {
                return Err(self.eval_err(format!(
                    "List elements must all be {element_type}, got {tag}"
                )));
            }
        }
        let id = self
            .heap
            .allocate(HeapData::List(ListInstance::with_elements(element_type, values)));
        Ok(Value::Ref(id))
    }

    fn eval_map_literal(&mut self, entries: &[(ExprLoc, ExprLoc)]) -> RunResult<Value> {
        let mut map = MapInstance::new();
        for (key_expr, value_expr) in entries {
            let key = self.eval_expr(key_expr)?;
            let value = self.eval_expr(value_expr)?;
            let Some(key) = MapKey::from_value(&key) else {
                return Err(self.eval_err(format!(
                    "Map keys must be primitive values, got {}",
                    key.type_name(&self.heap)
                )));
            };
            map.put(key, value);
        }
        Ok(Value::Ref(self.heap.allocate(HeapData::Map(map))))
    }

    fn eval_set_literal(&mut self, elements: &[ExprLoc]) -> RunResult<Value> {
        let mut set = SetInstance::new();
        for element in elements {
            let value = self.eval_expr(element)?;
            let Some(key) = MapKey::from_value(&value) else {
                return Err(self.eval_err(format!(
                    "Set elements must be primitive values, got {}",
                    value.type_name(&self.heap)
                )));
            };
            set.add(key);
        }
        Ok(Value::Ref(self.heap.allocate(HeapData::Set(set))))
    }

    // --- annotation checks ------------------------------------------------

    /// Checks that a value's tag is assignable to the declared type name,
    /// widening numerics where the lattice allows it.
    ///
    /// Generic annotations are checked by base tag only; element-tag
    /// equality is a construction-time rule. An empty list literal adopts
    /// the declared element tag.
    pub(crate) fn check_assignable(&mut self, declared: &str, value: Value, what: &str) -> RunResult<Value> {
        let actual = value.type_name(&self.heap);
        if actual == declared {
            return Ok(value);
        }

        // Numeric widening along Int < Long < Float < Double.
        match (declared, &value) {
            ("Long", Value::Int(v)) => return Ok(Value::Long(i64::from(*v))),
            ("Float", Value::Int(v)) => return Ok(Value::Float(*v as f32)),
            ("Float", Value::Long(v)) => return Ok(Value::Float(*v as f32)),
            ("Double", Value::Int(v)) => return Ok(Value::Double(f64::from(*v))),
            ("Double", Value::Long(v)) => return Ok(Value::Double(*v as f64)),
            ("Double", Value::Float(v)) => return Ok(Value::Double(f64::from(*v))),
            _ => {}
        }

        // A namespaced annotation (`demo.Calculator`) matches the
        // declared object name of the instance.
        if declared.rsplit('.').next() == Some(actual.as_str()) {
            return Ok(value);
        }

        let declared_base = base_of(declared);
        let actual_base = base_of(&actual);
        if declared_base == actual_base && matches!(declared_base, "List" | "Map" | "Set" | "Result") {
            if declared_base == "List" {
                if let Value::Ref(id) = &value {
                    if let HeapData::List(list) = self.heap.get_mut(*id) {
                        if list.is_empty() && list.element_type().is_empty() {
                            list.set_element_type(generic_argument(declared));
                        }
                    }
                }
            }
            return Ok(value);
        }

        Err(self.type_err(format!(
            "Type mismatch: cannot assign value of type '{actual}' to {what} of type '{declared}'"
        )))
    }
}

fn base_of(type_name: &str) -> &str {
    match type_name.find('<') {
        Some(index) => &type_name[..index],
        None => type_name,
    }
}

/// The first generic argument of an annotation: `List<Int>` -> `Int`.
fn generic_argument(type_name: &str) -> String {
    let Some(start) = type_name.find('<') else {
        return String::new();
    };
    let inner = &type_name[start + 1..type_name.len().saturating_sub(1)];
    inner.split(',').next().unwrap_or("").trim().to_owned()
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(v) => Value::Int(*v),
        Literal::Long(v) => Value::Long(*v),
        Literal::Float(v) => Value::Float(*v),
        Literal::Double(v) => Value::Double(*v),
        Literal::Bool(v) => Value::Bool(*v),
        Literal::Char(v) => Value::Char(*v),
        Literal::Text(s) => Value::text(s),
    }
}

/// Joins a chain of plain identifiers into a dotted name, if the
/// expression is such a chain (`system.os`, `demo.Calculator`).
pub(crate) fn qualified_chain(expr: &ExprLoc) -> Option<String> {
    match &expr.expr {
        Expr::Name(name) | Expr::QualifiedName(name) => Some(name.clone()),
        Expr::MemberAccess { object, member } => {
            let mut base = qualified_chain(object)?;
            base.push('.');
            base.push_str(member);
            Some(base)
        }
        _ => None,
    }
}

/// Location used for frames synthesized outside any expression.
pub(crate) fn synthetic_location() -> SourceLocation {
    SourceLocation::unknown()
}
