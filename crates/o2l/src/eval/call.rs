use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::{
    eval::{Flow, qualified_chain},
    exception::{RunResult, StackFrame},
    expressions::{ExprLoc, MethodDecl, Node, ObjectDecl, SourceLocation},
    heap::{HeapData, HeapId, RecordInstance},
    object::{EnumType, MethodBody, MethodEntry, MethodSignature, ObjectInstance, ProtocolType, RecordType},
    run::Interpreter,
    types,
    value::{EnumMember, ErrorValue, Value},
};

/// Argument vector; most calls pass at most two arguments.
pub(crate) type ArgValues = SmallVec<[Value; 2]>;

impl Interpreter {
    // --- declarations -----------------------------------------------------

    /// Builds the runtime value for a declaration node without binding it,
    /// so callers (statement evaluation, namespaces, the module loader)
    /// can choose the binding name.
    pub(crate) fn eval_declaration(&mut self, node: &Node) -> RunResult<Option<(String, Value)>> {
        match node {
            Node::Object(decl) => {
                let value = self.eval_object_declaration(decl)?;
                Ok(Some((decl.name.clone(), value)))
            }
            Node::Enum(decl) => {
                let mut members = IndexMap::new();
                let mut next = 0;
                for (member, value) in &decl.members {
                    let value = value.unwrap_or(next);
                    next = value + 1;
                    members.insert(member.clone(), value);
                }
                let id = self.heap.allocate(HeapData::EnumType(EnumType {
                    name: Rc::from(decl.name.as_str()),
                    members,
                }));
                Ok(Some((decl.name.clone(), Value::Ref(id))))
            }
            Node::Record(decl) => {
                let id = self.heap.allocate(HeapData::RecordType(RecordType {
                    name: Rc::from(decl.name.as_str()),
                    fields: decl.fields.clone(),
                }));
                Ok(Some((decl.name.clone(), Value::Ref(id))))
            }
            Node::Protocol(decl) => {
                let signatures = decl
                    .signatures
                    .iter()
                    .map(|signature| {
                        (
                            signature.name.clone(),
                            MethodSignature {
                                params: signature.params.clone(),
                                return_type: signature.return_type.clone(),
                            },
                        )
                    })
                    .collect();
                let id = self.heap.allocate(HeapData::Protocol(ProtocolType {
                    name: Rc::from(decl.name.as_str()),
                    signatures,
                }));
                Ok(Some((decl.name.clone(), Value::Ref(id))))
            }
            _ => Ok(None),
        }
    }

    /// Evaluates an `Object` declaration into a prototype instance.
    ///
    /// Methods are recorded with their visibility and signature;
    /// constructor bodies are stored but only run on `new`. Protocol
    /// conformance is checked here, at declaration evaluation time.
    fn eval_object_declaration(&mut self, decl: &ObjectDecl) -> RunResult<Value> {
        let mut object = ObjectInstance::new(&decl.name);

        for property in &decl.properties {
            object.declare_property(&property.name, &property.type_name);
        }
        if let Some(constructor) = &decl.constructor {
            object.add_method(
                "constructor",
                MethodBody::User(Rc::new(constructor.clone())),
                false,
                None,
            );
        }
        for method in &decl.methods {
            let signature = MethodSignature {
                params: method.params.clone(),
                return_type: method.return_type.clone(),
            };
            object.add_method(
                method.name.clone(),
                MethodBody::User(Rc::new(method.clone())),
                method.external,
                Some(signature),
            );
        }

        if let Some(protocol_name) = &decl.protocol {
            let protocol_value = self
                .namespaces
                .get(protocol_name)
                .map_err(|e| self.raise(e))?;
            let Value::Ref(protocol_id) = protocol_value else {
                return Err(self.eval_err(format!("'{protocol_name}' is not a protocol")));
            };
            let HeapData::Protocol(protocol) = self.heap.get(protocol_id) else {
                return Err(self.eval_err(format!("'{protocol_name}' is not a protocol")));
            };
            protocol
                .check_conformance(&object)
                .map_err(|message| self.eval_err(message))?;
        }

        let id = self.heap.allocate(HeapData::Object(object));
        Ok(Value::Ref(id))
    }

    // --- dispatch ---------------------------------------------------------

    /// Resolves the receiver expression of a call or member access.
    ///
    /// Dotted identifier chains are first tried as a single qualified key
    /// (`system.os`, `demo.Calculator`) before ordinary evaluation.
    fn eval_receiver(&mut self, object: &ExprLoc) -> RunResult<Value> {
        if let Some(qualified) = qualified_chain(object) {
            if self.namespaces.has(&qualified) {
                return self.namespaces.get(&qualified).map_err(|e| self.raise(e));
            }
        }
        self.eval_expr(object)
    }

    pub(crate) fn eval_method_call(
        &mut self,
        object: &ExprLoc,
        method: &str,
        args: &[ExprLoc],
        location: &SourceLocation,
    ) -> RunResult<Value> {
        let external = !matches!(object.expr, crate::expressions::Expr::This);
        let receiver = self.eval_receiver(object)?;

        if let Value::Ref(id) = receiver {
            if matches!(self.heap.get(id), HeapData::Object(_)) {
                return self.call_object_method(id, method, args, external, location);
            }
        }

        // Intrinsic dispatch for primitive and collection receivers.
        let mut arg_values = ArgValues::new();
        for arg in args {
            arg_values.push(self.eval_expr(arg)?);
        }
        match types::call_intrinsic(self, &receiver, method, &arg_values) {
            Some(result) => result,
            None => Err(self.eval_err(format!(
                "Unknown method '{method}' on {} type",
                receiver.base_type_name(&self.heap)
            ))),
        }
    }

    /// Method dispatch on an object: lookup, visibility check, argument
    /// evaluation (left to right), invocation.
    pub(crate) fn call_object_method(
        &mut self,
        object_id: HeapId,
        method: &str,
        args: &[ExprLoc],
        external: bool,
        location: &SourceLocation,
    ) -> RunResult<Value> {
        let (object_name, entry) = match self.heap.get(object_id) {
            HeapData::Object(object) => (object.name().to_owned(), object.method(method).cloned()),
            _ => unreachable!("call_object_method requires an object receiver"),
        };
        let Some(entry) = entry else {
            return Err(self.unresolved_err(format!(
                "Method '{method}' not found in object '{object_name}'"
            )));
        };
        if external && !entry.external {
            return Err(self.eval_err(format!(
                "Method '{method}' is not externally accessible on object '{object_name}'"
            )));
        }

        let mut arg_values = ArgValues::new();
        for arg in args {
            arg_values.push(self.eval_expr(arg)?);
        }
        self.invoke_method(object_id, &object_name, method, &entry, arg_values, location)
    }

    /// Invokes a method body with a fresh scope, bound `this`, and a
    /// diagnostic stack frame. All three are popped on every exit path.
    pub(crate) fn invoke_method(
        &mut self,
        object_id: HeapId,
        object_name: &str,
        method: &str,
        entry: &MethodEntry,
        args: ArgValues,
        location: &SourceLocation,
    ) -> RunResult<Value> {
        self.stack
            .push(StackFrame::new(method, object_name, location.clone()));

        let outcome = match &entry.body {
            MethodBody::Native(function) => crate::modules::call_native(self, *function, &args),
            MethodBody::User(decl) => self.invoke_user_method(object_id, method, decl, args),
        };

        self.stack.pop();
        outcome
    }

    fn invoke_user_method(
        &mut self,
        object_id: HeapId,
        method: &str,
        decl: &Rc<MethodDecl>,
        args: ArgValues,
    ) -> RunResult<Value> {
        if decl.params.len() != args.len() {
            return Err(self.eval_err(format!(
                "Method '{method}' expects {} arguments, got {}",
                decl.params.len(),
                args.len()
            )));
        }

        self.namespaces.push_scope();
        self.namespaces.push_this(object_id);

        let mut outcome = Ok(Flow::Value(Value::default()));
        for (param, value) in decl.params.iter().zip(args) {
            if let Err(e) = self.namespaces.define_variable(&param.name, value) {
                outcome = Err(self.raise(e));
                break;
            }
        }
        if outcome.is_ok() {
            outcome = self.eval_block(&decl.body);
        }

        let result = match outcome {
            Ok(Flow::Return(value) | Flow::Value(value)) => Ok(value),
            Ok(Flow::Break) => Err(self.eval_err("'break' used outside of a loop")),
            Ok(Flow::Continue) => Err(self.eval_err("'continue' used outside of a loop")),
            Err(e) => Err(e),
        };

        self.namespaces.pop_this();
        self.namespaces.pop_scope();
        result
    }

    // --- member access ----------------------------------------------------

    pub(crate) fn eval_member_access(&mut self, object: &ExprLoc, member: &str) -> RunResult<Value> {
        // `a.b.c` may be a qualified name bound as a single key.
        if let Some(mut qualified) = qualified_chain(object) {
            qualified.push('.');
            qualified.push_str(member);
            if self.namespaces.has(&qualified) {
                return self.namespaces.get(&qualified).map_err(|e| self.raise(e));
            }
        }

        let receiver = self.eval_receiver(object)?;
        match receiver {
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Object(instance) => match instance.property(member) {
                    Some(value) => Ok(value.clone()),
                    None => {
                        let name = instance.name().to_owned();
                        Err(self.unresolved_err(format!(
                            "Property '{member}' not found in object '{name}'"
                        )))
                    }
                },
                HeapData::Record(record) => match record.fields.get(member) {
                    Some(value) => Ok(value.clone()),
                    None => {
                        let name = record.type_name.clone();
                        Err(self.unresolved_err(format!(
                            "Field '{member}' not found in record '{name}'"
                        )))
                    }
                },
                HeapData::EnumType(decl) => match decl.members.get(member) {
                    Some(value) => Ok(Value::Enum(Rc::new(EnumMember {
                        enum_name: decl.name.clone(),
                        member: Rc::from(member),
                        value: *value,
                    }))),
                    None => {
                        let name = decl.name.clone();
                        Err(self.unresolved_err(format!(
                            "Enum '{name}' has no member '{member}'"
                        )))
                    }
                },
                _ => Err(self.eval_err(format!(
                    "Cannot access member '{member}' on {} value",
                    Value::Ref(id).base_type_name(&self.heap)
                ))),
            },
            other => Err(self.eval_err(format!(
                "Cannot access member '{member}' on {} value",
                other.base_type_name(&self.heap)
            ))),
        }
    }

    // --- construction -----------------------------------------------------

    /// `new T(args)`: clone the declared prototype and run its
    /// constructor with the fresh instance bound as `this`.
    pub(crate) fn eval_new(
        &mut self,
        type_name: &str,
        args: &[ExprLoc],
        location: &SourceLocation,
    ) -> RunResult<Value> {
        if type_name == "Error" {
            return self.eval_new_error(args);
        }

        let prototype = self
            .namespaces
            .get(type_name)
            .map_err(|_| self.unresolved_err(format!("Object type '{type_name}' not found")))?;
        let Value::Ref(prototype_id) = prototype else {
            return Err(self.eval_err(format!("'{type_name}' is not an object type")));
        };
        let fresh = match self.heap.get(prototype_id) {
            HeapData::Object(object) => object.instantiate(),
            _ => return Err(self.eval_err(format!("'{type_name}' is not an object type"))),
        };
        let constructor = fresh.method("constructor").cloned();
        let object_name = fresh.name().to_owned();
        let new_id = self.heap.allocate(HeapData::Object(fresh));

        let mut arg_values = ArgValues::new();
        for arg in args {
            arg_values.push(self.eval_expr(arg)?);
        }

        match constructor {
            Some(entry) => {
                self.invoke_method(new_id, &object_name, "constructor", &entry, arg_values, location)?;
            }
            None => {
                if !arg_values.is_empty() {
                    return Err(self.eval_err(format!(
                        "Object '{object_name}' does not declare a constructor, got {} arguments",
                        arg_values.len()
                    )));
                }
            }
        }
        Ok(Value::Ref(new_id))
    }

    /// `new Error(message[, code])`.
    fn eval_new_error(&mut self, args: &[ExprLoc]) -> RunResult<Value> {
        let mut arg_values = ArgValues::new();
        for arg in args {
            arg_values.push(self.eval_expr(arg)?);
        }
        let text_arg = |value: &Value| -> Option<Rc<str>> {
            match value {
                Value::Text(s) => Some(s.clone()),
                _ => None,
            }
        };
        let (message, code) = match arg_values.as_slice() {
            [message] => (text_arg(message), Some(Rc::from("Error"))),
            [message, code] => (text_arg(message), text_arg(code)),
            _ => (None, None),
        };
        match (message, code) {
            (Some(message), Some(code)) => Ok(Value::Error(Rc::new(ErrorValue { message, code }))),
            _ => Err(self.eval_err("Error constructor takes (message: Text[, code: Text])")),
        }
    }

    /// Record instantiation: `Point(x = 1, y = 2)`.
    ///
    /// Every declared field must be given exactly once and match its
    /// declared type; fields are stored in declaration order.
    pub(crate) fn eval_record_init(
        &mut self,
        name: &str,
        fields: &[(String, ExprLoc)],
    ) -> RunResult<Value> {
        let record_type = self
            .namespaces
            .get(name)
            .map_err(|_| self.unresolved_err(format!("Record type '{name}' not found")))?;
        let declared_fields = match record_type {
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::RecordType(record) => record.fields.clone(),
                _ => return Err(self.eval_err(format!("'{name}' is not a record type"))),
            },
            _ => return Err(self.eval_err(format!("'{name}' is not a record type"))),
        };

        let mut provided: IndexMap<String, Value> = IndexMap::new();
        for (field, expr) in fields {
            if provided.contains_key(field) {
                return Err(self.eval_err(format!(
                    "Field '{field}' given more than once in record '{name}'"
                )));
            }
            let value = self.eval_expr(expr)?;
            provided.insert(field.clone(), value);
        }

        let mut ordered = IndexMap::with_capacity(declared_fields.len());
        for field in &declared_fields {
            let Some(value) = provided.shift_remove(&field.name) else {
                return Err(self.eval_err(format!(
                    "Missing field '{}' in record '{name}' instantiation",
                    field.name
                )));
            };
            let value = self.check_assignable(
                &field.type_name,
                value,
                &format!("field '{}'", field.name),
            )?;
            ordered.insert(field.name.clone(), value);
        }
        if let Some((extra, _)) = provided.first() {
            return Err(self.eval_err(format!("Record '{name}' has no field '{extra}'")));
        }

        let id = self.heap.allocate(HeapData::Record(RecordInstance {
            type_name: Rc::from(name),
            fields: ordered,
        }));
        Ok(Value::Ref(id))
    }
}
