use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    expressions::{MethodDecl, Parameter},
    modules::NativeFn,
    value::Value,
};

/// A method's declared signature: parameter types and return type, as
/// written in the source. Native methods have no signature.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub params: Vec<Parameter>,
    pub return_type: String,
}

impl MethodSignature {
    /// Signature compatibility for protocol conformance: same parameter
    /// type sequence and same return type (string equality on type names).
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.return_type == other.return_type
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.type_name == b.type_name)
    }
}

/// The callable body of a method: user-declared AST or a native function.
///
/// User bodies are shared via `Rc`, so cloning a method table for `new`
/// is cheap and the AST outlives any instance that references it.
#[derive(Debug, Clone)]
pub enum MethodBody {
    User(Rc<MethodDecl>),
    Native(NativeFn),
}

/// One entry in an object's method table.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub body: MethodBody,
    /// `true` for `@external` methods, callable from any receiver.
    pub external: bool,
    pub signature: Option<MethodSignature>,
}

/// A named bag of methods and set-once properties.
///
/// Dispatch is always by method-name lookup on the receiver; the table is
/// insertion-ordered so introspection and diagnostics are deterministic.
#[derive(Debug, Clone)]
pub struct ObjectInstance {
    name: Rc<str>,
    methods: IndexMap<String, MethodEntry>,
    properties: IndexMap<String, Value>,
    /// Declared property types, recorded before any value is set.
    property_types: IndexMap<String, String>,
}

impl ObjectInstance {
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Rc::from(name.as_ref()),
            methods: IndexMap::new(),
            properties: IndexMap::new(),
            property_types: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_method(
        &mut self,
        name: impl Into<String>,
        body: MethodBody,
        external: bool,
        signature: Option<MethodSignature>,
    ) {
        self.methods.insert(
            name.into(),
            MethodEntry {
                body,
                external,
                signature,
            },
        );
    }

    /// Registers a native method; natives are always externally callable
    /// and carry no signature.
    pub fn add_native(&mut self, name: impl Into<String>, function: NativeFn) {
        self.add_method(name, MethodBody::Native(function), true, None);
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.methods.get(name)
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn declare_property(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        self.property_types.insert(name.into(), type_name.into());
    }

    #[must_use]
    pub fn property_type(&self, name: &str) -> Option<&str> {
        self.property_types.get(name).map(String::as_str)
    }

    /// Sets a property value. Once set, a property cannot be rebound;
    /// the second write reports an error.
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) -> Result<(), String> {
        let name = name.into();
        if self.properties.contains_key(&name) {
            return Err(format!(
                "Cannot reassign property '{name}' of object '{}'. Object properties are immutable.",
                self.name
            ));
        }
        self.properties.insert(name, value);
        Ok(())
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Clones the method and property tables into a fresh instance, the
    /// first step of `new T(...)`.
    #[must_use]
    pub fn instantiate(&self) -> Self {
        self.clone()
    }
}

/// A declared record type: fixed field names with per-field type tags.
#[derive(Debug, Clone)]
pub struct RecordType {
    pub name: Rc<str>,
    pub fields: Vec<Parameter>,
}

/// A declared enum: named integer constants, insertion-ordered.
#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: Rc<str>,
    pub members: IndexMap<String, i32>,
}

/// A declared protocol: a named set of required method signatures.
#[derive(Debug, Clone)]
pub struct ProtocolType {
    pub name: Rc<str>,
    pub signatures: Vec<(String, MethodSignature)>,
}

impl ProtocolType {
    /// Structural conformance check, run when an object declares `: P`.
    ///
    /// Every protocol signature must be satisfied by a same-name method
    /// with exactly the same parameter-type sequence and return type.
    pub fn check_conformance(&self, object: &ObjectInstance) -> Result<(), String> {
        for (method_name, required) in &self.signatures {
            let satisfied = object
                .method(method_name)
                .and_then(|entry| entry.signature.as_ref())
                .is_some_and(|signature| signature.matches(required));
            if !satisfied {
                return Err(format!(
                    "Object '{}' does not implement all methods of protocol '{}': missing or mismatched '{method_name}'",
                    object.name(),
                    self.name
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_are_set_once() {
        let mut object = ObjectInstance::new("Config");
        object.set_property("limit", Value::Int(10)).unwrap();
        let err = object.set_property("limit", Value::Int(20)).unwrap_err();
        assert!(err.contains("immutable"));
        assert!(matches!(object.property("limit"), Some(Value::Int(10))));
    }

    #[test]
    fn conformance_requires_matching_signature() {
        let signature = MethodSignature {
            params: vec![Parameter {
                name: "x".to_owned(),
                type_name: "Int".to_owned(),
            }],
            return_type: "Int".to_owned(),
        };
        let protocol = ProtocolType {
            name: Rc::from("Doubler"),
            signatures: vec![("double".to_owned(), signature.clone())],
        };

        let mut object = ObjectInstance::new("Calc");
        assert!(protocol.check_conformance(&object).is_err());

        object.add_method(
            "double",
            MethodBody::Native(NativeFn::Pi),
            true,
            Some(signature),
        );
        assert!(protocol.check_conformance(&object).is_ok());

        let mismatched = MethodSignature {
            params: vec![],
            return_type: "Int".to_owned(),
        };
        let mut wrong = ObjectInstance::new("Calc2");
        wrong.add_method("double", MethodBody::Native(NativeFn::Pi), true, Some(mismatched));
        assert!(protocol.check_conformance(&wrong).is_err());
    }
}
