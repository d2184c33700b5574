use std::{fmt::Write, rc::Rc};

use crate::heap::{Heap, HeapData};

/// A member of a declared `Enum`, carrying the enum's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub enum_name: Rc<str>,
    pub member: Rc<str>,
    pub value: i32,
}

/// A `Result<T, E>` value: either `success(T)` or `error(E)`.
#[derive(Debug, Clone)]
pub struct ResultValue {
    pub success: bool,
    pub value: Value,
}

/// An `Error` value produced by `new Error(message[, code])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub message: Rc<str>,
    pub code: Rc<str>,
}

/// Primary runtime value type.
///
/// Immutable leaves (numbers, text, enum members, results, errors) are
/// stored inline or behind an `Rc`; mutable instances with identity
/// (lists, maps, sets, objects, records, iterators) live in the arena and
/// are referenced via `Ref(HeapId)`, which gives them pass-by-shared-
/// reference semantics.
#[derive(Debug, Clone)]
pub enum Value {
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit IEEE-754.
    Float(f32),
    /// 64-bit IEEE-754.
    Double(f64),
    Bool(bool),
    /// One code unit (byte-level character literal).
    Char(u8),
    /// Owned immutable UTF-8 string.
    Text(Rc<str>),
    Enum(Rc<EnumMember>),
    Result(Rc<ResultValue>),
    Error(Rc<ErrorValue>),
    /// Shared reference into the arena.
    Ref(crate::heap::HeapId),
}

impl Default for Value {
    /// The neutral "empty" value yielded by constructs that produced
    /// nothing (a loop whose body never ran, a void method body).
    fn default() -> Self {
        Self::Int(0)
    }
}

impl Value {
    #[must_use]
    pub fn text(s: impl AsRef<str>) -> Self {
        Self::Text(Rc::from(s.as_ref()))
    }

    /// Whether the value's tag is one of the four numeric kinds.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Long(_) | Self::Float(_) | Self::Double(_))
    }

    /// The runtime type name used in diagnostics and annotation checks.
    ///
    /// Collections include their element tags (`List<Int>`); objects,
    /// records and enums report their declared names.
    #[must_use]
    pub fn type_name(&self, heap: &Heap) -> String {
        match self {
            Self::Int(_) => "Int".to_owned(),
            Self::Long(_) => "Long".to_owned(),
            Self::Float(_) => "Float".to_owned(),
            Self::Double(_) => "Double".to_owned(),
            Self::Bool(_) => "Bool".to_owned(),
            Self::Char(_) => "Char".to_owned(),
            Self::Text(_) => "Text".to_owned(),
            Self::Enum(member) => member.enum_name.to_string(),
            Self::Result(_) => "Result".to_owned(),
            Self::Error(_) => "Error".to_owned(),
            Self::Ref(id) => match heap.get(*id) {
                HeapData::List(list) => format!("List<{}>", list.element_type()),
                HeapData::Map(_) => "Map".to_owned(),
                HeapData::Set(_) => "Set".to_owned(),
                HeapData::Object(object) => object.name().to_string(),
                HeapData::Record(record) => record.type_name.to_string(),
                HeapData::RecordType(record) => record.name.to_string(),
                HeapData::EnumType(decl) => decl.name.to_string(),
                HeapData::Protocol(protocol) => protocol.name.to_string(),
                HeapData::Iterator(_) => "ListIterator".to_owned(),
            },
        }
    }

    /// The bare tag name without generic arguments (`List`, not `List<Int>`).
    #[must_use]
    pub fn base_type_name(&self, heap: &Heap) -> String {
        let name = self.type_name(heap);
        match name.find('<') {
            Some(index) => name[..index].to_owned(),
            None => name,
        }
    }

    /// Renders the value for printing and `toString`.
    #[must_use]
    pub fn display(&self, heap: &Heap) -> String {
        let mut out = String::new();
        self.write_display(heap, &mut out);
        out
    }

    fn write_display(&self, heap: &Heap, out: &mut String) {
        match self {
            Self::Int(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Long(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Float(v) => out.push_str(&format_float(*v)),
            Self::Double(v) => out.push_str(&format_double(*v)),
            Self::Bool(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Char(c) => out.push(*c as char),
            Self::Text(s) => out.push_str(s),
            Self::Enum(member) => {
                let _ = write!(out, "{}.{}", member.enum_name, member.member);
            }
            Self::Result(result) => {
                let ctor = if result.success { "success" } else { "error" };
                out.push_str("Result.");
                out.push_str(ctor);
                out.push('(');
                result.value.write_display(heap, out);
                out.push(')');
            }
            Self::Error(error) => {
                let _ = write!(out, "Error({}: {})", error.code, error.message);
            }
            Self::Ref(id) => match heap.get(*id) {
                HeapData::List(list) => {
                    out.push('[');
                    for (i, element) in list.elements().iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        element.write_display(heap, out);
                    }
                    out.push(']');
                }
                HeapData::Map(map) => {
                    out.push('{');
                    for (i, (key, value)) in map.entries().iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        key.to_value().write_display(heap, out);
                        out.push_str(": ");
                        value.write_display(heap, out);
                    }
                    out.push('}');
                }
                HeapData::Set(set) => {
                    out.push('{');
                    for (i, element) in set.elements().iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        element.to_value().write_display(heap, out);
                    }
                    out.push('}');
                }
                HeapData::Object(object) => {
                    let _ = write!(out, "{}()", object.name());
                }
                HeapData::Record(record) => {
                    let _ = write!(out, "{}(", record.type_name);
                    for (i, (field, value)) in record.fields.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        let _ = write!(out, "{field}=");
                        value.write_display(heap, out);
                    }
                    out.push(')');
                }
                HeapData::RecordType(record) => {
                    let _ = write!(out, "Record {}", record.name);
                }
                HeapData::EnumType(decl) => {
                    let _ = write!(out, "Enum {}", decl.name);
                }
                HeapData::Protocol(protocol) => {
                    let _ = write!(out, "Protocol {}", protocol.name);
                }
                HeapData::Iterator(_) => out.push_str("ListIterator"),
            },
        }
    }
}

/// Shortest round-trip decimal form of a `Float`.
#[must_use]
pub fn format_float(value: f32) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_owned() } else { "-inf".to_owned() };
    }
    let mut buffer = ryu::Buffer::new();
    buffer.format(value).to_owned()
}

/// Shortest round-trip decimal form of a `Double`.
#[must_use]
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_owned() } else { "-inf".to_owned() };
    }
    let mut buffer = ryu::Buffer::new();
    buffer.format(value).to_owned()
}

/// A hashable key for `Map` entries and `Set` membership.
///
/// Only primitive tags participate; float keys hash by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Int(i32),
    Long(i64),
    Bool(bool),
    Char(u8),
    Text(Rc<str>),
    Float(u32),
    Double(u64),
    Enum(Rc<str>, Rc<str>),
}

impl MapKey {
    /// Converts a primitive value into a key; `None` for reference kinds.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(Self::Int(*v)),
            Value::Long(v) => Some(Self::Long(*v)),
            Value::Bool(v) => Some(Self::Bool(*v)),
            Value::Char(v) => Some(Self::Char(*v)),
            Value::Text(s) => Some(Self::Text(s.clone())),
            Value::Float(v) => Some(Self::Float(v.to_bits())),
            Value::Double(v) => Some(Self::Double(v.to_bits())),
            Value::Enum(member) => Some(Self::Enum(member.enum_name.clone(), member.member.clone())),
            Value::Result(_) | Value::Error(_) | Value::Ref(_) => None,
        }
    }

    /// Reconstructs the original value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(v) => Value::Int(*v),
            Self::Long(v) => Value::Long(*v),
            Self::Bool(v) => Value::Bool(*v),
            Self::Char(v) => Value::Char(*v),
            Self::Text(s) => Value::Text(s.clone()),
            Self::Float(bits) => Value::Float(f32::from_bits(*bits)),
            Self::Double(bits) => Value::Double(f64::from_bits(*bits)),
            Self::Enum(enum_name, member) => Value::Enum(Rc::new(EnumMember {
                enum_name: enum_name.clone(),
                member: member.clone(),
                // Member values are not identity-relevant for keys.
                value: 0,
            })),
        }
    }
}

/// Structural equality per the language rules.
///
/// Same-tag comparison is structural; mixed numeric tags promote to the
/// wider tag; any other cross-tag pair is unequal. Reference values
/// compare by content (lists element-wise, objects by identity).
#[must_use]
pub fn values_equal(a: &Value, b: &Value, heap: &Heap) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Long(x), Value::Long(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Double(x), Value::Double(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Enum(x), Value::Enum(y)) => x == y,
        (Value::Error(x), Value::Error(y)) => x == y,
        (Value::Result(x), Value::Result(y)) => {
            x.success == y.success && values_equal(&x.value, &y.value, heap)
        }
        (Value::Ref(x), Value::Ref(y)) => {
            if x == y {
                return true;
            }
            match (heap.get(*x), heap.get(*y)) {
                (HeapData::List(lx), HeapData::List(ly)) => {
                    lx.elements().len() == ly.elements().len()
                        && lx
                            .elements()
                            .iter()
                            .zip(ly.elements())
                            .all(|(ex, ey)| values_equal(ex, ey, heap))
                }
                (HeapData::Map(mx), HeapData::Map(my)) => {
                    mx.entries().len() == my.entries().len()
                        && mx.entries().iter().all(|(key, vx)| {
                            my.entries().get(key).is_some_and(|vy| values_equal(vx, vy, heap))
                        })
                }
                (HeapData::Set(sx), HeapData::Set(sy)) => {
                    sx.elements().len() == sy.elements().len()
                        && sx.elements().iter().all(|e| sy.elements().contains(e))
                }
                (HeapData::Record(rx), HeapData::Record(ry)) => {
                    rx.type_name == ry.type_name
                        && rx.fields.len() == ry.fields.len()
                        && rx.fields.iter().all(|(field, vx)| {
                            ry.fields.get(field).is_some_and(|vy| values_equal(vx, vy, heap))
                        })
                }
                // Objects and iterators compare by identity only.
                _ => false,
            }
        }
        // Mixed numeric tags promote to the wider tag.
        _ if a.is_numeric() && b.is_numeric() => {
            match crate::eval::promote_pair(a, b) {
                Some(crate::eval::NumericPair::Int(x, y)) => x == y,
                Some(crate::eval::NumericPair::Long(x, y)) => x == y,
                Some(crate::eval::NumericPair::Float(x, y)) => x == y,
                Some(crate::eval::NumericPair::Double(x, y)) => x == y,
                None => false,
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_formatting_round_trips() {
        assert_eq!(format_double(3.5), "3.5");
        assert_eq!(format_double(0.1), "0.1");
        assert_eq!(format_float(2.5), "2.5");
    }

    #[test]
    fn map_key_round_trip() {
        let key = MapKey::from_value(&Value::text("k")).unwrap();
        assert!(matches!(key.to_value(), Value::Text(s) if &*s == "k"));
        assert!(MapKey::from_value(&Value::Ref(crate::heap::HeapId::sentinel())).is_none());
    }

    #[test]
    fn cross_tag_equality_is_false() {
        let heap = Heap::new();
        assert!(!values_equal(&Value::Bool(true), &Value::Int(1), &heap));
        assert!(!values_equal(&Value::text("1"), &Value::Int(1), &heap));
    }

    #[test]
    fn mixed_numeric_equality_promotes() {
        let heap = Heap::new();
        assert!(values_equal(&Value::Int(3), &Value::Double(3.0), &heap));
        assert!(values_equal(&Value::Long(7), &Value::Int(7), &heap));
        assert!(!values_equal(&Value::Int(3), &Value::Double(3.5), &heap));
    }
}
