mod list;
mod map;
mod number;
mod result;
mod set;
mod text;

use std::rc::Rc;

use crate::{
    exception::{RunError, RunResult},
    heap::HeapData,
    run::Interpreter,
    value::{EnumMember, Value},
};

/// Dispatches a method call on a non-object receiver to the fixed
/// intrinsic table for its tag.
///
/// Returns `None` when the tag has no such method, so the caller can
/// report `Unknown method '<m>' on <Type> type`.
pub(crate) fn call_intrinsic(
    interp: &mut Interpreter,
    receiver: &Value,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let handled = match receiver {
        Value::Text(s) => text::call(interp, s, method, args),
        Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Double(_) | Value::Bool(_) | Value::Char(_) => {
            number::call(interp, receiver, method, args)
        }
        Value::Enum(member) => enum_member_call(interp, member, method, args),
        Value::Result(value) => result::call(interp, value, method, args),
        Value::Error(error) => result::call_error(interp, error, method, args),
        Value::Ref(id) => {
            let id = *id;
            match interp.heap.get(id) {
                HeapData::List(_) => list::call(interp, id, method, args),
                HeapData::Iterator(_) => list::call_iterator(interp, id, method, args),
                HeapData::Map(_) => map::call(interp, id, method, args),
                HeapData::Set(_) => set::call(interp, id, method, args),
                HeapData::EnumType(_) => enum_type_call(interp, id, method, args),
                _ => None,
            }
        }
    };
    if handled.is_some() {
        return handled;
    }

    // Every value renders itself; `toString` is universal.
    if method == "toString" && args.is_empty() {
        return Some(Ok(Value::text(receiver.display(&interp.heap))));
    }
    None
}

/// Wrong-arity error in the intrinsic table's uniform wording.
pub(super) fn check_arity(
    interp: &Interpreter,
    type_name: &str,
    method: &str,
    args: &[Value],
    expected: usize,
) -> Result<(), RunError> {
    if args.len() == expected {
        return Ok(());
    }
    let what = match expected {
        0 => "no arguments".to_owned(),
        1 => "exactly 1 argument".to_owned(),
        n => format!("exactly {n} arguments"),
    };
    Err(interp.eval_err(format!("{type_name}.{method}() takes {what}")))
}

pub(super) fn expect_text(
    interp: &Interpreter,
    context: &str,
    value: &Value,
) -> Result<Rc<str>, RunError> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        other => Err(interp.eval_err(format!(
            "{context} expects a Text argument, got {}",
            other.type_name(&interp.heap)
        ))),
    }
}

pub(super) fn expect_int(interp: &Interpreter, context: &str, value: &Value) -> Result<i32, RunError> {
    match value {
        Value::Int(v) => Ok(*v),
        other => Err(interp.eval_err(format!(
            "{context} expects an Int argument, got {}",
            other.type_name(&interp.heap)
        ))),
    }
}

/// Methods on enum member values.
fn enum_member_call(
    interp: &mut Interpreter,
    member: &Rc<EnumMember>,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let result = match method {
        "getValue" => {
            if let Err(e) = check_arity(interp, &member.enum_name, method, args, 0) {
                return Some(Err(e));
            }
            Ok(Value::Int(member.value))
        }
        "getName" => {
            if let Err(e) = check_arity(interp, &member.enum_name, method, args, 0) {
                return Some(Err(e));
            }
            Ok(Value::Text(member.member.clone()))
        }
        _ => return None,
    };
    Some(result)
}

/// Methods on enum *types* (`Color.values()`).
fn enum_type_call(
    interp: &mut Interpreter,
    id: crate::heap::HeapId,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let HeapData::EnumType(decl) = interp.heap.get(id) else {
        return None;
    };
    match method {
        "values" => {
            let enum_name = decl.name.to_string();
            if let Err(e) = check_arity(interp, &enum_name, method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::EnumType(decl) = interp.heap.get(id) else {
                return None;
            };
            let members: Vec<Value> = decl.members.keys().map(Value::text).collect();
            let list = crate::heap::ListInstance::with_elements("Text", members);
            let list_id = interp.heap.allocate(HeapData::List(list));
            Some(Ok(Value::Ref(list_id)))
        }
        _ => None,
    }
}
