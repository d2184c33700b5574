use crate::{
    exception::RunResult,
    heap::{HeapData, HeapId},
    run::Interpreter,
    types::{
        check_arity,
        map::{allocate_derived_list, key_arg},
    },
    value::{MapKey, Value},
};

/// Intrinsic methods on `Set` values. Membership uses the same key rules
/// as `Map`.
pub(super) fn call(
    interp: &mut Interpreter,
    id: HeapId,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let result = match method {
        "add" => {
            if let Err(e) = check_arity(interp, "Set", method, args, 1) {
                return Some(Err(e));
            }
            let element = match key_arg(interp, &args[0]) {
                Ok(element) => element,
                Err(e) => return Some(Err(e)),
            };
            let HeapData::Set(set) = interp.heap.get_mut(id) else {
                return None;
            };
            Ok(Value::Bool(set.add(element)))
        }
        "contains" => {
            if let Err(e) = check_arity(interp, "Set", method, args, 1) {
                return Some(Err(e));
            }
            let element = match key_arg(interp, &args[0]) {
                Ok(element) => element,
                Err(e) => return Some(Err(e)),
            };
            let HeapData::Set(set) = interp.heap.get(id) else {
                return None;
            };
            Ok(Value::Bool(set.contains(&element)))
        }
        "remove" => {
            if let Err(e) = check_arity(interp, "Set", method, args, 1) {
                return Some(Err(e));
            }
            let element = match key_arg(interp, &args[0]) {
                Ok(element) => element,
                Err(e) => return Some(Err(e)),
            };
            let HeapData::Set(set) = interp.heap.get_mut(id) else {
                return None;
            };
            Ok(Value::Bool(set.remove(&element)))
        }
        "elements" => {
            if let Err(e) = check_arity(interp, "Set", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::Set(set) = interp.heap.get(id) else {
                return None;
            };
            let elements: Vec<Value> = set.elements().iter().map(MapKey::to_value).collect();
            Ok(allocate_derived_list(interp, elements))
        }
        "size" => {
            if let Err(e) = check_arity(interp, "Set", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::Set(set) = interp.heap.get(id) else {
                return None;
            };
            Ok(Value::Int(set.len() as i32))
        }
        "empty" => {
            if let Err(e) = check_arity(interp, "Set", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::Set(set) = interp.heap.get(id) else {
                return None;
            };
            Ok(Value::Bool(set.is_empty()))
        }
        "clear" => {
            if let Err(e) = check_arity(interp, "Set", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::Set(set) = interp.heap.get_mut(id) else {
                return None;
            };
            set.clear();
            Ok(Value::Bool(true))
        }
        _ => return None,
    };
    Some(result)
}
