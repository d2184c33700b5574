use crate::{
    exception::{RunError, RunResult},
    heap::{HeapData, HeapId, ListInstance},
    run::Interpreter,
    types::check_arity,
    value::{MapKey, Value},
};

/// Intrinsic methods on `Map` values. Keys must be primitive values.
pub(super) fn call(
    interp: &mut Interpreter,
    id: HeapId,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let result = match method {
        "put" => {
            if let Err(e) = check_arity(interp, "Map", method, args, 2) {
                return Some(Err(e));
            }
            let key = match key_arg(interp, &args[0]) {
                Ok(key) => key,
                Err(e) => return Some(Err(e)),
            };
            let value = args[1].clone();
            let HeapData::Map(map) = interp.heap.get_mut(id) else {
                return None;
            };
            map.put(key, value);
            Ok(Value::Bool(true))
        }
        "get" => {
            if let Err(e) = check_arity(interp, "Map", method, args, 1) {
                return Some(Err(e));
            }
            let key = match key_arg(interp, &args[0]) {
                Ok(key) => key,
                Err(e) => return Some(Err(e)),
            };
            let HeapData::Map(map) = interp.heap.get(id) else {
                return None;
            };
            match map.get(&key) {
                Some(value) => Ok(value.clone()),
                None => Err(interp.eval_err(format!(
                    "Key '{}' not found in map",
                    args[0].display(&interp.heap)
                ))),
            }
        }
        "contains" => {
            if let Err(e) = check_arity(interp, "Map", method, args, 1) {
                return Some(Err(e));
            }
            let key = match key_arg(interp, &args[0]) {
                Ok(key) => key,
                Err(e) => return Some(Err(e)),
            };
            let HeapData::Map(map) = interp.heap.get(id) else {
                return None;
            };
            Ok(Value::Bool(map.get(&key).is_some()))
        }
        "remove" => {
            if let Err(e) = check_arity(interp, "Map", method, args, 1) {
                return Some(Err(e));
            }
            let key = match key_arg(interp, &args[0]) {
                Ok(key) => key,
                Err(e) => return Some(Err(e)),
            };
            let HeapData::Map(map) = interp.heap.get_mut(id) else {
                return None;
            };
            Ok(Value::Bool(map.remove(&key)))
        }
        "keys" => {
            if let Err(e) = check_arity(interp, "Map", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::Map(map) = interp.heap.get(id) else {
                return None;
            };
            let keys: Vec<Value> = map.entries().keys().map(MapKey::to_value).collect();
            Ok(allocate_derived_list(interp, keys))
        }
        "values" => {
            if let Err(e) = check_arity(interp, "Map", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::Map(map) = interp.heap.get(id) else {
                return None;
            };
            let values: Vec<Value> = map.entries().values().cloned().collect();
            Ok(allocate_derived_list(interp, values))
        }
        "size" => {
            if let Err(e) = check_arity(interp, "Map", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::Map(map) = interp.heap.get(id) else {
                return None;
            };
            Ok(Value::Int(map.len() as i32))
        }
        "empty" => {
            if let Err(e) = check_arity(interp, "Map", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::Map(map) = interp.heap.get(id) else {
                return None;
            };
            Ok(Value::Bool(map.is_empty()))
        }
        "clear" => {
            if let Err(e) = check_arity(interp, "Map", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::Map(map) = interp.heap.get_mut(id) else {
                return None;
            };
            map.clear();
            Ok(Value::Bool(true))
        }
        _ => return None,
    };
    Some(result)
}

pub(super) fn key_arg(interp: &Interpreter, value: &Value) -> Result<MapKey, RunError> {
    MapKey::from_value(value).ok_or_else(|| {
        interp.eval_err(format!(
            "Map keys must be primitive values, got {}",
            value.type_name(&interp.heap)
        ))
    })
}

/// Lists derived from map/set contents take their element tag from the
/// first element.
pub(super) fn allocate_derived_list(interp: &mut Interpreter, values: Vec<Value>) -> Value {
    let element_type = values
        .first()
        .map(|value| value.type_name(&interp.heap))
        .unwrap_or_default();
    let id = interp
        .heap
        .allocate(HeapData::List(ListInstance::with_elements(element_type, values)));
    Value::Ref(id)
}
